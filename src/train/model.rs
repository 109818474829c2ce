use std::path::Path;

use crate::config::RunConfig;
use crate::device::Device;
use crate::error::RunResult;
use crate::train::metric_history::MetricHistory;
use crate::train::train_control::TrainControl;

/// Everything a backend receives when the orchestrator constructs its model.
#[derive(Debug, Clone, Copy)]
pub struct ModelInit<'a> {
    pub config: &'a RunConfig,
    /// Checkpoint directory: restored from when `is_restore`, written to either way.
    pub model_path: &'a Path,
    pub is_restore: bool,
    pub device: Device,
}

/// A model the orchestrator can drive through one training run.
pub trait TrainableModel {
    type Data;

    /// Trains for the configured number of epochs, appending one entry to
    /// `history()` per completed epoch. Returns early when `control` asks to
    /// stop at an epoch boundary.
    fn train(&mut self, data: &Self::Data, control: &TrainControl) -> RunResult<()>;

    fn history(&self) -> &MetricHistory;

    fn best_val_snr(&self) -> Option<f64> {
        self.history().best_val_snr()
    }
}

/// Constructs (or restores) the model for one run.
pub trait ModelBuilder {
    type Model: TrainableModel;

    fn build(&self, init: ModelInit<'_>) -> RunResult<Self::Model>;
}
