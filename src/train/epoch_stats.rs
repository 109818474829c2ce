use serde::{Serialize, Deserialize};

/// Per-epoch statistics produced by a `TrainableModel`.
///
/// One `EpochStats` is recorded into the model's `MetricHistory` at the end
/// of every completed epoch and logged by the training loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochStats {
    /// 1-based epoch number.
    pub epoch: usize,
    /// Total epochs requested for this run.
    pub total_epochs: usize,
    /// Mean training loss over all frames in this epoch.
    pub train_loss: f64,
    /// Mean validation loss.
    pub val_loss: f64,
    /// Mean per-utterance validation SNR in dB.
    pub val_snr: f64,
    /// Wall-clock duration of this single epoch in milliseconds.
    pub elapsed_ms: u64,
}
