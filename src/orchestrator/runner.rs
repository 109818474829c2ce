use std::path::PathBuf;

use chrono::NaiveDateTime;
use tracing::{debug, info, warn};

use crate::checkpoint::resolver::{resolve, RunOutcome, RunState};
use crate::checkpoint::store::CheckpointDir;
use crate::config::RunConfig;
use crate::data::provider::DataProvider;
use crate::device::Device;
use crate::error::RunResult;
use crate::identity::{timestamp_token, RunLabel};
use crate::report::plot::ResultReporter;
use crate::train::metric_history::MetricHistory;
use crate::train::model::{ModelBuilder, ModelInit, TrainableModel};
use crate::train::train_control::TrainControl;

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub state: RunState,
    pub base_label: RunLabel,
    pub result_label: RunLabel,
    pub model_path: PathBuf,
    pub plot_path: PathBuf,
    pub history: MetricHistory,
    pub outcome: RunOutcome,
}

/// Drives one run: data, checkpoint resolution, model construction,
/// training and reporting.
pub struct TrainingOrchestrator<P, B, R> {
    pub provider: P,
    pub builder: B,
    pub reporter: R,
}

impl<P, B, R> TrainingOrchestrator<P, B, R>
where
    P: DataProvider,
    B: ModelBuilder,
    B::Model: TrainableModel<Data = P::Data>,
    R: ResultReporter,
{
    pub fn new(provider: P, builder: B, reporter: R) -> Self {
        TrainingOrchestrator { provider, builder, reporter }
    }

    pub fn run(
        &self,
        config: &RunConfig,
        started_at: NaiveDateTime,
        control: &TrainControl,
    ) -> RunResult<RunSummary> {
        let data = self.obtain_data(config)?;

        let device = Device::gpu(config.gpu_id);
        for (key, value) in device.env_bindings() {
            info!(key, value = %value, "device binding");
        }

        let resolved = resolve(config, &started_at);
        info!(
            state = ?resolved.state,
            label = %resolved.label,
            model_path = %resolved.model_path.display(),
            "resolved run"
        );

        // Only a fresh run owns `config.json`. A resume records its own
        // config beside it, and never creates a missing resume target.
        let checkpoint = CheckpointDir::new(&resolved.model_path);
        if !resolved.is_restore() {
            checkpoint.write_config(config)?;
        } else if checkpoint.exists() {
            let path = checkpoint.write_resume_config(&timestamp_token(&started_at), config)?;
            debug!(path = %path.display(), "resume config saved");
        } else {
            warn!(path = %checkpoint.root().display(), "resume target missing, skipping config snapshot");
        }

        let mut model = self.builder.build(ModelInit {
            config,
            model_path: &resolved.model_path,
            is_restore: resolved.is_restore(),
            device,
        })?;

        info!(n_epochs = config.n_epochs, "training started");
        model.train(&data, control)?;
        let history = model.history().clone();

        let outcome = RunOutcome::from_run(resolved.state, history.len(), model.best_val_snr());
        if history.len() < config.n_epochs {
            warn!(completed = history.len(), requested = config.n_epochs, "training ended early");
        }
        let result_label = resolved.result_label(config, &outcome);
        info!(
            label = %result_label,
            effective_epochs = outcome.effective_epochs,
            best_snr = ?outcome.best_snr,
            "training finished"
        );

        let plot_path = self
            .reporter
            .render(&history, &config.dir_results.join(result_label.to_string()))?;

        Ok(RunSummary {
            state: resolved.state,
            base_label: resolved.label,
            result_label,
            model_path: resolved.model_path,
            plot_path,
            history,
            outcome,
        })
    }

    fn obtain_data(&self, config: &RunConfig) -> RunResult<P::Data> {
        if let Some(path) = &config.pickled_data_path {
            info!(path = %path.display(), "restoring dataset");
            return self.provider.restore(path);
        }

        info!(data = %config.data_size, noise = %config.noise_count, "building dataset");
        let data = self.provider.build(config.data_size, config.noise_count)?;
        if let Some(path) = &config.save_data_path {
            self.provider.persist(&data, path)?;
            info!(path = %path.display(), "dataset saved");
        }
        Ok(data)
    }
}
