use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::checkpoint::resolver::RunState;
use crate::checkpoint::store::{load_json, save_json, CheckpointDir};
use crate::data::dataset::SourceSeparationDataSet;
use crate::device::Device;
use crate::error::{RunError, RunResult};
use crate::network::network::MaskNetwork;
use crate::network::spec::MaskNetSpec;
use crate::optim::adam::Adam;
use crate::quant::calibration::ActivationRanges;
use crate::train::loop_fn::{evaluate, train_loop, EpochParams, TrainState};
use crate::train::metric_history::MetricHistory;
use crate::train::model::{ModelBuilder, ModelInit, TrainableModel};
use crate::train::train_control::TrainControl;

/// Contents of `model.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaskNetCheckpoint {
    pub network: MaskNetwork,
    pub ranges: Option<ActivationRanges>,
    pub n_bits: Option<u32>,
    pub device: Device,
    /// Epoch (of the run that wrote it) at which this checkpoint was taken.
    pub epoch: usize,
    pub val_snr: f64,
}

/// Reference `TrainableModel`: a quantization-aware mask estimator that
/// checkpoints itself whenever validation SNR improves.
///
/// A resumed checkpoint is only written to when training continues it:
/// evaluation-only passes leave `model.json` and `history.json` untouched,
/// continued runs append to the saved history.
pub struct MaskNet {
    state: TrainState,
    history: MetricHistory,
    checkpoint: CheckpointDir,
    device: Device,
    run_state: RunState,
    best_saved: Option<f64>,
    /// SNR of the restored network when no epoch completed.
    evaluated_snr: Option<f64>,
}

impl MaskNet {
    pub fn new(init: ModelInit<'_>) -> RunResult<MaskNet> {
        let config = init.config;
        let spec = MaskNetSpec::from_config(config);
        let checkpoint = CheckpointDir::new(init.model_path);
        let mut rng = StdRng::seed_from_u64(config.seed);
        let run_state = match (init.is_restore, config.is_pretrain) {
            (false, _) => RunState::Fresh,
            (true, true) => RunState::ResumeContinue,
            (true, false) => RunState::ResumeEvalOnly,
        };

        let (network, ranges, best_saved) = if init.is_restore {
            let restored = restore(&checkpoint, spec)?;
            info!(
                path = %checkpoint.model_path().display(),
                epoch = restored.epoch,
                val_snr = restored.val_snr,
                "restored mask network"
            );
            (restored.network, restored.ranges, Some(restored.val_snr))
        } else {
            (MaskNetwork::new(spec, config.gain, &mut rng), None, None)
        };

        let optimizer = Adam::new(config.learning_rate, config.beta1, config.beta2, &network.layers);
        info!(
            gpu_id = init.device.gpu_id(),
            n_features = spec.n_features,
            n_layers = spec.n_layers,
            state_size = spec.state_size,
            n_bits = ?config.n_bits,
            "mask network ready"
        );

        Ok(MaskNet {
            state: TrainState {
                network,
                optimizer,
                params: EpochParams::from_config(config),
                rng,
                ranges,
            },
            history: MetricHistory::new(),
            checkpoint,
            device: init.device,
            run_state,
            best_saved,
            evaluated_snr: None,
        })
    }

    pub fn network(&self) -> &MaskNetwork {
        &self.state.network
    }

    pub fn checkpoint_dir(&self) -> &CheckpointDir {
        &self.checkpoint
    }
}

impl TrainableModel for MaskNet {
    type Data = SourceSeparationDataSet;

    fn train(&mut self, data: &SourceSeparationDataSet, control: &TrainControl) -> RunResult<()> {
        let n_features = self.state.network.spec.n_features;
        if data.n_features != n_features {
            return Err(RunError::Dataset(format!(
                "dataset has {}-bin frames, network expects {n_features}",
                data.n_features
            )));
        }
        let persist = self.run_state != RunState::ResumeEvalOnly;
        if persist {
            self.checkpoint.ensure()?;
        }

        let checkpoint = &self.checkpoint;
        let device = self.device;
        let best_saved = &mut self.best_saved;

        train_loop(&mut self.state, data, control, &mut self.history, |stats, state| {
            let improved = !stats.val_snr.is_nan()
                && best_saved.map_or(true, |best| stats.val_snr > best);
            if !persist || !improved {
                return Ok(());
            }
            let snapshot = MaskNetCheckpoint {
                network: state.network.clone(),
                ranges: state.ranges.clone(),
                n_bits: state.params.n_bits,
                device,
                epoch: stats.epoch,
                val_snr: stats.val_snr,
            };
            save_json(&checkpoint.model_path(), &snapshot)?;
            *best_saved = Some(stats.val_snr);
            debug!(epoch = stats.epoch, val_snr = stats.val_snr, "checkpoint saved");
            Ok(())
        })?;

        if self.history.is_empty() && self.run_state.is_restore() {
            let (val_loss, val_snr) = evaluate(&self.state, &data.validation);
            info!(val_loss, val_snr, "evaluated restored mask network");
            self.evaluated_snr = Some(val_snr).filter(|snr| !snr.is_nan());
        }

        match self.run_state {
            RunState::Fresh => save_json(&self.checkpoint.history_path(), &self.history)?,
            RunState::ResumeContinue => {
                let path = self.checkpoint.history_path();
                let mut combined = if path.is_file() {
                    load_json::<MetricHistory>(&path)?
                } else {
                    MetricHistory::new()
                };
                combined.extend(&self.history);
                save_json(&path, &combined)?;
            }
            RunState::ResumeEvalOnly => {}
        }
        Ok(())
    }

    fn history(&self) -> &MetricHistory {
        &self.history
    }

    fn best_val_snr(&self) -> Option<f64> {
        self.history.best_val_snr().or(self.evaluated_snr)
    }
}

fn restore(dir: &CheckpointDir, spec: MaskNetSpec) -> RunResult<MaskNetCheckpoint> {
    let path = dir.model_path();
    if !path.is_file() {
        return Err(RunError::checkpoint(path, "no saved model to restore"));
    }
    let restored: MaskNetCheckpoint = load_json(&path)
        .map_err(|e| RunError::checkpoint(&path, e.to_string()))?;
    if restored.network.spec != spec {
        return Err(RunError::checkpoint(
            path,
            format!("saved architecture {:?} does not match requested {:?}", restored.network.spec, spec),
        ));
    }
    Ok(restored)
}

/// Builds `MaskNet`s for the orchestrator.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaskNetBuilder;

impl ModelBuilder for MaskNetBuilder {
    type Model = MaskNet;

    fn build(&self, init: ModelInit<'_>) -> RunResult<MaskNet> {
        MaskNet::new(init)
    }
}
