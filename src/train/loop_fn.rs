use std::time::Instant;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::{debug, info};

use crate::config::RunConfig;
use crate::data::dataset::{SourceSeparationDataSet, Utterance};
use crate::error::RunResult;
use crate::loss::mse::MaskedMseLoss;
use crate::metrics::snr::snr_db;
use crate::network::network::MaskNetwork;
use crate::optim::adam::{clip_global_norm, Adam};
use crate::quant::calibration::{ActivationRanges, QuantizedNetwork};
use crate::quant::quantizer::Quantizer;
use crate::train::epoch_stats::EpochStats;
use crate::train::metric_history::MetricHistory;
use crate::train::train_control::TrainControl;

// ---------------------------------------------------------------------------
// Training state
// ---------------------------------------------------------------------------

/// Loop hyperparameters, copied out of the `RunConfig`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochParams {
    pub epochs: usize,
    pub batch_size: usize,
    pub bptt_steps: usize,
    pub clip_value: f64,
    pub n_bits: Option<u32>,
    pub perc_sample: f64,
    pub verbose: bool,
}

impl EpochParams {
    pub fn from_config(config: &RunConfig) -> EpochParams {
        EpochParams {
            epochs:      config.n_epochs,
            batch_size:  config.batch_size,
            bptt_steps:  config.bptt_steps,
            clip_value:  config.clip_value,
            n_bits:      config.n_bits,
            perc_sample: config.perc_sample,
            verbose:     config.verbose,
        }
    }
}

/// Everything one epoch mutates.
pub struct TrainState {
    pub network: MaskNetwork,
    pub optimizer: Adam,
    pub params: EpochParams,
    pub rng: StdRng,
    /// Latest calibration; `None` until the first quantized epoch.
    pub ranges: Option<ActivationRanges>,
}

// ---------------------------------------------------------------------------
// Public entry points
// ---------------------------------------------------------------------------

/// Trains for `params.epochs` epochs, recording one entry in `history` per
/// completed epoch and calling `on_epoch` after each.
///
/// # Early termination
/// `control.should_stop()` is checked before every epoch; once it is set the
/// loop returns `Ok` with the epochs completed so far.
pub fn train_loop<F>(
    state: &mut TrainState,
    data: &SourceSeparationDataSet,
    control: &TrainControl,
    history: &mut MetricHistory,
    mut on_epoch: F,
) -> RunResult<()>
where
    F: FnMut(&EpochStats, &TrainState) -> RunResult<()>,
{
    let total_epochs = state.params.epochs;

    for epoch in 1..=total_epochs {
        if control.should_stop() {
            info!(epoch, total_epochs, "stop requested, ending training at epoch boundary");
            break;
        }

        let t_start = Instant::now();

        let train_loss = run_one_epoch(state, &data.train);

        if state.params.n_bits.is_some() {
            let frames: Vec<&[f64]> = data.train.iter()
                .flat_map(|u| u.mixture.iter().map(Vec::as_slice))
                .collect();
            state.ranges = Some(ActivationRanges::calibrate(
                &state.network,
                &frames,
                state.params.perc_sample,
                &mut state.rng,
            ));
        }

        let (val_loss, val_snr) = evaluate(state, &data.validation);

        let stats = EpochStats {
            epoch,
            total_epochs,
            train_loss,
            val_loss,
            val_snr,
            elapsed_ms: t_start.elapsed().as_millis() as u64,
        };
        history.record(&stats);

        if state.params.verbose {
            info!(epoch, total_epochs, train_loss, val_loss, val_snr, elapsed_ms = stats.elapsed_ms, "epoch complete");
        } else {
            debug!(epoch, total_epochs, train_loss, val_loss, val_snr, elapsed_ms = stats.elapsed_ms, "epoch complete");
        }

        on_epoch(&stats, state)?;
    }

    Ok(())
}

/// Mean validation loss and mean per-utterance SNR (dB).
///
/// With quantization enabled and a calibration available the network is
/// evaluated through its fake-quantized view. Returns `NaN`s when there are
/// no validation utterances.
pub fn evaluate(state: &TrainState, utterances: &[Utterance]) -> (f64, f64) {
    match (state.params.n_bits, &state.ranges) {
        (Some(bits), Some(ranges)) => {
            let quantized = QuantizedNetwork::new(&state.network, ranges.clone(), Quantizer::new(bits));
            evaluate_with(|x| quantized.infer(x), utterances)
        }
        _ => evaluate_with(|x| state.network.infer(x), utterances),
    }
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

/// One pass of mini-batch Adam over all `bptt_steps`-frame windows.
/// Returns the mean loss over all frames.
fn run_one_epoch(state: &mut TrainState, utterances: &[Utterance]) -> f64 {
    let window = state.params.bptt_steps.max(1);

    let mut windows: Vec<(usize, usize)> = utterances.iter()
        .enumerate()
        .flat_map(|(u, utt)| (0..utt.frames()).step_by(window).map(move |start| (u, start)))
        .collect();
    if windows.is_empty() {
        return f64::NAN;
    }
    windows.shuffle(&mut state.rng);

    let mut total_loss = 0.0;
    let mut total_frames = 0usize;

    for batch in windows.chunks(state.params.batch_size.max(1)) {
        let mut grads = state.network.zero_grads();
        let mut batch_frames = 0usize;

        for &(u, start) in batch {
            let utt = &utterances[u];
            let end = (start + window).min(utt.frames());
            for t in start..end {
                let mixture = &utt.mixture[t];
                let clean = &utt.clean[t];

                let mask = state.network.feed_from(mixture);
                total_loss += MaskedMseLoss::loss(&mask, mixture, clean);

                let delta = MaskedMseLoss::derivative(&mask, mixture, clean);
                state.network.backward(&delta, &mut grads);
                batch_frames += 1;
            }
        }

        if batch_frames == 0 {
            continue;
        }
        let inv_batch = 1.0 / batch_frames as f64;
        grads.iter_mut().for_each(|g| g.scale(inv_batch));
        clip_global_norm(&mut grads, state.params.clip_value);
        state.optimizer.step(&mut state.network.layers, &grads);

        total_frames += batch_frames;
    }

    total_loss / total_frames.max(1) as f64
}

fn evaluate_with<F>(infer: F, utterances: &[Utterance]) -> (f64, f64)
where
    F: Fn(&[f64]) -> Vec<f64>,
{
    if utterances.is_empty() {
        return (f64::NAN, f64::NAN);
    }

    let mut total_loss = 0.0;
    let mut total_frames = 0usize;
    let mut total_snr = 0.0;

    for utt in utterances {
        let mut estimate = Vec::with_capacity(utt.frames());
        for (mixture, clean) in utt.mixture.iter().zip(&utt.clean) {
            let mask = infer(mixture.as_slice());
            total_loss += MaskedMseLoss::loss(&mask, mixture, clean);
            estimate.push(MaskedMseLoss::apply_mask(&mask, mixture));
            total_frames += 1;
        }
        total_snr += snr_db(&utt.clean, &estimate);
    }

    (
        total_loss / total_frames.max(1) as f64,
        total_snr / utterances.len() as f64,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DataSize, NoiseCount};
    use crate::network::spec::MaskNetSpec;
    use rand::SeedableRng;

    fn config() -> RunConfig {
        RunConfig {
            n_features: 8,
            n_layers: 1,
            state_size: 12,
            n_epochs: 4,
            batch_size: 4,
            bptt_steps: 8,
            learning_rate: 0.01,
            ..RunConfig::default()
        }
    }

    fn state(config: &RunConfig) -> TrainState {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let network = MaskNetwork::new(MaskNetSpec::from_config(config), config.gain, &mut rng);
        let optimizer = Adam::new(config.learning_rate, config.beta1, config.beta2, &network.layers);
        TrainState { network, optimizer, params: EpochParams::from_config(config), rng, ranges: None }
    }

    fn data() -> SourceSeparationDataSet {
        SourceSeparationDataSet::synthesize(8, DataSize::Small, NoiseCount::Few, 11)
    }

    #[test]
    fn test_train_loop_records_every_epoch_and_lowers_loss() {
        let config = config();
        let mut state = state(&config);
        let mut history = MetricHistory::new();
        let mut seen = Vec::new();

        train_loop(&mut state, &data(), &TrainControl::new(), &mut history, |stats, _| {
            seen.push(stats.epoch);
            Ok(())
        })
        .unwrap();

        assert_eq!(seen, vec![1, 2, 3, 4]);
        assert_eq!(history.len(), 4);
        assert!(history.train_loss()[3] < history.train_loss()[0]);
        assert!(state.ranges.is_some());
        assert!(state.optimizer.steps() > 0);
    }

    #[test]
    fn test_stopped_control_runs_no_epochs() {
        let config = config();
        let mut state = state(&config);
        let mut history = MetricHistory::new();
        let control = TrainControl::new();
        control.request_stop();

        train_loop(&mut state, &data(), &control, &mut history, |_, _| Ok(())).unwrap();

        assert!(history.is_empty());
    }

    #[test]
    fn test_full_precision_evaluation_without_validation_is_nan() {
        let config = RunConfig { n_bits: None, ..config() };
        let state = state(&config);
        let (loss, snr) = evaluate(&state, &[]);
        assert!(loss.is_nan() && snr.is_nan());

        let (loss, snr) = evaluate(&state, &data().validation);
        assert!(loss.is_finite() && snr.is_finite());
    }
}
