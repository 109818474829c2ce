use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::tags::{DataSize, LabelScheme, NoiseCount};
use crate::error::{RunError, RunResult};

/// Every hyperparameter of one training run.
///
/// Built once from the command line and only ever passed around by shared
/// reference afterwards. Anything derived during the run (effective epoch
/// count, best SNR) lives in `RunOutcome`, not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub learning_rate: f64,
    pub batch_size: usize,
    /// Truncated backprop window, in frames.
    pub bptt_steps: usize,
    pub n_epochs: usize,
    pub gpu_id: u32,
    pub n_features: usize,
    /// Quantization precision; `None` trains and evaluates in full precision.
    pub n_bits: Option<u32>,
    pub n_layers: usize,
    pub state_size: usize,
    /// Global gradient-norm clip; `0.0` disables clipping.
    pub clip_value: f64,
    pub data_size: DataSize,
    pub noise_count: NoiseCount,
    pub is_pretrain: bool,
    pub gain: f64,
    pub beta1: f64,
    pub beta2: f64,
    /// Fraction of training frames sampled for quantization calibration.
    pub perc_sample: f64,
    pub dir_models: PathBuf,
    pub dir_results: PathBuf,
    pub pickled_data_path: Option<PathBuf>,
    pub model_name: Option<String>,
    pub verbose: bool,
    pub label_scheme: LabelScheme,
    pub seed: u64,
    pub time_limit_secs: Option<u64>,
    pub save_data_path: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            learning_rate:     0.001,
            batch_size:        32,
            bptt_steps:        30,
            n_epochs:          10,
            gpu_id:            0,
            n_features:        513,
            n_bits:            Some(4),
            n_layers:          2,
            state_size:        1024,
            clip_value:        5.0,
            data_size:         DataSize::Small,
            noise_count:       NoiseCount::Few,
            is_pretrain:       false,
            gain:              1.0,
            beta1:             0.9,
            beta2:             0.999,
            perc_sample:       0.1,
            dir_models:        PathBuf::from("Saved_Models"),
            dir_results:       PathBuf::from("Saved_Results"),
            pickled_data_path: None,
            model_name:        None,
            verbose:           false,
            label_scheme:      LabelScheme::Brief,
            seed:              0,
            time_limit_secs:   None,
            save_data_path:    None,
        }
    }
}

impl RunConfig {
    /// The resume target, ignoring an empty or whitespace-only name.
    pub fn resume_target(&self) -> Option<&str> {
        self.model_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_secs.map(Duration::from_secs)
    }

    /// Range checks clap cannot express on its own.
    pub fn validate(&self) -> RunResult<()> {
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(invalid("learning_rate must be > 0"));
        }
        if self.batch_size == 0 {
            return Err(invalid("batch_sz must be >= 1"));
        }
        if self.bptt_steps == 0 {
            return Err(invalid("bptt must be >= 1"));
        }
        if self.n_features == 0 || self.n_layers == 0 || self.state_size == 0 {
            return Err(invalid("feat, n_layers and state_sz must all be >= 1"));
        }
        if let Some(bits) = self.n_bits {
            if !(2..=16).contains(&bits) {
                return Err(invalid("n_bits must be between 2 and 16"));
            }
        }
        if !self.clip_value.is_finite() || self.clip_value < 0.0 {
            return Err(invalid("clip_val must be >= 0"));
        }
        if !self.gain.is_finite() || self.gain <= 0.0 {
            return Err(invalid("gain must be > 0"));
        }
        for (name, beta) in [("beta1", self.beta1), ("beta2", self.beta2)] {
            if !(0.0..1.0).contains(&beta) {
                return Err(RunError::InvalidConfig(format!("{name} must be in [0, 1)")));
            }
        }
        if !(self.perc_sample > 0.0 && self.perc_sample <= 1.0) {
            return Err(invalid("perc must be in (0, 1]"));
        }
        if let Some(name) = self.resume_target() {
            let escapes = Path::new(name).components().any(|c| {
                matches!(c, Component::RootDir | Component::ParentDir | Component::Prefix(_))
            });
            if escapes {
                return Err(RunError::InvalidConfig(format!(
                    "model_nm {name:?} must be a path relative to dir_models without '..'"
                )));
            }
        }
        Ok(())
    }
}

fn invalid(msg: &str) -> RunError {
    RunError::InvalidConfig(msg.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(RunConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range_values() {
        let bad = [
            RunConfig { learning_rate: 0.0, ..RunConfig::default() },
            RunConfig { batch_size: 0, ..RunConfig::default() },
            RunConfig { n_bits: Some(1), ..RunConfig::default() },
            RunConfig { beta2: 1.0, ..RunConfig::default() },
            RunConfig { perc_sample: 0.0, ..RunConfig::default() },
            RunConfig { clip_value: -1.0, ..RunConfig::default() },
        ];
        for config in bad {
            assert!(matches!(config.validate(), Err(RunError::InvalidConfig(_))), "{config:?}");
        }
    }

    #[test]
    fn test_validate_keeps_model_name_inside_models_dir() {
        let named = |name: &str| RunConfig { model_name: Some(name.into()), ..RunConfig::default() };

        assert!(named("run1").validate().is_ok());
        assert!(named("sweep/run1").validate().is_ok());
        for name in ["/tmp/x", "../other", "sweep/../../x"] {
            assert!(matches!(named(name).validate(), Err(RunError::InvalidConfig(_))), "{name}");
        }
    }

    #[test]
    fn test_resume_target_ignores_blank_names() {
        let blank = RunConfig { model_name: Some("  ".into()), ..RunConfig::default() };
        assert_eq!(blank.resume_target(), None);

        let named = RunConfig { model_name: Some("run1".into()), ..RunConfig::default() };
        assert_eq!(named.resume_target(), Some("run1"));
    }
}
