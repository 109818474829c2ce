use std::fmt;

use chrono::NaiveDateTime;

use crate::config::{DataSize, LabelScheme, NoiseCount, RunConfig};

/// Minute-granularity timestamp token, e.g. `10.16(14:05)`.
pub const TIMESTAMP_FORMAT: &str = "%m.%d(%H:%M)";

pub fn timestamp_token(at: &NaiveDateTime) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Renders a metric with one decimal digit, ties rounded away from zero
/// (`7.25` -> `7.3`).
pub fn format_metric(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let rounded = (value * 10.0).round() / 10.0;
    // Avoid "-0.0" for tiny negative values.
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    format!("{:.1}", rounded)
}

/// Optimizer hyperparameters that only describe runs which actually trained.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptimizerFields {
    pub learning_rate: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub gain: f64,
}

impl OptimizerFields {
    pub fn from_config(config: &RunConfig) -> Self {
        OptimizerFields {
            learning_rate: config.learning_rate,
            beta1:         config.beta1,
            beta2:         config.beta2,
            gain:          config.gain,
        }
    }
}

/// Deterministic identity of a run, used as checkpoint directory name before
/// training and as result file stem after it.
///
/// Every field is optional; `Display` writes the stem followed by
/// `_key:value` for each present field in a fixed order:
/// `pre, bs, bptt, data, noise, bits, ep, lr, b1, b2, g, SNR`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RunLabel {
    stem: String,
    pretrain: Option<bool>,
    batch_size: Option<usize>,
    bptt: Option<usize>,
    data_size: Option<DataSize>,
    noise_count: Option<NoiseCount>,
    n_bits: Option<u32>,
    n_epochs: Option<usize>,
    learning_rate: Option<f64>,
    beta1: Option<f64>,
    beta2: Option<f64>,
    gain: Option<f64>,
    best_snr: Option<f64>,
}

impl RunLabel {
    /// Label of a fresh run, built before training starts.
    pub fn base(config: &RunConfig, at: &NaiveDateTime) -> RunLabel {
        let stem = timestamp_token(at);
        match config.label_scheme {
            LabelScheme::Brief => RunLabel {
                stem,
                learning_rate: Some(config.learning_rate),
                ..RunLabel::default()
            },
            LabelScheme::Full => RunLabel {
                stem,
                pretrain:    Some(config.is_pretrain),
                batch_size:  Some(config.batch_size),
                bptt:        Some(config.bptt_steps),
                data_size:   Some(config.data_size),
                noise_count: Some(config.noise_count),
                n_bits:      config.n_bits,
                ..RunLabel::default()
            },
        }
    }

    /// Label rooted at an externally supplied checkpoint name.
    pub fn from_model_name(name: &str) -> RunLabel {
        RunLabel { stem: sanitize(name), ..RunLabel::default() }
    }

    /// Re-keys this label with the outcome of a run.
    ///
    /// `optimizer` is `Some` for runs that trained; the `Full` scheme then
    /// records the epoch count and every optimizer field. `None` marks an
    /// evaluation of a restored model: the epoch field is always written and
    /// all optimizer fields are dropped.
    pub fn result(
        self,
        scheme: LabelScheme,
        n_epochs: usize,
        optimizer: Option<OptimizerFields>,
        best_snr: Option<f64>,
    ) -> RunLabel {
        let mut label = RunLabel { best_snr, ..self };
        match optimizer {
            Some(opt) => {
                label.learning_rate = Some(opt.learning_rate);
                if scheme == LabelScheme::Full {
                    label.n_epochs = Some(n_epochs);
                    label.beta1 = Some(opt.beta1);
                    label.beta2 = Some(opt.beta2);
                    label.gain = Some(opt.gain);
                }
            }
            None => {
                label.n_epochs = Some(n_epochs);
                label.learning_rate = None;
                label.beta1 = None;
                label.beta2 = None;
                label.gain = None;
            }
        }
        label
    }

    pub fn stem(&self) -> &str {
        &self.stem
    }

    pub fn n_epochs(&self) -> Option<usize> {
        self.n_epochs
    }

    pub fn learning_rate(&self) -> Option<f64> {
        self.learning_rate
    }

    pub fn best_snr(&self) -> Option<f64> {
        self.best_snr
    }
}

impl fmt::Display for RunLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.stem)?;
        if let Some(pre) = self.pretrain {
            write!(f, "_pre:{}", u8::from(pre))?;
        }
        if let Some(bs) = self.batch_size {
            write!(f, "_bs:{bs}")?;
        }
        if let Some(bptt) = self.bptt {
            write!(f, "_bptt:{bptt}")?;
        }
        if let Some(data) = self.data_size {
            write!(f, "_data:{data}")?;
        }
        if let Some(noise) = self.noise_count {
            write!(f, "_noise:{noise}")?;
        }
        if let Some(bits) = self.n_bits {
            write!(f, "_bits:{bits}")?;
        }
        if let Some(ep) = self.n_epochs {
            write!(f, "_ep:{ep}")?;
        }
        if let Some(lr) = self.learning_rate {
            write!(f, "_lr:{lr}")?;
        }
        if let Some(b1) = self.beta1 {
            write!(f, "_b1:{b1}")?;
        }
        if let Some(b2) = self.beta2 {
            write!(f, "_b2:{b2}")?;
        }
        if let Some(g) = self.gain {
            write!(f, "_g:{g}")?;
        }
        if let Some(snr) = self.best_snr {
            write!(f, "_SNR:{}", format_metric(snr))?;
        }
        Ok(())
    }
}

fn sanitize(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '-' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap().and_hms_opt(14, 5, 42).unwrap()
    }

    fn full() -> RunConfig {
        RunConfig { label_scheme: LabelScheme::Full, ..RunConfig::default() }
    }

    #[test]
    fn test_timestamp_token_is_minute_granular_and_bracketed() {
        assert_eq!(timestamp_token(&at()), "10.16(14:05)");
    }

    #[test]
    fn test_base_label_is_deterministic() {
        for config in [RunConfig::default(), full()] {
            assert_eq!(
                RunLabel::base(&config, &at()).to_string(),
                RunLabel::base(&config, &at()).to_string()
            );
        }
    }

    #[test]
    fn test_brief_base_label_layout() {
        assert_eq!(RunLabel::base(&RunConfig::default(), &at()).to_string(), "10.16(14:05)_lr:0.001");
    }

    #[test]
    fn test_full_base_label_layout() {
        assert_eq!(
            RunLabel::base(&full(), &at()).to_string(),
            "10.16(14:05)_pre:0_bs:32_bptt:30_data:small_noise:few_bits:4"
        );
    }

    #[test]
    fn test_full_base_label_changes_with_every_field() {
        let reference = RunLabel::base(&full(), &at()).to_string();
        let variants = [
            RunConfig { is_pretrain: true, ..full() },
            RunConfig { batch_size: 64, ..full() },
            RunConfig { bptt_steps: 31, ..full() },
            RunConfig { data_size: DataSize::Xlarge, ..full() },
            RunConfig { noise_count: NoiseCount::Many, ..full() },
            RunConfig { n_bits: Some(8), ..full() },
            RunConfig { n_bits: None, ..full() },
        ];
        for config in variants {
            assert_ne!(RunLabel::base(&config, &at()).to_string(), reference, "{config:?}");
        }

        let later = at() + chrono::Duration::minutes(1);
        assert_ne!(RunLabel::base(&full(), &later).to_string(), reference);
    }

    #[test]
    fn test_brief_base_label_changes_with_learning_rate() {
        let a = RunLabel::base(&RunConfig::default(), &at());
        let b = RunLabel::base(&RunConfig { learning_rate: 0.002, ..RunConfig::default() }, &at());
        assert_ne!(a.to_string(), b.to_string());
    }

    #[test]
    fn test_labels_never_contain_path_separators() {
        let labels = [
            RunLabel::base(&full(), &at()),
            RunLabel::from_model_name("nested/run\\one").result(LabelScheme::Full, 0, None, Some(3.0)),
            RunLabel::base(&RunConfig::default(), &at()).result(
                LabelScheme::Brief,
                10,
                Some(OptimizerFields::from_config(&RunConfig::default())),
                Some(1.0),
            ),
        ];
        for label in labels {
            let text = label.to_string();
            assert!(!text.contains('/') && !text.contains('\\'), "{text}");
        }
    }

    #[test]
    fn test_metric_is_rounded_to_one_decimal() {
        assert_eq!(format_metric(7.25), "7.3");
        assert_eq!(format_metric(8.42), "8.4");
        assert_eq!(format_metric(-0.04), "0.0");
        assert_eq!(format_metric(12.0), "12.0");
    }

    #[test]
    fn test_full_result_label_carries_outcome_and_optimizer() {
        let config = full();
        let label = RunLabel::base(&config, &at()).result(
            LabelScheme::Full,
            10,
            Some(OptimizerFields::from_config(&config)),
            Some(8.42),
        );
        assert_eq!(
            label.to_string(),
            "10.16(14:05)_pre:0_bs:32_bptt:30_data:small_noise:few_bits:4_ep:10_lr:0.001_b1:0.9_b2:0.999_g:1_SNR:8.4"
        );
    }

    #[test]
    fn test_brief_result_label_appends_only_the_metric() {
        let config = RunConfig::default();
        let label = RunLabel::base(&config, &at()).result(
            LabelScheme::Brief,
            10,
            Some(OptimizerFields::from_config(&config)),
            Some(7.25),
        );
        assert_eq!(label.to_string(), "10.16(14:05)_lr:0.001_SNR:7.3");
    }

    #[test]
    fn test_evaluation_label_drops_optimizer_fields() {
        let label = RunLabel::from_model_name("run1").result(LabelScheme::Full, 0, None, Some(5.56));
        assert_eq!(label.to_string(), "run1_ep:0_SNR:5.6");
        assert_eq!(label.learning_rate(), None);
    }
}
