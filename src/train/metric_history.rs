use serde::{Deserialize, Serialize};

use crate::train::epoch_stats::EpochStats;

/// Per-epoch metric sequences of one run.
///
/// The three sequences always have equal length: the only way to grow them
/// is `record`, which appends one entry to each.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricHistory {
    train_loss: Vec<f64>,
    val_loss: Vec<f64>,
    val_snr: Vec<f64>,
}

impl MetricHistory {
    pub fn new() -> Self {
        MetricHistory::default()
    }

    pub fn record(&mut self, stats: &EpochStats) {
        self.train_loss.push(stats.train_loss);
        self.val_loss.push(stats.val_loss);
        self.val_snr.push(stats.val_snr);
    }

    /// Appends every entry of `later` after this history's entries.
    pub fn extend(&mut self, later: &MetricHistory) {
        self.train_loss.extend_from_slice(&later.train_loss);
        self.val_loss.extend_from_slice(&later.val_loss);
        self.val_snr.extend_from_slice(&later.val_snr);
    }

    /// Number of completed epochs.
    pub fn len(&self) -> usize {
        self.train_loss.len()
    }

    pub fn is_empty(&self) -> bool {
        self.train_loss.is_empty()
    }

    pub fn train_loss(&self) -> &[f64] {
        &self.train_loss
    }

    pub fn val_loss(&self) -> &[f64] {
        &self.val_loss
    }

    pub fn val_snr(&self) -> &[f64] {
        &self.val_snr
    }

    /// Highest validation SNR seen, ignoring NaN entries.
    pub fn best_val_snr(&self) -> Option<f64> {
        self.val_snr
            .iter()
            .copied()
            .filter(|snr| !snr.is_nan())
            .fold(None, |best, snr| match best {
                Some(b) if b >= snr => Some(b),
                _ => Some(snr),
            })
    }
}
