use std::path::PathBuf;

use chrono::NaiveDateTime;

use crate::config::RunConfig;
use crate::identity::{OptimizerFields, RunLabel};
use crate::train::metric_history::MetricHistory;

/// How a run relates to any existing checkpoint. Derived from the config,
/// never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Fresh,
    /// Restores `model_name` and keeps training it.
    ResumeContinue,
    /// Restores `model_name` to report on it. Training still runs, but the
    /// label records zero epochs and no optimizer settings.
    ResumeEvalOnly,
}

impl RunState {
    pub fn from_config(config: &RunConfig) -> RunState {
        match (config.resume_target(), config.is_pretrain) {
            (None, _) => RunState::Fresh,
            (Some(_), true) => RunState::ResumeContinue,
            (Some(_), false) => RunState::ResumeEvalOnly,
        }
    }

    pub fn is_restore(&self) -> bool {
        !matches!(self, RunState::Fresh)
    }
}

/// What training actually produced, kept apart from the config.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunOutcome {
    /// Epoch count written into the result label.
    pub effective_epochs: usize,
    /// `None` when no epoch completed.
    pub best_snr: Option<f64>,
}

impl RunOutcome {
    /// `best_snr` comes from the model, which may report an SNR for a
    /// restored network even when no epoch completed.
    pub fn from_run(state: RunState, completed_epochs: usize, best_snr: Option<f64>) -> RunOutcome {
        let effective_epochs = match state {
            RunState::ResumeEvalOnly => 0,
            RunState::Fresh | RunState::ResumeContinue => completed_epochs,
        };
        RunOutcome { effective_epochs, best_snr }
    }

    pub fn from_history(state: RunState, history: &MetricHistory) -> RunOutcome {
        RunOutcome::from_run(state, history.len(), history.best_val_snr())
    }
}

/// Run state, pre-training label and checkpoint location for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRun {
    pub state: RunState,
    pub label: RunLabel,
    pub model_path: PathBuf,
}

impl ResolvedRun {
    pub fn is_restore(&self) -> bool {
        self.state.is_restore()
    }

    /// Label for the run's results.
    pub fn result_label(&self, config: &RunConfig, outcome: &RunOutcome) -> RunLabel {
        let optimizer = match self.state {
            RunState::ResumeEvalOnly => None,
            RunState::Fresh | RunState::ResumeContinue => Some(OptimizerFields::from_config(config)),
        };
        self.label.clone().result(config.label_scheme, outcome.effective_epochs, optimizer, outcome.best_snr)
    }
}

/// Decides fresh vs. resume and where the checkpoint lives.
///
/// A resumed checkpoint is located by the raw (trimmed) model name; only its
/// label is sanitized. Whether that directory exists is left to the backend.
pub fn resolve(config: &RunConfig, started_at: &NaiveDateTime) -> ResolvedRun {
    let state = RunState::from_config(config);
    match config.resume_target() {
        Some(name) => ResolvedRun {
            state,
            label: RunLabel::from_model_name(name),
            model_path: config.dir_models.join(name),
        },
        None => {
            let label = RunLabel::base(config, started_at);
            let model_path = config.dir_models.join(label.to_string());
            ResolvedRun { state, label, model_path }
        }
    }
}
