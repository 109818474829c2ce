pub mod run_label;

pub use run_label::{format_metric, timestamp_token, OptimizerFields, RunLabel, TIMESTAMP_FORMAT};
