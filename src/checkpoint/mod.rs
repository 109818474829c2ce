pub mod resolver;
pub mod store;

pub use resolver::{resolve, ResolvedRun, RunOutcome, RunState};
pub use store::{load_json, save_json, CheckpointDir};
