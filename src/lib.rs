pub mod activation;
pub mod checkpoint;
pub mod config;
pub mod data;
pub mod device;
pub mod error;
pub mod identity;
pub mod layers;
pub mod loss;
pub mod math;
pub mod metrics;
pub mod model;
pub mod network;
pub mod optim;
pub mod orchestrator;
pub mod quant;
pub mod report;
pub mod train;

// Convenience re-exports
pub use checkpoint::{resolve, ResolvedRun, RunOutcome, RunState};
pub use config::{Cli, RunConfig};
pub use data::{DataProvider, SourceSeparationDataSet, SyntheticProvider};
pub use device::Device;
pub use error::{RunError, RunResult};
pub use identity::RunLabel;
pub use model::{MaskNet, MaskNetBuilder};
pub use orchestrator::{RunSummary, TrainingOrchestrator};
pub use report::{PngReporter, ResultReporter};
pub use train::{MetricHistory, ModelBuilder, ModelInit, TrainControl, TrainableModel};
