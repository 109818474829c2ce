pub mod epoch_stats;
pub mod loop_fn;
pub mod metric_history;
pub mod model;
pub mod train_control;

pub use epoch_stats::EpochStats;
pub use loop_fn::{evaluate, train_loop, TrainState};
pub use metric_history::MetricHistory;
pub use model::{ModelBuilder, ModelInit, TrainableModel};
pub use train_control::TrainControl;
