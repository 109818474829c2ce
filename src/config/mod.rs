pub mod cli;
pub mod run_config;
pub mod tags;

pub use cli::Cli;
pub use run_config::RunConfig;
pub use tags::{DataSize, LabelScheme, NoiseCount};
