pub mod dataset;
pub mod provider;

pub use dataset::{SourceSeparationDataSet, Utterance};
pub use provider::{DataProvider, SyntheticProvider};
