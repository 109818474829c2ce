use std::path::Path;

use crate::config::{DataSize, NoiseCount, RunConfig};
use crate::data::dataset::SourceSeparationDataSet;
use crate::error::{RunError, RunResult};

/// Source of the dataset a run trains on.
pub trait DataProvider {
    type Data;

    /// Builds a dataset for the given size and noise selectors.
    fn build(&self, size: DataSize, noise: NoiseCount) -> RunResult<Self::Data>;

    /// Restores a dataset previously written by `persist`, bypassing `build`.
    fn restore(&self, path: &Path) -> RunResult<Self::Data>;

    fn persist(&self, data: &Self::Data, path: &Path) -> RunResult<()>;
}

/// Provides `SourceSeparationDataSet`s synthesized from a fixed seed.
#[derive(Debug, Clone)]
pub struct SyntheticProvider {
    pub n_features: usize,
    pub seed: u64,
}

impl SyntheticProvider {
    pub fn new(n_features: usize, seed: u64) -> Self {
        SyntheticProvider { n_features, seed }
    }

    pub fn from_config(config: &RunConfig) -> Self {
        SyntheticProvider::new(config.n_features, config.seed)
    }
}

impl DataProvider for SyntheticProvider {
    type Data = SourceSeparationDataSet;

    fn build(&self, size: DataSize, noise: NoiseCount) -> RunResult<SourceSeparationDataSet> {
        Ok(SourceSeparationDataSet::synthesize(self.n_features, size, noise, self.seed))
    }

    fn restore(&self, path: &Path) -> RunResult<SourceSeparationDataSet> {
        let data = SourceSeparationDataSet::load_json(path)?;
        if data.n_features != self.n_features {
            return Err(RunError::Dataset(format!(
                "{} holds {}-bin frames but the run expects {}",
                path.display(),
                data.n_features,
                self.n_features
            )));
        }
        Ok(data)
    }

    fn persist(&self, data: &SourceSeparationDataSet, path: &Path) -> RunResult<()> {
        data.save_json(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_restore_rejects_feature_mismatch() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("data.json");
        let writer = SyntheticProvider::new(8, 0);
        let data = writer.build(DataSize::Small, NoiseCount::Few).unwrap();
        writer.persist(&data, &path).unwrap();

        assert!(writer.restore(&path).is_ok());
        let err = SyntheticProvider::new(16, 0).restore(&path).unwrap_err();
        assert!(matches!(err, RunError::Dataset(_)));
    }
}
