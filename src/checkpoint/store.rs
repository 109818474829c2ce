use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::RunConfig;
use crate::error::RunResult;

/// Serializes `value` to a pretty-printed JSON file, replacing any existing one.
pub fn save_json<T: Serialize>(path: &Path, value: &T) -> RunResult<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, value)?;
    Ok(())
}

/// Deserializes a value from a JSON file previously written by `save_json`.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> RunResult<T> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    Ok(serde_json::from_reader(reader)?)
}

/// Files inside one checkpoint directory (`<dir_models>/<label>/`).
#[derive(Debug, Clone)]
pub struct CheckpointDir {
    root: PathBuf,
}

impl CheckpointDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        CheckpointDir { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn exists(&self) -> bool {
        self.root.is_dir()
    }

    /// Snapshot of the config that produced (or last resumed) this checkpoint.
    pub fn config_path(&self) -> PathBuf {
        self.root.join("config.json")
    }

    /// Model weights plus whatever state the backend needs to restore.
    pub fn model_path(&self) -> PathBuf {
        self.root.join("model.json")
    }

    /// Config of a later run that resumed this checkpoint, keyed by that
    /// run's timestamp token so the original `config.json` is kept.
    pub fn resume_config_path(&self, token: &str) -> PathBuf {
        self.root.join(format!("resume_{token}.json"))
    }

    /// Per-epoch metric history, appended to by continued runs.
    pub fn history_path(&self) -> PathBuf {
        self.root.join("history.json")
    }

    pub fn ensure(&self) -> RunResult<()> {
        std::fs::create_dir_all(&self.root)?;
        Ok(())
    }

    pub fn write_config(&self, config: &RunConfig) -> RunResult<()> {
        self.ensure()?;
        save_json(&self.config_path(), config)
    }

    /// Snapshots a resuming run's config without touching `config.json`.
    pub fn write_resume_config(&self, token: &str, config: &RunConfig) -> RunResult<PathBuf> {
        let path = self.resume_config_path(token);
        save_json(&path, config)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_checkpoint_dir_layout() {
        let temp = TempDir::new().unwrap();
        let dir = CheckpointDir::new(temp.path().join("10.16(14:05)_lr:0.001"));

        assert!(!dir.exists());
        assert!(dir.model_path().ends_with("model.json"));
        assert!(dir.history_path().starts_with(dir.root()));
    }

    #[test]
    fn test_write_config_creates_directory_and_snapshot() {
        let temp = TempDir::new().unwrap();
        let dir = CheckpointDir::new(temp.path().join("run"));
        let config = RunConfig { n_epochs: 3, ..RunConfig::default() };

        dir.write_config(&config).unwrap();

        assert!(dir.exists());
        let restored: RunConfig = load_json(&dir.config_path()).unwrap();
        assert_eq!(restored, config);
    }

    #[test]
    fn test_resume_config_leaves_original_snapshot() {
        let temp = TempDir::new().unwrap();
        let dir = CheckpointDir::new(temp.path().join("run"));
        let original = RunConfig { n_epochs: 3, ..RunConfig::default() };
        dir.write_config(&original).unwrap();

        let resumed = RunConfig { n_epochs: 0, ..RunConfig::default() };
        let path = dir.write_resume_config("10.17(09:30)", &resumed).unwrap();

        assert!(path.ends_with("resume_10.17(09:30).json"));
        assert_eq!(load_json::<RunConfig>(&dir.config_path()).unwrap(), original);
        assert_eq!(load_json::<RunConfig>(&path).unwrap(), resumed);
    }

    #[test]
    fn test_load_json_surfaces_missing_files() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("absent.json");
        assert!(load_json::<RunConfig>(&missing).is_err());
    }
}
