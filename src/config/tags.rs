use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Dataset size selector handed to the `DataProvider`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum DataSize {
    Small,
    Medium,
    Large,
    Xlarge,
}

impl DataSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSize::Small  => "small",
            DataSize::Medium => "medium",
            DataSize::Large  => "large",
            DataSize::Xlarge => "xlarge",
        }
    }
}

impl fmt::Display for DataSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How many distinct noise sources the dataset mixes in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum NoiseCount {
    Few,
    Many,
}

impl NoiseCount {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoiseCount::Few  => "few",
            NoiseCount::Many => "many",
        }
    }
}

impl fmt::Display for NoiseCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which config fields go into a run label.
///
/// - `Brief`: timestamp and learning rate only (basic `train` front end).
/// - `Full`: pretrain flag, batch, window, data/noise tags and quantization
///   bits up front, optimizer fields after training (`experiment`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelScheme {
    Brief,
    Full,
}
