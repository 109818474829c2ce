use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::checkpoint::store::{load_json, save_json};
use crate::config::{DataSize, NoiseCount};
use crate::error::{RunError, RunResult};

/// Frames per synthesized utterance.
pub const FRAMES_PER_UTTERANCE: usize = 48;

/// Every n-th utterance is held out for validation.
const VALIDATION_STRIDE: usize = 5;

/// One utterance as magnitude frames of `n_features` bins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Utterance {
    pub mixture: Vec<Vec<f64>>,
    pub clean: Vec<Vec<f64>>,
}

impl Utterance {
    pub fn frames(&self) -> usize {
        self.mixture.len()
    }
}

/// Train/validation split of mixture/clean magnitude pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSeparationDataSet {
    pub n_features: usize,
    pub data_size: DataSize,
    pub noise_count: NoiseCount,
    pub seed: u64,
    pub train: Vec<Utterance>,
    pub validation: Vec<Utterance>,
}

/// Colored-noise profile: `level / (1 + bin)^tilt`, jittered per frame.
#[derive(Debug, Clone, Copy)]
struct NoiseProfile {
    level: f64,
    tilt: f64,
}

pub fn utterance_count(size: DataSize) -> usize {
    match size {
        DataSize::Small  => 24,
        DataSize::Medium => 96,
        DataSize::Large  => 384,
        DataSize::Xlarge => 1536,
    }
}

pub fn noise_bank_size(noise: NoiseCount) -> usize {
    match noise {
        NoiseCount::Few  => 2,
        NoiseCount::Many => 8,
    }
}

impl SourceSeparationDataSet {
    /// Builds a dataset of harmonic sources mixed with colored noise.
    ///
    /// The result depends only on the arguments; the same `seed` always
    /// produces the same frames.
    pub fn synthesize(
        n_features: usize,
        data_size: DataSize,
        noise_count: NoiseCount,
        seed: u64,
    ) -> SourceSeparationDataSet {
        let mut rng = StdRng::seed_from_u64(seed);

        let bank: Vec<NoiseProfile> = (0..noise_bank_size(noise_count))
            .map(|_| NoiseProfile {
                level: rng.gen_range(0.1..0.5),
                tilt:  rng.gen_range(0.0..1.5),
            })
            .collect();

        let mut train = Vec::new();
        let mut validation = Vec::new();
        for i in 0..utterance_count(data_size) {
            let profile = bank[rng.gen_range(0..bank.len())];
            let utterance = synth_utterance(&mut rng, n_features, profile);
            if i % VALIDATION_STRIDE == VALIDATION_STRIDE - 1 {
                validation.push(utterance);
            } else {
                train.push(utterance);
            }
        }

        SourceSeparationDataSet { n_features, data_size, noise_count, seed, train, validation }
    }

    pub fn train_frames(&self) -> usize {
        self.train.iter().map(Utterance::frames).sum()
    }

    /// Serializes the dataset so a later run can restore it instead of
    /// synthesizing again.
    pub fn save_json(&self, path: &Path) -> RunResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        save_json(path, self)
    }

    pub fn load_json(path: &Path) -> RunResult<SourceSeparationDataSet> {
        load_json(path).map_err(|e| {
            RunError::Dataset(format!("cannot restore dataset from {}: {e}", path.display()))
        })
    }
}

fn synth_utterance(rng: &mut StdRng, n_features: usize, noise: NoiseProfile) -> Utterance {
    let upper_f0 = (n_features as f64 / 12.0).max(3.0);
    let f0 = rng.gen_range(2.0..upper_f0);
    let decay = rng.gen_range(0.5..0.9);
    let rate = rng.gen_range(0.05..0.3);
    let phase = rng.gen_range(0.0..std::f64::consts::PI);

    let mut mixture = Vec::with_capacity(FRAMES_PER_UTTERANCE);
    let mut clean = Vec::with_capacity(FRAMES_PER_UTTERANCE);

    for t in 0..FRAMES_PER_UTTERANCE {
        let envelope = 0.2 + 0.8 * (rate * t as f64 + phase).sin().abs();

        let mut source = vec![0.0; n_features];
        let mut amp = envelope;
        let mut harmonic = 1.0;
        while f0 * harmonic < n_features as f64 {
            let bin = (f0 * harmonic).round() as usize;
            if bin < n_features {
                source[bin] += amp;
            }
            if bin + 1 < n_features {
                source[bin + 1] += 0.3 * amp;
            }
            if bin > 0 && bin - 1 < n_features {
                source[bin - 1] += 0.3 * amp;
            }
            amp *= decay;
            harmonic += 1.0;
        }

        let mix: Vec<f64> = source
            .iter()
            .enumerate()
            .map(|(k, s)| {
                let shape = noise.level / (1.0 + k as f64).powf(noise.tilt);
                s + shape * rng.gen_range(0.5..1.5)
            })
            .collect();

        clean.push(source);
        mixture.push(mix);
    }

    Utterance { mixture, clean }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_synthesize_sizes_and_split() {
        let data = SourceSeparationDataSet::synthesize(16, DataSize::Small, NoiseCount::Few, 7);

        assert_eq!(data.train.len() + data.validation.len(), utterance_count(DataSize::Small));
        assert_eq!(data.validation.len(), 4);
        assert_eq!(data.train_frames(), 20 * FRAMES_PER_UTTERANCE);
        for utt in data.train.iter().chain(&data.validation) {
            assert_eq!(utt.frames(), FRAMES_PER_UTTERANCE);
            assert!(utt.mixture.iter().all(|f| f.len() == 16));
        }
    }

    #[test]
    fn test_mixture_dominates_clean_source() {
        let data = SourceSeparationDataSet::synthesize(16, DataSize::Small, NoiseCount::Many, 1);
        for utt in &data.train {
            for (mix, clean) in utt.mixture.iter().zip(&utt.clean) {
                assert!(mix.iter().zip(clean).all(|(m, c)| m > c));
            }
        }
    }

    #[test]
    fn test_synthesize_is_seed_deterministic() {
        let a = SourceSeparationDataSet::synthesize(12, DataSize::Small, NoiseCount::Few, 3);
        let b = SourceSeparationDataSet::synthesize(12, DataSize::Small, NoiseCount::Few, 3);
        let c = SourceSeparationDataSet::synthesize(12, DataSize::Small, NoiseCount::Few, 4);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_saved_dataset_restores() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("cache").join("small_few.json");
        let data = SourceSeparationDataSet::synthesize(8, DataSize::Small, NoiseCount::Few, 0);

        data.save_json(&path).unwrap();
        let restored = SourceSeparationDataSet::load_json(&path).unwrap();
        assert_eq!(restored.train.len(), data.train.len());
        assert_eq!(restored.noise_count, NoiseCount::Few);
    }

    #[test]
    fn test_restore_missing_dataset_is_a_dataset_error() {
        let temp = TempDir::new().unwrap();
        let err = SourceSeparationDataSet::load_json(&temp.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, RunError::Dataset(_)));
    }
}
