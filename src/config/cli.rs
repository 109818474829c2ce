use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::run_config::RunConfig;
use crate::config::tags::{DataSize, LabelScheme, NoiseCount};

/// Train a quantization-aware BGRU source separator and label its results.
#[derive(Parser, Debug)]
#[command(name = "quant-bgru", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Basic run: fresh model, labels carry only the learning rate.
    Train(TrainArgs),
    /// Extended run: pretraining, checkpoint resume, dataset restore.
    Experiment(ExperimentArgs),
}

/// Options shared by both front ends.
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Number of features per frame
    #[arg(short = 'f', long = "feat", default_value_t = 513)]
    pub feat: usize,

    /// Number of BGRU layers
    #[arg(short = 'l', long = "n_layers", default_value_t = 2)]
    pub n_layers: usize,

    /// Number of hidden units in each layer
    #[arg(short = 's', long = "state_sz", default_value_t = 1024)]
    pub state_sz: usize,

    /// Proportion of data to sample for quantization calibration
    #[arg(short = 'p', long = "perc", default_value_t = 0.1)]
    pub perc: f64,

    /// Directory for model checkpoints
    #[arg(short = 'm', long = "dir_models", default_value = "Saved_Models")]
    pub dir_models: PathBuf,

    /// Directory for result plots
    #[arg(short = 'r', long = "dir_results", default_value = "Saved_Results")]
    pub dir_results: PathBuf,

    /// Log per-epoch losses and SNR
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Seed for dataset synthesis and weight initialization
    #[arg(long = "seed", default_value_t = 0)]
    pub seed: u64,

    /// Stop training at the next epoch boundary after this many seconds
    #[arg(long = "time_limit")]
    pub time_limit: Option<u64>,

    /// Write a freshly built dataset to this path for later `--pickled_data` runs
    #[arg(long = "save_data")]
    pub save_data: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct TrainArgs {
    /// Number of epochs
    pub n_epochs: usize,
    /// Learning rate
    pub learning_rate: f64,
    /// Batch size
    pub batch_sz: usize,
    /// GPU ID
    pub gpu_id: u32,

    /// Number of bits used for quantization
    #[arg(short = 'b', long = "n_bits", default_value_t = 4)]
    pub n_bits: u32,

    /// Back propagation through time window
    #[arg(short = 't', long = "bptt", default_value_t = 30)]
    pub bptt: usize,

    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Args, Debug, Clone)]
pub struct ExperimentArgs {
    /// Learning rate
    pub learning_rate: f64,
    /// Batch size
    pub batch_sz: usize,
    /// Back propagation through time window
    pub bptt: usize,
    /// Number of epochs
    pub n_epochs: usize,
    /// GPU ID
    pub gpu_id: u32,

    /// Number of bits used for quantization (full precision when unset)
    #[arg(short = 'b', long = "n_bits")]
    pub n_bits: Option<u32>,

    /// Gradient clipping norm (0 disables)
    #[arg(short = 'c', long = "clip_val", default_value_t = 5.0)]
    pub clip_val: f64,

    /// Dataset size
    #[arg(short = 'd', long = "data_sz", value_enum, default_value_t = DataSize::Small)]
    pub data_sz: DataSize,

    /// Produce a pretraining checkpoint meant to be resumed later
    #[arg(short = 'e', long = "is_pretrain")]
    pub is_pretrain: bool,

    /// Weight initialization gain
    #[arg(short = 'g', long = "gain", default_value_t = 1.0)]
    pub gain: f64,

    /// Restore a previously saved dataset instead of building one
    #[arg(short = 'k', long = "pickled_data")]
    pub pickled_data: Option<PathBuf>,

    /// Number of noise sources
    #[arg(short = 'n', long = "n_noise", value_enum, default_value_t = NoiseCount::Few)]
    pub n_noise: NoiseCount,

    /// Resume from this checkpoint under the models directory
    #[arg(short = 'o', long = "model_nm")]
    pub model_nm: Option<String>,

    /// Adam beta2
    #[arg(short = 'y', long = "beta2", default_value_t = 0.999)]
    pub beta2: f64,

    /// Adam beta1
    #[arg(short = 'z', long = "beta1", default_value_t = 0.9)]
    pub beta1: f64,

    #[command(flatten)]
    pub common: CommonArgs,
}

impl Cli {
    pub fn into_config(self) -> RunConfig {
        match self.command {
            Command::Train(args) => args.into_config(),
            Command::Experiment(args) => args.into_config(),
        }
    }
}

impl TrainArgs {
    pub fn into_config(self) -> RunConfig {
        let base = RunConfig {
            learning_rate: self.learning_rate,
            batch_size:    self.batch_sz,
            bptt_steps:    self.bptt,
            n_epochs:      self.n_epochs,
            gpu_id:        self.gpu_id,
            n_bits:        Some(self.n_bits),
            label_scheme:  LabelScheme::Brief,
            ..RunConfig::default()
        };
        self.common.apply(base)
    }
}

impl ExperimentArgs {
    pub fn into_config(self) -> RunConfig {
        let base = RunConfig {
            learning_rate:     self.learning_rate,
            batch_size:        self.batch_sz,
            bptt_steps:        self.bptt,
            n_epochs:          self.n_epochs,
            gpu_id:            self.gpu_id,
            n_bits:            self.n_bits,
            clip_value:        self.clip_val,
            data_size:         self.data_sz,
            noise_count:       self.n_noise,
            is_pretrain:       self.is_pretrain,
            gain:              self.gain,
            beta1:             self.beta1,
            beta2:             self.beta2,
            pickled_data_path: self.pickled_data,
            model_name:        self.model_nm,
            label_scheme:      LabelScheme::Full,
            ..RunConfig::default()
        };
        self.common.apply(base)
    }
}

impl CommonArgs {
    fn apply(self, config: RunConfig) -> RunConfig {
        RunConfig {
            n_features:      self.feat,
            n_layers:        self.n_layers,
            state_size:      self.state_sz,
            perc_sample:     self.perc,
            dir_models:      self.dir_models,
            dir_results:     self.dir_results,
            verbose:         self.verbose,
            seed:            self.seed,
            time_limit_secs: self.time_limit,
            save_data_path:  self.save_data,
            ..config
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_train_positionals_follow_basic_order() {
        let cli = Cli::try_parse_from(["quant-bgru", "train", "10", "0.001", "32", "1", "-v"]).unwrap();
        let config = cli.into_config();

        assert_eq!(config.n_epochs, 10);
        assert_eq!(config.learning_rate, 0.001);
        assert_eq!(config.batch_size, 32);
        assert_eq!(config.gpu_id, 1);
        assert_eq!(config.bptt_steps, 30);
        assert_eq!(config.n_bits, Some(4));
        assert_eq!(config.label_scheme, LabelScheme::Brief);
        assert!(config.verbose);
        assert!(config.model_name.is_none());
    }

    #[test]
    fn test_experiment_parses_extended_options() {
        let cli = Cli::try_parse_from([
            "quant-bgru", "experiment", "0.0005", "16", "20", "3", "0",
            "-d", "large", "-n", "many", "-e", "-o", "run1", "-k", "data.json",
            "-y", "0.99", "-z", "0.8", "-g", "2.0", "-c", "1.5", "-b", "8",
        ])
        .unwrap();
        let config = cli.into_config();

        assert_eq!(config.learning_rate, 0.0005);
        assert_eq!(config.batch_size, 16);
        assert_eq!(config.bptt_steps, 20);
        assert_eq!(config.n_epochs, 3);
        assert_eq!(config.data_size, DataSize::Large);
        assert_eq!(config.noise_count, NoiseCount::Many);
        assert!(config.is_pretrain);
        assert_eq!(config.model_name.as_deref(), Some("run1"));
        assert_eq!(config.pickled_data_path, Some(PathBuf::from("data.json")));
        assert_eq!(config.beta2, 0.99);
        assert_eq!(config.beta1, 0.8);
        assert_eq!(config.gain, 2.0);
        assert_eq!(config.clip_value, 1.5);
        assert_eq!(config.n_bits, Some(8));
        assert_eq!(config.label_scheme, LabelScheme::Full);
    }

    #[test]
    fn test_experiment_leaves_quantization_unset_by_default() {
        let cli = Cli::try_parse_from(["quant-bgru", "experiment", "0.001", "32", "30", "10", "0"]).unwrap();
        assert_eq!(cli.into_config().n_bits, None);
    }

    #[test]
    fn test_malformed_arguments_are_rejected() {
        assert!(Cli::try_parse_from(["quant-bgru", "train", "ten", "0.001", "32", "0"]).is_err());
        assert!(Cli::try_parse_from(["quant-bgru", "experiment", "0.001", "32", "30", "10", "0", "-d", "huge"]).is_err());
    }
}
