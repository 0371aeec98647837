use crate::CaduceusError;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub encoding: EncodingConfig,
    pub reduction: ReductionConfig,
    pub output: OutputConfig,
}

/// What happens when a single sequence fails to normalize or encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// First failure aborts the whole run.
    Abort,
    /// Failing sequences are dropped, logged, and written to the failures log.
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReductionStrategy {
    /// Batch-incremental principal component projection.
    Linear,
    /// Reconstruction-trained bottleneck network.
    Nonlinear,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodingConfig {
    /// Built-in property table accession, or a path to a custom JSON table
    pub table: String,
    pub on_error: ErrorPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReductionConfig {
    pub strategy: ReductionStrategy,
    pub target_dim: usize,
    /// Rows per accumulation batch; bounds memory, never affects the result
    pub batch_size: usize,
    pub seed: u64,
    pub epochs: usize,
    pub learning_rate: f64,
    pub validation_fraction: f64,
    /// Hidden layer width for the bottleneck strategy (0 = 2 * target_dim)
    pub hidden_dim: usize,
    pub two_stage: bool,
    /// Per-segment width for the first stage when two_stage is on
    pub coarse_dim: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub overwrite: bool,
    pub write_intermediate: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            encoding: EncodingConfig {
                table: "JOND920101".to_string(),
                on_error: ErrorPolicy::Abort,
            },
            reduction: ReductionConfig {
                strategy: ReductionStrategy::Linear,
                target_dim: 12,
                batch_size: 30,
                seed: 42,
                epochs: 200,
                learning_rate: 0.01,
                validation_fraction: 0.1,
                hidden_dim: 0, // resolved to 2 * target_dim
                two_stage: false,
                coarse_dim: 32,
            },
            output: OutputConfig {
                overwrite: false,
                write_intermediate: true,
            },
        }
    }
}

impl Config {
    /// Reject value combinations no stage can honor. Called once at startup
    /// so stage code can assume a sane configuration.
    pub fn validate(&self) -> Result<(), CaduceusError> {
        let r = &self.reduction;
        if r.target_dim == 0 {
            return Err(CaduceusError::Config(
                "reduction.target_dim must be at least 1".to_string(),
            ));
        }
        if r.batch_size == 0 {
            return Err(CaduceusError::Config(
                "reduction.batch_size must be at least 1".to_string(),
            ));
        }
        if r.epochs == 0 {
            return Err(CaduceusError::Config(
                "reduction.epochs must be at least 1".to_string(),
            ));
        }
        if !(r.learning_rate.is_finite() && r.learning_rate > 0.0) {
            return Err(CaduceusError::Config(format!(
                "reduction.learning_rate must be positive, got {}",
                r.learning_rate
            )));
        }
        if !(0.0..1.0).contains(&r.validation_fraction) {
            return Err(CaduceusError::Config(format!(
                "reduction.validation_fraction must be in [0, 1), got {}",
                r.validation_fraction
            )));
        }
        if r.two_stage && r.coarse_dim < r.target_dim {
            return Err(CaduceusError::Config(format!(
                "reduction.coarse_dim ({}) must not be below target_dim ({})",
                r.coarse_dim, r.target_dim
            )));
        }
        Ok(())
    }
}

pub fn default_config() -> Config {
    Config::default()
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, CaduceusError> {
    let contents = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&contents)
        .map_err(|e| CaduceusError::Config(format!("Failed to parse config: {}", e)))?;
    config.validate()?;
    Ok(config)
}

pub fn save_config<P: AsRef<Path>>(path: P, config: &Config) -> Result<(), CaduceusError> {
    let contents = toml::to_string_pretty(config)
        .map_err(|e| CaduceusError::Config(format!("Failed to serialize config: {}", e)))?;
    std::fs::write(path, contents)?;
    Ok(())
}
