pub mod embed;
pub mod encode;
pub mod inspect;
pub mod reduce;

use crate::core::config::{
    default_config, load_config, Config, ErrorPolicy, ReductionStrategy,
};
use crate::core::universe::{Universe, UniverseSpec};
use clap::Args;
use std::path::PathBuf;

/// Options every command understands.
#[derive(Args, Debug)]
pub struct CommonOpts {
    /// Configuration file
    #[arg(short, long, env = "CADUCEUS_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Replace existing artifacts
    #[arg(long)]
    pub overwrite: bool,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,
}

impl CommonOpts {
    pub fn load(&self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => default_config(),
        };
        if self.overwrite {
            config.output.overwrite = true;
        }
        Ok(config)
    }
}

/// Universe inputs shared by embed and encode.
#[derive(Args, Debug)]
pub struct UniverseOpts {
    /// Universe the segment files belong to
    #[arg(short, long, value_enum)]
    pub universe: Universe,

    /// JSON array of canonical entity keys
    #[arg(long, value_name = "FILE")]
    pub keys: PathBuf,

    /// JSON strain-to-canonical dictionary (pathogen universe only)
    #[arg(long, value_name = "FILE")]
    pub strain_dict: Option<PathBuf>,

    /// Field delimiter in pathogen headers
    #[arg(long, default_value = "|")]
    pub delimiter: char,
}

impl UniverseOpts {
    pub fn build_spec(&self) -> anyhow::Result<UniverseSpec> {
        match self.universe {
            Universe::Pathogen => {
                let dict = self.strain_dict.as_ref().ok_or_else(|| {
                    anyhow::anyhow!("the pathogen universe requires --strain-dict")
                })?;
                Ok(UniverseSpec::pathogen(&self.keys, dict, self.delimiter)?)
            }
            Universe::Host => {
                if self.strain_dict.is_some() {
                    anyhow::bail!("--strain-dict only applies to the pathogen universe");
                }
                Ok(UniverseSpec::host(&self.keys)?)
            }
        }
    }
}

/// Encoding overrides shared by embed and encode.
#[derive(Args, Debug)]
pub struct EncodeOpts {
    /// Property table accession or JSON file (overrides config)
    #[arg(short, long)]
    pub table: Option<String>,

    /// Per-sequence failure policy (overrides config)
    #[arg(long, value_enum)]
    pub on_error: Option<ErrorPolicy>,

    /// Skip writing per-segment intermediate encodings
    #[arg(long)]
    pub no_intermediate: bool,
}

impl EncodeOpts {
    pub fn apply(&self, config: &mut Config) {
        if let Some(table) = &self.table {
            config.encoding.table = table.clone();
        }
        if let Some(policy) = self.on_error {
            config.encoding.on_error = policy;
        }
        if self.no_intermediate {
            config.output.write_intermediate = false;
        }
    }
}

/// Reduction overrides shared by embed and reduce.
#[derive(Args, Debug)]
pub struct ReductionOpts {
    /// Reduction strategy (overrides config)
    #[arg(short, long, value_enum)]
    pub strategy: Option<ReductionStrategy>,

    /// Embedding dimension (overrides config)
    #[arg(short = 'd', long)]
    pub target_dim: Option<usize>,

    /// Seed for everything random in the nonlinear strategy (overrides config)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Training epochs for the nonlinear strategy (overrides config)
    #[arg(long)]
    pub epochs: Option<usize>,
}

impl ReductionOpts {
    pub fn apply(&self, config: &mut Config) {
        if let Some(strategy) = self.strategy {
            config.reduction.strategy = strategy;
        }
        if let Some(dim) = self.target_dim {
            config.reduction.target_dim = dim;
        }
        if let Some(seed) = self.seed {
            config.reduction.seed = seed;
        }
        if let Some(epochs) = self.epochs {
            config.reduction.epochs = epochs;
        }
    }
}
