//! Dimensionality reduction strategies.
//!
//! Both strategies consume the FeatureTable, honor its row order, and emit
//! an [`Embedding`] with a small fixed column count. The strategy is picked
//! by configuration; everything downstream of the FeatureTable treats the
//! reducer as a black box behind the [`Reducer`] trait.

pub mod bottleneck;
pub mod pca;

pub use bottleneck::Bottleneck;
pub use pca::BatchPca;

use crate::core::config::{ReductionConfig, ReductionStrategy};
use crate::core::recombine::FeatureTable;
use crate::CaduceusError;
use serde::{Deserialize, Serialize};

/// Row-major embedding matrix. Row `i` belongs to the entity at row `i` of
/// the FeatureTable it was reduced from; the OrderRecord carries the keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding {
    dim: usize,
    rows: Vec<Vec<f64>>,
}

impl Embedding {
    pub fn new(dim: usize, rows: Vec<Vec<f64>>) -> Result<Self, CaduceusError> {
        for (i, row) in rows.iter().enumerate() {
            if row.len() != dim {
                return Err(CaduceusError::Shape(format!(
                    "embedding row {} has length {}, expected {}",
                    i,
                    row.len(),
                    dim
                )));
            }
        }
        Ok(Embedding { dim, rows })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn row(&self, i: usize) -> Option<&[f64]> {
        self.rows.get(i).map(|r| r.as_slice())
    }
}

pub trait Reducer: Send + Sync {
    fn name(&self) -> &'static str;

    /// Reduce the table to `target_dim` columns, one output row per table
    /// row, in table row order.
    fn reduce(&self, table: &FeatureTable) -> Result<Embedding, CaduceusError>;
}

/// Build the configured strategy.
pub fn reducer_for(config: &ReductionConfig) -> Box<dyn Reducer> {
    match config.strategy {
        ReductionStrategy::Linear => Box::new(BatchPca::from_config(config)),
        ReductionStrategy::Nonlinear => Box::new(Bottleneck::from_config(config)),
    }
}

/// Guards shared by every strategy. An entity whose whole feature vector is
/// zero cannot be told apart from pure padding; that is bad input data, not
/// something a reducer may paper over.
pub(crate) fn check_table(table: &FeatureTable, target_dim: usize) -> Result<(), CaduceusError> {
    if table.len() < 2 {
        return Err(CaduceusError::Config(format!(
            "reduction needs at least two entities, got {}",
            table.len()
        )));
    }
    if target_dim > table.width() {
        return Err(CaduceusError::Config(format!(
            "target dimension {} exceeds feature width {}",
            target_dim,
            table.width()
        )));
    }
    for (key, row) in table.rows() {
        if row.iter().all(|&v| v == 0.0) {
            return Err(CaduceusError::DegenerateFeature(format!(
                "entity '{}' has an all-zero feature vector",
                key
            )));
        }
    }
    Ok(())
}
