use crate::core::config::ReductionConfig;
use crate::core::recombine::FeatureTable;
use crate::core::reduce::{check_table, Embedding, Reducer};
use crate::CaduceusError;
use nalgebra::{DMatrix, SymmetricEigen};
use tracing::debug;

/// Linear reduction by batch-incremental principal component projection.
///
/// Covariance statistics (count, sum, scatter) are accumulated over
/// fixed-size row batches so only one batch of rows is ever densified at a
/// time; the eigendecomposition then runs once on the accumulated
/// covariance and rows are projected batch by batch. The batch size bounds
/// peak memory and does not change the result.
#[derive(Debug, Clone)]
pub struct BatchPca {
    target_dim: usize,
    batch_size: usize,
}

impl BatchPca {
    pub fn new(target_dim: usize, batch_size: usize) -> Self {
        BatchPca {
            target_dim,
            batch_size,
        }
    }

    pub fn from_config(config: &ReductionConfig) -> Self {
        Self::new(config.target_dim, config.batch_size)
    }
}

impl Reducer for BatchPca {
    fn name(&self) -> &'static str {
        "linear"
    }

    fn reduce(&self, table: &FeatureTable) -> Result<Embedding, CaduceusError> {
        check_table(table, self.target_dim)?;

        let rows: Vec<(&String, &Vec<f64>)> = table.rows().iter().collect();
        let n = rows.len();

        // Columns that are zero across every row carry no signal and only
        // inflate the eigenproblem.
        let kept = nonzero_columns(table);
        let k = kept.len();
        debug!(
            "removed {} all-zero column(s), {} of {} remain",
            table.width() - k,
            k,
            table.width()
        );

        if self.target_dim > k {
            return Err(CaduceusError::Config(format!(
                "target dimension {} exceeds the {} non-zero columns available",
                self.target_dim, k
            )));
        }
        if self.target_dim > n {
            return Err(CaduceusError::Config(format!(
                "target dimension {} exceeds the {} entities available",
                self.target_dim, n
            )));
        }

        // First pass: accumulate sufficient statistics batch by batch.
        let n_f = n as f64;
        let mut sum = vec![0.0f64; k];
        let mut scatter = DMatrix::<f64>::zeros(k, k);
        let mut batches = 0usize;

        for chunk in rows.chunks(self.batch_size) {
            let mut data = Vec::with_capacity(chunk.len() * k);
            for (_, row) in chunk {
                for (i, &c) in kept.iter().enumerate() {
                    data.push(row[c]);
                    sum[i] += row[c];
                }
            }
            let batch = DMatrix::from_row_slice(chunk.len(), k, &data);
            scatter += batch.transpose() * &batch;
            batches += 1;
        }
        debug!("accumulated covariance statistics over {} batch(es)", batches);

        let mean: Vec<f64> = sum.iter().map(|s| s / n_f).collect();
        let mut covariance = DMatrix::<f64>::zeros(k, k);
        for i in 0..k {
            for j in 0..k {
                covariance[(i, j)] = (scatter[(i, j)] - n_f * mean[i] * mean[j]) / (n_f - 1.0);
            }
        }

        let eigen = SymmetricEigen::new(covariance);

        // Sort eigenvalues descending; nalgebra does not guarantee an order.
        let mut indexed_eigenvalues: Vec<(usize, f64)> = eigen
            .eigenvalues
            .iter()
            .enumerate()
            .map(|(i, &v)| (i, v))
            .collect();
        indexed_eigenvalues
            .sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        let total_variance: f64 = indexed_eigenvalues.iter().map(|(_, v)| v.max(0.0)).sum();
        let kept_variance: f64 = indexed_eigenvalues
            .iter()
            .take(self.target_dim)
            .map(|(_, v)| v.max(0.0))
            .sum();
        if total_variance > 0.0 {
            debug!(
                "top {} component(s) explain {:.2}% of variance",
                self.target_dim,
                100.0 * kept_variance / total_variance
            );
        }

        let components = DMatrix::from_fn(k, self.target_dim, |r, c| {
            eigen.eigenvectors[(r, indexed_eigenvalues[c].0)]
        });

        // Second pass: project mean-centered rows batch by batch.
        let mut embedded: Vec<Vec<f64>> = Vec::with_capacity(n);
        for chunk in rows.chunks(self.batch_size) {
            let mut data = Vec::with_capacity(chunk.len() * k);
            for (_, row) in chunk {
                for (i, &c) in kept.iter().enumerate() {
                    data.push(row[c] - mean[i]);
                }
            }
            let centered = DMatrix::from_row_slice(chunk.len(), k, &data);
            let projected = centered * &components;

            for (r, (key, _)) in chunk.iter().enumerate() {
                let out: Vec<f64> = projected.row(r).iter().copied().collect();
                if out.iter().all(|&v| v == 0.0) {
                    return Err(CaduceusError::DegenerateFeature(format!(
                        "entity '{}' projected to the zero vector",
                        key
                    )));
                }
                embedded.push(out);
            }
        }

        Embedding::new(self.target_dim, embedded)
    }
}

fn nonzero_columns(table: &FeatureTable) -> Vec<usize> {
    let mut nonzero = vec![false; table.width()];
    for row in table.rows().values() {
        for (i, &v) in row.iter().enumerate() {
            if v != 0.0 {
                nonzero[i] = true;
            }
        }
    }
    nonzero
        .iter()
        .enumerate()
        .filter_map(|(i, &keep)| if keep { Some(i) } else { None })
        .collect()
}
