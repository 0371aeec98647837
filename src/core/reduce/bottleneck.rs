use crate::core::config::ReductionConfig;
use crate::core::recombine::FeatureTable;
use crate::core::reduce::{check_table, Embedding, Reducer};
use crate::CaduceusError;
use ndarray::{concatenate, s, Array1, Array2, Axis};
use rand::distributions::Uniform;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Nonlinear reduction through a reconstruction-trained bottleneck network.
///
/// Encoder `input -> hidden (tanh) -> code (linear)`, mirrored decoder,
/// trained with plain minibatch SGD against mean squared reconstruction
/// error for a fixed number of epochs. Everything random (weight init,
/// validation split, epoch shuffling) flows from the configured seed, so a
/// given configuration always produces the same embedding. No early
/// stopping and no checkpoints; a run either completes or fails.
///
/// With `two_stage` on, a coarse network first reduces each segment's
/// column block independently, and a second network reduces the
/// concatenated codes to the target dimension. That caps the width any
/// single network has to train against.
#[derive(Debug, Clone)]
pub struct Bottleneck {
    target_dim: usize,
    hidden_dim: usize,
    batch_size: usize,
    epochs: usize,
    learning_rate: f64,
    seed: u64,
    validation_fraction: f64,
    two_stage: bool,
    coarse_dim: usize,
}

impl Bottleneck {
    pub fn from_config(config: &ReductionConfig) -> Self {
        Bottleneck {
            target_dim: config.target_dim,
            hidden_dim: config.hidden_dim,
            batch_size: config.batch_size,
            epochs: config.epochs,
            learning_rate: config.learning_rate,
            seed: config.seed,
            validation_fraction: config.validation_fraction,
            two_stage: config.two_stage,
            coarse_dim: config.coarse_dim,
        }
    }

    fn hidden_for(&self, code: usize) -> usize {
        if self.hidden_dim == 0 {
            2 * code
        } else {
            self.hidden_dim
        }
    }

    /// Train one network on `data` and return the codes for every row.
    fn train_and_encode(
        &self,
        label: &str,
        data: &Array2<f64>,
        code_dim: usize,
        seed: u64,
    ) -> Result<Array2<f64>, CaduceusError> {
        let n = data.nrows();
        let input_dim = data.ncols();
        let hidden = self.hidden_for(code_dim);
        let mut rng = StdRng::seed_from_u64(seed);

        let mut indices: Vec<usize> = (0..n).collect();
        indices.shuffle(&mut rng);
        let val_count = (n as f64 * self.validation_fraction).round() as usize;
        let train_count = n - val_count;
        if train_count == 0 {
            return Err(CaduceusError::Config(format!(
                "validation fraction {} leaves no training rows out of {}",
                self.validation_fraction, n
            )));
        }
        let train = data.select(Axis(0), &indices[..train_count]);
        let val = if val_count > 0 {
            Some(data.select(Axis(0), &indices[train_count..]))
        } else {
            None
        };

        let mut net = Net::new(input_dim, hidden, code_dim, &mut rng);
        debug!(
            "{}: training {}x{} -> {} (hidden {}) on {} rows, {} held out",
            label, n, input_dim, code_dim, hidden, train_count, val_count
        );

        for epoch in 0..self.epochs {
            let train_loss =
                net.train_epoch(&train, self.batch_size, self.learning_rate, &mut rng);
            match &val {
                Some(v) => {
                    let val_loss = net.reconstruction_loss(v);
                    debug!(
                        "{}: epoch {}/{}: train loss {:.6}, val loss {:.6}",
                        label,
                        epoch + 1,
                        self.epochs,
                        train_loss,
                        val_loss
                    );
                }
                None => debug!(
                    "{}: epoch {}/{}: train loss {:.6}",
                    label,
                    epoch + 1,
                    self.epochs,
                    train_loss
                ),
            }
        }

        Ok(net.encode(data))
    }
}

impl Reducer for Bottleneck {
    fn name(&self) -> &'static str {
        "nonlinear"
    }

    fn reduce(&self, table: &FeatureTable) -> Result<Embedding, CaduceusError> {
        check_table(table, self.target_dim)?;

        let n = table.len();
        let width = table.width();
        let mut data = Array2::<f64>::zeros((n, width));
        for (i, row) in table.rows().values().enumerate() {
            for (j, &v) in row.iter().enumerate() {
                data[(i, j)] = v;
            }
        }

        let codes = if self.two_stage && table.segments().len() > 1 {
            let mut blocks = Vec::with_capacity(table.segments().len());
            for (i, segment) in table.segments().iter().enumerate() {
                let range = table.segment_block(i);
                let block = data.slice(s![.., range.start..range.end]).to_owned();
                let coarse = self.coarse_dim.min(block.ncols());
                let label = format!("coarse[{}]", segment);
                blocks.push(self.train_and_encode(
                    &label,
                    &block,
                    coarse,
                    self.seed.wrapping_add(1 + i as u64),
                )?);
            }
            let views: Vec<_> = blocks.iter().map(|b| b.view()).collect();
            let stacked = concatenate(Axis(1), &views)
                .map_err(|e| CaduceusError::Shape(format!("stacking coarse codes: {}", e)))?;
            self.train_and_encode("final", &stacked, self.target_dim, self.seed)?
        } else {
            self.train_and_encode("bottleneck", &data, self.target_dim, self.seed)?
        };

        let rows: Vec<Vec<f64>> = codes.outer_iter().map(|r| r.to_vec()).collect();
        Embedding::new(self.target_dim, rows)
    }
}

/// Fully connected autoencoder with a tanh hidden layer on each side of a
/// linear code layer.
struct Net {
    w1: Array2<f64>,
    b1: Array1<f64>,
    w2: Array2<f64>,
    b2: Array1<f64>,
    w3: Array2<f64>,
    b3: Array1<f64>,
    w4: Array2<f64>,
    b4: Array1<f64>,
}

fn xavier(rows: usize, cols: usize, rng: &mut StdRng) -> Array2<f64> {
    let limit = (6.0 / (rows + cols) as f64).sqrt();
    let dist = Uniform::new(-limit, limit);
    Array2::from_shape_fn((rows, cols), |_| rng.sample(dist))
}

impl Net {
    fn new(input: usize, hidden: usize, code: usize, rng: &mut StdRng) -> Self {
        Net {
            w1: xavier(input, hidden, rng),
            b1: Array1::zeros(hidden),
            w2: xavier(hidden, code, rng),
            b2: Array1::zeros(code),
            w3: xavier(code, hidden, rng),
            b3: Array1::zeros(hidden),
            w4: xavier(hidden, input, rng),
            b4: Array1::zeros(input),
        }
    }

    fn encode(&self, x: &Array2<f64>) -> Array2<f64> {
        let a1 = (x.dot(&self.w1) + &self.b1).mapv(f64::tanh);
        a1.dot(&self.w2) + &self.b2
    }

    fn reconstruction_loss(&self, x: &Array2<f64>) -> f64 {
        let a1 = (x.dot(&self.w1) + &self.b1).mapv(f64::tanh);
        let code = a1.dot(&self.w2) + &self.b2;
        let a3 = (code.dot(&self.w3) + &self.b3).mapv(f64::tanh);
        let out = a3.dot(&self.w4) + &self.b4;
        let diff = &out - x;
        diff.mapv(|v| v * v).mean().unwrap_or(0.0)
    }

    /// One pass of shuffled minibatch SGD. Returns the mean train loss.
    fn train_epoch(
        &mut self,
        x: &Array2<f64>,
        batch_size: usize,
        lr: f64,
        rng: &mut StdRng,
    ) -> f64 {
        let n = x.nrows();
        let mut order: Vec<usize> = (0..n).collect();
        order.shuffle(rng);

        let mut loss_sum = 0.0;
        let mut batches = 0usize;
        for chunk in order.chunks(batch_size) {
            let batch = x.select(Axis(0), chunk);
            loss_sum += self.sgd_step(&batch, lr);
            batches += 1;
        }
        loss_sum / batches.max(1) as f64
    }

    fn sgd_step(&mut self, x: &Array2<f64>, lr: f64) -> f64 {
        let scale = (x.nrows() * x.ncols()) as f64;

        let a1 = (x.dot(&self.w1) + &self.b1).mapv(f64::tanh);
        let code = a1.dot(&self.w2) + &self.b2;
        let a3 = (code.dot(&self.w3) + &self.b3).mapv(f64::tanh);
        let out = a3.dot(&self.w4) + &self.b4;

        let diff = &out - x;
        let loss = diff.mapv(|v| v * v).mean().unwrap_or(0.0);

        let d_out = diff.mapv(|v| 2.0 * v / scale);
        let g_w4 = a3.t().dot(&d_out);
        let g_b4 = d_out.sum_axis(Axis(0));

        let d_a3 = d_out.dot(&self.w4.t());
        let d_z3 = &d_a3 * &a3.mapv(|v| 1.0 - v * v);
        let g_w3 = code.t().dot(&d_z3);
        let g_b3 = d_z3.sum_axis(Axis(0));

        let d_code = d_z3.dot(&self.w3.t());
        let g_w2 = a1.t().dot(&d_code);
        let g_b2 = d_code.sum_axis(Axis(0));

        let d_a1 = d_code.dot(&self.w2.t());
        let d_z1 = &d_a1 * &a1.mapv(|v| 1.0 - v * v);
        let g_w1 = x.t().dot(&d_z1);
        let g_b1 = d_z1.sum_axis(Axis(0));

        self.w1.scaled_add(-lr, &g_w1);
        self.b1.scaled_add(-lr, &g_b1);
        self.w2.scaled_add(-lr, &g_w2);
        self.b2.scaled_add(-lr, &g_b2);
        self.w3.scaled_add(-lr, &g_w3);
        self.b3.scaled_add(-lr, &g_b3);
        self.w4.scaled_add(-lr, &g_w4);
        self.b4.scaled_add(-lr, &g_b4);

        loss
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::universe::Universe;
    use indexmap::IndexMap;

    fn table_with(segments: usize, segment_length: usize, rows: &[(&str, Vec<f64>)]) -> FeatureTable {
        let names = (1..=segments).map(|i| format!("seg{}", i)).collect();
        let map: IndexMap<String, Vec<f64>> = rows
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        FeatureTable::new(Universe::Host, names, segment_length, map).unwrap()
    }

    fn config(target: usize, epochs: usize) -> Bottleneck {
        Bottleneck {
            target_dim: target,
            hidden_dim: 0,
            batch_size: 8,
            epochs,
            learning_rate: 0.01,
            seed: 42,
            validation_fraction: 0.1,
            two_stage: false,
            coarse_dim: 32,
        }
    }

    fn small_table() -> FeatureTable {
        table_with(
            1,
            4,
            &[
                ("A", vec![0.1, 0.2, 0.3, 0.4]),
                ("B", vec![0.2, 0.3, 0.4, 0.5]),
                ("C", vec![0.9, 0.8, 0.7, 0.6]),
                ("D", vec![0.5, 0.1, 0.9, 0.3]),
                ("E", vec![0.3, 0.7, 0.2, 0.8]),
                ("F", vec![0.6, 0.4, 0.6, 0.4]),
            ],
        )
    }

    #[test]
    fn test_embedding_shape_and_finiteness() {
        let embedding = config(2, 10).reduce(&small_table()).unwrap();
        assert_eq!(embedding.len(), 6);
        assert_eq!(embedding.dim(), 2);
        for row in embedding.rows() {
            assert!(row.iter().all(|v| v.is_finite()));
        }
    }

    #[test]
    fn test_same_seed_same_embedding() {
        let table = small_table();
        let a = config(2, 10).reduce(&table).unwrap();
        let b = config(2, 10).reduce(&table).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_seed_different_embedding() {
        let table = small_table();
        let a = config(2, 10).reduce(&table).unwrap();
        let mut other = config(2, 10);
        other.seed = 7;
        let b = other.reduce(&table).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_zero_row_is_degenerate() {
        let table = table_with(
            1,
            2,
            &[("A", vec![0.1, 0.2]), ("GONE", vec![0.0, 0.0])],
        );
        let err = config(1, 5).reduce(&table).unwrap_err();
        assert!(matches!(err, CaduceusError::DegenerateFeature(_)));
        assert!(err.to_string().contains("GONE"));
    }

    #[test]
    fn test_two_stage_shape() {
        let table = table_with(
            2,
            3,
            &[
                ("A", vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6]),
                ("B", vec![0.6, 0.5, 0.4, 0.3, 0.2, 0.1]),
                ("C", vec![0.2, 0.8, 0.2, 0.8, 0.2, 0.8]),
                ("D", vec![0.9, 0.1, 0.9, 0.1, 0.9, 0.1]),
            ],
        );
        let mut reducer = config(2, 5);
        reducer.two_stage = true;
        reducer.coarse_dim = 2;

        let embedding = reducer.reduce(&table).unwrap();
        assert_eq!(embedding.len(), 4);
        assert_eq!(embedding.dim(), 2);
        for row in embedding.rows() {
            assert!(row.iter().all(|v| v.is_finite()));
        }
    }

    #[test]
    fn test_no_validation_split_works() {
        let mut reducer = config(2, 5);
        reducer.validation_fraction = 0.0;
        let embedding = reducer.reduce(&small_table()).unwrap();
        assert_eq!(embedding.len(), 6);
    }

    #[test]
    fn test_training_reduces_reconstruction_error() {
        let mut rng = StdRng::seed_from_u64(1);
        let data = Array2::from_shape_fn((8, 4), |_| rng.sample(Uniform::new(0.0, 1.0)));

        let mut net = Net::new(4, 6, 2, &mut rng);
        let initial = net.reconstruction_loss(&data);
        for _ in 0..150 {
            net.train_epoch(&data, 8, 0.01, &mut rng);
        }
        let trained = net.reconstruction_loss(&data);
        assert!(trained < initial, "{} should drop below {}", trained, initial);
    }
}
