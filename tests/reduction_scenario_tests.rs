//! Reduction strategies over synthetic feature tables: shape and
//! determinism guarantees, plus the failure modes for degenerate input.

use caduceus::core::config::{Config, ReductionStrategy};
use caduceus::core::recombine::FeatureTable;
use caduceus::core::reduce::reducer_for;
use caduceus::core::universe::Universe;
use caduceus::CaduceusError;
use indexmap::IndexMap;
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Dense table with no zero entries: `entities` rows of
/// `segments * segment_length` uniform random values in [0.1, 1).
fn random_table(
    entities: usize,
    segments: usize,
    segment_length: usize,
    seed: u64,
) -> FeatureTable {
    let mut rng = StdRng::seed_from_u64(seed);
    let width = segments * segment_length;
    let mut rows = IndexMap::with_capacity(entities);
    for i in 0..entities {
        let row: Vec<f64> = (0..width).map(|_| rng.gen_range(0.1..1.0)).collect();
        rows.insert(format!("E{:03}", i), row);
    }
    let names = (1..=segments).map(|i| format!("s{}", i)).collect();
    FeatureTable::new(Universe::Pathogen, names, segment_length, rows).unwrap()
}

fn linear(target_dim: usize, batch_size: usize) -> Config {
    let mut config = Config::default();
    config.reduction.strategy = ReductionStrategy::Linear;
    config.reduction.target_dim = target_dim;
    config.reduction.batch_size = batch_size;
    config
}

fn nonlinear(target_dim: usize) -> Config {
    let mut config = Config::default();
    config.reduction.strategy = ReductionStrategy::Nonlinear;
    config.reduction.target_dim = target_dim;
    config.reduction.batch_size = 4;
    config.reduction.epochs = 30;
    config.reduction.hidden_dim = 8;
    config
}

/// One hundred sequences of five hundred features reduce to 100 x 12 under
/// a batch size of 30, and every output row keeps signal.
#[test]
fn test_wide_matrix_reduces_in_batches() {
    let table = random_table(100, 1, 500, 1234);
    let config = linear(12, 30);

    let embedding = reducer_for(&config.reduction).reduce(&table).unwrap();

    assert_eq!(embedding.len(), 100);
    assert_eq!(embedding.dim(), 12);
    for (i, row) in embedding.rows().iter().enumerate() {
        assert!(row.iter().all(|v| v.is_finite()), "row {} is not finite", i);
        assert!(row.iter().any(|v| *v != 0.0), "row {} lost all signal", i);
    }
}

#[test]
fn test_linear_reduction_is_reproducible() {
    let table = random_table(40, 2, 30, 7);
    let config = linear(5, 8);

    let first = reducer_for(&config.reduction).reduce(&table).unwrap();
    let second = reducer_for(&config.reduction).reduce(&table).unwrap();
    assert_eq!(first, second);
}

/// An entity whose entire feature vector is zero is reported by key
/// instead of silently washing through the projection.
#[test]
fn test_all_zero_entity_is_named() {
    let mut rng = StdRng::seed_from_u64(1234);
    let mut rows = IndexMap::with_capacity(100);
    for i in 0..100 {
        let row: Vec<f64> = if i == 42 {
            vec![0.0; 500]
        } else {
            (0..500).map(|_| rng.gen_range(0.1..1.0)).collect()
        };
        rows.insert(format!("E{:03}", i), row);
    }
    let table =
        FeatureTable::new(Universe::Pathogen, vec!["s1".to_string()], 500, rows).unwrap();

    let config = linear(12, 30);
    let err = reducer_for(&config.reduction).reduce(&table).unwrap_err();
    assert!(matches!(err, CaduceusError::DegenerateFeature(_)));
    assert!(err.to_string().contains("E042"));
}

/// A covariance projection cannot produce more informative dimensions than
/// there are entities.
#[test]
fn test_target_beyond_entity_count_is_config_error() {
    let table = random_table(5, 1, 10, 3);
    let config = linear(8, 30);

    let err = reducer_for(&config.reduction).reduce(&table).unwrap_err();
    assert!(matches!(err, CaduceusError::Config(_)));
}

#[test]
fn test_bottleneck_embedding_is_seeded() {
    let table = random_table(12, 2, 8, 99);
    let config = nonlinear(3);

    let first = reducer_for(&config.reduction).reduce(&table).unwrap();
    let second = reducer_for(&config.reduction).reduce(&table).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.len(), 12);
    assert_eq!(first.dim(), 3);
    assert!(first.rows().iter().flatten().all(|v| v.is_finite()));
}

/// Two-stage reduction trains one coarse network per segment block before
/// the final bottleneck, and still lands on the target dimensions.
#[test]
fn test_two_stage_bottleneck_over_segment_blocks() {
    let table = random_table(10, 3, 6, 5);
    let mut config = nonlinear(2);
    config.reduction.two_stage = true;
    config.reduction.coarse_dim = 4;
    config.reduction.epochs = 15;

    let embedding = reducer_for(&config.reduction).reduce(&table).unwrap();
    assert_eq!(embedding.len(), 10);
    assert_eq!(embedding.dim(), 2);
    assert!(embedding.rows().iter().flatten().all(|v| v.is_finite()));
}
