//! End-to-end pipeline runs over segment directories on disk, from aligned
//! FASTA input through persisted artifacts.

use caduceus::bio::fasta::write_fasta;
use caduceus::bio::sequence::AlignedSequence;
use caduceus::core::config::{Config, ErrorPolicy, ReductionStrategy};
use caduceus::core::order::OrderRecord;
use caduceus::core::pipeline::{reduce_features, Pipeline};
use caduceus::core::recombine::FeatureTable;
use caduceus::core::reduce::Embedding;
use caduceus::core::universe::{Universe, UniverseSpec};
use caduceus::storage::{self, ArtifactKind};
use caduceus::CaduceusError;
use std::path::{Path, PathBuf};

fn write_segment(dir: &Path, file_name: &str, records: &[(&str, &str)]) {
    let mut body = String::new();
    for (header, residues) in records {
        body.push_str(&format!(">{}\n{}\n", header, residues));
    }
    std::fs::write(dir.join(file_name), body).unwrap();
}

fn write_host_keys(dir: &Path, keys: &[&str]) -> PathBuf {
    let path = dir.join("host_keys.json");
    std::fs::write(&path, serde_json::to_string(keys).unwrap()).unwrap();
    path
}

/// Three hosts exactly covering the universe, over two gene segments with
/// different alignment lengths (four and six columns).
fn host_fixture(root: &Path) -> (PathBuf, UniverseSpec) {
    let input = root.join("alignments");
    std::fs::create_dir_all(&input).unwrap();
    write_segment(
        &input,
        "gene_a.fasta",
        &[
            ("M1_ABC12345", "MKLV"),
            ("M2_DEF67890", "ARND"),
            ("M3_GHI24680", "CQEG"),
        ],
    );
    write_segment(
        &input,
        "gene_b.fasta",
        &[
            ("M1_ABC12345", "MKVLIL"),
            ("M2_DEF67890", "ARNDCQ"),
            ("M3_GHI24680", "GHILKM"),
        ],
    );
    let keys = write_host_keys(root, &["M1_ABC", "M2_DEF", "M3_GHI"]);
    let spec = UniverseSpec::host(&keys).unwrap();
    (input, spec)
}

fn test_config() -> Config {
    let mut config = Config::default();
    config.reduction.target_dim = 2;
    config.reduction.batch_size = 2;
    config
}

/// Full host run: encode both segments, pad to the global length, reduce,
/// and persist every artifact.
#[test]
fn test_host_embed_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let (input, spec) = host_fixture(dir.path());
    let output = dir.path().join("out");

    let pipeline = Pipeline::new(test_config(), spec).with_silent(true);
    let report = pipeline.embed(&input, &output).unwrap();

    assert_eq!(report.encode.segments, ["gene_a", "gene_b"]);
    assert_eq!(report.encode.entities, 3);
    assert_eq!(report.encode.segment_length, 6);
    assert_eq!(report.encode.skipped, 0);
    assert_eq!(report.encode.zero_filled, 0);
    assert_eq!(report.encode.dropped_keys, 0);
    assert_eq!(report.strategy, "linear");
    assert_eq!(report.embedding_dim, 2);

    assert!(storage::features_path(&output).exists());
    assert!(storage::embedding_path(&output).exists());
    assert!(storage::order_path(&output).exists());
    assert!(storage::segment_encoding_path(&output, "gene_a").exists());
    assert!(storage::segment_encoding_path(&output, "gene_b").exists());
    assert!(!storage::failures_path(&output).exists());

    let (_, features): (_, FeatureTable) =
        storage::read_artifact(storage::features_path(&output), ArtifactKind::Features).unwrap();
    assert_eq!(features.universe(), Universe::Host);
    assert_eq!(features.width(), 12);
    // gene_a rows are four residues long, so they gain two leading pad
    // columns against gene_b; the rest is straight table substitution.
    assert_eq!(
        features.rows()["M1_ABC"],
        vec![0.0, 0.0, 0.024, 0.059, 0.091, 0.066, 0.024, 0.059, 0.066, 0.091, 0.053, 0.091]
    );

    let (_, order): (_, OrderRecord) =
        storage::read_artifact(storage::order_path(&output), ArtifactKind::Order).unwrap();
    assert_eq!(order.keys(), &["M1_ABC", "M2_DEF", "M3_GHI"]);
    assert_eq!(order.universe(), Universe::Host);

    let (_, embedding): (_, Embedding) =
        storage::read_artifact(storage::embedding_path(&output), ArtifactKind::Embedding).unwrap();
    assert_eq!(embedding.len(), 3);
    assert_eq!(embedding.dim(), 2);
    assert_eq!(embedding.len(), order.len());
}

/// A universe key with no sequence gets a zero row; an encoded strain
/// outside the universe is dropped. Both are counted, neither fails the
/// encode stage.
#[test]
fn test_pathogen_encode_zero_fill_and_drop() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("alignments");
    std::fs::create_dir_all(&input).unwrap();
    write_segment(
        &input,
        "seg4.fasta",
        &[
            ("A/Puerto Rico/8/1934|PR8_Seg4", "MKLV"),
            ("A/Aichi/2/1968|X31_Seg4", "ARND"),
            ("A/Quail/HK/G1/97|Y280_Seg4", "CQEG"),
        ],
    );
    let keys = dir.path().join("strain_keys.json");
    std::fs::write(&keys, r#"["H1N1", "H3N2", "H5N1"]"#).unwrap();
    let dict = dir.path().join("strains.json");
    std::fs::write(
        &dict,
        r#"{"PR8": "H1N1", "X31": "H3N2", "VN1203": "H5N1", "Y280": "H9N2"}"#,
    )
    .unwrap();
    let spec = UniverseSpec::pathogen(&keys, &dict, '|').unwrap();

    let output = dir.path().join("out");
    let pipeline = Pipeline::new(test_config(), spec).with_silent(true);
    let (features, report) = pipeline.encode_features(&input, &output).unwrap();

    assert_eq!(report.segments, ["seg4"]);
    assert_eq!(report.zero_filled, 1, "H5N1 has no sequence");
    assert_eq!(report.dropped_keys, 1, "H9N2 is outside the universe");

    assert_eq!(features.universe(), Universe::Pathogen);
    let keys_in_order: Vec<&String> = features.keys().collect();
    assert_eq!(keys_in_order, vec!["H1N1", "H3N2", "H5N1"]);
    assert_eq!(features.rows()["H5N1"], vec![0.0; 4]);
    assert_eq!(features.rows()["H1N1"], vec![0.024, 0.059, 0.091, 0.066]);
}

/// Under the skip policy a malformed header and an unknown residue drop
/// their sequences, the run completes, and both failures land in the log.
#[test]
fn test_skip_policy_completes_and_logs() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("alignments");
    std::fs::create_dir_all(&input).unwrap();
    write_segment(
        &input,
        "seg1.fasta",
        &[
            ("M1_ABC12345", "MKLV"),
            ("badheader", "MKLV"),
            ("M2_DEF67890", "MK*V"),
        ],
    );
    let keys = write_host_keys(dir.path(), &["M1_ABC", "M2_DEF"]);
    let spec = UniverseSpec::host(&keys).unwrap();

    let mut config = test_config();
    config.encoding.on_error = ErrorPolicy::Skip;

    let output = dir.path().join("out");
    let (features, report) = Pipeline::new(config, spec)
        .with_silent(true)
        .encode_features(&input, &output)
        .unwrap();

    assert_eq!(report.skipped, 2);
    assert_eq!(report.zero_filled, 1, "M2_DEF lost its only sequence");
    assert_eq!(features.rows()["M2_DEF"], vec![0.0; 4]);

    let log = std::fs::read_to_string(storage::failures_path(&output)).unwrap();
    let lines: Vec<&str> = log.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("seg1\tbadheader\t"));
    assert!(lines[1].contains("M2_DEF67890"));
}

/// The abort policy turns the same input into a failed run that names the
/// offending header and leaves no artifacts behind.
#[test]
fn test_abort_policy_stops_on_first_failure() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("alignments");
    std::fs::create_dir_all(&input).unwrap();
    write_segment(
        &input,
        "seg1.fasta",
        &[
            ("M1_ABC12345", "MKLV"),
            ("badheader", "MKLV"),
            ("M2_DEF67890", "MK*V"),
        ],
    );
    let keys = write_host_keys(dir.path(), &["M1_ABC", "M2_DEF"]);
    let spec = UniverseSpec::host(&keys).unwrap();

    let output = dir.path().join("out");
    let err = Pipeline::new(test_config(), spec)
        .with_silent(true)
        .encode_features(&input, &output)
        .unwrap_err();

    assert!(matches!(err, CaduceusError::Parse(_)));
    assert!(err.to_string().contains("badheader"));
    assert!(!storage::features_path(&output).exists());
    assert!(!output.join(storage::SEGMENTS_DIR).exists());
}

#[test]
fn test_second_run_needs_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let (input, spec) = host_fixture(dir.path());
    let output = dir.path().join("out");

    let pipeline = Pipeline::new(test_config(), spec.clone()).with_silent(true);
    pipeline.encode_features(&input, &output).unwrap();

    let err = pipeline.encode_features(&input, &output).unwrap_err();
    assert!(matches!(err, CaduceusError::AlreadyExists(_)));
    assert!(err.to_string().contains("--overwrite"));

    let mut config = test_config();
    config.output.overwrite = true;
    Pipeline::new(config, spec)
        .with_silent(true)
        .encode_features(&input, &output)
        .unwrap();
}

#[test]
fn test_intermediate_encodings_can_be_disabled() {
    let dir = tempfile::tempdir().unwrap();
    let (input, spec) = host_fixture(dir.path());
    let output = dir.path().join("out");

    let mut config = test_config();
    config.output.write_intermediate = false;
    Pipeline::new(config, spec)
        .with_silent(true)
        .encode_features(&input, &output)
        .unwrap();

    assert!(storage::features_path(&output).exists());
    assert!(!output.join(storage::SEGMENTS_DIR).exists());
}

/// The standalone reduce path: load a persisted feature table and reduce
/// it into a different directory, without the universe files in reach.
#[test]
fn test_reduce_from_persisted_features() {
    let dir = tempfile::tempdir().unwrap();
    let (input, spec) = host_fixture(dir.path());
    let encode_out = dir.path().join("encoded");
    let reduce_out = dir.path().join("reduced");

    let config = test_config();
    Pipeline::new(config.clone(), spec)
        .with_silent(true)
        .encode_features(&input, &encode_out)
        .unwrap();

    let (_, features): (_, FeatureTable) =
        storage::read_artifact(storage::features_path(&encode_out), ArtifactKind::Features)
            .unwrap();
    let (embedding, order) = reduce_features(&config, &features, &reduce_out, true).unwrap();

    assert_eq!(embedding.len(), 3);
    assert_eq!(order.keys(), &["M1_ABC", "M2_DEF", "M3_GHI"]);
    assert!(!storage::features_path(&reduce_out).exists());

    let (_, loaded): (_, Embedding) =
        storage::read_artifact(storage::embedding_path(&reduce_out), ArtifactKind::Embedding)
            .unwrap();
    assert_eq!(loaded, embedding);
}

#[test]
fn test_nonlinear_embed_reports_strategy() {
    let dir = tempfile::tempdir().unwrap();
    let (input, spec) = host_fixture(dir.path());
    let output = dir.path().join("out");

    let mut config = test_config();
    config.reduction.strategy = ReductionStrategy::Nonlinear;
    config.reduction.epochs = 10;
    config.reduction.hidden_dim = 4;
    config.reduction.validation_fraction = 0.0;

    let report = Pipeline::new(config, spec)
        .with_silent(true)
        .embed(&input, &output)
        .unwrap();
    assert_eq!(report.strategy, "nonlinear");
    assert_eq!(report.embedding_dim, 2);

    let (_, embedding): (_, Embedding) =
        storage::read_artifact(storage::embedding_path(&output), ArtifactKind::Embedding).unwrap();
    assert_eq!(embedding.len(), 3);
    assert!(embedding.rows().iter().flatten().all(|v| v.is_finite()));
}

#[test]
fn test_gzip_segments_parse_transparently() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("alignments");
    std::fs::create_dir_all(&input).unwrap();

    let records = vec![
        AlignedSequence::new("M1_ABC12345".to_string(), b"MKLV".to_vec()),
        AlignedSequence::new("M2_DEF67890".to_string(), b"ARND".to_vec()),
    ];
    write_fasta(input.join("gene_a.fasta.gz"), &records).unwrap();

    let keys = write_host_keys(dir.path(), &["M1_ABC", "M2_DEF"]);
    let spec = UniverseSpec::host(&keys).unwrap();

    let output = dir.path().join("out");
    let (features, report) = Pipeline::new(test_config(), spec)
        .with_silent(true)
        .encode_features(&input, &output)
        .unwrap();

    assert_eq!(report.segments, ["gene_a"]);
    assert_eq!(features.rows()["M1_ABC"], vec![0.024, 0.059, 0.091, 0.066]);
}
