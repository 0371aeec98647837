//! End-to-end pipeline: encode -> align -> gap-fill -> recombine -> reduce.

use crate::bio::fasta::parse_fasta;
use crate::bio::properties::ResidueTable;
use crate::core::config::{Config, ErrorPolicy};
use crate::core::encoding::{encode_segment, EncodeFailure, SegmentEncoding};
use crate::core::gapfill::gap_fill;
use crate::core::order::OrderRecord;
use crate::core::recombine::{recombine, FeatureTable};
use crate::core::reduce::{reducer_for, Embedding};
use crate::core::universe::UniverseSpec;
use crate::storage;
use crate::storage::ArtifactKind;
use crate::utils::progress::{stage_bar, stage_spinner};
use crate::CaduceusError;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

const SEGMENT_EXTENSIONS: &[&str] = &["fasta", "fa", "afa", "aln"];

/// Accounting from the encode half of a run.
#[derive(Debug, Clone, Default)]
pub struct EncodeReport {
    pub segments: Vec<String>,
    pub entities: usize,
    /// Global uniform per-segment length after both alignment phases.
    pub segment_length: usize,
    /// Sequences skipped under `ErrorPolicy::Skip`.
    pub skipped: usize,
    /// Universe keys that received zero vectors, summed over segments.
    pub zero_filled: usize,
    /// Encoded keys outside the universe, summed over segments.
    pub dropped_keys: usize,
}

/// Accounting from a full embed run.
#[derive(Debug, Clone)]
pub struct EmbedReport {
    pub encode: EncodeReport,
    pub strategy: &'static str,
    pub embedding_dim: usize,
}

/// Batch pipeline over one universe. Configured once, then run against a
/// segment directory; every stage is deterministic, so rerunning with the
/// same inputs and configuration reproduces the artifacts bit for bit
/// (modulo envelope timestamps).
pub struct Pipeline {
    config: Config,
    spec: UniverseSpec,
    silent: bool,
}

impl Pipeline {
    pub fn new(config: Config, spec: UniverseSpec) -> Self {
        Pipeline {
            config,
            spec,
            silent: false,
        }
    }

    pub fn with_silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn spec(&self) -> &UniverseSpec {
        &self.spec
    }

    /// Run the encode half: parse, normalize, encode, align twice, gap-fill
    /// and recombine. Persists per-segment encodings (when configured), the
    /// feature table and the failures log.
    pub fn encode_features(
        &self,
        input_dir: &Path,
        output_dir: &Path,
    ) -> Result<(FeatureTable, EncodeReport), CaduceusError> {
        let started = Instant::now();
        let files = discover_segment_files(input_dir)?;
        info!(
            "{} universe: {} segment file(s) under {}",
            self.spec.universe(),
            files.len(),
            input_dir.display()
        );

        std::fs::create_dir_all(output_dir)?;

        let table = ResidueTable::resolve(&self.config.encoding.table)?;
        let policy = self.config.encoding.on_error;

        let encode_pb = stage_bar(files.len() as u64, "Encoding segments", self.silent);

        // Segment files are independent until the global alignment barrier.
        let per_file: Result<Vec<(SegmentEncoding, Vec<EncodeFailure>)>, CaduceusError> = files
            .par_iter()
            .map(|(name, path)| {
                let sequences = parse_fasta(path)?;
                if sequences.is_empty() {
                    return Err(CaduceusError::Parse(format!(
                        "segment file {} has no records",
                        path.display()
                    )));
                }
                let outcome = encode_segment(name, &sequences, &table, &self.spec, policy)?;
                if outcome.encoding.is_empty() {
                    return Err(CaduceusError::Parse(format!(
                        "segment {}: every sequence was skipped",
                        name
                    )));
                }
                let completed = outcome.encoding.align()?;
                encode_pb.inc(1);
                Ok((completed, outcome.failures))
            })
            .collect();
        let per_file = per_file?;
        encode_pb.finish_with_message("Encoding complete");

        let mut encodings: Vec<SegmentEncoding> = Vec::with_capacity(per_file.len());
        let mut failures: Vec<EncodeFailure> = Vec::new();
        for (encoding, file_failures) in per_file {
            encodings.push(encoding);
            failures.extend(file_failures);
        }

        // Global phase: one uniform length across all segments.
        let global_length = encodings.iter().map(|e| e.length()).max().unwrap_or(0);
        for encoding in &mut encodings {
            encoding.repad_to(global_length)?;
        }
        info!("global uniform length: {}", global_length);

        let mut report = EncodeReport {
            segments: encodings.iter().map(|e| e.segment().to_string()).collect(),
            entities: self.spec.len(),
            segment_length: global_length,
            skipped: failures.len(),
            ..EncodeReport::default()
        };

        let mut filled = Vec::with_capacity(encodings.len());
        for encoding in encodings {
            let (complete, summary) = gap_fill(encoding, &self.spec);
            report.zero_filled += summary.filled;
            report.dropped_keys += summary.dropped;
            filled.push(complete);
        }

        if self.config.output.write_intermediate {
            std::fs::create_dir_all(output_dir.join(storage::SEGMENTS_DIR))?;
            for encoding in &filled {
                storage::write_artifact(
                    storage::segment_encoding_path(output_dir, encoding.segment()),
                    ArtifactKind::SegmentEncoding,
                    encoding,
                    self.config.output.overwrite,
                )?;
            }
        }

        let features = recombine(&filled, &self.spec)?;
        storage::write_artifact(
            storage::features_path(output_dir),
            ArtifactKind::Features,
            &features,
            self.config.output.overwrite,
        )?;

        if !failures.is_empty() {
            let log_path = storage::failures_path(output_dir);
            storage::write_failures_log(&log_path, &failures)?;
            warn!(
                "skipped {} sequence(s), details in {}",
                failures.len(),
                log_path.display()
            );
        }

        info!(
            "feature table: {} entities x {} columns in {:.2?}",
            features.len(),
            features.width(),
            started.elapsed()
        );
        Ok((features, report))
    }

    /// Full run: encode half, then reduction half.
    pub fn embed(&self, input_dir: &Path, output_dir: &Path) -> Result<EmbedReport, CaduceusError> {
        let (features, encode) = self.encode_features(input_dir, output_dir)?;
        let (embedding, _) = reduce_features(&self.config, &features, output_dir, self.silent)?;
        Ok(EmbedReport {
            encode,
            strategy: reducer_for(&self.config.reduction).name(),
            embedding_dim: embedding.dim(),
        })
    }
}

/// Reduce a feature table and persist embedding plus order record. Free of
/// the Pipeline because the table already carries its universe tag; the
/// standalone reduce command re-reduces persisted features without the
/// original universe files.
pub fn reduce_features(
    config: &Config,
    features: &FeatureTable,
    output_dir: &Path,
    silent: bool,
) -> Result<(Embedding, OrderRecord), CaduceusError> {
    let started = Instant::now();
    std::fs::create_dir_all(output_dir)?;

    // Row identity is frozen before reduction; the embedding must line up
    // with this record row for row.
    let order = OrderRecord::from_table(features);

    let reducer = reducer_for(&config.reduction);
    info!(
        "reducing {} x {} to {} dimension(s) with the {} strategy",
        features.len(),
        features.width(),
        config.reduction.target_dim,
        reducer.name()
    );

    let spinner = stage_spinner("Reducing dimensions", silent);

    let embedding = reducer.reduce(features)?;
    spinner.finish_with_message("Reduction complete");

    if embedding.len() != order.len() {
        return Err(CaduceusError::Shape(format!(
            "embedding has {} rows, order record has {}",
            embedding.len(),
            order.len()
        )));
    }

    storage::write_artifact(
        storage::embedding_path(output_dir),
        ArtifactKind::Embedding,
        &embedding,
        config.output.overwrite,
    )?;
    storage::write_artifact(
        storage::order_path(output_dir),
        ArtifactKind::Order,
        &order,
        config.output.overwrite,
    )?;

    info!(
        "embedding: {} x {} in {:.2?}",
        embedding.len(),
        embedding.dim(),
        started.elapsed()
    );
    Ok((embedding, order))
}

/// Find aligned segment files and derive their segment names. Name order is
/// lexicographic so segment order never depends on directory iteration.
fn discover_segment_files(input_dir: &Path) -> Result<Vec<(String, PathBuf)>, CaduceusError> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(input_dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if let Some(name) = segment_name(&path) {
            files.push((name, path));
        }
    }

    if files.is_empty() {
        return Err(CaduceusError::Config(format!(
            "no segment files ({}, optionally .gz) found in {}",
            SEGMENT_EXTENSIONS.join("/"),
            input_dir.display()
        )));
    }

    files.sort_by(|a, b| a.0.cmp(&b.0));
    for pair in files.windows(2) {
        if pair[0].0 == pair[1].0 {
            return Err(CaduceusError::Config(format!(
                "segment name '{}' appears more than once in {}",
                pair[0].0,
                input_dir.display()
            )));
        }
    }
    Ok(files)
}

/// Segment name = file stem with the alignment extension (and a trailing
/// .gz) stripped. Returns None for files that are not aligned FASTA.
fn segment_name(path: &Path) -> Option<String> {
    let file_name = path.file_name()?.to_str()?;
    let trimmed = file_name.strip_suffix(".gz").unwrap_or(file_name);
    let (stem, ext) = trimmed.rsplit_once('.')?;
    if SEGMENT_EXTENSIONS.contains(&ext) && !stem.is_empty() {
        Some(stem.to_string())
    } else {
        None
    }
}
