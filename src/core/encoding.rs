use crate::bio::properties::ResidueTable;
use crate::bio::sequence::AlignedSequence;
use crate::core::align::pad_to;
use crate::core::config::ErrorPolicy;
use crate::core::identity::normalize;
use crate::core::universe::UniverseSpec;
use crate::CaduceusError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Substitute every residue of an aligned sequence with its table value.
///
/// Output length equals input length; gap columns contribute 0.0 through the
/// table itself. A residue the table does not cover fails the sequence, it
/// is never zero-filled here.
pub fn encode_sequence(
    sequence: &AlignedSequence,
    table: &ResidueTable,
    segment: &str,
) -> Result<Vec<f64>, CaduceusError> {
    let mut values = Vec::with_capacity(sequence.len());
    for &residue in &sequence.residues {
        match table.get(residue) {
            Some(value) => values.push(value),
            None => {
                return Err(CaduceusError::Lookup(format!(
                    "residue '{}' of '{}' (segment {}) not in property table '{}'",
                    residue as char,
                    sequence.raw_id,
                    segment,
                    table.name()
                )))
            }
        }
    }
    Ok(values)
}

/// One sequence that failed to normalize or encode under `ErrorPolicy::Skip`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodeFailure {
    pub segment: String,
    pub raw_id: String,
    pub reason: String,
}

/// Encoded rows of one segment file plus the failures the policy allowed.
#[derive(Debug)]
pub struct EncodeOutcome {
    pub encoding: RawSegmentEncoding,
    pub failures: Vec<EncodeFailure>,
}

/// Normalize and encode every sequence of one segment file.
///
/// Under `Abort` the first failing sequence fails the file; under `Skip`
/// failing sequences are collected for the failures log and the rest
/// proceed. A second record with the same canonical key replaces the first.
pub fn encode_segment(
    segment: &str,
    sequences: &[AlignedSequence],
    table: &ResidueTable,
    spec: &UniverseSpec,
    policy: ErrorPolicy,
) -> Result<EncodeOutcome, CaduceusError> {
    let mut encoding = RawSegmentEncoding::new(segment);
    let mut failures = Vec::new();

    for sequence in sequences {
        let outcome = normalize(&sequence.raw_id, spec)
            .and_then(|key| encode_sequence(sequence, table, segment).map(|values| (key, values)));

        match outcome {
            Ok((key, values)) => {
                encoding.insert(key, values);
            }
            Err(e) => match policy {
                ErrorPolicy::Abort => return Err(e),
                ErrorPolicy::Skip => {
                    warn!("skipping '{}' in segment {}: {}", sequence.raw_id, segment, e);
                    failures.push(EncodeFailure {
                        segment: segment.to_string(),
                        raw_id: sequence.raw_id.clone(),
                        reason: e.to_string(),
                    });
                }
            },
        }
    }

    Ok(EncodeOutcome { encoding, failures })
}

/// Encoded vectors of one segment file before length alignment. Tracks the
/// running maximum length so `align` can complete the file in one pass.
#[derive(Debug, Clone)]
pub struct RawSegmentEncoding {
    segment: String,
    rows: IndexMap<String, Vec<f64>>,
    max_len: usize,
}

impl RawSegmentEncoding {
    pub fn new(segment: &str) -> Self {
        RawSegmentEncoding {
            segment: segment.to_string(),
            rows: IndexMap::new(),
            max_len: 0,
        }
    }

    /// Insert a row. A duplicate canonical key keeps the newest vector, the
    /// replacement is logged because it usually means redundant records in
    /// the source file.
    pub fn insert(&mut self, key: String, values: Vec<f64>) {
        self.max_len = self.max_len.max(values.len());
        if self.rows.insert(key.clone(), values).is_some() {
            warn!(
                "duplicate canonical key '{}' in segment {}, keeping the newest record",
                key, self.segment
            );
        }
    }

    pub fn segment(&self) -> &str {
        &self.segment
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Pad every row to the file maximum, completing this segment.
    pub fn align(mut self) -> Result<SegmentEncoding, CaduceusError> {
        let target = self.max_len;
        for values in self.rows.values_mut() {
            pad_to(values, target);
        }
        SegmentEncoding::new(self.segment, target, self.rows)
    }
}

/// A completed segment encoding: every row has the same validated length.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentEncoding {
    segment: String,
    length: usize,
    rows: IndexMap<String, Vec<f64>>,
}

impl SegmentEncoding {
    /// Validates the uniform-length contract up front so every consumer can
    /// rely on it without re-checking.
    pub fn new(
        segment: String,
        length: usize,
        rows: IndexMap<String, Vec<f64>>,
    ) -> Result<Self, CaduceusError> {
        for (key, values) in &rows {
            if values.len() != length {
                return Err(CaduceusError::Shape(format!(
                    "segment {}: row '{}' has length {}, expected {}",
                    segment,
                    key,
                    values.len(),
                    length
                )));
            }
        }
        Ok(SegmentEncoding {
            segment,
            length,
            rows,
        })
    }

    /// Construction path for callers that produce uniform rows by
    /// construction, such as the gap filler.
    pub(crate) fn from_uniform_rows(
        segment: String,
        length: usize,
        rows: IndexMap<String, Vec<f64>>,
    ) -> Self {
        debug_assert!(rows.values().all(|v| v.len() == length));
        SegmentEncoding {
            segment,
            length,
            rows,
        }
    }

    pub fn segment(&self) -> &str {
        &self.segment
    }

    /// Uniform per-row length.
    pub fn length(&self) -> usize {
        self.length
    }

    pub fn rows(&self) -> &IndexMap<String, Vec<f64>> {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.rows.contains_key(key)
    }

    /// Grow every row to the global uniform length. Shrinking a completed
    /// segment would discard encoded positions and is refused.
    pub fn repad_to(&mut self, length: usize) -> Result<(), CaduceusError> {
        if length < self.length {
            return Err(CaduceusError::Shape(format!(
                "segment {}: cannot repad from {} down to {}",
                self.segment, self.length, length
            )));
        }
        for values in self.rows.values_mut() {
            pad_to(values, length);
        }
        self.length = length;
        Ok(())
    }

    pub fn into_rows(self) -> IndexMap<String, Vec<f64>> {
        self.rows
    }
}
