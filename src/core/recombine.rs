use crate::core::encoding::SegmentEncoding;
use crate::core::universe::{Universe, UniverseSpec};
use crate::CaduceusError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Entity-keyed feature vectors: one row per universe key, each row the
/// concatenation of that entity's segment vectors in fixed segment order.
/// Row width is validated at construction, so holders of a FeatureTable
/// never re-check shapes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureTable {
    universe: Universe,
    segments: Vec<String>,
    segment_length: usize,
    rows: IndexMap<String, Vec<f64>>,
}

impl FeatureTable {
    pub fn new(
        universe: Universe,
        segments: Vec<String>,
        segment_length: usize,
        rows: IndexMap<String, Vec<f64>>,
    ) -> Result<Self, CaduceusError> {
        if segments.is_empty() {
            return Err(CaduceusError::Shape(
                "feature table needs at least one segment".to_string(),
            ));
        }
        let width = segments.len() * segment_length;
        for (key, values) in &rows {
            if values.len() != width {
                return Err(CaduceusError::Shape(format!(
                    "feature row '{}' has length {}, expected {} ({} segments x {})",
                    key,
                    values.len(),
                    width,
                    segments.len(),
                    segment_length
                )));
            }
        }
        Ok(FeatureTable {
            universe,
            segments,
            segment_length,
            rows,
        })
    }

    pub fn universe(&self) -> Universe {
        self.universe
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn segment_length(&self) -> usize {
        self.segment_length
    }

    /// Total row width, segments x per-segment length.
    pub fn width(&self) -> usize {
        self.segments.len() * self.segment_length
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

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.rows.keys()
    }

    /// Column range of one segment's block within a row.
    pub fn segment_block(&self, index: usize) -> Range<usize> {
        let start = index * self.segment_length;
        start..start + self.segment_length
    }
}

/// Concatenate gap-filled segment encodings into the FeatureTable.
///
/// Every encoding arrives with the exact universe key set and a shared
/// uniform length; this stage re-checks both and fails with `Shape` rather
/// than producing a misaligned table.
pub fn recombine(
    encodings: &[SegmentEncoding],
    spec: &UniverseSpec,
) -> Result<FeatureTable, CaduceusError> {
    if encodings.is_empty() {
        return Err(CaduceusError::Shape(
            "no segment encodings to recombine".to_string(),
        ));
    }

    let length = encodings[0].length();
    for encoding in encodings {
        if encoding.length() != length {
            return Err(CaduceusError::Shape(format!(
                "segment {} has uniform length {}, segment {} has {}",
                encodings[0].segment(),
                length,
                encoding.segment(),
                encoding.length()
            )));
        }
        if encoding.len() != spec.len() {
            return Err(CaduceusError::Shape(format!(
                "segment {} covers {} keys, the {} universe has {}",
                encoding.segment(),
                encoding.len(),
                spec.universe(),
                spec.len()
            )));
        }
    }

    let segments: Vec<String> = encodings.iter().map(|e| e.segment().to_string()).collect();
    let width = segments.len() * length;

    let mut rows = IndexMap::with_capacity(spec.len());
    for key in spec.keys() {
        let mut row = Vec::with_capacity(width);
        for encoding in encodings {
            match encoding.rows().get(key) {
                Some(values) => row.extend_from_slice(values),
                None => {
                    return Err(CaduceusError::Shape(format!(
                        "entity '{}' missing from segment {}",
                        key,
                        encoding.segment()
                    )))
                }
            }
        }
        rows.insert(key.clone(), row);
    }

    FeatureTable::new(spec.universe(), segments, length, rows)
}
