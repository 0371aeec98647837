use crate::core::encoding::SegmentEncoding;
use crate::core::universe::UniverseSpec;
use indexmap::IndexMap;
use tracing::{debug, warn};

/// Accounting for one gap-fill pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GapFillSummary {
    /// Universe keys that had no row and received a zero vector.
    pub filled: usize,
    /// Encoded keys outside the universe, dropped from the output.
    pub dropped: usize,
}

/// Complete a segment encoding against its universe.
///
/// The output key set is exactly the universe, in the universe's canonical
/// order. Absence of data is meaningful and representable (a zero vector),
/// so this stage recovers rather than errors; keys the universe does not
/// know are dropped and counted.
pub fn gap_fill(
    encoding: SegmentEncoding,
    spec: &UniverseSpec,
) -> (SegmentEncoding, GapFillSummary) {
    let segment = encoding.segment().to_string();
    let length = encoding.length();
    let mut rows = encoding.into_rows();

    let mut filled = IndexMap::with_capacity(spec.len());
    let mut summary = GapFillSummary::default();

    for key in spec.keys() {
        match rows.swap_remove(key) {
            Some(values) => {
                filled.insert(key.clone(), values);
            }
            None => {
                summary.filled += 1;
                filled.insert(key.clone(), vec![0.0; length]);
            }
        }
    }

    summary.dropped = rows.len();
    if summary.dropped > 0 {
        warn!(
            "segment {}: dropped {} key(s) outside the {} universe",
            segment,
            summary.dropped,
            spec.universe()
        );
        for key in rows.keys() {
            debug!("segment {}: dropped '{}'", segment, key);
        }
    }
    if summary.filled > 0 {
        debug!(
            "segment {}: zero-filled {} of {} universe keys",
            segment,
            summary.filled,
            spec.len()
        );
    }

    (
        SegmentEncoding::from_uniform_rows(segment, length, filled),
        summary,
    )
}
