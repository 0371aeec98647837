use serde::{Deserialize, Serialize};

/// One record from an aligned segment file.
///
/// The identifier is the raw header line as it appears in the file (without
/// the leading `>`); canonicalization into an entity key happens later so
/// that parse failures can name the exact header they choked on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlignedSequence {
    pub raw_id: String,
    pub residues: Vec<u8>,
}

impl AlignedSequence {
    pub fn new(raw_id: String, residues: Vec<u8>) -> Self {
        Self { raw_id, residues }
    }

    pub fn len(&self) -> usize {
        self.residues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }

    /// Alignment columns that are not gaps.
    pub fn occupancy(&self) -> usize {
        self.residues.iter().filter(|&&c| c != b'-').count()
    }

    pub fn to_string(&self) -> String {
        String::from_utf8_lossy(&self.residues).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_occupancy_counts_non_gap_columns() {
        let seq = AlignedSequence::new("s1".to_string(), b"MK--VL-".to_vec());
        assert_eq!(seq.len(), 7);
        assert_eq!(seq.occupancy(), 4);
    }

    #[test]
    fn test_empty_sequence() {
        let seq = AlignedSequence::new("s2".to_string(), Vec::new());
        assert!(seq.is_empty());
        assert_eq!(seq.occupancy(), 0);
    }
}
