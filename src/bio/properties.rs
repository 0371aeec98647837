use crate::CaduceusError;
use indexmap::IndexMap;
use std::path::Path;

/// Canonical residue ordering used by the AAindex flat files.
const RESIDUE_ORDER: &[u8; 20] = b"ARNDCQEGHILKMFPSTWYV";

/// JOND920101: relative residue composition (Jones et al., 1992).
const JOND920101: [f64; 20] = [
    0.077, 0.051, 0.043, 0.052, 0.020, 0.041, 0.062, 0.074, 0.023, 0.053, 0.091, 0.059, 0.024,
    0.040, 0.051, 0.069, 0.059, 0.014, 0.032, 0.066,
];

/// KYTJ820101: hydropathy index (Kyte-Doolittle, 1982).
const KYTJ820101: [f64; 20] = [
    1.8, -4.5, -3.5, -3.5, 2.5, -3.5, -3.5, -0.4, -3.2, 4.5, 3.8, -3.9, 1.9, 2.8, -1.6, -0.8,
    -0.7, -0.9, -1.3, 4.2,
];

/// GRAR740102: polarity (Grantham, 1974).
const GRAR740102: [f64; 20] = [
    8.1, 10.5, 11.6, 13.0, 5.5, 10.5, 12.3, 9.0, 10.4, 5.2, 4.9, 11.3, 5.7, 5.2, 8.0, 9.2, 8.6,
    5.4, 6.2, 5.9,
];

pub const BUILTIN_TABLES: &[&str] = &["JOND920101", "KYTJ820101", "GRAR740102"];

/// A per-residue numeric property table.
///
/// Lookups are byte-indexed. The alignment gap (`-`) and the ambiguity code
/// `X` always map to 0.0 so alignment padding contributes nothing to a
/// feature vector; any other unmapped residue is a loud failure at the call
/// site, never a silent default.
#[derive(Debug, Clone)]
pub struct ResidueTable {
    name: String,
    values: [Option<f64>; 256],
}

impl ResidueTable {
    fn from_pairs(name: &str, pairs: impl IntoIterator<Item = (u8, f64)>) -> Self {
        let mut values = [None; 256];
        values[b'-' as usize] = Some(0.0);
        values[b'X' as usize] = Some(0.0);
        for (residue, value) in pairs {
            values[residue.to_ascii_uppercase() as usize] = Some(value);
        }
        ResidueTable {
            name: name.to_string(),
            values,
        }
    }

    /// Look up a built-in AAindex table by accession.
    pub fn builtin(name: &str) -> Option<Self> {
        let values: &[f64; 20] = match name {
            "JOND920101" => &JOND920101,
            "KYTJ820101" => &KYTJ820101,
            "GRAR740102" => &GRAR740102,
            _ => return None,
        };
        Some(Self::from_pairs(
            name,
            RESIDUE_ORDER.iter().copied().zip(values.iter().copied()),
        ))
    }

    /// Load a custom table from a JSON object mapping single-character
    /// residues to numbers. Gap and `X` entries may be given explicitly;
    /// when absent they default to 0.0.
    pub fn from_json_file<P: AsRef<Path>>(name: &str, path: P) -> Result<Self, CaduceusError> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)?;
        let raw: IndexMap<String, f64> = serde_json::from_str(&data).map_err(|e| {
            CaduceusError::Parse(format!(
                "property table '{}' ({}): {}",
                name,
                path.display(),
                e
            ))
        })?;

        let mut pairs = Vec::with_capacity(raw.len());
        for (key, value) in &raw {
            if key.len() != 1 || !key.is_ascii() {
                return Err(CaduceusError::Parse(format!(
                    "property table '{}': key '{}' is not a single ASCII residue",
                    name, key
                )));
            }
            if !value.is_finite() {
                return Err(CaduceusError::Parse(format!(
                    "property table '{}': residue '{}' has non-finite value",
                    name, key
                )));
            }
            pairs.push((key.as_bytes()[0], *value));
        }

        Ok(Self::from_pairs(name, pairs))
    }

    /// Resolve a table reference: built-in accession first, else a path to
    /// a custom JSON table.
    pub fn resolve(reference: &str) -> Result<Self, CaduceusError> {
        if let Some(table) = Self::builtin(reference) {
            return Ok(table);
        }
        let path = Path::new(reference);
        if path.exists() {
            let name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or(reference);
            return Self::from_json_file(name, path);
        }
        Err(CaduceusError::Lookup(format!(
            "unknown property table '{}' (built-ins: {})",
            reference,
            BUILTIN_TABLES.join(", ")
        )))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value for a residue byte, or None when the table has no entry.
    #[inline]
    pub fn get(&self, residue: u8) -> Option<f64> {
        self.values[residue.to_ascii_uppercase() as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_composition_values() {
        let table = ResidueTable::builtin("JOND920101").unwrap();
        assert_eq!(table.get(b'A'), Some(0.077));
        assert_eq!(table.get(b'L'), Some(0.091));
        assert_eq!(table.get(b'W'), Some(0.014));
    }

    #[test]
    fn test_gap_and_ambiguity_map_to_zero() {
        for name in BUILTIN_TABLES {
            let table = ResidueTable::builtin(name).unwrap();
            assert_eq!(table.get(b'-'), Some(0.0));
            assert_eq!(table.get(b'X'), Some(0.0));
        }
    }

    #[test]
    fn test_unknown_residue_returns_none() {
        let table = ResidueTable::builtin("KYTJ820101").unwrap();
        assert_eq!(table.get(b'B'), None);
        assert_eq!(table.get(b'*'), None);
    }

    #[test]
    fn test_lowercase_lookup() {
        let table = ResidueTable::builtin("GRAR740102").unwrap();
        assert_eq!(table.get(b'a'), Some(8.1));
    }

    #[test]
    fn test_unknown_builtin() {
        assert!(ResidueTable::builtin("NOPE990101").is_none());
    }

    #[test]
    fn test_custom_table_from_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("charge.json");
        std::fs::write(&path, r#"{"A": 0.0, "R": 1.0, "D": -1.0}"#).unwrap();

        let table = ResidueTable::from_json_file("charge", &path).unwrap();
        assert_eq!(table.get(b'R'), Some(1.0));
        assert_eq!(table.get(b'D'), Some(-1.0));
        assert_eq!(table.get(b'-'), Some(0.0));
        assert_eq!(table.get(b'K'), None);
    }

    #[test]
    fn test_custom_table_rejects_multichar_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{"AR": 1.0}"#).unwrap();

        assert!(ResidueTable::from_json_file("bad", &path).is_err());
    }

    #[test]
    fn test_resolve_prefers_builtin() {
        let table = ResidueTable::resolve("JOND920101").unwrap();
        assert_eq!(table.name(), "JOND920101");
    }

    #[test]
    fn test_resolve_unknown_reference() {
        let err = ResidueTable::resolve("no/such/table.json").unwrap_err();
        assert!(err.to_string().contains("JOND920101"));
    }
}
