use crate::core::universe::{ParseRule, UniverseSpec};
use crate::CaduceusError;

/// Collapse a raw FASTA header to its canonical entity key.
///
/// Total over well-formed headers and loud on everything else: a malformed
/// header is a `Parse` error, a strain token missing from the dictionary is
/// a `Lookup` error, and both name the offending header so a failed run can
/// be traced back to the source record.
pub fn normalize(raw_id: &str, spec: &UniverseSpec) -> Result<String, CaduceusError> {
    match spec.rule() {
        ParseRule::PathogenDelimited { delimiter } => {
            normalize_pathogen(raw_id, *delimiter, spec)
        }
        ParseRule::HostUnderscore { suffix_len } => normalize_host(raw_id, *suffix_len),
    }
}

fn normalize_pathogen(
    raw_id: &str,
    delimiter: char,
    spec: &UniverseSpec,
) -> Result<String, CaduceusError> {
    let fields: Vec<&str> = raw_id.split(delimiter).collect();
    if fields.len() < 2 {
        return Err(CaduceusError::Parse(format!(
            "header '{}' has fewer than two '{}'-delimited fields",
            raw_id, delimiter
        )));
    }

    // The second field leads with the strain token; everything after the
    // first underscore is segment annotation.
    let strain = fields[1].split('_').next().unwrap_or("");
    match spec.strain_lookup(strain) {
        Some(canonical) => Ok(canonical.to_string()),
        None => Err(CaduceusError::Lookup(format!(
            "strain '{}' from header '{}' not in the strain dictionary",
            strain, raw_id
        ))),
    }
}

fn normalize_host(raw_id: &str, suffix_len: usize) -> Result<String, CaduceusError> {
    let tokens: Vec<&str> = raw_id.split('_').collect();
    match tokens.len() {
        3 => Ok(format!("{}_{}", tokens[0], tokens[1])),
        2 => {
            let second = tokens[1];
            let char_count = second.chars().count();
            if char_count <= suffix_len {
                return Err(CaduceusError::Parse(format!(
                    "header '{}': token '{}' is too short to carry a {}-character suffix",
                    raw_id, second, suffix_len
                )));
            }
            let stripped: String = second.chars().take(char_count - suffix_len).collect();
            Ok(format!("{}_{}", tokens[0], stripped))
        }
        n => Err(CaduceusError::Parse(format!(
            "header '{}' has {} '_'-separated tokens, expected 2 or 3",
            raw_id, n
        ))),
    }
}
