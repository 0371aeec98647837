use crate::CaduceusError;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::warn;

/// The two disjoint entity populations the pipeline embeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Universe {
    Pathogen,
    Host,
}

impl std::fmt::Display for Universe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Universe::Pathogen => write!(f, "pathogen"),
            Universe::Host => write!(f, "host"),
        }
    }
}

/// How raw FASTA headers of a universe collapse to canonical entity keys.
/// Carried by the universe descriptor so the normalizer stays pure logic
/// over data, with no universe-specific branches baked in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseRule {
    /// Split on `delimiter`, take the second field, split that on `_`, take
    /// the first token, then resolve it through the strain dictionary.
    PathogenDelimited { delimiter: char },
    /// Split on `_`; three tokens drop the last, two tokens strip a fixed
    /// `suffix_len` tail from the second.
    HostUnderscore { suffix_len: usize },
}

impl ParseRule {
    pub fn default_for(universe: Universe) -> Self {
        match universe {
            Universe::Pathogen => ParseRule::PathogenDelimited { delimiter: '|' },
            Universe::Host => ParseRule::HostUnderscore { suffix_len: 5 },
        }
    }
}

/// Immutable description of one universe: the authoritative ordered key set,
/// the header parse rule, and (pathogen only) the strain dictionary.
#[derive(Debug, Clone)]
pub struct UniverseSpec {
    universe: Universe,
    keys: IndexSet<String>,
    rule: ParseRule,
    strain_dict: HashMap<String, String>,
}

impl UniverseSpec {
    pub fn new(
        universe: Universe,
        keys: IndexSet<String>,
        rule: ParseRule,
        strain_dict: HashMap<String, String>,
    ) -> Result<Self, CaduceusError> {
        if keys.is_empty() {
            return Err(CaduceusError::Parse(format!(
                "{} universe has no keys",
                universe
            )));
        }
        Ok(UniverseSpec {
            universe,
            keys,
            rule,
            strain_dict,
        })
    }

    /// Build a pathogen universe from a JSON key array and a JSON
    /// strain-to-canonical dictionary.
    pub fn pathogen<P: AsRef<Path>, Q: AsRef<Path>>(
        keys_path: P,
        dict_path: Q,
        delimiter: char,
    ) -> Result<Self, CaduceusError> {
        let keys = load_key_file(keys_path.as_ref())?;
        let strain_dict = load_strain_dict(dict_path.as_ref())?;
        Self::new(
            Universe::Pathogen,
            keys,
            ParseRule::PathogenDelimited { delimiter },
            strain_dict,
        )
    }

    /// Build a host universe from a JSON key array.
    pub fn host<P: AsRef<Path>>(keys_path: P) -> Result<Self, CaduceusError> {
        let keys = load_key_file(keys_path.as_ref())?;
        Self::new(
            Universe::Host,
            keys,
            ParseRule::default_for(Universe::Host),
            HashMap::new(),
        )
    }

    pub fn universe(&self) -> Universe {
        self.universe
    }

    pub fn rule(&self) -> &ParseRule {
        &self.rule
    }

    /// Canonical key order. Every downstream table follows this order until
    /// the OrderRecord freezes it.
    pub fn keys(&self) -> &IndexSet<String> {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn strain_lookup(&self, token: &str) -> Option<&str> {
        self.strain_dict.get(token).map(|s| s.as_str())
    }
}

fn load_key_file(path: &Path) -> Result<IndexSet<String>, CaduceusError> {
    let data = std::fs::read_to_string(path)?;
    let raw: Vec<String> = serde_json::from_str(&data).map_err(|e| {
        CaduceusError::Parse(format!("universe key file {}: {}", path.display(), e))
    })?;

    let mut keys = IndexSet::with_capacity(raw.len());
    for key in raw {
        if !keys.insert(key.clone()) {
            warn!("duplicate universe key '{}' in {}", key, path.display());
        }
    }
    if keys.is_empty() {
        return Err(CaduceusError::Parse(format!(
            "universe key file {} is empty",
            path.display()
        )));
    }
    Ok(keys)
}

fn load_strain_dict(path: &Path) -> Result<HashMap<String, String>, CaduceusError> {
    let data = std::fs::read_to_string(path)?;
    let dict: HashMap<String, String> = serde_json::from_str(&data).map_err(|e| {
        CaduceusError::Parse(format!("strain dictionary {}: {}", path.display(), e))
    })?;
    Ok(dict)
}
