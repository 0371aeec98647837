use crate::core::recombine::FeatureTable;
use crate::core::universe::Universe;
use serde::{Deserialize, Serialize};

/// The row-to-entity correspondence of an embedding, captured at reduction
/// time and persisted next to the matrix. Row `i` of the embedding belongs
/// to `keys[i]`; consumers must read identity from this record, never from
/// universe iteration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    universe: Universe,
    keys: Vec<String>,
}

impl OrderRecord {
    pub fn from_table(table: &FeatureTable) -> Self {
        OrderRecord {
            universe: table.universe(),
            keys: table.keys().cloned().collect(),
        }
    }

    pub fn universe(&self) -> Universe {
        self.universe
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn key_at(&self, row: usize) -> Option<&str> {
        self.keys.get(row).map(|s| s.as_str())
    }

    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.keys.iter().position(|k| k == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    fn table() -> FeatureTable {
        let mut rows = IndexMap::new();
        rows.insert("C".to_string(), vec![1.0]);
        rows.insert("A".to_string(), vec![2.0]);
        rows.insert("B".to_string(), vec![3.0]);
        FeatureTable::new(Universe::Pathogen, vec!["seg1".to_string()], 1, rows).unwrap()
    }

    #[test]
    fn test_captures_table_row_order() {
        let record = OrderRecord::from_table(&table());
        assert_eq!(record.keys(), &["C", "A", "B"]);
        assert_eq!(record.universe(), Universe::Pathogen);
    }

    #[test]
    fn test_row_lookup_both_directions() {
        let record = OrderRecord::from_table(&table());
        assert_eq!(record.key_at(1), Some("A"));
        assert_eq!(record.key_at(9), None);
        assert_eq!(record.index_of("B"), Some(2));
        assert_eq!(record.index_of("Z"), None);
    }
}
