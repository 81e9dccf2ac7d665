use super::{ParamLoadError, read_file};
use std::collections::HashMap;
use std::path::Path;

const VDW_LABEL: &str = "vdW";

/// Integer priorities used to pick the surviving family when several match the
/// same atom pair.
///
/// Most entries are keyed by family label. Van der Waals entries are keyed by
/// element pair instead (`"C_O_vdW" = 2`), and match the two anchor elements in
/// either order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriorityTable {
    families: HashMap<String, i64>,
    vdw_pairs: HashMap<(String, String), i64>,
}

fn ordered_pair(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

impl PriorityTable {
    pub fn load(path: &Path) -> Result<Self, ParamLoadError> {
        let content = read_file(path)?;
        let table: toml::Table = toml::from_str(&content).map_err(|e| ParamLoadError::Toml {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        Self::from_table(&table)
    }

    pub fn from_table(table: &toml::Table) -> Result<Self, ParamLoadError> {
        let mut priorities = Self::default();
        for (key, value) in table {
            let toml::Value::Integer(score) = value else {
                return Err(ParamLoadError::NonIntegerPriority { key: key.clone() });
            };
            priorities.insert(key, *score)?;
        }
        Ok(priorities)
    }

    pub fn insert(&mut self, key: &str, score: i64) -> Result<(), ParamLoadError> {
        if key.contains(VDW_LABEL) {
            let mut segments = key.split('_');
            match (segments.next(), segments.next()) {
                (Some(el1), Some(el2)) if !el1.is_empty() && !el2.is_empty() && el2 != VDW_LABEL => {
                    self.vdw_pairs.insert(ordered_pair(el1, el2), score);
                }
                _ => {
                    return Err(ParamLoadError::MalformedPriorityKey {
                        key: key.to_string(),
                    });
                }
            }
        } else {
            self.families.insert(key.to_string(), score);
        }
        Ok(())
    }

    /// Priority of a record with the given label between atoms of the given elements.
    pub fn score(&self, label: &str, element1: &str, element2: &str) -> Option<i64> {
        if label == VDW_LABEL {
            self.vdw_pairs.get(&ordered_pair(element1, element2)).copied()
        } else {
            self.families.get(label).copied()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty() && self.vdw_pairs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn load_str(content: &str) -> Result<PriorityTable, ParamLoadError> {
        let dir = tempdir().unwrap();
        let path = dir.path().join("priority.toml");
        fs::write(&path, content).unwrap();
        PriorityTable::load(&path)
    }

    #[test]
    fn family_scores_are_looked_up_by_label() {
        let table = load_str("\"HB_NH_O\" = 10\n\"CH_O\" = 3\n").unwrap();
        assert_eq!(table.score("HB_NH_O", "N", "O"), Some(10));
        assert_eq!(table.score("CH_O", "C", "O"), Some(3));
        assert_eq!(table.score("PI_PI", "C", "C"), None);
    }

    #[test]
    fn vdw_scores_match_element_pair_in_either_order() {
        let table = load_str("\"C_O_vdW\" = 1\n").unwrap();
        assert_eq!(table.score("vdW", "C", "O"), Some(1));
        assert_eq!(table.score("vdW", "O", "C"), Some(1));
        assert_eq!(table.score("vdW", "C", "N"), None);
    }

    #[test]
    fn load_rejects_non_integer_values() {
        for content in ["\"HB_NH_O\" = 1.5\n", "\"HB_NH_O\" = 2.0\n", "\"HB_NH_O\" = \"3\"\n", "\"HB_NH_O\" = true\n"] {
            let result = load_str(content);
            assert!(
                matches!(result, Err(ParamLoadError::NonIntegerPriority { ref key }) if key == "HB_NH_O"),
                "accepted {content}"
            );
        }
    }

    #[test]
    fn load_rejects_vdw_key_without_elements() {
        assert!(matches!(
            load_str("\"vdW\" = 1\n"),
            Err(ParamLoadError::MalformedPriorityKey { .. })
        ));
        assert!(matches!(
            load_str("\"C_vdW\" = 1\n"),
            Err(ParamLoadError::MalformedPriorityKey { .. })
        ));
    }

    #[test]
    fn empty_table_is_empty() {
        let table = load_str("").unwrap();
        assert!(table.is_empty());
    }
}
