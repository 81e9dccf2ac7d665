use crate::core::models::atom::{Atom, MoleculeClass};
use crate::core::models::structure::Structure;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("Selection rule #{index} has an empty molecule class tag")]
    EmptyTag { index: usize },
    #[error("Selection rule #{index} ('{tag}') has no matching criteria")]
    EmptyRule { index: usize, tag: String },
    #[error("Selection rule #{index} ('{tag}') has an inverted residue range {start}..={end}")]
    InvertedRange {
        index: usize,
        tag: String,
        start: isize,
        end: isize,
    },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct RawRule {
    tag: String,
    #[serde(default)]
    residue_names: Vec<String>,
    #[serde(default)]
    residue_numbers: Vec<isize>,
    #[serde(default)]
    residue_ranges: Vec<[isize; 2]>,
    #[serde(default)]
    chains: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSelection {
    #[serde(default, rename = "class")]
    rules: Vec<RawRule>,
}

/// One `[[class]]` rule. Every non-empty criterion must match.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassRule {
    pub class: MoleculeClass,
    /// Residue names. A name also matches a Mol2 substructure name that only
    /// adds a trailing residue number (`HOH` matches `HOH301`).
    pub residue_names: Vec<String>,
    pub residue_numbers: Vec<isize>,
    /// Inclusive residue number ranges.
    pub residue_ranges: Vec<(isize, isize)>,
    pub chains: Vec<String>,
}

impl ClassRule {
    fn matches_name(&self, residue_name: &str) -> bool {
        if self.residue_names.is_empty() {
            return true;
        }
        let stem = residue_name.trim_end_matches(|c: char| c.is_ascii_digit());
        self.residue_names
            .iter()
            .any(|name| name == residue_name || (!stem.is_empty() && name == stem))
    }

    fn matches_number(&self, residue_number: isize) -> bool {
        if self.residue_numbers.is_empty() && self.residue_ranges.is_empty() {
            return true;
        }
        self.residue_numbers.contains(&residue_number)
            || self
                .residue_ranges
                .iter()
                .any(|&(start, end)| (start..=end).contains(&residue_number))
    }

    fn matches_chain(&self, chain: Option<&str>) -> bool {
        self.chains.is_empty() || chain.is_some_and(|c| self.chains.iter().any(|rule| rule == c))
    }

    pub fn matches(&self, atom: &Atom) -> bool {
        self.matches_name(&atom.residue_name)
            && self.matches_number(atom.residue_number)
            && self.matches_chain(atom.chain.as_deref())
    }
}

/// Ordered molecule-class rules. An atom takes the class of the first rule it matches.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MoleculeSelection {
    pub rules: Vec<ClassRule>,
}

impl MoleculeSelection {
    pub fn load(path: &Path) -> Result<Self, SelectionError> {
        let content = std::fs::read_to_string(path).map_err(|e| SelectionError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        let raw: RawSelection = toml::from_str(&content).map_err(|e| SelectionError::Toml {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawSelection) -> Result<Self, SelectionError> {
        let mut rules = Vec::with_capacity(raw.rules.len());
        for (index, rule) in raw.rules.into_iter().enumerate() {
            let index = index + 1;
            let class: MoleculeClass = rule
                .tag
                .parse()
                .map_err(|_| SelectionError::EmptyTag { index })?;
            if rule.residue_names.is_empty()
                && rule.residue_numbers.is_empty()
                && rule.residue_ranges.is_empty()
                && rule.chains.is_empty()
            {
                return Err(SelectionError::EmptyRule { index, tag: rule.tag });
            }
            if let Some([start, end]) = rule.residue_ranges.iter().find(|[s, e]| s > e) {
                return Err(SelectionError::InvertedRange {
                    index,
                    tag: rule.tag.clone(),
                    start: *start,
                    end: *end,
                });
            }
            rules.push(ClassRule {
                class,
                residue_names: rule.residue_names,
                residue_numbers: rule.residue_numbers,
                residue_ranges: rule.residue_ranges.into_iter().map(|[s, e]| (s, e)).collect(),
                chains: rule.chains,
            });
        }
        Ok(Self { rules })
    }

    pub fn classify(&self, atom: &Atom) -> Option<MoleculeClass> {
        self.rules
            .iter()
            .find(|rule| rule.matches(atom))
            .map(|rule| rule.class.clone())
    }

    /// Stamps every atom with its molecule class. Returns the number of classified atoms.
    pub fn apply(&self, structure: &mut Structure) -> usize {
        let mut classified = 0;
        for (_, atom) in structure.atoms_iter_mut() {
            atom.molecule_class = self.classify(atom);
            if atom.molecule_class.is_some() {
                classified += 1;
            }
        }
        debug!(
            classified,
            total = structure.len(),
            "Applied molecule-class selection."
        );
        classified
    }
}
