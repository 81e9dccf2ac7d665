use crate::core::models::atom::MoleculeClass;
use crate::core::params::thresholds::XhPiDefinition;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

/// Which molecule classes drive the pair search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunMode {
    /// Ligand atoms against protein and solvent.
    Ligand,
    /// Mutation-site atoms against every classified atom.
    Mutant,
    /// Peptide, ligand and protein atoms in a membrane or solvent medium.
    Medium,
}

impl RunMode {
    /// Coarse distance cutoff for candidate partners, in Angstroms.
    pub fn cutoff(self) -> f64 {
        match self {
            Self::Ligand | Self::Mutant => 8.0,
            Self::Medium => 6.5,
        }
    }

    /// Whether atoms of this class seed the first pass.
    pub fn is_primary(self, class: &MoleculeClass) -> bool {
        match self {
            Self::Ligand => matches!(class, MoleculeClass::Ligand),
            Self::Mutant => matches!(class, MoleculeClass::Mutant),
            Self::Medium => matches!(
                class,
                MoleculeClass::Peptide | MoleculeClass::Ligand | MoleculeClass::Protein
            ),
        }
    }

    /// Whether a first-pass primary of class `primary` may pair with `partner`.
    pub fn accepts_partner(self, primary: &MoleculeClass, partner: &MoleculeClass) -> bool {
        match self {
            Self::Ligand => matches!(partner, MoleculeClass::Protein) || partner.is_solvent(),
            Self::Mutant => true,
            Self::Medium => match primary {
                MoleculeClass::Peptide => {
                    matches!(partner, MoleculeClass::Peptide | MoleculeClass::Membrane)
                        || partner.is_solvent()
                }
                MoleculeClass::Ligand => {
                    matches!(partner, MoleculeClass::Protein) || partner.is_solvent()
                }
                MoleculeClass::Protein => partner.is_solvent(),
                _ => false,
            },
        }
    }

    /// Partner classes searched from solvent seeds during the mediation pass.
    pub fn accepts_mediated_partner(self, partner: &MoleculeClass) -> bool {
        match self {
            Self::Ligand => matches!(partner, MoleculeClass::Protein),
            Self::Mutant => matches!(partner, MoleculeClass::Antibody | MoleculeClass::Antigen),
            Self::Medium => matches!(partner, MoleculeClass::Peptide | MoleculeClass::Protein),
        }
    }

    /// Whether a first-pass record with this pair type seeds the mediation pass.
    pub fn is_mediation_seed(self, pair_type: &str, bridged: bool) -> bool {
        let Some((head, tail)) = pair_type.rsplit_once('-') else {
            return false;
        };
        if !is_solvent_tag(tail) {
            return false;
        }
        match self {
            Self::Ligand => head == "L",
            Self::Mutant => head == "Mut",
            Self::Medium => !bridged,
        }
    }
}

/// `S` followed only by digits, the pattern solvent tags take in a pair type.
fn is_solvent_tag(tag: &str) -> bool {
    tag.strip_prefix('S')
        .is_some_and(|rest| rest.chars().all(|c| c.is_ascii_digit()))
}

impl FromStr for RunMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lig" | "ligand" => Ok(Self::Ligand),
            "mut" | "mutant" => Ok(Self::Mutant),
            "med" | "medium" => Ok(Self::Medium),
            other => Err(ConfigError::InvalidParameter {
                name: "mode",
                reason: format!("unknown run mode '{other}'"),
            }),
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ligand => "Lig",
            Self::Mutant => "Mut",
            Self::Medium => "Med",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetectionConfig {
    pub mode: RunMode,
    /// Run the second, solvent-seeded pass and promote bridges.
    pub mediate: bool,
    pub exclude_13_14: bool,
    pub deduplicate: bool,
    /// Maximum bond-path length between the solvent atoms of a bridge.
    pub max_bridge_path: Option<usize>,
    pub xh_pi: XhPiDefinition,
}

#[derive(Default)]
pub struct DetectionConfigBuilder {
    mode: Option<RunMode>,
    mediate: Option<bool>,
    exclude_13_14: Option<bool>,
    deduplicate: Option<bool>,
    max_bridge_path: Option<usize>,
    xh_pi: Option<XhPiDefinition>,
}

impl DetectionConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(mut self, mode: RunMode) -> Self {
        self.mode = Some(mode);
        self
    }
    pub fn mediate(mut self, enabled: bool) -> Self {
        self.mediate = Some(enabled);
        self
    }
    pub fn exclude_13_14(mut self, enabled: bool) -> Self {
        self.exclude_13_14 = Some(enabled);
        self
    }
    pub fn deduplicate(mut self, enabled: bool) -> Self {
        self.deduplicate = Some(enabled);
        self
    }
    pub fn max_bridge_path(mut self, limit: Option<usize>) -> Self {
        self.max_bridge_path = limit;
        self
    }
    pub fn xh_pi(mut self, definition: XhPiDefinition) -> Self {
        self.xh_pi = Some(definition);
        self
    }

    pub fn build(self) -> Result<DetectionConfig, ConfigError> {
        if self.max_bridge_path == Some(0) {
            return Err(ConfigError::InvalidParameter {
                name: "max_bridge_path",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(DetectionConfig {
            mode: self.mode.ok_or(ConfigError::MissingParameter("mode"))?,
            mediate: self.mediate.unwrap_or(true),
            exclude_13_14: self.exclude_13_14.unwrap_or(true),
            deduplicate: self.deduplicate.unwrap_or(true),
            max_bridge_path: self.max_bridge_path,
            xh_pi: self.xh_pi.unwrap_or_default(),
        })
    }
}
