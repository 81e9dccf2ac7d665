use thiserror::Error;

use super::config::ConfigError;
use crate::core::params::thresholds::XhPiDefinition;

/// Errors that abort the detection of one frame.
///
/// Every variant is a configuration problem discovered while the frame was
/// being processed; the partial table of that frame must be discarded.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid detection configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Missing threshold entry '{key}'")]
    MissingThreshold { key: String },

    #[error("No van der Waals radius defined for element '{element}'")]
    MissingVdwRadius { element: String },

    #[error(
        "Overlapping interaction([{}]) between atom_id={atom1} and atom_id={atom2} that does not have a defined priority.",
        .labels.join(", ")
    )]
    UnresolvedPriority {
        labels: Vec<String>,
        atom1: usize,
        atom2: usize,
    },

    #[error("Duplicate removal was requested but no priority table was provided")]
    MissingPriorityTable,

    #[error("Threshold table was loaded for the {loaded:?} X-H/pi definition but the run uses {requested:?}")]
    XhPiDefinitionMismatch {
        loaded: XhPiDefinition,
        requested: XhPiDefinition,
    },

    #[error("Atom {0} not found in structure")]
    AtomNotFound(usize),

    #[error("Internal logic error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unresolved_priority_message_names_labels_and_pair() {
        let err = EngineError::UnresolvedPriority {
            labels: vec!["HB_NH_O".into(), "vdW".into()],
            atom1: 5,
            atom2: 9,
        };
        assert_eq!(
            err.to_string(),
            "Overlapping interaction([HB_NH_O, vdW]) between atom_id=5 and atom_id=9 that does not have a defined priority."
        );
    }
}
