use crate::core::utils::identifiers::{element_symbol, is_hydrogen_type};
use nalgebra::Point3;
use std::fmt;
use std::str::FromStr;

/// Molecule class an atom is assigned to before detection.
///
/// The class decides which atoms are primary targets in a run mode, which
/// partners they may pair with, and the order of the two anchors in a stored
/// record. Solvent classes keep their full tag (`S`, `S1`, `S2`, ...) because
/// different solvent populations are reported separately.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MoleculeClass {
    /// Small-molecule ligand (`L`).
    Ligand,
    /// Protein (`Pro`).
    Protein,
    /// Peptide (`Pep`).
    Peptide,
    /// Mutation site (`Mut`).
    Mutant,
    /// Antibody (`Ab`).
    Antibody,
    /// Antigen (`Ag`).
    Antigen,
    /// Membrane (`Mem`).
    Membrane,
    /// Any tag containing `S`, such as `S` or `S1`.
    Solvent(String),
    /// Any other user-defined tag.
    Other(String),
}

impl MoleculeClass {
    pub fn tag(&self) -> &str {
        match self {
            Self::Ligand => "L",
            Self::Protein => "Pro",
            Self::Peptide => "Pep",
            Self::Mutant => "Mut",
            Self::Antibody => "Ab",
            Self::Antigen => "Ag",
            Self::Membrane => "Mem",
            Self::Solvent(tag) | Self::Other(tag) => tag,
        }
    }

    pub fn is_solvent(&self) -> bool {
        matches!(self, Self::Solvent(_))
    }

    /// Classes a solvent atom can bridge to.
    pub fn is_bridge_target(&self) -> bool {
        matches!(
            self,
            Self::Protein | Self::Mutant | Self::Antibody | Self::Antigen | Self::Peptide
        )
    }
}

impl FromStr for MoleculeClass {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim();
        if tag.is_empty() {
            return Err(());
        }
        Ok(match tag {
            "L" => Self::Ligand,
            "Pro" => Self::Protein,
            "Pep" => Self::Peptide,
            "Mut" => Self::Mutant,
            "Ab" => Self::Antibody,
            "Ag" => Self::Antigen,
            "Mem" => Self::Membrane,
            t if t.contains('S') => Self::Solvent(t.to_string()),
            t => Self::Other(t.to_string()),
        })
    }
}

impl fmt::Display for MoleculeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// An atom of the analysed structure.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// The atom id from the structure file. Unique within a structure.
    pub serial: usize,
    /// The atom name (e.g. "CA", "O1").
    pub name: String,
    /// The SYBYL atom type (e.g. "C.ar", "N.pl3", "Cl").
    pub atom_type: String,
    /// The 3D coordinates of the atom in Angstroms.
    pub position: Point3<f64>,
    /// Residue (substructure) number.
    pub residue_number: isize,
    pub residue_name: String,
    /// Chain name taken from the substructure records, when present.
    pub chain: Option<String>,
    /// The partial atomic charge in elementary charge units.
    pub partial_charge: f64,
    /// Assigned by a molecule selection; unclassified atoms never participate.
    pub molecule_class: Option<MoleculeClass>,
}

impl Atom {
    pub fn new(serial: usize, name: &str, atom_type: &str, position: Point3<f64>) -> Self {
        Self {
            serial,
            name: name.to_string(),
            atom_type: atom_type.to_string(),
            position,
            residue_number: 0,
            residue_name: String::new(),
            chain: None,
            partial_charge: 0.0,
            molecule_class: None,
        }
    }

    pub fn element(&self) -> &str {
        element_symbol(&self.atom_type)
    }

    pub fn is_hydrogen(&self) -> bool {
        is_hydrogen_type(&self.atom_type)
    }

    pub fn is_heavy(&self) -> bool {
        !self.is_hydrogen()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_atom_has_expected_default_fields() {
        let atom = Atom::new(7, "N1", "N.pl3", Point3::new(1.0, 2.0, 3.0));
        assert_eq!(atom.serial, 7);
        assert_eq!(atom.name, "N1");
        assert_eq!(atom.element(), "N");
        assert_eq!(atom.residue_number, 0);
        assert_eq!(atom.partial_charge, 0.0);
        assert!(atom.molecule_class.is_none());
        assert!(atom.is_heavy());
    }

    #[test]
    fn hydrogen_atom_is_not_heavy() {
        let atom = Atom::new(1, "H1", "H", Point3::origin());
        assert!(atom.is_hydrogen());
        assert!(!atom.is_heavy());
    }

    #[test]
    fn from_str_parses_known_tags() {
        assert_eq!("L".parse::<MoleculeClass>(), Ok(MoleculeClass::Ligand));
        assert_eq!("Pro".parse::<MoleculeClass>(), Ok(MoleculeClass::Protein));
        assert_eq!("Pep".parse::<MoleculeClass>(), Ok(MoleculeClass::Peptide));
        assert_eq!("Mut".parse::<MoleculeClass>(), Ok(MoleculeClass::Mutant));
        assert_eq!("Ab".parse::<MoleculeClass>(), Ok(MoleculeClass::Antibody));
        assert_eq!("Ag".parse::<MoleculeClass>(), Ok(MoleculeClass::Antigen));
        assert_eq!("Mem".parse::<MoleculeClass>(), Ok(MoleculeClass::Membrane));
    }

    #[test]
    fn from_str_treats_tags_with_s_as_solvent() {
        let class: MoleculeClass = "S1".parse().unwrap();
        assert!(class.is_solvent());
        assert_eq!(class.tag(), "S1");
        assert_eq!(class.to_string(), "S1");
    }

    #[test]
    fn from_str_keeps_unknown_tags_and_rejects_empty() {
        assert_eq!(
            "Lip".parse::<MoleculeClass>(),
            Ok(MoleculeClass::Other("Lip".to_string()))
        );
        assert_eq!("  ".parse::<MoleculeClass>(), Err(()));
    }

    #[test]
    fn bridge_targets_are_macromolecule_classes() {
        assert!(MoleculeClass::Protein.is_bridge_target());
        assert!(MoleculeClass::Antigen.is_bridge_target());
        assert!(!MoleculeClass::Ligand.is_bridge_target());
        assert!(!MoleculeClass::Membrane.is_bridge_target());
        assert!(!MoleculeClass::Solvent("S".into()).is_bridge_target());
    }
}
