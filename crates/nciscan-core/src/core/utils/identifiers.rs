use phf::{Set, phf_set};

/// Atom types accepted as acceptor substituents in the hydrogen-bond angle tests.
pub static SUBSTITUENT_TYPES: Set<&'static str> = phf_set! {
    "C.1", "C.2", "C.3", "C.ar", "C.cat",
    "N.1", "N.2", "N.3", "N.4", "N.ar", "N.am", "N.pl3",
    "S.2", "S.3", "S.o2", "S.o", "P.3", "H",
};

pub static ACCEPTOR_TYPES: Set<&'static str> = phf_set! {
    "O.3", "O.2", "O.co2", "O.spc", "O.t3p", "O.ar", "N.1", "N.2", "N.ar",
};

pub static NITROGEN_DONOR_TYPES: Set<&'static str> = phf_set! {
    "N.3", "N.2", "N.1", "N.am", "N.pl3", "N.4", "N.ar",
};

pub static OXYGEN_DONOR_TYPES: Set<&'static str> = phf_set! {
    "O.3", "O.2", "O.co2", "O.spc", "O.t3p", "O.ar",
};

/// Ring-eligible atom types for the projection based detectors.
pub static PI_TYPES: Set<&'static str> = phf_set! {
    "C.ar", "N.ar", "C.2", "N.2", "N.pl3", "O.3", "S.3", "N.am",
};

pub static CH_DONOR_TYPES: Set<&'static str> = phf_set! {
    "C.1", "C.2", "C.3", "C.cat", "C.ar",
};

pub static CH_HETERO_ACCEPTOR_TYPES: Set<&'static str> = phf_set! {
    "N.1", "N.2", "N.ar", "N.am", "N.pl3", "S.2", "S.3", "S.ar",
};

pub static CH_OXYGEN_ACCEPTOR_TYPES: Set<&'static str> = phf_set! {
    "O.2", "O.3", "O.co2", "O.ar",
};

pub static SH_DONOR_TYPES: Set<&'static str> = phf_set! {
    "S.3", "S.2", "S.o", "S.o2", "S.ar",
};

/// Elements never considered for van der Waals contacts.
pub static VDW_EXCLUDED_ELEMENTS: Set<&'static str> = phf_set! {
    "Fe", "Zn", "Ca", "Mg", "Ni", "K", "Na", "H",
};

pub static DIPOLE_NEGATIVE_TYPES: Set<&'static str> = phf_set! {
    "O.2", "O.co2", "N.1", "S.2", "F", "Cl", "Br", "I",
};

pub static DIPOLE_POSITIVE_TYPES: Set<&'static str> = phf_set! {
    "C.2", "C.1", "C.ar", "S.o2", "S.o", "P.3",
};

pub static MULTIPOLE_DONOR_TYPES: Set<&'static str> = phf_set! {
    "O.2", "O.co2", "F", "Cl", "Br", "I", "N.1", "S.2",
};

pub static MULTIPOLE_ACCEPTOR_TYPES: Set<&'static str> = phf_set! {
    "C.ar", "C.2", "C.1",
};

pub static XH_PI_DONOR_TYPES: Set<&'static str> = phf_set! {
    "O.3", "O.spc", "O.t3p",
    "C.3", "C.2", "C.1", "C.ar",
    "N.3", "N.2", "N.pl3", "N.am", "N.4", "N.ar", "N.1",
    "S.3", "S.o2", "S.o",
};

pub static LEGACY_XH_PI_DONOR_TYPES: Set<&'static str> = phf_set! {
    "C.3", "C.2", "C.1", "C.cat", "C.ar",
    "N.1", "N.2", "N.3", "N.4", "N.am", "N.pl3", "N.ar",
    "O.3", "O.2", "O.co2", "O.spc", "O.t3p", "O.ar",
};

pub static HALOGEN_TYPES: Set<&'static str> = phf_set! { "Cl", "Br", "I" };

/// Halogen-bond acceptors that must carry exactly one substituent.
pub static HALOGEN_TERMINAL_ACCEPTOR_TYPES: Set<&'static str> = phf_set! {
    "O.2", "O.co2", "N.1", "S.2",
};

/// Halogen-bond acceptors that must carry exactly two substituents.
pub static HALOGEN_BRIDGING_ACCEPTOR_TYPES: Set<&'static str> = phf_set! {
    "O.3", "O.spc", "O.t3p", "N.2", "N.ar", "S.3",
};

pub static XH_F_DONOR_TYPES: Set<&'static str> = phf_set! {
    "C.1", "C.2", "C.3", "C.cat", "C.ar",
    "N.1", "N.2", "N.3", "N.4", "N.pl3", "N.am", "N.ar",
    "O.3", "O.spc", "O.t3p",
    "S.3", "S.o", "S.o2",
};

pub static XH_HALOGEN_DONOR_TYPES: Set<&'static str> = phf_set! {
    "C.3", "C.2", "C.1", "C.cat",
    "O.3", "O.spc", "O.t3p", "O.2",
    "S.3", "S.o", "S.o2", "S.2",
    "N.3", "N.2", "N.am", "N.pl3", "N.4", "N.ar", "N.1",
};

pub static NH_S_DONOR_TYPES: Set<&'static str> = phf_set! {
    "N.1", "N.2", "N.3", "N.4", "N.am", "N.pl3", "N.ar",
};

pub static XH_S_DONOR_TYPES: Set<&'static str> = phf_set! {
    "O.2", "O.3", "O.co2", "O.ar", "S.2", "S.3", "S.o", "S.o2",
};

/// Divalent and aromatic sulfur, used on either side of the sulfur contact families.
pub static SULFUR_TYPES: Set<&'static str> = phf_set! { "S.2", "S.3", "S.ar" };

pub static S_O_DONOR_TYPES: Set<&'static str> = phf_set! { "S.2", "S.3" };

pub static S_O_ACCEPTOR_TYPES: Set<&'static str> = phf_set! { "O.2", "O.3", "O.co2" };

pub static S_N_ACCEPTOR_TYPES: Set<&'static str> = phf_set! { "N.ar", "N.2" };

pub static METAL_TYPES: Set<&'static str> = phf_set! { "Fe", "Zn", "Ca", "Mg", "Ni" };

pub static METAL_LIGAND_TYPES: Set<&'static str> = phf_set! {
    "O.2", "O.co2", "O.3", "N.2", "N.ar", "N.1", "N.3", "N.am", "N.pl3", "S.2", "S.3",
};

pub static ION_TYPES: Set<&'static str> = phf_set! { "Na", "K", "Cl" };

/// Element symbol of a SYBYL atom type: everything before the first `.`.
pub fn element_symbol(atom_type: &str) -> &str {
    atom_type.split('.').next().unwrap_or(atom_type).trim()
}

pub fn is_hydrogen_type(atom_type: &str) -> bool {
    element_symbol(atom_type) == "H"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_symbol_strips_hybridization_suffix() {
        assert_eq!(element_symbol("C.ar"), "C");
        assert_eq!(element_symbol("N.pl3"), "N");
        assert_eq!(element_symbol("Cl"), "Cl");
        assert_eq!(element_symbol("O.co2"), "O");
    }

    #[test]
    fn hydrogen_is_recognized_by_element() {
        assert!(is_hydrogen_type("H"));
        assert!(is_hydrogen_type("H.spc"));
        assert!(!is_hydrogen_type("Hg"));
        assert!(!is_hydrogen_type("N.3"));
    }

    #[test]
    fn acceptor_and_donor_sets_overlap_only_where_expected() {
        assert!(ACCEPTOR_TYPES.contains("O.2"));
        assert!(OXYGEN_DONOR_TYPES.contains("O.2"));
        assert!(!ACCEPTOR_TYPES.contains("N.3"));
        assert!(NITROGEN_DONOR_TYPES.contains("N.3"));
    }

    #[test]
    fn substituent_set_includes_hydrogen() {
        assert!(SUBSTITUENT_TYPES.contains("H"));
        assert!(!SUBSTITUENT_TYPES.contains("O.3"));
    }

    #[test]
    fn halogen_acceptor_sets_are_disjoint() {
        for ty in HALOGEN_TERMINAL_ACCEPTOR_TYPES.iter() {
            assert!(!HALOGEN_BRIDGING_ACCEPTOR_TYPES.contains(ty));
        }
    }
}
