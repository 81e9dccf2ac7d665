use std::fmt;

/// Number of measurement slots carried by each leg of a record.
pub const MEASUREMENT_SLOTS: usize = 10;

const DIPOLE_PREFIX: &str = "Dipo";

/// Family-specific measurements of one detected contact.
///
/// Slots are filled in the order a detector reports them (distances, angles,
/// dihedrals, charges); unused slots stay `None`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Measurements([Option<f64>; MEASUREMENT_SLOTS]);

impl Measurements {
    /// Builds measurements from the leading slots. Values past the last slot are dropped.
    pub fn from_values(values: &[f64]) -> Self {
        let mut slots = [None; MEASUREMENT_SLOTS];
        for (slot, value) in slots.iter_mut().zip(values) {
            *slot = Some(*value);
        }
        Self(slots)
    }

    /// Builds measurements where some slots may be undefined.
    pub fn from_optional(values: &[Option<f64>]) -> Self {
        let mut slots = [None; MEASUREMENT_SLOTS];
        for (slot, value) in slots.iter_mut().zip(values) {
            *slot = *value;
        }
        Self(slots)
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.0.get(index).copied().flatten()
    }

    /// The first slot, which is the anchor distance for every family.
    pub fn primary(&self) -> Option<f64> {
        self.get(0)
    }

    pub fn swap(&mut self, a: usize, b: usize) {
        self.0.swap(a, b);
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<f64>> + '_ {
        self.0.iter().copied()
    }
}

/// Returns the family a label belongs to for duplicate checks.
///
/// Dipole labels embed the ids of the detected pair, so every dipole label
/// shares the `Dipo` root.
pub fn family_root(label: &str) -> &str {
    if label.starts_with(DIPOLE_PREFIX) {
        DIPOLE_PREFIX
    } else {
        label
    }
}

pub fn is_dipole_label(label: &str) -> bool {
    label.starts_with(DIPOLE_PREFIX)
}

/// The second leg of a solvent-mediated record: solvent atom to far-side partner.
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeLeg {
    pub label: String,
    pub items: Measurements,
    /// Serial of the bridging solvent atom.
    pub solvent: usize,
    /// Serial of the atom the solvent bridges to.
    pub partner: usize,
}

/// One row of the interaction table.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionRecord {
    pub label: String,
    /// Molecule classes of the anchors, e.g. `L-Pro`, or `L-S-Pro` once bridged.
    pub pair_type: String,
    pub items: Measurements,
    pub atom1: usize,
    pub atom2: usize,
    pub bridge: Option<BridgeLeg>,
}

impl InteractionRecord {
    pub fn new(label: &str, pair_type: String, items: Measurements, atom1: usize, atom2: usize) -> Self {
        Self {
            label: label.to_string(),
            pair_type,
            items,
            atom1,
            atom2,
            bridge: None,
        }
    }

    pub fn family_root(&self) -> &str {
        family_root(&self.label)
    }

    pub fn is_dipole(&self) -> bool {
        is_dipole_label(&self.label)
    }

    pub fn is_bridged(&self) -> bool {
        self.bridge.is_some()
    }

    /// Unordered anchor pair, smaller serial first.
    pub fn pair_key(&self) -> (usize, usize) {
        (self.atom1.min(self.atom2), self.atom1.max(self.atom2))
    }

    pub fn connects(&self, a: usize, b: usize) -> bool {
        (self.atom1 == a && self.atom2 == b) || (self.atom1 == b && self.atom2 == a)
    }

    pub fn label2(&self) -> Option<&str> {
        self.bridge.as_ref().map(|b| b.label.as_str())
    }

    pub fn atom3(&self) -> Option<usize> {
        self.bridge.as_ref().map(|b| b.solvent)
    }

    pub fn atom4(&self) -> Option<usize> {
        self.bridge.as_ref().map(|b| b.partner)
    }

    /// Label used for tallies: `label1`, or `label1/label2` for bridged records.
    pub fn tally_label(&self) -> String {
        match &self.bridge {
            Some(leg) => format!("{}/{}", self.label, leg.label),
            None => self.label.clone(),
        }
    }
}

impl fmt::Display for InteractionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({}, {})", self.label, self.pair_type, self.atom1, self.atom2)?;
        if let Some(leg) = &self.bridge {
            write!(f, " + {} ({}, {})", leg.label, leg.solvent, leg.partner)?;
        }
        Ok(())
    }
}
