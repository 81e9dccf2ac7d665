use super::config::RunMode;
use crate::core::models::atom::{Atom, MoleculeClass};
use crate::core::models::interaction::{BridgeLeg, InteractionRecord, Measurements, family_root};
use crate::core::models::structure::Structure;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::trace;

/// Charge slots of a dipole leg, swapped whenever the leg's atoms are.
const DIPOLE_CHARGE_SLOTS: (usize, usize) = (5, 6);

/// One side of a match as the table sees it.
#[derive(Debug, Clone, Copy)]
pub struct Role<'a> {
    pub serial: usize,
    pub class: &'a MoleculeClass,
    pub residue: isize,
}

impl<'a> Role<'a> {
    /// `None` for atoms without a molecule class.
    pub fn of(atom: &'a Atom) -> Option<Self> {
        Some(Self {
            serial: atom.serial,
            class: atom.molecule_class.as_ref()?,
            residue: atom.residue_number,
        })
    }

    /// `atom` standing in for an anchor of class `class`, as the second leg of
    /// a dipole does.
    pub fn with_class(atom: &Atom, class: &'a MoleculeClass) -> Self {
        Self {
            serial: atom.serial,
            class,
            residue: atom.residue_number,
        }
    }
}

/// What an insert did to the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The pair already carries a record of this family, or the bridge leg exists.
    Duplicate,
    /// A fresh record was appended, after `promoted` bridge promotions.
    Stored { promoted: usize },
    /// The solvent record was withheld; it only lives on as a bridge leg.
    Suppressed { promoted: usize },
}

/// The interaction records of one frame, in insertion order.
///
/// An auxiliary index maps each unordered anchor pair to the records on it and
/// is rebuilt whenever records are removed.
#[derive(Debug, Clone, Default)]
pub struct InteractionTable {
    records: Vec<InteractionRecord>,
    pair_index: HashMap<(usize, usize), Vec<usize>>,
}

fn unordered(a: usize, b: usize) -> (usize, usize) {
    (a.min(b), a.max(b))
}

fn swap_charges(items: &mut Measurements) {
    items.swap(DIPOLE_CHARGE_SLOTS.0, DIPOLE_CHARGE_SLOTS.1);
}

/// First-leg pair types a bridge to a partner of class `partner` may extend.
fn accepts_first_leg(mode: RunMode, partner: &MoleculeClass, solvent_tag: &str, pair_type: &str) -> bool {
    match partner {
        MoleculeClass::Peptide => pair_type == format!("Pep-{solvent_tag}"),
        MoleculeClass::Protein => match mode {
            RunMode::Ligand => pair_type == format!("L-{solvent_tag}"),
            RunMode::Medium => {
                pair_type == format!("L-{solvent_tag}") || pair_type == format!("Pro-{solvent_tag}")
            }
            RunMode::Mutant => true,
        },
        MoleculeClass::Mutant | MoleculeClass::Antibody | MoleculeClass::Antigen => {
            pair_type == format!("Mut-{solvent_tag}")
        }
        _ => false,
    }
}

/// Solvent contacts that are only kept when they complete a bridge.
fn suppresses_standalone(mode: RunMode, partner: &MoleculeClass) -> bool {
    match mode {
        RunMode::Ligand => matches!(partner, MoleculeClass::Protein),
        RunMode::Mutant => matches!(partner, MoleculeClass::Antibody | MoleculeClass::Antigen),
        RunMode::Medium => false,
    }
}

/// Whether the record should be stored with the roles swapped.
fn prefers_reversed(first: &MoleculeClass, second: &MoleculeClass) -> bool {
    matches!(
        second,
        MoleculeClass::Ligand | MoleculeClass::Mutant | MoleculeClass::Peptide
    ) || (first.is_solvent() && matches!(second, MoleculeClass::Protein))
}

impl InteractionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[InteractionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &InteractionRecord> {
        self.records.iter()
    }

    /// Records on the unordered pair `(a, b)`, in insertion order.
    pub fn records_on(&self, a: usize, b: usize) -> impl Iterator<Item = &InteractionRecord> {
        self.pair_index
            .get(&unordered(a, b))
            .into_iter()
            .flatten()
            .filter_map(|&i| self.records.get(i))
    }

    /// Whether `(a, b)` already carries a record whose label shares `label`'s family.
    pub fn has_family(&self, label: &str, a: usize, b: usize) -> bool {
        let root = family_root(label);
        self.records_on(a, b).any(|r| r.family_root() == root)
    }

    /// Keeps the records for which `keep` returns true, preserving order.
    pub fn retain(&mut self, keep: impl FnMut(&InteractionRecord) -> bool) {
        self.records.retain(keep);
        self.rebuild_index();
    }

    fn rebuild_index(&mut self) {
        self.pair_index.clear();
        for (i, record) in self.records.iter().enumerate() {
            self.pair_index.entry(record.pair_key()).or_default().push(i);
        }
    }

    fn push(&mut self, record: InteractionRecord) {
        self.pair_index
            .entry(record.pair_key())
            .or_default()
            .push(self.records.len());
        self.records.push(record);
    }

    /// Drops dipole records whose twin leg is missing.
    pub fn retain_paired_dipoles(&mut self) {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for record in self.records.iter().filter(|r| r.is_dipole()) {
            *counts.entry(record.label.clone()).or_default() += 1;
        }
        self.retain(|r| !r.is_dipole() || counts.get(&r.label).is_some_and(|&n| n >= 2));
    }

    /// Record count per tally label (`label1`, or `label1/label2` when bridged).
    pub fn label_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for record in &self.records {
            *counts.entry(record.tally_label()).or_default() += 1;
        }
        counts
    }

    /// Registers one detected match between `first` and `second`.
    ///
    /// The order of the roles is the order the detector evaluated them in; the
    /// stored record follows the class precedence instead. A match between a
    /// solvent atom and a bridge-eligible macromolecule atom is first offered
    /// as the second leg of every matching solvent record, and may then be
    /// withheld as a standalone record depending on the run mode.
    pub fn insert(
        &mut self,
        structure: &Structure,
        mode: RunMode,
        label: &str,
        items: Measurements,
        first: Role<'_>,
        second: Role<'_>,
    ) -> InsertOutcome {
        if self.has_family(label, first.serial, second.serial) {
            return InsertOutcome::Duplicate;
        }
        let dipole = family_root(label) != label;

        let mut promoted = 0;
        let bridge_roles = if first.class.is_solvent() && second.class.is_bridge_target() {
            Some((first, second, false))
        } else if second.class.is_solvent() && first.class.is_bridge_target() {
            Some((second, first, true))
        } else {
            None
        };
        if let Some((solvent, partner, solvent_second)) = bridge_roles {
            let duplicate_leg = self.records.iter().any(|r| {
                r.atom3() == Some(solvent.serial)
                    && r.atom4() == Some(partner.serial)
                    && r.label2() == Some(label)
            });
            if duplicate_leg {
                return InsertOutcome::Duplicate;
            }

            let mut leg_items = items;
            if dipole && solvent_second {
                swap_charges(&mut leg_items);
            }
            promoted = self.promote(structure, mode, label, leg_items, solvent, partner);

            if suppresses_standalone(mode, partner.class) {
                trace!(label, solvent = solvent.serial, partner = partner.serial, promoted, "Withheld standalone solvent record.");
                return InsertOutcome::Suppressed { promoted };
            }
        }

        let (mut first, mut second, mut items) = (first, second, items);
        let reverse = match (first.class, second.class) {
            (MoleculeClass::Peptide, MoleculeClass::Peptide) | (MoleculeClass::Mutant, MoleculeClass::Mutant) => self
                .records_on(first.serial, second.serial)
                .any(|r| r.atom1 == second.serial && r.atom2 == first.serial),
            (c1, c2) => prefers_reversed(c1, c2),
        };
        if reverse {
            std::mem::swap(&mut first, &mut second);
            if dipole {
                swap_charges(&mut items);
            }
        }

        let pair_type = format!("{}-{}", first.class.tag(), second.class.tag());
        self.push(InteractionRecord::new(label, pair_type, items, first.serial, second.serial));
        InsertOutcome::Stored { promoted }
    }

    /// Attaches a solvent-partner match as the second leg of every unbridged
    /// record that reaches the solvent's residue from a different atom.
    fn promote(
        &mut self,
        structure: &Structure,
        mode: RunMode,
        label: &str,
        items: Measurements,
        solvent: Role<'_>,
        partner: Role<'_>,
    ) -> usize {
        let residue: HashSet<usize> = structure
            .residue_atoms(solvent.residue)
            .iter()
            .filter_map(|&id| structure.atom(id).map(|a| a.serial))
            .collect();
        let solvent_tag = solvent.class.tag();
        let partner_tag = partner.class.tag();

        let mut promoted = 0;
        for record in self.records.iter_mut() {
            let eligible = record.bridge.is_none()
                && residue.contains(&record.atom2)
                && record.atom1 != partner.serial
                && accepts_first_leg(mode, partner.class, solvent_tag, &record.pair_type);
            if !eligible {
                continue;
            }
            record.bridge = Some(BridgeLeg {
                label: label.to_string(),
                items,
                solvent: solvent.serial,
                partner: partner.serial,
            });
            record.pair_type.push('-');
            record.pair_type.push_str(partner_tag);
            promoted += 1;
        }
        promoted
    }
}
