use super::atom::Atom;
use super::ids::AtomId;
use super::topology::{Bond, BondOrder};
use slotmap::{SecondaryMap, SlotMap};
use std::collections::{HashMap, VecDeque};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StructureError {
    #[error("Duplicate atom id {0}")]
    DuplicateSerial(usize),
    #[error("Bond references unknown atom id {0}")]
    UnknownBondAtom(usize),
    #[error("Atom {0} cannot be bonded to itself")]
    SelfBond(usize),
}

/// One static snapshot of a molecular structure: atoms and covalent bonds.
///
/// Atoms are addressed internally by [`AtomId`] and externally by the serial
/// number read from the structure file. Bond adjacency is kept sorted by
/// serial so every substituent iteration is deterministic.
#[derive(Debug, Clone, Default)]
pub struct Structure {
    /// Primary atom storage. Iteration follows insertion order.
    atoms: SlotMap<AtomId, Atom>,
    serial_map: HashMap<usize, AtomId>,
    bonds: Vec<Bond>,
    /// Bonded neighbours of each atom, sorted by ascending serial.
    bond_adjacency: SecondaryMap<AtomId, Vec<AtomId>>,
    /// Atoms of each residue number, in insertion order.
    residue_index: HashMap<isize, Vec<AtomId>>,
}

impl Structure {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn atom(&self, id: AtomId) -> Option<&Atom> {
        self.atoms.get(id)
    }

    pub fn atoms_iter(&self) -> impl Iterator<Item = (AtomId, &Atom)> {
        self.atoms.iter()
    }

    pub fn atoms_iter_mut(&mut self) -> impl Iterator<Item = (AtomId, &mut Atom)> {
        self.atoms.iter_mut()
    }

    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    /// Looks up an atom by the serial number used in the structure file.
    pub fn find_atom_by_serial(&self, serial: usize) -> Option<AtomId> {
        self.serial_map.get(&serial).copied()
    }

    /// Adds an atom. Returns `None` if an atom with the same serial already exists.
    pub fn add_atom(&mut self, atom: Atom) -> Option<AtomId> {
        if self.serial_map.contains_key(&atom.serial) {
            return None;
        }
        let serial = atom.serial;
        let residue_number = atom.residue_number;
        let id = self.atoms.insert(atom);
        self.serial_map.insert(serial, id);
        self.bond_adjacency.insert(id, Vec::new());
        self.residue_index.entry(residue_number).or_default().push(id);
        Some(id)
    }

    /// Adds an undirected bond. Repeated bonds between the same atoms are ignored.
    ///
    /// Returns `None` if either atom is missing or both ids are the same atom.
    pub fn add_bond(&mut self, atom1_id: AtomId, atom2_id: AtomId, order: BondOrder) -> Option<()> {
        if atom1_id == atom2_id || !self.atoms.contains_key(atom1_id) || !self.atoms.contains_key(atom2_id) {
            return None;
        }
        if self.are_bonded(atom1_id, atom2_id) {
            return Some(());
        }
        self.bonds.push(Bond::new(atom1_id, atom2_id, order));
        self.insert_neighbor(atom1_id, atom2_id);
        self.insert_neighbor(atom2_id, atom1_id);
        Some(())
    }

    fn insert_neighbor(&mut self, atom_id: AtomId, neighbor_id: AtomId) {
        let Some(serial) = self.atoms.get(neighbor_id).map(|a| a.serial) else {
            return;
        };
        let atoms = &self.atoms;
        if let Some(list) = self.bond_adjacency.get_mut(atom_id) {
            let pos = list.partition_point(|&id| atoms.get(id).is_some_and(|a| a.serial < serial));
            list.insert(pos, neighbor_id);
        }
    }

    /// Bonded neighbours of an atom in ascending serial order.
    pub fn neighbors(&self, atom_id: AtomId) -> &[AtomId] {
        self.bond_adjacency
            .get(atom_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn are_bonded(&self, atom1_id: AtomId, atom2_id: AtomId) -> bool {
        self.neighbors(atom1_id).contains(&atom2_id)
    }

    pub fn residue_atoms(&self, residue_number: isize) -> &[AtomId] {
        self.residue_index
            .get(&residue_number)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Shortest bond-path length from `start` to every atom within `max_depth` bonds.
    ///
    /// The start atom itself is included at depth 0.
    pub fn bond_distances(&self, start: AtomId, max_depth: usize) -> HashMap<AtomId, usize> {
        let mut depths = HashMap::new();
        if !self.atoms.contains_key(start) {
            return depths;
        }
        depths.insert(start, 0);
        let mut queue = VecDeque::from([start]);
        while let Some(current) = queue.pop_front() {
            let depth = depths[&current];
            if depth == max_depth {
                continue;
            }
            for &next in self.neighbors(current) {
                if !depths.contains_key(&next) {
                    depths.insert(next, depth + 1);
                    queue.push_back(next);
                }
            }
        }
        depths
    }
}

/// Incremental constructor for [`Structure`], keyed by atom serials.
///
/// Bonds may be declared before or after their atoms; everything is resolved
/// in [`StructureBuilder::build`].
#[derive(Default)]
pub struct StructureBuilder {
    atoms: Vec<Atom>,
    bonds: Vec<(usize, usize, BondOrder)>,
}

impl StructureBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_atom(&mut self, atom: Atom) -> &mut Self {
        self.atoms.push(atom);
        self
    }

    pub fn add_bond(&mut self, serial1: usize, serial2: usize, order: BondOrder) -> &mut Self {
        self.bonds.push((serial1, serial2, order));
        self
    }

    pub fn build(self) -> Result<Structure, StructureError> {
        let mut structure = Structure::new();
        for atom in self.atoms {
            let serial = atom.serial;
            structure
                .add_atom(atom)
                .ok_or(StructureError::DuplicateSerial(serial))?;
        }
        for (serial1, serial2, order) in self.bonds {
            if serial1 == serial2 {
                return Err(StructureError::SelfBond(serial1));
            }
            let id1 = structure
                .find_atom_by_serial(serial1)
                .ok_or(StructureError::UnknownBondAtom(serial1))?;
            let id2 = structure
                .find_atom_by_serial(serial2)
                .ok_or(StructureError::UnknownBondAtom(serial2))?;
            structure.add_bond(id1, id2, order);
        }
        Ok(structure)
    }
}
