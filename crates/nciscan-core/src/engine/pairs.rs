use super::context::DetectionContext;
use crate::core::models::atom::MoleculeClass;
use crate::core::models::ids::AtomId;
use crate::core::models::structure::Structure;
use kiddo::{KdTree, SquaredEuclidean};
use tracing::debug;

/// Spatial index over every classified atom of a structure.
pub struct CandidateIndex {
    tree: KdTree<f64, 3>,
    ids: Vec<AtomId>,
}

impl CandidateIndex {
    pub fn build(structure: &Structure) -> Self {
        let mut classified: Vec<_> = structure
            .atoms_iter()
            .filter(|(_, atom)| atom.molecule_class.is_some())
            .map(|(id, atom)| (atom.serial, id, [atom.position.x, atom.position.y, atom.position.z]))
            .collect();
        classified.sort_unstable_by_key(|&(serial, _, _)| serial);

        let positions: Vec<[f64; 3]> = classified.iter().map(|&(_, _, p)| p).collect();
        let tree: KdTree<f64, 3> = (&positions).into();
        let ids = classified.into_iter().map(|(_, id, _)| id).collect();
        Self { tree, ids }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Partners of `primary` strictly closer than `cutoff` that are neither bonded
    /// to it nor in its residue, and whose class passes `accept`. Sorted by serial.
    pub fn partners(
        &self,
        structure: &Structure,
        primary: AtomId,
        cutoff: f64,
        accept: impl Fn(&MoleculeClass) -> bool,
    ) -> Vec<AtomId> {
        let Some(atom) = structure.atom(primary) else {
            return Vec::new();
        };
        if self.ids.is_empty() {
            return Vec::new();
        }
        let query = [atom.position.x, atom.position.y, atom.position.z];
        let mut found: Vec<(usize, AtomId)> = self
            .tree
            .within_unsorted::<SquaredEuclidean>(&query, cutoff * cutoff)
            .into_iter()
            .filter_map(|neighbour| self.ids.get(neighbour.item as usize).copied())
            .filter(|&id| id != primary)
            .filter_map(|id| structure.atom(id).map(|partner| (id, partner)))
            .filter(|(_, partner)| (partner.position - atom.position).norm() < cutoff)
            .filter(|(_, partner)| partner.residue_number != atom.residue_number)
            .filter(|(_, partner)| partner.molecule_class.as_ref().is_some_and(&accept))
            .filter(|&(id, _)| !structure.are_bonded(primary, id))
            .map(|(id, partner)| (partner.serial, id))
            .collect();
        found.sort_unstable_by_key(|&(serial, _)| serial);
        found.into_iter().map(|(_, id)| id).collect()
    }
}

/// Ordered (primary, partner) pairs of the first pass, primaries in serial order.
pub fn first_pass_pairs(ctx: &DetectionContext, index: &CandidateIndex) -> Vec<(AtomId, AtomId)> {
    let mode = ctx.config.mode;
    let mut primaries: Vec<_> = ctx
        .structure
        .atoms_iter()
        .filter_map(|(id, atom)| {
            let class = atom.molecule_class.as_ref()?;
            mode.is_primary(class).then_some((atom.serial, id, class))
        })
        .collect();
    primaries.sort_unstable_by_key(|&(serial, _, _)| serial);

    let pairs: Vec<_> = primaries
        .into_iter()
        .flat_map(|(_, id, class)| {
            index
                .partners(ctx.structure, id, mode.cutoff(), |partner| {
                    mode.accepts_partner(class, partner)
                })
                .into_iter()
                .map(move |partner| (id, partner))
        })
        .collect();
    debug!(pairs = pairs.len(), mode = %mode, "Collected first-pass candidate pairs.");
    pairs
}

/// Pairs of the mediation pass, seeded from solvent atoms found in the first pass.
pub fn mediated_pairs(
    ctx: &DetectionContext,
    index: &CandidateIndex,
    seeds: &[AtomId],
) -> Vec<(AtomId, AtomId)> {
    let mode = ctx.config.mode;
    let pairs: Vec<_> = seeds
        .iter()
        .flat_map(|&seed| {
            index
                .partners(ctx.structure, seed, mode.cutoff(), |partner| {
                    mode.accepts_mediated_partner(partner)
                })
                .into_iter()
                .map(move |partner| (seed, partner))
        })
        .collect();
    debug!(seeds = seeds.len(), pairs = pairs.len(), "Collected mediated candidate pairs.");
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Atom;
    use crate::core::models::structure::StructureBuilder;
    use crate::core::models::topology::BondOrder;
    use nalgebra::Point3;

    fn atom(serial: usize, class: &str, residue: isize, x: f64) -> Atom {
        let mut a = Atom::new(serial, "X", "C.3", Point3::new(x, 0.0, 0.0));
        a.residue_number = residue;
        a.molecule_class = class.parse().ok();
        a
    }

    #[test]
    fn partners_apply_cutoff_bond_residue_and_class_rules() {
        let mut builder = StructureBuilder::new();
        builder
            .add_atom(atom(1, "L", 1, 0.0))
            .add_atom(atom(2, "L", 1, 1.5))
            .add_atom(atom(3, "Pro", 2, 1.4))
            .add_atom(atom(4, "Pro", 3, 7.99))
            .add_atom(atom(5, "Pro", 4, 8.0))
            .add_atom(atom(6, "S", 5, 3.0))
            .add_atom(atom(7, "Pep", 6, 2.0))
            .add_atom(atom(8, "", 7, 2.5))
            .add_bond(1, 3, BondOrder::Single);
        let structure = builder.build().unwrap();
        let index = CandidateIndex::build(&structure);
        assert_eq!(index.len(), 7);

        let lig = structure.find_atom_by_serial(1).unwrap();
        let partners: Vec<_> = index
            .partners(&structure, lig, 8.0, |c| {
                matches!(c, MoleculeClass::Protein) || c.is_solvent()
            })
            .into_iter()
            .map(|id| structure.atom(id).unwrap().serial)
            .collect();
        assert_eq!(partners, vec![4, 6]);
    }

    #[test]
    fn empty_index_has_no_partners() {
        let mut builder = StructureBuilder::new();
        builder.add_atom(atom(1, "", 1, 0.0));
        let structure = builder.build().unwrap();
        let index = CandidateIndex::build(&structure);
        assert!(index.is_empty());
        let id = structure.find_atom_by_serial(1).unwrap();
        assert!(index.partners(&structure, id, 8.0, |_| true).is_empty());
    }
}
