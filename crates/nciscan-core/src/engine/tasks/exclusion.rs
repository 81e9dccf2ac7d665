use crate::engine::context::DetectionContext;
use crate::engine::error::EngineError;
use crate::engine::table::InteractionTable;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{info, instrument};

/// Longest bond path, in bonds, over which two anchors count as topologically related.
const MAX_RELATED_DEPTH: usize = 3;

/// Drops records whose anchors are within three bonds of each other, then
/// drops dipole records that lost their twin.
#[instrument(skip_all, name = "exclusion_task")]
pub fn run(ctx: &DetectionContext, table: &mut InteractionTable) -> Result<(), EngineError> {
    if table.is_empty() {
        return Ok(());
    }
    let before = table.len();

    let anchors: BTreeSet<usize> = table.iter().map(|r| r.atom1).collect();
    let mut related: HashMap<usize, HashSet<usize>> = HashMap::with_capacity(anchors.len());
    for serial in anchors {
        let id = ctx.atom_id(serial)?;
        let near = ctx
            .structure
            .bond_distances(id, MAX_RELATED_DEPTH)
            .into_iter()
            .filter(|&(_, depth)| depth > 0)
            .filter_map(|(other, _)| ctx.structure.atom(other).map(|a| a.serial))
            .collect();
        related.insert(serial, near);
    }

    table.retain(|r| !related.get(&r.atom1).is_some_and(|near| near.contains(&r.atom2)));
    table.retain_paired_dipoles();
    info!(before, after = table.len(), "Removed 1-3/1-4 related records.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::interaction::Measurements;
    use crate::engine::config::RunMode;
    use crate::engine::detectors::testing::*;
    use crate::engine::table::Role;

    /// A ligand chain 1-2-3-4-5 and a protein atom 9; residues are ignored here.
    fn chain() -> Fixture {
        Fixture::new(build(
            vec![
                atom(1, "C.3", 1, "L", [0.0, 0.0, 0.0]),
                atom(2, "C.3", 1, "L", [1.5, 0.0, 0.0]),
                atom(3, "C.3", 1, "L", [3.0, 0.0, 0.0]),
                atom(4, "C.3", 1, "L", [4.5, 0.0, 0.0]),
                atom(5, "C.3", 1, "L", [6.0, 0.0, 0.0]),
                atom(9, "C.3", 2, "Pro", [0.0, 3.0, 0.0]),
            ],
            &[(1, 2), (2, 3), (3, 4), (4, 5)],
        ))
    }

    fn add(fixture: &Fixture, table: &mut InteractionTable, label: &str, a: usize, b: usize) {
        let s = &fixture.structure;
        let role = |serial| {
            let id = s.find_atom_by_serial(serial).unwrap();
            Role::of(s.atom(id).unwrap()).unwrap()
        };
        table.insert(s, RunMode::Medium, label, Measurements::from_values(&[3.0]), role(a), role(b));
    }

    #[test]
    fn records_within_three_bonds_are_removed() {
        let fixture = chain();
        let mut table = InteractionTable::new();
        add(&fixture, &mut table, "vdW", 1, 3);
        add(&fixture, &mut table, "vdW", 1, 4);
        add(&fixture, &mut table, "vdW", 1, 5);
        add(&fixture, &mut table, "vdW", 1, 9);

        run(&fixture.ctx(), &mut table).unwrap();
        let kept: Vec<_> = table.iter().map(|r| r.pair_key()).collect();
        assert_eq!(kept, vec![(1, 5), (1, 9)]);
    }

    #[test]
    fn dipole_twin_removal_takes_both_legs() {
        let fixture = chain();
        let mut table = InteractionTable::new();
        add(&fixture, &mut table, "Dipo_1_9", 1, 9);
        add(&fixture, &mut table, "Dipo_1_9", 2, 4);
        add(&fixture, &mut table, "Dipo_5_9", 5, 9);
        add(&fixture, &mut table, "Dipo_5_9", 5, 1);

        run(&fixture.ctx(), &mut table).unwrap();
        assert_eq!(table.len(), 2);
        assert!(table.iter().all(|r| r.label == "Dipo_5_9"));
    }

    #[test]
    fn empty_table_is_untouched() {
        let fixture = chain();
        let mut table = InteractionTable::new();
        run(&fixture.ctx(), &mut table).unwrap();
        assert!(table.is_empty());
    }
}
