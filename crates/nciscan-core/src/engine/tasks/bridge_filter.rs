use crate::engine::context::DetectionContext;
use crate::engine::error::EngineError;
use crate::engine::table::InteractionTable;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{info, instrument};

/// Drops bridged records whose two solvent atoms are `max_path` or more bonds apart.
///
/// A limit of 1 only admits bridges through a single solvent atom; a limit of 2
/// also admits the atoms bonded to it, and so on.
#[instrument(skip_all, name = "bridge_filter_task", fields(max_path = max_path))]
pub fn run(ctx: &DetectionContext, table: &mut InteractionTable, max_path: usize) -> Result<(), EngineError> {
    if table.is_empty() {
        return Ok(());
    }
    let depth = max_path.saturating_sub(1);
    let before = table.len();

    let first_legs: BTreeSet<usize> = table
        .iter()
        .filter(|r| r.is_bridged())
        .map(|r| r.atom2)
        .collect();
    let mut reach: HashMap<usize, HashSet<usize>> = HashMap::with_capacity(first_legs.len());
    for serial in first_legs {
        let id = ctx.atom_id(serial)?;
        let near = ctx
            .structure
            .bond_distances(id, depth)
            .into_keys()
            .filter_map(|other| ctx.structure.atom(other).map(|a| a.serial))
            .collect();
        reach.insert(serial, near);
    }

    table.retain(|r| match r.atom3() {
        Some(solvent) => reach.get(&r.atom2).is_some_and(|near| near.contains(&solvent)),
        None => true,
    });
    info!(before, after = table.len(), "Applied bridge path limit.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::interaction::Measurements;
    use crate::engine::config::RunMode;
    use crate::engine::detectors::testing::*;
    use crate::engine::table::Role;

    /// Ligand atom 1; a three-atom solvent molecule 10-11-12; protein atom 20.
    fn bridged_table(solvent_leg: usize) -> (Fixture, InteractionTable) {
        let fixture = Fixture::new(build(
            vec![
                atom(1, "O.3", 1, "L", [0.0, 0.0, 0.0]),
                atom(10, "O.3", 2, "S", [0.0, 0.0, 2.8]),
                atom(11, "C.3", 2, "S", [0.0, 0.0, 4.2]),
                atom(12, "O.3", 2, "S", [0.0, 0.0, 5.6]),
                atom(20, "O.2", 3, "Pro", [0.0, 0.0, 8.4]),
            ],
            &[(10, 11), (11, 12)],
        ));
        let mut table = InteractionTable::new();
        {
            let s = &fixture.structure;
            let role = |serial| {
                let id = s.find_atom_by_serial(serial).unwrap();
                Role::of(s.atom(id).unwrap()).unwrap()
            };
            let items = Measurements::from_values(&[2.8]);
            table.insert(s, RunMode::Ligand, "HB_OH_O", items, role(1), role(10));
            table.insert(s, RunMode::Ligand, "vdW", items, role(1), role(12));
            table.insert(s, RunMode::Ligand, "HB_OH_O", items, role(solvent_leg), role(20));
        }
        (fixture, table)
    }

    #[test]
    fn limit_one_requires_the_same_solvent_atom() {
        let (fixture, mut table) = bridged_table(10);
        assert_eq!(table.iter().filter(|r| r.is_bridged()).count(), 2);
        run(&fixture.ctx(), &mut table, 1).unwrap();
        let kept: Vec<_> = table.iter().map(|r| (r.atom2, r.atom3())).collect();
        assert_eq!(kept, vec![(10, Some(10))]);
    }

    #[test]
    fn longer_limits_admit_bonded_solvent_atoms() {
        let (fixture, mut table) = bridged_table(12);
        let mut two = table.clone();
        run(&fixture.ctx(), &mut two, 2).unwrap();
        assert!(two.iter().all(|r| r.atom2 == 12));

        run(&fixture.ctx(), &mut table, 3).unwrap();
        assert_eq!(table.len(), 2);
    }
}
