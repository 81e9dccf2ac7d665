use crate::core::models::ids::AtomId;
use crate::engine::context::DetectionContext;
use crate::engine::detectors::{AtomPair, Detector, Finding, catalogue};
use crate::engine::error::EngineError;
use crate::engine::pairs::{CandidateIndex, first_pass_pairs, mediated_pairs};
use crate::engine::progress::Progress;
use crate::engine::table::{InteractionTable, Role};
use std::collections::BTreeSet;
use tracing::{debug, info, instrument};

#[instrument(skip_all, name = "detection_task")]
pub fn run(ctx: &DetectionContext) -> Result<InteractionTable, EngineError> {
    let detectors = catalogue(ctx.config.xh_pi);
    let index = CandidateIndex::build(ctx.structure);
    let mut table = InteractionTable::new();

    let pairs = first_pass_pairs(ctx, &index);
    info!(
        mode = %ctx.config.mode,
        classified = index.len(),
        pairs = pairs.len(),
        "Evaluating first-pass pairs."
    );
    evaluate_pairs(ctx, &detectors, &pairs, &mut table)?;
    debug!(records = table.len(), "First pass complete.");

    if ctx.config.mediate {
        let seeds = mediation_seeds(ctx, &table)?;
        let pairs = mediated_pairs(ctx, &index, &seeds);
        info!(seeds = seeds.len(), pairs = pairs.len(), "Evaluating solvent-mediated pairs.");
        evaluate_pairs(ctx, &detectors, &pairs, &mut table)?;
    }

    table.retain_paired_dipoles();
    info!(records = table.len(), "Detection complete.");
    Ok(table)
}

/// Runs every detector on both role orders of each pair.
fn evaluate_pairs(
    ctx: &DetectionContext,
    detectors: &[Detector],
    pairs: &[(AtomId, AtomId)],
    table: &mut InteractionTable,
) -> Result<(), EngineError> {
    if pairs.is_empty() {
        return Ok(());
    }
    ctx.reporter.report(Progress::TaskStart {
        total_steps: pairs.len() as u64,
    });
    for &(primary, partner) in pairs {
        let forward = AtomPair::new(ctx, primary, partner)?;
        for pair in [forward, forward.reversed()] {
            for detector in detectors {
                if let Some(finding) = (detector.run)(ctx, &pair)? {
                    record_finding(ctx, table, &pair, finding)?;
                }
            }
        }
        ctx.reporter.report(Progress::TaskIncrement);
    }
    ctx.reporter.report(Progress::TaskFinish);
    Ok(())
}

fn record_finding(
    ctx: &DetectionContext,
    table: &mut InteractionTable,
    pair: &AtomPair,
    finding: Finding,
) -> Result<(), EngineError> {
    let (Some(class1), Some(class2)) = (pair.a1.molecule_class.as_ref(), pair.a2.molecule_class.as_ref()) else {
        return Ok(());
    };
    let mode = ctx.config.mode;
    match finding {
        Finding::Contact(hit) => {
            table.insert(
                ctx.structure,
                mode,
                &hit.label,
                hit.items,
                Role::with_class(pair.a1, class1),
                Role::with_class(pair.a2, class2),
            );
        }
        Finding::Dipole { label, legs } => {
            let mut roles = Vec::with_capacity(legs.len());
            for leg in &legs {
                let (first, second) = (ctx.atom(leg.first)?, ctx.atom(leg.second)?);
                if table.has_family(&label, first.serial, second.serial) {
                    return Ok(());
                }
                roles.push((Role::with_class(first, class1), Role::with_class(second, class2), leg.items));
            }
            for (first, second, items) in roles {
                table.insert(ctx.structure, mode, &label, items, first, second);
            }
        }
    }
    Ok(())
}

/// Solvent atoms reached in the first pass, in ascending serial order.
fn mediation_seeds(ctx: &DetectionContext, table: &InteractionTable) -> Result<Vec<AtomId>, EngineError> {
    let mode = ctx.config.mode;
    let serials: BTreeSet<usize> = table
        .iter()
        .filter(|r| mode.is_mediation_seed(&r.pair_type, r.is_bridged()))
        .map(|r| r.atom2)
        .collect();
    serials.into_iter().map(|serial| ctx.atom_id(serial)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::detectors::testing::*;

    /// N-H donor of a ligand facing a protein carbonyl oxygen 2.9 A away.
    fn ligand_hbond(oxygen_z: f64) -> Fixture {
        Fixture::new(build(
            vec![
                atom(1, "N.3", 1, "L", [0.0, 0.0, 0.0]),
                atom(2, "H", 1, "L", [0.0, 0.0, 1.0]),
                atom(3, "O.2", 2, "Pro", [0.0, 0.0, oxygen_z]),
                atom(4, "C.2", 2, "Pro", [0.0, 1.2, oxygen_z + 0.7]),
            ],
            &[(1, 2), (3, 4)],
        ))
    }

    #[test]
    fn hydrogen_bond_is_found_for_a_close_acceptor() {
        let fixture = ligand_hbond(2.9);
        let table = run(&fixture.ctx()).unwrap();
        let hbond = table
            .iter()
            .find(|r| r.label.starts_with("HB_"))
            .expect("hydrogen bond record");
        assert_eq!((hbond.atom1, hbond.atom2), (1, 3));
        assert_eq!(hbond.pair_type, "L-Pro");
        assert!((hbond.items.primary().unwrap() - 2.9).abs() < 1e-9);
    }

    #[test]
    fn distant_acceptor_yields_nothing() {
        let fixture = ligand_hbond(10.0);
        let table = run(&fixture.ctx()).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn both_role_orders_are_evaluated() {
        // The protein carries the donor; the ligand only accepts.
        let fixture = Fixture::new(build(
            vec![
                atom(1, "O.2", 1, "L", [0.0, 0.0, 2.9]),
                atom(2, "C.2", 1, "L", [0.0, 1.2, 3.6]),
                atom(3, "N.am", 2, "Pro", [0.0, 0.0, 0.0]),
                atom(4, "H", 2, "Pro", [0.0, 0.0, 1.0]),
            ],
            &[(1, 2), (3, 4)],
        ));
        let table = run(&fixture.ctx()).unwrap();
        let hbond = table.iter().find(|r| r.label.starts_with("HB_")).expect("hydrogen bond record");
        assert_eq!((hbond.atom1, hbond.atom2), (1, 3));
    }

    #[test]
    fn water_bridge_between_ligand_and_protein() {
        // Ligand O-H donates to a water oxygen, whose hydrogen donates to a protein oxygen.
        let fixture = Fixture::new(build(
            vec![
                atom(1, "O.3", 1, "L", [0.0, 0.0, 0.0]),
                atom(2, "H", 1, "L", [0.0, 0.0, 1.0]),
                atom(3, "C.3", 1, "L", [0.0, -1.4, -0.5]),
                atom(10, "O.3", 2, "S", [0.0, 0.0, 2.8]),
                atom(11, "H", 2, "S", [0.0, 0.0, 3.8]),
                atom(12, "H", 2, "S", [0.9, 0.0, 2.5]),
                atom(20, "O.2", 3, "Pro", [0.0, 0.0, 5.6]),
                atom(21, "C.2", 3, "Pro", [0.0, 1.2, 6.3]),
            ],
            &[(1, 2), (1, 3), (10, 11), (10, 12), (20, 21)],
        ));
        let table = run(&fixture.ctx()).unwrap();
        let bridged: Vec<_> = table.iter().filter(|r| r.is_bridged()).collect();
        assert!(!bridged.is_empty());
        assert!(bridged.iter().all(|r| r.atom2 == 10 && r.atom4() == Some(20)));
        assert!(bridged.iter().all(|r| r.pair_type == "L-S-Pro"));
        // Lig mode keeps no standalone water-protein record.
        assert!(table.iter().all(|r| !r.connects(10, 20) && r.pair_type != "Pro-S"));
    }

    #[test]
    fn mediation_can_be_switched_off() {
        let mut fixture = Fixture::new(build(
            vec![
                atom(1, "O.3", 1, "L", [0.0, 0.0, 0.0]),
                atom(2, "H", 1, "L", [0.0, 0.0, 1.0]),
                atom(3, "C.3", 1, "L", [0.0, -1.4, -0.5]),
                atom(10, "O.3", 2, "S", [0.0, 0.0, 2.8]),
                atom(11, "H", 2, "S", [0.0, 0.0, 3.8]),
                atom(12, "H", 2, "S", [0.9, 0.0, 2.5]),
                atom(20, "O.2", 3, "Pro", [0.0, 0.0, 5.6]),
                atom(21, "C.2", 3, "Pro", [0.0, 1.2, 6.3]),
            ],
            &[(1, 2), (1, 3), (10, 11), (10, 12), (20, 21)],
        ));
        fixture.config.mediate = false;
        let table = run(&fixture.ctx()).unwrap();
        assert!(!table.is_empty());
        assert!(table.iter().all(|r| !r.is_bridged()));
    }
}
