use super::hbond::{acceptor_angles, hydroxyl_angles, is_hydroxyl_acceptor};
use super::{AtomPair, Finding, contact};
use crate::core::utils::identifiers::{ACCEPTOR_TYPES, NITROGEN_DONOR_TYPES, OXYGEN_DONOR_TYPES};
use crate::engine::context::DetectionContext;
use crate::engine::error::EngineError;

fn is_donor(atom_type: &str) -> bool {
    NITROGEN_DONOR_TYPES.contains(atom_type) || OXYGEN_DONOR_TYPES.contains(atom_type)
}

fn in_window(ctx: &DetectionContext, pair: &AtomPair, min: f64, buffer: f64) -> Result<bool, EngineError> {
    Ok(pair.distance >= min && pair.distance <= buffer + ctx.vdw_sum(pair.a1, pair.a2)?)
}

/// Charge-assisted X-H···N/O contact: the hydrogen bond geometry at a distance
/// window that starts where hydrogen bonds usually stop.
pub(super) fn acceptor(ctx: &DetectionContext, pair: &AtomPair) -> Result<Option<Finding>, EngineError> {
    if !is_donor(pair.type1()) || !ACCEPTOR_TYPES.contains(pair.type2()) {
        return Ok(None);
    }
    let params = &ctx.thresholds.electrostatic;
    if !in_window(ctx, pair, params.min_distance, params.buffer)? {
        return Ok(None);
    }
    Ok(acceptor_angles(ctx, pair, &params.rule).and_then(|(angle, angle2)| {
        contact(
            format!("Elec_{}H_{}", pair.el1(), pair.el2()),
            &[pair.distance, angle, angle2],
        )
    }))
}

pub(super) fn hydroxyl(ctx: &DetectionContext, pair: &AtomPair) -> Result<Option<Finding>, EngineError> {
    if !is_donor(pair.type1()) || !is_hydroxyl_acceptor(pair.type2()) {
        return Ok(None);
    }
    let params = &ctx.thresholds.electrostatic_hydroxyl;
    if !in_window(ctx, pair, params.min_distance, params.buffer)? {
        return Ok(None);
    }
    Ok(hydroxyl_angles(ctx, pair, &params.rule).and_then(|(a1, a2, a3)| {
        contact(format!("Elec_{}H_O", pair.el1()), &[pair.distance, a1, a2, a3])
    }))
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;

    fn donor_acceptor(acceptor_z: f64) -> Fixture {
        let structure = build(
            vec![
                atom(1, "N.4", 1, "L", [0.0, 0.0, 0.0]),
                atom(2, "H", 1, "L", [1.0, 0.0, 0.0]),
                atom(3, "O.co2", 2, "Pro", [0.0, 0.0, acceptor_z]),
                atom(4, "C.2", 2, "Pro", [-0.9, 0.0, acceptor_z + 0.85]),
            ],
            &[(1, 2), (3, 4)],
        );
        Fixture::with_overrides(structure, &[("Elec_(NH,OH)_(N,O)", "2.5 1.0 60 90 90 180")])
    }

    #[test]
    fn quaternary_donor_uses_its_own_angle_limit() {
        // N.4 limit is 90 degrees, so the perpendicular hydrogen passes.
        let fixture = donor_acceptor(3.2);
        let ctx = fixture.ctx();
        let finding = acceptor(&ctx, &fixture.pair(1, 3)).unwrap();
        assert!(matches!(finding, Some(Finding::Contact(ref hit)) if hit.label == "Elec_NH_O"));
    }

    #[test]
    fn distance_window_rejects_both_ends() {
        // vdW(N, O) = 3.07, so the upper bound is 4.07.
        let close = donor_acceptor(2.4);
        assert!(acceptor(&close.ctx(), &close.pair(1, 3)).unwrap().is_none());

        let far = donor_acceptor(4.2);
        assert!(acceptor(&far.ctx(), &far.pair(1, 3)).unwrap().is_none());
    }
}
