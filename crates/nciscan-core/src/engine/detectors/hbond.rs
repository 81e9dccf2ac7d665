use super::{AtomPair, Finding, contact, product};
use crate::core::params::thresholds::{AcceptorAngleRule, DonorAngleLimit, HydroxylAngleRule};
use crate::core::utils::geometry::angle_at;
use crate::core::utils::identifiers::{
    ACCEPTOR_TYPES, NITROGEN_DONOR_TYPES, OXYGEN_DONOR_TYPES, SUBSTITUENT_TYPES,
};
use crate::engine::context::{DetectionContext, hydrogens};
use crate::engine::error::EngineError;

pub(super) fn is_hydroxyl_acceptor(atom_type: &str) -> bool {
    atom_type.starts_with("O.")
}

/// Donor angle `a2-a1-H` and acceptor angle `H-a2-X` of the first donor
/// hydrogen and acceptor substituent that satisfy `rule`.
pub(super) fn acceptor_angles(
    ctx: &DetectionContext,
    pair: &AtomPair,
    rule: &AcceptorAngleRule,
) -> Option<(f64, f64)> {
    let donor_max = rule.donor_angle_max_for(pair.type1());
    let acceptor_subs: Vec<_> = ctx
        .substituents(pair.id2)
        .into_iter()
        .filter(|s| SUBSTITUENT_TYPES.contains(s.atom.atom_type.as_str()))
        .collect();

    for h in hydrogens(&ctx.substituents(pair.id1)) {
        let Some(angle) = angle_at(pair.p2(), pair.p1(), h.position()) else {
            continue;
        };
        if angle > donor_max {
            continue;
        }
        for x in &acceptor_subs {
            let Some(angle2) = angle_at(h.position(), pair.p2(), x.position()) else {
                continue;
            };
            if (rule.acceptor_angle_min..=rule.acceptor_angle_max).contains(&angle2) {
                return Some((angle, angle2));
            }
        }
    }
    None
}

/// Angles for a hydrogen bond onto a two-coordinate oxygen: the donor angle,
/// then the angles from the donor hydrogen to the acceptor's own hydrogen and
/// to its other substituent.
pub(super) fn hydroxyl_angles(
    ctx: &DetectionContext,
    pair: &AtomPair,
    rule: &HydroxylAngleRule,
) -> Option<(f64, f64, f64)> {
    let acceptor_subs = ctx.substituents(pair.id2);
    if acceptor_subs.len() != 2 {
        return None;
    }
    let donor_max = rule.donor_angle_max_for(pair.type1());

    for h in hydrogens(&ctx.substituents(pair.id1)) {
        let Some(angle1) = angle_at(pair.p2(), pair.p1(), h.position()) else {
            continue;
        };
        if angle1 > donor_max {
            continue;
        }
        for (x, own_h) in product(&acceptor_subs, &acceptor_subs) {
            if own_h.atom.atom_type != "H" || !SUBSTITUENT_TYPES.contains(x.atom.atom_type.as_str()) {
                continue;
            }
            let (Some(angle2), Some(angle3)) = (
                angle_at(h.position(), pair.p2(), own_h.position()),
                angle_at(h.position(), pair.p2(), x.position()),
            ) else {
                continue;
            };
            if angle2 >= rule.hydrogen_angle_min && angle3 >= rule.substituent_angle_min {
                return Some((angle1, angle2, angle3));
            }
        }
    }
    None
}

/// N-H···N/O hydrogen bond.
pub(super) fn nh_acceptor(ctx: &DetectionContext, pair: &AtomPair) -> Result<Option<Finding>, EngineError> {
    if !NITROGEN_DONOR_TYPES.contains(pair.type1()) || !ACCEPTOR_TYPES.contains(pair.type2()) {
        return Ok(None);
    }
    let params = &ctx.thresholds.hbond_nh;
    if pair.distance > params.max_distance {
        return Ok(None);
    }
    Ok(acceptor_angles(ctx, pair, &params.rule).and_then(|(angle, angle2)| {
        contact(format!("HB_NH_{}", pair.el2()), &[pair.distance, angle, angle2])
    }))
}

/// N-H···O hydrogen bond onto a hydroxyl or water oxygen.
pub(super) fn nh_hydroxyl(ctx: &DetectionContext, pair: &AtomPair) -> Result<Option<Finding>, EngineError> {
    if !NITROGEN_DONOR_TYPES.contains(pair.type1()) || !is_hydroxyl_acceptor(pair.type2()) {
        return Ok(None);
    }
    let params = &ctx.thresholds.hbond_nh_hydroxyl;
    if pair.distance > params.max_distance {
        return Ok(None);
    }
    Ok(hydroxyl_angles(ctx, pair, &params.rule)
        .and_then(|(a1, a2, a3)| contact("HB_NH_O", &[pair.distance, a1, a2, a3])))
}

/// O-H···N/O hydrogen bond.
pub(super) fn oh_acceptor(ctx: &DetectionContext, pair: &AtomPair) -> Result<Option<Finding>, EngineError> {
    if !OXYGEN_DONOR_TYPES.contains(pair.type1()) || !ACCEPTOR_TYPES.contains(pair.type2()) {
        return Ok(None);
    }
    let params = &ctx.thresholds.hbond_oh;
    if pair.distance > params.max_distance {
        return Ok(None);
    }
    Ok(acceptor_angles(ctx, pair, &params.rule).and_then(|(angle, angle2)| {
        contact(format!("HB_OH_{}", pair.el2()), &[pair.distance, angle, angle2])
    }))
}

pub(super) fn oh_hydroxyl(ctx: &DetectionContext, pair: &AtomPair) -> Result<Option<Finding>, EngineError> {
    if !OXYGEN_DONOR_TYPES.contains(pair.type1()) || !is_hydroxyl_acceptor(pair.type2()) {
        return Ok(None);
    }
    let params = &ctx.thresholds.hbond_oh_hydroxyl;
    if pair.distance > params.max_distance {
        return Ok(None);
    }
    Ok(hydroxyl_angles(ctx, pair, &params.rule)
        .and_then(|(a1, a2, a3)| contact("HB_OH_O", &[pair.distance, a1, a2, a3])))
}
