use super::{AtomPair, DipoleLeg, Finding, contact, dist, product, within_vdw};
use crate::core::models::interaction::Measurements;
use crate::core::params::thresholds::DipoleHydrogenMode;
use crate::core::utils::geometry::{angle_at, angle_between, midpoint, project_onto_plane, vector_between};
use crate::core::utils::identifiers::{
    DIPOLE_NEGATIVE_TYPES, DIPOLE_POSITIVE_TYPES, MULTIPOLE_ACCEPTOR_TYPES, MULTIPOLE_DONOR_TYPES,
};
use crate::engine::context::{DetectionContext, Substituent, heavy};
use crate::engine::error::EngineError;
use nalgebra::{Point3, Vector3};

/// Opposite (or zero) sign and a large enough charge separation.
fn polarised(q_anchor: f64, q_partner: f64, min_difference: f64) -> bool {
    q_anchor * q_partner <= 0.0 && (q_anchor - q_partner).abs() >= min_difference
}

/// Bond vector oriented from the positive end to the negative end.
fn dipole_vector(anchor: &Point3<f64>, q_anchor: f64, partner: &Point3<f64>) -> Vector3<f64> {
    if q_anchor > 0.0 {
        vector_between(anchor, partner)
    } else {
        vector_between(partner, anchor)
    }
}

fn bonded(subs: Vec<Substituent<'_>>, mode: DipoleHydrogenMode) -> Vec<Substituent<'_>> {
    match mode {
        DipoleHydrogenMode::Except => heavy(&subs),
        DipoleHydrogenMode::Add | DipoleHydrogenMode::Keep => subs,
    }
}

/// Dipole-dipole interaction between two polarised bonds.
///
/// A hit produces two records: one between the anchors and one between their
/// bonded partners, sharing the label `Dipo_{serial1}_{serial2}`.
pub(super) fn dipole(ctx: &DetectionContext, pair: &AtomPair) -> Result<Option<Finding>, EngineError> {
    let params = &ctx.thresholds.dipole;
    let with_hydrogen = params.hydrogen_mode == DipoleHydrogenMode::Add;
    let type_ok = |set: &phf::Set<&'static str>, t: &str| set.contains(t) || (with_hydrogen && t == "H");
    if !type_ok(&DIPOLE_NEGATIVE_TYPES, pair.type1()) || !type_ok(&DIPOLE_POSITIVE_TYPES, pair.type2()) {
        return Ok(None);
    }
    let vdw = ctx.vdw_sum(pair.a1, pair.a2)?;
    let limit = params.buffer + vdw;
    if pair.distance > limit {
        return Ok(None);
    }

    let subs1 = bonded(ctx.substituents(pair.id1), params.hydrogen_mode);
    let subs2 = bonded(ctx.substituents(pair.id2), params.hydrogen_mode);
    if subs1.is_empty() || subs2.is_empty() {
        return Ok(None);
    }

    let (q1, q2) = (pair.a1.partial_charge, pair.a2.partial_charge);
    for a3 in &subs1 {
        let q3 = a3.atom.partial_charge;
        if !polarised(q1, q3, params.charge_difference_min) {
            continue;
        }
        let c1 = midpoint(pair.p1(), a3.position());
        let v1 = dipole_vector(pair.p1(), q1, a3.position());

        for a4 in &subs2 {
            let q4 = a4.atom.partial_charge;
            if a4.id == a3.id || !polarised(q2, q4, params.charge_difference_min) {
                continue;
            }
            let d2 = dist(&c1, &midpoint(pair.p2(), a4.position()));
            if d2 > limit {
                continue;
            }
            let v2 = dipole_vector(pair.p2(), q2, a4.position());
            let (Some(angle1), Some(angle2), Some(angle3)) = (
                angle_between(&v1, &v2),
                angle_at(pair.p1(), a4.position(), pair.p2()),
                angle_at(a4.position(), pair.p2(), a3.position()),
            ) else {
                continue;
            };
            if angle1 >= params.vector_angle_min && angle2 <= params.first_angle_max && angle3 <= params.second_angle_max {
                let leg = |first, second, q_first, q_second| DipoleLeg {
                    first,
                    second,
                    items: Measurements::from_values(&[pair.distance, d2, angle1, angle2, angle3, q_first, q_second]),
                };
                return Ok(Some(Finding::Dipole {
                    label: format!("Dipo_{}_{}", pair.a1.serial, pair.a2.serial),
                    legs: [leg(pair.id1, pair.id2, q1, q2), leg(a3.id, a4.id, q3, q4)],
                }));
            }
        }
    }
    Ok(None)
}

/// Orthogonal multipolar contact: a polarised terminal atom approaching a
/// trigonal carbon roughly along the normal of its plane.
pub(super) fn orthogonal_multipole(ctx: &DetectionContext, pair: &AtomPair) -> Result<Option<Finding>, EngineError> {
    if !MULTIPOLE_DONOR_TYPES.contains(pair.type1()) || !MULTIPOLE_ACCEPTOR_TYPES.contains(pair.type2()) {
        return Ok(None);
    }
    let (q1, q2) = (pair.a1.partial_charge, pair.a2.partial_charge);
    if q1 > 0.0 || q2 < 0.0 {
        return Ok(None);
    }
    let params = &ctx.thresholds.multipole;
    if !within_vdw(ctx, pair, params.buffer)? {
        return Ok(None);
    }

    let donor_heavy = heavy(&ctx.substituents(pair.id1));
    let [a3] = donor_heavy.as_slice() else {
        return Ok(None);
    };
    let q3 = a3.atom.partial_charge;
    let e1 = (q1 - q3).abs();
    let d1 = pair.distance;
    let d2 = dist(pair.p2(), a3.position());
    if !polarised(q1, q3, params.charge_difference_min) || d1 > d2 {
        return Ok(None);
    }

    let approach_ok = |angle: f64| (params.approach_angle_min..=params.approach_angle_max).contains(&angle);
    // (angle2, angle3) at the foot of a1 on the plane through u, v and a2.
    let measured = |u: &Point3<f64>, v: &Point3<f64>| -> Option<(f64, f64)> {
        let np = project_onto_plane(u, v, pair.p2(), pair.p1())?;
        let angle2 = angle_at(&np, pair.p1(), pair.p2())?;
        let angle3 = angle_at(&np, pair.p1(), a3.position())?;
        Some((angle2, angle3))
    };
    let passes =
        |(angle2, angle3): (f64, f64)| angle2 <= params.projection_angle_max && angle3 >= params.substituent_angle_min;

    let acceptor_heavy = heavy(&ctx.substituents(pair.id2));
    let found = match acceptor_heavy.as_slice() {
        [a4] => {
            let q4 = a4.atom.partial_charge;
            if !polarised(q2, q4, params.charge_difference_min) {
                return Ok(None);
            }
            let Some(angle1) = angle_at(pair.p1(), pair.p2(), a4.position()) else {
                return Ok(None);
            };
            if !approach_ok(angle1) {
                return Ok(None);
            }
            // Any passing b registers; the angle slots keep the last b measured.
            let mut passed = false;
            let mut last = None;
            for b in heavy(&ctx.substituents(a4.id)).iter().filter(|b| b.id != pair.id2) {
                let Some(angles) = measured(b.position(), a4.position()) else {
                    continue;
                };
                passed |= passes(angles);
                last = Some(angles);
            }
            last.filter(|_| passed)
                .map(|(angle2, angle3)| (angle1, angle2, angle3, (q2 - q4).abs()))
        }
        _ => product(&acceptor_heavy, &acceptor_heavy).find_map(|(a4, a5)| {
            let q4 = a4.atom.partial_charge;
            if !polarised(q2, q4, params.charge_difference_min) {
                return None;
            }
            let angle1 = angle_at(pair.p1(), pair.p2(), a4.position())?;
            if !approach_ok(angle1) {
                return None;
            }
            let angles = measured(a4.position(), a5.position()).filter(|&angles| passes(angles))?;
            Some((angle1, angles.0, angles.1, (q2 - q4).abs()))
        }),
    };

    Ok(found.and_then(|(angle1, angle2, angle3, e2)| {
        contact("OMulPol", &[d1, d2, angle1, angle2, angle3, e1, e2])
    }))
}
