use super::{AtomPair, Finding, contact, contact_optional, dist, product, within_vdw};
use crate::core::utils::identifiers::{ION_TYPES, METAL_LIGAND_TYPES, METAL_TYPES, VDW_EXCLUDED_ELEMENTS};
use crate::engine::context::{DetectionContext, heavy, hydrogens};
use crate::engine::error::EngineError;
use itertools::iproduct;
use nalgebra::Point3;

/// Van der Waals contact, judged on the closest approach between the anchors
/// and their hydrogens.
pub(super) fn van_der_waals(ctx: &DetectionContext, pair: &AtomPair) -> Result<Option<Finding>, EngineError> {
    if VDW_EXCLUDED_ELEMENTS.contains(pair.el1()) || VDW_EXCLUDED_ELEMENTS.contains(pair.el2()) {
        return Ok(None);
    }
    let params = &ctx.thresholds.vdw;
    let vdw = ctx.vdw_sum(pair.a1, pair.a2)?;
    if pair.distance > params.buffer + vdw {
        return Ok(None);
    }

    let shell = |id, anchor: &Point3<f64>| {
        let mut points: Vec<Point3<f64>> = hydrogens(&ctx.substituents(id))
            .iter()
            .map(|h| *h.position())
            .collect();
        points.push(*anchor);
        points
    };
    let (shell1, shell2) = (shell(pair.id1, pair.p1()), shell(pair.id2, pair.p2()));
    let nearest = iproduct!(&shell1, &shell2)
        .map(|(a, b)| dist(a, b))
        .fold(pair.distance, f64::min);
    let diff = pair.distance - vdw;

    let passes = nearest <= params.near_distance
        || (params.shell_min < nearest && nearest <= params.shell_max)
        || (nearest > params.shell_max && diff <= params.overlap_max);
    if !passes {
        return Ok(None);
    }
    Ok(contact("vdW", &[pair.distance, nearest, diff]))
}

/// Metal coordination: the ligand atom must be the closest atom of its group.
pub(super) fn metal(ctx: &DetectionContext, pair: &AtomPair) -> Result<Option<Finding>, EngineError> {
    if !METAL_TYPES.contains(pair.type1()) || !METAL_LIGAND_TYPES.contains(pair.type2()) {
        return Ok(None);
    }
    if !within_vdw(ctx, pair, ctx.thresholds.metal.buffer)? {
        return Ok(None);
    }

    let d1 = pair.distance;
    let ligand_heavy = heavy(&ctx.substituents(pair.id2));
    let distances = match ligand_heavy.as_slice() {
        [only] => {
            let d2 = dist(pair.p1(), only.position());
            (d1 <= d2).then_some((Some(d2), None))
        }
        // Any passing pair registers; the slots keep the last pair visited.
        _ => {
            let mut passed = false;
            let mut last = None;
            for (x, y) in product(&ligand_heavy, &ligand_heavy) {
                let (d2, d3) = (dist(pair.p1(), x.position()), dist(pair.p1(), y.position()));
                passed |= d1 <= d2 && d1 <= d3;
                last = Some((Some(d2), Some(d3)));
            }
            last.filter(|_| passed)
        }
    };
    let Some((d2, d3)) = distances else {
        return Ok(None);
    };
    Ok(contact_optional(
        format!("{}_{}", pair.el1(), pair.el2()),
        &[Some(d1), d2, d3],
    ))
}

/// Free ion near any heavy atom.
pub(super) fn ion(ctx: &DetectionContext, pair: &AtomPair) -> Result<Option<Finding>, EngineError> {
    if !ION_TYPES.contains(pair.type1()) || pair.a2.is_hydrogen() {
        return Ok(None);
    }
    if !within_vdw(ctx, pair, ctx.thresholds.ion.buffer)? {
        return Ok(None);
    }
    if !ctx.structure.neighbors(pair.id1).is_empty() {
        return Ok(None);
    }
    Ok(contact(format!("{}_{}", pair.el1(), pair.el2()), &[pair.distance]))
}
