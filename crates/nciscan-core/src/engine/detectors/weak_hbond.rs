use super::{AtomPair, Finding, acceptor_pairs, combinations_heavy_first, contact_optional, dist, missing_threshold, product, within_vdw};
use crate::core::utils::geometry::angle_at;
use crate::core::utils::identifiers::{
    ACCEPTOR_TYPES, CH_DONOR_TYPES, CH_HETERO_ACCEPTOR_TYPES, CH_OXYGEN_ACCEPTOR_TYPES, SH_DONOR_TYPES,
};
use crate::engine::context::{DetectionContext, Substituent, heavy, hydrogens};
use crate::engine::error::EngineError;

/// Geometry of the donor-side combination that satisfied a C-H rule.
struct DonorGeometry {
    heavy_distance: f64,
    hydrogen_distance: f64,
    heavy_angle: f64,
    hydrogen_angle: f64,
}

/// First (X, H) on the donor, X heavy, for which `accept` holds.
fn ch_donor(
    ctx: &DetectionContext,
    pair: &AtomPair,
    accept: impl Fn(&DonorGeometry) -> bool,
) -> Option<DonorGeometry> {
    let subs = ctx.substituents(pair.id1);
    let (heavy, hydrogens) = (heavy(&subs), hydrogens(&subs));
    product(&heavy, &hydrogens).find_map(|(x, h)| {
        let geometry = DonorGeometry {
            heavy_distance: dist(x.position(), pair.p2()),
            hydrogen_distance: dist(h.position(), pair.p2()),
            heavy_angle: angle_at(x.position(), pair.p1(), pair.p2())?,
            hydrogen_angle: angle_at(pair.p1(), h.position(), pair.p2())?,
        };
        accept(&geometry).then_some(geometry)
    })
}

/// First acceptor-side pair whose both members lie farther from the donor than `d1`.
fn farther_pair<'a>(
    pairs: impl IntoIterator<Item = (Substituent<'a>, Substituent<'a>)>,
    pair: &AtomPair,
) -> Option<(f64, f64)> {
    pairs.into_iter().find_map(|(y, z)| {
        let (d4, d5) = (dist(y.position(), pair.p1()), dist(z.position(), pair.p1()));
        (pair.distance < d4 && pair.distance < d5).then_some((d4, d5))
    })
}

/// C-H···N and C-H···S.
pub(super) fn ch_hetero(ctx: &DetectionContext, pair: &AtomPair) -> Result<Option<Finding>, EngineError> {
    if !CH_DONOR_TYPES.contains(pair.type1()) || !CH_HETERO_ACCEPTOR_TYPES.contains(pair.type2()) {
        return Ok(None);
    }
    let el2 = pair.el2();
    let params = ctx
        .thresholds
        .ch_hetero(el2)
        .ok_or_else(|| missing_threshold(format!("CH_{el2}")))?;
    if !within_vdw(ctx, pair, params.buffer)? {
        return Ok(None);
    }
    let acceptor_subs = ctx.substituents(pair.id2);
    if acceptor_subs.is_empty() {
        return Ok(None);
    }

    let d1 = pair.distance;
    let Some(donor) = ch_donor(ctx, pair, |g| {
        d1 < g.heavy_distance
            && g.hydrogen_distance < d1
            && g.heavy_angle <= params.donor_angle_max
            && (g.hydrogen_distance <= params.near_distance
                || (params.near_distance < g.hydrogen_distance
                    && g.hydrogen_distance <= params.far_distance
                    && g.hydrogen_angle >= params.hydrogen_angle_min))
    }) else {
        return Ok(None);
    };

    let acceptor = match acceptor_subs.as_slice() {
        [only] if only.is_heavy() => {
            let d4 = dist(only.position(), pair.p1());
            (d1 < d4).then_some((Some(d4), None))
        }
        _ => {
            let heavy = heavy(&acceptor_subs);
            farther_pair(product(&heavy, &acceptor_subs), pair).map(|(d4, d5)| (Some(d4), Some(d5)))
        }
    };
    let Some((d4, d5)) = acceptor else {
        return Ok(None);
    };

    Ok(contact_optional(
        format!("CH_{el2}"),
        &[
            Some(d1),
            Some(donor.heavy_distance),
            Some(donor.hydrogen_distance),
            d4,
            d5,
            Some(donor.heavy_angle),
            Some(donor.hydrogen_angle),
        ],
    ))
}

/// C-H···O.
pub(super) fn ch_oxygen(ctx: &DetectionContext, pair: &AtomPair) -> Result<Option<Finding>, EngineError> {
    if !CH_DONOR_TYPES.contains(pair.type1()) || !CH_OXYGEN_ACCEPTOR_TYPES.contains(pair.type2()) {
        return Ok(None);
    }
    let params = &ctx.thresholds.ch_oxygen;
    if !within_vdw(ctx, pair, params.buffer)? {
        return Ok(None);
    }
    let acceptor_subs = ctx.substituents(pair.id2);
    if acceptor_subs.is_empty() {
        return Ok(None);
    }

    let d1 = pair.distance;
    let Some(donor) = ch_donor(ctx, pair, |g| {
        d1 < g.heavy_distance
            && g.hydrogen_distance < d1
            && g.hydrogen_distance < params.hydrogen_distance_max
            && g.heavy_angle <= params.donor_angle_max
            && g.hydrogen_angle >= params.hydrogen_angle_min
    }) else {
        return Ok(None);
    };

    let acceptor = match acceptor_subs.as_slice() {
        [only] => {
            let d4 = dist(only.position(), pair.p1());
            (d1 < d4).then_some((Some(d4), None))
        }
        _ => farther_pair(acceptor_pairs(&acceptor_subs), pair).map(|(d4, d5)| (Some(d4), Some(d5))),
    };
    let Some((d4, d5)) = acceptor else {
        return Ok(None);
    };

    Ok(contact_optional(
        "CH_O",
        &[
            Some(d1),
            Some(donor.heavy_distance),
            Some(donor.hydrogen_distance),
            d4,
            d5,
            Some(donor.heavy_angle),
            Some(donor.hydrogen_angle),
        ],
    ))
}

/// Donor-side test shared by the thiol and hydroxyl families: the first heavy
/// substituent within `angle_max` of the donor-acceptor axis that is farther
/// from the acceptor than the donor, then the first hydrogen that is closer.
///
/// Returns `(d2, d3, angle)`.
pub(super) fn xh_donor(
    pair: &AtomPair,
    donor_subs: &[Substituent],
    angle_max: f64,
) -> Option<(f64, f64, f64)> {
    let (d2, angle) = heavy(donor_subs).iter().find_map(|x| {
        let angle = angle_at(x.position(), pair.p1(), pair.p2())?;
        let d2 = dist(x.position(), pair.p2());
        (angle <= angle_max && pair.distance < d2).then_some((d2, angle))
    })?;
    let d3 = hydrogens(donor_subs)
        .iter()
        .map(|h| dist(h.position(), pair.p2()))
        .find(|&d3| d3 < pair.distance)?;
    Some((d2, d3, angle))
}

/// Acceptor-side test of the thiol and hydroxyl families. Returns `(d4, d5)`.
pub(super) fn xh_acceptor(
    pair: &AtomPair,
    acceptor_subs: &[Substituent],
    single_must_be_heavy: bool,
    skip_hydrogen_pairs: bool,
) -> Option<(f64, Option<f64>)> {
    match acceptor_subs {
        [] => None,
        [only] => {
            if single_must_be_heavy && !only.is_heavy() {
                return None;
            }
            let d4 = dist(pair.p1(), only.position());
            (pair.distance < d4).then_some((d4, None))
        }
        _ => combinations_heavy_first(acceptor_subs)
            .into_iter()
            .filter(|(z, y)| !(skip_hydrogen_pairs && z.is_hydrogen() && y.is_hydrogen()))
            .find_map(|(z, y)| {
                let d4 = dist(pair.p1(), z.position());
                let d5 = dist(pair.p1(), y.position());
                (pair.distance < d4 && pair.distance < d5).then_some((d4, Some(d5)))
            }),
    }
}

/// S-H···N and S-H···O.
pub(super) fn sh_acceptor(ctx: &DetectionContext, pair: &AtomPair) -> Result<Option<Finding>, EngineError> {
    if !SH_DONOR_TYPES.contains(pair.type1()) || !ACCEPTOR_TYPES.contains(pair.type2()) {
        return Ok(None);
    }
    let el2 = pair.el2();
    let params = ctx
        .thresholds
        .sh_acceptor(el2)
        .ok_or_else(|| missing_threshold(format!("SH_{el2}")))?;
    if !within_vdw(ctx, pair, params.buffer)? {
        return Ok(None);
    }

    let donor_subs = ctx.substituents(pair.id1);
    let acceptor_subs = ctx.substituents(pair.id2);
    if acceptor_subs.is_empty() {
        return Ok(None);
    }
    if pair.type2() == "N.ar" && acceptor_subs.iter().any(Substituent::is_hydrogen) {
        return Ok(None);
    }
    let Some((d2, d3, angle)) = xh_donor(pair, &donor_subs, params.angle) else {
        return Ok(None);
    };
    // A passing donor alone does not register: the acceptor side must pass too,
    // so no record is emitted with unmeasured d4/d5.
    let Some((d4, d5)) = xh_acceptor(pair, &acceptor_subs, false, false) else {
        return Ok(None);
    };

    Ok(contact_optional(
        format!("SH_{el2}"),
        &[Some(pair.distance), Some(d2), Some(d3), Some(d4), d5, Some(angle)],
    ))
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;

    /// Methyl-like donor on the left, carbonyl-like acceptor at x = 3.3.
    fn ch_o_system(hydrogen: [f64; 3]) -> Fixture {
        let structure = build(
            vec![
                atom(1, "C.3", 1, "L", [0.0, 0.0, 0.0]),
                atom(2, "H", 1, "L", hydrogen),
                atom(3, "C.3", 1, "L", [-1.5, 0.0, 0.0]),
                atom(4, "O.2", 2, "Pro", [3.3, 0.0, 0.0]),
                atom(5, "C.2", 2, "Pro", [4.5, 0.0, 0.0]),
            ],
            &[(1, 2), (1, 3), (4, 5)],
        );
        Fixture::new(structure)
    }

    #[test]
    fn ch_oxygen_registers_linear_contact() {
        let fixture = ch_o_system([1.09, 0.0, 0.0]);
        let ctx = fixture.ctx();
        let finding = ch_oxygen(&ctx, &fixture.pair(1, 4)).unwrap().unwrap();
        let Finding::Contact(hit) = finding else {
            panic!("expected a contact");
        };
        assert_eq!(hit.label, "CH_O");
        assert!((hit.items.get(1).unwrap() - 4.8).abs() < 1e-9);
        assert!((hit.items.get(2).unwrap() - 2.21).abs() < 1e-9);
        assert!((hit.items.get(5).unwrap() - 180.0).abs() < 1e-9);
        assert!(hit.items.get(4).is_none());
    }

    #[test]
    fn ch_oxygen_rejects_distant_hydrogen() {
        // H···O is about 2.85, past the 2.7 limit, while C···O stays inside vdW + buffer.
        let fixture = ch_o_system([0.6, 0.9, 0.0]);
        let ctx = fixture.ctx();
        assert!(ch_oxygen(&ctx, &fixture.pair(1, 4)).unwrap().is_none());
    }

    #[test]
    fn ch_hetero_reads_element_keyed_thresholds() {
        let structure = build(
            vec![
                atom(1, "C.ar", 1, "L", [0.0, 0.0, 0.0]),
                atom(2, "H", 1, "L", [1.08, 0.0, 0.0]),
                atom(3, "C.ar", 1, "L", [-1.4, 0.0, 0.0]),
                atom(4, "N.2", 2, "Pro", [3.4, 0.0, 0.0]),
                atom(5, "C.2", 2, "Pro", [4.6, 0.5, 0.0]),
            ],
            &[(1, 2), (1, 3), (4, 5)],
        );
        let fixture = Fixture::new(structure);
        let ctx = fixture.ctx();
        let finding = ch_hetero(&ctx, &fixture.pair(1, 4)).unwrap();
        assert!(matches!(finding, Some(Finding::Contact(ref hit)) if hit.label == "CH_N"));
    }

    #[test]
    fn ch_hetero_without_threshold_entry_is_an_error() {
        let structure = build(
            vec![
                atom(1, "C.3", 1, "L", [0.0, 0.0, 0.0]),
                atom(2, "H", 1, "L", [1.09, 0.0, 0.0]),
                atom(3, "S.3", 2, "Pro", [3.5, 0.0, 0.0]),
            ],
            &[(1, 2)],
        );
        let fixture = Fixture::without_threshold(structure, "CH_S");
        let ctx = fixture.ctx();
        let result = ch_hetero(&ctx, &fixture.pair(1, 3));
        assert!(matches!(result, Err(EngineError::MissingThreshold { key }) if key == "CH_S"));
    }

    #[test]
    fn sh_acceptor_rejects_protonated_aromatic_nitrogen() {
        let atoms = |acceptor_type: &str| {
            vec![
                atom(1, "S.3", 1, "L", [0.0, 0.0, 0.0]),
                atom(2, "H", 1, "L", [1.34, 0.0, 0.0]),
                atom(3, "C.3", 1, "L", [-0.3, 1.78, 0.0]),
                atom(4, acceptor_type, 2, "Pro", [3.3, 0.0, 0.0]),
                atom(5, "H", 2, "Pro", [3.6, 1.0, 0.0]),
                atom(6, "C.ar", 2, "Pro", [4.3, -0.8, 0.0]),
            ]
        };
        let bonds = [(1, 2), (1, 3), (4, 5), (4, 6)];

        let fixture = Fixture::new(build(atoms("N.2"), &bonds));
        let finding = sh_acceptor(&fixture.ctx(), &fixture.pair(1, 4)).unwrap();
        assert!(matches!(finding, Some(Finding::Contact(ref hit)) if hit.label == "SH_N"));

        let fixture = Fixture::new(build(atoms("N.ar"), &bonds));
        assert!(sh_acceptor(&fixture.ctx(), &fixture.pair(1, 4)).unwrap().is_none());
    }

    #[test]
    fn sh_acceptor_needs_a_passing_acceptor_side() {
        // The donor side passes, but the acceptor carbon leans back toward the sulfur.
        let fixture = Fixture::new(build(
            vec![
                atom(1, "S.3", 1, "L", [0.0, 0.0, 0.0]),
                atom(2, "H", 1, "L", [1.34, 0.0, 0.0]),
                atom(3, "C.3", 1, "L", [-0.3, 1.78, 0.0]),
                atom(4, "N.2", 2, "Pro", [3.3, 0.0, 0.0]),
                atom(5, "H", 2, "Pro", [3.6, 1.0, 0.0]),
                atom(6, "C.2", 2, "Pro", [2.6, 0.9, 0.0]),
            ],
            &[(1, 2), (1, 3), (4, 5), (4, 6)],
        ));
        let ctx = fixture.ctx();
        let pair = fixture.pair(1, 4);
        let donor_subs = ctx.substituents(pair.id1);
        assert!(xh_donor(&pair, &donor_subs, ctx.thresholds.sh_acceptor("N").unwrap().angle).is_some());
        assert!(sh_acceptor(&ctx, &pair).unwrap().is_none());
    }
}
