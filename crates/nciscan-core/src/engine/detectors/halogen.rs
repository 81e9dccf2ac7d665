use super::aromatic::is_pi_atom;
use super::{AtomPair, Finding, acceptor_pairs, contact, dist, missing_threshold, product, within_vdw};
use crate::core::utils::geometry::{angle_at, dihedral, project_onto_plane};
use crate::core::utils::identifiers::{
    HALOGEN_BRIDGING_ACCEPTOR_TYPES, HALOGEN_TERMINAL_ACCEPTOR_TYPES, HALOGEN_TYPES, XH_F_DONOR_TYPES,
    XH_HALOGEN_DONOR_TYPES,
};
use crate::engine::context::{DetectionContext, Substituent, heavy, hydrogens};
use crate::engine::error::EngineError;
use crate::engine::rings::{RingSize, rings_through};

/// The single covalent partner of a terminal atom, when it is heavy.
fn terminal_partner<'a>(subs: &[Substituent<'a>]) -> Option<Substituent<'a>> {
    match subs {
        [only] if only.is_heavy() => Some(*only),
        _ => None,
    }
}

/// C-Hal···Y halogen bond along the C-Hal axis.
pub(super) fn halogen_bond(ctx: &DetectionContext, pair: &AtomPair) -> Result<Option<Finding>, EngineError> {
    if !HALOGEN_TYPES.contains(pair.type1()) {
        return Ok(None);
    }
    let expected_substituents = if HALOGEN_TERMINAL_ACCEPTOR_TYPES.contains(pair.type2()) {
        1
    } else if HALOGEN_BRIDGING_ACCEPTOR_TYPES.contains(pair.type2()) {
        2
    } else {
        return Ok(None);
    };
    let el2 = pair.el2();
    let params = ctx
        .thresholds
        .halogen(el2)
        .ok_or_else(|| missing_threshold(format!("Hal_(X)_{el2}")))?;
    if !within_vdw(ctx, pair, params.buffer)? {
        return Ok(None);
    }

    let Some(carbon) = terminal_partner(&ctx.substituents(pair.id1)) else {
        return Ok(None);
    };
    let d1 = pair.distance;
    let d3 = dist(carbon.position(), pair.p2());
    let Some(angle1) = angle_at(pair.p1(), carbon.position(), pair.p2()) else {
        return Ok(None);
    };
    if d1 > d3 || angle1 > params.angle {
        return Ok(None);
    }

    let acceptor_subs = ctx.substituents(pair.id2);
    if acceptor_subs.len() != expected_substituents {
        return Ok(None);
    }
    let label = format!("Hal_{}_{}", pair.el1(), el2);
    if let [y] = acceptor_subs.as_slice() {
        let d2 = dist(pair.p1(), y.position());
        return Ok((y.is_heavy() && d1 <= d2)
            .then(|| contact(label, &[d1, d2, d3, angle1]))
            .flatten());
    }
    Ok(acceptor_pairs(&acceptor_subs)
        .into_iter()
        .find_map(|(y, z)| {
            let d2 = dist(pair.p1(), y.position());
            let d4 = dist(pair.p1(), z.position());
            let d5 = dist(carbon.position(), z.position());
            (d1 <= d2 && d4 <= d5).then_some([d1, d2, d3, d4, d5, angle1])
        })
        .and_then(|items| contact(label, &items)))
}

/// X-H···F-C. Water donors may use a hydrogen as the reference substituent and
/// get their own hydrogen distance limit.
pub(super) fn xh_fluorine(ctx: &DetectionContext, pair: &AtomPair) -> Result<Option<Finding>, EngineError> {
    if !XH_F_DONOR_TYPES.contains(pair.type1()) || pair.type2() != "F" {
        return Ok(None);
    }
    let el1 = pair.el1();
    let params = ctx
        .thresholds
        .xh_fluorine(el1)
        .ok_or_else(|| missing_threshold(format!("{el1}H_F")))?;
    if !within_vdw(ctx, pair, params.buffer)? {
        return Ok(None);
    }

    let donor_subs = ctx.substituents(pair.id1);
    if donor_subs.len() < 2 {
        return Ok(None);
    }
    let water = el1 == "O" && hydrogens(&donor_subs).len() == 2;
    let hydrogen_limit = if water {
        params.water_hydrogen_distance
    } else {
        params.hydrogen_distance
    };
    if terminal_partner(&ctx.substituents(pair.id2)).is_none() {
        return Ok(None);
    }

    let d1 = pair.distance;
    let found = product(&donor_subs, &donor_subs)
        .filter(|(x, h)| h.is_hydrogen() && (water || x.is_heavy()))
        .find_map(|(x, h)| {
            let d2 = dist(x.position(), pair.p2());
            let d3 = dist(h.position(), pair.p2());
            let angle1 = angle_at(x.position(), pair.p1(), pair.p2())?;
            let angle2 = angle_at(pair.p1(), h.position(), pair.p2())?;
            let passes = d1 <= d2
                && d3 <= d1
                && angle1 <= params.donor_angle_max
                && (d3 <= hydrogen_limit || angle2 > params.hydrogen_angle_min);
            passes.then_some([d1, d2, d3, angle1, angle2])
        });
    Ok(found.and_then(|items| contact(format!("{el1}H_F"), &items)))
}

/// X-H···Hal approaching the side of the halogen rather than its C-Hal axis.
pub(super) fn xh_halogen(ctx: &DetectionContext, pair: &AtomPair) -> Result<Option<Finding>, EngineError> {
    if !XH_HALOGEN_DONOR_TYPES.contains(pair.type1()) || !HALOGEN_TYPES.contains(pair.type2()) {
        return Ok(None);
    }
    let el1 = pair.el1();
    let params = ctx
        .thresholds
        .xh_halogen(el1)
        .ok_or_else(|| missing_threshold(format!("{el1}H_Hal_(X)")))?;
    if !within_vdw(ctx, pair, params.buffer)? {
        return Ok(None);
    }

    let donor_subs = ctx.substituents(pair.id1);
    if donor_subs.len() < 2 {
        return Ok(None);
    }
    let Some(y) = terminal_partner(&ctx.substituents(pair.id2)) else {
        return Ok(None);
    };
    let Some(angle2) = angle_at(y.position(), pair.p2(), pair.p1()) else {
        return Ok(None);
    };
    if angle2 > params.donor_angle_max {
        return Ok(None);
    }

    let donor_heavy = heavy(&donor_subs);
    let reference = if donor_heavy.is_empty() { &donor_subs } else { &donor_heavy };
    let Some(x) = reference
        .iter()
        .min_by(|a, b| dist(a.position(), pair.p2()).total_cmp(&dist(b.position(), pair.p2())))
    else {
        return Ok(None);
    };

    let d1 = pair.distance;
    let d2 = dist(x.position(), pair.p2());
    if d1 > d2 {
        return Ok(None);
    }
    let found = hydrogens(&donor_subs)
        .into_iter()
        .filter(|h| h.id != x.id)
        .find_map(|h| {
            let d3 = dist(h.position(), pair.p2());
            let angle1 = angle_at(y.position(), pair.p2(), h.position())?;
            let angle3 = angle_at(pair.p2(), pair.p1(), h.position())?;
            let angle4 = angle_at(y.position(), pair.p1(), h.position())?;
            let passes = d3 <= d1
                && angle1 <= params.hydrogen_angle_max
                && angle3 <= params.hydrogen_donor_angle_max
                && angle4 <= params.carbon_angle_max;
            passes.then_some([d1, d2, d3, angle1, angle2, angle3, angle4])
        });
    Ok(found.and_then(|items| contact(format!("{el1}H_Hal_{}", pair.el2()), &items)))
}

/// Halogen over the face of a five- or six-membered pi ring, pointing its
/// sigma hole at the ring.
pub(super) fn halogen_pi(ctx: &DetectionContext, pair: &AtomPair) -> Result<Option<Finding>, EngineError> {
    if !HALOGEN_TYPES.contains(pair.type1()) || !is_pi_atom(pair.a2) {
        return Ok(None);
    }
    let params = &ctx.thresholds.halogen_pi;
    if !within_vdw(ctx, pair, params.buffer)? {
        return Ok(None);
    }
    let face = RingFace {
        coefficient: params.ring_coefficient,
        angle_min: params.angle_min,
        dihedral_min: params.dihedral_min,
    };
    Ok(terminal_over_ring(ctx, pair, &face).and_then(|items| contact(format!("Hal_PI_{}", pair.el1()), &items)))
}

/// Limits for a terminal atom pointing at a ring face.
pub(super) struct RingFace {
    pub coefficient: f64,
    pub angle_min: f64,
    pub dihedral_min: f64,
}

/// A terminal `a1`, bonded to a single heavy atom C, sitting over a five- or
/// six-membered pi ring through `a2` with the C-a1 bond pointing into the face.
///
/// Returns `(d1, |C-a2|, |cn-a2|, rim, dnrm, |cn-a1|, |cn-C|, angle, dihedral)`
/// for the first ring that passes.
pub(super) fn terminal_over_ring(ctx: &DetectionContext, pair: &AtomPair, face: &RingFace) -> Option<[f64; 9]> {
    let carbon = terminal_partner(&ctx.substituents(pair.id1))?;
    let d1 = pair.distance;
    let d2 = dist(carbon.position(), pair.p2());
    if d1 > d2 || ctx.structure.neighbors(pair.id2).len() < 2 {
        return None;
    }

    let structure = ctx.structure;
    rings_through(structure, pair.id2, is_pi_atom, RingSize::FiveOrSix)
        .iter()
        .find_map(|ring| {
            let (nb0, nb1) = ring.plane_neighbors(structure, pair.id2)?;
            let nrm = project_onto_plane(&nb0.position, pair.p2(), &nb1.position, pair.p1())?;
            let cn = ring.centroid;
            let d3 = dist(&cn, pair.p2());
            let d5 = dist(&cn, pair.p1());
            let d6 = dist(&cn, carbon.position());
            let dnrm = dist(&nrm, &cn);
            let angle = angle_at(&nrm, pair.p1(), carbon.position())?;
            let torsion = dihedral(&cn, &nrm, pair.p1(), carbon.position())?;
            let rim = d3 * face.coefficient;
            (dnrm <= rim && d5 <= d6 && angle >= face.angle_min && torsion >= face.dihedral_min)
                .then_some([d1, d2, d3, rim, dnrm, d5, d6, angle, torsion])
        })
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;

    fn chloro_carbonyl(carbon: [f64; 3]) -> Fixture {
        Fixture::new(build(
            vec![
                atom(1, "Cl", 1, "L", [0.0, 0.0, 0.0]),
                atom(2, "C.3", 1, "L", carbon),
                atom(3, "O.2", 2, "Pro", [3.0, 0.0, 0.0]),
                atom(4, "C.2", 2, "Pro", [3.9, 0.85, 0.0]),
            ],
            &[(1, 2), (3, 4)],
        ))
    }

    #[test]
    fn linear_c_cl_o_is_a_halogen_bond() {
        let fixture = chloro_carbonyl([-1.75, 0.0, 0.0]);
        let finding = halogen_bond(&fixture.ctx(), &fixture.pair(1, 3)).unwrap();
        let Some(Finding::Contact(hit)) = finding else {
            panic!("expected a contact");
        };
        assert_eq!(hit.label, "Hal_Cl_O");
        assert!((hit.items.get(2).unwrap() - 4.75).abs() < 1e-9);
        assert!(hit.items.get(3).unwrap().abs() < 1e-6);
    }

    #[test]
    fn bent_c_cl_o_is_not_a_halogen_bond() {
        let fixture = chloro_carbonyl([0.0, -1.75, 0.0]);
        assert!(halogen_bond(&fixture.ctx(), &fixture.pair(1, 3)).unwrap().is_none());
    }

    #[test]
    fn ch_donor_to_fluorine() {
        let fixture = Fixture::new(build(
            vec![
                atom(1, "F", 1, "L", [0.0, 0.0, 0.0]),
                atom(2, "C.3", 1, "L", [-1.35, 0.0, 0.0]),
                atom(3, "C.3", 2, "Pro", [0.0, 3.2, 0.0]),
                atom(4, "H", 2, "Pro", [0.0, 2.1, 0.0]),
                atom(5, "C.3", 2, "Pro", [0.0, 3.7, 1.4]),
            ],
            &[(1, 2), (3, 4), (3, 5)],
        ));
        let finding = xh_fluorine(&fixture.ctx(), &fixture.pair(3, 1)).unwrap();
        assert!(matches!(finding, Some(Finding::Contact(ref hit)) if hit.label == "CH_F"));
    }

    #[test]
    fn water_may_reference_its_other_hydrogen() {
        let fixture = Fixture::new(build(
            vec![
                atom(1, "F", 1, "L", [0.0, 0.0, 0.0]),
                atom(2, "C.3", 1, "L", [-1.35, 0.0, 0.0]),
                atom(3, "O.3", 2, "S", [0.0, 3.0, 0.0]),
                atom(4, "H", 2, "S", [0.0, 2.05, 0.0]),
                atom(5, "H", 2, "S", [0.9, 3.3, 0.0]),
            ],
            &[(1, 2), (3, 4), (3, 5)],
        ));
        let finding = xh_fluorine(&fixture.ctx(), &fixture.pair(3, 1)).unwrap();
        let Some(Finding::Contact(hit)) = finding else {
            panic!("expected a contact");
        };
        assert_eq!(hit.label, "OH_F");
        assert!((hit.items.get(2).unwrap() - 2.05).abs() < 1e-9);
    }

    fn side_on_chlorine(halogen_carbon: [f64; 3]) -> Fixture {
        Fixture::new(build(
            vec![
                atom(1, "Cl", 1, "L", [0.0, 0.0, 0.0]),
                atom(2, "C.3", 1, "L", halogen_carbon),
                atom(3, "C.3", 2, "Pro", [0.0, 3.5, 0.0]),
                atom(4, "H", 2, "Pro", [0.0, 2.4, 0.0]),
                atom(5, "C.3", 2, "Pro", [0.0, 4.0, 1.4]),
            ],
            &[(1, 2), (3, 4), (3, 5)],
        ))
    }

    #[test]
    fn hydrogen_on_the_halogen_belt_is_accepted() {
        let fixture = side_on_chlorine([-1.75, 0.0, 0.0]);
        let finding = xh_halogen(&fixture.ctx(), &fixture.pair(3, 1)).unwrap();
        let Some(Finding::Contact(hit)) = finding else {
            panic!("expected a contact");
        };
        assert_eq!(hit.label, "CH_Hal_Cl");
        assert!((hit.items.get(4).unwrap() - 90.0).abs() < 1e-6);
    }

    #[test]
    fn hydrogen_behind_the_c_cl_axis_is_rejected() {
        // C-Cl···C angle of 180 degrees exceeds the donor angle limit.
        let fixture = side_on_chlorine([0.0, -1.75, 0.0]);
        assert!(xh_halogen(&fixture.ctx(), &fixture.pair(3, 1)).unwrap().is_none());
    }

    fn chlorine_over_ring(carbon: [f64; 3]) -> Fixture {
        let (mut atoms, mut bonds) = benzene(1, 2, "Pro", [0.0, 0.0, 0.0], X, Y);
        atoms.push(atom(10, "Cl", 1, "L", [1.4, 0.0, 3.4]));
        atoms.push(atom(11, "C.3", 1, "L", carbon));
        bonds.push((10, 11));
        Fixture::new(build(atoms, &bonds))
    }

    #[test]
    fn chlorine_pointing_at_the_ring_face() {
        let fixture = chlorine_over_ring([1.9, 0.0, 5.08]);
        let finding = halogen_pi(&fixture.ctx(), &fixture.pair(10, 1)).unwrap();
        let Some(Finding::Contact(hit)) = finding else {
            panic!("expected a contact");
        };
        assert_eq!(hit.label, "Hal_PI_Cl");
        assert!((hit.items.get(8).unwrap() - 180.0).abs() < 1e-6);
    }

    #[test]
    fn chlorine_tilted_over_the_ring_centre_fails_the_torsion() {
        let fixture = chlorine_over_ring([0.9, 0.0, 5.08]);
        assert!(halogen_pi(&fixture.ctx(), &fixture.pair(10, 1)).unwrap().is_none());
    }
}
