use super::aromatic::{fold_normal_angle, is_pi_atom};
use super::halogen::{RingFace, terminal_over_ring};
use super::weak_hbond::{xh_acceptor, xh_donor};
use super::{
    AtomPair, Finding, combinations_heavy_first, contact, contact_optional, dist, missing_threshold, product,
    within_vdw,
};
use crate::core::utils::geometry::{angle_at, angle_between, normal, project_onto_plane};
use crate::core::utils::identifiers::{
    NH_S_DONOR_TYPES, S_N_ACCEPTOR_TYPES, S_O_ACCEPTOR_TYPES, S_O_DONOR_TYPES, SULFUR_TYPES, XH_S_DONOR_TYPES,
};
use crate::engine::context::{DetectionContext, Substituent, heavy};
use crate::engine::error::EngineError;
use crate::engine::rings::{RingSize, rings_through};
use nalgebra::Point3;

/// First ordered (heavy, other) substituent pair with both members at least
/// `d1` away from `anchor`. Returns the two distances.
fn flanking_pair(subs: &[Substituent], anchor: &Point3<f64>, d1: f64) -> Option<(f64, f64)> {
    product(subs, subs)
        .filter(|(x, _)| x.is_heavy())
        .map(|(x, w)| (dist(x.position(), anchor), dist(w.position(), anchor)))
        .find(|&(dx, dw)| d1 <= dx && d1 <= dw)
}

/// N-H···S hydrogen bond with two distance-dependent angle windows.
pub(super) fn nh_sulfur(ctx: &DetectionContext, pair: &AtomPair) -> Result<Option<Finding>, EngineError> {
    if !NH_S_DONOR_TYPES.contains(pair.type1()) || !SULFUR_TYPES.contains(pair.type2()) {
        return Ok(None);
    }
    let params = &ctx.thresholds.nh_sulfur;
    if !within_vdw(ctx, pair, params.buffer)? {
        return Ok(None);
    }
    let donor_subs = ctx.substituents(pair.id1);
    if donor_subs.len() != 2 {
        return Ok(None);
    }

    let d1 = pair.distance;
    let in_window = |angle: f64, (lo, hi): (f64, f64)| lo <= angle && angle <= hi;
    let donor = product(&donor_subs, &donor_subs)
        .filter(|(x, h)| x.is_heavy() && h.is_hydrogen())
        .find_map(|(x, h)| {
            let d2 = dist(x.position(), pair.p2());
            let d3 = dist(h.position(), pair.p2());
            let angle = angle_at(pair.p1(), h.position(), pair.p2())?;
            let near = d3 <= params.near_distance && in_window(angle, params.near_window);
            let far = params.near_distance < d3 && d3 <= params.far_distance && in_window(angle, params.far_window);
            (d3 <= d1 && d1 <= d2 && (near || far)).then_some((d2, d3, angle))
        });
    let Some((d2, d3, angle)) = donor else {
        return Ok(None);
    };

    let acceptor_subs = ctx.substituents(pair.id2);
    let acceptor = match (pair.type2(), acceptor_subs.as_slice()) {
        ("S.2", [only]) if only.is_heavy() => {
            let d4 = dist(only.position(), pair.p1());
            (d1 <= d4).then_some((d4, None))
        }
        ("S.2", _) => None,
        _ => flanking_pair(&acceptor_subs, pair.p1(), d1).map(|(d4, d5)| (d4, Some(d5))),
    };
    let Some((d4, d5)) = acceptor else {
        return Ok(None);
    };
    Ok(contact_optional(
        "NH_S",
        &[Some(d1), Some(d2), Some(d3), Some(d4), d5, Some(angle)],
    ))
}

/// O-H···S and S-H···S, judged like the thiol hydrogen bonds to N and O.
pub(super) fn xh_sulfur(ctx: &DetectionContext, pair: &AtomPair) -> Result<Option<Finding>, EngineError> {
    if !XH_S_DONOR_TYPES.contains(pair.type1()) || !SULFUR_TYPES.contains(pair.type2()) {
        return Ok(None);
    }
    let el1 = pair.el1();
    let params = ctx
        .thresholds
        .xh_sulfur(el1)
        .ok_or_else(|| missing_threshold(format!("{el1}H_S")))?;
    if !within_vdw(ctx, pair, params.buffer)? {
        return Ok(None);
    }

    let donor_subs = ctx.substituents(pair.id1);
    let Some((d2, d3, angle)) = xh_donor(pair, &donor_subs, params.angle) else {
        return Ok(None);
    };
    let Some((d4, d5)) = xh_acceptor(pair, &ctx.substituents(pair.id2), true, true) else {
        return Ok(None);
    };
    Ok(contact_optional(
        format!("{el1}H_S"),
        &[Some(pair.distance), Some(d2), Some(d3), Some(d4), d5, Some(angle)],
    ))
}

/// Chalcogen contact S···O.
pub(super) fn sulfur_oxygen(ctx: &DetectionContext, pair: &AtomPair) -> Result<Option<Finding>, EngineError> {
    if !S_O_DONOR_TYPES.contains(pair.type1()) || !S_O_ACCEPTOR_TYPES.contains(pair.type2()) {
        return Ok(None);
    }
    if !within_vdw(ctx, pair, ctx.thresholds.sulfur_oxygen.buffer)? {
        return Ok(None);
    }
    let sulfur_subs = ctx.substituents(pair.id1);
    if sulfur_subs.len() < 2 {
        return Ok(None);
    }
    let oxygen_subs = ctx.substituents(pair.id2);
    let shape_ok = match oxygen_subs.as_slice() {
        [_, _] => pair.type2() == "O.3",
        [only] => pair.type2() != "O.3" && only.is_heavy(),
        _ => false,
    };
    if !shape_ok {
        return Ok(None);
    }

    let d1 = pair.distance;
    let Some((d2, d3)) = flanking_pair(&sulfur_subs, pair.p2(), pair.distance) else {
        return Ok(None);
    };
    let oxygen_side = match oxygen_subs.as_slice() {
        [only] => {
            let d4 = dist(only.position(), pair.p1());
            (d1 <= d4).then_some((d4, None))
        }
        _ => combinations_heavy_first(&oxygen_subs).into_iter().find_map(|(x, y)| {
            let d4 = dist(x.position(), pair.p1());
            let d5 = dist(y.position(), pair.p1());
            (d1 <= d4 && d1 <= d5).then_some((d4, Some(d5)))
        }),
    };
    let Some((d4, d5)) = oxygen_side else {
        return Ok(None);
    };
    Ok(contact_optional("S_O", &[Some(d1), Some(d2), Some(d3), Some(d4), d5]))
}

/// Chalcogen contact between a divalent sulfur and an sp2 nitrogen.
pub(super) fn sulfur_nitrogen(ctx: &DetectionContext, pair: &AtomPair) -> Result<Option<Finding>, EngineError> {
    if pair.type1() != "S.3" || !S_N_ACCEPTOR_TYPES.contains(pair.type2()) {
        return Ok(None);
    }
    if !within_vdw(ctx, pair, ctx.thresholds.sulfur_nitrogen.buffer)? {
        return Ok(None);
    }
    let sulfur_subs = ctx.substituents(pair.id1);
    let nitrogen_subs = ctx.substituents(pair.id2);
    if sulfur_subs.len() != 2 || nitrogen_subs.len() != 2 {
        return Ok(None);
    }
    let Some((d2, d3)) = flanking_pair(&sulfur_subs, pair.p2(), pair.distance) else {
        return Ok(None);
    };
    let Some((d4, d5)) = flanking_pair(&nitrogen_subs, pair.p1(), pair.distance) else {
        return Ok(None);
    };
    Ok(contact("S_N", &[pair.distance, d2, d3, d4, d5]))
}

/// S···S contact, with the S-X bond of the first sulfur pointing at the second.
pub(super) fn sulfur_sulfur(ctx: &DetectionContext, pair: &AtomPair) -> Result<Option<Finding>, EngineError> {
    if !SULFUR_TYPES.contains(pair.type1()) || !SULFUR_TYPES.contains(pair.type2()) {
        return Ok(None);
    }
    let params = &ctx.thresholds.sulfur_sulfur;
    if !within_vdw(ctx, pair, params.buffer)? {
        return Ok(None);
    }
    let d1 = pair.distance;

    let first_subs = ctx.substituents(pair.id1);
    let first = match first_subs.as_slice() {
        [only] if only.is_heavy() => {
            let d2 = dist(pair.p2(), only.position());
            angle_at(only.position(), pair.p1(), pair.p2())
                .filter(|&angle| d1 < d2 && angle <= params.angle)
                .map(|angle| (d2, None, angle))
        }
        _ => product(&first_subs, &first_subs)
            .filter(|(x, _)| x.is_heavy())
            .find_map(|(x, w)| {
                let d2 = dist(pair.p2(), x.position());
                let d3 = dist(pair.p2(), w.position());
                let angle = angle_at(x.position(), pair.p1(), pair.p2())?;
                (d1 < d2 && d1 < d3 && angle <= params.angle).then_some((d2, Some(d3), angle))
            }),
    };
    let Some((d2, d3, angle)) = first else {
        return Ok(None);
    };

    let second_subs = ctx.substituents(pair.id2);
    let second = match second_subs.as_slice() {
        [only] if only.is_heavy() => {
            let d4 = dist(pair.p1(), only.position());
            (d1 < d4).then_some((d4, None))
        }
        _ => product(&second_subs, &second_subs)
            .filter(|(y, _)| y.is_heavy())
            .find_map(|(y, z)| {
                let d4 = dist(pair.p1(), z.position());
                let d5 = dist(pair.p1(), y.position());
                (d1 < d4 && d1 < d5).then_some((d4, Some(d5)))
            }),
    };
    let Some((d4, d5)) = second else {
        return Ok(None);
    };
    Ok(contact_optional(
        "S_S",
        &[Some(d1), Some(d2), d3, Some(d4), d5, Some(angle)],
    ))
}

/// S···F-C contact.
pub(super) fn sulfur_fluorine(ctx: &DetectionContext, pair: &AtomPair) -> Result<Option<Finding>, EngineError> {
    if !SULFUR_TYPES.contains(pair.type1()) || pair.type2() != "F" {
        return Ok(None);
    }
    let params = &ctx.thresholds.sulfur_fluorine;
    if !within_vdw(ctx, pair, params.buffer)? {
        return Ok(None);
    }
    let sulfur_subs = ctx.substituents(pair.id1);
    // A lone substituent leaves no second one to confirm the contact.
    if sulfur_subs.len() < 2 {
        return Ok(None);
    }
    let fluorine_subs = ctx.substituents(pair.id2);
    let [carbon] = fluorine_subs.as_slice() else {
        return Ok(None);
    };
    if !carbon.is_heavy() {
        return Ok(None);
    }
    let d1 = pair.distance;
    let d4 = dist(pair.p1(), carbon.position());
    if d1 >= d4 {
        return Ok(None);
    }

    for x in heavy(&sulfur_subs) {
        let d2 = dist(x.position(), pair.p2());
        // A substituent closer to the fluorine than the sulfur rules the contact out.
        if d1 >= d2 {
            return Ok(None);
        }
        let Some(angle) = angle_at(x.position(), pair.p1(), pair.p2()) else {
            continue;
        };
        if angle > params.angle {
            continue;
        }
        let partner = sulfur_subs
            .iter()
            .filter(|w| w.id != x.id)
            .map(|w| dist(w.position(), pair.p2()))
            .find(|&d3| d1 < d3);
        if let Some(d3) = partner {
            return Ok(contact("S_F", &[d1, d2, d3, d4, angle]));
        }
    }
    Ok(None)
}

/// Divalent sulfur over a pi ring, with its C-S-C plane tilted against the ring plane.
pub(super) fn sulfur_pi_divalent(ctx: &DetectionContext, pair: &AtomPair) -> Result<Option<Finding>, EngineError> {
    if !SULFUR_TYPES.contains(pair.type1()) || !is_pi_atom(pair.a2) {
        return Ok(None);
    }
    let params = &ctx.thresholds.sulfur_pi;
    if !within_vdw(ctx, pair, params.buffer)? {
        return Ok(None);
    }
    let sulfur_subs = ctx.substituents(pair.id1);
    if sulfur_subs.len() < 2 || ctx.structure.neighbors(pair.id2).len() < 2 {
        return Ok(None);
    }

    let d1 = pair.distance;
    let sulfur_plane = combinations_heavy_first(&sulfur_subs)
        .into_iter()
        .filter(|(x, w)| !(x.is_hydrogen() && w.is_hydrogen()))
        .find_map(|(x, w)| {
            let d2 = dist(x.position(), pair.p2());
            let d3 = dist(w.position(), pair.p2());
            (d1 <= d2 && d1 <= d3).then(|| (normal(x.position(), pair.p1(), w.position()), d2, d3))
        });
    let Some((sulfur_normal, d2, d3)) = sulfur_plane else {
        return Ok(None);
    };

    let structure = ctx.structure;
    for ring in rings_through(structure, pair.id2, is_pi_atom, RingSize::FiveOrSix) {
        let Some((nb0, nb1)) = ring.plane_neighbors(structure, pair.id2) else {
            continue;
        };
        let Some(nrm) = project_onto_plane(&nb0.position, pair.p2(), &nb1.position, pair.p1()) else {
            continue;
        };
        let d4 = dist(&ring.centroid, pair.p2());
        let dnrm = dist(&nrm, &ring.centroid);
        let ring_normal = normal(&nb0.position, pair.p2(), &nb1.position);
        let Some(angle) = angle_between(&sulfur_normal, &ring_normal).map(fold_normal_angle) else {
            continue;
        };
        let rim = d4 * params.ring_coefficient;
        if dnrm <= rim && angle >= params.normal_angle_min {
            return Ok(contact("S_PI", &[d1, d2, d3, d4, rim, dnrm, angle]));
        }
    }
    Ok(None)
}

/// Thione-like terminal sulfur pointing its C=S bond into a pi ring face.
pub(super) fn sulfur_pi_terminal(ctx: &DetectionContext, pair: &AtomPair) -> Result<Option<Finding>, EngineError> {
    if pair.type1() != "S.2" || !is_pi_atom(pair.a2) {
        return Ok(None);
    }
    let params = &ctx.thresholds.sulfur_pi;
    if !within_vdw(ctx, pair, params.buffer)? {
        return Ok(None);
    }
    let face = RingFace {
        coefficient: params.ring_coefficient,
        angle_min: params.terminal_angle_min,
        dihedral_min: params.dihedral_min,
    };
    Ok(terminal_over_ring(ctx, pair, &face).and_then(|items| contact("S_PI", &items)))
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;

    fn hit(finding: Option<Finding>) -> super::super::Hit {
        match finding {
            Some(Finding::Contact(hit)) => hit,
            other => panic!("expected a contact, got {other:?}"),
        }
    }

    fn amine_to_thioether(hydrogen: [f64; 3]) -> Fixture {
        Fixture::new(build(
            vec![
                atom(1, "N.3", 1, "L", [0.0, 0.0, 0.0]),
                atom(2, "H", 1, "L", hydrogen),
                atom(3, "C.3", 1, "L", [-0.5, 1.3, 0.0]),
                atom(4, "S.3", 2, "Pro", [3.3, 0.0, 0.0]),
                atom(5, "C.3", 2, "Pro", [4.0, 1.6, 0.0]),
                atom(6, "C.3", 2, "Pro", [4.0, -1.6, 0.0]),
            ],
            &[(1, 2), (1, 3), (4, 5), (4, 6)],
        ))
    }

    #[test]
    fn near_hydrogen_inside_first_window_bonds_to_sulfur() {
        let fixture = amine_to_thioether([1.0, 0.1, 0.0]);
        let hit = hit(nh_sulfur(&fixture.ctx(), &fixture.pair(1, 4)).unwrap());
        assert_eq!(hit.label, "NH_S");
        assert!(hit.items.get(4).is_some());
    }

    #[test]
    fn far_hydrogen_needs_the_second_window() {
        // d3 = 2.93 falls in the far band but the N-H···S angle is ~103 degrees.
        let fixture = amine_to_thioether([0.5, 0.866, 0.0]);
        assert!(nh_sulfur(&fixture.ctx(), &fixture.pair(1, 4)).unwrap().is_none());
    }

    fn hydroxyl_to_thione(acceptor_partner: &str) -> Fixture {
        Fixture::new(build(
            vec![
                atom(1, "O.3", 1, "L", [0.0, 0.0, 0.0]),
                atom(2, "H", 1, "L", [0.96, 0.1, 0.0]),
                atom(3, "C.3", 1, "L", [-0.5, 1.3, 0.0]),
                atom(4, "S.2", 2, "Pro", [3.3, 0.0, 0.0]),
                atom(5, acceptor_partner, 2, "Pro", [4.9, 0.0, 0.0]),
            ],
            &[(1, 2), (1, 3), (4, 5)],
        ))
    }

    #[test]
    fn hydroxyl_to_sulfur() {
        let fixture = hydroxyl_to_thione("C.2");
        let hit = hit(xh_sulfur(&fixture.ctx(), &fixture.pair(1, 4)).unwrap());
        assert_eq!(hit.label, "OH_S");
        assert_eq!(hit.items.get(4), None);
    }

    #[test]
    fn single_hydrogen_on_the_sulfur_acceptor_is_rejected() {
        let fixture = hydroxyl_to_thione("H");
        assert!(xh_sulfur(&fixture.ctx(), &fixture.pair(1, 4)).unwrap().is_none());
    }

    fn thioether_with(partner: Vec<crate::core::models::atom::Atom>, bonds: &[(usize, usize)]) -> Fixture {
        let mut atoms = vec![
            atom(1, "S.3", 1, "L", [0.0, 0.0, 0.0]),
            atom(2, "C.3", 1, "L", [-0.9, 1.4, 0.0]),
            atom(3, "C.3", 1, "L", [-0.9, -1.4, 0.0]),
        ];
        atoms.extend(partner);
        let mut all_bonds = vec![(1, 2), (1, 3)];
        all_bonds.extend_from_slice(bonds);
        Fixture::new(build(atoms, &all_bonds))
    }

    #[test]
    fn sulfur_to_carbonyl_oxygen() {
        let fixture = thioether_with(
            vec![
                atom(4, "O.2", 2, "Pro", [3.2, 0.0, 0.0]),
                atom(5, "C.2", 2, "Pro", [4.4, 0.0, 0.0]),
            ],
            &[(4, 5)],
        );
        let hit = hit(sulfur_oxygen(&fixture.ctx(), &fixture.pair(1, 4)).unwrap());
        assert_eq!(hit.label, "S_O");
        assert!((hit.items.get(3).unwrap() - 4.4).abs() < 1e-9);
        assert_eq!(hit.items.get(4), None);
    }

    #[test]
    fn hydroxyl_oxygen_needs_two_substituents() {
        let fixture = thioether_with(
            vec![
                atom(4, "O.3", 2, "Pro", [3.2, 0.0, 0.0]),
                atom(5, "C.3", 2, "Pro", [4.4, 0.0, 0.0]),
            ],
            &[(4, 5)],
        );
        assert!(sulfur_oxygen(&fixture.ctx(), &fixture.pair(1, 4)).unwrap().is_none());
    }

    #[test]
    fn sulfur_to_aromatic_nitrogen() {
        let fixture = thioether_with(
            vec![
                atom(4, "N.ar", 2, "Pro", [3.2, 0.0, 0.0]),
                atom(5, "C.ar", 2, "Pro", [3.9, 1.2, 0.0]),
                atom(6, "C.ar", 2, "Pro", [3.9, -1.2, 0.0]),
            ],
            &[(4, 5), (4, 6)],
        );
        let hit = hit(sulfur_nitrogen(&fixture.ctx(), &fixture.pair(1, 4)).unwrap());
        assert_eq!(hit.label, "S_N");
        assert_eq!(hit.items.iter().flatten().count(), 5);
    }

    fn thione_to_thioether(thione_carbon: [f64; 3]) -> Fixture {
        Fixture::new(build(
            vec![
                atom(1, "S.2", 1, "L", [0.0, 0.0, 0.0]),
                atom(2, "C.2", 1, "L", thione_carbon),
                atom(3, "S.3", 2, "Pro", [3.5, 0.0, 0.0]),
                atom(4, "C.3", 2, "Pro", [4.3, 1.4, 0.0]),
                atom(5, "C.3", 2, "Pro", [4.3, -1.4, 0.0]),
            ],
            &[(1, 2), (3, 4), (3, 5)],
        ))
    }

    #[test]
    fn bent_thione_contacts_sulfur() {
        let fixture = thione_to_thioether([-0.8, 1.4, 0.0]);
        let hit = hit(sulfur_sulfur(&fixture.ctx(), &fixture.pair(1, 3)).unwrap());
        assert_eq!(hit.label, "S_S");
        assert_eq!(hit.items.get(2), None);
        assert!(hit.items.get(4).is_some());
    }

    #[test]
    fn collinear_thione_exceeds_the_angle_limit() {
        let fixture = thione_to_thioether([-1.6, 0.0, 0.0]);
        assert!(sulfur_sulfur(&fixture.ctx(), &fixture.pair(1, 3)).unwrap().is_none());
    }

    #[test]
    fn sulfur_to_fluorine_needs_a_second_substituent() {
        let fluorine = || {
            vec![
                atom(4, "F", 2, "Pro", [3.1, 0.0, 0.0]),
                atom(5, "C.3", 2, "Pro", [4.45, 0.0, 0.0]),
            ]
        };
        let fixture = thioether_with(fluorine(), &[(4, 5)]);
        let hit_two = hit(sulfur_fluorine(&fixture.ctx(), &fixture.pair(1, 4)).unwrap());
        assert!(hit_two.items.get(2).is_some());

        let mut atoms = vec![
            atom(1, "S.2", 1, "L", [0.0, 0.0, 0.0]),
            atom(2, "C.2", 1, "L", [-0.9, 1.4, 0.0]),
        ];
        atoms.extend(fluorine());
        let fixture = Fixture::new(build(atoms, &[(1, 2), (4, 5)]));
        assert!(sulfur_fluorine(&fixture.ctx(), &fixture.pair(1, 4)).unwrap().is_none());
    }

    fn thioether_over_ring(c1: [f64; 3], c2: [f64; 3]) -> Fixture {
        let (mut atoms, mut bonds) = benzene(1, 2, "Pro", [0.0, 0.0, 0.0], X, Y);
        atoms.push(atom(10, "S.3", 1, "L", [1.4, 0.0, 3.4]));
        atoms.push(atom(11, "C.3", 1, "L", c1));
        atoms.push(atom(12, "C.3", 1, "L", c2));
        bonds.extend([(10, 11), (10, 12)]);
        Fixture::new(build(atoms, &bonds))
    }

    #[test]
    fn upright_thioether_plane_over_ring() {
        let fixture = thioether_over_ring([1.4, 1.4, 4.3], [1.4, -1.4, 4.3]);
        let hit = hit(sulfur_pi_divalent(&fixture.ctx(), &fixture.pair(10, 1)).unwrap());
        assert_eq!(hit.label, "S_PI");
        assert!((hit.items.get(6).unwrap() - 90.0).abs() < 1e-6);
    }

    #[test]
    fn thioether_plane_parallel_to_ring_is_rejected() {
        let fixture = thioether_over_ring([2.6, 0.8, 3.4], [2.6, -0.8, 3.4]);
        assert!(sulfur_pi_divalent(&fixture.ctx(), &fixture.pair(10, 1)).unwrap().is_none());
    }

    #[test]
    fn terminal_sulfur_pointing_into_ring() {
        let (mut atoms, mut bonds) = benzene(1, 2, "Pro", [0.0, 0.0, 0.0], X, Y);
        atoms.push(atom(10, "S.2", 1, "L", [1.4, 0.0, 3.4]));
        atoms.push(atom(11, "C.2", 1, "L", [1.9, 0.0, 5.08]));
        bonds.push((10, 11));
        let fixture = Fixture::new(build(atoms, &bonds));
        let ctx = fixture.ctx();
        let hit = hit(sulfur_pi_terminal(&ctx, &fixture.pair(10, 1)).unwrap());
        assert_eq!(hit.items.iter().flatten().count(), 9);
        assert!(sulfur_pi_divalent(&ctx, &fixture.pair(10, 1)).unwrap().is_none());
    }
}
