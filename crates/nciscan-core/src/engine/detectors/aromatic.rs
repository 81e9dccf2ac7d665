use super::{AtomPair, Finding, contact, contact_optional, dist, missing_threshold, product, within_vdw};
use crate::core::models::atom::Atom;
use crate::core::utils::geometry::{angle_at, angle_between, dihedral, normal, project_onto_line, project_onto_plane};
use crate::core::utils::identifiers::{LEGACY_XH_PI_DONOR_TYPES, PI_TYPES, XH_PI_DONOR_TYPES};
use crate::engine::context::{DetectionContext, hydrogens};
use crate::engine::error::EngineError;
use crate::engine::rings::{RingSize, rings_through};

pub(super) fn is_pi_atom(atom: &Atom) -> bool {
    PI_TYPES.contains(atom.atom_type.as_str())
}

fn is_aromatic_atom(atom: &Atom) -> bool {
    atom.atom_type.contains(".ar")
}

/// Folds an angle between two plane normals into `[0, 90]`.
pub(super) fn fold_normal_angle(angle: f64) -> f64 {
    if angle <= 90.0 { angle } else { 180.0 - angle }
}

/// Face-to-face or offset stacking of two pi systems.
pub(super) fn pi_stacking(ctx: &DetectionContext, pair: &AtomPair) -> Result<Option<Finding>, EngineError> {
    if !is_pi_atom(pair.a1) || !is_pi_atom(pair.a2) {
        return Ok(None);
    }
    let params = &ctx.thresholds.pi_stacking;
    if !within_vdw(ctx, pair, params.buffer)? {
        return Ok(None);
    }

    let structure = ctx.structure;
    let rings1 = rings_through(structure, pair.id1, is_pi_atom, RingSize::Any);
    let rings2 = rings_through(structure, pair.id2, is_pi_atom, RingSize::Any);

    for ring1 in &rings1 {
        let Some((ar1, ar2)) = ring1.plane_neighbors(structure, pair.id1) else {
            continue;
        };
        let Some(foot) = project_onto_plane(&ar1.position, pair.p1(), &ar2.position, pair.p2()) else {
            continue;
        };
        let Some(offset_angle) = angle_at(pair.p2(), pair.p1(), &foot) else {
            continue;
        };
        if offset_angle < params.offset_angle_min {
            continue;
        }
        let normal1 = normal(&ar1.position, pair.p1(), &ar2.position);

        for ring2 in &rings2 {
            let Some((br1, br2)) = ring2.plane_neighbors(structure, pair.id2) else {
                continue;
            };
            let normal2 = normal(&br1.position, pair.p2(), &br2.position);
            let Some(normal_angle) = angle_between(&normal1, &normal2) else {
                continue;
            };
            if fold_normal_angle(normal_angle) <= params.normal_angle_max {
                return Ok(contact("PI_PI", &[pair.distance, normal_angle, offset_angle]));
            }
        }
    }
    Ok(None)
}

/// X-H···pi with the hydrogen projected over the ring of the acceptor atom.
pub(super) fn xh_pi(ctx: &DetectionContext, pair: &AtomPair) -> Result<Option<Finding>, EngineError> {
    if !XH_PI_DONOR_TYPES.contains(pair.type1()) || !is_pi_atom(pair.a2) {
        return Ok(None);
    }
    let el1 = pair.el1();
    let params = ctx
        .thresholds
        .xh_pi(el1)
        .ok_or_else(|| missing_threshold(format!("{el1}H_PI")))?;
    if !within_vdw(ctx, pair, params.buffer)? {
        return Ok(None);
    }
    if ctx.structure.neighbors(pair.id2).len() < 2 {
        return Ok(None);
    }

    let d1 = pair.distance;
    let donor_subs = ctx.substituents(pair.id1);
    let sulfur_donor = el1 == "S";
    let donor = product(&donor_subs, &donor_subs)
        .filter(|(x, h)| h.is_hydrogen() && !(sulfur_donor && x.is_hydrogen()))
        .find_map(|(x, h)| {
            let d2 = dist(x.position(), pair.p2());
            let d3 = dist(h.position(), pair.p2());
            let angle2 = angle_at(pair.p1(), h.position(), pair.p2())?;
            let close = d3 <= params.near_distance
                || (params.near_distance < d3 && d3 <= params.far_distance && angle2 >= params.hydrogen_angle_min);
            (d3 <= d1 && d1 <= d2 && close).then_some((h, d2, d3, angle2))
        });
    let Some((hydrogen, d2, d3, angle2)) = donor else {
        return Ok(None);
    };

    let rings = rings_through(ctx.structure, pair.id2, is_pi_atom, RingSize::FiveOrSix);
    for ring in &rings {
        let Some((nb0, nb1)) = ring.plane_neighbors(ctx.structure, pair.id2) else {
            continue;
        };
        let d4 = dist(&ring.centroid, pair.p2());
        let Some(foot) = project_onto_plane(&nb0.position, pair.p2(), &nb1.position, pair.p1()) else {
            continue;
        };
        let dnrm = dist(&foot, &ring.centroid);
        let Some(angle1) = angle_at(&foot, pair.p1(), hydrogen.position()) else {
            continue;
        };
        if dnrm <= d4 * params.ring_coefficient && angle1 <= params.projection_angle_max {
            return Ok(contact(
                format!("{el1}H_PI"),
                &[d1, d2, d3, d4, d4 * params.ring_coefficient, dnrm, angle1, angle2],
            ));
        }
    }
    Ok(None)
}

/// X-H···pi anchored on the aromatic atom: the donor hydrogen must point into
/// the ring face, with extra checks when the donor sits outside the ring rim.
pub(super) fn legacy_xh_pi(ctx: &DetectionContext, pair: &AtomPair) -> Result<Option<Finding>, EngineError> {
    if !is_aromatic_atom(pair.a1) || !LEGACY_XH_PI_DONOR_TYPES.contains(pair.type2()) {
        return Ok(None);
    }
    let el2 = pair.el2();
    let params = ctx
        .thresholds
        .legacy_xh_pi(el2)
        .ok_or_else(|| missing_threshold(format!("{el2}H_PI")))?;
    if !within_vdw(ctx, pair, params.buffer)? {
        return Ok(None);
    }
    let donor_hydrogens = hydrogens(&ctx.substituents(pair.id2));
    if donor_hydrogens.is_empty() {
        return Ok(None);
    }

    let structure = ctx.structure;
    let residue = pair.a1.residue_number;
    let ring_neighbours: Vec<&Atom> = ctx
        .substituents(pair.id1)
        .into_iter()
        .map(|s| s.atom)
        .filter(|a| a.residue_number == residue && is_aromatic_atom(a))
        .collect();
    let [nb0, nb1, ..] = ring_neighbours.as_slice() else {
        return Ok(None);
    };
    let plane_normal = normal(&nb0.position, pair.p1(), &nb1.position);

    for ring in rings_through(structure, pair.id1, is_aromatic_atom, RingSize::Any) {
        let rim = ring.radius() + params.buffer;
        let Some(p1) = project_onto_plane(&nb0.position, pair.p1(), &nb1.position, pair.p2()) else {
            continue;
        };
        let offset = dist(&ring.centroid, &p1);
        if offset > 2.0 * rim {
            continue;
        }
        let Some(p2) = project_onto_line(&plane_normal, pair.p1(), pair.p2()) else {
            continue;
        };

        for h in &donor_hydrogens {
            let Some(angle1) = angle_at(&p2, pair.p2(), h.position()) else {
                continue;
            };
            if !(params.angle_min..=params.angle_max).contains(&angle1) {
                continue;
            }
            let Some(dihedral1) = dihedral(pair.p1(), &p2, pair.p2(), h.position()) else {
                continue;
            };
            if dihedral1 > params.dihedral_max {
                continue;
            }
            let (mut angle2, mut dihedral2) = (None, None);
            if rim < offset {
                let (Some(a), Some(t)) = (
                    angle_at(pair.p1(), &ring.centroid, pair.p2()),
                    dihedral(&ring.centroid, pair.p1(), &p2, pair.p2()),
                ) else {
                    continue;
                };
                if !(a > 45.0 && t > params.outer_dihedral_min) {
                    continue;
                }
                (angle2, dihedral2) = (Some(a), Some(t));
            }
            return Ok(contact_optional(
                format!("{el2}H_PI"),
                &[Some(pair.distance), Some(angle1), angle2, Some(dihedral1), dihedral2],
            ));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;

    fn two_rings(second_v: [f64; 3]) -> Fixture {
        let (mut atoms, mut bonds) = benzene(1, 1, "L", [0.0, 0.0, 0.0], X, Y);
        let (atoms2, bonds2) = benzene(11, 2, "Pro", [1.0, 0.0, 3.5], X, second_v);
        atoms.extend(atoms2);
        bonds.extend(bonds2);
        Fixture::new(build(atoms, &bonds))
    }

    #[test]
    fn parallel_displaced_rings_stack() {
        let fixture = two_rings(Y);
        let finding = pi_stacking(&fixture.ctx(), &fixture.pair(1, 11)).unwrap();
        let Some(Finding::Contact(hit)) = finding else {
            panic!("expected a stacking contact");
        };
        assert_eq!(hit.label, "PI_PI");
        assert!(hit.items.get(1).unwrap().abs() < 1e-3);
        assert!(hit.items.get(2).unwrap() >= 60.0);
    }

    #[test]
    fn perpendicular_rings_do_not_stack() {
        let fixture = two_rings(Z);
        assert!(pi_stacking(&fixture.ctx(), &fixture.pair(1, 11)).unwrap().is_none());
    }

    #[test]
    fn normal_angle_folds_into_right_angle() {
        assert_eq!(fold_normal_angle(30.0), 30.0);
        assert_eq!(fold_normal_angle(170.0), 10.0);
    }

    fn donor_over_ring(carbon: [f64; 3], hydrogen: [f64; 3], back: [f64; 3]) -> Fixture {
        let (mut atoms, mut bonds) = benzene(1, 2, "Pro", [0.0, 0.0, 0.0], X, Y);
        atoms.push(atom(20, "C.3", 1, "L", carbon));
        atoms.push(atom(21, "H", 1, "L", hydrogen));
        atoms.push(atom(22, "C.3", 1, "L", back));
        bonds.extend([(20, 21), (20, 22)]);
        Fixture::new(build(atoms, &bonds))
    }

    #[test]
    fn ch_pi_over_ring_face() {
        let fixture = donor_over_ring([0.3, 0.0, 3.3], [0.3, 0.0, 2.2], [0.3, 0.0, 4.8]);
        let finding = xh_pi(&fixture.ctx(), &fixture.pair(20, 1)).unwrap();
        let Some(Finding::Contact(hit)) = finding else {
            panic!("expected an X-H···pi contact");
        };
        assert_eq!(hit.label, "CH_PI");
        // Projection of the donor lands 0.3 from the centroid.
        assert!((hit.items.get(5).unwrap() - 0.3).abs() < 1e-9);
        assert!(hit.items.get(6).unwrap() < 1e-6);
    }

    #[test]
    fn ch_pi_outside_ring_footprint_fails() {
        let fixture = donor_over_ring([3.0, 0.0, 2.5], [2.6, 0.0, 1.5], [3.4, 0.0, 3.5]);
        assert!(xh_pi(&fixture.ctx(), &fixture.pair(20, 1)).unwrap().is_none());
    }

    #[test]
    fn legacy_definition_anchors_on_the_ring_atom() {
        let (mut atoms, mut bonds) = benzene(1, 2, "Pro", [0.0, 0.0, 0.0], X, Y);
        atoms.push(atom(20, "C.3", 1, "L", [0.5, 0.0, 3.5]));
        atoms.push(atom(21, "H", 1, "L", [0.2, 0.0, 2.45]));
        bonds.push((20, 21));
        let fixture = Fixture::legacy(build(atoms, &bonds), &[("CH_PI", "1.0 100 180 30 60")]);
        let ctx = fixture.ctx();

        let finding = legacy_xh_pi(&ctx, &fixture.pair(1, 20)).unwrap();
        let Some(Finding::Contact(hit)) = finding else {
            panic!("expected a legacy X-H···pi contact");
        };
        assert_eq!(hit.label, "CH_PI");
        assert!(hit.items.get(2).is_none());
        assert!(hit.items.get(3).unwrap() < 1e-6);

        // The geometric detector has no thresholds under the legacy layout.
        assert!(xh_pi(&ctx, &fixture.pair(20, 1)).is_err());
    }
}
