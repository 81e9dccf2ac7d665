use crate::core::models::atom::Atom;
use crate::core::models::ids::AtomId;
use crate::core::models::structure::Structure;
use crate::core::utils::geometry;
use nalgebra::Point3;
use std::collections::{HashMap, HashSet, VecDeque};

/// Accepted ring sizes for a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingSize {
    Any,
    FiveOrSix,
}

impl RingSize {
    fn accepts(self, len: usize) -> bool {
        match self {
            Self::Any => true,
            Self::FiveOrSix => matches!(len, 5 | 6),
        }
    }
}

/// One basis cycle of the ring-eligible bond graph of a residue.
#[derive(Debug, Clone, PartialEq)]
pub struct Ring {
    /// Members in cycle order.
    pub members: Vec<AtomId>,
    pub positions: Vec<Point3<f64>>,
    pub centroid: Point3<f64>,
}

impl Ring {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, id: AtomId) -> bool {
        self.members.contains(&id)
    }

    /// Ring members covalently bonded to `anchor`, in ascending serial order.
    pub fn neighbors_of<'s>(&self, structure: &'s Structure, anchor: AtomId) -> Vec<&'s Atom> {
        structure
            .neighbors(anchor)
            .iter()
            .filter(|id| self.contains(**id))
            .filter_map(|&id| structure.atom(id))
            .collect()
    }

    /// The first two ring neighbours of `anchor`, which span the ring plane with it.
    pub fn plane_neighbors<'s>(&self, structure: &'s Structure, anchor: AtomId) -> Option<(&'s Atom, &'s Atom)> {
        let neighbors = self.neighbors_of(structure, anchor);
        match neighbors.as_slice() {
            [first, second, ..] => Some((*first, *second)),
            _ => None,
        }
    }

    /// Largest distance from the centroid to a member.
    pub fn radius(&self) -> f64 {
        self.positions
            .iter()
            .map(|p| geometry::distance(p, &self.centroid))
            .fold(0.0, f64::max)
    }
}

/// Basis cycles through `anchor` of the graph formed by the atoms of the anchor's
/// residue that pass `eligible`, joined by their mutual bonds.
///
/// The basis is the set of fundamental cycles of a breadth-first spanning tree.
/// Roots and neighbours are visited in ascending serial order so the basis is
/// reproducible for a given structure.
pub fn rings_through(
    structure: &Structure,
    anchor: AtomId,
    eligible: impl Fn(&Atom) -> bool,
    size: RingSize,
) -> Vec<Ring> {
    let Some(anchor_atom) = structure.atom(anchor) else {
        return Vec::new();
    };
    let mut nodes: Vec<(usize, AtomId)> = structure
        .residue_atoms(anchor_atom.residue_number)
        .iter()
        .filter_map(|&id| structure.atom(id).map(|atom| (id, atom)))
        .filter(|(_, atom)| eligible(atom))
        .map(|(id, atom)| (atom.serial, id))
        .collect();
    nodes.sort_unstable_by_key(|&(serial, _)| serial);
    let node_set: HashSet<AtomId> = nodes.iter().map(|&(_, id)| id).collect();
    if !node_set.contains(&anchor) {
        return Vec::new();
    }

    let node_set = &node_set;
    let adjacency = move |id: AtomId| {
        structure
            .neighbors(id)
            .iter()
            .copied()
            .filter(move |n| node_set.contains(n))
    };

    let mut parent: HashMap<AtomId, Option<AtomId>> = HashMap::new();
    let mut depth: HashMap<AtomId, usize> = HashMap::new();
    let mut seen_edges: HashSet<(AtomId, AtomId)> = HashSet::new();
    let mut cycles = Vec::new();

    for &(_, root) in &nodes {
        if parent.contains_key(&root) {
            continue;
        }
        parent.insert(root, None);
        depth.insert(root, 0);
        let mut queue = VecDeque::from([root]);
        while let Some(current) = queue.pop_front() {
            for next in adjacency(current) {
                let edge = ordered_edge(current, next);
                if !seen_edges.insert(edge) {
                    continue;
                }
                if parent.contains_key(&next) {
                    cycles.push(close_cycle(current, next, &parent, &depth));
                } else {
                    parent.insert(next, Some(current));
                    depth.insert(next, depth[&current] + 1);
                    queue.push_back(next);
                }
            }
        }
    }

    cycles
        .into_iter()
        .filter(|members| members.contains(&anchor) && size.accepts(members.len()))
        .filter_map(|members| {
            let positions: Vec<_> = members
                .iter()
                .filter_map(|&id| structure.atom(id).map(|a| a.position))
                .collect();
            let centroid = geometry::centroid(&positions)?;
            Some(Ring {
                members,
                positions,
                centroid,
            })
        })
        .collect()
}

fn ordered_edge(a: AtomId, b: AtomId) -> (AtomId, AtomId) {
    if a < b { (a, b) } else { (b, a) }
}

/// Cycle formed by the non-tree edge `u - v` and the tree paths to their common ancestor.
fn close_cycle(
    u: AtomId,
    v: AtomId,
    parent: &HashMap<AtomId, Option<AtomId>>,
    depth: &HashMap<AtomId, usize>,
) -> Vec<AtomId> {
    let mut left = vec![u];
    let mut right = vec![v];
    let (mut a, mut b) = (u, v);
    while depth.get(&a) > depth.get(&b) {
        match parent.get(&a).copied().flatten() {
            Some(p) => {
                a = p;
                left.push(a);
            }
            None => break,
        }
    }
    while depth.get(&b) > depth.get(&a) {
        match parent.get(&b).copied().flatten() {
            Some(p) => {
                b = p;
                right.push(b);
            }
            None => break,
        }
    }
    while a != b {
        match (parent.get(&a).copied().flatten(), parent.get(&b).copied().flatten()) {
            (Some(pa), Some(pb)) => {
                a = pa;
                b = pb;
                left.push(a);
                right.push(b);
            }
            _ => break,
        }
    }
    // `a == b` is the common ancestor and ends both paths.
    right.pop();
    right.reverse();
    left.extend(right);
    left
}
