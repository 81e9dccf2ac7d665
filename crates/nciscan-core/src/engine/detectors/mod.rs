//! # Detectors Module
//!
//! One geometric rule per interaction family.
//!
//! ## Overview
//!
//! A detector receives one ordered atom pair and decides whether the two atoms
//! form an interaction of its family. Every detector runs the same cascade:
//! a type gate on both anchors, a distance gate (usually the VdW sum plus a
//! family buffer), a topology gate on the covalent substituents, and finally
//! geometric tests over substituent combinations. The first combination that
//! passes produces a [`Finding`]; the detector never looks for a better one.
//!
//! Substituents are always visited in ascending serial order, so first-success
//! selection is reproducible for a given structure.
//!
//! ## Families
//!
//! - **Hydrogen bonds** ([`hbond`]) and their charged counterparts ([`electrostatic`])
//! - **Weak hydrogen bonds** ([`weak_hbond`]): C-H···N/S/O and S-H···N/O
//! - **Contacts** ([`contact`]): van der Waals, metal coordination and ions
//! - **Aromatic** ([`aromatic`]): pi stacking and X-H···pi in both definitions
//! - **Polar** ([`polar`]): dipole pairs and orthogonal multipoles
//! - **Halogen** ([`halogen`]): halogen bonds, X-H···F, X-H···Hal and Hal···pi
//! - **Sulfur** ([`sulfur`]): N-H···S, O/S-H···S and the chalcogen contacts

mod aromatic;
mod contact;
mod electrostatic;
mod halogen;
mod hbond;
mod polar;
mod sulfur;
mod weak_hbond;

use super::context::{DetectionContext, Substituent};
use super::error::EngineError;
use crate::core::models::atom::Atom;
use crate::core::models::ids::AtomId;
use crate::core::models::interaction::Measurements;
use crate::core::params::thresholds::XhPiDefinition;
use crate::core::utils::geometry;
use itertools::Itertools;
use nalgebra::Point3;

/// One ordered candidate pair, with both anchors resolved.
#[derive(Debug, Clone, Copy)]
pub struct AtomPair<'a> {
    pub id1: AtomId,
    pub a1: &'a Atom,
    pub id2: AtomId,
    pub a2: &'a Atom,
    /// Anchor-anchor distance.
    pub distance: f64,
}

impl<'a> AtomPair<'a> {
    pub fn new(ctx: &DetectionContext<'a>, id1: AtomId, id2: AtomId) -> Result<Self, EngineError> {
        let a1 = ctx.atom(id1)?;
        let a2 = ctx.atom(id2)?;
        Ok(Self {
            id1,
            a1,
            id2,
            a2,
            distance: geometry::distance(&a1.position, &a2.position),
        })
    }

    pub fn reversed(&self) -> Self {
        Self {
            id1: self.id2,
            a1: self.a2,
            id2: self.id1,
            a2: self.a1,
            distance: self.distance,
        }
    }

    pub fn p1(&self) -> &'a Point3<f64> {
        &self.a1.position
    }

    pub fn p2(&self) -> &'a Point3<f64> {
        &self.a2.position
    }

    pub fn type1(&self) -> &'a str {
        &self.a1.atom_type
    }

    pub fn type2(&self) -> &'a str {
        &self.a2.atom_type
    }

    pub fn el1(&self) -> &'a str {
        self.a1.element()
    }

    pub fn el2(&self) -> &'a str {
        self.a2.element()
    }
}

/// A positive detector outcome for one ordered pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub label: String,
    pub items: Measurements,
}

/// One leg of a detected dipole pair.
#[derive(Debug, Clone, PartialEq)]
pub struct DipoleLeg {
    pub first: AtomId,
    pub second: AtomId,
    pub items: Measurements,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Finding {
    /// A record between the two anchors of the evaluated pair.
    Contact(Hit),
    /// Two records sharing one label: the anchor pair and the pair of their
    /// bonded partners. Both carry the molecule classes of the anchors.
    Dipole { label: String, legs: [DipoleLeg; 2] },
}

impl Finding {
    pub fn label(&self) -> &str {
        match self {
            Self::Contact(hit) => &hit.label,
            Self::Dipole { label, .. } => label,
        }
    }
}

pub type DetectorFn = fn(&DetectionContext, &AtomPair) -> Result<Option<Finding>, EngineError>;

/// A named entry of the detector catalogue.
#[derive(Clone, Copy)]
pub struct Detector {
    pub name: &'static str,
    pub run: DetectorFn,
}

impl std::fmt::Debug for Detector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Detector").field("name", &self.name).finish()
    }
}

/// Every detector, in evaluation order.
pub fn catalogue(xh_pi: XhPiDefinition) -> Vec<Detector> {
    let xh_pi_detector = match xh_pi {
        XhPiDefinition::Geometric => Detector {
            name: "XH_PI",
            run: aromatic::xh_pi,
        },
        XhPiDefinition::Legacy => Detector {
            name: "XH_PI (legacy)",
            run: aromatic::legacy_xh_pi,
        },
    };
    vec![
        Detector { name: "HB_NH_(N,O)", run: hbond::nh_acceptor },
        Detector { name: "HB_NH_OH", run: hbond::nh_hydroxyl },
        Detector { name: "HB_OH_(N,O)", run: hbond::oh_acceptor },
        Detector { name: "HB_OH_OH", run: hbond::oh_hydroxyl },
        Detector { name: "CH_X", run: weak_hbond::ch_hetero },
        Detector { name: "CH_O", run: weak_hbond::ch_oxygen },
        Detector { name: "SH_(N,O)", run: weak_hbond::sh_acceptor },
        Detector { name: "Elec_(NH,OH)_(N,O)", run: electrostatic::acceptor },
        Detector { name: "Elec_(N,O)H_OH", run: electrostatic::hydroxyl },
        Detector { name: "vdW", run: contact::van_der_waals },
        Detector { name: "PI_PI", run: aromatic::pi_stacking },
        Detector { name: "Dipo", run: polar::dipole },
        Detector { name: "OMulPol", run: polar::orthogonal_multipole },
        xh_pi_detector,
        Detector { name: "Hal_(X)", run: halogen::halogen_bond },
        Detector { name: "XH_F", run: halogen::xh_fluorine },
        Detector { name: "XH_Hal", run: halogen::xh_halogen },
        Detector { name: "Hal_PI", run: halogen::halogen_pi },
        Detector { name: "NH_S", run: sulfur::nh_sulfur },
        Detector { name: "(O,S)H_S", run: sulfur::xh_sulfur },
        Detector { name: "S_O", run: sulfur::sulfur_oxygen },
        Detector { name: "S_N", run: sulfur::sulfur_nitrogen },
        Detector { name: "S_S", run: sulfur::sulfur_sulfur },
        Detector { name: "S_F", run: sulfur::sulfur_fluorine },
        Detector { name: "S_PI", run: sulfur::sulfur_pi_divalent },
        Detector { name: "S_PI (terminal)", run: sulfur::sulfur_pi_terminal },
        Detector { name: "Metal", run: contact::metal },
        Detector { name: "Ion", run: contact::ion },
    ]
}

// --- Shared helpers ---

fn contact(label: impl Into<String>, values: &[f64]) -> Option<Finding> {
    Some(Finding::Contact(Hit {
        label: label.into(),
        items: Measurements::from_values(values),
    }))
}

fn contact_optional(label: impl Into<String>, values: &[Option<f64>]) -> Option<Finding> {
    Some(Finding::Contact(Hit {
        label: label.into(),
        items: Measurements::from_optional(values),
    }))
}

fn missing_threshold(key: impl Into<String>) -> EngineError {
    EngineError::MissingThreshold { key: key.into() }
}

/// `d <= buffer + vdw(a1, a2)`.
fn within_vdw(ctx: &DetectionContext, pair: &AtomPair, buffer: f64) -> Result<bool, EngineError> {
    Ok(pair.distance <= buffer + ctx.vdw_sum(pair.a1, pair.a2)?)
}

fn dist(a: &Point3<f64>, b: &Point3<f64>) -> f64 {
    geometry::distance(a, b)
}

/// Ordered pairs of distinct substituents.
fn product<'s, 'a>(
    first: &'s [Substituent<'a>],
    second: &'s [Substituent<'a>],
) -> impl Iterator<Item = (Substituent<'a>, Substituent<'a>)> + 's {
    first.iter().flat_map(move |x| {
        second
            .iter()
            .filter(move |y| y.id != x.id)
            .map(move |y| (*x, *y))
    })
}

/// All substituents with the heavy ones first, each group in serial order.
fn heavy_first<'a>(subs: &[Substituent<'a>]) -> Vec<Substituent<'a>> {
    let mut ordered: Vec<_> = subs.iter().copied().filter(Substituent::is_heavy).collect();
    ordered.extend(subs.iter().copied().filter(Substituent::is_hydrogen));
    ordered
}

/// Unordered substituent pairs in serial order, each with a heavy member first
/// whenever the pair has one.
fn combinations_heavy_first<'a>(subs: &[Substituent<'a>]) -> Vec<(Substituent<'a>, Substituent<'a>)> {
    subs.iter()
        .copied()
        .tuple_combinations()
        .map(|(a, b)| if a.is_hydrogen() && b.is_heavy() { (b, a) } else { (a, b) })
        .collect()
}

/// Ordered (Y, Z) pairs on an acceptor. Y is heavy when any heavy substituent
/// exists and may be hydrogen otherwise; Z is any other substituent.
fn acceptor_pairs<'a>(subs: &[Substituent<'a>]) -> Vec<(Substituent<'a>, Substituent<'a>)> {
    let has_heavy = subs.iter().any(Substituent::is_heavy);
    product(subs, subs)
        .filter(|(y, _)| y.is_heavy() || !has_heavy)
        .collect()
}

#[cfg(test)]
pub(crate) mod testing {
    //! Small structure builders shared by the detector tests.

    use crate::core::models::atom::Atom;
    use crate::core::models::structure::{Structure, StructureBuilder};
    use crate::core::models::topology::BondOrder;
    use crate::core::params::priority::PriorityTable;
    use crate::core::params::thresholds::{SAMPLE_THRESHOLDS, ThresholdTable, XhPiDefinition, sample_table};
    use crate::core::params::vdw::{VdwRadii, sample_radii};
    use crate::engine::config::{DetectionConfig, DetectionConfigBuilder, RunMode};
    use crate::engine::context::DetectionContext;
    use crate::engine::detectors::AtomPair;
    use crate::engine::progress::ProgressReporter;
    use nalgebra::Point3;

    pub struct Fixture {
        pub structure: Structure,
        pub thresholds: ThresholdTable,
        pub vdw: VdwRadii,
        pub priorities: PriorityTable,
        pub config: DetectionConfig,
        pub reporter: ProgressReporter<'static>,
    }

    impl Fixture {
        pub fn new(structure: Structure) -> Self {
            Self::with_overrides(structure, &[])
        }

        pub fn with_overrides(structure: Structure, overrides: &[(&str, &str)]) -> Self {
            Self {
                structure,
                thresholds: sample_table(overrides, XhPiDefinition::Geometric),
                vdw: sample_radii(),
                priorities: PriorityTable::default(),
                config: DetectionConfigBuilder::new()
                    .mode(RunMode::Ligand)
                    .build()
                    .unwrap(),
                reporter: ProgressReporter::new(),
            }
        }

        pub fn without_threshold(structure: Structure, key: &str) -> Self {
            let mut fixture = Self::new(structure);
            let mut table: toml::Table = toml::from_str(SAMPLE_THRESHOLDS).unwrap();
            table.remove(key);
            fixture.thresholds = ThresholdTable::from_table(&table, XhPiDefinition::Geometric).unwrap();
            fixture
        }

        pub fn legacy(structure: Structure, overrides: &[(&str, &str)]) -> Self {
            let mut fixture = Self::with_overrides(structure, &[]);
            fixture.thresholds = sample_table(overrides, XhPiDefinition::Legacy);
            fixture.config.xh_pi = XhPiDefinition::Legacy;
            fixture
        }

        pub fn ctx(&self) -> DetectionContext<'_> {
            DetectionContext::new(
                &self.structure,
                &self.thresholds,
                &self.vdw,
                Some(&self.priorities),
                &self.config,
                &self.reporter,
            )
        }

        pub fn pair(&self, serial1: usize, serial2: usize) -> AtomPair<'_> {
            let ctx = self.ctx();
            let id1 = self.structure.find_atom_by_serial(serial1).unwrap();
            let id2 = self.structure.find_atom_by_serial(serial2).unwrap();
            AtomPair::new(&ctx, id1, id2).unwrap()
        }
    }

    /// Builds atoms in residue `residue` with the given class tag.
    pub fn atom(serial: usize, atom_type: &str, residue: isize, class: &str, p: [f64; 3]) -> Atom {
        let mut a = Atom::new(serial, atom_type, atom_type, Point3::new(p[0], p[1], p[2]));
        a.residue_number = residue;
        a.residue_name = format!("R{residue}");
        a.molecule_class = class.parse().ok();
        a
    }

    pub fn charged(mut a: Atom, charge: f64) -> Atom {
        a.partial_charge = charge;
        a
    }

    pub const X: [f64; 3] = [1.0, 0.0, 0.0];
    pub const Y: [f64; 3] = [0.0, 1.0, 0.0];
    pub const Z: [f64; 3] = [0.0, 0.0, 1.0];

    /// Six aromatic carbons around `center`, in the plane spanned by `u` and `v`.
    /// Serial `first` is the vertex at `center + 1.4 u`.
    pub fn benzene(
        first: usize,
        residue: isize,
        class: &str,
        center: [f64; 3],
        u: [f64; 3],
        v: [f64; 3],
    ) -> (Vec<Atom>, Vec<(usize, usize)>) {
        let mut atoms = Vec::new();
        let mut bonds = Vec::new();
        for k in 0..6 {
            let t = (k as f64) * std::f64::consts::PI / 3.0;
            let (c, s) = (1.4 * t.cos(), 1.4 * t.sin());
            let p = [
                center[0] + c * u[0] + s * v[0],
                center[1] + c * u[1] + s * v[1],
                center[2] + c * u[2] + s * v[2],
            ];
            atoms.push(atom(first + k, "C.ar", residue, class, p));
            bonds.push((first + k, first + (k + 1) % 6));
        }
        (atoms, bonds)
    }

    pub fn build(atoms: Vec<Atom>, bonds: &[(usize, usize)]) -> Structure {
        let mut builder = StructureBuilder::new();
        for a in atoms {
            builder.add_atom(a);
        }
        for &(a, b) in bonds {
            builder.add_bond(a, b, BondOrder::Single);
        }
        builder.build().unwrap()
    }
}
