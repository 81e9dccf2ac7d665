use super::config::DetectionConfig;
use super::error::EngineError;
use super::progress::ProgressReporter;
use crate::core::models::atom::Atom;
use crate::core::models::ids::AtomId;
use crate::core::models::structure::Structure;
use crate::core::params::priority::PriorityTable;
use crate::core::params::thresholds::ThresholdTable;
use crate::core::params::vdw::VdwRadii;
use nalgebra::Point3;

/// Everything a detector or post-processor may read while one frame is analysed.
#[derive(Clone, Copy)]
pub struct DetectionContext<'a> {
    pub structure: &'a Structure,
    pub thresholds: &'a ThresholdTable,
    pub vdw: &'a VdwRadii,
    pub priorities: Option<&'a PriorityTable>,
    pub config: &'a DetectionConfig,
    pub reporter: &'a ProgressReporter<'a>,
}

/// A covalently bonded neighbour of an anchor atom.
#[derive(Debug, Clone, Copy)]
pub struct Substituent<'a> {
    pub id: AtomId,
    pub atom: &'a Atom,
}

impl<'a> Substituent<'a> {
    pub fn position(&self) -> &'a Point3<f64> {
        &self.atom.position
    }

    pub fn is_hydrogen(&self) -> bool {
        self.atom.is_hydrogen()
    }

    pub fn is_heavy(&self) -> bool {
        self.atom.is_heavy()
    }
}

impl<'a> DetectionContext<'a> {
    pub fn new(
        structure: &'a Structure,
        thresholds: &'a ThresholdTable,
        vdw: &'a VdwRadii,
        priorities: Option<&'a PriorityTable>,
        config: &'a DetectionConfig,
        reporter: &'a ProgressReporter<'a>,
    ) -> Self {
        Self {
            structure,
            thresholds,
            vdw,
            priorities,
            config,
            reporter,
        }
    }

    /// Checks that the loaded tables can serve the requested run.
    pub fn validate(&self) -> Result<(), EngineError> {
        let loaded = self.thresholds.xh_pi_definition();
        if loaded != self.config.xh_pi {
            return Err(EngineError::XhPiDefinitionMismatch {
                loaded,
                requested: self.config.xh_pi,
            });
        }
        if self.config.deduplicate && self.priorities.is_none() {
            return Err(EngineError::MissingPriorityTable);
        }
        Ok(())
    }

    pub fn atom(&self, id: AtomId) -> Result<&'a Atom, EngineError> {
        self.structure
            .atom(id)
            .ok_or_else(|| EngineError::Internal(format!("stale atom handle {id:?}")))
    }

    pub fn atom_id(&self, serial: usize) -> Result<AtomId, EngineError> {
        self.structure
            .find_atom_by_serial(serial)
            .ok_or(EngineError::AtomNotFound(serial))
    }

    /// Sum of the VdW radii of the two atoms' elements.
    pub fn vdw_sum(&self, a: &Atom, b: &Atom) -> Result<f64, EngineError> {
        let radius = |atom: &Atom| {
            self.vdw
                .radius(atom.element())
                .ok_or_else(|| EngineError::MissingVdwRadius {
                    element: atom.element().to_string(),
                })
        };
        Ok(radius(a)? + radius(b)?)
    }

    /// Bonded neighbours of `id`, in ascending serial order.
    pub fn substituents(&self, id: AtomId) -> Vec<Substituent<'a>> {
        self.structure
            .neighbors(id)
            .iter()
            .filter_map(|&nid| self.structure.atom(nid).map(|atom| Substituent { id: nid, atom }))
            .collect()
    }
}

pub(crate) fn heavy<'a>(subs: &[Substituent<'a>]) -> Vec<Substituent<'a>> {
    subs.iter().copied().filter(Substituent::is_heavy).collect()
}

pub(crate) fn hydrogens<'a>(subs: &[Substituent<'a>]) -> Vec<Substituent<'a>> {
    subs.iter().copied().filter(Substituent::is_hydrogen).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::topology::BondOrder;
    use crate::core::models::structure::StructureBuilder;
    use crate::core::params::thresholds::{XhPiDefinition, sample_table};
    use crate::core::params::vdw::sample_radii;
    use crate::engine::config::{DetectionConfigBuilder, RunMode};

    fn structure() -> Structure {
        let mut builder = StructureBuilder::new();
        builder
            .add_atom(Atom::new(7, "O1", "O.3", Point3::new(0.0, 0.0, 0.0)))
            .add_atom(Atom::new(3, "H1", "H", Point3::new(0.96, 0.0, 0.0)))
            .add_atom(Atom::new(5, "C1", "C.3", Point3::new(-0.5, 1.3, 0.0)))
            .add_atom(Atom::new(9, "X", "Xx", Point3::new(5.0, 0.0, 0.0)))
            .add_bond(7, 5, BondOrder::Single)
            .add_bond(7, 3, BondOrder::Single);
        builder.build().unwrap()
    }

    #[test]
    fn substituents_are_sorted_by_serial_and_split_by_element() {
        let structure = structure();
        let thresholds = sample_table(&[], XhPiDefinition::Geometric);
        let vdw = sample_radii();
        let config = DetectionConfigBuilder::new()
            .mode(RunMode::Ligand)
            .deduplicate(false)
            .build()
            .unwrap();
        let reporter = ProgressReporter::new();
        let ctx = DetectionContext::new(&structure, &thresholds, &vdw, None, &config, &reporter);

        let oxygen = ctx.atom_id(7).unwrap();
        let subs = ctx.substituents(oxygen);
        let serials: Vec<_> = subs.iter().map(|s| s.atom.serial).collect();
        assert_eq!(serials, vec![3, 5]);
        assert_eq!(heavy(&subs).len(), 1);
        assert_eq!(hydrogens(&subs)[0].atom.serial, 3);
        assert!(ctx.validate().is_ok());
    }

    #[test]
    fn vdw_sum_reports_unknown_element() {
        let structure = structure();
        let thresholds = sample_table(&[], XhPiDefinition::Geometric);
        let vdw = sample_radii();
        let config = DetectionConfigBuilder::new()
            .mode(RunMode::Ligand)
            .build()
            .unwrap();
        let reporter = ProgressReporter::new();
        let ctx = DetectionContext::new(&structure, &thresholds, &vdw, None, &config, &reporter);

        let o = ctx.atom(ctx.atom_id(7).unwrap()).unwrap();
        let x = ctx.atom(ctx.atom_id(9).unwrap()).unwrap();
        assert!((ctx.vdw_sum(o, o).unwrap() - 3.04).abs() < 1e-9);
        assert!(matches!(
            ctx.vdw_sum(o, x),
            Err(EngineError::MissingVdwRadius { element }) if element == "Xx"
        ));
        assert!(matches!(ctx.validate(), Err(EngineError::MissingPriorityTable)));
        assert!(matches!(ctx.atom_id(42), Err(EngineError::AtomNotFound(42))));
    }
}
