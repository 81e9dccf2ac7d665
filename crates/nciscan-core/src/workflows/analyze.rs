use crate::core::io::mol2::{Mol2Error, Mol2File};
use crate::core::io::selection::MoleculeSelection;
use crate::core::io::traits::MolecularFile;
use crate::core::models::structure::Structure;
use crate::core::params::priority::PriorityTable;
use crate::core::params::thresholds::ThresholdTable;
use crate::core::params::vdw::VdwRadii;
use crate::engine::config::DetectionConfig;
use crate::engine::context::DetectionContext;
use crate::engine::error::EngineError;
use crate::engine::progress::ProgressReporter;
use crate::engine::table::InteractionTable;
use crate::engine::tasks;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, instrument};

/// Read-only parameter tables shared by every frame of a run.
#[derive(Debug, Clone)]
pub struct AnalysisParams {
    pub thresholds: ThresholdTable,
    pub vdw: VdwRadii,
    pub priorities: Option<PriorityTable>,
    pub selection: MoleculeSelection,
}

impl AnalysisParams {
    pub fn new(
        thresholds: ThresholdTable,
        vdw: VdwRadii,
        priorities: Option<PriorityTable>,
        selection: MoleculeSelection,
    ) -> Self {
        Self {
            thresholds,
            vdw,
            priorities,
            selection,
        }
    }
}

/// Why a single structure file produced no table.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("Failed to read structure '{path}': {source}")]
    Parse { path: String, source: Mol2Error },
    #[error("Structure '{path}' has no atom matched by the molecule selection")]
    Unclassified { path: String },
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Detects and post-processes every interaction of one classified structure.
///
/// Any error aborts the frame; no partial table is returned.
#[instrument(skip_all, name = "analysis_workflow")]
pub fn run(
    structure: &Structure,
    params: &AnalysisParams,
    config: &DetectionConfig,
    reporter: &ProgressReporter,
) -> Result<InteractionTable, EngineError> {
    // === Phase 0: Validation ===
    let ctx = DetectionContext::new(
        structure,
        &params.thresholds,
        &params.vdw,
        params.priorities.as_ref(),
        config,
        reporter,
    );
    ctx.validate()?;

    // === Phase 1: Detection ===
    let mut table = reporter.phase("Detection", || tasks::detection::run(&ctx))?;

    // === Phase 2: Post-processing ===
    reporter.phase("Post-processing", || {
        if config.exclude_13_14 {
            tasks::exclusion::run(&ctx, &mut table)?;
        }
        if config.deduplicate {
            tasks::deduplication::run(&ctx, &mut table)?;
        }
        if config.mediate {
            if let Some(limit) = config.max_bridge_path {
                tasks::bridge_filter::run(&ctx, &mut table, limit)?;
            }
        }
        Ok::<(), EngineError>(())
    })?;

    info!(records = table.len(), "Analysis complete.");
    Ok(table)
}

/// Reads a Mol2 file, classifies its atoms and analyses it.
pub fn run_file(
    path: &Path,
    params: &AnalysisParams,
    config: &DetectionConfig,
    reporter: &ProgressReporter,
) -> Result<InteractionTable, FrameError> {
    let path_str = path.to_string_lossy().to_string();
    let (mut structure, _) = Mol2File::read_from_path(path).map_err(|source| FrameError::Parse {
        path: path_str.clone(),
        source,
    })?;
    let classified = params.selection.apply(&mut structure);
    debug!(path = %path_str, atoms = structure.len(), classified, "Loaded structure.");
    if classified == 0 {
        return Err(FrameError::Unclassified { path: path_str });
    }
    Ok(run(&structure, params, config, reporter)?)
}
