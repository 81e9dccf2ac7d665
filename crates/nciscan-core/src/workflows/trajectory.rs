use super::analyze::{self, AnalysisParams, FrameError};
use crate::engine::config::DetectionConfig;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::table::InteractionTable;
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// File-name prefixes that mark a Mol2 file in a directory as a trajectory frame.
const FRAME_PREFIXES: [&str; 2] = ["frame", "flame"];
const FRAME_EXTENSION: &str = "mol2";

/// The outcome of one frame. A failed frame keeps its error and no table.
#[derive(Debug)]
pub struct FrameReport {
    pub name: String,
    pub path: PathBuf,
    pub outcome: Result<InteractionTable, FrameError>,
}

#[derive(Debug, Default)]
pub struct TrajectoryResult {
    pub frames: Vec<FrameReport>,
}

impl TrajectoryResult {
    pub fn succeeded(&self) -> impl Iterator<Item = (&FrameReport, &InteractionTable)> {
        self.frames
            .iter()
            .filter_map(|frame| frame.outcome.as_ref().ok().map(|table| (frame, table)))
    }

    pub fn failed(&self) -> impl Iterator<Item = (&FrameReport, &FrameError)> {
        self.frames
            .iter()
            .filter_map(|frame| frame.outcome.as_ref().err().map(|err| (frame, err)))
    }

    /// Record count per label, summed over all successful frames.
    pub fn label_totals(&self) -> BTreeMap<String, usize> {
        let mut totals = BTreeMap::new();
        for (_, table) in self.succeeded() {
            for (label, count) in table.label_counts() {
                *totals.entry(label).or_insert(0) += count;
            }
        }
        totals
    }
}

/// Lists the structure files behind `input`.
///
/// A file is a trajectory of one frame. A directory contributes its
/// `frame*.mol2` and `flame*.mol2` files, sorted by file name.
pub fn discover_frames(input: &Path) -> io::Result<Vec<PathBuf>> {
    if !input.is_dir() {
        return Ok(vec![input.to_path_buf()]);
    }
    let mut frames = Vec::new();
    for entry in std::fs::read_dir(input)? {
        let path = entry?.path();
        if path.is_file() && is_frame_file(&path) {
            frames.push(path);
        }
    }
    frames.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(frames)
}

fn is_frame_file(path: &Path) -> bool {
    let has_extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(FRAME_EXTENSION));
    let has_prefix = path
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| FRAME_PREFIXES.iter().any(|prefix| name.starts_with(prefix)));
    has_extension && has_prefix
}

/// The frame's file stem, used to name its output.
pub fn frame_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

/// Analyses every frame independently against the shared parameter tables.
///
/// A frame that fails is reported and skipped; it never affects the others.
/// Frames are returned in input order regardless of how they were scheduled.
#[instrument(skip_all, name = "trajectory_workflow", fields(frames = frames.len()))]
pub fn run(
    frames: &[PathBuf],
    params: &AnalysisParams,
    config: &DetectionConfig,
    reporter: &ProgressReporter,
) -> TrajectoryResult {
    reporter.report(Progress::PhaseStart { name: "Trajectory" });
    reporter.report(Progress::TaskStart {
        total_steps: frames.len() as u64,
    });

    let analyse = |path: &PathBuf| {
        // Per-frame phases would interleave across workers, so only frame completion is reported.
        let quiet = ProgressReporter::new();
        let name = frame_name(path);
        let outcome = analyze::run_file(path, params, config, &quiet);
        match &outcome {
            Ok(table) => info!(frame = %name, records = table.len(), "Frame analysed."),
            Err(e) => warn!(frame = %name, error = %e, "Frame skipped."),
        }
        reporter.report(Progress::FrameDone {
            name: name.clone(),
            ok: outcome.is_ok(),
        });
        reporter.report(Progress::TaskIncrement);
        FrameReport {
            name,
            path: path.clone(),
            outcome,
        }
    };

    #[cfg(not(feature = "parallel"))]
    let reports: Vec<FrameReport> = frames.iter().map(analyse).collect();

    #[cfg(feature = "parallel")]
    let reports: Vec<FrameReport> = frames.par_iter().map(analyse).collect();

    reporter.report(Progress::TaskFinish);
    reporter.report(Progress::PhaseFinish);

    let result = TrajectoryResult { frames: reports };
    info!(
        succeeded = result.succeeded().count(),
        failed = result.failed().count(),
        "Trajectory complete."
    );
    result
}
