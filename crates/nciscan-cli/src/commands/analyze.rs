use crate::cli::AnalyzeArgs;
use crate::config::{AppConfig, PartialRunConfig};
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use nciscan::core::io::selection::MoleculeSelection;
use nciscan::core::io::table::{write_interactions_to_path, write_label_totals_to_path};
use nciscan::core::params::priority::PriorityTable;
use nciscan::core::params::thresholds::ThresholdTable;
use nciscan::core::params::vdw::VdwRadii;
use nciscan::engine::progress::ProgressReporter;
use nciscan::workflows::analyze::{self, AnalysisParams};
use nciscan::workflows::trajectory;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub fn run(args: AnalyzeArgs) -> Result<()> {
    let partial_config = match &args.config {
        Some(path) => PartialRunConfig::from_file(path)?,
        None => PartialRunConfig::default(),
    };
    info!("Merging configuration from file and CLI arguments...");
    let config = partial_config.merge_with_cli(&args)?;

    let params = load_params(&config)?;

    let frames = trajectory::discover_frames(&config.structure)?;
    if frames.is_empty() {
        return Err(CliError::Argument(format!(
            "No frame*.mol2 files found in {:?}",
            config.structure
        )));
    }

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    if config.structure.is_dir() {
        run_trajectory(&config, &params, &frames, &reporter)
    } else {
        run_single(&config, &params, &reporter)
    }
}

fn load_params(config: &AppConfig) -> Result<AnalysisParams> {
    info!("Loading parameter tables...");
    let thresholds = ThresholdTable::load(&config.thresholds_path, config.detection.xh_pi)?;
    let vdw = VdwRadii::load(&config.vdw_path)?;
    let priorities = config
        .priority_path
        .as_deref()
        .map(PriorityTable::load)
        .transpose()?;
    let selection = MoleculeSelection::load(&config.selection_path)?;
    Ok(AnalysisParams::new(thresholds, vdw, priorities, selection))
}

fn run_single(config: &AppConfig, params: &AnalysisParams, reporter: &ProgressReporter) -> Result<()> {
    println!("Analysing {}...", config.structure.display());
    let table = analyze::run_file(&config.structure, params, &config.detection, reporter)?;

    let output = with_extension(&config.output_prefix);
    write_interactions_to_path(table.records(), &output)?;
    info!(records = table.len(), path = %output.display(), "Wrote interaction table.");

    print_tally(&table.label_counts());
    println!("Wrote {} record(s) to {}", table.len(), output.display());
    Ok(())
}

fn run_trajectory(
    config: &AppConfig,
    params: &AnalysisParams,
    frames: &[PathBuf],
    reporter: &ProgressReporter,
) -> Result<()> {
    println!("Analysing {} frame(s) in {}...", frames.len(), config.structure.display());
    let result = trajectory::run(frames, params, &config.detection, reporter);

    for (frame, table) in result.succeeded() {
        let output = frame_output(&config.output_prefix, &frame.name);
        write_interactions_to_path(table.records(), &output)?;
        info!(frame = %frame.name, records = table.len(), path = %output.display(), "Wrote frame table.");
    }
    for (frame, err) in result.failed() {
        warn!(frame = %frame.name, "Frame failed: {}", err);
        eprintln!("Warning: frame '{}' was skipped: {}", frame.name, err);
    }

    let succeeded = result.succeeded().count();
    if succeeded == 0 {
        return Err(CliError::Other(anyhow::anyhow!(
            "All {} frame(s) failed; no output was written.",
            frames.len()
        )));
    }

    let totals = result.label_totals();
    let summary = summary_output(&config.output_prefix);
    write_label_totals_to_path(&totals, Some(succeeded), &summary)?;

    print_tally(&totals);
    println!(
        "Analysed {}/{} frame(s). Summary written to {}",
        succeeded,
        frames.len(),
        summary.display()
    );
    Ok(())
}

fn print_tally(counts: &BTreeMap<String, usize>) {
    if counts.is_empty() {
        println!("No interactions found.");
        return;
    }
    let width = counts.keys().map(String::len).max().unwrap_or(0);
    for (label, count) in counts {
        println!("  {:<width$}  {}", label, count, width = width);
    }
}

fn with_extension(prefix: &Path) -> PathBuf {
    append(prefix, "", ".csv")
}

fn summary_output(prefix: &Path) -> PathBuf {
    append(prefix, "", "_trajectory.csv")
}

/// `<dir>/<frame>_<name>.csv` for an output prefix `<dir>/<name>`.
fn frame_output(prefix: &Path, frame: &str) -> PathBuf {
    append(prefix, &format!("{frame}_"), ".csv")
}

fn append(prefix: &Path, before: &str, after: &str) -> PathBuf {
    let name = prefix
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    prefix.with_file_name(format!("{before}{name}{after}"))
}
