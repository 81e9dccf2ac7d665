use clap::{Args, Parser, Subcommand, ValueEnum};
use nciscan::engine::config::RunMode;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Tony Kan, Ted Yu, William A. Goddard III, Victor Wai Tak Kam",
    version,
    about = "NCIScan CLI - Detects and classifies non-covalent interactions in 3D molecular structures and trajectories.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads used to analyse trajectory frames.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Detect non-covalent interactions in a structure or a directory of trajectory frames.
    Analyze(AnalyzeArgs),
}

/// Which molecule classes are analysed against which partners.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeArg {
    /// Ligand atoms against protein and solvent.
    Ligand,
    /// Mutation-site atoms against every classified atom.
    Mutant,
    /// Peptide, ligand and protein atoms in a membrane or solvent medium.
    Medium,
}

impl From<ModeArg> for RunMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Ligand => RunMode::Ligand,
            ModeArg::Mutant => RunMode::Mutant,
            ModeArg::Medium => RunMode::Medium,
        }
    }
}

/// Arguments for the `analyze` subcommand.
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    // --- Core Arguments ---
    /// Path to a Mol2 structure, or a directory of `frame*.mol2` files.
    #[arg(required = true, value_name = "STRUCTURE")]
    pub structure: PathBuf,

    /// Which molecule classes are analysed. Overrides `mode` from the config file.
    #[arg(short, long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Output prefix. Writes `<PREFIX>.csv`, or `<frame>_<PREFIX>.csv` per trajectory frame.
    #[arg(short, long, value_name = "PREFIX")]
    pub output: Option<PathBuf>,

    /// Path to a run configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    // --- Parameter Tables ---
    /// Interaction threshold table (TOML).
    #[arg(long, value_name = "PATH")]
    pub thresholds: Option<PathBuf>,

    /// Van der Waals radius table (TOML).
    #[arg(long, value_name = "PATH")]
    pub vdw: Option<PathBuf>,

    /// Molecule-class selection (TOML).
    #[arg(long, value_name = "PATH")]
    pub selection: Option<PathBuf>,

    /// Family priority table (TOML). Required unless duplicates are kept.
    #[arg(long, value_name = "PATH")]
    pub priority: Option<PathBuf>,

    // --- Post-processing Overrides ---
    /// Keep records between atoms within three bonds of each other.
    #[arg(long = "keep-13-14")]
    pub keep_13_14: bool,

    /// Keep every family matched on the same atom pair instead of resolving by priority.
    #[arg(long)]
    pub keep_duplicates: bool,

    /// Disable detection of solvent-mediated bridges.
    #[arg(long)]
    pub no_mediate: bool,

    /// Only keep bridges whose two solvent atoms are fewer than N bonds apart.
    #[arg(long, value_name = "N")]
    pub max_bridge_path: Option<usize>,

    /// Use the legacy ring-neighbour definition of the X-H...pi family.
    #[arg(long)]
    pub legacy_xh_pi: bool,
}
