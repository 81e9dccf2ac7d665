use crate::cli::AnalyzeArgs;
use crate::error::{CliError, Result};
use nciscan::core::params::thresholds::XhPiDefinition;
use nciscan::engine::config::{self as core_config, RunMode};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

const DEFAULT_OUTPUT_PREFIX: &str = "interactions";

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialDetectionConfig {
    mediate: Option<bool>,
    exclude_13_14: Option<bool>,
    deduplicate: Option<bool>,
    max_bridge_path: Option<usize>,
    legacy_xh_pi: Option<bool>,
}

/// Run options as written in a config file. Every field may be overridden on the command line.
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PartialRunConfig {
    mode: Option<String>,
    output: Option<PathBuf>,
    thresholds: Option<PathBuf>,
    vdw: Option<PathBuf>,
    selection: Option<PathBuf>,
    priority: Option<PathBuf>,
    detection: Option<PartialDetectionConfig>,
}

/// Fully resolved inputs of one `analyze` invocation.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub structure: PathBuf,
    pub output_prefix: PathBuf,
    pub thresholds_path: PathBuf,
    pub vdw_path: PathBuf,
    pub selection_path: PathBuf,
    pub priority_path: Option<PathBuf>,
    pub detection: core_config::DetectionConfig,
}

impl PartialRunConfig {
    /// Loads a run config. Relative paths inside it are taken relative to the file.
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        if let Some(base) = path.parent() {
            config.rebase(base);
        }
        Ok(config)
    }

    fn rebase(&mut self, base: &Path) {
        for slot in [
            &mut self.output,
            &mut self.thresholds,
            &mut self.vdw,
            &mut self.selection,
            &mut self.priority,
        ] {
            if let Some(path) = slot.as_mut() {
                if path.is_relative() {
                    *path = base.join(&*path);
                }
            }
        }
    }

    pub fn merge_with_cli(self, args: &AnalyzeArgs) -> Result<AppConfig> {
        let detection = self.detection.unwrap_or_default();

        let required = |cli: &Option<PathBuf>, file: Option<PathBuf>, name: &str| -> Result<PathBuf> {
            cli.clone().or(file).ok_or_else(|| {
                CliError::Config(format!(
                    "A value for '{}' is required either in the config file or via --{}.",
                    name, name
                ))
            })
        };
        let thresholds_path = required(&args.thresholds, self.thresholds, "thresholds")?;
        let vdw_path = required(&args.vdw, self.vdw, "vdw")?;
        let selection_path = required(&args.selection, self.selection, "selection")?;
        let priority_path = args.priority.clone().or(self.priority);

        let mode = match (args.mode, self.mode) {
            (Some(mode), _) => RunMode::from(mode),
            (None, Some(name)) => name.parse()?,
            (None, None) => {
                return Err(CliError::Config(
                    "A value for 'mode' is required either in the config file or via --mode."
                        .to_string(),
                ));
            }
        };
        let legacy = args.legacy_xh_pi || detection.legacy_xh_pi.unwrap_or(false);

        let config = core_config::DetectionConfigBuilder::new()
            .mode(mode)
            .mediate(!args.no_mediate && detection.mediate.unwrap_or(true))
            .exclude_13_14(!args.keep_13_14 && detection.exclude_13_14.unwrap_or(true))
            .deduplicate(!args.keep_duplicates && detection.deduplicate.unwrap_or(true))
            .max_bridge_path(args.max_bridge_path.or(detection.max_bridge_path))
            .xh_pi(if legacy {
                XhPiDefinition::Legacy
            } else {
                XhPiDefinition::Geometric
            })
            .build()?;

        Ok(AppConfig {
            structure: args.structure.clone(),
            output_prefix: args
                .output
                .clone()
                .or(self.output)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_PREFIX)),
            thresholds_path,
            vdw_path,
            selection_path,
            priority_path,
            detection: config,
        })
    }
}
