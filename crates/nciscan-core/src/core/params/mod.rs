//! # Parameter Tables Module
//!
//! Read-only configuration shared by every frame of a run.
//!
//! ## Overview
//!
//! Three TOML tables drive detection:
//!
//! - [`thresholds`] - Per-family distance, angle and charge thresholds, validated
//!   into typed structs at load time
//! - [`vdw`] - Van der Waals radius per element symbol
//! - [`priority`] - Optional integer priorities used to resolve overlapping
//!   families on the same atom pair
//!
//! All loaders report failures through [`ParamLoadError`], which always names
//! the offending file or key.

use thiserror::Error;

pub mod priority;
pub mod thresholds;
pub mod vdw;

#[derive(Debug, Error)]
pub enum ParamLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("Missing threshold entry '{key}'")]
    MissingThreshold { key: String },
    #[error("Malformed threshold entry '{key}': {reason}")]
    MalformedThreshold { key: String, reason: String },
    #[error("Specify an integer for '{key}' in the priority table")]
    NonIntegerPriority { key: String },
    #[error("Malformed priority key '{key}': expected '<El1>_<El2>_vdW'")]
    MalformedPriorityKey { key: String },
}

pub(crate) fn read_file(path: &std::path::Path) -> Result<String, ParamLoadError> {
    std::fs::read_to_string(path).map_err(|e| ParamLoadError::Io {
        path: path.to_string_lossy().to_string(),
        source: e,
    })
}
