//! # Core Module
//!
//! Stateless building blocks shared by the detection engine and its callers.
//!
//! ## Overview
//!
//! Nothing in this module holds per-run state. Structures are read once and
//! stay immutable, parameter tables are validated at load time, and geometry
//! helpers are pure functions over points.
//!
//! ## Architecture
//!
//! - **Molecular Representation** ([`models`]) - Atoms, bonds, structures and interaction records
//! - **Parameter Tables** ([`params`]) - Thresholds, van der Waals radii and family priorities
//! - **File I/O** ([`io`]) - Tripos Mol2 input, molecule-class selections and CSV output
//! - **Utilities** ([`utils`]) - Geometry primitives and atom-type classification sets

pub mod io;
pub mod models;
pub mod params;
pub mod utils;
