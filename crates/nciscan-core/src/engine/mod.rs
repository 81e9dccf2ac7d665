//! # Engine Module
//!
//! The stateful, per-frame machinery that turns one classified structure into
//! a finished interaction table.
//!
//! ## Overview
//!
//! A frame is processed in two stages. Detection pairs every primary atom of
//! the run mode with its nearby partners and runs the full detector catalogue
//! on both role orders of each pair; an optional second pass does the same for
//! solvent atoms reached in the first pass, which is how solvent bridges are
//! found. Post-processing then runs once over the table.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Run mode and post-processing switches
//! - **Context** - Read-only view of the structure and parameter tables shared by every step
//! - **Candidate pairs** - Spatial index and the first-pass and mediation pair lists
//! - **Rings** - Same-residue ring perception for the pi families
//! - **Detectors** - One geometric rule per interaction family
//! - **Interaction Table** ([`table`]) - Record storage with the insert guard,
//!   bridge promotion and canonical anchor order
//! - **Tasks** - Detection, 1-3/1-4 exclusion, priority deduplication and the bridge filter
//! - **Progress Monitoring** ([`progress`]) - Callback based progress events
//! - **Error Handling** ([`error`]) - Fatal per-frame configuration errors
//!
//! ## Determinism
//!
//! Primary atoms, partners and substituents are all visited in ascending serial
//! order, so a frame always produces the same table for the same inputs.

pub mod config;
pub(crate) mod context;
pub(crate) mod detectors;
pub mod error;
pub(crate) mod pairs;
pub mod progress;
pub(crate) mod rings;
pub mod table;
pub(crate) mod tasks;
