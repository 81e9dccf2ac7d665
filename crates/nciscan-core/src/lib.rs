//! # NCIScan Core Library
//!
//! A geometric rule engine that detects and classifies non-covalent
//! interactions (hydrogen bonds, pi stacking, halogen bonds, salt bridges,
//! solvent bridges and more) in 3D molecular structures.
//!
//! ## Architectural Philosophy
//!
//! The library keeps the same three layers from input to output:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Structure`, `Atom`,
//!   `InteractionRecord`), geometry helpers, the typed parameter tables and
//!   file I/O for Mol2 structures, molecule selections and CSV tables.
//!
//! - **[`engine`]: The Logic Core.** The per-frame machinery: candidate pair
//!   generation, ring perception, one detector per interaction family, the
//!   interaction table with its insert guard and bridge promotion, and the
//!   post-processing passes.
//!
//! - **[`workflows`]: The Public API.** Ties `core` and `engine` together to
//!   analyse a single structure or a whole trajectory of frames.

pub mod core;
pub mod engine;
pub mod workflows;
