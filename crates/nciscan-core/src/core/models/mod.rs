//! # Core Models Module
//!
//! Data structures describing one structure snapshot as the detectors see it.
//!
//! ## Overview
//!
//! A structure is a flat collection of typed atoms plus undirected covalent
//! bonds. There is no chain or residue hierarchy: residues are identified by
//! number, and every atom carries the molecule class it was assigned by a
//! selection. Models are immutable for the duration of a detection run.
//!
//! ## Key Components
//!
//! - [`atom`] - Atoms and their molecule classes
//! - [`interaction`] - Interaction records, the unit of detection output
//! - [`structure`] - Atom storage, bond adjacency and bond-path queries
//! - [`topology`] - Bond orders and bonds
//! - [`ids`] - Internal atom identifiers
//!
//! ## Usage
//!
//! ```ignore
//! use nciscan::core::models::{atom::Atom, structure::StructureBuilder, topology::BondOrder};
//!
//! let mut builder = StructureBuilder::new();
//! builder
//!     .add_atom(Atom::new(1, "N1", "N.3", Point3::origin()))
//!     .add_atom(Atom::new(2, "H1", "H", Point3::new(1.0, 0.0, 0.0)))
//!     .add_bond(1, 2, BondOrder::Single);
//! let structure = builder.build()?;
//! ```

pub mod atom;
pub mod ids;
pub mod interaction;
pub mod structure;
pub mod topology;
