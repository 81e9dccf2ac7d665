//! File input and output around the detection engine.
//!
//! Structures are read from Tripos Mol2 files through the [`traits::MolecularFile`]
//! interface, molecule classes are assigned from a TOML selection, and final
//! interaction tables are written as CSV.

pub mod mol2;
pub mod selection;
pub mod table;
pub mod traits;
