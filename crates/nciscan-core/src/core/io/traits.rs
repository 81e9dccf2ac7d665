use crate::core::models::structure::Structure;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// A structure file format that can be parsed into a [`Structure`] and
/// written back out.
///
/// Formats implement the reader/writer pair; opening and buffering files is
/// shared through the `*_path` helpers.
pub trait MolecularFile {
    /// Format-specific data that has no place in [`Structure`] but is needed
    /// to write the file back out.
    type Metadata;

    type Error: Error + From<io::Error>;

    /// Parses one structure.
    ///
    /// # Errors
    ///
    /// Returns the format's error for malformed records or a failing reader.
    fn read_from(reader: &mut impl BufRead) -> Result<(Structure, Self::Metadata), Self::Error>;

    /// Serializes `structure`, restoring whatever `metadata` preserved from
    /// the original file.
    fn write_to(
        structure: &Structure,
        metadata: &Self::Metadata,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error>;

    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<(Structure, Self::Metadata), Self::Error> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader)
    }

    fn write_to_path<P: AsRef<Path>>(
        structure: &Structure,
        metadata: &Self::Metadata,
        path: P,
    ) -> Result<(), Self::Error> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_to(structure, metadata, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}
