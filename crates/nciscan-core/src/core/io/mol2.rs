use crate::core::io::traits::MolecularFile;
use crate::core::models::atom::Atom;
use crate::core::models::structure::{Structure, StructureBuilder, StructureError};
use crate::core::models::topology::BondOrder;
use nalgebra::Point3;
use std::collections::BTreeMap;
use std::io::{self, BufRead, Write};
use thiserror::Error;

const SECTION_PREFIX: &str = "@<TRIPOS>";

/// One `@<TRIPOS>SUBSTRUCTURE` record.
#[derive(Debug, Clone, PartialEq)]
pub struct Substructure {
    pub name: String,
    pub root_atom: usize,
    pub kind: Option<String>,
    pub chain: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Mol2Metadata {
    pub molecule_name: String,
    pub molecule_type: String,
    pub charge_type: String,
    /// Substructures keyed by substructure id.
    pub substructures: BTreeMap<isize, Substructure>,
}

impl Default for Mol2Metadata {
    fn default() -> Self {
        Self {
            molecule_name: "****".to_string(),
            molecule_type: "SMALL".to_string(),
            charge_type: "USER_CHARGES".to_string(),
            substructures: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Error)]
pub enum Mol2Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse {
        line: usize,
        kind: Mol2ParseErrorKind,
    },
    #[error("Missing required record: {0}")]
    MissingRecord(String),
    #[error("Inconsistent structure: {0}")]
    Structure(#[from] StructureError),
}

#[derive(Debug, Error)]
pub enum Mol2ParseErrorKind {
    #[error("Invalid integer in field '{field}' (value: '{value}')")]
    InvalidInt { field: &'static str, value: String },
    #[error("Invalid float in field '{field}' (value: '{value}')")]
    InvalidFloat { field: &'static str, value: String },
    #[error("Record has {found} fields, at least {expected} are required")]
    TooFewFields { expected: usize, found: usize },
    #[error("Unknown bond type '{0}'")]
    InvalidBondType(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Molecule,
    Atom,
    Bond,
    Substructure,
    Other,
}

fn parse_int<T: std::str::FromStr>(line: usize, field: &'static str, value: &str) -> Result<T, Mol2Error> {
    value.parse().map_err(|_| Mol2Error::Parse {
        line,
        kind: Mol2ParseErrorKind::InvalidInt {
            field,
            value: value.to_string(),
        },
    })
}

fn parse_float(line: usize, field: &'static str, value: &str) -> Result<f64, Mol2Error> {
    value.parse().map_err(|_| Mol2Error::Parse {
        line,
        kind: Mol2ParseErrorKind::InvalidFloat {
            field,
            value: value.to_string(),
        },
    })
}

fn require_fields(line: usize, fields: &[&str], expected: usize) -> Result<(), Mol2Error> {
    if fields.len() < expected {
        return Err(Mol2Error::Parse {
            line,
            kind: Mol2ParseErrorKind::TooFewFields {
                expected,
                found: fields.len(),
            },
        });
    }
    Ok(())
}

fn optional_field(fields: &[&str], index: usize) -> Option<String> {
    fields
        .get(index)
        .filter(|value| !value.chars().all(|c| c == '*'))
        .map(|value| value.to_string())
}

/// Tripos Mol2 reader and writer.
///
/// Only the records needed for detection are interpreted: `MOLECULE`,
/// `ATOM`, `BOND` and `SUBSTRUCTURE`. Every other section is skipped.
pub struct Mol2File;

impl MolecularFile for Mol2File {
    type Metadata = Mol2Metadata;
    type Error = Mol2Error;

    fn read_from(reader: &mut impl BufRead) -> Result<(Structure, Self::Metadata), Self::Error> {
        let mut metadata = Mol2Metadata::default();
        let mut atoms: Vec<Atom> = Vec::new();
        let mut bonds: Vec<(usize, usize, BondOrder)> = Vec::new();

        let mut section = Section::None;
        let mut molecule_line = 0;

        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let line_num = line_num + 1;
            let trimmed = line.trim();

            if let Some(name) = trimmed.strip_prefix(SECTION_PREFIX) {
                section = match name.trim() {
                    "MOLECULE" => Section::Molecule,
                    "ATOM" => Section::Atom,
                    "BOND" => Section::Bond,
                    "SUBSTRUCTURE" => Section::Substructure,
                    _ => Section::Other,
                };
                molecule_line = 0;
                continue;
            }
            if trimmed.starts_with('#') {
                continue;
            }

            match section {
                Section::Molecule => {
                    // The name line may legitimately be blank.
                    if trimmed.is_empty() && molecule_line != 0 {
                        continue;
                    }
                    match molecule_line {
                        0 => metadata.molecule_name = trimmed.to_string(),
                        2 => metadata.molecule_type = trimmed.to_string(),
                        3 => metadata.charge_type = trimmed.to_string(),
                        _ => {}
                    }
                    molecule_line += 1;
                }
                _ if trimmed.is_empty() => {}
                Section::Atom => {
                    let fields: Vec<&str> = trimmed.split_whitespace().collect();
                    require_fields(line_num, &fields, 6)?;
                    let serial: usize = parse_int(line_num, "atom_id", fields[0])?;
                    let x = parse_float(line_num, "x", fields[2])?;
                    let y = parse_float(line_num, "y", fields[3])?;
                    let z = parse_float(line_num, "z", fields[4])?;

                    let mut atom = Atom::new(serial, fields[1], fields[5], Point3::new(x, y, z));
                    if let Some(value) = fields.get(6) {
                        atom.residue_number = parse_int(line_num, "subst_id", value)?;
                    }
                    if let Some(value) = fields.get(7) {
                        atom.residue_name = value.to_string();
                    }
                    if let Some(value) = fields.get(8) {
                        atom.partial_charge = parse_float(line_num, "charge", value)?;
                    }
                    atoms.push(atom);
                }
                Section::Bond => {
                    let fields: Vec<&str> = trimmed.split_whitespace().collect();
                    require_fields(line_num, &fields, 4)?;
                    let origin: usize = parse_int(line_num, "origin_atom_id", fields[1])?;
                    let target: usize = parse_int(line_num, "target_atom_id", fields[2])?;
                    let order = fields[3].parse::<BondOrder>().map_err(|_| Mol2Error::Parse {
                        line: line_num,
                        kind: Mol2ParseErrorKind::InvalidBondType(fields[3].to_string()),
                    })?;
                    bonds.push((origin, target, order));
                }
                Section::Substructure => {
                    let fields: Vec<&str> = trimmed.split_whitespace().collect();
                    require_fields(line_num, &fields, 3)?;
                    let id: isize = parse_int(line_num, "subst_id", fields[0])?;
                    let root_atom: usize = parse_int(line_num, "root_atom", fields[2])?;
                    metadata.substructures.insert(
                        id,
                        Substructure {
                            name: fields[1].to_string(),
                            root_atom,
                            kind: optional_field(&fields, 3),
                            chain: optional_field(&fields, 5),
                        },
                    );
                }
                Section::None | Section::Other => {}
            }
        }

        if atoms.is_empty() {
            return Err(Mol2Error::MissingRecord("@<TRIPOS>ATOM records".into()));
        }

        let mut builder = StructureBuilder::new();
        for mut atom in atoms {
            atom.chain = metadata
                .substructures
                .get(&atom.residue_number)
                .and_then(|s| s.chain.clone());
            builder.add_atom(atom);
        }
        for (origin, target, order) in bonds {
            builder.add_bond(origin, target, order);
        }
        Ok((builder.build()?, metadata))
    }

    fn write_to(
        structure: &Structure,
        metadata: &Self::Metadata,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error> {
        writeln!(writer, "{}MOLECULE", SECTION_PREFIX)?;
        writeln!(writer, "{}", metadata.molecule_name)?;
        writeln!(
            writer,
            "{:>5} {:>5} {:>5} 0 0",
            structure.len(),
            structure.bonds().len(),
            metadata.substructures.len()
        )?;
        writeln!(writer, "{}", metadata.molecule_type)?;
        writeln!(writer, "{}", metadata.charge_type)?;
        writeln!(writer)?;

        writeln!(writer, "{}ATOM", SECTION_PREFIX)?;
        for (_, atom) in structure.atoms_iter() {
            let residue_name = if atom.residue_name.is_empty() {
                "****"
            } else {
                atom.residue_name.as_str()
            };
            writeln!(
                writer,
                "{:>7} {:<8} {:>10.4} {:>10.4} {:>10.4} {:<8} {:>4} {:<8} {:>10.4}",
                atom.serial,
                atom.name,
                atom.position.x,
                atom.position.y,
                atom.position.z,
                atom.atom_type,
                atom.residue_number,
                residue_name,
                atom.partial_charge
            )?;
        }

        writeln!(writer, "{}BOND", SECTION_PREFIX)?;
        for (index, bond) in structure.bonds().iter().enumerate() {
            let serial1 = structure.atom(bond.atom1_id).map(|a| a.serial);
            let serial2 = structure.atom(bond.atom2_id).map(|a| a.serial);
            let (Some(serial1), Some(serial2)) = (serial1, serial2) else {
                return Err(Mol2Error::MissingRecord(format!("atoms of bond {}", index + 1)));
            };
            writeln!(writer, "{:>6} {:>5} {:>5} {}", index + 1, serial1, serial2, bond.order)?;
        }

        if !metadata.substructures.is_empty() {
            writeln!(writer, "{}SUBSTRUCTURE", SECTION_PREFIX)?;
            for (id, sub) in &metadata.substructures {
                writeln!(
                    writer,
                    "{:>6} {:<8} {:>6} {:<8} 1 {:<4}",
                    id,
                    sub.name,
                    sub.root_atom,
                    sub.kind.as_deref().unwrap_or("RESIDUE"),
                    sub.chain.as_deref().unwrap_or("****"),
                )?;
            }
        }
        Ok(())
    }
}
