use super::ANGSTROM_PER_NM;
use crate::core::io::traits::MolecularFile;
use crate::core::models::compound::{Compound, CompoundError};
use crate::core::models::element::Element;
use crate::core::models::ids::{GroupId, ParticleId};
use crate::core::models::sim_box::SimBox;
use nalgebra::Point3;
use std::borrow::Cow;
use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use thiserror::Error;

const MOLECULE_RTI: &str = "@<TRIPOS>MOLECULE";
const ATOM_RTI: &str = "@<TRIPOS>ATOM";
const BOND_RTI: &str = "@<TRIPOS>BOND";
const SUBSTRUCTURE_RTI: &str = "@<TRIPOS>SUBSTRUCTURE";
const CRYSIN_RTI: &str = "@<TRIPOS>CRYSIN";

/// A record section that is not interpreted but carried through a read/write cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSection {
    pub header: String,
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Mol2Metadata {
    pub molecule_type: String,
    pub charge_type: String,
    pub extra_sections: Vec<RawSection>,
}

impl Default for Mol2Metadata {
    fn default() -> Self {
        Self {
            molecule_type: "SMALL".to_string(),
            charge_type: "USER_CHARGES".to_string(),
            extra_sections: Vec::new(),
        }
    }
}

#[derive(Debug, Error)]
pub enum Mol2Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse { line: usize, kind: Mol2ParseErrorKind },
    #[error("Inconsistent data: {0}")]
    Inconsistency(String),
    #[error("Missing required record: {0}")]
    MissingRecord(String),
    #[error("Failed to assemble compound: {0}")]
    Compound(#[from] CompoundError),
}

#[derive(Debug, Error)]
pub enum Mol2ParseErrorKind {
    #[error("Invalid integer for {field} (value: '{value}')")]
    InvalidInt { field: &'static str, value: String },
    #[error("Invalid float for {field} (value: '{value}')")]
    InvalidFloat { field: &'static str, value: String },
    #[error("Required field {field} is missing")]
    MissingField { field: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Section {
    None,
    Molecule(usize),
    Atom,
    Bond,
    Crysin,
    Substructure,
    Other,
}

struct AtomRecord {
    serial: usize,
    name: String,
    position: Point3<f64>,
    atom_type: String,
    subst: Option<(String, String)>,
    charge: f64,
}

fn field<'a>(
    parts: &[&'a str],
    index: usize,
    name: &'static str,
    line: usize,
) -> Result<&'a str, Mol2Error> {
    parts.get(index).copied().ok_or(Mol2Error::Parse {
        line,
        kind: Mol2ParseErrorKind::MissingField { field: name },
    })
}

fn parse_int(value: &str, name: &'static str, line: usize) -> Result<usize, Mol2Error> {
    value.parse().map_err(|_| Mol2Error::Parse {
        line,
        kind: Mol2ParseErrorKind::InvalidInt {
            field: name,
            value: value.into(),
        },
    })
}

/// Parses the whitespace-separated field `index` as an integer.
fn int_field(
    parts: &[&str],
    index: usize,
    name: &'static str,
    line: usize,
) -> Result<usize, Mol2Error> {
    parse_int(field(parts, index, name, line)?, name, line)
}

fn float_field(
    parts: &[&str],
    index: usize,
    name: &'static str,
    line: usize,
) -> Result<f64, Mol2Error> {
    parse_float(field(parts, index, name, line)?, name, line)
}

/// Atom and substructure names are single whitespace-delimited tokens.
fn token(name: &str) -> Cow<'_, str> {
    if name.is_empty() {
        Cow::Borrowed("****")
    } else if name.contains(char::is_whitespace) {
        Cow::Owned(name.split_whitespace().collect::<Vec<_>>().join("_"))
    } else {
        Cow::Borrowed(name)
    }
}

fn parse_float(value: &str, name: &'static str, line: usize) -> Result<f64, Mol2Error> {
    value.parse().map_err(|_| Mol2Error::Parse {
        line,
        kind: Mol2ParseErrorKind::InvalidFloat {
            field: name,
            value: value.into(),
        },
    })
}

/// Tripos MOL2 reader and writer.
pub struct Mol2File;

impl MolecularFile for Mol2File {
    type Metadata = Mol2Metadata;
    type Error = Mol2Error;

    fn read_from(reader: &mut impl BufRead) -> Result<(Compound, Self::Metadata), Self::Error> {
        let mut metadata = Mol2Metadata::default();
        let mut name: Option<String> = None;
        let mut expected_counts: Option<(usize, usize)> = None;
        let mut atoms: Vec<AtomRecord> = Vec::new();
        let mut bonds: Vec<(usize, usize, usize)> = Vec::new();
        let mut cell: Option<([f64; 3], [f64; 3])> = None;
        let mut section = Section::None;

        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let line_num = line_num + 1;
            let trimmed = line.trim();

            if trimmed.starts_with("@<TRIPOS>") {
                section = match trimmed {
                    MOLECULE_RTI => Section::Molecule(0),
                    ATOM_RTI => Section::Atom,
                    BOND_RTI => Section::Bond,
                    CRYSIN_RTI => Section::Crysin,
                    SUBSTRUCTURE_RTI => Section::Substructure,
                    _ => {
                        metadata.extra_sections.push(RawSection {
                            header: trimmed.to_string(),
                            lines: Vec::new(),
                        });
                        Section::Other
                    }
                };
                continue;
            }
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let parts: Vec<&str> = trimmed.split_whitespace().collect();
            match section {
                Section::None => {}
                Section::Molecule(row) => {
                    match row {
                        0 => name = Some(trimmed.to_string()),
                        1 => {
                            let n_atoms = int_field(&parts, 0, "num_atoms", line_num)?;
                            let n_bonds = match parts.get(1) {
                                Some(value) => parse_int(value, "num_bonds", line_num)?,
                                None => 0,
                            };
                            expected_counts = Some((n_atoms, n_bonds));
                        }
                        2 => metadata.molecule_type = trimmed.to_string(),
                        3 => metadata.charge_type = trimmed.to_string(),
                        _ => {}
                    }
                    section = Section::Molecule(row + 1);
                }
                Section::Atom => {
                    let serial = int_field(&parts, 0, "atom_id", line_num)?;
                    let atom_name = field(&parts, 1, "atom_name", line_num)?;
                    let x = float_field(&parts, 2, "x", line_num)?;
                    let y = float_field(&parts, 3, "y", line_num)?;
                    let z = float_field(&parts, 4, "z", line_num)?;
                    let atom_type = field(&parts, 5, "atom_type", line_num)?;
                    let subst = match (parts.get(6), parts.get(7)) {
                        (Some(id), Some(name)) => Some((id.to_string(), name.to_string())),
                        _ => None,
                    };
                    let charge = match parts.get(8) {
                        Some(value) => parse_float(value, "charge", line_num)?,
                        None => 0.0,
                    };
                    atoms.push(AtomRecord {
                        serial,
                        name: atom_name.to_string(),
                        position: Point3::new(x, y, z) / ANGSTROM_PER_NM,
                        atom_type: atom_type.to_string(),
                        subst,
                        charge,
                    });
                }
                Section::Bond => {
                    let id = int_field(&parts, 0, "bond_id", line_num)?;
                    let a = int_field(&parts, 1, "origin_atom_id", line_num)?;
                    let b = int_field(&parts, 2, "target_atom_id", line_num)?;
                    bonds.push((id, a, b));
                }
                Section::Crysin => {
                    let mut values = [0.0; 6];
                    for (i, value) in values.iter_mut().enumerate() {
                        *value = float_field(&parts, i, "cell", line_num)?;
                    }
                    cell = Some((
                        [values[0], values[1], values[2]].map(|l| l / ANGSTROM_PER_NM),
                        [values[3], values[4], values[5]],
                    ));
                }
                Section::Substructure => {}
                Section::Other => {
                    if let Some(raw) = metadata.extra_sections.last_mut() {
                        raw.lines.push(line.clone());
                    }
                }
            }
        }

        let name = name.ok_or_else(|| Mol2Error::MissingRecord(MOLECULE_RTI.into()))?;
        if atoms.is_empty() {
            return Err(Mol2Error::MissingRecord(ATOM_RTI.into()));
        }
        if let Some((n_atoms, n_bonds)) = expected_counts {
            if n_atoms != atoms.len() {
                return Err(Mol2Error::Inconsistency(format!(
                    "Header declares {n_atoms} atoms but {} were found",
                    atoms.len()
                )));
            }
            if n_bonds != bonds.len() {
                return Err(Mol2Error::Inconsistency(format!(
                    "Header declares {n_bonds} bonds but {} were found",
                    bonds.len()
                )));
            }
        }

        let compound = assemble(&name, atoms, &bonds, cell)?;
        Ok((compound, metadata))
    }

    fn write_to(
        compound: &Compound,
        metadata: &Self::Metadata,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error> {
        let substructures = substructures(compound);
        let mut serials: HashMap<ParticleId, usize> = HashMap::new();
        let mut ordered: Vec<(ParticleId, usize)> = Vec::new();
        for (subst_index, (_, particles)) in substructures.iter().enumerate() {
            for &id in particles {
                serials.insert(id, serials.len() + 1);
                ordered.push((id, subst_index));
            }
        }

        writeln!(writer, "{MOLECULE_RTI}")?;
        writeln!(writer, "{}", compound.name())?;
        writeln!(
            writer,
            "{} {} {} 0 0",
            ordered.len(),
            compound.n_bonds(),
            substructures.len()
        )?;
        writeln!(writer, "{}", metadata.molecule_type)?;
        writeln!(writer, "{}", metadata.charge_type)?;
        writeln!(writer)?;

        writeln!(writer, "{ATOM_RTI}")?;
        for (id, subst_index) in &ordered {
            let particle = compound.particle_ref(*id).ok_or_else(|| {
                Mol2Error::Inconsistency(format!("Particle {id:?} is missing from the compound"))
            })?;
            let position = particle.position * ANGSTROM_PER_NM;
            writeln!(
                writer,
                "{:>7} {:<8} {:>10.4} {:>10.4} {:>10.4} {:<8} {:>3} {:<8} {:>8.4}",
                serials[id],
                token(&particle.name),
                position.x,
                position.y,
                position.z,
                token(particle.type_label()),
                subst_index + 1,
                token(&substructures[*subst_index].0),
                particle.charge
            )?;
        }

        if compound.n_bonds() > 0 {
            writeln!(writer, "{BOND_RTI}")?;
            for (index, bond) in compound.bonds().iter().enumerate() {
                let a = serials.get(&bond.a).ok_or_else(|| {
                    Mol2Error::Inconsistency(format!("Bond atom {:?} not found", bond.a))
                })?;
                let b = serials.get(&bond.b).ok_or_else(|| {
                    Mol2Error::Inconsistency(format!("Bond atom {:?} not found", bond.b))
                })?;
                writeln!(writer, "{:>6} {:>6} {:>6} 1", index + 1, a, b)?;
            }
        }

        writeln!(writer, "{SUBSTRUCTURE_RTI}")?;
        let mut first_serial = 1;
        for (index, (name, particles)) in substructures.iter().enumerate() {
            writeln!(
                writer,
                "{:>6} {:<8} {:>6} RESIDUE 1 **** ****",
                index + 1,
                token(name),
                first_serial
            )?;
            first_serial += particles.len();
        }

        if let Some(sim_box) = compound.sim_box() {
            let [a, b, c] = sim_box.lengths().map(|l| l * ANGSTROM_PER_NM);
            let [alpha, beta, gamma] = sim_box.angles();
            writeln!(writer, "{CRYSIN_RTI}")?;
            writeln!(
                writer,
                "{a:>10.4} {b:>10.4} {c:>10.4} {alpha:>8.4} {beta:>8.4} {gamma:>8.4} 1 1"
            )?;
        }

        for raw in &metadata.extra_sections {
            writeln!(writer, "{}", raw.header)?;
            for line in &raw.lines {
                writeln!(writer, "{line}")?;
            }
        }
        Ok(())
    }

    fn write_compound_to(
        compound: &Compound,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error> {
        Self::write_to(compound, &Mol2Metadata::default(), writer)
    }
}

/// Splits the particles of `compound` into substructures: the particles held directly
/// by the root, then one substructure per direct child group that has particles.
fn substructures(compound: &Compound) -> Vec<(String, Vec<ParticleId>)> {
    let root = compound.root();
    let Some(root_group) = compound.group(root) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    if !root_group.particles.is_empty() {
        out.push((compound.name().to_string(), root_group.particles.clone()));
    }
    for &child in &root_group.children {
        let particles = compound.particle_ids(child);
        if particles.is_empty() {
            continue;
        }
        if let Some(group) = compound.group(child) {
            out.push((group.name.clone(), particles));
        }
    }
    out
}

fn assemble(
    name: &str,
    atoms: Vec<AtomRecord>,
    bonds: &[(usize, usize, usize)],
    cell: Option<([f64; 3], [f64; 3])>,
) -> Result<Compound, Mol2Error> {
    let mut compound = Compound::new(name);
    let root = compound.root();

    let root_token = token(name);
    let single_root_substructure = atoms.iter().all(|a| {
        a.subst
            .as_ref()
            .is_none_or(|(_, subst_name)| *subst_name == root_token)
    });

    let mut groups: HashMap<(String, String), GroupId> = HashMap::new();
    let mut by_serial: HashMap<usize, ParticleId> = HashMap::new();
    for atom in atoms {
        let parent = match (&atom.subst, single_root_substructure) {
            (Some(key), false) => match groups.get(key) {
                Some(&group) => group,
                None => {
                    let group = compound.add_group(root, &key.1, None)?;
                    groups.insert(key.clone(), group);
                    group
                }
            },
            _ => root,
        };
        let id = compound.add_particle(parent, &atom.name, atom.position, None)?;
        if by_serial.insert(atom.serial, id).is_some() {
            return Err(Mol2Error::Inconsistency(format!(
                "Duplicate atom id: {}",
                atom.serial
            )));
        }
        if let Some(particle) = compound.particle_mut(id) {
            let symbol = atom.atom_type.split('.').next().unwrap_or_default();
            if let Some(element) = Element::from_symbol(symbol) {
                particle.element = Some(element);
            }
            particle.charge = atom.charge;
        }
    }

    for &(bond_id, a, b) in bonds {
        let (Some(&pa), Some(&pb)) = (by_serial.get(&a), by_serial.get(&b)) else {
            return Err(Mol2Error::Inconsistency(format!(
                "Bond {bond_id} refers to unknown atoms {a} and {b}"
            )));
        };
        compound.add_bond(pa, pb)?;
    }

    if let Some((lengths, angles)) = cell {
        let sim_box = SimBox::from_lengths_angles(lengths, angles)
            .map_err(|e| Mol2Error::Inconsistency(format!("Invalid CRYSIN cell: {e}")))?;
        compound.set_sim_box(Some(sim_box));
        compound.set_periodicity([true; 3]);
    }
    Ok(compound)
}
