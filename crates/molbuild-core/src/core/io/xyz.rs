use super::ANGSTROM_PER_NM;
use crate::core::io::traits::MolecularFile;
use crate::core::models::compound::{Compound, CompoundError};
use nalgebra::Point3;
use std::io::{self, BufRead, Write};
use thiserror::Error;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct XyzMetadata {
    /// The free-text second line of the file.
    pub comment: String,
}

#[derive(Debug, Error)]
pub enum XyzError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse { line: usize, kind: XyzParseErrorKind },
    #[error("Inconsistent data: {0}")]
    Inconsistency(String),
    #[error("Missing required record: {0}")]
    MissingRecord(String),
    #[error("Failed to assemble compound: {0}")]
    Compound(#[from] CompoundError),
}

#[derive(Debug, Error)]
pub enum XyzParseErrorKind {
    #[error("Invalid atom count '{0}'")]
    InvalidCount(String),
    #[error("Invalid coordinate '{0}'")]
    InvalidFloat(String),
    #[error("Atom line needs a symbol and three coordinates")]
    TooFewFields,
}

/// Plain XYZ reader and writer.
///
/// Only element symbols and positions are stored, so bonds, ports and the hierarchy
/// are lost on write.
pub struct XyzFile;

impl MolecularFile for XyzFile {
    type Metadata = XyzMetadata;
    type Error = XyzError;

    fn read_from(reader: &mut impl BufRead) -> Result<(Compound, Self::Metadata), Self::Error> {
        let mut lines = reader.lines();

        let count_line = lines
            .next()
            .ok_or_else(|| XyzError::MissingRecord("atom count".into()))??;
        let count: usize = count_line.trim().parse().map_err(|_| XyzError::Parse {
            line: 1,
            kind: XyzParseErrorKind::InvalidCount(count_line.trim().into()),
        })?;
        let comment = lines
            .next()
            .ok_or_else(|| XyzError::MissingRecord("comment line".into()))??;
        let name = match comment.trim() {
            "" => "Compound",
            trimmed => trimmed,
        };

        let mut compound = Compound::new(name);
        let root = compound.root();
        for (index, line_res) in lines.enumerate() {
            let line = line_res?;
            let line_num = index + 3;
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.is_empty() {
                continue;
            }
            if parts.len() < 4 {
                return Err(XyzError::Parse {
                    line: line_num,
                    kind: XyzParseErrorKind::TooFewFields,
                });
            }
            let mut coords = [0.0; 3];
            for (slot, value) in coords.iter_mut().zip(&parts[1..4]) {
                *slot = value.parse().map_err(|_| XyzError::Parse {
                    line: line_num,
                    kind: XyzParseErrorKind::InvalidFloat((*value).into()),
                })?;
            }
            let position = Point3::from(coords) / ANGSTROM_PER_NM;
            compound.add_particle(root, parts[0], position, None)?;
        }

        if compound.n_particles() != count {
            return Err(XyzError::Inconsistency(format!(
                "Header declares {count} atoms but {} were found",
                compound.n_particles()
            )));
        }
        Ok((
            compound,
            XyzMetadata {
                comment: comment.trim().to_string(),
            },
        ))
    }

    fn write_to(
        compound: &Compound,
        metadata: &Self::Metadata,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error> {
        let ids = compound.particle_ids(compound.root());
        writeln!(writer, "{}", ids.len())?;
        writeln!(writer, "{}", metadata.comment)?;
        for id in ids {
            let particle = compound.particle_ref(id).ok_or_else(|| {
                XyzError::Inconsistency(format!("Particle {id:?} is missing from the compound"))
            })?;
            let p = particle.position * ANGSTROM_PER_NM;
            writeln!(
                writer,
                "{} {:.6} {:.6} {:.6}",
                particle.type_label(),
                p.x,
                p.y,
                p.z
            )?;
        }
        Ok(())
    }

    fn write_compound_to(compound: &Compound, writer: &mut impl Write) -> Result<(), Self::Error> {
        let metadata = XyzMetadata {
            comment: compound.name().to_string(),
        };
        Self::write_to(compound, &metadata, writer)
    }
}
