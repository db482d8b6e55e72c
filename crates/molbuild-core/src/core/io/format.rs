use super::mol2::{Mol2Error, Mol2File};
use super::traits::MolecularFile;
use super::xyz::{XyzError, XyzFile};
use crate::core::models::compound::Compound;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("Unsupported file format '{0}' (expected .mol2 or .xyz)")]
    UnsupportedFormat(String),
    #[error(transparent)]
    Mol2(#[from] Mol2Error),
    #[error(transparent)]
    Xyz(#[from] XyzError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Mol2,
    Xyz,
}

impl FileFormat {
    /// Picks a format from the extension of `path`, ignoring case.
    pub fn from_path(path: &Path) -> Result<Self, IoError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match extension.as_str() {
            "mol2" => Ok(Self::Mol2),
            "xyz" => Ok(Self::Xyz),
            _ => Err(IoError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

pub fn save_compound(compound: &Compound, path: impl AsRef<Path>) -> Result<(), IoError> {
    let path = path.as_ref();
    let format = FileFormat::from_path(path)?;
    debug!(path = %path.display(), ?format, "Writing compound");
    match format {
        FileFormat::Mol2 => Mol2File::write_compound_to_path(compound, path)?,
        FileFormat::Xyz => XyzFile::write_compound_to_path(compound, path)?,
    }
    Ok(())
}

pub fn load_compound(path: impl AsRef<Path>) -> Result<Compound, IoError> {
    let path = path.as_ref();
    let format = FileFormat::from_path(path)?;
    debug!(path = %path.display(), ?format, "Reading compound");
    let compound = match format {
        FileFormat::Mol2 => Mol2File::read_from_path(path)?.0,
        FileFormat::Xyz => XyzFile::read_from_path(path)?.0,
    };
    Ok(compound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;
    use tempfile::tempdir;

    fn sample() -> Compound {
        let mut compound = Compound::new("Sample");
        let root = compound.root();
        let a = compound.add_particle(root, "C", Point3::origin(), None).unwrap();
        let b = compound
            .add_particle(root, "O", Point3::new(0.12, 0.0, 0.0), None)
            .unwrap();
        compound.add_bond(a, b).unwrap();
        compound
    }

    #[test]
    fn format_is_chosen_by_extension() {
        assert_eq!(FileFormat::from_path(Path::new("a.MOL2")).unwrap(), FileFormat::Mol2);
        assert_eq!(FileFormat::from_path(Path::new("dir/b.xyz")).unwrap(), FileFormat::Xyz);
        assert!(matches!(
            FileFormat::from_path(Path::new("c.pdb")),
            Err(IoError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            FileFormat::from_path(Path::new("noext")),
            Err(IoError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn save_and_load_mol2_keeps_bonds() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sample.mol2");
        save_compound(&sample(), &path).unwrap();
        let loaded = load_compound(&path).unwrap();
        assert_eq!(loaded.n_particles(), 2);
        assert_eq!(loaded.n_bonds(), 1);
    }

    #[test]
    fn save_and_load_xyz_drops_bonds() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sample.xyz");
        save_compound(&sample(), &path).unwrap();
        let loaded = load_compound(&path).unwrap();
        assert_eq!(loaded.n_particles(), 2);
        assert_eq!(loaded.n_bonds(), 0);
        assert_eq!(loaded.name(), "Sample");
    }
}
