use crate::cli::LatticeKind;
use crate::error::{CliError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A monolayer recipe as written in TOML. Every value is optional here; the
/// builder merges it with CLI overrides and defaults.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileRecipe {
    pub seed: Option<u64>,
    pub chain_port: Option<String>,
    pub backfill_port: Option<String>,
    pub surface: Option<FileSurface>,
    #[serde(default)]
    pub chains: Vec<FileChain>,
    pub backfill: Option<FileTemplate>,
    pub pattern: Option<FilePattern>,
    pub tiling: Option<FileTiling>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileSurface {
    pub lattice: Option<LatticeKind>,
    pub spacing: Option<f64>,
    pub c: Option<f64>,
    pub alpha: Option<f64>,
    pub repeat: Option<[usize; 3]>,
    pub element: Option<String>,
    pub file: Option<PathBuf>,
    pub port_orientation: Option<[f64; 3]>,
    pub port_separation: Option<f64>,
    pub port_tolerance: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileChain {
    pub file: Option<PathBuf>,
    pub element: Option<String>,
    pub fraction: Option<f64>,
    #[serde(default)]
    pub ports: Vec<FilePort>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileTemplate {
    pub file: Option<PathBuf>,
    pub element: Option<String>,
    #[serde(default)]
    pub ports: Vec<FilePort>,
}

/// A port added to a template after loading; `anchor` is a 1-based atom index.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FilePort {
    pub label: String,
    pub anchor: usize,
    pub orientation: [f64; 3],
    pub separation: f64,
}

#[derive(Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum FilePatternKind {
    #[default]
    #[serde(rename = "auto")]
    Auto,
    #[serde(rename = "grid-2d")]
    Grid2D,
    #[serde(rename = "grid-3d")]
    Grid3D,
    #[serde(rename = "random-2d")]
    Random2D,
    #[serde(rename = "disk")]
    Disk,
    #[serde(rename = "sphere")]
    Sphere,
    #[serde(rename = "csv")]
    Csv,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FilePattern {
    #[serde(rename = "type", default)]
    pub kind: FilePatternKind,
    pub n: Option<usize>,
    pub m: Option<usize>,
    pub l: Option<usize>,
    pub seed: Option<u64>,
    pub path: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct FileTiling {
    pub x: Option<usize>,
    pub y: Option<usize>,
}

impl FileRecipe {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading recipe from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }
}
