use crate::core::models::compound::Compound;
use nalgebra::Point3;
use thiserror::Error;

const FRACTION_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid parameter: {0}")]
    Invalid(String),
}

/// How the points used to place chains are generated.
#[derive(Debug, Clone, PartialEq)]
pub enum PatternSpec {
    /// A random 2D pattern with one point per available surface port.
    Auto,
    Grid2D { n: usize, m: usize },
    Grid3D { n: usize, m: usize, l: usize },
    Random2D { n: usize, seed: u64 },
    Disk { n: usize },
    Sphere { n: usize },
    /// Explicit fractional points.
    Points(Vec<Point3<f64>>),
}

#[derive(Debug, Clone)]
pub struct MonolayerConfig {
    /// Chain templates with the fraction of pattern points each one receives.
    pub chains: Vec<(Compound, f64)>,
    /// Fills every surface port left without a chain.
    pub backfill: Option<Compound>,
    pub pattern: PatternSpec,
    pub tile_x: usize,
    pub tile_y: usize,
    /// Label of the chain port that bonds to the surface.
    pub guest_port: String,
    /// Label of the backfill port that bonds to the surface.
    pub backfill_port: String,
    pub seed: u64,
}

#[derive(Default)]
pub struct MonolayerConfigBuilder {
    chains: Vec<(Compound, f64)>,
    backfill: Option<Compound>,
    pattern: Option<PatternSpec>,
    tile_x: Option<usize>,
    tile_y: Option<usize>,
    guest_port: Option<String>,
    backfill_port: Option<String>,
    seed: Option<u64>,
}

impl MonolayerConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chain(mut self, chain: Compound, fraction: f64) -> Self {
        self.chains.push((chain, fraction));
        self
    }
    pub fn backfill(mut self, backfill: Compound) -> Self {
        self.backfill = Some(backfill);
        self
    }
    pub fn pattern(mut self, pattern: PatternSpec) -> Self {
        self.pattern = Some(pattern);
        self
    }
    pub fn tile_x(mut self, n: usize) -> Self {
        self.tile_x = Some(n);
        self
    }
    pub fn tile_y(mut self, n: usize) -> Self {
        self.tile_y = Some(n);
        self
    }
    pub fn guest_port(mut self, label: &str) -> Self {
        self.guest_port = Some(label.to_string());
        self
    }
    pub fn backfill_port(mut self, label: &str) -> Self {
        self.backfill_port = Some(label.to_string());
        self
    }
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validates the collected parameters.
    ///
    /// At least one chain is required. With several chains the fractions must sum to
    /// one. Tile counts must be at least one. Unset optional values fall back to an
    /// automatic pattern, no tiling, the `down` chain port, the `up` backfill port and
    /// seed 12345.
    pub fn build(self) -> Result<MonolayerConfig, ConfigError> {
        if self.chains.is_empty() {
            return Err(ConfigError::MissingParameter("chains"));
        }
        if self.chains.len() > 1 {
            if let Some((_, f)) = self
                .chains
                .iter()
                .find(|(_, f)| !f.is_finite() || *f < 0.0)
            {
                return Err(ConfigError::Invalid(format!(
                    "chain fraction {f} must be non-negative"
                )));
            }
            let total: f64 = self.chains.iter().map(|(_, f)| f).sum();
            if (total - 1.0).abs() > FRACTION_TOLERANCE {
                return Err(ConfigError::Invalid(format!(
                    "chain fractions sum to {total}, expected 1"
                )));
            }
        }
        let tile_x = self.tile_x.unwrap_or(1);
        let tile_y = self.tile_y.unwrap_or(1);
        if tile_x == 0 || tile_y == 0 {
            return Err(ConfigError::Invalid(format!(
                "tile counts must be at least 1, got ({tile_x}, {tile_y})"
            )));
        }
        Ok(MonolayerConfig {
            chains: self.chains,
            backfill: self.backfill,
            pattern: self.pattern.unwrap_or(PatternSpec::Auto),
            tile_x,
            tile_y,
            guest_port: self.guest_port.unwrap_or_else(|| "down".to_string()),
            backfill_port: self.backfill_port.unwrap_or_else(|| "up".to_string()),
            seed: self.seed.unwrap_or(12345),
        })
    }
}
