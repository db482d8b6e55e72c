use thiserror::Error;

use super::config::ConfigError;
use crate::core::io::format::IoError;
use crate::core::lattice::LatticeError;
use crate::core::models::compound::CompoundError;
use crate::core::models::ids::PortId;
use crate::core::models::sim_box::BoxError;
use crate::core::pattern::PatternError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Compound error: {source}")]
    Compound {
        #[from]
        source: CompoundError,
    },

    #[error("Lattice error: {source}")]
    Lattice {
        #[from]
        source: LatticeError,
    },

    #[error("Simulation box error: {source}")]
    SimBox {
        #[from]
        source: BoxError,
    },

    #[error("Pattern error: {source}")]
    Pattern {
        #[from]
        source: PatternError,
    },

    #[error("File error: {source}")]
    Io {
        #[from]
        source: IoError,
    },

    #[error("Configuration error: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Port {port:?} is not part of the group being moved")]
    PortNotInGroup { port: PortId },

    #[error("Target port {port:?} lies inside the group being moved")]
    PortInsideMovingGroup { port: PortId },

    #[error("Port {port:?} has already been used")]
    PortAlreadyUsed { port: PortId },

    #[error("Point sets differ in length ({from} vs {to}) or are empty")]
    MismatchedPoints { from: usize, to: usize },

    #[error("Pattern has {required} points but only {available} ports are available")]
    NotEnoughPorts { required: usize, available: usize },

    #[error("Compound '{compound}' has no port labeled '{label}'")]
    PortNotFound { compound: String, label: String },

    #[error("Compound '{name}' has no simulation box")]
    MissingBox { name: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Internal logic error: {0}")]
    Internal(String),
}
