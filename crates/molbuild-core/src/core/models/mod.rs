//! # Core Models Module
//!
//! Data structures used to represent molecular building blocks.
//!
//! ## Key Components
//!
//! - [`compound`] - Arena-backed hierarchy of groups, particles, ports and bonds
//! - [`particle`] - A single point mass with a name, optional element and position
//! - [`port`] - Directional attachment points built from ghost particles
//! - [`topology`] - Bonds between particles
//! - [`element`] - Periodic table lookup and element inference from particle names
//! - [`sim_box`] - Periodic simulation cells and axis-aligned bounding boxes
//! - [`ids`] - Typed keys for groups, particles and ports
//!
//! ## Usage
//!
//! ```ignore
//! use molbuild::core::models::compound::Compound;
//! use nalgebra::Point3;
//!
//! let mut ch2 = Compound::new("CH2");
//! let root = ch2.root();
//! let carbon = ch2.add_particle(root, "C", Point3::origin(), Some("C[$]"))?;
//! ```

pub mod compound;
pub mod element;
pub mod ids;
pub mod particle;
pub mod port;
pub mod sim_box;
pub mod topology;
