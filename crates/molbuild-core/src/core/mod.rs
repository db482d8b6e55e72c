//! # Core Module
//!
//! This module provides the fundamental building blocks for molecular assembly in
//! molbuild.
//!
//! ## Architecture
//!
//! - **Molecular Representation** ([`models`]) - Compounds, particles, ports, bonds,
//!   elements and simulation boxes
//! - **Geometry** ([`utils`]) - Vector helpers and rigid equivalence transforms
//! - **Crystal Lattices** ([`lattice`]) - Bravais lattice definitions and population
//! - **Point Patterns** ([`pattern`]) - Spatial arrangements used to pick attachment sites
//! - **File I/O** ([`io`]) - Reading and writing MOL2 and XYZ files

pub mod io;
pub mod lattice;
pub mod models;
pub mod pattern;
pub mod utils;
