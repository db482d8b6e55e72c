//! Crystal lattices and the Bravais recipes built on top of them.

pub mod cell;
pub mod recipes;

pub use cell::{Basis, Lattice, LatticeError};
