pub mod build;
pub mod info;
pub mod lattice;
pub mod polymer;
