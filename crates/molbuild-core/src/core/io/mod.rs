//! Reading and writing molecular structure files.
//!
//! Each format implements [`traits::MolecularFile`] over [`Compound`](crate::core::models::compound::Compound).
//! File coordinates are in Ångström and are converted to and from nanometres at this
//! boundary. [`format`] picks a format from a file extension.

pub mod format;
pub mod mol2;
pub mod traits;
pub mod xyz;

/// Ångström per nanometre.
pub(crate) const ANGSTROM_PER_NM: f64 = 10.0;
