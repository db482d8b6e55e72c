//! # molbuild Core Library
//!
//! A library for assembling molecular systems from reusable fragments: hierarchical
//! compounds joined through labeled ports, placed on hosts with spatial patterns,
//! replicated across periodic boxes and crystal lattices, and exported to file formats
//! used by molecular simulation tools.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture so that data, operations and
//! end-to-end recipes stay separate.
//!
//! - **[`core`]: The Foundation.** Arena-backed data models (`Compound`, `Port`,
//!   `SimBox`), pure geometry, point patterns, lattices and file I/O.
//!
//! - **[`engine`]: The Assembly Logic.** Operations that mutate compounds as a whole:
//!   port-to-port overlap (`force_overlap`), pattern-driven attachment of guests and
//!   backfills (`apply_to_compound`), plus configuration, progress reporting and the
//!   aggregate error type.
//!
//! - **[`workflows`]: The Public Recipes.** Complete building procedures such as tiling,
//!   polymerisation, surface decoration and self-assembled monolayers.
//!
//! All lengths are expressed in nanometres. File formats that use Ångström convert at
//! the I/O boundary.

pub mod core;
pub mod engine;
pub mod workflows;
