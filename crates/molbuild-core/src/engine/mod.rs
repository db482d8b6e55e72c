//! # Engine Module
//!
//! The assembly engine joins compounds together. It owns the two operations every
//! workflow is built from:
//!
//! - **Overlap** ([`overlap`]) - rigidly moves one group so that one of its ports
//!   coincides with a port elsewhere in the compound, then bonds the anchors.
//! - **Attachment** ([`attachment`]) - matches pattern points to host ports and
//!   overlaps a copy of a guest (or backfill) onto each chosen port.
//!
//! Supporting modules provide typed configuration ([`config`]), progress reporting
//! ([`progress`]) and the aggregate error type ([`error`]).

pub mod attachment;
pub mod config;
pub mod error;
pub mod overlap;
pub mod progress;
