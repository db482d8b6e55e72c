//! # Workflows Module
//!
//! High-level building procedures assembled from the engine operations. Each
//! workflow takes template compounds, validates its parameters, and returns a new
//! compound without touching its inputs.
//!
//! - **Tiling** ([`tiling`]) - replicates a periodic compound across its box and
//!   reconnects bonds that cross the box boundary.
//! - **Polymer** ([`polymer`]) - chains copies of a monomer head to tail.
//! - **Surface decoration** ([`surface`]) - adds outward-facing ports to the
//!   outermost particles of a slab.
//! - **Monolayer** ([`monolayer`]) - tiles a surface and grafts one or more chain
//!   types onto it following a pattern, with optional backfill.
//!
//! Workflows emit `tracing` events for each step and report their phases through
//! [`ProgressReporter`](crate::engine::progress::ProgressReporter) where they take one.

pub mod monolayer;
pub mod polymer;
pub mod surface;
pub mod tiling;
