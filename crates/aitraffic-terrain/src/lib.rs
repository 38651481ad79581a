//! Ground elevation sources for AI traffic.
//!
//! Ballistic impact tests, ground vehicles, thermals and on-ground
//! aircraft ask a [`GroundQuery`] for the ground under a lat/lon.

pub use aitraffic_core as core;

pub mod grid;
pub mod ground;

// Re-export key types for convenience.
pub use grid::{TerrainGrid, TerrainHeader};
pub use ground::{FlatGround, GroundQuery, GroundSample};
