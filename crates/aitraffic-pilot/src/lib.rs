//! Pilot logic for AI traffic.
//!
//! Flight plans, the waypoint sequencer, performance classes and the
//! wingman formation state machine. Everything here operates on plain
//! data; the simulation crate owns the entities.

pub mod formation;
pub mod performance;
pub mod plan;
pub mod sequencer;
pub mod tuning;
pub mod waypoint;

pub use aitraffic_core as core;

#[cfg(test)]
mod tests;
