//! AI traffic simulation.
//!
//! Owns the hecs ECS world, runs every behavior once per tick and produces
//! `TrafficSnapshot`s for whatever renders or inspects the traffic.

pub mod behaviors;
pub mod engine;
pub mod scenario;
pub mod submodel;
pub mod systems;

pub use aitraffic_core as core;
pub use engine::{SimConfig, TrafficManager};
pub use scenario::Scenario;
