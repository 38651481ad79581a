//! Core types and definitions for the AI traffic simulation.
//!
//! This crate defines the vocabulary shared across all other crates:
//! identities, geodetic types, components, commands, events, errors,
//! spawn parameters, snapshots and the small amount of shared math
//! (local geodesy, standard atmosphere, first-order lag).
//! It has no dependency on the ECS or any runtime framework.

pub mod atmosphere;
pub mod commands;
pub mod components;
pub mod constants;
pub mod enums;
pub mod error;
pub mod events;
pub mod filter;
pub mod geo;
pub mod params;
pub mod state;
pub mod types;
