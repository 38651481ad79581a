//! Systems that run over the whole world once per tick.
//!
//! Systems are plain functions over `&mut World` (or `&World` for the
//! read-only ones). Per-entity behavior lives in [`crate::behaviors`].

pub mod cleanup;
pub mod collision;
pub mod peers;
pub mod radar;
pub mod snapshot;
pub mod thermal_field;
