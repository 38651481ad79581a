//! Error types.
//!
//! Spawn and scenario errors are returned to the caller. Behavior faults
//! never escape the scheduler: the offending entity is killed and the tick
//! continues.

use thiserror::Error;

use crate::enums::EntityKind;

/// Rejection of a `spawn` request.
#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("unknown entity type tag {0:?}")]
    UnknownKind(String),
    #[error("initial {field} is not finite")]
    NonFinite { field: &'static str },
    #[error("parameters for {given} supplied to a {kind} entity")]
    ParamsMismatch { kind: EntityKind, given: &'static str },
    #[error("flight plan {name:?}: {source}")]
    FlightPlan {
        name: String,
        #[source]
        source: FlightPlanError,
    },
}

/// A flight plan that cannot be built.
#[derive(Debug, Error, PartialEq)]
pub enum FlightPlanError {
    #[error("flight plan has no waypoints")]
    Empty,
    #[error("waypoint {index} ({name:?}) has a non-finite {field}")]
    NonFinite {
        index: usize,
        name: String,
        field: &'static str,
    },
    #[error("waypoint {index} has an unreadable time of day {value:?}")]
    InvalidTime { index: usize, value: String },
}

/// Per-entity fault raised from a behavior update.
#[derive(Debug, Error, PartialEq)]
pub enum BehaviorFault {
    #[error("non-finite {field} after update")]
    NonFinite { field: &'static str },
    #[error("{0}")]
    Invariant(String),
}

/// Failure to read a scenario document.
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("scenario decode failed: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("scenario read failed: {0}")]
    Io(#[from] std::io::Error),
}
