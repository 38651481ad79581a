//! Events emitted by the simulation for external listeners.

use serde::{Deserialize, Serialize};

use crate::commands::SubmodelParent;
use crate::enums::*;
use crate::types::{EntityId, GeoPosition, Orientation};

/// What a ballistic entity struck.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "object", rename_all = "snake_case")]
pub enum StruckObject {
    Terrain { solid: bool },
    Entity { id: EntityId, kind: EntityKind },
    /// Life ran out in free flight.
    Nothing,
}

/// One-shot report from a ballistic entity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpactReport {
    pub kind: ReportKind,
    pub position: GeoPosition,
    pub orientation: Orientation,
    pub speed_fps: f64,
    pub struck: StruckObject,
}

/// Events produced during a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SimEvent {
    Spawned { id: EntityId, kind: EntityKind },
    Removed { id: EntityId, reason: RemovalReason },
    /// A behavior update failed; the entity was killed.
    EntityFault { id: EntityId, message: String },
    Report { id: EntityId, report: ImpactReport },
    WaypointReached { id: EntityId, waypoint: String },
    SubmodelReleased {
        parent: SubmodelParent,
        child: EntityId,
        name: String,
    },
    /// The viewer is in refuelling position behind a tanker.
    TankerContact { id: EntityId },
}
