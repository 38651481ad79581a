//! Commands sent into the traffic manager from outside the core.
//!
//! Commands are queued and applied at the next tick boundary, before any
//! entity updates run.

use serde::{Deserialize, Serialize};

use crate::params::{MotionPacket, SubmodelConfig};
use crate::types::EntityId;

/// Parent of a submodel spawn point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "parent", content = "id", rename_all = "snake_case")]
pub enum SubmodelParent {
    /// The human-flown aircraft.
    Viewer,
    Entity(EntityId),
}

/// All externally issued actions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TrafficCommand {
    // --- Lifecycle ---
    /// Mark an entity for removal.
    Remove { id: EntityId },

    // --- Commanded state ---
    /// Engage heading lock toward a heading.
    SetTargetHeading { id: EntityId, heading_deg: f64 },
    SetTargetAltitude { id: EntityId, altitude_ft: f64 },
    SetTargetSpeed { id: EntityId, speed_kt: f64 },
    /// Command a bank angle directly. Releases heading lock.
    SetTargetRoll { id: EntityId, roll_deg: f64 },

    // --- Submodels ---
    /// Attach spawn points to a parent.
    AttachSubmodels {
        parent: SubmodelParent,
        configs: Vec<SubmodelConfig>,
    },
    /// Set or clear the trigger of one spawn point, by index.
    SetSubmodelTrigger {
        parent: SubmodelParent,
        index: usize,
        triggered: bool,
    },

    // --- Wingman ---
    WingmanBreak { id: EntityId },
    WingmanJoin { id: EntityId },

    // --- Carrier ---
    SetTurnToLaunch { id: EntityId, enabled: bool },
    SetElevators { id: EntityId, deployed: bool },
    /// Viewer launch-bar state; raises the jet-blast deflectors.
    SetLaunchbar { id: EntityId, engaged: bool },

    // --- Multiplayer ---
    PushMotionPacket { id: EntityId, packet: MotionPacket },
}

impl TrafficCommand {
    /// Entity addressed by this command, if any.
    pub fn target(&self) -> Option<EntityId> {
        match self {
            TrafficCommand::Remove { id }
            | TrafficCommand::SetTargetHeading { id, .. }
            | TrafficCommand::SetTargetAltitude { id, .. }
            | TrafficCommand::SetTargetSpeed { id, .. }
            | TrafficCommand::SetTargetRoll { id, .. }
            | TrafficCommand::WingmanBreak { id }
            | TrafficCommand::WingmanJoin { id }
            | TrafficCommand::SetTurnToLaunch { id, .. }
            | TrafficCommand::SetElevators { id, .. }
            | TrafficCommand::SetLaunchbar { id, .. }
            | TrafficCommand::PushMotionPacket { id, .. } => Some(*id),
            TrafficCommand::AttachSubmodels { parent, .. }
            | TrafficCommand::SetSubmodelTrigger { parent, .. } => match parent {
                SubmodelParent::Entity(id) => Some(*id),
                SubmodelParent::Viewer => None,
            },
        }
    }
}
