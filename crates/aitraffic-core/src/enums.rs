//! Enumeration types used throughout the simulation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Behavior variant of an entity. Selected at spawn by its type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Aircraft,
    Ship,
    Carrier,
    Ballistic,
    GroundVehicle,
    Escort,
    Wingman,
    Multiplayer,
    Thermal,
    Storm,
    Static,
}

impl EntityKind {
    pub const ALL: [EntityKind; 11] = [
        EntityKind::Aircraft,
        EntityKind::Ship,
        EntityKind::Carrier,
        EntityKind::Ballistic,
        EntityKind::GroundVehicle,
        EntityKind::Escort,
        EntityKind::Wingman,
        EntityKind::Multiplayer,
        EntityKind::Thermal,
        EntityKind::Storm,
        EntityKind::Static,
    ];

    /// Resolve a scenario type tag. Accepts the common aliases.
    pub fn from_tag(tag: &str) -> Option<EntityKind> {
        let kind = match tag.trim().to_ascii_lowercase().as_str() {
            "aircraft" | "tanker" => EntityKind::Aircraft,
            "ship" => EntityKind::Ship,
            "carrier" => EntityKind::Carrier,
            "ballistic" | "rocket" => EntityKind::Ballistic,
            "groundvehicle" | "ground_vehicle" | "gv" => EntityKind::GroundVehicle,
            "escort" => EntityKind::Escort,
            "wingman" => EntityKind::Wingman,
            "multiplayer" => EntityKind::Multiplayer,
            "thermal" => EntityKind::Thermal,
            "storm" => EntityKind::Storm,
            "static" => EntityKind::Static,
            _ => return None,
        };
        Some(kind)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Aircraft => "aircraft",
            EntityKind::Ship => "ship",
            EntityKind::Carrier => "carrier",
            EntityKind::Ballistic => "ballistic",
            EntityKind::GroundVehicle => "groundvehicle",
            EntityKind::Escort => "escort",
            EntityKind::Wingman => "wingman",
            EntityKind::Multiplayer => "multiplayer",
            EntityKind::Thermal => "thermal",
            EntityKind::Storm => "storm",
            EntityKind::Static => "static",
        }
    }

    /// Collision extent `(height_ft, length_ft)`, or `None` for kinds with
    /// no meaningful physical extent.
    pub fn collision_extent(&self) -> Option<(f64, f64)> {
        match self {
            EntityKind::Aircraft => Some((50.0, 100.0)),
            EntityKind::Ship => Some((100.0, 200.0)),
            EntityKind::Carrier => Some((250.0, 750.0)),
            EntityKind::Static => Some((50.0, 200.0)),
            EntityKind::Wingman => Some((50.0, 100.0)),
            EntityKind::GroundVehicle => Some((20.0, 40.0)),
            EntityKind::Escort => Some((100.0, 200.0)),
            EntityKind::Multiplayer => Some((50.0, 100.0)),
            EntityKind::Ballistic | EntityKind::Storm | EntityKind::Thermal => None,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aircraft performance class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceClass {
    Light,
    Ww2Fighter,
    #[default]
    JetTransport,
    JetFighter,
    Tanker,
    Ufo,
}

impl PerformanceClass {
    /// Resolve a class name; unknown names fall back to the default class.
    pub fn from_tag(tag: &str) -> PerformanceClass {
        match tag.trim().to_ascii_lowercase().as_str() {
            "light" => PerformanceClass::Light,
            "ww2_fighter" => PerformanceClass::Ww2Fighter,
            "jet_fighter" => PerformanceClass::JetFighter,
            "tanker" => PerformanceClass::Tanker,
            "ufo" => PerformanceClass::Ufo,
            _ => PerformanceClass::JetTransport,
        }
    }
}

/// Why an entity was marked for removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalReason {
    /// `remove(id)` or a `Remove` command.
    Requested,
    /// Life timer ran out.
    Expired,
    /// Altitude dropped below the hard floor.
    BelowFloor,
    /// Ballistic impact on terrain or another entity.
    Impact,
    /// Flight plan reached END without repeat.
    PlanFinished,
    /// Station-keeping parent not found.
    ParentLost,
    /// Behavior update failed.
    Fault,
    /// Referenced flight plan does not exist.
    MissingFlightPlan,
}

/// One-shot report kinds emitted by ballistic entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    Impact,
    Collision,
    Expiry,
}

/// Wingman formation phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WingmanPhase {
    #[default]
    Formate,
    Break,
    Join,
}

/// Side a wingman breaks toward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakSide {
    Left,
    #[default]
    Right,
}

impl BreakSide {
    pub fn sign(&self) -> f64 {
        match self {
            BreakSide::Left => -1.0,
            BreakSide::Right => 1.0,
        }
    }
}

/// Thermal life-cycle stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThermalStage {
    Forming,
    #[default]
    Formed,
    Dying,
    Dead,
}

/// What a carrier is steering for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CarrierMode {
    #[default]
    BaseCourse,
    TurnToLaunch,
    ReturnToBox,
}
