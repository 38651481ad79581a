//! Traffic snapshot: the complete readable state after a tick.

use serde::{Deserialize, Serialize};

use crate::components::{Kinematics, RadarContact, Targets};
use crate::enums::*;
use crate::types::{EntityId, SimTime};

/// Complete traffic state, built on demand after a tick.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrafficSnapshot {
    pub time: SimTime,
    pub entities: Vec<EntitySnapshot>,
    pub nearest_thermal: Option<ThermalReading>,
}

impl TrafficSnapshot {
    pub fn entity(&self, id: EntityId) -> Option<&EntitySnapshot> {
        self.entities.iter().find(|e| e.id == id)
    }
}

/// One entity's readable state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntitySnapshot {
    pub id: EntityId,
    pub kind: EntityKind,
    pub name: String,
    pub callsign: String,
    pub kinematics: Kinematics,
    pub targets: Targets,
    pub radar: RadarContact,
    pub dying: bool,
    pub detail: Option<VariantDetail>,
}

/// Behavior-specific readouts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "snake_case")]
pub enum VariantDetail {
    FlightPlan {
        plan: String,
        current_waypoint: Option<String>,
        lead_distance_ft: f64,
        waiting: bool,
    },
    Ship {
        rudder_deg: f64,
    },
    Carrier {
        mode: CarrierMode,
        rel_wind_from_deg: f64,
        rel_wind_speed_kt: f64,
        in_to_wind: bool,
        wave_off_lights: bool,
        elevator_position: f64,
        jbd_position: f64,
        flols_source: u8,
        flols_distance_m: f64,
        tacan_channel_id: String,
    },
    Ballistic {
        azimuth_deg: f64,
        elevation_deg: f64,
        speed_fps: f64,
        life_remaining_secs: f64,
    },
    Wingman {
        phase: WingmanPhase,
    },
    Thermal {
        stage: ThermalStage,
        strength_fps: f64,
    },
    Storm {
        diameter_ft: f64,
        height_ft: f64,
        turbulence: f64,
        lightning: bool,
    },
}

/// The globally nearest thermal and the vertical air speed it produces at
/// the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThermalReading {
    pub id: EntityId,
    pub range_ft: f64,
    pub strength_fps: f64,
}
