//! Already-validated initial state handed to `spawn`.
//!
//! Scenario files are parsed elsewhere; these records are what a scenario
//! entry becomes once decoded. Every behavior-specific parameter block has
//! sensible defaults so a minimal record spawns a working entity.

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::enums::{BreakSide, PerformanceClass};
use crate::types::{GeoPosition, NedVelocity, Orientation};

/// Initial state common to every entity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InitialState {
    pub name: String,
    pub callsign: String,
    pub position: GeoPosition,
    pub orientation: Orientation,
    pub speed_kt: f64,
    pub vertical_speed_fpm: f64,
    pub performance_class: Option<PerformanceClass>,
    pub flight_plan: Option<FlightPlanSource>,
    pub params: Option<VariantParams>,
    pub submodels: Vec<SubmodelConfig>,
}

impl InitialState {
    pub fn at(position: GeoPosition, heading_deg: f64, speed_kt: f64) -> Self {
        Self {
            position,
            orientation: Orientation::new(heading_deg, 0.0, 0.0),
            speed_kt,
            ..Default::default()
        }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn with_params(mut self, params: VariantParams) -> Self {
        self.params = Some(params);
        self
    }

    pub fn with_flight_plan(mut self, source: FlightPlanSource) -> Self {
        self.flight_plan = Some(source);
        self
    }
}

/// Where an entity's waypoints come from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum FlightPlanSource {
    /// A plan registered with the manager under this name.
    Named { name: String, repeat: bool },
    /// Waypoints supplied inline.
    Inline {
        name: String,
        repeat: bool,
        waypoints: Vec<WaypointRecord>,
    },
}

/// Waypoint as supplied by a flight-plan source.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WaypointRecord {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub alt: f64,
    pub ktas: f64,
    /// Cross altitude (ft); values at or below -1000 mean "no constraint".
    pub crossat: f64,
    pub on_ground: bool,
    pub gear_down: bool,
    pub flaps_down: bool,
    /// WAIT duration (s).
    pub time_sec: f64,
    /// WAITUNTIL time of day, "HH:MM:SS".
    pub time: Option<String>,
}

impl Default for WaypointRecord {
    fn default() -> Self {
        Self {
            name: "END".to_string(),
            lat: 0.0,
            lon: 0.0,
            alt: 0.0,
            ktas: 0.0,
            crossat: -10_000.0,
            on_ground: false,
            gear_down: false,
            flaps_down: false,
            time_sec: 0.0,
            time: None,
        }
    }
}

impl WaypointRecord {
    pub fn new(name: &str, lat: f64, lon: f64, alt: f64, ktas: f64) -> Self {
        Self {
            name: name.to_string(),
            lat,
            lon,
            alt,
            ktas,
            ..Default::default()
        }
    }

    pub fn end() -> Self {
        Self::default()
    }
}

/// Behavior-specific parameters, one block per variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "snake_case")]
pub enum VariantParams {
    Aircraft(AircraftParams),
    Ship(ShipParams),
    Carrier(CarrierParams),
    Ballistic(BallisticParams),
    GroundVehicle(GroundVehicleParams),
    Escort(EscortParams),
    Wingman(WingmanParams),
    Multiplayer(MultiplayerParams),
    Thermal(ThermalParams),
    Storm(StormParams),
}

impl VariantParams {
    pub fn label(&self) -> &'static str {
        match self {
            VariantParams::Aircraft(_) => "aircraft",
            VariantParams::Ship(_) => "ship",
            VariantParams::Carrier(_) => "carrier",
            VariantParams::Ballistic(_) => "ballistic",
            VariantParams::GroundVehicle(_) => "groundvehicle",
            VariantParams::Escort(_) => "escort",
            VariantParams::Wingman(_) => "wingman",
            VariantParams::Multiplayer(_) => "multiplayer",
            VariantParams::Thermal(_) => "thermal",
            VariantParams::Storm(_) => "storm",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AircraftParams {
    /// Offers air-to-air refuelling contact to the viewer.
    pub tanker: bool,
    /// Initial target altitude (ft). Defaults to the spawn altitude.
    pub target_altitude_ft: Option<f64>,
    /// Initial target speed (kt). Defaults to the spawn speed.
    pub target_speed_kt: Option<f64>,
    /// Height of the gear above ground when on the ground (ft).
    pub ground_offset_ft: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShipParams {
    pub base_turn_radius_ft: f64,
    pub rudder_rate_deg_s: f64,
    pub accel_kt_s: f64,
    /// Empirical speed-dependent turn curve and rudder limit ("ship" type).
    /// Off for small craft that keep the base radius.
    pub speed_dependent_turn: bool,
    pub max_speed_kt: f64,
}

impl Default for ShipParams {
    fn default() -> Self {
        Self {
            base_turn_radius_ft: SHIP_BASE_TURN_RADIUS_FT,
            rudder_rate_deg_s: SHIP_RUDDER_RATE,
            accel_kt_s: SHIP_ACCEL_KT_S,
            speed_dependent_turn: true,
            max_speed_kt: 40.0,
        }
    }
}

/// Named parking spot on a carrier deck.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParkingPosition {
    pub name: String,
    /// Body-frame offset (m): x forward, y right, z up.
    pub offset_m: [f64; 3],
    pub heading_offset_deg: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CarrierParams {
    pub ship: ShipParams,
    pub pennant_number: String,
    pub tacan_channel_id: String,
    /// Operating box half-extents (deg) around the spawn point.
    pub max_lat: f64,
    pub min_lat: f64,
    pub max_long: f64,
    pub min_long: f64,
    /// FLOLS lens offset from the carrier origin, body frame (m).
    pub flols_offset_m: [f64; 3],
    pub parking_positions: Vec<ParkingPosition>,
    pub elevator_transition_secs: f64,
    pub elevator_tau_secs: f64,
    pub jbd_transition_secs: f64,
    pub jbd_tau_secs: f64,
}

impl Default for CarrierParams {
    fn default() -> Self {
        Self {
            ship: ShipParams {
                speed_dependent_turn: false,
                ..ShipParams::default()
            },
            pennant_number: String::new(),
            tacan_channel_id: CARRIER_DEFAULT_TACAN.to_string(),
            max_lat: 0.0,
            min_lat: 0.0,
            max_long: 0.0,
            min_long: 0.0,
            flols_offset_m: [0.0; 3],
            parking_positions: Vec::new(),
            elevator_transition_secs: 5.0,
            elevator_tau_secs: 0.5,
            jbd_transition_secs: 3.0,
            jbd_tau_secs: 0.1,
        }
    }
}

/// Constant external force acting on a ballistic entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExternalForce {
    /// Force magnitude (lbf).
    pub magnitude_lbf: f64,
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BallisticParams {
    /// Azimuth of the velocity vector (deg).
    pub azimuth_deg: f64,
    /// Elevation of the velocity vector (deg).
    pub elevation_deg: f64,
    /// Initial speed along the velocity vector (ft/s).
    pub speed_fps: f64,
    pub drag_area_ft2: f64,
    pub cd: f64,
    pub mass_slug: f64,
    /// Life (s); -1 never expires.
    pub life_secs: f64,
    /// Upward acceleration offsetting gravity (ft/s²).
    pub buoyancy_fps2: f64,
    pub wind: bool,
    pub external_force: Option<ExternalForce>,
    pub aero_stabilised: bool,
    pub force_stabilised: bool,
    pub report_impact: bool,
    pub report_collision: bool,
    pub report_expiry: bool,
    /// Survive impact and come to rest instead of being removed.
    pub persistent: bool,
    /// Ride along with the parent until the parent is gone.
    pub slave_to_parent: bool,
    /// Collision query radius (ft).
    pub fuse_range_ft: f64,
    pub ground_offset_ft: f64,
    /// Entity this projectile was released from, excluded from collisions.
    pub parent: Option<crate::types::EntityId>,
    /// Submodel released once at the impact point.
    pub impact_submodel: Option<Box<SubmodelConfig>>,
    /// Nesting depth of the submodel chain that produced this entity.
    pub depth: u32,
}

impl Default for BallisticParams {
    fn default() -> Self {
        Self {
            azimuth_deg: 0.0,
            elevation_deg: 0.0,
            speed_fps: 0.0,
            drag_area_ft2: BALLISTIC_DEFAULT_DRAG_AREA,
            cd: BALLISTIC_DEFAULT_CD,
            mass_slug: 0.25 * LBS_TO_SLUGS,
            life_secs: DEFAULT_LIFE_SECS,
            buoyancy_fps2: 0.0,
            wind: false,
            external_force: None,
            aero_stabilised: true,
            force_stabilised: false,
            report_impact: false,
            report_collision: false,
            report_expiry: false,
            persistent: false,
            slave_to_parent: false,
            fuse_range_ft: 0.0,
            ground_offset_ft: BALLISTIC_GROUND_OFFSET_FT,
            parent: None,
            impact_submodel: None,
            depth: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundVehicleParams {
    /// Name of the entity this vehicle tows or follows.
    pub parent: String,
    pub x_offset_ft: f64,
    pub y_offset_ft: f64,
    pub z_offset_ft: f64,
    /// Hitch position on the parent, aft of its origin (ft).
    pub parent_x_offset_ft: f64,
    pub tow_angle_gain: f64,
    pub tow_angle_limit_deg: f64,
    /// Lag time constant for tow angle and speed (s).
    pub lag_secs: f64,
    pub max_speed_kt: f64,
    pub length_ft: f64,
}

impl Default for GroundVehicleParams {
    fn default() -> Self {
        Self {
            parent: String::new(),
            x_offset_ft: 0.0,
            y_offset_ft: 0.0,
            z_offset_ft: 0.0,
            parent_x_offset_ft: TOW_HITCH_OFFSET_FT,
            tow_angle_gain: 2.0,
            tow_angle_limit_deg: 2.0,
            lag_secs: 1.0,
            max_speed_kt: 80.0,
            length_ft: 20.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EscortParams {
    pub parent: String,
    /// Station range from the parent (ft).
    pub station_range_ft: f64,
    /// Station bearing relative to the parent heading (deg).
    pub station_bearing_deg: f64,
    pub station_height_ft: f64,
    /// Distance from station treated as on station (ft).
    pub station_tolerance_ft: f64,
    pub angle_limit_deg: f64,
    pub max_speed_kt: f64,
    pub min_speed_kt: f64,
    pub patrol: bool,
    /// Heading smoothing time constant (s).
    pub angle_lag_secs: f64,
    pub ship: ShipParams,
}

impl Default for EscortParams {
    fn default() -> Self {
        Self {
            parent: String::new(),
            station_range_ft: 1000.0,
            station_bearing_deg: 0.0,
            station_height_ft: 0.0,
            station_tolerance_ft: 50.0,
            angle_limit_deg: 20.0,
            max_speed_kt: 30.0,
            min_speed_kt: 5.0,
            patrol: false,
            angle_lag_secs: 2.0,
            ship: ShipParams {
                speed_dependent_turn: false,
                rudder_rate_deg_s: 5.0,
                accel_kt_s: 2.0,
                ..ShipParams::default()
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WingmanParams {
    pub parent: String,
    /// Formation offset, parent body frame (ft): x forward, y right, z up.
    pub x_offset_ft: f64,
    pub y_offset_ft: f64,
    pub z_offset_ft: f64,
    /// Offset convergence time constant (s).
    pub formate_lag_secs: f64,
    pub break_angle_deg: f64,
    pub break_side: BreakSide,
    pub break_duration_secs: f64,
    pub join_tolerance_ft: f64,
    pub max_speed_kt: f64,
    pub max_bank_deg: f64,
}

impl Default for WingmanParams {
    fn default() -> Self {
        Self {
            parent: String::new(),
            x_offset_ft: -100.0,
            y_offset_ft: 100.0,
            z_offset_ft: 0.0,
            formate_lag_secs: 1.0,
            break_angle_deg: 45.0,
            break_side: BreakSide::Right,
            break_duration_secs: 10.0,
            join_tolerance_ft: 100.0,
            max_speed_kt: 500.0,
            max_bank_deg: 60.0,
        }
    }
}

/// One already-deserialized position report of a remote player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MotionPacket {
    /// Sender simulation time (s).
    pub time: f64,
    /// Sender-reported transmission lag (s).
    pub lag: f64,
    pub position: GeoPosition,
    pub orientation: Orientation,
    pub velocity: NedVelocity,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MultiplayerParams {
    pub tanker: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThermalParams {
    /// Peak updraft (ft/s). Negative makes a sink.
    pub max_strength_fps: f64,
    /// Diameter (nm).
    pub diameter_nm: f64,
    /// Thermal top (ft MSL).
    pub height_ft: f64,
    /// Start point in the life cycle, as a fraction of the cycle.
    pub cycle_start: f64,
}

impl Default for ThermalParams {
    fn default() -> Self {
        Self {
            max_strength_fps: 8.0,
            diameter_nm: 0.5,
            height_ft: 5000.0,
            cycle_start: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StormParams {
    pub diameter_ft: f64,
    pub height_ft: f64,
    pub turbulence: f64,
    pub strength_fps: f64,
    pub lightning: bool,
}

impl Default for StormParams {
    fn default() -> Self {
        Self {
            diameter_ft: 20_000.0,
            height_ft: 30_000.0,
            turbulence: 0.5,
            strength_fps: 0.0,
            lightning: false,
        }
    }
}

/// A spawn point on a parent that releases ballistic children.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmodelConfig {
    pub name: String,
    pub model: String,
    /// Muzzle speed along the release vector (ft/s).
    pub speed_fps: f64,
    /// Seconds between releases while triggered.
    pub delay_secs: f64,
    /// Releases remaining; -1 is unlimited.
    pub count: i32,
    /// Body offsets from the parent origin (ft): x forward, y right, z up.
    pub x_offset_ft: f64,
    pub y_offset_ft: f64,
    pub z_offset_ft: f64,
    pub yaw_offset_deg: f64,
    pub pitch_offset_deg: f64,
    pub drag_area_ft2: f64,
    pub life_secs: f64,
    pub buoyancy_fps2: f64,
    pub wind: bool,
    pub cd: f64,
    pub weight_lb: f64,
    /// Payload weight added to the mass of the next release (lb).
    pub contents_lb: f64,
    pub aero_stabilised: bool,
    pub report_impact: bool,
    pub report_collision: bool,
    pub report_expiry: bool,
    pub fuse_range_ft: f64,
    /// Trigger automatically while the parent is above contrail altitude.
    pub contrail: bool,
    pub impact_submodel: Option<Box<SubmodelConfig>>,
}

impl Default for SubmodelConfig {
    fn default() -> Self {
        Self {
            name: "none_defined".to_string(),
            model: String::new(),
            speed_fps: SUBMODEL_DEFAULT_SPEED_FPS,
            delay_secs: 0.25,
            count: 1,
            x_offset_ft: 0.0,
            y_offset_ft: 0.0,
            z_offset_ft: 0.0,
            yaw_offset_deg: 0.0,
            pitch_offset_deg: 0.0,
            drag_area_ft2: 0.034,
            life_secs: DEFAULT_LIFE_SECS,
            buoyancy_fps2: 0.0,
            wind: false,
            cd: 0.193,
            weight_lb: 0.25,
            contents_lb: 0.0,
            aero_stabilised: true,
            report_impact: false,
            report_collision: false,
            report_expiry: false,
            fuse_range_ft: 0.0,
            contrail: false,
            impact_submodel: None,
        }
    }
}
