//! Simulation constants and tuning defaults.

// --- Units ---

/// Knots to feet per second, as used by the AI kinematic models.
pub const KT_TO_FPS: f64 = 1.686;

/// Feet per nautical mile.
pub const FT_PER_NM: f64 = 6_076.115_49;

pub const FT_TO_M: f64 = 0.3048;

pub const M_TO_FT: f64 = 1.0 / FT_TO_M;

/// Pounds (mass) to slugs.
pub const LBS_TO_SLUGS: f64 = 0.031_080_950_172;

// --- Lifecycle ---

/// Default life of a ballistic entity (seconds).
pub const DEFAULT_LIFE_SECS: f64 = 900.0;

/// Life value meaning "never expires".
pub const INFINITE_LIFE: f64 = -1.0;

/// Altitude below which any entity is removed (ft).
pub const ALTITUDE_FLOOR_FT: f64 = -1000.0;

// --- Radar ---

/// Default radar range (nm) used for the in-range test.
pub const DEFAULT_RADAR_RANGE_NM: f64 = 100.0;

/// Margin applied to the radar range for the in-range test.
pub const RADAR_RANGE_MARGIN: f64 = 1.1;

/// Tanker contact range (ft).
pub const TANKER_CONTACT_RANGE_FT: f64 = 250.0;

// --- Aircraft ---

/// Turn-radius coefficient for banked flight: r = k * v² / tan(bank).
pub const AIRCRAFT_TURN_RADIUS_COEFF: f64 = 0.088_362;

/// Speed (kt) at or below which the bank turn radius is pinned to 1 ft.
pub const AIRCRAFT_MIN_TURN_SPEED_KT: f64 = 1.0;

/// Pitch per fpm of climb (deg).
pub const PITCH_PER_FPM_CLIMB: f64 = 0.005;

/// Pitch per fpm of descent (deg).
pub const PITCH_PER_FPM_DESCENT: f64 = 0.002;

/// Altitude error (ft) inside which the cross-altitude law caps vertical speed.
pub const CROSSAT_CAPTURE_BAND_FT: f64 = 1500.0;

/// Minimum vertical speed magnitude (fpm) under the cross-altitude law.
pub const CROSSAT_MIN_VS_FPM: f64 = 100.0;

/// Target speed bleed per tick when stuck circling.
pub const SPIN_SPEED_BLEED: f64 = 0.999;

/// Ground altitude error (ft) beyond which an on-ground entity is snapped.
pub const GROUND_SNAP_FT: f64 = 1000.0;

/// Fraction of ground altitude error closed per update.
pub const GROUND_FOLLOW_GAIN: f64 = 0.1;

// --- Ship ---

/// Default ship base turn radius (ft).
pub const SHIP_BASE_TURN_RADIUS_FT: f64 = 2000.0;

/// Rudder angle (deg) below which a ship goes straight.
pub const SHIP_RUDDER_DEADZONE_DEG: f64 = 0.25;

/// Roll per knot per degree of rudder.
pub const SHIP_ROLL_FACTOR: f64 = -0.008_333_5;

/// Roll smoothing time constant (s).
pub const SHIP_ROLL_TAU_SECS: f64 = 8.0;

/// Default rudder slew rate (deg/s).
pub const SHIP_RUDDER_RATE: f64 = 0.5;

/// Default ship acceleration (kt/s).
pub const SHIP_ACCEL_KT_S: f64 = 0.5;

/// Heading error (deg) below which target rudder is proportional.
pub const SHIP_PROPORTIONAL_RUDDER_DEG: f64 = 15.0;

/// Full rudder (deg).
pub const SHIP_FULL_RUDDER_DEG: f64 = 45.0;

// --- Carrier ---

/// Default carrier TACAN channel.
pub const CARRIER_DEFAULT_TACAN: &str = "029Y";

/// Wind-over-deck target for launch (kt).
pub const CARRIER_LAUNCH_WIND_KT: f64 = 25.0;

/// Minimum carrier speed while turned into wind (kt).
pub const CARRIER_MIN_LAUNCH_SPEED_KT: f64 = 10.0;

/// Relative wind (deg) inside which the deck is "in to wind".
pub const CARRIER_IN_TO_WIND_DEG: f64 = 5.0;

/// Distance (nm) from the box origin at which a returning carrier resumes base course.
pub const CARRIER_BOX_RETURN_NM: f64 = 1.0;

/// FLOLS glide-slope band edges (deg), high to low.
pub const FLOLS_BANDS_DEG: [f64; 6] = [4.35, 4.01, 3.67, 3.33, 2.99, 2.65];

// --- Ballistic ---

/// Default equivalent drag area (ft²).
pub const BALLISTIC_DEFAULT_DRAG_AREA: f64 = 0.007;

/// Default base drag coefficient.
pub const BALLISTIC_DEFAULT_CD: f64 = 0.029;

/// Default height above ground treated as "on the ground" (ft).
pub const BALLISTIC_GROUND_OFFSET_FT: f64 = 10.0;

/// Stabilisation lag time constant (s).
pub const BALLISTIC_STABILISATION_TAU: f64 = 0.1;

/// Maximum nesting depth of impact submodels.
pub const MAX_SUBMODEL_DEPTH: u32 = 4;

// --- Submodels ---

/// Parent altitude (ft) above which contrail submodels auto-trigger.
pub const CONTRAIL_ALTITUDE_FT: f64 = 30_000.0;

/// Default submodel muzzle speed (ft/s).
pub const SUBMODEL_DEFAULT_SPEED_FPS: f64 = 2329.4;

// --- Ground vehicle ---

/// Default hitch x-offset (ft).
pub const TOW_HITCH_OFFSET_FT: f64 = 38.55;

/// Range (ft) beyond which a towed vehicle runs the rescue path.
pub const TOW_RESCUE_RANGE_FT: f64 = 1000.0;

/// Consecutive ticks a station-keeper may go without finding its parent.
pub const PARENT_LOOKUP_RETRIES: u32 = 10;

// --- Escort ---

/// Escort speed bias far from station (kt).
pub const ESCORT_LARGE_BIAS_KT: f64 = 5.0;

/// Escort speed bias near station (kt).
pub const ESCORT_SMALL_BIAS_KT: f64 = 1.0;

/// Multiple of the station tolerance beyond which the large bias applies.
pub const ESCORT_LARGE_BIAS_FACTOR: f64 = 10.0;

/// Multiple of the station tolerance beyond which the escort runs to station.
pub const ESCORT_RESCUE_FACTOR: f64 = 50.0;

/// Patrol perturbation period (s).
pub const ESCORT_PATROL_PERIOD_SECS: f64 = 5.0;

// --- Multiplayer ---

/// Lag-adjust gain when the clock runs ahead.
pub const MP_LAG_ADJUST_SPEED: f64 = 10.0;

/// Maximum lag-adjust rate when the clock runs behind.
pub const MP_LAG_ADJUST_MAX_RATE: f64 = 0.5;

/// Maximum extrapolation beyond the newest packet (s).
pub const MP_MAX_EXTRAPOLATION_SECS: f64 = 5.0;

/// Extrapolation integration step (s).
pub const MP_EXTRAPOLATION_STEP_SECS: f64 = 0.1;

/// A packet this much older than the newest (s) resets the buffer.
pub const MP_OUT_OF_ORDER_RESET_SECS: f64 = 10.0;

// --- Thermal ---

/// Full thermal life cycle (s).
pub const THERMAL_CYCLE_SECS: f64 = 25.0 * 60.0;

/// Ground elevation refresh interval for thermals (s).
pub const THERMAL_GROUND_REFRESH_SECS: f64 = 10.0;

/// Background sink outside any thermal (ft/s).
pub const THERMAL_GLOBAL_SINK_FPS: f64 = -1.0;
