//! Empirically tuned constants, exposed as configuration.
//!
//! Defaults reproduce the classic traffic behavior. None of these values is
//! known to generalize beyond the performance classes they were tuned on.

use serde::{Deserialize, Serialize};

/// How the lead distance is derived from turn radius and course change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadLaw {
    /// `radius * sin(delta)`.
    #[default]
    Sine,
    /// `radius * tan(delta / 2)`, the tangent point of a circular arc.
    HalfAngleTangent,
}

/// Waypoint-sequencer tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightPlanTuning {
    /// Seconds between sequencer polls.
    pub poll_interval_secs: f64,
    /// Upper bound of the random extra delay added to each poll interval.
    pub poll_jitter_secs: f64,
    /// Below this speed (kt) the turn radius uses the ground turn rate.
    pub slow_speed_kt: f64,
    pub ground_turn_rate_deg_s: f64,
    /// `radius_ft = coeff * v_kt²`, roughly a 25° bank turn.
    pub bank_radius_coeff: f64,
    pub lead_law: LeadLaw,
    /// Below this speed (kt) the lead distance is pinned to `min_lead_ft`.
    pub min_lead_speed_kt: f64,
    pub min_lead_ft: f64,
    /// The evaluated lead distance never drops below `multiplier * |speed|`.
    pub lead_floor_multiplier: f64,
    /// Bearing error (deg) above which the heading target is re-issued.
    pub heading_tolerance_deg: f64,
    /// Speed change (kt) that triggers a lead distance refresh.
    pub lead_refresh_speed_kt: f64,
}

impl Default for FlightPlanTuning {
    fn default() -> Self {
        Self {
            poll_interval_secs: 0.1,
            poll_jitter_secs: 0.05,
            slow_speed_kt: 25.0,
            ground_turn_rate_deg_s: 30.0,
            bank_radius_coeff: 0.1911,
            lead_law: LeadLaw::Sine,
            min_lead_speed_kt: 0.5,
            min_lead_ft: 0.5,
            lead_floor_multiplier: 2.0,
            heading_tolerance_deg: 0.01,
            lead_refresh_speed_kt: 10.0,
        }
    }
}

/// Deadbands and rates of the piloted kinematic filters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KinematicTuning {
    pub speed_deadband_kt: f64,
    pub bank_deadband_deg: f64,
    pub vs_deadband_fpm: f64,
    pub pitch_deadband_deg: f64,
    pub bank_rate_deg_s: f64,
    pub vertical_accel_fpm_s: f64,
    pub pitch_rate_deg_s: f64,
}

impl Default for KinematicTuning {
    fn default() -> Self {
        Self {
            speed_deadband_kt: 0.2,
            bank_deadband_deg: 0.2,
            vs_deadband_fpm: 10.0,
            pitch_deadband_deg: 0.1,
            bank_rate_deg_s: 5.0,
            vertical_accel_fpm_s: 900.0,
            pitch_rate_deg_s: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub flight_plan: FlightPlanTuning,
    pub kinematics: KinematicTuning,
}
