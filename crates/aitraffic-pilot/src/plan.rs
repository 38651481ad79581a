//! Flight plan: an arena of waypoints walked forward by index.
//!
//! The cursor names the *current* waypoint (the one being flown to). The
//! previous and next waypoints are the neighbours of the cursor. Traversal
//! only moves forward; `restart` is the single way back to the start.

use serde::{Deserialize, Serialize};

use aitraffic_core::error::FlightPlanError;
use aitraffic_core::geo::heading_error;
use aitraffic_core::params::WaypointRecord;
use aitraffic_core::types::GeoPosition;

use crate::tuning::{FlightPlanTuning, LeadLaw};
use crate::waypoint::Waypoint;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightPlan {
    name: String,
    repeat: bool,
    waypoints: Vec<Waypoint>,
    cursor: usize,
    lead_distance_ft: f64,
}

impl FlightPlan {
    /// Build a plan from records.
    ///
    /// Sentinels take the position, altitude and speed of the waypoint
    /// before them so every leg has defined geometry. A plan that does not
    /// finish with `"END"` gets one appended.
    pub fn build(name: &str, repeat: bool, records: &[WaypointRecord]) -> Result<Self, FlightPlanError> {
        if records.is_empty() {
            return Err(FlightPlanError::Empty);
        }

        let mut waypoints: Vec<Waypoint> = Vec::with_capacity(records.len() + 1);
        for (index, record) in records.iter().enumerate() {
            let mut wp = Waypoint::from_record(index, record)?;
            if wp.is_sentinel() {
                if let Some(prev) = waypoints.last() {
                    wp.position = prev.position;
                    wp.speed_kt = prev.speed_kt;
                    wp.on_ground = prev.on_ground;
                }
            }
            waypoints.push(wp);
        }

        if !waypoints.last().is_some_and(Waypoint::is_end) {
            let end = WaypointRecord::end();
            let mut wp = Waypoint::from_record(waypoints.len(), &end)?;
            if let Some(prev) = waypoints.last() {
                wp.position = prev.position;
                wp.speed_kt = prev.speed_kt;
                wp.on_ground = prev.on_ground;
            }
            waypoints.push(wp);
        }

        Ok(Self {
            name: name.to_string(),
            repeat,
            waypoints,
            cursor: 0,
            lead_distance_ft: 0.0,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn repeat(&self) -> bool {
        self.repeat
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current(&self) -> Option<&Waypoint> {
        self.waypoints.get(self.cursor)
    }

    pub fn previous(&self) -> Option<&Waypoint> {
        self.cursor.checked_sub(1).and_then(|i| self.waypoints.get(i))
    }

    pub fn next(&self) -> Option<&Waypoint> {
        self.waypoints.get(self.cursor + 1)
    }

    /// Move the cursor one waypoint forward. Returns false at the last one.
    pub fn advance(&mut self) -> bool {
        if self.cursor + 1 < self.waypoints.len() {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    /// Return to the first waypoint. Position is not touched; the owner
    /// flies back.
    pub fn restart(&mut self) {
        self.cursor = 0;
    }

    pub fn lead_distance_ft(&self) -> f64 {
        self.lead_distance_ft
    }

    pub fn set_lead_distance_ft(&mut self, distance_ft: f64) {
        self.lead_distance_ft = distance_ft;
    }

    /// Lead distance actually used for the turn decision at `speed_kt`.
    pub fn effective_lead_ft(&self, speed_kt: f64, tuning: &FlightPlanTuning) -> f64 {
        self.lead_distance_ft
            .max(tuning.lead_floor_multiplier * speed_kt.abs())
    }

    /// Recompute the lead distance for the turn at the current waypoint,
    /// from the inbound course and the current→next leg.
    ///
    /// `radius_override_ft` replaces the speed-based turn radius estimate
    /// (ships pass their own turning circle).
    pub fn update_lead_distance(
        &mut self,
        speed_kt: f64,
        inbound_deg: f64,
        radius_override_ft: Option<f64>,
        tuning: &FlightPlanTuning,
    ) {
        let (Some(current), Some(next)) = (self.current(), self.next()) else {
            return;
        };
        // no turn onto a sentinel leg; the heading is kept
        let outbound = if next.is_sentinel() {
            inbound_deg
        } else {
            current.position.bearing_deg_to(&next.position)
        };
        self.lead_distance_ft = lead_distance_ft(speed_kt, inbound_deg, outbound, radius_override_ft, tuning);
    }

    pub fn distance_to_go_ft(&self, from: &GeoPosition) -> Option<f64> {
        self.current().map(|wp| from.distance_ft_to(&wp.position))
    }

    pub fn bearing_to_current(&self, from: &GeoPosition) -> Option<f64> {
        self.current().map(|wp| from.bearing_deg_to(&wp.position))
    }

    /// True once the distance to the current waypoint is inside the
    /// effective lead distance.
    pub fn lead_point_reached(&self, from: &GeoPosition, speed_kt: f64, tuning: &FlightPlanTuning) -> bool {
        match self.distance_to_go_ft(from) {
            Some(dist) => dist < self.effective_lead_ft(speed_kt, tuning),
            None => false,
        }
    }
}

/// Estimated turn radius (ft) at `speed_kt`.
pub fn estimated_turn_radius_ft(speed_kt: f64, tuning: &FlightPlanTuning) -> f64 {
    let speed = speed_kt.abs();
    if speed < tuning.slow_speed_kt {
        // a full circle at the ground turn rate, divided by 2π
        let full_turn_secs = 360.0 / tuning.ground_turn_rate_deg_s;
        full_turn_secs * speed / (2.0 * std::f64::consts::PI)
    } else {
        tuning.bank_radius_coeff * speed * speed
    }
}

/// Distance before a waypoint (ft) at which the turn onto the next leg
/// must begin.
pub fn lead_distance_ft(
    speed_kt: f64,
    inbound_deg: f64,
    outbound_deg: f64,
    radius_override_ft: Option<f64>,
    tuning: &FlightPlanTuning,
) -> f64 {
    if speed_kt.abs() < tuning.min_lead_speed_kt {
        return tuning.min_lead_ft;
    }
    let radius = radius_override_ft.unwrap_or_else(|| estimated_turn_radius_ft(speed_kt, tuning));
    let delta = heading_error(inbound_deg, outbound_deg).abs().to_radians();
    match tuning.lead_law {
        LeadLaw::Sine => radius * delta.sin(),
        LeadLaw::HalfAngleTangent => radius * (delta / 2.0).tan(),
    }
}
