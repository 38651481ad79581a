//! ECS components shared by every entity.
//!
//! Every live entity carries exactly this set. Behavior-specific state
//! lives in the behavior itself, not in extra components.

use serde::{Deserialize, Serialize};

use crate::enums::*;
use crate::types::{EntityId, GeoPosition, Orientation};

/// Who an entity is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub name: String,
    pub callsign: String,
}

/// Current kinematic state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Kinematics {
    pub position: GeoPosition,
    pub orientation: Orientation,
    /// True airspeed (aircraft) or speed over ground (surface craft), knots.
    pub speed_kt: f64,
    /// Feet per minute, positive up.
    pub vertical_speed_fpm: f64,
}

impl Kinematics {
    pub fn is_finite(&self) -> bool {
        self.position.is_finite()
            && self.orientation.is_finite()
            && self.speed_kt.is_finite()
            && self.vertical_speed_fpm.is_finite()
    }
}

/// Commanded state the behaviors converge toward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Targets {
    pub heading_deg: f64,
    pub altitude_ft: f64,
    pub speed_kt: f64,
    pub roll_deg: f64,
    /// Target vertical speed (fpm).
    pub vertical_speed_fpm: f64,
    /// Bank/rudder is derived from the heading error.
    pub heading_lock: bool,
    /// Vertical speed is derived from the altitude error.
    pub altitude_lock: bool,
    /// Vertical speed is capped by the performance table rather than the
    /// cross-altitude law.
    pub use_perf_vs: bool,
}

/// Position of the entity relative to the viewer, recomputed every tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RadarContact {
    /// True bearing from the viewer (deg).
    pub bearing_deg: f64,
    pub range_nm: f64,
    /// Elevation above the viewer's horizon (deg).
    pub elevation_deg: f64,
    /// Bearing relative to the viewer's heading, ±180 (deg).
    pub horiz_offset_deg: f64,
    /// Elevation relative to the viewer's pitch (deg).
    pub vert_offset_deg: f64,
    pub x_shift: f64,
    pub y_shift: f64,
    /// Entity heading relative to the viewer heading, [0, 360).
    pub rotation_deg: f64,
    pub in_range: bool,
}

/// Removal state and life timer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Lifecycle {
    pub dying: bool,
    pub reason: Option<RemovalReason>,
    /// Remaining life (s); negative means unlimited.
    pub life_secs: f64,
    pub age_secs: f64,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self {
            dying: false,
            reason: None,
            life_secs: crate::constants::INFINITE_LIFE,
            age_secs: 0.0,
        }
    }
}

impl Lifecycle {
    /// Set the removal flag. The first reason given wins.
    pub fn mark_dying(&mut self, reason: RemovalReason) {
        if !self.dying {
            self.dying = true;
            self.reason = Some(reason);
        }
    }
}
