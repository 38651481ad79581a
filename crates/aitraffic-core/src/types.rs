//! Fundamental geodetic and simulation types.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geo::{self, LocalScale};

/// Unique entity identifier. Issued monotonically from 1; 0 is never valid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl EntityId {
    /// The reserved invalid id.
    pub const INVALID: EntityId = EntityId(0);

    pub fn is_valid(&self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Geodetic position. Latitude/longitude in degrees, altitude in feet MSL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoPosition {
    pub lat_deg: f64,
    pub lon_deg: f64,
    pub alt_ft: f64,
}

impl GeoPosition {
    pub fn new(lat_deg: f64, lon_deg: f64, alt_ft: f64) -> Self {
        Self {
            lat_deg,
            lon_deg,
            alt_ft,
        }
    }

    /// North/east offset in feet from `self` to `other`, using the local
    /// scale at `self`'s latitude.
    pub fn offset_ft_to(&self, other: &GeoPosition) -> (f64, f64) {
        let scale = LocalScale::at(self.lat_deg);
        let north = (other.lat_deg - self.lat_deg) * scale.ft_per_deg_lat;
        let east = (other.lon_deg - self.lon_deg) * scale.ft_per_deg_lon;
        (north, east)
    }

    /// Horizontal distance in feet (altitude ignored).
    pub fn distance_ft_to(&self, other: &GeoPosition) -> f64 {
        let (north, east) = self.offset_ft_to(other);
        (north * north + east * east).sqrt()
    }

    /// Straight-line distance in feet including the altitude difference.
    pub fn slant_distance_ft_to(&self, other: &GeoPosition) -> f64 {
        let horizontal = self.distance_ft_to(other);
        let dz = other.alt_ft - self.alt_ft;
        (horizontal * horizontal + dz * dz).sqrt()
    }

    /// True bearing in degrees [0, 360) from `self` to `other`.
    /// Coincident points yield 0.
    pub fn bearing_deg_to(&self, other: &GeoPosition) -> f64 {
        let (north, east) = self.offset_ft_to(other);
        geo::bearing_from_components(north, east)
    }

    /// Move by a north/east/up displacement in feet.
    pub fn displaced(&self, north_ft: f64, east_ft: f64, up_ft: f64) -> GeoPosition {
        let scale = LocalScale::at(self.lat_deg);
        GeoPosition {
            lat_deg: self.lat_deg + north_ft / scale.ft_per_deg_lat,
            lon_deg: self.lon_deg + scale.east_ft_to_deg(east_ft),
            alt_ft: self.alt_ft + up_ft,
        }
    }

    /// Point at `distance_ft` along `bearing_deg` from `self`, same altitude.
    pub fn project(&self, bearing_deg: f64, distance_ft: f64) -> GeoPosition {
        let rad = bearing_deg.to_radians();
        self.displaced(rad.cos() * distance_ft, rad.sin() * distance_ft, 0.0)
    }

    pub fn is_finite(&self) -> bool {
        self.lat_deg.is_finite() && self.lon_deg.is_finite() && self.alt_ft.is_finite()
    }
}

/// Body attitude in degrees. Heading is true, clockwise from north.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Orientation {
    pub heading_deg: f64,
    pub pitch_deg: f64,
    pub roll_deg: f64,
}

impl Orientation {
    pub fn new(heading_deg: f64, pitch_deg: f64, roll_deg: f64) -> Self {
        Self {
            heading_deg,
            pitch_deg,
            roll_deg,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.heading_deg.is_finite() && self.pitch_deg.is_finite() && self.roll_deg.is_finite()
    }
}

/// Velocity resolved in the local north/east/down frame (ft/s).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NedVelocity {
    pub north_fps: f64,
    pub east_fps: f64,
    pub down_fps: f64,
}

impl NedVelocity {
    pub fn new(north_fps: f64, east_fps: f64, down_fps: f64) -> Self {
        Self {
            north_fps,
            east_fps,
            down_fps,
        }
    }

    /// Horizontal velocity from a speed in knots along a heading.
    pub fn from_heading(heading_deg: f64, speed_kt: f64, vertical_fpm: f64) -> Self {
        let fps = speed_kt * crate::constants::KT_TO_FPS;
        let rad = heading_deg.to_radians();
        Self {
            north_fps: rad.cos() * fps,
            east_fps: rad.sin() * fps,
            down_fps: -vertical_fpm / 60.0,
        }
    }

    pub fn speed_fps(&self) -> f64 {
        (self.north_fps * self.north_fps
            + self.east_fps * self.east_fps
            + self.down_fps * self.down_fps)
            .sqrt()
    }
}

/// Simulation time tracking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SimTime {
    /// Number of ticks run.
    pub tick: u64,
    /// Elapsed simulation time in seconds.
    pub elapsed_secs: f64,
}

impl SimTime {
    /// Advance by one tick of `dt` seconds.
    pub fn advance(&mut self, dt: f64) {
        self.tick += 1;
        self.elapsed_secs += dt;
    }
}

/// Ambient wind as seen by the viewer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WindState {
    /// Wind component blowing from the north (ft/s).
    pub from_north_fps: f64,
    /// Wind component blowing from the east (ft/s).
    pub from_east_fps: f64,
    /// Surface wind direction (degrees, from).
    pub surface_from_deg: f64,
    /// Surface wind speed (knots).
    pub surface_speed_kt: f64,
    /// Wind direction aloft (degrees, from).
    pub aloft_from_deg: f64,
    /// Wind speed aloft (knots).
    pub aloft_speed_kt: f64,
}

impl WindState {
    /// Uniform wind from `from_deg` at `speed_kt`, surface and aloft alike.
    pub fn uniform(from_deg: f64, speed_kt: f64) -> Self {
        let fps = speed_kt * crate::constants::KT_TO_FPS;
        let rad = from_deg.to_radians();
        Self {
            from_north_fps: rad.cos() * fps,
            from_east_fps: rad.sin() * fps,
            surface_from_deg: from_deg,
            surface_speed_kt: speed_kt,
            aloft_from_deg: from_deg,
            aloft_speed_kt: speed_kt,
        }
    }
}

/// Read-only state of the viewer (the human-flown aircraft), refreshed
/// once per tick by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerState {
    pub position: GeoPosition,
    pub orientation: Orientation,
    /// Yaw of the view relative to the body (degrees).
    pub view_yaw_deg: f64,
    pub speed_kt: f64,
    pub velocity: NedVelocity,
    pub wind: WindState,
}

impl ViewerState {
    /// A viewer parked at `position` with no motion and calm air.
    pub fn at(position: GeoPosition) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }
}
