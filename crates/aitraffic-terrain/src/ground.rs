//! The ground query seam and the trivial flat-earth source.

use serde::{Deserialize, Serialize};

/// Ground under a point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroundSample {
    /// Elevation (ft MSL).
    pub elevation_ft: f64,
    /// False over water and other non-solid material.
    pub solid: bool,
    /// Rolling friction multiplier of the material.
    pub friction_factor: f64,
    /// Load the material can bear (lbf/ft²).
    pub load_resistance: f64,
}

impl GroundSample {
    pub fn land(elevation_ft: f64) -> Self {
        Self {
            elevation_ft,
            solid: true,
            friction_factor: 1.0,
            load_resistance: f64::MAX,
        }
    }

    pub fn water(elevation_ft: f64) -> Self {
        Self {
            elevation_ft,
            solid: false,
            friction_factor: 1.0,
            load_resistance: 0.0,
        }
    }
}

/// Source of ground elevation. `None` means no ground data is available
/// at that point; callers skip ground interaction rather than guess.
pub trait GroundQuery {
    fn ground_at(&self, lat_deg: f64, lon_deg: f64) -> Option<GroundSample>;

    fn elevation_ft(&self, lat_deg: f64, lon_deg: f64) -> Option<f64> {
        self.ground_at(lat_deg, lon_deg).map(|g| g.elevation_ft)
    }
}

/// Uniform ground at a fixed elevation everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlatGround {
    pub sample: GroundSample,
}

impl FlatGround {
    pub fn new(elevation_ft: f64) -> Self {
        Self {
            sample: GroundSample::land(elevation_ft),
        }
    }

    /// Open sea at sea level.
    pub fn sea() -> Self {
        Self {
            sample: GroundSample::water(0.0),
        }
    }
}

impl Default for FlatGround {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl GroundQuery for FlatGround {
    fn ground_at(&self, _lat_deg: f64, _lon_deg: f64) -> Option<GroundSample> {
        Some(self.sample)
    }
}
