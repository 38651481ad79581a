//! Local flat-earth geodesy used by every kinematic model.
//!
//! Positions advance by converting feet to degrees with a
//! latitude-dependent scale that approximates the WGS-84 ellipsoid
//! closely enough for the short distances covered in one tick.

use glam::{DMat3, DVec3};

use crate::types::Orientation;

/// Feet per degree of latitude/longitude at a given latitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalScale {
    pub ft_per_deg_lat: f64,
    pub ft_per_deg_lon: f64,
}

impl LocalScale {
    /// Scale at `lat_deg`.
    pub fn at(lat_deg: f64) -> Self {
        let cos_lat = lat_deg.to_radians().cos();
        Self {
            ft_per_deg_lat: 366_468.96 - 3_717.12 * cos_lat,
            ft_per_deg_lon: 365_228.16 * cos_lat,
        }
    }

    /// Convert an east displacement to degrees of longitude. Returns 0 at
    /// the poles where a degree of longitude has no width.
    pub fn east_ft_to_deg(&self, east_ft: f64) -> f64 {
        if self.ft_per_deg_lon.abs() < f64::EPSILON {
            0.0
        } else {
            east_ft / self.ft_per_deg_lon
        }
    }

    pub fn north_ft_to_deg(&self, north_ft: f64) -> f64 {
        north_ft / self.ft_per_deg_lat
    }
}

/// Wrap an angle into [0, 360).
pub fn normalize_heading(deg: f64) -> f64 {
    let wrapped = deg.rem_euclid(360.0);
    // rem_euclid can return 360.0 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Wrap an angle into [-180, 180).
pub fn normalize_180(deg: f64) -> f64 {
    let wrapped = normalize_heading(deg + 180.0) - 180.0;
    if wrapped < -180.0 {
        wrapped + 360.0
    } else {
        wrapped
    }
}

/// Shortest signed turn from `from` to `to`, in degrees [-180, 180).
pub fn heading_error(from: f64, to: f64) -> f64 {
    normalize_180(to - from)
}

/// Bearing of a north/east vector in degrees [0, 360). Zero vector yields 0.
pub fn bearing_from_components(north: f64, east: f64) -> f64 {
    if north.abs() < 1e-9 && east.abs() < 1e-9 {
        return 0.0;
    }
    normalize_heading(east.atan2(north).to_degrees())
}

/// Sign of `x`, 0 for 0.
pub fn sign(x: f64) -> f64 {
    if x == 0.0 {
        0.0
    } else {
        x.signum()
    }
}

/// Rotation from the body frame (x forward, y right, z down) into the local
/// north/east/down frame for the given attitude.
pub fn body_to_ned(orientation: &Orientation) -> DMat3 {
    let yaw = DMat3::from_rotation_z(orientation.heading_deg.to_radians());
    let pitch = DMat3::from_rotation_y(orientation.pitch_deg.to_radians());
    let roll = DMat3::from_rotation_x(orientation.roll_deg.to_radians());
    yaw * pitch * roll
}

/// Rotate a body-frame vector (x forward, y right, z down) into
/// north/east/down.
pub fn rotate_body_to_ned(orientation: &Orientation, body: DVec3) -> DVec3 {
    body_to_ned(orientation) * body
}

/// Rotate a north/east/down vector into the body frame.
pub fn rotate_ned_to_body(orientation: &Orientation, ned: DVec3) -> DVec3 {
    body_to_ned(orientation).transpose() * ned
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_scale_equator_and_pole() {
        let eq = LocalScale::at(0.0);
        assert!((eq.ft_per_deg_lat - 362_751.84).abs() < 0.01);
        assert!((eq.ft_per_deg_lon - 365_228.16).abs() < 0.01);

        let pole = LocalScale::at(90.0);
        assert!(pole.ft_per_deg_lon.abs() < 1e-6);
        assert_eq!(pole.east_ft_to_deg(1000.0), 0.0, "no longitude motion at the pole");
    }

    #[test]
    fn test_normalize_heading_range() {
        for raw in [-720.5, -360.0, -0.0001, 0.0, 359.9999, 360.0, 725.0] {
            let h = normalize_heading(raw);
            assert!((0.0..360.0).contains(&h), "{raw} wrapped to {h}");
        }
        assert!((normalize_heading(-90.0) - 270.0).abs() < 1e-12);
    }

    #[test]
    fn test_heading_error_shortest_turn() {
        assert!((heading_error(350.0, 10.0) - 20.0).abs() < 1e-9);
        assert!((heading_error(10.0, 350.0) + 20.0).abs() < 1e-9);
        assert!((heading_error(90.0, 90.0)).abs() < 1e-12);
    }

    #[test]
    fn test_bearing_zero_vector() {
        assert_eq!(bearing_from_components(0.0, 0.0), 0.0);
        assert!((bearing_from_components(0.0, 1.0) - 90.0).abs() < 1e-9);
        assert!((bearing_from_components(-1.0, 0.0) - 180.0).abs() < 1e-9);
    }

    #[test]
    fn test_body_rotation_heading_only() {
        let east = Orientation::new(90.0, 0.0, 0.0);
        let v = rotate_body_to_ned(&east, DVec3::new(100.0, 0.0, 0.0));
        assert!(v.x.abs() < 1e-9, "north component: {:.6}", v.x);
        assert!((v.y - 100.0).abs() < 1e-9, "east component: {:.6}", v.y);

        let back = rotate_ned_to_body(&east, v);
        assert!((back.x - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_body_rotation_pitch_up_climbs() {
        let nose_up = Orientation::new(0.0, 30.0, 0.0);
        let v = rotate_body_to_ned(&nose_up, DVec3::new(100.0, 0.0, 0.0));
        assert!(v.z < 0.0, "nose-up forward vector must point up (negative down): {:.3}", v.z);
        assert!((v.z + 50.0).abs() < 1e-9);
    }
}
