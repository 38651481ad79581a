//! Imperial standard atmosphere, Mach number and local gravity.

use crate::constants::{FT_TO_M, M_TO_FT};

/// Atmospheric properties at an altitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AtmosphereSample {
    /// Static temperature (°F).
    pub temperature_f: f64,
    /// Static pressure (lbf/ft²).
    pub pressure_psf: f64,
    /// Density (slug/ft³).
    pub density_slug_ft3: f64,
    /// Speed of sound (ft/s).
    pub speed_of_sound_fps: f64,
}

/// Three-layer standard atmosphere: troposphere, lower and upper stratosphere.
pub fn sample(altitude_ft: f64) -> AtmosphereSample {
    let (temperature_f, pressure_psf) = if altitude_ft < 36_152.0 {
        let t = 59.0 - 0.00356 * altitude_ft;
        let p = 2116.0 * ((t + 459.7) / 518.6).powf(5.256);
        (t, p)
    } else if altitude_ft < 82_345.0 {
        let t = -70.0;
        let p = 473.1 * (1.73 - 0.000048 * altitude_ft).exp();
        (t, p)
    } else {
        let t = -205.05 + 0.00164 * altitude_ft;
        let p = 51.97 * ((t + 459.7) / 389.98).powf(-11.388);
        (t, p)
    };

    let rankine = temperature_f + 459.7;
    AtmosphereSample {
        temperature_f,
        pressure_psf,
        density_slug_ft3: pressure_psf / (1718.0 * rankine),
        speed_of_sound_fps: (1.4 * 1716.0 * rankine).sqrt(),
    }
}

/// Mach number for a true airspeed in ft/s at an altitude.
pub fn mach(speed_fps: f64, altitude_ft: f64) -> f64 {
    speed_fps / sample(altitude_ft).speed_of_sound_fps
}

/// Gravitational acceleration (ft/s²) at a latitude and altitude, using the
/// WGS-84 normal-gravity series with a free-air altitude correction.
pub fn gravity_fps2(lat_deg: f64, altitude_ft: f64) -> f64 {
    let sin_lat = lat_deg.to_radians().sin();
    let sin_2lat = (2.0 * lat_deg.to_radians()).sin();
    let g0 = 9.780_327 * (1.0 + 0.005_302_4 * sin_lat * sin_lat - 0.000_005_8 * sin_2lat * sin_2lat);
    let g = g0 - 3.086e-6 * altitude_ft * FT_TO_M;
    g * M_TO_FT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sea_level_standard_day() {
        let s = sample(0.0);
        assert!((s.temperature_f - 59.0).abs() < 1e-9);
        assert!((s.pressure_psf - 2116.0).abs() < 5.0, "pressure: {:.2}", s.pressure_psf);
        assert!(
            (s.density_slug_ft3 - 0.002377).abs() < 0.00002,
            "density: {:.6}",
            s.density_slug_ft3
        );
        assert!(
            (s.speed_of_sound_fps - 1116.0).abs() < 2.0,
            "speed of sound: {:.1}",
            s.speed_of_sound_fps
        );
    }

    #[test]
    fn test_density_decreases_with_altitude() {
        let mut last = f64::MAX;
        for alt in [0.0, 10_000.0, 36_000.0, 40_000.0, 80_000.0, 90_000.0] {
            let rho = sample(alt).density_slug_ft3;
            assert!(rho < last, "density did not fall at {alt} ft: {rho}");
            last = rho;
        }
    }

    #[test]
    fn test_mach_one_at_sea_level() {
        let a = sample(0.0).speed_of_sound_fps;
        assert!((mach(a, 0.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_gravity_latitude_dependence() {
        let equator = gravity_fps2(0.0, 0.0);
        let pole = gravity_fps2(90.0, 0.0);
        assert!((equator - 32.088).abs() < 0.01, "equator: {equator:.4}");
        assert!(pole > equator, "gravity stronger at the pole");
        assert!(gravity_fps2(45.0, 30_000.0) < gravity_fps2(45.0, 0.0));
    }
}
