//! Performance classes for piloted traffic.
//!
//! Consolidates per-class rates and reference speeds used by the aircraft
//! kinematics.

use serde::{Deserialize, Serialize};

use aitraffic_core::enums::PerformanceClass;

/// Rates and reference speeds of a performance class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceProfile {
    /// Acceleration (kt/s).
    pub accel_kt_s: f64,
    /// Deceleration (kt/s).
    pub decel_kt_s: f64,
    /// Climb rate (fpm).
    pub climb_fpm: f64,
    /// Descent rate (fpm).
    pub descent_fpm: f64,
    pub takeoff_kt: f64,
    pub climb_kt: f64,
    pub cruise_kt: f64,
    pub descent_kt: f64,
    pub land_kt: f64,
    /// Speed above which a ground roll rotates (kt).
    pub rotate_kt: f64,
    pub max_bank_deg: f64,
}

/// Get the profile of a performance class.
pub fn get_profile(class: PerformanceClass) -> PerformanceProfile {
    match class {
        PerformanceClass::Light => PerformanceProfile {
            accel_kt_s: 2.0,
            decel_kt_s: 2.0,
            climb_fpm: 450.0,
            descent_fpm: 1000.0,
            takeoff_kt: 70.0,
            climb_kt: 70.0,
            cruise_kt: 80.0,
            descent_kt: 100.0,
            land_kt: 80.0,
            rotate_kt: 60.0,
            max_bank_deg: 25.0,
        },
        PerformanceClass::Ww2Fighter => PerformanceProfile {
            accel_kt_s: 4.0,
            decel_kt_s: 2.0,
            climb_fpm: 3000.0,
            descent_fpm: 1500.0,
            takeoff_kt: 110.0,
            climb_kt: 110.0,
            cruise_kt: 180.0,
            descent_kt: 250.0,
            land_kt: 200.0,
            rotate_kt: 100.0,
            max_bank_deg: 45.0,
        },
        PerformanceClass::JetTransport | PerformanceClass::Tanker => PerformanceProfile {
            accel_kt_s: 5.0,
            decel_kt_s: 2.0,
            climb_fpm: 3000.0,
            descent_fpm: 1500.0,
            takeoff_kt: 140.0,
            climb_kt: 140.0,
            cruise_kt: 300.0,
            descent_kt: 450.0,
            land_kt: 340.0,
            rotate_kt: 130.0,
            max_bank_deg: 25.0,
        },
        PerformanceClass::JetFighter => PerformanceProfile {
            accel_kt_s: 7.0,
            decel_kt_s: 3.0,
            climb_fpm: 4000.0,
            descent_fpm: 2000.0,
            takeoff_kt: 150.0,
            climb_kt: 150.0,
            cruise_kt: 350.0,
            descent_kt: 500.0,
            land_kt: 350.0,
            rotate_kt: 140.0,
            max_bank_deg: 45.0,
        },
        PerformanceClass::Ufo => PerformanceProfile {
            accel_kt_s: 30.0,
            decel_kt_s: 30.0,
            climb_fpm: 6000.0,
            descent_fpm: 6000.0,
            takeoff_kt: 150.0,
            climb_kt: 150.0,
            cruise_kt: 300.0,
            descent_kt: 430.0,
            land_kt: 300.0,
            rotate_kt: 0.0,
            max_bank_deg: 45.0,
        },
    }
}
