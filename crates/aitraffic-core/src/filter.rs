//! Convergence filters shared by every behavior.
//!
//! Two shapes appear throughout the models: a first-order lag
//! (`c = dt / (tau + dt)`) and a rate-limited step toward a target with a
//! deadband. Both are no-ops when `dt` is zero.

use crate::geo::{heading_error, normalize_heading};

/// First-order lag of `current` toward `target` with time constant `tau`
/// seconds.
pub fn lag(current: f64, target: f64, dt: f64, tau: f64) -> f64 {
    if dt <= 0.0 {
        return current;
    }
    if tau <= 0.0 {
        return target;
    }
    let c = dt / (tau + dt);
    target * c + current * (1.0 - c)
}

/// First-order lag on a heading, taking the short way round. Result in
/// [0, 360).
pub fn lag_heading(current: f64, target: f64, dt: f64, tau: f64) -> f64 {
    let error = heading_error(current, target);
    normalize_heading(lag(current, current + error, dt, tau))
}

/// Move `current` toward `target` by at most `rate * dt`, doing nothing
/// while the error is inside `deadband`. Never overshoots.
pub fn approach(current: f64, target: f64, rate: f64, dt: f64, deadband: f64) -> f64 {
    let diff = target - current;
    if diff.abs() <= deadband || dt <= 0.0 {
        return current;
    }
    let step = rate.abs() * dt;
    if diff.abs() <= step {
        target
    } else {
        current + step * diff.signum()
    }
}

/// Like [`approach`] with separate rates for increasing and decreasing.
pub fn approach_asymmetric(
    current: f64,
    target: f64,
    rate_up: f64,
    rate_down: f64,
    dt: f64,
    deadband: f64,
) -> f64 {
    if target >= current {
        approach(current, target, rate_up, dt, deadband)
    } else {
        approach(current, target, rate_down, dt, deadband)
    }
}

/// Transition of a normalized position (0 = stowed, 1 = deployed) driven by
/// a command, a full-travel `transition_secs`, and a smoothing `tau`.
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Actuator {
    /// Unsmoothed commanded position.
    pub raw: f64,
    /// Smoothed output position.
    pub position: f64,
}

impl Actuator {
    pub fn update(&mut self, deployed: bool, dt: f64, transition_secs: f64, tau: f64) {
        if (deployed && self.position >= 1.0) || (!deployed && self.position <= 0.0) || dt <= 0.0 {
            return;
        }
        let step = if transition_secs > 0.0 {
            (dt / transition_secs).min(1.0)
        } else {
            1.0
        };
        self.raw = if deployed {
            (self.raw + step).min(1.0)
        } else {
            (self.raw - step).max(0.0)
        };
        self.position = lag(self.position, self.raw, dt, tau).clamp(0.0, 1.0);
        // snap the tail of the lag so the end stop is reachable
        if (self.position - self.raw).abs() < 1e-3 {
            self.position = self.raw;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lag_zero_dt_is_noop() {
        assert_eq!(lag(3.0, 10.0, 0.0, 1.0), 3.0);
        assert_eq!(lag_heading(350.0, 10.0, 0.0, 1.0), 350.0);
    }

    #[test]
    fn test_lag_converges_monotonically() {
        let mut v = 0.0;
        let mut last = v;
        for _ in 0..200 {
            v = lag(v, 10.0, 0.1, 1.0);
            assert!(v >= last && v <= 10.0, "lag overshoot: {v}");
            last = v;
        }
        assert!((v - 10.0).abs() < 1e-3, "lag did not converge: {v}");
    }

    #[test]
    fn test_lag_heading_wraps() {
        let h = lag_heading(350.0, 10.0, 1.0, 1.0);
        assert!((h - 0.0).abs() < 1e-9, "halfway from 350 to 10 is 0, got {h}");
    }

    #[test]
    fn test_approach_deadband_and_no_overshoot() {
        assert_eq!(approach(100.0, 100.1, 5.0, 1.0, 0.2), 100.0);
        assert_eq!(approach(100.0, 102.0, 5.0, 1.0, 0.2), 102.0);
        assert_eq!(approach(100.0, 90.0, 5.0, 1.0, 0.2), 95.0);
    }

    #[test]
    fn test_actuator_reaches_end_stops() {
        let mut a = Actuator::default();
        for _ in 0..2000 {
            a.update(true, 0.1, 5.0, 0.5);
        }
        assert_eq!(a.position, 1.0, "deployed actuator should reach 1");
        for _ in 0..2000 {
            a.update(false, 0.1, 5.0, 0.5);
        }
        assert_eq!(a.position, 0.0, "stowed actuator should reach 0");
    }
}
