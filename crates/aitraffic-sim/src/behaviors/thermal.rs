//! Thermal updraft (or sink) column with a forming/formed/dying life cycle.
//!
//! The column leans downwind with height. Each tick the vertical air speed
//! the viewer would feel is computed from its altitude relative to the
//! thermal top and its distance from the column slice at that altitude.

use std::f64::consts::PI;

use rand::Rng;

use aitraffic_core::constants::*;
use aitraffic_core::enums::ThermalStage;
use aitraffic_core::error::BehaviorFault;
use aitraffic_core::params::ThermalParams;
use aitraffic_core::state::VariantDetail;
use aitraffic_core::types::{GeoPosition, ViewerState};

use super::{EntityMut, UpdateContext};

/// Stage boundaries as fractions of the alive cycle.
const T_FORMED: f64 = 5.0 / 25.0;
const T_DYING: f64 = 20.0 / 25.0;
const T_DEAD: f64 = 1.0;
const T_RESTART: f64 = 30.0 / 25.0;

/// Conicity of the column, 0..1.
const SHAPING: f64 = 0.8;
/// Share of the slice radius that produces lift.
const UPDRAFT_RADIUS_FRACTION: f64 = 0.9;
/// Peak sink relative to peak lift.
const SINK_FRACTION: f64 = 0.25;
/// Column lean per knot of wind (rad).
const LEAN_PER_KT: f64 = 0.034_906;
/// Altitude over which the wind blends from surface to aloft (ft).
const WIND_BLEND_ALT_FT: f64 = 9000.0;

/// Fraction of full strength available at `alt_frac` of the thermal height.
pub fn strength_factor(alt_frac: f64) -> f64 {
    if alt_frac <= 0.0 {
        0.0
    } else if alt_frac <= 0.1 {
        0.1 * (10.0 * alt_frac).powi(10)
    } else if alt_frac <= 1.0 {
        0.4175 - 0.5825 * (PI * (1.0 - alt_frac.sqrt()) + PI).cos()
    } else if alt_frac < 1.1 {
        0.5 * (1.0 + (PI * (-2.0 * alt_frac) * 5.0).cos())
    } else {
        0.0
    }
}

#[derive(Debug)]
pub struct ThermalBehavior {
    params: ThermalParams,
    cycle_timer_secs: f64,
    ground_elev_ft: f64,
    ground_timer_secs: Option<f64>,
    stage: ThermalStage,
    strength_fps: f64,
    range_ft: f64,
}

impl ThermalBehavior {
    pub fn new(params: ThermalParams) -> Self {
        let cycle_timer_secs = params.cycle_start.max(0.0) * THERMAL_CYCLE_SECS;
        Self {
            params,
            cycle_timer_secs,
            ground_elev_ft: 0.0,
            ground_timer_secs: None,
            stage: ThermalStage::Formed,
            strength_fps: 0.0,
            range_ft: f64::INFINITY,
        }
    }

    pub fn stage(&self) -> ThermalStage {
        self.stage
    }

    /// Horizontal distance from the viewer to the column slice (ft).
    pub fn range_ft(&self) -> f64 {
        self.range_ft
    }

    /// Vertical air speed at the viewer (ft/s).
    pub fn strength_fps(&self) -> f64 {
        self.strength_fps
    }

    pub fn detail(&self) -> VariantDetail {
        VariantDetail::Thermal {
            stage: self.stage,
            strength_fps: self.strength_fps,
        }
    }

    pub fn update(&mut self, entity: EntityMut<'_>, ctx: &mut UpdateContext<'_>) -> Result<(), BehaviorFault> {
        let dt = ctx.dt;
        if dt <= 0.0 {
            return Ok(());
        }
        let foot = entity.kinematics.position;

        self.cycle_timer_secs += dt;
        if self.cycle_timer_secs / THERMAL_CYCLE_SECS >= T_RESTART {
            self.cycle_timer_secs = 60.0 * f64::from(ctx.rng.gen_range(0..=30u32));
            tracing::trace!(id = %entity.id, restart_secs = self.cycle_timer_secs, "thermal cycle restart");
        }

        let refresh = match self.ground_timer_secs.as_mut() {
            None => true,
            Some(timer) => {
                *timer += dt;
                *timer >= THERMAL_GROUND_REFRESH_SECS
            }
        };
        if refresh {
            if let Some(elev) = ctx.ground.elevation_ft(foot.lat_deg, foot.lon_deg) {
                self.ground_elev_ft = elev;
            }
            self.ground_timer_secs = Some(0.0);
        }

        let (strength, range_ft) = self.vertical_air(&foot, ctx.viewer);
        self.strength_fps = strength;
        self.range_ft = range_ft;
        Ok(())
    }

    /// Stage and available strength fraction at cycle fraction `time`.
    fn cycle_strength(&mut self, time: f64, alt_rel: f64) -> f64 {
        if time <= T_FORMED {
            self.stage = ThermalStage::Forming;
            let x = time / T_FORMED;
            if x > 0.0 {
                x * strength_factor(alt_rel / x)
            } else {
                0.0
            }
        } else if time <= T_DYING {
            self.stage = ThermalStage::Formed;
            strength_factor(alt_rel)
        } else if time <= T_DEAD {
            self.stage = ThermalStage::Dying;
            let x = (time - T_DYING) / (1.0 - T_DYING);
            strength_factor(alt_rel - x)
        } else {
            self.stage = ThermalStage::Dead;
            0.0
        }
    }

    /// `(vertical air speed ft/s, range ft)` felt by the viewer.
    fn vertical_air(&mut self, foot: &GeoPosition, viewer: &ViewerState) -> (f64, f64) {
        let p = &self.params;
        let max_updraft = p.max_strength_fps;
        let min_updraft = -p.max_strength_fps * SINK_FRACTION;
        let global_sink = THERMAL_GLOBAL_SINK_FPS;
        let r_max = p.diameter_nm / 2.0;

        let user_alt = viewer.position.alt_ft.max(1.0);
        let user_agl = user_alt - self.ground_elev_ft;
        let thermal_agl = p.height_ft - self.ground_elev_ft;
        let alt_rel = if thermal_agl > 0.0 { user_agl / thermal_agl } else { f64::INFINITY };

        let time = self.cycle_timer_secs / THERMAL_CYCLE_SECS;
        let available = self.cycle_strength(time, alt_rel);

        let r_sink = if (0.0..1.0).contains(&alt_rel) {
            SHAPING * r_max + ((1.0 - SHAPING) * r_max * alt_rel) / thermal_agl
        } else if (1.0..1.1).contains(&alt_rel) {
            (r_max / 2.0) * (1.0 + (10.0 * PI * alt_rel - 2.0 * PI).cos())
        } else {
            0.0
        };
        let r_up = UPDRAFT_RADIUS_FRACTION * r_sink;
        let v_up_max = available * max_updraft;
        let v_up_min = available * min_updraft;

        // lean the column downwind: the slice center sits upwind of the foot
        let wind = &viewer.wind;
        let ground_from = PI / 2.0 - wind.surface_from_deg.to_radians();
        let aloft_from = PI / 2.0 - wind.aloft_from_deg.to_radians();
        let wind_heading = PI + 0.5 * (ground_from + aloft_from);
        let wind_kt =
            wind.surface_speed_kt + user_alt * ((wind.aloft_speed_kt - wind.surface_speed_kt) / WIND_BLEND_ALT_FT);
        let shift_ft = if thermal_agl > 0.0 {
            -(LEAN_PER_KT * wind_kt).tan() * (thermal_agl - user_agl)
        } else {
            0.0
        };
        let slice = foot.displaced(shift_ft * wind_heading.sin(), shift_ft * wind_heading.cos(), 0.0);

        let dist_ft = slice.distance_ft_to(&viewer.position);
        let dist = dist_ft / FT_PER_NM;

        let mut v_up = if max_updraft >= 0.0 {
            let mid = (r_up + r_sink) / 2.0;
            if dist < r_up {
                v_up_max * (dist * PI / (2.0 * r_up)).cos()
            } else if dist > r_up && dist <= mid {
                v_up_min * ((dist - mid) * PI / (2.0 * (mid - r_up))).cos()
            } else if dist > mid && dist <= r_sink {
                (global_sink + v_up_min) / 2.0
                    + (global_sink - v_up_min) / 2.0 * ((dist - r_sink) * PI / ((r_sink - r_up) / 2.0)).cos()
            } else {
                global_sink
            }
        } else if alt_rel <= 1.1 && r_max > 0.0 {
            // a sink has no lift ring and fades near the ground and ceiling
            let fac = 1.0 - (1.0 - 1.815 * alt_rel).powi(2);
            fac * (global_sink + ((v_up_max - global_sink) / 2.0) * (1.0 + (dist * PI / r_max).cos()))
        } else {
            global_sink
        };

        if alt_rel > 1.0 && alt_rel < 1.1 && dist > r_sink {
            v_up = global_sink * (11.0 - 10.0 * alt_rel);
        }
        if alt_rel >= 1.1 {
            v_up = 0.0;
        }
        (v_up, dist_ft)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewer(lat: f64, lon: f64, alt: f64) -> ViewerState {
        ViewerState::at(GeoPosition::new(lat, lon, alt))
    }

    #[test]
    fn test_strength_factor_shape() {
        assert_eq!(strength_factor(0.0), 0.0);
        assert!((strength_factor(0.1) - 0.1).abs() < 1e-12);
        assert!((strength_factor(1.0) - 1.0).abs() < 1e-9, "full strength at the top");
        assert_eq!(strength_factor(1.2), 0.0);
        assert!(strength_factor(0.5) > strength_factor(0.2));
    }

    #[test]
    fn test_updraft_at_center_and_global_sink_outside() {
        let mut t = ThermalBehavior::new(ThermalParams::default());
        let foot = GeoPosition::new(45.0, 7.0, 0.0);

        let (center, range) = t.vertical_air(&foot, &viewer(45.0, 7.0, 4000.0));
        assert!(range < 1e-6);
        assert!(center > 0.0, "lift at the core: {center}");
        assert_eq!(t.stage(), ThermalStage::Formed);

        let far = foot.project(90.0, 5.0 * FT_PER_NM);
        let (outside, _) = t.vertical_air(&foot, &viewer(far.lat_deg, far.lon_deg, 4000.0));
        assert_eq!(outside, THERMAL_GLOBAL_SINK_FPS);
    }

    #[test]
    fn test_nothing_above_the_cloud() {
        let mut t = ThermalBehavior::new(ThermalParams::default());
        let foot = GeoPosition::new(45.0, 7.0, 0.0);
        let (v, _) = t.vertical_air(&foot, &viewer(45.0, 7.0, 6000.0));
        assert_eq!(v, 0.0);
    }

    #[test]
    fn test_sink_variant_pulls_down_at_center() {
        let params = ThermalParams {
            max_strength_fps: -8.0,
            ..Default::default()
        };
        let mut t = ThermalBehavior::new(params);
        let foot = GeoPosition::new(45.0, 7.0, 0.0);
        let (v, _) = t.vertical_air(&foot, &viewer(45.0, 7.0, 2500.0));
        assert!(v < THERMAL_GLOBAL_SINK_FPS, "sink core {v}");
    }
}
