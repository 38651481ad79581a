//! Ballistic projectile: drag, wind, buoyancy, external force and ground
//! interaction.
//!
//! The trajectory is carried as speed, azimuth and elevation of the air
//! velocity vector. Every tick the vector is resolved into north/east/up
//! components, forces are applied to the components, and the three
//! trajectory values are re-derived from the result. Body orientation is
//! only a visual readout and never feeds back into the trajectory.

use aitraffic_core::atmosphere::{self, AtmosphereSample};
use aitraffic_core::commands::SubmodelParent;
use aitraffic_core::components::{Kinematics, Lifecycle};
use aitraffic_core::constants::*;
use aitraffic_core::enums::{RemovalReason, ReportKind};
use aitraffic_core::error::BehaviorFault;
use aitraffic_core::events::{ImpactReport, SimEvent, StruckObject};
use aitraffic_core::filter::{lag, lag_heading};
use aitraffic_core::geo::{bearing_from_components, normalize_heading};
use aitraffic_core::params::BallisticParams;
use aitraffic_core::state::VariantDetail;
use aitraffic_core::types::{EntityId, NedVelocity};

use super::{EntityMut, SpawnRequest, UpdateContext};
use crate::submodel::{release_state, ParentState};

/// Horizontal speed (ft/s) below which the azimuth is left unchanged.
const MIN_HORIZONTAL_FPS: f64 = 1e-6;

/// Mach-adjusted drag coefficient over a base coefficient `cd0`.
pub fn drag_coefficient(cd0: f64, mach: f64) -> f64 {
    if mach < 0.7 {
        0.0125 * mach + cd0
    } else if mach < 1.2 {
        0.3742 * mach * mach - 0.252 * mach + 0.0021 + cd0
    } else {
        0.2965 * mach.powf(-1.1506) + cd0
    }
}

/// Speed (ft/s) lost to drag over one step of `dt`. Massless bodies
/// feel no drag.
pub fn drag_decay_fps(
    speed_fps: f64,
    cd0: f64,
    drag_area_ft2: f64,
    mass_slug: f64,
    air: &AtmosphereSample,
    dt: f64,
) -> f64 {
    if mass_slug <= 0.0 {
        return 0.0;
    }
    let cdm = drag_coefficient(cd0, speed_fps / air.speed_of_sound_fps);
    0.5 * cdm * air.density_slug_ft3 * speed_fps * speed_fps * drag_area_ft2 / mass_slug * dt
}

#[derive(Debug)]
pub struct BallisticBehavior {
    params: BallisticParams,
    azimuth_deg: f64,
    elevation_deg: f64,
    /// Air-relative speed along the trajectory (ft/s).
    speed_fps: f64,
    /// Ground-relative velocity from the last integration step.
    velocity: NedVelocity,
    life_secs: f64,
    impact_reported: bool,
    collision_reported: bool,
    expiry_reported: bool,
    impact_released: bool,
    at_rest: bool,
    slaved: bool,
}

impl BallisticBehavior {
    pub fn new(params: BallisticParams, kin: &mut Kinematics, lifecycle: &mut Lifecycle) -> Self {
        lifecycle.life_secs = params.life_secs;

        let azimuth_deg = normalize_heading(params.azimuth_deg);
        let elevation_deg = params.elevation_deg.clamp(-90.0, 90.0);
        let speed_fps = params.speed_fps.max(0.0);

        kin.orientation.heading_deg = azimuth_deg;
        kin.orientation.pitch_deg = elevation_deg;
        kin.speed_kt = speed_fps / KT_TO_FPS;
        kin.vertical_speed_fpm = speed_fps * elevation_deg.to_radians().sin() * 60.0;

        let velocity = air_velocity(speed_fps, azimuth_deg, elevation_deg);
        Self {
            life_secs: params.life_secs,
            slaved: params.slave_to_parent,
            params,
            azimuth_deg,
            elevation_deg,
            speed_fps,
            velocity,
            impact_reported: false,
            collision_reported: false,
            expiry_reported: false,
            impact_released: false,
            at_rest: false,
        }
    }

    pub fn velocity(&self) -> NedVelocity {
        self.velocity
    }

    pub fn speed_fps(&self) -> f64 {
        self.speed_fps
    }

    pub fn detail(&self) -> VariantDetail {
        VariantDetail::Ballistic {
            azimuth_deg: self.azimuth_deg,
            elevation_deg: self.elevation_deg,
            speed_fps: self.speed_fps,
            life_remaining_secs: self.life_secs,
        }
    }

    pub fn update(&mut self, entity: EntityMut<'_>, ctx: &mut UpdateContext<'_>) -> Result<(), BehaviorFault> {
        let dt = ctx.dt;
        if dt <= 0.0 {
            return Ok(());
        }
        let id = entity.id;
        let kin = entity.kinematics;
        let lifecycle = entity.lifecycle;

        // negative life never runs out
        if self.life_secs >= 0.0 {
            self.life_secs = (self.life_secs - dt).max(0.0);
            lifecycle.life_secs = self.life_secs;
            if self.life_secs <= 0.0 {
                if self.params.report_expiry && !self.expiry_reported {
                    self.expiry_reported = true;
                    self.report(id, ReportKind::Expiry, kin, StruckObject::Nothing, ctx);
                }
                lifecycle.mark_dying(RemovalReason::Expired);
                return Ok(());
            }
        }

        if self.slaved && self.follow_parent(kin, ctx) {
            return Ok(());
        }

        if self.at_rest {
            self.velocity = NedVelocity::default();
            return Ok(());
        }

        self.integrate(kin, ctx);
        self.stabilise(kin, dt);

        kin.speed_kt = self.speed_fps / KT_TO_FPS;
        kin.vertical_speed_fpm = -self.velocity.down_fps * 60.0;

        if kin.position.alt_ft < ALTITUDE_FLOOR_FT {
            lifecycle.mark_dying(RemovalReason::BelowFloor);
            return Ok(());
        }

        if let Some(ground) = ctx.ground.ground_at(kin.position.lat_deg, kin.position.lon_deg) {
            if ground.elevation_ft > kin.position.alt_ft {
                let struck = StruckObject::Terrain { solid: ground.solid };
                if self.params.report_impact && !self.impact_reported {
                    self.impact_reported = true;
                    self.report(id, ReportKind::Impact, kin, struck, ctx);
                }
                self.release_impact_submodel(id, kin, ctx);

                if self.params.persistent {
                    kin.position.alt_ft = ground.elevation_ft;
                    kin.speed_kt = 0.0;
                    kin.vertical_speed_fpm = 0.0;
                    self.speed_fps = 0.0;
                    self.velocity = NedVelocity::default();
                    self.at_rest = true;
                } else {
                    lifecycle.mark_dying(RemovalReason::Impact);
                }
                return Ok(());
            }
        }

        if self.params.report_collision {
            let hit = ctx
                .peers
                .query_collision(&kin.position, self.params.fuse_range_ft, self.params.parent);
            if let Some((struck_id, struck_kind)) = hit {
                if !self.collision_reported {
                    self.collision_reported = true;
                    let struck = StruckObject::Entity {
                        id: struck_id,
                        kind: struck_kind,
                    };
                    self.report(id, ReportKind::Collision, kin, struck, ctx);
                }
                self.release_impact_submodel(id, kin, ctx);
                lifecycle.mark_dying(RemovalReason::Impact);
            }
        }
        Ok(())
    }

    /// Ride along with the parent. Returns false once the parent is gone,
    /// which releases the projectile into free flight from where it is.
    fn follow_parent(&mut self, kin: &mut Kinematics, ctx: &UpdateContext<'_>) -> bool {
        let parent = match self.params.parent {
            Some(parent_id) => ctx
                .peers
                .get(parent_id)
                .filter(|p| !p.dying)
                .map(|p| (p.position, p.orientation, p.velocity)),
            None => Some((ctx.viewer.position, ctx.viewer.orientation, ctx.viewer.velocity)),
        };
        let Some((position, orientation, velocity)) = parent else {
            self.slaved = false;
            return false;
        };

        kin.position = position;
        kin.orientation = orientation;
        self.velocity = velocity;
        let horizontal = velocity.north_fps.hypot(velocity.east_fps);
        self.speed_fps = velocity.speed_fps();
        self.elevation_deg = (-velocity.down_fps).atan2(horizontal).to_degrees();
        if horizontal > MIN_HORIZONTAL_FPS {
            self.azimuth_deg = bearing_from_components(velocity.north_fps, velocity.east_fps);
        }
        kin.speed_kt = self.speed_fps / KT_TO_FPS;
        kin.vertical_speed_fpm = -velocity.down_fps * 60.0;
        true
    }

    fn integrate(&mut self, kin: &mut Kinematics, ctx: &UpdateContext<'_>) {
        let dt = ctx.dt;
        let pos = kin.position;
        let p = &self.params;

        let air = atmosphere::sample(pos.alt_ft);
        let decay = drag_decay_fps(self.speed_fps, p.cd, p.drag_area_ft2, p.mass_slug, &air, dt);
        self.speed_fps = (self.speed_fps - decay).max(0.0);

        let elev = self.elevation_deg.to_radians();
        let az = self.azimuth_deg.to_radians();
        let horizontal = self.speed_fps * elev.cos();
        let mut up = self.speed_fps * elev.sin();
        let mut north = horizontal * az.cos();
        let mut east = horizontal * az.sin();

        if let Some(force) = p.external_force.filter(|_| p.mass_slug > 0.0) {
            let accel = force.magnitude_lbf / p.mass_slug;
            let f_el = force.elevation_deg.to_radians();
            let f_az = force.azimuth_deg.to_radians();
            north += accel * f_el.cos() * f_az.cos() * dt;
            east += accel * f_el.cos() * f_az.sin() * dt;
            up += accel * f_el.sin() * dt;
        }

        if let Some(ground) = ctx.ground.ground_at(pos.lat_deg, pos.lon_deg) {
            let in_deadzone = pos.alt_ft - ground.elevation_ft <= p.ground_offset_ft;
            let h = north.hypot(east);
            if in_deadzone && ground.solid && h > 0.0 {
                let g = atmosphere::gravity_fps2(pos.lat_deg, pos.alt_ft);
                let slowdown = (ground.friction_factor * g * dt).min(h);
                north -= north / h * slowdown;
                east -= east / h * slowdown;
            }
        }

        up -= (atmosphere::gravity_fps2(pos.lat_deg, pos.alt_ft) - p.buoyancy_fps2) * dt;

        // wind moves the projectile over the ground but not through the air
        let (wind_north, wind_east) = if p.wind {
            (ctx.viewer.wind.from_north_fps, ctx.viewer.wind.from_east_fps)
        } else {
            (0.0, 0.0)
        };
        self.velocity = NedVelocity::new(north - wind_north, east - wind_east, -up);

        kin.position = pos.displaced(
            self.velocity.north_fps * dt,
            self.velocity.east_fps * dt,
            up * dt,
        );

        let horizontal = north.hypot(east);
        self.speed_fps = horizontal.hypot(up);
        self.elevation_deg = up.atan2(horizontal).to_degrees();
        if horizontal > MIN_HORIZONTAL_FPS {
            self.azimuth_deg = bearing_from_components(north, east);
        }
    }

    fn stabilise(&self, kin: &mut Kinematics, dt: f64) {
        let p = &self.params;
        let (heading, pitch) = match p.external_force {
            Some(force) if p.force_stabilised => (force.azimuth_deg, force.elevation_deg),
            _ if p.aero_stabilised || p.force_stabilised => (self.azimuth_deg, self.elevation_deg),
            _ => return,
        };
        kin.orientation.heading_deg = lag_heading(kin.orientation.heading_deg, heading, dt, BALLISTIC_STABILISATION_TAU);
        kin.orientation.pitch_deg = lag(kin.orientation.pitch_deg, pitch, dt, BALLISTIC_STABILISATION_TAU);
    }

    fn report(
        &self,
        id: EntityId,
        kind: ReportKind,
        kin: &Kinematics,
        struck: StruckObject,
        ctx: &mut UpdateContext<'_>,
    ) {
        ctx.outbox.events.push(SimEvent::Report {
            id,
            report: ImpactReport {
                kind,
                position: kin.position,
                orientation: kin.orientation,
                speed_fps: self.speed_fps,
                struck,
            },
        });
    }

    fn release_impact_submodel(&mut self, id: EntityId, kin: &Kinematics, ctx: &mut UpdateContext<'_>) {
        if self.impact_released {
            return;
        }
        self.impact_released = true;
        let Some(config) = self.params.impact_submodel.as_deref() else {
            return;
        };
        let depth = self.params.depth + 1;
        if depth > MAX_SUBMODEL_DEPTH {
            tracing::debug!(id = %id, depth, "impact submodel suppressed at nesting limit");
            return;
        }
        let parent = ParentState {
            id: Some(id),
            position: kin.position,
            orientation: kin.orientation,
            velocity: NedVelocity::default(),
        };
        ctx.outbox.spawns.push(SpawnRequest {
            parent: SubmodelParent::Entity(id),
            name: config.name.clone(),
            state: release_state(config, &parent, 0.0, depth),
        });
    }
}

/// Air velocity for a speed along an azimuth/elevation.
fn air_velocity(speed_fps: f64, azimuth_deg: f64, elevation_deg: f64) -> NedVelocity {
    let elev = elevation_deg.to_radians();
    let az = azimuth_deg.to_radians();
    let horizontal = speed_fps * elev.cos();
    NedVelocity::new(horizontal * az.cos(), horizontal * az.sin(), -speed_fps * elev.sin())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drag_coefficient_regimes() {
        let cd0 = 0.029;
        assert!((drag_coefficient(cd0, 0.5) - (0.00625 + cd0)).abs() < 1e-12);
        let transonic = 0.3742 - 0.252 + 0.0021 + cd0;
        assert!((drag_coefficient(cd0, 1.0) - transonic).abs() < 1e-12);
        let supersonic = 0.2965 * 2.0_f64.powf(-1.1506) + cd0;
        assert!((drag_coefficient(cd0, 2.0) - supersonic).abs() < 1e-12);
    }

    #[test]
    fn test_drag_coefficient_one_mach_per_regime() {
        let cd0 = 0.1;
        // subsonic is linear in Mach
        assert!((drag_coefficient(cd0, 0.3) - 0.10375).abs() < 1e-12);
        // transonic quadratic: 0.3742 * 0.81 - 0.252 * 0.9 + 0.0021
        assert!((drag_coefficient(cd0, 0.9) - (0.078_402 + cd0)).abs() < 1e-9);
        // supersonic power law, Mach 1.5
        let expected = 0.2965 * 1.5_f64.powf(-1.1506) + cd0;
        assert!((drag_coefficient(cd0, 1.5) - expected).abs() < 1e-12);
        assert!(drag_coefficient(cd0, 1.5) > 0.28 && drag_coefficient(cd0, 1.5) < 0.29);
    }

    #[test]
    fn test_drag_decay_single_step() {
        let air = AtmosphereSample {
            temperature_f: 59.0,
            pressure_psf: 2116.0,
            density_slug_ft3: 0.002,
            speed_of_sound_fps: 1000.0,
        };
        // Mach 0.4 subsonic: cd = 0.0125 * 0.4 + 0.2 = 0.205
        let decay = drag_decay_fps(400.0, 0.2, 0.5, 0.01, &air, 0.1);
        let expected = 0.5 * 0.205 * 0.002 * 400.0 * 400.0 * 0.5 / 0.01 * 0.1;
        assert!((decay - expected).abs() < 1e-9, "{decay} vs {expected}");
        assert!((decay - 164.0).abs() < 1e-9);

        assert_eq!(drag_decay_fps(400.0, 0.2, 0.5, 0.0, &air, 0.1), 0.0, "massless");
        assert_eq!(drag_decay_fps(400.0, 0.2, 0.0, 0.01, &air, 0.1), 0.0, "no area");
    }

    #[test]
    fn test_drag_peaks_through_transonic() {
        let cd0 = 0.0;
        let sub = drag_coefficient(cd0, 0.69);
        let trans = drag_coefficient(cd0, 1.1);
        let sup = drag_coefficient(cd0, 3.0);
        assert!(trans > sub, "transonic {trans} vs subsonic {sub}");
        assert!(trans > sup, "transonic {trans} vs supersonic {sup}");
    }

    #[test]
    fn test_new_sets_life_and_attitude() {
        let mut kin = Kinematics::default();
        let mut life = Lifecycle::default();
        let params = BallisticParams {
            azimuth_deg: 450.0,
            elevation_deg: 30.0,
            speed_fps: 1000.0,
            life_secs: 12.0,
            ..Default::default()
        };
        let b = BallisticBehavior::new(params, &mut kin, &mut life);
        assert_eq!(life.life_secs, 12.0);
        assert!((kin.orientation.heading_deg - 90.0).abs() < 1e-9);
        assert!((b.velocity().east_fps - 1000.0 * 30.0_f64.to_radians().cos()).abs() < 1e-6);
        assert!((b.velocity().down_fps + 500.0).abs() < 1e-6);
    }
}
