//! Ground vehicle towed behind a named parent.

use aitraffic_core::components::{Kinematics, Targets};
use aitraffic_core::constants::*;
use aitraffic_core::enums::RemovalReason;
use aitraffic_core::error::BehaviorFault;
use aitraffic_core::filter::lag;
use aitraffic_core::geo::{normalize_180, normalize_heading};
use aitraffic_core::params::{GroundVehicleParams, ShipParams};
use aitraffic_core::types::GeoPosition;
use aitraffic_terrain::GroundQuery;

use super::ship::ShipKinematics;
use super::{EntityMut, ParentTracker, UpdateContext};

/// Range (ft) either side of the standoff treated as in position.
const TOW_RANGE_DEADBAND_FT: f64 = 0.25;

/// Catch-up speed bonus (kt) when far behind.
const TOW_CATCH_UP_KT: f64 = 50.0;

/// Parent speed (kt) below which the vehicle simply matches it.
const TOW_MIN_PARENT_SPEED_KT: f64 = 1.0;

#[derive(Debug)]
pub struct GroundVehicleBehavior {
    params: GroundVehicleParams,
    ship: ShipKinematics,
    parent: ParentTracker,
    tow_angle_deg: f64,
    range_ft: f64,
    relbrg_deg: f64,
}

impl GroundVehicleBehavior {
    pub fn new(params: GroundVehicleParams, targets: &mut Targets) -> Self {
        targets.heading_lock = true;
        let mut ship = ShipKinematics::new(ShipParams {
            base_turn_radius_ft: 50.0,
            rudder_rate_deg_s: 10.0,
            accel_kt_s: 5.0,
            speed_dependent_turn: false,
            max_speed_kt: params.max_speed_kt,
        });
        ship.no_roll = true;
        Self {
            params,
            ship,
            parent: ParentTracker::default(),
            tow_angle_deg: 0.0,
            range_ft: 0.0,
            relbrg_deg: 0.0,
        }
    }

    pub fn tow_angle_deg(&self) -> f64 {
        self.tow_angle_deg
    }

    /// Distance to the parent's hitch (ft).
    pub fn range_ft(&self) -> f64 {
        self.range_ft
    }

    /// Tow speed law. `range_ft` is measured to the hitch and `relbrg_deg`
    /// is the hitch bearing relative to the vehicle heading.
    pub fn tow_speed(&self, parent_speed_kt: f64, range_ft: f64, relbrg_deg: f64) -> f64 {
        let standoff = self.params.parent_x_offset_ft;
        let x = if range_ft > 3.0 * standoff { TOW_CATCH_UP_KT } else { 0.0 };

        let speed = if !(-90.0..=90.0).contains(&relbrg_deg) {
            parent_speed_kt - 5.0 - x
        } else if range_ft > standoff + TOW_RANGE_DEADBAND_FT {
            parent_speed_kt + 1.0 + x
        } else if range_ft < standoff - TOW_RANGE_DEADBAND_FT {
            parent_speed_kt - 1.0 - x
        } else {
            parent_speed_kt
        };
        speed.clamp(0.0, self.params.max_speed_kt.max(0.0))
    }

    pub fn update(&mut self, entity: EntityMut<'_>, ctx: &mut UpdateContext<'_>) -> Result<(), BehaviorFault> {
        let dt = ctx.dt;
        if dt <= 0.0 {
            return Ok(());
        }
        let kin = entity.kinematics;
        let targets = entity.targets;

        self.follow_ground(kin, ctx.ground, dt);

        let parent = ctx.peers.by_name(&self.params.parent, entity.id);
        if self.parent.record(parent.is_some()) {
            tracing::warn!(id = %entity.id, parent = %self.params.parent, "tow parent not found, removing");
            entity.lifecycle.mark_dying(RemovalReason::ParentLost);
            return Ok(());
        }

        if let Some(parent) = parent {
            let hitch = parent
                .position
                .project(parent.orientation.heading_deg + 180.0, self.params.parent_x_offset_ft)
                .project(parent.orientation.heading_deg + 90.0, self.params.y_offset_ft);
            self.range_ft = kin.position.distance_ft_to(&hitch);
            let bearing = kin.position.bearing_deg_to(&hitch);
            self.relbrg_deg = normalize_180(bearing - kin.orientation.heading_deg);

            if parent.waiting || parent.dying {
                targets.speed_kt = 0.0;
                self.tow_angle_deg = lag(self.tow_angle_deg, 0.0, dt, self.params.lag_secs);
            } else if self.range_ft > TOW_RESCUE_RANGE_FT {
                tracing::debug!(id = %entity.id, range_ft = self.range_ft, "tow rescue");
                self.tow_angle_deg = lag(self.tow_angle_deg, 0.0, dt, self.params.lag_secs);
                targets.speed_kt = (2.0 * parent.speed_kt).clamp(0.0, self.params.max_speed_kt.max(0.0));
                targets.heading_deg = bearing;
            } else if parent.speed_kt > TOW_MIN_PARENT_SPEED_KT {
                targets.speed_kt = self.tow_speed(parent.speed_kt, self.range_ft, self.relbrg_deg);
                let limit = self.params.tow_angle_limit_deg.abs();
                let commanded = (self.relbrg_deg * self.params.tow_angle_gain).clamp(-limit, limit);
                self.tow_angle_deg = lag(self.tow_angle_deg, commanded, dt, self.params.lag_secs);
                targets.heading_deg = normalize_heading(kin.orientation.heading_deg + self.tow_angle_deg);
            } else {
                targets.speed_kt = parent.speed_kt.clamp(0.0, self.params.max_speed_kt.max(0.0));
            }
            targets.heading_lock = true;
        }

        self.ship.update(kin, targets, dt);
        Ok(())
    }

    /// Sit on the ground: altitude from the mean of the front and rear
    /// contact elevations, pitch from their difference.
    fn follow_ground(&self, kin: &mut Kinematics, ground: &dyn GroundQuery, dt: f64) {
        let half = self.params.length_ft.max(0.0) / 2.0;
        let heading = kin.orientation.heading_deg;
        let front = kin.position.project(heading, half);
        let rear = kin.position.project(heading + 180.0, half);
        let (Some(front_elev), Some(rear_elev)) = (elevation_at(ground, &front), elevation_at(ground, &rear)) else {
            return;
        };

        let target_alt = (front_elev + rear_elev) / 2.0 + self.params.z_offset_ft;
        let target_pitch = if half > 0.0 {
            (front_elev - rear_elev).atan2(2.0 * half).to_degrees()
        } else {
            0.0
        };
        kin.position.alt_ft = lag(kin.position.alt_ft, target_alt, dt, self.params.lag_secs);
        kin.orientation.pitch_deg = lag(kin.orientation.pitch_deg, target_pitch, dt, self.params.lag_secs);
    }
}

fn elevation_at(ground: &dyn GroundQuery, pos: &GeoPosition) -> Option<f64> {
    ground.elevation_ft(pos.lat_deg, pos.lon_deg)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vehicle() -> GroundVehicleBehavior {
        let mut targets = Targets::default();
        GroundVehicleBehavior::new(GroundVehicleParams::default(), &mut targets)
    }

    #[test]
    fn test_tow_speed_law() {
        let gv = vehicle();
        let off = TOW_HITCH_OFFSET_FT;
        assert_eq!(gv.tow_speed(20.0, off, 0.0), 20.0, "in position");
        assert_eq!(gv.tow_speed(20.0, off + 10.0, 0.0), 21.0, "behind the hitch");
        assert_eq!(gv.tow_speed(20.0, off - 10.0, 0.0), 19.0, "crowding the hitch");
        assert_eq!(gv.tow_speed(20.0, off, 120.0), 15.0, "hitch behind");
        assert_eq!(gv.tow_speed(20.0, 4.0 * off, 0.0), 71.0, "catch up");
        assert_eq!(gv.tow_speed(2.0, 4.0 * off, 150.0), 0.0, "never reverses");
    }

    #[test]
    fn test_tow_speed_clamped_to_max() {
        let gv = vehicle();
        assert_eq!(gv.tow_speed(79.5, 4.0 * TOW_HITCH_OFFSET_FT, 0.0), 80.0);
    }
}
