//! Escort ship holding a range/bearing station on a named parent.

use rand::Rng;

use aitraffic_core::components::Targets;
use aitraffic_core::constants::*;
use aitraffic_core::enums::RemovalReason;
use aitraffic_core::error::BehaviorFault;
use aitraffic_core::filter::lag;
use aitraffic_core::geo::{normalize_180, normalize_heading, sign};
use aitraffic_core::params::EscortParams;

use super::ship::ShipKinematics;
use super::{EntityMut, ParentTracker, UpdateContext};

/// Where the station lies and what to do about it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StationCommand {
    pub speed_kt: f64,
    /// Steering angle off the parent heading, before smoothing.
    pub angle_deg: f64,
    pub on_station: bool,
}

#[derive(Debug)]
pub struct EscortBehavior {
    params: EscortParams,
    ship: ShipKinematics,
    parent: ParentTracker,
    angle_deg: f64,
    patrol_timer_secs: f64,
    patrol_heading_deg: f64,
    patrol_speed_kt: f64,
}

impl EscortBehavior {
    pub fn new(params: EscortParams, targets: &mut Targets) -> Self {
        targets.heading_lock = true;
        let mut ship_params = params.ship.clone();
        ship_params.max_speed_kt = params.max_speed_kt;
        Self {
            ship: ShipKinematics::new(ship_params),
            params,
            parent: ParentTracker::default(),
            angle_deg: 0.0,
            patrol_timer_secs: 0.0,
            patrol_heading_deg: 0.0,
            patrol_speed_kt: 0.0,
        }
    }

    /// Speed and steering for a station at `range_ft`, whose bearing
    /// relative to the parent heading is `relbrg_deg`.
    pub fn station_command(&self, parent_speed_kt: f64, range_ft: f64, relbrg_deg: f64) -> StationCommand {
        let p = &self.params;
        let tolerance = p.station_tolerance_ft.max(0.0);
        let far = range_ft > ESCORT_LARGE_BIAS_FACTOR * tolerance;
        let bias = if far { ESCORT_LARGE_BIAS_KT } else { ESCORT_SMALL_BIAS_KT };

        let behind = !(-90.0..=90.0).contains(&relbrg_deg);
        let (speed, angle, on_station) = if behind {
            // steer across while dropping back
            let mirror = sign(relbrg_deg) * (180.0 - relbrg_deg.abs());
            (parent_speed_kt - bias, mirror, false)
        } else if range_ft > tolerance {
            (parent_speed_kt + bias, relbrg_deg, false)
        } else {
            (parent_speed_kt, 0.0, true)
        };

        let limit = p.angle_limit_deg.abs();
        StationCommand {
            speed_kt: speed.clamp(p.min_speed_kt.max(0.0), p.max_speed_kt.max(p.min_speed_kt).max(0.0)),
            angle_deg: angle.clamp(-limit, limit),
            on_station,
        }
    }

    pub fn update(&mut self, entity: EntityMut<'_>, ctx: &mut UpdateContext<'_>) -> Result<(), BehaviorFault> {
        let dt = ctx.dt;
        if dt <= 0.0 {
            return Ok(());
        }
        let kin = entity.kinematics;
        let targets = entity.targets;

        let parent = ctx.peers.by_name(&self.params.parent, entity.id);
        if self.parent.record(parent.is_some()) {
            tracing::warn!(id = %entity.id, parent = %self.params.parent, "escort parent not found, removing");
            entity.lifecycle.mark_dying(RemovalReason::ParentLost);
            return Ok(());
        }

        if let Some(parent) = parent {
            let p = &self.params;
            let parent_hdg = parent.orientation.heading_deg;
            let station = parent
                .position
                .project(parent_hdg + p.station_bearing_deg, p.station_range_ft);
            let range_ft = kin.position.distance_ft_to(&station);
            let bearing = kin.position.bearing_deg_to(&station);
            targets.altitude_ft = parent.position.alt_ft + p.station_height_ft;

            if range_ft > ESCORT_RESCUE_FACTOR * p.station_tolerance_ft.max(0.0) {
                tracing::debug!(id = %entity.id, range_ft, "escort running to station");
                self.angle_deg = 0.0;
                targets.heading_deg = bearing;
                targets.speed_kt = p.max_speed_kt.max(0.0);
            } else {
                let relbrg = normalize_180(bearing - parent_hdg);
                let command = self.station_command(parent.speed_kt, range_ft, relbrg);
                self.angle_deg = lag(self.angle_deg, command.angle_deg, dt, p.angle_lag_secs);

                let (heading_jitter, speed_jitter) = if p.patrol && command.on_station {
                    self.patrol(dt, ctx)
                } else {
                    self.patrol_timer_secs = 0.0;
                    (0.0, 0.0)
                };
                targets.heading_deg = normalize_heading(parent_hdg + self.angle_deg + heading_jitter);
                targets.speed_kt = (command.speed_kt + speed_jitter).max(0.0);
            }
            targets.heading_lock = true;
        }

        self.ship.update(kin, targets, dt);
        Ok(())
    }

    /// Random heading/speed perturbation, redrawn every patrol period.
    fn patrol(&mut self, dt: f64, ctx: &mut UpdateContext<'_>) -> (f64, f64) {
        self.patrol_timer_secs -= dt;
        if self.patrol_timer_secs <= 0.0 {
            self.patrol_timer_secs = ESCORT_PATROL_PERIOD_SECS;
            let half = self.params.angle_limit_deg.abs() / 2.0;
            self.patrol_heading_deg = if half > 0.0 { ctx.rng.gen_range(-half..=half) } else { 0.0 };
            self.patrol_speed_kt = ctx.rng.gen_range(-1.0..=1.0);
        }
        (self.patrol_heading_deg, self.patrol_speed_kt)
    }
}
