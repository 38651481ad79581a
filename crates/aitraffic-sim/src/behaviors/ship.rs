//! Surface craft: rudder-turn kinematics, optionally following a plan.
//!
//! [`ShipKinematics`] is reused by carriers, escorts and ground vehicles.

use aitraffic_core::components::{Kinematics, Targets};
use aitraffic_core::constants::*;
use aitraffic_core::error::BehaviorFault;
use aitraffic_core::filter::{approach, lag};
use aitraffic_core::geo::{heading_error, normalize_heading, sign};
use aitraffic_core::params::ShipParams;
use aitraffic_core::state::VariantDetail;
use aitraffic_pilot::plan::FlightPlan;
use aitraffic_pilot::sequencer::{SequencerContext, WaypointSequencer};
use aitraffic_pilot::tuning::Tuning;

use super::{advance_position, apply_sequencer_output, plan_detail, EntityMut, UpdateContext};

const RUDDER_DEADBAND_DEG: f64 = 0.1;
const SPEED_DEADBAND_KT: f64 = 0.1;

/// Speed (kt) below which the rudder limit follows the linear law.
const RUDDER_LIMIT_SPEED_KT: f64 = 40.0;
const RUDDER_LIMIT_HIGH_SPEED_DEG: f64 = 2.0;

/// Rudder-driven turn kinematics shared by every surface variant.
#[derive(Debug, Clone)]
pub struct ShipKinematics {
    pub params: ShipParams,
    pub rudder_deg: f64,
    pub target_rudder_deg: f64,
    /// Suppress the rudder-induced heel.
    pub no_roll: bool,
}

impl ShipKinematics {
    pub fn new(params: ShipParams) -> Self {
        Self {
            params,
            rudder_deg: 0.0,
            target_rudder_deg: 0.0,
            no_roll: false,
        }
    }

    /// Turn radius (ft) at `speed_kt` with `rudder_deg` applied.
    pub fn turn_radius_ft(&self, speed_kt: f64, rudder_deg: f64) -> f64 {
        let base = self.params.base_turn_radius_ft;
        let sp = if self.params.speed_dependent_turn {
            10.0 * (speed_kt.abs() - 15.0).powi(2) + base
        } else {
            base
        };
        (19.0 * (-0.2485 * rudder_deg.abs()).exp() + 0.543) * sp
    }

    /// Largest rudder usable at `speed_kt` (deg).
    pub fn rudder_limit_deg(speed_kt: f64) -> f64 {
        let speed = speed_kt.abs();
        if speed <= RUDDER_LIMIT_SPEED_KT {
            -0.825 * speed + 35.0
        } else {
            RUDDER_LIMIT_HIGH_SPEED_DEG
        }
    }

    /// Tightest turn radius available at `speed_kt`, for lead distances.
    pub fn min_turn_radius_ft(&self, speed_kt: f64) -> f64 {
        let rudder = Self::rudder_limit_deg(speed_kt).min(SHIP_FULL_RUDDER_DEG);
        self.turn_radius_ft(speed_kt, rudder)
    }

    /// One integration step: speed, position, turn, heel, rudder.
    pub fn update(&mut self, kin: &mut Kinematics, targets: &Targets, dt: f64) {
        if dt <= 0.0 {
            return;
        }
        let target_speed = targets.speed_kt.clamp(0.0, self.params.max_speed_kt.max(0.0));
        kin.speed_kt = approach(kin.speed_kt, target_speed, self.params.accel_kt_s, dt, SPEED_DEADBAND_KT).max(0.0);

        advance_position(kin, dt);

        let speed = kin.speed_kt;
        if self.rudder_deg.abs() >= SHIP_RUDDER_DEADZONE_DEG && speed > 0.0 {
            let radius_ft = self.turn_radius_ft(speed, self.rudder_deg);
            let alpha_deg = (speed * KT_TO_FPS * dt / radius_ft).to_degrees();
            kin.orientation.heading_deg = normalize_heading(kin.orientation.heading_deg + alpha_deg * sign(self.rudder_deg));
        }

        let heel = if self.no_roll {
            0.0
        } else {
            SHIP_ROLL_FACTOR * speed * self.rudder_deg
        };
        kin.orientation.roll_deg = lag(kin.orientation.roll_deg, heel, dt, SHIP_ROLL_TAU_SECS);

        self.target_rudder_deg = if targets.heading_lock {
            let error = heading_error(kin.orientation.heading_deg, targets.heading_deg);
            if error.abs() < SHIP_PROPORTIONAL_RUDDER_DEG {
                error
            } else {
                SHIP_FULL_RUDDER_DEG * sign(error)
            }
        } else {
            targets.roll_deg
        };
        let limit = Self::rudder_limit_deg(speed);
        self.target_rudder_deg = self.target_rudder_deg.clamp(-limit, limit);
        self.rudder_deg = approach(
            self.rudder_deg,
            self.target_rudder_deg,
            self.params.rudder_rate_deg_s,
            dt,
            RUDDER_DEADBAND_DEG,
        );

        kin.vertical_speed_fpm = 0.0;
    }
}

#[derive(Debug)]
pub struct ShipBehavior {
    kinematics: ShipKinematics,
    sequencer: Option<WaypointSequencer>,
}

impl ShipBehavior {
    pub fn new(
        params: ShipParams,
        plan: Option<FlightPlan>,
        kin: &mut Kinematics,
        targets: &mut Targets,
        tuning: &Tuning,
    ) -> Self {
        let kinematics = ShipKinematics::new(params);
        targets.heading_lock = true;

        let sequencer = plan.map(|plan| {
            let mut sequencer = WaypointSequencer::new(plan);
            let radius = kinematics.min_turn_radius_ft(kin.speed_kt);
            if let Some(priming) = sequencer.prime(Some(radius), &tuning.flight_plan) {
                kin.position = priming.position;
                kin.speed_kt = priming.speed_kt.max(0.0);
                kin.orientation.heading_deg = normalize_heading(priming.heading_deg);
                targets.heading_deg = kin.orientation.heading_deg;
                targets.speed_kt = kin.speed_kt;
                targets.altitude_ft = kin.position.alt_ft;
            }
            sequencer
        });

        Self { kinematics, sequencer }
    }

    pub fn is_waiting(&self) -> bool {
        self.sequencer.as_ref().is_some_and(|s| s.is_waiting())
    }

    pub fn rudder_deg(&self) -> f64 {
        self.kinematics.rudder_deg
    }

    pub fn detail(&self) -> VariantDetail {
        match &self.sequencer {
            Some(sequencer) => plan_detail(sequencer),
            None => VariantDetail::Ship {
                rudder_deg: self.kinematics.rudder_deg,
            },
        }
    }

    pub fn update(&mut self, mut entity: EntityMut<'_>, ctx: &mut UpdateContext<'_>) -> Result<(), BehaviorFault> {
        if ctx.dt <= 0.0 {
            return Ok(());
        }
        self.kinematics.update(entity.kinematics, entity.targets, ctx.dt);

        if let Some(sequencer) = self.sequencer.as_mut() {
            let radius = self.kinematics.min_turn_radius_ft(entity.kinematics.speed_kt);
            let seq_ctx = SequencerContext {
                position: entity.kinematics.position,
                speed_kt: entity.kinematics.speed_kt,
                target_heading_deg: entity.targets.heading_deg,
                target_speed_kt: entity.targets.speed_kt,
                dt: ctx.dt,
                time_of_day_secs: ctx.time_of_day_secs,
                turn_radius_ft: Some(radius),
                tuning: &ctx.tuning.flight_plan,
            };
            let mut out = sequencer.update(&seq_ctx, entity.kinematics.position.alt_ft, &mut *ctx.rng);
            // surface craft hold their altitude
            out.altitude_ft = None;
            out.vertical_speed_fpm = None;
            apply_sequencer_output(&out, &mut entity, ctx.outbox);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rudder_limit_law() {
        assert!((ShipKinematics::rudder_limit_deg(0.0) - 35.0).abs() < 1e-9);
        assert!((ShipKinematics::rudder_limit_deg(20.0) - 18.5).abs() < 1e-9);
        assert_eq!(ShipKinematics::rudder_limit_deg(45.0), 2.0);
    }

    #[test]
    fn test_turn_radius_tightens_with_rudder() {
        let ship = ShipKinematics::new(ShipParams::default());
        let gentle = ship.turn_radius_ft(15.0, 5.0);
        let hard = ship.turn_radius_ft(15.0, 30.0);
        assert!(hard < gentle, "hard {hard:.0} vs gentle {gentle:.0}");
        // at 15 kt the speed term vanishes
        let expected = (19.0 * (-0.2485_f64 * 30.0).exp() + 0.543) * 2000.0;
        assert!((hard - expected).abs() < 1e-6);
    }

    #[test]
    fn test_zero_dt_is_noop() {
        let mut ship = ShipKinematics::new(ShipParams::default());
        ship.rudder_deg = 10.0;
        let mut kin = Kinematics {
            speed_kt: 12.0,
            ..Default::default()
        };
        let before = kin;
        let targets = Targets {
            heading_lock: true,
            heading_deg: 90.0,
            speed_kt: 20.0,
            ..Default::default()
        };
        ship.update(&mut kin, &targets, 0.0);
        assert_eq!(kin, before);
        assert_eq!(ship.rudder_deg, 10.0);
    }
}
