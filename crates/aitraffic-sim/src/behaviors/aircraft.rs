//! Aircraft: bank-to-turn kinematics with heading, altitude and speed
//! locks, optionally driven by a flight plan.

use aitraffic_core::components::{Kinematics, Targets};
use aitraffic_core::constants::*;
use aitraffic_core::enums::PerformanceClass;
use aitraffic_core::error::BehaviorFault;
use aitraffic_core::filter::{approach, approach_asymmetric};
use aitraffic_core::geo::{normalize_heading, sign};
use aitraffic_core::params::AircraftParams;
use aitraffic_core::state::VariantDetail;
use aitraffic_pilot::performance::{get_profile, PerformanceProfile};
use aitraffic_pilot::plan::FlightPlan;
use aitraffic_pilot::sequencer::{SequencerContext, WaypointSequencer};
use aitraffic_pilot::tuning::{KinematicTuning, Tuning};

use super::{advance_position, apply_sequencer_output, plan_detail, EntityMut, UpdateContext};

/// Pitch held during the takeoff roll once past rotate speed (deg).
const ROTATION_PITCH_DEG: f64 = 8.0;

/// Ground steering speed normalisation (kt).
const GROUND_STEER_REF_KT: f64 = 15.0;

/// Heading error (deg) above which ground steering winds up quickly.
const GROUND_STEER_FAST_DEG: f64 = 30.0;

#[derive(Debug)]
pub struct AircraftBehavior {
    profile: PerformanceProfile,
    sequencer: Option<WaypointSequencer>,
    tanker: bool,
    on_ground: bool,
    ground_offset_ft: f64,
    target_pitch_deg: f64,
    /// Net full turns since the last new leg; positive clockwise.
    spin_counter: i32,
    ground_turn_rate_deg_s: f64,
    ground_heading_error_deg: f64,
}

impl AircraftBehavior {
    pub fn new(
        params: AircraftParams,
        class: Option<PerformanceClass>,
        plan: Option<FlightPlan>,
        kin: &mut Kinematics,
        targets: &mut Targets,
        tuning: &Tuning,
    ) -> Self {
        let class = class.unwrap_or(if params.tanker {
            PerformanceClass::Tanker
        } else {
            PerformanceClass::default()
        });

        targets.heading_lock = true;
        targets.altitude_lock = true;
        targets.use_perf_vs = true;
        if let Some(alt) = params.target_altitude_ft {
            targets.altitude_ft = alt;
        }
        if let Some(speed) = params.target_speed_kt {
            targets.speed_kt = speed.max(0.0);
        }

        let mut aircraft = Self {
            profile: get_profile(class),
            sequencer: None,
            tanker: params.tanker || class == PerformanceClass::Tanker,
            on_ground: false,
            ground_offset_ft: params.ground_offset_ft,
            target_pitch_deg: kin.orientation.pitch_deg,
            spin_counter: 0,
            ground_turn_rate_deg_s: 0.0,
            ground_heading_error_deg: 0.0,
        };

        if let Some(plan) = plan {
            let mut sequencer = WaypointSequencer::new(plan);
            if let Some(priming) = sequencer.prime(None, &tuning.flight_plan) {
                kin.position = priming.position;
                kin.speed_kt = priming.speed_kt.max(0.0);
                kin.orientation.heading_deg = normalize_heading(priming.heading_deg);
                targets.heading_deg = kin.orientation.heading_deg;
                targets.speed_kt = kin.speed_kt;
                targets.altitude_ft = priming.target_altitude_ft;
                if let Some(vs) = priming.target_vertical_speed_fpm {
                    targets.vertical_speed_fpm = vs;
                }
                targets.use_perf_vs = priming.use_perf_vs;
                aircraft.on_ground = priming.on_ground;
            }
            aircraft.sequencer = Some(sequencer);
        }
        aircraft
    }

    pub fn is_tanker(&self) -> bool {
        self.tanker
    }

    pub fn is_waiting(&self) -> bool {
        self.sequencer.as_ref().is_some_and(|s| s.is_waiting())
    }

    pub fn on_ground(&self) -> bool {
        self.on_ground
    }

    pub fn detail(&self) -> Option<VariantDetail> {
        self.sequencer.as_ref().map(plan_detail)
    }

    pub fn update(&mut self, mut entity: EntityMut<'_>, ctx: &mut UpdateContext<'_>) -> Result<(), BehaviorFault> {
        let dt = ctx.dt;
        if dt <= 0.0 {
            return Ok(());
        }
        let k = ctx.tuning.kinematics;

        self.update_speed(entity.kinematics, entity.targets, dt, &k);
        advance_position(entity.kinematics, dt);
        self.update_heading(entity.kinematics, entity.targets, dt, ctx.tuning);
        self.update_bank(entity.kinematics, entity.targets, dt, &k);
        self.update_vertical(entity.kinematics, entity.targets, dt, &k, ctx);
        self.follow_plan(&mut entity, ctx);
        Ok(())
    }

    fn update_speed(&self, kin: &mut Kinematics, targets: &Targets, dt: f64, k: &KinematicTuning) {
        kin.speed_kt = approach_asymmetric(
            kin.speed_kt,
            targets.speed_kt.max(0.0),
            self.profile.accel_kt_s,
            self.profile.decel_kt_s,
            dt,
            k.speed_deadband_kt,
        )
        .max(0.0);
    }

    fn update_heading(&mut self, kin: &mut Kinematics, targets: &Targets, dt: f64, tuning: &Tuning) {
        let speed = kin.speed_kt;
        let mut hdg = kin.orientation.heading_deg;

        if self.on_ground {
            let diff = folded_heading_diff(hdg, targets.heading_deg);
            let sense = bank_sense(hdg, targets.heading_deg);
            let max_rate = tuning.flight_plan.ground_turn_rate_deg_s;
            if diff > GROUND_STEER_FAST_DEG {
                self.ground_turn_rate_deg_s += 10.0 * dt * sense;
                if diff < self.ground_heading_error_deg {
                    self.ground_turn_rate_deg_s = self.ground_turn_rate_deg_s.clamp(-max_rate, max_rate);
                }
            } else if self.ground_turn_rate_deg_s.abs() > diff {
                self.ground_turn_rate_deg_s = diff * sense;
            } else {
                self.ground_turn_rate_deg_s += dt * sense;
            }
            hdg += self.ground_turn_rate_deg_s * dt * (speed.abs() / GROUND_STEER_REF_KT);
            self.ground_heading_error_deg = diff;
        } else {
            let roll = kin.orientation.roll_deg;
            if roll.abs() > f64::EPSILON {
                let radius_ft = if speed > AIRCRAFT_MIN_TURN_SPEED_KT {
                    AIRCRAFT_TURN_RADIUS_COEFF * speed * speed / roll.abs().to_radians().tan()
                } else {
                    1.0
                };
                let circumference_ft = 2.0 * std::f64::consts::PI * radius_ft;
                let alpha_deg = speed * KT_TO_FPS * dt / circumference_ft * 360.0;
                hdg += alpha_deg * sign(roll);
            }
        }

        while hdg >= 360.0 {
            hdg -= 360.0;
            self.spin_counter += 1;
        }
        while hdg < 0.0 {
            hdg += 360.0;
            self.spin_counter -= 1;
        }
        kin.orientation.heading_deg = normalize_heading(hdg);
    }

    fn update_bank(&self, kin: &mut Kinematics, targets: &mut Targets, dt: f64, k: &KinematicTuning) {
        if self.on_ground {
            targets.roll_deg = 0.0;
        } else if targets.heading_lock {
            let hdg = kin.orientation.heading_deg;
            let diff = folded_heading_diff(hdg, targets.heading_deg);
            let sense = bank_sense(hdg, targets.heading_deg);
            let max_bank = self.profile.max_bank_deg;
            targets.roll_deg = diff.min(max_bank) * sense;

            // an aircraft stuck circling its waypoint slows down until it fits
            if self.spin_counter.abs() > 1 && diff > max_bank {
                targets.speed_kt *= SPIN_SPEED_BLEED;
            }
        }
        kin.orientation.roll_deg = approach(
            kin.orientation.roll_deg,
            targets.roll_deg,
            k.bank_rate_deg_s,
            dt,
            k.bank_deadband_deg,
        );
    }

    fn update_vertical(
        &mut self,
        kin: &mut Kinematics,
        targets: &mut Targets,
        dt: f64,
        k: &KinematicTuning,
        ctx: &UpdateContext<'_>,
    ) {
        let alt = kin.position.alt_ft;

        if self.on_ground {
            if let Some(elevation) = ctx.ground.elevation_ft(kin.position.lat_deg, kin.position.lon_deg) {
                let wanted = elevation + self.ground_offset_ft;
                let error = wanted - alt;
                kin.position.alt_ft = if error.abs() > GROUND_SNAP_FT {
                    wanted
                } else {
                    alt + error * GROUND_FOLLOW_GAIN
                };
                targets.altitude_ft = kin.position.alt_ft;
            }
            targets.vertical_speed_fpm = 0.0;
        } else if targets.altitude_lock {
            let error = targets.altitude_ft - alt;
            if targets.use_perf_vs {
                targets.vertical_speed_fpm = error.clamp(-self.profile.descent_fpm, self.profile.climb_fpm);
            } else {
                let max_vs = 4.0 * error;
                let min_vs = if targets.altitude_ft < alt {
                    -CROSSAT_MIN_VS_FPM
                } else {
                    CROSSAT_MIN_VS_FPM
                };
                if error.abs() < CROSSAT_CAPTURE_BAND_FT && max_vs.abs() < targets.vertical_speed_fpm.abs() {
                    targets.vertical_speed_fpm = max_vs;
                }
                if targets.vertical_speed_fpm.abs() < min_vs.abs() {
                    targets.vertical_speed_fpm = min_vs;
                }
            }
        }

        self.target_pitch_deg = if self.on_ground && kin.speed_kt > self.profile.rotate_kt {
            ROTATION_PITCH_DEG
        } else if targets.vertical_speed_fpm > 0.0 {
            targets.vertical_speed_fpm * PITCH_PER_FPM_CLIMB
        } else {
            targets.vertical_speed_fpm * PITCH_PER_FPM_DESCENT
        };

        if !self.on_ground {
            kin.position.alt_ft += kin.vertical_speed_fpm / 60.0 * dt;
            kin.vertical_speed_fpm = approach(
                kin.vertical_speed_fpm,
                targets.vertical_speed_fpm,
                k.vertical_accel_fpm_s,
                dt,
                k.vs_deadband_fpm,
            );
        } else {
            kin.vertical_speed_fpm = 0.0;
        }
        kin.orientation.pitch_deg = approach(
            kin.orientation.pitch_deg,
            self.target_pitch_deg,
            k.pitch_rate_deg_s,
            dt,
            k.pitch_deadband_deg,
        );
    }

    fn follow_plan(&mut self, entity: &mut EntityMut<'_>, ctx: &mut UpdateContext<'_>) {
        let Some(sequencer) = self.sequencer.as_mut() else {
            return;
        };
        let seq_ctx = SequencerContext {
            position: entity.kinematics.position,
            speed_kt: entity.kinematics.speed_kt,
            target_heading_deg: entity.targets.heading_deg,
            target_speed_kt: entity.targets.speed_kt,
            dt: ctx.dt,
            time_of_day_secs: ctx.time_of_day_secs,
            turn_radius_ft: None,
            tuning: &ctx.tuning.flight_plan,
        };
        let out = sequencer.update(&seq_ctx, entity.kinematics.position.alt_ft, &mut *ctx.rng);

        if out.new_leg {
            self.spin_counter = 0;
        }
        if let Some(on_ground) = out.on_ground {
            self.on_ground = on_ground;
        }
        apply_sequencer_output(&out, entity, ctx.outbox);
    }
}

/// Absolute heading difference folded into [0, 180].
pub fn folded_heading_diff(heading_deg: f64, target_deg: f64) -> f64 {
    let diff = (heading_deg - target_deg).abs();
    if diff > 180.0 {
        (diff - 360.0).abs()
    } else {
        diff
    }
}

/// Turn direction toward `target_deg`: +1 right, -1 left. Right when
/// turning right by the folded difference lands on the target.
pub fn bank_sense(heading_deg: f64, target_deg: f64) -> f64 {
    let diff = folded_heading_diff(heading_deg, target_deg);
    let sum = normalize_heading(heading_deg + diff);
    if folded_heading_diff(sum, target_deg) < 1.0 {
        1.0
    } else {
        -1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bank_sense_shortest_turn() {
        assert_eq!(bank_sense(350.0, 10.0), 1.0, "350 -> 10 is a right turn");
        assert_eq!(bank_sense(10.0, 350.0), -1.0, "10 -> 350 is a left turn");
        assert_eq!(bank_sense(90.0, 180.0), 1.0);
        assert_eq!(bank_sense(180.0, 90.0), -1.0);
        assert_eq!(bank_sense(359.9, 0.1), 1.0, "wrap near north");
    }

    #[test]
    fn test_folded_diff() {
        assert!((folded_heading_diff(350.0, 10.0) - 20.0).abs() < 1e-9);
        assert!((folded_heading_diff(0.0, 180.0) - 180.0).abs() < 1e-9);
    }
}
