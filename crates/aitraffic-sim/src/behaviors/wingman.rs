//! Wingman: formates on a named leader, breaks away and rejoins on command.

use glam::DVec3;

use aitraffic_core::components::{Kinematics, Targets};
use aitraffic_core::constants::*;
use aitraffic_core::enums::{PerformanceClass, RemovalReason, WingmanPhase};
use aitraffic_core::error::BehaviorFault;
use aitraffic_core::filter::{approach, approach_asymmetric, lag, lag_heading};
use aitraffic_core::geo::{heading_error, normalize_heading, rotate_body_to_ned, rotate_ned_to_body, sign};
use aitraffic_core::params::WingmanParams;
use aitraffic_core::state::VariantDetail;
use aitraffic_core::types::GeoPosition;
use aitraffic_pilot::formation::{self, FormationContext, Steering};
use aitraffic_pilot::performance::{get_profile, PerformanceProfile};
use aitraffic_pilot::tuning::KinematicTuning;

use super::{advance_position, EntityMut, ParentTracker, UpdateContext};
use crate::systems::peers::PeerView;

#[derive(Debug)]
pub struct WingmanBehavior {
    params: WingmanParams,
    profile: PerformanceProfile,
    parent: ParentTracker,
    phase: WingmanPhase,
    elapsed_in_phase_secs: f64,
    ordered: Option<WingmanPhase>,
    /// Offsets currently flown, converging on the commanded ones.
    /// `None` until measured from the first leader sighting.
    offset_ft: Option<DVec3>,
}

impl WingmanBehavior {
    pub fn new(params: WingmanParams, targets: &mut Targets) -> Self {
        targets.heading_lock = true;
        Self {
            params,
            profile: get_profile(PerformanceClass::JetFighter),
            parent: ParentTracker::default(),
            phase: WingmanPhase::Formate,
            elapsed_in_phase_secs: 0.0,
            ordered: None,
            offset_ft: None,
        }
    }

    pub fn phase(&self) -> WingmanPhase {
        self.phase
    }

    pub fn order_break(&mut self) {
        self.ordered = Some(WingmanPhase::Break);
    }

    pub fn order_join(&mut self) {
        self.ordered = Some(WingmanPhase::Join);
    }

    pub fn detail(&self) -> VariantDetail {
        VariantDetail::Wingman { phase: self.phase }
    }

    /// Commanded offset in the leader body frame (x forward, y right, z down).
    fn commanded_offset(&self) -> DVec3 {
        DVec3::new(self.params.x_offset_ft, self.params.y_offset_ft, -self.params.z_offset_ft)
    }

    pub fn update(&mut self, entity: EntityMut<'_>, ctx: &mut UpdateContext<'_>) -> Result<(), BehaviorFault> {
        let dt = ctx.dt;
        if dt <= 0.0 {
            return Ok(());
        }
        let kin = entity.kinematics;
        let targets = entity.targets;

        let leader = ctx.peers.by_name(&self.params.parent, entity.id);
        if self.parent.record(leader.is_some()) {
            tracing::warn!(id = %entity.id, parent = %self.params.parent, "wingman leader not found, removing");
            entity.lifecycle.mark_dying(RemovalReason::ParentLost);
            return Ok(());
        }
        let Some(leader) = leader else {
            // coast until the leader shows up or the retries run out
            advance_position(kin, dt);
            return Ok(());
        };

        let station = station_position(leader, self.commanded_offset());
        let fsm = formation::evaluate(&FormationContext {
            phase: self.phase,
            elapsed_in_phase_secs: self.elapsed_in_phase_secs,
            ordered: self.ordered.take(),
            speed_kt: kin.speed_kt,
            parent_heading_deg: leader.orientation.heading_deg,
            parent_speed_kt: leader.speed_kt,
            range_to_station_ft: kin.position.slant_distance_ft_to(&station),
            bearing_to_station_deg: kin.position.bearing_deg_to(&station),
            break_angle_deg: self.params.break_angle_deg,
            break_side: self.params.break_side,
            break_duration_secs: self.params.break_duration_secs,
            join_tolerance_ft: self.params.join_tolerance_ft,
            max_speed_kt: self.params.max_speed_kt,
        });

        if fsm.phase_changed {
            tracing::debug!(id = %entity.id, from = ?self.phase, to = ?fsm.new_phase, "wingman phase change");
            self.elapsed_in_phase_secs = 0.0;
            if fsm.new_phase == WingmanPhase::Formate {
                // pick up from wherever the join left us
                self.offset_ft = None;
            }
        } else {
            self.elapsed_in_phase_secs += dt;
        }
        self.phase = fsm.new_phase;

        match fsm.steering {
            Steering::Formate => self.formate(kin, targets, leader, dt),
            Steering::Free {
                heading_deg,
                speed_kt,
                full_bank,
            } => {
                targets.heading_deg = heading_deg;
                targets.speed_kt = speed_kt.clamp(0.0, self.params.max_speed_kt.max(0.0));
                targets.altitude_ft = station.alt_ft;
                targets.heading_lock = true;
                self.fly_free(kin, targets, full_bank, dt, &ctx.tuning.kinematics);
            }
        }
        Ok(())
    }

    fn formate(&mut self, kin: &mut Kinematics, targets: &mut Targets, leader: &PeerView, dt: f64) {
        let commanded = self.commanded_offset();
        let current = self
            .offset_ft
            .unwrap_or_else(|| measured_offset(leader, &kin.position));
        let tau = self.params.formate_lag_secs;
        let offset = DVec3::new(
            lag(current.x, commanded.x, dt, tau),
            lag(current.y, commanded.y, dt, tau),
            lag(current.z, commanded.z, dt, tau),
        );
        self.offset_ft = Some(offset);

        kin.position = station_position(leader, offset);
        kin.orientation.heading_deg = lag_heading(kin.orientation.heading_deg, leader.orientation.heading_deg, dt, tau);
        kin.orientation.pitch_deg = lag(kin.orientation.pitch_deg, leader.orientation.pitch_deg, dt, tau);
        kin.orientation.roll_deg = lag(kin.orientation.roll_deg, leader.orientation.roll_deg, dt, tau);
        kin.speed_kt = leader.speed_kt.max(0.0);
        kin.vertical_speed_fpm = leader.vertical_speed_fpm;

        targets.heading_deg = leader.orientation.heading_deg;
        targets.speed_kt = kin.speed_kt;
        targets.altitude_ft = kin.position.alt_ft;
        targets.roll_deg = kin.orientation.roll_deg;
    }

    /// Simple banked-turn flight toward the targets.
    fn fly_free(&self, kin: &mut Kinematics, targets: &mut Targets, full_bank: bool, dt: f64, tuning: &KinematicTuning) {
        let profile = &self.profile;
        kin.speed_kt = approach_asymmetric(
            kin.speed_kt,
            targets.speed_kt,
            profile.accel_kt_s,
            profile.decel_kt_s,
            dt,
            tuning.speed_deadband_kt,
        )
        .max(0.0);

        advance_position(kin, dt);

        let roll = kin.orientation.roll_deg;
        if roll.abs() > 0.0 && kin.speed_kt > 0.0 {
            let v = kin.speed_kt;
            let radius = if v <= AIRCRAFT_MIN_TURN_SPEED_KT {
                1.0
            } else {
                AIRCRAFT_TURN_RADIUS_COEFF * v * v / roll.to_radians().tan().abs()
            };
            let alpha = v * KT_TO_FPS * dt / (2.0 * std::f64::consts::PI * radius) * 360.0;
            let error = heading_error(kin.orientation.heading_deg, targets.heading_deg);
            // never turn past the target
            let step = alpha.min(error.abs());
            kin.orientation.heading_deg = normalize_heading(kin.orientation.heading_deg + step * sign(roll));
        }

        let max_bank = self.params.max_bank_deg.abs();
        let error = heading_error(kin.orientation.heading_deg, targets.heading_deg);
        let bank = if full_bank && error.abs() > tuning.bank_deadband_deg {
            max_bank
        } else {
            error.abs().min(max_bank)
        };
        targets.roll_deg = bank * sign(error);
        kin.orientation.roll_deg = approach(
            kin.orientation.roll_deg,
            targets.roll_deg,
            tuning.bank_rate_deg_s,
            dt,
            tuning.bank_deadband_deg,
        );

        let alt_error = targets.altitude_ft - kin.position.alt_ft;
        targets.vertical_speed_fpm = alt_error.clamp(-profile.descent_fpm, profile.climb_fpm);
        kin.vertical_speed_fpm = approach(
            kin.vertical_speed_fpm,
            targets.vertical_speed_fpm,
            tuning.vertical_accel_fpm_s,
            dt,
            tuning.vs_deadband_fpm,
        );
        kin.position.alt_ft += kin.vertical_speed_fpm / 60.0 * dt;

        let pitch_target = if kin.vertical_speed_fpm >= 0.0 {
            kin.vertical_speed_fpm * PITCH_PER_FPM_CLIMB
        } else {
            kin.vertical_speed_fpm * PITCH_PER_FPM_DESCENT
        };
        kin.orientation.pitch_deg = approach(
            kin.orientation.pitch_deg,
            pitch_target,
            tuning.pitch_rate_deg_s,
            dt,
            tuning.pitch_deadband_deg,
        );
    }
}

/// World position of a leader-body-frame offset (z down).
fn station_position(leader: &PeerView, offset: DVec3) -> GeoPosition {
    let ned = rotate_body_to_ned(&leader.orientation, offset);
    leader.position.displaced(ned.x, ned.y, -ned.z)
}

/// Where `position` sits in the leader body frame.
fn measured_offset(leader: &PeerView, position: &GeoPosition) -> DVec3 {
    let (north, east) = leader.position.offset_ft_to(position);
    let down = leader.position.alt_ft - position.alt_ft;
    rotate_ned_to_body(&leader.orientation, DVec3::new(north, east, down))
}
