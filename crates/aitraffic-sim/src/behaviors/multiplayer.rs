//! Remote player proxy. Smooths already-decoded motion packets into a
//! continuous track by interpolating between packets, or extrapolating a
//! short way past the newest one.

use glam::{DQuat, EulerRot};

use aitraffic_core::constants::*;
use aitraffic_core::error::BehaviorFault;
use aitraffic_core::geo::normalize_heading;
use aitraffic_core::params::{MotionPacket, MultiplayerParams};
use aitraffic_core::types::{GeoPosition, NedVelocity, Orientation};

use super::{EntityMut, UpdateContext};

#[derive(Debug)]
pub struct MultiplayerBehavior {
    params: MultiplayerParams,
    /// Packets in ascending sender time.
    packets: Vec<MotionPacket>,
    /// Sender time minus local time, adjusted slowly toward the packet lag.
    time_offset: Option<f64>,
    velocity: Option<NedVelocity>,
}

/// Interpolated or extrapolated motion at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionSample {
    pub position: GeoPosition,
    pub orientation: Orientation,
    pub velocity: NedVelocity,
}

impl MultiplayerBehavior {
    pub fn new(params: MultiplayerParams) -> Self {
        Self {
            params,
            packets: Vec::new(),
            time_offset: None,
            velocity: None,
        }
    }

    pub fn is_tanker(&self) -> bool {
        self.params.tanker
    }

    /// Velocity of the last computed sample, once one exists.
    pub fn velocity(&self) -> Option<NedVelocity> {
        self.velocity
    }

    pub fn packet_count(&self) -> usize {
        self.packets.len()
    }

    /// Queue a packet. Out-of-order packets are dropped; one far older than
    /// the newest means the sender restarted, so the history is cleared.
    pub fn push_packet(&mut self, packet: MotionPacket) {
        if let Some(newest) = self.packets.last() {
            let diff = packet.time - newest.time;
            if diff < -MP_OUT_OF_ORDER_RESET_SECS {
                self.packets.clear();
                self.time_offset = None;
            } else if diff < 0.0 {
                return;
            } else if diff == 0.0 {
                self.packets.pop();
            }
        }
        self.packets.push(packet);
    }

    pub fn update(&mut self, entity: EntityMut<'_>, ctx: &mut UpdateContext<'_>) -> Result<(), BehaviorFault> {
        let dt = ctx.dt;
        if dt <= 0.0 {
            return Ok(());
        }
        let Some(newest) = self.packets.last().copied() else {
            return Ok(());
        };

        let offset = self.adjust_offset(&newest, ctx.sim_time_secs, dt);
        let sample = self.sample_at(ctx.sim_time_secs + offset);

        let kin = entity.kinematics;
        kin.position = sample.position;
        kin.orientation = sample.orientation;
        kin.speed_kt = sample.velocity.north_fps.hypot(sample.velocity.east_fps) / KT_TO_FPS;
        kin.vertical_speed_fpm = -sample.velocity.down_fps * 60.0;
        self.velocity = Some(sample.velocity);
        Ok(())
    }

    /// First-order lag of the time offset toward the newest packet's.
    /// Late packets lengthen the display delay quickly; early packets
    /// shorten it only slowly.
    fn adjust_offset(&mut self, newest: &MotionPacket, sim_time: f64, dt: f64) -> f64 {
        let measured = newest.time - sim_time - newest.lag;
        let Some(offset) = self.time_offset else {
            self.time_offset = Some(measured);
            return measured;
        };

        let next = if measured - MP_OUT_OF_ORDER_RESET_SECS > offset {
            tracing::debug!(offset = measured, "multiplayer time offset reset");
            measured
        } else {
            let err = measured - offset;
            let rate = if err < 0.0 {
                MP_LAG_ADJUST_SPEED * err
            } else {
                (0.1 * err * err).min(MP_LAG_ADJUST_MAX_RATE)
            };
            let mut increment = dt * rate;
            if err.abs() < increment.abs() {
                increment = err;
            }
            offset + increment
        };
        self.time_offset = Some(next);
        next
    }

    /// Motion at sender time `t`. Callers guarantee at least one packet.
    pub fn sample_at(&self, t: f64) -> MotionSample {
        let (Some(first), Some(newest)) = (self.packets.first(), self.packets.last()) else {
            return MotionSample {
                position: GeoPosition::default(),
                orientation: Orientation::default(),
                velocity: NedVelocity::default(),
            };
        };

        if t > newest.time {
            return extrapolate(newest, t - newest.time);
        }

        let next_idx = self.packets.partition_point(|p| p.time <= t);
        if next_idx == 0 {
            return sample_of(first);
        }
        if next_idx >= self.packets.len() {
            return sample_of(newest);
        }
        let prev = &self.packets[next_idx - 1];
        let next = &self.packets[next_idx];
        let span = next.time - prev.time;
        let tau = if span > 0.0 { ((t - prev.time) / span).clamp(0.0, 1.0) } else { 1.0 };
        interpolate(prev, next, tau)
    }
}

fn sample_of(packet: &MotionPacket) -> MotionSample {
    MotionSample {
        position: packet.position,
        orientation: packet.orientation,
        velocity: packet.velocity,
    }
}

fn interpolate(prev: &MotionPacket, next: &MotionPacket, tau: f64) -> MotionSample {
    let mix = |a: f64, b: f64| (1.0 - tau) * a + tau * b;
    let position = GeoPosition::new(
        mix(prev.position.lat_deg, next.position.lat_deg),
        mix(prev.position.lon_deg, next.position.lon_deg),
        mix(prev.position.alt_ft, next.position.alt_ft),
    );
    let velocity = NedVelocity::new(
        mix(prev.velocity.north_fps, next.velocity.north_fps),
        mix(prev.velocity.east_fps, next.velocity.east_fps),
        mix(prev.velocity.down_fps, next.velocity.down_fps),
    );
    let q = to_quat(&prev.orientation).slerp(to_quat(&next.orientation), tau);
    MotionSample {
        position,
        orientation: from_quat(q),
        velocity,
    }
}

/// Dead-reckon past the newest packet with its velocity, in fixed steps,
/// never further than the extrapolation cap.
fn extrapolate(newest: &MotionPacket, ahead_secs: f64) -> MotionSample {
    let mut remaining = ahead_secs.min(MP_MAX_EXTRAPOLATION_SECS);
    let mut position = newest.position;
    let v = newest.velocity;
    while remaining > 0.0 {
        let h = remaining.min(MP_EXTRAPOLATION_STEP_SECS);
        position = position.displaced(v.north_fps * h, v.east_fps * h, -v.down_fps * h);
        remaining -= h;
    }
    MotionSample {
        position,
        orientation: newest.orientation,
        velocity: v,
    }
}

fn to_quat(o: &Orientation) -> DQuat {
    DQuat::from_euler(
        EulerRot::ZYX,
        o.heading_deg.to_radians(),
        o.pitch_deg.to_radians(),
        o.roll_deg.to_radians(),
    )
}

fn from_quat(q: DQuat) -> Orientation {
    let (yaw, pitch, roll) = q.to_euler(EulerRot::ZYX);
    Orientation::new(
        normalize_heading(yaw.to_degrees()),
        pitch.to_degrees(),
        roll.to_degrees(),
    )
}
