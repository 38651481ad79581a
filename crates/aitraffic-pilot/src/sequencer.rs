//! Waypoint sequencer state machine.
//!
//! Pure logic over a [`FlightPlan`]: given the owner's kinematic state it
//! decides when a leg is complete and which targets to command next. The
//! owner applies the returned [`SequencerOutput`] to its own targets.
//! No ECS dependency.

use rand::Rng;

use aitraffic_core::geo::{heading_error, normalize_heading};
use aitraffic_core::types::GeoPosition;

use crate::plan::FlightPlan;
use crate::tuning::FlightPlanTuning;

/// Feet per nautical mile used by the cross-altitude rate law.
const CROSSAT_FT_PER_NM: f64 = 6076.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SequencerState {
    /// Plan not yet primed.
    BeforeFirst,
    EnRoute,
    /// Holding at a WAIT/WAITUNTIL sentinel.
    Waiting { remaining_secs: f64 },
    /// `"END"` reached without repeat.
    Finished,
}

/// Kinematic state of the owner at the time of the update.
pub struct SequencerContext<'a> {
    pub position: GeoPosition,
    pub speed_kt: f64,
    pub target_heading_deg: f64,
    pub target_speed_kt: f64,
    pub dt: f64,
    /// Seconds after midnight, for WAITUNTIL.
    pub time_of_day_secs: f64,
    /// Turn radius to use instead of the speed-based estimate.
    pub turn_radius_ft: Option<f64>,
    pub tuning: &'a FlightPlanTuning,
}

/// Initial state taken from the first waypoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Priming {
    pub position: GeoPosition,
    pub speed_kt: f64,
    pub heading_deg: f64,
    pub target_altitude_ft: f64,
    pub target_vertical_speed_fpm: Option<f64>,
    pub use_perf_vs: bool,
    pub on_ground: bool,
}

/// Targets to command after one sequencer update. `None` leaves the
/// owner's current target untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SequencerOutput {
    pub heading_deg: Option<f64>,
    pub speed_kt: Option<f64>,
    pub altitude_ft: Option<f64>,
    pub vertical_speed_fpm: Option<f64>,
    pub use_perf_vs: Option<bool>,
    /// Engage heading and altitude lock.
    pub engage_locks: bool,
    pub on_ground: Option<bool>,
    /// A new leg heading was issued.
    pub new_leg: bool,
    /// Name of the waypoint passed during this update.
    pub waypoint_reached: Option<String>,
    pub restarted: bool,
    /// The owner should remove itself.
    pub terminate: bool,
}

#[derive(Debug, Clone)]
pub struct WaypointSequencer {
    plan: FlightPlan,
    state: SequencerState,
    since_poll_secs: f64,
    poll_due_secs: f64,
    /// Speed at the last lead distance refresh.
    lead_speed_kt: f64,
    last_evaluated_lead_ft: Option<f64>,
}

impl WaypointSequencer {
    pub fn new(plan: FlightPlan) -> Self {
        Self {
            plan,
            state: SequencerState::BeforeFirst,
            since_poll_secs: 0.0,
            poll_due_secs: 0.0,
            lead_speed_kt: 0.0,
            last_evaluated_lead_ft: None,
        }
    }

    pub fn plan(&self) -> &FlightPlan {
        &self.plan
    }

    pub fn state(&self) -> SequencerState {
        self.state
    }

    pub fn is_waiting(&self) -> bool {
        matches!(self.state, SequencerState::Waiting { .. })
    }

    pub fn is_finished(&self) -> bool {
        self.state == SequencerState::Finished
    }

    /// Effective lead distance used by the most recent turn decision.
    pub fn last_evaluated_lead_ft(&self) -> Option<f64> {
        self.last_evaluated_lead_ft
    }

    /// Prime previous/current/next from the first leg. Only acts once.
    pub fn prime(&mut self, turn_radius_ft: Option<f64>, tuning: &FlightPlanTuning) -> Option<Priming> {
        if self.state != SequencerState::BeforeFirst {
            return None;
        }
        self.plan.restart();
        let first = self.plan.current()?.clone();
        if !self.plan.advance() {
            return None;
        }
        let current = self.plan.current()?.clone();

        let heading_deg = if first.speed_kt > 0.0 {
            first.position.bearing_deg_to(&current.position)
        } else {
            current.position.bearing_deg_to(&first.position)
        };
        self.plan
            .update_lead_distance(first.speed_kt, heading_deg, turn_radius_ft, tuning);

        let dist_ft = first.position.distance_ft_to(&current.position);
        let crossat_vs = current
            .crossat_ft
            .and_then(|crossat| crossat_vertical_speed(crossat, first.position.alt_ft, dist_ft, first.speed_kt));

        let (target_altitude_ft, use_perf_vs) = match (current.crossat_ft, crossat_vs) {
            (Some(crossat), Some(_)) => (crossat, false),
            _ => (first.position.alt_ft, true),
        };

        self.state = SequencerState::EnRoute;
        self.lead_speed_kt = 0.0;
        self.since_poll_secs = 0.0;
        self.poll_due_secs = tuning.poll_interval_secs;

        Some(Priming {
            position: first.position,
            speed_kt: first.speed_kt,
            heading_deg,
            target_altitude_ft,
            target_vertical_speed_fpm: crossat_vs,
            use_perf_vs,
            on_ground: first.on_ground,
        })
    }

    /// Advance the state machine by one tick.
    pub fn update<R: Rng>(&mut self, ctx: &SequencerContext, altitude_ft: f64, rng: &mut R) -> SequencerOutput {
        let mut out = SequencerOutput::default();

        match self.state {
            SequencerState::BeforeFirst => {
                if let Some(priming) = self.prime(ctx.turn_radius_ft, ctx.tuning) {
                    out.heading_deg = Some(priming.heading_deg);
                    out.speed_kt = Some(priming.speed_kt);
                    out.altitude_ft = Some(priming.target_altitude_ft);
                    out.vertical_speed_fpm = priming.target_vertical_speed_fpm;
                    out.use_perf_vs = Some(priming.use_perf_vs);
                    out.on_ground = Some(priming.on_ground);
                    out.engage_locks = true;
                }
                out
            }
            SequencerState::Finished => out,
            SequencerState::Waiting { remaining_secs } => {
                if ctx.dt <= 0.0 {
                    return out;
                }
                let remaining_secs = remaining_secs - ctx.dt;
                if remaining_secs > 0.0 {
                    self.state = SequencerState::Waiting { remaining_secs };
                    out.speed_kt = Some(0.0);
                } else {
                    self.state = SequencerState::EnRoute;
                    self.complete_leg(ctx, altitude_ft, &mut out);
                }
                out
            }
            SequencerState::EnRoute => {
                self.since_poll_secs += ctx.dt;
                if ctx.dt <= 0.0 || self.since_poll_secs < self.poll_due_secs {
                    return out;
                }
                self.since_poll_secs = 0.0;
                let jitter = if ctx.tuning.poll_jitter_secs > 0.0 {
                    rng.gen_range(0.0..ctx.tuning.poll_jitter_secs)
                } else {
                    0.0
                };
                self.poll_due_secs = ctx.tuning.poll_interval_secs + jitter;

                self.poll(ctx, altitude_ft, &mut out);
                out
            }
        }
    }

    fn poll(&mut self, ctx: &SequencerContext, altitude_ft: f64, out: &mut SequencerOutput) {
        self.last_evaluated_lead_ft = Some(self.plan.effective_lead_ft(ctx.speed_kt, ctx.tuning));

        if !self.plan.lead_point_reached(&ctx.position, ctx.speed_kt, ctx.tuning) {
            self.control_heading(ctx, out);
            self.control_speed(ctx);
            return;
        }

        let Some(current) = self.plan.current() else {
            return;
        };
        if current.is_end() {
            self.finish(ctx, out);
            return;
        }
        if let Some(wait) = current.wait_secs(ctx.time_of_day_secs) {
            self.state = SequencerState::Waiting { remaining_secs: wait };
            out.speed_kt = Some(0.0);
            return;
        }
        self.complete_leg(ctx, altitude_ft, out);
    }

    /// Re-issue the heading toward the current waypoint when it drifted.
    ///
    /// Only runs on poll ticks, so drift beyond the tolerance is corrected
    /// once per poll interval (plus jitter) rather than every tick. The
    /// autopilot keeps steering to the last commanded heading in between.
    fn control_heading(&self, ctx: &SequencerContext, out: &mut SequencerOutput) {
        let Some(mut bearing) = self.plan.bearing_to_current(&ctx.position) else {
            return;
        };
        if ctx.speed_kt < 0.0 {
            bearing = normalize_heading(bearing + 180.0);
        }
        if heading_error(ctx.target_heading_deg, bearing).abs() > ctx.tuning.heading_tolerance_deg {
            out.heading_deg = Some(bearing);
            out.engage_locks = true;
        }
    }

    /// Refresh the lead distance after a significant speed change.
    fn control_speed(&mut self, ctx: &SequencerContext) {
        if (ctx.speed_kt - self.lead_speed_kt).abs() > ctx.tuning.lead_refresh_speed_kt {
            self.lead_speed_kt = ctx.speed_kt;
            self.plan.update_lead_distance(
                ctx.speed_kt,
                ctx.target_heading_deg,
                ctx.turn_radius_ft,
                ctx.tuning,
            );
        }
    }

    fn finish(&mut self, ctx: &SequencerContext, out: &mut SequencerOutput) {
        if self.plan.repeat() {
            self.plan.restart();
            self.plan.update_lead_distance(
                ctx.target_speed_kt,
                ctx.target_heading_deg,
                ctx.turn_radius_ft,
                ctx.tuning,
            );
            out.restarted = true;
            tracing::debug!(plan = %self.plan.name(), "flight plan restarted");
        } else {
            self.state = SequencerState::Finished;
            out.terminate = true;
            tracing::debug!(plan = %self.plan.name(), "flight plan finished");
        }
    }

    /// Pass the current waypoint and command the targets of the next leg.
    fn complete_leg(&mut self, ctx: &SequencerContext, altitude_ft: f64, out: &mut SequencerOutput) {
        let Some(current) = self.plan.current().cloned() else {
            return;
        };

        let mut target_heading = ctx.target_heading_deg;
        if let Some(next) = self.plan.next() {
            if !next.is_sentinel() {
                target_heading = current.position.bearing_deg_to(&next.position);
                out.heading_deg = Some(target_heading);
                out.new_leg = true;
            }
        }

        if !self.plan.advance() {
            self.finish(ctx, out);
            return;
        }
        out.waypoint_reached = Some(current.name.clone());
        tracing::trace!(plan = %self.plan.name(), waypoint = %current.name, "waypoint passed");

        self.plan.update_lead_distance(
            ctx.target_speed_kt,
            target_heading,
            ctx.turn_radius_ft,
            ctx.tuning,
        );

        // `current` is now the previous waypoint
        let Some(upcoming) = self.plan.current().cloned() else {
            return;
        };
        if !current.on_ground {
            out.altitude_ft = Some(current.position.alt_ft);
            out.use_perf_vs = Some(true);
            if let Some(crossat) = upcoming.crossat_ft {
                let dist_ft = ctx.position.distance_ft_to(&upcoming.position);
                if let Some(vs) = crossat_vertical_speed(crossat, altitude_ft, dist_ft, ctx.speed_kt) {
                    out.altitude_ft = Some(crossat);
                    out.vertical_speed_fpm = Some(vs);
                    out.use_perf_vs = Some(false);
                }
            }
        }
        out.speed_kt = Some(current.speed_kt);
        out.engage_locks = true;
        out.on_ground = Some(current.on_ground);
    }
}

/// Vertical speed (fpm) that reaches `crossat_ft` after `dist_ft` at
/// `speed_kt`. `None` when there is no time left to do it.
pub fn crossat_vertical_speed(crossat_ft: f64, altitude_ft: f64, dist_ft: f64, speed_kt: f64) -> Option<f64> {
    if speed_kt.abs() < f64::EPSILON {
        return None;
    }
    let minutes = dist_ft / CROSSAT_FT_PER_NM / speed_kt.abs() * 60.0;
    if !minutes.is_finite() || minutes < 1e-6 {
        return None;
    }
    Some((crossat_ft - altitude_ft) / minutes)
}
