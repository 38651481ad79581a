//! Wingman formation state machine.
//!
//! Pure functions that compute phase transitions and steering for a
//! wingman from its situation relative to its leader. No ECS dependency.

use aitraffic_core::enums::{BreakSide, WingmanPhase};
use aitraffic_core::geo::normalize_heading;

/// Closure speed cap while rejoining (kt).
const MAX_CLOSURE_KT: f64 = 100.0;

/// Range (ft) per knot of closure while rejoining.
const CLOSURE_FT_PER_KT: f64 = 10.0;

/// Input to the formation FSM for one wingman.
pub struct FormationContext {
    pub phase: WingmanPhase,
    pub elapsed_in_phase_secs: f64,
    /// Phase forced by a command this tick.
    pub ordered: Option<WingmanPhase>,
    pub speed_kt: f64,
    pub parent_heading_deg: f64,
    pub parent_speed_kt: f64,
    /// Distance from the wingman to its formation station (ft).
    pub range_to_station_ft: f64,
    pub bearing_to_station_deg: f64,
    pub break_angle_deg: f64,
    pub break_side: BreakSide,
    pub break_duration_secs: f64,
    pub join_tolerance_ft: f64,
    pub max_speed_kt: f64,
}

/// How the wingman should be driven this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Steering {
    /// Slave to the leader through the formation offsets.
    Formate,
    /// Fly free toward a heading and speed.
    Free { heading_deg: f64, speed_kt: f64, full_bank: bool },
}

/// Output from the formation FSM.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormationUpdate {
    pub new_phase: WingmanPhase,
    pub steering: Steering,
    pub phase_changed: bool,
}

/// Evaluate the FSM for one wingman.
pub fn evaluate(ctx: &FormationContext) -> FormationUpdate {
    let mut phase = ctx.phase;
    let mut elapsed = ctx.elapsed_in_phase_secs;

    if let Some(ordered) = ctx.ordered {
        if ordered != phase {
            phase = ordered;
            elapsed = 0.0;
        }
    }

    let next = match phase {
        WingmanPhase::Formate => WingmanPhase::Formate,
        WingmanPhase::Break if elapsed >= ctx.break_duration_secs => WingmanPhase::Join,
        WingmanPhase::Break => WingmanPhase::Break,
        WingmanPhase::Join if ctx.range_to_station_ft <= ctx.join_tolerance_ft => WingmanPhase::Formate,
        WingmanPhase::Join => WingmanPhase::Join,
    };

    FormationUpdate {
        new_phase: next,
        steering: steering_for(next, ctx),
        phase_changed: next != ctx.phase,
    }
}

fn steering_for(phase: WingmanPhase, ctx: &FormationContext) -> Steering {
    match phase {
        WingmanPhase::Formate => Steering::Formate,
        WingmanPhase::Break => Steering::Free {
            heading_deg: normalize_heading(
                ctx.parent_heading_deg + ctx.break_side.sign() * ctx.break_angle_deg,
            ),
            speed_kt: ctx.speed_kt,
            full_bank: true,
        },
        WingmanPhase::Join => {
            let closure = (ctx.range_to_station_ft / CLOSURE_FT_PER_KT).min(MAX_CLOSURE_KT);
            Steering::Free {
                heading_deg: ctx.bearing_to_station_deg,
                speed_kt: (ctx.parent_speed_kt + closure).min(ctx.max_speed_kt),
                full_bank: false,
            }
        }
    }
}
