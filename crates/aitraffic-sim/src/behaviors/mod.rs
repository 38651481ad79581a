//! Behavior variants.
//!
//! Every entity carries exactly one [`Behavior`] component, selected at
//! spawn from its kind tag. The scheduler hands each behavior an
//! [`UpdateContext`] holding the peer table, the viewer and the ground;
//! the behavior mutates only its own entity's components and returns a
//! [`BehaviorFault`] instead of panicking when something goes wrong.

pub mod aircraft;
pub mod ballistic;
pub mod carrier;
pub mod escort;
pub mod ground_vehicle;
pub mod multiplayer;
pub mod ship;
pub mod storm;
pub mod thermal;
pub mod wingman;

use rand_chacha::ChaCha8Rng;

use aitraffic_core::commands::{SubmodelParent, TrafficCommand};
use aitraffic_core::components::{Kinematics, Lifecycle, Targets};
use aitraffic_core::constants::KT_TO_FPS;
use aitraffic_core::enums::{EntityKind, RemovalReason};
use aitraffic_core::error::{BehaviorFault, SpawnError};
use aitraffic_core::events::SimEvent;
use aitraffic_core::geo::normalize_heading;
use aitraffic_core::params::{InitialState, VariantParams};
use aitraffic_core::state::VariantDetail;
use aitraffic_core::types::{EntityId, NedVelocity, ViewerState};
use aitraffic_pilot::plan::FlightPlan;
use aitraffic_pilot::sequencer::{SequencerOutput, WaypointSequencer};
use aitraffic_pilot::tuning::Tuning;
use aitraffic_terrain::GroundQuery;

use crate::systems::peers::PeerTable;

use self::aircraft::AircraftBehavior;
use self::ballistic::BallisticBehavior;
use self::carrier::CarrierBehavior;
use self::escort::EscortBehavior;
use self::ground_vehicle::GroundVehicleBehavior;
use self::multiplayer::MultiplayerBehavior;
use self::ship::ShipBehavior;
use self::storm::StormBehavior;
use self::thermal::ThermalBehavior;
use self::wingman::WingmanBehavior;

/// Mutable view of the entity being updated.
pub struct EntityMut<'a> {
    pub id: EntityId,
    pub kinematics: &'a mut Kinematics,
    pub targets: &'a mut Targets,
    pub lifecycle: &'a mut Lifecycle,
}

/// Everything a behavior may read or produce during one update.
pub struct UpdateContext<'a> {
    pub dt: f64,
    pub sim_time_secs: f64,
    /// Seconds after midnight.
    pub time_of_day_secs: f64,
    pub viewer: &'a ViewerState,
    pub peers: &'a PeerTable,
    pub ground: &'a dyn GroundQuery,
    pub tuning: &'a Tuning,
    pub rng: &'a mut ChaCha8Rng,
    pub outbox: &'a mut Outbox,
}

/// Side effects collected during a tick and applied by the scheduler.
#[derive(Debug, Default)]
pub struct Outbox {
    pub events: Vec<SimEvent>,
    pub spawns: Vec<SpawnRequest>,
}

/// A new entity to register once the current pass is over.
#[derive(Debug, Clone)]
pub struct SpawnRequest {
    pub parent: SubmodelParent,
    pub name: String,
    pub state: InitialState,
}

/// Result of building a behavior: the component set to insert.
#[derive(Debug)]
pub struct Spawned {
    pub behavior: Behavior,
    pub kinematics: Kinematics,
    pub targets: Targets,
    pub lifecycle: Lifecycle,
}

#[derive(Debug)]
pub enum Behavior {
    Aircraft(Box<AircraftBehavior>),
    Ship(Box<ShipBehavior>),
    Carrier(Box<CarrierBehavior>),
    Ballistic(Box<BallisticBehavior>),
    GroundVehicle(Box<GroundVehicleBehavior>),
    Escort(Box<EscortBehavior>),
    Wingman(Box<WingmanBehavior>),
    Multiplayer(Box<MultiplayerBehavior>),
    Thermal(Box<ThermalBehavior>),
    Storm(Box<StormBehavior>),
    Static,
}

/// Take the parameter block for `$variant`, defaulting when none was given.
macro_rules! params_for {
    ($params:expr, $variant:path, $kind:expr) => {
        match $params {
            None => Default::default(),
            Some($variant(p)) => p,
            Some(other) => {
                return Err(SpawnError::ParamsMismatch {
                    kind: $kind,
                    given: other.label(),
                })
            }
        }
    };
}

impl Behavior {
    /// Build the behavior and initial components for a validated state.
    pub fn spawn(
        kind: EntityKind,
        state: &InitialState,
        plan: Option<FlightPlan>,
        tuning: &Tuning,
    ) -> Result<Spawned, SpawnError> {
        let mut kinematics = Kinematics {
            position: state.position,
            orientation: state.orientation,
            speed_kt: state.speed_kt.max(0.0),
            vertical_speed_fpm: state.vertical_speed_fpm,
        };
        kinematics.orientation.heading_deg = normalize_heading(kinematics.orientation.heading_deg);

        let mut targets = Targets {
            heading_deg: kinematics.orientation.heading_deg,
            altitude_ft: kinematics.position.alt_ft,
            speed_kt: kinematics.speed_kt,
            roll_deg: kinematics.orientation.roll_deg,
            vertical_speed_fpm: kinematics.vertical_speed_fpm,
            heading_lock: false,
            altitude_lock: false,
            use_perf_vs: true,
        };
        let mut lifecycle = Lifecycle::default();
        let params = state.params.clone();

        let behavior = match kind {
            EntityKind::Aircraft => {
                let p = params_for!(params, VariantParams::Aircraft, kind);
                Behavior::Aircraft(Box::new(AircraftBehavior::new(
                    p,
                    state.performance_class,
                    plan,
                    &mut kinematics,
                    &mut targets,
                    tuning,
                )))
            }
            EntityKind::Ship => {
                let p = params_for!(params, VariantParams::Ship, kind);
                Behavior::Ship(Box::new(ShipBehavior::new(p, plan, &mut kinematics, &mut targets, tuning)))
            }
            EntityKind::Carrier => {
                let p = params_for!(params, VariantParams::Carrier, kind);
                Behavior::Carrier(Box::new(CarrierBehavior::new(p, &kinematics, &mut targets)))
            }
            EntityKind::Ballistic => {
                let p = params_for!(params, VariantParams::Ballistic, kind);
                Behavior::Ballistic(Box::new(BallisticBehavior::new(
                    p,
                    &mut kinematics,
                    &mut lifecycle,
                )))
            }
            EntityKind::GroundVehicle => {
                let p = params_for!(params, VariantParams::GroundVehicle, kind);
                Behavior::GroundVehicle(Box::new(GroundVehicleBehavior::new(p, &mut targets)))
            }
            EntityKind::Escort => {
                let p = params_for!(params, VariantParams::Escort, kind);
                Behavior::Escort(Box::new(EscortBehavior::new(p, &mut targets)))
            }
            EntityKind::Wingman => {
                let p = params_for!(params, VariantParams::Wingman, kind);
                Behavior::Wingman(Box::new(WingmanBehavior::new(p, &mut targets)))
            }
            EntityKind::Multiplayer => {
                let p = params_for!(params, VariantParams::Multiplayer, kind);
                Behavior::Multiplayer(Box::new(MultiplayerBehavior::new(p)))
            }
            EntityKind::Thermal => {
                let p = params_for!(params, VariantParams::Thermal, kind);
                Behavior::Thermal(Box::new(ThermalBehavior::new(p)))
            }
            EntityKind::Storm => {
                let p = params_for!(params, VariantParams::Storm, kind);
                Behavior::Storm(Box::new(StormBehavior::new(p)))
            }
            EntityKind::Static => {
                if let Some(other) = params {
                    return Err(SpawnError::ParamsMismatch {
                        kind,
                        given: other.label(),
                    });
                }
                kinematics.speed_kt = 0.0;
                kinematics.vertical_speed_fpm = 0.0;
                targets.speed_kt = 0.0;
                Behavior::Static
            }
        };

        Ok(Spawned {
            behavior,
            kinematics,
            targets,
            lifecycle,
        })
    }

    /// Advance one tick. Every variant is a no-op at `dt <= 0`.
    pub fn update(&mut self, entity: EntityMut<'_>, ctx: &mut UpdateContext<'_>) -> Result<(), BehaviorFault> {
        match self {
            Behavior::Aircraft(b) => b.update(entity, ctx),
            Behavior::Ship(b) => b.update(entity, ctx),
            Behavior::Carrier(b) => b.update(entity, ctx),
            Behavior::Ballistic(b) => b.update(entity, ctx),
            Behavior::GroundVehicle(b) => b.update(entity, ctx),
            Behavior::Escort(b) => b.update(entity, ctx),
            Behavior::Wingman(b) => b.update(entity, ctx),
            Behavior::Multiplayer(b) => b.update(entity, ctx),
            Behavior::Thermal(b) => b.update(entity, ctx),
            Behavior::Storm(b) => b.update(entity, ctx),
            Behavior::Static => Ok(()),
        }
    }

    /// Apply a variant-specific command. Returns false when the command
    /// does not apply to this variant.
    pub fn apply_command(&mut self, command: &TrafficCommand) -> bool {
        match (self, command) {
            (Behavior::Wingman(b), TrafficCommand::WingmanBreak { .. }) => {
                b.order_break();
                true
            }
            (Behavior::Wingman(b), TrafficCommand::WingmanJoin { .. }) => {
                b.order_join();
                true
            }
            (Behavior::Carrier(b), TrafficCommand::SetTurnToLaunch { enabled, .. }) => {
                b.set_turn_to_launch(*enabled);
                true
            }
            (Behavior::Carrier(b), TrafficCommand::SetElevators { deployed, .. }) => {
                b.set_elevators(*deployed);
                true
            }
            (Behavior::Carrier(b), TrafficCommand::SetLaunchbar { engaged, .. }) => {
                b.set_launchbar(*engaged);
                true
            }
            (Behavior::Multiplayer(b), TrafficCommand::PushMotionPacket { packet, .. }) => {
                b.push_packet(*packet);
                true
            }
            _ => false,
        }
    }

    /// World-frame velocity, for submodel parents and peers.
    pub fn velocity(&self, kin: &Kinematics) -> NedVelocity {
        match self {
            Behavior::Ballistic(b) => b.velocity(),
            Behavior::Multiplayer(b) => b.velocity().unwrap_or_else(|| kinematic_velocity(kin)),
            _ => kinematic_velocity(kin),
        }
    }

    pub fn is_waiting(&self) -> bool {
        match self {
            Behavior::Aircraft(b) => b.is_waiting(),
            Behavior::Ship(b) => b.is_waiting(),
            _ => false,
        }
    }

    pub fn is_tanker(&self) -> bool {
        match self {
            Behavior::Aircraft(b) => b.is_tanker(),
            Behavior::Multiplayer(b) => b.is_tanker(),
            _ => false,
        }
    }

    /// `(range_ft, strength_fps)` of a thermal as felt by the viewer.
    pub fn thermal_reading(&self) -> Option<(f64, f64)> {
        match self {
            Behavior::Thermal(b) => Some((b.range_ft(), b.strength_fps())),
            _ => None,
        }
    }

    pub fn detail(&self) -> Option<VariantDetail> {
        match self {
            Behavior::Aircraft(b) => b.detail(),
            Behavior::Ship(b) => Some(b.detail()),
            Behavior::Carrier(b) => Some(b.detail()),
            Behavior::Ballistic(b) => Some(b.detail()),
            Behavior::Wingman(b) => Some(b.detail()),
            Behavior::Thermal(b) => Some(b.detail()),
            Behavior::Storm(b) => Some(b.detail()),
            Behavior::GroundVehicle(_) | Behavior::Escort(_) | Behavior::Multiplayer(_) | Behavior::Static => None,
        }
    }
}

/// Velocity implied by heading, speed and vertical speed.
pub fn kinematic_velocity(kin: &Kinematics) -> NedVelocity {
    NedVelocity::from_heading(kin.orientation.heading_deg, kin.speed_kt, kin.vertical_speed_fpm)
}

/// Move along the current heading at the current speed, using the local
/// degrees-per-foot scale at the entity's own latitude.
pub fn advance_position(kin: &mut Kinematics, dt: f64) {
    let distance_ft = kin.speed_kt * KT_TO_FPS * dt;
    if distance_ft == 0.0 {
        return;
    }
    let alt_ft = kin.position.alt_ft;
    kin.position = kin.position.project(kin.orientation.heading_deg, distance_ft);
    kin.position.alt_ft = alt_ft;
}

/// Copy a sequencer decision into the owner's targets and report it.
pub fn apply_sequencer_output(out: &SequencerOutput, entity: &mut EntityMut<'_>, outbox: &mut Outbox) {
    let targets = &mut *entity.targets;
    if let Some(heading) = out.heading_deg {
        targets.heading_deg = normalize_heading(heading);
    }
    if let Some(speed) = out.speed_kt {
        targets.speed_kt = speed.max(0.0);
    }
    if let Some(altitude) = out.altitude_ft {
        targets.altitude_ft = altitude;
    }
    if let Some(vs) = out.vertical_speed_fpm {
        targets.vertical_speed_fpm = vs;
    }
    if let Some(use_perf_vs) = out.use_perf_vs {
        targets.use_perf_vs = use_perf_vs;
    }
    if out.engage_locks {
        targets.heading_lock = true;
        targets.altitude_lock = true;
    }
    if let Some(waypoint) = &out.waypoint_reached {
        outbox.events.push(SimEvent::WaypointReached {
            id: entity.id,
            waypoint: waypoint.clone(),
        });
    }
    if out.terminate {
        entity.lifecycle.mark_dying(RemovalReason::PlanFinished);
    }
}

/// Snapshot detail shared by plan-following variants.
pub fn plan_detail(sequencer: &WaypointSequencer) -> VariantDetail {
    let plan = sequencer.plan();
    VariantDetail::FlightPlan {
        plan: plan.name().to_string(),
        current_waypoint: plan.current().map(|wp| wp.name.clone()),
        lead_distance_ft: plan.lead_distance_ft(),
        waiting: sequencer.is_waiting(),
    }
}

/// Parent-lookup bookkeeping shared by the station keepers.
#[derive(Debug, Clone, Default)]
pub struct ParentTracker {
    misses: u32,
}

impl ParentTracker {
    /// Record a lookup result. Returns true once the parent has been
    /// missing for more than the allowed number of consecutive ticks.
    pub fn record(&mut self, found: bool) -> bool {
        if found {
            self.misses = 0;
            false
        } else {
            self.misses += 1;
            self.misses > aitraffic_core::constants::PARENT_LOOKUP_RETRIES
        }
    }
}
