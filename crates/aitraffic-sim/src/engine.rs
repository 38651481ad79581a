//! Traffic manager: the entity registry and scheduler.
//!
//! `TrafficManager` owns the hecs world, processes queued commands, runs
//! every behavior once per tick and produces `TrafficSnapshot`s. Completely
//! headless, so runs are reproducible from the seed alone.

use std::collections::{HashMap, HashSet, VecDeque};

use hecs::{Entity, World};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use aitraffic_core::commands::{SubmodelParent, TrafficCommand};
use aitraffic_core::components::{Identity, Kinematics, Lifecycle, RadarContact, Targets};
use aitraffic_core::constants::DEFAULT_RADAR_RANGE_NM;
use aitraffic_core::enums::{EntityKind, RemovalReason};
use aitraffic_core::error::{BehaviorFault, SpawnError};
use aitraffic_core::events::SimEvent;
use aitraffic_core::geo::normalize_heading;
use aitraffic_core::params::{FlightPlanSource, InitialState, SubmodelConfig, WaypointRecord};
use aitraffic_core::state::{ThermalReading, TrafficSnapshot};
use aitraffic_core::types::{EntityId, GeoPosition, SimTime, ViewerState};
use aitraffic_pilot::plan::FlightPlan;
use aitraffic_pilot::tuning::Tuning;
use aitraffic_terrain::{FlatGround, GroundQuery};

use crate::behaviors::carrier::ParkPosition;
use crate::behaviors::{Behavior, EntityMut, Outbox, UpdateContext};
use crate::submodel::SubmodelSpawner;
use crate::systems;
use crate::systems::peers::PeerTable;

const SECS_PER_DAY: f64 = 86_400.0;

/// Configuration for a traffic manager.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// RNG seed for determinism. Same seed = same simulation.
    pub seed: u64,
    /// Time of day at tick 0, seconds after midnight.
    pub start_time_of_day_secs: f64,
    /// Nominal radar range for the in-range test (nm).
    pub radar_range_nm: f64,
    pub tuning: Tuning,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            start_time_of_day_secs: 12.0 * 3600.0,
            radar_range_nm: DEFAULT_RADAR_RANGE_NM,
            tuning: Tuning::default(),
        }
    }
}

/// The entity registry. Owns the ECS world and all traffic state.
pub struct TrafficManager {
    world: World,
    /// Live entities in insertion order; this is the update order.
    order: Vec<(EntityId, Entity)>,
    index: HashMap<EntityId, Entity>,
    next_id: u64,
    config: SimConfig,
    time: SimTime,
    time_of_day_secs: f64,
    rng: ChaCha8Rng,
    ground: Box<dyn GroundQuery>,
    command_queue: VecDeque<TrafficCommand>,
    events: Vec<SimEvent>,
    spawner: SubmodelSpawner,
    flight_plans: HashMap<String, Vec<WaypointRecord>>,
    tanker_contacts: HashSet<EntityId>,
    nearest_thermal: Option<ThermalReading>,
}

impl TrafficManager {
    /// Create a manager over sea-level flat ground.
    pub fn new(config: SimConfig) -> Self {
        Self::with_ground(config, Box::new(FlatGround::default()))
    }

    pub fn with_ground(config: SimConfig, ground: Box<dyn GroundQuery>) -> Self {
        Self {
            world: World::new(),
            order: Vec::new(),
            index: HashMap::new(),
            next_id: 1,
            time: SimTime::default(),
            time_of_day_secs: config.start_time_of_day_secs.rem_euclid(SECS_PER_DAY),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
            ground,
            command_queue: VecDeque::new(),
            events: Vec::new(),
            spawner: SubmodelSpawner::new(),
            flight_plans: HashMap::new(),
            tanker_contacts: HashSet::new(),
            nearest_thermal: None,
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn time(&self) -> SimTime {
        self.time
    }

    /// Seconds after midnight.
    pub fn time_of_day_secs(&self) -> f64 {
        self.time_of_day_secs
    }

    /// Number of registered entities, dying ones included.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.index.contains_key(&id)
    }

    /// Get a read-only reference to the ECS world.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Make a plan available to `FlightPlanSource::Named` references.
    pub fn register_flight_plan(&mut self, name: &str, waypoints: Vec<WaypointRecord>) {
        self.flight_plans.insert(name.to_string(), waypoints);
    }

    /// Spawn by scenario type tag.
    pub fn spawn_tagged(&mut self, tag: &str, state: InitialState) -> Result<EntityId, SpawnError> {
        let kind = EntityKind::from_tag(tag).ok_or_else(|| SpawnError::UnknownKind(tag.to_string()))?;
        self.spawn(kind, state)
    }

    /// Validate `state`, build the behavior and register the entity.
    ///
    /// A named flight plan that is not registered does not fail the call:
    /// the entity is registered already dying and is reaped on the next tick.
    pub fn spawn(&mut self, kind: EntityKind, state: InitialState) -> Result<EntityId, SpawnError> {
        validate_finite(&state)?;

        let (plan, missing_plan) = match (&state.flight_plan, kind) {
            (Some(source), EntityKind::Aircraft | EntityKind::Ship) => self.resolve_plan(source)?,
            (Some(_), _) => {
                tracing::debug!(%kind, "flight plan ignored for this kind");
                (None, None)
            }
            (None, _) => (None, None),
        };

        let mut spawned = Behavior::spawn(kind, &state, plan, &self.config.tuning)?;

        let id = EntityId(self.next_id);
        self.next_id += 1;

        if let Some(plan_name) = missing_plan {
            tracing::warn!(id = %id, plan = %plan_name, "flight plan not found, entity will be removed");
            spawned.lifecycle.mark_dying(RemovalReason::MissingFlightPlan);
        }

        let entity = self.world.spawn((
            Identity {
                id,
                kind,
                name: state.name.clone(),
                callsign: state.callsign.clone(),
            },
            spawned.kinematics,
            spawned.targets,
            spawned.lifecycle,
            RadarContact::default(),
            spawned.behavior,
        ));
        self.order.push((id, entity));
        self.index.insert(id, entity);

        if !state.submodels.is_empty() {
            self.spawner.attach(SubmodelParent::Entity(id), state.submodels);
        }

        tracing::debug!(id = %id, %kind, name = %state.name, "entity spawned");
        self.events.push(SimEvent::Spawned { id, kind });
        Ok(id)
    }

    /// Set the removal flag. Teardown happens at the start of the next tick.
    pub fn remove(&mut self, id: EntityId) -> bool {
        self.mark_dying(id, RemovalReason::Requested)
    }

    /// Attach spawn points to the viewer or an entity.
    pub fn attach_submodels(&mut self, parent: SubmodelParent, configs: Vec<SubmodelConfig>) {
        self.spawner.attach(parent, configs);
    }

    /// Queue a command for processing at the next tick boundary.
    pub fn queue_command(&mut self, command: TrafficCommand) {
        self.command_queue.push_back(command);
    }

    /// Queue multiple commands.
    pub fn queue_commands(&mut self, commands: impl IntoIterator<Item = TrafficCommand>) {
        self.command_queue.extend(commands);
    }

    /// Events produced since the last drain.
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn snapshot(&self) -> TrafficSnapshot {
        systems::snapshot::build_snapshot(&self.world, &self.order, &self.time, self.nearest_thermal)
    }

    /// The thermal nearest the viewer as of the last tick.
    pub fn nearest_thermal(&self) -> Option<ThermalReading> {
        self.nearest_thermal
    }

    /// First live entity whose inflated extent contains `position`.
    pub fn query_collision(
        &self,
        position: &GeoPosition,
        radius_ft: f64,
        exclude: Option<EntityId>,
    ) -> Option<(EntityId, EntityKind)> {
        PeerTable::build(&self.world, &self.order).query_collision(position, radius_ft, exclude)
    }

    /// World position and heading of a carrier parking spot.
    pub fn park_position(&self, carrier: EntityId, name: &str) -> Option<ParkPosition> {
        let entity = *self.index.get(&carrier)?;
        let mut query = self.world.query_one::<(&Kinematics, &Behavior)>(entity).ok()?;
        let (kin, behavior) = query.get()?;
        match behavior {
            Behavior::Carrier(c) => c.park_position(name, kin),
            _ => None,
        }
    }

    /// Advance the simulation by `dt` seconds against the given viewer.
    ///
    /// `dt` may be zero: every behavior is then a no-op and only the
    /// viewer-relative fields change.
    pub fn tick(&mut self, dt: f64, viewer: &ViewerState) {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

        self.process_commands();

        // 1. Reap entities flagged during the previous tick or by commands
        let reaped = systems::cleanup::run(&mut self.world, &mut self.order, &mut self.events);
        for id in reaped {
            self.index.remove(&id);
            self.spawner.detach(id);
            self.tanker_contacts.remove(&id);
        }

        // 2. Committed state every behavior reads other entities from
        let peers = PeerTable::build(&self.world, &self.order);

        // 3. Submodel release timers
        let mut outbox = Outbox::default();
        outbox.spawns = self.spawner.update(dt, viewer, &peers);

        // 4. Behaviors
        self.run_behaviors(dt, viewer, &peers, &mut outbox);
        self.events.append(&mut outbox.events);

        // 5. Radar fields and tanker contact
        systems::radar::run(
            &mut self.world,
            viewer,
            self.config.radar_range_nm,
            &mut self.tanker_contacts,
            &mut self.events,
        );

        // 6. Nearest thermal
        self.nearest_thermal = systems::thermal_field::nearest(&self.world);

        // 7. Register children released this tick
        for request in outbox.spawns {
            match self.spawn(EntityKind::Ballistic, request.state) {
                Ok(child) => {
                    tracing::debug!(child = %child, parent = ?request.parent, name = %request.name, "submodel released");
                    self.events.push(SimEvent::SubmodelReleased {
                        parent: request.parent,
                        child,
                        name: request.name,
                    });
                }
                Err(e) => {
                    tracing::warn!(parent = ?request.parent, name = %request.name, error = %e, "submodel spawn rejected");
                }
            }
        }

        self.time.advance(dt);
        self.time_of_day_secs = (self.time_of_day_secs + dt).rem_euclid(SECS_PER_DAY);
    }

    fn run_behaviors(&mut self, dt: f64, viewer: &ViewerState, peers: &PeerTable, outbox: &mut Outbox) {
        let sim_time_secs = self.time.elapsed_secs + dt;
        for &(id, entity) in &self.order {
            let Ok((kin, targets, lifecycle, behavior)) = self
                .world
                .query_one_mut::<(&mut Kinematics, &mut Targets, &mut Lifecycle, &mut Behavior)>(entity)
            else {
                continue;
            };
            if lifecycle.dying {
                continue;
            }

            let mut ctx = UpdateContext {
                dt,
                sim_time_secs,
                time_of_day_secs: self.time_of_day_secs,
                viewer,
                peers,
                ground: self.ground.as_ref(),
                tuning: &self.config.tuning,
                rng: &mut self.rng,
                outbox: &mut *outbox,
            };
            let result = behavior
                .update(
                    EntityMut {
                        id,
                        kinematics: &mut *kin,
                        targets: &mut *targets,
                        lifecycle: &mut *lifecycle,
                    },
                    &mut ctx,
                )
                .and_then(|()| check_state(kin));

            match result {
                Ok(()) => {
                    kin.orientation.heading_deg = normalize_heading(kin.orientation.heading_deg);
                    kin.speed_kt = kin.speed_kt.max(0.0);
                }
                Err(fault) => {
                    tracing::warn!(id = %id, error = %fault, "behavior fault, removing entity");
                    lifecycle.mark_dying(RemovalReason::Fault);
                    outbox.events.push(SimEvent::EntityFault {
                        id,
                        message: fault.to_string(),
                    });
                }
            }
            lifecycle.age_secs += dt;
        }
    }

    fn resolve_plan(&self, source: &FlightPlanSource) -> Result<(Option<FlightPlan>, Option<String>), SpawnError> {
        let (name, repeat, records) = match source {
            FlightPlanSource::Inline {
                name,
                repeat,
                waypoints,
            } => (name, *repeat, waypoints),
            FlightPlanSource::Named { name, repeat } => match self.flight_plans.get(name) {
                Some(records) => (name, *repeat, records),
                None => return Ok((None, Some(name.clone()))),
            },
        };
        let plan = FlightPlan::build(name, repeat, records).map_err(|source| SpawnError::FlightPlan {
            name: name.clone(),
            source,
        })?;
        Ok((Some(plan), None))
    }

    fn mark_dying(&mut self, id: EntityId, reason: RemovalReason) -> bool {
        let Some(&entity) = self.index.get(&id) else {
            return false;
        };
        match self.world.query_one_mut::<&mut Lifecycle>(entity) {
            Ok(lifecycle) => {
                lifecycle.mark_dying(reason);
                true
            }
            Err(_) => false,
        }
    }

    /// Process all queued commands.
    fn process_commands(&mut self) {
        while let Some(command) = self.command_queue.pop_front() {
            self.handle_command(command);
        }
    }

    /// Handle a single command.
    fn handle_command(&mut self, command: TrafficCommand) {
        match command {
            TrafficCommand::Remove { id } => {
                if !self.remove(id) {
                    tracing::debug!(id = %id, "remove: no such entity");
                }
            }
            TrafficCommand::AttachSubmodels { parent, configs } => {
                self.spawner.attach(parent, configs);
            }
            TrafficCommand::SetSubmodelTrigger {
                parent,
                index,
                triggered,
            } => {
                if !self.spawner.set_trigger(parent, index, triggered) {
                    tracing::warn!(?parent, index, "no such submodel spawn point");
                }
            }
            TrafficCommand::SetTargetHeading { id, heading_deg } => {
                self.with_targets(id, |t| {
                    t.heading_deg = normalize_heading(heading_deg);
                    t.heading_lock = true;
                });
            }
            TrafficCommand::SetTargetAltitude { id, altitude_ft } => {
                self.with_targets(id, |t| {
                    t.altitude_ft = altitude_ft;
                    t.altitude_lock = true;
                });
            }
            TrafficCommand::SetTargetSpeed { id, speed_kt } => {
                self.with_targets(id, |t| t.speed_kt = speed_kt.max(0.0));
            }
            TrafficCommand::SetTargetRoll { id, roll_deg } => {
                self.with_targets(id, |t| {
                    t.roll_deg = roll_deg;
                    t.heading_lock = false;
                });
            }
            other => {
                let Some(id) = other.target() else {
                    return;
                };
                let Some(&entity) = self.index.get(&id) else {
                    tracing::debug!(id = %id, "command for unknown entity dropped");
                    return;
                };
                let applied = self
                    .world
                    .query_one_mut::<&mut Behavior>(entity)
                    .map(|behavior| behavior.apply_command(&other))
                    .unwrap_or(false);
                if !applied {
                    tracing::debug!(id = %id, command = ?other, "command does not apply to entity");
                }
            }
        }
    }

    fn with_targets(&mut self, id: EntityId, f: impl FnOnce(&mut Targets)) {
        let Some(&entity) = self.index.get(&id) else {
            tracing::debug!(id = %id, "command for unknown entity dropped");
            return;
        };
        let finite = match self.world.query_one_mut::<&mut Targets>(entity) {
            Ok(targets) => {
                let before = *targets;
                f(targets);
                let ok = targets.heading_deg.is_finite()
                    && targets.altitude_ft.is_finite()
                    && targets.speed_kt.is_finite()
                    && targets.roll_deg.is_finite();
                if !ok {
                    *targets = before;
                }
                ok
            }
            Err(_) => true,
        };
        if !finite {
            tracing::warn!(id = %id, "non-finite target rejected");
        }
    }
}

fn validate_finite(state: &InitialState) -> Result<(), SpawnError> {
    if !state.position.is_finite() {
        return Err(SpawnError::NonFinite { field: "position" });
    }
    if !state.orientation.is_finite() {
        return Err(SpawnError::NonFinite { field: "orientation" });
    }
    if !state.speed_kt.is_finite() {
        return Err(SpawnError::NonFinite { field: "speed" });
    }
    if !state.vertical_speed_fpm.is_finite() {
        return Err(SpawnError::NonFinite {
            field: "vertical speed",
        });
    }
    Ok(())
}

fn check_state(kin: &Kinematics) -> Result<(), BehaviorFault> {
    if !kin.position.is_finite() {
        return Err(BehaviorFault::NonFinite { field: "position" });
    }
    if !kin.orientation.is_finite() {
        return Err(BehaviorFault::NonFinite { field: "orientation" });
    }
    if !kin.speed_kt.is_finite() {
        return Err(BehaviorFault::NonFinite { field: "speed" });
    }
    if !kin.vertical_speed_fpm.is_finite() {
        return Err(BehaviorFault::NonFinite {
            field: "vertical speed",
        });
    }
    Ok(())
}
