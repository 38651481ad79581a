//! Snapshot system: builds a `TrafficSnapshot` from the world.
//!
//! Read-only; entities appear in insertion order.

use hecs::{Entity, World};

use aitraffic_core::components::{Identity, Kinematics, Lifecycle, RadarContact, Targets};
use aitraffic_core::state::{EntitySnapshot, ThermalReading, TrafficSnapshot};
use aitraffic_core::types::{EntityId, SimTime};

use crate::behaviors::Behavior;

pub fn build_snapshot(
    world: &World,
    order: &[(EntityId, Entity)],
    time: &SimTime,
    nearest_thermal: Option<ThermalReading>,
) -> TrafficSnapshot {
    let entities = order
        .iter()
        .filter_map(|&(_, entity)| build_entity(world, entity))
        .collect();

    TrafficSnapshot {
        time: *time,
        entities,
        nearest_thermal,
    }
}

fn build_entity(world: &World, entity: Entity) -> Option<EntitySnapshot> {
    let mut query = world
        .query_one::<(&Identity, &Kinematics, &Targets, &RadarContact, &Lifecycle, &Behavior)>(entity)
        .ok()?;
    let (identity, kin, targets, radar, life, behavior) = query.get()?;
    Some(EntitySnapshot {
        id: identity.id,
        kind: identity.kind,
        name: identity.name.clone(),
        callsign: identity.callsign.clone(),
        kinematics: *kin,
        targets: *targets,
        radar: *radar,
        dying: life.dying,
        detail: behavior.detail(),
    })
}
