//! Cleanup system: reaps entities whose removal flag is set.

use hecs::{Entity, World};

use aitraffic_core::components::Lifecycle;
use aitraffic_core::enums::RemovalReason;
use aitraffic_core::events::SimEvent;
use aitraffic_core::types::EntityId;

/// Despawn every dying entity, keeping `order` in insertion order.
/// Returns the ids removed.
pub fn run(world: &mut World, order: &mut Vec<(EntityId, Entity)>, events: &mut Vec<SimEvent>) -> Vec<EntityId> {
    let mut reaped = Vec::new();
    order.retain(|&(id, entity)| {
        let reason = match world.get::<&Lifecycle>(entity) {
            Ok(life) if life.dying => life.reason.unwrap_or(RemovalReason::Requested),
            Ok(_) => return true,
            // already gone from the world
            Err(_) => return false,
        };
        let _ = world.despawn(entity);
        tracing::debug!(id = %id, ?reason, "entity reaped");
        events.push(SimEvent::Removed { id, reason });
        reaped.push(id);
        false
    });
    reaped
}
