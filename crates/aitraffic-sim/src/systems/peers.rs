//! Peer table: the committed state of every entity at the start of a tick.
//!
//! Behaviors never read another entity's live components. Parent lookups,
//! collision checks and submodel parents all go through this table, so an
//! entity updated early in the tick is seen by later ones exactly as it was
//! before the tick began.

use hecs::{Entity, World};

use aitraffic_core::components::{Identity, Kinematics, Lifecycle};
use aitraffic_core::enums::EntityKind;
use aitraffic_core::types::{EntityId, GeoPosition, NedVelocity, Orientation};

use crate::behaviors::Behavior;
use crate::systems::collision::{self, CollisionCandidate};

#[derive(Debug, Clone, PartialEq)]
pub struct PeerView {
    pub id: EntityId,
    pub kind: EntityKind,
    pub name: String,
    pub position: GeoPosition,
    pub orientation: Orientation,
    pub speed_kt: f64,
    pub vertical_speed_fpm: f64,
    pub velocity: NedVelocity,
    pub dying: bool,
    /// Holding at a WAIT/WAITUNTIL waypoint.
    pub waiting: bool,
}

#[derive(Debug, Clone, Default)]
pub struct PeerTable {
    peers: Vec<PeerView>,
}

impl PeerTable {
    /// Capture every registered entity in scheduling order.
    pub fn build(world: &World, order: &[(EntityId, Entity)]) -> Self {
        let mut peers = Vec::with_capacity(order.len());
        for &(_, entity) in order {
            let Ok(mut query) =
                world.query_one::<(&Identity, &Kinematics, &Lifecycle, &Behavior)>(entity)
            else {
                continue;
            };
            let Some((identity, kin, life, behavior)) = query.get() else {
                continue;
            };
            peers.push(PeerView {
                id: identity.id,
                kind: identity.kind,
                name: identity.name.clone(),
                position: kin.position,
                orientation: kin.orientation,
                speed_kt: kin.speed_kt,
                vertical_speed_fpm: kin.vertical_speed_fpm,
                velocity: behavior.velocity(kin),
                dying: life.dying,
                waiting: behavior.is_waiting(),
            });
        }
        Self { peers }
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PeerView> {
        self.peers.iter()
    }

    pub fn get(&self, id: EntityId) -> Option<&PeerView> {
        self.peers.iter().find(|p| p.id == id)
    }

    /// First entity other than `exclude` carrying `name`. Empty names never match.
    pub fn by_name(&self, name: &str, exclude: EntityId) -> Option<&PeerView> {
        if name.is_empty() {
            return None;
        }
        self.peers.iter().find(|p| p.id != exclude && p.name == name)
    }

    /// Collision query against the committed state.
    pub fn query_collision(
        &self,
        position: &GeoPosition,
        radius_ft: f64,
        exclude: Option<EntityId>,
    ) -> Option<(EntityId, EntityKind)> {
        let candidates = self.peers.iter().map(|p| CollisionCandidate {
            id: p.id,
            kind: p.kind,
            position: p.position,
            dying: p.dying,
        });
        collision::first_hit(candidates, position, radius_ft, exclude)
    }
}
