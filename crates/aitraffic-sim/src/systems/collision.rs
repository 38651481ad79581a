//! Collision query over a per-kind extent table.

use aitraffic_core::enums::EntityKind;
use aitraffic_core::types::{EntityId, GeoPosition};

#[derive(Debug, Clone, Copy)]
pub struct CollisionCandidate {
    pub id: EntityId,
    pub kind: EntityKind,
    pub position: GeoPosition,
    pub dying: bool,
}

/// First live candidate whose 3-D separation from `position` is under its
/// length inflated by `radius_ft`. Kinds without an extent are never hit.
pub fn first_hit(
    candidates: impl IntoIterator<Item = CollisionCandidate>,
    position: &GeoPosition,
    radius_ft: f64,
    exclude: Option<EntityId>,
) -> Option<(EntityId, EntityKind)> {
    let radius_ft = radius_ft.max(0.0);
    for candidate in candidates {
        if candidate.dying || Some(candidate.id) == exclude {
            continue;
        }
        let Some((height_ft, length_ft)) = candidate.kind.collision_extent() else {
            continue;
        };

        // cheap altitude reject before the horizontal distance
        let dalt = (candidate.position.alt_ft - position.alt_ft).abs();
        if dalt > height_ft + radius_ft {
            continue;
        }

        let separation = position.slant_distance_ft_to(&candidate.position);
        if separation < length_ft + radius_ft {
            return Some((candidate.id, candidate.kind));
        }
    }
    None
}
