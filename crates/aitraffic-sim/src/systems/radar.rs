//! Radar system: viewer-relative fields for every entity, and tanker
//! contact detection.

use std::collections::HashSet;

use hecs::World;

use aitraffic_core::components::{Identity, Kinematics, RadarContact};
use aitraffic_core::constants::*;
use aitraffic_core::events::SimEvent;
use aitraffic_core::geo::{normalize_180, normalize_heading};
use aitraffic_core::types::{EntityId, ViewerState};

use crate::behaviors::Behavior;

/// Radar-relative fields of an entity at `kin` as seen from `viewer`.
pub fn contact(viewer: &ViewerState, kin: &Kinematics, radar_range_nm: f64) -> RadarContact {
    let range_ft = viewer.position.distance_ft_to(&kin.position);
    let range_nm = range_ft / FT_PER_NM;
    let bearing_deg = if range_ft > 0.0 {
        viewer.position.bearing_deg_to(&kin.position)
    } else {
        0.0
    };
    let dalt = kin.position.alt_ft - viewer.position.alt_ft;
    let elevation_deg = dalt.atan2(range_ft).to_degrees();

    let horiz_offset_deg = normalize_180(bearing_deg - viewer.orientation.heading_deg);
    let vert_offset_deg = elevation_deg - viewer.orientation.pitch_deg;
    let horiz = horiz_offset_deg.to_radians();

    RadarContact {
        bearing_deg,
        range_nm,
        elevation_deg,
        horiz_offset_deg,
        vert_offset_deg,
        x_shift: range_nm * horiz.sin(),
        y_shift: range_nm * horiz.cos(),
        rotation_deg: normalize_heading(kin.orientation.heading_deg - viewer.orientation.heading_deg),
        in_range: range_nm < radar_range_nm * RADAR_RANGE_MARGIN,
    }
}

/// Viewer is in the refuelling basket: close, the tanker ahead and above.
pub fn in_tanker_contact(radar: &RadarContact) -> bool {
    radar.range_nm * FT_PER_NM < TANKER_CONTACT_RANGE_FT && radar.y_shift > 0.0 && radar.elevation_deg > 0.0
}

/// Recompute radar fields. A tanker contact event fires when the viewer
/// enters a tanker's contact zone, not on every tick inside it.
pub fn run(
    world: &mut World,
    viewer: &ViewerState,
    radar_range_nm: f64,
    contacts: &mut HashSet<EntityId>,
    events: &mut Vec<SimEvent>,
) {
    for (_entity, (identity, kin, behavior, radar)) in
        world.query_mut::<(&Identity, &Kinematics, &Behavior, &mut RadarContact)>()
    {
        *radar = contact(viewer, kin, radar_range_nm);

        if !behavior.is_tanker() {
            continue;
        }
        if in_tanker_contact(radar) {
            if contacts.insert(identity.id) {
                tracing::debug!(id = %identity.id, "tanker contact");
                events.push(SimEvent::TankerContact { id: identity.id });
            }
        } else {
            contacts.remove(&identity.id);
        }
    }
}
