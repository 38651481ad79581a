//! Nearest thermal to the viewer, across every live thermal.

use hecs::World;

use aitraffic_core::components::{Identity, Lifecycle};
use aitraffic_core::state::ThermalReading;

use crate::behaviors::Behavior;

pub fn nearest(world: &World) -> Option<ThermalReading> {
    let mut query = world.query::<(&Identity, &Lifecycle, &Behavior)>();
    query
        .iter()
        .filter(|(_, (_, life, _))| !life.dying)
        .filter_map(|(_, (identity, _, behavior))| {
            behavior.thermal_reading().map(|(range_ft, strength_fps)| ThermalReading {
                id: identity.id,
                range_ft,
                strength_fps,
            })
        })
        .filter(|r| r.range_ft.is_finite())
        // ties go to the lower id so the answer does not depend on storage order
        .min_by(|a, b| a.range_ft.total_cmp(&b.range_ft).then(a.id.0.cmp(&b.id.0)))
}
