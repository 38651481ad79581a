//! Submodel spawner: releases ballistic children from spawn points on a
//! parent entity or on the viewer.
//!
//! The spawner never touches the world. [`SubmodelSpawner::update`] returns
//! spawn requests and the manager registers them after the behavior pass.

use glam::DVec3;

use aitraffic_core::commands::SubmodelParent;
use aitraffic_core::constants::*;
use aitraffic_core::geo::{bearing_from_components, normalize_heading, rotate_body_to_ned};
use aitraffic_core::params::{BallisticParams, InitialState, SubmodelConfig, VariantParams};
use aitraffic_core::types::{EntityId, GeoPosition, NedVelocity, Orientation, ViewerState};

use crate::behaviors::SpawnRequest;
use crate::systems::peers::PeerTable;

/// Parent state a release is composed with.
#[derive(Debug, Clone, Copy)]
pub struct ParentState {
    /// `None` for the viewer.
    pub id: Option<EntityId>,
    pub position: GeoPosition,
    pub orientation: Orientation,
    pub velocity: NedVelocity,
}

impl ParentState {
    fn resolve(parent: SubmodelParent, viewer: &ViewerState, peers: &PeerTable) -> Option<Self> {
        match parent {
            SubmodelParent::Viewer => Some(Self {
                id: None,
                position: viewer.position,
                orientation: viewer.orientation,
                velocity: viewer.velocity,
            }),
            SubmodelParent::Entity(id) => peers.get(id).filter(|p| !p.dying).map(|p| Self {
                id: Some(id),
                position: p.position,
                orientation: p.orientation,
                velocity: p.velocity,
            }),
        }
    }
}

/// Initial state of a child released from `parent`.
///
/// The body offset is rotated by the parent attitude. The release vector
/// leaves along the parent attitude adjusted by the yaw/pitch offsets, and
/// the parent velocity is added before speed, azimuth and elevation are
/// derived again.
pub fn release_state(config: &SubmodelConfig, parent: &ParentState, contents_lb: f64, depth: u32) -> InitialState {
    let body = DVec3::new(config.x_offset_ft, config.y_offset_ft, -config.z_offset_ft);
    let ned = rotate_body_to_ned(&parent.orientation, body);
    let position = parent.position.displaced(ned.x, ned.y, -ned.z);

    let roll = parent.orientation.roll_deg.to_radians();
    let yaw = config.yaw_offset_deg;
    let pitch = config.pitch_offset_deg;
    let elevation = parent.orientation.pitch_deg + yaw * roll.sin() + pitch * roll.cos();
    let azimuth = parent.orientation.heading_deg + yaw * roll.cos() - pitch * roll.sin();

    let (el, az) = (elevation.to_radians(), azimuth.to_radians());
    let horizontal = config.speed_fps * el.cos();
    let north = horizontal * az.cos() + parent.velocity.north_fps;
    let east = horizontal * az.sin() + parent.velocity.east_fps;
    let up = config.speed_fps * el.sin() - parent.velocity.down_fps;

    let horizontal = north.hypot(east);
    let speed_fps = horizontal.hypot(up);
    let elevation_deg = up.atan2(horizontal).to_degrees();
    let azimuth_deg = if horizontal > 0.0 {
        bearing_from_components(north, east)
    } else {
        normalize_heading(azimuth)
    };

    let params = BallisticParams {
        azimuth_deg,
        elevation_deg,
        speed_fps,
        drag_area_ft2: config.drag_area_ft2,
        cd: config.cd,
        mass_slug: (config.weight_lb + contents_lb) * LBS_TO_SLUGS,
        life_secs: config.life_secs,
        buoyancy_fps2: config.buoyancy_fps2,
        wind: config.wind,
        aero_stabilised: config.aero_stabilised,
        report_impact: config.report_impact,
        report_collision: config.report_collision,
        report_expiry: config.report_expiry,
        fuse_range_ft: config.fuse_range_ft,
        parent: parent.id,
        impact_submodel: config.impact_submodel.clone(),
        depth,
        ..Default::default()
    };

    InitialState {
        name: config.name.clone(),
        position,
        orientation: Orientation::new(azimuth_deg, elevation_deg, 0.0),
        speed_kt: speed_fps / KT_TO_FPS,
        vertical_speed_fpm: up * 60.0,
        params: Some(VariantParams::Ballistic(params)),
        ..Default::default()
    }
}

#[derive(Debug, Clone)]
struct SpawnPoint {
    parent: SubmodelParent,
    config: SubmodelConfig,
    triggered: bool,
    timer_secs: f64,
    count: i32,
    contents_lb: f64,
}

impl SpawnPoint {
    fn new(parent: SubmodelParent, config: SubmodelConfig) -> Self {
        Self {
            parent,
            triggered: false,
            // primed so the first release is immediate
            timer_secs: config.delay_secs,
            count: config.count,
            contents_lb: config.contents_lb,
            config,
        }
    }

    fn rearm(&mut self) {
        self.timer_secs = self.config.delay_secs;
    }
}

/// All spawn points, in attachment order.
#[derive(Debug, Clone, Default)]
pub struct SubmodelSpawner {
    points: Vec<SpawnPoint>,
}

impl SubmodelSpawner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of points attached to `parent`.
    pub fn count_for(&self, parent: SubmodelParent) -> usize {
        self.points.iter().filter(|p| p.parent == parent).count()
    }

    pub fn attach(&mut self, parent: SubmodelParent, configs: impl IntoIterator<Item = SubmodelConfig>) {
        self.points
            .extend(configs.into_iter().map(|config| SpawnPoint::new(parent, config)));
    }

    /// Set the trigger of the `index`-th point of `parent`. Returns false
    /// when no such point exists.
    pub fn set_trigger(&mut self, parent: SubmodelParent, index: usize, triggered: bool) -> bool {
        let Some(point) = self.points.iter_mut().filter(|p| p.parent == parent).nth(index) else {
            return false;
        };
        point.triggered = triggered;
        if !triggered {
            point.rearm();
        }
        true
    }

    /// Drop every point of a removed entity.
    pub fn detach(&mut self, id: EntityId) {
        self.points.retain(|p| p.parent != SubmodelParent::Entity(id));
    }

    /// Advance the release timers. No-op at `dt <= 0`.
    pub fn update(&mut self, dt: f64, viewer: &ViewerState, peers: &PeerTable) -> Vec<SpawnRequest> {
        let mut released = Vec::new();
        if dt <= 0.0 {
            return released;
        }

        for point in &mut self.points {
            let Some(parent) = ParentState::resolve(point.parent, viewer, peers) else {
                continue;
            };

            let triggered = point.triggered || (point.config.contrail && parent.position.alt_ft > CONTRAIL_ALTITUDE_FT);
            if !triggered {
                point.rearm();
                continue;
            }
            if point.count == 0 {
                continue;
            }

            point.timer_secs += dt;
            if point.timer_secs < point.config.delay_secs {
                continue;
            }
            point.timer_secs = 0.0;

            let state = release_state(&point.config, &parent, point.contents_lb, 0);
            point.contents_lb = 0.0;
            if point.count > 0 {
                point.count -= 1;
            }
            tracing::trace!(name = %point.config.name, parent = ?point.parent, "submodel released");
            released.push(SpawnRequest {
                parent: point.parent,
                name: point.config.name.clone(),
                state,
            });
        }
        released
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewer_at(alt_ft: f64) -> ViewerState {
        ViewerState::at(GeoPosition::new(37.0, -122.0, alt_ft))
    }

    fn ballistic(state: &InitialState) -> &BallisticParams {
        match &state.params {
            Some(VariantParams::Ballistic(p)) => p,
            other => panic!("expected ballistic params, got {other:?}"),
        }
    }

    #[test]
    fn test_first_release_is_immediate_then_delayed() {
        let mut spawner = SubmodelSpawner::new();
        let config = SubmodelConfig {
            delay_secs: 1.0,
            count: -1,
            ..Default::default()
        };
        spawner.attach(SubmodelParent::Viewer, [config]);
        assert!(spawner.set_trigger(SubmodelParent::Viewer, 0, true));

        let viewer = viewer_at(1000.0);
        let peers = PeerTable::default();
        assert_eq!(spawner.update(0.1, &viewer, &peers).len(), 1, "first release");
        let mut later = 0;
        for _ in 0..9 {
            later += spawner.update(0.1, &viewer, &peers).len();
        }
        assert_eq!(later, 0, "held for the delay");
        assert_eq!(spawner.update(0.1, &viewer, &peers).len(), 1);
    }

    #[test]
    fn test_count_limits_releases() {
        let mut spawner = SubmodelSpawner::new();
        let config = SubmodelConfig {
            delay_secs: 0.0,
            count: 2,
            ..Default::default()
        };
        spawner.attach(SubmodelParent::Viewer, [config]);
        spawner.set_trigger(SubmodelParent::Viewer, 0, true);

        let viewer = viewer_at(1000.0);
        let peers = PeerTable::default();
        let total: usize = (0..10).map(|_| spawner.update(0.1, &viewer, &peers).len()).sum();
        assert_eq!(total, 2);
    }

    #[test]
    fn test_zero_dt_releases_nothing() {
        let mut spawner = SubmodelSpawner::new();
        spawner.attach(SubmodelParent::Viewer, [SubmodelConfig::default()]);
        spawner.set_trigger(SubmodelParent::Viewer, 0, true);
        assert!(spawner.update(0.0, &viewer_at(0.0), &PeerTable::default()).is_empty());
    }

    #[test]
    fn test_contrail_triggers_above_altitude() {
        let mut spawner = SubmodelSpawner::new();
        let config = SubmodelConfig {
            contrail: true,
            count: -1,
            ..Default::default()
        };
        spawner.attach(SubmodelParent::Viewer, [config]);
        let peers = PeerTable::default();
        assert!(spawner.update(0.1, &viewer_at(20_000.0), &peers).is_empty());
        assert_eq!(spawner.update(0.1, &viewer_at(35_000.0), &peers).len(), 1);
    }

    #[test]
    fn test_contents_added_once() {
        let mut spawner = SubmodelSpawner::new();
        let config = SubmodelConfig {
            delay_secs: 0.0,
            count: -1,
            weight_lb: 10.0,
            contents_lb: 90.0,
            ..Default::default()
        };
        spawner.attach(SubmodelParent::Viewer, [config]);
        spawner.set_trigger(SubmodelParent::Viewer, 0, true);
        let viewer = viewer_at(1000.0);
        let peers = PeerTable::default();

        let first = spawner.update(0.1, &viewer, &peers);
        let second = spawner.update(0.1, &viewer, &peers);
        let m1 = ballistic(&first[0].state).mass_slug;
        let m2 = ballistic(&second[0].state).mass_slug;
        assert!((m1 - 100.0 * LBS_TO_SLUGS).abs() < 1e-12, "m1 = {m1}");
        assert!((m2 - 10.0 * LBS_TO_SLUGS).abs() < 1e-12, "m2 = {m2}");
    }

    #[test]
    fn test_release_adds_parent_velocity() {
        let config = SubmodelConfig {
            speed_fps: 100.0,
            ..Default::default()
        };
        let parent = ParentState {
            id: None,
            position: GeoPosition::new(0.0, 0.0, 5000.0),
            orientation: Orientation::new(90.0, 0.0, 0.0),
            velocity: NedVelocity::new(0.0, 200.0, 0.0),
        };
        let state = release_state(&config, &parent, 0.0, 0);
        let p = ballistic(&state);
        assert!((p.speed_fps - 300.0).abs() < 1e-6, "speed {}", p.speed_fps);
        assert!((p.azimuth_deg - 90.0).abs() < 1e-6);
        assert!(p.elevation_deg.abs() < 1e-6);
    }

    #[test]
    fn test_offset_rotates_with_parent_heading() {
        let config = SubmodelConfig {
            x_offset_ft: 100.0,
            z_offset_ft: 10.0,
            speed_fps: 0.0,
            ..Default::default()
        };
        let origin = GeoPosition::new(0.0, 0.0, 5000.0);
        let parent = ParentState {
            id: None,
            position: origin,
            orientation: Orientation::new(90.0, 0.0, 0.0),
            velocity: NedVelocity::default(),
        };
        let state = release_state(&config, &parent, 0.0, 0);
        let (north, east) = origin.offset_ft_to(&state.position);
        assert!(north.abs() < 1e-3, "north {north}");
        assert!((east - 100.0).abs() < 1e-3, "east {east}");
        assert!((state.position.alt_ft - 5010.0).abs() < 1e-9);
    }
}
