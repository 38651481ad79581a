//! End-to-end traffic scenarios run through the public manager API.

use approx::assert_relative_eq;

use aitraffic_core::atmosphere;
use aitraffic_core::enums::{EntityKind, RemovalReason, ReportKind};
use aitraffic_core::constants::MAX_SUBMODEL_DEPTH;
use aitraffic_core::events::{SimEvent, StruckObject};
use aitraffic_core::params::*;
use aitraffic_core::types::{EntityId, GeoPosition, ViewerState};
use aitraffic_sim::behaviors::ballistic::drag_decay_fps;
use aitraffic_sim::{Scenario, SimConfig, TrafficManager};
use aitraffic_terrain::{FlatGround, GroundQuery, GroundSample};

fn viewer() -> ViewerState {
    ViewerState::at(GeoPosition::new(0.0, 0.0, 10_000.0))
}

fn removal(events: &[SimEvent], id: EntityId) -> Option<RemovalReason> {
    events.iter().find_map(|e| match e {
        SimEvent::Removed { id: rid, reason } if *rid == id => Some(*reason),
        _ => None,
    })
}

fn reports(events: &[SimEvent], id: EntityId, kind: ReportKind) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, SimEvent::Report { id: rid, report } if *rid == id && report.kind == kind))
        .count()
}

fn ballistic(position: GeoPosition, params: BallisticParams) -> InitialState {
    InitialState::at(position, 0.0, 0.0).with_params(VariantParams::Ballistic(params))
}

/// Ground data is missing everywhere.
struct NoGround;

impl GroundQuery for NoGround {
    fn ground_at(&self, _lat_deg: f64, _lon_deg: f64) -> Option<GroundSample> {
        None
    }
}

#[test]
fn test_flight_plan_reaches_end_near_last_waypoint() {
    let mut mgr = TrafficManager::new(SimConfig::default());
    let plan = FlightPlanSource::Inline {
        name: "hop".to_string(),
        repeat: false,
        waypoints: vec![
            WaypointRecord::new("A", 0.0, 0.0, 2000.0, 120.0),
            WaypointRecord::new("B", 0.02, 0.0, 2000.0, 120.0),
            WaypointRecord::end(),
        ],
    };
    let id = mgr
        .spawn(EntityKind::Aircraft, InitialState::default().with_flight_plan(plan))
        .unwrap();
    let b = GeoPosition::new(0.02, 0.0, 2000.0);

    let mut events = Vec::new();
    let mut finish = None;
    for _ in 0..2000 {
        mgr.tick(0.1, &viewer());
        events.extend(mgr.drain_events());
        let snap = mgr.snapshot();
        let entity = snap.entity(id).unwrap();
        if entity.dying {
            finish = Some(entity.kinematics.position);
            break;
        }
    }
    let finish = finish.expect("plan never finished");
    let miss = finish.distance_ft_to(&b);
    assert!(miss < 500.0, "finished {miss:.1} ft from B");
    assert!(events
        .iter()
        .any(|e| matches!(e, SimEvent::WaypointReached { id: rid, waypoint } if *rid == id && waypoint == "B")));

    mgr.tick(0.1, &viewer());
    assert_eq!(removal(&mgr.drain_events(), id), Some(RemovalReason::PlanFinished));
    assert!(!mgr.contains(id));
}

/// Flat-earth reference for a due-east shot: drag decay, then gravity,
/// each step of `dt`. Returns horizontal range after `steps`.
fn stepped_range(
    speed_fps: f64,
    elevation_deg: f64,
    params: &BallisticParams,
    lat: f64,
    alt: f64,
    steps: usize,
) -> f64 {
    let dt = 0.1;
    let (mut v, mut el, mut alt, mut x) = (speed_fps, elevation_deg.to_radians(), alt, 0.0);
    for _ in 0..steps {
        let air = atmosphere::sample(alt);
        v = (v - drag_decay_fps(v, params.cd, params.drag_area_ft2, params.mass_slug, &air, dt)).max(0.0);
        let h = v * el.cos();
        let up = v * el.sin() - atmosphere::gravity_fps2(lat, alt) * dt;
        x += h * dt;
        alt += up * dt;
        v = h.hypot(up);
        el = up.atan2(h);
    }
    x
}

fn fire_east(params: BallisticParams, start: GeoPosition) -> GeoPosition {
    let mut mgr = TrafficManager::with_ground(SimConfig::default(), Box::new(FlatGround::default()));
    let id = mgr.spawn(EntityKind::Ballistic, ballistic(start, params)).unwrap();
    for _ in 0..20 {
        mgr.tick(0.1, &viewer());
    }
    mgr.snapshot().entity(id).unwrap().kinematics.position
}

#[test]
fn test_ballistic_range_matches_drag_estimate() {
    let start = GeoPosition::new(10.0, 10.0, 100.0);
    let params = BallisticParams {
        azimuth_deg: 90.0,
        elevation_deg: 45.0,
        speed_fps: 500.0,
        mass_slug: 0.01,
        drag_area_ft2: 1.0,
        ..Default::default()
    };
    let pos = fire_east(params.clone(), start);
    let range = start.distance_ft_to(&pos);

    let expected = stepped_range(500.0, 45.0, &params, 10.0, 100.0, 20);
    assert_relative_eq!(range, expected, max_relative = 0.01);

    // 500 ft/s at 45 degrees covers about 707 ft in 2 s without drag
    let vacuum = fire_east(
        BallisticParams {
            drag_area_ft2: 0.0,
            ..params
        },
        start,
    );
    let vacuum_range = start.distance_ft_to(&vacuum);
    assert_relative_eq!(vacuum_range, 500.0 * std::f64::consts::FRAC_1_SQRT_2 * 2.0, max_relative = 0.01);
    assert!(range < 0.5 * vacuum_range, "drag barely slowed it: {range:.1} vs {vacuum_range:.1} ft");

    let (north, _) = start.offset_ft_to(&pos);
    assert!(north.abs() < 1.0, "fired due east, drifted {north} ft north");
}

#[test]
fn test_ballistic_impact_reported_once() {
    let mut mgr = TrafficManager::new(SimConfig::default());
    let id = mgr
        .spawn(
            EntityKind::Ballistic,
            ballistic(
                GeoPosition::new(10.0, 10.0, 100.0),
                BallisticParams {
                    azimuth_deg: 0.0,
                    elevation_deg: -45.0,
                    speed_fps: 300.0,
                    report_impact: true,
                    ..Default::default()
                },
            ),
        )
        .unwrap();
    let mut events = Vec::new();
    for _ in 0..30 {
        mgr.tick(0.1, &viewer());
        events.extend(mgr.drain_events());
    }
    assert_eq!(reports(&events, id, ReportKind::Impact), 1);
    assert_eq!(removal(&events, id), Some(RemovalReason::Impact));
}

#[test]
fn test_ballistic_collision_with_ship_reported_once() {
    let mut mgr = TrafficManager::new(SimConfig::default());
    let ship_pos = GeoPosition::new(10.0, 10.0, 0.0);
    let ship = mgr
        .spawn(EntityKind::Ship, InitialState::at(ship_pos, 0.0, 0.0).named("hulk"))
        .unwrap();
    let shell = mgr
        .spawn(
            EntityKind::Ballistic,
            ballistic(
                ship_pos.displaced(0.0, -1000.0, 100.0),
                BallisticParams {
                    azimuth_deg: 90.0,
                    elevation_deg: 0.0,
                    speed_fps: 500.0,
                    report_collision: true,
                    fuse_range_ft: 10.0,
                    ..Default::default()
                },
            ),
        )
        .unwrap();

    let mut events = Vec::new();
    for _ in 0..40 {
        mgr.tick(0.1, &viewer());
        events.extend(mgr.drain_events());
    }

    assert_eq!(reports(&events, shell, ReportKind::Collision), 1);
    assert_eq!(reports(&events, shell, ReportKind::Impact), 0, "never reached the ground");
    let struck = events.iter().find_map(|e| match e {
        SimEvent::Report { id, report } if *id == shell => Some(report.struck),
        _ => None,
    });
    assert_eq!(
        struck,
        Some(StruckObject::Entity {
            id: ship,
            kind: EntityKind::Ship
        })
    );
    assert_eq!(removal(&events, shell), Some(RemovalReason::Impact));
    assert!(mgr.contains(ship), "the ship is only a target");
}

#[test]
fn test_impact_submodel_chain_stops_at_nesting_limit() {
    // every level releases the next on impact, two levels deeper than allowed
    let mut config: Option<Box<SubmodelConfig>> = None;
    for level in (0..MAX_SUBMODEL_DEPTH + 2).rev() {
        config = Some(Box::new(SubmodelConfig {
            name: format!("frag{level}"),
            speed_fps: 0.0,
            impact_submodel: config,
            ..Default::default()
        }));
    }

    let mut mgr = TrafficManager::new(SimConfig::default());
    let root = mgr
        .spawn(
            EntityKind::Ballistic,
            ballistic(
                GeoPosition::new(10.0, 10.0, 5.0),
                BallisticParams {
                    elevation_deg: -90.0,
                    speed_fps: 100.0,
                    impact_submodel: config,
                    ..Default::default()
                },
            ),
        )
        .unwrap();

    let mut events = Vec::new();
    for _ in 0..50 {
        mgr.tick(0.1, &viewer());
        events.extend(mgr.drain_events());
    }

    let released: Vec<&str> = events
        .iter()
        .filter_map(|e| match e {
            SimEvent::SubmodelReleased { name, .. } => Some(name.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(released, ["frag0", "frag1", "frag2", "frag3"]);
    assert_eq!(released.len() as u32, MAX_SUBMODEL_DEPTH);
    assert_eq!(removal(&events, root), Some(RemovalReason::Impact));
    assert!(mgr.is_empty(), "every fragment hit the ground and was reaped");
}

#[test]
fn test_persistent_ballistic_with_negative_life_never_expires() {
    let mut mgr = TrafficManager::new(SimConfig::default());
    let id = mgr
        .spawn(
            EntityKind::Ballistic,
            ballistic(
                GeoPosition::new(10.0, 10.0, 5.0),
                BallisticParams {
                    life_secs: -1.0,
                    persistent: true,
                    ..Default::default()
                },
            ),
        )
        .unwrap();
    for _ in 0..2000 {
        mgr.tick(1.0, &viewer());
    }
    let snap = mgr.snapshot();
    let entity = snap.entity(id).expect("persistent projectile removed");
    assert!(!entity.dying);
    assert_eq!(entity.kinematics.position.alt_ft, 0.0, "resting on the ground");
    assert_eq!(entity.kinematics.speed_kt, 0.0);
}

#[test]
fn test_ballistic_expiry_reported() {
    let mut mgr = TrafficManager::new(SimConfig::default());
    let id = mgr
        .spawn(
            EntityKind::Ballistic,
            ballistic(
                GeoPosition::new(10.0, 10.0, 10_000.0),
                BallisticParams {
                    life_secs: 5.0,
                    report_expiry: true,
                    ..Default::default()
                },
            ),
        )
        .unwrap();
    let mut events = Vec::new();
    for _ in 0..45 {
        mgr.tick(0.1, &viewer());
        events.extend(mgr.drain_events());
    }
    assert!(mgr.contains(id), "alive before its life runs out");

    for _ in 0..20 {
        mgr.tick(0.1, &viewer());
        events.extend(mgr.drain_events());
    }
    assert_eq!(reports(&events, id, ReportKind::Expiry), 1);
    assert_eq!(removal(&events, id), Some(RemovalReason::Expired));
}

#[test]
fn test_ballistic_below_floor_without_ground() {
    let mut mgr = TrafficManager::with_ground(SimConfig::default(), Box::new(NoGround));
    let id = mgr
        .spawn(
            EntityKind::Ballistic,
            ballistic(
                GeoPosition::new(10.0, 10.0, -990.0),
                BallisticParams {
                    elevation_deg: -90.0,
                    speed_fps: 100.0,
                    ..Default::default()
                },
            ),
        )
        .unwrap();
    mgr.tick(0.1, &viewer());
    assert!(mgr.snapshot().entity(id).unwrap().dying);

    mgr.tick(0.1, &viewer());
    assert_eq!(removal(&mgr.drain_events(), id), Some(RemovalReason::BelowFloor));
}

#[test]
fn test_escort_converges_on_station() {
    let mut mgr = TrafficManager::new(SimConfig::default());
    let lead_start = GeoPosition::new(20.0, 30.0, 0.0);
    let lead = mgr
        .spawn(EntityKind::Ship, InitialState::at(lead_start, 0.0, 10.0).named("lead"))
        .unwrap();
    let escort = mgr
        .spawn(
            EntityKind::Escort,
            InitialState::at(lead_start.project(0.0, 400.0), 0.0, 10.0).with_params(VariantParams::Escort(
                EscortParams {
                    parent: "lead".to_string(),
                    station_range_ft: 500.0,
                    station_bearing_deg: 0.0,
                    ..Default::default()
                },
            )),
        )
        .unwrap();

    for _ in 0..1200 {
        mgr.tick(0.1, &viewer());
        let snap = mgr.snapshot();
        let parent_hdg = snap.entity(lead).unwrap().kinematics.orientation.heading_deg;
        let target_hdg = snap.entity(escort).unwrap().targets.heading_deg;
        let error = (target_hdg - parent_hdg + 540.0).rem_euclid(360.0) - 180.0;
        assert!(error.abs() <= 20.0 + 1e-9, "steering {error:.2} deg off the parent heading");
    }

    let snap = mgr.snapshot();
    let parent = snap.entity(lead).unwrap().kinematics;
    let esc = snap.entity(escort).unwrap().kinematics;
    let station = parent.position.project(parent.orientation.heading_deg, 500.0);
    let range = esc.position.distance_ft_to(&station);
    assert!(range <= 100.0, "escort {range:.1} ft from station");
    assert!((esc.speed_kt - 10.0).abs() <= 1.0 + 1e-9, "escort speed {}", esc.speed_kt);
}

#[test]
fn test_scenario_file_round_trip_through_manager() {
    let json = r#"{
        "name": "harbour",
        "viewer": { "position": { "lat_deg": 50.0, "lon_deg": -1.0, "alt_ft": 1500.0 } },
        "flight_plans": [
            { "name": "pattern", "waypoints": [
                { "name": "DW", "lat": 50.0, "lon": -1.0, "alt": 1500.0, "ktas": 100.0 },
                { "name": "BASE", "lat": 50.02, "lon": -1.0, "alt": 1500.0, "ktas": 100.0 },
                { "name": "END" }
            ] }
        ],
        "entries": [
            { "type": "aircraft", "state": { "name": "circuit",
              "flight_plan": { "source": "named", "name": "pattern", "repeat": true } } },
            { "type": "hovercraft", "state": {} },
            { "type": "thermal", "state": { "position": { "lat_deg": 50.001, "lon_deg": -1.0, "alt_ft": 0.0 } } },
            { "type": "static", "state": { "name": "lighthouse" } }
        ]
    }"#;
    let scenario = Scenario::from_json(json).unwrap();
    let mut mgr = TrafficManager::new(SimConfig::default());
    let ids = scenario.spawn_into(&mut mgr);
    assert_eq!(ids.len(), 3, "unknown type skipped");

    for _ in 0..50 {
        mgr.tick(0.1, &scenario.viewer);
    }
    let snap = mgr.snapshot();
    assert_eq!(snap.entities.len(), 3);
    assert_eq!(snap.entities[0].name, "circuit");
    assert!(!snap.entities[0].dying, "named plan resolved");
    assert_eq!(snap.nearest_thermal.map(|t| t.id), Some(ids[1]));
}
