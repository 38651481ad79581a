#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use aitraffic_core::enums::{BreakSide, PerformanceClass, WingmanPhase};
    use aitraffic_core::error::FlightPlanError;
    use aitraffic_core::params::WaypointRecord;
    use aitraffic_core::types::GeoPosition;

    use crate::formation::{evaluate, FormationContext, Steering};
    use crate::performance::get_profile;
    use crate::plan::{lead_distance_ft, FlightPlan};
    use crate::sequencer::{SequencerContext, SequencerState, WaypointSequencer};
    use crate::tuning::{FlightPlanTuning, LeadLaw};
    use crate::waypoint::WaypointKind;

    fn wp(name: &str, lat: f64, lon: f64, alt: f64, kt: f64) -> WaypointRecord {
        WaypointRecord::new(name, lat, lon, alt, kt)
    }

    /// Fly a point mass straight along the commanded heading, applying
    /// sequencer targets instantly. Returns the names of waypoints passed
    /// and whether the plan asked to terminate.
    fn fly(seq: &mut WaypointSequencer, secs: f64, dt: f64) -> (Vec<String>, bool, GeoPosition) {
        let tuning = FlightPlanTuning::default();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let priming = seq.prime(None, &tuning).expect("plan primes once");
        let mut position = priming.position;
        let mut heading = priming.heading_deg;
        let mut speed = priming.speed_kt;
        let mut passed = Vec::new();

        let steps = (secs / dt) as usize;
        for _ in 0..steps {
            position = position.project(heading, speed * 1.686 * dt);
            let ctx = SequencerContext {
                position,
                speed_kt: speed,
                target_heading_deg: heading,
                target_speed_kt: speed,
                dt,
                time_of_day_secs: 0.0,
                turn_radius_ft: None,
                tuning: &tuning,
            };
            let out = seq.update(&ctx, position.alt_ft, &mut rng);
            if let Some(h) = out.heading_deg {
                heading = h;
            }
            if let Some(s) = out.speed_kt {
                speed = s;
            }
            if let Some(name) = out.waypoint_reached {
                passed.push(name);
            }
            if out.terminate {
                return (passed, true, position);
            }
        }
        (passed, false, position)
    }

    #[test]
    fn test_build_rejects_empty_plan() {
        assert_eq!(FlightPlan::build("empty", false, &[]).unwrap_err(), FlightPlanError::Empty);
    }

    #[test]
    fn test_sentinels_inherit_previous_waypoint() {
        let mut wait = wp("WAIT", 0.0, 0.0, 0.0, 0.0);
        wait.time_sec = 30.0;
        let plan = FlightPlan::build(
            "p",
            false,
            &[wp("A", 1.0, 1.0, 1000.0, 120.0), wait, wp("END", 0.0, 0.0, 0.0, 0.0)],
        )
        .unwrap();
        let wps = plan.waypoints();
        assert_eq!(wps[1].position, wps[0].position, "WAIT inherits A's position");
        assert_eq!(wps[1].speed_kt, 120.0);
        assert_eq!(wps[1].kind, WaypointKind::Wait { secs: 30.0 });
        assert_eq!(wps[2].position.alt_ft, 1000.0, "END inherits through WAIT");
    }

    #[test]
    fn test_missing_end_is_appended() {
        let plan = FlightPlan::build("p", false, &[wp("A", 0.0, 0.0, 0.0, 100.0), wp("B", 0.1, 0.0, 0.0, 100.0)])
            .unwrap();
        assert_eq!(plan.len(), 3);
        assert!(plan.waypoints()[2].is_end());
        assert_eq!(plan.waypoints()[2].position, plan.waypoints()[1].position);
    }

    #[test]
    fn test_lead_distance_laws() {
        let mut tuning = FlightPlanTuning::default();
        let sine = lead_distance_ft(200.0, 0.0, 90.0, None, &tuning);
        let radius = 0.1911 * 200.0 * 200.0;
        assert!((sine - radius).abs() < 1e-6, "90 degree turn leads by the radius: {sine}");

        tuning.lead_law = LeadLaw::HalfAngleTangent;
        let tan = lead_distance_ft(200.0, 0.0, 90.0, None, &tuning);
        assert!((tan - radius).abs() < 1e-6, "tan(45) is 1 as well: {tan}");
        let tan60 = lead_distance_ft(200.0, 0.0, 60.0, None, &tuning);
        assert!(tan60 < tan, "smaller turn, shorter lead: {tan60}");

        assert_eq!(lead_distance_ft(0.2, 0.0, 90.0, None, &tuning), 0.5, "minimum lead when nearly stopped");
    }

    #[test]
    fn test_slow_speed_radius_uses_ground_turn_rate() {
        let tuning = FlightPlanTuning::default();
        let lead = lead_distance_ft(10.0, 0.0, 90.0, None, &tuning);
        let expected = 12.0 * 10.0 / (2.0 * std::f64::consts::PI);
        assert!((lead - expected).abs() < 1e-9, "lead: {lead}, expected {expected}");
    }

    #[test]
    fn test_lead_wraps_course_change() {
        let tuning = FlightPlanTuning::default();
        let a = lead_distance_ft(200.0, 350.0, 10.0, None, &tuning);
        let b = lead_distance_ft(200.0, 0.0, 20.0, None, &tuning);
        assert!((a - b).abs() < 1e-6, "350->10 is a 20 degree turn: {a} vs {b}");
    }

    #[test]
    fn test_priming_from_first_waypoint() {
        let plan = FlightPlan::build(
            "p",
            false,
            &[wp("A", 0.0, 0.0, 1500.0, 150.0), wp("B", 0.0, 0.1, 3000.0, 200.0), wp("END", 0.0, 0.0, 0.0, 0.0)],
        )
        .unwrap();
        let mut seq = WaypointSequencer::new(plan);
        let priming = seq.prime(None, &FlightPlanTuning::default()).unwrap();
        assert_eq!(priming.position, GeoPosition::new(0.0, 0.0, 1500.0));
        assert_eq!(priming.speed_kt, 150.0);
        assert!((priming.heading_deg - 90.0).abs() < 1e-6, "heading: {}", priming.heading_deg);
        assert!(priming.use_perf_vs);
        assert_eq!(priming.target_altitude_ft, 1500.0);
        assert_eq!(seq.plan().cursor(), 1);
        assert_eq!(seq.state(), SequencerState::EnRoute);
        assert!(seq.prime(None, &FlightPlanTuning::default()).is_none(), "priming fires once");
    }

    #[test]
    fn test_priming_with_crossat() {
        let mut b = wp("B", 0.1, 0.0, 3000.0, 200.0);
        b.crossat = 5000.0;
        let plan = FlightPlan::build("p", false, &[wp("A", 0.0, 0.0, 1000.0, 200.0), b]).unwrap();
        let mut seq = WaypointSequencer::new(plan);
        let priming = seq.prime(None, &FlightPlanTuning::default()).unwrap();
        assert!(!priming.use_perf_vs);
        assert_eq!(priming.target_altitude_ft, 5000.0);
        let vs = priming.target_vertical_speed_fpm.unwrap();
        assert!(vs > 0.0, "climbing to cross higher: {vs}");
    }

    #[test]
    fn test_zero_dt_never_polls() {
        let tuning = FlightPlanTuning::default();
        let plan = FlightPlan::build("p", false, &[wp("A", 0.0, 0.0, 0.0, 100.0), wp("B", 0.0, 0.0, 0.0, 100.0)])
            .unwrap();
        let mut seq = WaypointSequencer::new(plan);
        let priming = seq.prime(None, &tuning).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let ctx = SequencerContext {
            position: priming.position,
            speed_kt: 100.0,
            target_heading_deg: 0.0,
            target_speed_kt: 100.0,
            dt: 0.0,
            time_of_day_secs: 0.0,
            turn_radius_ft: None,
            tuning: &tuning,
        };
        for _ in 0..100 {
            let out = seq.update(&ctx, 0.0, &mut rng);
            assert!(!out.terminate && out.waypoint_reached.is_none(), "dt=0 must not advance");
        }
        assert!(seq.last_evaluated_lead_ft().is_none());
    }

    #[test]
    fn test_plan_flies_to_end_and_terminates() {
        let plan = FlightPlan::build(
            "p",
            false,
            &[wp("A", 0.0, 0.0, 1000.0, 120.0), wp("B", 0.02, 0.0, 1000.0, 120.0), wp("END", 0.0, 0.0, 0.0, 0.0)],
        )
        .unwrap();
        let mut seq = WaypointSequencer::new(plan);
        let (passed, terminated, end) = fly(&mut seq, 120.0, 0.05);
        assert!(terminated, "plan should finish");
        assert_eq!(passed, vec!["B".to_string()]);
        let b = GeoPosition::new(0.02, 0.0, 1000.0);
        let miss = end.distance_ft_to(&b);
        assert!(miss < 500.0, "terminated {miss:.1} ft from B");
        assert!(seq.is_finished());

        let lead = seq.last_evaluated_lead_ft().unwrap();
        assert!(lead >= 2.0 * 120.0, "lead below floor: {lead}");
    }

    #[test]
    fn test_repeating_plan_restarts_at_first_waypoint() {
        let plan = FlightPlan::build(
            "loop",
            true,
            &[wp("A", 0.0, 0.0, 1000.0, 120.0), wp("B", 0.01, 0.0, 1000.0, 120.0), wp("END", 0.0, 0.0, 0.0, 0.0)],
        )
        .unwrap();
        let mut seq = WaypointSequencer::new(plan);
        let tuning = FlightPlanTuning::default();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let priming = seq.prime(None, &tuning).unwrap();
        let mut position = priming.position;
        let mut heading = priming.heading_deg;
        let mut restarted = false;
        for _ in 0..4000 {
            position = position.project(heading, 120.0 * 1.686 * 0.05);
            let ctx = SequencerContext {
                position,
                speed_kt: 120.0,
                target_heading_deg: heading,
                target_speed_kt: 120.0,
                dt: 0.05,
                time_of_day_secs: 0.0,
                turn_radius_ft: None,
                tuning: &tuning,
            };
            let out = seq.update(&ctx, 1000.0, &mut rng);
            assert!(!out.terminate, "repeating plan must not terminate");
            if let Some(h) = out.heading_deg {
                heading = h;
            }
            if out.restarted {
                restarted = true;
                assert_eq!(seq.plan().cursor(), 0);
                assert_eq!(seq.plan().current().unwrap().name, "A", "current is the first waypoint again");
                break;
            }
        }
        assert!(restarted, "plan never restarted");
    }

    #[test]
    fn test_wait_holds_then_resumes() {
        let mut wait = wp("WAIT", 0.0, 0.0, 0.0, 0.0);
        wait.time_sec = 2.0;
        let plan = FlightPlan::build(
            "p",
            false,
            &[
                wp("A", 0.0, 0.0, 0.0, 60.0),
                wp("B", 0.005, 0.0, 0.0, 60.0),
                wait,
                wp("C", 0.01, 0.0, 0.0, 60.0),
            ],
        )
        .unwrap();
        let mut seq = WaypointSequencer::new(plan);
        let tuning = FlightPlanTuning::default();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let priming = seq.prime(None, &tuning).unwrap();
        let mut position = priming.position;
        let mut speed = priming.speed_kt;
        let mut heading = priming.heading_deg;
        let mut saw_wait = false;
        let mut resumed = false;
        for _ in 0..2000 {
            position = position.project(heading, speed * 1.686 * 0.05);
            let ctx = SequencerContext {
                position,
                speed_kt: speed,
                target_heading_deg: heading,
                target_speed_kt: speed,
                dt: 0.05,
                time_of_day_secs: 0.0,
                turn_radius_ft: None,
                tuning: &tuning,
            };
            let out = seq.update(&ctx, 0.0, &mut rng);
            if let Some(h) = out.heading_deg {
                heading = h;
            }
            if let Some(s) = out.speed_kt {
                speed = s;
            }
            if seq.is_waiting() {
                saw_wait = true;
                assert_eq!(speed, 0.0, "speed commanded to zero while waiting");
            }
            if out.waypoint_reached.as_deref() == Some("WAIT") {
                resumed = true;
                assert_eq!(speed, 60.0, "speed restored after the wait");
                break;
            }
        }
        assert!(saw_wait && resumed, "wait={saw_wait} resumed={resumed}");
    }

    #[test]
    fn test_waituntil_in_the_past_passes_straight_through() {
        let mut until = wp("WAITUNTIL", 0.0, 0.0, 0.0, 0.0);
        until.time = Some("01:00:00".to_string());
        let plan = FlightPlan::build(
            "p",
            false,
            &[
                wp("A", 0.0, 0.0, 0.0, 60.0),
                wp("B", 0.005, 0.0, 0.0, 60.0),
                until,
                wp("C", 0.01, 0.0, 0.0, 60.0),
            ],
        )
        .unwrap();
        let mut seq = WaypointSequencer::new(plan);
        let tuning = FlightPlanTuning::default();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let priming = seq.prime(None, &tuning).unwrap();
        let mut position = priming.position;
        let mut speed = priming.speed_kt;
        let mut heading = priming.heading_deg;
        let mut passed = false;
        for _ in 0..2000 {
            position = position.project(heading, speed * 1.686 * 0.05);
            let ctx = SequencerContext {
                position,
                speed_kt: speed,
                target_heading_deg: heading,
                target_speed_kt: speed,
                dt: 0.05,
                time_of_day_secs: 23.0 * 3600.0,
                turn_radius_ft: None,
                tuning: &tuning,
            };
            let out = seq.update(&ctx, 0.0, &mut rng);
            if let Some(h) = out.heading_deg {
                heading = h;
            }
            if let Some(s) = out.speed_kt {
                speed = s;
            }
            assert!(!seq.is_waiting(), "held for a time of day that already passed");
            if out.waypoint_reached.as_deref() == Some("WAITUNTIL") {
                passed = true;
                break;
            }
        }
        assert!(passed, "never passed the WAITUNTIL waypoint");
        assert_eq!(speed, 60.0);
    }

    #[test]
    fn test_tanker_shares_transport_profile() {
        assert_eq!(
            get_profile(PerformanceClass::Tanker),
            get_profile(PerformanceClass::JetTransport)
        );
        let ufo = get_profile(PerformanceClass::Ufo);
        assert_eq!(ufo.accel_kt_s, 30.0);
        assert_eq!(ufo.descent_fpm, 6000.0);
    }

    fn formation_ctx(phase: WingmanPhase, elapsed: f64, range: f64) -> FormationContext {
        FormationContext {
            phase,
            elapsed_in_phase_secs: elapsed,
            ordered: None,
            speed_kt: 300.0,
            parent_heading_deg: 90.0,
            parent_speed_kt: 300.0,
            range_to_station_ft: range,
            bearing_to_station_deg: 45.0,
            break_angle_deg: 45.0,
            break_side: BreakSide::Left,
            break_duration_secs: 10.0,
            join_tolerance_ft: 100.0,
            max_speed_kt: 350.0,
        }
    }

    #[test]
    fn test_break_order_turns_away() {
        let mut ctx = formation_ctx(WingmanPhase::Formate, 100.0, 0.0);
        ctx.ordered = Some(WingmanPhase::Break);
        let update = evaluate(&ctx);
        assert!(update.phase_changed);
        assert_eq!(update.new_phase, WingmanPhase::Break);
        match update.steering {
            Steering::Free { heading_deg, full_bank, .. } => {
                assert!((heading_deg - 45.0).abs() < 1e-9, "left break from 090: {heading_deg}");
                assert!(full_bank);
            }
            other => panic!("expected free steering, got {other:?}"),
        }
    }

    #[test]
    fn test_break_times_out_into_join() {
        let update = evaluate(&formation_ctx(WingmanPhase::Break, 10.0, 5000.0));
        assert_eq!(update.new_phase, WingmanPhase::Join);
        match update.steering {
            Steering::Free { heading_deg, speed_kt, .. } => {
                assert_eq!(heading_deg, 45.0);
                assert_eq!(speed_kt, 350.0, "closure capped by max speed");
            }
            other => panic!("expected free steering, got {other:?}"),
        }
    }

    #[test]
    fn test_join_captures_station() {
        let update = evaluate(&formation_ctx(WingmanPhase::Join, 3.0, 80.0));
        assert_eq!(update.new_phase, WingmanPhase::Formate);
        assert_eq!(update.steering, Steering::Formate);
    }
}
