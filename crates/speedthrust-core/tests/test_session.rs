//! End-to-end session tests: config load → spawn → accelerate → falloff.
//!
//! All tests run against the in-process host; no files outside the temp
//! directory are touched.

use glam::{Quat, Vec3};
use rand::rngs::StdRng;
use rand::SeedableRng;
use speedthrust_core::generation::{spawn_fleet, FleetConfig};
use speedthrust_core::prelude::*;
use speedthrust_core::store::{archive_name, ConfigStore, MemoryStore, CONFIG_FILE_NAME};
use speedthrust_logic::config::{SizeClass, SpeedLimits, ThrustConfig};
use speedthrust_logic::direction::Direction;

const DT: f32 = 1.0 / 60.0;

// ── Helpers ────────────────────────────────────────────────────────────

fn directional_session() -> ThrustSession {
    let config = ThrustConfig {
        reduce_all_thrusters: false,
        ..Default::default()
    };
    ThrustSession::with_config(config, SpeedLimits::default(), SessionRole::Offline)
}

fn run(session: &mut ThrustSession, seconds: f32) {
    let frames = (seconds / DT).round() as u32;
    for _ in 0..frames {
        session.update(DT);
    }
}

// ── Tests ──────────────────────────────────────────────────────────────

#[test]
fn invalid_stored_config_falls_back_and_session_still_runs() {
    let mut store = MemoryStore::new();
    store.insert(CONFIG_FILE_NAME, r#"{ "largeFalloffStart": 1.5 }"#);

    let mut session = ThrustSession::start(&mut store, SpeedLimits::default(), SessionRole::Host);
    assert_eq!(session.config(), Some(&ThrustConfig::default()));
    assert!(store.exists(&archive_name(CONFIG_FILE_NAME)));

    let ship = session.spawn_vehicle("Hauler", SizeClass::Large, 1000.0);
    let unit = session.spawn_thruster(ship, Direction::Backward, 1000.0);
    session.set_velocity(ship, Vec3::NEG_Z * 100.0);
    run(&mut session, 1.0);
    assert_eq!(session.thruster_multiplier(unit), Some(0.0625));
}

#[test]
fn accelerating_ship_approaches_but_never_exceeds_cap() {
    let mut session = ThrustSession::with_config(
        ThrustConfig::default(),
        SpeedLimits::default(),
        SessionRole::Offline,
    );
    let ship = session.spawn_vehicle("Racer", SizeClass::Large, 200_000.0);
    session.spawn_thruster(ship, Direction::Backward, 1_000_000.0);
    session.set_direction_throttle(ship, Direction::Backward, 1.0);

    let mut speeds = Vec::new();
    for _ in 0..30 {
        run(&mut session, 1.0);
        speeds.push(session.vehicle_speed(ship).unwrap_or_default());
    }

    for pair in speeds.windows(2) {
        assert!(pair[1] >= pair[0] - 1e-3);
    }
    assert!(speeds.iter().all(|s| *s <= 100.0 + 1e-3));
    // Constant 5 m/s^2 below the falloff start, then a long tail.
    assert!((speeds[9] - 50.0).abs() < 1.0, "10s speed {}", speeds[9]);
    let early_gain = speeds[9];
    let late_gain = speeds[29] - speeds[19];
    assert!(speeds[29] > 85.0, "30s speed {}", speeds[29]);
    assert!(late_gain < early_gain / 4.0, "late gain {}", late_gain);
}

#[test]
fn directional_mode_preserves_braking_and_lateral_authority() {
    let mut session = directional_session();
    let ship = session.spawn_vehicle("Corvette", SizeClass::Large, 1000.0);
    let units: Vec<(Direction, _)> = Direction::all()
        .into_iter()
        .map(|d| (d, session.spawn_thruster(ship, d, 100.0)))
        .collect();

    // Travelling along local forward (-Z) at top speed.
    session.set_velocity(ship, Vec3::NEG_Z * 100.0);
    run(&mut session, 10.0 * DT);

    for (direction, unit) in units {
        let m = session.thruster_multiplier(unit).unwrap_or_default();
        match direction {
            // Exhaust out the back pushes forward: fully reduced.
            Direction::Backward => assert_eq!(m, 0.0625),
            _ => assert_eq!(m, 1.0, "{:?}", direction),
        }
    }
}

#[test]
fn rotated_vehicle_reduces_the_unit_that_pushes_along_travel() {
    let mut session = directional_session();
    let ship = session.spawn_vehicle("Yawed", SizeClass::Large, 1000.0);
    let left = session.spawn_thruster(ship, Direction::Left, 100.0);
    let right = session.spawn_thruster(ship, Direction::Right, 100.0);

    // Yaw 90 degrees: local +X maps to world -Z.
    session.set_orientation(ship, Quat::from_rotation_y(std::f32::consts::FRAC_PI_2));
    session.set_velocity(ship, Vec3::Z * 100.0);
    run(&mut session, 10.0 * DT);

    // Right exhaust (local +X) now points world -Z, against travel.
    let m_right = session.thruster_multiplier(right).unwrap_or_default();
    let m_left = session.thruster_multiplier(left).unwrap_or_default();
    assert!((m_right - 0.0625).abs() < 1e-3, "right {}", m_right);
    assert_eq!(m_left, 1.0);
}

#[test]
fn anchoring_mid_flight_stops_updates_and_release_resumes() {
    let mut session = ThrustSession::with_config(
        ThrustConfig::default(),
        SpeedLimits::default(),
        SessionRole::Offline,
    );
    let ship = session.spawn_vehicle("Lander", SizeClass::Small, 1000.0);
    let unit = session.spawn_thruster(ship, Direction::Down, 100.0);
    session.update(DT);
    assert_eq!(session.controller_state(unit), Some(ControllerState::Active));

    session.set_vehicle_static(ship, true);
    session.set_velocity(ship, Vec3::Y * 100.0);
    let mut applied = 0;
    for _ in 0..30 {
        applied += session.update(DT).applied;
    }
    assert_eq!(applied, 0);
    assert_eq!(session.thruster_multiplier(unit), Some(1.0));

    session.set_vehicle_static(ship, false);
    session.set_velocity(ship, Vec3::Y * 100.0);
    run(&mut session, 10.0 * DT);
    assert_eq!(session.thruster_multiplier(unit), Some(0.125));
}

#[test]
fn generated_fleet_runs_clean() {
    let mut session = ThrustSession::with_config(
        ThrustConfig::default(),
        SpeedLimits::default(),
        SessionRole::Offline,
    );
    let mut rng = StdRng::seed_from_u64(1234);
    let fleet = FleetConfig::default();
    let vehicles = spawn_fleet(&mut session, &fleet, &mut rng);
    for v in &vehicles {
        session.set_direction_throttle(*v, Direction::Backward, 1.0);
    }

    run(&mut session, 20.0);

    for v in &vehicles {
        let speed = session.vehicle_speed(*v).unwrap_or_default();
        assert!(speed > 0.0 && speed <= 100.0 + 1e-3, "speed {}", speed);
        for unit in session.thrusters_of(*v) {
            let m = session.thruster_multiplier(unit).unwrap_or_default();
            assert!((0.01..=1.0).contains(&m));
        }
    }

    for v in vehicles {
        assert!(session.remove_vehicle(v));
    }
    assert_eq!(session.subscription_count(), 0);
    assert_eq!(session.thruster_count(), 0);
}
