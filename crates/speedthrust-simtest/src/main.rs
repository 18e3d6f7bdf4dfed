//! SpeedThrust Headless Harness
//!
//! Validates the falloff curve, the thrust policy, config loading and a full
//! fleet session. Runs entirely in-process, no rendering and no files.
//!
//! Usage:
//!   cargo run -p speedthrust-simtest
//!   cargo run -p speedthrust-simtest -- --verbose
//!   cargo run -p speedthrust-simtest -- --seed 7
//!
//! Set `RUST_LOG=debug` for controller logs, `LOG_FORMAT=json` for JSON lines.

use glam::{Quat, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use speedthrust_core::controller::ControllerState;
use speedthrust_core::engine::ThrustSession;
use speedthrust_core::generation::{spawn_fleet, FleetConfig};
use speedthrust_core::host::SessionRole;
use speedthrust_core::store::{
    archive_name, load_config, ConfigStore, MemoryStore, CONFIG_FILE_NAME,
};
use speedthrust_logic::config::{validate_config, SizeClass, SpeedLimits, ThrustConfig};
use speedthrust_logic::constants::{MAX_THRUST_MULTIPLIER, MIN_THRUST_MULTIPLIER};
use speedthrust_logic::direction::Direction;
use speedthrust_logic::falloff::reduction;
use speedthrust_logic::policy::{thrust_multiplier, MotionSample};

const DT: f32 = 1.0 / 60.0;

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }
}

fn parse_seed() -> u64 {
    let args: Vec<String> = std::env::args().collect();
    args.iter()
        .position(|a| a == "--seed")
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
        .unwrap_or(42)
}

fn main() {
    init_tracing();
    let verbose = std::env::args().any(|a| a == "--verbose");
    let seed = parse_seed();
    println!("=== SpeedThrust Harness (seed {}) ===\n", seed);

    let mut results = Vec::new();

    // 1. Falloff curve shape
    results.extend(validate_curve(verbose));

    // 2. Policy sweep over random motion
    results.extend(validate_policy(seed, verbose));

    // 3. Config store behaviour
    results.extend(validate_config_store(verbose));

    // 4. Controller lifecycle
    results.extend(validate_lifecycle(verbose));

    // 5. Full fleet run
    results.extend(validate_fleet_run(seed, verbose));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

// ── 1. Falloff Curve ────────────────────────────────────────────────────

fn validate_curve(verbose: bool) -> Vec<TestResult> {
    println!("--- Falloff Curve ---");
    let mut results = Vec::new();
    let config = ThrustConfig::default();

    for class in [SizeClass::Large, SizeClass::Small] {
        let params = config.falloff(class);
        let samples: Vec<f32> = (0..=100).map(|i| params.reduction_at(i as f32 / 100.0)).collect();

        let flat = samples
            .iter()
            .enumerate()
            .filter(|(i, _)| (*i as f32 / 100.0) < params.start)
            .all(|(_, r)| *r == 0.0);
        results.push(TestResult {
            name: format!("curve_{}_flat_below_start", class.name()),
            passed: flat,
            detail: format!("no reduction below {:.2}", params.start),
        });

        let monotonic = samples.windows(2).all(|w| w[1] >= w[0]);
        results.push(TestResult {
            name: format!("curve_{}_monotonic", class.name()),
            passed: monotonic,
            detail: "reduction never decreases with speed".into(),
        });

        let top = samples[100];
        let expected = 1.0 - params.thrust_min;
        results.push(TestResult {
            name: format!("curve_{}_floor_at_max", class.name()),
            passed: (top - expected).abs() < 1e-6,
            detail: format!("reduction at max {:.4} (expected {:.4})", top, expected),
        });

        if verbose {
            for ratio in [0.5, 0.7, 0.8, 0.9, 0.95, 1.0] {
                println!(
                    "  {} ratio {:.2} -> multiplier {:.4}",
                    class.name(),
                    ratio,
                    1.0 - params.reduction_at(ratio)
                );
            }
        }
    }

    let overshoot = reduction(1.5, 0.6, 0.0625);
    results.push(TestResult {
        name: "curve_overshoot_clamped".into(),
        passed: (overshoot - 0.9375).abs() < 1e-6,
        detail: format!("ratio 1.5 -> {:.4}", overshoot),
    });

    let nan = reduction(f32::NAN, 0.6, 0.0625);
    results.push(TestResult {
        name: "curve_nan_is_zero".into(),
        passed: nan == 0.0,
        detail: format!("NaN ratio -> {}", nan),
    });

    results
}

// ── 2. Thrust Policy ────────────────────────────────────────────────────

fn random_motion(rng: &mut StdRng) -> MotionSample {
    let class = if rng.gen_bool(0.5) { SizeClass::Large } else { SizeClass::Small };
    let direction = Vec3::new(
        rng.gen_range(-1.0..1.0),
        rng.gen_range(-1.0..1.0),
        rng.gen_range(-1.0..1.0),
    );
    let speed = rng.gen_range(0.0..120.0);
    let orientation = Quat::from_euler(
        glam::EulerRot::YXZ,
        rng.gen_range(-3.0..3.0),
        rng.gen_range(-1.5..1.5),
        rng.gen_range(-3.0..3.0),
    );
    MotionSample::from_velocity(class, direction.normalize_or_zero() * speed, orientation)
}

fn validate_policy(seed: u64, verbose: bool) -> Vec<TestResult> {
    println!("--- Thrust Policy ---");
    let mut results = Vec::new();
    let limits = SpeedLimits::default();
    let uniform = ThrustConfig::default();
    let directional = ThrustConfig {
        reduce_all_thrusters: false,
        ..uniform
    };

    let mut rng = StdRng::seed_from_u64(seed);
    let mut out_of_range = 0;
    let mut directional_weaker = 0;
    let mut aligned_reduced = 0;
    const SAMPLES: usize = 5000;

    for _ in 0..SAMPLES {
        let motion = random_motion(&mut rng);
        for direction in Direction::all() {
            let axis = direction.vector();
            let u = thrust_multiplier(axis, &motion, &uniform, &limits);
            let d = thrust_multiplier(axis, &motion, &directional, &limits);

            if !(MIN_THRUST_MULTIPLIER..=MAX_THRUST_MULTIPLIER).contains(&u)
                || !(MIN_THRUST_MULTIPLIER..=MAX_THRUST_MULTIPLIER).contains(&d)
            {
                out_of_range += 1;
            }
            if d < u - 1e-6 {
                directional_weaker += 1;
            }

            // Exhaust pointing with travel pushes against it: never reduced.
            let world_axis = motion.orientation * axis;
            if world_axis.dot(motion.linear_velocity) > 0.0 && d < MAX_THRUST_MULTIPLIER {
                aligned_reduced += 1;
            }
        }
    }

    results.push(TestResult {
        name: "policy_multiplier_in_range".into(),
        passed: out_of_range == 0,
        detail: format!("{} of {} outside [0.01, 1]", out_of_range, SAMPLES * 6),
    });
    results.push(TestResult {
        name: "policy_directional_never_stricter".into(),
        passed: directional_weaker == 0,
        detail: format!("{} samples reduced more than uniform mode", directional_weaker),
    });
    results.push(TestResult {
        name: "policy_braking_units_untouched".into(),
        passed: aligned_reduced == 0,
        detail: format!("{} braking samples reduced", aligned_reduced),
    });

    let top = MotionSample::from_velocity(SizeClass::Large, Vec3::NEG_Z * 100.0, Quat::IDENTITY);
    let main = thrust_multiplier(Direction::Backward.vector(), &top, &directional, &limits);
    let lateral = thrust_multiplier(Direction::Left.vector(), &top, &directional, &limits);
    if verbose {
        println!("  top speed: main {:.4}, lateral {:.4}", main, lateral);
    }
    results.push(TestResult {
        name: "policy_main_engine_at_floor".into(),
        passed: main == 0.0625 && lateral == 1.0,
        detail: format!("main {:.4}, lateral {:.4}", main, lateral),
    });

    results
}

// ── 3. Config Store ─────────────────────────────────────────────────────

fn validate_config_store(verbose: bool) -> Vec<TestResult> {
    println!("--- Config Store ---");
    let mut results = Vec::new();

    // Missing file writes defaults
    let mut store = MemoryStore::new();
    let config = load_config(&mut store);
    results.push(TestResult {
        name: "config_defaults_written".into(),
        passed: config == ThrustConfig::default() && store.exists(CONFIG_FILE_NAME),
        detail: "defaults returned and persisted".into(),
    });

    // Written file uses camelCase keys
    let keys: Vec<String> = store
        .get(CONFIG_FILE_NAME)
        .and_then(|text| serde_json::from_str::<serde_json::Value>(text).ok())
        .and_then(|v| v.as_object().map(|o| o.keys().cloned().collect()))
        .unwrap_or_default();
    if verbose {
        println!("  stored keys: {:?}", keys);
    }
    let expected = [
        "largeFalloffStart",
        "largeThrustMin",
        "smallFalloffStart",
        "smallThrustMin",
        "reduceAllThrusters",
    ];
    results.push(TestResult {
        name: "config_camel_case_keys".into(),
        passed: keys.len() == expected.len()
            && expected.iter().all(|k| keys.iter().any(|s| s == k)),
        detail: format!("{} keys", keys.len()),
    });

    // Legacy keys are dropped on re-save
    let mut store = MemoryStore::new();
    store.insert(
        CONFIG_FILE_NAME,
        r#"{ "largeFalloffStart": 0.5, "debugCurveOverlay": true }"#,
    );
    let config = load_config(&mut store);
    let resaved = store.get(CONFIG_FILE_NAME).unwrap_or_default();
    results.push(TestResult {
        name: "config_legacy_keys_dropped".into(),
        passed: config.large_falloff_start == 0.5 && !resaved.contains("debugCurveOverlay"),
        detail: format!("large start {:.2}", config.large_falloff_start),
    });

    // Out-of-range value archives the file
    let mut store = MemoryStore::new();
    let bad = r#"{ "smallThrustMin": -0.5, "largeFalloffStart": 2.0 }"#;
    store.insert(CONFIG_FILE_NAME, bad);
    let errors = serde_json::from_str::<ThrustConfig>(bad)
        .map(|c| validate_config(&c).len())
        .unwrap_or_default();
    let config = load_config(&mut store);
    let archived = store.get(&archive_name(CONFIG_FILE_NAME)) == Some(bad);
    results.push(TestResult {
        name: "config_invalid_archived".into(),
        passed: errors == 2 && archived && config == ThrustConfig::default(),
        detail: format!("{} validation errors, archived: {}", errors, archived),
    });

    // Malformed JSON archives the file
    let mut store = MemoryStore::new();
    store.insert(CONFIG_FILE_NAME, "{ not json");
    let config = load_config(&mut store);
    results.push(TestResult {
        name: "config_malformed_archived".into(),
        passed: config == ThrustConfig::default() && store.exists(&archive_name(CONFIG_FILE_NAME)),
        detail: "falls back to defaults".into(),
    });

    results
}

// ── 4. Controller Lifecycle ─────────────────────────────────────────────

fn validate_lifecycle(_verbose: bool) -> Vec<TestResult> {
    println!("--- Controller Lifecycle ---");
    let mut results = Vec::new();

    // Client sessions leave everything untouched
    let mut store = MemoryStore::new();
    let mut client = ThrustSession::start(&mut store, SpeedLimits::default(), SessionRole::Client);
    let ship = client.spawn_vehicle("Remote", SizeClass::Large, 1000.0);
    let unit = client.spawn_thruster(ship, Direction::Backward, 1000.0);
    client.set_velocity(ship, Vec3::NEG_Z * 100.0);
    for _ in 0..30 {
        client.update(DT);
    }
    results.push(TestResult {
        name: "lifecycle_client_inert".into(),
        passed: !store.exists(CONFIG_FILE_NAME)
            && client.controller_state(unit) == Some(ControllerState::Uninitialized)
            && client.thruster_multiplier(unit) == Some(1.0),
        detail: "no config load, no multiplier writes".into(),
    });

    // Static vehicles stay dormant
    let mut session = ThrustSession::with_config(
        ThrustConfig::default(),
        SpeedLimits::default(),
        SessionRole::Host,
    );
    let station = session.spawn_vehicle("Station", SizeClass::Large, 1_000_000.0);
    session.set_vehicle_static(station, true);
    let unit = session.spawn_thruster(station, Direction::Up, 1000.0);
    let mut applied = 0;
    for _ in 0..30 {
        applied += session.update(DT).applied;
    }
    results.push(TestResult {
        name: "lifecycle_static_dormant".into(),
        passed: applied == 0 && session.controller_state(unit) == Some(ControllerState::Dormant),
        detail: format!("{} periodic updates on a static vehicle", applied),
    });

    // Release wakes it
    session.set_vehicle_static(station, false);
    results.push(TestResult {
        name: "lifecycle_release_wakes".into(),
        passed: session.controller_state(unit) == Some(ControllerState::Active),
        detail: format!("{:?}", session.controller_state(unit)),
    });

    // Removal leaves no subscriptions behind
    session.remove_vehicle(station);
    results.push(TestResult {
        name: "lifecycle_teardown_unsubscribes".into(),
        passed: session.subscription_count() == 0,
        detail: format!("{} subscriptions left", session.subscription_count()),
    });

    results
}

// ── 5. Fleet Run ────────────────────────────────────────────────────────

fn validate_fleet_run(seed: u64, verbose: bool) -> Vec<TestResult> {
    println!("--- Fleet Run ---");
    let mut results = Vec::new();

    let mut store = MemoryStore::new();
    let mut session = ThrustSession::start(&mut store, SpeedLimits::default(), SessionRole::Host);
    let mut rng = StdRng::seed_from_u64(seed);
    let fleet = FleetConfig::default();
    let vehicles = spawn_fleet(&mut session, &fleet, &mut rng);
    for v in &vehicles {
        session.set_direction_throttle(*v, Direction::Backward, 1.0);
    }

    let mut over_cap = 0;
    let mut peak: f32 = 0.0;
    for frame in 1..=3600 {
        session.update(DT);
        for v in &vehicles {
            let speed = session.vehicle_speed(*v).unwrap_or_default();
            peak = peak.max(speed);
            if speed > 100.0 + 1e-3 {
                over_cap += 1;
            }
        }
        if verbose && frame % 600 == 0 {
            let avg = vehicles
                .iter()
                .filter_map(|v| session.vehicle_speed(*v))
                .sum::<f32>()
                / vehicles.len().max(1) as f32;
            println!("  t={:>3}s avg speed {:.2}", frame / 60, avg);
        }
    }

    results.push(TestResult {
        name: "fleet_never_exceeds_cap".into(),
        passed: over_cap == 0,
        detail: format!("peak {:.3} m/s, {} samples over cap", peak, over_cap),
    });

    let all_active = session.active_controller_count() as u32 == fleet.total_thrusters();
    results.push(TestResult {
        name: "fleet_controllers_active".into(),
        passed: all_active,
        detail: format!(
            "{}/{} active",
            session.active_controller_count(),
            fleet.total_thrusters()
        ),
    });

    let floor_hits = vehicles
        .iter()
        .flat_map(|v| session.thrusters_of(*v))
        .filter_map(|u| session.thruster_multiplier(u))
        .filter(|m| *m < 0.25)
        .count();
    results.push(TestResult {
        name: "fleet_multipliers_near_floor".into(),
        passed: floor_hits == session.thruster_count(),
        detail: format!("{}/{} units below 0.25", floor_hits, session.thruster_count()),
    });

    results
}
