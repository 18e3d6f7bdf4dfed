//! Fleet generation - procedural vehicles with a full thruster complement

use std::f32::consts::TAU;

use glam::{EulerRot, Quat};
use hecs::Entity;
use rand::Rng;
use serde::{Deserialize, Serialize};
use speedthrust_logic::config::SizeClass;
use speedthrust_logic::direction::Direction;

use crate::components::{PhysicsBody, Vehicle};
use crate::engine::ThrustSession;

/// Configuration for fleet generation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FleetConfig {
    pub large_vehicles: u32,
    pub small_vehicles: u32,
    /// Units mounted on each of the six base directions
    pub thrusters_per_direction: u32,
    pub large_mass: f32,
    pub small_mass: f32,
    /// Per-unit thrust (newtons)
    pub large_max_thrust: f32,
    pub small_max_thrust: f32,
    /// Give each vehicle a random starting orientation
    pub randomize_orientation: bool,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            large_vehicles: 2,
            small_vehicles: 3,
            thrusters_per_direction: 2,
            large_mass: 200_000.0,
            small_mass: 10_000.0,
            large_max_thrust: 1_000_000.0,
            small_max_thrust: 50_000.0,
            randomize_orientation: true,
        }
    }
}

impl FleetConfig {
    pub fn total_vehicles(&self) -> u32 {
        self.large_vehicles + self.small_vehicles
    }

    pub fn total_thrusters(&self) -> u32 {
        self.total_vehicles() * self.thrusters_per_direction * Direction::all().len() as u32
    }
}

/// Spawn a fleet into the session, returning the vehicle entities.
pub fn spawn_fleet(
    session: &mut ThrustSession,
    config: &FleetConfig,
    rng: &mut impl Rng,
) -> Vec<Entity> {
    let mut vehicles = Vec::with_capacity(config.total_vehicles() as usize);

    let classes = std::iter::repeat(SizeClass::Large)
        .take(config.large_vehicles as usize)
        .chain(std::iter::repeat(SizeClass::Small).take(config.small_vehicles as usize));

    for (i, class) in classes.enumerate() {
        let (mass, max_thrust, prefix) = match class {
            SizeClass::Large => (config.large_mass, config.large_max_thrust, "LG"),
            SizeClass::Small => (config.small_mass, config.small_max_thrust, "SG"),
        };

        let orientation = if config.randomize_orientation {
            random_orientation(rng)
        } else {
            Quat::IDENTITY
        };

        let vehicle = session.spawn_vehicle_with(
            Vehicle::new(format!("{}-{:03}", prefix, i + 1), class),
            Some(PhysicsBody::new(mass).with_orientation(orientation)),
        );

        for direction in Direction::all() {
            for _ in 0..config.thrusters_per_direction {
                session.spawn_thruster(vehicle, direction, max_thrust);
            }
        }

        vehicles.push(vehicle);
    }

    log::info!(
        "Spawned fleet: {} vehicles, {} thrusters",
        vehicles.len(),
        session.thruster_count()
    );
    vehicles
}

fn random_orientation(rng: &mut impl Rng) -> Quat {
    Quat::from_euler(
        EulerRot::YXZ,
        rng.gen_range(0.0..TAU),
        rng.gen_range(-0.5..0.5),
        rng.gen_range(0.0..TAU),
    )
}
