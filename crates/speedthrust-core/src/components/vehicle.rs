//! Vehicle components and the read-only view controllers see.

use glam::{Quat, Vec3};
use hecs::{Entity, World};
use serde::{Deserialize, Serialize};
use speedthrust_logic::config::SizeClass;

use crate::host::VehicleView;

/// Vehicle component - a grid that owns thrust units
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    pub name: String,
    pub size_class: SizeClass,
    /// Anchored vehicles do not move and their thrusters go dormant.
    pub is_static: bool,
    /// Closed or marked for close; references to it are stale.
    pub closed: bool,
}

impl Vehicle {
    pub fn new(name: impl Into<String>, size_class: SizeClass) -> Self {
        Self {
            name: name.into(),
            size_class,
            is_static: false,
            closed: false,
        }
    }

    pub fn anchored(mut self) -> Self {
        self.is_static = true;
        self
    }
}

/// Physics body attached to a vehicle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicsBody {
    /// World-space velocity (m/s)
    pub linear_velocity: Vec3,
    pub orientation: Quat,
    /// Mass in kilograms
    pub mass: f32,
}

impl PhysicsBody {
    pub fn new(mass: f32) -> Self {
        Self {
            linear_velocity: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            mass,
        }
    }

    pub fn with_orientation(mut self, orientation: Quat) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.linear_velocity = velocity;
        self
    }

    pub fn speed(&self) -> f32 {
        self.linear_velocity.length()
    }
}

/// Copy of a vehicle's state taken at the start of a controller pass.
///
/// A vehicle that no longer exists in the world captures as invalid.
#[derive(Debug, Clone, Copy)]
pub struct VehicleSnapshot {
    pub id: Entity,
    pub valid: bool,
    pub is_static: bool,
    pub size_class: SizeClass,
    pub body: Option<PhysicsBody>,
}

impl VehicleSnapshot {
    pub fn capture(world: &World, id: Entity) -> Self {
        let body = world.get::<&PhysicsBody>(id).ok().map(|b| *b);
        match world.get::<&Vehicle>(id) {
            Ok(vehicle) => Self {
                id,
                valid: !vehicle.closed,
                is_static: vehicle.is_static,
                size_class: vehicle.size_class,
                body,
            },
            Err(_) => Self {
                id,
                valid: false,
                is_static: false,
                size_class: SizeClass::Large,
                body: None,
            },
        }
    }
}

impl VehicleView for VehicleSnapshot {
    fn id(&self) -> Entity {
        self.id
    }

    fn is_valid(&self) -> bool {
        self.valid
    }

    fn has_physics(&self) -> bool {
        self.body.is_some()
    }

    fn is_static(&self) -> bool {
        self.is_static
    }

    fn size_class(&self) -> SizeClass {
        self.size_class
    }

    fn speed(&self) -> f32 {
        self.body.map_or(0.0, |b| b.speed())
    }

    fn linear_velocity(&self) -> Vec3 {
        self.body.map_or(Vec3::ZERO, |b| b.linear_velocity)
    }

    fn orientation(&self) -> Quat {
        self.body.map_or(Quat::IDENTITY, |b| b.orientation)
    }
}
