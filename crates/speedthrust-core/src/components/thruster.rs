//! Thrust unit components.

use glam::Vec3;
use hecs::Entity;
use speedthrust_logic::constants::MAX_THRUST_MULTIPLIER;
use speedthrust_logic::direction::Direction;

use crate::controller::UnitController;
use crate::host::ThrustUnit;

/// Thruster component - a thrust unit mounted on a vehicle
#[derive(Debug, Clone)]
pub struct Thruster {
    pub vehicle: Entity,
    /// Exhaust direction in the vehicle's local frame.
    pub direction: Direction,
    /// Force at full throttle and multiplier (newtons)
    pub max_thrust: f32,
    /// Pilot throttle 0-1
    pub throttle: f32,
    pub functional: bool,
    pub closed: bool,
    /// Output multiplier written by the controller, 0.01-1
    pub thrust_multiplier: f32,
}

impl Thruster {
    pub fn new(vehicle: Entity, direction: Direction, max_thrust: f32) -> Self {
        Self {
            vehicle,
            direction,
            max_thrust,
            throttle: 0.0,
            functional: true,
            closed: false,
            thrust_multiplier: MAX_THRUST_MULTIPLIER,
        }
    }

    pub fn is_working(&self) -> bool {
        self.functional && !self.closed
    }

    /// Force this unit applies to its vehicle, in the vehicle's local frame.
    ///
    /// Exhaust leaves along `direction`, so the push is the opposite way.
    pub fn local_force(&self) -> Vec3 {
        if !self.is_working() {
            return Vec3::ZERO;
        }
        -self.direction.vector() * self.max_thrust * self.throttle * self.thrust_multiplier
    }
}

/// Controller component attached alongside a [`Thruster`]
#[derive(Debug, Default)]
pub struct ThrustController(pub UnitController);

/// Mutable [`ThrustUnit`] view over a thruster entity.
pub struct ThrusterHandle<'a> {
    id: Entity,
    thruster: &'a mut Thruster,
}

impl<'a> ThrusterHandle<'a> {
    pub fn new(id: Entity, thruster: &'a mut Thruster) -> Self {
        Self { id, thruster }
    }
}

impl ThrustUnit for ThrusterHandle<'_> {
    fn id(&self) -> Entity {
        self.id
    }

    fn owning_vehicle(&self) -> Entity {
        self.thruster.vehicle
    }

    fn is_valid(&self) -> bool {
        !self.thruster.closed
    }

    fn is_working(&self) -> bool {
        self.thruster.is_working()
    }

    fn local_forward_axis(&self) -> Vec3 {
        self.thruster.direction.vector()
    }

    fn set_thrust_multiplier(&mut self, multiplier: f32) {
        self.thruster.thrust_multiplier = multiplier;
    }
}
