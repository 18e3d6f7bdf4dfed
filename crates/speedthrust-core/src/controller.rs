//! Per-thruster controller state machine.
//!
//! ```text
//! Uninitialized -> Initializing -> Active <-> Dormant
//! Initializing | Active | Dormant -> Destroyed
//! ```
//!
//! The controller asks the scheduler for a cadence rather than running
//! itself: `BeforeNextFrame` once after `init`, then `Every10thFrame` while
//! Active and nothing while Dormant or Destroyed. A stale unit or vehicle
//! reference halts the controller silently; nothing here is fatal to the
//! host.

use std::sync::Arc;

use glam::Vec3;
use hecs::Entity;
use speedthrust_logic::config::{SpeedLimits, ThrustConfig};
use speedthrust_logic::policy::{thrust_multiplier, MotionSample};

use crate::host::{SessionRole, StaticChangeSource, SubscriptionId, ThrustUnit, VehicleView};

/// Lifecycle state of a [`UnitController`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControllerState {
    Uninitialized,
    /// Axis and vehicle captured, waiting for the first frame.
    Initializing,
    /// Subscribed and evaluated periodically.
    Active,
    /// Vehicle is static; subscribed but not evaluated.
    Dormant,
    Destroyed,
}

/// How often the controller wants the scheduler to call it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateCadence {
    None,
    BeforeNextFrame,
    Every10thFrame,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NotWorking,
    NoPhysics,
}

/// Result of one periodic evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// Multiplier written to the unit.
    Applied(f32),
    /// Nothing written this tick; the controller stays Active.
    Skipped(SkipReason),
    /// Controller was not Active.
    Inactive,
    /// A stale reference was found; the controller is now Destroyed.
    Halted,
}

/// Drives one thrust unit's multiplier from its vehicle's speed.
#[derive(Debug)]
pub struct UnitController {
    state: ControllerState,
    cadence: UpdateCadence,
    config: Option<Arc<ThrustConfig>>,
    unit: Option<Entity>,
    vehicle: Option<Entity>,
    local_axis: Vec3,
    subscription: Option<SubscriptionId>,
}

impl Default for UnitController {
    fn default() -> Self {
        Self::new()
    }
}

impl UnitController {
    pub fn new() -> Self {
        Self {
            state: ControllerState::Uninitialized,
            cadence: UpdateCadence::None,
            config: None,
            unit: None,
            vehicle: None,
            local_axis: Vec3::ZERO,
            subscription: None,
        }
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn cadence(&self) -> UpdateCadence {
        self.cadence
    }

    /// Vehicle captured at `init`, until teardown.
    pub fn vehicle(&self) -> Option<Entity> {
        self.vehicle
    }

    pub fn local_axis(&self) -> Vec3 {
        self.local_axis
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    /// Capture the unit's axis and vehicle when it enters the simulation.
    ///
    /// Non-authoritative participants stay Uninitialized with no cadence.
    pub fn init(&mut self, unit: &impl ThrustUnit, role: SessionRole) {
        if self.state != ControllerState::Uninitialized {
            return;
        }
        if !role.is_authoritative() {
            self.cadence = UpdateCadence::None;
            return;
        }

        self.unit = Some(unit.id());
        self.vehicle = Some(unit.owning_vehicle());
        self.local_axis = unit.local_forward_axis();
        self.state = ControllerState::Initializing;
        self.cadence = UpdateCadence::BeforeNextFrame;
    }

    /// One-shot setup on the first frame after `init`.
    pub fn before_first_frame(
        &mut self,
        unit: &impl ThrustUnit,
        vehicle: &impl VehicleView,
        config: Option<Arc<ThrustConfig>>,
        source: &mut impl StaticChangeSource,
    ) {
        if self.state != ControllerState::Initializing {
            return;
        }
        if !unit.is_valid() || !vehicle.is_valid() || !vehicle.has_physics() {
            self.halt(source, "unit or vehicle unavailable at first frame");
            return;
        }
        let Some(config) = config else {
            self.halt(source, "no session configuration");
            return;
        };

        self.config = Some(config);
        self.subscription = Some(source.subscribe(vehicle.id(), unit.id()));
        self.apply_static(vehicle.is_static());
    }

    /// Vehicle staticness notification.
    pub fn on_static_changed(&mut self, is_static: bool) {
        if matches!(self.state, ControllerState::Active | ControllerState::Dormant) {
            self.apply_static(is_static);
        }
    }

    fn apply_static(&mut self, is_static: bool) {
        if is_static {
            self.state = ControllerState::Dormant;
            self.cadence = UpdateCadence::None;
        } else {
            self.state = ControllerState::Active;
            self.cadence = UpdateCadence::Every10thFrame;
        }
    }

    /// Periodic evaluation: compute and write the unit's multiplier.
    pub fn update(
        &mut self,
        unit: &mut impl ThrustUnit,
        vehicle: &impl VehicleView,
        limits: &SpeedLimits,
        source: &mut impl StaticChangeSource,
    ) -> TickOutcome {
        if self.state != ControllerState::Active {
            return TickOutcome::Inactive;
        }
        if !unit.is_valid() || !vehicle.is_valid() {
            self.halt(source, "stale unit or vehicle reference");
            return TickOutcome::Halted;
        }
        if !unit.is_working() {
            return TickOutcome::Skipped(SkipReason::NotWorking);
        }
        if !vehicle.has_physics() {
            return TickOutcome::Skipped(SkipReason::NoPhysics);
        }
        let Some(config) = self.config.clone() else {
            self.halt(source, "configuration released");
            return TickOutcome::Halted;
        };

        let motion = MotionSample {
            size_class: vehicle.size_class(),
            speed: vehicle.speed(),
            linear_velocity: vehicle.linear_velocity(),
            orientation: vehicle.orientation(),
        };
        let multiplier = thrust_multiplier(self.local_axis, &motion, &config, limits);
        unit.set_thrust_multiplier(multiplier);
        TickOutcome::Applied(multiplier)
    }

    /// Unsubscribe and release every reference. Safe to call twice.
    pub fn teardown(&mut self, source: &mut impl StaticChangeSource) {
        if let Some(id) = self.subscription.take() {
            source.unsubscribe(id);
        }
        self.config = None;
        self.unit = None;
        self.vehicle = None;
        self.state = ControllerState::Destroyed;
        self.cadence = UpdateCadence::None;
    }

    fn halt(&mut self, source: &mut impl StaticChangeSource, reason: &str) {
        log::debug!("Thrust controller {:?} halted: {}", self.unit, reason);
        self.teardown(source);
    }
}
