//! Host seams - what a controller reads from and writes to.
//!
//! The controller never owns vehicles or thrust units. It sees them through
//! these traits so the same state machine runs against the in-process
//! reference host in [`crate::engine`] or any other simulation that can
//! answer the same questions.

use glam::{Quat, Vec3};
use hecs::Entity;
use speedthrust_logic::config::SizeClass;

/// Read-only view of a vehicle and its physics body.
pub trait VehicleView {
    fn id(&self) -> Entity;
    /// False once the vehicle is closed or marked for close.
    fn is_valid(&self) -> bool;
    fn has_physics(&self) -> bool;
    fn is_static(&self) -> bool;
    fn size_class(&self) -> SizeClass;
    fn speed(&self) -> f32;
    fn linear_velocity(&self) -> Vec3;
    fn orientation(&self) -> Quat;
}

/// A thrust unit whose output multiplier the controller drives.
pub trait ThrustUnit {
    fn id(&self) -> Entity;
    fn owning_vehicle(&self) -> Entity;
    fn is_valid(&self) -> bool;
    /// Functional and enabled.
    fn is_working(&self) -> bool;
    /// Exhaust axis in the vehicle's local frame.
    fn local_forward_axis(&self) -> Vec3;
    fn set_thrust_multiplier(&mut self, multiplier: f32);
}

/// Handle returned by a staticness subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Source of "vehicle became static / dynamic" notifications.
///
/// Every `subscribe` must be paired with an `unsubscribe` before the
/// subscriber goes away.
pub trait StaticChangeSource {
    fn subscribe(&mut self, vehicle: Entity, subscriber: Entity) -> SubscriptionId;
    /// Returns false if the subscription was already gone.
    fn unsubscribe(&mut self, id: SubscriptionId) -> bool;
}

/// Which side of a session this process is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionRole {
    /// Single-participant session.
    Offline,
    /// Authoritative side of a multi-participant session.
    Host,
    /// Non-authoritative participant; never adjusts thrust.
    Client,
}

impl SessionRole {
    pub fn is_authoritative(&self) -> bool {
        !matches!(self, SessionRole::Client)
    }
}
