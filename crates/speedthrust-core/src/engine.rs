//! Thrust session - main entry point for running controllers against a host

use std::collections::HashMap;
use std::sync::Arc;

use glam::{Quat, Vec3};
use hecs::{Entity, World};
use serde::{Deserialize, Serialize};
use speedthrust_logic::config::{SizeClass, SpeedLimits, ThrustConfig};
use speedthrust_logic::constants::UPDATE_INTERVAL_TICKS;
use speedthrust_logic::direction::Direction;

use crate::components::*;
use crate::controller::{ControllerState, TickOutcome, UnitController, UpdateCadence};
use crate::host::SessionRole;
use crate::observers::StaticObservers;
use crate::store::{load_config, ConfigStore};

/// Counts of controller work done in one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickStats {
    /// Controllers that ran their first-frame setup.
    pub started: u32,
    pub applied: u32,
    pub skipped: u32,
    pub halted: u32,
}

/// One simulation session: the config, the ECS world and the scheduler.
pub struct ThrustSession {
    /// ECS world containing vehicles and thrust units
    pub world: World,
    config: Option<Arc<ThrustConfig>>,
    limits: SpeedLimits,
    role: SessionRole,
    observers: StaticObservers,
    tick: u64,
}

impl ThrustSession {
    /// Start a session, loading the config only on the authoritative side.
    pub fn start(store: &mut impl ConfigStore, limits: SpeedLimits, role: SessionRole) -> Self {
        let config = if role.is_authoritative() {
            Some(load_config(store))
        } else {
            None
        };
        log::info!(
            "Thrust session started as {:?} (config loaded: {})",
            role,
            config.is_some()
        );
        Self::build(config, limits, role)
    }

    /// Session around an already-loaded configuration.
    pub fn with_config(config: ThrustConfig, limits: SpeedLimits, role: SessionRole) -> Self {
        Self::build(Some(config), limits, role)
    }

    fn build(config: Option<ThrustConfig>, limits: SpeedLimits, role: SessionRole) -> Self {
        Self {
            world: World::new(),
            config: config.map(Arc::new),
            limits,
            role,
            observers: StaticObservers::new(),
            tick: 0,
        }
    }

    pub fn config(&self) -> Option<&ThrustConfig> {
        self.config.as_deref()
    }

    pub fn limits(&self) -> &SpeedLimits {
        &self.limits
    }

    pub fn role(&self) -> SessionRole {
        self.role
    }

    /// Frames simulated so far
    pub fn tick(&self) -> u64 {
        self.tick
    }

    // ── Spawning ────────────────────────────────────────────────────────

    /// Spawn a vehicle with a physics body at rest.
    pub fn spawn_vehicle(&mut self, name: &str, size_class: SizeClass, mass: f32) -> Entity {
        self.world
            .spawn((Vehicle::new(name, size_class), PhysicsBody::new(mass)))
    }

    /// Spawn a vehicle from explicit components.
    pub fn spawn_vehicle_with(&mut self, vehicle: Vehicle, body: Option<PhysicsBody>) -> Entity {
        match body {
            Some(body) => self.world.spawn((vehicle, body)),
            None => self.world.spawn((vehicle,)),
        }
    }

    /// Mount a thrust unit on a vehicle and initialise its controller.
    pub fn spawn_thruster(
        &mut self,
        vehicle: Entity,
        direction: Direction,
        max_thrust: f32,
    ) -> Entity {
        let unit = self.world.spawn((
            Thruster::new(vehicle, direction, max_thrust),
            ThrustController(UnitController::new()),
        ));
        let role = self.role;
        if let Ok((thruster, controller)) = self
            .world
            .query_one_mut::<(&mut Thruster, &mut ThrustController)>(unit)
        {
            controller.0.init(&ThrusterHandle::new(unit, thruster), role);
        }
        unit
    }

    // ── Host-side mutations ─────────────────────────────────────────────

    pub fn set_velocity(&mut self, vehicle: Entity, velocity: Vec3) -> bool {
        self.with_body(vehicle, |body| body.linear_velocity = velocity)
    }

    pub fn set_orientation(&mut self, vehicle: Entity, orientation: Quat) -> bool {
        self.with_body(vehicle, |body| body.orientation = orientation)
    }

    fn with_body(&mut self, vehicle: Entity, f: impl FnOnce(&mut PhysicsBody)) -> bool {
        match self.world.get::<&mut PhysicsBody>(vehicle) {
            Ok(mut body) => {
                f(&mut *body);
                true
            }
            Err(_) => false,
        }
    }

    /// Detach a vehicle's physics body (e.g. a projection with no body).
    pub fn remove_physics(&mut self, vehicle: Entity) -> bool {
        self.world.remove_one::<PhysicsBody>(vehicle).is_ok()
    }

    pub fn set_throttle(&mut self, unit: Entity, throttle: f32) -> bool {
        self.with_thruster(unit, |t| t.throttle = throttle.clamp(0.0, 1.0))
    }

    /// Set the throttle of every unit on a vehicle exhausting along `direction`.
    pub fn set_direction_throttle(&mut self, vehicle: Entity, direction: Direction, throttle: f32) {
        let throttle = throttle.clamp(0.0, 1.0);
        for (_, t) in self.world.query_mut::<&mut Thruster>() {
            if t.vehicle == vehicle && t.direction == direction {
                t.throttle = throttle;
            }
        }
    }

    pub fn set_functional(&mut self, unit: Entity, functional: bool) -> bool {
        self.with_thruster(unit, |t| t.functional = functional)
    }

    fn with_thruster(&mut self, unit: Entity, f: impl FnOnce(&mut Thruster)) -> bool {
        match self.world.get::<&mut Thruster>(unit) {
            Ok(mut thruster) => {
                f(&mut *thruster);
                true
            }
            Err(_) => false,
        }
    }

    /// Anchor or release a vehicle, notifying subscribed controllers.
    pub fn set_vehicle_static(&mut self, vehicle: Entity, is_static: bool) -> bool {
        match self.world.get::<&mut Vehicle>(vehicle) {
            Ok(mut v) => {
                if v.is_static == is_static {
                    return true;
                }
                v.is_static = is_static;
            }
            Err(_) => return false,
        }

        for unit in self.observers.subscribers(vehicle) {
            if let Ok(mut controller) = self.world.get::<&mut ThrustController>(unit) {
                controller.0.on_static_changed(is_static);
            }
        }
        true
    }

    /// Mark a vehicle as closing without removing it yet.
    pub fn mark_vehicle_closed(&mut self, vehicle: Entity) -> bool {
        match self.world.get::<&mut Vehicle>(vehicle) {
            Ok(mut v) => {
                v.closed = true;
                true
            }
            Err(_) => false,
        }
    }

    /// Mark a thrust unit as closing without removing it yet.
    pub fn mark_thruster_closed(&mut self, unit: Entity) -> bool {
        self.with_thruster(unit, |t| t.closed = true)
    }

    /// Tear down a unit's controller and remove the unit.
    pub fn remove_thruster(&mut self, unit: Entity) -> bool {
        if let Ok(mut controller) = self.world.get::<&mut ThrustController>(unit) {
            controller.0.teardown(&mut self.observers);
        }
        self.world.despawn(unit).is_ok()
    }

    /// Remove a vehicle together with every unit mounted on it.
    pub fn remove_vehicle(&mut self, vehicle: Entity) -> bool {
        for unit in self.thrusters_of(vehicle) {
            self.remove_thruster(unit);
        }
        let dropped = self.observers.clear_vehicle(vehicle);
        if dropped > 0 {
            log::warn!("Dropped {} leftover subscriptions for {:?}", dropped, vehicle);
        }
        self.world.despawn(vehicle).is_ok()
    }

    // ── Simulation ──────────────────────────────────────────────────────

    /// Advance one simulated frame of `delta_seconds`.
    pub fn update(&mut self, delta_seconds: f32) -> TickStats {
        self.tick += 1;
        let mut stats = TickStats::default();

        // Once-before-frame setup for freshly spawned units
        stats.started = self.run_first_frame();

        // Periodic evaluation every 10th frame
        if self.tick % UPDATE_INTERVAL_TICKS == 0 {
            self.run_periodic(&mut stats);
        }

        // Host physics
        integrate_motion(&mut self.world, &self.limits, delta_seconds);

        stats
    }

    fn units_with_cadence(&self, cadence: UpdateCadence) -> Vec<(Entity, Entity)> {
        self.world
            .query::<(&Thruster, &ThrustController)>()
            .iter()
            .filter(|(_, (_, c))| c.0.cadence() == cadence)
            .map(|(unit, (t, _))| (unit, t.vehicle))
            .collect()
    }

    fn run_first_frame(&mut self) -> u32 {
        let pending = self.units_with_cadence(UpdateCadence::BeforeNextFrame);
        let mut started = 0;

        for (unit, vehicle) in pending {
            let snapshot = VehicleSnapshot::capture(&self.world, vehicle);
            let config = self.config.clone();
            if let Ok((thruster, controller)) = self
                .world
                .query_one_mut::<(&mut Thruster, &mut ThrustController)>(unit)
            {
                let handle = ThrusterHandle::new(unit, thruster);
                controller
                    .0
                    .before_first_frame(&handle, &snapshot, config, &mut self.observers);
                if controller.0.state() != ControllerState::Destroyed {
                    started += 1;
                }
            }
        }

        started
    }

    fn run_periodic(&mut self, stats: &mut TickStats) {
        let due = self.units_with_cadence(UpdateCadence::Every10thFrame);
        let mut snapshots: HashMap<Entity, VehicleSnapshot> = HashMap::new();

        for (unit, vehicle) in due {
            let snapshot = *snapshots
                .entry(vehicle)
                .or_insert_with(|| VehicleSnapshot::capture(&self.world, vehicle));
            if let Ok((thruster, controller)) = self
                .world
                .query_one_mut::<(&mut Thruster, &mut ThrustController)>(unit)
            {
                let mut handle = ThrusterHandle::new(unit, thruster);
                match controller
                    .0
                    .update(&mut handle, &snapshot, &self.limits, &mut self.observers)
                {
                    TickOutcome::Applied(_) => stats.applied += 1,
                    TickOutcome::Skipped(_) => stats.skipped += 1,
                    TickOutcome::Halted => stats.halted += 1,
                    TickOutcome::Inactive => {}
                }
            }
        }
    }

    // ── Queries ─────────────────────────────────────────────────────────

    pub fn thrusters_of(&self, vehicle: Entity) -> Vec<Entity> {
        self.world
            .query::<&Thruster>()
            .iter()
            .filter(|(_, t)| t.vehicle == vehicle)
            .map(|(unit, _)| unit)
            .collect()
    }

    pub fn thruster_multiplier(&self, unit: Entity) -> Option<f32> {
        self.world
            .get::<&Thruster>(unit)
            .ok()
            .map(|t| t.thrust_multiplier)
    }

    pub fn controller_state(&self, unit: Entity) -> Option<ControllerState> {
        self.world
            .get::<&ThrustController>(unit)
            .ok()
            .map(|c| c.0.state())
    }

    pub fn vehicle_speed(&self, vehicle: Entity) -> Option<f32> {
        self.world
            .get::<&PhysicsBody>(vehicle)
            .ok()
            .map(|b| b.speed())
    }

    pub fn vehicle_count(&self) -> usize {
        self.world.query::<&Vehicle>().iter().count()
    }

    pub fn thruster_count(&self) -> usize {
        self.world.query::<&Thruster>().iter().count()
    }

    /// Controllers currently in the Active state
    pub fn active_controller_count(&self) -> usize {
        self.world
            .query::<&ThrustController>()
            .iter()
            .filter(|(_, c)| c.0.state() == ControllerState::Active)
            .count()
    }

    /// Live staticness subscriptions
    pub fn subscription_count(&self) -> usize {
        self.observers.len()
    }
}

/// Apply thruster forces to vehicle bodies and enforce the host speed cap.
fn integrate_motion(world: &mut World, limits: &SpeedLimits, delta_seconds: f32) {
    let mut forces: HashMap<Entity, Vec3> = HashMap::new();
    for (_, thruster) in world.query::<&Thruster>().iter() {
        let force = thruster.local_force();
        if force != Vec3::ZERO {
            *forces.entry(thruster.vehicle).or_insert(Vec3::ZERO) += force;
        }
    }

    for (entity, (vehicle, body)) in world.query_mut::<(&Vehicle, &mut PhysicsBody)>() {
        if vehicle.is_static {
            body.linear_velocity = Vec3::ZERO;
            continue;
        }
        if vehicle.closed {
            continue;
        }

        let local = forces.get(&entity).copied().unwrap_or(Vec3::ZERO);
        let accel = (body.orientation * local) / body.mass.max(1.0);
        let velocity = body.linear_velocity + accel * delta_seconds;
        body.linear_velocity = velocity.clamp_length_max(limits.max_speed(vehicle.size_class));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn session() -> ThrustSession {
        ThrustSession::with_config(
            ThrustConfig::default(),
            SpeedLimits::default(),
            SessionRole::Offline,
        )
    }

    fn run_frames(session: &mut ThrustSession, frames: u32) {
        for _ in 0..frames {
            session.update(1.0 / 60.0);
        }
    }

    #[test]
    fn test_session_creation() {
        let session = session();
        assert_eq!(session.tick(), 0);
        assert_eq!(session.thruster_count(), 0);
        assert!(session.config().is_some());
    }

    #[test]
    fn test_start_loads_config_when_authoritative() {
        let mut store = MemoryStore::new();
        let session = ThrustSession::start(&mut store, SpeedLimits::default(), SessionRole::Host);
        assert_eq!(session.config(), Some(&ThrustConfig::default()));
        assert!(store.exists(crate::store::CONFIG_FILE_NAME));
    }

    #[test]
    fn test_client_never_loads_or_writes() {
        let mut store = MemoryStore::new();
        let mut session =
            ThrustSession::start(&mut store, SpeedLimits::default(), SessionRole::Client);
        assert!(session.config().is_none());
        assert!(!store.exists(crate::store::CONFIG_FILE_NAME));

        let ship = session.spawn_vehicle("Client view", SizeClass::Large, 1000.0);
        let unit = session.spawn_thruster(ship, Direction::Backward, 1000.0);
        session.set_velocity(ship, Vec3::NEG_Z * 100.0);
        run_frames(&mut session, 20);

        assert_eq!(session.controller_state(unit), Some(ControllerState::Uninitialized));
        assert_eq!(session.thruster_multiplier(unit), Some(1.0));
        assert_eq!(session.subscription_count(), 0);
    }

    #[test]
    fn test_first_frame_then_every_tenth() {
        let mut session = session();
        let ship = session.spawn_vehicle("Test", SizeClass::Large, 1000.0);
        let unit = session.spawn_thruster(ship, Direction::Backward, 1000.0);
        session.set_velocity(ship, Vec3::NEG_Z * 100.0);

        let stats = session.update(1.0 / 60.0);
        assert_eq!(stats.started, 1);
        assert_eq!(session.controller_state(unit), Some(ControllerState::Active));
        assert_eq!(session.thruster_multiplier(unit), Some(1.0));

        for _ in 2..10 {
            assert_eq!(session.update(1.0 / 60.0).applied, 0);
        }
        let stats = session.update(1.0 / 60.0);
        assert_eq!(session.tick(), 10);
        assert_eq!(stats.applied, 1);
        assert_eq!(session.thruster_multiplier(unit), Some(0.0625));
    }

    #[test]
    fn test_static_vehicle_is_dormant_until_released() {
        let mut session = session();
        let ship = session.spawn_vehicle("Station", SizeClass::Large, 1000.0);
        session.set_vehicle_static(ship, true);
        let unit = session.spawn_thruster(ship, Direction::Backward, 1000.0);
        session.set_velocity(ship, Vec3::NEG_Z * 100.0);

        run_frames(&mut session, 10);
        assert_eq!(session.controller_state(unit), Some(ControllerState::Dormant));
        assert_eq!(session.thruster_multiplier(unit), Some(1.0));

        session.set_vehicle_static(ship, false);
        assert_eq!(session.controller_state(unit), Some(ControllerState::Active));
        session.set_velocity(ship, Vec3::NEG_Z * 100.0);
        run_frames(&mut session, 10);
        assert_eq!(session.thruster_multiplier(unit), Some(0.0625));
    }

    #[test]
    fn test_remove_thruster_unsubscribes() {
        let mut session = session();
        let ship = session.spawn_vehicle("Test", SizeClass::Small, 1000.0);
        let a = session.spawn_thruster(ship, Direction::Forward, 100.0);
        let b = session.spawn_thruster(ship, Direction::Backward, 100.0);
        session.update(1.0 / 60.0);
        assert_eq!(session.subscription_count(), 2);

        assert!(session.remove_thruster(a));
        assert_eq!(session.subscription_count(), 1);

        // Staticness change reaches only the remaining unit.
        session.set_vehicle_static(ship, true);
        assert_eq!(session.controller_state(b), Some(ControllerState::Dormant));
        assert_eq!(session.controller_state(a), None);
    }

    #[test]
    fn test_closed_vehicle_halts_controllers() {
        let mut session = session();
        let ship = session.spawn_vehicle("Doomed", SizeClass::Large, 1000.0);
        let unit = session.spawn_thruster(ship, Direction::Backward, 1000.0);
        session.update(1.0 / 60.0);

        session.mark_vehicle_closed(ship);
        let mut halted = 0;
        for _ in 0..10 {
            halted += session.update(1.0 / 60.0).halted;
        }
        assert_eq!(halted, 1);
        assert_eq!(session.controller_state(unit), Some(ControllerState::Destroyed));
        assert_eq!(session.subscription_count(), 0);
        assert_eq!(session.active_controller_count(), 0);
    }

    #[test]
    fn test_closed_thruster_halts_only_its_controller() {
        let mut session = session();
        let ship = session.spawn_vehicle("Test", SizeClass::Large, 1000.0);
        let doomed = session.spawn_thruster(ship, Direction::Backward, 1000.0);
        let other = session.spawn_thruster(ship, Direction::Forward, 1000.0);
        session.set_velocity(ship, Vec3::NEG_Z * 100.0);
        session.update(1.0 / 60.0);
        assert_eq!(session.subscription_count(), 2);

        assert!(session.mark_thruster_closed(doomed));
        let mut halted = 0;
        for _ in 0..9 {
            halted += session.update(1.0 / 60.0).halted;
        }
        assert_eq!(halted, 1);
        assert_eq!(session.controller_state(doomed), Some(ControllerState::Destroyed));
        assert_eq!(session.thruster_multiplier(doomed), Some(1.0));
        assert_eq!(session.controller_state(other), Some(ControllerState::Active));
        assert_eq!(session.thruster_multiplier(other), Some(0.0625));
        assert_eq!(session.subscription_count(), 1);

        // Destroyed controllers are no longer scheduled.
        for _ in 0..10 {
            assert_eq!(session.update(1.0 / 60.0).halted, 0);
        }
        assert!(!session.mark_thruster_closed(ship));
    }

    #[test]
    fn test_anchored_vehicle_spawns_dormant() {
        let mut session = session();
        let ship = session.spawn_vehicle_with(
            Vehicle::new("Dock", SizeClass::Large).anchored(),
            Some(PhysicsBody::new(1000.0)),
        );
        let unit = session.spawn_thruster(ship, Direction::Up, 100.0);
        session.set_velocity(ship, Vec3::Y * 100.0);
        session.update(1.0 / 60.0);
        assert_eq!(session.controller_state(unit), Some(ControllerState::Dormant));
        assert_eq!(session.subscription_count(), 1);
        assert_eq!(session.vehicle_speed(ship), Some(0.0));
    }

    #[test]
    fn test_vehicle_without_physics_never_starts() {
        let mut session = session();
        let ship = session.spawn_vehicle_with(Vehicle::new("Projection", SizeClass::Large), None);
        let unit = session.spawn_thruster(ship, Direction::Up, 10.0);
        session.update(1.0 / 60.0);
        assert_eq!(session.controller_state(unit), Some(ControllerState::Destroyed));
    }

    #[test]
    fn test_broken_thruster_keeps_last_multiplier() {
        let mut session = session();
        let ship = session.spawn_vehicle("Test", SizeClass::Large, 1000.0);
        let unit = session.spawn_thruster(ship, Direction::Backward, 1000.0);
        session.set_velocity(ship, Vec3::NEG_Z * 100.0);
        run_frames(&mut session, 10);
        assert_eq!(session.thruster_multiplier(unit), Some(0.0625));

        session.set_functional(unit, false);
        session.set_velocity(ship, Vec3::ZERO);
        let mut skipped = 0;
        for _ in 0..10 {
            skipped += session.update(1.0 / 60.0).skipped;
        }
        assert_eq!(skipped, 1);
        assert_eq!(session.thruster_multiplier(unit), Some(0.0625));
    }

    #[test]
    fn test_remove_vehicle_removes_units() {
        let mut session = session();
        let ship = session.spawn_vehicle("Test", SizeClass::Large, 1000.0);
        for d in Direction::all() {
            session.spawn_thruster(ship, d, 100.0);
        }
        session.update(1.0 / 60.0);
        assert_eq!(session.subscription_count(), 6);

        assert!(session.remove_vehicle(ship));
        assert_eq!(session.thruster_count(), 0);
        assert_eq!(session.vehicle_count(), 0);
        assert_eq!(session.subscription_count(), 0);
    }

    #[test]
    fn test_speed_never_exceeds_cap() {
        let mut session = session();
        let ship = session.spawn_vehicle("Racer", SizeClass::Small, 1000.0);
        let unit = session.spawn_thruster(ship, Direction::Backward, 50_000.0);
        session.set_throttle(unit, 1.0);

        for _ in 0..600 {
            session.update(1.0 / 60.0);
            let speed = session.vehicle_speed(ship).unwrap_or_default();
            assert!(speed <= 100.0 + 1e-3, "speed {}", speed);
        }
        assert!(session.thruster_multiplier(unit).unwrap_or(1.0) < 0.2);
    }
}
