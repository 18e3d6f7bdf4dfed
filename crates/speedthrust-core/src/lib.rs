//! SpeedThrust Core - speed-relative thrust session runtime
//!
//! Every thrust unit gets a [`controller::UnitController`] that, every tenth
//! simulated frame, reads its vehicle's speed and writes a thrust multiplier
//! computed by `speedthrust_logic`. Vehicles therefore approach their
//! size-class top speed asymptotically while low-speed maneuvering thrust is
//! left alone.
//!
//! # Architecture
//!
//! - **Host seams** ([`host`]): traits the controller reads vehicles and
//!   writes thrust units through, plus the staticness subscription seam
//! - **Controller** ([`controller`]): per-unit lifecycle state machine
//! - **Store** ([`store`]): load-once configuration with archive-and-default
//!   recovery
//! - **Session** ([`engine`]): an in-process host on a `hecs` world that
//!   schedules controllers, dispatches staticness changes and integrates
//!   motion
//!
//! # Example
//!
//! ```rust,no_run
//! use speedthrust_core::prelude::*;
//! use speedthrust_core::store::MemoryStore;
//! use speedthrust_logic::config::{SizeClass, SpeedLimits};
//! use speedthrust_logic::direction::Direction;
//!
//! let mut store = MemoryStore::new();
//! let mut session =
//!     ThrustSession::start(&mut store, SpeedLimits::default(), SessionRole::Offline);
//!
//! let ship = session.spawn_vehicle("Courier", SizeClass::Small, 10_000.0);
//! let main_engine = session.spawn_thruster(ship, Direction::Backward, 50_000.0);
//! session.set_throttle(main_engine, 1.0);
//!
//! loop {
//!     session.update(1.0 / 60.0); // 60 FPS
//! }
//! ```

pub mod components;
pub mod controller;
pub mod engine;
pub mod generation;
pub mod host;
pub mod observers;
pub mod store;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::components::*;
    pub use crate::controller::{ControllerState, TickOutcome, UnitController, UpdateCadence};
    pub use crate::engine::{ThrustSession, TickStats};
    pub use crate::host::{SessionRole, StaticChangeSource, ThrustUnit, VehicleView};
}
