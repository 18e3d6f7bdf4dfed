//! Component definitions for the reference host.
//!
//! Components are plain data attached to entities. Vehicles carry a
//! [`Vehicle`] and usually a [`PhysicsBody`]; thrust units carry a
//! [`Thruster`] and their [`ThrustController`].

mod thruster;
mod vehicle;

pub use thruster::*;
pub use vehicle::*;
