//! Pure thrust falloff logic for speed-relative thrust.
//!
//! This crate holds the control law that scales thrust unit output as a
//! vehicle approaches its size-class top speed. Functions take plain data
//! and return results, with no storage, scheduling or engine types, so the
//! same code drives the session runtime, the headless harness and tests.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | Falloff configuration, validation, size classes, speed limits |
//! | [`constants`] | Defaults, multiplier bounds, update cadence |
//! | [`direction`] | Base-6 mounting directions and their local axes |
//! | [`falloff`] | Speed ratio → reduction curve |
//! | [`policy`] | Directional weighting and final per-unit multiplier |

pub mod config;
pub mod constants;
pub mod direction;
pub mod falloff;
pub mod policy;
