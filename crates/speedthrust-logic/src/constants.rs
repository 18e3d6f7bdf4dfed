//! Shared constants: tuning defaults, multiplier bounds and cadence.

/// Default falloff start for large vehicles (fraction of max speed).
pub const DEFAULT_LARGE_FALLOFF_START: f32 = 0.6;
/// Default thrust floor for large vehicles (fraction of max thrust).
pub const DEFAULT_LARGE_THRUST_MIN: f32 = 0.0625;
/// Default falloff start for small vehicles.
pub const DEFAULT_SMALL_FALLOFF_START: f32 = 0.7;
/// Default thrust floor for small vehicles.
pub const DEFAULT_SMALL_THRUST_MIN: f32 = 0.125;
/// Default for reducing every thruster regardless of orientation.
pub const DEFAULT_REDUCE_ALL_THRUSTERS: bool = true;

/// Lowest multiplier the host accepts on a thrust unit.
pub const MIN_THRUST_MULTIPLIER: f32 = 0.01;
/// Unmodified thrust.
pub const MAX_THRUST_MULTIPLIER: f32 = 1.0;

/// Host environment max speed for large vehicles (m/s).
pub const DEFAULT_LARGE_SHIP_MAX_SPEED: f32 = 100.0;
/// Host environment max speed for small vehicles (m/s).
pub const DEFAULT_SMALL_SHIP_MAX_SPEED: f32 = 100.0;

/// Controllers re-evaluate once every this many simulated frames.
pub const UPDATE_INTERVAL_TICKS: u64 = 10;

/// Magnitudes below this are treated as zero.
pub const ZERO_EPSILON: f32 = 1e-5;
