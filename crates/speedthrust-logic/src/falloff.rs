//! Thrust falloff curve - maps a speed ratio to a thrust reduction.
//!
//! Below the falloff start the curve is flat (no reduction). Past it, the
//! remaining headroom `r = 1 - progress` drives an exponential knee:
//!
//! ```text
//! scalar    = 0.5^(1/r) / 0.5
//! reduction = lerp(0, 1 - thrust_min, 1 - scalar)
//! ```
//!
//! The knee holds thrust near 100% just past the start threshold and falls
//! toward `thrust_min` as the vehicle reaches its size-class top speed.
//!
//! ```
//! use speedthrust_logic::falloff::reduction;
//!
//! assert_eq!(reduction(0.6, 0.6, 0.0625), 0.0);
//! assert_eq!(reduction(1.0, 0.6, 0.0625), 0.9375);
//! ```

use serde::{Deserialize, Serialize};

use crate::constants::ZERO_EPSILON;

/// Falloff parameters for a single size class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FalloffParams {
    /// Fraction of max speed where reduction begins, in (0, 1).
    pub start: f32,
    /// Floor thrust fraction reached at max speed, in (0, 1).
    pub thrust_min: f32,
}

impl FalloffParams {
    pub fn new(start: f32, thrust_min: f32) -> Self {
        Self { start, thrust_min }
    }

    /// Reduction at the given speed ratio.
    pub fn reduction_at(&self, speed_ratio: f32) -> f32 {
        reduction(speed_ratio, self.start, self.thrust_min)
    }

    /// Largest reduction this curve can produce (reached at max speed).
    pub fn max_reduction(&self) -> f32 {
        1.0 - self.thrust_min
    }
}

/// Linear interpolation between `a` and `b`.
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// True when `value` is within [`ZERO_EPSILON`] of zero.
pub fn is_zero(value: f32) -> bool {
    value.abs() < ZERO_EPSILON
}

/// Current speed as a fraction of the size-class max speed.
///
/// Returns 0 for a non-positive max speed or a non-finite result so the
/// curve never sees NaN.
pub fn speed_ratio(speed: f32, max_speed: f32) -> f32 {
    if max_speed <= 0.0 {
        return 0.0;
    }
    let ratio = speed / max_speed;
    if ratio.is_finite() {
        ratio
    } else {
        0.0
    }
}

/// Thrust reduction for a speed ratio, in `[0, 1 - thrust_min]`.
pub fn reduction(speed_ratio: f32, start: f32, thrust_min: f32) -> f32 {
    if !speed_ratio.is_finite() || speed_ratio < start {
        return 0.0;
    }

    // Speed can briefly overshoot the host cap between physics steps.
    let progress = ((speed_ratio - start) / (1.0 - start)).clamp(0.0, 1.0);
    let remaining = 1.0 - progress;

    let mut scalar = if remaining > 0.0 {
        0.5f32.powf(remaining.recip()) / 0.5
    } else {
        0.0
    };
    if scalar < 0.0 || is_zero(scalar) || !scalar.is_finite() {
        scalar = 0.0;
    }

    lerp(0.0, 1.0 - thrust_min, 1.0 - scalar)
}
