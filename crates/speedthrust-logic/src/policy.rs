//! Per-thruster reduction policy.
//!
//! Combines the falloff curve with an optional directional weighting:
//!
//! 1. Pick the size-class falloff parameters and max speed.
//! 2. `base = reduction(speed / max_speed)`.
//! 3. With `reduce_all_thrusters`, every unit gets `base`.
//! 4. Otherwise only units whose forward (exhaust) axis points against the
//!    velocity, i.e. units that push the vehicle faster, are reduced, by
//!    `base * |alignment|`. Units pointing with the velocity or across it
//!    keep full thrust so braking and lateral authority survive at speed.
//! 5. Any positive reduction becomes `clamp(1 - reduction, 0.01, 1)`;
//!    otherwise the multiplier is exactly 1.

use glam::{Quat, Vec3};

use crate::config::{SizeClass, SpeedLimits, ThrustConfig};
use crate::constants::{MAX_THRUST_MULTIPLIER, MIN_THRUST_MULTIPLIER};
use crate::falloff::{reduction, speed_ratio};

/// Live vehicle state read by the policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionSample {
    pub size_class: SizeClass,
    /// Scalar speed (m/s) as reported by the host body.
    pub speed: f32,
    pub linear_velocity: Vec3,
    /// Vehicle orientation, used to resolve unit axes to world space.
    pub orientation: Quat,
}

impl MotionSample {
    /// Sample whose speed is the length of `linear_velocity`.
    pub fn from_velocity(size_class: SizeClass, linear_velocity: Vec3, orientation: Quat) -> Self {
        Self {
            size_class,
            speed: linear_velocity.length(),
            linear_velocity,
            orientation,
        }
    }
}

/// Dot product of the unit's world-space axis with the travel direction.
///
/// `None` when the velocity is too small to normalise or the result is not
/// finite.
pub fn alignment(local_axis: Vec3, orientation: Quat, velocity: Vec3) -> Option<f32> {
    let travel = velocity.try_normalize()?;
    let world_axis = orientation * local_axis;
    let dot = world_axis.dot(travel);
    dot.is_finite().then_some(dot)
}

/// Curve reduction for the vehicle's current speed, before weighting.
pub fn base_reduction(motion: &MotionSample, config: &ThrustConfig, limits: &SpeedLimits) -> f32 {
    let params = config.falloff(motion.size_class);
    let ratio = speed_ratio(motion.speed, limits.max_speed(motion.size_class));
    reduction(ratio, params.start, params.thrust_min)
}

/// Reduction after directional weighting for one thrust unit.
pub fn weighted_reduction(
    local_axis: Vec3,
    motion: &MotionSample,
    config: &ThrustConfig,
    limits: &SpeedLimits,
) -> f32 {
    let base = base_reduction(motion, config, limits);
    if config.reduce_all_thrusters {
        return base;
    }

    match alignment(local_axis, motion.orientation, motion.linear_velocity) {
        Some(dot) if dot < 0.0 => base * dot.abs(),
        _ => 0.0,
    }
}

/// Thrust multiplier for one unit, always in `[0.01, 1.0]`.
pub fn thrust_multiplier(
    local_axis: Vec3,
    motion: &MotionSample,
    config: &ThrustConfig,
    limits: &SpeedLimits,
) -> f32 {
    let reduction = weighted_reduction(local_axis, motion, config, limits);
    if reduction > 0.0 {
        (1.0 - reduction).clamp(MIN_THRUST_MULTIPLIER, MAX_THRUST_MULTIPLIER)
    } else {
        MAX_THRUST_MULTIPLIER
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::direction::Direction;

    fn directional() -> ThrustConfig {
        ThrustConfig {
            reduce_all_thrusters: false,
            ..Default::default()
        }
    }

    /// Large vehicle travelling along -Z (local forward) at `speed`.
    fn cruising(speed: f32) -> MotionSample {
        MotionSample::from_velocity(SizeClass::Large, Vec3::NEG_Z * speed, Quat::IDENTITY)
    }

    #[test]
    fn below_start_is_full_thrust() {
        let m = thrust_multiplier(
            Direction::Backward.vector(),
            &cruising(60.0),
            &ThrustConfig::default(),
            &SpeedLimits::default(),
        );
        assert_eq!(m, 1.0);
    }

    #[test]
    fn top_speed_hits_floor() {
        let m = thrust_multiplier(
            Direction::Backward.vector(),
            &cruising(100.0),
            &ThrustConfig::default(),
            &SpeedLimits::default(),
        );
        assert_eq!(m, 0.0625);
    }

    #[test]
    fn reduce_all_ignores_orientation() {
        let config = ThrustConfig::default();
        let limits = SpeedLimits::default();
        let motion = cruising(90.0);
        let expected = thrust_multiplier(Direction::Backward.vector(), &motion, &config, &limits);
        for d in Direction::all() {
            assert_eq!(thrust_multiplier(d.vector(), &motion, &config, &limits), expected);
        }
        assert!(expected < 1.0);
    }

    #[test]
    fn perpendicular_unit_keeps_full_thrust() {
        let m = thrust_multiplier(
            Direction::Left.vector(),
            &cruising(100.0),
            &directional(),
            &SpeedLimits::default(),
        );
        assert_eq!(m, 1.0);
    }

    #[test]
    fn braking_unit_keeps_full_thrust() {
        // Exhaust along travel: pushes backward, can only slow the vehicle.
        let m = thrust_multiplier(
            Direction::Forward.vector(),
            &cruising(100.0),
            &directional(),
            &SpeedLimits::default(),
        );
        assert_eq!(m, 1.0);
    }

    #[test]
    fn opposing_unit_gets_full_base_reduction() {
        let config = directional();
        let limits = SpeedLimits::default();
        let motion = cruising(90.0);
        let base = base_reduction(&motion, &config, &limits);
        let m = thrust_multiplier(Direction::Backward.vector(), &motion, &config, &limits);
        assert_eq!(m, (1.0 - base).clamp(0.01, 1.0));
    }

    #[test]
    fn diagonal_unit_gets_partial_reduction() {
        let config = directional();
        let limits = SpeedLimits::default();
        let velocity = Vec3::new(1.0, 0.0, -1.0).normalize() * 100.0;
        let motion = MotionSample::from_velocity(SizeClass::Large, velocity, Quat::IDENTITY);

        let base = base_reduction(&motion, &config, &limits);
        let r = weighted_reduction(Direction::Backward.vector(), &motion, &config, &limits);
        assert!((r - base * std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-5);
    }

    #[test]
    fn orientation_rotates_unit_axis() {
        // Vehicle yawed 180 degrees: its local Forward exhaust now points +Z,
        // against travel along -Z, so it accelerates the vehicle.
        let config = directional();
        let limits = SpeedLimits::default();
        let motion = MotionSample::from_velocity(
            SizeClass::Large,
            Vec3::NEG_Z * 100.0,
            Quat::from_rotation_y(std::f32::consts::PI),
        );
        let m = thrust_multiplier(Direction::Forward.vector(), &motion, &config, &limits);
        assert!((m - 0.0625).abs() < 1e-4);
    }

    #[test]
    fn zero_velocity_has_no_alignment() {
        assert_eq!(alignment(Vec3::Z, Quat::IDENTITY, Vec3::ZERO), None);
        let motion = MotionSample {
            size_class: SizeClass::Large,
            speed: 100.0,
            linear_velocity: Vec3::ZERO,
            orientation: Quat::IDENTITY,
        };
        let m = thrust_multiplier(Vec3::Z, &motion, &directional(), &SpeedLimits::default());
        assert_eq!(m, 1.0);
    }

    #[test]
    fn nan_velocity_has_no_alignment() {
        assert_eq!(alignment(Vec3::Z, Quat::IDENTITY, Vec3::splat(f32::NAN)), None);
    }

    #[test]
    fn small_class_uses_small_parameters() {
        let limits = SpeedLimits::default();
        let motion =
            MotionSample::from_velocity(SizeClass::Small, Vec3::NEG_Z * 65.0, Quat::IDENTITY);
        // 65% is past the large start (60%) but before the small start (70%).
        assert_eq!(base_reduction(&motion, &ThrustConfig::default(), &limits), 0.0);
    }

    #[test]
    fn multiplier_stays_in_bounds() {
        let config = ThrustConfig {
            large_thrust_min: 0.001,
            reduce_all_thrusters: true,
            ..Default::default()
        };
        let limits = SpeedLimits::default();
        for i in 0..=120 {
            let m = thrust_multiplier(Vec3::Z, &cruising(i as f32), &config, &limits);
            assert!((0.01..=1.0).contains(&m), "speed {} gave {}", i, m);
        }
    }
}
