//! Tunable falloff configuration, size classes and host speed limits.
//!
//! One [`ThrustConfig`] is loaded per session and shared read-only by every
//! thrust unit controller. It is persisted as a small JSON record with
//! camelCase keys; any key missing from a stored file takes its built-in
//! default, and unknown keys are ignored.
//!
//! ```
//! use speedthrust_logic::config::{validate_config, SizeClass, ThrustConfig};
//!
//! let config = ThrustConfig::default();
//! assert!(validate_config(&config).is_empty());
//! assert_eq!(config.falloff(SizeClass::Large).start, 0.6);
//! ```

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::falloff::FalloffParams;

/// Vehicle size category. Each class has its own max speed and falloff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SizeClass {
    Large,
    Small,
}

impl SizeClass {
    pub fn name(&self) -> &'static str {
        match self {
            SizeClass::Large => "large",
            SizeClass::Small => "small",
        }
    }
}

/// Session-wide thrust falloff settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ThrustConfig {
    /// Fraction of large-vehicle max speed where falloff begins.
    pub large_falloff_start: f32,
    /// Thrust floor for large vehicles at max speed.
    pub large_thrust_min: f32,
    /// Fraction of small-vehicle max speed where falloff begins.
    pub small_falloff_start: f32,
    /// Thrust floor for small vehicles at max speed.
    pub small_thrust_min: f32,
    /// When false, only thrusters pushing along the direction of travel are
    /// reduced, scaled by how directly they push.
    pub reduce_all_thrusters: bool,
}

impl Default for ThrustConfig {
    fn default() -> Self {
        Self {
            large_falloff_start: DEFAULT_LARGE_FALLOFF_START,
            large_thrust_min: DEFAULT_LARGE_THRUST_MIN,
            small_falloff_start: DEFAULT_SMALL_FALLOFF_START,
            small_thrust_min: DEFAULT_SMALL_THRUST_MIN,
            reduce_all_thrusters: DEFAULT_REDUCE_ALL_THRUSTERS,
        }
    }
}

impl ThrustConfig {
    /// Falloff parameters for the given size class.
    pub fn falloff(&self, class: SizeClass) -> FalloffParams {
        match class {
            SizeClass::Large => FalloffParams::new(self.large_falloff_start, self.large_thrust_min),
            SizeClass::Small => FalloffParams::new(self.small_falloff_start, self.small_thrust_min),
        }
    }

    pub fn is_valid(&self) -> bool {
        validate_config(self).is_empty()
    }
}

/// Which tunable a validation error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigField {
    LargeFalloffStart,
    LargeThrustMin,
    SmallFalloffStart,
    SmallThrustMin,
}

impl ConfigField {
    /// Key as it appears in the persisted file.
    pub fn key(&self) -> &'static str {
        match self {
            ConfigField::LargeFalloffStart => "largeFalloffStart",
            ConfigField::LargeThrustMin => "largeThrustMin",
            ConfigField::SmallFalloffStart => "smallFalloffStart",
            ConfigField::SmallThrustMin => "smallThrustMin",
        }
    }
}

/// Configuration validation error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigError {
    /// A fraction that must lie strictly inside (0, 1) does not.
    FractionOutOfRange { field: ConfigField, value: f32 },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::FractionOutOfRange { field, value } => write!(
                f,
                "{} must be strictly between 0 and 1, found {}",
                field.key(),
                value
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

fn is_open_fraction(value: f32) -> bool {
    value > 0.0 && value < 1.0
}

/// Validate a configuration, returning all errors found.
pub fn validate_config(config: &ThrustConfig) -> Vec<ConfigError> {
    let fields = [
        (ConfigField::LargeFalloffStart, config.large_falloff_start),
        (ConfigField::LargeThrustMin, config.large_thrust_min),
        (ConfigField::SmallFalloffStart, config.small_falloff_start),
        (ConfigField::SmallThrustMin, config.small_thrust_min),
    ];

    fields
        .into_iter()
        .filter(|(_, value)| !is_open_fraction(*value))
        .map(|(field, value)| ConfigError::FractionOutOfRange { field, value })
        .collect()
}

/// Host environment speed caps per size class (m/s).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedLimits {
    pub large_ship_max_speed: f32,
    pub small_ship_max_speed: f32,
}

impl Default for SpeedLimits {
    fn default() -> Self {
        Self {
            large_ship_max_speed: DEFAULT_LARGE_SHIP_MAX_SPEED,
            small_ship_max_speed: DEFAULT_SMALL_SHIP_MAX_SPEED,
        }
    }
}

impl SpeedLimits {
    pub fn max_speed(&self, class: SizeClass) -> f32 {
        match class {
            SizeClass::Large => self.large_ship_max_speed,
            SizeClass::Small => self.small_ship_max_speed,
        }
    }
}
