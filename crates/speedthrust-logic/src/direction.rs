//! Base-6 mounting directions for blocks on a vehicle grid.
//!
//! Thrust units are mounted along one of six grid-aligned axes. The
//! forward axis of a thrust unit points along its exhaust, so the force it
//! produces acts along the negated vector.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// One of the six grid-aligned axes in the vehicle's local frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Forward,
    Backward,
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    /// Local-frame unit vector. Forward is -Z, Up is +Y, Right is +X.
    pub fn vector(self) -> Vec3 {
        match self {
            Direction::Forward => Vec3::NEG_Z,
            Direction::Backward => Vec3::Z,
            Direction::Left => Vec3::NEG_X,
            Direction::Right => Vec3::X,
            Direction::Up => Vec3::Y,
            Direction::Down => Vec3::NEG_Y,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }

    pub fn all() -> [Direction; 6] {
        [
            Direction::Forward,
            Direction::Backward,
            Direction::Left,
            Direction::Right,
            Direction::Up,
            Direction::Down,
        ]
    }
}
