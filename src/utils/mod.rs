//! # Utilities Module
//!
//! Rounding helpers and maze pathfinding.

pub mod math;
pub mod pathfinding;

pub use self::math::*;
pub use self::pathfinding::*;
