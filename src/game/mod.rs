//! # Game Module
//!
//! Core game state management, maze representation, entities and combat.
//!
//! This module contains the fundamental building blocks of a crawl:
//! - The maze grid, its nodes and the caves attached to dead ends
//! - Player, enemy and weapon entities
//! - The combat turn sequencer and the action resolver behind it
//! - The session owner that routes player commands into both

pub mod actions;
pub mod autopilot;
pub mod combat;
pub mod entities;
pub mod events;
pub mod state;
pub mod world;

pub use actions::*;
pub use autopilot::*;
pub use combat::*;
pub use entities::*;
pub use events::*;
pub use state::*;
pub use world::*;

use serde::{Deserialize, Serialize};

/// Represents a 2D coordinate in the maze.
///
/// # Examples
///
/// ```
/// use cavecrawl::Position;
///
/// let pos = Position::new(10, 5);
/// assert_eq!(pos.x, 10);
/// assert_eq!(pos.y, 5);
///
/// let adjacent = pos.cardinal_adjacent_positions();
/// assert_eq!(adjacent.len(), 4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    /// Creates a new position with the given coordinates.
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns the origin position (0, 0).
    pub fn origin() -> Self {
        Self::new(0, 0)
    }

    /// Calculates the Manhattan distance to another position.
    ///
    /// # Examples
    ///
    /// ```
    /// use cavecrawl::Position;
    ///
    /// let pos1 = Position::new(0, 0);
    /// let pos2 = Position::new(3, 4);
    /// assert_eq!(pos1.manhattan_distance(pos2), 7);
    /// ```
    pub fn manhattan_distance(self, other: Position) -> u32 {
        ((self.x - other.x).abs() + (self.y - other.y).abs()) as u32
    }

    /// Calculates the Euclidean distance to another position.
    pub fn euclidean_distance(self, other: Position) -> f64 {
        let dx = (self.x - other.x) as f64;
        let dy = (self.y - other.y) as f64;
        dx.hypot(dy)
    }

    /// Returns the 4 cardinal adjacent positions (no diagonals).
    pub fn cardinal_adjacent_positions(self) -> Vec<Position> {
        Direction::CARDINALS
            .iter()
            .map(|direction| self.step(*direction, 1))
            .collect()
    }

    /// Moves `distance` cells in the given direction.
    pub fn step(self, direction: Direction, distance: i32) -> Position {
        let delta = direction.to_delta();
        Position::new(self.x + delta.x * distance, self.y + delta.y * distance)
    }

    /// Whether both coordinates are even, i.e. the position is a room slot
    /// of the maze lattice.
    pub fn is_lattice_room(self) -> bool {
        self.x % 2 == 0 && self.y % 2 == 0
    }
}

impl std::ops::Add for Position {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl std::ops::Sub for Position {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

/// Cardinal directions for movement and carving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    /// All four directions in the order the carver shuffles them from.
    pub const CARDINALS: [Direction; 4] = [
        Direction::South,
        Direction::North,
        Direction::West,
        Direction::East,
    ];

    /// Converts a direction to a position delta.
    ///
    /// # Examples
    ///
    /// ```
    /// use cavecrawl::{Direction, Position};
    ///
    /// let delta = Direction::North.to_delta();
    /// assert_eq!(delta, Position::new(0, -1));
    /// ```
    pub fn to_delta(self) -> Position {
        match self {
            Direction::North => Position::new(0, -1),
            Direction::South => Position::new(0, 1),
            Direction::East => Position::new(1, 0),
            Direction::West => Position::new(-1, 0),
        }
    }

    /// Returns the direction pointing the other way.
    pub fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
        }
    }

    /// Converts a unit delta back into a direction.
    pub fn from_delta(delta: Position) -> Option<Direction> {
        Direction::CARDINALS
            .into_iter()
            .find(|direction| direction.to_delta() == delta)
    }
}
