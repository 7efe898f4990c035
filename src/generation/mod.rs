//! # Generation Module
//!
//! Procedural content generation: maze carving, cave placement, enemy
//! rosters and weapon drops.
//!
//! Every generator draws from a caller-supplied random stream, so a fixed
//! seed reproduces the same maze, the same cave assignment and the same
//! rosters down to the enemy ids.

pub mod caves;
pub mod encounters;
pub mod items;
pub mod maze;

pub use caves::*;
pub use encounters::*;
pub use items::*;
pub use maze::*;

use crate::game::{Grid, NodeType, Position};
use crate::settings::DifficultyConfig;
use crate::{config, CrawlError, CrawlResult};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Configuration for procedural generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Random seed for reproducible generation
    pub seed: u64,
    /// Maze width in cells
    pub width: u32,
    /// Maze height in cells
    pub height: u32,
    /// Full regenerations attempted when a maze has too few dead ends
    pub max_regenerations: u32,
}

impl GenerationConfig {
    /// Creates a generation configuration with the default maze size.
    ///
    /// # Examples
    ///
    /// ```
    /// use cavecrawl::GenerationConfig;
    ///
    /// let config = GenerationConfig::new(7);
    /// assert_eq!(config.seed, 7);
    /// assert_eq!((config.width, config.height), (25, 15));
    /// ```
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            width: config::DEFAULT_MAZE_WIDTH,
            height: config::DEFAULT_MAZE_HEIGHT,
            max_regenerations: config::MAX_REGENERATIONS,
        }
    }

    /// Creates a configuration for testing with a smaller maze.
    pub fn for_testing(seed: u64) -> Self {
        Self {
            seed,
            width: 11,
            height: 9,
            max_regenerations: 20,
        }
    }

    /// Overrides the maze dimensions.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Checks that the maze can hold at least one room.
    pub fn validate(&self) -> CrawlResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(CrawlError::InvalidConfig(format!(
                "maze dimensions must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::new(42)
    }
}

/// Common interface for generation systems.
pub trait Generator<T> {
    /// Generates content using the provided configuration and random number generator.
    fn generate(&self, config: &GenerationConfig, rng: &mut StdRng) -> CrawlResult<T>;

    /// Validates that the generated content meets requirements.
    fn validate(&self, content: &T, config: &GenerationConfig) -> CrawlResult<()>;

    /// Gets the generator type name for logging and debugging.
    fn generator_type(&self) -> &'static str;
}

/// Carves a maze and places caves on it, retrying until the preset's
/// dead-end minimum is met.
///
/// # Examples
///
/// ```
/// use cavecrawl::{generate_maze, GenerationConfig, Position, Settings, Difficulty};
/// use cavecrawl::generation::utils::create_rng;
///
/// let settings = Settings::builtin().unwrap();
/// let config = GenerationConfig::new(3);
/// let mut rng = create_rng(&config);
/// let layout = generate_maze(25, 15, Position::new(0, 0), settings.difficulty(Difficulty::Easy), config.max_regenerations, &mut rng).unwrap();
/// assert!(layout.caves.len() >= settings.easy.caves.min);
/// ```
pub fn generate_maze<R: Rng + ?Sized>(
    width: u32,
    height: u32,
    start: Position,
    difficulty: &DifficultyConfig,
    max_regenerations: u32,
    rng: &mut R,
) -> CrawlResult<CaveLayout> {
    CaveAssigner::new(difficulty)
        .with_max_regenerations(max_regenerations)
        .assign(width, height, start, rng)
}

/// Utility functions for generation algorithms.
pub mod utils {
    use super::*;

    /// Creates a seeded random number generator from the config.
    pub fn create_rng(config: &GenerationConfig) -> StdRng {
        StdRng::seed_from_u64(config.seed)
    }

    /// Picks a random room slot (both coordinates even) inside the grid.
    pub fn random_start<R: Rng + ?Sized>(width: u32, height: u32, rng: &mut R) -> Position {
        let x = rng.gen_range(0..=width.saturating_sub(1) / 2) * 2;
        let y = rng.gen_range(0..=height.saturating_sub(1) / 2) * 2;
        Position::new(x as i32, y as i32)
    }

    /// Checks that every open cell is reachable from the start and that
    /// every dead end has exactly one open neighbour.
    pub fn validate_grid(grid: &Grid) -> CrawlResult<()> {
        if grid.node_type(grid.start) != Some(NodeType::Start) {
            return Err(CrawlError::GenerationFailed(format!(
                "start {:?} is not marked as the start room",
                grid.start
            )));
        }

        let reachable = crate::utils::reachable_from(grid, grid.start);
        if let Some(pos) = grid
            .positions()
            .find(|pos| grid.is_passable(*pos) && !reachable.contains(pos))
        {
            return Err(CrawlError::GenerationFailed(format!(
                "cell {pos:?} is not connected to the start"
            )));
        }

        for pos in grid.positions_of(NodeType::DeadEnd) {
            let degree = grid.passable_neighbors(pos).len();
            if degree != 1 {
                return Err(CrawlError::GenerationFailed(format!(
                    "dead end {pos:?} has {degree} open neighbours"
                )));
            }
        }

        Ok(())
    }
}
