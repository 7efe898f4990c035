//! # Maze Carving
//!
//! Randomized depth-first carving over the room lattice.
//!
//! Rooms sit on cells whose coordinates are both even. The carver walks from
//! the start room, stepping two cells at a time in a shuffled order of the
//! four cardinal directions, and opens the corridor cell between a room and
//! each unvisited neighbour it descends into. The traversal runs on an
//! explicit stack, so depth is bounded only by memory.

use crate::game::{Direction, Grid, NodeType, Position};
use crate::generation::{utils, GenerationConfig, Generator};
use crate::{CrawlError, CrawlResult};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;

/// Depth-first maze carver.
#[derive(Debug, Clone, Default)]
pub struct MazeCarver;

/// One room on the carving stack.
#[derive(Debug, Clone, Copy)]
struct Frame {
    room: Position,
    directions: [Direction; 4],
    next: usize,
    carved: u32,
}

impl MazeCarver {
    /// Creates a new maze carver.
    ///
    /// # Examples
    ///
    /// ```
    /// use cavecrawl::{MazeCarver, NodeType, Position};
    /// use rand::SeedableRng;
    ///
    /// let mut rng = rand::rngs::StdRng::seed_from_u64(1);
    /// let grid = MazeCarver::new().carve(9, 7, Position::new(4, 2), &mut rng).unwrap();
    /// assert_eq!(grid.node_type(Position::new(4, 2)), Some(NodeType::Start));
    /// ```
    pub fn new() -> Self {
        Self
    }

    /// Carves a `width × height` maze from `start`.
    ///
    /// A room that descends into no neighbour is marked as a dead end when
    /// its frame is popped. The start room is forced to [`NodeType::Start`]
    /// afterwards.
    pub fn carve<R: Rng + ?Sized>(
        &self,
        width: u32,
        height: u32,
        start: Position,
        rng: &mut R,
    ) -> CrawlResult<Grid> {
        let mut grid = Grid::new(width, height, start);
        if !grid.is_valid_position(start) || !start.is_lattice_room() {
            return Err(CrawlError::InvalidConfig(format!(
                "start {start:?} must be a room slot inside a {width}x{height} maze"
            )));
        }

        let mut visited = vec![vec![false; width as usize]; height as usize];
        let mut stack = vec![Self::enter(&mut grid, &mut visited, start, rng)?];

        while let Some(frame) = stack.last_mut() {
            if frame.next == frame.directions.len() {
                if frame.carved == 0 {
                    grid.set_node_type(frame.room, NodeType::DeadEnd)?;
                }
                stack.pop();
                continue;
            }

            let direction = frame.directions[frame.next];
            frame.next += 1;

            let target = frame.room.step(direction, 2);
            if !grid.is_valid_position(target) || visited[target.y as usize][target.x as usize] {
                continue;
            }

            frame.carved += 1;
            grid.set_node_type(frame.room.step(direction, 1), NodeType::Normal)?;
            let child = Self::enter(&mut grid, &mut visited, target, rng)?;
            stack.push(child);
        }

        grid.set_node_type(start, NodeType::Start)?;
        Ok(grid)
    }

    /// Opens a room, marks it visited and shuffles its exits.
    fn enter<R: Rng + ?Sized>(
        grid: &mut Grid,
        visited: &mut [Vec<bool>],
        room: Position,
        rng: &mut R,
    ) -> CrawlResult<Frame> {
        visited[room.y as usize][room.x as usize] = true;
        grid.set_node_type(room, NodeType::Normal)?;

        let mut directions = Direction::CARDINALS;
        directions.shuffle(rng);

        Ok(Frame {
            room,
            directions,
            next: 0,
            carved: 0,
        })
    }
}

impl Generator<Grid> for MazeCarver {
    fn generate(&self, config: &GenerationConfig, rng: &mut StdRng) -> CrawlResult<Grid> {
        config.validate()?;
        let start = utils::random_start(config.width, config.height, rng);
        let grid = self.carve(config.width, config.height, start, rng)?;
        log::debug!(
            "Carved {}x{} maze from {:?} with {} dead ends",
            config.width,
            config.height,
            start,
            grid.positions_of(NodeType::DeadEnd).len()
        );
        Ok(grid)
    }

    fn validate(&self, grid: &Grid, _config: &GenerationConfig) -> CrawlResult<()> {
        utils::validate_grid(grid)
    }

    fn generator_type(&self) -> &'static str {
        "MazeCarver"
    }
}
