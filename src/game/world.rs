//! # Maze World
//!
//! The carved grid, its node types and the caves attached to dead ends.

use crate::game::{Enemy, Position};
use crate::{CrawlError, CrawlResult};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

/// Topological role of a maze cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    /// Solid rock
    Wall,
    /// Carved room or corridor
    Normal,
    /// Carved room with exactly one open neighbour
    DeadEnd,
    /// The room the player starts in
    Start,
}

impl NodeType {
    /// Whether the player can stand on this node.
    pub fn is_passable(self) -> bool {
        !matches!(self, NodeType::Wall)
    }
}

/// What a cave does when the player steps into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CaveCategory {
    /// The final fight; clearing it wins the game
    Boss,
    /// A bat carries the player to a random cave
    Teleport,
    /// A merchant
    Shop,
    /// A bottomless hole
    InstantDeath,
    /// A regular orc fight
    Fight,
    /// A random weapon and a health boost
    Treasure,
    /// Already used up
    Empty,
}

impl CaveCategory {
    /// Whether entering the cave starts a combat session.
    pub fn is_fight(self) -> bool {
        matches!(self, CaveCategory::Boss | CaveCategory::Fight)
    }
}

/// Screen or session the presentation should open after a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaveOutcome {
    StartCombat,
    Teleport,
    OpenShop,
    InstantDeath,
    Treasure,
    Nothing,
}

/// Special room attached to a dead end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cave {
    pub category: CaveCategory,
    /// Coins paid out once every enemy is cleared
    pub reward: u32,
    /// Enemy roster; empty unless the cave is a fight
    pub enemies: Vec<Enemy>,
}

impl Cave {
    /// A freshly found dead end defaults to treasure.
    pub fn new() -> Self {
        Self {
            category: CaveCategory::Treasure,
            reward: 0,
            enemies: Vec::new(),
        }
    }

    /// Resolves the cave's effect. Treasure is collected on the spot and the
    /// cave is neutralized; fight caves stay armed until their roster is
    /// cleared by the combat session.
    pub fn trigger(&mut self) -> CaveOutcome {
        match self.category {
            CaveCategory::Boss | CaveCategory::Fight => CaveOutcome::StartCombat,
            CaveCategory::Teleport => CaveOutcome::Teleport,
            CaveCategory::Shop => CaveOutcome::OpenShop,
            CaveCategory::InstantDeath => CaveOutcome::InstantDeath,
            CaveCategory::Treasure => {
                self.category = CaveCategory::Empty;
                CaveOutcome::Treasure
            }
            CaveCategory::Empty => CaveOutcome::Nothing,
        }
    }

    /// Marks the cave as spent.
    pub fn neutralize(&mut self) {
        self.reward = 0;
        self.category = CaveCategory::Empty;
    }
}

impl Default for Cave {
    fn default() -> Self {
        Self::new()
    }
}

/// A single maze cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MazeNode {
    pub node_type: NodeType,
    /// Revealed by exploration
    pub visible: bool,
    pub cave: Option<Cave>,
}

impl MazeNode {
    pub fn new(node_type: NodeType) -> Self {
        Self {
            node_type,
            visible: false,
            cave: None,
        }
    }

    pub fn wall() -> Self {
        Self::new(NodeType::Wall)
    }
}

/// The maze: `width × height` cells stored row-major (`cells[y][x]`).
///
/// Rooms sit on even coordinates, corridors on the odd cell between two
/// rooms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    pub width: u32,
    pub height: u32,
    pub start: Position,
    pub cells: Vec<Vec<MazeNode>>,
}

impl Grid {
    /// Creates a grid of solid walls.
    pub fn new(width: u32, height: u32, start: Position) -> Self {
        Self {
            width,
            height,
            start,
            cells: vec![vec![MazeNode::wall(); width as usize]; height as usize],
        }
    }

    /// Checks if a position lies inside the grid.
    pub fn is_valid_position(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as u32) < self.width && (pos.y as u32) < self.height
    }

    pub fn get(&self, pos: Position) -> Option<&MazeNode> {
        if !self.is_valid_position(pos) {
            return None;
        }
        self.cells
            .get(pos.y as usize)
            .and_then(|row| row.get(pos.x as usize))
    }

    pub fn get_mut(&mut self, pos: Position) -> Option<&mut MazeNode> {
        if !self.is_valid_position(pos) {
            return None;
        }
        self.cells
            .get_mut(pos.y as usize)
            .and_then(|row| row.get_mut(pos.x as usize))
    }

    pub fn node_type(&self, pos: Position) -> Option<NodeType> {
        self.get(pos).map(|node| node.node_type)
    }

    /// Sets the node type at a position.
    pub fn set_node_type(&mut self, pos: Position, node_type: NodeType) -> CrawlResult<()> {
        let node = self.get_mut(pos).ok_or_else(|| {
            CrawlError::InvalidState(format!("position {pos:?} is outside the maze"))
        })?;
        node.node_type = node_type;
        Ok(())
    }

    /// Whether a position is inside the grid and not a wall.
    pub fn is_passable(&self, pos: Position) -> bool {
        self.node_type(pos).is_some_and(NodeType::is_passable)
    }

    /// Open cardinal neighbours of a position.
    pub fn passable_neighbors(&self, pos: Position) -> Vec<Position> {
        pos.cardinal_adjacent_positions()
            .into_iter()
            .filter(|&neighbor| self.is_passable(neighbor))
            .collect()
    }

    /// Positions of every node of the given type, scanning column by column.
    pub fn positions_of(&self, node_type: NodeType) -> Vec<Position> {
        let mut positions = Vec::new();
        for x in 0..self.width as i32 {
            for y in 0..self.height as i32 {
                let pos = Position::new(x, y);
                if self.node_type(pos) == Some(node_type) {
                    positions.push(pos);
                }
            }
        }
        positions
    }

    /// Iterates over all positions row by row.
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.height as i32)
            .flat_map(move |y| (0..self.width as i32).map(move |x| Position::new(x, y)))
    }

    pub fn cave(&self, pos: Position) -> Option<&Cave> {
        self.get(pos).and_then(|node| node.cave.as_ref())
    }

    pub fn cave_mut(&mut self, pos: Position) -> Option<&mut Cave> {
        self.get_mut(pos).and_then(|node| node.cave.as_mut())
    }

    pub fn is_visible(&self, pos: Position) -> bool {
        self.get(pos).is_some_and(|node| node.visible)
    }

    /// Reveals every open cell within `radius` steps of `origin`, walking
    /// only through open cells.
    pub fn reveal_around(&mut self, origin: Position, radius: u32) {
        if !self.is_passable(origin) {
            return;
        }

        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        visited.insert(origin);
        queue.push_back((origin, 0u32));

        while let Some((pos, distance)) = queue.pop_front() {
            if let Some(node) = self.get_mut(pos) {
                node.visible = true;
            }
            if distance == radius {
                continue;
            }
            for neighbor in self.passable_neighbors(pos) {
                if visited.insert(neighbor) {
                    queue.push_back((neighbor, distance + 1));
                }
            }
        }
    }
}
