//! # Pathfinding
//!
//! Breadth-first searches over the open cells of a maze.

use crate::game::{Grid, Position};
use ::pathfinding::prelude::{bfs, bfs_reach};
use std::collections::HashSet;

/// Every open cell connected to `origin`.
pub fn reachable_from(grid: &Grid, origin: Position) -> HashSet<Position> {
    if !grid.is_passable(origin) {
        return HashSet::new();
    }
    bfs_reach(origin, |pos| grid.passable_neighbors(*pos)).collect()
}

/// Shortest open path from `from` to `to`, both ends included.
pub fn shortest_path(grid: &Grid, from: Position, to: Position) -> Option<Vec<Position>> {
    shortest_path_where(grid, from, to, |_| true)
}

/// Shortest open path through cells accepted by `allowed`. The start cell is
/// always allowed.
pub fn shortest_path_where<F>(
    grid: &Grid,
    from: Position,
    to: Position,
    allowed: F,
) -> Option<Vec<Position>>
where
    F: Fn(Position) -> bool,
{
    if !grid.is_passable(from) || !grid.is_passable(to) || !allowed(to) {
        return None;
    }
    bfs(
        &from,
        |pos| {
            grid.passable_neighbors(*pos)
                .into_iter()
                .filter(|next| allowed(*next))
                .collect::<Vec<_>>()
        },
        |pos| *pos == to,
    )
}

/// The first cell to step onto on the way from `from` to `to`.
pub fn first_step<F>(grid: &Grid, from: Position, to: Position, allowed: F) -> Option<Position>
where
    F: Fn(Position) -> bool,
{
    shortest_path_where(grid, from, to, allowed).and_then(|path| path.get(1).copied())
}
