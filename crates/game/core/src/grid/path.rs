//! Breadth-first shortest paths over the occupancy grid.
//!
//! Four-way adjacency with unit cost. Neighbours are expanded in
//! [`CardinalDirection::ALL`] order so equal-length alternatives always resolve
//! the same way.

use std::collections::VecDeque;

use arrayvec::ArrayVec;

use super::OccupancyGrid;
use crate::state::{CardinalDirection, Position};

/// Returns the tiles to traverse from `from` to `to`, excluding `from` and
/// including `to`. `Some(vec![])` means the actor already stands on `to`.
pub fn find_path(grid: &OccupancyGrid, from: Position, to: Position) -> Option<Vec<Position>> {
    if !grid.is_walkable(to) {
        return None;
    }
    if from == to {
        return Some(Vec::new());
    }

    let dimensions = grid.dimensions();
    let start = dimensions.index_of(from)?;
    let goal = dimensions.index_of(to)?;

    let mut came_from: Vec<Option<usize>> = vec![None; dimensions.area()];
    let mut visited = vec![false; dimensions.area()];
    let mut frontier = VecDeque::new();

    visited[start] = true;
    frontier.push_back(from);

    while let Some(current) = frontier.pop_front() {
        let Some(current_index) = dimensions.index_of(current) else {
            continue;
        };
        if current_index == goal {
            return Some(reconstruct(grid, &came_from, start, goal));
        }

        for next in passable_neighbours(grid, current, to) {
            let Some(next_index) = dimensions.index_of(next) else {
                continue;
            };
            if !visited[next_index] {
                visited[next_index] = true;
                came_from[next_index] = Some(current_index);
                frontier.push_back(next);
            }
        }
    }

    None
}

/// Occupied tiles block traversal unless they are the destination itself.
fn passable_neighbours(
    grid: &OccupancyGrid,
    position: Position,
    destination: Position,
) -> ArrayVec<Position, 4> {
    CardinalDirection::ALL
        .iter()
        .map(|direction| position.step(*direction))
        .filter(|next| {
            grid.is_walkable(*next) && (*next == destination || !grid.is_occupied(*next))
        })
        .collect()
}

fn reconstruct(
    grid: &OccupancyGrid,
    came_from: &[Option<usize>],
    start: usize,
    goal: usize,
) -> Vec<Position> {
    let width = grid.dimensions().width as usize;
    let mut path = Vec::new();
    let mut cursor = goal;

    while cursor != start {
        path.push(Position::new((cursor % width) as i32, (cursor / width) as i32));
        match came_from[cursor] {
            Some(previous) => cursor = previous,
            None => break,
        }
    }

    path.reverse();
    path
}
