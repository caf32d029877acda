//! Tile engine: tile creation, random spawning, and the move/merge algorithm.

use std::fmt;
use std::str::FromStr;

use log::trace;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ParseDirectionError;
use crate::grid::{Cell, Grid, Tile, TileIds};
use crate::FOUR_PROBABILITY;

/// The four directions tiles can slide in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Direction {
    Up = 0,
    Down = 1,
    Left = 2,
    Right = 3,
}

impl Direction {
    /// Convert a u8 to a Direction (0=Up, 1=Down, 2=Left, 3=Right).
    /// Returns None for invalid values.
    pub fn from_u8(value: u8) -> Option<Direction> {
        match value {
            0 => Some(Direction::Up),
            1 => Some(Direction::Down),
            2 => Some(Direction::Left),
            3 => Some(Direction::Right),
            _ => None,
        }
    }

    pub fn all() -> [Direction; 4] {
        [
            Direction::Up,
            Direction::Down,
            Direction::Left,
            Direction::Right,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = ParseDirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            "left" => Ok(Direction::Left),
            "right" => Ok(Direction::Right),
            other => Err(ParseDirectionError(other.to_string())),
        }
    }
}

/// Outcome of sliding a grid in one direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveResult {
    /// The grid after the slide, before any spawn.
    pub grid: Grid,
    /// Whether any cell value changed. When false the caller discards `grid`.
    pub moved: bool,
    /// Sum of the values of every tile created by a merge.
    pub score_gained: u32,
    /// Tiles created by merges during this move, in line order.
    pub merged_tiles: Vec<Tile>,
}

/// Create a tile with a fresh id and no merge record.
pub fn create_tile(ids: &mut TileIds, value: u32, position: Cell) -> Tile {
    Tile::new(ids.next_id(), value, position)
}

/// Place a 2 (90%) or a 4 (10%) in a uniformly chosen empty cell.
///
/// A full grid is returned unchanged.
pub fn spawn_random_tile<R: Rng + ?Sized>(mut grid: Grid, ids: &mut TileIds, rng: &mut R) -> Grid {
    let empty = grid.empty_cells();
    if empty.is_empty() {
        return grid;
    }

    let cell = empty[rng.gen_range(0..empty.len())];
    let value = if rng.gen::<f64>() < 1.0 - FOUR_PROBABILITY {
        2
    } else {
        4
    };
    let tile = create_tile(ids, value, cell);
    trace!("spawned {} at ({}, {}) as tile {}", value, cell.row, cell.col, tile.id());
    grid.place(cell, Some(tile));
    grid
}

/// Two cells merge when both hold tiles of equal value whose sum still fits
/// in a `u32`. A pair of `1 << 31` tiles never merges.
pub fn can_merge(a: Option<&Tile>, b: Option<&Tile>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => {
            a.value() == b.value() && a.value().checked_add(b.value()).is_some()
        }
        _ => false,
    }
}

/// Cells of line `index`, ordered from the edge tiles slide toward.
fn line_cells(size: usize, direction: Direction, index: usize) -> Vec<Cell> {
    match direction {
        Direction::Left => (0..size).map(|col| Cell::new(index, col)).collect(),
        Direction::Right => (0..size).rev().map(|col| Cell::new(index, col)).collect(),
        Direction::Up => (0..size).map(|row| Cell::new(row, index)).collect(),
        Direction::Down => (0..size).rev().map(|row| Cell::new(row, index)).collect(),
    }
}

/// Merge a collapsed line front to back.
///
/// An equal adjacent pair becomes one new tile and both sources are consumed,
/// so no tile merges twice and the pair nearest the front wins.
/// Returns the surviving tiles and the points scored.
fn merge_line(tiles: Vec<Tile>, ids: &mut TileIds) -> (Vec<Tile>, u32) {
    let mut out = Vec::with_capacity(tiles.len());
    let mut score: u32 = 0;
    let mut iter = tiles.into_iter().peekable();

    while let Some(tile) = iter.next() {
        match iter.next_if(|next| can_merge(Some(&tile), Some(next))) {
            Some(partner) => {
                let merged = Tile::merged(ids.next_id(), (tile, partner));
                score = score.saturating_add(merged.value());
                out.push(merged);
            }
            None => out.push(tile),
        }
    }

    (out, score)
}

/// Slide every tile as far as possible in `direction`, merging equal pairs.
///
/// The input grid is not modified. Merge records left over from a previous
/// move are dropped, so only tiles merged by this move carry one.
pub fn move_tiles(grid: &Grid, direction: Direction, ids: &mut TileIds) -> MoveResult {
    let size = grid.size();
    let mut work = grid.clone();
    work.clear_merge_records();

    let mut score_gained: u32 = 0;
    let mut merged_tiles = Vec::new();

    for index in 0..size {
        let cells = line_cells(size, direction, index);

        // Collapse: empties drop out, order is kept.
        let collapsed: Vec<Tile> = cells.iter().filter_map(|&cell| work.take(cell)).collect();
        let (line, score) = merge_line(collapsed, ids);
        score_gained = score_gained.saturating_add(score);

        // Write back; cells past the end of the line stay empty.
        let mut line = line.into_iter();
        for &cell in &cells {
            work.place(cell, line.next());
            if let Some(tile) = work.tile_at(cell).filter(|t| t.is_merged()) {
                merged_tiles.push(tile.clone());
            }
        }
    }

    let moved = !grid.same_values(&work);

    MoveResult {
        grid: work,
        moved,
        score_gained,
        merged_tiles,
    }
}

/// Whether sliding `grid` in `direction` would change it.
///
/// Unlike [`move_tiles`] this allocates no tile ids.
pub fn can_move_in(grid: &Grid, direction: Direction) -> bool {
    (0..grid.size()).any(|index| {
        let mut seen_empty = false;
        let mut previous: Option<u32> = None;
        for cell in line_cells(grid.size(), direction, index) {
            match grid.tile_at(cell) {
                None => seen_empty = true,
                Some(_) if seen_empty => return true,
                Some(tile) if previous == Some(tile.value()) => return true,
                Some(tile) => previous = Some(tile.value()),
            }
        }
        false
    })
}

/// Every direction in which a move would change the grid.
pub fn legal_directions(grid: &Grid) -> Vec<Direction> {
    Direction::all()
        .into_iter()
        .filter(|&direction| can_move_in(grid, direction))
        .collect()
}

// =============================================================================
// Tests
// =============================================================================
