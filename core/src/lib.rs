//! # 2048 Rule Engine
//!
//! The grid-state transition function behind the 2048 tile-merging puzzle:
//! take a board and a direction, produce the next board, the points scored
//! and which tiles merged. Rendering and input capture live in the adapter
//! crates; this crate only owns the rules.
//!
//! The engine is layered leaves first:
//!
//! - [`grid`]: the square board, cell addressing and tile id allocation
//! - [`tile`]: spawning and the per-direction slide/merge algorithm
//! - [`game`]: a full turn (move, spawn, win/loss evaluation)
//!
//! ## Example
//!
//! ```rust
//! use tile_merge_core::{Direction, Game, GameStatus};
//!
//! let mut game = Game::new(42); // seeded spawns
//! let state = game.init_game();
//! let next = game.make_move(&state, Direction::Left);
//! assert_eq!(next.status, GameStatus::Playing);
//! println!("{}", next);
//! ```

pub mod error;
pub mod game;
pub mod grid;
pub mod highlight;
pub mod input;
pub mod tile;

pub use error::{GridError, ParseDirectionError};
pub use game::{can_move, check_game_over, check_win_condition, Game, GameState, GameStatus};
pub use grid::{Cell, Grid, Tile, TileId, TileIds};
pub use highlight::{highlights, Highlights};
pub use input::{swipe_direction, SWIPE_THRESHOLD};
pub use tile::{
    can_merge, can_move_in, create_tile, legal_directions, move_tiles, spawn_random_tile,
    Direction, MoveResult,
};

/// Side length of a standard board.
pub const DEFAULT_GRID_SIZE: usize = 4;

/// Tile value that wins the game. Larger tiles also count.
pub const WIN_VALUE: u32 = 2048;

/// Chance that a spawned tile is a 4 rather than a 2.
pub const FOUR_PROBABILITY: f64 = 0.1;
