//! Game controller: runs a full turn and tracks score and win/loss status.

use std::borrow::Cow;
use std::fmt;

use log::{debug, info};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::GridError;
use crate::grid::{Cell, Grid, TileIds};
use crate::tile::{can_merge, move_tiles, spawn_random_tile, Direction};
use crate::WIN_VALUE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Playing,
    Won,
    Lost,
}

/// Snapshot of the game after one turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub grid: Grid,
    /// Sum of all merge gains so far.
    pub score: u32,
    pub status: GameStatus,
    /// Set on the first win and never cleared, even if the game is later lost.
    pub has_won: bool,
}

impl GameState {
    /// A fresh `Playing` state around an existing grid.
    pub fn from_grid(grid: Grid) -> Self {
        GameState {
            grid,
            score: 0,
            status: GameStatus::Playing,
            has_won: false,
        }
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Score: {}", self.score)?;
        write!(f, "{}", self.grid)
    }
}

/// True if any tile has reached the winning value.
pub fn check_win_condition(grid: &Grid) -> bool {
    grid.tiles().any(|tile| tile.value() >= WIN_VALUE)
}

/// True if a cell is empty or two orthogonal neighbours share a value.
pub fn can_move(grid: &Grid) -> bool {
    if grid.count_tiles() < grid.size() * grid.size() {
        return true;
    }

    // Checking right and bottom neighbours visits each adjacent pair once.
    grid.tiles().any(|tile| {
        let cell = tile.position();
        let right = grid.tile_at(Cell::new(cell.row, cell.col + 1));
        let below = grid.tile_at(Cell::new(cell.row + 1, cell.col));
        [right, below]
            .into_iter()
            .any(|neighbour| can_merge(Some(tile), neighbour))
    })
}

pub fn check_game_over(grid: &Grid) -> bool {
    !can_move(grid)
}

/// Owns the tile-id counter and random source for a run of games.
///
/// ## Example
///
/// ```rust
/// use tile_merge_core::{Direction, Game};
///
/// let mut game = Game::new(42);
/// let state = game.init_game();
/// let next = game.make_move(&state, Direction::Left);
/// println!("Score: {}", next.score);
/// ```
pub struct Game<R = SmallRng> {
    ids: TileIds,
    rng: R,
}

impl Game<SmallRng> {
    /// Controller with a deterministic RNG seeded from `seed`.
    pub fn new(seed: u64) -> Self {
        Game::with_rng(SmallRng::seed_from_u64(seed))
    }

    /// Controller seeded from the operating system.
    pub fn from_entropy() -> Self {
        Game::with_rng(SmallRng::from_entropy())
    }
}

impl<R: Rng> Game<R> {
    pub fn with_rng(rng: R) -> Self {
        Game {
            ids: TileIds::new(),
            rng,
        }
    }

    /// Counter used for every tile this controller creates.
    ///
    /// Tests build their fixture grids through it so ids stay unique.
    pub fn tile_ids_mut(&mut self) -> &mut TileIds {
        &mut self.ids
    }

    pub fn reset_tile_ids(&mut self) {
        self.ids.reset();
    }

    /// Start a new game on the standard 4x4 board with two random tiles.
    pub fn init_game(&mut self) -> GameState {
        self.start(Grid::default())
    }

    /// Like [`Game::init_game`] with a custom board size.
    pub fn init_game_sized(&mut self, size: usize) -> Result<GameState, GridError> {
        Ok(self.start(Grid::new(size)?))
    }

    fn start(&mut self, grid: Grid) -> GameState {
        self.ids.reset();
        let grid = spawn_random_tile(grid, &mut self.ids, &mut self.rng);
        let grid = spawn_random_tile(grid, &mut self.ids, &mut self.rng);
        info!("new {0}x{0} game started", grid.size());
        GameState::from_grid(grid)
    }

    /// Play one turn.
    ///
    /// A lost game or a move that changes nothing returns `state` itself as
    /// `Cow::Borrowed`. Otherwise a tile is spawned, the score updated and the
    /// status re-evaluated into a new owned state. A loss is checked after a
    /// win and takes precedence in `status`; `has_won` stays set.
    pub fn make_move<'a>(&mut self, state: &'a GameState, direction: Direction) -> Cow<'a, GameState> {
        if state.status == GameStatus::Lost {
            return Cow::Borrowed(state);
        }

        let result = move_tiles(&state.grid, direction, &mut self.ids);
        if !result.moved {
            debug!("move {direction} changed nothing");
            return Cow::Borrowed(state);
        }
        debug!(
            "move {direction}: +{} from {} merge(s)",
            result.score_gained,
            result.merged_tiles.len()
        );

        let grid = spawn_random_tile(result.grid, &mut self.ids, &mut self.rng);
        let score = state.score.saturating_add(result.score_gained);

        let mut status = state.status;
        let mut has_won = state.has_won;
        if !has_won && check_win_condition(&grid) {
            has_won = true;
            status = GameStatus::Won;
            info!("reached {WIN_VALUE} with score {score}");
        }
        if check_game_over(&grid) {
            status = GameStatus::Lost;
            info!("game over with score {score}");
        }

        Cow::Owned(GameState {
            grid,
            score,
            status,
            has_won,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
