//! # 2048 WebAssembly Bindings
//!
//! JavaScript-facing wrapper around the rule engine, built with
//! wasm-bindgen. The page owns the DOM; this crate owns the game state and
//! hands back plain serialized snapshots to render from.

use std::borrow::Cow;

use serde::Serialize;
use tile_merge_core::{
    highlights, swipe_direction, Direction, Game, GameState, GameStatus, Highlights,
};
use wasm_bindgen::prelude::*;

/// One tile as the renderer sees it.
#[derive(Serialize)]
pub struct JsTile {
    pub id: u64,
    pub value: u32,
    pub row: usize,
    pub col: usize,
    /// Ids of the two tiles this one was merged from this turn.
    pub merged_from: Option<[u64; 2]>,
}

/// Snapshot returned to JavaScript after every call that changes state.
#[derive(Serialize)]
pub struct JsSnapshot {
    pub size: usize,
    pub tiles: Vec<JsTile>,
    pub score: u32,
    pub status: GameStatus,
    pub has_won: bool,
    /// Whether the last input changed the board.
    pub changed: bool,
    pub highlights: Highlights,
}

/// WebAssembly wrapper for one game session.
#[wasm_bindgen]
pub struct WasmGame {
    game: Game,
    state: GameState,
    marks: Highlights,
}

#[wasm_bindgen]
impl WasmGame {
    /// Create a new game. The seed drives tile spawns.
    #[wasm_bindgen(constructor)]
    pub fn new(seed: u64) -> WasmGame {
        let mut game = Game::new(seed);
        let state = game.init_game();
        let marks = highlights(None, &state);
        WasmGame { game, state, marks }
    }

    /// Start over with a fresh board and a new seed.
    pub fn reset(&mut self, seed: u64) {
        *self = WasmGame::new(seed);
    }

    /// Apply a move given as `"up"`, `"down"`, `"left"` or `"right"`.
    #[wasm_bindgen(js_name = makeMove)]
    pub fn make_move(&mut self, direction: &str) -> Result<JsValue, JsValue> {
        let direction: Direction = direction
            .parse()
            .map_err(|e: tile_merge_core::ParseDirectionError| JsValue::from_str(&e.to_string()))?;
        Ok(self.apply(Some(direction)))
    }

    /// Apply the move bound to a `KeyboardEvent.key`; other keys are ignored.
    #[wasm_bindgen(js_name = handleKey)]
    pub fn handle_key(&mut self, key: &str) -> JsValue {
        self.apply(Direction::from_key(key))
    }

    /// Apply the move for a touch gesture with the given displacement.
    #[wasm_bindgen(js_name = handleSwipe)]
    pub fn handle_swipe(&mut self, dx: f64, dy: f64) -> JsValue {
        self.apply(swipe_direction(dx, dy))
    }

    /// Current snapshot without applying any input.
    pub fn state(&self) -> JsValue {
        self.to_js(false)
    }

    #[wasm_bindgen(js_name = getScore)]
    pub fn get_score(&self) -> u32 {
        self.state.score
    }

    #[wasm_bindgen(js_name = getStatus)]
    pub fn get_status(&self) -> String {
        match self.state.status {
            GameStatus::Playing => "playing",
            GameStatus::Won => "won",
            GameStatus::Lost => "lost",
        }
        .to_string()
    }
}

impl WasmGame {
    fn apply(&mut self, direction: Option<Direction>) -> JsValue {
        let changed = direction.map_or(false, |direction| self.step(direction));
        self.to_js(changed)
    }

    /// Advance the session by one move; false if the board did not change.
    fn step(&mut self, direction: Direction) -> bool {
        let advanced = match self.game.make_move(&self.state, direction) {
            Cow::Owned(next) => Some(next),
            Cow::Borrowed(_) => None,
        };
        match advanced {
            Some(next) => {
                self.marks = highlights(Some(&self.state), &next);
                self.state = next;
                true
            }
            None => false,
        }
    }

    fn snapshot(&self, changed: bool) -> JsSnapshot {
        let tiles = self
            .state
            .grid
            .tiles()
            .map(|tile| JsTile {
                id: tile.id(),
                value: tile.value(),
                row: tile.position().row,
                col: tile.position().col,
                merged_from: tile.merged_from().map(|(a, b)| [a.id(), b.id()]),
            })
            .collect();
        JsSnapshot {
            size: self.state.grid.size(),
            tiles,
            score: self.state.score,
            status: self.state.status,
            has_won: self.state.has_won,
            changed,
            highlights: self.marks.clone(),
        }
    }

    fn to_js(&self, changed: bool) -> JsValue {
        serde_wasm_bindgen::to_value(&self.snapshot(changed)).unwrap_or_else(|err| {
            log::warn!("failed to serialize snapshot: {err}");
            JsValue::NULL
        })
    }
}
