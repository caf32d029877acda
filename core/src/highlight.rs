//! Per-turn presentation hints derived from two consecutive snapshots.
//!
//! Nothing here is stored in [`GameState`]; renderers call [`highlights`]
//! after each accepted move to decide which tiles get a "new" or "merged"
//! animation.

use std::collections::HashSet;

use serde::Serialize;

use crate::game::GameState;
use crate::grid::TileId;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Highlights {
    /// Tiles spawned since the previous snapshot.
    pub new_tiles: Vec<TileId>,
    /// Tiles created by a merge since the previous snapshot.
    pub merged_tiles: Vec<TileId>,
}

/// Compare `current` against the snapshot shown before it.
///
/// With no previous snapshot every tile counts as new, which is what a
/// freshly initialized game should show.
pub fn highlights(previous: Option<&GameState>, current: &GameState) -> Highlights {
    let seen: HashSet<TileId> = previous
        .map(|state| state.grid.tiles().map(|tile| tile.id()).collect())
        .unwrap_or_default();

    let mut out = Highlights::default();
    for tile in current.grid.tiles().filter(|tile| !seen.contains(&tile.id())) {
        if tile.is_merged() {
            out.merged_tiles.push(tile.id());
        } else {
            out.new_tiles.push(tile.id());
        }
    }
    out
}
