//! Grid store: the square board, its cells, and tile identity allocation.

use serde::{Deserialize, Serialize};

use crate::error::GridError;

/// Identifier assigned to a tile when it is created.
pub type TileId = u64;

/// Monotonic source of tile identifiers.
///
/// Every tile created by a spawn or a merge takes the next id. The counter
/// only goes back to the start through [`TileIds::reset`], which is meant for
/// test setup and starting a new game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileIds {
    next: TileId,
}

impl TileIds {
    const FIRST: TileId = 1;

    pub fn new() -> Self {
        TileIds { next: Self::FIRST }
    }

    /// Allocate the next identifier.
    pub fn next_id(&mut self) -> TileId {
        let id = self.next;
        self.next += 1;
        id
    }

    /// The identifier the next allocation will return.
    pub fn peek(&self) -> TileId {
        self.next
    }

    pub fn reset(&mut self) {
        self.next = Self::FIRST;
    }
}

impl Default for TileIds {
    fn default() -> Self {
        Self::new()
    }
}

/// A board coordinate, 0-indexed from the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    pub const fn new(row: usize, col: usize) -> Self {
        Cell { row, col }
    }
}

/// One numbered piece on the board.
///
/// `id` and `value` never change after creation. `position` is only rewritten
/// by the move engine on its private working copy of a grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    id: TileId,
    value: u32,
    position: Cell,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    merged_from: Option<Box<(Tile, Tile)>>,
}

impl Tile {
    /// Build a tile with an already allocated id and no merge record.
    ///
    /// Outside the crate, tiles come from [`crate::create_tile`] so that ids
    /// stay unique.
    pub(crate) fn new(id: TileId, value: u32, position: Cell) -> Self {
        Tile {
            id,
            value,
            position,
            merged_from: None,
        }
    }

    /// Callers gate on [`crate::can_merge`], which rules out a `u32` overflow.
    pub(crate) fn merged(id: TileId, sources: (Tile, Tile)) -> Self {
        Tile {
            id,
            value: sources.0.value + sources.1.value,
            position: sources.1.position,
            merged_from: Some(Box::new(sources)),
        }
    }

    pub fn id(&self) -> TileId {
        self.id
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    pub fn position(&self) -> Cell {
        self.position
    }

    /// The pair this tile was merged from, if it was created by a merge in
    /// the most recent move.
    pub fn merged_from(&self) -> Option<(&Tile, &Tile)> {
        self.merged_from.as_deref().map(|(a, b)| (a, b))
    }

    pub fn is_merged(&self) -> bool {
        self.merged_from.is_some()
    }

    pub(crate) fn clear_merge_record(&mut self) {
        self.merged_from = None;
    }
}

/// A fixed-size square board.
///
/// Cells are stored row-major: index `row * size + col`. Every occupied
/// cell's tile has `position` equal to that cell.
///
/// Deserialization goes through the same checks as the constructors, so a
/// decoded grid upholds these invariants too.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawGrid")]
pub struct Grid {
    size: usize,
    cells: Vec<Option<Tile>>,
}

/// Unchecked wire shape of a [`Grid`].
#[derive(Deserialize)]
struct RawGrid {
    size: usize,
    cells: Vec<Option<Tile>>,
}

impl TryFrom<RawGrid> for Grid {
    type Error = GridError;

    fn try_from(raw: RawGrid) -> Result<Self, Self::Error> {
        let RawGrid { size, cells } = raw;
        let mut grid = Grid::new(size)?;
        check_cell_count(size, cells.len())?;
        for (idx, tile) in cells.into_iter().enumerate() {
            let Some(tile) = tile else { continue };
            let cell = Cell::new(idx / size, idx % size);
            if tile.position != cell {
                return Err(GridError::InvalidArgument(format!(
                    "tile {} at cell ({}, {}) claims position ({}, {})",
                    tile.id, cell.row, cell.col, tile.position.row, tile.position.col
                )));
            }
            check_value(tile.value)?;
            grid.cells[idx] = Some(tile);
        }
        Ok(grid)
    }
}

fn check_cell_count(size: usize, len: usize) -> Result<(), GridError> {
    if len != size * size {
        return Err(GridError::InvalidArgument(format!(
            "expected {} values for a {size}x{size} grid, got {len}",
            size * size
        )));
    }
    Ok(())
}

/// Tile values are powers of two, 2 or larger.
fn check_value(value: u32) -> Result<(), GridError> {
    if value < 2 || !value.is_power_of_two() {
        return Err(GridError::InvalidArgument(format!(
            "tile value {value} is not a power of two of at least 2"
        )));
    }
    Ok(())
}

impl Grid {
    /// Create an empty `size` x `size` grid.
    pub fn new(size: usize) -> Result<Self, GridError> {
        if size == 0 {
            return Err(GridError::InvalidArgument(
                "grid size must be positive".to_string(),
            ));
        }
        Ok(Grid {
            size,
            cells: vec![None; size * size],
        })
    }

    /// Build a grid from row-major tile values, 0 meaning an empty cell.
    ///
    /// Tiles take fresh ids from `ids` in scan order. Every non-zero value
    /// must be a power of two of at least 2; nothing is allocated otherwise.
    pub fn from_values(ids: &mut TileIds, size: usize, values: &[u32]) -> Result<Self, GridError> {
        let mut grid = Grid::new(size)?;
        check_cell_count(size, values.len())?;
        for &value in values.iter().filter(|&&value| value != 0) {
            check_value(value)?;
        }
        for (idx, &value) in values.iter().enumerate() {
            if value != 0 {
                let cell = Cell::new(idx / size, idx % size);
                grid.cells[idx] = Some(Tile::new(ids.next_id(), value, cell));
            }
        }
        Ok(grid)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    fn index(&self, cell: Cell) -> Option<usize> {
        (cell.row < self.size && cell.col < self.size).then(|| cell.row * self.size + cell.col)
    }

    /// All unoccupied cells, top-to-bottom then left-to-right.
    pub fn empty_cells(&self) -> Vec<Cell> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, tile)| tile.is_none())
            .map(|(idx, _)| Cell::new(idx / self.size, idx % self.size))
            .collect()
    }

    /// The tile at `cell`, or `None` if the cell is empty or off the board.
    pub fn tile_at(&self, cell: Cell) -> Option<&Tile> {
        self.index(cell).and_then(|idx| self.cells[idx].as_ref())
    }

    /// Return a copy of this grid with `cell` holding `tile` (or cleared).
    ///
    /// The placed tile's position is set to `cell`.
    pub fn set_tile_at(&self, cell: Cell, tile: Option<Tile>) -> Result<Grid, GridError> {
        let idx = self.index(cell).ok_or(GridError::OutOfBounds {
            cell,
            size: self.size,
        })?;
        let mut next = self.clone();
        next.cells[idx] = tile.map(|mut t| {
            t.position = cell;
            t
        });
        Ok(next)
    }

    pub fn count_tiles(&self) -> usize {
        self.cells.iter().filter(|tile| tile.is_some()).count()
    }

    /// Occupied tiles in row-major order.
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.cells.iter().flatten()
    }

    /// Row-major tile values with 0 for empty cells.
    pub fn values(&self) -> Vec<u32> {
        self.cells
            .iter()
            .map(|tile| tile.as_ref().map_or(0, Tile::value))
            .collect()
    }

    /// Highest tile value on the board, 0 when empty.
    pub fn max_value(&self) -> u32 {
        self.tiles().map(Tile::value).max().unwrap_or(0)
    }

    /// Per-cell value equality, ignoring tile identity.
    pub fn same_values(&self, other: &Grid) -> bool {
        self.size == other.size
            && self
                .cells
                .iter()
                .zip(&other.cells)
                .all(|(a, b)| a.as_ref().map(Tile::value) == b.as_ref().map(Tile::value))
    }

    // Working-copy access for the move engine. Callers stay within bounds.

    pub(crate) fn take(&mut self, cell: Cell) -> Option<Tile> {
        self.cells[cell.row * self.size + cell.col].take()
    }

    pub(crate) fn place(&mut self, cell: Cell, tile: Option<Tile>) {
        self.cells[cell.row * self.size + cell.col] = tile.map(|mut t| {
            t.position = cell;
            t
        });
    }

    pub(crate) fn clear_merge_records(&mut self) {
        for tile in self.cells.iter_mut().flatten() {
            tile.clear_merge_record();
        }
    }
}

impl Default for Grid {
    /// An empty board of the standard size.
    fn default() -> Self {
        Grid {
            size: crate::DEFAULT_GRID_SIZE,
            cells: vec![None; crate::DEFAULT_GRID_SIZE * crate::DEFAULT_GRID_SIZE],
        }
    }
}

impl std::fmt::Display for Grid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let separator = format!("+{}", "------+".repeat(self.size));
        writeln!(f, "{separator}")?;
        for row in self.cells.chunks(self.size) {
            write!(f, "|")?;
            for cell in row {
                match cell {
                    Some(tile) => write!(f, "{:^6}|", tile.value)?,
                    None => write!(f, "      |")?,
                }
            }
            writeln!(f)?;
            writeln!(f, "{separator}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(ids: &mut TileIds) -> Grid {
        Grid::from_values(ids, 4, &[2, 0, 0, 0, 0, 4, 0, 0, 0, 0, 0, 0, 0, 0, 0, 8]).unwrap()
    }

    // -------------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------------

    #[test]
    fn test_new_grid_is_empty() {
        let grid = Grid::new(4).unwrap();
        assert_eq!(grid.size(), 4);
        assert_eq!(grid.count_tiles(), 0);
        assert_eq!(grid.empty_cells().len(), 16);
    }

    #[test]
    fn test_new_grid_rejects_zero_size() {
        assert!(matches!(Grid::new(0), Err(GridError::InvalidArgument(_))));
    }

    #[test]
    fn test_from_values_wrong_length() {
        let mut ids = TileIds::new();
        let err = Grid::from_values(&mut ids, 4, &[2, 2]).unwrap_err();
        assert!(err.to_string().contains("expected 16 values"));
    }

    #[test]
    fn test_from_values_assigns_positions_and_ids() {
        let mut ids = TileIds::new();
        let grid = sample(&mut ids);
        let tiles: Vec<_> = grid.tiles().collect();
        assert_eq!(tiles.len(), 3);
        assert_eq!(tiles[0].id(), 1);
        assert_eq!(tiles[1].position(), Cell::new(1, 1));
        assert_eq!(tiles[2].position(), Cell::new(3, 3));
        assert_eq!(ids.peek(), 4);
    }

    #[test]
    fn test_from_values_rejects_non_power_of_two() {
        for bad in [1, 3, 6, 100] {
            let mut ids = TileIds::new();
            let err = Grid::from_values(&mut ids, 2, &[2, bad, 0, 0]).unwrap_err();
            assert!(matches!(err, GridError::InvalidArgument(_)), "{bad}");
            assert_eq!(ids.peek(), TileIds::FIRST);
        }
    }

    #[test]
    fn test_from_values_accepts_largest_power_of_two() {
        let mut ids = TileIds::new();
        let grid = Grid::from_values(&mut ids, 2, &[1 << 31, 2, 0, 0]).unwrap();
        assert_eq!(grid.max_value(), 1 << 31);
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    #[test]
    fn test_empty_cells_row_major() {
        let mut ids = TileIds::new();
        let grid = Grid::from_values(&mut ids, 2, &[0, 2, 0, 0]).unwrap();
        assert_eq!(
            grid.empty_cells(),
            vec![Cell::new(0, 0), Cell::new(1, 0), Cell::new(1, 1)]
        );
    }

    #[test]
    fn test_tile_at_out_of_bounds_is_none() {
        let mut ids = TileIds::new();
        let grid = sample(&mut ids);
        assert_eq!(grid.tile_at(Cell::new(0, 0)).map(Tile::value), Some(2));
        assert!(grid.tile_at(Cell::new(0, 1)).is_none());
        assert!(grid.tile_at(Cell::new(4, 0)).is_none());
        assert!(grid.tile_at(Cell::new(0, 17)).is_none());
    }

    #[test]
    fn test_max_value_and_values() {
        let mut ids = TileIds::new();
        let grid = sample(&mut ids);
        assert_eq!(grid.max_value(), 8);
        assert_eq!(grid.values()[5], 4);
        assert_eq!(Grid::new(3).unwrap().max_value(), 0);
    }

    // -------------------------------------------------------------------------
    // Copy semantics
    // -------------------------------------------------------------------------

    #[test]
    fn test_set_tile_at_leaves_input_untouched() {
        let mut ids = TileIds::new();
        let grid = Grid::new(4).unwrap();
        let tile = Tile::new(ids.next_id(), 2, Cell::new(0, 0));
        let next = grid.set_tile_at(Cell::new(2, 3), Some(tile)).unwrap();

        assert_eq!(grid.count_tiles(), 0);
        assert_eq!(next.count_tiles(), 1);
        let placed = next.tile_at(Cell::new(2, 3)).unwrap();
        assert_eq!(placed.position(), Cell::new(2, 3));
    }

    #[test]
    fn test_set_tile_at_clears_cell() {
        let mut ids = TileIds::new();
        let grid = sample(&mut ids);
        let cleared = grid.set_tile_at(Cell::new(0, 0), None).unwrap();
        assert_eq!(cleared.count_tiles(), 2);
        assert_eq!(grid.count_tiles(), 3);
    }

    #[test]
    fn test_set_tile_at_out_of_bounds() {
        let grid = Grid::new(4).unwrap();
        let err = grid.set_tile_at(Cell::new(4, 4), None).unwrap_err();
        assert_eq!(
            err,
            GridError::OutOfBounds {
                cell: Cell::new(4, 4),
                size: 4
            }
        );
    }

    #[test]
    fn test_clone_is_deep() {
        let mut ids = TileIds::new();
        let grid = sample(&mut ids);
        let mut copy = grid.clone();
        let tile = copy.take(Cell::new(0, 0));
        copy.place(Cell::new(2, 2), tile);

        assert_eq!(grid.tile_at(Cell::new(0, 0)).unwrap().position(), Cell::new(0, 0));
        assert_eq!(copy.tile_at(Cell::new(2, 2)).unwrap().position(), Cell::new(2, 2));
    }

    #[test]
    fn test_same_values_ignores_ids() {
        let mut ids = TileIds::new();
        let a = sample(&mut ids);
        let b = sample(&mut ids);
        assert_ne!(a, b);
        assert!(a.same_values(&b));
    }

    #[test]
    fn test_tile_ids_reset() {
        let mut ids = TileIds::new();
        assert_eq!(ids.next_id(), 1);
        assert_eq!(ids.next_id(), 2);
        ids.reset();
        assert_eq!(ids.next_id(), 1);
    }

    #[test]
    fn test_display_format() {
        let mut ids = TileIds::new();
        let display = sample(&mut ids).to_string();
        assert!(display.starts_with("+------+------+------+------+"));
        assert!(display.contains("|  2   |"));
    }

    // -------------------------------------------------------------------------
    // Deserialization
    // -------------------------------------------------------------------------

    #[test]
    fn test_deserialize_accepts_serialized_grid() {
        let mut ids = TileIds::new();
        let grid = sample(&mut ids);
        let json = serde_json::to_string(&grid).unwrap();
        let decoded: Grid = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, grid);
    }

    #[test]
    fn test_deserialize_rejects_zero_size() {
        let err = serde_json::from_str::<Grid>(r#"{"size":0,"cells":[]}"#).unwrap_err();
        assert!(err.to_string().contains("grid size must be positive"));
    }

    #[test]
    fn test_deserialize_rejects_wrong_cell_count() {
        let err = serde_json::from_str::<Grid>(r#"{"size":4,"cells":[null,null,null]}"#)
            .unwrap_err();
        assert!(err.to_string().contains("expected 16 values"));
    }

    #[test]
    fn test_deserialize_rejects_misplaced_tile() {
        let json = r#"{"size":2,"cells":[
            {"id":1,"value":2,"position":{"row":1,"col":1}},null,null,null]}"#;
        let err = serde_json::from_str::<Grid>(json).unwrap_err();
        assert!(err.to_string().contains("claims position (1, 1)"));
    }

    #[test]
    fn test_deserialize_rejects_bad_value() {
        let json = r#"{"size":2,"cells":[
            {"id":1,"value":3,"position":{"row":0,"col":0}},null,null,null]}"#;
        let err = serde_json::from_str::<Grid>(json).unwrap_err();
        assert!(err.to_string().contains("not a power of two"));
    }
}
