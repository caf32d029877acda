use crate::grid::Cell;

/// Errors raised when a grid is constructed or written with bad arguments.
///
/// These indicate a programming error in the caller; no gameplay path
/// produces them.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("cell ({}, {}) is outside a {size}x{size} grid", .cell.row, .cell.col)]
    OutOfBounds { cell: Cell, size: usize },
}

/// A direction token that is not one of `up`, `down`, `left`, `right`.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown direction {0:?}, expected up, down, left or right")]
pub struct ParseDirectionError(pub String);
