//! Mapping raw keyboard and touch input onto move directions.

use crate::tile::Direction;

/// Minimum travel, in pixels, before a touch counts as a swipe.
pub const SWIPE_THRESHOLD: f64 = 50.0;

impl Direction {
    /// Direction bound to a DOM-style key name (`ArrowUp`, `w`, ...).
    pub fn from_key(key: &str) -> Option<Direction> {
        match key {
            "ArrowUp" | "w" | "W" => Some(Direction::Up),
            "ArrowDown" | "s" | "S" => Some(Direction::Down),
            "ArrowLeft" | "a" | "A" => Some(Direction::Left),
            "ArrowRight" | "d" | "D" => Some(Direction::Right),
            _ => None,
        }
    }
}

/// Classify a touch gesture by its displacement, screen y growing downward.
///
/// The dominant axis decides; a tie goes to the vertical axis. Gestures
/// shorter than [`SWIPE_THRESHOLD`] on both axes are ignored.
pub fn swipe_direction(dx: f64, dy: f64) -> Option<Direction> {
    let (abs_x, abs_y) = (dx.abs(), dy.abs());
    if abs_x.max(abs_y) < SWIPE_THRESHOLD {
        return None;
    }
    let direction = if abs_x > abs_y {
        if dx > 0.0 {
            Direction::Right
        } else {
            Direction::Left
        }
    } else if dy > 0.0 {
        Direction::Down
    } else {
        Direction::Up
    };
    Some(direction)
}
