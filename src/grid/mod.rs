//! # Grid Module
//!
//! Tile taxonomy, the 2D grid container and coordinate utilities.
//!
//! Coordinates are tile offsets from the top-left corner: `x` grows east and
//! `y` grows south. Reads outside a grid yield wall, so neighbour helpers
//! here never clip against bounds; callers decide what off-grid means.

pub mod flood;
pub mod map;
pub mod tile;

pub use flood::*;
pub use map::*;
pub use tile::*;

use serde::{Deserialize, Serialize};

/// A tile coordinate. May lie outside any particular grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The top-left tile.
    pub fn origin() -> Self {
        Self::new(0, 0)
    }

    /// Taxicab distance; the length of an L-shaped corridor between the two tiles.
    pub fn manhattan_distance(self, other: Position) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    pub fn euclidean_distance(self, other: Position) -> f64 {
        f64::from(self.x - other.x).hypot(f64::from(self.y - other.y))
    }

    /// The four edge-sharing tiles, in the order north, west, east, south.
    ///
    /// Walkability and connectivity are always judged over this set.
    pub fn orthogonal(self) -> [Position; 4] {
        let Position { x, y } = self;
        [Position::new(x, y - 1), Position::new(x - 1, y), Position::new(x + 1, y), Position::new(x, y + 1)]
    }

    /// The eight tiles of the surrounding 3x3 block, row by row from the north.
    pub fn ring(self) -> [Position; 8] {
        let Position { x, y } = self;
        [
            Position::new(x - 1, y - 1),
            Position::new(x, y - 1),
            Position::new(x + 1, y - 1),
            Position::new(x - 1, y),
            Position::new(x + 1, y),
            Position::new(x - 1, y + 1),
            Position::new(x, y + 1),
            Position::new(x + 1, y + 1),
        ]
    }

    /// True when the tile falls inside a `width` x `height` grid.
    pub fn in_bounds(self, width: u32, height: u32) -> bool {
        u32::try_from(self.x).is_ok_and(|x| x < width) && u32::try_from(self.y).is_ok_and(|y| y < height)
    }

    pub fn step(self, direction: Direction) -> Position {
        self + direction.to_delta()
    }
}

impl std::ops::Add for Position {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl std::ops::Sub for Position {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

/// An orthogonal heading, used for maze passages and door orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Direction::North, Direction::South, Direction::East, Direction::West];

    /// Unit offset of one step; north is `y - 1`.
    pub fn to_delta(self) -> Position {
        match self {
            Direction::North => Position::new(0, -1),
            Direction::South => Position::new(0, 1),
            Direction::East => Position::new(1, 0),
            Direction::West => Position::new(-1, 0),
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
        }
    }
}
