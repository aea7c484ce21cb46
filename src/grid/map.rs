//! # Grid Container
//!
//! The generated map: a fixed-size 2D array of tiles plus the metadata
//! generators attach to it (rooms, stairs, water features).

use crate::generation::{Room, WaterFeature};
use crate::{Position, TileType};
use serde::{Deserialize, Serialize};

/// A fully generated tile map.
///
/// Reads outside the grid return [`TileType::Wall`] and writes outside the grid
/// are ignored, so callers never need to bounds-check before querying.
///
/// # Examples
///
/// ```
/// use strata::{Grid, Position, TileType};
///
/// let mut grid = Grid::new(10, 8);
/// grid.set_tile(Position::new(3, 3), TileType::Floor);
/// assert_eq!(grid.get_tile(Position::new(3, 3)), TileType::Floor);
/// assert_eq!(grid.get_tile(Position::new(-1, 3)), TileType::Wall);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    width: u32,
    height: u32,
    tiles: Vec<TileType>,
    /// Rooms carved by the generator, in generation order
    pub rooms: Vec<Room>,
    /// Seed this grid was generated from
    pub seed: i64,
    /// Level index within a multi-level stack
    pub level: usize,
    /// Up-stair coordinates
    pub stairs_up: Vec<Position>,
    /// Down-stair coordinates
    pub stairs_down: Vec<Position>,
    /// Water bodies synthesised on this grid
    pub water_features: Vec<WaterFeature>,
    /// Name of the generator that produced this grid
    pub generator: String,
}

impl Grid {
    /// Creates a grid filled with walls.
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, TileType::Wall)
    }

    /// Creates a grid filled with the given tile.
    pub fn filled(width: u32, height: u32, tile: TileType) -> Self {
        Self {
            width,
            height,
            tiles: vec![tile; width as usize * height as usize],
            rooms: Vec::new(),
            seed: 0,
            level: 0,
            stairs_up: Vec::new(),
            stairs_down: Vec::new(),
            water_features: Vec::new(),
            generator: String::new(),
        }
    }

    /// Width in tiles.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in tiles.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Total number of tiles.
    pub fn area(&self) -> usize {
        self.tiles.len()
    }

    /// Raw tiles in row-major order.
    pub fn tiles(&self) -> &[TileType] {
        &self.tiles
    }

    fn index(&self, pos: Position) -> Option<usize> {
        if pos.in_bounds(self.width, self.height) {
            Some(pos.y as usize * self.width as usize + pos.x as usize)
        } else {
            None
        }
    }

    /// Checks if a position lies inside the grid.
    pub fn is_in_bounds(&self, pos: Position) -> bool {
        pos.in_bounds(self.width, self.height)
    }

    /// Gets the tile at a position, or a wall when out of bounds.
    pub fn get_tile(&self, pos: Position) -> TileType {
        self.index(pos)
            .map(|index| self.tiles[index])
            .unwrap_or(TileType::Wall)
    }

    /// Sets the tile at a position. Out-of-bounds writes are ignored.
    pub fn set_tile(&mut self, pos: Position, tile: TileType) {
        if let Some(index) = self.index(pos) {
            self.tiles[index] = tile;
        }
    }

    /// Checks if the tile at a position can be walked on.
    pub fn is_walkable(&self, pos: Position) -> bool {
        self.get_tile(pos).is_walkable()
    }

    /// Fills an axis-aligned rectangle, clipped to the grid.
    pub fn fill_rect(&mut self, top_left: Position, width: u32, height: u32, tile: TileType) {
        for y in top_left.y..top_left.y + height as i32 {
            for x in top_left.x..top_left.x + width as i32 {
                self.set_tile(Position::new(x, y), tile);
            }
        }
    }

    /// Iterates over every position in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = Position> {
        let width = self.width as i32;
        let height = self.height as i32;
        (0..height).flat_map(move |y| (0..width).map(move |x| Position::new(x, y)))
    }

    /// All walkable positions in row-major order.
    pub fn walkable_positions(&self) -> Vec<Position> {
        self.positions().filter(|&pos| self.is_walkable(pos)).collect()
    }

    /// Number of walkable tiles.
    pub fn count_walkable(&self) -> usize {
        self.tiles.iter().filter(|tile| tile.is_walkable()).count()
    }

    /// Number of tiles of the given kind.
    pub fn count(&self, kind: TileType) -> usize {
        self.tiles.iter().filter(|&&tile| tile == kind).count()
    }

    /// Fraction of tiles that are walkable, in `[0, 1]`.
    pub fn walkable_ratio(&self) -> f64 {
        if self.tiles.is_empty() {
            return 0.0;
        }
        self.count_walkable() as f64 / self.tiles.len() as f64
    }

    /// Checks that a stair at `pos` could be stepped off: at least one orthogonal
    /// neighbour is walkable and is not itself a stair.
    pub fn has_exit(&self, pos: Position) -> bool {
        pos.orthogonal().into_iter().any(|neighbor| {
            let tile = self.get_tile(neighbor);
            tile.is_walkable() && !tile.is_stairs()
        })
    }

    /// Places an up-stair and records it.
    pub fn place_stairs_up(&mut self, pos: Position) {
        if self.is_in_bounds(pos) {
            self.set_tile(pos, TileType::StairsUp);
            self.stairs_up.push(pos);
        }
    }

    /// Places a down-stair and records it.
    pub fn place_stairs_down(&mut self, pos: Position) {
        if self.is_in_bounds(pos) {
            self.set_tile(pos, TileType::StairsDown);
            self.stairs_down.push(pos);
        }
    }

    /// Turns every recorded stair back into floor and forgets it.
    pub fn clear_stairs(&mut self) {
        let stairs: Vec<Position> = self.stairs_up.drain(..).chain(self.stairs_down.drain(..)).collect();
        for pos in stairs {
            if self.get_tile(pos).is_stairs() {
                self.set_tile(pos, TileType::Floor);
            }
        }
    }

    /// All recorded stairs, up-stairs first.
    pub fn all_stairs(&self) -> impl Iterator<Item = Position> + '_ {
        self.stairs_up.iter().chain(self.stairs_down.iter()).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_grid_is_all_wall() {
        let grid = Grid::new(12, 7);
        assert_eq!(grid.width(), 12);
        assert_eq!(grid.height(), 7);
        assert_eq!(grid.area(), 84);
        assert_eq!(grid.count(TileType::Wall), 84);
        assert_eq!(grid.walkable_ratio(), 0.0);
    }

    #[test]
    fn test_out_of_bounds_access() {
        let mut grid = Grid::filled(5, 5, TileType::Floor);
        assert_eq!(grid.get_tile(Position::new(5, 0)), TileType::Wall);
        assert_eq!(grid.get_tile(Position::new(0, -1)), TileType::Wall);
        assert!(!grid.is_walkable(Position::new(-3, -3)));

        let before = grid.clone();
        grid.set_tile(Position::new(5, 5), TileType::Tree);
        grid.set_tile(Position::new(-1, 2), TileType::Tree);
        assert_eq!(grid, before);
    }

    #[test]
    fn test_fill_rect_is_clipped() {
        let mut grid = Grid::new(6, 6);
        grid.fill_rect(Position::new(4, 4), 5, 5, TileType::Floor);
        assert_eq!(grid.count(TileType::Floor), 4);
    }

    #[test]
    fn test_positions_are_row_major() {
        let grid = Grid::new(3, 2);
        let positions: Vec<_> = grid.positions().collect();
        assert_eq!(positions.len(), 6);
        assert_eq!(positions[0], Position::new(0, 0));
        assert_eq!(positions[1], Position::new(1, 0));
        assert_eq!(positions[3], Position::new(0, 1));
    }

    #[test]
    fn test_stairs_bookkeeping() {
        let mut grid = Grid::filled(5, 5, TileType::Floor);
        grid.place_stairs_up(Position::new(1, 1));
        grid.place_stairs_down(Position::new(3, 3));
        grid.place_stairs_down(Position::new(9, 9));
        assert_eq!(grid.stairs_up, vec![Position::new(1, 1)]);
        assert_eq!(grid.stairs_down, vec![Position::new(3, 3)]);
        assert!(grid.has_exit(Position::new(1, 1)));

        grid.clear_stairs();
        assert!(grid.stairs_up.is_empty());
        assert!(grid.stairs_down.is_empty());
        assert_eq!(grid.get_tile(Position::new(3, 3)), TileType::Floor);
    }

    #[test]
    fn test_stair_exit_requires_non_stair_neighbor() {
        let mut grid = Grid::new(5, 5);
        grid.set_tile(Position::new(2, 2), TileType::StairsUp);
        grid.set_tile(Position::new(2, 3), TileType::StairsDown);
        assert!(!grid.has_exit(Position::new(2, 2)));

        grid.set_tile(Position::new(1, 2), TileType::WaterShallow);
        assert!(grid.has_exit(Position::new(2, 2)));
    }
}
