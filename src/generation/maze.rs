//! # Maze Generation
//!
//! Perfect mazes carved by iterative backtracking over a lattice of cells,
//! with optional double-wide passages. Dead ends may grow into small rooms or
//! flood into water hazards.

use crate::config::{DEFAULT_HEIGHT, DEFAULT_WIDTH, MAX_DIMENSION};
use crate::generation::utils::{
    self, create_rng, nearest_stair_spot, resolve_difficulty, resolve_dimensions, unit_fraction, GenRng,
};
use crate::generation::water::{WaterFeature, WaterFeatureKind};
use crate::{
    Direction, GenerationParams, Generator, Grid, Position, Room, RoomType, StrataError, StrataResult, TileType,
};
use rand::seq::SliceRandom;
use rand::Rng;

/// Chance that a dead end left alone becomes a water hazard, at difficulty 1.
/// The chance scales linearly with difficulty, giving 20% at the default 0.5.
const MAX_HAZARD_CHANCE: f64 = 0.4;

/// Widest corner region searched for stairs.
const STAIR_MARGIN: i32 = 10;

/// Recursive-backtracking maze generator.
#[derive(Debug, Clone, Default)]
pub struct MazeGenerator;

/// Resolved maze settings for one generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct MazeConfig {
    /// Odd width actually generated
    pub width: u32,
    /// Odd height actually generated
    pub height: u32,
    /// Passage width in tiles, 1 or 2
    pub corridor_width: u32,
    /// Chance that a dead end becomes a room
    pub room_chance: f64,
    /// Chance that an untouched dead end floods
    pub hazard_chance: f64,
}

impl MazeConfig {
    /// Resolves maze settings. Even dimensions are bumped to the next odd value.
    pub fn resolve(params: &GenerationParams) -> StrataResult<Self> {
        let (width, height) = resolve_dimensions(&params.custom, DEFAULT_WIDTH, DEFAULT_HEIGHT, MAX_DIMENSION)?;
        let (width, height) = (width | 1, height | 1);
        if width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(StrataError::InvalidConfig(format!(
                "maze dimensions round up to {width}x{height}, exceeding maximum {MAX_DIMENSION}"
            )));
        }
        let corridor_width = params.custom.corridor_width.unwrap_or(1);
        if !(1..=2).contains(&corridor_width) {
            return Err(StrataError::InvalidConfig(format!(
                "corridorWidth must be 1 or 2, got {corridor_width}"
            )));
        }
        Ok(Self {
            width,
            height,
            corridor_width,
            room_chance: unit_fraction("roomChance", params.custom.room_chance, 0.1)?,
            hazard_chance: resolve_difficulty(params)? * MAX_HAZARD_CHANCE,
        })
    }
}

/// Lattice of maze cells laid over the grid.
#[derive(Debug, Clone, Copy)]
struct CellLattice {
    cols: i32,
    rows: i32,
    size: i32,
}

impl CellLattice {
    fn new(width: u32, height: u32, corridor_width: u32) -> Self {
        let size = corridor_width as i32;
        let stride = size + 1;
        let span = |extent: u32| {
            let free = extent as i32 - 2 - size;
            if free < 0 {
                0
            } else {
                free / stride + 1
            }
        };
        Self {
            cols: span(width),
            rows: span(height),
            size,
        }
    }

    fn count(&self) -> usize {
        (self.cols * self.rows) as usize
    }

    fn index(&self, col: i32, row: i32) -> usize {
        (row * self.cols + col) as usize
    }

    /// Top-left tile of a cell.
    fn origin(&self, col: i32, row: i32) -> Position {
        let stride = self.size + 1;
        Position::new(1 + col * stride, 1 + row * stride)
    }

    fn carve_cell(&self, grid: &mut Grid, col: i32, row: i32, tile: TileType) {
        let origin = self.origin(col, row);
        grid.fill_rect(origin, self.size as u32, self.size as u32, tile);
    }

    /// Tiles of the wall strip between a cell and its neighbour in `direction`.
    fn passage(&self, col: i32, row: i32, direction: Direction) -> Vec<Position> {
        let origin = self.origin(col, row);
        (0..self.size)
            .map(|offset| match direction {
                Direction::East => Position::new(origin.x + self.size, origin.y + offset),
                Direction::West => Position::new(origin.x - 1, origin.y + offset),
                Direction::South => Position::new(origin.x + offset, origin.y + self.size),
                Direction::North => Position::new(origin.x + offset, origin.y - 1),
            })
            .collect()
    }
}

impl MazeGenerator {
    /// Creates a maze generator.
    pub fn new() -> Self {
        Self
    }

    /// Carves a spanning tree of passages with an explicit backtracking stack.
    ///
    /// Returns, per cell, the directions it was opened towards.
    fn carve(&self, grid: &mut Grid, lattice: &CellLattice, rng: &mut GenRng) -> Vec<Vec<Direction>> {
        let mut links: Vec<Vec<Direction>> = vec![Vec::new(); lattice.count()];
        let mut visited = vec![false; lattice.count()];
        let start = (rng.gen_range(0..lattice.cols), rng.gen_range(0..lattice.rows));
        visited[lattice.index(start.0, start.1)] = true;
        lattice.carve_cell(grid, start.0, start.1, TileType::Floor);
        let mut stack = vec![start];

        while let Some(&(col, row)) = stack.last() {
            let mut directions = Direction::ALL;
            directions.shuffle(rng);
            let next = directions.into_iter().find_map(|direction| {
                let delta = direction.to_delta();
                let (next_col, next_row) = (col + delta.x, row + delta.y);
                let inside = next_col >= 0 && next_row >= 0 && next_col < lattice.cols && next_row < lattice.rows;
                (inside && !visited[lattice.index(next_col, next_row)]).then_some((direction, next_col, next_row))
            });

            match next {
                Some((direction, next_col, next_row)) => {
                    for pos in lattice.passage(col, row, direction) {
                        grid.set_tile(pos, TileType::Floor);
                    }
                    lattice.carve_cell(grid, next_col, next_row, TileType::Floor);
                    visited[lattice.index(next_col, next_row)] = true;
                    links[lattice.index(col, row)].push(direction);
                    links[lattice.index(next_col, next_row)].push(direction.opposite());
                    stack.push((next_col, next_row));
                }
                None => {
                    stack.pop();
                }
            }
        }

        links
    }

    /// Grows some dead ends into rooms and floods some of the rest.
    fn dress_dead_ends(
        &self,
        grid: &mut Grid,
        lattice: &CellLattice,
        links: &[Vec<Direction>],
        config: &MazeConfig,
        rng: &mut GenRng,
    ) -> (Vec<Room>, Vec<WaterFeature>) {
        let dead_ends: Vec<(i32, i32, Direction)> = (0..lattice.rows)
            .flat_map(|row| (0..lattice.cols).map(move |col| (col, row)))
            .filter_map(|(col, row)| match links[lattice.index(col, row)].as_slice() {
                [direction] => Some((col, row, *direction)),
                _ => None,
            })
            .collect();

        let mut rooms = Vec::new();
        let mut untouched = Vec::new();
        for (col, row, direction) in dead_ends {
            if !rng.gen_bool(config.room_chance) {
                untouched.push((col, row, direction));
                continue;
            }
            let width = rng.gen_range(3..=7);
            let height = rng.gen_range(3..=7);
            let center = lattice.origin(col, row);
            let left = (center.x - width / 2).max(1);
            let top = (center.y - height / 2).max(1);
            let right = (center.x - width / 2 + width - 1).min(grid.width() as i32 - 2);
            let bottom = (center.y - height / 2 + height - 1).min(grid.height() as i32 - 2);
            if right < left || bottom < top {
                untouched.push((col, row, direction));
                continue;
            }
            let room = Room::new(
                rooms.len() as u32,
                Position::new(left, top),
                (right - left + 1) as u32,
                (bottom - top + 1) as u32,
                RoomType::Normal,
            );
            grid.fill_rect(room.top_left, room.width, room.height, TileType::Floor);
            rooms.push(room);
        }

        let mut hazards = Vec::new();
        for (col, row, direction) in untouched {
            let origin = lattice.origin(col, row);
            if rooms.iter().any(|room| room.contains(origin)) || !rng.gen_bool(config.hazard_chance) {
                continue;
            }
            let mut tiles = Vec::new();
            for dy in 0..lattice.size {
                for dx in 0..lattice.size {
                    let tip = Position::new(origin.x + dx, origin.y + dy);
                    if grid.get_tile(tip) == TileType::Floor {
                        grid.set_tile(tip, TileType::WaterDeep);
                        tiles.push(tip);
                    }
                }
            }
            for tail in lattice.passage(col, row, direction) {
                if grid.get_tile(tail) == TileType::Floor && !rooms.iter().any(|room| room.contains(tail)) {
                    grid.set_tile(tail, TileType::WaterShallow);
                    tiles.push(tail);
                }
            }
            if !tiles.is_empty() {
                hazards.push(WaterFeature {
                    kind: WaterFeatureKind::Pool,
                    tiles,
                    bridges: Vec::new(),
                });
            }
        }

        (rooms, hazards)
    }

    /// Places the up-stair in a random corner region and the down-stair in the
    /// opposite one.
    fn place_stairs(&self, grid: &mut Grid, rng: &mut GenRng) -> StrataResult<()> {
        let (width, height) = (grid.width() as i32, grid.height() as i32);
        let margin = STAIR_MARGIN.min(width / 2).min(height / 2).max(1);
        let corners = [
            Position::new(1, 1),
            Position::new(width - 2, 1),
            Position::new(1, height - 2),
            Position::new(width - 2, height - 2),
        ];
        let up_corner = rng.gen_range(0..corners.len());
        let down_corner = corners.len() - 1 - up_corner;

        let find = |grid: &Grid, corner: Position| {
            nearest_stair_spot(grid, corner, Some(margin), true).or_else(|| {
                log::warn!("maze: no stair spot within {margin} tiles of ({}, {})", corner.x, corner.y);
                utils::stair_spot_near(grid, corner)
            })
        };

        let up = find(&*grid, corners[up_corner])
            .ok_or_else(|| StrataError::GenerationFailed("maze has no spot for the up-stair".to_string()))?;
        grid.place_stairs_up(up);
        let down = find(&*grid, corners[down_corner])
            .ok_or_else(|| StrataError::GenerationFailed("maze has no spot for the down-stair".to_string()))?;
        grid.place_stairs_down(down);
        Ok(())
    }
}

impl Generator for MazeGenerator {
    fn generate(&self, seed: i64, params: &GenerationParams) -> StrataResult<Grid> {
        let config = MazeConfig::resolve(params)?;
        let lattice = CellLattice::new(config.width, config.height, config.corridor_width);
        if lattice.count() == 0 {
            return Err(StrataError::GenerationFailed(format!(
                "a {}x{} maze has no room for cells",
                config.width, config.height
            )));
        }

        let mut rng = create_rng(seed);
        let mut grid = Grid::new(config.width, config.height);
        grid.seed = seed;
        grid.level = params.depth as usize;
        grid.generator = self.generator_type().to_string();

        let links = self.carve(&mut grid, &lattice, &mut rng);
        let (rooms, hazards) = self.dress_dead_ends(&mut grid, &lattice, &links, &config, &mut rng);
        log::debug!(
            "maze: {} cells, {} dead-end rooms, {} hazards",
            lattice.count(),
            rooms.len(),
            hazards.len()
        );
        grid.rooms = rooms;
        grid.water_features = hazards;

        self.place_stairs(&mut grid, &mut rng)?;
        log::info!(
            "maze: generated {}x{} maze (seed {seed})",
            config.width,
            config.height
        );
        Ok(grid)
    }

    fn validate(&self, grid: &Grid) -> StrataResult<()> {
        utils::validate_walkable_ratio(grid, 0.2, self.generator_type())?;
        utils::validate_stairs(grid)
    }

    fn generator_type(&self) -> &'static str {
        "maze"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::walkable_components;

    fn maze_params(width: i64, height: i64) -> GenerationParams {
        GenerationParams::new("horror").with_size(width, height)
    }

    #[test]
    fn test_even_dimensions_become_odd() {
        let grid = MazeGenerator::new().generate(3, &maze_params(40, 30)).unwrap();
        assert_eq!(grid.width(), 41);
        assert_eq!(grid.height(), 31);

        let grid = MazeGenerator::new().generate(3, &maze_params(41, 31)).unwrap();
        assert_eq!(grid.width(), 41);
        assert_eq!(grid.height(), 31);
    }

    #[test]
    fn test_odd_rounding_respects_dimension_limit() {
        let mut params = maze_params(MAX_DIMENSION as i64, 5);
        assert!(matches!(MazeConfig::resolve(&params), Err(StrataError::InvalidConfig(_))));
        assert!(matches!(
            MazeGenerator::new().generate(1, &params),
            Err(StrataError::InvalidConfig(_))
        ));

        params = maze_params(5, MAX_DIMENSION as i64);
        assert!(MazeConfig::resolve(&params).is_err());

        params = maze_params(MAX_DIMENSION as i64 - 1, 5);
        let config = MazeConfig::resolve(&params).unwrap();
        assert_eq!((config.width, config.height), (MAX_DIMENSION - 1, 5));
    }

    #[test]
    fn test_hazards_follow_difficulty() {
        let mut params = maze_params(41, 31).with_difficulty(0.0);
        params.custom.room_chance = Some(0.0);
        assert_eq!(MazeConfig::resolve(&params).unwrap().hazard_chance, 0.0);
        for seed in 0..4 {
            let grid = MazeGenerator::new().generate(seed, &params).unwrap();
            assert!(grid.water_features.is_empty());
        }

        params.difficulty = 1.0;
        assert_eq!(MazeConfig::resolve(&params).unwrap().hazard_chance, MAX_HAZARD_CHANCE);
        let flooded = (0..4).any(|seed| {
            let grid = MazeGenerator::new().generate(seed, &params).unwrap();
            !grid.water_features.is_empty()
        });
        assert!(flooded);
    }

    #[test]
    fn test_maze_is_perfectly_connected() {
        let mut params = maze_params(31, 21);
        params.custom.room_chance = Some(0.0);
        let grid = MazeGenerator::new().generate(11, &params).unwrap();
        assert_eq!(walkable_components(&grid).len(), 1);
        // every lattice cell is open or flooded
        for y in (1..21).step_by(2) {
            for x in (1..31).step_by(2) {
                let tile = grid.get_tile(Position::new(x, y));
                assert!(tile.is_walkable() || tile == TileType::WaterDeep);
            }
        }
    }

    #[test]
    fn test_double_wide_passages() {
        let mut params = maze_params(41, 41);
        params.custom.corridor_width = Some(2);
        let grid = MazeGenerator::new().generate(5, &params).unwrap();
        assert_eq!(walkable_components(&grid).len(), 1);
        assert!(grid.walkable_ratio() > 0.3);

        params.custom.corridor_width = Some(3);
        assert!(matches!(
            MazeGenerator::new().generate(5, &params),
            Err(StrataError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_dead_end_rooms() {
        let mut params = maze_params(51, 41);
        params.custom.room_chance = Some(1.0);
        let grid = MazeGenerator::new().generate(8, &params).unwrap();
        assert!(!grid.rooms.is_empty());
        assert!(grid.water_features.is_empty());
        assert!(grid.rooms.iter().all(|room| room.fits_in(51, 41)));
        assert_eq!(walkable_components(&grid).len(), 1);
    }

    #[test]
    fn test_stairs_in_opposite_corners() {
        let generator = MazeGenerator::new();
        let grid = generator.generate(21, &maze_params(61, 41)).unwrap();
        let up = grid.stairs_up[0];
        let down = grid.stairs_down[0];
        assert!((up.x < 15) != (down.x < 15));
        assert!((up.y < 15) != (down.y < 15));
        assert!(generator.validate(&grid).is_ok());
    }

    #[test]
    fn test_too_small_for_cells() {
        let result = MazeGenerator::new().generate(1, &maze_params(2, 2));
        assert!(matches!(result, Err(StrataError::GenerationFailed(_))));
    }
}
