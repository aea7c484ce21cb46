//! # Cellular Automata Caves
//!
//! Organic caves grown from random noise and smoothed with a birth/death rule
//! over the 8-neighbourhood. A post-pass culls tiny pockets and digs corridors
//! so exactly one walkable region remains.

use crate::config::{DEFAULT_HEIGHT, DEFAULT_WIDTH, MAX_DIMENSION};
use crate::generation::utils::{
    self, create_rng, is_stair_candidate, nearest_stair_spot, resolve_difficulty, resolve_dimensions, stair_spot_near,
    unify_default, unit_fraction, GenRng,
};
use crate::generation::water::{commit_water_feature, WaterPainter};
use crate::{reachable_from, GenerationParams, Generator, Grid, Position, StrataError, StrataResult, TileType};
use rand::Rng;

/// Upper bound on smoothing passes.
const MAX_ITERATIONS: u32 = 100;

/// Cellular automata cave generator.
#[derive(Debug, Clone)]
pub struct CellularGenerator {
    /// A wall with fewer wall neighbours than this opens up
    pub death_limit: usize,
    /// A floor with more wall neighbours than this fills in
    pub birth_limit: usize,
}

/// Resolved cave settings for one generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct CellularConfig {
    pub width: u32,
    pub height: u32,
    pub fill_probability: f64,
    pub iterations: u32,
    pub water_chance: f64,
}

impl CellularConfig {
    /// Resolves cave settings: caller value, then genre default, then 0.40 fill
    /// and 5 iterations.
    pub fn resolve(params: &GenerationParams) -> StrataResult<Self> {
        let (width, height) = resolve_dimensions(&params.custom, DEFAULT_WIDTH, DEFAULT_HEIGHT, MAX_DIMENSION)?;
        resolve_difficulty(params)?;
        let genre = params.genre_profile();
        let iterations = params.custom.iterations.unwrap_or(5);
        if iterations > MAX_ITERATIONS {
            return Err(StrataError::InvalidConfig(format!(
                "iterations must be at most {MAX_ITERATIONS}, got {iterations}"
            )));
        }
        Ok(Self {
            width,
            height,
            fill_probability: unit_fraction(
                "fillProbability",
                params.custom.fill_probability,
                genre.map_or(0.40, |profile| profile.fill_probability),
            )?,
            iterations,
            water_chance: unit_fraction(
                "waterChance",
                params.custom.water_chance,
                genre.map_or(0.25, |profile| profile.water_chance),
            )?,
        })
    }
}

impl CellularGenerator {
    /// Creates a cave generator with the standard 3/4 thresholds.
    pub fn new() -> Self {
        Self {
            death_limit: 3,
            birth_limit: 4,
        }
    }

    /// Fills the interior with random walls; the border is always wall.
    fn seed_noise(&self, grid: &mut Grid, fill_probability: f64, rng: &mut GenRng) {
        let (width, height) = (grid.width() as i32, grid.height() as i32);
        for pos in grid.positions() {
            let edge = pos.x == 0 || pos.y == 0 || pos.x == width - 1 || pos.y == height - 1;
            let tile = if edge || rng.gen_bool(fill_probability) {
                TileType::Wall
            } else {
                TileType::Floor
            };
            grid.set_tile(pos, tile);
        }
    }

    /// Applies one synchronous smoothing pass.
    pub fn smooth(&self, grid: &Grid) -> Grid {
        let mut next = grid.clone();
        let (width, height) = (grid.width() as i32, grid.height() as i32);
        for pos in grid.positions() {
            if pos.x == 0 || pos.y == 0 || pos.x == width - 1 || pos.y == height - 1 {
                continue;
            }
            let walls = wall_neighbors(grid, pos);
            let tile = grid.get_tile(pos);
            if tile == TileType::Wall && walls < self.death_limit {
                next.set_tile(pos, TileType::Floor);
            } else if tile == TileType::Floor && walls > self.birth_limit {
                next.set_tile(pos, TileType::Wall);
            }
        }
        next
    }

    /// Floods one or two small pools into the cave.
    fn add_pools(&self, grid: &mut Grid, rng: &mut GenRng) {
        let open = grid.walkable_positions();
        if open.is_empty() {
            return;
        }
        let max_tiles = (grid.area() / 200).clamp(8, 60);
        for _ in 0..rng.gen_range(1..=2) {
            let start = open[rng.gen_range(0..open.len())];
            let pool = WaterPainter::new(grid, rng).flood_fill_water(start, max_tiles, 0.3);
            commit_water_feature(grid, pool);
        }
    }

    /// Puts the up-stair near the top-left and the down-stair at the tile that
    /// takes the most steps to reach from it.
    fn place_stairs(&self, grid: &mut Grid) -> StrataResult<()> {
        let up = nearest_stair_spot(grid, Position::new(1, 1), None, true)
            .or_else(|| stair_spot_near(grid, Position::new(1, 1)))
            .ok_or_else(|| StrataError::GenerationFailed("cave has no spot for the up-stair".to_string()))?;
        grid.place_stairs_up(up);

        let order = reachable_from(grid, up);
        let down = order
            .iter()
            .rev()
            .copied()
            .find(|&pos| is_stair_candidate(grid, pos, true))
            .or_else(|| order.iter().rev().copied().find(|&pos| is_stair_candidate(grid, pos, false)))
            .ok_or_else(|| StrataError::GenerationFailed("cave has no spot for the down-stair".to_string()))?;
        grid.place_stairs_down(down);
        Ok(())
    }
}

/// Counts walls among the 8 neighbours; tiles outside the grid count as walls.
fn wall_neighbors(grid: &Grid, pos: Position) -> usize {
    pos.ring()
        .into_iter()
        .filter(|&neighbor| grid.get_tile(neighbor) == TileType::Wall)
        .count()
}

impl Generator for CellularGenerator {
    fn generate(&self, seed: i64, params: &GenerationParams) -> StrataResult<Grid> {
        let config = CellularConfig::resolve(params)?;
        let mut rng = create_rng(seed);
        let mut grid = Grid::new(config.width, config.height);
        grid.seed = seed;
        grid.level = params.depth as usize;
        grid.generator = self.generator_type().to_string();

        self.seed_noise(&mut grid, config.fill_probability, &mut rng);
        for _ in 0..config.iterations {
            grid = self.smooth(&grid);
        }
        log::debug!(
            "cellular: {} open tiles after {} passes",
            grid.count_walkable(),
            config.iterations
        );

        if config.water_chance > 0.0 && rng.gen_bool(config.water_chance) {
            self.add_pools(&mut grid, &mut rng);
        }

        let report = unify_default(&mut grid);
        if grid.count_walkable() == 0 {
            return Err(StrataError::GenerationFailed(format!(
                "fill probability {} left no open ground",
                config.fill_probability
            )));
        }
        self.place_stairs(&mut grid)?;

        log::info!(
            "cellular: generated {}x{} cave, {} regions joined, {} culled (seed {seed})",
            config.width,
            config.height,
            report.joined,
            report.culled
        );
        Ok(grid)
    }

    fn validate(&self, grid: &Grid) -> StrataResult<()> {
        utils::validate_walkable_ratio(grid, 0.3, self.generator_type())?;
        utils::validate_stairs(grid)
    }

    fn generator_type(&self) -> &'static str {
        "cellular"
    }
}

impl Default for CellularGenerator {
    fn default() -> Self {
        Self::new()
    }
}
