//! # Forest Generation
//!
//! Open woodland: elliptical clearings, Poisson-disc trees, optional lakes or
//! a river, and winding paths joining the clearings in a ring.

use crate::config::MAX_BIOME_DIMENSION;
use crate::generation::poisson::PoissonDiscSampler;
use crate::generation::utils::{
    self, create_rng, resolve_difficulty, resolve_dimensions, stair_spot_near, unify_default, unit_fraction, GenRng,
};
use crate::generation::water::{commit_water_feature, WaterFeature, WaterPainter};
use crate::{GenerationParams, Generator, Grid, Position, Room, RoomType, StrataError, StrataResult, TileType};
use rand::Rng;

/// Default forest width.
pub const FOREST_DEFAULT_WIDTH: u32 = 80;

/// Default forest height.
pub const FOREST_DEFAULT_HEIGHT: u32 = 50;

/// Most clearings a forest may request.
const MAX_CLEARINGS: u32 = 50;

/// Chance per path step of drifting sideways.
const PATH_JITTER: f64 = 0.2;

/// Poisson-disc forest generator.
#[derive(Debug, Clone, Default)]
pub struct ForestGenerator;

/// Resolved forest settings for one generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct ForestConfig {
    pub width: u32,
    pub height: u32,
    pub clearing_count: u32,
    pub tree_density: f64,
    pub water_chance: f64,
}

impl ForestConfig {
    /// Resolves forest settings: caller value, then genre default, then generator default.
    pub fn resolve(params: &GenerationParams) -> StrataResult<Self> {
        let (width, height) = resolve_dimensions(
            &params.custom,
            FOREST_DEFAULT_WIDTH,
            FOREST_DEFAULT_HEIGHT,
            MAX_BIOME_DIMENSION,
        )?;
        resolve_difficulty(params)?;
        let genre = params.genre_profile();
        let clearing_count = params.custom.clearing_count.unwrap_or(3);
        if !(1..=MAX_CLEARINGS).contains(&clearing_count) {
            return Err(StrataError::InvalidConfig(format!(
                "clearingCount must be within 1..={MAX_CLEARINGS}, got {clearing_count}"
            )));
        }
        Ok(Self {
            width,
            height,
            clearing_count,
            tree_density: unit_fraction(
                "treeDensity",
                params.custom.tree_density,
                genre.map_or(0.5, |profile| profile.tree_density),
            )?,
            water_chance: unit_fraction(
                "waterChance",
                params.custom.water_chance,
                genre.map_or(0.3, |profile| profile.water_chance),
            )?,
        })
    }
}

/// An elliptical opening in the trees.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Clearing {
    center: Position,
    radius_x: i32,
    radius_y: i32,
}

impl Clearing {
    fn contains(&self, pos: Position) -> bool {
        let dx = (pos.x - self.center.x) as f64 / self.radius_x as f64;
        let dy = (pos.y - self.center.y) as f64 / self.radius_y as f64;
        dx * dx + dy * dy <= 1.0
    }

    fn bounds(&self, id: u32) -> Room {
        Room::new(
            id,
            Position::new(self.center.x - self.radius_x, self.center.y - self.radius_y),
            (self.radius_x * 2 + 1) as u32,
            (self.radius_y * 2 + 1) as u32,
            RoomType::Normal,
        )
    }

    /// Bounding box grown by `margin` on every side.
    fn padded(&self, margin: i32) -> Room {
        Room::new(
            0,
            Position::new(self.center.x - self.radius_x - margin, self.center.y - self.radius_y - margin),
            (self.radius_x * 2 + 1 + margin * 2) as u32,
            (self.radius_y * 2 + 1 + margin * 2) as u32,
            RoomType::Normal,
        )
    }
}

impl ForestGenerator {
    /// Creates a forest generator.
    pub fn new() -> Self {
        Self
    }

    /// Places non-overlapping clearings by rejection sampling.
    fn place_clearings(&self, width: i32, height: i32, count: u32, rng: &mut GenRng) -> Vec<Clearing> {
        let mut clearings: Vec<Clearing> = Vec::new();
        let max_rx = (width / 8).clamp(3, 8);
        let max_ry = (height / 8).clamp(3, 6);

        for _ in 0..count * 50 {
            if clearings.len() as u32 >= count {
                break;
            }
            let radius_x = rng.gen_range(3..=max_rx);
            let radius_y = rng.gen_range(3..=max_ry);
            if width - radius_x - 1 <= radius_x + 1 || height - radius_y - 1 <= radius_y + 1 {
                continue;
            }
            let candidate = Clearing {
                center: Position::new(
                    rng.gen_range(radius_x + 1..width - radius_x - 1),
                    rng.gen_range(radius_y + 1..height - radius_y - 1),
                ),
                radius_x,
                radius_y,
            };
            let padded = candidate.padded(1);
            if clearings.iter().all(|other| !other.padded(1).overlaps(&padded)) {
                clearings.push(candidate);
            }
        }

        clearings
    }

    /// Paints one or two lakes, or a river, without committing them. A river
    /// is used when no lake fits between the clearings.
    fn paint_water(&self, grid: &mut Grid, clearings: &[Clearing], rng: &mut GenRng) -> Vec<WaterFeature> {
        let (width, height) = (grid.width() as i32, grid.height() as i32);
        let mut features = Vec::new();

        if rng.gen_bool(0.5) {
            let max_radius = (width.min(height) / 10).max(3);
            for _ in 0..rng.gen_range(1..=2) {
                for _ in 0..20 {
                    let radius_x = rng.gen_range(3..=max_radius);
                    let radius_y = rng.gen_range(3..=max_radius);
                    let jitter = rng.gen_range(0.1..=0.3);
                    let center = Position::new(rng.gen_range(0..width), rng.gen_range(0..height));
                    let reach = Clearing {
                        center,
                        radius_x: (radius_x as f64 * (1.0 + jitter)).ceil() as i32,
                        radius_y: (radius_y as f64 * (1.0 + jitter)).ceil() as i32,
                    }
                    .padded(1);
                    if clearings.iter().any(|clearing| clearing.padded(0).overlaps(&reach)) {
                        continue;
                    }
                    let lake = WaterPainter::new(grid, rng).lake(center, radius_x as f64, radius_y as f64, jitter);
                    features.push(lake);
                    break;
                }
            }
        }

        if features.is_empty() {
            let river_width = rng.gen_range(2..=3);
            let (start, end) = if rng.gen_bool(0.5) {
                (
                    Position::new(0, rng.gen_range(0..height)),
                    Position::new(width - 1, rng.gen_range(0..height)),
                )
            } else {
                (
                    Position::new(rng.gen_range(0..width), 0),
                    Position::new(rng.gen_range(0..width), height - 1),
                )
            };
            features.push(WaterPainter::new(grid, rng).river(start, end, river_width));
        }

        features.retain(|feature| !feature.is_empty());
        features
    }

    /// Scatters trees over open floor outside the clearings.
    fn plant_trees(&self, grid: &mut Grid, clearings: &[Clearing], density: f64, rng: &mut GenRng) -> StrataResult<usize> {
        if density <= 0.0 {
            return Ok(0);
        }
        let sampler = PoissonDiscSampler::for_density(grid.width() as f64, grid.height() as f64, density)?;
        let mut planted = 0;
        for (x, y) in sampler.sample(rng) {
            let pos = Position::new(x as i32, y as i32);
            if grid.get_tile(pos) == TileType::Floor && !clearings.iter().any(|clearing| clearing.contains(pos)) {
                grid.set_tile(pos, TileType::Tree);
                planted += 1;
            }
        }
        Ok(planted)
    }

    /// Walks a winding path from `start` to `end`, felling trees and bridging
    /// deep water on the way.
    fn carve_path(&self, grid: &mut Grid, start: Position, end: Position, rng: &mut GenRng) {
        let (width, height) = (grid.width() as i32, grid.height() as i32);
        let mut current = start;
        let budget = start.manhattan_distance(end) as usize * 4 + 100;

        for _ in 0..budget {
            clear_path_tile(grid, current);
            if current == end {
                return;
            }
            let (dx, dy) = (end.x - current.x, end.y - current.y);
            let along_x = dx.abs() >= dy.abs();
            let sideways = rng.gen_bool(PATH_JITTER);
            let step = if sideways {
                let offset = if rng.gen_bool(0.5) { 1 } else { -1 };
                if along_x {
                    Position::new(current.x, current.y + offset)
                } else {
                    Position::new(current.x + offset, current.y)
                }
            } else if along_x {
                Position::new(current.x + dx.signum(), current.y)
            } else {
                Position::new(current.x, current.y + dy.signum())
            };
            if step.in_bounds(width as u32, height as u32) {
                current = step;
            }
        }

        // budget exhausted: finish straight
        let corner = Position::new(end.x, current.y);
        for x in current.x.min(corner.x)..=current.x.max(corner.x) {
            clear_path_tile(grid, Position::new(x, current.y));
        }
        for y in corner.y.min(end.y)..=corner.y.max(end.y) {
            clear_path_tile(grid, Position::new(end.x, y));
        }
    }
}

fn clear_path_tile(grid: &mut Grid, pos: Position) {
    match grid.get_tile(pos) {
        TileType::Tree => grid.set_tile(pos, TileType::Floor),
        TileType::WaterDeep => grid.set_tile(pos, TileType::Bridge),
        _ => {}
    }
}

impl Generator for ForestGenerator {
    fn generate(&self, seed: i64, params: &GenerationParams) -> StrataResult<Grid> {
        let config = ForestConfig::resolve(params)?;
        let mut rng = create_rng(seed);
        let mut grid = Grid::filled(config.width, config.height, TileType::Floor);
        grid.seed = seed;
        grid.level = params.depth as usize;
        grid.generator = self.generator_type().to_string();

        let clearings = self.place_clearings(
            config.width as i32,
            config.height as i32,
            config.clearing_count,
            &mut rng,
        );
        if clearings.is_empty() {
            return Err(StrataError::GenerationFailed(format!(
                "no clearing fits in a {}x{} forest",
                config.width, config.height
            )));
        }

        let water = if config.water_chance > 0.0 && rng.gen_bool(config.water_chance) {
            self.paint_water(&mut grid, &clearings, &mut rng)
        } else {
            Vec::new()
        };
        let trees = self.plant_trees(&mut grid, &clearings, config.tree_density, &mut rng)?;

        if clearings.len() >= 2 {
            let ring = if clearings.len() == 2 { 1 } else { clearings.len() };
            for index in 0..ring {
                let next = (index + 1) % clearings.len();
                self.carve_path(&mut grid, clearings[index].center, clearings[next].center, &mut rng);
            }
        }
        for feature in water {
            commit_water_feature(&mut grid, feature);
        }
        let report = unify_default(&mut grid);
        log::debug!(
            "forest: {} clearings, {trees} trees, {} water bodies, {} pockets joined",
            clearings.len(),
            grid.water_features.len(),
            report.joined
        );

        let mut by_size: Vec<(usize, &Clearing)> = clearings.iter().enumerate().collect();
        by_size.sort_by_key(|(index, clearing)| (std::cmp::Reverse(clearing.radius_x * clearing.radius_y), *index));
        let up_target = by_size[0].1.center;
        let down_target = by_size.get(1).map_or(up_target, |(_, clearing)| clearing.center);
        let up = stair_spot_near(&grid, up_target)
            .ok_or_else(|| StrataError::GenerationFailed("forest has no spot for the up-stair".to_string()))?;
        grid.place_stairs_up(up);
        let down = stair_spot_near(&grid, down_target)
            .ok_or_else(|| StrataError::GenerationFailed("forest has no spot for the down-stair".to_string()))?;
        grid.place_stairs_down(down);

        grid.rooms = clearings
            .iter()
            .enumerate()
            .map(|(index, clearing)| clearing.bounds(index as u32))
            .collect();
        log::info!(
            "forest: generated {}x{} forest (seed {seed})",
            config.width,
            config.height
        );
        Ok(grid)
    }

    fn validate(&self, grid: &Grid) -> StrataResult<()> {
        utils::validate_walkable_ratio(grid, 0.4, self.generator_type())?;
        if grid.rooms.is_empty() {
            return Err(StrataError::ValidationFailed("forest: no clearings".to_string()));
        }
        utils::validate_stairs(grid)
    }

    fn generator_type(&self) -> &'static str {
        "forest"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::walkable_components;

    fn forest_params() -> GenerationParams {
        GenerationParams::new("fantasy").with_size(80, 50)
    }

    #[test]
    fn test_forest_generation() {
        let generator = ForestGenerator::new();
        let grid = generator.generate(17, &forest_params()).unwrap();

        assert_eq!(grid.width(), 80);
        assert!(!grid.rooms.is_empty());
        assert!(grid.count(TileType::Tree) > 0);
        assert!(grid.walkable_ratio() >= 0.4);
        assert_eq!(walkable_components(&grid).len(), 1);
        assert!(generator.validate(&grid).is_ok());
    }

    #[test]
    fn test_clearings_stay_free_of_trees() {
        let mut params = forest_params();
        params.custom.tree_density = Some(1.0);
        params.custom.water_chance = Some(0.0);
        let grid = ForestGenerator::new().generate(4, &params).unwrap();
        for room in &grid.rooms {
            assert_ne!(grid.get_tile(room.center()), TileType::Tree);
        }
        let clearings = ForestGenerator::new().place_clearings(80, 50, 3, &mut create_rng(4));
        for (i, a) in clearings.iter().enumerate() {
            for b in &clearings[i + 1..] {
                assert!(!a.padded(1).overlaps(&b.padded(1)));
            }
        }
    }

    #[test]
    fn test_water_is_recorded() {
        let mut params = forest_params();
        params.custom.water_chance = Some(1.0);
        for seed in 0..4 {
            let grid = ForestGenerator::new().generate(seed, &params).unwrap();
            assert!(!grid.water_features.is_empty());
            assert_eq!(walkable_components(&grid).len(), 1);
        }
    }

    #[test]
    fn test_zero_density_has_no_trees() {
        let mut params = forest_params();
        params.custom.tree_density = Some(0.0);
        let grid = ForestGenerator::new().generate(2, &params).unwrap();
        assert_eq!(grid.count(TileType::Tree), 0);
    }

    #[test]
    fn test_invalid_forest_config() {
        let generator = ForestGenerator::new();
        let mut params = forest_params().with_size(1001, 50);
        assert!(matches!(generator.generate(1, &params), Err(StrataError::InvalidConfig(_))));

        params = forest_params();
        params.custom.clearing_count = Some(0);
        assert!(generator.generate(1, &params).is_err());

        params = forest_params();
        params.custom.tree_density = Some(-0.5);
        assert!(generator.generate(1, &params).is_err());
    }

    #[test]
    fn test_path_clears_trees_and_bridges_deep_water() {
        let mut grid = Grid::filled(20, 5, TileType::Tree);
        grid.fill_rect(Position::new(10, 0), 1, 5, TileType::WaterDeep);
        ForestGenerator::new().carve_path(&mut grid, Position::new(1, 2), Position::new(18, 2), &mut create_rng(6));
        let path = crate::reachable_from(&grid, Position::new(1, 2));
        assert!(path.contains(&Position::new(18, 2)));
        assert!(grid.count(TileType::Bridge) >= 1);
    }
}
