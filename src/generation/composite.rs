//! # Composite Generation
//!
//! Multi-biome maps. The map is split into Voronoi regions, each region is
//! generated by a different single-biome generator on its own sub-seed, and
//! the pieces are copied in, chained together with corridors and blended at
//! their borders.

use crate::config::{
    MAX_COMPOSITE_DIMENSION, MIN_COMPOSITE_HEIGHT, MIN_COMPOSITE_WIDTH, MIN_REGION_HEIGHT, MIN_REGION_WIDTH,
};
use crate::generation::utils::{
    self, carve_l_corridor, create_rng, derive_seed, resolve_dimensions, stair_spot_near, unify_default, GenRng,
};
use crate::generation::water::WaterFeature;
use crate::{
    largest_component_share, GenerationParams, Generator, GeneratorKind, Grid, Position, StrataError,
    StrataResult, TileType, TransitionBlender, VoronoiPartition, DEFAULT_TRANSITION_WIDTH,
};
use rand::seq::SliceRandom;

/// Default composite width.
pub const COMPOSITE_DEFAULT_WIDTH: u32 = 100;

/// Default composite height.
pub const COMPOSITE_DEFAULT_HEIGHT: u32 = 80;

/// Multi-biome generator.
#[derive(Debug, Clone, Default)]
pub struct CompositeGenerator;

/// Resolved composite settings for one generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeConfig {
    pub width: u32,
    pub height: u32,
    pub biome_count: u32,
    pub transition_width: u32,
}

impl CompositeConfig {
    /// Resolves composite settings; maps must be at least 60x40 and at most 500x500.
    pub fn resolve(params: &GenerationParams) -> StrataResult<Self> {
        let (width, height) = resolve_dimensions(
            &params.custom,
            COMPOSITE_DEFAULT_WIDTH,
            COMPOSITE_DEFAULT_HEIGHT,
            MAX_COMPOSITE_DIMENSION,
        )?;
        if width < MIN_COMPOSITE_WIDTH || height < MIN_COMPOSITE_HEIGHT {
            return Err(StrataError::InvalidConfig(format!(
                "composite maps must be at least {MIN_COMPOSITE_WIDTH}x{MIN_COMPOSITE_HEIGHT}, got {width}x{height}"
            )));
        }
        utils::resolve_difficulty(params)?;
        let biome_count = params.custom.biome_count.unwrap_or(3);
        if !(2..=4).contains(&biome_count) {
            return Err(StrataError::InvalidConfig(format!(
                "biomeCount must be within 2..=4, got {biome_count}"
            )));
        }
        let transition_width = params.custom.transition_width.unwrap_or(DEFAULT_TRANSITION_WIDTH);
        TransitionBlender::new(transition_width)?;

        Ok(Self {
            width,
            height,
            biome_count,
            transition_width,
        })
    }
}

/// A composite grid together with how it was assembled.
#[derive(Debug, Clone)]
pub struct CompositeMap {
    pub grid: Grid,
    pub partition: VoronoiPartition,
    /// Generator used for each region, indexed by region id
    pub biomes: Vec<GeneratorKind>,
    /// Tiles repainted by transition blending
    pub transition_tiles: Vec<Position>,
}

impl CompositeGenerator {
    /// Creates a composite generator.
    pub fn new() -> Self {
        Self
    }

    /// Picks `count` distinct biomes: the genre's preferences first, then the
    /// rest, each group shuffled.
    pub fn select_biomes(&self, params: &GenerationParams, count: usize, rng: &mut GenRng) -> Vec<GeneratorKind> {
        let mut preferred: Vec<GeneratorKind> = Vec::new();
        if let Some(profile) = params.genre_profile() {
            for &kind in profile.preferred {
                if GeneratorKind::SINGLE_BIOME.contains(&kind) && !preferred.contains(&kind) {
                    preferred.push(kind);
                }
            }
        }
        let mut rest: Vec<GeneratorKind> = GeneratorKind::SINGLE_BIOME
            .into_iter()
            .filter(|kind| !preferred.contains(kind))
            .collect();
        preferred.shuffle(rng);
        rest.shuffle(rng);
        preferred.into_iter().chain(rest).take(count).collect()
    }

    /// Generates a composite map and keeps the partition and biome choices.
    pub fn generate_detailed(&self, seed: i64, params: &GenerationParams) -> StrataResult<CompositeMap> {
        let config = CompositeConfig::resolve(params)?;
        let mut rng = create_rng(seed);
        let partition = VoronoiPartition::generate(config.width, config.height, config.biome_count, &mut rng)?;
        let biomes = self.select_biomes(params, config.biome_count as usize, &mut rng);
        log::debug!(
            "composite: regions use {:?}",
            biomes.iter().map(|kind| kind.name()).collect::<Vec<_>>()
        );

        let mut grid = Grid::new(config.width, config.height);
        grid.seed = seed;
        grid.level = params.depth as usize;
        grid.generator = self.generator_type().to_string();

        for (region, &kind) in partition.regions.iter().zip(&biomes) {
            self.fill_region(&mut grid, &partition, region.id, kind, seed, params)?;
        }

        let anchors: Vec<Position> = partition
            .regions
            .iter()
            .map(|region| nearest_walkable(&grid, &region.tiles, region.seed))
            .collect();
        chain_anchors(&mut grid, &anchors);

        let blender = TransitionBlender::new(config.transition_width)?;
        let transition_tiles = blender.blend(&mut grid, &partition, &biomes, &mut rng)?;
        let report = unify_default(&mut grid);
        log::debug!(
            "composite: {} transition tiles, {} regions joined, {} culled",
            transition_tiles.len(),
            report.joined,
            report.culled
        );

        let first = anchors.first().copied().unwrap_or_else(Position::origin);
        let last = anchors.last().copied().unwrap_or_else(Position::origin);
        let up = stair_spot_near(&grid, first)
            .ok_or_else(|| StrataError::GenerationFailed("composite has no spot for the up-stair".to_string()))?;
        grid.place_stairs_up(up);
        let down = stair_spot_near(&grid, last)
            .ok_or_else(|| StrataError::GenerationFailed("composite has no spot for the down-stair".to_string()))?;
        grid.place_stairs_down(down);

        log::info!(
            "composite: generated {}x{} map with {} biomes (seed {seed})",
            config.width,
            config.height,
            biomes.len()
        );
        Ok(CompositeMap {
            grid,
            partition,
            biomes,
            transition_tiles,
        })
    }

    /// Generates one region's sub-grid and copies the region's tiles across.
    fn fill_region(
        &self,
        grid: &mut Grid,
        partition: &VoronoiPartition,
        region_id: usize,
        kind: GeneratorKind,
        seed: i64,
        params: &GenerationParams,
    ) -> StrataResult<()> {
        let Some(region) = partition.regions.get(region_id) else {
            return Ok(());
        };
        let Some((min, max)) = region.bounds() else {
            return Ok(());
        };
        let (width, height) = (grid.width() as i32, grid.height() as i32);
        let sub_width = (max.x - min.x + 1).clamp(MIN_REGION_WIDTH as i32, width);
        let sub_height = (max.y - min.y + 1).clamp(MIN_REGION_HEIGHT as i32, height);
        let origin = Position::new(min.x.min(width - sub_width), min.y.min(height - sub_height));

        let mut sub_params = params.clone();
        sub_params.custom.width = Some(sub_width as i64);
        sub_params.custom.height = Some(sub_height as i64);
        let sub_seed = derive_seed(seed, region_id as u64 + 1);
        let sub = kind
            .generate(sub_seed, &sub_params)
            .map_err(|source| StrataError::RegionFailed {
                region: region_id,
                generator: kind.name(),
                source: Box::new(source),
            })?;

        for &pos in &region.tiles {
            let tile = match sub.get_tile(pos - origin) {
                stairs if stairs.is_stairs() => TileType::Floor,
                tile => tile,
            };
            grid.set_tile(pos, tile);
        }

        for room in &sub.rooms {
            let mut placed = room.translated(origin);
            if partition.region_at(placed.center()) != Some(region_id) {
                continue;
            }
            placed.id = grid.rooms.len() as u32;
            placed.connections.clear();
            grid.rooms.push(placed);
        }
        for feature in &sub.water_features {
            let keep = |pos: &Position| partition.region_at(*pos) == Some(region_id);
            let tiles: Vec<Position> = feature.tiles.iter().map(|&pos| pos + origin).filter(keep).collect();
            if tiles.is_empty() {
                continue;
            }
            grid.water_features.push(WaterFeature {
                kind: feature.kind,
                tiles,
                bridges: feature.bridges.iter().map(|&pos| pos + origin).filter(keep).collect(),
            });
        }

        log::debug!(
            "composite: region {region_id} ({}) from a {sub_width}x{sub_height} grid at ({}, {})",
            kind.name(),
            origin.x,
            origin.y
        );
        Ok(())
    }
}

/// The walkable tile of a region closest to `target`, or `target` itself when
/// the region has none.
fn nearest_walkable(grid: &Grid, tiles: &[Position], target: Position) -> Position {
    tiles
        .iter()
        .copied()
        .filter(|&pos| grid.is_walkable(pos))
        .min_by_key(|&pos| (pos.manhattan_distance(target), pos.y, pos.x))
        .unwrap_or(target)
}

/// Joins region anchors in order with L-shaped corridors, then closes the
/// loop from the last anchor back to the first when there are more than two.
pub fn chain_anchors(grid: &mut Grid, anchors: &[Position]) {
    for (index, pair) in anchors.windows(2).enumerate() {
        carve_l_corridor(grid, pair[0], pair[1], index % 2 == 0);
    }
    if anchors.len() > 2 {
        if let (Some(&first), Some(&last)) = (anchors.first(), anchors.last()) {
            carve_l_corridor(grid, last, first, false);
        }
    }
}

impl Generator for CompositeGenerator {
    fn generate(&self, seed: i64, params: &GenerationParams) -> StrataResult<Grid> {
        self.generate_detailed(seed, params).map(|map| map.grid)
    }

    fn validate(&self, grid: &Grid) -> StrataResult<()> {
        utils::validate_walkable_ratio(grid, 0.25, self.generator_type())?;
        let share = largest_component_share(grid);
        if share < 0.9 {
            return Err(StrataError::ValidationFailed(format!(
                "composite: only {:.1}% of walkable tiles are mutually reachable",
                share * 100.0
            )));
        }
        utils::validate_stairs(grid)
    }

    fn generator_type(&self) -> &'static str {
        "composite"
    }
}
