//! # City Generation
//!
//! Urban grids: a regular lattice of blocks separated by streets. Each block
//! becomes a building, a plaza or a park; large buildings get subdivided
//! interiors with doored partition walls.

use crate::config::MAX_BIOME_DIMENSION;
use crate::generation::utils::{self, create_rng, resolve_dimensions, stair_spot_near, unify_default, unit_fraction, GenRng};
use crate::generation::water::{commit_water_feature, WaterPainter};
use crate::{GenerationParams, Generator, Grid, Position, Room, RoomType, StrataError, StrataResult, TileType};
use rand::Rng;

/// Default city width.
pub const CITY_DEFAULT_WIDTH: u32 = 80;

/// Default city height.
pub const CITY_DEFAULT_HEIGHT: u32 = 50;

/// Buildings at least this many tiles get a subdivided interior.
const LARGE_BUILDING_AREA: u32 = 100;

/// Partition depth for large building interiors.
const INTERIOR_DEPTH: u32 = 3;

/// Smallest side of an interior room.
const MIN_INTERIOR_ROOM: i32 = 3;

/// What a city block holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Building,
    Plaza,
    Park,
}

/// One block of the city lattice.
#[derive(Debug, Clone, PartialEq)]
pub struct CityBlock {
    pub col: u32,
    pub row: u32,
    pub area: Room,
    pub kind: BlockKind,
}

/// Grid-subdivision city generator.
#[derive(Debug, Clone, Default)]
pub struct CityGenerator;

/// Resolved city settings for one generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct CityConfig {
    pub width: u32,
    pub height: u32,
    pub block_size: u32,
    pub street_width: u32,
    pub building_density: f64,
    pub plaza_density: f64,
}

impl CityConfig {
    /// Resolves city settings and checks the block and street tunables.
    pub fn resolve(params: &GenerationParams) -> StrataResult<Self> {
        let (width, height) = resolve_dimensions(
            &params.custom,
            CITY_DEFAULT_WIDTH,
            CITY_DEFAULT_HEIGHT,
            MAX_BIOME_DIMENSION,
        )?;
        utils::resolve_difficulty(params)?;
        let block_size = params.custom.block_size.unwrap_or(12);
        if !(4..=50).contains(&block_size) {
            return Err(StrataError::InvalidConfig(format!(
                "blockSize must be within 4..=50, got {block_size}"
            )));
        }
        let street_width = params.custom.street_width.unwrap_or(2);
        if !(1..=10).contains(&street_width) {
            return Err(StrataError::InvalidConfig(format!(
                "streetWidth must be within 1..=10, got {street_width}"
            )));
        }

        let genre = params.genre_profile();
        let building_density = unit_fraction(
            "buildingDensity",
            params.custom.building_density,
            genre.map_or(0.7, |profile| profile.building_density),
        )?;
        let plaza_density = unit_fraction(
            "plazaDensity",
            params.custom.plaza_density,
            genre.map_or(0.2, |profile| profile.plaza_density),
        )?;
        if building_density + plaza_density > 1.0 {
            return Err(StrataError::InvalidConfig(format!(
                "buildingDensity + plazaDensity must not exceed 1, got {}",
                building_density + plaza_density
            )));
        }

        Ok(Self {
            width,
            height,
            block_size,
            street_width,
            building_density,
            plaza_density,
        })
    }
}

impl CityGenerator {
    /// Creates a city generator.
    pub fn new() -> Self {
        Self
    }

    /// Lays out the block lattice and rolls each block's kind.
    fn plan_blocks(&self, config: &CityConfig, rng: &mut GenRng) -> Vec<CityBlock> {
        let block = config.block_size as i32;
        let street = config.street_width as i32;
        let stride = block + street;
        let fits = |start: i32, extent: u32| start + block + street <= extent as i32;

        let mut blocks = Vec::new();
        let mut row = 0;
        while fits(street + row * stride, config.height) {
            let mut col = 0;
            while fits(street + col * stride, config.width) {
                let roll: f64 = rng.gen();
                let kind = if roll < config.building_density {
                    BlockKind::Building
                } else if roll < config.building_density + config.plaza_density {
                    BlockKind::Plaza
                } else {
                    BlockKind::Park
                };
                blocks.push(CityBlock {
                    col: col as u32,
                    row: row as u32,
                    area: Room::new(
                        0,
                        Position::new(street + col * stride, street + row * stride),
                        config.block_size,
                        config.block_size,
                        RoomType::Normal,
                    ),
                    kind,
                });
                col += 1;
            }
            row += 1;
        }
        blocks
    }

    /// Builds a walled building with a subdivided interior and one entrance.
    fn build_large(&self, grid: &mut Grid, area: &Room, rooms: &mut Vec<Room>, rng: &mut GenRng) {
        grid.fill_rect(area.top_left, area.width, area.height, TileType::Wall);
        let interior = Room::new(
            rooms.len() as u32,
            Position::new(area.top_left.x + 1, area.top_left.y + 1),
            area.width - 2,
            area.height - 2,
            RoomType::Normal,
        );
        grid.fill_rect(interior.top_left, interior.width, interior.height, TileType::Floor);
        self.partition(grid, &interior, rng);
        place_entrance(grid, area, rng);
        rooms.push(interior);
    }

    /// Splits an interior with partition walls, each pierced by one door.
    fn partition(&self, grid: &mut Grid, interior: &Room, rng: &mut GenRng) {
        let mut pending = vec![(interior.top_left, interior.width as i32, interior.height as i32, 0u32)];

        while let Some((origin, width, height, depth)) = pending.pop() {
            if depth >= INTERIOR_DEPTH {
                continue;
            }
            let vertical = if width == height { rng.gen_bool(0.5) } else { width > height };
            let length = if vertical { width } else { height };
            if length < MIN_INTERIOR_ROOM * 2 + 1 {
                continue;
            }

            let candidates: Vec<i32> = (MIN_INTERIOR_ROOM..length - MIN_INTERIOR_ROOM).collect();
            let mut chosen = None;
            for _ in 0..candidates.len().min(8) {
                let offset = candidates[rng.gen_range(0..candidates.len())];
                let (cap_a, cap_b) = if vertical {
                    (
                        Position::new(origin.x + offset, origin.y - 1),
                        Position::new(origin.x + offset, origin.y + height),
                    )
                } else {
                    (
                        Position::new(origin.x - 1, origin.y + offset),
                        Position::new(origin.x + width, origin.y + offset),
                    )
                };
                if !grid.get_tile(cap_a).is_door() && !grid.get_tile(cap_b).is_door() {
                    chosen = Some(offset);
                    break;
                }
            }
            let Some(offset) = chosen else {
                continue;
            };

            let door_at = rng.gen_range(0..if vertical { height } else { width });
            if vertical {
                let x = origin.x + offset;
                for y in origin.y..origin.y + height {
                    grid.set_tile(Position::new(x, y), TileType::Wall);
                }
                grid.set_tile(Position::new(x, origin.y + door_at), TileType::Door);
                pending.push((origin, offset, height, depth + 1));
                pending.push((Position::new(x + 1, origin.y), width - offset - 1, height, depth + 1));
            } else {
                let y = origin.y + offset;
                for x in origin.x..origin.x + width {
                    grid.set_tile(Position::new(x, y), TileType::Wall);
                }
                grid.set_tile(Position::new(origin.x + door_at, y), TileType::Door);
                pending.push((origin, width, offset, depth + 1));
                pending.push((Position::new(origin.x, y + 1), width, height - offset - 1, depth + 1));
            }
        }
    }

    /// Builds a small building: usually solid, sometimes a single room.
    fn build_small(&self, grid: &mut Grid, area: &Room, rooms: &mut Vec<Room>, rng: &mut GenRng) {
        if rng.gen_bool(0.7) {
            grid.fill_rect(area.top_left, area.width, area.height, TileType::Structure);
            return;
        }
        grid.fill_rect(area.top_left, area.width, area.height, TileType::Wall);
        let interior = Room::new(
            rooms.len() as u32,
            Position::new(area.top_left.x + 1, area.top_left.y + 1),
            area.width - 2,
            area.height - 2,
            RoomType::Normal,
        );
        grid.fill_rect(interior.top_left, interior.width, interior.height, TileType::Floor);
        place_entrance(grid, area, rng);
        rooms.push(interior);
    }

    /// Opens a plaza.
    fn build_plaza(&self, grid: &mut Grid, area: &Room, rooms: &mut Vec<Room>) {
        grid.fill_rect(area.top_left, area.width, area.height, TileType::Floor);
        rooms.push(Room::new(rooms.len() as u32, area.top_left, area.width, area.height, RoomType::Plaza));
    }

    /// Plants a park with scattered trees and sometimes a pond.
    fn build_park(&self, grid: &mut Grid, area: &Room, rooms: &mut Vec<Room>, rng: &mut GenRng) {
        grid.fill_rect(area.top_left, area.width, area.height, TileType::Floor);
        if rng.gen_bool(0.2) {
            let radius = (area.width.min(area.height) / 4).max(1) as f64;
            let pond = WaterPainter::new(grid, rng).lake(area.center(), radius, radius, 0.0);
            commit_water_feature(grid, pond);
        }
        for pos in area.positions() {
            if grid.get_tile(pos) == TileType::Floor && rng.gen_bool(0.3) {
                grid.set_tile(pos, TileType::Tree);
            }
        }
        rooms.push(Room::new(rooms.len() as u32, area.top_left, area.width, area.height, RoomType::Park));
    }

    /// Alleys between neighbouring buildings.
    ///
    /// Streets already reach every block, so nothing is carved: the pass only
    /// counts side-by-side building pairs and reports them.
    pub fn carve_alleys(&self, blocks: &[CityBlock]) -> usize {
        let is_building = |col: u32, row: u32| {
            blocks
                .iter()
                .any(|block| block.col == col && block.row == row && block.kind == BlockKind::Building)
        };
        let pairs = blocks
            .iter()
            .filter(|block| block.kind == BlockKind::Building)
            .map(|block| {
                usize::from(is_building(block.col + 1, block.row)) + usize::from(is_building(block.col, block.row + 1))
            })
            .sum();
        log::debug!("city: {pairs} adjacent building pairs, no alleys carved");
        pairs
    }
}

/// Pierces the outer wall of a building with a door that opens onto floor.
fn place_entrance(grid: &mut Grid, area: &Room, rng: &mut GenRng) {
    let top_left = area.top_left;
    let bottom_right = area.bottom_right();
    let mut sides: Vec<(Position, Position)> = Vec::new();
    for x in (top_left.x + 1)..bottom_right.x {
        sides.push((Position::new(x, top_left.y), Position::new(x, top_left.y + 1)));
        sides.push((Position::new(x, bottom_right.y), Position::new(x, bottom_right.y - 1)));
    }
    for y in (top_left.y + 1)..bottom_right.y {
        sides.push((Position::new(top_left.x, y), Position::new(top_left.x + 1, y)));
        sides.push((Position::new(bottom_right.x, y), Position::new(bottom_right.x - 1, y)));
    }
    let usable: Vec<Position> = sides
        .into_iter()
        .filter(|&(_, inside)| grid.get_tile(inside) == TileType::Floor)
        .map(|(door, _)| door)
        .collect();
    if usable.is_empty() {
        return;
    }
    let door = usable[rng.gen_range(0..usable.len())];
    grid.set_tile(door, TileType::Door);
}

impl Generator for CityGenerator {
    fn generate(&self, seed: i64, params: &GenerationParams) -> StrataResult<Grid> {
        let config = CityConfig::resolve(params)?;
        let mut rng = create_rng(seed);
        let mut grid = Grid::filled(config.width, config.height, TileType::Corridor);
        grid.seed = seed;
        grid.level = params.depth as usize;
        grid.generator = self.generator_type().to_string();

        let blocks = self.plan_blocks(&config, &mut rng);
        let mut rooms = Vec::new();
        for block in &blocks {
            match block.kind {
                BlockKind::Building if block.area.area() >= LARGE_BUILDING_AREA => {
                    self.build_large(&mut grid, &block.area, &mut rooms, &mut rng)
                }
                BlockKind::Building => self.build_small(&mut grid, &block.area, &mut rooms, &mut rng),
                BlockKind::Plaza => self.build_plaza(&mut grid, &block.area, &mut rooms),
                BlockKind::Park => self.build_park(&mut grid, &block.area, &mut rooms, &mut rng),
            }
        }
        self.carve_alleys(&blocks);
        let report = unify_default(&mut grid);
        log::debug!(
            "city: {} blocks, {} rooms, {} pockets culled",
            blocks.len(),
            rooms.len(),
            report.culled
        );

        let mut plazas: Vec<&Room> = rooms.iter().filter(|room| room.room_type == RoomType::Plaza).collect();
        plazas.sort_by_key(|room| (std::cmp::Reverse(room.area()), room.id));
        let map_center = Position::new(config.width as i32 / 2, config.height as i32 / 2);
        let (up_target, down_target) = match (plazas.first(), plazas.get(1)) {
            (Some(first), Some(second)) => (first.center(), second.center()),
            _ => (
                blocks.first().map_or(map_center, |block| block.area.center()),
                blocks.last().map_or(map_center, |block| block.area.center()),
            ),
        };
        let up = stair_spot_near(&grid, up_target)
            .ok_or_else(|| StrataError::GenerationFailed("city has no spot for the up-stair".to_string()))?;
        grid.place_stairs_up(up);
        let down = stair_spot_near(&grid, down_target)
            .ok_or_else(|| StrataError::GenerationFailed("city has no spot for the down-stair".to_string()))?;
        grid.place_stairs_down(down);

        grid.rooms = rooms;
        log::info!(
            "city: generated {}x{} city with {} blocks (seed {seed})",
            config.width,
            config.height,
            blocks.len()
        );
        Ok(grid)
    }

    fn validate(&self, grid: &Grid) -> StrataResult<()> {
        utils::validate_walkable_ratio(grid, 0.3, self.generator_type())?;
        utils::validate_stairs(grid)
    }

    fn generator_type(&self) -> &'static str {
        "city"
    }
}
