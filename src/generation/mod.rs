//! # Generation Module
//!
//! Procedural terrain generation: the shared generator contract, parameters,
//! rooms, and every algorithm built on top of them.
//!
//! All generators follow the same rules:
//! - dimensions and tunables are validated before any grid is allocated
//! - all randomness flows through one seeded stream owned by the call
//! - `validate` re-checks the algorithm's quality bar and is always safe to call

pub mod bsp;
pub mod cellular;
pub mod city;
pub mod composite;
pub mod features;
pub mod forest;
pub mod genre;
pub mod maze;
pub mod multilevel;
pub mod poisson;
pub mod transitions;
pub mod voronoi;
pub mod water;

pub use bsp::*;
pub use cellular::*;
pub use city::*;
pub use composite::*;
pub use features::*;
pub use forest::*;
pub use genre::*;
pub use maze::*;
pub use multilevel::*;
pub use poisson::*;
pub use transitions::*;
pub use voronoi::*;
pub use water::*;

use crate::{Grid, Position, StrataError, StrataResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Caller-supplied generation parameters.
///
/// Only `custom` carries algorithm-specific values; each generator resolves the
/// fields it understands into its own typed config and ignores the rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationParams {
    /// Difficulty in `[0, 1]`
    pub difficulty: f64,
    /// Level index (dungeon depth)
    pub depth: u32,
    /// Thematic genre identifier, e.g. `"fantasy"`
    #[serde(rename = "genreId", alias = "genre")]
    pub genre: String,
    /// Algorithm-specific overrides
    pub custom: CustomParams,
}

/// Optional algorithm-specific overrides.
///
/// A missing value falls back to the genre default and then to the generator
/// default. A supplied value that is out of range is a configuration error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CustomParams {
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub fill_probability: Option<f64>,
    pub iterations: Option<u32>,
    pub room_chance: Option<f64>,
    pub corridor_width: Option<u32>,
    pub tree_density: Option<f64>,
    pub clearing_count: Option<u32>,
    pub water_chance: Option<f64>,
    pub block_size: Option<u32>,
    pub street_width: Option<u32>,
    pub building_density: Option<f64>,
    pub plaza_density: Option<f64>,
    pub biome_count: Option<u32>,
    pub transition_width: Option<u32>,
    pub secret_door_chance: Option<f64>,
    pub extra_connection_chance: Option<f64>,
}

impl GenerationParams {
    /// Creates parameters for a genre with default difficulty and depth.
    ///
    /// # Examples
    ///
    /// ```
    /// use strata::GenerationParams;
    ///
    /// let params = GenerationParams::new("fantasy").with_size(40, 30);
    /// assert_eq!(params.custom.width, Some(40));
    /// assert_eq!(params.difficulty, 0.5);
    /// ```
    pub fn new(genre: &str) -> Self {
        Self {
            difficulty: 0.5,
            depth: 0,
            genre: genre.to_string(),
            custom: CustomParams::default(),
        }
    }

    /// Creates parameters for small, quick maps.
    pub fn for_testing() -> Self {
        Self::new("fantasy").with_size(40, 30)
    }

    /// Sets the requested width and height.
    pub fn with_size(mut self, width: i64, height: i64) -> Self {
        self.custom.width = Some(width);
        self.custom.height = Some(height);
        self
    }

    /// Sets the difficulty.
    pub fn with_difficulty(mut self, difficulty: f64) -> Self {
        self.difficulty = difficulty;
        self
    }

    /// Sets the depth.
    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    /// Genre profile for this parameter set, if the genre is known.
    pub fn genre_profile(&self) -> Option<&'static GenreProfile> {
        genre_profile(&self.genre)
    }
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self::new(DEFAULT_GENRE)
    }
}

/// Represents a rectangular area carved into a grid.
///
/// A room covers exactly its open tiles; walls around it are not part of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    /// Unique identifier for this room within its grid
    pub id: u32,
    /// Top-left corner of the room
    pub top_left: Position,
    /// Width of the room
    pub width: u32,
    /// Height of the room
    pub height: u32,
    /// Purpose of this room
    pub room_type: RoomType,
    /// Ids of rooms this one was connected to
    pub connections: Vec<u32>,
}

/// Purpose tag attached to a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomType {
    /// Standard room with no special purpose
    Normal,
    /// Where the player enters the level
    Spawn,
    /// Where the level is left
    Exit,
    /// Holds the level's strongest encounter
    Boss,
    /// Holds valuables
    Treasure,
    /// Rigged with trap doors
    Trap,
    /// City green space
    Park,
    /// Open city square
    Plaza,
}

impl RoomType {
    /// Lowercase name of the purpose.
    pub fn as_str(self) -> &'static str {
        match self {
            RoomType::Normal => "normal",
            RoomType::Spawn => "spawn",
            RoomType::Exit => "exit",
            RoomType::Boss => "boss",
            RoomType::Treasure => "treasure",
            RoomType::Trap => "trap",
            RoomType::Park => "park",
            RoomType::Plaza => "plaza",
        }
    }
}

impl Room {
    /// Creates a new room. Zero extents are raised to one tile.
    ///
    /// # Examples
    ///
    /// ```
    /// use strata::{Room, Position, RoomType};
    ///
    /// let room = Room::new(1, Position::new(5, 5), 10, 8, RoomType::Normal);
    /// assert_eq!(room.id, 1);
    /// assert_eq!(room.area(), 80);
    /// ```
    pub fn new(id: u32, top_left: Position, width: u32, height: u32, room_type: RoomType) -> Self {
        Self {
            id,
            top_left,
            width: width.max(1),
            height: height.max(1),
            room_type,
            connections: Vec::new(),
        }
    }

    /// Gets the bottom-right corner of the room.
    pub fn bottom_right(&self) -> Position {
        Position::new(
            self.top_left.x + self.width as i32 - 1,
            self.top_left.y + self.height as i32 - 1,
        )
    }

    /// Gets the center position of the room.
    pub fn center(&self) -> Position {
        Position::new(
            self.top_left.x + self.width as i32 / 2,
            self.top_left.y + self.height as i32 / 2,
        )
    }

    /// Gets the area of the room in tiles.
    pub fn area(&self) -> u32 {
        self.width * self.height
    }

    /// Checks if a position is inside this room.
    pub fn contains(&self, pos: Position) -> bool {
        pos.x >= self.top_left.x
            && pos.y >= self.top_left.y
            && pos.x < self.top_left.x + self.width as i32
            && pos.y < self.top_left.y + self.height as i32
    }

    /// Checks if a position is on the outermost ring of this room.
    pub fn is_border(&self, pos: Position) -> bool {
        if !self.contains(pos) {
            return false;
        }
        let bottom_right = self.bottom_right();
        pos.x == self.top_left.x
            || pos.y == self.top_left.y
            || pos.x == bottom_right.x
            || pos.y == bottom_right.y
    }

    /// Checks if this room overlaps with another room.
    pub fn overlaps(&self, other: &Room) -> bool {
        !(self.top_left.x >= other.top_left.x + other.width as i32
            || other.top_left.x >= self.top_left.x + self.width as i32
            || self.top_left.y >= other.top_left.y + other.height as i32
            || other.top_left.y >= self.top_left.y + self.height as i32)
    }

    /// Checks if the room lies entirely inside a `width` x `height` grid.
    pub fn fits_in(&self, width: u32, height: u32) -> bool {
        self.top_left.in_bounds(width, height) && self.bottom_right().in_bounds(width, height)
    }

    /// Gets all positions within this room, row by row.
    pub fn positions(&self) -> Vec<Position> {
        let mut positions = Vec::with_capacity(self.area() as usize);
        for y in self.top_left.y..(self.top_left.y + self.height as i32) {
            for x in self.top_left.x..(self.top_left.x + self.width as i32) {
                positions.push(Position::new(x, y));
            }
        }
        positions
    }

    /// Returns a copy moved by `offset`.
    pub fn translated(&self, offset: Position) -> Room {
        Room {
            top_left: self.top_left + offset,
            ..self.clone()
        }
    }

    /// Adds a connection to another room.
    pub fn add_connection(&mut self, room_id: u32) {
        if !self.connections.contains(&room_id) {
            self.connections.push(room_id);
        }
    }
}

/// Contract shared by every terrain generator.
pub trait Generator {
    /// Generates a grid from a seed and parameters.
    fn generate(&self, seed: i64, params: &GenerationParams) -> StrataResult<Grid>;

    /// Re-checks the generator's quality bar on a finished grid.
    fn validate(&self, grid: &Grid) -> StrataResult<()>;

    /// Gets the generator type name for logging and debugging.
    fn generator_type(&self) -> &'static str;
}

/// Closed set of available generators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorKind {
    Bsp,
    Cellular,
    Maze,
    Forest,
    City,
    Composite,
}

impl GeneratorKind {
    /// The five single-biome generators a composite map can draw from.
    pub const SINGLE_BIOME: [GeneratorKind; 5] = [
        GeneratorKind::Bsp,
        GeneratorKind::Cellular,
        GeneratorKind::Maze,
        GeneratorKind::Forest,
        GeneratorKind::City,
    ];

    /// Command-line and serialisation name.
    pub fn name(self) -> &'static str {
        match self {
            GeneratorKind::Bsp => "bsp",
            GeneratorKind::Cellular => "cellular",
            GeneratorKind::Maze => "maze",
            GeneratorKind::Forest => "forest",
            GeneratorKind::City => "city",
            GeneratorKind::Composite => "composite",
        }
    }

    /// Biome label used by transition palettes.
    pub fn biome(self) -> &'static str {
        match self {
            GeneratorKind::Bsp => "dungeon",
            GeneratorKind::Cellular => "cave",
            GeneratorKind::Maze => "maze",
            GeneratorKind::Forest => "forest",
            GeneratorKind::City => "city",
            GeneratorKind::Composite => "composite",
        }
    }

    /// Runs the generator with its default structural settings.
    pub fn generate(self, seed: i64, params: &GenerationParams) -> StrataResult<Grid> {
        match self {
            GeneratorKind::Bsp => BspGenerator::new().generate(seed, params),
            GeneratorKind::Cellular => CellularGenerator::new().generate(seed, params),
            GeneratorKind::Maze => MazeGenerator::new().generate(seed, params),
            GeneratorKind::Forest => ForestGenerator::new().generate(seed, params),
            GeneratorKind::City => CityGenerator::new().generate(seed, params),
            GeneratorKind::Composite => CompositeGenerator::new().generate(seed, params),
        }
    }

    /// Validates a grid against this generator's quality bar.
    pub fn validate(self, grid: &Grid) -> StrataResult<()> {
        match self {
            GeneratorKind::Bsp => BspGenerator::new().validate(grid),
            GeneratorKind::Cellular => CellularGenerator::new().validate(grid),
            GeneratorKind::Maze => MazeGenerator::new().validate(grid),
            GeneratorKind::Forest => ForestGenerator::new().validate(grid),
            GeneratorKind::City => CityGenerator::new().validate(grid),
            GeneratorKind::Composite => CompositeGenerator::new().validate(grid),
        }
    }
}

impl fmt::Display for GeneratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for GeneratorKind {
    type Err = StrataError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.to_ascii_lowercase().as_str() {
            "bsp" | "dungeon" => Ok(GeneratorKind::Bsp),
            "cellular" | "cave" => Ok(GeneratorKind::Cellular),
            "maze" => Ok(GeneratorKind::Maze),
            "forest" => Ok(GeneratorKind::Forest),
            "city" => Ok(GeneratorKind::City),
            "composite" => Ok(GeneratorKind::Composite),
            other => Err(StrataError::InvalidConfig(format!(
                "unknown generator '{other}'"
            ))),
        }
    }
}

/// Utility functions shared by the generation algorithms.
pub mod utils {
    use super::*;
    use crate::config::SMALL_REGION_TILES;
    use crate::{distance_field, largest_component_index, walkable_components, TileType};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    /// Random stream type used by every generator.
    pub type GenRng = ChaCha8Rng;

    /// Creates the seeded random stream for one generation call.
    pub fn create_rng(seed: i64) -> GenRng {
        ChaCha8Rng::seed_from_u64(seed as u64)
    }

    /// Mixes a seed with a stream id into an independent sub-seed.
    pub fn derive_seed(seed: i64, stream: u64) -> i64 {
        let mut mixed = (seed as u64) ^ stream.wrapping_mul(0x9E37_79B9_7F4A_7C15);
        mixed ^= mixed >> 30;
        mixed = mixed.wrapping_mul(0xBF58_476D_1CE4_E5B9);
        mixed ^= mixed >> 27;
        mixed = mixed.wrapping_mul(0x94D0_49BB_1331_11EB);
        (mixed ^ (mixed >> 31)) as i64
    }

    /// Resolves and checks requested dimensions against `1..=max`.
    pub fn resolve_dimensions(
        custom: &CustomParams,
        default_width: u32,
        default_height: u32,
        max: u32,
    ) -> StrataResult<(u32, u32)> {
        let width = custom.width.unwrap_or(default_width as i64);
        let height = custom.height.unwrap_or(default_height as i64);
        if width <= 0 || height <= 0 {
            return Err(StrataError::InvalidConfig(format!(
                "dimensions must be positive, got {width}x{height}"
            )));
        }
        if width > max as i64 || height > max as i64 {
            return Err(StrataError::InvalidConfig(format!(
                "dimensions {width}x{height} exceed maximum {max}"
            )));
        }
        Ok((width as u32, height as u32))
    }

    /// Resolves a probability-like value, rejecting anything outside `[0, 1]`.
    pub fn unit_fraction(name: &str, value: Option<f64>, default: f64) -> StrataResult<f64> {
        let value = value.unwrap_or(default);
        if !(0.0..=1.0).contains(&value) {
            return Err(StrataError::InvalidConfig(format!(
                "{name} must be within [0, 1], got {value}"
            )));
        }
        Ok(value)
    }

    /// Checks the requested difficulty, which must lie within `[0, 1]`.
    pub fn resolve_difficulty(params: &GenerationParams) -> StrataResult<f64> {
        unit_fraction("difficulty", Some(params.difficulty), 0.5)
    }

    /// Opens a single tile for a corridor.
    ///
    /// Walkable tiles are left alone, deep water becomes a bridge and anything
    /// else becomes corridor.
    pub fn dig(grid: &mut Grid, pos: Position) {
        let tile = grid.get_tile(pos);
        if tile.is_walkable() {
            return;
        }
        let opened = if tile == TileType::WaterDeep {
            TileType::Bridge
        } else {
            TileType::Corridor
        };
        grid.set_tile(pos, opened);
    }

    /// Carves an L-shaped corridor between two points.
    pub fn carve_l_corridor(grid: &mut Grid, start: Position, end: Position, horizontal_first: bool) {
        let corner = if horizontal_first {
            Position::new(end.x, start.y)
        } else {
            Position::new(start.x, end.y)
        };
        carve_straight(grid, start, corner);
        carve_straight(grid, corner, end);
    }

    fn carve_straight(grid: &mut Grid, from: Position, to: Position) {
        for x in from.x.min(to.x)..=from.x.max(to.x) {
            for y in from.y.min(to.y)..=from.y.max(to.y) {
                dig(grid, Position::new(x, y));
            }
        }
    }

    /// Outcome of [`unify_components`].
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct UnifyReport {
        /// Components joined to the largest one
        pub joined: usize,
        /// Small components filled back in with wall
        pub culled: usize,
    }

    /// Leaves exactly one walkable component.
    ///
    /// Components of at most `cull_threshold` tiles (and holding no stairs) are
    /// filled with wall; every other component is joined to the largest one by
    /// an L-shaped dig between their closest tiles.
    pub fn unify_components(grid: &mut Grid, cull_threshold: usize) -> UnifyReport {
        let mut report = UnifyReport::default();
        let components = walkable_components(grid);
        let Some(main) = largest_component_index(&components) else {
            return report;
        };
        let field = distance_field(grid, &components[main], None);
        let width = grid.width() as usize;

        for (index, component) in components.iter().enumerate() {
            if index == main {
                continue;
            }
            let holds_stairs = component.iter().any(|&pos| grid.get_tile(pos).is_stairs());
            if component.len() <= cull_threshold && !holds_stairs {
                for &pos in component {
                    grid.set_tile(pos, TileType::Wall);
                }
                report.culled += 1;
                continue;
            }

            let closest = component
                .iter()
                .filter_map(|&pos| field[pos.y as usize * width + pos.x as usize].map(|(d, target)| (d, pos, target)))
                .min_by_key(|&(distance, pos, _)| (distance, pos.y, pos.x));
            if let Some((_, from, to)) = closest {
                carve_l_corridor(grid, from, to, from.x != to.x);
                report.joined += 1;
            }
        }

        log::debug!(
            "unified components: {} joined, {} culled",
            report.joined,
            report.culled
        );
        report
    }

    /// [`unify_components`] with the standard small-region threshold.
    pub fn unify_default(grid: &mut Grid) -> UnifyReport {
        unify_components(grid, SMALL_REGION_TILES)
    }

    /// Whether a stair could go at `pos` without stranding itself or a neighbour.
    pub fn is_stair_candidate(grid: &Grid, pos: Position, floor_only: bool) -> bool {
        let tile = grid.get_tile(pos);
        let surface_ok = if floor_only {
            tile.is_floor_like()
        } else {
            tile.is_walkable() && !tile.is_stairs() && !tile.is_water()
        };
        surface_ok
            && grid.has_exit(pos)
            && pos
                .orthogonal()
                .into_iter()
                .all(|neighbor| !grid.get_tile(neighbor).is_stairs())
    }

    /// Finds the stair candidate closest to `target`.
    ///
    /// With `radius` set, only the `(2r+1) x (2r+1)` window around the target is
    /// searched. Ties are broken by row, then column.
    pub fn nearest_stair_spot(
        grid: &Grid,
        target: Position,
        radius: Option<i32>,
        floor_only: bool,
    ) -> Option<Position> {
        let candidates: Box<dyn Iterator<Item = Position>> = match radius {
            Some(r) => Box::new(
                ((target.y - r)..=(target.y + r))
                    .flat_map(move |y| ((target.x - r)..=(target.x + r)).map(move |x| Position::new(x, y))),
            ),
            None => Box::new(grid.positions()),
        };
        candidates
            .filter(|&pos| grid.is_in_bounds(pos) && is_stair_candidate(grid, pos, floor_only))
            .min_by_key(|&pos| (pos.manhattan_distance(target), pos.y, pos.x))
    }

    /// Finds a stair spot near `target`, preferring open floor over other walkable tiles.
    pub fn stair_spot_near(grid: &Grid, target: Position) -> Option<Position> {
        nearest_stair_spot(grid, target, None, true)
            .or_else(|| nearest_stair_spot(grid, target, None, false))
    }

    /// Fails unless at least `min_ratio` of the grid is walkable.
    pub fn validate_walkable_ratio(grid: &Grid, min_ratio: f64, generator: &str) -> StrataResult<()> {
        let ratio = grid.walkable_ratio();
        if ratio < min_ratio {
            return Err(StrataError::ValidationFailed(format!(
                "{generator}: walkable ratio {ratio:.3} below {min_ratio:.2}"
            )));
        }
        Ok(())
    }

    /// Fails if any recorded stair is missing or cannot be stepped off.
    pub fn validate_stairs(grid: &Grid) -> StrataResult<()> {
        for pos in &grid.stairs_up {
            if grid.get_tile(*pos) != TileType::StairsUp {
                return Err(StrataError::ValidationFailed(format!(
                    "up-stair at ({}, {}) is missing",
                    pos.x, pos.y
                )));
            }
        }
        for pos in &grid.stairs_down {
            if grid.get_tile(*pos) != TileType::StairsDown {
                return Err(StrataError::ValidationFailed(format!(
                    "down-stair at ({}, {}) is missing",
                    pos.x, pos.y
                )));
            }
        }
        for pos in grid.all_stairs() {
            if !grid.has_exit(pos) {
                return Err(StrataError::ValidationFailed(format!(
                    "stair at ({}, {}) has no walkable neighbour",
                    pos.x, pos.y
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::utils::*;
    use super::*;
    use crate::TileType;
    use std::collections::HashSet;

    #[test]
    fn test_params_defaults() {
        let params = GenerationParams::default();
        assert_eq!(params.genre, DEFAULT_GENRE);
        assert_eq!(params.depth, 0);
        assert_eq!(params.custom, CustomParams::default());
    }

    #[test]
    fn test_params_deserialize_camel_case_keys() {
        let json = r#"{
            "difficulty": 0.8,
            "genreId": "scifi",
            "custom": { "width": 64, "fillProbability": 0.45, "unknownKnob": 3 }
        }"#;
        let params: GenerationParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.difficulty, 0.8);
        assert_eq!(params.genre, "scifi");
        assert_eq!(params.custom.width, Some(64));
        assert_eq!(params.custom.fill_probability, Some(0.45));
        assert_eq!(params.custom.height, None);
    }

    #[test]
    fn test_room_geometry() {
        let room = Room::new(1, Position::new(5, 5), 10, 8, RoomType::Normal);

        assert_eq!(room.bottom_right(), Position::new(14, 12));
        assert_eq!(room.center(), Position::new(10, 9));

        assert!(room.contains(Position::new(7, 7)));
        assert!(room.contains(Position::new(5, 5))); // Top-left corner
        assert!(room.contains(Position::new(14, 12))); // Bottom-right corner
        assert!(!room.contains(Position::new(4, 5))); // Outside left
        assert!(!room.contains(Position::new(15, 12))); // Outside right

        assert!(room.is_border(Position::new(5, 5)));
        assert!(room.is_border(Position::new(10, 5)));
        assert!(!room.is_border(Position::new(7, 7)));
        assert_eq!(room.positions().len(), 80);
    }

    #[test]
    fn test_room_never_has_zero_extent() {
        let room = Room::new(0, Position::new(1, 1), 0, 0, RoomType::Normal);
        assert_eq!(room.width, 1);
        assert_eq!(room.height, 1);
    }

    #[test]
    fn test_room_overlap() {
        let room1 = Room::new(1, Position::new(5, 5), 10, 8, RoomType::Normal);
        let room2 = Room::new(2, Position::new(10, 8), 6, 6, RoomType::Normal); // Overlaps
        let room3 = Room::new(3, Position::new(20, 20), 5, 5, RoomType::Normal); // No overlap

        assert!(room1.overlaps(&room2));
        assert!(room2.overlaps(&room1));
        assert!(!room1.overlaps(&room3));
        assert!(!room3.overlaps(&room1));
    }

    #[test]
    fn test_room_connections() {
        let mut room = Room::new(1, Position::new(5, 5), 10, 8, RoomType::Normal);
        room.add_connection(2);
        room.add_connection(3);
        room.add_connection(2);
        assert_eq!(room.connections, vec![2, 3]);
    }

    #[test]
    fn test_generator_kind_names_round_trip() {
        for kind in GeneratorKind::SINGLE_BIOME {
            assert_eq!(kind.name().parse::<GeneratorKind>().unwrap(), kind);
        }
        assert_eq!("Composite".parse::<GeneratorKind>().unwrap(), GeneratorKind::Composite);
        assert!("volcano".parse::<GeneratorKind>().is_err());
    }

    #[test]
    fn test_derive_seed_is_stable_and_spread() {
        assert_eq!(derive_seed(99, 3), derive_seed(99, 3));
        let seeds: HashSet<i64> = (0..50).map(|stream| derive_seed(99, stream)).collect();
        assert_eq!(seeds.len(), 50);
        assert_ne!(derive_seed(98, 3), derive_seed(99, 3));
    }

    #[test]
    fn test_resolve_dimensions() {
        let mut custom = CustomParams::default();
        assert_eq!(resolve_dimensions(&custom, 80, 40, 100).unwrap(), (80, 40));

        custom.width = Some(0);
        assert!(matches!(
            resolve_dimensions(&custom, 80, 40, 100),
            Err(StrataError::InvalidConfig(_))
        ));

        custom.width = Some(101);
        assert!(resolve_dimensions(&custom, 80, 40, 100).is_err());

        custom.width = Some(-5);
        assert!(resolve_dimensions(&custom, 80, 40, 100).is_err());
    }

    #[test]
    fn test_unit_fraction() {
        assert_eq!(unit_fraction("x", None, 0.4).unwrap(), 0.4);
        assert_eq!(unit_fraction("x", Some(1.0), 0.4).unwrap(), 1.0);
        assert!(unit_fraction("x", Some(1.5), 0.4).is_err());
        assert!(unit_fraction("x", Some(f64::NAN), 0.4).is_err());
    }

    #[test]
    fn test_difficulty_must_be_a_unit_fraction() {
        assert_eq!(resolve_difficulty(&GenerationParams::default()).unwrap(), 0.5);
        assert_eq!(resolve_difficulty(&GenerationParams::default().with_difficulty(1.0)).unwrap(), 1.0);
        for bad in [5.0, -3.0, f64::NAN] {
            let params = GenerationParams::default().with_difficulty(bad);
            assert!(matches!(resolve_difficulty(&params), Err(StrataError::InvalidConfig(_))));
            for kind in GeneratorKind::SINGLE_BIOME.into_iter().chain([GeneratorKind::Composite]) {
                assert!(
                    matches!(kind.generate(1, &params), Err(StrataError::InvalidConfig(_))),
                    "{kind} accepted difficulty {bad}"
                );
            }
        }
    }

    #[test]
    fn test_l_corridor_carving() {
        let mut grid = Grid::new(20, 20);
        let start = Position::new(5, 5);
        let end = Position::new(15, 15);

        carve_l_corridor(&mut grid, start, end, true);

        assert_eq!(grid.get_tile(start), TileType::Corridor);
        assert_eq!(grid.get_tile(end), TileType::Corridor);
        assert_eq!(grid.get_tile(Position::new(15, 5)), TileType::Corridor);
        assert_eq!(grid.count(TileType::Corridor), 21);
    }

    #[test]
    fn test_dig_bridges_deep_water_and_keeps_stairs() {
        let mut grid = Grid::new(5, 1);
        grid.set_tile(Position::new(1, 0), TileType::WaterDeep);
        grid.set_tile(Position::new(2, 0), TileType::StairsDown);
        carve_l_corridor(&mut grid, Position::new(0, 0), Position::new(4, 0), true);
        assert_eq!(grid.get_tile(Position::new(1, 0)), TileType::Bridge);
        assert_eq!(grid.get_tile(Position::new(2, 0)), TileType::StairsDown);
        assert_eq!(grid.get_tile(Position::new(3, 0)), TileType::Corridor);
    }

    #[test]
    fn test_unify_components_joins_and_culls() {
        let mut grid = Grid::new(30, 10);
        grid.fill_rect(Position::new(1, 1), 8, 8, TileType::Floor); // 64 tiles
        grid.fill_rect(Position::new(20, 1), 5, 5, TileType::Floor); // 25 tiles
        grid.fill_rect(Position::new(12, 8), 2, 1, TileType::Floor); // 2 tiles

        let report = unify_components(&mut grid, 10);
        assert_eq!(report, UnifyReport { joined: 1, culled: 1 });
        assert_eq!(crate::walkable_components(&grid).len(), 1);
        assert_eq!(grid.get_tile(Position::new(12, 8)), TileType::Wall);
    }

    #[test]
    fn test_stair_spot_search() {
        let mut grid = Grid::new(9, 9);
        grid.fill_rect(Position::new(1, 1), 3, 3, TileType::Floor);
        let spot = nearest_stair_spot(&grid, Position::new(8, 8), None, true).unwrap();
        assert_eq!(spot, Position::new(3, 3));
        assert!(nearest_stair_spot(&grid, Position::new(8, 8), Some(2), true).is_none());

        grid.place_stairs_up(spot);
        let second = stair_spot_near(&grid, Position::new(8, 8)).unwrap();
        assert_ne!(second, spot);
        assert!(second.manhattan_distance(spot) > 1);
    }

    #[test]
    fn test_validate_stairs() {
        let mut grid = Grid::filled(5, 5, TileType::Floor);
        grid.place_stairs_up(Position::new(2, 2));
        assert!(validate_stairs(&grid).is_ok());

        grid.set_tile(Position::new(2, 2), TileType::Floor);
        assert!(validate_stairs(&grid).is_err());
    }
}
