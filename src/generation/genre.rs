//! # Genre Preferences
//!
//! Static lookup from a thematic genre to its preferred generators, density
//! defaults and display names for tiles.
//!
//! The table is built once on first use and never mutated afterwards.

use crate::{GeneratorKind, TileType};
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Genre used when parameters do not name one.
pub const DEFAULT_GENRE: &str = "fantasy";

/// Generation preferences for one genre.
#[derive(Debug, Clone, PartialEq)]
pub struct GenreProfile {
    /// Genre identifier
    pub id: &'static str,
    /// Generators in order of preference
    pub preferred: &'static [GeneratorKind],
    /// Default wall fill probability for caves
    pub fill_probability: f64,
    /// Default tree density for forests
    pub tree_density: f64,
    /// Default chance of water features
    pub water_chance: f64,
    /// Default share of city blocks that hold buildings
    pub building_density: f64,
    /// Default share of city blocks that are plazas
    pub plaza_density: f64,
    tile_names: &'static [(TileType, &'static str)],
}

impl GenreProfile {
    /// Generator assigned to a dungeon depth: cycles through the preferences.
    ///
    /// # Examples
    ///
    /// ```
    /// use strata::{genre_profile, GeneratorKind};
    ///
    /// let fantasy = genre_profile("fantasy").unwrap();
    /// assert_eq!(fantasy.generator_for_depth(0), GeneratorKind::Bsp);
    /// ```
    pub fn generator_for_depth(&self, depth: usize) -> GeneratorKind {
        self.preferred
            .get(depth % self.preferred.len().max(1))
            .copied()
            .unwrap_or(GeneratorKind::Bsp)
    }

    /// Themed display name of a tile, falling back to a generic name.
    pub fn tile_name(&self, tile: TileType) -> &'static str {
        self.tile_names
            .iter()
            .find(|(kind, _)| *kind == tile)
            .map(|(_, name)| *name)
            .unwrap_or_else(|| generic_tile_name(tile))
    }
}

/// Plain name of a tile kind.
pub fn generic_tile_name(tile: TileType) -> &'static str {
    match tile {
        TileType::Wall => "wall",
        TileType::Floor => "floor",
        TileType::Corridor => "corridor",
        TileType::Door => "door",
        TileType::WaterShallow => "shallow water",
        TileType::WaterDeep => "deep water",
        TileType::Tree => "tree",
        TileType::StairsUp => "stairs up",
        TileType::StairsDown => "stairs down",
        TileType::TrapDoor => "trap door",
        TileType::SecretDoor => "secret door",
        TileType::Bridge => "bridge",
        TileType::Structure => "structure",
        TileType::WallNortheast
        | TileType::WallNorthwest
        | TileType::WallSoutheast
        | TileType::WallSouthwest => "angled wall",
        TileType::Platform => "platform",
        TileType::RampUp => "ramp up",
        TileType::RampDown => "ramp down",
        TileType::Lava => "lava",
        TileType::Pit => "pit",
    }
}

fn build_table() -> BTreeMap<&'static str, GenreProfile> {
    use GeneratorKind::*;

    let profiles = [
        GenreProfile {
            id: "fantasy",
            preferred: &[Bsp, Forest, Cellular, Maze],
            fill_probability: 0.40,
            tree_density: 0.5,
            water_chance: 0.3,
            building_density: 0.7,
            plaza_density: 0.2,
            tile_names: &[
                (TileType::Wall, "stone wall"),
                (TileType::Floor, "flagstone floor"),
                (TileType::Structure, "cottage"),
                (TileType::Tree, "oak"),
                (TileType::Lava, "dragonfire"),
            ],
        },
        GenreProfile {
            id: "scifi",
            preferred: &[City, Bsp, Maze],
            fill_probability: 0.42,
            tree_density: 0.2,
            water_chance: 0.1,
            building_density: 0.8,
            plaza_density: 0.15,
            tile_names: &[
                (TileType::Wall, "bulkhead"),
                (TileType::Floor, "deck plating"),
                (TileType::Door, "airlock"),
                (TileType::Structure, "reactor housing"),
                (TileType::Tree, "hydroponic column"),
                (TileType::Lava, "plasma conduit"),
            ],
        },
        GenreProfile {
            id: "horror",
            preferred: &[Maze, Cellular, Bsp],
            fill_probability: 0.45,
            tree_density: 0.7,
            water_chance: 0.4,
            building_density: 0.6,
            plaza_density: 0.1,
            tile_names: &[
                (TileType::Wall, "rotting wall"),
                (TileType::Floor, "creaking floorboards"),
                (TileType::Tree, "dead tree"),
                (TileType::WaterDeep, "black water"),
                (TileType::Pit, "open grave"),
            ],
        },
        GenreProfile {
            id: "cyberpunk",
            preferred: &[City, Maze, Bsp],
            fill_probability: 0.40,
            tree_density: 0.1,
            water_chance: 0.15,
            building_density: 0.8,
            plaza_density: 0.15,
            tile_names: &[
                (TileType::Wall, "neon-lit wall"),
                (TileType::Corridor, "alley"),
                (TileType::Structure, "megablock"),
                (TileType::WaterShallow, "runoff"),
            ],
        },
        GenreProfile {
            id: "postapoc",
            preferred: &[City, Forest, Cellular],
            fill_probability: 0.43,
            tree_density: 0.3,
            water_chance: 0.2,
            building_density: 0.5,
            plaza_density: 0.3,
            tile_names: &[
                (TileType::Wall, "rubble"),
                (TileType::Floor, "cracked asphalt"),
                (TileType::Structure, "ruin"),
                (TileType::WaterDeep, "irradiated pool"),
            ],
        },
    ];

    profiles.into_iter().map(|profile| (profile.id, profile)).collect()
}

/// Looks up a genre profile by identifier (case-insensitive).
pub fn genre_profile(id: &str) -> Option<&'static GenreProfile> {
    static TABLE: OnceLock<BTreeMap<&'static str, GenreProfile>> = OnceLock::new();
    TABLE
        .get_or_init(build_table)
        .get(id.to_ascii_lowercase().as_str())
}

/// Themed tile name for a genre, or the generic name for unknown genres.
pub fn theme_tile_name(genre: &str, tile: TileType) -> &'static str {
    genre_profile(genre)
        .map(|profile| profile.tile_name(tile))
        .unwrap_or_else(|| generic_tile_name(tile))
}
