//! # Transition Blending
//!
//! Softens the seams of a composite map. Around every border between two
//! regions a band of tiles is repainted from a weighted palette chosen by the
//! pair of biomes meeting there.

use crate::generation::utils::GenRng;
use crate::{distance_field, GeneratorKind, Grid, Position, StrataError, StrataResult, TileType, VoronoiPartition};
use rand::distributions::{Distribution, WeightedIndex};

/// Default transition band radius.
pub const DEFAULT_TRANSITION_WIDTH: u32 = 3;

type Palette = &'static [(TileType, u32)];

const DUNGEON_FOREST: Palette = &[(TileType::Floor, 50), (TileType::Tree, 30), (TileType::Structure, 20)];
const DUNGEON_CAVE: Palette = &[(TileType::Floor, 50), (TileType::Wall, 30), (TileType::Corridor, 20)];
const DUNGEON_MAZE: Palette = &[(TileType::Floor, 40), (TileType::Corridor, 30), (TileType::Wall, 30)];
const DUNGEON_CITY: Palette = &[(TileType::Floor, 40), (TileType::Corridor, 40), (TileType::Structure, 20)];
const CAVE_FOREST: Palette = &[(TileType::Floor, 50), (TileType::Tree, 30), (TileType::WaterShallow, 20)];
const CAVE_MAZE: Palette = &[(TileType::Floor, 50), (TileType::Wall, 50)];
const CAVE_CITY: Palette = &[(TileType::Floor, 50), (TileType::Structure, 25), (TileType::Wall, 25)];
const FOREST_MAZE: Palette = &[(TileType::Floor, 50), (TileType::Tree, 35), (TileType::Wall, 15)];
const FOREST_CITY: Palette = &[(TileType::Floor, 50), (TileType::Tree, 25), (TileType::Structure, 25)];
const MAZE_CITY: Palette = &[(TileType::Corridor, 50), (TileType::Floor, 30), (TileType::Structure, 20)];
const FALLBACK: Palette = &[(TileType::Floor, 60), (TileType::Wall, 40)];

/// Weighted tile mix used where two biomes meet. Order of the pair does not matter.
///
/// # Examples
///
/// ```
/// use strata::{transition_palette, TileType};
///
/// let palette = transition_palette("forest", "dungeon");
/// assert_eq!(palette[0], (TileType::Floor, 50));
/// assert_eq!(palette, transition_palette("dungeon", "forest"));
/// ```
pub fn transition_palette(a: &str, b: &str) -> &'static [(TileType, u32)] {
    let (first, second) = if a <= b { (a, b) } else { (b, a) };
    match (first, second) {
        ("dungeon", "forest") => DUNGEON_FOREST,
        ("cave", "dungeon") => DUNGEON_CAVE,
        ("dungeon", "maze") => DUNGEON_MAZE,
        ("city", "dungeon") => DUNGEON_CITY,
        ("cave", "forest") => CAVE_FOREST,
        ("cave", "maze") => CAVE_MAZE,
        ("cave", "city") => CAVE_CITY,
        ("forest", "maze") => FOREST_MAZE,
        ("city", "forest") => FOREST_CITY,
        ("city", "maze") => MAZE_CITY,
        _ => FALLBACK,
    }
}

/// Repaints region borders with blended tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionBlender {
    width: u32,
}

impl TransitionBlender {
    /// Creates a blender with a band radius within `2..=4`.
    pub fn new(width: u32) -> StrataResult<Self> {
        if !(2..=4).contains(&width) {
            return Err(StrataError::InvalidConfig(format!(
                "transitionWidth must be within 2..=4, got {width}"
            )));
        }
        Ok(Self { width })
    }

    /// Band radius.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Repaints every transition band and returns the repainted tiles.
    ///
    /// Region pairs are visited in ascending id order and a tile shared by two
    /// bands is painted once, by the first. Stairs are left untouched.
    pub fn blend(
        &self,
        grid: &mut Grid,
        partition: &VoronoiPartition,
        biomes: &[GeneratorKind],
        rng: &mut GenRng,
    ) -> StrataResult<Vec<Position>> {
        let width = grid.width() as usize;
        let mut painted = vec![false; grid.area()];
        let mut repainted = Vec::new();

        for (a, b) in partition.boundary_pairs() {
            let (Some(kind_a), Some(kind_b)) = (biomes.get(a), biomes.get(b)) else {
                continue;
            };
            let palette = transition_palette(kind_a.biome(), kind_b.biome());
            let weights = WeightedIndex::new(palette.iter().map(|&(_, weight)| weight))
                .map_err(|err| StrataError::GenerationFailed(format!("bad transition palette: {err}")))?;

            let border = partition.boundary_tiles(a, b);
            let band = distance_field(grid, &border, Some(self.width));
            let mut count = 0;
            for pos in grid.positions().collect::<Vec<_>>() {
                let index = pos.y as usize * width + pos.x as usize;
                let in_pair = matches!(partition.region_at(pos), Some(id) if id == a || id == b);
                if band[index].is_none() || !in_pair || painted[index] || grid.get_tile(pos).is_stairs() {
                    continue;
                }
                grid.set_tile(pos, palette[weights.sample(rng)].0);
                painted[index] = true;
                repainted.push(pos);
                count += 1;
            }
            log::debug!(
                "transitions: {count} tiles blended between region {a} ({}) and region {b} ({})",
                kind_a.biome(),
                kind_b.biome()
            );
        }

        Ok(repainted)
    }
}

impl Default for TransitionBlender {
    fn default() -> Self {
        Self {
            width: DEFAULT_TRANSITION_WIDTH,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::utils::create_rng;

    #[test]
    fn test_palette_lookup_is_symmetric() {
        for a in GeneratorKind::SINGLE_BIOME {
            for b in GeneratorKind::SINGLE_BIOME {
                assert_eq!(transition_palette(a.biome(), b.biome()), transition_palette(b.biome(), a.biome()));
            }
        }
        assert_eq!(transition_palette("cave", "maze"), CAVE_MAZE);
        assert_eq!(transition_palette("dungeon", "dungeon"), FALLBACK);
        for palette in [DUNGEON_FOREST, DUNGEON_CAVE, DUNGEON_MAZE, CAVE_FOREST, MAZE_CITY] {
            assert_eq!(palette.iter().map(|&(_, weight)| weight).sum::<u32>(), 100);
        }
    }

    #[test]
    fn test_width_limits() {
        assert!(TransitionBlender::new(1).is_err());
        assert!(TransitionBlender::new(5).is_err());
        assert_eq!(TransitionBlender::new(4).unwrap().width(), 4);
    }

    #[test]
    fn test_blend_stays_near_border() {
        let mut grid = Grid::filled(20, 5, TileType::Corridor);
        let partition = VoronoiPartition::from_seeds(20, 5, &[Position::new(2, 2), Position::new(17, 2)]);
        let biomes = [GeneratorKind::Bsp, GeneratorKind::Forest];
        let blender = TransitionBlender::new(2).unwrap();
        let tiles = blender.blend(&mut grid, &partition, &biomes, &mut create_rng(4)).unwrap();

        assert!(!tiles.is_empty());
        // border lies between x = 9 and x = 10
        for pos in &tiles {
            assert!((7..=12).contains(&pos.x), "({}, {}) is outside the band", pos.x, pos.y);
            assert!(matches!(
                grid.get_tile(*pos),
                TileType::Floor | TileType::Tree | TileType::Structure
            ));
        }
        assert_eq!(grid.get_tile(Position::new(0, 0)), TileType::Corridor);
    }

    #[test]
    fn test_stairs_survive_blending() {
        let mut grid = Grid::filled(20, 5, TileType::Floor);
        grid.place_stairs_up(Position::new(9, 2));
        let partition = VoronoiPartition::from_seeds(20, 5, &[Position::new(2, 2), Position::new(17, 2)]);
        let biomes = [GeneratorKind::Cellular, GeneratorKind::Maze];
        TransitionBlender::default()
            .blend(&mut grid, &partition, &biomes, &mut create_rng(1))
            .unwrap();
        assert_eq!(grid.get_tile(Position::new(9, 2)), TileType::StairsUp);
    }
}
