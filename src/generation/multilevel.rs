//! # Multi-Level Stitching
//!
//! Generates a stack of dungeon floors and joins consecutive floors with a
//! down-stair on the upper level and an up-stair at (or near) the same
//! coordinate on the level below.

use crate::config::MAX_LEVELS;
use crate::generation::utils::{
    derive_seed, is_stair_candidate, nearest_stair_spot, resolve_difficulty, stair_spot_near,
};
use crate::{GenerationParams, GeneratorKind, Grid, Position, RoomType, StrataError, StrataResult};
use std::collections::BTreeMap;

/// Half-size of the window searched for an aligned up-stair.
const ALIGN_RADIUS: i32 = 10;

/// Difficulty added per level of depth.
const DIFFICULTY_PER_LEVEL: f64 = 0.1;

/// Generates and connects multi-level dungeons.
///
/// # Examples
///
/// ```
/// use strata::{GenerationParams, MultiLevelGenerator};
///
/// let stitcher = MultiLevelGenerator::new();
/// let levels = stitcher.generate(3, 42, &GenerationParams::for_testing()).unwrap();
/// assert_eq!(levels.len(), 3);
/// assert!(stitcher.validate(&levels).is_ok());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MultiLevelGenerator {
    assignments: BTreeMap<usize, GeneratorKind>,
    genre_policy: bool,
}

impl MultiLevelGenerator {
    /// Creates a stitcher that uses the BSP generator on every level.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a stitcher that picks each level's generator from the genre's
    /// preference cycle.
    pub fn with_genre_policy() -> Self {
        Self {
            assignments: BTreeMap::new(),
            genre_policy: true,
        }
    }

    /// Assigns a generator to one depth, overriding any policy.
    pub fn with_generator(mut self, depth: usize, kind: GeneratorKind) -> Self {
        self.assignments.insert(depth, kind);
        self
    }

    /// Generator used for a depth.
    pub fn generator_for(&self, depth: usize, params: &GenerationParams) -> GeneratorKind {
        if let Some(&kind) = self.assignments.get(&depth) {
            return kind;
        }
        match params.genre_profile() {
            Some(profile) if self.genre_policy => profile.generator_for_depth(depth),
            _ => GeneratorKind::Bsp,
        }
    }

    /// Generates `level_count` levels (1 to 20) and connects them with stairs.
    ///
    /// Each level's own stairs are discarded; the returned levels carry only
    /// the stairs that link them.
    pub fn generate(&self, level_count: usize, seed: i64, base: &GenerationParams) -> StrataResult<Vec<Grid>> {
        if !(1..=MAX_LEVELS).contains(&level_count) {
            return Err(StrataError::InvalidConfig(format!(
                "level count must be within 1..={MAX_LEVELS}, got {level_count}"
            )));
        }
        let base_difficulty = resolve_difficulty(base)?;

        let mut levels = Vec::with_capacity(level_count);
        for depth in 0..level_count {
            let mut params = base.clone();
            params.depth = depth as u32;
            params.difficulty = (base_difficulty + depth as f64 * DIFFICULTY_PER_LEVEL).min(1.0);
            let kind = self.generator_for(depth, &params);
            let mut grid = kind.generate(derive_seed(seed, depth as u64), &params)?;
            grid.level = depth;
            grid.clear_stairs();
            log::debug!(
                "multilevel: level {depth} generated by {kind} at difficulty {:.2}",
                params.difficulty
            );
            levels.push(grid);
        }

        for upper in 0..level_count.saturating_sub(1) {
            let (head, tail) = levels.split_at_mut(upper + 1);
            connect_levels(&mut head[upper], &mut tail[0])?;
        }

        log::info!("multilevel: stitched {level_count} levels (seed {seed})");
        Ok(levels)
    }

    /// Checks that a stack is fully connected.
    ///
    /// The first level needs a down-stair, the last an up-stair and every level
    /// in between both; a lone level needs neither. Every stair must have an
    /// exit.
    pub fn validate(&self, levels: &[Grid]) -> StrataResult<()> {
        let last = levels.len().saturating_sub(1);
        for (index, grid) in levels.iter().enumerate() {
            if index < last && grid.stairs_down.is_empty() {
                return Err(StrataError::ValidationFailed(format!("level {index} has no down-stair")));
            }
            if index > 0 && grid.stairs_up.is_empty() {
                return Err(StrataError::ValidationFailed(format!("level {index} has no up-stair")));
            }
            for pos in grid.all_stairs() {
                if !grid.get_tile(pos).is_stairs() || !grid.has_exit(pos) {
                    return Err(StrataError::ValidationFailed(format!(
                        "level {index}: stair at ({}, {}) is not accessible",
                        pos.x, pos.y
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Places a down-stair on `upper` and the matching up-stair on `lower`.
///
/// The down-stair goes at the exit room's centre, else another room centre,
/// else any floor. The up-stair takes the nearest floor within the 21x21
/// window around the same coordinate, else the nearest walkable tile anywhere.
pub fn connect_levels(upper: &mut Grid, lower: &mut Grid) -> StrataResult<(Position, Position)> {
    let (upper_index, lower_index) = (upper.level, lower.level);
    let down = down_stair_spot(upper).ok_or_else(|| StrataError::Connectivity {
        upper: upper_index,
        lower: lower_index,
        reason: "no walkable tile for the down-stair".to_string(),
    })?;
    upper.place_stairs_down(down);

    let up = nearest_stair_spot(lower, down, Some(ALIGN_RADIUS), true)
        .or_else(|| {
            log::warn!(
                "multilevel: no floor near ({}, {}) on level {lower_index}, searching the whole level",
                down.x,
                down.y
            );
            stair_spot_near(lower, down)
        })
        .ok_or_else(|| StrataError::Connectivity {
            upper: upper_index,
            lower: lower_index,
            reason: "no walkable tile for the up-stair".to_string(),
        })?;
    lower.place_stairs_up(up);

    log::debug!(
        "multilevel: level {upper_index} ({}, {}) -> level {lower_index} ({}, {})",
        down.x,
        down.y,
        up.x,
        up.y
    );
    Ok((down, up))
}

fn down_stair_spot(grid: &Grid) -> Option<Position> {
    let exits = grid.rooms.iter().filter(|room| room.room_type == RoomType::Exit);
    let others = grid.rooms.iter().filter(|room| room.room_type != RoomType::Exit);
    exits
        .chain(others)
        .map(|room| room.center())
        .find(|&center| is_stair_candidate(grid, center, true))
        .or_else(|| {
            let middle = Position::new(grid.width() as i32 / 2, grid.height() as i32 / 2);
            stair_spot_near(grid, middle)
        })
}

/// Generates a BSP stack of `level_count` levels.
pub fn generate_multi_level(level_count: usize, seed: i64, base: &GenerationParams) -> StrataResult<Vec<Grid>> {
    MultiLevelGenerator::new().generate(level_count, seed, base)
}
