//! # Voronoi Partitioning
//!
//! Splits a map into a handful of regions around grid-jittered seed points.
//! Every tile belongs to the seed nearest to it by Manhattan distance, with
//! ties going to the lower region id.

use crate::generation::utils::GenRng;
use crate::{Position, StrataError, StrataResult};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeSet;

/// Fewest regions a partition may hold.
pub const MIN_REGIONS: u32 = 2;

/// Most regions a partition may hold.
pub const MAX_REGIONS: u32 = 4;

/// One cell of a partition.
#[derive(Debug, Clone, PartialEq)]
pub struct VoronoiRegion {
    pub id: usize,
    pub seed: Position,
    /// Owned tiles in row-major order
    pub tiles: Vec<Position>,
}

impl VoronoiRegion {
    /// Inclusive bounding box of the owned tiles.
    pub fn bounds(&self) -> Option<(Position, Position)> {
        let first = *self.tiles.first()?;
        let (mut min, mut max) = (first, first);
        for pos in &self.tiles {
            min = Position::new(min.x.min(pos.x), min.y.min(pos.y));
            max = Position::new(max.x.max(pos.x), max.y.max(pos.y));
        }
        Some((min, max))
    }
}

/// A complete partition of a `width` x `height` map.
#[derive(Debug, Clone, PartialEq)]
pub struct VoronoiPartition {
    pub width: u32,
    pub height: u32,
    pub regions: Vec<VoronoiRegion>,
    owner: Vec<usize>,
}

impl VoronoiPartition {
    /// Partitions the map into `count` regions.
    ///
    /// Seeds are drawn one per cell of a `ceil(sqrt(count))`-column lattice,
    /// jittered inside the middle half of their cell; which cells are used is
    /// shuffled.
    pub fn generate(width: u32, height: u32, count: u32, rng: &mut GenRng) -> StrataResult<Self> {
        if !(MIN_REGIONS..=MAX_REGIONS).contains(&count) {
            return Err(StrataError::InvalidConfig(format!(
                "region count must be within {MIN_REGIONS}..={MAX_REGIONS}, got {count}"
            )));
        }
        if width == 0 || height == 0 {
            return Err(StrataError::InvalidConfig(format!(
                "cannot partition a {width}x{height} map"
            )));
        }

        let cols = (count as f64).sqrt().ceil() as u32;
        let rows = count.div_ceil(cols);
        let cell_width = (width / cols).max(1) as i32;
        let cell_height = (height / rows).max(1) as i32;

        let mut cells: Vec<(i32, i32)> = (0..rows as i32)
            .flat_map(|row| (0..cols as i32).map(move |col| (col, row)))
            .collect();
        cells.shuffle(rng);

        let seeds: Vec<Position> = cells
            .into_iter()
            .take(count as usize)
            .map(|(col, row)| {
                let x = col * cell_width + rng.gen_range(cell_width / 4..=cell_width * 3 / 4);
                let y = row * cell_height + rng.gen_range(cell_height / 4..=cell_height * 3 / 4);
                Position::new(x.min(width as i32 - 1), y.min(height as i32 - 1))
            })
            .collect();

        Ok(Self::from_seeds(width, height, &seeds))
    }

    /// Builds a partition from explicit seed points; seed `i` becomes region `i`.
    pub fn from_seeds(width: u32, height: u32, seeds: &[Position]) -> Self {
        let mut regions: Vec<VoronoiRegion> = seeds
            .iter()
            .enumerate()
            .map(|(id, &seed)| VoronoiRegion {
                id,
                seed,
                tiles: Vec::new(),
            })
            .collect();
        let mut owner = Vec::with_capacity(width as usize * height as usize);

        for y in 0..height as i32 {
            for x in 0..width as i32 {
                let pos = Position::new(x, y);
                let nearest = seeds
                    .iter()
                    .enumerate()
                    .min_by_key(|&(id, &seed)| (pos.manhattan_distance(seed), id))
                    .map_or(0, |(id, _)| id);
                owner.push(nearest);
                if let Some(region) = regions.get_mut(nearest) {
                    region.tiles.push(pos);
                }
            }
        }

        log::debug!(
            "voronoi: {} regions over {width}x{height}, sizes {:?}",
            regions.len(),
            regions.iter().map(|region| region.tiles.len()).collect::<Vec<_>>()
        );
        Self {
            width,
            height,
            regions,
            owner,
        }
    }

    /// Region owning a tile, or `None` outside the map.
    pub fn region_at(&self, pos: Position) -> Option<usize> {
        if !pos.in_bounds(self.width, self.height) {
            return None;
        }
        self.owner.get(pos.y as usize * self.width as usize + pos.x as usize).copied()
    }

    /// Pairs of regions sharing an orthogonal border, as `(lower, higher)` ids.
    pub fn boundary_pairs(&self) -> BTreeSet<(usize, usize)> {
        let mut pairs = BTreeSet::new();
        for y in 0..self.height as i32 {
            for x in 0..self.width as i32 {
                let pos = Position::new(x, y);
                let Some(here) = self.region_at(pos) else {
                    continue;
                };
                for next in [Position::new(x + 1, y), Position::new(x, y + 1)] {
                    if let Some(there) = self.region_at(next) {
                        if there != here {
                            pairs.insert((here.min(there), here.max(there)));
                        }
                    }
                }
            }
        }
        pairs
    }

    /// Tiles of `a` or `b` that touch a tile of the other region.
    pub fn boundary_tiles(&self, a: usize, b: usize) -> Vec<Position> {
        let mut tiles = Vec::new();
        for y in 0..self.height as i32 {
            for x in 0..self.width as i32 {
                let pos = Position::new(x, y);
                let here = self.region_at(pos);
                let other = match here {
                    Some(id) if id == a => b,
                    Some(id) if id == b => a,
                    _ => continue,
                };
                if pos
                    .orthogonal()
                    .into_iter()
                    .any(|next| self.region_at(next) == Some(other))
                {
                    tiles.push(pos);
                }
            }
        }
        tiles
    }
}
