//! # Water Features
//!
//! Lake, river, moat and flood-fill water synthesis sharing one depth model
//! (deep core, shallow rim), plus automatic bridge placement.
//!
//! Water only ever replaces open ground or trees: walls, doors, stairs and
//! built features are never overwritten.

use crate::generation::utils::GenRng;
use crate::{Grid, Position, Room, TileType};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::f64::consts::PI;

/// Normalised radius inside which a lake is deep.
const DEEP_CORE_RADIUS: f64 = 0.6;

/// Number of angular samples used to roughen lake shorelines.
const SHORE_SAMPLES: usize = 16;

/// Kind of water body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaterFeatureKind {
    Lake,
    River,
    Moat,
    Pool,
}

/// A water body painted onto a grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterFeature {
    /// What kind of water body this is
    pub kind: WaterFeatureKind,
    /// Tiles turned into water
    pub tiles: Vec<Position>,
    /// Feature tiles later turned into bridges
    pub bridges: Vec<Position>,
}

impl WaterFeature {
    fn new(kind: WaterFeatureKind) -> Self {
        Self {
            kind,
            tiles: Vec::new(),
            bridges: Vec::new(),
        }
    }

    fn finished(mut self) -> Self {
        self.tiles.sort_unstable();
        self.tiles.dedup();
        self
    }

    /// Whether the feature painted nothing.
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

fn can_hold_water(tile: TileType) -> bool {
    matches!(
        tile,
        TileType::Floor | TileType::Corridor | TileType::Tree | TileType::WaterShallow | TileType::WaterDeep
    )
}

/// Paints water features onto a grid using the caller's random stream.
pub struct WaterPainter<'a> {
    grid: &'a mut Grid,
    rng: &'a mut GenRng,
}

impl<'a> WaterPainter<'a> {
    /// Creates a painter over a grid.
    pub fn new(grid: &'a mut Grid, rng: &'a mut GenRng) -> Self {
        Self { grid, rng }
    }

    /// Writes one water tile. Deep water is never made shallow again.
    fn paint(&mut self, feature: &mut WaterFeature, pos: Position, deep: bool) {
        let current = self.grid.get_tile(pos);
        if !self.grid.is_in_bounds(pos) || !can_hold_water(current) {
            return;
        }
        let tile = if deep || current == TileType::WaterDeep {
            TileType::WaterDeep
        } else {
            TileType::WaterShallow
        };
        self.grid.set_tile(pos, tile);
        feature.tiles.push(pos);
    }

    /// Paints an elliptical lake.
    ///
    /// `jitter` (0 to 1) roughens the shoreline by scaling the radius per
    /// direction by up to that fraction. Tiles within 0.6 of the normalised
    /// radius are deep, the rest of the ellipse is shallow.
    pub fn lake(&mut self, center: Position, radius_x: f64, radius_y: f64, jitter: f64) -> WaterFeature {
        let mut feature = WaterFeature::new(WaterFeatureKind::Lake);
        let radius_x = radius_x.max(1.0);
        let radius_y = radius_y.max(1.0);
        let jitter = jitter.clamp(0.0, 0.9);
        let shore: Vec<f64> = (0..SHORE_SAMPLES)
            .map(|_| {
                if jitter > 0.0 {
                    1.0 + self.rng.gen_range(-jitter..=jitter)
                } else {
                    1.0
                }
            })
            .collect();

        let reach_x = (radius_x * (1.0 + jitter)).ceil() as i32 + 1;
        let reach_y = (radius_y * (1.0 + jitter)).ceil() as i32 + 1;
        for y in (center.y - reach_y)..=(center.y + reach_y) {
            for x in (center.x - reach_x)..=(center.x + reach_x) {
                let dx = (x - center.x) as f64 / radius_x;
                let dy = (y - center.y) as f64 / radius_y;
                let factor = shore_factor(&shore, dy.atan2(dx));
                let distance = (dx * dx + dy * dy).sqrt() / factor;
                if distance <= 1.0 {
                    self.paint(&mut feature, Position::new(x, y), distance <= DEEP_CORE_RADIUS);
                }
            }
        }

        feature.finished()
    }

    /// Paints a meandering river from `start` to `end`.
    ///
    /// The path bows sideways by up to 20% of the straight-line distance. Rivers
    /// at least three tiles wide get a deep centre line.
    pub fn river(&mut self, start: Position, end: Position, width: u32) -> WaterFeature {
        let mut feature = WaterFeature::new(WaterFeatureKind::River);
        let width = width.max(1) as i32;
        let length = start.euclidean_distance(end);
        let (ux, uy) = if length > 0.0 {
            ((end.x - start.x) as f64 / length, (end.y - start.y) as f64 / length)
        } else {
            (0.0, 0.0)
        };
        let (px, py) = (-uy, ux);

        let bow = 0.2 * length * self.rng.gen_range(-1.0..=1.0);
        let ripple = 0.05 * length * self.rng.gen_range(-1.0..=1.0);
        let ripple_waves = self.rng.gen_range(1..=3) as f64;

        let steps = (length * 2.0).ceil().max(1.0) as usize;
        let low = -(width - 1) / 2;
        let high = width / 2;
        let mut previous: Option<Position> = None;

        for step in 0..=steps {
            let t = step as f64 / steps as f64;
            let offset = bow * (PI * t).sin() + ripple * (2.0 * PI * ripple_waves * t).sin();
            let point = Position::new(
                (start.x as f64 + ux * length * t + px * offset).round() as i32,
                (start.y as f64 + uy * length * t + py * offset).round() as i32,
            );

            // Keep the centre line orthogonally connected.
            let mut centers = vec![point];
            if let Some(prev) = previous {
                if prev.x != point.x && prev.y != point.y {
                    centers.insert(0, Position::new(point.x, prev.y));
                }
            }
            previous = Some(point);

            for center in centers {
                for oy in low..=high {
                    for ox in low..=high {
                        let deep = width >= 3 && ox == 0 && oy == 0;
                        self.paint(&mut feature, Position::new(center.x + ox, center.y + oy), deep);
                    }
                }
            }
        }

        feature.finished()
    }

    /// Paints a moat band of `width` tiles around the outside of a room.
    ///
    /// The inner half of the band is deep. A bridge crosses the band at the
    /// middle of each side so the room stays reachable.
    pub fn moat(&mut self, room: &Room, width: u32) -> WaterFeature {
        let mut feature = WaterFeature::new(WaterFeatureKind::Moat);
        let width = width.max(1) as i32;
        let deep_band = width / 2;
        let top_left = room.top_left;
        let bottom_right = room.bottom_right();

        for y in (top_left.y - width)..=(bottom_right.y + width) {
            for x in (top_left.x - width)..=(bottom_right.x + width) {
                let out_x = (top_left.x - x).max(x - bottom_right.x).max(0);
                let out_y = (top_left.y - y).max(y - bottom_right.y).max(0);
                let ring = out_x.max(out_y);
                if ring >= 1 && ring <= width {
                    self.paint(&mut feature, Position::new(x, y), ring <= deep_band);
                }
            }
        }

        let center = room.center();
        for ring in 1..=width {
            for pos in [
                Position::new(center.x, top_left.y - ring),
                Position::new(center.x, bottom_right.y + ring),
                Position::new(top_left.x - ring, center.y),
                Position::new(bottom_right.x + ring, center.y),
            ] {
                if self.grid.get_tile(pos).is_water() {
                    self.grid.set_tile(pos, TileType::Bridge);
                    feature.bridges.push(pos);
                }
            }
        }

        feature.finished()
    }

    /// Floods up to `max_tiles` open tiles breadth-first from `start`.
    ///
    /// Each flooded tile is deep with probability `deep_ratio`, shallow otherwise.
    pub fn flood_fill_water(&mut self, start: Position, max_tiles: usize, deep_ratio: f64) -> WaterFeature {
        let mut feature = WaterFeature::new(WaterFeatureKind::Pool);
        let deep_ratio = deep_ratio.clamp(0.0, 1.0);
        let floodable = |grid: &Grid, pos: Position| {
            let tile = grid.get_tile(pos);
            tile.is_walkable() && can_hold_water(tile)
        };
        if max_tiles == 0 || !floodable(&*self.grid, start) {
            return feature;
        }

        let width = self.grid.width() as usize;
        let mut visited = vec![false; self.grid.area()];
        let mut queue = VecDeque::from([start]);
        visited[start.y as usize * width + start.x as usize] = true;
        let mut selected = Vec::new();

        while let Some(pos) = queue.pop_front() {
            selected.push(pos);
            if selected.len() >= max_tiles {
                break;
            }
            for next in pos.orthogonal() {
                if !self.grid.is_in_bounds(next) {
                    continue;
                }
                let index = next.y as usize * width + next.x as usize;
                if !visited[index] && floodable(&*self.grid, next) {
                    visited[index] = true;
                    queue.push_back(next);
                }
            }
        }

        for pos in selected {
            let deep = self.rng.gen_bool(deep_ratio);
            self.paint(&mut feature, pos, deep);
        }

        feature.finished()
    }
}

fn shore_factor(shore: &[f64], angle: f64) -> f64 {
    let position = (angle + PI) / (2.0 * PI) * shore.len() as f64;
    let index = position.floor() as usize % shore.len();
    let next = (index + 1) % shore.len();
    let fraction = position - position.floor();
    shore[index] * (1.0 - fraction) + shore[next] * fraction
}

/// Turns feature tiles into bridges where both opposite neighbours (east/west
/// or north/south) are walkable dry ground.
pub fn place_bridges(grid: &mut Grid, feature: &mut WaterFeature) {
    let dry = |grid: &Grid, pos: Position| {
        let tile = grid.get_tile(pos);
        tile.is_walkable() && !tile.is_water()
    };

    for &pos in &feature.tiles {
        if !grid.get_tile(pos).is_water() {
            continue;
        }
        let horizontal = dry(grid, Position::new(pos.x - 1, pos.y)) && dry(grid, Position::new(pos.x + 1, pos.y));
        let vertical = dry(grid, Position::new(pos.x, pos.y - 1)) && dry(grid, Position::new(pos.x, pos.y + 1));
        if horizontal || vertical {
            grid.set_tile(pos, TileType::Bridge);
            feature.bridges.push(pos);
        }
    }
}

/// Runs the bridge pass on a feature and records it on the grid.
pub fn commit_water_feature(grid: &mut Grid, mut feature: WaterFeature) {
    if feature.is_empty() {
        return;
    }
    place_bridges(grid, &mut feature);
    log::debug!(
        "{:?}: {} water tiles, {} bridges",
        feature.kind,
        feature.tiles.len(),
        feature.bridges.len()
    );
    grid.water_features.push(feature);
}
