//! # BSP Dungeon Generation
//!
//! Room-and-corridor dungeons built by binary space partitioning.
//!
//! The generator creates dungeons by:
//! 1. Splitting the map into a tree of rectangles until every leaf is small
//! 2. Carving one randomly sized room inside each leaf
//! 3. Walking the tree bottom-up and joining sibling subtrees with L-shaped corridors
//! 4. Adding doors, room purposes, angled corners, interior features and stairs

use crate::config::{DEFAULT_HEIGHT, DEFAULT_WIDTH, MAX_DIMENSION};
use crate::generation::features::{add_boss_moat, chamfer_corners, decorate_room};
use crate::generation::utils::{
    self, carve_l_corridor, create_rng, resolve_difficulty, resolve_dimensions, stair_spot_near, unit_fraction,
    GenRng,
};
use crate::{
    Direction, GenerationParams, Generator, Grid, Position, Room, RoomType, StrataError, StrataResult,
    TileType,
};
use rand::Rng;

/// Chance that a doorway tile receives a door.
const DOOR_CHANCE: f64 = 0.3;

/// Width over height ratio beyond which a node is always split across its width.
const SPLIT_RATIO: f64 = 1.25;

/// Binary space partitioning dungeon generator.
#[derive(Debug, Clone)]
pub struct BspGenerator {
    /// Smallest width or height a partition node may have
    pub min_node_size: u32,
    /// Nodes larger than this in either direction keep splitting
    pub max_room_span: u32,
    /// Chance that a room gets angled corners
    pub chamfer_chance: f64,
    /// Whether rooms receive platforms, pits and lava
    pub multi_layer: bool,
}

/// Resolved BSP settings for one generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct BspConfig {
    pub width: u32,
    pub height: u32,
    pub difficulty: f64,
    pub secret_door_chance: f64,
    pub extra_connection_chance: f64,
}

impl BspConfig {
    /// Resolves BSP settings from caller parameters.
    pub fn resolve(params: &GenerationParams) -> StrataResult<Self> {
        let (width, height) = resolve_dimensions(&params.custom, DEFAULT_WIDTH, DEFAULT_HEIGHT, MAX_DIMENSION)?;
        Ok(Self {
            width,
            height,
            difficulty: resolve_difficulty(params)?,
            secret_door_chance: unit_fraction("secretDoorChance", params.custom.secret_door_chance, 0.05)?,
            extra_connection_chance: unit_fraction(
                "extraConnectionChance",
                params.custom.extra_connection_chance,
                0.15,
            )?,
        })
    }
}

/// One rectangle of the partition tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BspNode {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub depth: u32,
    /// Indices of the two halves, if this node was split
    pub children: Option<(usize, usize)>,
}

impl BspGenerator {
    /// Creates a new BSP generator with default settings.
    ///
    /// # Examples
    ///
    /// ```
    /// use strata::BspGenerator;
    ///
    /// let generator = BspGenerator::new();
    /// assert_eq!(generator.min_node_size, 6);
    /// ```
    pub fn new() -> Self {
        Self {
            min_node_size: 6,
            max_room_span: 15,
            chamfer_chance: 0.3,
            multi_layer: true,
        }
    }

    /// Creates a generator for plain layouts: no angled corners or interior features.
    pub fn plain() -> Self {
        Self {
            chamfer_chance: 0.0,
            multi_layer: false,
            ..Self::new()
        }
    }

    /// Splits a `width` x `height` rectangle into a partition tree.
    ///
    /// Node 0 is the root; children always have larger indices than their
    /// parent. Splitting uses an explicit work stack.
    pub fn split_space(&self, width: u32, height: u32, rng: &mut GenRng) -> Vec<BspNode> {
        let min = self.min_node_size.max(1) as i32;
        let span = self.max_room_span.max(1) as i32;
        let mut nodes = vec![BspNode {
            x: 0,
            y: 0,
            width: width as i32,
            height: height as i32,
            depth: 0,
            children: None,
        }];
        let mut pending = vec![0usize];

        while let Some(index) = pending.pop() {
            let node = nodes[index];
            if node.width <= span && node.height <= span {
                continue;
            }
            let Some(vertical) = split_axis(&node, min) else {
                continue;
            };
            let length = if vertical { node.width } else { node.height };
            let cut = rng.gen_range(min..=length - min);
            let child = |x, y, width, height| BspNode {
                x,
                y,
                width,
                height,
                depth: node.depth + 1,
                children: None,
            };
            let (first, second) = if vertical {
                (
                    child(node.x, node.y, cut, node.height),
                    child(node.x + cut, node.y, node.width - cut, node.height),
                )
            } else {
                (
                    child(node.x, node.y, node.width, cut),
                    child(node.x, node.y + cut, node.width, node.height - cut),
                )
            };

            let first_index = nodes.len();
            nodes.push(first);
            nodes.push(second);
            nodes[index].children = Some((first_index, first_index + 1));
            pending.push(first_index + 1);
            pending.push(first_index);
        }

        nodes
    }

    /// Picks a room inside a leaf, one tile in from its edges.
    fn room_in_leaf(&self, leaf: &BspNode, id: u32, rng: &mut GenRng) -> Option<Room> {
        let free_width = leaf.width - 2;
        let free_height = leaf.height - 2;
        if free_width < 3 || free_height < 3 {
            return None;
        }
        let span = self.max_room_span.max(3) as i32;
        let width = rng.gen_range(3..=free_width.min(span));
        let height = rng.gen_range(3..=free_height.min(span));
        let x = leaf.x + 1 + rng.gen_range(0..=free_width - width);
        let y = leaf.y + 1 + rng.gen_range(0..=free_height - height);
        Some(Room::new(id, Position::new(x, y), width as u32, height as u32, RoomType::Normal))
    }

    /// Carves one room per leaf, in depth-first leaf order.
    ///
    /// Returns the rooms and, per node, the index of the room it holds.
    fn carve_rooms(&self, grid: &mut Grid, nodes: &[BspNode], rng: &mut GenRng) -> (Vec<Room>, Vec<Option<usize>>) {
        let mut rooms: Vec<Room> = Vec::new();
        let mut node_room = vec![None; nodes.len()];
        let mut stack = vec![0usize];

        while let Some(index) = stack.pop() {
            match nodes[index].children {
                Some((first, second)) => {
                    stack.push(second);
                    stack.push(first);
                }
                None => {
                    if let Some(room) = self.room_in_leaf(&nodes[index], rooms.len() as u32, rng) {
                        grid.fill_rect(room.top_left, room.width, room.height, TileType::Floor);
                        node_room[index] = Some(rooms.len());
                        rooms.push(room);
                    }
                }
            }
        }

        (rooms, node_room)
    }

    /// Joins sibling subtrees bottom-up, one corridor per internal node.
    fn connect_tree(
        &self,
        grid: &mut Grid,
        nodes: &[BspNode],
        rooms: &mut [Room],
        mut representative: Vec<Option<usize>>,
        rng: &mut GenRng,
    ) {
        for index in (0..nodes.len()).rev() {
            let Some((first, second)) = nodes[index].children else {
                continue;
            };
            representative[index] = match (representative[first], representative[second]) {
                (Some(a), Some(b)) => {
                    connect_pair(grid, rooms, a, b, rng);
                    Some(if rng.gen_bool(0.5) { a } else { b })
                }
                (a, b) => a.or(b),
            };
        }
    }

    /// Adds a few extra corridors between random room pairs to create loops.
    fn add_loops(&self, grid: &mut Grid, rooms: &mut [Room], chance: f64, rng: &mut GenRng) -> usize {
        if rooms.len() < 3 {
            return 0;
        }
        let attempts = (rooms.len() as f64 * chance) as usize;
        let mut added = 0;
        for _ in 0..attempts {
            let a = rng.gen_range(0..rooms.len());
            let b = rng.gen_range(0..rooms.len());
            if a == b || rooms[a].connections.contains(&rooms[b].id) {
                continue;
            }
            connect_pair(grid, rooms, a, b, rng);
            added += 1;
        }
        added
    }

    /// Turns corridor tiles that open into a room between two walls into doors.
    fn add_doors(&self, grid: &mut Grid, rooms: &[Room], secret_chance: f64, rng: &mut GenRng) -> usize {
        let in_room = |pos: Position| rooms.iter().any(|room| room.contains(pos));
        let corridors: Vec<Position> = grid
            .positions()
            .filter(|&pos| grid.get_tile(pos) == TileType::Corridor)
            .collect();

        let mut doors = 0;
        for pos in corridors {
            let entry = Direction::ALL.into_iter().find(|&direction| {
                let next = pos.step(direction);
                in_room(next) && grid.get_tile(next) == TileType::Floor
            });
            let Some(direction) = entry else {
                continue;
            };
            let delta = direction.to_delta();
            let side_a = Position::new(pos.x + delta.y, pos.y + delta.x);
            let side_b = Position::new(pos.x - delta.y, pos.y - delta.x);
            if grid.is_walkable(side_a) || grid.is_walkable(side_b) {
                continue;
            }
            if !rng.gen_bool(DOOR_CHANCE) {
                continue;
            }
            let door = if rng.gen_bool(secret_chance) {
                TileType::SecretDoor
            } else {
                TileType::Door
            };
            grid.set_tile(pos, door);
            doors += 1;
        }
        doors
    }
}

fn split_axis(node: &BspNode, min: i32) -> Option<bool> {
    let can_vertical = node.width >= min * 2;
    let can_horizontal = node.height >= min * 2;
    let ratio = node.width as f64 / node.height.max(1) as f64;
    let prefer_vertical = if ratio >= SPLIT_RATIO {
        true
    } else if ratio <= 1.0 / SPLIT_RATIO {
        false
    } else {
        node.depth % 2 == 0
    };

    match (prefer_vertical, can_vertical, can_horizontal) {
        (true, true, _) => Some(true),
        (false, _, true) => Some(false),
        (_, true, false) => Some(true),
        (_, false, true) => Some(false),
        _ => None,
    }
}

fn connect_pair(grid: &mut Grid, rooms: &mut [Room], a: usize, b: usize, rng: &mut GenRng) {
    let horizontal_first = rng.gen_bool(0.5);
    carve_l_corridor(grid, rooms[a].center(), rooms[b].center(), horizontal_first);
    let (id_a, id_b) = (rooms[a].id, rooms[b].id);
    rooms[a].add_connection(id_b);
    rooms[b].add_connection(id_a);
}

/// Tags rooms with their purpose: first spawn, last exit, second-to-last boss,
/// and a random share of the rest treasure or trap rooms.
///
/// At difficulty 0.5 about 1/8 of the remaining rooms hold treasure and 1/10
/// are trapped. Each room draws one roll, and raising the difficulty moves
/// part of the treasure band over to traps: from 17.5% treasure and 5% traps
/// at 0.0 to 7.5% and 15% at 1.0.
pub fn assign_room_purposes(rooms: &mut [Room], difficulty: f64, rng: &mut GenRng) {
    let difficulty = difficulty.clamp(0.0, 1.0);
    let treasure_share = 0.175 - 0.1 * difficulty;
    let trap_share = 0.05 + 0.1 * difficulty;
    let count = rooms.len();
    for (index, room) in rooms.iter_mut().enumerate() {
        room.room_type = if index == 0 {
            RoomType::Spawn
        } else if index + 1 == count {
            RoomType::Exit
        } else if count >= 3 && index + 2 == count {
            RoomType::Boss
        } else {
            let roll: f64 = rng.gen();
            if roll < treasure_share {
                RoomType::Treasure
            } else if roll < treasure_share + trap_share {
                RoomType::Trap
            } else {
                RoomType::Normal
            }
        };
    }
}

fn add_trap_doors(grid: &mut Grid, room: &Room, rng: &mut GenRng) {
    let count = (1 + room.area() / 20).min(3);
    for _ in 0..count {
        let pos = Position::new(
            room.top_left.x + rng.gen_range(0..room.width as i32),
            room.top_left.y + rng.gen_range(0..room.height as i32),
        );
        if grid.get_tile(pos) == TileType::Floor && pos != room.center() {
            grid.set_tile(pos, TileType::TrapDoor);
        }
    }
}

impl Generator for BspGenerator {
    fn generate(&self, seed: i64, params: &GenerationParams) -> StrataResult<Grid> {
        let config = BspConfig::resolve(params)?;
        let mut rng = create_rng(seed);
        let mut grid = Grid::new(config.width, config.height);
        grid.seed = seed;
        grid.level = params.depth as usize;
        grid.generator = self.generator_type().to_string();

        let nodes = self.split_space(config.width, config.height, &mut rng);
        let (mut rooms, node_room) = self.carve_rooms(&mut grid, &nodes, &mut rng);
        if rooms.is_empty() {
            return Err(StrataError::GenerationFailed(format!(
                "no room fits in a {}x{} map",
                config.width, config.height
            )));
        }
        log::debug!("bsp: {} nodes, {} rooms", nodes.len(), rooms.len());

        self.connect_tree(&mut grid, &nodes, &mut rooms, node_room, &mut rng);
        let loops = self.add_loops(&mut grid, &mut rooms, config.extra_connection_chance, &mut rng);
        assign_room_purposes(&mut rooms, config.difficulty, &mut rng);
        let doors = self.add_doors(&mut grid, &rooms, config.secret_door_chance, &mut rng);
        log::debug!("bsp: {loops} loop corridors, {doors} doors");

        for room in &rooms {
            if self.chamfer_chance > 0.0 && rng.gen_bool(self.chamfer_chance.min(1.0)) {
                chamfer_corners(&mut grid, room);
            }
            match room.room_type {
                RoomType::Boss => {
                    if !add_boss_moat(&mut grid, room, &mut rng) && self.multi_layer {
                        decorate_room(&mut grid, room, &mut rng);
                    }
                }
                RoomType::Spawn | RoomType::Exit => {}
                RoomType::Trap => add_trap_doors(&mut grid, room, &mut rng),
                _ if self.multi_layer => {
                    decorate_room(&mut grid, room, &mut rng);
                }
                _ => {}
            }
        }

        let spawn = rooms[0].center();
        let exit = rooms[rooms.len() - 1].center();
        let up = stair_spot_near(&grid, spawn)
            .ok_or_else(|| StrataError::GenerationFailed("no spot for the up-stair".to_string()))?;
        grid.place_stairs_up(up);
        let down = stair_spot_near(&grid, exit)
            .ok_or_else(|| StrataError::GenerationFailed("no spot for the down-stair".to_string()))?;
        grid.place_stairs_down(down);

        grid.rooms = rooms;
        log::info!(
            "bsp: generated {}x{} dungeon with {} rooms (seed {seed})",
            config.width,
            config.height,
            grid.rooms.len()
        );
        Ok(grid)
    }

    fn validate(&self, grid: &Grid) -> StrataResult<()> {
        if grid.rooms.is_empty() {
            return Err(StrataError::ValidationFailed("bsp: dungeon has no rooms".to_string()));
        }
        if let Some(room) = grid
            .rooms
            .iter()
            .find(|room| !room.fits_in(grid.width(), grid.height()))
        {
            return Err(StrataError::ValidationFailed(format!(
                "bsp: room {} lies outside the map",
                room.id
            )));
        }
        utils::validate_stairs(grid)
    }

    fn generator_type(&self) -> &'static str {
        "bsp"
    }
}

impl Default for BspGenerator {
    fn default() -> Self {
        Self::new()
    }
}
