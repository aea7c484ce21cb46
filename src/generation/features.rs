//! # Room Features
//!
//! Interior decoration for carved rooms: angled corners, raised platforms with
//! ramps, corner pits, lava flows and boss moats.
//!
//! Every feature keeps the room traversable. Features only replace plain floor,
//! so doors, corridors and stairs placed earlier are left alone.

use crate::generation::utils::GenRng;
use crate::generation::water::{commit_water_feature, WaterPainter};
use crate::{Grid, Position, Room, TileType};
use rand::Rng;

/// Interior feature carved into a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomFeature {
    /// Raised platform reached by ramps
    Platform,
    /// Impassable pit in one corner
    Pit,
    /// Lava channel crossed by a bridge
    LavaFlow,
    /// Water ring around the room's core
    Moat,
}

fn paint_floor(grid: &mut Grid, pos: Position, tile: TileType) -> bool {
    if grid.get_tile(pos) == TileType::Floor {
        grid.set_tile(pos, tile);
        true
    } else {
        false
    }
}

/// Replaces room corners with angled walls where the corner touches only solid
/// rock from outside. Returns how many corners were angled.
pub fn chamfer_corners(grid: &mut Grid, room: &Room) -> usize {
    if room.width < 5 || room.height < 5 {
        return 0;
    }
    let top_left = room.top_left;
    let bottom_right = room.bottom_right();
    let corners = [
        (Position::new(top_left.x, top_left.y), -1, -1, TileType::WallNorthwest),
        (Position::new(bottom_right.x, top_left.y), 1, -1, TileType::WallNortheast),
        (Position::new(top_left.x, bottom_right.y), -1, 1, TileType::WallSouthwest),
        (Position::new(bottom_right.x, bottom_right.y), 1, 1, TileType::WallSoutheast),
    ];

    let mut angled = 0;
    for (corner, dx, dy, wall) in corners {
        let sealed = [
            Position::new(corner.x + dx, corner.y),
            Position::new(corner.x, corner.y + dy),
            Position::new(corner.x + dx, corner.y + dy),
        ]
        .into_iter()
        .all(|outside| !grid.is_walkable(outside));
        if sealed && paint_floor(grid, corner, wall) {
            angled += 1;
        }
    }
    angled
}

/// Raises the room's core onto a platform with a ramp on each side.
///
/// Needs a room of at least 8x8; the platform is inset two tiles from the walls.
pub fn add_platform(grid: &mut Grid, room: &Room) -> bool {
    if room.width < 8 || room.height < 8 {
        return false;
    }
    let inner = Position::new(room.top_left.x + 2, room.top_left.y + 2);
    let width = room.width - 4;
    let height = room.height - 4;
    for y in inner.y..inner.y + height as i32 {
        for x in inner.x..inner.x + width as i32 {
            paint_floor(grid, Position::new(x, y), TileType::Platform);
        }
    }

    let center_y = room.center().y;
    paint_floor(grid, Position::new(inner.x - 1, center_y), TileType::RampUp);
    paint_floor(grid, Position::new(inner.x + width as i32, center_y), TileType::RampDown);
    true
}

/// Sinks a 2x2 pit into a random corner, one tile in from the walls.
pub fn add_pit(grid: &mut Grid, room: &Room, rng: &mut GenRng) -> bool {
    if room.width < 7 || room.height < 7 {
        return false;
    }
    let left = room.top_left.x + 1;
    let right = room.bottom_right().x - 2;
    let top = room.top_left.y + 1;
    let bottom = room.bottom_right().y - 2;
    let origin = match rng.gen_range(0..4) {
        0 => Position::new(left, top),
        1 => Position::new(right, top),
        2 => Position::new(left, bottom),
        _ => Position::new(right, bottom),
    };
    for offset in [(0, 0), (1, 0), (0, 1), (1, 1)] {
        paint_floor(grid, Position::new(origin.x + offset.0, origin.y + offset.1), TileType::Pit);
    }
    true
}

/// Runs a lava channel down the room a third of the way across, leaving the
/// top and bottom rows open and a bridge across the middle row.
pub fn add_lava_flow(grid: &mut Grid, room: &Room) -> bool {
    if room.width < 10 || room.height < 8 {
        return false;
    }
    let x = room.top_left.x + room.width as i32 / 3;
    let center_y = room.center().y;
    for y in (room.top_left.y + 1)..room.bottom_right().y {
        let tile = if y == center_y { TileType::Bridge } else { TileType::Lava };
        paint_floor(grid, Position::new(x, y), tile);
    }
    true
}

/// Rings the core of a large room with a two-tile moat.
///
/// The core is the room inset by three tiles, so the outer floor ring stays
/// open and bridges cross the moat on each side.
pub fn add_boss_moat(grid: &mut Grid, room: &Room, rng: &mut GenRng) -> bool {
    if room.width < 9 || room.height < 9 {
        return false;
    }
    let core = Room::new(
        room.id,
        Position::new(room.top_left.x + 3, room.top_left.y + 3),
        room.width - 6,
        room.height - 6,
        room.room_type,
    );
    let moat = WaterPainter::new(grid, rng).moat(&core, 2);
    commit_water_feature(grid, moat);
    true
}

/// Rolls for one interior feature in a room and carves it.
///
/// Lava (10%) is tried first, then a platform (20%), then a pit (15%); each
/// only when the room is large enough for it.
pub fn decorate_room(grid: &mut Grid, room: &Room, rng: &mut GenRng) -> Option<RoomFeature> {
    if room.width >= 10 && room.height >= 8 && rng.gen_bool(0.1) {
        add_lava_flow(grid, room);
        return Some(RoomFeature::LavaFlow);
    }
    if room.width >= 8 && room.height >= 8 && rng.gen_bool(0.2) {
        add_platform(grid, room);
        return Some(RoomFeature::Platform);
    }
    if room.width >= 7 && room.height >= 7 && rng.gen_bool(0.15) {
        add_pit(grid, room, rng);
        return Some(RoomFeature::Pit);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::utils::create_rng;
    use crate::{walkable_components, RoomType};

    fn carved(width: u32, height: u32) -> (Grid, Room) {
        let mut grid = Grid::new(width + 4, height + 4);
        let room = Room::new(0, Position::new(2, 2), width, height, RoomType::Normal);
        grid.fill_rect(room.top_left, width, height, TileType::Floor);
        (grid, room)
    }

    #[test]
    fn test_chamfer_all_sealed_corners() {
        let (mut grid, room) = carved(6, 6);
        assert_eq!(chamfer_corners(&mut grid, &room), 4);
        assert_eq!(grid.get_tile(Position::new(2, 2)), TileType::WallNorthwest);
        assert_eq!(grid.get_tile(Position::new(7, 2)), TileType::WallNortheast);
        assert_eq!(grid.get_tile(Position::new(2, 7)), TileType::WallSouthwest);
        assert_eq!(grid.get_tile(Position::new(7, 7)), TileType::WallSoutheast);
        assert_eq!(walkable_components(&grid).len(), 1);
    }

    #[test]
    fn test_chamfer_skips_corner_with_corridor() {
        let (mut grid, room) = carved(6, 6);
        grid.set_tile(Position::new(1, 2), TileType::Corridor);
        assert_eq!(chamfer_corners(&mut grid, &room), 3);
        assert_eq!(grid.get_tile(Position::new(2, 2)), TileType::Floor);

        let (mut small, small_room) = carved(4, 4);
        assert_eq!(chamfer_corners(&mut small, &small_room), 0);
    }

    #[test]
    fn test_platform_has_ramps_and_stays_connected() {
        let (mut grid, room) = carved(10, 9);
        assert!(add_platform(&mut grid, &room));
        assert_eq!(grid.count(TileType::Platform), 6 * 5);
        assert_eq!(grid.count(TileType::RampUp), 1);
        assert_eq!(grid.count(TileType::RampDown), 1);
        assert_eq!(walkable_components(&grid).len(), 1);
    }

    #[test]
    fn test_pit_and_lava_keep_room_connected() {
        let mut rng = create_rng(11);
        let (mut grid, room) = carved(12, 10);
        assert!(add_pit(&mut grid, &room, &mut rng));
        assert_eq!(grid.count(TileType::Pit), 4);
        assert!(add_lava_flow(&mut grid, &room));
        assert!(grid.count(TileType::Lava) > 0);
        assert_eq!(grid.count(TileType::Bridge), 1);
        assert_eq!(walkable_components(&grid).len(), 1);
    }

    #[test]
    fn test_small_rooms_get_no_features() {
        let mut rng = create_rng(1);
        let (mut grid, room) = carved(6, 6);
        let before = grid.clone();
        assert!(!add_platform(&mut grid, &room));
        assert!(!add_pit(&mut grid, &room, &mut rng));
        assert!(!add_lava_flow(&mut grid, &room));
        assert!(!add_boss_moat(&mut grid, &room, &mut rng));
        assert_eq!(grid, before);
    }

    #[test]
    fn test_boss_moat_is_bridged() {
        let mut rng = create_rng(2);
        let (mut grid, room) = carved(11, 11);
        assert!(add_boss_moat(&mut grid, &room, &mut rng));
        assert_eq!(grid.water_features.len(), 1);
        assert!(grid.count(TileType::WaterDeep) > 0);
        assert!(grid.count(TileType::Bridge) >= 8);
        assert_eq!(walkable_components(&grid).len(), 1);
    }
}
