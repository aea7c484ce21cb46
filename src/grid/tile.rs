//! # Tile Types
//!
//! The terrain taxonomy and the physical properties derived from each kind.
//!
//! Properties are pure functions of the kind and are never stored per tile.

use serde::{Deserialize, Serialize};

/// Enumerated terrain surface of a single grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileType {
    Wall,
    Floor,
    Corridor,
    Door,
    WaterShallow,
    WaterDeep,
    Tree,
    StairsUp,
    StairsDown,
    TrapDoor,
    SecretDoor,
    Bridge,
    Structure,
    /// Diagonal wall cutting a room's north-east corner
    WallNortheast,
    /// Diagonal wall cutting a room's north-west corner
    WallNorthwest,
    /// Diagonal wall cutting a room's south-east corner
    WallSoutheast,
    /// Diagonal wall cutting a room's south-west corner
    WallSouthwest,
    Platform,
    RampUp,
    RampDown,
    Lava,
    Pit,
}

/// Vertical layer a tile occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Layer {
    Ground,
    Water,
    Platform,
}

impl TileType {
    /// Every tile kind, in declaration order.
    pub const ALL: [TileType; 22] = [
        TileType::Wall,
        TileType::Floor,
        TileType::Corridor,
        TileType::Door,
        TileType::WaterShallow,
        TileType::WaterDeep,
        TileType::Tree,
        TileType::StairsUp,
        TileType::StairsDown,
        TileType::TrapDoor,
        TileType::SecretDoor,
        TileType::Bridge,
        TileType::Structure,
        TileType::WallNortheast,
        TileType::WallNorthwest,
        TileType::WallSoutheast,
        TileType::WallSouthwest,
        TileType::Platform,
        TileType::RampUp,
        TileType::RampDown,
        TileType::Lava,
        TileType::Pit,
    ];

    /// Checks if an entity can stand on this tile.
    ///
    /// # Examples
    ///
    /// ```
    /// use strata::TileType;
    ///
    /// assert!(TileType::Floor.is_walkable());
    /// assert!(TileType::WaterShallow.is_walkable());
    /// assert!(!TileType::WaterDeep.is_walkable());
    /// assert!(!TileType::Wall.is_walkable());
    /// ```
    pub fn is_walkable(self) -> bool {
        self.movement_cost() >= 0.0
    }

    /// Checks if line of sight passes through this tile.
    pub fn is_transparent(self) -> bool {
        !matches!(
            self,
            TileType::Wall
                | TileType::Door
                | TileType::SecretDoor
                | TileType::Tree
                | TileType::Structure
                | TileType::WallNortheast
                | TileType::WallNorthwest
                | TileType::WallSoutheast
                | TileType::WallSouthwest
        )
    }

    /// Movement cost multiplier, or `-1.0` for impassable tiles.
    pub fn movement_cost(self) -> f64 {
        match self {
            TileType::Floor
            | TileType::Corridor
            | TileType::Door
            | TileType::StairsUp
            | TileType::StairsDown
            | TileType::TrapDoor
            | TileType::SecretDoor
            | TileType::Bridge
            | TileType::Platform => 1.0,
            TileType::RampUp | TileType::RampDown => 1.5,
            TileType::WaterShallow => 2.0,
            TileType::Wall
            | TileType::WaterDeep
            | TileType::Tree
            | TileType::Structure
            | TileType::WallNortheast
            | TileType::WallNorthwest
            | TileType::WallSoutheast
            | TileType::WallSouthwest
            | TileType::Lava
            | TileType::Pit => -1.0,
        }
    }

    /// Vertical layer this tile sits on.
    pub fn layer(self) -> Layer {
        match self {
            TileType::WaterShallow | TileType::WaterDeep => Layer::Water,
            TileType::Platform | TileType::Bridge => Layer::Platform,
            _ => Layer::Ground,
        }
    }

    /// Whether this tile is either staircase.
    pub fn is_stairs(self) -> bool {
        matches!(self, TileType::StairsUp | TileType::StairsDown)
    }

    /// Whether this tile is shallow or deep water.
    pub fn is_water(self) -> bool {
        matches!(self, TileType::WaterShallow | TileType::WaterDeep)
    }

    /// Plain open ground: the surfaces stairs and corridors prefer.
    pub fn is_floor_like(self) -> bool {
        matches!(self, TileType::Floor | TileType::Corridor)
    }

    /// Any door variant.
    pub fn is_door(self) -> bool {
        matches!(self, TileType::Door | TileType::SecretDoor | TileType::TrapDoor)
    }

    /// Any wall variant, including the diagonal corner walls.
    pub fn is_wall(self) -> bool {
        matches!(
            self,
            TileType::Wall
                | TileType::WallNortheast
                | TileType::WallNorthwest
                | TileType::WallSoutheast
                | TileType::WallSouthwest
        )
    }
}

impl Default for TileType {
    fn default() -> Self {
        TileType::Wall
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walkability_follows_movement_cost() {
        for tile in TileType::ALL {
            assert_eq!(tile.is_walkable(), tile.movement_cost() >= 0.0, "{tile:?}");
        }
    }

    #[test]
    fn test_impassable_tiles() {
        for tile in [
            TileType::Wall,
            TileType::WaterDeep,
            TileType::Tree,
            TileType::Structure,
            TileType::Lava,
            TileType::Pit,
            TileType::WallSouthwest,
        ] {
            assert!(!tile.is_walkable(), "{tile:?} should block movement");
            assert_eq!(tile.movement_cost(), -1.0);
        }
    }

    #[test]
    fn test_transparency() {
        assert!(TileType::Floor.is_transparent());
        assert!(TileType::WaterDeep.is_transparent());
        assert!(TileType::Lava.is_transparent());
        assert!(!TileType::Wall.is_transparent());
        assert!(!TileType::Tree.is_transparent());
        assert!(!TileType::SecretDoor.is_transparent());
    }

    #[test]
    fn test_layers() {
        assert_eq!(TileType::Floor.layer(), Layer::Ground);
        assert_eq!(TileType::WaterShallow.layer(), Layer::Water);
        assert_eq!(TileType::WaterDeep.layer(), Layer::Water);
        assert_eq!(TileType::Platform.layer(), Layer::Platform);
        assert_eq!(TileType::Bridge.layer(), Layer::Platform);
    }

    #[test]
    fn test_classification_helpers() {
        assert!(TileType::StairsUp.is_stairs());
        assert!(!TileType::Floor.is_stairs());
        assert!(TileType::Corridor.is_floor_like());
        assert!(!TileType::Bridge.is_floor_like());
        assert!(TileType::WallNorthwest.is_wall());
        assert!(TileType::TrapDoor.is_door());
        assert_eq!(TileType::default(), TileType::Wall);
    }
}
