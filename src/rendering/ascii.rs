//! # ASCII Display
//!
//! Fixed one-character glyphs per tile kind, whole-grid rendering and a
//! themed legend.

use crate::generation::theme_tile_name;
use crate::{Grid, Position, StrataResult, TileType};
use std::fs;
use std::path::Path;

/// Gets the display character for a tile kind.
///
/// # Examples
///
/// ```
/// use strata::{tile_glyph, TileType};
///
/// assert_eq!(tile_glyph(TileType::Wall), '#');
/// assert_eq!(tile_glyph(TileType::WaterDeep), '~');
/// ```
pub fn tile_glyph(tile: TileType) -> char {
    match tile {
        TileType::Wall => '#',
        TileType::Floor => '.',
        TileType::Corridor => ':',
        TileType::Door => '+',
        TileType::WaterShallow => 'W',
        TileType::WaterDeep => '~',
        TileType::Tree => 'T',
        TileType::StairsUp => '^',
        TileType::StairsDown => 'v',
        TileType::TrapDoor => '[',
        TileType::SecretDoor => '?',
        TileType::Bridge => '=',
        TileType::Structure => '@',
        TileType::WallNortheast | TileType::WallSouthwest => '/',
        TileType::WallNorthwest | TileType::WallSoutheast => '\\',
        TileType::Platform => '_',
        TileType::RampUp => '<',
        TileType::RampDown => '>',
        TileType::Lava => '%',
        TileType::Pit => 'O',
    }
}

/// Renders a grid as text, one line per row.
pub fn render_ascii(grid: &Grid) -> String {
    let mut output = String::with_capacity((grid.width() as usize + 1) * grid.height() as usize);
    for y in 0..grid.height() as i32 {
        for x in 0..grid.width() as i32 {
            output.push(tile_glyph(grid.get_tile(Position::new(x, y))));
        }
        output.push('\n');
    }
    output
}

/// Renders a stack of levels separated by blank lines.
pub fn render_levels(levels: &[Grid]) -> String {
    levels.iter().map(render_ascii).collect::<Vec<_>>().join("\n")
}

/// Glyph and themed name for every tile kind present in a grid.
pub fn legend(grid: &Grid, genre: &str) -> Vec<(char, &'static str)> {
    TileType::ALL
        .into_iter()
        .filter(|&tile| grid.count(tile) > 0)
        .map(|tile| (tile_glyph(tile), theme_tile_name(genre, tile)))
        .collect()
}

/// Writes the rendered grid to a file.
pub fn write_ascii(grid: &Grid, path: impl AsRef<Path>) -> StrataResult<()> {
    let path = path.as_ref();
    fs::write(path, render_ascii(grid))?;
    log::debug!("wrote {}x{} grid to {}", grid.width(), grid.height(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glyphs_are_fixed() {
        let expected = [
            (TileType::Wall, '#'),
            (TileType::Floor, '.'),
            (TileType::Corridor, ':'),
            (TileType::Door, '+'),
            (TileType::WaterShallow, 'W'),
            (TileType::WaterDeep, '~'),
            (TileType::Tree, 'T'),
            (TileType::StairsUp, '^'),
            (TileType::StairsDown, 'v'),
            (TileType::TrapDoor, '['),
            (TileType::SecretDoor, '?'),
            (TileType::Bridge, '='),
            (TileType::Structure, '@'),
        ];
        for (tile, glyph) in expected {
            assert_eq!(tile_glyph(tile), glyph);
        }
    }

    #[test]
    fn test_render_grid() {
        let mut grid = Grid::new(4, 3);
        grid.fill_rect(Position::new(1, 1), 2, 1, TileType::Floor);
        grid.place_stairs_down(Position::new(2, 1));
        assert_eq!(render_ascii(&grid), "####\n#.v#\n####\n");
    }

    #[test]
    fn test_render_levels() {
        let levels = vec![Grid::new(2, 1), Grid::filled(2, 1, TileType::Tree)];
        assert_eq!(render_levels(&levels), "##\n\nTT\n");
    }

    #[test]
    fn test_legend_lists_present_tiles() {
        let mut grid = Grid::new(3, 3);
        grid.set_tile(Position::new(1, 1), TileType::Tree);
        let entries = legend(&grid, "fantasy");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, '#');
        assert_eq!(entries[1].0, 'T');
    }
}
