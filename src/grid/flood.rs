//! # Flood Fill
//!
//! Reachability and connected-component analysis over walkable tiles.
//!
//! Connectivity is always orthogonal (4-neighbourhood): diagonal steps between
//! two walls do not count as a passage.

use crate::{Grid, Position};
use pathfinding::prelude::{bfs, bfs_reach};
use std::collections::VecDeque;

/// Walkable orthogonal neighbours of a position.
fn walkable_neighbors(grid: &Grid, pos: Position) -> Vec<Position> {
    pos.orthogonal()
        .into_iter()
        .filter(|&next| grid.is_walkable(next))
        .collect()
}

/// Returns every walkable tile reachable from `start`, in breadth-first order.
///
/// Returns an empty list when `start` itself is not walkable.
///
/// # Examples
///
/// ```
/// use strata::{reachable_from, Grid, Position, TileType};
///
/// let mut grid = Grid::new(5, 3);
/// grid.fill_rect(Position::new(1, 1), 3, 1, TileType::Floor);
/// assert_eq!(reachable_from(&grid, Position::new(1, 1)).len(), 3);
/// assert!(reachable_from(&grid, Position::new(0, 0)).is_empty());
/// ```
pub fn reachable_from(grid: &Grid, start: Position) -> Vec<Position> {
    if !grid.is_walkable(start) {
        return Vec::new();
    }
    bfs_reach(start, |&pos| walkable_neighbors(grid, pos)).collect()
}

/// Shortest orthogonal walk between two tiles, both ends included.
pub fn shortest_path(grid: &Grid, from: Position, to: Position) -> Option<Vec<Position>> {
    if !grid.is_walkable(from) || !grid.is_walkable(to) {
        return None;
    }
    bfs(&from, |&pos| walkable_neighbors(grid, pos), |&pos| pos == to)
}

/// Splits the walkable tiles into connected components.
///
/// Components are listed in the row-major order of their first tile, so the
/// result is stable for a given grid.
pub fn walkable_components(grid: &Grid) -> Vec<Vec<Position>> {
    let width = grid.width() as usize;
    let mut visited = vec![false; grid.area()];
    let mut components = Vec::new();

    for pos in grid.positions() {
        let index = pos.y as usize * width + pos.x as usize;
        if visited[index] || !grid.is_walkable(pos) {
            continue;
        }
        let component = reachable_from(grid, pos);
        for member in &component {
            visited[member.y as usize * width + member.x as usize] = true;
        }
        components.push(component);
    }

    components
}

/// Index of the largest component; ties go to the earliest one.
pub fn largest_component_index(components: &[Vec<Position>]) -> Option<usize> {
    components
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, usize)>, (index, component)| match best {
            Some((_, size)) if size >= component.len() => best,
            _ => Some((index, component.len())),
        })
        .map(|(index, _)| index)
}

/// Share of walkable tiles that belong to the largest connected component.
///
/// A grid without walkable tiles scores `0.0`.
pub fn largest_component_share(grid: &Grid) -> f64 {
    let components = walkable_components(grid);
    let total: usize = components.iter().map(Vec::len).sum();
    match largest_component_index(&components) {
        Some(index) if total > 0 => components[index].len() as f64 / total as f64,
        _ => 0.0,
    }
}

/// Multi-source breadth-first distance field over every tile, walkable or not.
///
/// Each entry holds the distance (in orthogonal steps) to the closest source and
/// that source. Tiles farther than `max_distance` stay `None`. Sources outside
/// the grid are ignored.
pub fn distance_field(
    grid: &Grid,
    sources: &[Position],
    max_distance: Option<u32>,
) -> Vec<Option<(u32, Position)>> {
    let width = grid.width() as usize;
    let mut field = vec![None; grid.area()];
    let mut queue = VecDeque::new();

    for &source in sources {
        if !grid.is_in_bounds(source) {
            continue;
        }
        let index = source.y as usize * width + source.x as usize;
        if field[index].is_none() {
            field[index] = Some((0, source));
            queue.push_back(source);
        }
    }

    while let Some(pos) = queue.pop_front() {
        let Some((distance, origin)) = field[pos.y as usize * width + pos.x as usize] else {
            continue;
        };
        if max_distance.is_some_and(|max| distance >= max) {
            continue;
        }
        for next in pos.orthogonal() {
            if !grid.is_in_bounds(next) {
                continue;
            }
            let index = next.y as usize * width + next.x as usize;
            if field[index].is_none() {
                field[index] = Some((distance + 1, origin));
                queue.push_back(next);
            }
        }
    }

    field
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TileType;

    fn two_rooms() -> Grid {
        let mut grid = Grid::new(10, 5);
        grid.fill_rect(Position::new(1, 1), 3, 3, TileType::Floor);
        grid.fill_rect(Position::new(6, 1), 2, 2, TileType::Floor);
        grid
    }

    #[test]
    fn test_components_are_separated_by_walls() {
        let grid = two_rooms();
        let components = walkable_components(&grid);
        assert_eq!(components.len(), 2);
        assert_eq!(components[0].len(), 9);
        assert_eq!(components[1].len(), 4);
        assert_eq!(largest_component_index(&components), Some(0));
        assert!((largest_component_share(&grid) - 9.0 / 13.0).abs() < 1e-9);
    }

    #[test]
    fn test_diagonal_contact_does_not_connect() {
        let mut grid = Grid::new(4, 4);
        grid.set_tile(Position::new(1, 1), TileType::Floor);
        grid.set_tile(Position::new(2, 2), TileType::Floor);
        assert_eq!(walkable_components(&grid).len(), 2);
    }

    #[test]
    fn test_shallow_water_connects_but_deep_water_blocks() {
        let mut grid = Grid::new(5, 3);
        grid.set_tile(Position::new(1, 1), TileType::Floor);
        grid.set_tile(Position::new(2, 1), TileType::WaterShallow);
        grid.set_tile(Position::new(3, 1), TileType::Floor);
        assert_eq!(reachable_from(&grid, Position::new(1, 1)).len(), 3);

        grid.set_tile(Position::new(2, 1), TileType::WaterDeep);
        assert_eq!(reachable_from(&grid, Position::new(1, 1)).len(), 1);
    }

    #[test]
    fn test_shortest_path() {
        let mut grid = two_rooms();
        assert!(shortest_path(&grid, Position::new(1, 1), Position::new(6, 1)).is_none());
        grid.fill_rect(Position::new(4, 1), 2, 1, TileType::Corridor);
        let path = shortest_path(&grid, Position::new(1, 1), Position::new(7, 2)).unwrap();
        assert_eq!(path.first(), Some(&Position::new(1, 1)));
        assert_eq!(path.last(), Some(&Position::new(7, 2)));
        assert_eq!(path.len(), 8);
    }

    #[test]
    fn test_empty_grid_share() {
        assert_eq!(largest_component_share(&Grid::new(3, 3)), 0.0);
    }

    #[test]
    fn test_distance_field_respects_limit() {
        let grid = Grid::new(7, 1);
        let field = distance_field(&grid, &[Position::new(0, 0), Position::new(6, 0)], Some(2));
        assert_eq!(field[0], Some((0, Position::new(0, 0))));
        assert_eq!(field[2], Some((2, Position::new(0, 0))));
        assert_eq!(field[3], None);
        assert_eq!(field[5], Some((1, Position::new(6, 0))));
    }
}
