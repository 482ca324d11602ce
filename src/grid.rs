//! Static map: the tile grid and the fixed route enemies walk.

use serde::{Deserialize, Serialize};

/// Grid coordinate of a tile. Also used for path nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TilePos {
    pub x: u32,
    pub y: u32,
}

impl TilePos {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Position as continuous grid coordinates.
    pub fn as_point(self) -> (f64, f64) {
        (self.x as f64, self.y as f64)
    }

    /// True when `other` is exactly one step away along a single axis.
    pub fn is_adjacent(self, other: TilePos) -> bool {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y) == 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub x: u32,
    pub y: u32,
    pub walkable: bool,
}

/// Fixed-size tile grid, stored row-major.
#[derive(Debug, Clone)]
pub struct Grid {
    width: u32,
    height: u32,
    tiles: Vec<Tile>,
}

impl Grid {
    pub fn new(width: u32, height: u32) -> Self {
        let mut tiles = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                tiles.push(Tile {
                    x,
                    y,
                    walkable: true,
                });
            }
        }
        Self {
            width,
            height,
            tiles,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn in_bounds(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height
    }

    pub fn tile(&self, x: u32, y: u32) -> Option<&Tile> {
        if self.in_bounds(x, y) {
            self.tiles.get(y as usize * self.width as usize + x as usize)
        } else {
            None
        }
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }
}

/// Ordered route from the spawn node (first) to the leak node (last).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path {
    nodes: Vec<TilePos>,
}

impl Path {
    pub fn new(nodes: Vec<TilePos>) -> Self {
        Self { nodes }
    }

    /// The built-in route across a 12 x 16 board.
    pub fn reference() -> Self {
        const NODES: [(u32, u32); 16] = [
            (0, 8),
            (1, 8),
            (2, 8),
            (2, 7),
            (2, 6),
            (3, 6),
            (4, 6),
            (5, 6),
            (6, 6),
            (6, 7),
            (6, 8),
            (7, 8),
            (8, 8),
            (9, 8),
            (10, 8),
            (11, 8),
        ];
        Self::new(NODES.iter().map(|&(x, y)| TilePos::new(x, y)).collect())
    }

    pub fn nodes(&self) -> &[TilePos] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<TilePos> {
        self.nodes.get(index).copied()
    }

    pub fn spawn(&self) -> Option<TilePos> {
        self.nodes.first().copied()
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        self.nodes.iter().any(|node| node.x == x && node.y == y)
    }

    /// Indices `i` where node `i` and node `i + 1` are not one axis-step apart.
    pub fn irregular_steps(&self) -> Vec<usize> {
        self.nodes
            .windows(2)
            .enumerate()
            .filter(|(_, pair)| !pair[0].is_adjacent(pair[1]))
            .map(|(index, _)| index)
            .collect()
    }
}

/// Grid plus route. Immutable once a world is built.
#[derive(Debug, Clone)]
pub struct MapLayout {
    pub grid: Grid,
    pub path: Path,
}

impl MapLayout {
    pub fn new(grid: Grid, path: Path) -> Self {
        Self { grid, path }
    }

    pub fn reference() -> Self {
        Self::new(Grid::new(12, 16), Path::reference())
    }

    pub fn is_on_path(&self, x: u32, y: u32) -> bool {
        self.path.contains(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_covers_every_coordinate() {
        let grid = Grid::new(12, 16);
        assert_eq!(grid.tiles().count(), 12 * 16);
        assert!(grid.tiles().all(|tile| tile.walkable));
        let tile = grid.tile(11, 15).expect("corner tile");
        assert_eq!((tile.x, tile.y), (11, 15));
        assert!(grid.tile(12, 0).is_none());
        assert!(grid.tile(0, 16).is_none());
    }

    #[test]
    fn reference_path_runs_spawn_to_leak_without_diagonals() {
        let path = Path::reference();
        assert_eq!(path.len(), 16);
        assert_eq!(path.spawn(), Some(TilePos::new(0, 8)));
        assert_eq!(path.get(15), Some(TilePos::new(11, 8)));
        assert!(path.irregular_steps().is_empty());
    }

    #[test]
    fn irregular_steps_reports_jumps() {
        let path = Path::new(vec![
            TilePos::new(0, 0),
            TilePos::new(1, 1),
            TilePos::new(1, 2),
            TilePos::new(1, 4),
        ]);
        assert_eq!(path.irregular_steps(), vec![0, 2]);
    }

    #[test]
    fn layout_flags_path_tiles() {
        let layout = MapLayout::reference();
        assert!(layout.is_on_path(2, 7));
        assert!(layout.is_on_path(6, 6));
        assert!(!layout.is_on_path(3, 7));
        assert!(!layout.is_on_path(0, 0));
    }
}
