/// Grid map: a bounded 2D terrain array.
///
/// The grid owns terrain only. Entities (enemies, treasures, traps) live in
/// the registry and never mutate the grid. Anything outside the bounds reads
/// as `Tile::Wall`, so callers never need a separate bounds check before
/// asking whether a cell blocks.

use super::tile::Tile;

/// Integer grid coordinate. Signed so that a step off the edge
/// (e.g. `(0, 0) + (-1, 0)`) is still representable.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default)]
pub struct Pos {
    pub x: i32,
    pub y: i32,
}

impl Pos {
    pub const fn new(x: i32, y: i32) -> Self {
        Pos { x, y }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Pos {
        Pos { x: self.x + dx, y: self.y + dy }
    }

    pub fn manhattan(self, other: Pos) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    width: usize,
    height: usize,
    tiles: Vec<Vec<Tile>>,
}

impl Grid {
    /// All-floor interior surrounded by a one-cell wall border.
    pub fn bordered(width: usize, height: usize) -> Self {
        let mut grid = Grid { width, height, tiles: vec![vec![Tile::Floor; width]; height] };
        for y in 0..height as i32 {
            for x in 0..width as i32 {
                let p = Pos::new(x, y);
                if grid.is_border(p) {
                    grid.set(p, Tile::Wall);
                }
            }
        }
        grid
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn in_bounds(&self, p: Pos) -> bool {
        p.x >= 0 && p.y >= 0 && (p.x as usize) < self.width && (p.y as usize) < self.height
    }

    /// Terrain at `p`. Out of bounds = wall.
    #[inline]
    pub fn tile(&self, p: Pos) -> Tile {
        if self.in_bounds(p) {
            self.tiles[p.y as usize][p.x as usize]
        } else {
            Tile::Wall
        }
    }

    #[inline]
    pub fn is_wall(&self, p: Pos) -> bool {
        self.tile(p).is_wall()
    }

    pub fn set(&mut self, p: Pos, tile: Tile) {
        if self.in_bounds(p) {
            self.tiles[p.y as usize][p.x as usize] = tile;
        }
    }

    /// Flat cell index, used by the pathfinder's score tables.
    #[inline]
    pub fn index(&self, p: Pos) -> usize {
        p.y as usize * self.width + p.x as usize
    }

    pub fn cell_count(&self) -> usize {
        self.width * self.height
    }

    /// Interior coordinates (everything but the border) in row-major order.
    pub fn interior(&self) -> impl Iterator<Item = Pos> + '_ {
        let w = self.width as i32;
        let h = self.height as i32;
        (1..h - 1).flat_map(move |y| (1..w - 1).map(move |x| Pos::new(x, y)))
    }

    pub fn is_border(&self, p: Pos) -> bool {
        p.x == 0 || p.y == 0 || p.x as usize + 1 == self.width || p.y as usize + 1 == self.height
    }
}

/// Test fixtures: build a grid from an ASCII diagram.
/// `'#'` is wall, anything else is floor.
#[cfg(test)]
impl Grid {
    pub fn from_rows(rows: &[&str]) -> Self {
        let height = rows.len();
        let width = rows[0].len();
        let tiles = rows
            .iter()
            .map(|row| {
                row.chars()
                    .map(|ch| if ch == '#' { Tile::Wall } else { Tile::Floor })
                    .collect()
            })
            .collect();
        Grid { width, height, tiles }
    }
}
