//! Terrain grid for placement and pathing queries.
//!
//! One cell per world unit. Each cell records whether construction is
//! allowed and whether ground units can walk through it; structures are
//! not stamped into the grid, callers check footprints against the
//! structure list separately.

use serde::{Deserialize, Serialize};

use crate::math::{Fixed, Vec2Fixed};

/// State of a single terrain cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerrainCell {
    /// Open ground: walkable and buildable.
    Open,
    /// Walkable but construction is not allowed (ramps, creep, mineral lines).
    PathOnly,
    /// Cliffs, water or doodads.
    Blocked,
}

impl TerrainCell {
    /// Construction allowed.
    #[must_use]
    pub const fn is_buildable(self) -> bool {
        matches!(self, Self::Open)
    }

    /// Ground units can walk through.
    #[must_use]
    pub const fn is_pathable(self) -> bool {
        matches!(self, Self::Open | Self::PathOnly)
    }
}

impl Default for TerrainCell {
    fn default() -> Self {
        Self::Open
    }
}

/// Rectangular terrain grid in row-major order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerrainGrid {
    width: u32,
    height: u32,
    cells: Vec<TerrainCell>,
}

impl TerrainGrid {
    /// Create an all-open grid.
    ///
    /// # Panics
    ///
    /// Panics if `width` or `height` is zero.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        assert!(width > 0, "TerrainGrid width must be positive");
        assert!(height > 0, "TerrainGrid height must be positive");
        Self {
            width,
            height,
            cells: vec![TerrainCell::Open; (width as usize) * (height as usize)],
        }
    }

    /// Grid width in cells.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Grid height in cells.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.width as usize) + (x as usize)
    }

    /// Cell coordinates containing a world position.
    #[must_use]
    pub fn world_to_grid(&self, pos: Vec2Fixed) -> Option<(u32, u32)> {
        if pos.x < Fixed::ZERO || pos.y < Fixed::ZERO {
            return None;
        }
        let x = pos.x.floor().to_num::<i64>();
        let y = pos.y.floor().to_num::<i64>();
        if x < i64::from(self.width) && y < i64::from(self.height) {
            Some((x as u32, y as u32))
        } else {
            None
        }
    }

    /// Cell at a world position; `None` outside the grid.
    #[must_use]
    pub fn cell_at(&self, pos: Vec2Fixed) -> Option<TerrainCell> {
        self.world_to_grid(pos)
            .map(|(x, y)| self.cells[self.index(x, y)])
    }

    /// Inside the grid.
    #[must_use]
    pub fn in_bounds(&self, pos: Vec2Fixed) -> bool {
        self.world_to_grid(pos).is_some()
    }

    /// Buildable terrain.
    #[must_use]
    pub fn is_buildable(&self, pos: Vec2Fixed) -> bool {
        self.cell_at(pos).is_some_and(TerrainCell::is_buildable)
    }

    /// Walkable terrain.
    #[must_use]
    pub fn is_pathable(&self, pos: Vec2Fixed) -> bool {
        self.cell_at(pos).is_some_and(TerrainCell::is_pathable)
    }

    /// Set one cell. Returns `false` when out of bounds.
    pub fn set_cell(&mut self, x: u32, y: u32, cell: TerrainCell) -> bool {
        if x < self.width && y < self.height {
            let i = self.index(x, y);
            self.cells[i] = cell;
            true
        } else {
            false
        }
    }

    /// Fill the inclusive rectangle `(x0, y0)..=(x1, y1)`, clipped to the grid.
    pub fn fill_rect(&mut self, x0: u32, y0: u32, x1: u32, y1: u32, cell: TerrainCell) {
        let x1 = x1.min(self.width - 1);
        let y1 = y1.min(self.height - 1);
        for y in y0..=y1 {
            for x in x0..=x1 {
                let i = self.index(x, y);
                self.cells[i] = cell;
            }
        }
    }

    /// Whether the square footprint of side `size` centered on `center` lies
    /// entirely on buildable terrain.
    #[must_use]
    pub fn footprint_buildable(&self, center: Vec2Fixed, size: u32) -> bool {
        footprint_cells(center, size).all(|(x, y)| {
            x >= 0
                && y >= 0
                && x < i64::from(self.width)
                && y < i64::from(self.height)
                && self.cells[self.index(x as u32, y as u32)].is_buildable()
        })
    }
}

impl Default for TerrainGrid {
    fn default() -> Self {
        Self::new(128, 128)
    }
}

/// Cell coordinates covered by a square footprint of side `size` centered on
/// `center`. Odd sizes center on a cell, even sizes on a cell corner.
pub fn footprint_cells(center: Vec2Fixed, size: u32) -> impl Iterator<Item = (i64, i64)> {
    let size = i64::from(size.max(1));
    let half = Fixed::from_num(size) / Fixed::from_num(2);
    let x0 = (center.x - half).round().to_num::<i64>();
    let y0 = (center.y - half).round().to_num::<i64>();
    (0..size).flat_map(move |dy| (0..size).map(move |dx| (x0 + dx, y0 + dy)))
}

/// Whether two square footprints overlap.
#[must_use]
pub fn footprints_overlap(a: Vec2Fixed, a_size: u32, b: Vec2Fixed, b_size: u32) -> bool {
    let half_sum = Fixed::from_num(a_size.max(1) + b_size.max(1)) / Fixed::from_num(2);
    (a.x - b.x).abs() < half_sum && (a.y - b.y).abs() < half_sum
}
