//! Grid addressing for the 4-connected rectangular wave.
//!
//! Cells are indexed `x + y * width`. Non-periodic grids treat cells within
//! `n - 1` of the right/bottom edge as outside the placement window: they are
//! never selected and never receive propagated bans.

use crate::error::ModelError;

/// Number of neighbor directions.
pub const DIRECTIONS: usize = 4;

/// Direction offsets. Order: +X, +Y, -X, -Y
pub const DX: [i32; DIRECTIONS] = [1, 0, -1, 0];
pub const DY: [i32; DIRECTIONS] = [0, 1, 0, -1];

/// Opposite direction indices.
pub const OPPOSITE: [usize; DIRECTIONS] = [2, 3, 0, 1];

/// Fixed dimensions and boundary mode of a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Topology {
    pub width: usize,
    pub height: usize,
    /// Placement window size (1 for plain tiles)
    pub n: usize,
    /// Whether coordinates wrap around (toroidal)
    pub periodic: bool,
}

impl Topology {
    pub fn new(width: usize, height: usize, n: usize, periodic: bool) -> Result<Self, ModelError> {
        if width == 0 || height == 0 || n == 0 {
            return Err(ModelError::InvalidDimensions { width, height, n });
        }
        Ok(Self {
            width,
            height,
            n,
            periodic,
        })
    }

    #[inline]
    pub fn cell_count(&self) -> usize {
        self.width * self.height
    }

    #[inline]
    pub fn coords(&self, cell: usize) -> (usize, usize) {
        (cell % self.width, cell / self.width)
    }

    #[inline]
    pub fn index(&self, x: usize, y: usize) -> usize {
        x + y * self.width
    }

    /// Neighbor of `cell` in direction `d`.
    ///
    /// Returns `None` when the grid is not periodic and the neighbor falls
    /// outside the placement window.
    pub fn neighbor(&self, cell: usize, d: usize) -> Option<usize> {
        let (x1, y1) = self.coords(cell);
        let x2 = x1 as i64 + DX[d] as i64;
        let y2 = y1 as i64 + DY[d] as i64;
        let (w, h) = (self.width as i64, self.height as i64);

        if !self.periodic {
            let n = self.n as i64;
            if x2 < 0 || y2 < 0 || x2 + n > w || y2 + n > h {
                return None;
            }
        }

        let x2 = x2.rem_euclid(w) as usize;
        let y2 = y2.rem_euclid(h) as usize;
        Some(self.index(x2, y2))
    }

    /// Cell whose bans reach `cell` through direction `d`.
    ///
    /// Inverse of [`Topology::neighbor`]: `neighbor(source, d) == Some(cell)`.
    pub fn source(&self, cell: usize, d: usize) -> Option<usize> {
        let (x, y) = self.coords(cell);
        let x0 = x as i64 - DX[d] as i64;
        let y0 = y as i64 - DY[d] as i64;
        let (w, h) = (self.width as i64, self.height as i64);

        if !self.periodic && (x0 < 0 || y0 < 0 || x0 >= w || y0 >= h || !self.is_selectable(cell)) {
            return None;
        }

        Some(self.index(x0.rem_euclid(w) as usize, y0.rem_euclid(h) as usize))
    }

    /// Whether the selection heuristic may pick this cell.
    #[inline]
    pub fn is_selectable(&self, cell: usize) -> bool {
        if self.periodic {
            return true;
        }
        let (x, y) = self.coords(cell);
        x + self.n <= self.width && y + self.n <= self.height
    }
}
