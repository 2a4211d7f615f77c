use super::direction::Direction;
use glam::Vec2;

/// A single position on the board, addressed by column & row.
///
/// Cells produced by [`Grid`] always satisfy `col < width` and
/// `row < height`.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub(crate) struct Cell {
    pub(crate) col: u16,
    pub(crate) row: u16,
}

impl Cell {
    pub(crate) const fn new(col: u16, row: u16) -> Cell {
        Cell { col, row }
    }
}

/// The dimensions of the toroidal board plus the pixel size of one cell.
///
/// Every operation treats the board as wrapping around: leaving one edge
/// re-enters from the opposite edge, and distances are measured the short
/// way around.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct Grid {
    pub(crate) width: u16,
    pub(crate) height: u16,
    pub(crate) cell_size: u16,
}

impl Grid {
    pub(crate) fn new(width: u16, height: u16, cell_size: u16) -> Grid {
        Grid {
            width,
            height,
            cell_size,
        }
    }

    /// Reduce an arbitrary signed column/row pair onto the board
    pub(crate) fn wrap(self, col: i32, row: i32) -> Cell {
        let c = col.rem_euclid(i32::from(self.width));
        let r = row.rem_euclid(i32::from(self.height));
        // Both values are in `0..u16::MAX` after `rem_euclid()`.
        Cell {
            col: u16::try_from(c).unwrap_or_default(),
            row: u16::try_from(r).unwrap_or_default(),
        }
    }

    /// Return the cell reached by moving `steps` cells from `cell` along
    /// `direction`
    pub(crate) fn offset(self, cell: Cell, direction: Direction, steps: i32) -> Cell {
        let (dx, dy) = direction.delta();
        self.wrap(
            i32::from(cell.col) + dx * steps,
            i32::from(cell.row) + dy * steps,
        )
    }

    /// Return the top-left pixel of `cell`
    pub(crate) fn to_pixel(self, cell: Cell) -> Vec2 {
        let size = f32::from(self.cell_size);
        Vec2::new(f32::from(cell.col) * size, f32::from(cell.row) * size)
    }

    /// Size of the whole board in pixels
    pub(crate) fn pixel_size(self) -> Vec2 {
        let size = f32::from(self.cell_size);
        Vec2::new(f32::from(self.width) * size, f32::from(self.height) * size)
    }

    /// Shortest signed `(dx, dy)` that takes `a` to `b` on the torus.  When
    /// both ways around are the same length, the positive delta is used.
    pub(crate) fn wrap_distance(self, a: Cell, b: Cell) -> (i32, i32) {
        (
            shortest_delta(i32::from(b.col) - i32::from(a.col), i32::from(self.width)),
            shortest_delta(i32::from(b.row) - i32::from(a.row), i32::from(self.height)),
        )
    }

    /// Wrap-aware Chebyshev distance: the larger of the absolute column &
    /// row deltas
    pub(crate) fn chebyshev_distance(self, a: Cell, b: Cell) -> u16 {
        let (dx, dy) = self.wrap_distance(a, b);
        // Each delta is at most half of a `u16` dimension.
        u16::try_from(dx.abs().max(dy.abs())).unwrap_or(u16::MAX)
    }

    /// Shortest pixel-space displacement from `from` to `to`, treating the
    /// board as a torus so that motion across an edge goes the short way
    pub(crate) fn pixel_delta(self, from: Vec2, to: Vec2) -> Vec2 {
        let span = self.pixel_size();
        let mut d = to - from;
        if d.x.abs() > span.x / 2.0 {
            d.x -= span.x.copysign(d.x);
        }
        if d.y.abs() > span.y / 2.0 {
            d.y -= span.y.copysign(d.y);
        }
        d
    }

    /// Wrap a continuous pixel position back onto the board
    pub(crate) fn wrap_pixel(self, pos: Vec2) -> Vec2 {
        let span = self.pixel_size();
        Vec2::new(pos.x.rem_euclid(span.x), pos.y.rem_euclid(span.y))
    }

    #[cfg(test)]
    pub(crate) fn contains(self, cell: Cell) -> bool {
        cell.col < self.width && cell.row < self.height
    }

    pub(crate) fn center(self) -> Cell {
        Cell::new(self.width / 2, self.height / 2)
    }

    #[cfg(test)]
    pub(crate) fn area(self) -> usize {
        usize::from(self.width) * usize::from(self.height)
    }

    /// Iterate over every cell of the board in row-major order
    pub(crate) fn cells(self) -> impl Iterator<Item = Cell> {
        (0..self.height).flat_map(move |row| (0..self.width).map(move |col| Cell { col, row }))
    }
}

fn shortest_delta(d: i32, span: i32) -> i32 {
    let d = d.rem_euclid(span);
    if d > span / 2 {
        d - span
    } else {
        d
    }
}
