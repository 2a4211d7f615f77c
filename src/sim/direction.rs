use super::grid::{Cell, Grid};
use enum_map::Enum;
use glam::Vec2;

#[derive(Clone, Copy, Debug, Enum, Eq, Hash, PartialEq)]
pub(crate) enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    /// Unit `(dx, dy)` for this direction, with rows growing downwards
    pub(crate) fn delta(self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::East => (1, 0),
            Direction::South => (0, 1),
            Direction::West => (-1, 0),
        }
    }

    pub(crate) fn unit(self) -> Vec2 {
        match self {
            Direction::North => Vec2::NEG_Y,
            Direction::East => Vec2::X,
            Direction::South => Vec2::Y,
            Direction::West => Vec2::NEG_X,
        }
    }

    /// Return the cell one step away from `pos` in this direction, wrapping
    /// around the edges of `grid`
    pub(crate) fn advance(self, pos: Cell, grid: Grid) -> Cell {
        grid.offset(pos, self, 1)
    }

    pub(crate) fn reverse(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::East => Direction::West,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
        }
    }

    /// Two directions are opposite if their unit vectors sum to zero
    pub(crate) fn is_opposite(self, other: Direction) -> bool {
        let (ax, ay) = self.delta();
        let (bx, by) = other.delta();
        ax + bx == 0 && ay + by == 0
    }
}
