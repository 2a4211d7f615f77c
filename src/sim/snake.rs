use super::direction::Direction;
use super::grid::{Cell, Grid};
use super::stones::StoneField;
use crate::util::EnumExt;
use enum_map::Enum;
use rand::{seq::IndexedRandom, Rng};
use std::collections::VecDeque;

/// Cells within this Chebyshev distance of a stone are not used as a
/// spawning head position
const SPAWN_CLEARANCE: i32 = 2;

/// Bodies this short or shorter are never checked for self-collision
const SELF_COLLISION_MIN_LEN: usize = 4;

/// The player's snake.
///
/// The body is never empty.  `body[0]` is the head and the last element is
/// the tail.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Snake {
    /// The cells of the snake, head first
    body: VecDeque<Cell>,

    /// The direction in which the snake is currently facing
    direction: Direction,

    /// A turn requested since the last tick, applied at the start of the
    /// next one
    queued: Option<Direction>,

    /// True while the cell in front of the head is a stone
    stopped: bool,

    /// True after eating; the next forward move keeps the tail
    pending_growth: bool,
}

/// What happened to the snake's body on one call to [`Snake::advance()`]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Step {
    /// The head moved forwards onto `head`.  `vacated` is the cell the tail
    /// left, or `None` if the snake grew instead.
    Moved { head: Cell, vacated: Option<Cell> },

    /// The cell ahead, `stone`, is a stone, so the head stayed put.
    Blocked {
        stone: Cell,
        /// True if the snake was moving freely before this tick
        newly: bool,
        /// The tail cell shed while stuck, if any
        shed: Option<Cell>,
        /// True if shedding took (or would take) the snake below its
        /// minimum length
        exhausted: bool,
    },
}

impl Snake {
    /// Create a snake from its cells, head first, facing in `direction`.
    ///
    /// # Panics
    ///
    /// Panics if `cells` is empty.
    #[cfg(test)]
    pub(crate) fn new<I: IntoIterator<Item = Cell>>(cells: I, direction: Direction) -> Snake {
        let body = cells.into_iter().collect::<VecDeque<_>>();
        assert!(!body.is_empty(), "Snake body must not be empty");
        Snake {
            body,
            direction,
            queued: None,
            stopped: false,
            pending_growth: false,
        }
    }

    /// Create a snake of `length` cells at a random spot on `grid` that is
    /// not near any stone, facing a random direction.  The body trails
    /// straight behind the head where possible.  If no cell is far enough
    /// from all stones, the head is placed at the center of the grid.
    pub(crate) fn spawn<R: Rng + ?Sized>(
        rng: &mut R,
        grid: Grid,
        stones: &StoneField,
        length: usize,
    ) -> Snake {
        let candidates = grid
            .cells()
            .filter(|&c| !near_stone(grid, stones, c))
            .collect::<Vec<_>>();
        let head = match candidates.choose(rng) {
            Some(&c) => c,
            None => {
                log::warn!("No stone-free cell to spawn the snake on; using the center");
                grid.center()
            }
        };
        let direction = Direction::from_usize(rng.random_range(0..Direction::LENGTH));
        let mut body = VecDeque::from([head]);
        let mut current = head;
        for _ in 1..length {
            let free = |c: Cell| !stones.contains(c) && !body.contains(&c);
            let mut next = direction.reverse().advance(current, grid);
            if !free(next) {
                if let Some(alt) = Direction::iter()
                    .map(|d| d.reverse().advance(current, grid))
                    .find(|&c| free(c))
                {
                    next = alt;
                }
            }
            body.push_back(next);
            current = next;
        }
        Snake {
            body,
            direction,
            queued: None,
            stopped: false,
            pending_growth: false,
        }
    }

    /// Return the position of the snake's head
    pub(crate) fn head(&self) -> Cell {
        self.body[0]
    }

    /// Return the cells of the snake, head first
    pub(crate) fn body(&self) -> &VecDeque<Cell> {
        &self.body
    }

    pub(crate) fn len(&self) -> usize {
        self.body.len()
    }

    pub(crate) fn contains(&self, cell: Cell) -> bool {
        self.body.contains(&cell)
    }

    pub(crate) fn direction(&self) -> Direction {
        self.direction
    }

    #[cfg(test)]
    pub(crate) fn queued(&self) -> Option<Direction> {
        self.queued
    }

    pub(crate) fn is_stopped(&self) -> bool {
        self.stopped
    }

    #[cfg(test)]
    pub(crate) fn pending_growth(&self) -> bool {
        self.pending_growth
    }

    /// Request a turn for the next tick, replacing any earlier request.
    /// Rejecting reversals is up to the caller.
    pub(crate) fn queue_turn(&mut self, direction: Direction) {
        self.queued = Some(direction);
    }

    /// Apply the queued turn, if any, returning the new direction if it was
    /// applied.
    ///
    /// While stopped against a stone, a turn is only accepted if the cell in
    /// the new direction is not itself a stone; otherwise the request is
    /// discarded and the snake stays stopped.
    pub(crate) fn resolve_direction(
        &mut self,
        grid: Grid,
        stones: &StoneField,
    ) -> Option<Direction> {
        let next = self.queued.take()?;
        if self.stopped && stones.contains(next.advance(self.head(), grid)) {
            return None;
        }
        self.direction = next;
        self.stopped = false;
        Some(next)
    }

    /// Move the snake forwards one cell in the current direction, wrapping
    /// around the edges of `grid`.
    ///
    /// If the cell ahead is a stone, the snake is stopped instead.  On the
    /// tick it first becomes stopped it keeps its length; on every further
    /// stopped tick it sheds its tail cell (never going below one cell).
    /// Shedding below `min_len` cells marks the step as exhausted.
    pub(crate) fn advance(&mut self, grid: Grid, stones: &StoneField, min_len: usize) -> Step {
        let candidate = self.direction.advance(self.head(), grid);
        if stones.contains(candidate) {
            if !self.stopped {
                self.stopped = true;
                return Step::Blocked {
                    stone: candidate,
                    newly: true,
                    shed: None,
                    exhausted: false,
                };
            }
            let exhausted = self.body.len() - 1 < min_len;
            let shed = if self.body.len() > 1 {
                self.body.pop_back()
            } else {
                None
            };
            return Step::Blocked {
                stone: candidate,
                newly: false,
                shed,
                exhausted,
            };
        }
        self.stopped = false;
        self.body.push_front(candidate);
        let vacated = if self.pending_growth {
            self.pending_growth = false;
            None
        } else {
            self.body.pop_back()
        };
        Step::Moved {
            head: candidate,
            vacated,
        }
    }

    /// Return the index of the body cell the head overlaps, if any.  Bodies
    /// of four or fewer cells are never considered to collide.
    ///
    /// A returned index `k` always satisfies `1 <= k < self.len()`.
    pub(crate) fn self_collision(&self) -> Option<usize> {
        if self.body.len() <= SELF_COLLISION_MIN_LEN {
            return None;
        }
        let head = self.head();
        self.body
            .iter()
            .skip(1)
            .position(|&c| c == head)
            .map(|i| i + 1)
    }

    /// Cut the body at `index`, keeping the cells before it, and return the
    /// removed cells.  An `index` of zero is treated as one so that the head
    /// always survives.
    pub(crate) fn cut(&mut self, index: usize) -> Vec<Cell> {
        self.body.split_off(index.max(1)).into()
    }

    /// Mark that the snake has eaten an apple.  The snake will grow on its
    /// next forward move.
    pub(crate) fn eat(&mut self) {
        self.pending_growth = true;
    }
}

fn near_stone(grid: Grid, stones: &StoneField, cell: Cell) -> bool {
    (-SPAWN_CLEARANCE..=SPAWN_CLEARANCE).any(|dx| {
        (-SPAWN_CLEARANCE..=SPAWN_CLEARANCE).any(|dy| {
            stones.contains(grid.wrap(i32::from(cell.col) + dx, i32::from(cell.row) + dy))
        })
    })
}
