use super::grid::{Cell, Grid};
use super::snake::Snake;
use super::stones::StoneField;
use rand::{seq::IteratorRandom, Rng};

/// Choose a cell uniformly at random from all cells of `grid` for which
/// `blocked` returns false.  If every cell is blocked, the center of the grid
/// is returned.
pub(crate) fn choose_free_cell<R, F>(rng: &mut R, grid: Grid, blocked: F) -> Cell
where
    R: Rng + ?Sized,
    F: Fn(Cell) -> bool,
{
    match grid.cells().filter(|&c| !blocked(c)).choose(rng) {
        Some(c) => c,
        None => {
            log::warn!("No free cell available; falling back to the center of the board");
            grid.center()
        }
    }
}

/// The apple, plus an optional preview of where the next one will appear
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct Apple {
    cell: Cell,
    preview: Option<Cell>,
}

impl Apple {
    pub(crate) fn new(cell: Cell) -> Apple {
        Apple {
            cell,
            preview: None,
        }
    }

    /// Place an apple on a random cell not covered by `snake` or `stones`
    pub(crate) fn spawn<R: Rng + ?Sized>(
        rng: &mut R,
        grid: Grid,
        snake: &Snake,
        stones: &StoneField,
    ) -> Apple {
        Apple::new(choose_free_cell(rng, grid, |c| {
            snake.contains(c) || stones.contains(c)
        }))
    }

    pub(crate) fn cell(&self) -> Cell {
        self.cell
    }

    pub(crate) fn preview(&self) -> Option<Cell> {
        self.preview
    }

    /// Decide where the next apple will go without moving this one, and
    /// return the chosen cell.  An existing preview is kept.
    pub(crate) fn decide_hint<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        grid: Grid,
        snake: &Snake,
        stones: &StoneField,
    ) -> Cell {
        if let Some(p) = self.preview {
            return p;
        }
        let current = self.cell;
        let p = choose_free_cell(rng, grid, |c| {
            c == current || snake.contains(c) || stones.contains(c)
        });
        self.preview = Some(p);
        p
    }

    /// Discard the preview, returning whether there was one
    pub(crate) fn clear_hint(&mut self) -> bool {
        self.preview.take().is_some()
    }

    /// Move the apple after it has been eaten.  The preview, if any, becomes
    /// the new position provided it is still free; otherwise a fresh cell is
    /// drawn.  The preview is always cleared.
    pub(crate) fn respawn<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        grid: Grid,
        snake: &Snake,
        stones: &StoneField,
    ) {
        let eaten = self.cell;
        let blocked = |c: Cell| c == eaten || snake.contains(c) || stones.contains(c);
        self.cell = match self.preview.take() {
            Some(p) if !blocked(p) => p,
            Some(p) => {
                log::debug!("Apple preview at {p:?} is no longer free; choosing another cell");
                choose_free_cell(rng, grid, blocked)
            }
            None => choose_free_cell(rng, grid, blocked),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::direction::Direction;
    use rand::SeedableRng;
    use rand_chacha::ChaCha12Rng;

    const RNG_SEED: u64 = 0x0123456789ABCDEF;

    fn snake_in_row(cols: &[u16], row: u16) -> Snake {
        Snake::new(cols.iter().map(|&c| Cell::new(c, row)), Direction::East)
    }

    #[test]
    fn spawn_avoids_snake_and_stones() {
        let grid = Grid::new(4, 3, 1);
        let snake = snake_in_row(&[3, 2, 1, 0], 0);
        let stones = StoneField::from_groups([(Cell::new(0, 1), vec![Cell::new(1, 1)])]);
        for seed in RNG_SEED..RNG_SEED + 30 {
            let mut rng = ChaCha12Rng::seed_from_u64(seed);
            let apple = Apple::spawn(&mut rng, grid, &snake, &stones);
            assert!(!snake.contains(apple.cell()));
            assert!(!stones.contains(apple.cell()));
            assert_eq!(apple.preview(), None);
        }
    }

    #[test]
    fn full_board_falls_back_to_center() {
        let grid = Grid::new(3, 1, 1);
        let snake = snake_in_row(&[2, 1, 0], 0);
        let mut rng = ChaCha12Rng::seed_from_u64(RNG_SEED);
        let apple = Apple::spawn(&mut rng, grid, &snake, &StoneField::default());
        assert_eq!(apple.cell(), Cell::new(1, 0));
    }

    #[test]
    fn single_free_cell_is_chosen() {
        let grid = Grid::new(4, 1, 1);
        let snake = snake_in_row(&[2, 1, 0], 0);
        let mut rng = ChaCha12Rng::seed_from_u64(RNG_SEED);
        let apple = Apple::spawn(&mut rng, grid, &snake, &StoneField::default());
        assert_eq!(apple.cell(), Cell::new(3, 0));
    }

    #[test]
    fn hint_is_committed_on_respawn() {
        let grid = Grid::new(10, 10, 1);
        let snake = snake_in_row(&[4, 3, 2], 4);
        let stones = StoneField::default();
        let mut rng = ChaCha12Rng::seed_from_u64(RNG_SEED);
        let mut apple = Apple::new(Cell::new(5, 4));
        let hint = apple.decide_hint(&mut rng, grid, &snake, &stones);
        assert_ne!(hint, apple.cell());
        assert!(!snake.contains(hint));
        assert_eq!(apple.decide_hint(&mut rng, grid, &snake, &stones), hint);
        assert_eq!(apple.preview(), Some(hint));
        assert_eq!(apple.cell(), Cell::new(5, 4));
        apple.respawn(&mut rng, grid, &snake, &stones);
        assert_eq!(apple.cell(), hint);
        assert_eq!(apple.preview(), None);
    }

    #[test]
    fn stale_hint_is_replaced() {
        let grid = Grid::new(10, 10, 1);
        let mut snake = snake_in_row(&[4, 3, 2], 4);
        let stones = StoneField::default();
        let mut rng = ChaCha12Rng::seed_from_u64(RNG_SEED);
        let mut apple = Apple::new(Cell::new(5, 4));
        let hint = apple.decide_hint(&mut rng, grid, &snake, &stones);
        // Grow the snake over the previewed cell
        snake = Snake::new(
            [Cell::new(5, 4), hint, Cell::new(4, 4)],
            snake.direction(),
        );
        apple.respawn(&mut rng, grid, &snake, &stones);
        assert_ne!(apple.cell(), hint);
        assert!(!snake.contains(apple.cell()));
        assert_ne!(apple.cell(), Cell::new(5, 4));
        assert_eq!(apple.preview(), None);
    }

    #[test]
    fn clear_hint() {
        let grid = Grid::new(10, 10, 1);
        let snake = snake_in_row(&[4, 3, 2], 4);
        let mut rng = ChaCha12Rng::seed_from_u64(RNG_SEED);
        let mut apple = Apple::new(Cell::new(5, 4));
        assert!(!apple.clear_hint());
        apple.decide_hint(&mut rng, grid, &snake, &StoneField::default());
        assert!(apple.clear_hint());
        assert_eq!(apple.preview(), None);
    }
}
