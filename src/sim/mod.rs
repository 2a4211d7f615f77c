pub(crate) mod apple;
pub(crate) mod direction;
pub(crate) mod grid;
pub(crate) mod snake;
pub(crate) mod stones;
use self::apple::Apple;
use self::direction::Direction;
use self::grid::{Cell, Grid};
use self::snake::{Snake, Step};
use self::stones::StoneField;
use crate::config::RoundConfig;
use rand::Rng;
use std::collections::HashSet;
use std::fmt;

/// Something that happened during a single logical tick.  Events carry the
/// cells they concern so that observers never need to inspect the
/// simulation mid-tick.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum SimEvent {
    /// The head moved forwards onto `head`.  `vacated` is the cell the tail
    /// left, or `None` if the snake grew by one cell.
    Moved { head: Cell, vacated: Option<Cell> },

    /// The head is blocked by the stone cell `stone`.  `first` is true on
    /// the tick on which the snake became stopped.
    StoneContact { head: Cell, stone: Cell, first: bool },

    /// A stopped snake lost its tail cell `tail`
    Shrunk { tail: Cell },

    /// The head ran into the body at `at`; the cells from there to the tail
    /// were cut off
    SelfCut { at: Cell, removed: Vec<Cell> },

    AppleEaten { at: Cell },

    /// The apple (re)appeared at `at`
    AppleSpawned { at: Cell },

    /// The next apple position was decided and may be shown as a hint
    HintShown { at: Cell },

    /// A previously shown hint was withdrawn
    HintCleared,

    /// The round is over
    GameOver { reason: GameOverReason },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum GameOverReason {
    /// A stopped snake shrank below its starting length
    StoneCollision,
}

impl GameOverReason {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            GameOverReason::StoneCollision => "stone collision",
        }
    }
}

impl fmt::Display for GameOverReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The logical state of one round: board, stones, snake & apple.
///
/// All randomness comes from the injected generator `R`, so two simulations
/// built from equal generators and fed the same turns evolve identically.
#[derive(Clone, Debug)]
pub(crate) struct Simulation<R> {
    rng: R,
    config: RoundConfig,
    grid: Grid,
    stones: StoneField,
    snake: Snake,
    apple: Apple,
    best_length: u32,
    game_over: Option<GameOverReason>,
    ticks: u64,
}

impl<R: Rng> Simulation<R> {
    /// Start a new round: place the stones, then the snake, then the apple
    pub(crate) fn new(mut rng: R, config: &RoundConfig, best_length: u32) -> Simulation<R> {
        let grid = config.grid();
        let stones = StoneField::generate(&mut rng, grid, &config.stones, &HashSet::new());
        let snake = Snake::spawn(&mut rng, grid, &stones, config.snake.initial_length);
        let apple = Apple::spawn(&mut rng, grid, &snake, &stones);
        log::info!(
            "Starting round on a {}x{} board with {} stone groups; snake at {:?} facing {:?}",
            grid.width,
            grid.height,
            stones.groups().len(),
            snake.head(),
            snake.direction(),
        );
        Simulation::from_parts(rng, config.clone(), stones, snake, apple, best_length)
    }

    /// Assemble a simulation from already-built pieces
    pub(crate) fn from_parts(
        rng: R,
        config: RoundConfig,
        stones: StoneField,
        snake: Snake,
        apple: Apple,
        best_length: u32,
    ) -> Simulation<R> {
        let grid = config.grid();
        let mut sim = Simulation {
            rng,
            config,
            grid,
            stones,
            snake,
            apple,
            best_length,
            game_over: None,
            ticks: 0,
        };
        sim.record_length();
        sim
    }

    /// Queue a turn for the next tick.  A turn exactly opposite the current
    /// direction is refused, as is any turn once the round is over.  Returns
    /// whether the turn was queued.
    pub(crate) fn request_turn(&mut self, direction: Direction) -> bool {
        if self.game_over.is_some() || direction.is_opposite(self.snake.direction()) {
            return false;
        }
        self.snake.queue_turn(direction);
        true
    }

    /// Run one logical step and report what happened.  Does nothing once the
    /// round is over.
    pub(crate) fn tick(&mut self) -> Vec<SimEvent> {
        let mut events = Vec::new();
        if self.game_over.is_some() {
            return events;
        }
        self.ticks += 1;
        self.snake.resolve_direction(self.grid, &self.stones);
        match self.snake.advance(
            self.grid,
            &self.stones,
            self.config.snake.initial_length,
        ) {
            Step::Blocked {
                stone,
                newly,
                shed,
                exhausted,
            } => {
                if newly {
                    log::debug!("Snake stopped against stone at {stone:?}");
                }
                events.push(SimEvent::StoneContact {
                    head: self.snake.head(),
                    stone,
                    first: newly,
                });
                if let Some(tail) = shed {
                    events.push(SimEvent::Shrunk { tail });
                }
                if exhausted {
                    let reason = GameOverReason::StoneCollision;
                    log::info!(
                        "Game over after {} ticks: {reason}; best length {}",
                        self.ticks,
                        self.best_length
                    );
                    self.game_over = Some(reason);
                    events.push(SimEvent::GameOver { reason });
                    return events;
                }
            }
            Step::Moved { head, vacated } => {
                events.push(SimEvent::Moved { head, vacated });
                if let Some(k) = self.snake.self_collision() {
                    let removed = self.snake.cut(k);
                    log::debug!(
                        "Snake bit itself at {head:?}; cut {} cells, {} left",
                        removed.len(),
                        self.snake.len()
                    );
                    events.push(SimEvent::SelfCut { at: head, removed });
                }
                if head == self.apple.cell() {
                    self.snake.eat();
                    self.apple
                        .respawn(&mut self.rng, self.grid, &self.snake, &self.stones);
                    events.push(SimEvent::AppleEaten { at: head });
                    events.push(SimEvent::AppleSpawned {
                        at: self.apple.cell(),
                    });
                }
            }
        }
        self.update_hint(&mut events);
        self.record_length();
        events
    }

    /// Show a hint for the next apple while the head is close to the current
    /// one, and withdraw it once the head leaves
    fn update_hint(&mut self, events: &mut Vec<SimEvent>) {
        let near = self
            .grid
            .chebyshev_distance(self.snake.head(), self.apple.cell())
            <= self.config.apple.hint_radius;
        if near {
            if self.apple.preview().is_none() {
                let at = self
                    .apple
                    .decide_hint(&mut self.rng, self.grid, &self.snake, &self.stones);
                events.push(SimEvent::HintShown { at });
            }
        } else if self.apple.clear_hint() {
            events.push(SimEvent::HintCleared);
        }
    }
}

impl<R> Simulation<R> {
    fn record_length(&mut self) {
        let len = u32::try_from(self.snake.len()).unwrap_or(u32::MAX);
        self.best_length = self.best_length.max(len);
    }

    pub(crate) fn grid(&self) -> Grid {
        self.grid
    }

    pub(crate) fn config(&self) -> &RoundConfig {
        &self.config
    }

    pub(crate) fn stones(&self) -> &StoneField {
        &self.stones
    }

    pub(crate) fn snake(&self) -> &Snake {
        &self.snake
    }

    pub(crate) fn apple(&self) -> &Apple {
        &self.apple
    }

    /// The longer of the previous best length and every length reached this
    /// round
    pub(crate) fn best_length(&self) -> u32 {
        self.best_length
    }

    pub(crate) fn game_over(&self) -> Option<GameOverReason> {
        self.game_over
    }

    #[cfg(test)]
    pub(crate) fn ticks(&self) -> u64 {
        self.ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppleConfig, GridConfig, StoneConfig};
    use enum_map::Enum;
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha12Rng;

    const RNG_SEED: u64 = 0x0123456789ABCDEF;

    fn config() -> RoundConfig {
        RoundConfig {
            apple: AppleConfig {
                hint_radius: 0,
                ..AppleConfig::default()
            },
            ..RoundConfig::default()
        }
    }

    fn row(cols: &[u16], r: u16) -> Vec<Cell> {
        cols.iter().map(|&c| Cell::new(c, r)).collect()
    }

    fn sim_with(
        stones: StoneField,
        snake: Snake,
        apple: Cell,
        config: RoundConfig,
    ) -> Simulation<ChaCha12Rng> {
        Simulation::from_parts(
            ChaCha12Rng::seed_from_u64(RNG_SEED),
            config,
            stones,
            snake,
            Apple::new(apple),
            1,
        )
    }

    #[test]
    fn stone_collision_ends_round() {
        let stones = StoneField::from_groups([(Cell::new(10, 5), vec![Cell::new(10, 6)])]);
        let snake = Snake::new(row(&[9, 8, 7], 5), Direction::East);
        let mut sim = sim_with(stones, snake, Cell::new(20, 20), config());
        assert_eq!(
            sim.tick(),
            vec![SimEvent::StoneContact {
                head: Cell::new(9, 5),
                stone: Cell::new(10, 5),
                first: true
            }]
        );
        assert!(sim.snake().is_stopped());
        assert_eq!(sim.snake().len(), 3);
        assert_eq!(sim.game_over(), None);
        assert_eq!(
            sim.tick(),
            vec![
                SimEvent::StoneContact {
                    head: Cell::new(9, 5),
                    stone: Cell::new(10, 5),
                    first: false
                },
                SimEvent::Shrunk {
                    tail: Cell::new(7, 5)
                },
                SimEvent::GameOver {
                    reason: GameOverReason::StoneCollision
                },
            ]
        );
        assert_eq!(sim.snake().len(), 2);
        assert_eq!(sim.game_over(), Some(GameOverReason::StoneCollision));
        assert_eq!(
            sim.game_over().map(GameOverReason::as_str),
            Some("stone collision")
        );
        assert_eq!(sim.tick(), Vec::new());
        assert!(!sim.request_turn(Direction::North));
    }

    #[test]
    fn escape_sideways_from_stone() {
        let stones = StoneField::from_groups([(Cell::new(10, 5), vec![Cell::new(10, 6)])]);
        let snake = Snake::new(row(&[9, 8, 7], 5), Direction::East);
        let mut sim = sim_with(stones, snake, Cell::new(20, 20), config());
        sim.tick();
        assert!(sim.request_turn(Direction::North));
        assert_eq!(
            sim.tick(),
            vec![SimEvent::Moved {
                head: Cell::new(9, 4),
                vacated: Some(Cell::new(7, 5))
            }]
        );
        assert!(!sim.snake().is_stopped());
        assert_eq!(sim.game_over(), None);
    }

    #[test]
    fn eat_apple_and_grow() {
        let snake = Snake::new(row(&[4, 3, 2], 5), Direction::East);
        let mut sim = sim_with(StoneField::default(), snake, Cell::new(5, 5), config());
        let events = sim.tick();
        assert!(events.contains(&SimEvent::AppleEaten {
            at: Cell::new(5, 5)
        }));
        assert!(sim.snake().pending_growth());
        assert_eq!(sim.snake().len(), 3);
        assert_ne!(sim.apple().cell(), Cell::new(5, 5));
        assert!(!sim.snake().contains(sim.apple().cell()));
        assert!(events.contains(&SimEvent::AppleSpawned {
            at: sim.apple().cell()
        }));
        let events = sim.tick();
        assert_eq!(
            events[0],
            SimEvent::Moved {
                head: Cell::new(6, 5),
                vacated: None
            }
        );
        assert_eq!(sim.snake().len(), 4);
        assert_eq!(
            sim.snake().pending_growth(),
            events
                .iter()
                .any(|e| matches!(e, SimEvent::AppleEaten { .. }))
        );
        assert!(!sim.snake().contains(sim.apple().cell()));
        assert_eq!(sim.best_length(), 4);
    }

    #[test]
    fn wrap_around_left_edge() {
        let snake = Snake::new(row(&[0, 1, 2], 0), Direction::West);
        let mut sim = sim_with(StoneField::default(), snake, Cell::new(20, 20), config());
        sim.tick();
        assert_eq!(sim.snake().head(), Cell::new(31, 0));
        assert_eq!(sim.game_over(), None);
    }

    #[test]
    fn self_collision_cuts_tail() {
        let snake = Snake::new(
            [
                Cell::new(5, 5),
                Cell::new(5, 6),
                Cell::new(6, 6),
                Cell::new(6, 5),
                Cell::new(6, 4),
                Cell::new(5, 4),
                Cell::new(4, 4),
            ],
            Direction::East,
        );
        let mut sim = sim_with(StoneField::default(), snake, Cell::new(20, 20), config());
        let events = sim.tick();
        assert_eq!(
            events,
            vec![
                SimEvent::Moved {
                    head: Cell::new(6, 5),
                    vacated: Some(Cell::new(4, 4))
                },
                SimEvent::SelfCut {
                    at: Cell::new(6, 5),
                    removed: vec![Cell::new(6, 5), Cell::new(6, 4), Cell::new(5, 4)]
                },
            ]
        );
        assert_eq!(sim.snake().len(), 4);
        assert_eq!(sim.game_over(), None);
        assert_eq!(sim.best_length(), 7);
    }

    #[test]
    fn opposite_turn_is_refused() {
        let snake = Snake::new(row(&[9, 8, 7], 5), Direction::East);
        let mut sim = sim_with(StoneField::default(), snake, Cell::new(20, 20), config());
        assert!(!sim.request_turn(Direction::West));
        assert_eq!(sim.snake().queued(), None);
        sim.tick();
        assert_eq!(sim.snake().direction(), Direction::East);
        assert!(sim.request_turn(Direction::South));
        assert!(sim.request_turn(Direction::East));
        sim.tick();
        assert_eq!(sim.snake().direction(), Direction::East);
    }

    #[test]
    fn hint_near_apple() {
        let snake = Snake::new(row(&[2, 1, 0], 5), Direction::East);
        let cfg = RoundConfig {
            apple: AppleConfig {
                hint_radius: 2,
                ..AppleConfig::default()
            },
            ..RoundConfig::default()
        };
        let mut sim = sim_with(StoneField::default(), snake, Cell::new(5, 5), cfg);
        let events = sim.tick();
        let Some(&SimEvent::HintShown { at: hint }) = events.last() else {
            panic!("Expected a hint, got {events:?}");
        };
        assert_eq!(sim.apple().preview(), Some(hint));
        assert!(sim.request_turn(Direction::North));
        sim.tick();
        sim.tick();
        let events = sim.tick();
        assert_eq!(sim.snake().head(), Cell::new(3, 2));
        assert_eq!(events.last(), Some(&SimEvent::HintCleared));
        assert_eq!(sim.apple().preview(), None);
    }

    #[test]
    fn hint_commits_when_apple_eaten() {
        // A single row leaves only the cells ahead of the apple free, so the
        // preview can never be the cell the head moves into
        let snake = Snake::new(row(&[2, 1, 0], 0), Direction::East);
        let cfg = RoundConfig {
            grid: GridConfig {
                width: 7,
                height: 1,
                cell_size: 20,
            },
            apple: AppleConfig {
                hint_radius: 1,
                ..AppleConfig::default()
            },
            ..RoundConfig::default()
        };
        for seed in RNG_SEED..RNG_SEED + 10 {
            let mut sim = Simulation::from_parts(
                ChaCha12Rng::seed_from_u64(seed),
                cfg.clone(),
                StoneField::default(),
                snake.clone(),
                Apple::new(Cell::new(3, 0)),
                1,
            );
            sim.update_hint(&mut Vec::new());
            let hint = sim.apple().preview().unwrap();
            assert!((4..7).contains(&hint.col), "hint {hint:?}");
            let events = sim.tick();
            assert!(events.contains(&SimEvent::AppleEaten { at: Cell::new(3, 0) }));
            assert!(events.contains(&SimEvent::AppleSpawned { at: hint }));
            assert_eq!(sim.apple().cell(), hint);
            assert!(!sim.snake().contains(hint));
        }
    }

    #[test]
    fn random_play_keeps_invariants() {
        let cfg = RoundConfig {
            stones: StoneConfig {
                min_count: 5,
                max_count: 7,
                ..StoneConfig::default()
            },
            ..RoundConfig::default()
        };
        let grid = cfg.grid();
        for seed in RNG_SEED..RNG_SEED + 5 {
            let mut sim = Simulation::new(ChaCha12Rng::seed_from_u64(seed), &cfg, 1);
            let mut turns = ChaCha12Rng::seed_from_u64(!seed);
            for _ in 0..2000 {
                if turns.random_bool(0.3) {
                    let d = Direction::from_usize(turns.random_range(0..4));
                    let before = sim.snake().direction();
                    let queued = sim.request_turn(d);
                    assert_eq!(queued, sim.game_over().is_none() && !d.is_opposite(before));
                }
                let before = sim.snake().direction();
                let len = sim.snake().len();
                sim.tick();
                assert!(!sim.snake().direction().is_opposite(before));
                assert!(sim.snake().body().iter().all(|&c| grid.contains(c)));
                assert!(!sim.snake().contains(sim.apple().cell()));
                assert!(!sim.stones().contains(sim.apple().cell()));
                assert!(sim.snake().body().iter().all(|&c| !sim.stones().contains(c)));
                assert!(sim.snake().len() >= 1);
                assert!(sim.snake().len() <= len + 1);
                assert!(usize::try_from(sim.best_length()).unwrap() >= sim.snake().len());
                if sim.game_over().is_some() {
                    break;
                }
            }
        }
    }

    #[test]
    fn deterministic_with_seed() {
        let cfg = RoundConfig::default();
        let run = || {
            let mut sim = Simulation::new(ChaCha12Rng::seed_from_u64(RNG_SEED), &cfg, 1);
            let mut log = Vec::new();
            for i in 0..200 {
                if i % 7 == 0 {
                    sim.request_turn(Direction::from_usize(i / 7 % 4));
                }
                log.extend(sim.tick());
            }
            (log, sim.snake().clone(), sim.apple().cell())
        };
        assert_eq!(run(), run());
    }
}
