use crate::anim::AnimationLayer;
use crate::config::{AppleConfig, Palette, RoundConfig, SpeedConfig};
use crate::particles::{EmitOptions, ParticleSystem};
use crate::sim::direction::Direction;
use crate::sim::grid::{Cell, Grid};
use crate::sim::{GameOverReason, SimEvent, Simulation};
use crate::snapshot::{Overlay, Snapshot};
use glam::Vec2;
use rand::{Rng, SeedableRng};

/// Never run more than this many logical ticks in a single frame; any
/// further backlog is dropped
const MAX_TICKS_PER_FRAME: u32 = 8;

/// Player requests, already decoupled from the input device
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Intent {
    Turn(Direction),
    TogglePause,
    /// Begin (`true`) or end (`false`) holding the accelerator
    Accelerate(bool),
    Quit,
}

/// Drives a [`Simulation`] at a variable tick rate from wall-clock frames and
/// keeps the animation & particle layers in step with it
#[derive(Clone, Debug)]
pub(crate) struct Round<R> {
    sim: Simulation<R>,
    anim: AnimationLayer,
    particles: ParticleSystem,
    /// Generator for cosmetic randomness, kept apart from the simulation's
    fx_rng: R,
    speed: SpeedConfig,
    apple: AppleConfig,
    palette: Palette,
    multiplier: f32,
    accelerating: bool,
    /// Unconsumed frame time, in seconds
    accumulator: f32,
    paused: bool,
    quit: bool,
    hint_timer: f32,
}

impl<R: Rng + SeedableRng> Round<R> {
    /// Start a round.  A second generator for particle effects is split off
    /// from `rng` before the simulation takes it over.
    pub(crate) fn new(mut rng: R, config: &RoundConfig, best_length: u32) -> Round<R> {
        let fx_rng = R::from_rng(&mut rng);
        Round::from_simulation(Simulation::new(rng, config, best_length), fx_rng)
    }
}

impl<R: Rng> Round<R> {
    pub(crate) fn from_simulation(sim: Simulation<R>, fx_rng: R) -> Round<R> {
        let config = sim.config();
        let anim = AnimationLayer::new(
            sim.grid(),
            config.animation,
            sim.snake().body().iter().copied(),
            sim.apple().cell(),
        );
        let particles = ParticleSystem::new(config.particles.max_particles);
        let (speed, apple, palette) = (config.speed, config.apple, config.colors);
        Round {
            sim,
            anim,
            particles,
            fx_rng,
            speed,
            apple,
            palette,
            multiplier: 1.0,
            accelerating: false,
            accumulator: 0.0,
            paused: false,
            quit: false,
            hint_timer: 0.0,
        }
    }

    pub(crate) fn handle(&mut self, intent: Intent) {
        match intent {
            Intent::Turn(d) => {
                self.sim.request_turn(d);
            }
            Intent::TogglePause => {
                if self.sim.game_over().is_none() {
                    self.paused = !self.paused;
                    log::debug!("Round {}", if self.paused { "paused" } else { "resumed" });
                }
            }
            Intent::Accelerate(on) => self.accelerating = on,
            Intent::Quit => self.quit = true,
        }
    }

    /// Advance the round by `dt` seconds of wall-clock time and return the
    /// number of logical ticks run.
    ///
    /// The speed multiplier ramps towards its target, as many ticks as fit in
    /// the accumulated time are run (up to a fixed cap), and then animations
    /// and particles advance by `dt` exactly once.  While paused nothing
    /// moves.
    pub(crate) fn frame(&mut self, dt: f32) -> u32 {
        if self.paused {
            return 0;
        }
        self.ramp_speed(dt);
        let mut ticks = 0;
        if self.sim.game_over().is_none() {
            self.accumulator += dt;
            let interval = self.move_interval();
            while self.accumulator >= interval {
                if ticks == MAX_TICKS_PER_FRAME {
                    log::debug!(
                        "Dropping {:.3}s of simulation backlog",
                        self.accumulator
                    );
                    self.accumulator = 0.0;
                    break;
                }
                self.accumulator -= interval;
                ticks += 1;
                let events = self.sim.tick();
                self.dispatch(&events);
                if self.sim.game_over().is_some() {
                    self.accumulator = 0.0;
                    break;
                }
            }
        }
        self.pulse_hint(dt);
        self.anim.update(dt);
        self.particles.update(dt);
        ticks
    }

    fn ramp_speed(&mut self, dt: f32) {
        let max = self.speed.max_multiplier;
        self.multiplier = if self.accelerating {
            (self.multiplier + self.speed.acceleration * dt).min(max)
        } else {
            (self.multiplier - self.speed.deceleration * dt).max(1.0)
        };
    }

    /// Seconds between logical ticks at the current speed
    pub(crate) fn move_interval(&self) -> f32 {
        1.0 / (self.speed.base_speed * self.multiplier)
    }

    fn dispatch(&mut self, events: &[SimEvent]) {
        let grid = self.sim.grid();
        for event in events {
            self.anim.on_event(event);
            match event {
                SimEvent::AppleEaten { at } => {
                    self.particles.emit(
                        &mut self.fx_rng,
                        cell_center(grid, *at),
                        &EmitOptions::apple_burst(self.palette.apple),
                    );
                }
                SimEvent::StoneContact { head, stone, .. } => {
                    let from = cell_center(grid, *head);
                    let facing = self.sim.snake().direction();
                    let toward = grid
                        .pixel_delta(from, cell_center(grid, *stone))
                        .normalize_or(facing.unit());
                    let face = from + toward * f32::from(grid.cell_size) / 2.0;
                    self.particles.emit(
                        &mut self.fx_rng,
                        face,
                        &EmitOptions::stone_dust(self.palette.stone, -toward),
                    );
                }
                SimEvent::SelfCut { removed, .. } => {
                    let opts = EmitOptions::cut_debris(self.palette.snake);
                    for &c in removed {
                        self.particles
                            .emit(&mut self.fx_rng, cell_center(grid, c), &opts);
                    }
                }
                SimEvent::Shrunk { tail } => {
                    self.particles.emit(
                        &mut self.fx_rng,
                        cell_center(grid, *tail),
                        &EmitOptions::tail_puff(self.palette.snake),
                    );
                }
                SimEvent::HintShown { .. } | SimEvent::HintCleared => self.hint_timer = 0.0,
                SimEvent::GameOver { reason } => {
                    log::info!("Round ended: {reason}");
                }
                SimEvent::Moved { .. } | SimEvent::AppleSpawned { .. } => (),
            }
        }
    }

    /// Emit a sparkle on the previewed apple cell every pulse interval
    fn pulse_hint(&mut self, dt: f32) {
        let Some(cell) = self.sim.apple().preview() else {
            self.hint_timer = 0.0;
            return;
        };
        let interval = self.apple.hint_pulse_interval;
        self.hint_timer += dt;
        if interval <= 0.0 {
            return;
        }
        let center = cell_center(self.sim.grid(), cell);
        let opts = EmitOptions::hint_sparkle(self.palette.apple);
        while self.hint_timer >= interval {
            self.hint_timer -= interval;
            self.particles.emit(&mut self.fx_rng, center, &opts);
        }
    }
}

impl<R> Round<R> {
    pub(crate) fn snapshot(&self) -> Snapshot {
        Snapshot::capture(
            &self.sim,
            &self.anim,
            &self.particles,
            Overlay {
                paused: self.paused,
                game_over: self.sim.game_over(),
            },
            self.multiplier,
        )
    }

    pub(crate) fn is_paused(&self) -> bool {
        self.paused
    }

    pub(crate) fn quit_requested(&self) -> bool {
        self.quit
    }

    pub(crate) fn game_over(&self) -> Option<GameOverReason> {
        self.sim.game_over()
    }

    pub(crate) fn best_length(&self) -> u32 {
        self.sim.best_length()
    }
}

#[cfg(test)]
impl<R> Round<R> {
    pub(crate) fn simulation(&self) -> &Simulation<R> {
        &self.sim
    }

    pub(crate) fn animation(&self) -> &AnimationLayer {
        &self.anim
    }

    pub(crate) fn particles(&self) -> &ParticleSystem {
        &self.particles
    }

    pub(crate) fn multiplier(&self) -> f32 {
        self.multiplier
    }
}

fn cell_center(grid: Grid, cell: Cell) -> Vec2 {
    grid.to_pixel(cell) + Vec2::splat(f32::from(grid.cell_size) / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::apple::Apple;
    use crate::sim::snake::Snake;
    use crate::sim::stones::StoneField;
    use enum_map::Enum;
    use rand_chacha::ChaCha12Rng;
    use rstest::rstest;

    const RNG_SEED: u64 = 0x0123456789ABCDEF;

    fn round_with(snake: Snake, stones: StoneField, apple: Cell) -> Round<ChaCha12Rng> {
        let config = RoundConfig::default();
        let sim = Simulation::from_parts(
            ChaCha12Rng::seed_from_u64(RNG_SEED),
            config,
            stones,
            snake,
            Apple::new(apple),
            1,
        );
        Round::from_simulation(sim, ChaCha12Rng::seed_from_u64(!RNG_SEED))
    }

    fn straight_snake() -> Snake {
        Snake::new(
            [Cell::new(5, 5), Cell::new(4, 5), Cell::new(3, 5)],
            Direction::East,
        )
    }

    #[test]
    fn speed_ramps_up_and_down() {
        let mut round = round_with(straight_snake(), StoneField::default(), Cell::new(20, 20));
        round.handle(Intent::Accelerate(true));
        round.frame(0.5);
        assert!((round.multiplier() - 2.0).abs() < 1e-5);
        round.frame(1.0);
        assert_eq!(round.multiplier(), 3.0);
        round.handle(Intent::Accelerate(false));
        round.frame(1.0);
        assert!((round.multiplier() - 1.5).abs() < 1e-5);
        round.frame(1.0);
        assert_eq!(round.multiplier(), 1.0);
    }

    #[rstest]
    #[case(0.2, 0)]
    #[case(0.5, 1)]
    #[case(0.7, 2)]
    #[case(10.0, 8)]
    fn ticks_per_frame(#[case] dt: f32, #[case] ticks: u32) {
        let mut round = round_with(straight_snake(), StoneField::default(), Cell::new(20, 20));
        assert_eq!(round.frame(dt), ticks);
        assert_eq!(round.simulation().ticks(), u64::from(ticks));
    }

    #[test]
    fn backlog_is_dropped() {
        let mut round = round_with(straight_snake(), StoneField::default(), Cell::new(20, 20));
        assert_eq!(round.frame(10.0), 8);
        assert_eq!(round.frame(0.1), 0);
    }

    #[test]
    fn time_accumulates_across_frames() {
        let mut round = round_with(straight_snake(), StoneField::default(), Cell::new(20, 20));
        assert_eq!(round.frame(0.2), 0);
        assert_eq!(round.frame(0.2), 1);
        assert_eq!(round.simulation().snake().head(), Cell::new(6, 5));
    }

    #[test]
    fn pause_freezes_everything() {
        let mut round = round_with(straight_snake(), StoneField::default(), Cell::new(6, 5));
        round.frame(0.34);
        assert!(!round.particles().is_empty());
        let before = round.snapshot();
        round.handle(Intent::TogglePause);
        assert!(round.is_paused());
        round.handle(Intent::Accelerate(true));
        assert_eq!(round.frame(5.0), 0);
        let after = round.snapshot();
        assert_eq!(after.sprites, before.sprites);
        assert!(after.overlay.paused);
        assert_eq!(round.multiplier(), 1.0);
        round.handle(Intent::Turn(Direction::North));
        assert_eq!(round.simulation().snake().queued(), Some(Direction::North));
        round.handle(Intent::TogglePause);
        assert!(!round.is_paused());
        assert_eq!(round.frame(0.34), 1);
    }

    #[test]
    fn eating_emits_particles() {
        let mut round = round_with(straight_snake(), StoneField::default(), Cell::new(6, 5));
        assert_eq!(round.frame(0.34), 1);
        assert_eq!(round.simulation().snake().head(), Cell::new(6, 5));
        assert!(round.simulation().snake().pending_growth());
        assert!(!round.particles().is_empty());
    }

    #[test]
    fn stone_contact_twitches_and_ends_round() {
        let stones = StoneField::from_groups([(Cell::new(6, 5), vec![Cell::new(6, 6)])]);
        let config = RoundConfig {
            speed: SpeedConfig {
                base_speed: 10.0,
                ..SpeedConfig::default()
            },
            ..RoundConfig::default()
        };
        let sim = Simulation::from_parts(
            ChaCha12Rng::seed_from_u64(RNG_SEED),
            config,
            stones,
            straight_snake(),
            Apple::new(Cell::new(20, 20)),
            1,
        );
        let mut round = Round::from_simulation(sim, ChaCha12Rng::seed_from_u64(!RNG_SEED));
        assert_eq!(round.frame(0.12), 1);
        assert!(round.simulation().snake().is_stopped());
        assert!(!round.particles().is_empty());
        assert!(!round.animation().is_settled());
        assert_eq!(round.frame(0.12), 1);
        assert_eq!(round.game_over(), Some(GameOverReason::StoneCollision));
        let snap = round.snapshot();
        assert_eq!(snap.overlay.game_over_reason(), Some("stone collision"));
        assert_eq!(round.frame(5.0), 0);
        round.handle(Intent::TogglePause);
        assert!(!round.is_paused());
    }

    #[test]
    fn quit_intent() {
        let mut round = round_with(straight_snake(), StoneField::default(), Cell::new(20, 20));
        assert!(!round.quit_requested());
        round.handle(Intent::Quit);
        assert!(round.quit_requested());
    }

    #[test]
    fn animation_tracks_body() {
        let config = RoundConfig::default();
        let mut round = Round::new(ChaCha12Rng::seed_from_u64(RNG_SEED), &config, 1);
        let mut turns = ChaCha12Rng::seed_from_u64(!RNG_SEED);
        for _ in 0..3000 {
            if turns.random_bool(0.2) {
                round.handle(Intent::Turn(Direction::from_usize(turns.random_range(0..4))));
            }
            round.frame(1.0 / 60.0);
            let body = round.simulation().snake().body();
            let segs = round.animation().segments();
            assert_eq!(segs.len(), body.len());
            assert!(segs.iter().zip(body).all(|(s, &c)| s.cell() == c));
            assert!(round.particles().len() <= config.particles.max_particles);
            if round.game_over().is_some() {
                break;
            }
        }
    }

    #[test]
    fn hint_pulses_emit_sparkles() {
        // The snake passes within two cells of the apple without eating it
        let mut round = round_with(straight_snake(), StoneField::default(), Cell::new(7, 7));
        round.frame(0.34);
        assert!(round.simulation().apple().preview().is_some());
        let mut last = round.particles().len();
        let mut grew = false;
        for _ in 0..6 {
            round.frame(0.05);
            assert_eq!(round.simulation().ticks(), 1);
            grew |= round.particles().len() > last;
            last = round.particles().len();
        }
        assert!(grew);
    }
}
