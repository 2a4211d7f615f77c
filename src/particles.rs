use crate::config::Rgb;
use glam::Vec2;
use rand::Rng;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Shape {
    Circle,
    Square,
}

/// How to spawn one burst of particles.  Ranges are inclusive `(min, max)`
/// pairs; distances are in pixels and times in seconds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct EmitOptions {
    pub(crate) count: usize,
    pub(crate) color: Rgb,
    pub(crate) size: (f32, f32),
    pub(crate) lifetime: (f32, f32),
    /// Speed in pixels per second
    pub(crate) speed: (f32, f32),
    /// Base direction of travel.  A zero vector means "up".
    pub(crate) direction: Vec2,
    /// Maximum per-axis perturbation added to the normalized base direction
    pub(crate) direction_spread: f32,
    /// Maximum per-axis offset of a particle's starting point from the
    /// emission center
    pub(crate) spawn_spread: f32,
    pub(crate) shape: Shape,
}

impl Default for EmitOptions {
    fn default() -> EmitOptions {
        EmitOptions {
            count: 10,
            color: Rgb::new(255, 255, 255),
            size: (2.0, 5.0),
            lifetime: (0.3, 0.6),
            speed: (60.0, 140.0),
            direction: Vec2::NEG_Y,
            direction_spread: 0.4,
            spawn_spread: 4.0,
            shape: Shape::Circle,
        }
    }
}

impl EmitOptions {
    /// A wide burst when an apple is eaten
    pub(crate) fn apple_burst(color: Rgb) -> EmitOptions {
        EmitOptions {
            count: 18,
            color,
            speed: (80.0, 160.0),
            direction_spread: 1.0,
            ..EmitOptions::default()
        }
    }

    /// Grit knocked off a stone, thrown back along `away`
    pub(crate) fn stone_dust(color: Rgb, away: Vec2) -> EmitOptions {
        EmitOptions {
            count: 6,
            color,
            size: (2.0, 3.0),
            lifetime: (0.2, 0.4),
            speed: (40.0, 90.0),
            direction: away,
            direction_spread: 0.6,
            shape: Shape::Square,
            ..EmitOptions::default()
        }
    }

    /// Debris from the cells lost when the snake bites itself
    pub(crate) fn cut_debris(color: Rgb) -> EmitOptions {
        EmitOptions {
            count: 4,
            color,
            size: (3.0, 5.0),
            lifetime: (0.4, 0.7),
            speed: (30.0, 80.0),
            direction_spread: 1.0,
            spawn_spread: 6.0,
            shape: Shape::Square,
            ..EmitOptions::default()
        }
    }

    /// A faint puff where a stopped snake lost its tail
    pub(crate) fn tail_puff(color: Rgb) -> EmitOptions {
        EmitOptions {
            count: 5,
            color,
            size: (2.0, 4.0),
            speed: (20.0, 50.0),
            direction_spread: 0.8,
            ..EmitOptions::default()
        }
    }

    /// A small sparkle marking where the next apple will appear
    pub(crate) fn hint_sparkle(color: Rgb) -> EmitOptions {
        EmitOptions {
            count: 2,
            color,
            size: (1.0, 3.0),
            lifetime: (0.25, 0.45),
            speed: (10.0, 30.0),
            direction_spread: 0.7,
            spawn_spread: 6.0,
            ..EmitOptions::default()
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Particle {
    pos: Vec2,
    vel: Vec2,
    age: f32,
    lifetime: f32,
    color: Rgb,
    size: f32,
    shape: Shape,
}

impl Particle {
    fn new<R: Rng + ?Sized>(rng: &mut R, center: Vec2, opts: &EmitOptions) -> Particle {
        let spread = opts.spawn_spread;
        let offset = Vec2::new(uniform(rng, -spread, spread), uniform(rng, -spread, spread));
        let base = opts.direction.normalize_or(Vec2::NEG_Y);
        let jitter = opts.direction_spread;
        let heading = (base + Vec2::new(uniform(rng, -jitter, jitter), uniform(rng, -jitter, jitter)))
            .normalize_or(base);
        Particle {
            pos: center + offset,
            vel: heading * uniform(rng, opts.speed.0, opts.speed.1),
            age: 0.0,
            lifetime: uniform(rng, opts.lifetime.0, opts.lifetime.1),
            color: opts.color,
            size: uniform(rng, opts.size.0, opts.size.1),
            shape: opts.shape,
        }
    }

    pub(crate) fn pos(&self) -> Vec2 {
        self.pos
    }

    pub(crate) fn size(&self) -> f32 {
        self.size
    }

    pub(crate) fn shape(&self) -> Shape {
        self.shape
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.age < self.lifetime
    }

    /// Remaining brightness, falling linearly from 1 at birth to 0 at the
    /// end of the particle's lifetime
    pub(crate) fn fade(&self) -> f32 {
        if self.lifetime > 0.0 {
            (1.0 - self.age / self.lifetime).max(0.0)
        } else {
            0.0
        }
    }

    pub(crate) fn faded_color(&self) -> Rgb {
        self.color.scale(self.fade())
    }
}

fn uniform<R: Rng + ?Sized>(rng: &mut R, lo: f32, hi: f32) -> f32 {
    if lo < hi {
        rng.random_range(lo..=hi)
    } else {
        lo
    }
}

/// A pool of short-lived cosmetic particles.  Nothing in here affects the
/// game's logical state.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ParticleSystem {
    particles: Vec<Particle>,
    max_particles: usize,
}

impl ParticleSystem {
    pub(crate) fn new(max_particles: usize) -> ParticleSystem {
        ParticleSystem {
            particles: Vec::new(),
            max_particles,
        }
    }

    /// Spawn `opts.count` particles around `center`.  Particles that would
    /// take the pool past its capacity are not created.
    pub(crate) fn emit<R: Rng + ?Sized>(&mut self, rng: &mut R, center: Vec2, opts: &EmitOptions) {
        let room = self.max_particles.saturating_sub(self.particles.len());
        if room < opts.count {
            log::trace!(
                "Particle pool full; dropping {} of {} particles",
                opts.count - room,
                opts.count
            );
        }
        for _ in 0..opts.count.min(room) {
            self.particles.push(Particle::new(rng, center, opts));
        }
    }

    /// Age and move every particle by `dt` seconds, then discard those that
    /// have expired
    pub(crate) fn update(&mut self, dt: f32) {
        for p in &mut self.particles {
            p.age += dt;
            p.pos += p.vel * dt;
        }
        self.particles.retain(Particle::is_alive);
    }

    pub(crate) fn particles(&self) -> &[Particle] {
        &self.particles
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.particles.len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha12Rng;
    use rstest::rstest;

    const RNG_SEED: u64 = 0x0123456789ABCDEF;

    #[test]
    fn emitted_particles_follow_options() {
        let mut rng = ChaCha12Rng::seed_from_u64(RNG_SEED);
        let mut pool = ParticleSystem::new(256);
        let center = Vec2::new(100.0, 100.0);
        let opts = EmitOptions::default();
        pool.emit(&mut rng, center, &opts);
        assert_eq!(pool.len(), 10);
        for p in pool.particles() {
            let off = p.pos() - center;
            assert!(off.x.abs() <= 4.0 && off.y.abs() <= 4.0);
            assert!((2.0..=5.0).contains(&p.size()));
            assert!((0.3..=0.6).contains(&p.lifetime));
            let speed = p.vel.length();
            assert!((59.9..=140.1).contains(&speed), "speed {speed}");
            // Upwards, give or take the direction spread
            assert!(p.vel.y < 0.0);
            assert_eq!(p.shape(), Shape::Circle);
            assert_eq!(p.fade(), 1.0);
        }
    }

    #[test]
    fn particles_move_and_fade() {
        let mut rng = ChaCha12Rng::seed_from_u64(RNG_SEED);
        let mut pool = ParticleSystem::new(256);
        let opts = EmitOptions {
            count: 1,
            lifetime: (1.0, 1.0),
            speed: (100.0, 100.0),
            direction: Vec2::X,
            direction_spread: 0.0,
            spawn_spread: 0.0,
            ..EmitOptions::default()
        };
        pool.emit(&mut rng, Vec2::ZERO, &opts);
        pool.update(0.25);
        let p = pool.particles()[0];
        assert!((p.pos() - Vec2::new(25.0, 0.0)).length() < 1e-3);
        assert!((p.fade() - 0.75).abs() < 1e-5);
        assert_eq!(p.faded_color(), Rgb::new(191, 191, 191));
        pool.update(0.75);
        assert!(pool.is_empty());
    }

    #[rstest]
    #[case(0, 10, 10)]
    #[case(250, 10, 256)]
    #[case(256, 10, 256)]
    fn pool_is_capped(#[case] existing: usize, #[case] count: usize, #[case] expected: usize) {
        let mut rng = ChaCha12Rng::seed_from_u64(RNG_SEED);
        let mut pool = ParticleSystem::new(256);
        let one = EmitOptions {
            count: 1,
            ..EmitOptions::default()
        };
        for _ in 0..existing {
            pool.emit(&mut rng, Vec2::ZERO, &one);
        }
        pool.emit(
            &mut rng,
            Vec2::ZERO,
            &EmitOptions {
                count,
                ..EmitOptions::default()
            },
        );
        assert_eq!(pool.len(), expected);
    }

    #[test]
    fn zero_direction_goes_up() {
        let mut rng = ChaCha12Rng::seed_from_u64(RNG_SEED);
        let mut pool = ParticleSystem::new(8);
        let opts = EmitOptions {
            count: 1,
            direction: Vec2::ZERO,
            direction_spread: 0.0,
            ..EmitOptions::default()
        };
        pool.emit(&mut rng, Vec2::ZERO, &opts);
        let v = pool.particles()[0].vel;
        assert!(v.x.abs() < 1e-4 && v.y < 0.0);
    }

    #[test]
    fn all_expire() {
        let mut rng = ChaCha12Rng::seed_from_u64(RNG_SEED);
        let mut pool = ParticleSystem::new(256);
        pool.emit(&mut rng, Vec2::ZERO, &EmitOptions::apple_burst(Rgb::new(255, 0, 0)));
        pool.emit(
            &mut rng,
            Vec2::ZERO,
            &EmitOptions::stone_dust(Rgb::new(128, 128, 128), Vec2::X),
        );
        assert_eq!(pool.len(), 24);
        pool.update(0.61);
        assert!(pool.is_empty());
    }
}
