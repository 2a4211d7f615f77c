use crate::config::AnimationConfig;
use crate::sim::grid::{Cell, Grid};
use crate::sim::SimEvent;
use glam::Vec2;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum AnimationKind {
    Idle,
    Move,
    Grow,
    Shrink,
    /// Oscillate along `toward`, a unit vector pointing from the head to the
    /// stone it hit
    Twitch { toward: Vec2 },
}

impl AnimationKind {
    fn duration(self, config: &AnimationConfig) -> f32 {
        match self {
            AnimationKind::Idle => 0.0,
            AnimationKind::Move => config.move_duration,
            AnimationKind::Grow => config.grow_duration,
            AnimationKind::Shrink => config.shrink_duration,
            AnimationKind::Twitch { .. } => config.twitch_duration,
        }
    }

    /// Map linear progress `t` in `[0, 1]` to this animation's eased
    /// progress.  For twitches this is the displacement envelope, which
    /// peaks at the midpoint and is zero at both ends.
    fn ease(self, t: f32) -> f32 {
        match self {
            AnimationKind::Idle => 1.0,
            AnimationKind::Move => 1.0 - (1.0 - t).powi(3),
            AnimationKind::Grow => ease_out_quad(t),
            AnimationKind::Shrink => t,
            AnimationKind::Twitch { .. } => 1.0 - (2.0 * t - 1.0).abs(),
        }
    }
}

fn ease_out_quad(t: f32) -> f32 {
    1.0 - (1.0 - t).powi(2)
}

/// Linear progress of an animation that has run for `timer` seconds out of
/// `duration`
fn progress(timer: f32, duration: f32) -> f32 {
    if duration > 0.0 {
        (timer / duration).min(1.0)
    } else {
        1.0
    }
}

/// Animation state for one live snake segment
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct SegmentAnim {
    /// The logical cell this segment is heading for
    cell: Cell,
    /// Render position at the moment the current animation began
    start: Vec2,
    render: Vec2,
    timer: f32,
    kind: AnimationKind,
}

impl SegmentAnim {
    fn idle(grid: Grid, cell: Cell) -> SegmentAnim {
        let pos = grid.to_pixel(cell);
        SegmentAnim {
            cell,
            start: pos,
            render: pos,
            timer: 0.0,
            kind: AnimationKind::Idle,
        }
    }

    fn starting(cell: Cell, from: Vec2, kind: AnimationKind) -> SegmentAnim {
        SegmentAnim {
            cell,
            start: from,
            render: from,
            timer: 0.0,
            kind,
        }
    }

    pub(crate) fn cell(&self) -> Cell {
        self.cell
    }

    /// Current render position in pixels.  May lie slightly off the board
    /// while crossing an edge.
    pub(crate) fn render(&self) -> Vec2 {
        self.render
    }

    #[cfg(test)]
    pub(crate) fn kind(&self) -> AnimationKind {
        self.kind
    }

    fn advance(&mut self, dt: f32, grid: Grid, config: &AnimationConfig) {
        self.timer += dt;
        let t = progress(self.timer, self.kind.duration(config));
        let target = grid.to_pixel(self.cell);
        self.render = match self.kind {
            AnimationKind::Idle => target,
            AnimationKind::Move | AnimationKind::Grow | AnimationKind::Shrink => {
                self.start + grid.pixel_delta(self.start, target) * self.kind.ease(t)
            }
            AnimationKind::Twitch { toward } => {
                // Finish any interrupted move while oscillating around it
                let settle =
                    self.start + grid.pixel_delta(self.start, target) * ease_out_quad(t);
                let amplitude = config.twitch_amplitude * f32::from(grid.cell_size);
                settle + toward * amplitude * self.kind.ease(t)
            }
        };
        if t >= 1.0 {
            self.snap(grid);
        }
    }

    fn snap(&mut self, grid: Grid) {
        self.render = grid.to_pixel(self.cell);
        self.start = self.render;
        self.timer = 0.0;
        self.kind = AnimationKind::Idle;
    }
}

/// A tail segment that has left the body and is fading out while sliding
/// towards the new tail
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct ShrinkGhost {
    start: Vec2,
    toward: Cell,
    render: Vec2,
    timer: f32,
}

impl ShrinkGhost {
    pub(crate) fn render(&self) -> Vec2 {
        self.render
    }

    /// Brightness factor, falling linearly from 1 to 0 over the animation
    pub(crate) fn fade(&self, config: &AnimationConfig) -> f32 {
        1.0 - progress(self.timer, config.shrink_duration)
    }

    /// Advance the ghost and return whether it is still visible
    fn advance(&mut self, dt: f32, grid: Grid, config: &AnimationConfig) -> bool {
        self.timer += dt;
        let t = progress(self.timer, config.shrink_duration);
        let target = grid.to_pixel(self.toward);
        self.render =
            self.start + grid.pixel_delta(self.start, target) * AnimationKind::Shrink.ease(t);
        t < 1.0
    }
}

/// Continuous render state mirroring the logical snake and apple.
///
/// The layer is driven by [`SimEvent`]s and advanced by wall-clock time; it
/// never feeds back into the simulation.  Live segments are kept in
/// one-to-one correspondence with the snake's body.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct AnimationLayer {
    grid: Grid,
    config: AnimationConfig,
    segments: Vec<SegmentAnim>,
    ghosts: Vec<ShrinkGhost>,
    apple: Cell,
    apple_timer: f32,
}

impl AnimationLayer {
    pub(crate) fn new<I>(grid: Grid, config: AnimationConfig, body: I, apple: Cell) -> Self
    where
        I: IntoIterator<Item = Cell>,
    {
        AnimationLayer {
            grid,
            config,
            segments: body
                .into_iter()
                .map(|c| SegmentAnim::idle(grid, c))
                .collect(),
            ghosts: Vec::new(),
            apple,
            apple_timer: 0.0,
        }
    }

    pub(crate) fn on_event(&mut self, event: &SimEvent) {
        match event {
            SimEvent::Moved { head, vacated } => self.shift(*head, vacated.is_none()),
            SimEvent::StoneContact {
                head,
                stone,
                first: true,
            } => self.twitch(*head, *stone),
            SimEvent::Shrunk { .. } => self.shed_tail(),
            SimEvent::SelfCut { removed, .. } => {
                let keep = self.segments.len().saturating_sub(removed.len()).max(1);
                self.segments.truncate(keep);
            }
            SimEvent::AppleSpawned { at } => {
                self.apple = *at;
                self.apple_timer = 0.0;
            }
            _ => (),
        }
    }

    /// Move every segment up one place: the new head slides out of the old
    /// head's position and each following segment starts from its
    /// predecessor's previous render position.
    fn shift(&mut self, head: Cell, grew: bool) {
        let Some(first) = self.segments.first() else {
            self.segments.push(SegmentAnim::idle(self.grid, head));
            return;
        };
        let mut shifted = Vec::with_capacity(self.segments.len() + 1);
        shifted.push(SegmentAnim::starting(
            head,
            first.render,
            AnimationKind::Move,
        ));
        shifted.extend(
            self.segments
                .iter()
                .map(|s| SegmentAnim::starting(s.cell, s.render, AnimationKind::Move)),
        );
        if grew {
            if let Some(tail) = shifted.last_mut() {
                tail.kind = AnimationKind::Grow;
            }
        } else if let Some(old_tail) = self.segments.last() {
            shifted.pop();
            let toward = shifted.last().map_or(head, |s| s.cell);
            self.ghosts.push(ShrinkGhost {
                start: old_tail.render,
                toward,
                render: old_tail.render,
                timer: 0.0,
            });
        }
        self.segments = shifted;
    }

    fn shed_tail(&mut self) {
        if self.segments.len() < 2 {
            return;
        }
        if let Some(old_tail) = self.segments.pop() {
            let toward = self
                .segments
                .last()
                .map_or(old_tail.cell, SegmentAnim::cell);
            self.ghosts.push(ShrinkGhost {
                start: old_tail.render,
                toward,
                render: old_tail.render,
                timer: 0.0,
            });
        }
    }

    fn twitch(&mut self, head: Cell, stone: Cell) {
        let toward = self
            .grid
            .pixel_delta(self.grid.to_pixel(head), self.grid.to_pixel(stone))
            .normalize_or(Vec2::NEG_Y);
        for seg in &mut self.segments {
            seg.start = seg.render;
            seg.timer = 0.0;
            seg.kind = AnimationKind::Twitch { toward };
        }
    }

    /// Advance all animations by `dt` seconds
    pub(crate) fn update(&mut self, dt: f32) {
        let (grid, config) = (self.grid, self.config);
        for seg in &mut self.segments {
            seg.advance(dt, grid, &config);
        }
        self.ghosts.retain_mut(|g| g.advance(dt, grid, &config));
        self.apple_timer += dt;
    }

    pub(crate) fn segments(&self) -> &[SegmentAnim] {
        &self.segments
    }

    pub(crate) fn ghosts(&self) -> &[ShrinkGhost] {
        &self.ghosts
    }

    pub(crate) fn config(&self) -> &AnimationConfig {
        &self.config
    }

    pub(crate) fn apple_cell(&self) -> Cell {
        self.apple
    }

    /// Linear progress of the apple's appearance, from 0 when it spawns to 1
    /// once fully grown
    pub(crate) fn apple_phase(&self) -> f32 {
        progress(self.apple_timer, self.config.appear_duration)
    }

    /// Size factor for drawing the apple
    pub(crate) fn apple_scale(&self) -> f32 {
        ease_out_quad(self.apple_phase())
    }

    /// True if no segment is mid-animation and no ghost remains
    #[cfg(test)]
    pub(crate) fn is_settled(&self) -> bool {
        self.ghosts.is_empty()
            && self
                .segments
                .iter()
                .all(|s| s.kind == AnimationKind::Idle)
    }
}
