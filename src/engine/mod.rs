//! ## Particle engine
//!
//! [`ParticleEngine`] owns a fixed [`Pool`] of particles and runs them through
//! the current [`Effect`] one frame at a time:
//!
//! ```text
//!          spawn (particles appear)                 tick (pool empty)
//!   Idle ───────────────────────────▶ Running ─────────────────────────▶ Idle
//!                                       │  ▲
//!                                       └──┘ tick (particles left)
//! ```
//!
//! The engine does not own a timer. It asks its [`FrameScheduler`] for a frame
//! when it starts running and after every tick that leaves particles alive;
//! the host calls [`ParticleEngine::tick`] when that frame fires. In the
//! browser, [`AnimationFrameScheduler`] does this with
//! `requestAnimationFrame`. In tests, [`ManualScheduler`] lets the test call
//! `tick` itself.

use std::rc::Rc;

use rand::SeedableRng;

use crate::{
    effects::{Effect, EffectKind, EffectRng, Intensity, SpawnContext},
    geometry::Point,
    surface::Surface,
};

mod particle;
mod pool;
mod scheduler;

pub use particle::{ArcPath, Particle, ParticleData, MAX_ARC_POINTS};
pub use pool::{Acquirer, Pool, DEFAULT_POOL_SIZE};
pub use scheduler::{AnimationFrameScheduler, FrameScheduler, ManualScheduler};

/// Seed used until [`ParticleEngine::with_seed`] is called.
const DEFAULT_SEED: u64 = 0x7970_6172_7469_636c;

/// Whether the frame loop is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopState {
    /// No frame is pending and the surface is hidden.
    #[default]
    Idle,
    /// A frame is pending.
    Running,
}

/// Drives particles of the current effect on a [`Surface`].
#[derive(Debug)]
pub struct ParticleEngine<S, F> {
    /// Drawing layer.
    surface: S,
    /// Frame source.
    scheduler: F,
    /// Particle storage, allocated by [`ParticleEngine::initialize`].
    pool: Option<Pool>,
    /// Current effect.
    effect: Option<Rc<dyn Effect>>,
    /// Randomness handed to effects.
    rng: EffectRng,
    /// Frame loop state.
    state: LoopState,
}

impl<S: Surface, F: FrameScheduler> ParticleEngine<S, F> {
    /// Constructs an engine without a pool or an effect.
    pub fn new(surface: S, scheduler: F) -> Self {
        Self {
            surface,
            scheduler,
            pool: None,
            effect: None,
            rng: EffectRng::seed_from_u64(DEFAULT_SEED),
            state: LoopState::Idle,
        }
    }

    /// Reseeds the random number generator handed to effects.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = EffectRng::seed_from_u64(seed);
        self
    }

    /// Allocates a pool of `pool_size` particles.
    ///
    /// A size of zero selects [`DEFAULT_POOL_SIZE`]. Does nothing if a pool
    /// already exists; call [`ParticleEngine::teardown`] first to resize.
    pub fn initialize(&mut self, pool_size: usize) {
        if self.pool.is_some() {
            log::debug!("particle pool already initialized");
            return;
        }
        let capacity = if pool_size == 0 {
            DEFAULT_POOL_SIZE
        } else {
            pool_size
        };
        log::debug!("allocating {capacity} particles");
        self.pool = Some(Pool::new(capacity));
        self.surface.resize();
    }

    /// Clears the engine and drops the pool.
    pub fn teardown(&mut self) {
        self.clear();
        self.pool = None;
    }

    /// Replaces the current effect.
    ///
    /// Particles already in flight are updated and drawn by the new effect
    /// from the next tick on.
    pub fn set_effect(&mut self, effect: Rc<dyn Effect>) {
        log::debug!("effect set to {}", effect.kind());
        self.effect = Some(effect);
    }

    /// Returns the current effect.
    pub fn effect(&self) -> Option<&Rc<dyn Effect>> {
        self.effect.as_ref()
    }

    /// Returns the kind of the current effect.
    pub fn effect_kind(&self) -> Option<EffectKind> {
        self.effect.as_ref().map(|effect| effect.kind())
    }

    /// Spawns particles of the current effect at `origin`.
    ///
    /// Returns the number of particles claimed. Spawns beyond the pool's
    /// capacity are truncated silently. Starts the frame loop if it was idle.
    pub fn spawn(
        &mut self,
        origin: Point,
        intensity: Intensity,
        context: Option<&SpawnContext>,
    ) -> usize {
        let Some(effect) = self.effect.as_ref() else {
            return 0;
        };
        let Some(pool) = self.pool.as_mut() else {
            log::trace!("spawn before the pool was initialized");
            return 0;
        };

        let mut acquirer = Acquirer::new(pool);
        effect.spawn(origin, intensity, context, &mut self.rng, &mut acquirer);
        let acquired = acquirer.acquired();
        if acquirer.is_exhausted() {
            log::trace!("particle pool exhausted after {acquired} particles");
        }

        if !pool.is_empty() && !self.scheduler.is_pending() {
            self.schedule();
        }
        acquired
    }

    /// Advances the simulation by one frame and draws it.
    ///
    /// Does nothing while idle.
    pub fn tick(&mut self) {
        self.scheduler.frame_delivered();
        if self.state == LoopState::Idle {
            return;
        }
        let Some(pool) = self.pool.as_mut().filter(|pool| !pool.is_empty()) else {
            self.stop();
            return;
        };

        self.surface.show();
        self.surface.clear();

        let effect = self.effect.as_ref();
        let mut context = self.surface.drawing_context();
        for index in 0..pool.capacity() {
            let Some(particle) = pool.slot_mut(index) else {
                break;
            };
            if !particle.is_active() {
                continue;
            }
            if let Some(effect) = effect {
                effect.update(particle, &mut self.rng);
            }
            particle.age += 1;
            if particle.age >= particle.lifetime {
                pool.release(index);
                continue;
            }
            let (Some(effect), Some(ctx)) = (effect, context.as_deref_mut()) else {
                continue;
            };
            if let Err(err) = effect.render(ctx, particle) {
                log::trace!("skipped particle {index}: {err}");
            }
        }

        if pool.is_empty() {
            self.stop();
        } else {
            self.schedule();
        }
    }

    /// Requests the next frame and enters `Running` only if the request took.
    ///
    /// A refused request leaves the engine `Idle` with its particles in
    /// place; the next spawn asks again.
    fn schedule(&mut self) {
        self.scheduler.request_frame();
        if self.scheduler.is_pending() {
            self.state = LoopState::Running;
        } else {
            log::warn!("frame request refused, animation paused until the next spawn");
            self.state = LoopState::Idle;
        }
    }

    /// Retires every particle and stops the frame loop.
    pub fn clear(&mut self) {
        if let Some(pool) = self.pool.as_mut() {
            pool.clear();
        }
        self.stop();
    }

    /// Cancels the pending frame and hides the surface.
    fn stop(&mut self) {
        self.scheduler.cancel_frame();
        self.surface.clear();
        self.surface.hide();
        if self.state == LoopState::Running {
            log::trace!("frame loop stopped");
        }
        self.state = LoopState::Idle;
    }

    /// Number of live particles.
    pub fn active_count(&self) -> usize {
        self.pool.as_ref().map_or(0, Pool::active_count)
    }

    /// Number of particle slots, or zero before [`ParticleEngine::initialize`].
    pub fn capacity(&self) -> usize {
        self.pool.as_ref().map_or(0, Pool::capacity)
    }

    /// Iterates over the live particles in slot order.
    pub fn particles(&self) -> impl Iterator<Item = &Particle> {
        self.pool.iter().flat_map(Pool::iter_active)
    }

    /// Returns the frame loop state.
    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Returns the surface.
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Returns the surface mutably.
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Returns the scheduler.
    pub fn scheduler(&self) -> &F {
        &self.scheduler
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        effects::Burst,
        error::Error,
        surface::{testing::RecordingSurface, DrawingContext},
    };

    type TestEngine = ParticleEngine<RecordingSurface, ManualScheduler>;

    /// Spawns `count` motionless particles living `lifetime` frames.
    ///
    /// Draws with `fill` when `filled`, with `stroke` otherwise, so tests can
    /// tell which effect drew a frame.
    #[derive(Debug)]
    struct Fixed {
        count: usize,
        lifetime: u32,
        filled: bool,
    }

    impl Fixed {
        fn new(count: usize, lifetime: u32) -> Rc<Self> {
            Rc::new(Self {
                count,
                lifetime,
                filled: true,
            })
        }
    }

    impl Effect for Fixed {
        fn kind(&self) -> EffectKind {
            EffectKind::Burst
        }

        fn spawn(
            &self,
            origin: Point,
            _intensity: Intensity,
            _context: Option<&SpawnContext>,
            _rng: &mut EffectRng,
            acquirer: &mut Acquirer<'_>,
        ) {
            for _ in 0..self.count {
                let Some(p) = acquirer.acquire() else {
                    return;
                };
                p.launch(origin, (1.0, 0.0), self.lifetime);
            }
        }

        fn update(&self, p: &mut Particle, _rng: &mut EffectRng) {
            p.advance();
        }

        fn render(&self, ctx: &mut dyn DrawingContext, _p: &Particle) -> Result<(), Error> {
            if self.filled {
                ctx.fill();
            } else {
                ctx.stroke();
            }
            Ok(())
        }
    }

    /// Fails to draw every particle.
    #[derive(Debug)]
    struct Broken;

    impl Effect for Broken {
        fn kind(&self) -> EffectKind {
            EffectKind::Burst
        }

        fn spawn(
            &self,
            origin: Point,
            _intensity: Intensity,
            _context: Option<&SpawnContext>,
            _rng: &mut EffectRng,
            acquirer: &mut Acquirer<'_>,
        ) {
            while let Some(p) = acquirer.acquire() {
                p.launch(origin, (0.0, 0.0), 5);
            }
        }

        fn update(&self, _p: &mut Particle, _rng: &mut EffectRng) {}

        fn render(&self, _ctx: &mut dyn DrawingContext, _p: &Particle) -> Result<(), Error> {
            Err(Error::JsValue("InvalidStateError".into()))
        }
    }

    fn engine(capacity: usize) -> TestEngine {
        let mut engine = ParticleEngine::new(RecordingSurface::default(), ManualScheduler::new());
        engine.initialize(capacity);
        engine
    }

    fn spawn_once(engine: &mut TestEngine) -> usize {
        engine.spawn(Point::new(10.0, 10.0), Intensity::new(1.0), None)
    }

    #[test]
    fn test_spawn_without_effect_does_nothing() {
        let mut engine = engine(10);
        assert_eq!(spawn_once(&mut engine), 0);
        assert_eq!(engine.state(), LoopState::Idle);
        assert_eq!(engine.scheduler().requests(), 0);
    }

    #[test]
    fn test_spawn_starts_the_loop_once() {
        let mut engine = engine(10);
        engine.set_effect(Fixed::new(2, 10));
        assert_eq!(spawn_once(&mut engine), 2);
        assert_eq!(spawn_once(&mut engine), 2);
        assert_eq!(engine.state(), LoopState::Running);
        assert!(engine.scheduler().is_pending());
        assert_eq!(engine.scheduler().requests(), 1);
    }

    #[test]
    fn test_active_count_never_exceeds_capacity() {
        let mut engine = engine(DEFAULT_POOL_SIZE);
        engine.set_effect(Fixed::new(1, 100));
        for _ in 0..DEFAULT_POOL_SIZE + 1 {
            spawn_once(&mut engine);
        }
        assert_eq!(engine.active_count(), DEFAULT_POOL_SIZE);

        engine.set_effect(Rc::new(Burst));
        assert_eq!(spawn_once(&mut engine), 0);
        assert_eq!(engine.active_count(), engine.capacity());
    }

    #[test]
    fn test_retirement_at_lifetime() {
        let mut engine = engine(10);
        engine.set_effect(Fixed::new(1, 3));
        spawn_once(&mut engine);

        engine.tick();
        engine.tick();
        let particle = engine.particles().next().unwrap();
        assert_eq!(particle.age, 2);
        assert_eq!(particle.x, 12.0);
        assert_eq!(engine.state(), LoopState::Running);
        assert!(engine.surface().visible);

        engine.tick();
        assert_eq!(engine.active_count(), 0);
        assert_eq!(engine.state(), LoopState::Idle);
        assert!(!engine.surface().visible);
        assert!(!engine.scheduler().is_pending());
        // The retiring tick does not draw.
        assert_eq!(engine.surface().context.count("fill"), 2);
    }

    #[test]
    fn test_ticks_draw_in_slot_order_and_rerequest() {
        let mut engine = engine(10);
        engine.set_effect(Fixed::new(3, 10));
        spawn_once(&mut engine);
        engine.tick();
        assert_eq!(engine.surface().context.count("fill"), 3);
        assert_eq!(engine.surface().clears, 1);
        assert!(engine.scheduler().is_pending());
        assert_eq!(engine.scheduler().requests(), 2);
    }

    #[test]
    fn test_clear_stops_everything() {
        let mut engine = engine(10);
        engine.set_effect(Fixed::new(4, 10));
        spawn_once(&mut engine);
        engine.tick();

        engine.clear();
        assert_eq!(engine.active_count(), 0);
        assert_eq!(engine.state(), LoopState::Idle);
        assert!(!engine.surface().visible);
        assert_eq!(engine.scheduler().cancellations(), 1);

        let clears = engine.surface().clears;
        engine.tick();
        assert_eq!(engine.surface().clears, clears);
        assert_eq!(engine.state(), LoopState::Idle);
        assert!(!engine.scheduler().is_pending());
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let mut engine = engine(10);
        engine.set_effect(Fixed::new(3, 10));
        spawn_once(&mut engine);
        engine.initialize(10);
        engine.initialize(50);
        assert_eq!(engine.capacity(), 10);
        assert_eq!(engine.active_count(), 3);

        engine.teardown();
        assert_eq!(engine.capacity(), 0);
        assert_eq!(spawn_once(&mut engine), 0);
        engine.initialize(0);
        assert_eq!(engine.capacity(), DEFAULT_POOL_SIZE);
        assert_eq!(engine.active_count(), 0);
    }

    #[test]
    fn test_burst_count_and_drain() {
        let seed = 42;
        let expected = Intensity::new(1.0).scale_count(&mut EffectRng::seed_from_u64(seed), 6.0, 10.0);

        let mut engine = engine(DEFAULT_POOL_SIZE).with_seed(seed);
        engine.set_effect(Rc::new(Burst));
        assert_eq!(spawn_once(&mut engine), expected);
        assert_eq!(engine.active_count(), expected);
        assert!((6..16).contains(&expected));

        let longest = engine.particles().map(|p| p.lifetime).max().unwrap();
        for _ in 0..longest {
            assert!(engine.scheduler().is_pending());
            engine.tick();
        }
        assert_eq!(engine.active_count(), 0);
        assert_eq!(engine.state(), LoopState::Idle);
    }

    #[test]
    fn test_effect_swap_mid_animation() {
        let mut engine = engine(10);
        engine.set_effect(Fixed::new(2, 10));
        spawn_once(&mut engine);
        engine.tick();
        assert_eq!(engine.surface().context.count("fill"), 2);

        engine.set_effect(Rc::new(Fixed {
            count: 1,
            lifetime: 10,
            filled: false,
        }));
        engine.tick();
        assert_eq!(engine.surface().context.count("fill"), 2);
        assert_eq!(engine.surface().context.count("stroke"), 2);
        assert_eq!(engine.state(), LoopState::Running);
        assert!(engine.particles().all(|p| p.age == 2));
    }

    #[test]
    fn test_detached_surface_still_ages() {
        let mut engine = engine(10);
        engine.surface_mut().detached = true;
        engine.set_effect(Fixed::new(2, 3));
        spawn_once(&mut engine);
        engine.tick();
        engine.tick();
        assert!(engine.particles().all(|p| p.age == 2));
        assert!(engine.surface().context.calls.is_empty());

        engine.tick();
        assert_eq!(engine.active_count(), 0);
        assert_eq!(engine.state(), LoopState::Idle);
    }

    #[test]
    fn test_render_errors_are_skipped() {
        let mut engine = engine(4);
        engine.set_effect(Rc::new(Broken));
        assert_eq!(spawn_once(&mut engine), 4);
        for _ in 0..5 {
            engine.tick();
        }
        assert_eq!(engine.active_count(), 0);
        assert_eq!(engine.state(), LoopState::Idle);
    }

    /// Refuses the first `refusals` frame requests.
    #[derive(Debug, Default)]
    struct Refusing {
        refusals: usize,
        inner: ManualScheduler,
    }

    impl FrameScheduler for Refusing {
        fn request_frame(&mut self) {
            if self.refusals > 0 {
                self.refusals -= 1;
            } else {
                self.inner.request_frame();
            }
        }

        fn cancel_frame(&mut self) {
            self.inner.cancel_frame();
        }

        fn frame_delivered(&mut self) {
            self.inner.frame_delivered();
        }

        fn is_pending(&self) -> bool {
            self.inner.is_pending()
        }
    }

    fn refusing_engine(refusals: usize) -> ParticleEngine<RecordingSurface, Refusing> {
        let scheduler = Refusing {
            refusals,
            ..Default::default()
        };
        let mut engine = ParticleEngine::new(RecordingSurface::default(), scheduler);
        engine.initialize(40);
        engine.set_effect(Rc::new(Burst));
        engine
    }

    #[test]
    fn test_refused_request_is_retried_on_next_spawn() {
        let mut engine = refusing_engine(1);
        let origin = Point::new(10.0, 10.0);
        assert!(engine.spawn(origin, Intensity::new(1.0), None) > 0);
        assert_eq!(engine.state(), LoopState::Idle);
        assert!(!engine.scheduler().is_pending());

        engine.spawn(origin, Intensity::new(1.0), None);
        assert_eq!(engine.state(), LoopState::Running);
        assert!(engine.scheduler().is_pending());
        assert_eq!(engine.scheduler().inner.requests(), 1);

        while engine.scheduler().is_pending() {
            engine.tick();
        }
        assert_eq!(engine.active_count(), 0);
        assert_eq!(engine.state(), LoopState::Idle);
    }

    #[test]
    fn test_refused_rerequest_pauses_until_next_spawn() {
        let mut engine = refusing_engine(0);
        let origin = Point::new(10.0, 10.0);
        engine.spawn(origin, Intensity::new(1.0), None);
        engine.scheduler.refusals = 1;
        engine.tick();
        assert_eq!(engine.state(), LoopState::Idle);
        assert!(!engine.scheduler().is_pending());
        let active = engine.active_count();
        assert!(active > 0);

        engine.tick();
        assert_eq!(engine.active_count(), active);

        engine.spawn(origin, Intensity::new(0.1), None);
        assert_eq!(engine.state(), LoopState::Running);
        assert!(engine.scheduler().is_pending());
    }
}
