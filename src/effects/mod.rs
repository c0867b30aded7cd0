//! ## Effects
//!
//! An effect is a stateless strategy that the [`ParticleEngine`] drives
//! through three operations:
//!
//! - `spawn`: claim particles through an [`Acquirer`] and initialize them.
//! - `update`: advance one particle by one frame.
//! - `render`: draw one particle on a [`DrawingContext`].
//!
//! Effects never keep state between calls. Anything a particle needs to
//! remember lives in its [`ParticleData`] variant.
//!
//! | Effect     | Needs a character | Dark palette |
//! |------------|-------------------|--------------|
//! | `burst`    | ✗                 | ✗            |
//! | `echo`     | ✓                 | ✗            |
//! | `vortex`   | ✗                 | ✗            |
//! | `sparkle`  | ✗                 | ✓            |
//! | `firefly`  | ✗                 | ✓            |
//! | `confetti` | ✗                 | ✗            |
//! | `bubble`   | ✗                 | ✓            |
//! | `frost`    | ✗                 | ✗            |
//! | `flame`    | ✗                 | ✗            |
//! | `ripple`   | ✗                 | ✗            |
//! | `electric` | ✗                 | ✓            |
//! | `diffuse`  | ✓ (glyph mask)    | ✗            |
//!
//! [`ParticleEngine`]: crate::engine::ParticleEngine
//! [`ParticleData`]: crate::engine::ParticleData

use std::{collections::HashMap, fmt, rc::Rc, str::FromStr};

use compact_str::{format_compact, CompactString};
use rand::{rngs::SmallRng, Rng};
use ratatui::style::Color;

use crate::{
    engine::{Acquirer, Particle},
    error::Error,
    geometry::Point,
    surface::DrawingContext,
};

mod glyph;
pub use glyph::GlyphMask;

mod bubble;
mod burst;
mod confetti;
mod diffuse;
mod echo;
mod electric;
mod firefly;
mod flame;
mod frost;
mod ripple;
mod sparkle;
mod vortex;

pub use bubble::Bubble;
pub use burst::Burst;
pub use confetti::Confetti;
pub use diffuse::Diffuse;
pub use echo::Echo;
pub use electric::Electric;
pub use firefly::Firefly;
pub use flame::Flame;
pub use frost::Frost;
pub use ripple::Ripple;
pub use sparkle::Sparkle;
pub use vortex::Vortex;

/// Random number generator handed to effects.
pub type EffectRng = SmallRng;

/// A pluggable visual behavior.
pub trait Effect: fmt::Debug {
    /// The identity of the effect.
    fn kind(&self) -> EffectKind;

    /// Spawns particles around `origin`.
    ///
    /// Implementations call [`Acquirer::acquire`] once per particle and stop
    /// at the first `None`.
    fn spawn(
        &self,
        origin: Point,
        intensity: Intensity,
        context: Option<&SpawnContext>,
        rng: &mut EffectRng,
        acquirer: &mut Acquirer<'_>,
    );

    /// Advances a particle by one frame.
    fn update(&self, particle: &mut Particle, rng: &mut EffectRng);

    /// Draws a particle.
    fn render(&self, ctx: &mut dyn DrawingContext, particle: &Particle) -> Result<(), Error>;
}

/// The built-in effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EffectKind {
    /// Classic radial burst with gravity.
    #[default]
    Burst,
    /// Expanding outline of the typed character.
    Echo,
    /// Particles spiralling into the caret.
    Vortex,
    /// Twinkling four-point stars.
    Sparkle,
    /// Slowly wandering glowing lights.
    Firefly,
    /// Flipping paper pieces.
    Confetti,
    /// Translucent rising bubbles.
    Bubble,
    /// Rotating ice crystals.
    Frost,
    /// Rising, cooling flames.
    Flame,
    /// Expanding water rings.
    Ripple,
    /// Short lightning bolts.
    Electric,
    /// Particles emanating from the typed character's outline.
    Diffuse,
}

impl EffectKind {
    /// Every built-in effect, in menu order.
    pub const ALL: [EffectKind; 12] = [
        EffectKind::Burst,
        EffectKind::Echo,
        EffectKind::Vortex,
        EffectKind::Sparkle,
        EffectKind::Firefly,
        EffectKind::Confetti,
        EffectKind::Bubble,
        EffectKind::Frost,
        EffectKind::Flame,
        EffectKind::Ripple,
        EffectKind::Electric,
        EffectKind::Diffuse,
    ];

    /// The name used in settings.
    pub fn name(self) -> &'static str {
        match self {
            EffectKind::Burst => "burst",
            EffectKind::Echo => "echo",
            EffectKind::Vortex => "vortex",
            EffectKind::Sparkle => "sparkle",
            EffectKind::Firefly => "firefly",
            EffectKind::Confetti => "confetti",
            EffectKind::Bubble => "bubble",
            EffectKind::Frost => "frost",
            EffectKind::Flame => "flame",
            EffectKind::Ripple => "ripple",
            EffectKind::Electric => "electric",
            EffectKind::Diffuse => "diffuse",
        }
    }

    /// Whether the effect spawns nothing without a typed character.
    pub fn needs_character(self) -> bool {
        matches!(self, EffectKind::Echo | EffectKind::Diffuse)
    }

    /// Whether the spawn context should carry a [`GlyphMask`].
    pub fn needs_glyph_mask(self) -> bool {
        matches!(self, EffectKind::Diffuse)
    }

    /// Creates the built-in implementation of this effect.
    pub fn builtin(self) -> Rc<dyn Effect> {
        match self {
            EffectKind::Burst => Rc::new(Burst),
            EffectKind::Echo => Rc::new(Echo),
            EffectKind::Vortex => Rc::new(Vortex),
            EffectKind::Sparkle => Rc::new(Sparkle),
            EffectKind::Firefly => Rc::new(Firefly),
            EffectKind::Confetti => Rc::new(Confetti),
            EffectKind::Bubble => Rc::new(Bubble),
            EffectKind::Frost => Rc::new(Frost),
            EffectKind::Flame => Rc::new(Flame),
            EffectKind::Ripple => Rc::new(Ripple),
            EffectKind::Electric => Rc::new(Electric),
            EffectKind::Diffuse => Rc::new(Diffuse),
        }
    }
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EffectKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        EffectKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| Error::UnknownEffect(s.to_string()))
    }
}

/// Particle density multiplier in `(0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Intensity(f64);

impl Intensity {
    /// Lowest accepted intensity.
    pub const MIN: f64 = 0.1;

    /// Highest accepted intensity.
    pub const MAX: f64 = 1.0;

    /// Clamps `value` into `[MIN, MAX]`. Non-finite values fall back to the default.
    pub fn new(value: f64) -> Self {
        if value.is_finite() {
            Self(value.clamp(Self::MIN, Self::MAX))
        } else {
            Self::default()
        }
    }

    /// The raw multiplier.
    pub fn get(self) -> f64 {
        self.0
    }

    /// `floor((base + r * spread) * intensity)` for a uniform `r` in `[0, 1)`.
    pub fn scale_count(self, rng: &mut EffectRng, base: f64, spread: f64) -> usize {
        let r: f64 = rng.random();
        ((base + r * spread) * self.0).floor() as usize
    }
}

impl Default for Intensity {
    fn default() -> Self {
        Self(0.5)
    }
}

impl From<f64> for Intensity {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

/// Font of the text field a character was typed into.
#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    /// CSS `font-family`.
    pub family: CompactString,
    /// Font size in pixels.
    pub size: f64,
    /// CSS `font-weight`.
    pub weight: CompactString,
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            family: CompactString::const_new("sans-serif"),
            size: 16.0,
            weight: CompactString::const_new("400"),
        }
    }
}

impl FontSpec {
    /// CSS `font` shorthand, e.g. `400 16px sans-serif`.
    pub fn to_css(&self) -> CompactString {
        font_css(&self.weight, self.size, &self.family)
    }
}

/// Builds a CSS `font` shorthand.
pub(crate) fn font_css(weight: &str, size: f64, family: &str) -> CompactString {
    format_compact!("{weight} {size}px {family}")
}

/// Read-only data attached to a spawn request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpawnContext {
    /// The typed character.
    pub character: Option<char>,
    /// The font of the text field.
    pub font: FontSpec,
    /// Advance width of the character in pixels; the caret sits this far
    /// right of the character's left edge.
    pub char_width: f64,
    /// Whether the field sits on a dark background.
    pub dark_background: bool,
    /// Ink mask of the character, built only for effects that ask for it.
    pub glyph: Option<GlyphMask>,
}

impl SpawnContext {
    /// Center of the typed character, assuming the caret is right after it.
    pub fn char_center(&self, caret: Point) -> Point {
        Point::new(caret.x - self.char_width * 0.5, caret.y)
    }
}

/// Returns whether a spawn context asks for the dark palette.
pub(crate) fn is_dark(context: Option<&SpawnContext>) -> bool {
    context.is_some_and(|context| context.dark_background)
}

/// Picks a random entry of a palette.
pub(crate) fn pick(rng: &mut EffectRng, palette: &[Color]) -> Color {
    palette[rng.random_range(0..palette.len())]
}

/// Returns a uniform value in `[-0.5, 0.5) * span`.
pub(crate) fn jitter(rng: &mut EffectRng, span: f64) -> f64 {
    (rng.random::<f64>() - 0.5) * span
}

/// Returns a uniform angle in `[0, 2π)`.
pub(crate) fn random_angle(rng: &mut EffectRng) -> f64 {
    rng.random::<f64>() * std::f64::consts::TAU
}

/// The set of effects selectable at runtime.
///
/// Effects are registered under an [`EffectKind`] and must report that same
/// kind; lookups by name go through [`EffectKind::from_str`], so an unknown
/// name is rejected instead of silently resolving to nothing.
#[derive(Debug, Default, Clone)]
pub struct EffectRegistry {
    effects: HashMap<EffectKind, Rc<dyn Effect>>,
}

impl EffectRegistry {
    /// Constructs an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Constructs a registry holding every built-in effect.
    pub fn builtin() -> Self {
        let effects = EffectKind::ALL
            .into_iter()
            .map(|kind| (kind, kind.builtin()))
            .collect();
        Self { effects }
    }

    /// Registers `effect` under `kind`, replacing any previous entry.
    pub fn register(&mut self, kind: EffectKind, effect: Rc<dyn Effect>) -> Result<(), Error> {
        if effect.kind() != kind {
            return Err(Error::MismatchedEffect {
                expected: kind.to_string(),
                actual: effect.kind().to_string(),
            });
        }
        self.effects.insert(kind, effect);
        Ok(())
    }

    /// Returns the effect registered under `kind`.
    pub fn get(&self, kind: EffectKind) -> Option<Rc<dyn Effect>> {
        self.effects.get(&kind).cloned()
    }

    /// Resolves an effect by name.
    pub fn resolve(&self, name: &str) -> Result<Rc<dyn Effect>, Error> {
        let kind = name.parse::<EffectKind>()?;
        self.get(kind)
            .ok_or_else(|| Error::UnknownEffect(name.to_string()))
    }

    /// Number of registered effects.
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    /// Returns whether no effect is registered.
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}

/// Helpers shared by the effect unit tests.
#[cfg(test)]
pub(crate) mod testing {
    use rand::SeedableRng;

    use super::*;
    use crate::{engine::Pool, surface::testing::RecordingContext};

    /// Spawns with a fixed seed into a fresh pool and returns it.
    pub fn spawn_into_pool(
        effect: &dyn Effect,
        capacity: usize,
        intensity: f64,
        context: Option<&SpawnContext>,
    ) -> Pool {
        let mut pool = Pool::new(capacity);
        let mut rng = EffectRng::seed_from_u64(7);
        let mut acquirer = Acquirer::new(&mut pool);
        effect.spawn(
            Point::new(100.0, 100.0),
            Intensity::new(intensity),
            context,
            &mut rng,
            &mut acquirer,
        );
        pool
    }

    /// Runs every particle of the pool through its whole life, rendering
    /// each frame, and returns the recorded drawing calls.
    pub fn run_to_completion(effect: &dyn Effect, pool: &mut Pool) -> RecordingContext {
        let mut rng = EffectRng::seed_from_u64(11);
        let mut ctx = RecordingContext::default();
        for index in 0..pool.capacity() {
            let Some(particle) = pool.slot_mut(index) else {
                continue;
            };
            if !particle.is_active() {
                continue;
            }
            while particle.age < particle.lifetime {
                effect.update(particle, &mut rng);
                particle.age += 1;
                assert!(particle.alpha.is_finite(), "alpha must stay finite");
                effect.render(&mut ctx, particle).unwrap();
            }
        }
        ctx
    }

    /// A context for text-aware effects.
    pub fn typed(character: char) -> SpawnContext {
        SpawnContext {
            character: Some(character),
            char_width: 9.0,
            ..Default::default()
        }
    }
}
