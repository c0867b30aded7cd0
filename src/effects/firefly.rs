use rand::Rng;
use ratatui::style::Color;

use crate::{
    color::{rgb, to_css, to_css_rgba},
    effects::{
        is_dark, jitter, pick, random_angle, Effect, EffectKind, EffectRng, Intensity,
        SpawnContext,
    },
    engine::{Acquirer, Particle, ParticleData},
    error::Error,
    geometry::Point,
    surface::{fill_circle, DrawingContext, RadialGradient},
};

const PALETTE_DARK: [Color; 5] = [
    rgb(0xFBBF24),
    rgb(0xA3E635),
    rgb(0xBEF264),
    rgb(0xFDE68A),
    rgb(0xD9F99D),
];
const PALETTE_LIGHT: [Color; 5] = [
    rgb(0xB45309),
    rgb(0x15803D),
    rgb(0x4D7C0F),
    rgb(0x92400E),
    rgb(0x166534),
];

const FADE_IN_UNTIL: f64 = 0.15;
const FADE_OUT_FROM: f64 = 0.7;

/// Slow glowing lights that wander around the caret and flicker.
#[derive(Debug, Clone, Copy, Default)]
pub struct Firefly;

/// Opacity envelope over the lifetime: ramps in, holds, ramps out.
fn envelope(progress: f64) -> f64 {
    if progress < FADE_IN_UNTIL {
        progress / FADE_IN_UNTIL
    } else if progress > FADE_OUT_FROM {
        (1.0 - progress) / (1.0 - FADE_OUT_FROM)
    } else {
        1.0
    }
}

impl Effect for Firefly {
    fn kind(&self) -> EffectKind {
        EffectKind::Firefly
    }

    fn spawn(
        &self,
        origin: Point,
        intensity: Intensity,
        context: Option<&SpawnContext>,
        rng: &mut EffectRng,
        acquirer: &mut Acquirer<'_>,
    ) {
        let count = intensity.scale_count(rng, 4.0, 6.0);
        let dark = is_dark(context);
        let palette = if dark { &PALETTE_DARK } else { &PALETTE_LIGHT };
        for _ in 0..count {
            let Some(p) = acquirer.acquire() else {
                return;
            };
            let angle = random_angle(rng);
            let speed = rng.random_range(0.3..1.1);
            let position = Point::new(origin.x + jitter(rng, 16.0), origin.y + jitter(rng, 16.0));
            p.launch(
                position,
                (angle.cos() * speed, angle.sin() * speed - 0.3),
                rng.random_range(40..70),
            );
            p.size = rng.random_range(2.0..4.0);
            p.color = pick(rng, palette);
            p.data = ParticleData::Firefly {
                phase: random_angle(rng),
                flicker_speed: rng.random_range(0.15..0.3),
                wander_phase: random_angle(rng),
                dark,
            };
        }
    }

    fn update(&self, p: &mut Particle, _rng: &mut EffectRng) {
        let ParticleData::Firefly {
            phase,
            flicker_speed,
            wander_phase,
            ..
        } = p.data
        else {
            return;
        };
        let age = p.age as f64;
        p.vx += (age * 0.07 + wander_phase).sin() * 0.04;
        p.vy += (age * 0.09 + wander_phase).cos() * 0.03;
        p.vx *= 0.97;
        p.vy *= 0.97;
        p.advance();

        let flicker = 0.5 + 0.5 * (age * flicker_speed + phase).sin();
        p.alpha = flicker * envelope(p.progress());
    }

    fn render(&self, ctx: &mut dyn DrawingContext, p: &Particle) -> Result<(), Error> {
        if p.alpha <= 0.01 {
            return Ok(());
        }
        let dark = matches!(p.data, ParticleData::Firefly { dark: true, .. });
        let radius = p.size;
        let inner = to_css_rgba(p.color, 0.4);
        let outer = to_css_rgba(p.color, 0.0);
        let stops = [(0.0, inner.as_str()), (1.0, outer.as_str())];
        let core = if dark {
            to_css(Color::White)
        } else {
            to_css(p.color)
        };

        ctx.save();
        ctx.set_global_alpha(p.alpha);
        let mut result = ctx
            .set_fill_gradient(&RadialGradient::centered(p.x, p.y, radius * 3.0, &stops))
            .and_then(|_| fill_circle(ctx, p.x, p.y, radius * 3.0));
        if result.is_ok() {
            ctx.set_global_alpha((p.alpha * 1.5).min(1.0));
            ctx.set_fill_color(&core);
            result = fill_circle(ctx, p.x, p.y, radius * 0.6);
        }
        ctx.restore();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::testing::{run_to_completion, spawn_into_pool};

    #[test]
    fn test_envelope() {
        assert_eq!(envelope(0.0), 0.0);
        assert!((envelope(0.075) - 0.5).abs() < 1e-9);
        assert_eq!(envelope(0.5), 1.0);
        assert!((envelope(0.85) - 0.5).abs() < 1e-9);
        assert!(envelope(1.0).abs() < 1e-9);
    }

    #[test]
    fn test_remembers_background() {
        let dark = SpawnContext {
            dark_background: true,
            ..Default::default()
        };
        let pool = spawn_into_pool(&Firefly, 300, 1.0, Some(&dark));
        assert!(pool.active_count() >= 4);
        for p in pool.iter_active() {
            assert!(matches!(p.data, ParticleData::Firefly { dark: true, .. }));
            assert!(PALETTE_DARK.contains(&p.color));
            assert!((40..70).contains(&p.lifetime));
        }
    }

    #[test]
    fn test_flicker_is_bounded() {
        let mut pool = spawn_into_pool(&Firefly, 300, 1.0, None);
        let ctx = run_to_completion(&Firefly, &mut pool);
        for p in pool.iter_active() {
            assert!((0.0..=1.0).contains(&p.alpha));
        }
        assert!(ctx.count("set_fill_gradient") > 0);
    }
}
