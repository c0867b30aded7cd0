use rand::Rng;
use ratatui::style::Color;

use crate::{
    color::{rgb, to_css, to_css_rgba},
    effects::{jitter, Effect, EffectKind, EffectRng, Intensity, SpawnContext},
    engine::{Acquirer, Particle},
    error::Error,
    geometry::Point,
    surface::{fill_circle, DrawingContext, RadialGradient},
};

/// Colors a flame goes through as it cools, with the progress where each starts.
const COOLING: [(f64, Color); 4] = [
    (0.0, rgb(0xFFFF80)),
    (0.25, rgb(0xFFA500)),
    (0.5, rgb(0xFF4500)),
    (0.75, rgb(0x8B0000)),
];

/// Rising flames that shrink and cool from yellow to dark red.
#[derive(Debug, Clone, Copy, Default)]
pub struct Flame;

/// Returns the flame color at the given progress.
fn cooling_color(progress: f64) -> Color {
    COOLING
        .iter()
        .rev()
        .find(|(start, _)| progress >= *start)
        .map_or(COOLING[0].1, |(_, color)| *color)
}

impl Effect for Flame {
    fn kind(&self) -> EffectKind {
        EffectKind::Flame
    }

    fn spawn(
        &self,
        origin: Point,
        intensity: Intensity,
        _context: Option<&SpawnContext>,
        rng: &mut EffectRng,
        acquirer: &mut Acquirer<'_>,
    ) {
        let count = intensity.scale_count(rng, 8.0, 10.0);
        for _ in 0..count {
            let Some(p) = acquirer.acquire() else {
                return;
            };
            let position = Point::new(origin.x + jitter(rng, 14.0), origin.y);
            let velocity = (jitter(rng, 1.5), -rng.random_range(2.5..6.0));
            p.launch(position, velocity, rng.random_range(30..55));
            p.size = rng.random_range(6.0..12.0);
            p.color = cooling_color(0.0);
        }
    }

    fn update(&self, p: &mut Particle, rng: &mut EffectRng) {
        p.advance();
        p.vx += jitter(rng, 0.2);
        p.vx *= 0.95;
        p.size *= 0.97;
        let progress = p.progress();
        p.alpha = 1.0 - progress * progress;
        p.color = cooling_color(progress);
    }

    fn render(&self, ctx: &mut dyn DrawingContext, p: &Particle) -> Result<(), Error> {
        // Fade to the same hue at zero alpha; fading to transparent black
        // leaves a dark fringe.
        let core = to_css(p.color);
        let edge = to_css_rgba(p.color, 0.0);
        let stops = [(0.0, core.as_str()), (1.0, edge.as_str())];

        ctx.save();
        ctx.set_global_alpha(p.alpha);
        let result = ctx
            .set_fill_gradient(&RadialGradient::centered(p.x, p.y, p.size, &stops))
            .and_then(|_| fill_circle(ctx, p.x, p.y, p.size));
        ctx.restore();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::testing::{run_to_completion, spawn_into_pool};

    #[test]
    fn test_cooling_color() {
        assert_eq!(cooling_color(0.0), rgb(0xFFFF80));
        assert_eq!(cooling_color(0.24), rgb(0xFFFF80));
        assert_eq!(cooling_color(0.25), rgb(0xFFA500));
        assert_eq!(cooling_color(0.6), rgb(0xFF4500));
        assert_eq!(cooling_color(0.99), rgb(0x8B0000));
    }

    #[test]
    fn test_flames_rise_and_shrink() {
        let mut pool = spawn_into_pool(&Flame, 300, 1.0, None);
        assert!(pool.active_count() >= 8);
        let before: Vec<(f64, f64)> = pool.iter_active().map(|p| (p.y, p.size)).collect();
        let ctx = run_to_completion(&Flame, &mut pool);
        for (p, (y, size)) in pool.iter_active().zip(before) {
            assert!(p.y < y);
            assert!(p.size < size);
        }
        assert_eq!(ctx.count("set_fill_gradient"), ctx.count("arc"));
    }
}
