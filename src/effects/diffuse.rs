use rand::Rng;
use ratatui::style::Color;

use crate::{
    color::{rgb, to_css, to_css_rgba},
    effects::{pick, Effect, EffectKind, EffectRng, Intensity, SpawnContext},
    engine::{Acquirer, Particle, ParticleData},
    error::Error,
    geometry::Point,
    surface::{fill_circle, DrawingContext, RadialGradient},
};

const PALETTE: [Color; 5] = [
    rgb(0xA78BFA),
    rgb(0x67E8F9),
    rgb(0xFDE68A),
    rgb(0xF9A8D4),
    rgb(0xFFFFFF),
];

const START_ALPHA: f64 = 0.9;

/// Particles that leave the outline of the typed character and drift away
/// from its center.
///
/// Needs a character and its [`GlyphMask`](crate::effects::GlyphMask) in the
/// spawn context; spawns nothing otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct Diffuse;

fn start_delay(p: &Particle) -> u32 {
    match p.data {
        ParticleData::Diffuse { delay } => delay,
        _ => 0,
    }
}

impl Effect for Diffuse {
    fn kind(&self) -> EffectKind {
        EffectKind::Diffuse
    }

    fn spawn(
        &self,
        origin: Point,
        intensity: Intensity,
        context: Option<&SpawnContext>,
        rng: &mut EffectRng,
        acquirer: &mut Acquirer<'_>,
    ) {
        let Some((context, glyph)) = context
            .filter(|context| context.character.is_some())
            .and_then(|context| Some((context, context.glyph.as_ref()?)))
        else {
            return;
        };
        let edges = glyph.edges();
        if edges.is_empty() {
            return;
        }
        let limit = intensity.scale_count(rng, 12.0, 18.0);
        let count = edges.len().min(limit);
        if count == 0 {
            return;
        }
        // Spread the samples evenly along the outline.
        let stride = edges.len() as f64 / count as f64;
        let center = context.char_center(origin);
        let color = pick(rng, &PALETTE);

        for i in 0..count {
            let Some(p) = acquirer.acquire() else {
                return;
            };
            let edge = edges[((i as f64 * stride) as usize).min(edges.len() - 1)];
            let distance = edge.x.hypot(edge.y);
            let distance = if distance > 0.0 { distance } else { 1.0 };
            let speed = rng.random_range(0.5..1.5);
            p.launch(
                Point::new(center.x + edge.x, center.y + edge.y),
                (edge.x / distance * speed, edge.y / distance * speed),
                rng.random_range(30..55),
            );
            p.size = rng.random_range(2.0..5.0);
            p.alpha = START_ALPHA;
            p.color = color;
            p.data = ParticleData::Diffuse {
                delay: rng.random_range(0..4),
            };
        }
    }

    fn update(&self, p: &mut Particle, _rng: &mut EffectRng) {
        let delay = start_delay(p);
        if p.age < delay {
            return;
        }
        let span = p.lifetime.saturating_sub(delay).max(1);
        let progress = ((p.age - delay) as f64 / span as f64).min(1.0);

        p.advance();
        p.vx *= 0.97;
        p.vy *= 0.97;
        p.scale = if progress < 0.3 {
            1.0 + progress * 2.0
        } else {
            (1.0 - progress) * 1.8
        };
        p.alpha = (1.0 - progress) * (1.0 - progress) * START_ALPHA;
    }

    fn render(&self, ctx: &mut dyn DrawingContext, p: &Particle) -> Result<(), Error> {
        if p.age < start_delay(p) || p.alpha < 0.01 {
            return Ok(());
        }
        let radius = (p.size * p.scale).max(0.5);
        let core = to_css(p.color);
        let edge = to_css_rgba(p.color, 0.0);
        let stops = [(0.0, core.as_str()), (1.0, edge.as_str())];

        ctx.save();
        ctx.set_global_alpha(p.alpha);
        let result = ctx
            .set_fill_gradient(&RadialGradient::centered(p.x, p.y, radius, &stops))
            .and_then(|_| fill_circle(ctx, p.x, p.y, radius));
        ctx.restore();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::{
        testing::{run_to_completion, spawn_into_pool, typed},
        GlyphMask,
    };

    /// Context with a glyph shaped like a filled square.
    fn typed_square(lo: usize, hi: usize) -> SpawnContext {
        let side = 24;
        let alpha = (0..side * side).map(|i| {
            let (x, y) = (i % side, i / side);
            if (lo..=hi).contains(&x) && (lo..=hi).contains(&y) {
                255
            } else {
                0
            }
        });
        SpawnContext {
            glyph: Some(GlyphMask::from_alpha(side, alpha, 50)),
            ..typed('o')
        }
    }

    #[test]
    fn test_needs_character_and_glyph() {
        assert_eq!(spawn_into_pool(&Diffuse, 300, 1.0, None).active_count(), 0);
        let no_glyph = typed('o');
        assert_eq!(spawn_into_pool(&Diffuse, 300, 1.0, Some(&no_glyph)).active_count(), 0);
        let no_character = SpawnContext {
            character: None,
            ..typed_square(6, 17)
        };
        assert_eq!(spawn_into_pool(&Diffuse, 300, 1.0, Some(&no_character)).active_count(), 0);
        let blank = SpawnContext {
            glyph: Some(GlyphMask::from_alpha(24, std::iter::empty(), 50)),
            ..typed('o')
        };
        assert_eq!(spawn_into_pool(&Diffuse, 300, 1.0, Some(&blank)).active_count(), 0);
    }

    #[test]
    fn test_particles_start_on_outline_and_move_outward() {
        let context = typed_square(6, 17);
        let pool = spawn_into_pool(&Diffuse, 300, 1.0, Some(&context));
        assert!((12..30).contains(&pool.active_count()));
        let center = context.char_center(Point::new(100.0, 100.0));
        let first = pool.slot(0).unwrap().color;
        for p in pool.iter_active() {
            let (dx, dy) = (p.x - center.x, p.y - center.y);
            assert!(dx.abs() <= 6.0 && dy.abs() <= 6.0);
            assert!(dx * p.vx + dy * p.vy > 0.0);
            assert_eq!(p.alpha, START_ALPHA);
            assert_eq!(p.color, first);
            assert!(start_delay(p) < 4);
        }
    }

    #[test]
    fn test_small_outline_caps_count() {
        let context = typed_square(11, 12);
        let pool = spawn_into_pool(&Diffuse, 300, 1.0, Some(&context));
        assert_eq!(pool.active_count(), 4);
    }

    #[test]
    fn test_fades_out() {
        let context = typed_square(6, 17);
        let mut pool = spawn_into_pool(&Diffuse, 300, 1.0, Some(&context));
        let ctx = run_to_completion(&Diffuse, &mut pool);
        assert!(pool.iter_active().all(|p| p.alpha < 0.01));
        assert_eq!(ctx.count("set_fill_gradient"), ctx.count("arc"));
    }
}
