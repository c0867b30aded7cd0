use rand::Rng;
use ratatui::style::Color;

use crate::{
    color::{rgb, to_css},
    effects::{Effect, EffectKind, EffectRng, Intensity, SpawnContext},
    engine::{Acquirer, Particle, ParticleData},
    error::Error,
    geometry::Point,
    surface::{DrawingContext, FULL_CIRCLE},
};

const CYAN: Color = rgb(0x67E8F9);
const SKY: Color = rgb(0x38BDF8);
const BLUE: Color = rgb(0x3B82F6);

/// Concentric rings expanding from the caret, started one after another.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ripple;

fn ring_delay(p: &Particle) -> u32 {
    match p.data {
        ParticleData::Ripple { delay, .. } => delay,
        _ => 0,
    }
}

/// Progress over the part of the lifetime after the delay.
fn visible_progress(p: &Particle) -> f64 {
    let delay = ring_delay(p);
    let span = p.lifetime.saturating_sub(delay).max(1);
    (p.age.saturating_sub(delay) as f64 / span as f64).min(1.0)
}

impl Effect for Ripple {
    fn kind(&self) -> EffectKind {
        EffectKind::Ripple
    }

    fn spawn(
        &self,
        origin: Point,
        intensity: Intensity,
        _context: Option<&SpawnContext>,
        rng: &mut EffectRng,
        acquirer: &mut Acquirer<'_>,
    ) {
        let count = intensity.scale_count(rng, 2.0, 2.0);
        for i in 0..count {
            let Some(p) = acquirer.acquire() else {
                return;
            };
            p.launch(origin, (0.0, 0.0), rng.random_range(25..40));
            p.size = 2.0 + i as f64 * 3.0;
            p.color = CYAN;
            p.data = ParticleData::Ripple {
                expand_speed: rng.random_range(1.2..2.0),
                delay: i as u32 * 4,
            };
        }
    }

    fn update(&self, p: &mut Particle, _rng: &mut EffectRng) {
        let ParticleData::Ripple {
            expand_speed,
            delay,
        } = p.data
        else {
            return;
        };
        if p.age < delay {
            p.alpha = 0.0;
            return;
        }
        let progress = visible_progress(p);
        p.size += expand_speed;
        p.alpha = 1.0 - progress * progress;
        p.color = match progress {
            t if t < 0.3 => CYAN,
            t if t < 0.6 => SKY,
            _ => BLUE,
        };
    }

    fn render(&self, ctx: &mut dyn DrawingContext, p: &Particle) -> Result<(), Error> {
        if p.alpha <= 0.0 {
            return Ok(());
        }
        let width = (2.0 - visible_progress(p) * 1.5).max(0.5);

        ctx.save();
        ctx.set_global_alpha(p.alpha);
        ctx.set_stroke_color(&to_css(p.color));
        ctx.set_line_width(width);
        ctx.begin_path();
        let result = ctx.arc(p.x, p.y, p.size, 0.0, FULL_CIRCLE);
        if result.is_ok() {
            ctx.stroke();
        }
        ctx.restore();
        result
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;
    use crate::effects::testing::{run_to_completion, spawn_into_pool};

    #[test]
    fn test_rings_are_staggered() {
        let pool = spawn_into_pool(&Ripple, 300, 1.0, None);
        assert!((2..4).contains(&pool.active_count()));
        for (i, p) in pool.iter_active().enumerate() {
            assert_eq!(p.size, 2.0 + i as f64 * 3.0);
            assert_eq!(ring_delay(p), i as u32 * 4);
            assert_eq!((p.x, p.y), (100.0, 100.0));
        }
    }

    #[test]
    fn test_delayed_ring_is_invisible() {
        let mut p = Particle {
            lifetime: 30,
            size: 5.0,
            data: ParticleData::Ripple {
                expand_speed: 1.5,
                delay: 4,
            },
            ..Default::default()
        };
        let mut rng = EffectRng::seed_from_u64(0);
        Ripple.update(&mut p, &mut rng);
        assert_eq!(p.alpha, 0.0);
        assert_eq!(p.size, 5.0);

        let mut ctx = crate::surface::testing::RecordingContext::default();
        Ripple.render(&mut ctx, &p).unwrap();
        assert!(ctx.calls.is_empty());

        p.age = 4;
        Ripple.update(&mut p, &mut rng);
        assert_eq!(p.alpha, 1.0);
        assert_eq!(p.size, 6.5);
    }

    #[test]
    fn test_rings_expand_and_cool() {
        let mut pool = spawn_into_pool(&Ripple, 300, 1.0, None);
        let sizes: Vec<f64> = pool.iter_active().map(|p| p.size).collect();
        let ctx = run_to_completion(&Ripple, &mut pool);
        for (p, size) in pool.iter_active().zip(sizes) {
            assert!(p.size > size);
            assert_eq!(p.color, BLUE);
        }
        assert_eq!(ctx.count("arc"), ctx.count("stroke"));
    }
}
