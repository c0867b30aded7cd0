use rand::Rng;
use ratatui::style::Color;

use crate::{
    color::{rgb, to_css},
    effects::{pick, random_angle, Effect, EffectKind, EffectRng, Intensity, SpawnContext},
    engine::{Acquirer, Particle, ParticleData},
    error::Error,
    geometry::Point,
    surface::{fill_circle, DrawingContext},
};

const PALETTE: [Color; 6] = [
    rgb(0xC084FC),
    rgb(0xA78BFA),
    rgb(0x818CF8),
    rgb(0x67E8F9),
    rgb(0xF0ABFC),
    rgb(0xFFFFFF),
];

/// Orbit radius kept from one frame to the next.
const PULL: f64 = 0.955;

/// Particles spiralling into the caret.
///
/// All particles of one spawn turn in the same direction.
#[derive(Debug, Clone, Copy, Default)]
pub struct Vortex;

impl Effect for Vortex {
    fn kind(&self) -> EffectKind {
        EffectKind::Vortex
    }

    fn spawn(
        &self,
        origin: Point,
        intensity: Intensity,
        _context: Option<&SpawnContext>,
        rng: &mut EffectRng,
        acquirer: &mut Acquirer<'_>,
    ) {
        let count = intensity.scale_count(rng, 6.0, 8.0);
        let direction = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
        for _ in 0..count {
            let Some(p) = acquirer.acquire() else {
                return;
            };
            let angle = random_angle(rng);
            let distance = rng.random_range(20.0..50.0);
            let position = Point::new(
                origin.x + angle.cos() * distance,
                origin.y + angle.sin() * distance,
            );
            p.launch(position, (0.0, 0.0), rng.random_range(25..40));
            p.size = rng.random_range(2.0..5.0);
            p.color = pick(rng, &PALETTE);
            p.data = ParticleData::Vortex {
                center: origin,
                angle,
                distance,
                spin: rng.random_range(0.15..0.25) * direction,
            };
        }
    }

    fn update(&self, p: &mut Particle, _rng: &mut EffectRng) {
        let ParticleData::Vortex {
            center,
            ref mut angle,
            ref mut distance,
            spin,
        } = p.data
        else {
            return;
        };
        *angle += spin;
        *distance *= PULL;
        p.x = center.x + angle.cos() * *distance;
        p.y = center.y + angle.sin() * *distance;

        let progress = p.progress();
        p.scale = 1.0 - progress * 0.7;
        p.alpha = 1.0 - progress * progress;
    }

    fn render(&self, ctx: &mut dyn DrawingContext, p: &Particle) -> Result<(), Error> {
        let radius = p.size * p.scale;
        if radius < 0.3 {
            return Ok(());
        }
        ctx.save();
        ctx.set_fill_color(&to_css(p.color));
        ctx.set_global_alpha(p.alpha * 0.3);
        let mut result = fill_circle(ctx, p.x, p.y, radius * 2.0);
        if result.is_ok() {
            ctx.set_global_alpha(p.alpha);
            result = fill_circle(ctx, p.x, p.y, radius);
        }
        ctx.restore();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::testing::{run_to_completion, spawn_into_pool};

    fn orbit(p: &Particle) -> (Point, f64, f64) {
        match p.data {
            ParticleData::Vortex {
                center,
                distance,
                spin,
                ..
            } => (center, distance, spin),
            ref other => panic!("unexpected data {other:?}"),
        }
    }

    #[test]
    fn test_spawn_on_a_ring_with_one_direction() {
        let pool = spawn_into_pool(&Vortex, 300, 1.0, None);
        assert!(pool.active_count() >= 6);
        let sign = orbit(pool.slot(0).unwrap()).2.signum();
        for p in pool.iter_active() {
            let (center, distance, spin) = orbit(p);
            assert_eq!(center, Point::new(100.0, 100.0));
            assert!((20.0..50.0).contains(&distance));
            let actual = (p.x - center.x).hypot(p.y - center.y);
            assert!((actual - distance).abs() < 1e-9);
            assert_eq!(spin.signum(), sign);
            assert!((0.15..0.25).contains(&spin.abs()));
        }
    }

    #[test]
    fn test_particles_are_pulled_in() {
        let mut pool = spawn_into_pool(&Vortex, 300, 1.0, None);
        let before: Vec<f64> = pool.iter_active().map(|p| orbit(p).1).collect();
        let ctx = run_to_completion(&Vortex, &mut pool);
        for (p, distance) in pool.iter_active().zip(before) {
            let (center, now, _) = orbit(p);
            assert!(now < distance * 0.5);
            assert!((p.x - center.x).hypot(p.y - center.y) < distance * 0.5);
            assert!(p.scale < 0.35);
        }
        assert!(ctx.count("arc") > 0);
    }
}
