use rand::Rng;
use ratatui::style::Color;

use crate::{
    color::{rgb, to_css},
    effects::{pick, random_angle, Effect, EffectKind, EffectRng, Intensity, SpawnContext},
    engine::{Acquirer, Particle},
    error::Error,
    geometry::Point,
    surface::{fill_circle, DrawingContext},
};

const PALETTE: [Color; 4] = [rgb(0xFFD700), rgb(0xFF8C00), rgb(0xFFFFFF), rgb(0x87CEEB)];

/// Downward acceleration in pixels per frame².
const GRAVITY: f64 = 0.1;

/// Velocity kept from one frame to the next.
const FRICTION: f64 = 0.98;

/// Classic particle burst.
///
/// Round sparks fly out in every direction, fall under gravity and fade
/// linearly over their lifetime.
#[derive(Debug, Clone, Copy, Default)]
pub struct Burst;

impl Effect for Burst {
    fn kind(&self) -> EffectKind {
        EffectKind::Burst
    }

    fn spawn(
        &self,
        origin: Point,
        intensity: Intensity,
        _context: Option<&SpawnContext>,
        rng: &mut EffectRng,
        acquirer: &mut Acquirer<'_>,
    ) {
        let count = intensity.scale_count(rng, 6.0, 10.0);
        for _ in 0..count {
            let Some(p) = acquirer.acquire() else {
                return;
            };
            let angle = random_angle(rng);
            let speed = rng.random_range(2.0..7.0);
            p.launch(
                origin,
                (angle.cos() * speed, angle.sin() * speed),
                rng.random_range(25..50),
            );
            p.size = rng.random_range(3.0..8.0);
            p.color = pick(rng, &PALETTE);
        }
    }

    fn update(&self, p: &mut Particle, _rng: &mut EffectRng) {
        p.advance();
        p.vy += GRAVITY;
        p.vx *= FRICTION;
        p.vy *= FRICTION;
        p.alpha = 1.0 - p.progress();
    }

    fn render(&self, ctx: &mut dyn DrawingContext, p: &Particle) -> Result<(), Error> {
        ctx.save();
        ctx.set_global_alpha(p.alpha);
        ctx.set_fill_color(&to_css(p.color));
        let result = fill_circle(ctx, p.x, p.y, p.size * p.scale);
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
    fn test_spawn_count_and_ranges() {
        let pool = spawn_into_pool(&Burst, 300, 1.0, None);
        let count = pool.active_count();
        assert!((6..16).contains(&count), "unexpected count {count}");
        for p in pool.iter_active() {
            assert_eq!((p.x, p.y), (100.0, 100.0));
            assert!((25..50).contains(&p.lifetime));
            assert!((3.0..8.0).contains(&p.size));
            let speed = p.vx.hypot(p.vy);
            assert!((2.0 - 1e-9..7.0).contains(&speed));
            assert!(PALETTE.contains(&p.color));
        }
    }

    #[test]
    fn test_spawn_respects_capacity() {
        let pool = spawn_into_pool(&Burst, 2, 1.0, None);
        assert_eq!(pool.active_count(), 2);
    }

    #[test]
    fn test_update_applies_gravity_and_fades() {
        let mut p = Particle {
            vx: 1.0,
            vy: 0.0,
            lifetime: 10,
            age: 5,
            ..Default::default()
        };
        Burst.update(&mut p, &mut EffectRng::seed_from_u64(0));
        assert_eq!(p.x, 1.0);
        assert!((p.vy - GRAVITY * FRICTION).abs() < 1e-12);
        assert!((p.vx - FRICTION).abs() < 1e-12);
        assert_eq!(p.alpha, 0.5);
    }

    #[test]
    fn test_render_draws_one_circle_per_frame() {
        let mut pool = spawn_into_pool(&Burst, 1, 1.0, None);
        let lifetime = pool.slot(0).unwrap().lifetime as usize;
        let ctx = run_to_completion(&Burst, &mut pool);
        assert_eq!(ctx.count("arc"), lifetime);
        assert_eq!(ctx.count("save"), ctx.count("restore"));
    }
}
