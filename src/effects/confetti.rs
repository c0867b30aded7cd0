use rand::Rng;
use ratatui::style::Color;

use crate::{
    color::{rgb, to_css},
    effects::{
        jitter, pick, random_angle, Effect, EffectKind, EffectRng, Intensity, SpawnContext,
    },
    engine::{Acquirer, Particle, ParticleData},
    error::Error,
    geometry::Point,
    surface::DrawingContext,
};

const PALETTE: [Color; 8] = [
    rgb(0xFF6B6B),
    rgb(0xFFD93D),
    rgb(0x6BCB77),
    rgb(0x4D96FF),
    rgb(0xFF6BD6),
    rgb(0x845EC2),
    rgb(0xFF9671),
    rgb(0x00C9A7),
];

const GRAVITY: f64 = 0.15;

/// Paper rectangles thrown upwards that flutter and flip while falling.
#[derive(Debug, Clone, Copy, Default)]
pub struct Confetti;

impl Effect for Confetti {
    fn kind(&self) -> EffectKind {
        EffectKind::Confetti
    }

    fn spawn(
        &self,
        origin: Point,
        intensity: Intensity,
        _context: Option<&SpawnContext>,
        rng: &mut EffectRng,
        acquirer: &mut Acquirer<'_>,
    ) {
        let count = intensity.scale_count(rng, 5.0, 8.0);
        for _ in 0..count {
            let Some(p) = acquirer.acquire() else {
                return;
            };
            let width = rng.random_range(3.0..7.0);
            let velocity = (jitter(rng, 5.0), -rng.random_range(3.0..7.0));
            p.launch(origin, velocity, rng.random_range(35..55));
            p.size = width;
            p.color = pick(rng, &PALETTE);
            p.rotation = random_angle(rng);
            p.rotation_speed = jitter(rng, 0.3);
            p.data = ParticleData::Confetti {
                width,
                height: width * rng.random_range(1.5..2.5),
                phase: random_angle(rng),
            };
        }
    }

    fn update(&self, p: &mut Particle, _rng: &mut EffectRng) {
        p.advance();
        p.vy += GRAVITY;
        p.vx *= 0.98;
        if let ParticleData::Confetti { phase, .. } = p.data {
            p.vx += (p.age as f64 * 0.1 + phase).sin() * 0.1;
        }
        p.rotation += p.rotation_speed;
        let progress = p.progress();
        p.alpha = 1.0 - progress * progress;
    }

    fn render(&self, ctx: &mut dyn DrawingContext, p: &Particle) -> Result<(), Error> {
        let ParticleData::Confetti {
            width,
            height,
            phase,
        } = p.data
        else {
            return Ok(());
        };
        // Fake a flip around the vertical axis by squashing the width.
        let flip = (p.age as f64 * 0.15 + phase).cos().abs();
        let width = width * flip;

        ctx.save();
        ctx.set_global_alpha(p.alpha);
        ctx.set_fill_color(&to_css(p.color));
        let result = ctx.translate(p.x, p.y).and_then(|_| ctx.rotate(p.rotation));
        if result.is_ok() {
            ctx.fill_rect(-width / 2.0, -height / 2.0, width, height);
        }
        ctx.restore();
        result
    }
}
