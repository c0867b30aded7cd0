use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

use rand::Rng;
use ratatui::style::Color;

use crate::{
    color::{rgb, to_css},
    effects::{is_dark, jitter, pick, Effect, EffectKind, EffectRng, Intensity, SpawnContext},
    engine::{Acquirer, Particle, ParticleData},
    error::Error,
    geometry::Point,
    surface::DrawingContext,
};

const PALETTE_DARK: [Color; 3] = [rgb(0xFFFFFF), rgb(0xFFFACD), rgb(0x87CEEB)];
const PALETTE_LIGHT: [Color; 3] = [rgb(0xF59E0B), rgb(0x3B82F6), rgb(0xEC4899)];

/// Four-point stars scattered around the caret that twinkle while drifting up.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sparkle;

impl Effect for Sparkle {
    fn kind(&self) -> EffectKind {
        EffectKind::Sparkle
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
        let palette = if is_dark(context) {
            &PALETTE_DARK
        } else {
            &PALETTE_LIGHT
        };
        for _ in 0..count {
            let Some(p) = acquirer.acquire() else {
                return;
            };
            let position = Point::new(origin.x + jitter(rng, 40.0), origin.y + jitter(rng, 40.0));
            let velocity = (jitter(rng, 0.5), -rng.random_range(0.3..0.8));
            p.launch(position, velocity, rng.random_range(30..55));
            p.size = rng.random_range(5.0..11.0);
            p.color = pick(rng, palette);
            p.rotation = rng.random_range(0.0..PI);
            p.rotation_speed = jitter(rng, 0.15);
            p.data = ParticleData::Sparkle {
                phase_offset: rng.random_range(0.0..std::f64::consts::TAU),
            };
        }
    }

    fn update(&self, p: &mut Particle, _rng: &mut EffectRng) {
        p.advance();
        p.rotation += p.rotation_speed;
        let phase = match p.data {
            ParticleData::Sparkle { phase_offset } => phase_offset,
            _ => 0.0,
        };
        p.scale = 0.5 + 0.5 * (p.age as f64 * 0.3 + phase).sin().abs();
        p.alpha = 1.0 - p.progress();
    }

    fn render(&self, ctx: &mut dyn DrawingContext, p: &Particle) -> Result<(), Error> {
        ctx.save();
        ctx.set_global_alpha(p.alpha);
        ctx.set_fill_color(&to_css(p.color));
        let result = draw_star(ctx, p);
        ctx.restore();
        result
    }
}

fn draw_star(ctx: &mut dyn DrawingContext, p: &Particle) -> Result<(), Error> {
    ctx.translate(p.x, p.y)?;
    ctx.rotate(p.rotation)?;

    let outer = p.size * p.scale;
    let inner = outer * 0.3;
    ctx.begin_path();
    for i in 0..4 {
        let angle = i as f64 * FRAC_PI_2;
        let (ox, oy) = (angle.cos() * outer, angle.sin() * outer);
        if i == 0 {
            ctx.move_to(ox, oy);
        } else {
            ctx.line_to(ox, oy);
        }
        let inner_angle = angle + FRAC_PI_4;
        ctx.line_to(inner_angle.cos() * inner, inner_angle.sin() * inner);
    }
    ctx.close_path();
    ctx.fill();
    Ok(())
}
