use std::f64::consts::TAU;

use rand::Rng;
use ratatui::style::Color;

use crate::{
    color::{rgb, to_css},
    effects::{jitter, pick, random_angle, Effect, EffectKind, EffectRng, Intensity, SpawnContext},
    engine::{Acquirer, Particle, ParticleData},
    error::Error,
    geometry::Point,
    surface::{DrawingContext, LineCap},
};

const PALETTE: [Color; 5] = [
    rgb(0xFFFFFF),
    rgb(0xE0F2FE),
    rgb(0xBAE6FD),
    rgb(0x7DD3FC),
    rgb(0x67E8F9),
];

/// Where a branch leaves its spoke, as a fraction of the spoke length.
const BRANCH_AT: f64 = 0.6;

/// Branch length as a fraction of the spoke length.
const BRANCH_LENGTH: f64 = 0.35;

/// Angle between a branch and its spoke, in radians.
const BRANCH_ANGLE: f64 = 0.5;

/// Slowly spinning ice crystals with four or six spokes.
#[derive(Debug, Clone, Copy, Default)]
pub struct Frost;

impl Effect for Frost {
    fn kind(&self) -> EffectKind {
        EffectKind::Frost
    }

    fn spawn(
        &self,
        origin: Point,
        intensity: Intensity,
        _context: Option<&SpawnContext>,
        rng: &mut EffectRng,
        acquirer: &mut Acquirer<'_>,
    ) {
        let count = intensity.scale_count(rng, 5.0, 6.0);
        for _ in 0..count {
            let Some(p) = acquirer.acquire() else {
                return;
            };
            let angle = random_angle(rng);
            let speed = rng.random_range(1.0..3.5);
            p.launch(
                origin,
                (angle.cos() * speed, angle.sin() * speed),
                rng.random_range(25..45),
            );
            p.size = rng.random_range(4.0..9.0);
            p.color = pick(rng, &PALETTE);
            p.rotation = random_angle(rng);
            p.rotation_speed = jitter(rng, 0.08);
            p.data = ParticleData::Frost {
                spokes: if rng.random_bool(0.5) { 6 } else { 4 },
            };
        }
    }

    fn update(&self, p: &mut Particle, _rng: &mut EffectRng) {
        p.advance();
        p.vx *= 0.95;
        p.vy *= 0.95;
        p.rotation += p.rotation_speed;
        p.scale *= 0.985;
        p.alpha = 1.0 - p.progress();
    }

    fn render(&self, ctx: &mut dyn DrawingContext, p: &Particle) -> Result<(), Error> {
        let radius = p.size * p.scale;
        if p.alpha <= 0.0 || radius < 0.5 {
            return Ok(());
        }
        let spokes = match p.data {
            ParticleData::Frost { spokes } if spokes > 0 => spokes,
            _ => 6,
        };

        ctx.save();
        ctx.set_global_alpha(p.alpha);
        ctx.set_stroke_color(&to_css(p.color));
        ctx.set_line_width(1.2);
        ctx.set_line_cap(LineCap::Round);
        let result = draw_crystal(ctx, p, radius, spokes);
        ctx.restore();
        result
    }
}

fn segment(ctx: &mut dyn DrawingContext, from: (f64, f64), to: (f64, f64)) {
    ctx.begin_path();
    ctx.move_to(from.0, from.1);
    ctx.line_to(to.0, to.1);
    ctx.stroke();
}

fn draw_crystal(
    ctx: &mut dyn DrawingContext,
    p: &Particle,
    radius: f64,
    spokes: u8,
) -> Result<(), Error> {
    ctx.translate(p.x, p.y)?;
    ctx.rotate(p.rotation)?;

    let branch = radius * BRANCH_LENGTH;
    for i in 0..spokes {
        let angle = TAU / spokes as f64 * i as f64;
        let tip = (angle.cos() * radius, angle.sin() * radius);
        segment(ctx, (0.0, 0.0), tip);

        let fork = (tip.0 * BRANCH_AT, tip.1 * BRANCH_AT);
        for side in [angle + BRANCH_ANGLE, angle - BRANCH_ANGLE] {
            segment(
                ctx,
                fork,
                (fork.0 + side.cos() * branch, fork.1 + side.sin() * branch),
            );
        }
    }
    Ok(())
}
