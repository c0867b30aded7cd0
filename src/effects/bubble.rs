use rand::Rng;
use ratatui::style::Color;

use crate::{
    color::{rgb, to_css_rgba},
    effects::{
        is_dark, jitter, pick, random_angle, Effect, EffectKind, EffectRng, Intensity,
        SpawnContext,
    },
    engine::{Acquirer, Particle, ParticleData},
    error::Error,
    geometry::Point,
    surface::{DrawingContext, RadialGradient, FULL_CIRCLE},
};

const PALETTE_DARK: [Color; 6] = [
    rgb(0x67E8F9),
    rgb(0xA78BFA),
    rgb(0xFDE68A),
    rgb(0xFCA5A5),
    rgb(0x86EFAC),
    rgb(0xF9A8D4),
];
const PALETTE_LIGHT: [Color; 6] = [
    rgb(0x0891B2),
    rgb(0x7C3AED),
    rgb(0xD97706),
    rgb(0xDC2626),
    rgb(0x16A34A),
    rgb(0xDB2777),
];

/// Progress after which a bubble swells and pops.
const POP_AT: f64 = 0.85;

/// Opacity of a bubble before it pops.
const BODY_ALPHA: f64 = 0.7;

/// Translucent bubbles that sway upwards and pop at the end of their life.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bubble;

impl Effect for Bubble {
    fn kind(&self) -> EffectKind {
        EffectKind::Bubble
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
            let position = Point::new(origin.x + jitter(rng, 10.0), origin.y);
            let velocity = (jitter(rng, 1.5), -rng.random_range(1.5..3.5));
            p.launch(position, velocity, rng.random_range(30..55));
            p.size = rng.random_range(4.0..11.0);
            p.color = pick(rng, palette);
            p.data = ParticleData::Bubble {
                phase: random_angle(rng),
                sway: rng.random_range(0.3..0.7),
                dark,
            };
        }
    }

    fn update(&self, p: &mut Particle, _rng: &mut EffectRng) {
        p.advance();
        if let ParticleData::Bubble { phase, sway, .. } = p.data {
            p.vx += (p.age as f64 * 0.12 + phase).sin() * sway * 0.1;
        }
        p.vx *= 0.96;
        p.vy *= 0.995;

        let progress = p.progress();
        if progress > POP_AT {
            p.scale = 1.0 + (progress - POP_AT) * 3.0;
            p.alpha = (1.0 - progress) / (1.0 - POP_AT);
        } else {
            p.alpha = BODY_ALPHA;
        }
    }

    fn render(&self, ctx: &mut dyn DrawingContext, p: &Particle) -> Result<(), Error> {
        let radius = p.size * p.scale;
        if p.alpha <= 0.0 || radius < 0.5 {
            return Ok(());
        }
        let dark = matches!(p.data, ParticleData::Bubble { dark: true, .. });
        let tint = to_css_rgba(p.color, 0.25);
        let edge = to_css_rgba(p.color, 0.05);
        let stops = [
            (0.0, "rgba(255,255,255,0.5)"),
            (0.4, tint.as_str()),
            (1.0, edge.as_str()),
        ];
        // Light comes from the top left.
        let body = RadialGradient {
            inner: (p.x - radius * 0.25, p.y - radius * 0.25),
            inner_radius: radius * 0.1,
            outer: (p.x, p.y),
            outer_radius: radius,
            stops: &stops,
        };

        ctx.save();
        ctx.set_global_alpha(p.alpha);
        let result = draw_bubble(ctx, p, radius, &body, dark);
        ctx.restore();
        result
    }
}

fn draw_bubble(
    ctx: &mut dyn DrawingContext,
    p: &Particle,
    radius: f64,
    body: &RadialGradient<'_>,
    dark: bool,
) -> Result<(), Error> {
    ctx.set_fill_gradient(body)?;
    ctx.begin_path();
    ctx.arc(p.x, p.y, radius, 0.0, FULL_CIRCLE)?;
    ctx.fill();
    ctx.set_stroke_color(&to_css_rgba(p.color, 0.4));
    ctx.set_line_width(0.8);
    ctx.stroke();

    let highlight = if dark {
        to_css_rgba(Color::White, 1.0)
    } else {
        to_css_rgba(p.color, 0.6)
    };
    ctx.set_global_alpha(p.alpha * 0.7);
    ctx.set_fill_color(&highlight);
    ctx.begin_path();
    ctx.ellipse(
        p.x - radius * 0.3,
        p.y - radius * 0.3,
        radius * 0.2,
        radius * 0.12,
        -0.5,
        0.0,
        FULL_CIRCLE,
    )?;
    ctx.fill();
    Ok(())
}
