use rand::Rng;
use ratatui::style::Color;

use crate::{
    color::{rgb, to_css},
    effects::{font_css, pick, Effect, EffectKind, EffectRng, Intensity, SpawnContext},
    engine::{Acquirer, Particle, ParticleData},
    error::Error,
    geometry::Point,
    surface::{DrawingContext, LineJoin, TextAlign, TextBaseline},
};

const PALETTE: [Color; 5] = [
    rgb(0x67E8F9),
    rgb(0xA78BFA),
    rgb(0xFDE68A),
    rgb(0xF9A8D4),
    rgb(0xFFFFFF),
];

/// Peak opacity of an echo layer.
const PEAK_ALPHA: f64 = 0.7;

/// Outlines of the typed character that grow out of it and fade.
///
/// Spawns nothing unless the context carries a character.
#[derive(Debug, Clone, Copy, Default)]
pub struct Echo;

fn layer_delay(p: &Particle) -> u32 {
    match p.data {
        ParticleData::Echo { delay, .. } => delay,
        _ => 0,
    }
}

impl Effect for Echo {
    fn kind(&self) -> EffectKind {
        EffectKind::Echo
    }

    fn spawn(
        &self,
        origin: Point,
        intensity: Intensity,
        context: Option<&SpawnContext>,
        rng: &mut EffectRng,
        acquirer: &mut Acquirer<'_>,
    ) {
        let Some((context, character)) =
            context.and_then(|context| Some((context, context.character?)))
        else {
            return;
        };
        let center = context.char_center(origin);
        let layers = ((3.0 * intensity.get()).floor() as u32).max(2);
        let color = pick(rng, &PALETTE);
        for layer in 0..layers {
            let Some(p) = acquirer.acquire() else {
                return;
            };
            p.launch(center, (0.0, 0.0), rng.random_range(35..45));
            p.size = context.font.size;
            p.color = color;
            p.alpha = 0.0;
            p.data = ParticleData::Echo {
                character,
                font_family: context.font.family.clone(),
                font_weight: context.font.weight.clone(),
                delay: layer * 5,
            };
        }
    }

    fn update(&self, p: &mut Particle, _rng: &mut EffectRng) {
        let delay = layer_delay(p);
        if p.age < delay {
            p.alpha = 0.0;
            return;
        }
        let span = p.lifetime.saturating_sub(delay).max(1);
        let progress = ((p.age - delay) as f64 / span as f64).min(1.0);
        p.scale = 1.05 + progress * 1.5;
        p.alpha = if progress < 0.1 {
            progress / 0.1 * PEAK_ALPHA
        } else {
            let t = (progress - 0.1) / 0.9;
            PEAK_ALPHA * (1.0 - t * t)
        };
    }

    fn render(&self, ctx: &mut dyn DrawingContext, p: &Particle) -> Result<(), Error> {
        let ParticleData::Echo {
            character,
            ref font_family,
            ref font_weight,
            ..
        } = p.data
        else {
            return Ok(());
        };
        if p.alpha <= 0.0 {
            return Ok(());
        }
        let mut buffer = [0; 4];
        let text = character.encode_utf8(&mut buffer);
        let color = to_css(p.color);

        ctx.save();
        ctx.set_font(&font_css(font_weight, p.size * p.scale, font_family));
        ctx.set_text_align(TextAlign::Center);
        ctx.set_text_baseline(TextBaseline::Middle);
        ctx.set_line_join(LineJoin::Round);
        ctx.set_fill_color(&color);
        ctx.set_stroke_color(&color);
        ctx.set_global_alpha(p.alpha * 0.15);
        let mut result = ctx.fill_text(text, p.x, p.y);
        if result.is_ok() {
            ctx.set_global_alpha(p.alpha);
            ctx.set_line_width((2.0 - p.scale * 0.4).max(1.0));
            result = ctx.stroke_text(text, p.x, p.y);
        }
        ctx.restore();
        result
    }
}
