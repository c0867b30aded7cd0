use std::f64::consts::FRAC_PI_3;

use rand::Rng;
use ratatui::style::Color;

use crate::{
    color::{rgb, to_css},
    effects::{
        is_dark, jitter, pick, random_angle, Effect, EffectKind, EffectRng, Intensity,
        SpawnContext,
    },
    engine::{Acquirer, ArcPath, Particle, ParticleData},
    error::Error,
    geometry::Point,
    surface::{fill_circle, DrawingContext, LineCap, LineJoin},
};

const PALETTE_DARK: [Color; 4] = [rgb(0xFFFFFF), rgb(0x67E8F9), rgb(0xA5F3FC), rgb(0xE0F2FE)];
const PALETTE_LIGHT: [Color; 4] = [rgb(0x1E40AF), rgb(0x3B82F6), rgb(0x6366F1), rgb(0x7C3AED)];

const CORE_DARK: Color = rgb(0xFFFFFF);
const CORE_LIGHT: Color = rgb(0x1E3A8A);

/// Radius of the spark dots drawn on bolt joints.
const SPARK_RADIUS: f64 = 1.5;

/// Short zigzag lightning bolts that crackle in place and fade fast.
#[derive(Debug, Clone, Copy, Default)]
pub struct Electric;

/// Builds a bolt of `segments` segments starting at the origin.
fn zigzag(rng: &mut EffectRng, segments: usize) -> ArcPath {
    let mut path = ArcPath::default();
    let mut angle = random_angle(rng);
    for _ in 0..segments {
        let length = rng.random_range(8.0..15.0);
        angle += jitter(rng, FRAC_PI_3);
        let last = path.last();
        let next = Point::new(last.x + angle.cos() * length, last.y + angle.sin() * length);
        if !path.push(next) {
            break;
        }
    }
    path
}

/// Whether a spark is drawn on joint `joint` at frame `age`.
///
/// Flickers the sparks without drawing randomness while rendering.
fn spark_visible(age: u32, joint: usize) -> bool {
    (age as usize + joint * 3) % 5 < 2
}

fn trace(ctx: &mut dyn DrawingContext, p: &Particle, path: &ArcPath) {
    ctx.begin_path();
    for (i, point) in path.points().iter().enumerate() {
        if i == 0 {
            ctx.move_to(p.x + point.x, p.y + point.y);
        } else {
            ctx.line_to(p.x + point.x, p.y + point.y);
        }
    }
    ctx.stroke();
}

impl Effect for Electric {
    fn kind(&self) -> EffectKind {
        EffectKind::Electric
    }

    fn spawn(
        &self,
        origin: Point,
        intensity: Intensity,
        context: Option<&SpawnContext>,
        rng: &mut EffectRng,
        acquirer: &mut Acquirer<'_>,
    ) {
        let count = intensity.scale_count(rng, 2.0, 2.0);
        let dark = is_dark(context);
        let (palette, core) = if dark {
            (&PALETTE_DARK, CORE_DARK)
        } else {
            (&PALETTE_LIGHT, CORE_LIGHT)
        };
        for _ in 0..count {
            let Some(p) = acquirer.acquire() else {
                return;
            };
            let segments = rng.random_range(5..9);
            let path = zigzag(rng, segments);
            p.launch(origin, (0.0, 0.0), rng.random_range(8..16));
            p.size = 1.0;
            p.color = pick(rng, palette);
            p.data = ParticleData::Electric { path, core };
        }
    }

    fn update(&self, p: &mut Particle, rng: &mut EffectRng) {
        p.alpha = 1.0 - p.progress();
        if let ParticleData::Electric { ref mut path, .. } = p.data {
            for point in path.points_mut().iter_mut().skip(1) {
                point.x += jitter(rng, 2.0);
                point.y += jitter(rng, 2.0);
            }
        }
    }

    fn render(&self, ctx: &mut dyn DrawingContext, p: &Particle) -> Result<(), Error> {
        let ParticleData::Electric { ref path, core } = p.data else {
            return Ok(());
        };
        let points = path.points();
        if points.len() < 2 {
            return Ok(());
        }
        let core = to_css(core);

        ctx.save();
        ctx.set_line_cap(LineCap::Round);
        ctx.set_line_join(LineJoin::Round);

        ctx.set_global_alpha(p.alpha * 0.3);
        ctx.set_stroke_color(&to_css(p.color));
        ctx.set_line_width(4.0);
        trace(ctx, p, path);

        ctx.set_global_alpha(p.alpha);
        ctx.set_stroke_color(&core);
        ctx.set_line_width(1.5);
        trace(ctx, p, path);

        ctx.set_fill_color(&core);
        ctx.set_global_alpha(p.alpha * 0.8);
        let mut result = Ok(());
        for (joint, point) in points.iter().enumerate().take(points.len() - 1).skip(1) {
            if spark_visible(p.age, joint) {
                result = fill_circle(ctx, p.x + point.x, p.y + point.y, SPARK_RADIUS);
                if result.is_err() {
                    break;
                }
            }
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
    fn test_zigzag_segments() {
        let mut rng = EffectRng::seed_from_u64(5);
        for segments in 5..9 {
            let path = zigzag(&mut rng, segments);
            assert_eq!(path.points().len(), segments + 1);
            assert_eq!(path.points()[0], Point::default());
            for pair in path.points().windows(2) {
                let length = (pair[1].x - pair[0].x).hypot(pair[1].y - pair[0].y);
                assert!((8.0 - 1e-9..15.0).contains(&length));
            }
        }
    }

    #[test]
    fn test_core_color_follows_background() {
        let dark = SpawnContext {
            dark_background: true,
            ..Default::default()
        };
        let pool = spawn_into_pool(&Electric, 300, 1.0, Some(&dark));
        assert!(pool.active_count() >= 2);
        for p in pool.iter_active() {
            assert!(matches!(p.data, ParticleData::Electric { core, .. } if core == CORE_DARK));
            assert!(PALETTE_DARK.contains(&p.color));
            assert!((8..16).contains(&p.lifetime));
        }
        let pool = spawn_into_pool(&Electric, 300, 1.0, None);
        for p in pool.iter_active() {
            assert!(matches!(p.data, ParticleData::Electric { core, .. } if core == CORE_LIGHT));
        }
    }

    #[test]
    fn test_origin_stays_pinned() {
        let mut pool = spawn_into_pool(&Electric, 300, 1.0, None);
        let ctx = run_to_completion(&Electric, &mut pool);
        for p in pool.iter_active() {
            let ParticleData::Electric { ref path, .. } = p.data else {
                panic!("unexpected data {:?}", p.data);
            };
            assert_eq!(path.points()[0], Point::default());
            assert_eq!((p.x, p.y), (100.0, 100.0));
        }
        assert_eq!(ctx.count("stroke"), 2 * ctx.count("save"));
    }
}
