//! Particle records and their effect-specific payloads.

use compact_str::CompactString;
use ratatui::style::Color;

use crate::geometry::Point;

/// Maximum number of vertices in an electric arc.
pub const MAX_ARC_POINTS: usize = 9;

/// A reusable particle record.
///
/// Records are allocated once when the [`Pool`](super::Pool) is built and
/// recycled afterwards. Effects own every field except the occupancy flag,
/// which only the pool changes.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    /// Whether the slot is in use.
    pub(crate) active: bool,
    /// Horizontal position in pixels.
    pub x: f64,
    /// Vertical position in pixels.
    pub y: f64,
    /// Horizontal velocity in pixels per frame.
    pub vx: f64,
    /// Vertical velocity in pixels per frame.
    pub vy: f64,
    /// Base size in pixels.
    pub size: f64,
    /// Size multiplier.
    pub scale: f64,
    /// Rotation in radians.
    pub rotation: f64,
    /// Rotation change per frame in radians.
    pub rotation_speed: f64,
    /// Frames elapsed since spawn.
    pub age: u32,
    /// Frames until the particle is retired.
    pub lifetime: u32,
    /// Color.
    pub color: Color,
    /// Opacity in `[0, 1]`.
    pub alpha: f64,
    /// Effect-specific state.
    pub data: ParticleData,
}

impl Default for Particle {
    fn default() -> Self {
        Self {
            active: false,
            x: 0.0,
            y: 0.0,
            vx: 0.0,
            vy: 0.0,
            size: 0.0,
            scale: 1.0,
            rotation: 0.0,
            rotation_speed: 0.0,
            age: 0,
            lifetime: 0,
            color: Color::White,
            alpha: 1.0,
            data: ParticleData::None,
        }
    }
}

impl Particle {
    /// Returns whether the particle occupies a pool slot.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Normalized age in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        if self.lifetime == 0 {
            1.0
        } else {
            (self.age as f64 / self.lifetime as f64).min(1.0)
        }
    }

    /// Sets position, velocity and the common defaults in one go.
    pub fn launch(&mut self, position: Point, velocity: (f64, f64), lifetime: u32) {
        self.x = position.x;
        self.y = position.y;
        self.vx = velocity.0;
        self.vy = velocity.1;
        self.age = 0;
        self.lifetime = lifetime;
        self.alpha = 1.0;
        self.scale = 1.0;
        self.rotation = 0.0;
        self.rotation_speed = 0.0;
    }

    /// Moves the particle by its velocity.
    pub fn advance(&mut self) {
        self.x += self.vx;
        self.y += self.vy;
    }
}

/// A zigzag path relative to a particle's position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcPath {
    points: [Point; MAX_ARC_POINTS],
    len: usize,
}

impl Default for ArcPath {
    fn default() -> Self {
        Self {
            points: [Point::default(); MAX_ARC_POINTS],
            len: 1,
        }
    }
}

impl ArcPath {
    /// Appends a vertex. Returns `false` when the path is full.
    pub fn push(&mut self, point: Point) -> bool {
        if self.len == MAX_ARC_POINTS {
            return false;
        }
        self.points[self.len] = point;
        self.len += 1;
        true
    }

    /// Returns the last vertex.
    pub fn last(&self) -> Point {
        self.points[self.len - 1]
    }

    /// Returns the vertices.
    pub fn points(&self) -> &[Point] {
        &self.points[..self.len]
    }

    /// Returns the vertices mutably.
    pub fn points_mut(&mut self) -> &mut [Point] {
        &mut self.points[..self.len]
    }
}

/// Per-particle state owned by a single effect.
///
/// The engine resets this to [`ParticleData::None`] whenever a slot is
/// handed out and never looks at it otherwise.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ParticleData {
    /// No effect-specific state.
    #[default]
    None,
    /// Sparkle twinkle phase.
    Sparkle {
        /// Phase of the scale pulse.
        phase_offset: f64,
    },
    /// Confetti piece.
    Confetti {
        /// Piece width.
        width: f64,
        /// Piece height.
        height: f64,
        /// 3D flip phase.
        phase: f64,
    },
    /// Floating bubble.
    Bubble {
        /// Sway phase.
        phase: f64,
        /// Sway amplitude.
        sway: f64,
        /// Spawned over a dark background.
        dark: bool,
    },
    /// Firefly light.
    Firefly {
        /// Flicker phase.
        phase: f64,
        /// Flicker speed in radians per frame.
        flicker_speed: f64,
        /// Wander phase.
        wander_phase: f64,
        /// Spawned over a dark background.
        dark: bool,
    },
    /// Expanding ring.
    Ripple {
        /// Radius growth per frame.
        expand_speed: f64,
        /// Frames before the ring appears.
        delay: u32,
    },
    /// Character outline echo.
    Echo {
        /// The echoed character.
        character: char,
        /// CSS font family.
        font_family: CompactString,
        /// CSS font weight.
        font_weight: CompactString,
        /// Frames before the echo appears.
        delay: u32,
    },
    /// Particle orbiting a vortex center.
    Vortex {
        /// Vortex center.
        center: Point,
        /// Current angle around the center.
        angle: f64,
        /// Current distance from the center.
        distance: f64,
        /// Angular speed in radians per frame, signed by direction.
        spin: f64,
    },
    /// Ice crystal.
    Frost {
        /// Number of spokes.
        spokes: u8,
    },
    /// Lightning bolt.
    Electric {
        /// Bolt vertices relative to the particle.
        path: ArcPath,
        /// Color of the bright core.
        core: Color,
    },
    /// Particle leaving a glyph outline.
    Diffuse {
        /// Frames before the particle starts moving.
        delay: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress() {
        let mut particle = Particle {
            lifetime: 40,
            ..Default::default()
        };
        assert_eq!(particle.progress(), 0.0);
        particle.age = 10;
        assert_eq!(particle.progress(), 0.25);
        particle.age = 50;
        assert_eq!(particle.progress(), 1.0);
        particle.lifetime = 0;
        assert_eq!(particle.progress(), 1.0);
    }

    #[test]
    fn test_arc_path_is_bounded() {
        let mut path = ArcPath::default();
        assert_eq!(path.points(), &[Point::default()]);
        for i in 1..MAX_ARC_POINTS {
            assert!(path.push(Point::new(i as f64, 0.0)));
        }
        assert!(!path.push(Point::new(100.0, 0.0)));
        assert_eq!(path.points().len(), MAX_ARC_POINTS);
        assert_eq!(path.last(), Point::new(8.0, 0.0));
    }
}
