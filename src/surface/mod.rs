//! ## Surfaces
//!
//! The particle engine never touches the DOM directly. It draws through two
//! small traits:
//!
//! - [`Surface`]: a transparent, click-through drawing layer that can be
//!   shown, hidden and cleared, and that hands out a [`DrawingContext`].
//! - [`DrawingContext`]: the subset of the Canvas 2D API that effects use.
//!
//! [`canvas::OverlaySurface`] is the browser implementation: a full-viewport
//! `<canvas>` placed above the page (optionally inside a closed shadow root),
//! resized with the window and scaled by `devicePixelRatio`.
//!
//! Every operation on [`DrawingContext`] that crosses into JavaScript may
//! fail; those return a [`Result`] so effects can use `?` and the engine can
//! skip the particle for the frame.

use crate::error::Error;

/// Canvas overlay.
pub mod canvas;

/// A drawing layer owned by the particle engine during a frame.
pub trait Surface {
    /// Makes the surface visible. Idempotent.
    fn show(&mut self);

    /// Hides the surface. Idempotent.
    fn hide(&mut self);

    /// Erases everything drawn on the surface.
    fn clear(&mut self);

    /// Returns whether the surface is visible.
    fn is_visible(&self) -> bool;

    /// Resizes the surface to the current viewport.
    fn resize(&mut self);

    /// Returns the drawing context, if the surface has one.
    fn drawing_context(&mut self) -> Option<&mut dyn DrawingContext>;
}

/// Line cap style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineCap {
    /// Flat ends.
    Butt,
    /// Rounded ends.
    Round,
}

/// Line join style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineJoin {
    /// Sharp corners.
    Miter,
    /// Rounded corners.
    Round,
}

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    /// Text starts at the anchor.
    Start,
    /// Text is centered on the anchor.
    Center,
}

/// Vertical text baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextBaseline {
    /// The anchor is the top of the em box.
    Top,
    /// The anchor is the middle of the em box.
    Middle,
}

/// A radial gradient from an inner to an outer circle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadialGradient<'a> {
    /// Center of the inner circle.
    pub inner: (f64, f64),
    /// Radius of the inner circle.
    pub inner_radius: f64,
    /// Center of the outer circle.
    pub outer: (f64, f64),
    /// Radius of the outer circle.
    pub outer_radius: f64,
    /// Color stops as `(offset, css color)`.
    pub stops: &'a [(f64, &'a str)],
}

impl<'a> RadialGradient<'a> {
    /// A gradient between two concentric circles.
    pub fn centered(x: f64, y: f64, radius: f64, stops: &'a [(f64, &'a str)]) -> Self {
        Self {
            inner: (x, y),
            inner_radius: 0.0,
            outer: (x, y),
            outer_radius: radius,
            stops,
        }
    }
}

/// 2D drawing operations used by effects.
///
/// Mirrors the Canvas 2D API. Colors are CSS color strings.
pub trait DrawingContext {
    /// Pushes the current drawing state.
    fn save(&mut self);
    /// Pops the last saved drawing state.
    fn restore(&mut self);
    /// Sets the global alpha.
    fn set_global_alpha(&mut self, alpha: f64);
    /// Sets a solid fill color.
    fn set_fill_color(&mut self, color: &str);
    /// Sets a radial gradient fill.
    fn set_fill_gradient(&mut self, gradient: &RadialGradient<'_>) -> Result<(), Error>;
    /// Sets a solid stroke color.
    fn set_stroke_color(&mut self, color: &str);
    /// Sets the line width.
    fn set_line_width(&mut self, width: f64);
    /// Sets the line cap style.
    fn set_line_cap(&mut self, cap: LineCap);
    /// Sets the line join style.
    fn set_line_join(&mut self, join: LineJoin);
    /// Sets the font using CSS shorthand (e.g. `"400 16px serif"`).
    fn set_font(&mut self, font: &str);
    /// Sets the text alignment.
    fn set_text_align(&mut self, align: TextAlign);
    /// Sets the text baseline.
    fn set_text_baseline(&mut self, baseline: TextBaseline);
    /// Starts a new path.
    fn begin_path(&mut self);
    /// Closes the current sub path.
    fn close_path(&mut self);
    /// Moves the pen.
    fn move_to(&mut self, x: f64, y: f64);
    /// Adds a line to the path.
    fn line_to(&mut self, x: f64, y: f64);
    /// Adds an arc to the path.
    fn arc(&mut self, x: f64, y: f64, radius: f64, start: f64, end: f64) -> Result<(), Error>;
    /// Adds an ellipse to the path.
    #[allow(clippy::too_many_arguments)]
    fn ellipse(
        &mut self,
        x: f64,
        y: f64,
        radius_x: f64,
        radius_y: f64,
        rotation: f64,
        start: f64,
        end: f64,
    ) -> Result<(), Error>;
    /// Fills the current path.
    fn fill(&mut self);
    /// Strokes the current path.
    fn stroke(&mut self);
    /// Fills a rectangle.
    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64);
    /// Translates the transform.
    fn translate(&mut self, x: f64, y: f64) -> Result<(), Error>;
    /// Rotates the transform.
    fn rotate(&mut self, angle: f64) -> Result<(), Error>;
    /// Fills text.
    fn fill_text(&mut self, text: &str, x: f64, y: f64) -> Result<(), Error>;
    /// Strokes text outlines.
    fn stroke_text(&mut self, text: &str, x: f64, y: f64) -> Result<(), Error>;
}

/// Full circle, in radians.
pub const FULL_CIRCLE: f64 = std::f64::consts::TAU;

/// Fills a circle with the current fill style.
pub fn fill_circle(ctx: &mut dyn DrawingContext, x: f64, y: f64, radius: f64) -> Result<(), Error> {
    ctx.begin_path();
    ctx.arc(x, y, radius, 0.0, FULL_CIRCLE)?;
    ctx.fill();
    Ok(())
}
