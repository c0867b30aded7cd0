/// A point in viewport coordinates, in CSS pixels.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Point {
    /// Horizontal position.
    pub x: f64,
    /// Vertical position.
    pub y: f64,
}

impl Point {
    /// Constructs a new [`Point`].
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// A rectangle in viewport coordinates, in CSS pixels.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Rect {
    /// Left edge.
    pub left: f64,
    /// Top edge.
    pub top: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

impl Rect {
    /// Constructs a new [`Rect`].
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Right edge.
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    /// Bottom edge.
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Whether the rectangle looks like a measured caret box.
    ///
    /// Collapsed ranges that were never laid out report an empty box at the
    /// viewport origin. A real caret at exactly (0, 0) is rejected as well.
    pub fn is_usable(&self) -> bool {
        self.height > 0.0 && !(self.left == 0.0 && self.top == 0.0)
    }

    /// Whether the top-left corner of `self` lies within `margin` pixels of `outer`.
    pub fn is_near(&self, outer: &Rect, margin: f64) -> bool {
        self.left >= outer.left - margin
            && self.left <= outer.right() + margin
            && self.top >= outer.top - margin
            && self.top <= outer.bottom() + margin
    }

    /// The caret anchor for this box: its left edge, vertically centered.
    pub fn caret_anchor(&self) -> Point {
        Point::new(self.left, self.top + self.height * 0.5)
    }
}

impl From<&web_sys::DomRect> for Rect {
    fn from(rect: &web_sys::DomRect) -> Self {
        Self::new(rect.left(), rect.top(), rect.width(), rect.height())
    }
}

impl From<web_sys::DomRect> for Rect {
    fn from(rect: web_sys::DomRect) -> Self {
        Self::from(&rect)
    }
}
