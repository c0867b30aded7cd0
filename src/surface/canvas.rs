use web_sys::{
    js_sys::{Boolean, Map},
    wasm_bindgen::{JsCast, JsValue},
    CanvasRenderingContext2d, Element, HtmlCanvasElement, HtmlElement, ShadowRootInit,
    ShadowRootMode, Window,
};

use crate::{
    effects::{FontSpec, GlyphMask},
    error::Error,
    event_callback::EventCallback,
    surface::{
        DrawingContext, LineCap, LineJoin, RadialGradient, Surface, TextAlign, TextBaseline,
    },
    utils::{get_device_pixel_ratio, get_document, get_viewport_size, get_window, set_styles},
};

/// Stacking order of the overlay; the largest value browsers accept.
const OVERLAY_Z_INDEX: &str = "2147483647";

/// Id of the shadow host element.
const SHADOW_HOST_ID: &str = "__typing-particles-host";

/// Alpha threshold above which a glyph pixel counts as ink.
const GLYPH_ALPHA_THRESHOLD: u8 = 50;

/// Options for the [`OverlaySurface`].
#[derive(Debug, Clone)]
pub struct OverlaySurfaceOptions {
    /// Host the canvas inside a closed shadow root.
    shadow_dom: bool,
    /// Request a desynchronized (low latency) context.
    desynchronized: bool,
}

impl Default for OverlaySurfaceOptions {
    fn default() -> Self {
        Self {
            shadow_dom: true,
            desynchronized: true,
        }
    }
}

impl OverlaySurfaceOptions {
    /// Constructs a new [`OverlaySurfaceOptions`].
    pub fn new() -> Self {
        Default::default()
    }

    /// Sets whether the canvas lives in a closed shadow root.
    ///
    /// The shadow root keeps page stylesheets from reaching the canvas. When
    /// the browser does not support shadow roots the canvas is attached to
    /// `<html>` directly.
    pub fn shadow_dom(mut self, enabled: bool) -> Self {
        self.shadow_dom = enabled;
        self
    }

    /// Sets whether the 2D context is requested with `desynchronized: true`.
    pub fn desynchronized(mut self, enabled: bool) -> Self {
        self.desynchronized = enabled;
        self
    }
}

/// Canvas element with its 2D context.
#[derive(Debug, Clone)]
struct Canvas {
    /// Canvas element.
    inner: HtmlCanvasElement,
    /// Rendering context.
    context: CanvasRenderingContext2d,
}

impl Canvas {
    /// Constructs a new hidden, full-viewport [`Canvas`].
    fn new(window: &Window, desynchronized: bool) -> Result<Self, Error> {
        let document = window.document().ok_or(Error::UnableToRetrieveDocument)?;
        let inner = document
            .create_element("canvas")?
            .unchecked_into::<HtmlCanvasElement>();
        set_styles(
            &inner,
            &[
                ("position", "fixed"),
                ("top", "0"),
                ("left", "0"),
                ("width", "100vw"),
                ("height", "100vh"),
                ("pointer-events", "none"),
                ("z-index", OVERLAY_Z_INDEX),
                ("display", "none"),
            ],
        )?;

        let context_options = Map::new();
        context_options.set(&JsValue::from_str("alpha"), &Boolean::from(JsValue::TRUE));
        context_options.set(
            &JsValue::from_str("desynchronized"),
            &Boolean::from(JsValue::from_bool(desynchronized)),
        );
        let context = inner
            .get_context_with_context_options("2d", &context_options)?
            .ok_or(Error::UnableToRetrieveCanvasContext)?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| Error::UnableToRetrieveCanvasContext)?;

        let canvas = Self { inner, context };
        canvas.fit_viewport(window)?;
        Ok(canvas)
    }

    /// Sizes the backing store to the viewport times the device pixel ratio
    /// and scales the transform so drawing happens in CSS pixels.
    fn fit_viewport(&self, window: &Window) -> Result<(), Error> {
        let ratio = get_device_pixel_ratio(window);
        let (width, height) = get_viewport_size(window);
        self.inner.set_width((width * ratio) as u32);
        self.inner.set_height((height * ratio) as u32);
        let css_width = format!("{width}px");
        let css_height = format!("{height}px");
        set_styles(
            &self.inner,
            &[("width", css_width.as_str()), ("height", css_height.as_str())],
        )?;
        self.context.set_transform(ratio, 0.0, 0.0, ratio, 0.0, 0.0)?;
        Ok(())
    }

    /// Erases the whole backing store regardless of the current transform.
    fn erase(&self) -> Result<(), Error> {
        self.context.save();
        self.context.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)?;
        self.context.clear_rect(
            0.0,
            0.0,
            self.inner.width() as f64,
            self.inner.height() as f64,
        );
        self.context.restore();
        Ok(())
    }
}

/// Full-viewport canvas overlay.
///
/// The canvas is transparent, ignores pointer events and sits above the page
/// content. It starts hidden; the particle engine shows it while particles
/// are alive and hides it again once the pool drains.
#[derive(Debug)]
pub struct OverlaySurface {
    /// Window the overlay is attached to.
    window: Window,
    /// Canvas.
    canvas: Canvas,
    /// Shadow host, if the canvas lives in a shadow root.
    host: Option<HtmlElement>,
    /// Whether the canvas is displayed.
    visible: bool,
    /// Keeps the canvas sized to the viewport.
    #[allow(dead_code)]
    resize_callback: Option<EventCallback<web_sys::Event>>,
}

impl OverlaySurface {
    /// Constructs a new [`OverlaySurface`] with default options.
    pub fn new() -> Result<Self, Error> {
        Self::new_with_options(OverlaySurfaceOptions::default())
    }

    /// Constructs a new [`OverlaySurface`] with the given options.
    pub fn new_with_options(options: OverlaySurfaceOptions) -> Result<Self, Error> {
        let window = get_window()?;
        let document = get_document()?;
        let root = document
            .document_element()
            .ok_or(Error::UnableToRetrieveDocument)?;
        let canvas = Canvas::new(&window, options.desynchronized)?;

        let host = if options.shadow_dom {
            match Self::attach_to_shadow_root(&document, &root, &canvas.inner) {
                Ok(host) => Some(host),
                Err(err) => {
                    log::debug!("shadow root unavailable, attaching canvas directly: {err}");
                    root.append_child(&canvas.inner)?;
                    None
                }
            }
        } else {
            root.append_child(&canvas.inner)?;
            None
        };

        let resize_callback = EventCallback::new(window.clone().into(), &["resize"], {
            let window = window.clone();
            let canvas = canvas.clone();
            move |_: web_sys::Event| {
                if let Err(err) = canvas.fit_viewport(&window) {
                    log::warn!("failed to resize overlay: {err}");
                }
            }
        })?;

        log::debug!("overlay surface attached (shadow root: {})", host.is_some());
        Ok(Self {
            window,
            canvas,
            host,
            visible: false,
            resize_callback: Some(resize_callback),
        })
    }

    /// Creates a zero-size fixed host with a closed shadow root holding the canvas.
    fn attach_to_shadow_root(
        document: &web_sys::Document,
        root: &Element,
        canvas: &HtmlCanvasElement,
    ) -> Result<HtmlElement, Error> {
        let host = document.create_element("div")?.unchecked_into::<HtmlElement>();
        host.set_id(SHADOW_HOST_ID);
        set_styles(
            &host,
            &[
                ("position", "fixed"),
                ("top", "0"),
                ("left", "0"),
                ("width", "0"),
                ("height", "0"),
                ("overflow", "visible"),
                ("pointer-events", "none"),
                ("z-index", OVERLAY_Z_INDEX),
            ],
        )?;
        let shadow = host.attach_shadow(&ShadowRootInit::new(ShadowRootMode::Closed))?;
        shadow.append_child(canvas)?;
        root.append_child(&host)?;
        Ok(host)
    }

    /// Returns the canvas element.
    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas.inner
    }

    /// Detaches the overlay from the document and stops listening for resizes.
    pub fn destroy(&mut self) {
        self.resize_callback = None;
        if let Some(host) = self.host.take() {
            host.remove();
        } else {
            self.canvas.inner.remove();
        }
        self.visible = false;
    }
}

impl Drop for OverlaySurface {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl Surface for OverlaySurface {
    fn show(&mut self) {
        if !self.visible {
            let _ = self.canvas.inner.style().set_property("display", "block");
            self.visible = true;
        }
    }

    fn hide(&mut self) {
        if self.visible {
            let _ = self.canvas.inner.style().set_property("display", "none");
            self.visible = false;
        }
    }

    fn clear(&mut self) {
        if let Err(err) = self.canvas.erase() {
            log::trace!("failed to clear overlay: {err}");
        }
    }

    fn is_visible(&self) -> bool {
        self.visible
    }

    fn resize(&mut self) {
        if let Err(err) = self.canvas.fit_viewport(&self.window) {
            log::warn!("failed to resize overlay: {err}");
        }
    }

    fn drawing_context(&mut self) -> Option<&mut dyn DrawingContext> {
        Some(&mut self.canvas.context)
    }
}

impl DrawingContext for CanvasRenderingContext2d {
    fn save(&mut self) {
        CanvasRenderingContext2d::save(self);
    }

    fn restore(&mut self) {
        CanvasRenderingContext2d::restore(self);
    }

    fn set_global_alpha(&mut self, alpha: f64) {
        CanvasRenderingContext2d::set_global_alpha(self, alpha);
    }

    fn set_fill_color(&mut self, color: &str) {
        self.set_fill_style_str(color);
    }

    fn set_fill_gradient(&mut self, gradient: &RadialGradient<'_>) -> Result<(), Error> {
        let canvas_gradient = self.create_radial_gradient(
            gradient.inner.0,
            gradient.inner.1,
            gradient.inner_radius,
            gradient.outer.0,
            gradient.outer.1,
            gradient.outer_radius,
        )?;
        for (offset, color) in gradient.stops {
            canvas_gradient.add_color_stop(*offset as f32, color)?;
        }
        self.set_fill_style_canvas_gradient(&canvas_gradient);
        Ok(())
    }

    fn set_stroke_color(&mut self, color: &str) {
        self.set_stroke_style_str(color);
    }

    fn set_line_width(&mut self, width: f64) {
        CanvasRenderingContext2d::set_line_width(self, width);
    }

    fn set_line_cap(&mut self, cap: LineCap) {
        CanvasRenderingContext2d::set_line_cap(
            self,
            match cap {
                LineCap::Butt => "butt",
                LineCap::Round => "round",
            },
        );
    }

    fn set_line_join(&mut self, join: LineJoin) {
        CanvasRenderingContext2d::set_line_join(
            self,
            match join {
                LineJoin::Miter => "miter",
                LineJoin::Round => "round",
            },
        );
    }

    fn set_font(&mut self, font: &str) {
        CanvasRenderingContext2d::set_font(self, font);
    }

    fn set_text_align(&mut self, align: TextAlign) {
        CanvasRenderingContext2d::set_text_align(
            self,
            match align {
                TextAlign::Start => "start",
                TextAlign::Center => "center",
            },
        );
    }

    fn set_text_baseline(&mut self, baseline: TextBaseline) {
        CanvasRenderingContext2d::set_text_baseline(
            self,
            match baseline {
                TextBaseline::Top => "top",
                TextBaseline::Middle => "middle",
            },
        );
    }

    fn begin_path(&mut self) {
        CanvasRenderingContext2d::begin_path(self);
    }

    fn close_path(&mut self) {
        CanvasRenderingContext2d::close_path(self);
    }

    fn move_to(&mut self, x: f64, y: f64) {
        CanvasRenderingContext2d::move_to(self, x, y);
    }

    fn line_to(&mut self, x: f64, y: f64) {
        CanvasRenderingContext2d::line_to(self, x, y);
    }

    fn arc(&mut self, x: f64, y: f64, radius: f64, start: f64, end: f64) -> Result<(), Error> {
        CanvasRenderingContext2d::arc(self, x, y, radius, start, end)?;
        Ok(())
    }

    fn ellipse(
        &mut self,
        x: f64,
        y: f64,
        radius_x: f64,
        radius_y: f64,
        rotation: f64,
        start: f64,
        end: f64,
    ) -> Result<(), Error> {
        CanvasRenderingContext2d::ellipse(self, x, y, radius_x, radius_y, rotation, start, end)?;
        Ok(())
    }

    fn fill(&mut self) {
        CanvasRenderingContext2d::fill(self);
    }

    fn stroke(&mut self) {
        CanvasRenderingContext2d::stroke(self);
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        CanvasRenderingContext2d::fill_rect(self, x, y, width, height);
    }

    fn translate(&mut self, x: f64, y: f64) -> Result<(), Error> {
        CanvasRenderingContext2d::translate(self, x, y)?;
        Ok(())
    }

    fn rotate(&mut self, angle: f64) -> Result<(), Error> {
        CanvasRenderingContext2d::rotate(self, angle)?;
        Ok(())
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64) -> Result<(), Error> {
        CanvasRenderingContext2d::fill_text(self, text, x, y)?;
        Ok(())
    }

    fn stroke_text(&mut self, text: &str, x: f64, y: f64) -> Result<(), Error> {
        CanvasRenderingContext2d::stroke_text(self, text, x, y)?;
        Ok(())
    }
}

/// Offscreen canvas used to measure and rasterize typed characters.
#[derive(Debug)]
pub struct GlyphRasterizer {
    /// Offscreen canvas element, never attached to the document.
    canvas: Canvas,
}

impl GlyphRasterizer {
    /// Constructs a new [`GlyphRasterizer`].
    pub fn new() -> Result<Self, Error> {
        let document = get_document()?;
        let inner = document
            .create_element("canvas")?
            .unchecked_into::<HtmlCanvasElement>();
        let context_options = Map::new();
        context_options.set(
            &JsValue::from_str("willReadFrequently"),
            &Boolean::from(JsValue::TRUE),
        );
        let context = inner
            .get_context_with_context_options("2d", &context_options)?
            .ok_or(Error::UnableToRetrieveCanvasContext)?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| Error::UnableToRetrieveCanvasContext)?;
        Ok(Self {
            canvas: Canvas { inner, context },
        })
    }

    /// Returns the advance width of `text` in the given font.
    pub fn measure(&self, text: &str, font: &FontSpec) -> Result<f64, Error> {
        self.canvas.context.set_font(&font.to_css());
        Ok(self.canvas.context.measure_text(text)?.width())
    }

    /// Renders `text` centered on a square canvas and returns its ink mask.
    pub fn rasterize(&self, text: &str, font: &FontSpec) -> Result<GlyphMask, Error> {
        let size = GlyphMask::side_for(font.size);
        self.canvas.inner.set_width(size as u32);
        self.canvas.inner.set_height(size as u32);

        let context = &self.canvas.context;
        context.clear_rect(0.0, 0.0, size as f64, size as f64);
        context.set_font(&font.to_css());
        context.set_text_align("center");
        context.set_text_baseline("middle");
        context.set_fill_style_str("#fff");
        context.fill_text(text, size as f64 / 2.0, size as f64 / 2.0)?;

        let image = context.get_image_data(0.0, 0.0, size as f64, size as f64)?;
        let pixels = image.data();
        let alpha = pixels.0.chunks_exact(4).map(|rgba| rgba[3]);
        Ok(GlyphMask::from_alpha(size, alpha, GLYPH_ALPHA_THRESHOLD).with_font_size(font.size))
    }
}
