//! ## Caret locator
//!
//! [`CaretLocator::detect`] returns where the text caret of a focused field
//! is drawn, in viewport coordinates, using nothing but layout measurement:
//!
//! - `<input>` and `<textarea>`: the text before the caret is copied into an
//!   off-screen mirror with the same font and box metrics, followed by a
//!   marker `<span>`. The marker's offset inside the mirror is the caret's
//!   offset inside the field.
//! - contenteditable: the selection is collapsed to its start and measured
//!   with the range's client rects, its bounding rect, and finally a
//!   temporary zero-width marker inserted at the caret.
//! - Password fields and every other element yield `None`.

use web_sys::{
    wasm_bindgen::JsCast, Document, Element, HtmlElement, HtmlInputElement, HtmlTextAreaElement,
    Window,
};

use crate::{
    error::Error,
    geometry::Point,
    utils::{get_document, get_window},
};

mod editable;
mod mirror;

pub use mirror::MIRROR_ID;

use mirror::{Mirror, TextField};

/// How far outside its element a contenteditable caret may be, in pixels.
pub const INSIDE_MARGIN: f64 = 30.0;

/// The kind of caret an element has.
#[derive(Debug)]
enum CaretHost {
    /// A field whose content must never be measured.
    Password,
    /// A contenteditable element.
    Editable,
    /// A plain text field.
    Field(TextField),
    /// Anything else.
    Unsupported,
}

impl CaretHost {
    fn of(element: &Element) -> Self {
        if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
            if input.type_().eq_ignore_ascii_case("password") {
                return CaretHost::Password;
            }
        }
        if element
            .dyn_ref::<HtmlElement>()
            .is_some_and(HtmlElement::is_content_editable)
        {
            return CaretHost::Editable;
        }
        if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
            return CaretHost::Field(TextField::Input(input.clone()));
        }
        if let Some(area) = element.dyn_ref::<HtmlTextAreaElement>() {
            return CaretHost::Field(TextField::TextArea(area.clone()));
        }
        CaretHost::Unsupported
    }
}

/// Locates the text caret of input elements.
#[derive(Debug)]
pub struct CaretLocator {
    /// Window.
    window: Window,
    /// Document.
    document: Document,
    /// Mirror for plain text fields, created on first use.
    mirror: Option<Mirror>,
}

impl CaretLocator {
    /// Constructs a new [`CaretLocator`] for the current document.
    pub fn new() -> Result<Self, Error> {
        Ok(Self {
            window: get_window()?,
            document: get_document()?,
            mirror: None,
        })
    }

    /// Returns the caret position of `element` in viewport coordinates.
    ///
    /// Returns `None` for password fields, unsupported elements and whenever
    /// the caret cannot be measured.
    pub fn detect(&mut self, element: &Element) -> Option<Point> {
        match CaretHost::of(element) {
            CaretHost::Password | CaretHost::Unsupported => None,
            CaretHost::Editable => editable::locate(&self.window, &self.document, element),
            CaretHost::Field(field) => match self.measure_field(&field) {
                Ok(point) => Some(point),
                Err(err) => {
                    log::trace!("caret measurement failed: {err}");
                    None
                }
            },
        }
    }

    fn measure_field(&mut self, field: &TextField) -> Result<Point, Error> {
        let mirror = match self.mirror.take() {
            Some(mirror) => mirror,
            None => Mirror::new(&self.document)?,
        };
        let result = mirror.measure(&self.window, &self.document, field);
        self.mirror = Some(mirror);
        result
    }

    /// Removes the mirror element from the document.
    pub fn teardown(&mut self) {
        if let Some(mirror) = self.mirror.take() {
            mirror.remove();
        }
    }
}
