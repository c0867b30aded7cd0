use unicode_width::UnicodeWidthChar;
use web_sys::{wasm_bindgen::JsCast, Element};

/// A text entry event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypingEvent {
    /// The triggered event.
    pub kind: TypingEventKind,
    /// The inserted text, if the event carries any.
    pub data: Option<String>,
}

/// The kind of a [`TypingEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypingEventKind {
    /// Text was inserted or deleted (`input`).
    Input,
    /// An IME composition started (`compositionstart`).
    CompositionStart,
    /// An IME composition was committed or cancelled (`compositionend`).
    CompositionEnd,
    /// Unidentified event.
    Unidentified,
}

impl TypingEvent {
    /// Returns the last character of the inserted text that takes up space.
    ///
    /// Combining marks and other zero-width characters are skipped so that the
    /// glyph used by text-aware effects matches what the user sees.
    pub fn last_visible_char(&self) -> Option<char> {
        last_visible_char(self.data.as_deref()?)
    }
}

/// Returns the last character of `text` with a non-zero display width.
pub fn last_visible_char(text: &str) -> Option<char> {
    text.chars()
        .rev()
        .find(|c| c.width().is_some_and(|width| width > 0))
}

/// Convert an event type string to a [`TypingEventKind`].
impl From<&str> for TypingEventKind {
    fn from(event_type: &str) -> Self {
        match event_type {
            "input" => TypingEventKind::Input,
            "compositionstart" => TypingEventKind::CompositionStart,
            "compositionend" => TypingEventKind::CompositionEnd,
            _ => TypingEventKind::Unidentified,
        }
    }
}

/// Convert a [`web_sys::Event`] to a [`TypingEvent`].
///
/// Only `InputEvent` and `CompositionEvent` carry data.
impl From<&web_sys::Event> for TypingEvent {
    fn from(event: &web_sys::Event) -> Self {
        let data = if let Some(input) = event.dyn_ref::<web_sys::InputEvent>() {
            input.data()
        } else if let Some(composition) = event.dyn_ref::<web_sys::CompositionEvent>() {
            composition.data()
        } else {
            None
        };
        TypingEvent {
            kind: event.type_().as_str().into(),
            data,
        }
    }
}

/// Returns the element the event was originally dispatched to.
///
/// Events retargeted across open shadow roots report the host as `target`;
/// the first entry of `composedPath()` is the real text field.
pub fn event_source_element(event: &web_sys::Event) -> Option<Element> {
    event
        .composed_path()
        .get(0)
        .dyn_into::<Element>()
        .ok()
        .or_else(|| event.target()?.dyn_into::<Element>().ok())
}
