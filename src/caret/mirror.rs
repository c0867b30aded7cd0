use web_sys::{
    wasm_bindgen::JsCast, Document, Element, HtmlElement, HtmlInputElement, HtmlTextAreaElement,
    Window,
};

use crate::{
    error::Error,
    geometry::{Point, Rect},
    utils::{get_body, get_computed_style, set_styles},
};

/// Element ID of the mirror.
pub const MIRROR_ID: &str = "__tp_mirror";

/// Marker content when the caret sits at the end of the text.
const END_MARKER: &str = " ";

/// Computed properties that affect where text wraps and how wide it is.
const MIRRORED_PROPERTIES: [&str; 25] = [
    "font-family",
    "font-size",
    "font-weight",
    "font-style",
    "letter-spacing",
    "word-spacing",
    "text-transform",
    "text-indent",
    "text-decoration",
    "line-height",
    "padding-top",
    "padding-right",
    "padding-bottom",
    "padding-left",
    "border-top-width",
    "border-right-width",
    "border-bottom-width",
    "border-left-width",
    "box-sizing",
    "direction",
    "text-align",
    "white-space",
    "word-wrap",
    "overflow-wrap",
    "tab-size",
];

/// A plain text field.
#[derive(Debug, Clone)]
pub(crate) enum TextField {
    /// `<input>`.
    Input(HtmlInputElement),
    /// `<textarea>`.
    TextArea(HtmlTextAreaElement),
}

impl TextField {
    /// Returns the field's value.
    fn value(&self) -> String {
        match self {
            TextField::Input(input) => input.value(),
            TextField::TextArea(area) => area.value(),
        }
    }

    /// Caret offset in UTF-16 code units, if the field reports one.
    fn selection_start(&self) -> Option<u32> {
        let start = match self {
            TextField::Input(input) => input.selection_start(),
            TextField::TextArea(area) => area.selection_start(),
        };
        start.ok().flatten()
    }

    fn element(&self) -> &Element {
        match self {
            TextField::Input(input) => input.unchecked_ref(),
            TextField::TextArea(area) => area.unchecked_ref(),
        }
    }
}

/// Splits `text` at a UTF-16 offset, as the DOM counts selection offsets.
///
/// An offset past the end, or inside a surrogate pair, splits after the
/// character it falls into.
pub(crate) fn split_at_utf16(text: &str, offset: usize) -> (&str, &str) {
    let mut units = 0;
    for (index, c) in text.char_indices() {
        if units >= offset {
            return text.split_at(index);
        }
        units += c.len_utf16();
    }
    (text, "")
}

/// Caret offset in UTF-16 units, the end of `value` when the field has none.
pub(crate) fn caret_offset(value: &str, selection_start: Option<u32>) -> usize {
    selection_start.map_or_else(|| value.encode_utf16().count(), |offset| offset as usize)
}

/// Splits the text after the caret into the marker content and the rest.
///
/// The marker holds the next character, or [`END_MARKER`] at the end.
pub(crate) fn split_marker<'a>(after: &'a str, buffer: &'a mut [u8; 4]) -> (&'a str, &'a str) {
    let mut chars = after.chars();
    match chars.next() {
        Some(c) => (&*c.encode_utf8(buffer), chars.as_str()),
        None => (END_MARKER, ""),
    }
}

/// Maps the marker position in the mirror back onto the field.
pub(crate) fn mirror_anchor(field: Rect, mirror: Rect, marker: Rect, scroll: Point) -> Point {
    Point::new(
        field.left + (marker.left - mirror.left) - scroll.x,
        field.top + (marker.top - mirror.top) - scroll.y + marker.height * 0.5,
    )
}

/// Off-screen copy of a text field used to measure where its caret is.
///
/// The field's text up to the caret is laid out with the same font and box
/// metrics, followed by a marker `<span>` whose box is the caret position.
#[derive(Debug)]
pub(crate) struct Mirror {
    element: HtmlElement,
}

impl Mirror {
    /// Creates the mirror `<div>`. It is attached by [`Mirror::measure`].
    pub fn new(document: &Document) -> Result<Self, Error> {
        let element: HtmlElement = document.create_element("div")?.unchecked_into();
        element.set_id(MIRROR_ID);
        set_styles(
            &element,
            &[
                ("position", "absolute"),
                ("top", "-9999px"),
                ("left", "-9999px"),
                ("visibility", "hidden"),
                ("white-space", "pre-wrap"),
                ("word-wrap", "break-word"),
                ("overflow", "hidden"),
            ],
        )?;
        Ok(Self { element })
    }

    /// Appends the mirror to the body unless it is already in the document.
    fn attach(&self, document: &Document) -> Result<(), Error> {
        let body = get_body(document)?;
        if !body.contains(Some(self.element.as_ref())) {
            log::trace!("attaching caret mirror");
            body.append_child(&self.element)?;
        }
        Ok(())
    }

    /// Copies the field's layout into the mirror and measures the caret.
    pub fn measure(
        &self,
        window: &Window,
        document: &Document,
        field: &TextField,
    ) -> Result<Point, Error> {
        self.attach(document)?;
        let source = field.element();
        let computed = get_computed_style(window, source)?;
        let style = self.element.style();
        for property in MIRRORED_PROPERTIES {
            style.set_property(property, &computed.get_property_value(property)?)?;
        }

        let field_rect = Rect::from(source.get_bounding_client_rect());
        style.set_property("width", &format!("{}px", field_rect.width))?;
        match field {
            TextField::Input(_) => {
                style.set_property("white-space", "nowrap")?;
                style.set_property("height", "auto")?;
            }
            TextField::TextArea(_) => {
                style.set_property("height", &format!("{}px", field_rect.height))?;
            }
        }

        let value = field.value();
        let caret = caret_offset(&value, field.selection_start());
        let (before, after) = split_at_utf16(&value, caret);
        let mut buffer = [0; 4];
        let (marked, rest) = split_marker(after, &mut buffer);

        self.element.set_text_content(None);
        self.element
            .append_child(&document.create_text_node(before))?;
        let marker = document.create_element("span")?;
        marker.set_text_content(Some(marked));
        self.element.append_child(&marker)?;
        self.element
            .append_child(&document.create_text_node(rest))?;

        let scroll = Point::new(source.scroll_left() as f64, source.scroll_top() as f64);
        self.element.set_scroll_top(source.scroll_top());
        self.element.set_scroll_left(source.scroll_left());

        Ok(mirror_anchor(
            field_rect,
            Rect::from(self.element.get_bounding_client_rect()),
            Rect::from(marker.get_bounding_client_rect()),
            scroll,
        ))
    }

    /// Detaches the mirror from the document.
    pub fn remove(&self) {
        self.element.remove();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_at_utf16() {
        assert_eq!(split_at_utf16("hello", 2), ("he", "llo"));
        assert_eq!(split_at_utf16("hello", 0), ("", "hello"));
        assert_eq!(split_at_utf16("hello", 99), ("hello", ""));
        assert_eq!(split_at_utf16("héllo", 2), ("hé", "llo"));
        // U+1F600 takes two UTF-16 units.
        assert_eq!(split_at_utf16("a😀b", 3), ("a😀", "b"));
        assert_eq!(split_at_utf16("a😀b", 2), ("a😀", "b"));
        assert_eq!(split_at_utf16("", 1), ("", ""));
    }

    #[test]
    fn test_caret_offset_counts_utf16_units() {
        assert_eq!(caret_offset("héllo", Some(2)), 2);
        assert_eq!(caret_offset("héllo", None), 5);
        assert_eq!(caret_offset("a😀b", None), 4);
        assert_eq!(caret_offset("", None), 0);
        let value = "a😀b";
        assert_eq!(split_at_utf16(value, caret_offset(value, None)), (value, ""));
    }

    #[test]
    fn test_split_marker() {
        let mut buffer = [0; 4];
        assert_eq!(split_marker("llo", &mut buffer), ("l", "lo"));
        let mut buffer = [0; 4];
        assert_eq!(split_marker("😀b", &mut buffer), ("😀", "b"));
        let mut buffer = [0; 4];
        assert_eq!(split_marker("", &mut buffer), (" ", ""));
    }

    #[test]
    fn test_mirror_anchor() {
        let field = Rect::new(100.0, 50.0, 200.0, 24.0);
        let mirror = Rect::new(-9999.0, -9999.0, 200.0, 24.0);
        let marker = Rect::new(-9959.0, -9995.0, 8.0, 16.0);
        assert_eq!(
            mirror_anchor(field, mirror, marker, Point::default()),
            Point::new(140.0, 62.0)
        );
        assert_eq!(
            mirror_anchor(field, mirror, marker, Point::new(10.0, 2.0)),
            Point::new(130.0, 60.0)
        );
    }
}
