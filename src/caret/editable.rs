use web_sys::{Document, Element, Range, Selection, Window};

use crate::{
    error::Error,
    geometry::{Point, Rect},
};

use super::INSIDE_MARGIN;

/// Zero-width space, so the probe has a line box but no visible width.
const PROBE_TEXT: &str = "\u{200B}";

/// A temporary `<span>` inserted at the caret to force a layout box.
///
/// Dropping the probe removes the span and puts the user's selection back,
/// whether or not the insertion succeeded.
struct CaretProbe<'a> {
    selection: &'a Selection,
    original: &'a Range,
    span: Element,
}

impl<'a> CaretProbe<'a> {
    fn new(
        document: &Document,
        selection: &'a Selection,
        original: &'a Range,
    ) -> Result<Self, Error> {
        let span = document.create_element("span")?;
        span.set_text_content(Some(PROBE_TEXT));
        Ok(Self {
            selection,
            original,
            span,
        })
    }

    /// Inserts the span at `range` and returns its box.
    fn measure(&self, range: &Range) -> Result<Rect, Error> {
        range.insert_node(&self.span)?;
        Ok(Rect::from(self.span.get_bounding_client_rect()))
    }
}

impl Drop for CaretProbe<'_> {
    fn drop(&mut self) {
        self.span.remove();
        if let Err(err) = self
            .selection
            .remove_all_ranges()
            .and_then(|_| self.selection.add_range(self.original))
        {
            log::warn!("failed to restore the selection: {err:?}");
        }
    }
}

/// Finds the caret of a contenteditable element from the document selection.
pub(crate) fn locate(window: &Window, document: &Document, element: &Element) -> Option<Point> {
    let selection = window.get_selection().ok()??;
    if selection.range_count() == 0 {
        return None;
    }
    let original = selection.get_range_at(0).ok()?.clone_range();
    let range = original.clone_range();
    range.collapse_with_to_start(true);

    let rect = client_rect(&range)
        .or_else(|| bounding_rect(&range))
        .or_else(|| match probe_rect(document, &selection, &original, &range) {
            Ok(rect) => rect,
            Err(err) => {
                log::trace!("caret probe failed: {err}");
                None
            }
        })?;

    let bounds = Rect::from(element.get_bounding_client_rect());
    if !rect.is_near(&bounds, INSIDE_MARGIN) {
        log::trace!("caret {rect:?} is outside of {bounds:?}");
        return None;
    }
    Some(rect.caret_anchor())
}

/// First client rect of the collapsed range.
fn client_rect(range: &Range) -> Option<Rect> {
    range
        .get_client_rects()?
        .get(0)
        .map(Rect::from)
        .filter(Rect::is_usable)
}

/// Bounding rect of the collapsed range.
fn bounding_rect(range: &Range) -> Option<Rect> {
    Some(Rect::from(range.get_bounding_client_rect())).filter(Rect::is_usable)
}

/// Box of a temporary marker inserted at the range.
fn probe_rect(
    document: &Document,
    selection: &Selection,
    original: &Range,
    range: &Range,
) -> Result<Option<Rect>, Error> {
    let probe = CaretProbe::new(document, selection, original)?;
    let rect = probe.measure(range)?;
    Ok(Some(rect).filter(Rect::is_usable))
}
