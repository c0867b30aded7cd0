use web_sys::{js_sys, CssStyleDeclaration, Document, Element, HtmlElement, Window};

use crate::error::Error;

/// Returns the global [`Window`].
pub fn get_window() -> Result<Window, Error> {
    web_sys::window().ok_or(Error::UnableToRetrieveWindow)
}

/// Returns the [`Document`] of the global window.
pub fn get_document() -> Result<Document, Error> {
    get_window()?
        .document()
        .ok_or(Error::UnableToRetrieveDocument)
}

/// Returns the `<body>` of the document.
pub fn get_body(document: &Document) -> Result<HtmlElement, Error> {
    document.body().ok_or(Error::UnableToRetrieveBody)
}

/// Returns the device pixel ratio, defaulting to 1.0 when it is not reported.
pub fn get_device_pixel_ratio(window: &Window) -> f64 {
    let ratio = window.device_pixel_ratio();
    if ratio > 0.0 {
        ratio
    } else {
        1.0
    }
}

/// Returns the inner size of the window in CSS pixels.
pub fn get_viewport_size(window: &Window) -> (f64, f64) {
    let width = window
        .inner_width()
        .ok()
        .and_then(|w| w.as_f64())
        .unwrap_or(0.0);
    let height = window
        .inner_height()
        .ok()
        .and_then(|h| h.as_f64())
        .unwrap_or(0.0);
    (width, height)
}

/// Returns the computed style of an element.
pub fn get_computed_style(window: &Window, element: &Element) -> Result<CssStyleDeclaration, Error> {
    window
        .get_computed_style(element)?
        .ok_or_else(|| Error::JsValue("computed style unavailable".into()))
}

/// Returns a high resolution timestamp in milliseconds.
pub fn now_ms(window: &Window) -> f64 {
    window
        .performance()
        .map(|performance| performance.now())
        .unwrap_or_else(js_sys::Date::now)
}

/// Returns a seed for the effect random number generator.
pub fn random_seed() -> u64 {
    (js_sys::Math::random() * u64::MAX as f64) as u64
}

/// Sets several inline style properties on an element.
pub fn set_styles(element: &HtmlElement, styles: &[(&str, &str)]) -> Result<(), Error> {
    let style = element.style();
    for (property, value) in styles {
        style.set_property(property, value)?;
    }
    Ok(())
}
