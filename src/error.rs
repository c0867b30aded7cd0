use thiserror::Error as ThisError;
use web_sys::wasm_bindgen::JsValue;

/// Error type.
#[derive(Debug, ThisError)]
pub enum Error {
    /// Unable to retrieve the window.
    #[error("Unable to retrieve the window")]
    UnableToRetrieveWindow,

    /// Unable to retrieve the document.
    #[error("Unable to retrieve the document")]
    UnableToRetrieveDocument,

    /// Unable to retrieve the document body.
    #[error("Unable to retrieve the document body")]
    UnableToRetrieveBody,

    /// Unable to retrieve the 2D context of a canvas.
    #[error("Unable to retrieve the canvas context")]
    UnableToRetrieveCanvasContext,

    /// An effect name that is not part of [`EffectKind`](crate::effects::EffectKind).
    #[error("Unknown effect: {0}")]
    UnknownEffect(String),

    /// An effect was registered under a kind it does not report.
    #[error("Effect {actual} cannot be registered as {expected}")]
    MismatchedEffect {
        /// The slot the effect was registered for.
        expected: String,
        /// The kind reported by the effect itself.
        actual: String,
    },

    /// An exported entry point was called before `startTypingParticles`.
    #[error("Typing overlay is not started")]
    NotInitialized,

    /// Error coming from the JavaScript side.
    #[error("JS error: {0}")]
    JsValue(String),
}

impl From<JsValue> for Error {
    fn from(value: JsValue) -> Self {
        Self::JsValue(format!("{value:?}"))
    }
}

impl From<Error> for JsValue {
    fn from(error: Error) -> Self {
        JsValue::from_str(&error.to_string())
    }
}
