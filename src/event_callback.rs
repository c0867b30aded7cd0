//! Event callback management with automatic cleanup.
//!
//! This module provides utilities for managing web event listeners with proper
//! lifecycle management. The overlay listens on the document in the capture
//! phase so that pages stopping propagation on their own inputs do not hide
//! keystrokes from it.

use std::fmt::Formatter;
use web_sys::{
    wasm_bindgen::{convert::FromWasmAbi, prelude::Closure, JsCast},
    EventTarget,
};

use crate::error::Error;

/// Manages web event listeners with automatic cleanup.
///
/// When this struct is dropped, all registered event listeners are removed
/// from the target, preventing memory leaks.
pub(crate) struct EventCallback<T: 'static> {
    /// The event types this callback is registered for.
    event_types: &'static [&'static str],
    /// The target the listeners are attached to.
    target: EventTarget,
    /// Whether the listeners run in the capture phase.
    capture: bool,
    /// The closure that handles the events.
    closure: Closure<dyn FnMut(T)>,
}

impl<T: 'static> EventCallback<T> {
    /// Creates a new [`EventCallback`] and attaches bubble-phase listeners to the target.
    pub fn new<F>(
        target: EventTarget,
        event_types: &'static [&'static str],
        callback: F,
    ) -> Result<Self, Error>
    where
        F: FnMut(T) + 'static,
        T: JsCast + FromWasmAbi,
    {
        Self::with_capture(target, event_types, false, callback)
    }

    /// Creates a new [`EventCallback`], choosing the listener phase.
    pub fn with_capture<F>(
        target: EventTarget,
        event_types: &'static [&'static str],
        capture: bool,
        callback: F,
    ) -> Result<Self, Error>
    where
        F: FnMut(T) + 'static,
        T: JsCast + FromWasmAbi,
    {
        let closure = Closure::<dyn FnMut(T)>::new(callback);

        for event_type in event_types {
            target.add_event_listener_with_callback_and_bool(
                event_type,
                closure.as_ref().unchecked_ref(),
                capture,
            )?;
        }

        Ok(Self {
            event_types,
            target,
            capture,
            closure,
        })
    }
}

impl<T: 'static> Drop for EventCallback<T> {
    fn drop(&mut self) {
        for event_type in self.event_types {
            let _ = self.target.remove_event_listener_with_callback_and_bool(
                event_type,
                self.closure.as_ref().unchecked_ref(),
                self.capture,
            );
        }
    }
}

impl<T: 'static> std::fmt::Debug for EventCallback<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventCallback")
            .field("event_types", &self.event_types)
            .field("target", &self.target)
            .field("capture", &self.capture)
            .finish()
    }
}

/// Event types that carry typed text.
pub(crate) const INPUT_EVENT_TYPES: &[&str] = &["input"];

/// IME composition event types.
pub(crate) const COMPOSITION_EVENT_TYPES: &[&str] = &["compositionstart", "compositionend"];
