#![warn(missing_docs, clippy::unwrap_used)]
#![doc = include_str!("../README.md")]

/// Custom error type.
pub mod error;

/// Points and rectangles in viewport coordinates.
pub mod geometry;

/// Web utility functions.
pub mod utils;

/// Color conversions.
pub mod color;

/// Event/input handling.
pub mod event;

/// Event listener lifetimes.
pub(crate) mod event_callback;

/// Drawing surfaces.
pub mod surface;

/// Particle effects.
pub mod effects;

/// Particle engine.
pub mod engine;

/// Caret detection.
pub mod caret;

/// User settings.
pub mod settings;

/// Console logging.
pub mod logging;

/// Overlay orchestration.
pub mod overlay;

// Re-export ratatui crate.
pub use ratatui;

// Re-export web_sys crate.
pub use web_sys;

pub use caret::CaretLocator;
pub use effects::{Effect, EffectKind, EffectRegistry, Intensity, SpawnContext};
pub use engine::{LoopState, ParticleEngine};
pub use error::Error;
pub use overlay::{OverlayOptions, TypingOverlay};
pub use settings::{Settings, SettingsUpdate};
pub use surface::canvas::{GlyphRasterizer, OverlaySurface, OverlaySurfaceOptions};
