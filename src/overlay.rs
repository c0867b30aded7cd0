//! ## Typing overlay
//!
//! [`TypingOverlay`] wires the pieces together: document-level listeners
//! feed typing events to the [`CaretLocator`], whose point is handed to the
//! [`ParticleEngine`] together with a [`SpawnContext`] describing the typed
//! character. The engine draws on an [`OverlaySurface`] and is driven by
//! [`AnimationFrameScheduler`].
//!
//! The `wasm_bindgen` exports at the bottom of this module keep one overlay
//! per thread so that a page script can start and steer it.

use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use log::LevelFilter;
use wasm_bindgen::prelude::*;
use web_sys::{Element, Window};

use crate::{
    caret::CaretLocator,
    color::{parse_css_rgb, relative_luminance},
    effects::{EffectKind, EffectRegistry, FontSpec, Intensity, SpawnContext},
    engine::{AnimationFrameScheduler, ParticleEngine, DEFAULT_POOL_SIZE},
    error::Error,
    event::{event_source_element, TypingEvent, TypingEventKind},
    event_callback::{EventCallback, COMPOSITION_EVENT_TYPES, INPUT_EVENT_TYPES},
    logging,
    settings::{Settings, SettingsUpdate},
    surface::canvas::{GlyphRasterizer, OverlaySurface, OverlaySurfaceOptions},
    utils::{get_computed_style, get_document, get_window, now_ms, random_seed},
};

/// Minimum time between two spawns, in milliseconds.
pub const DEFAULT_THROTTLE_MS: f64 = 16.0;

/// Font size used when the computed one cannot be parsed.
const FALLBACK_FONT_SIZE: f64 = 16.0;

/// Luminance below which a background counts as dark.
const DARK_LUMINANCE: f64 = 0.5;

type OverlayEngine = ParticleEngine<OverlaySurface, AnimationFrameScheduler>;

/// Options for the [`TypingOverlay`].
#[derive(Debug, Clone)]
pub struct OverlayOptions {
    /// Number of particles in the pool.
    pool_size: usize,
    /// Initial effect.
    effect: EffectKind,
    /// Initial intensity.
    intensity: f64,
    /// Host the canvas in a closed shadow root.
    shadow_dom: bool,
    /// Minimum time between two spawns.
    throttle_ms: f64,
    /// Maximum level forwarded to the console.
    log_level: LevelFilter,
}

impl Default for OverlayOptions {
    fn default() -> Self {
        let settings = Settings::default();
        Self {
            pool_size: DEFAULT_POOL_SIZE,
            effect: settings.effect,
            intensity: settings.intensity,
            shadow_dom: true,
            throttle_ms: DEFAULT_THROTTLE_MS,
            log_level: LevelFilter::Warn,
        }
    }
}

impl OverlayOptions {
    /// Constructs a new [`OverlayOptions`].
    pub fn new() -> Self {
        Default::default()
    }

    /// Sets the pool size. Zero selects the default size.
    pub fn pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    /// Sets the initial effect.
    pub fn effect(mut self, effect: EffectKind) -> Self {
        self.effect = effect;
        self
    }

    /// Sets the initial intensity. Clamped into range.
    pub fn intensity(mut self, intensity: f64) -> Self {
        self.intensity = Intensity::new(intensity).get();
        self
    }

    /// Sets whether the canvas lives in a closed shadow root.
    pub fn shadow_dom(mut self, enabled: bool) -> Self {
        self.shadow_dom = enabled;
        self
    }

    /// Sets the minimum time between two spawns.
    pub fn throttle_ms(mut self, throttle_ms: f64) -> Self {
        self.throttle_ms = throttle_ms.max(0.0);
        self
    }

    /// Sets the log level.
    pub fn log_level(mut self, level: LevelFilter) -> Self {
        self.log_level = level;
        self
    }
}

/// Particle effects anchored at the caret of whatever field the user types in.
pub struct TypingOverlay {
    /// Window.
    window: Window,
    /// Engine, shared with the frame callback.
    engine: Rc<RefCell<OverlayEngine>>,
    /// Caret locator.
    locator: RefCell<CaretLocator>,
    /// Available effects.
    registry: EffectRegistry,
    /// Measures and rasterizes typed characters.
    rasterizer: GlyphRasterizer,
    /// Current settings.
    settings: Cell<Settings>,
    /// Minimum time between two spawns.
    throttle_ms: f64,
    /// Whether an IME composition is in progress.
    composing: Cell<bool>,
    /// Time of the last spawn.
    last_spawn: Cell<Option<f64>>,
    /// Document listeners.
    listeners: RefCell<Vec<EventCallback<web_sys::Event>>>,
}

impl std::fmt::Debug for TypingOverlay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypingOverlay")
            .field("settings", &self.settings.get())
            .field("composing", &self.composing.get())
            .field("listeners", &self.listeners.borrow().len())
            .finish()
    }
}

impl TypingOverlay {
    /// Attaches the overlay to the current document and starts listening.
    pub fn start(options: OverlayOptions) -> Result<Rc<Self>, Error> {
        logging::init(options.log_level);
        let window = get_window()?;
        let document = get_document()?;

        let surface = OverlaySurface::new_with_options(
            OverlaySurfaceOptions::new().shadow_dom(options.shadow_dom),
        )?;
        let scheduler = AnimationFrameScheduler::new()?;
        let mut engine = ParticleEngine::new(surface, scheduler).with_seed(random_seed());
        engine.initialize(options.pool_size);

        let registry = EffectRegistry::builtin();
        let settings = Settings {
            enabled: true,
            effect: options.effect,
            intensity: options.intensity,
        };
        let effect = registry
            .get(settings.effect)
            .unwrap_or_else(|| settings.effect.builtin());
        engine.set_effect(effect);

        let engine = Rc::new(RefCell::new(engine));
        let weak_engine = Rc::downgrade(&engine);
        engine.borrow().scheduler().set_callback(move || {
            if let Some(engine) = weak_engine.upgrade() {
                engine.borrow_mut().tick();
            }
        });

        let overlay = Rc::new(Self {
            window,
            engine,
            locator: RefCell::new(CaretLocator::new()?),
            registry,
            rasterizer: GlyphRasterizer::new()?,
            settings: Cell::new(settings),
            throttle_ms: options.throttle_ms,
            composing: Cell::new(false),
            last_spawn: Cell::new(None),
            listeners: RefCell::new(Vec::new()),
        });

        let target: web_sys::EventTarget = document.into();
        let listeners = [INPUT_EVENT_TYPES, COMPOSITION_EVENT_TYPES]
            .into_iter()
            .map(|event_types| {
                let weak = Rc::downgrade(&overlay);
                EventCallback::with_capture(
                    target.clone(),
                    event_types,
                    true,
                    move |event: web_sys::Event| {
                        if let Some(overlay) = weak.upgrade() {
                            overlay.handle_event(&event);
                        }
                    },
                )
            })
            .collect::<Result<Vec<_>, _>>()?;
        *overlay.listeners.borrow_mut() = listeners;

        log::info!(
            "typing overlay started with {} ({} particles)",
            settings.effect,
            overlay.engine.borrow().capacity()
        );
        Ok(overlay)
    }

    /// Returns the current settings.
    pub fn settings(&self) -> Settings {
        self.settings.get()
    }

    /// Merges `update` into the settings.
    ///
    /// While enabled, the selected effect is (re)installed; disabling clears
    /// every particle in flight.
    pub fn apply(&self, update: &SettingsUpdate) {
        let mut settings = self.settings.get();
        settings.apply(update);
        self.settings.set(settings);

        let mut engine = self.engine.borrow_mut();
        if settings.enabled {
            if engine.effect_kind() != Some(settings.effect) {
                let effect = self
                    .registry
                    .get(settings.effect)
                    .unwrap_or_else(|| settings.effect.builtin());
                engine.set_effect(effect);
            }
        } else {
            engine.clear();
        }
    }

    /// Number of particles in flight.
    pub fn active_count(&self) -> usize {
        self.engine.borrow().active_count()
    }

    /// Stops listening, clears the engine and removes every element the
    /// overlay added to the document.
    pub fn stop(&self) {
        self.listeners.borrow_mut().clear();
        let mut engine = self.engine.borrow_mut();
        engine.teardown();
        engine.surface_mut().destroy();
        self.locator.borrow_mut().teardown();
        log::info!("typing overlay stopped");
    }

    fn handle_event(&self, event: &web_sys::Event) {
        let typing = TypingEvent::from(event);
        match typing.kind {
            TypingEventKind::CompositionStart => self.composing.set(true),
            TypingEventKind::CompositionEnd => {
                self.composing.set(false);
                self.handle_input(event, &typing);
            }
            TypingEventKind::Input => self.handle_input(event, &typing),
            TypingEventKind::Unidentified => {}
        }
    }

    fn handle_input(&self, event: &web_sys::Event, typing: &TypingEvent) {
        let settings = self.settings.get();
        if !settings.enabled || self.composing.get() {
            return;
        }
        if settings.effect.needs_character() && typing.last_visible_char().is_none() {
            return;
        }

        let now = now_ms(&self.window);
        if self
            .last_spawn
            .get()
            .is_some_and(|last| now - last < self.throttle_ms)
        {
            return;
        }
        self.last_spawn.set(Some(now));

        let Some(target) = event_source_element(event) else {
            return;
        };
        let Some(point) = self.locator.borrow_mut().detect(&target) else {
            return;
        };

        let context = match self.spawn_context(&target, typing, settings.effect) {
            Ok(context) => Some(context),
            Err(err) => {
                log::debug!("spawning without context: {err}");
                None
            }
        };
        let spawned =
            self.engine
                .borrow_mut()
                .spawn(point, settings.intensity(), context.as_ref());
        log::trace!("spawned {spawned} particles at {point:?}");
    }

    /// Describes the typed character and the field it was typed into.
    fn spawn_context(
        &self,
        target: &Element,
        typing: &TypingEvent,
        effect: EffectKind,
    ) -> Result<SpawnContext, Error> {
        let style = get_computed_style(&self.window, target)?;
        let font = FontSpec {
            family: style.get_property_value("font-family")?.into(),
            size: parse_px(&style.get_property_value("font-size")?)
                .unwrap_or(FALLBACK_FONT_SIZE),
            weight: match style.get_property_value("font-weight")? {
                weight if weight.is_empty() => FontSpec::default().weight,
                weight => weight.into(),
            },
        };

        let character = typing.last_visible_char();
        let text = character.map(String::from);
        let char_width = match text.as_deref() {
            Some(text) => self.rasterizer.measure(text, &font)?,
            None => 0.0,
        };
        let glyph = match text.as_deref() {
            Some(text) if effect.needs_glyph_mask() => {
                Some(self.rasterizer.rasterize(text, &font)?)
            }
            _ => None,
        };

        Ok(SpawnContext {
            character,
            font,
            char_width,
            dark_background: self.has_dark_background(target),
            glyph,
        })
    }

    /// Whether the first opaque background behind `element` is dark.
    fn has_dark_background(&self, element: &Element) -> bool {
        let mut current = Some(element.clone());
        while let Some(element) = current {
            let background = get_computed_style(&self.window, &element)
                .and_then(|style| {
                    style
                        .get_property_value("background-color")
                        .map_err(Error::from)
                });
            if let Some((rgb, alpha)) = background.ok().as_deref().and_then(parse_css_rgb) {
                if alpha > 0.0 {
                    return relative_luminance(rgb) < DARK_LUMINANCE;
                }
            }
            current = element.parent_element();
        }
        false
    }
}

/// Parses a CSS pixel length such as `16px`.
fn parse_px(value: &str) -> Option<f64> {
    value
        .trim()
        .trim_end_matches("px")
        .parse::<f64>()
        .ok()
        .filter(|size| size.is_finite() && *size > 0.0)
}

thread_local! {
    static OVERLAY: RefCell<Option<Rc<TypingOverlay>>> = const { RefCell::new(None) };
}

fn with_overlay<R>(f: impl FnOnce(&TypingOverlay) -> R) -> Result<R, JsValue> {
    OVERLAY.with(|overlay| match overlay.borrow().as_ref() {
        Some(overlay) => Ok(f(overlay)),
        None => Err(Error::NotInitialized.into()),
    })
}

/// Starts the overlay on the current page. Calling it again does nothing.
#[wasm_bindgen(js_name = startTypingParticles)]
pub fn start_typing_particles() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    OVERLAY.with(|overlay| {
        if overlay.borrow().is_some() {
            return Ok(());
        }
        let started = TypingOverlay::start(OverlayOptions::default())?;
        *overlay.borrow_mut() = Some(started);
        Ok(())
    })
}

/// Stops the overlay and removes it from the page.
#[wasm_bindgen(js_name = stopTypingParticles)]
pub fn stop_typing_particles() {
    if let Some(overlay) = OVERLAY.with(|overlay| overlay.borrow_mut().take()) {
        overlay.stop();
    }
}

/// Selects an effect by name. Unknown names select `burst`.
#[wasm_bindgen(js_name = setEffect)]
pub fn set_effect(name: &str) -> Result<(), JsValue> {
    with_overlay(|overlay| overlay.apply(&SettingsUpdate::new().effect_name(name)))
}

/// Sets the particle density, clamped to `[0.1, 1.0]`.
#[wasm_bindgen(js_name = setIntensity)]
pub fn set_intensity(intensity: f64) -> Result<(), JsValue> {
    with_overlay(|overlay| overlay.apply(&SettingsUpdate::new().intensity(intensity)))
}

/// Enables or disables the overlay.
#[wasm_bindgen(js_name = setEnabled)]
pub fn set_enabled(enabled: bool) -> Result<(), JsValue> {
    with_overlay(|overlay| overlay.apply(&SettingsUpdate::new().enabled(enabled)))
}

/// Number of particles in flight, or zero if the overlay is not running.
#[wasm_bindgen(js_name = activeCount)]
pub fn active_count() -> usize {
    with_overlay(TypingOverlay::active_count).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_px() {
        assert_eq!(parse_px("16px"), Some(16.0));
        assert_eq!(parse_px(" 13.5px"), Some(13.5));
        assert_eq!(parse_px("auto"), None);
        assert_eq!(parse_px("0px"), None);
    }

    #[test]
    fn test_options_clamp() {
        let options = OverlayOptions::new().intensity(4.0).throttle_ms(-1.0);
        assert_eq!(options.intensity, Intensity::MAX);
        assert_eq!(options.throttle_ms, 0.0);
        assert_eq!(OverlayOptions::default().effect, EffectKind::Burst);
    }
}
