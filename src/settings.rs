use crate::effects::{EffectKind, Intensity};

/// User settings of the overlay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settings {
    /// Whether typing spawns particles.
    pub enabled: bool,
    /// The selected effect.
    pub effect: EffectKind,
    /// Particle density in `[0.1, 1.0]`.
    pub intensity: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enabled: true,
            effect: EffectKind::default(),
            intensity: Intensity::default().get(),
        }
    }
}

impl Settings {
    /// Merges the fields present in `update`.
    ///
    /// The intensity is clamped into range.
    pub fn apply(&mut self, update: &SettingsUpdate) {
        if let Some(enabled) = update.enabled {
            self.enabled = enabled;
        }
        if let Some(effect) = update.effect {
            self.effect = effect;
        }
        if let Some(intensity) = update.intensity {
            self.intensity = Intensity::new(intensity).get();
        }
    }

    /// The intensity as handed to effects.
    pub fn intensity(&self) -> Intensity {
        Intensity::new(self.intensity)
    }
}

/// A partial change of [`Settings`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SettingsUpdate {
    /// New enabled flag.
    pub enabled: Option<bool>,
    /// New effect.
    pub effect: Option<EffectKind>,
    /// New intensity.
    pub intensity: Option<f64>,
}

impl SettingsUpdate {
    /// Constructs an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the enabled flag.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    /// Sets the effect.
    pub fn effect(mut self, effect: EffectKind) -> Self {
        self.effect = Some(effect);
        self
    }

    /// Sets the effect by name. Unknown names select the default effect.
    pub fn effect_name(self, name: &str) -> Self {
        let effect = name.parse().unwrap_or_else(|err| {
            log::warn!("{err}, using {}", EffectKind::default());
            EffectKind::default()
        });
        self.effect(effect)
    }

    /// Sets the intensity.
    pub fn intensity(mut self, intensity: f64) -> Self {
        self.intensity = Some(intensity);
        self
    }

    /// Returns whether the update changes nothing.
    pub fn is_empty(&self) -> bool {
        self.enabled.is_none() && self.effect.is_none() && self.intensity.is_none()
    }
}

impl From<Settings> for SettingsUpdate {
    fn from(settings: Settings) -> Self {
        Self {
            enabled: Some(settings.enabled),
            effect: Some(settings.effect),
            intensity: Some(settings.intensity),
        }
    }
}
