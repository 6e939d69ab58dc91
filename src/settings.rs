//! Game settings and preferences
//!
//! Persisted separately from the save record under their own storage key.

use serde::{Deserialize, Serialize};

use crate::consts::SETTINGS_KEY;
use crate::persistence::{KeyValueStore, merge_over_defaults};

/// Player preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    pub muted: bool,

    // === Visual Effects ===
    /// Screen shake on hits and boss arrivals
    pub screen_shake: bool,
    /// Hit sparks, bursts and shockwaves
    pub particles: bool,
    /// Floating damage numbers
    pub damage_numbers: bool,

    // === Accessibility ===
    /// Reduced motion (suppresses shake)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,

            screen_shake: true,
            particles: true,
            damage_numbers: true,

            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Gain handed to the audio sink
    pub fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            (self.master_volume * self.sfx_volume).clamp(0.0, 1.0)
        }
    }

    /// Effective screen shake (respects reduced_motion)
    pub fn effective_screen_shake(&self) -> bool {
        self.screen_shake && !self.reduced_motion
    }

    /// Load settings, keeping defaults for anything missing or malformed
    pub fn load(store: &impl KeyValueStore) -> Self {
        match store.get(SETTINGS_KEY) {
            Ok(Some(raw)) => {
                log::info!("Loaded settings");
                merge_over_defaults(&raw)
            }
            Ok(None) => Self::default(),
            Err(e) => {
                log::warn!("Settings unavailable, using defaults: {e}");
                Self::default()
            }
        }
    }

    pub fn save(&self, store: &mut impl KeyValueStore) {
        let result = serde_json::to_string(self)
            .map_err(Into::into)
            .and_then(|json| store.set(SETTINGS_KEY, &json));
        match result {
            Ok(()) => log::info!("Settings saved"),
            Err(e) => log::error!("Failed to save settings: {e}"),
        }
    }
}
