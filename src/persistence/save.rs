//! Save record, preferences merge and run snapshots

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::store::KeyValueStore;
use crate::consts::{RUN_KEY, SAVE_KEY};
use crate::sim::GameState;

/// Skin every player owns
pub const DEFAULT_SKIN: &str = "classic";

/// Persistent progress carried between runs
#[derive(Debug, Clone, PartialEq, Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SaveRecord {
    pub coins: u64,
    pub unlocked_skins: Vec<String>,
    pub selected_skin: String,
    pub best_score: u64,
}

impl Default for SaveRecord {
    fn default() -> Self {
        Self {
            coins: 0,
            unlocked_skins: vec![DEFAULT_SKIN.to_owned()],
            selected_skin: DEFAULT_SKIN.to_owned(),
            best_score: 0,
        }
    }
}

impl SaveRecord {
    /// Load the record, keeping defaults for anything missing or malformed
    pub fn load(store: &impl KeyValueStore) -> Self {
        match store.get(SAVE_KEY) {
            Ok(Some(raw)) => {
                let mut record: Self = merge_over_defaults(&raw);
                record.repair();
                record
            }
            Ok(None) => Self::default(),
            Err(e) => {
                log::warn!("Save record unavailable, using defaults: {e}");
                Self::default()
            }
        }
    }

    /// Best-effort write; failures are logged and otherwise ignored
    pub fn save(&self, store: &mut impl KeyValueStore) {
        let result = serde_json::to_string(self)
            .map_err(Into::into)
            .and_then(|json| store.set(SAVE_KEY, &json));
        if let Err(e) = result {
            log::error!("Failed to save progress: {e}");
        }
    }

    /// Fold a finished run in; returns whether it set a new best score
    pub fn record_run(&mut self, score: u64) -> bool {
        let best = score > self.best_score;
        if best {
            self.best_score = score;
        }
        best
    }

    pub fn add_coins(&mut self, amount: u32) {
        self.coins = self.coins.saturating_add(u64::from(amount));
    }

    /// The default skin is always owned and the selection must be owned
    fn repair(&mut self) {
        if !self.unlocked_skins.iter().any(|s| s == DEFAULT_SKIN) {
            self.unlocked_skins.insert(0, DEFAULT_SKIN.to_owned());
        }
        if !self.unlocked_skins.contains(&self.selected_skin) {
            self.selected_skin = DEFAULT_SKIN.to_owned();
        }
    }
}

/// Decode `raw` over `T::default()` one top-level field at a time
///
/// Unknown keys are dropped and a field whose stored value does not decode
/// keeps its default; anything that is not a JSON object yields the default.
pub fn merge_over_defaults<T>(raw: &str) -> T
where
    T: Default + Serialize + DeserializeOwned,
{
    let stored = match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => map,
        Ok(_) | Err(_) => {
            log::warn!("Stored record is not a JSON object, using defaults");
            return T::default();
        }
    };
    let mut merged = match serde_json::to_value(T::default()) {
        Ok(Value::Object(map)) => map,
        _ => return T::default(),
    };

    for (key, value) in stored {
        if !merged.contains_key(&key) {
            continue;
        }
        let previous = merged.insert(key.clone(), value);
        if serde_json::from_value::<T>(Value::Object(merged.clone())).is_err() {
            log::warn!("Ignoring malformed stored field {key:?}");
            if let Some(previous) = previous {
                merged.insert(key, previous);
            }
        }
    }

    serde_json::from_value(Value::Object(merged)).unwrap_or_default()
}

/// Snapshot an in-progress run so it can continue after a reload
pub fn save_run(store: &mut impl KeyValueStore, state: &GameState) {
    let result = serde_json::to_string(state)
        .map_err(Into::into)
        .and_then(|json| store.set(RUN_KEY, &json));
    match result {
        Ok(()) => log::debug!("Run snapshot saved at tick {}", state.time_ticks),
        Err(e) => log::error!("Failed to save run snapshot: {e}"),
    }
}

/// Restore a run snapshot; a missing or unreadable one yields `None`
pub fn load_run(store: &impl KeyValueStore) -> Option<GameState> {
    let raw = match store.get(RUN_KEY) {
        Ok(raw) => raw?,
        Err(e) => {
            log::warn!("Run snapshot unavailable: {e}");
            return None;
        }
    };
    match serde_json::from_str::<GameState>(&raw) {
        Ok(state) if state.phase.is_ended() => None,
        Ok(state) => {
            log::info!("Resuming run at tick {}", state.time_ticks);
            Some(state)
        }
        Err(e) => {
            log::warn!("Discarding unreadable run snapshot: {e}");
            None
        }
    }
}

pub fn clear_run(store: &mut impl KeyValueStore) {
    if let Err(e) = store.remove(RUN_KEY) {
        log::warn!("Failed to clear run snapshot: {e}");
    }
}
