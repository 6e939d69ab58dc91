//! Local persistence
//!
//! Everything goes through a flat [`KeyValueStore`]: the save record (coins,
//! skins, best score), player settings and an optional in-progress run
//! snapshot. Loads never fail; saves are best-effort and only log.

pub mod save;
pub mod store;

pub use save::{SaveRecord, clear_run, load_run, merge_over_defaults, save_run};
#[cfg(target_arch = "wasm32")]
pub use store::LocalStore;
pub use store::{FileStore, KeyValueStore, MemoryStore, StoreError};
