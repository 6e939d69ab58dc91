//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies; side effects leave as `GameEvent`s

pub mod autopilot;
pub mod collision;
pub mod events;
pub mod progression;
pub mod spawner;
pub mod state;
pub mod tick;
pub mod weapons;

pub use autopilot::{autopilot_choice, autopilot_input};
pub use events::GameEvent;
pub use progression::{ChoiceError, choose_upgrade};
pub use state::{
    CrateDrop, EnemyKind, GamePhase, GameState, PickupKind, ProjectileOwner, RunConfig, RunOutcome,
    StatKind, UpgradeKind, WeaponKind,
};
pub use tick::{TickInput, tick};
