//! Side effects produced by a tick
//!
//! The simulation never calls out to audio, storage or the shell; it returns
//! these and the host dispatches them.

use super::state::{CrateDrop, EnemyKind, RunOutcome};
use crate::audio::SoundEffect;

#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// Fire-and-forget sound trigger
    Sound(SoundEffect),
    /// Run currency earned
    CurrencyGained(u32),
    /// A boss checkpoint fired
    BossWarning { final_boss: bool },
    LevelUp { level: u32 },
    TreasureOpened,
    TierChanged { tier: u32 },
    PlayerDamaged { amount: f32 },
    Dodged,
    EnemyKilled { kind: EnemyKind },
    CrateOpened(CrateDrop),
    /// Nothing left to offer; a fallback heal was granted instead
    UpgradesExhausted,
    RunEnded {
        outcome: RunOutcome,
        score: u64,
        level: u32,
    },
}
