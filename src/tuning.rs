//! Data-driven game balance
//!
//! Every number the simulation uses lives here. The defaults reproduce the
//! shipped balance; a JSON document can override any subset of fields.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::consts::TICKS_PER_SECOND;
use crate::sim::state::EnemyKind;

const fn secs(s: u64) -> u64 {
    s * TICKS_PER_SECOND as u64
}

/// Errors raised while loading a tuning override
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("invalid tuning document: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("tuning value out of range: {0}")]
    OutOfRange(&'static str),
}

/// Player base stats
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    pub max_hp: f32,
    /// Scroll speed in pixels per second
    pub speed: f32,
    pub radius: f32,
    pub magnet_radius: f32,
    pub crit_chance: f32,
    pub crit_multiplier: f32,
    pub dodge_chance: f32,
    /// Contact-damage immunity window after a hit
    pub invulnerability_ticks: u32,
    pub nova_radius: f32,
    pub nova_damage: f32,
    pub nova_cooldown_ticks: u32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            max_hp: 100.0,
            speed: 240.0,
            radius: 14.0,
            magnet_radius: 80.0,
            crit_chance: 0.05,
            crit_multiplier: 2.0,
            dodge_chance: 0.0,
            invulnerability_ticks: 30,
            nova_radius: 180.0,
            nova_damage: 40.0,
            nova_cooldown_ticks: 600,
        }
    }
}

/// Stats for one ordinary enemy category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemyParams {
    pub radius: f32,
    pub max_hp: f32,
    /// Seek speed in pixels per second
    pub speed: f32,
    pub damage: f32,
    pub xp_reward: u32,
    pub score_reward: u64,
    pub coin_reward: u32,
    /// Chance the single drop roll yields an xp gem
    pub gem_chance: f32,
    /// Chance (after the gem band) the roll yields a coin
    pub coin_chance: f32,
    /// Gems always dropped, bypassing the roll
    pub guaranteed_gems: u32,
    /// Category does not spawn below this score
    pub min_score: u64,
    pub spawn_weight: u32,
}

/// Per-category enemy table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyTable {
    pub basic: EnemyParams,
    pub fast: EnemyParams,
    pub tank: EnemyParams,
}

impl Default for EnemyTable {
    fn default() -> Self {
        Self {
            basic: EnemyParams {
                radius: 12.0,
                max_hp: 25.0,
                speed: 90.0,
                damage: 10.0,
                xp_reward: 2,
                score_reward: 10,
                coin_reward: 1,
                gem_chance: 0.6,
                coin_chance: 0.1,
                guaranteed_gems: 0,
                min_score: 0,
                spawn_weight: 70,
            },
            fast: EnemyParams {
                radius: 9.0,
                max_hp: 15.0,
                speed: 170.0,
                damage: 8.0,
                xp_reward: 3,
                score_reward: 15,
                coin_reward: 1,
                gem_chance: 0.6,
                coin_chance: 0.15,
                guaranteed_gems: 0,
                min_score: 100,
                spawn_weight: 20,
            },
            tank: EnemyParams {
                radius: 20.0,
                max_hp: 120.0,
                speed: 55.0,
                damage: 20.0,
                xp_reward: 6,
                score_reward: 40,
                coin_reward: 4,
                gem_chance: 0.0,
                coin_chance: 0.5,
                guaranteed_gems: 2,
                min_score: 300,
                spawn_weight: 10,
            },
        }
    }
}

impl EnemyTable {
    /// Params for an ordinary category (bosses use `BossTuning`)
    pub fn get(&self, kind: EnemyKind) -> &EnemyParams {
        match kind {
            EnemyKind::Basic | EnemyKind::Boss => &self.basic,
            EnemyKind::Fast => &self.fast,
            EnemyKind::Tank => &self.tank,
        }
    }
}

/// Boss stats, checkpoints and attack patterns
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BossTuning {
    pub radius: f32,
    pub base_hp: f32,
    pub base_damage: f32,
    pub speed: f32,
    pub xp_reward: u32,
    pub score_reward: u64,
    pub coin_reward: u32,
    pub gem_drops: u32,
    /// Elapsed ticks at which the mid boss and the final boss arrive
    pub checkpoints: [u64; 2],
    /// Final boss hp and damage relative to the mid boss
    pub final_factor: f32,
    pub attack_interval_ticks: u32,
    pub orb_count: u32,
    pub orb_damage: f32,
    pub orb_speed: f32,
    pub orb_radius: f32,
    pub orb_duration_ticks: u32,
    pub laser_count: u32,
    pub laser_spread: f32,
    pub laser_damage: f32,
    pub laser_speed: f32,
    pub laser_radius: f32,
    pub laser_duration_ticks: u32,
    pub treasure_radius: f32,
    pub treasure_life_ticks: u32,
}

impl Default for BossTuning {
    fn default() -> Self {
        Self {
            radius: 40.0,
            base_hp: 1500.0,
            base_damage: 25.0,
            speed: 70.0,
            xp_reward: 10,
            score_reward: 500,
            coin_reward: 100,
            gem_drops: 10,
            checkpoints: [secs(120), secs(300)],
            final_factor: 2.0,
            attack_interval_ticks: 120,
            orb_count: 10,
            orb_damage: 12.0,
            orb_speed: 180.0,
            orb_radius: 7.0,
            orb_duration_ticks: 240,
            laser_count: 3,
            laser_spread: 0.25,
            laser_damage: 18.0,
            laser_speed: 420.0,
            laser_radius: 5.0,
            laser_duration_ticks: 90,
            treasure_radius: 18.0,
            treasure_life_ticks: 1800,
        }
    }
}

/// Difficulty curves. The chapter table and level growth are playtest
/// values, kept as data rather than a derived formula.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScalingTuning {
    /// Multiplier per chapter (index 0 is chapter 1); the last entry repeats
    pub chapter_multipliers: Vec<f32>,
    /// Ordinary enemy hp/damage growth per player level above 1
    pub level_growth: f32,
}

impl Default for ScalingTuning {
    fn default() -> Self {
        Self {
            chapter_multipliers: vec![1.0, 1.5, 2.2, 3.0, 4.0],
            level_growth: 0.08,
        }
    }
}

/// Spawner periods, gates and event windows
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnTuning {
    pub base_period: u64,
    pub min_period: u64,
    /// Score needed to shave one tick off the period
    pub score_per_step: u64,
    /// Distance beyond the viewport corner at which enemies appear
    pub spawn_margin: f32,
    /// Distance beyond the spawn circle at which ordinary entities are culled
    pub cull_margin: f32,
    /// Horde windows as `[start, end)` elapsed ticks
    pub horde_windows: Vec<(u64, u64)>,
    pub horde_period: u64,
    pub crate_period: u64,
    pub max_crates: usize,
    pub crate_hp: f32,
    pub crate_radius: f32,
}

impl Default for SpawnTuning {
    fn default() -> Self {
        Self {
            base_period: 60,
            min_period: 12,
            score_per_step: 40,
            spawn_margin: 100.0,
            cull_margin: 400.0,
            horde_windows: vec![(secs(60), secs(70)), (secs(180), secs(195)), (secs(240), secs(250))],
            horde_period: 8,
            crate_period: secs(20),
            max_crates: 3,
            crate_hp: 30.0,
            crate_radius: 14.0,
        }
    }
}

/// Pickup behaviour and crate drop table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DropTuning {
    pub pickup_radius: f32,
    pub pickup_ttl_ticks: u32,
    /// Drift speed of pickups outside the magnet radius
    pub idle_speed: f32,
    pub pull_min_speed: f32,
    pub pull_accel: f32,
    pub pull_max_speed: f32,
    pub coin_value: u32,
    pub coin_bag_value: u32,
    pub heal_amount: u32,
    /// Crate drop weights: heal, coins, bomb, magnet, frenzy
    pub crate_weights: [u32; 5],
    pub frenzy_ticks: u32,
    pub frenzy_multiplier: f32,
}

impl Default for DropTuning {
    fn default() -> Self {
        Self {
            pickup_radius: 6.0,
            pickup_ttl_ticks: secs(30) as u32,
            idle_speed: 6.0,
            pull_min_speed: 120.0,
            pull_accel: 600.0,
            pull_max_speed: 600.0,
            coin_value: 1,
            coin_bag_value: 25,
            heal_amount: 30,
            crate_weights: [30, 30, 15, 15, 10],
            frenzy_ticks: 300,
            frenzy_multiplier: 2.0,
        }
    }
}

/// XP curve, tiers and upgrade offers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionTuning {
    pub first_level_xp: u32,
    pub xp_growth: f32,
    pub xp_flat: u32,
    /// Run-coin thresholds for each tier, ascending, starting at 0
    pub tier_thresholds: Vec<u32>,
    /// Player radius gained per tier
    pub tier_radius_growth: f32,
    pub level_up_offers: usize,
    pub treasure_offers: usize,
    pub max_stat_level: u8,
    /// Heal granted when no upgrade can be offered
    pub fallback_heal: f32,
    pub might_factor: f32,
    pub haste_factor: f32,
    pub precision_step: f32,
    pub vitality_step: f32,
    pub swiftness_factor: f32,
    pub magnet_step: f32,
    pub evasion_step: f32,
}

impl Default for ProgressionTuning {
    fn default() -> Self {
        Self {
            first_level_xp: 10,
            xp_growth: 1.3,
            xp_flat: 5,
            tier_thresholds: vec![0, 30, 100, 250, 600],
            tier_radius_growth: 1.5,
            level_up_offers: 3,
            treasure_offers: 5,
            max_stat_level: 5,
            fallback_heal: 20.0,
            might_factor: 1.15,
            haste_factor: 1.12,
            precision_step: 0.05,
            vitality_step: 20.0,
            swiftness_factor: 1.08,
            magnet_step: 40.0,
            evasion_step: 0.05,
        }
    }
}

/// Projectile parameters for one weapon at level 1
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeaponParams {
    pub damage: f32,
    /// Extra damage per level above 1
    pub damage_per_level: f32,
    pub speed: f32,
    pub radius: f32,
    pub duration_ticks: u32,
    pub penetration: u32,
}

/// Weapon firing parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponTuning {
    pub base_interval_ticks: f32,
    pub target_range: f32,
    pub burst_delay_ticks: u32,
    pub scatter_spread: f32,
    pub missile_turn_rate: f32,
    pub evolved_damage_factor: f32,
    pub blaster: WeaponParams,
    pub scatter: WeaponParams,
    pub missile: WeaponParams,
    pub laser: WeaponParams,
}

impl Default for WeaponTuning {
    fn default() -> Self {
        Self {
            base_interval_ticks: 40.0,
            target_range: 450.0,
            burst_delay_ticks: 5,
            scatter_spread: 0.6,
            missile_turn_rate: 0.08,
            evolved_damage_factor: 1.5,
            blaster: WeaponParams {
                damage: 10.0,
                damage_per_level: 2.0,
                speed: 480.0,
                radius: 5.0,
                duration_ticks: 90,
                penetration: 1,
            },
            scatter: WeaponParams {
                damage: 6.0,
                damage_per_level: 1.0,
                speed: 420.0,
                radius: 4.0,
                duration_ticks: 28,
                penetration: 1,
            },
            missile: WeaponParams {
                damage: 18.0,
                damage_per_level: 4.0,
                speed: 300.0,
                radius: 6.0,
                duration_ticks: 150,
                penetration: 1,
            },
            laser: WeaponParams {
                damage: 8.0,
                damage_per_level: 2.0,
                speed: 900.0,
                radius: 4.0,
                duration_ticks: 40,
                penetration: 5,
            },
        }
    }
}

/// Contact and feedback numbers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatTuning {
    /// Combined-radius scale for player-enemy contact
    pub contact_fudge: f32,
    /// Damage an enemy takes each tick it touches the player
    pub contact_chip_damage: f32,
    pub hit_shake: f32,
}

impl Default for CombatTuning {
    fn default() -> Self {
        Self {
            contact_fudge: 0.8,
            contact_chip_damage: 2.0,
            hit_shake: 6.0,
        }
    }
}

/// Complete balance table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub player: PlayerTuning,
    pub enemies: EnemyTable,
    pub boss: BossTuning,
    pub scaling: ScalingTuning,
    pub spawn: SpawnTuning,
    pub drops: DropTuning,
    pub progression: ProgressionTuning,
    pub weapons: WeaponTuning,
    pub combat: CombatTuning,
}

impl Tuning {
    /// Parse an override document; absent fields keep their defaults at
    /// every nesting level
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let patch: Value = serde_json::from_str(json)?;
        let mut merged = serde_json::to_value(Tuning::default())?;
        merge_into(&mut merged, patch);
        let tuning: Tuning = serde_json::from_value(merged)?;
        tuning.validate()?;
        Ok(tuning)
    }

    fn validate(&self) -> Result<(), TuningError> {
        if self.scaling.chapter_multipliers.is_empty() {
            return Err(TuningError::OutOfRange("scaling.chapter_multipliers is empty"));
        }
        if self.spawn.min_period == 0 || self.spawn.horde_period == 0 || self.spawn.crate_period == 0 {
            return Err(TuningError::OutOfRange("spawn periods must be at least one tick"));
        }
        if self.progression.first_level_xp == 0 {
            return Err(TuningError::OutOfRange("progression.first_level_xp must be positive"));
        }
        if self.progression.tier_thresholds.first() != Some(&0) {
            return Err(TuningError::OutOfRange("progression.tier_thresholds must start at 0"));
        }
        if self.progression.tier_thresholds.windows(2).any(|w| w[0] >= w[1]) {
            return Err(TuningError::OutOfRange("progression.tier_thresholds must ascend"));
        }
        let largest = self
            .enemies
            .basic
            .radius
            .max(self.enemies.fast.radius)
            .max(self.enemies.tank.radius)
            .max(self.boss.radius);
        if self.spawn.spawn_margin <= largest {
            return Err(TuningError::OutOfRange("spawn.spawn_margin must exceed every enemy radius"));
        }
        if self.weapons.base_interval_ticks <= 0.0 {
            return Err(TuningError::OutOfRange("weapons.base_interval_ticks must be positive"));
        }
        Ok(())
    }

    /// Difficulty multiplier for a 1-based chapter
    pub fn chapter_multiplier(&self, chapter: u32) -> f32 {
        let table = &self.scaling.chapter_multipliers;
        let idx = (chapter.max(1) as usize - 1).min(table.len().saturating_sub(1));
        table.get(idx).copied().unwrap_or(1.0)
    }

    /// Boss hp for a chapter
    pub fn boss_hp(&self, chapter: u32, final_boss: bool) -> f32 {
        let factor = if final_boss { self.boss.final_factor } else { 1.0 };
        self.boss.base_hp * factor * self.chapter_multiplier(chapter)
    }

    /// Ordinary enemy hp/damage scale at a given chapter and player level
    pub fn enemy_scale(&self, chapter: u32, level: u32) -> f32 {
        self.chapter_multiplier(chapter)
            * (1.0 + self.scaling.level_growth * level.saturating_sub(1) as f32)
    }
}

/// Overlay `patch` onto `base`; objects merge key by key, anything else replaces
fn merge_into(base: &mut Value, patch: Value) {
    match (base, patch) {
        (Value::Object(base), Value::Object(patch)) => {
            for (key, value) in patch {
                match base.get_mut(&key) {
                    Some(slot) => merge_into(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}
