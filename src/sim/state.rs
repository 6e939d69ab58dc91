//! Game state and core simulation types
//!
//! All state that must be persisted for Continue/determinism lives here.
//! Cosmetic layers (particles, floating numbers, shake) are skipped by serde.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::tuning::{Tuning, WeaponParams};
use crate::{Viewport, polar_to_cartesian};

/// Weapon/stat level at which an upgrade path is evolved and stops being offered
pub const EVOLVED_LEVEL: u8 = 6;

/// Maximum particles
pub const MAX_PARTICLES: usize = 400;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Active gameplay
    Running,
    /// Paused by the player
    Paused,
    /// Waiting for a level-up upgrade choice
    LevelUpPaused,
    /// Waiting for a treasure chest upgrade choice
    TreasurePaused,
    /// Run ended
    Ended(RunOutcome),
}

impl GamePhase {
    pub fn is_ended(&self) -> bool {
        matches!(self, GamePhase::Ended(_))
    }

    /// Whether gameplay is frozen waiting for an upgrade choice
    pub fn awaiting_choice(&self) -> bool {
        matches!(self, GamePhase::LevelUpPaused | GamePhase::TreasurePaused)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunOutcome {
    GameOver,
    Victory,
}

/// Enemy categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyKind {
    Basic,
    Fast,
    Tank,
    Boss,
}

/// Player weapons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponKind {
    /// Aimed bursts, one shot per queue slot
    Blaster,
    /// Short-range angular spread
    Scatter,
    /// Slow homing rockets
    Missile,
    /// Fast, highly penetrating beam
    Laser,
}

impl WeaponKind {
    pub const ALL: [WeaponKind; 4] = [
        WeaponKind::Blaster,
        WeaponKind::Scatter,
        WeaponKind::Missile,
        WeaponKind::Laser,
    ];

    pub fn index(self) -> usize {
        match self {
            WeaponKind::Blaster => 0,
            WeaponKind::Scatter => 1,
            WeaponKind::Missile => 2,
            WeaponKind::Laser => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            WeaponKind::Blaster => "Blaster",
            WeaponKind::Scatter => "Scatter Gun",
            WeaponKind::Missile => "Seeker Missiles",
            WeaponKind::Laser => "Prism Laser",
        }
    }

    pub fn params(self, tuning: &Tuning) -> &WeaponParams {
        match self {
            WeaponKind::Blaster => &tuning.weapons.blaster,
            WeaponKind::Scatter => &tuning.weapons.scatter,
            WeaponKind::Missile => &tuning.weapons.missile,
            WeaponKind::Laser => &tuning.weapons.laser,
        }
    }
}

/// Passive stat upgrades
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatKind {
    Might,
    Haste,
    Precision,
    Vitality,
    Swiftness,
    Magnet,
    Evasion,
}

impl StatKind {
    pub const ALL: [StatKind; 7] = [
        StatKind::Might,
        StatKind::Haste,
        StatKind::Precision,
        StatKind::Vitality,
        StatKind::Swiftness,
        StatKind::Magnet,
        StatKind::Evasion,
    ];

    pub fn index(self) -> usize {
        match self {
            StatKind::Might => 0,
            StatKind::Haste => 1,
            StatKind::Precision => 2,
            StatKind::Vitality => 3,
            StatKind::Swiftness => 4,
            StatKind::Magnet => 5,
            StatKind::Evasion => 6,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            StatKind::Might => "Might",
            StatKind::Haste => "Haste",
            StatKind::Precision => "Precision",
            StatKind::Vitality => "Vitality",
            StatKind::Swiftness => "Swiftness",
            StatKind::Magnet => "Magnetism",
            StatKind::Evasion => "Evasion",
        }
    }
}

/// One entry in an upgrade offer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpgradeKind {
    Weapon(WeaponKind),
    Stat(StatKind),
}

impl UpgradeKind {
    pub fn name(self) -> &'static str {
        match self {
            UpgradeKind::Weapon(w) => w.name(),
            UpgradeKind::Stat(s) => s.name(),
        }
    }
}

/// The player, pinned to the viewport centre
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    pub radius: f32,
    pub hp: f32,
    pub max_hp: f32,
    /// Scroll speed in pixels per second
    pub speed: f32,
    pub xp: u32,
    pub next_level_xp: u32,
    pub level: u32,
    /// Size/loadout tier from run coins
    pub tier: u32,
    pub damage_multiplier: f32,
    pub attack_speed_multiplier: f32,
    pub crit_chance: f32,
    pub crit_multiplier: f32,
    pub dodge_chance: f32,
    pub magnet_radius: f32,
    /// Skill level per weapon (0 = not equipped)
    pub weapon_levels: [u8; 4],
    pub stat_levels: [u8; 7],
    pub invulnerable_ticks: u32,
    pub skill_cooldown: u32,
    pub frenzy_ticks: u32,
    pub ticks_since_last_shot: u32,
    /// Extra burst shots from the current tier
    pub burst_bonus: u32,
}

impl Player {
    pub fn new(tuning: &Tuning, pos: Vec2, primary: WeaponKind) -> Self {
        let pt = &tuning.player;
        let mut weapon_levels = [0; 4];
        weapon_levels[primary.index()] = 1;
        Self {
            pos,
            radius: pt.radius,
            hp: pt.max_hp,
            max_hp: pt.max_hp,
            speed: pt.speed,
            xp: 0,
            next_level_xp: tuning.progression.first_level_xp,
            level: 1,
            tier: 0,
            damage_multiplier: 1.0,
            attack_speed_multiplier: 1.0,
            crit_chance: pt.crit_chance,
            crit_multiplier: pt.crit_multiplier,
            dodge_chance: pt.dodge_chance,
            magnet_radius: pt.magnet_radius,
            weapon_levels,
            stat_levels: [0; 7],
            invulnerable_ticks: 0,
            skill_cooldown: 0,
            frenzy_ticks: 0,
            ticks_since_last_shot: 0,
            burst_bonus: 0,
        }
    }

    pub fn weapon_level(&self, weapon: WeaponKind) -> u8 {
        self.weapon_levels[weapon.index()]
    }

    pub fn is_equipped(&self, weapon: WeaponKind) -> bool {
        self.weapon_level(weapon) > 0
    }

    pub fn equipped_weapons(&self) -> impl Iterator<Item = WeaponKind> + '_ {
        WeaponKind::ALL.into_iter().filter(|w| self.is_equipped(*w))
    }

    pub fn stat_level(&self, stat: StatKind) -> u8 {
        self.stat_levels[stat.index()]
    }

    /// Restore hp, never above max
    pub fn heal(&mut self, amount: f32) {
        if self.is_dead() {
            return;
        }
        self.hp = (self.hp + amount).min(self.max_hp);
    }

    /// Hp for display (logic uses the raw value for the death test)
    pub fn display_hp(&self) -> f32 {
        self.hp.clamp(0.0, self.max_hp)
    }

    pub fn is_dead(&self) -> bool {
        self.hp <= 0.0
    }
}

/// An enemy entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub id: u32,
    pub kind: EnemyKind,
    pub pos: Vec2,
    pub radius: f32,
    pub hp: f32,
    pub max_hp: f32,
    /// Seek speed in pixels per second
    pub speed: f32,
    pub damage: f32,
    pub xp_reward: u32,
    pub score_reward: u64,
    pub coin_reward: u32,
    /// Ticks until the next boss volley
    #[serde(default)]
    pub attack_timer: u32,
    #[serde(default)]
    pub volleys: u32,
    /// Killing this enemy wins the run
    #[serde(default)]
    pub final_boss: bool,
}

impl Enemy {
    pub fn is_alive(&self) -> bool {
        self.hp > 0.0
    }

    pub fn is_boss(&self) -> bool {
        self.kind == EnemyKind::Boss
    }

    /// Apply damage; returns true when this hit took the enemy from alive to dead
    pub fn take_damage(&mut self, amount: f32) -> bool {
        let was_alive = self.is_alive();
        self.hp -= amount;
        was_alive && !self.is_alive()
    }
}

/// Boss projectile styles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyShot {
    /// Consumed on hit
    Orb,
    /// Passes through the player
    Laser,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectileOwner {
    Player(WeaponKind),
    Enemy(EnemyShot),
}

/// Everything needed to spawn a projectile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShotSpec {
    pub owner: ProjectileOwner,
    pub dir: Vec2,
    pub speed: f32,
    pub radius: f32,
    pub damage: f32,
    pub duration: u32,
    pub penetration: u32,
    pub homing: bool,
}

/// A shot waiting in the burst queue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingShot {
    pub delay: u32,
    pub spec: ShotSpec,
}

/// A projectile entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub damage: f32,
    /// Remaining lifetime in ticks
    pub duration: u32,
    /// Remaining hits before removal
    pub penetration: u32,
    pub owner: ProjectileOwner,
    #[serde(default)]
    pub homing: bool,
    /// Targets already struck (a penetrating shot hits each target once)
    #[serde(default)]
    pub hit_ids: Vec<u32>,
}

impl Projectile {
    pub fn is_player_owned(&self) -> bool {
        matches!(self.owner, ProjectileOwner::Player(_))
    }

    pub fn is_spent(&self) -> bool {
        self.duration == 0 || self.penetration == 0
    }
}

/// Pickup types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PickupKind {
    XpGem,
    Coin,
    Heal,
}

/// A pickup entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pickup {
    pub id: u32,
    pub kind: PickupKind,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub value: u32,
    /// Homing toward the player regardless of magnet radius
    pub pulled: bool,
    pub ttl_ticks: u32,
    #[serde(default)]
    pub collected: bool,
}

/// What a destroyed crate yields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CrateDrop {
    Heal,
    Coins,
    /// Instantly destroys every ordinary enemy
    Bomb,
    /// Instantly pulls every pickup
    Magnet,
    /// Timed attack-speed buff
    Frenzy,
}

impl CrateDrop {
    pub const ALL: [CrateDrop; 5] = [
        CrateDrop::Heal,
        CrateDrop::Coins,
        CrateDrop::Bomb,
        CrateDrop::Magnet,
        CrateDrop::Frenzy,
    ];
}

/// A destructible supply crate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Crate {
    pub id: u32,
    pub pos: Vec2,
    pub radius: f32,
    pub hp: f32,
}

impl Crate {
    pub fn is_intact(&self) -> bool {
        self.hp > 0.0
    }
}

/// A boss-dropped chest that opens the treasure flow on contact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Treasure {
    pub id: u32,
    pub pos: Vec2,
    pub radius: f32,
    pub life_ticks: u32,
    #[serde(default)]
    pub opened: bool,
}

/// Particle visual styles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticleKind {
    Spark,
    Burst,
    Sparkle,
    Shockwave,
}

/// A particle for visual effects
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub life: u32,
    pub max_life: u32,
    pub size: f32,
    pub kind: ParticleKind,
}

/// A rising damage number
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloatingText {
    pub pos: Vec2,
    pub value: u32,
    pub crit: bool,
    pub life: u32,
}

/// Floating damage numbers live this long
pub const FLOATING_TEXT_TICKS: u32 = 40;

/// Parameters that pick a run
#[derive(Debug, Clone, Copy)]
pub struct RunConfig {
    pub seed: u64,
    /// 1-based difficulty chapter
    pub chapter: u32,
    pub primary_weapon: WeaponKind,
    pub viewport: Viewport,
}

impl RunConfig {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            chapter: 1,
            primary_weapon: WeaponKind::Blaster,
            viewport: Viewport::default(),
        }
    }
}

/// Complete game state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    /// Gameplay RNG (spawns, rolls, offers)
    pub rng: Pcg32,
    /// Cosmetic RNG, kept apart so effects never perturb gameplay rolls
    pub fx_rng: Pcg32,
    pub tuning: Tuning,
    pub chapter: u32,
    pub viewport: Viewport,
    /// Total scroll applied to the world so far
    pub world_offset: Vec2,
    /// Running ticks elapsed (pauses excluded)
    pub time_ticks: u64,
    pub score: u64,
    /// Currency earned this run
    pub run_coins: u32,
    pub kills: u32,
    pub phase: GamePhase,
    pub player: Player,
    /// Entity collections (sorted by id for determinism)
    pub enemies: Vec<Enemy>,
    pub projectiles: Vec<Projectile>,
    pub pending_shots: Vec<PendingShot>,
    pub pickups: Vec<Pickup>,
    pub crates: Vec<Crate>,
    pub treasures: Vec<Treasure>,
    /// Boss checkpoints already triggered
    pub bosses_spawned: [bool; 2],
    /// Upgrade choices on display while paused for a choice
    pub offers: Vec<UpgradeKind>,
    /// Level-ups earned but not yet chosen
    pub pending_level_ups: u32,
    /// Visual particles (not gameplay-affecting)
    #[serde(skip)]
    pub particles: Vec<Particle>,
    #[serde(skip)]
    pub floating_texts: Vec<FloatingText>,
    #[serde(skip)]
    pub screen_shake: f32,
    /// Next entity ID
    next_id: u32,
}

impl GameState {
    /// Create a new run with default tuning
    pub fn new(seed: u64) -> Self {
        Self::with_config(RunConfig::with_seed(seed), Tuning::default())
    }

    pub fn with_config(config: RunConfig, tuning: Tuning) -> Self {
        let player = Player::new(&tuning, config.viewport.center(), config.primary_weapon);
        Self {
            seed: config.seed,
            rng: Pcg32::seed_from_u64(config.seed),
            fx_rng: Pcg32::seed_from_u64(config.seed ^ 0x9E37_79B9_7F4A_7C15),
            tuning,
            chapter: config.chapter.max(1),
            viewport: config.viewport,
            world_offset: Vec2::ZERO,
            time_ticks: 0,
            score: 0,
            run_coins: 0,
            kills: 0,
            phase: GamePhase::Running,
            player,
            enemies: Vec::new(),
            projectiles: Vec::new(),
            pending_shots: Vec::new(),
            pickups: Vec::new(),
            crates: Vec::new(),
            treasures: Vec::new(),
            bosses_spawned: [false; 2],
            offers: Vec::new(),
            pending_level_ups: 0,
            particles: Vec::new(),
            floating_texts: Vec::new(),
            screen_shake: 0.0,
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Screen position of the player (always the viewport centre)
    pub fn player_pos(&self) -> Vec2 {
        self.player.pos
    }

    /// Radius of the offscreen circle enemies spawn on
    pub fn spawn_radius(&self) -> f32 {
        self.viewport.half_diagonal() + self.tuning.spawn.spawn_margin
    }

    /// Beyond this distance from the player, ordinary entities are culled
    pub fn cull_radius(&self) -> f32 {
        self.spawn_radius() + self.tuning.spawn.cull_margin
    }

    pub fn spawn_projectile(&mut self, spec: &ShotSpec, pos: Vec2) -> u32 {
        let id = self.next_entity_id();
        self.projectiles.push(Projectile {
            id,
            pos,
            vel: spec.dir.normalize_or_zero() * spec.speed,
            radius: spec.radius,
            damage: spec.damage,
            duration: spec.duration.max(1),
            penetration: spec.penetration.max(1),
            owner: spec.owner,
            homing: spec.homing,
            hit_ids: Vec::new(),
        });
        id
    }

    /// Drop a pickup with a small random idle drift
    pub fn spawn_pickup(&mut self, kind: PickupKind, pos: Vec2, value: u32) -> u32 {
        let id = self.next_entity_id();
        let angle = self.rng.random_range(0.0..std::f32::consts::TAU);
        let drops = &self.tuning.drops;
        self.pickups.push(Pickup {
            id,
            kind,
            pos,
            vel: polar_to_cartesian(drops.idle_speed, angle),
            radius: drops.pickup_radius,
            value,
            pulled: false,
            ttl_ticks: drops.pickup_ttl_ticks,
            collected: false,
        });
        id
    }

    /// Spawn a radial puff of cosmetic particles
    pub fn spawn_particles(&mut self, pos: Vec2, count: usize, kind: ParticleKind) {
        for _ in 0..count {
            if self.particles.len() >= MAX_PARTICLES {
                break;
            }
            let angle = self.fx_rng.random_range(0.0..std::f32::consts::TAU);
            let speed = self.fx_rng.random_range(30.0..150.0);
            let life = self.fx_rng.random_range(15..35);
            self.particles.push(Particle {
                pos,
                vel: polar_to_cartesian(speed, angle),
                life,
                max_life: life,
                size: self.fx_rng.random_range(1.5..3.5),
                kind,
            });
        }
    }

    pub fn spawn_floating_text(&mut self, pos: Vec2, value: f32, crit: bool) {
        self.floating_texts.push(FloatingText {
            pos,
            value: value.round().max(0.0) as u32,
            crit,
            life: FLOATING_TEXT_TICKS,
        });
    }

    pub fn add_shake(&mut self, amount: f32) {
        self.screen_shake = self.screen_shake.max(amount);
    }

    /// Adopt a new viewport, translating everything so the player stays centred
    pub fn resize(&mut self, viewport: Viewport) {
        let delta = viewport.center() - self.viewport.center();
        self.viewport = viewport;
        self.player.pos = viewport.center();
        self.translate_world(delta);
    }

    /// Move every non-player entity, cosmetic layers included
    pub fn translate_world(&mut self, delta: Vec2) {
        if delta == Vec2::ZERO {
            return;
        }
        for e in &mut self.enemies {
            e.pos += delta;
        }
        for p in &mut self.projectiles {
            p.pos += delta;
        }
        for p in &mut self.pickups {
            p.pos += delta;
        }
        for c in &mut self.crates {
            c.pos += delta;
        }
        for t in &mut self.treasures {
            t.pos += delta;
        }
        for p in &mut self.particles {
            p.pos += delta;
        }
        for t in &mut self.floating_texts {
            t.pos += delta;
        }
    }

    /// Ensure collections are sorted by ID for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.enemies.sort_by_key(|e| e.id);
        self.projectiles.sort_by_key(|p| p.id);
        self.pickups.sort_by_key(|p| p.id);
        self.crates.sort_by_key(|c| c.id);
        self.treasures.sort_by_key(|t| t.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_run_equips_primary_only() {
        let config = RunConfig {
            primary_weapon: WeaponKind::Missile,
            ..RunConfig::with_seed(7)
        };
        let state = GameState::with_config(config, Tuning::default());
        let equipped: Vec<_> = state.player.equipped_weapons().collect();
        assert_eq!(equipped, vec![WeaponKind::Missile]);
        assert_eq!(state.player.pos, state.viewport.center());
        assert_eq!(state.phase, GamePhase::Running);
    }

    #[test]
    fn test_spawned_projectile_has_positive_budget() {
        let mut state = GameState::new(1);
        let spec = ShotSpec {
            owner: ProjectileOwner::Player(WeaponKind::Blaster),
            dir: Vec2::new(3.0, 4.0),
            speed: 100.0,
            radius: 4.0,
            damage: 10.0,
            duration: 0,
            penetration: 0,
            homing: false,
        };
        let id = state.spawn_projectile(&spec, Vec2::ZERO);
        let p = &state.projectiles[0];
        assert_eq!(p.id, id);
        assert!(p.duration >= 1 && p.penetration >= 1);
        assert!((p.vel.length() - 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_resize_keeps_player_centred_and_relative_positions() {
        let mut state = GameState::new(1);
        let id = state.next_entity_id();
        let offset = Vec2::new(50.0, -20.0);
        state.crates.push(Crate {
            id,
            pos: state.player.pos + offset,
            radius: 10.0,
            hp: 10.0,
        });

        state.resize(Viewport::new(1200.0, 900.0));
        assert_eq!(state.player.pos, Vec2::new(600.0, 450.0));
        assert_eq!(state.crates[0].pos - state.player.pos, offset);
    }

    #[test]
    fn test_enemy_take_damage_reports_kill_once() {
        let mut enemy = Enemy {
            id: 1,
            kind: EnemyKind::Basic,
            pos: Vec2::ZERO,
            radius: 10.0,
            hp: 15.0,
            max_hp: 15.0,
            speed: 0.0,
            damage: 1.0,
            xp_reward: 1,
            score_reward: 1,
            coin_reward: 1,
            attack_timer: 0,
            volleys: 0,
            final_boss: false,
        };
        assert!(!enemy.take_damage(10.0));
        assert!(enemy.take_damage(10.0));
        assert!(!enemy.take_damage(10.0));
    }

    #[test]
    fn test_particles_respect_cap() {
        let mut state = GameState::new(1);
        state.spawn_particles(Vec2::ZERO, MAX_PARTICLES + 50, ParticleKind::Spark);
        assert_eq!(state.particles.len(), MAX_PARTICLES);
    }
}
