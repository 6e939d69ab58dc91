//! Time- and score-gated creation of enemies and crates
//!
//! Everything appears on a fixed-radius circle around the player, outside the
//! viewport corners, so new arrivals are never visible on their first frame.

use glam::Vec2;
use rand::Rng;

use super::events::GameEvent;
use super::state::{Crate, Enemy, EnemyKind, GameState};
use crate::audio::SoundEffect;
use crate::polar_to_cartesian;

const ORDINARY_KINDS: [EnemyKind; 3] = [EnemyKind::Basic, EnemyKind::Fast, EnemyKind::Tank];

/// Run the spawner for the current tick
pub fn run(state: &mut GameState, events: &mut Vec<GameEvent>) {
    let t = state.time_ticks;

    // A boss arrival owns its tick: nothing else spawns alongside it
    let checkpoints = state.tuning.boss.checkpoints;
    let mut boss_arrived = false;
    for (slot, &checkpoint) in checkpoints.iter().enumerate() {
        if !state.bosses_spawned[slot] && t >= checkpoint {
            spawn_boss(state, slot, events);
            boss_arrived = true;
        }
    }
    if boss_arrived {
        return;
    }

    if t % spawn_period(state) == 0 {
        let kind = roll_kind(state);
        spawn_enemy(state, kind);
    }

    let spawn = &state.tuning.spawn;
    let in_horde = spawn.horde_windows.iter().any(|&(start, end)| (start..end).contains(&t));
    if in_horde && t % spawn.horde_period.max(1) == 0 {
        spawn_enemy(state, EnemyKind::Basic);
    }

    let spawn = &state.tuning.spawn;
    if t % spawn.crate_period.max(1) == 0 && state.crates.len() < spawn.max_crates {
        spawn_crate(state);
    }
}

/// Ticks between ordinary spawns; shrinks with score down to the minimum
pub fn spawn_period(state: &GameState) -> u64 {
    let spawn = &state.tuning.spawn;
    let steps = state.score / spawn.score_per_step.max(1);
    spawn.base_period.saturating_sub(steps).max(spawn.min_period).max(1)
}

/// Weighted roll among the categories the current score has unlocked
fn roll_kind(state: &mut GameState) -> EnemyKind {
    let score = state.score;
    let table = &state.tuning.enemies;
    let eligible: Vec<(EnemyKind, u32)> = ORDINARY_KINDS
        .into_iter()
        .map(|kind| (kind, table.get(kind)))
        .filter(|(_, params)| params.min_score <= score && params.spawn_weight > 0)
        .map(|(kind, params)| (kind, params.spawn_weight))
        .collect();

    let total: u32 = eligible.iter().map(|(_, w)| w).sum();
    if total == 0 {
        return EnemyKind::Basic;
    }

    let mut roll = state.rng.random_range(0..total);
    for (kind, weight) in eligible {
        if roll < weight {
            return kind;
        }
        roll -= weight;
    }
    EnemyKind::Basic
}

/// A point on the spawn circle at a uniformly random angle
fn spawn_position(state: &mut GameState) -> Vec2 {
    let angle = state.rng.random_range(0.0..std::f32::consts::TAU);
    state.player_pos() + polar_to_cartesian(state.spawn_radius(), angle)
}

/// Spawn one ordinary enemy, scaled to the chapter and player level
pub fn spawn_enemy(state: &mut GameState, kind: EnemyKind) -> u32 {
    let pos = spawn_position(state);
    let scale = state.tuning.enemy_scale(state.chapter, state.player.level);
    let params = state.tuning.enemies.get(kind).clone();
    let id = state.next_entity_id();
    let hp = params.max_hp * scale;
    state.enemies.push(Enemy {
        id,
        kind,
        pos,
        radius: params.radius,
        hp,
        max_hp: hp,
        speed: params.speed,
        damage: params.damage * scale,
        xp_reward: params.xp_reward,
        score_reward: params.score_reward,
        coin_reward: params.coin_reward,
        attack_timer: 0,
        volleys: 0,
        final_boss: false,
    });
    log::debug!("Spawned {kind:?} #{id} at ({:.0}, {:.0})", pos.x, pos.y);
    id
}

/// Clear the field and bring in the boss for checkpoint `slot` (1 = final)
fn spawn_boss(state: &mut GameState, slot: usize, events: &mut Vec<GameEvent>) {
    state.bosses_spawned[slot] = true;
    let final_boss = slot + 1 == state.bosses_spawned.len();

    // Bosses already on the field stay
    state.enemies.retain(|e| e.is_boss());

    let pos = spawn_position(state);
    let id = state.next_entity_id();
    let boss = &state.tuning.boss;
    let hp = state.tuning.boss_hp(state.chapter, final_boss);
    let factor = if final_boss { boss.final_factor } else { 1.0 };
    let damage = boss.base_damage * factor * state.tuning.chapter_multiplier(state.chapter);
    state.enemies.push(Enemy {
        id,
        kind: EnemyKind::Boss,
        pos,
        radius: boss.radius,
        hp,
        max_hp: hp,
        speed: boss.speed,
        damage,
        xp_reward: boss.xp_reward,
        score_reward: boss.score_reward,
        coin_reward: boss.coin_reward,
        attack_timer: boss.attack_interval_ticks,
        volleys: 0,
        final_boss,
    });

    state.add_shake(12.0);
    events.push(GameEvent::BossWarning { final_boss });
    events.push(GameEvent::Sound(SoundEffect::BossWarning));
    log::info!(
        "{} boss #{id} arrived at tick {} with {hp:.0} hp",
        if final_boss { "Final" } else { "Mid-run" },
        state.time_ticks
    );
}

fn spawn_crate(state: &mut GameState) {
    let pos = spawn_position(state);
    let id = state.next_entity_id();
    let spawn = &state.tuning.spawn;
    state.crates.push(Crate {
        id,
        pos,
        radius: spawn.crate_radius,
        hp: spawn.crate_hp,
    });
    log::debug!("Spawned crate #{id}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Viewport;
    use crate::sim::state::RunConfig;
    use crate::tuning::Tuning;

    fn state_at(ticks: u64) -> GameState {
        let mut state = GameState::new(42);
        state.time_ticks = ticks;
        state
    }

    #[test]
    fn test_spawn_period_shrinks_with_score_and_is_bounded() {
        let mut state = GameState::new(1);
        assert_eq!(spawn_period(&state), 60);
        state.score = 400;
        assert_eq!(spawn_period(&state), 50);
        state.score = u64::MAX;
        assert_eq!(spawn_period(&state), state.tuning.spawn.min_period);
    }

    #[test]
    fn test_spawns_on_period_boundary_only() {
        let mut state = state_at(59);
        let mut events = Vec::new();
        run(&mut state, &mut events);
        assert!(state.enemies.is_empty());

        state.time_ticks = 60;
        run(&mut state, &mut events);
        assert_eq!(state.enemies.len(), 1);
    }

    #[test]
    fn test_spawn_on_fixed_circle() {
        let mut state = GameState::new(3);
        let radius = state.spawn_radius();
        for _ in 0..20 {
            spawn_enemy(&mut state, EnemyKind::Basic);
        }
        for e in &state.enemies {
            let d = crate::distance(e.pos, state.player_pos());
            assert!((d - radius).abs() < 1e-2);
            assert!(!state.viewport.contains_circle(e.pos, e.radius));
        }
    }

    #[test]
    fn test_score_gates_categories() {
        let mut state = GameState::new(9);
        for _ in 0..200 {
            assert_eq!(roll_kind(&mut state), EnemyKind::Basic);
        }
        state.score = 10_000;
        let kinds: Vec<_> = (0..500).map(|_| roll_kind(&mut state)).collect();
        assert!(kinds.contains(&EnemyKind::Fast));
        assert!(kinds.contains(&EnemyKind::Tank));
    }

    #[test]
    fn test_enemy_stats_scale_with_chapter_and_level() {
        let config = RunConfig {
            chapter: 2,
            ..RunConfig::with_seed(5)
        };
        let mut state = GameState::with_config(config, Tuning::default());
        state.player.level = 6;
        spawn_enemy(&mut state, EnemyKind::Basic);
        let e = &state.enemies[0];
        let scale = 1.5 * 1.4;
        assert!((e.max_hp - 25.0 * scale).abs() < 1e-3);
        assert_eq!(e.hp, e.max_hp);
        assert!((e.damage - 10.0 * scale).abs() < 1e-3);
    }

    #[test]
    fn test_boss_checkpoint_clears_field_and_fires_once() {
        let checkpoint = Tuning::default().boss.checkpoints[0];
        let mut state = state_at(checkpoint - 1);
        for _ in 0..5 {
            spawn_enemy(&mut state, EnemyKind::Basic);
        }

        let mut events = Vec::new();
        state.time_ticks = checkpoint;
        run(&mut state, &mut events);

        let bosses: Vec<_> = state.enemies.iter().filter(|e| e.is_boss()).collect();
        assert_eq!(bosses.len(), 1);
        assert_eq!(state.enemies.len(), 1);
        assert_eq!(bosses[0].hp, bosses[0].max_hp);
        assert_eq!(bosses[0].max_hp, state.tuning.boss_hp(1, false));
        assert!(!bosses[0].final_boss);
        assert!(events.contains(&GameEvent::BossWarning { final_boss: false }));

        events.clear();
        state.time_ticks += 1;
        run(&mut state, &mut events);
        assert_eq!(state.enemies.iter().filter(|e| e.is_boss()).count(), 1);
        assert!(!events.iter().any(|e| matches!(e, GameEvent::BossWarning { .. })));
    }

    #[test]
    fn test_second_checkpoint_spawns_final_boss() {
        let checkpoint = Tuning::default().boss.checkpoints[1];
        let mut state = state_at(checkpoint);
        state.bosses_spawned[0] = true;
        let mut events = Vec::new();
        run(&mut state, &mut events);
        let boss = state.enemies.iter().find(|e| e.is_boss()).expect("boss");
        assert!(boss.final_boss);
        assert_eq!(boss.max_hp, state.tuning.boss_hp(1, true));
    }

    #[test]
    fn test_crates_capped() {
        let mut state = GameState::new(2);
        state.resize(Viewport::new(800.0, 600.0));
        let period = state.tuning.spawn.crate_period;
        let mut events = Vec::new();
        for i in 1..=10 {
            state.time_ticks = period * i;
            run(&mut state, &mut events);
        }
        assert_eq!(state.crates.len(), state.tuning.spawn.max_crates);
    }

    #[test]
    fn test_zero_periods_fire_every_tick() {
        let mut state = state_at(secs_into_horde());
        state.tuning.spawn.horde_period = 0;
        state.tuning.spawn.crate_period = 0;
        state.tuning.spawn.base_period = 0;
        state.tuning.spawn.min_period = 0;
        let mut events = Vec::new();
        for _ in 0..3 {
            run(&mut state, &mut events);
            state.time_ticks += 1;
        }
        // Ordinary spawn plus horde spawn on each tick
        assert_eq!(state.enemies.len(), 6);
        assert_eq!(state.crates.len(), state.tuning.spawn.max_crates);
    }

    fn secs_into_horde() -> u64 {
        Tuning::default().spawn.horde_windows[0].0
    }

    #[test]
    fn test_horde_window_adds_basic_enemies() {
        let (start, _) = Tuning::default().spawn.horde_windows[0];
        let period = Tuning::default().spawn.horde_period;
        let mut state = state_at(start);
        // Keep the ordinary spawner quiet for this tick
        state.tuning.spawn.base_period = 7;
        state.tuning.spawn.min_period = 7;
        let t = (start..).find(|t| t % period == 0 && t % 7 != 0).expect("tick");
        state.time_ticks = t;
        let mut events = Vec::new();
        run(&mut state, &mut events);
        assert_eq!(state.enemies.len(), 1);
        assert_eq!(state.enemies[0].kind, EnemyKind::Basic);
    }
}
