//! Collision & damage resolution
//!
//! Every pairwise test in a tick sees the entity set as it was when the
//! resolver started: an enemy killed by the first projectile still registers
//! hits from later ones (they count, but the kill is only handled once), and
//! drops spawned mid-pass cannot be collected until the next tick.

use glam::Vec2;
use rand::Rng;

use super::events::GameEvent;
use super::progression::{enter_treasure, end_run, gain_xp};
use super::state::{
    CrateDrop, EnemyKind, EnemyShot, GamePhase, GameState, ParticleKind, PickupKind, ProjectileOwner,
    RunOutcome, Treasure,
};
use crate::audio::SoundEffect;
use crate::{circles_overlap, polar_to_cartesian};

/// Marker stored in `hit_ids` when an enemy laser has already struck the player
pub const PLAYER_TARGET: u32 = 0;

/// Entities alive when the pass started
struct Snapshot {
    enemies_alive: Vec<bool>,
    crates_intact: Vec<bool>,
    projectiles: usize,
    pickups: usize,
    treasures: usize,
}

impl Snapshot {
    fn take(state: &GameState) -> Self {
        Self {
            enemies_alive: state.enemies.iter().map(|e| e.is_alive()).collect(),
            crates_intact: state.crates.iter().map(|c| c.is_intact()).collect(),
            projectiles: state.projectiles.len(),
            pickups: state.pickups.len(),
            treasures: state.treasures.len(),
        }
    }
}

/// Detect and apply all overlaps for the current tick
pub fn resolve(state: &mut GameState, events: &mut Vec<GameEvent>) {
    let snapshot = Snapshot::take(state);
    player_enemy_contacts(state, &snapshot, events);
    enemy_shots_on_player(state, &snapshot, events);
    player_shots(state, &snapshot, events);
    // A lethal hit ends the run at the death check; kills above still count
    if state.player.is_dead() {
        return;
    }
    collect_pickups(state, &snapshot, events);
    open_treasures(state, &snapshot, events);
}

fn player_enemy_contacts(state: &mut GameState, snapshot: &Snapshot, events: &mut Vec<GameEvent>) {
    let player_pos = state.player.pos;
    let player_radius = state.player.radius;
    let fudge = state.tuning.combat.contact_fudge;
    let chip = state.tuning.combat.contact_chip_damage;

    for i in 0..snapshot.enemies_alive.len() {
        if !snapshot.enemies_alive[i] {
            continue;
        }
        let enemy = &state.enemies[i];
        if !circles_overlap(player_pos, player_radius, enemy.pos, enemy.radius, fudge) {
            continue;
        }
        let damage = enemy.damage;
        hit_player(state, damage, events);
        damage_enemy(state, i, chip, events);
    }
}

fn enemy_shots_on_player(state: &mut GameState, snapshot: &Snapshot, events: &mut Vec<GameEvent>) {
    let player_pos = state.player.pos;
    let player_radius = state.player.radius;

    for j in 0..snapshot.projectiles {
        let p = &state.projectiles[j];
        let ProjectileOwner::Enemy(shot) = p.owner else {
            continue;
        };
        if p.is_spent()
            || p.hit_ids.contains(&PLAYER_TARGET)
            || !circles_overlap(player_pos, player_radius, p.pos, p.radius, 1.0)
        {
            continue;
        }
        let damage = p.damage;
        if !hit_player(state, damage, events) {
            continue;
        }
        let p = &mut state.projectiles[j];
        match shot {
            EnemyShot::Orb => p.penetration = 0,
            EnemyShot::Laser => p.hit_ids.push(PLAYER_TARGET),
        }
    }
}

/// Invulnerability-gated damage to the player; returns whether it landed
pub(crate) fn hit_player(state: &mut GameState, damage: f32, events: &mut Vec<GameEvent>) -> bool {
    if state.player.invulnerable_ticks > 0 {
        return false;
    }
    let window = state.tuning.player.invulnerability_ticks;
    let pos = state.player.pos;

    let dodge = state.player.dodge_chance;
    if dodge > 0.0 && state.rng.random::<f32>() < dodge {
        state.player.invulnerable_ticks = window;
        state.spawn_particles(pos, 6, ParticleKind::Sparkle);
        events.push(GameEvent::Dodged);
        events.push(GameEvent::Sound(SoundEffect::Dodge));
        return false;
    }

    state.player.hp -= damage;
    state.player.invulnerable_ticks = window;
    state.add_shake(state.tuning.combat.hit_shake);
    state.spawn_particles(pos, 10, ParticleKind::Burst);
    events.push(GameEvent::PlayerDamaged { amount: damage });
    events.push(GameEvent::Sound(SoundEffect::PlayerHurt));
    true
}

fn player_shots(state: &mut GameState, snapshot: &Snapshot, events: &mut Vec<GameEvent>) {
    for j in 0..snapshot.projectiles {
        if !state.projectiles[j].is_player_owned() {
            continue;
        }

        for i in 0..snapshot.enemies_alive.len() {
            let p = &state.projectiles[j];
            if p.is_spent() {
                break;
            }
            let e = &state.enemies[i];
            if !snapshot.enemies_alive[i]
                || p.hit_ids.contains(&e.id)
                || !circles_overlap(p.pos, p.radius, e.pos, e.radius, 1.0)
            {
                continue;
            }
            let (target_id, target_pos) = (e.id, e.pos);
            let amount = strike(state, j, target_id, target_pos, events);
            damage_enemy(state, i, amount, events);
        }

        for c in 0..snapshot.crates_intact.len() {
            let p = &state.projectiles[j];
            if p.is_spent() {
                break;
            }
            let cr = &state.crates[c];
            if !snapshot.crates_intact[c]
                || p.hit_ids.contains(&cr.id)
                || !circles_overlap(p.pos, p.radius, cr.pos, cr.radius, 1.0)
            {
                continue;
            }
            let (target_id, target_pos) = (cr.id, cr.pos);
            let amount = strike(state, j, target_id, target_pos, events);
            damage_crate(state, c, amount, events);
        }
    }
}

/// Roll the crit, spend one penetration and show the hit; returns the damage dealt
fn strike(
    state: &mut GameState,
    projectile: usize,
    target_id: u32,
    target_pos: Vec2,
    events: &mut Vec<GameEvent>,
) -> f32 {
    let crit_chance = state.player.crit_chance;
    let crit = crit_chance > 0.0 && state.rng.random::<f32>() < crit_chance;

    let p = &mut state.projectiles[projectile];
    p.penetration = p.penetration.saturating_sub(1);
    p.hit_ids.push(target_id);
    let amount = if crit {
        p.damage * state.player.crit_multiplier
    } else {
        p.damage
    };

    state.spawn_floating_text(target_pos, amount, crit);
    state.spawn_particles(target_pos, if crit { 6 } else { 3 }, ParticleKind::Spark);
    events.push(GameEvent::Sound(SoundEffect::Hit));
    amount
}

/// Damage an enemy and run kill handling on the alive-to-dead transition
pub(crate) fn damage_enemy(
    state: &mut GameState,
    idx: usize,
    amount: f32,
    events: &mut Vec<GameEvent>,
) -> bool {
    let killed = state.enemies[idx].take_damage(amount);
    if killed {
        on_enemy_killed(state, idx, events);
    }
    killed
}

fn on_enemy_killed(state: &mut GameState, idx: usize, events: &mut Vec<GameEvent>) {
    let enemy = state.enemies[idx].clone();
    state.kills += 1;
    state.score += enemy.score_reward;
    if enemy.coin_reward > 0 {
        state.run_coins += enemy.coin_reward;
        events.push(GameEvent::CurrencyGained(enemy.coin_reward));
    }
    events.push(GameEvent::EnemyKilled { kind: enemy.kind });

    if !enemy.is_boss() {
        roll_enemy_drop(state, enemy.kind, enemy.pos, enemy.xp_reward);
        state.spawn_particles(enemy.pos, 8, ParticleKind::Burst);
        events.push(GameEvent::Sound(SoundEffect::EnemyDeath));
        return;
    }

    for _ in 0..state.tuning.boss.gem_drops {
        let angle = state.rng.random_range(0.0..std::f32::consts::TAU);
        let dist = state.rng.random_range(0.0..enemy.radius);
        let pos = enemy.pos + polar_to_cartesian(dist, angle);
        state.spawn_pickup(PickupKind::XpGem, pos, enemy.xp_reward);
    }
    state.spawn_particles(enemy.pos, 40, ParticleKind::Shockwave);
    state.add_shake(14.0);
    events.push(GameEvent::Sound(SoundEffect::BossDeath));

    if enemy.final_boss {
        log::info!("Final boss #{} defeated", enemy.id);
        end_run(state, RunOutcome::Victory, events);
    } else {
        let id = state.next_entity_id();
        let boss = &state.tuning.boss;
        state.treasures.push(Treasure {
            id,
            pos: enemy.pos,
            radius: boss.treasure_radius,
            life_ticks: boss.treasure_life_ticks,
            opened: false,
        });
        log::info!("Boss #{} defeated, treasure #{id} dropped", enemy.id);
    }
}

/// One drop roll per kill, plus any guaranteed gems for the category
fn roll_enemy_drop(state: &mut GameState, kind: EnemyKind, pos: Vec2, xp: u32) {
    let params = state.tuning.enemies.get(kind);
    let (gem_chance, coin_chance, guaranteed) =
        (params.gem_chance, params.coin_chance, params.guaranteed_gems);
    let coin_value = state.tuning.drops.coin_value;

    for k in 0..guaranteed {
        let offset = polar_to_cartesian(8.0, k as f32 * 2.1);
        state.spawn_pickup(PickupKind::XpGem, pos + offset, xp);
    }

    let roll = state.rng.random::<f32>();
    if roll < gem_chance {
        state.spawn_pickup(PickupKind::XpGem, pos, xp);
    } else if roll < gem_chance + coin_chance {
        state.spawn_pickup(PickupKind::Coin, pos, coin_value);
    }
}

/// Damage a crate and open it on destruction
pub(crate) fn damage_crate(
    state: &mut GameState,
    idx: usize,
    amount: f32,
    events: &mut Vec<GameEvent>,
) -> bool {
    let was_intact = state.crates[idx].is_intact();
    state.crates[idx].hp -= amount;
    let opened = was_intact && !state.crates[idx].is_intact();
    if opened {
        open_crate(state, idx, events);
    }
    opened
}

fn roll_crate_drop(state: &mut GameState) -> CrateDrop {
    let weights = state.tuning.drops.crate_weights;
    let total: u32 = weights.iter().sum();
    if total == 0 {
        return CrateDrop::Heal;
    }
    let mut roll = state.rng.random_range(0..total);
    for (drop, weight) in CrateDrop::ALL.into_iter().zip(weights) {
        if roll < weight {
            return drop;
        }
        roll -= weight;
    }
    CrateDrop::Heal
}

fn open_crate(state: &mut GameState, idx: usize, events: &mut Vec<GameEvent>) {
    let pos = state.crates[idx].pos;
    let drop = roll_crate_drop(state);
    let drops = state.tuning.drops.clone();

    match drop {
        CrateDrop::Heal => {
            state.spawn_pickup(PickupKind::Heal, pos, drops.heal_amount);
        }
        CrateDrop::Coins => {
            state.spawn_pickup(PickupKind::Coin, pos, drops.coin_bag_value);
        }
        CrateDrop::Bomb => {
            for i in 0..state.enemies.len() {
                let e = &state.enemies[i];
                if e.is_alive() && !e.is_boss() {
                    let hp = e.hp;
                    damage_enemy(state, i, hp, events);
                }
            }
            state.add_shake(10.0);
            state.spawn_particles(pos, 30, ParticleKind::Shockwave);
            events.push(GameEvent::Sound(SoundEffect::Explosion));
        }
        CrateDrop::Magnet => {
            for p in &mut state.pickups {
                p.pulled = true;
            }
        }
        CrateDrop::Frenzy => {
            state.player.frenzy_ticks = drops.frenzy_ticks;
        }
    }

    state.spawn_particles(pos, 12, ParticleKind::Burst);
    events.push(GameEvent::CrateOpened(drop));
    events.push(GameEvent::Sound(SoundEffect::CrateBreak));
    log::debug!("Crate opened: {drop:?}");
}

fn collect_pickups(state: &mut GameState, snapshot: &Snapshot, events: &mut Vec<GameEvent>) {
    let player_pos = state.player.pos;
    let player_radius = state.player.radius;

    for k in 0..snapshot.pickups {
        let p = &state.pickups[k];
        if p.collected || !circles_overlap(player_pos, player_radius, p.pos, p.radius, 1.0) {
            continue;
        }
        let (kind, value) = (p.kind, p.value);
        state.pickups[k].collected = true;

        match kind {
            PickupKind::XpGem => {
                gain_xp(state, value, events);
                events.push(GameEvent::Sound(SoundEffect::Pickup));
            }
            PickupKind::Coin => {
                state.run_coins += value;
                events.push(GameEvent::CurrencyGained(value));
                events.push(GameEvent::Sound(SoundEffect::Pickup));
            }
            PickupKind::Heal => {
                state.player.heal(value as f32);
                events.push(GameEvent::Sound(SoundEffect::Heal));
            }
        }
    }
}

fn open_treasures(state: &mut GameState, snapshot: &Snapshot, events: &mut Vec<GameEvent>) {
    let player_pos = state.player.pos;
    let player_radius = state.player.radius;

    for k in 0..snapshot.treasures {
        if state.phase != GamePhase::Running {
            break;
        }
        let t = &state.treasures[k];
        if t.opened || !circles_overlap(player_pos, player_radius, t.pos, t.radius, 1.0) {
            continue;
        }
        state.treasures[k].opened = true;
        enter_treasure(state, events);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::spawner::spawn_enemy;
    use crate::sim::state::{Crate, ShotSpec, WeaponKind};

    fn quiet_state() -> GameState {
        let mut state = GameState::new(77);
        state.player.crit_chance = 0.0;
        state
    }

    fn place_enemy(state: &mut GameState, kind: EnemyKind, offset: Vec2) -> usize {
        spawn_enemy(state, kind);
        let idx = state.enemies.len() - 1;
        state.enemies[idx].pos = state.player.pos + offset;
        idx
    }

    fn fire_at(state: &mut GameState, pos: Vec2, damage: f32, penetration: u32) {
        let spec = ShotSpec {
            owner: ProjectileOwner::Player(WeaponKind::Blaster),
            dir: Vec2::X,
            speed: 0.0,
            radius: 4.0,
            damage,
            duration: 60,
            penetration,
            homing: false,
        };
        state.spawn_projectile(&spec, pos);
    }

    #[test]
    fn test_three_hits_kill_basic_with_one_drop_roll() {
        let mut state = quiet_state();
        let target = state.player.pos + Vec2::new(200.0, 0.0);
        let idx = place_enemy(&mut state, EnemyKind::Basic, Vec2::new(200.0, 0.0));
        assert_eq!(state.enemies[idx].hp, 25.0);
        let mut events = Vec::new();

        for hit in 1..=3 {
            fire_at(&mut state, target, 10.0, 1);
            resolve(&mut state, &mut events);
            state.projectiles.retain(|p| !p.is_spent());
            if hit < 3 {
                assert!(state.enemies[idx].is_alive());
                assert!(state.pickups.is_empty());
            }
        }

        assert!(!state.enemies[idx].is_alive());
        assert_eq!(state.score, state.tuning.enemies.basic.score_reward);
        assert!(state.pickups.len() <= 1);
        assert_eq!(state.kills, 1);
        let kills = events.iter().filter(|e| matches!(e, GameEvent::EnemyKilled { .. })).count();
        assert_eq!(kills, 1);
    }

    #[test]
    fn test_simultaneous_hits_all_count_but_kill_once() {
        let mut state = quiet_state();
        let offset = Vec2::new(200.0, 0.0);
        let idx = place_enemy(&mut state, EnemyKind::Basic, offset);
        let target = state.player.pos + offset;
        for _ in 0..4 {
            fire_at(&mut state, target, 10.0, 1);
        }
        let mut events = Vec::new();
        resolve(&mut state, &mut events);

        assert!(state.projectiles.iter().all(|p| p.penetration == 0));
        assert_eq!(state.enemies[idx].hp, 25.0 - 40.0);
        assert_eq!(state.kills, 1);
        assert_eq!(state.score, state.tuning.enemies.basic.score_reward);
    }

    #[test]
    fn test_penetration_limits_targets() {
        let mut state = quiet_state();
        let offset = Vec2::new(200.0, 0.0);
        let a = place_enemy(&mut state, EnemyKind::Basic, offset);
        let b = place_enemy(&mut state, EnemyKind::Basic, offset);
        let target = state.player.pos + offset;
        fire_at(&mut state, target, 5.0, 1);
        let mut events = Vec::new();
        resolve(&mut state, &mut events);
        assert_eq!(state.enemies[a].hp, 20.0);
        assert_eq!(state.enemies[b].hp, 25.0);
    }

    #[test]
    fn test_contact_is_invulnerability_gated() {
        let mut state = quiet_state();
        let idx = place_enemy(&mut state, EnemyKind::Basic, Vec2::new(5.0, 0.0));
        let damage = state.enemies[idx].damage;
        let mut events = Vec::new();

        resolve(&mut state, &mut events);
        assert_eq!(state.player.hp, state.player.max_hp - damage);
        assert!(state.player.invulnerable_ticks > 0);
        let chipped = state.enemies[idx].hp;
        assert!(chipped < state.enemies[idx].max_hp);

        resolve(&mut state, &mut events);
        assert_eq!(state.player.hp, state.player.max_hp - damage);
        assert!(state.enemies[idx].hp < chipped, "chip damage applies every tick");
    }

    #[test]
    fn test_two_contacts_in_one_tick_hurt_once() {
        let mut state = quiet_state();
        place_enemy(&mut state, EnemyKind::Basic, Vec2::new(4.0, 0.0));
        place_enemy(&mut state, EnemyKind::Basic, Vec2::new(-4.0, 0.0));
        let mut events = Vec::new();
        resolve(&mut state, &mut events);
        let hurts = events
            .iter()
            .filter(|e| matches!(e, GameEvent::PlayerDamaged { .. }))
            .count();
        assert_eq!(hurts, 1);
    }

    #[test]
    fn test_certain_dodge_avoids_damage() {
        let mut state = quiet_state();
        state.player.dodge_chance = 1.0;
        place_enemy(&mut state, EnemyKind::Basic, Vec2::ZERO);
        let mut events = Vec::new();
        resolve(&mut state, &mut events);
        assert_eq!(state.player.hp, state.player.max_hp);
        assert!(events.contains(&GameEvent::Dodged));
        assert!(state.player.invulnerable_ticks > 0);
    }

    #[test]
    fn test_orb_consumed_laser_passes_through() {
        let mut state = quiet_state();
        let pos = state.player.pos;
        for shot in [EnemyShot::Orb, EnemyShot::Laser] {
            state.player.invulnerable_ticks = 0;
            state.projectiles.clear();
            let spec = ShotSpec {
                owner: ProjectileOwner::Enemy(shot),
                dir: Vec2::X,
                speed: 0.0,
                radius: 5.0,
                damage: 7.0,
                duration: 30,
                penetration: 1,
                homing: false,
            };
            state.spawn_projectile(&spec, pos);
            let mut events = Vec::new();
            resolve(&mut state, &mut events);
            let p = &state.projectiles[0];
            match shot {
                EnemyShot::Orb => assert!(p.is_spent()),
                EnemyShot::Laser => {
                    assert!(!p.is_spent());
                    assert!(p.hit_ids.contains(&PLAYER_TARGET));
                }
            }
        }
        assert_eq!(state.player.hp, state.player.max_hp - 14.0);
    }

    #[test]
    fn test_pickups_apply_by_kind() {
        let mut state = quiet_state();
        state.player.hp = 50.0;
        let pos = state.player.pos;
        state.spawn_pickup(PickupKind::XpGem, pos, 3);
        state.spawn_pickup(PickupKind::Coin, pos, 4);
        state.spawn_pickup(PickupKind::Heal, pos, 80);
        let mut events = Vec::new();
        resolve(&mut state, &mut events);
        assert_eq!(state.player.xp, 3);
        assert_eq!(state.run_coins, 4);
        assert_eq!(state.player.hp, state.player.max_hp);
        assert!(state.pickups.iter().all(|p| p.collected));
        assert!(events.contains(&GameEvent::CurrencyGained(4)));
    }

    #[test]
    fn test_dead_player_collects_nothing() {
        let mut state = quiet_state();
        state.player.hp = 1.0;
        place_enemy(&mut state, EnemyKind::Basic, Vec2::ZERO);
        let pos = state.player.pos;
        state.spawn_pickup(PickupKind::Heal, pos, 80);
        state.spawn_pickup(PickupKind::Coin, pos, 4);
        let id = state.next_entity_id();
        state.treasures.push(Treasure {
            id,
            pos,
            radius: 10.0,
            life_ticks: 100,
            opened: false,
        });

        let mut events = Vec::new();
        resolve(&mut state, &mut events);
        assert!(state.player.is_dead());
        assert!(state.pickups.iter().all(|p| !p.collected));
        assert_eq!(state.run_coins, 0);
        assert!(!state.treasures[0].opened);
        assert_eq!(state.phase, GamePhase::Running);
    }

    #[test]
    fn test_tank_guarantees_gems() {
        let mut state = quiet_state();
        let offset = Vec2::new(250.0, 0.0);
        let idx = place_enemy(&mut state, EnemyKind::Tank, offset);
        let hp = state.enemies[idx].hp;
        let target = state.player.pos + offset;
        fire_at(&mut state, target, hp, 1);
        let mut events = Vec::new();
        resolve(&mut state, &mut events);
        let gems = state.pickups.iter().filter(|p| p.kind == PickupKind::XpGem).count();
        assert_eq!(gems as u32, state.tuning.enemies.tank.guaranteed_gems);
    }

    #[test]
    fn test_mid_boss_drops_treasure_final_boss_wins() {
        for final_boss in [false, true] {
            let mut state = quiet_state();
            let idx = place_enemy(&mut state, EnemyKind::Basic, Vec2::new(300.0, 0.0));
            let boss = &mut state.enemies[idx];
            boss.kind = EnemyKind::Boss;
            boss.final_boss = final_boss;
            boss.hp = 5.0;
            let target = state.player.pos + Vec2::new(300.0, 0.0);
            fire_at(&mut state, target, 10.0, 1);
            let mut events = Vec::new();
            resolve(&mut state, &mut events);

            assert_eq!(state.pickups.len() as u32, state.tuning.boss.gem_drops);
            if final_boss {
                assert_eq!(state.phase, GamePhase::Ended(RunOutcome::Victory));
                assert!(state.treasures.is_empty());
            } else {
                assert_eq!(state.phase, GamePhase::Running);
                assert_eq!(state.treasures.len(), 1);
            }
        }
    }

    #[test]
    fn test_treasure_contact_opens_treasure_flow() {
        let mut state = quiet_state();
        let id = state.next_entity_id();
        state.treasures.push(Treasure {
            id,
            pos: state.player.pos,
            radius: 10.0,
            life_ticks: 100,
            opened: false,
        });
        let mut events = Vec::new();
        resolve(&mut state, &mut events);
        assert_eq!(state.phase, GamePhase::TreasurePaused);
        assert!(state.treasures[0].opened);
        assert!(events.contains(&GameEvent::TreasureOpened));
    }

    #[test]
    fn test_bomb_crate_clears_ordinary_enemies() {
        let mut state = quiet_state();
        state.tuning.drops.crate_weights = [0, 0, 1, 0, 0];
        for i in 0..3 {
            place_enemy(&mut state, EnemyKind::Basic, Vec2::new(300.0, 40.0 * i as f32));
        }
        let offset = Vec2::new(-150.0, 0.0);
        let id = state.next_entity_id();
        state.crates.push(Crate {
            id,
            pos: state.player.pos + offset,
            radius: 10.0,
            hp: 5.0,
        });
        let target = state.player.pos + offset;
        fire_at(&mut state, target, 10.0, 1);
        let mut events = Vec::new();
        resolve(&mut state, &mut events);
        assert!(state.enemies.iter().all(|e| !e.is_alive()));
        assert_eq!(state.kills, 3);
        assert!(events.contains(&GameEvent::CrateOpened(CrateDrop::Bomb)));
    }

    #[test]
    fn test_magnet_and_frenzy_crates() {
        let mut state = quiet_state();
        let far = state.player.pos + Vec2::new(500.0, 0.0);
        state.spawn_pickup(PickupKind::XpGem, far, 1);
        let mut events = Vec::new();

        state.tuning.drops.crate_weights = [0, 0, 0, 1, 0];
        let id = state.next_entity_id();
        state.crates.push(Crate { id, pos: far, radius: 10.0, hp: 1.0 });
        damage_crate(&mut state, 0, 5.0, &mut events);
        assert!(state.pickups[0].pulled);

        state.tuning.drops.crate_weights = [0, 0, 0, 0, 1];
        let id = state.next_entity_id();
        state.crates.push(Crate { id, pos: far, radius: 10.0, hp: 1.0 });
        damage_crate(&mut state, 1, 5.0, &mut events);
        assert_eq!(state.player.frenzy_ticks, state.tuning.drops.frenzy_ticks);

        // Already broken crates do not reopen
        assert!(!damage_crate(&mut state, 1, 5.0, &mut events));
    }

    #[test]
    fn test_no_overlaps_changes_nothing() {
        let mut state = quiet_state();
        place_enemy(&mut state, EnemyKind::Basic, Vec2::new(300.0, 0.0));
        let pos = state.player.pos;
        fire_at(&mut state, pos + Vec2::new(-300.0, 0.0), 10.0, 1);
        state.spawn_pickup(PickupKind::XpGem, pos + Vec2::new(0.0, 200.0), 1);

        let before = serde_json::to_string(&state).expect("serialize");
        let mut events = Vec::new();
        resolve(&mut state, &mut events);
        let after = serde_json::to_string(&state).expect("serialize");
        assert_eq!(before, after);
        assert!(events.is_empty());
    }
}
