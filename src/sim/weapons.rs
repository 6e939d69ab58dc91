//! Weapon firing, the burst queue, homing and boss attack patterns

use glam::Vec2;

use super::collision::{damage_crate, damage_enemy};
use super::events::GameEvent;
use super::state::{
    EVOLVED_LEVEL, EnemyShot, GameState, ParticleKind, PendingShot, Player, ProjectileOwner,
    ShotSpec, WeaponKind,
};
use crate::audio::SoundEffect;
use crate::tuning::Tuning;
use crate::{direction, distance, polar_to_cartesian, rotate_toward};

/// Ticks between volleys at the player's current attack speed
pub fn attack_interval(player: &Player, tuning: &Tuning) -> f32 {
    let mut speed = player.attack_speed_multiplier;
    if player.frenzy_ticks > 0 {
        speed *= tuning.drops.frenzy_multiplier;
    }
    tuning.weapons.base_interval_ticks / speed.max(f32::EPSILON)
}

/// Nearest living enemy or intact crate within acquisition range
pub fn nearest_target(state: &GameState) -> Option<Vec2> {
    let origin = state.player_pos();
    let range = state.tuning.weapons.target_range;
    let enemies = state.enemies.iter().filter(|e| e.is_alive()).map(|e| e.pos);
    let crates = state.crates.iter().filter(|c| c.is_intact()).map(|c| c.pos);
    enemies
        .chain(crates)
        .map(|pos| (pos, distance(origin, pos)))
        .filter(|&(_, d)| d <= range)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(pos, _)| pos)
}

/// Fire every equipped weapon once the attack timer has elapsed.
/// With nothing in range the timer keeps counting.
pub fn fire(state: &mut GameState, events: &mut Vec<GameEvent>) -> bool {
    let interval = attack_interval(&state.player, &state.tuning);
    if (state.player.ticks_since_last_shot as f32) <= interval {
        return false;
    }
    let Some(target) = nearest_target(state) else {
        return false;
    };

    let aim = direction(state.player_pos(), target);
    let weapons: Vec<WeaponKind> = state.player.equipped_weapons().collect();
    for weapon in weapons {
        queue_volley(state, weapon, aim);
    }
    state.player.ticks_since_last_shot = 0;
    events.push(GameEvent::Sound(SoundEffect::Shoot));
    true
}

/// `count` directions spread evenly across `spread` radians around `aim`
fn fan(aim: Vec2, count: u32, spread: f32) -> Vec<Vec2> {
    let base = aim.y.atan2(aim.x);
    if count <= 1 {
        return vec![aim];
    }
    let step = spread / (count - 1) as f32;
    (0..count)
        .map(|i| polar_to_cartesian(1.0, base - spread / 2.0 + step * i as f32))
        .collect()
}

fn queue_volley(state: &mut GameState, weapon: WeaponKind, aim: Vec2) {
    let level = state.player.weapon_level(weapon);
    let evolved = level >= EVOLVED_LEVEL;
    let steps = u32::from(level.saturating_sub(1));
    let weapons = &state.tuning.weapons;
    let params = weapon.params(&state.tuning);

    let mut damage = (params.damage + params.damage_per_level * steps as f32)
        * state.player.damage_multiplier;
    if evolved {
        damage *= weapons.evolved_damage_factor;
    }
    let spec = |dir: Vec2, penetration: u32, homing: bool| ShotSpec {
        owner: ProjectileOwner::Player(weapon),
        dir,
        speed: params.speed,
        radius: params.radius,
        damage,
        duration: params.duration_ticks,
        penetration,
        homing,
    };

    let delay = weapons.burst_delay_ticks;
    let bonus = state.player.burst_bonus;
    let mut shots: Vec<PendingShot> = Vec::new();
    match weapon {
        WeaponKind::Blaster => {
            // Evolved blasters fire twin bolts
            let count = 1 + steps / 2 + bonus;
            let dirs = if evolved { fan(aim, 2, 0.12) } else { vec![aim] };
            let penetration = params.penetration + u32::from(evolved);
            for i in 0..count {
                for &dir in &dirs {
                    shots.push(PendingShot {
                        delay: i * delay,
                        spec: spec(dir, penetration, false),
                    });
                }
            }
        }
        WeaponKind::Scatter => {
            let (pellets, spread) = if evolved {
                (10, weapons.scatter_spread * 1.5)
            } else {
                (3 + steps / 2, weapons.scatter_spread)
            };
            let penetration = params.penetration + u32::from(evolved);
            for v in 0..=bonus {
                for dir in fan(aim, pellets, spread) {
                    shots.push(PendingShot {
                        delay: v * delay * 2,
                        spec: spec(dir, penetration, false),
                    });
                }
            }
        }
        WeaponKind::Missile => {
            let count = if evolved { 5 } else { 1 + steps / 2 };
            let penetration = params.penetration + if evolved { 2 } else { 0 };
            for v in 0..=bonus {
                for (i, dir) in fan(aim, count, 0.3 * count as f32).into_iter().enumerate() {
                    shots.push(PendingShot {
                        delay: (v * count + i as u32) * delay,
                        spec: spec(dir, penetration, true),
                    });
                }
            }
        }
        WeaponKind::Laser => {
            let beams = if evolved { 3 } else { 1 };
            let penetration = params.penetration + steps + if evolved { 5 } else { 0 };
            for v in 0..=bonus {
                for dir in fan(aim, beams, 0.4) {
                    shots.push(PendingShot {
                        delay: v * delay * 3,
                        spec: spec(dir, penetration, false),
                    });
                }
            }
        }
    }
    state.pending_shots.extend(shots);
}

/// Turn pending shots whose delay has elapsed into live projectiles
pub fn drain_queue(state: &mut GameState) -> usize {
    let mut ready = Vec::new();
    state.pending_shots.retain_mut(|shot| {
        if shot.delay == 0 {
            ready.push(shot.spec.clone());
            false
        } else {
            shot.delay -= 1;
            true
        }
    });

    let origin = state.player_pos();
    for spec in &ready {
        state.spawn_projectile(spec, origin);
    }
    ready.len()
}

/// Bend homing projectiles toward the nearest living enemy by a bounded angle
pub fn steer_homing(state: &mut GameState) {
    let turn = state.tuning.weapons.missile_turn_rate;
    let enemies = &state.enemies;
    for p in state.projectiles.iter_mut().filter(|p| p.homing && p.is_player_owned()) {
        let nearest = enemies
            .iter()
            .filter(|e| e.is_alive())
            .min_by(|a, b| distance(p.pos, a.pos).total_cmp(&distance(p.pos, b.pos)));
        if let Some(e) = nearest {
            p.vel = rotate_toward(p.vel, e.pos - p.pos, turn);
        }
    }
}

/// Run each boss's attack timer; rings of orbs, and aimed laser volleys
/// alternating in for the final boss
pub fn boss_attacks(state: &mut GameState, events: &mut Vec<GameEvent>) {
    let player_pos = state.player_pos();
    let mut volleys = Vec::new();
    let interval = state.tuning.boss.attack_interval_ticks;
    for e in state.enemies.iter_mut().filter(|e| e.is_boss() && e.is_alive()) {
        e.attack_timer = e.attack_timer.saturating_sub(1);
        if e.attack_timer > 0 {
            continue;
        }
        e.attack_timer = interval;
        e.volleys += 1;
        let lasers = e.final_boss && e.volleys % 2 == 0;
        volleys.push((e.pos, e.volleys, e.final_boss, lasers));
    }

    let chapter = state.tuning.chapter_multiplier(state.chapter);
    for (pos, count, final_boss, lasers) in volleys {
        let boss = &state.tuning.boss;
        let factor = chapter * if final_boss { boss.final_factor } else { 1.0 };
        let shots: Vec<ShotSpec> = if lasers {
            fan(direction(pos, player_pos), boss.laser_count, boss.laser_spread * 2.0)
                .into_iter()
                .map(|dir| ShotSpec {
                    owner: ProjectileOwner::Enemy(EnemyShot::Laser),
                    dir,
                    speed: boss.laser_speed,
                    radius: boss.laser_radius,
                    damage: boss.laser_damage * factor,
                    duration: boss.laser_duration_ticks,
                    penetration: 1,
                    homing: false,
                })
                .collect()
        } else {
            let n = boss.orb_count.max(1);
            let twist = count as f32 * 0.3;
            (0..n)
                .map(|i| ShotSpec {
                    owner: ProjectileOwner::Enemy(EnemyShot::Orb),
                    dir: polar_to_cartesian(1.0, twist + std::f32::consts::TAU * i as f32 / n as f32),
                    speed: boss.orb_speed,
                    radius: boss.orb_radius,
                    damage: boss.orb_damage * factor,
                    duration: boss.orb_duration_ticks,
                    penetration: 1,
                    homing: false,
                })
                .collect()
        };
        for spec in &shots {
            state.spawn_projectile(spec, pos);
        }
        if lasers {
            events.push(GameEvent::Sound(SoundEffect::Explosion));
        }
    }
}

/// Nova pulse: damage everything within the skill radius. Returns false while cooling down.
pub fn trigger_skill(state: &mut GameState, events: &mut Vec<GameEvent>) -> bool {
    if state.player.skill_cooldown > 0 {
        return false;
    }
    let origin = state.player_pos();
    let pt = &state.tuning.player;
    let (radius, cooldown) = (pt.nova_radius, pt.nova_cooldown_ticks);
    let damage = pt.nova_damage * state.player.damage_multiplier;

    for i in 0..state.enemies.len() {
        let e = &state.enemies[i];
        if e.is_alive() && distance(origin, e.pos) < radius + e.radius {
            let pos = e.pos;
            state.spawn_floating_text(pos, damage, false);
            damage_enemy(state, i, damage, events);
        }
    }
    for i in 0..state.crates.len() {
        let c = &state.crates[i];
        if c.is_intact() && distance(origin, c.pos) < radius + c.radius {
            damage_crate(state, i, damage, events);
        }
    }

    state.player.skill_cooldown = cooldown;
    state.spawn_particles(origin, 24, ParticleKind::Shockwave);
    state.add_shake(8.0);
    events.push(GameEvent::Sound(SoundEffect::Nova));
    log::debug!("Nova pulse at tick {}", state.time_ticks);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::spawner::spawn_enemy;
    use crate::sim::state::EnemyKind;

    fn armed_state() -> GameState {
        let mut state = GameState::new(21);
        state.player.ticks_since_last_shot = 1000;
        state
    }

    fn enemy_at(state: &mut GameState, offset: Vec2) -> usize {
        spawn_enemy(state, EnemyKind::Basic);
        let idx = state.enemies.len() - 1;
        state.enemies[idx].pos = state.player.pos + offset;
        idx
    }

    #[test]
    fn test_no_target_keeps_timer_counting() {
        let mut state = armed_state();
        let mut events = Vec::new();
        enemy_at(&mut state, Vec2::new(2000.0, 0.0));
        assert!(!fire(&mut state, &mut events));
        assert_eq!(state.player.ticks_since_last_shot, 1000);
        assert!(state.pending_shots.is_empty());
    }

    #[test]
    fn test_fire_waits_for_interval() {
        let mut state = GameState::new(21);
        enemy_at(&mut state, Vec2::new(100.0, 0.0));
        let mut events = Vec::new();
        state.player.ticks_since_last_shot = 40;
        assert!(!fire(&mut state, &mut events));
        state.player.ticks_since_last_shot = 41;
        assert!(fire(&mut state, &mut events));
        assert_eq!(state.player.ticks_since_last_shot, 0);
        assert!(events.contains(&GameEvent::Sound(SoundEffect::Shoot)));
    }

    #[test]
    fn test_frenzy_shortens_interval() {
        let mut state = GameState::new(1);
        let normal = attack_interval(&state.player, &state.tuning);
        state.player.frenzy_ticks = 10;
        assert!(attack_interval(&state.player, &state.tuning) < normal);
    }

    #[test]
    fn test_targets_nearest_including_crates() {
        let mut state = armed_state();
        enemy_at(&mut state, Vec2::new(300.0, 0.0));
        let id = state.next_entity_id();
        let crate_pos = state.player.pos + Vec2::new(0.0, -100.0);
        state.crates.push(crate::sim::state::Crate {
            id,
            pos: crate_pos,
            radius: 10.0,
            hp: 10.0,
        });
        assert_eq!(nearest_target(&state), Some(crate_pos));
    }

    #[test]
    fn test_blaster_burst_drains_over_time() {
        let mut state = armed_state();
        state.player.weapon_levels[WeaponKind::Blaster.index()] = 5;
        enemy_at(&mut state, Vec2::new(100.0, 0.0));
        let mut events = Vec::new();
        fire(&mut state, &mut events);
        assert_eq!(state.pending_shots.len(), 3);

        assert_eq!(drain_queue(&mut state), 1);
        let delay = state.tuning.weapons.burst_delay_ticks;
        let mut spawned = 1;
        for _ in 0..(2 * delay + 1) {
            spawned += drain_queue(&mut state);
        }
        assert_eq!(spawned, 3);
        assert!(state.pending_shots.is_empty());
        for p in &state.projectiles {
            assert!(p.vel.x > 0.0 && p.vel.y.abs() < 1e-3);
        }
    }

    #[test]
    fn test_scatter_spreads_and_evolves() {
        let mut state = armed_state();
        state.player.weapon_levels = [0, 1, 0, 0];
        enemy_at(&mut state, Vec2::new(100.0, 0.0));
        let mut events = Vec::new();
        fire(&mut state, &mut events);
        drain_queue(&mut state);
        assert_eq!(state.projectiles.len(), 3);
        let ys: Vec<f32> = state.projectiles.iter().map(|p| p.vel.y).collect();
        assert!(ys[0] < 0.0 && ys[2] > 0.0);

        state.projectiles.clear();
        state.player.weapon_levels = [0, EVOLVED_LEVEL, 0, 0];
        state.player.ticks_since_last_shot = 1000;
        fire(&mut state, &mut events);
        drain_queue(&mut state);
        assert_eq!(state.projectiles.len(), 10);
    }

    #[test]
    fn test_evolved_laser_penetrates_more() {
        let mut state = armed_state();
        state.player.weapon_levels = [0, 0, 0, 1];
        enemy_at(&mut state, Vec2::new(100.0, 0.0));
        let mut events = Vec::new();
        fire(&mut state, &mut events);
        drain_queue(&mut state);
        let base = state.projectiles[0].penetration;

        state.projectiles.clear();
        state.player.weapon_levels = [0, 0, 0, EVOLVED_LEVEL];
        state.player.ticks_since_last_shot = 1000;
        fire(&mut state, &mut events);
        drain_queue(&mut state);
        assert_eq!(state.projectiles.len(), 3);
        assert!(state.projectiles.iter().all(|p| p.penetration > base));
    }

    #[test]
    fn test_homing_turn_is_bounded() {
        let mut state = armed_state();
        state.player.weapon_levels = [0, 0, 1, 0];
        enemy_at(&mut state, Vec2::new(100.0, 0.0));
        let mut events = Vec::new();
        fire(&mut state, &mut events);
        drain_queue(&mut state);
        assert!(state.projectiles[0].homing);

        // Target jumps behind; the missile only turns by the turn rate
        state.enemies[0].pos = state.player.pos + Vec2::new(-100.0, 1.0);
        let before = state.projectiles[0].vel;
        steer_homing(&mut state);
        let after = state.projectiles[0].vel;
        let turned = (after.y.atan2(after.x) - before.y.atan2(before.x)).abs();
        assert!((turned - state.tuning.weapons.missile_turn_rate).abs() < 1e-4);
        assert!((after.length() - before.length()).abs() < 1e-3);
    }

    #[test]
    fn test_boss_volleys_alternate_for_final_boss() {
        let mut state = GameState::new(8);
        let idx = enemy_at(&mut state, Vec2::new(200.0, 0.0));
        let e = &mut state.enemies[idx];
        e.kind = EnemyKind::Boss;
        e.final_boss = true;
        e.attack_timer = 1;
        let mut events = Vec::new();

        boss_attacks(&mut state, &mut events);
        let orbs = state.tuning.boss.orb_count as usize;
        assert_eq!(state.projectiles.len(), orbs);
        assert!(state
            .projectiles
            .iter()
            .all(|p| p.owner == ProjectileOwner::Enemy(EnemyShot::Orb)));

        state.projectiles.clear();
        state.enemies[idx].attack_timer = 1;
        boss_attacks(&mut state, &mut events);
        assert_eq!(state.projectiles.len(), state.tuning.boss.laser_count as usize);
        // Middle beam points at the player
        let mid = &state.projectiles[1];
        assert!(mid.vel.x < 0.0 && mid.vel.y.abs() < 1e-2);
    }

    #[test]
    fn test_nova_damages_in_radius_and_cools_down() {
        let mut state = GameState::new(3);
        let near = enemy_at(&mut state, Vec2::new(50.0, 0.0));
        let far = enemy_at(&mut state, Vec2::new(600.0, 0.0));
        let mut events = Vec::new();

        assert!(trigger_skill(&mut state, &mut events));
        assert!(state.enemies[near].hp < state.enemies[near].max_hp);
        assert_eq!(state.enemies[far].hp, state.enemies[far].max_hp);
        assert!(state.player.skill_cooldown > 0);
        assert!(!trigger_skill(&mut state, &mut events));
    }
}
