//! Fixed timestep simulation tick
//!
//! Core game loop that advances simulation deterministically. The player never
//! moves on screen; intended movement scrolls every other entity instead.

use glam::Vec2;

use super::autopilot::autopilot_input;
use super::events::GameEvent;
use super::progression::{end_run, enter_level_up, evaluate_tier};
use super::state::{GamePhase, GameState, RunOutcome};
use super::{collision, spawner, weapons};
use crate::{direction, distance};

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickInput {
    /// Keyboard direction; wins over the joystick whenever non-zero
    pub keyboard: Vec2,
    /// Virtual joystick drag
    pub joystick: Vec2,
    /// Fire the active skill
    pub skill: bool,
    /// Pause toggle
    pub pause: bool,
    /// Idle/demo mode - the autopilot plays the game
    pub idle_mode: bool,
}

impl TickInput {
    /// Intended movement direction, unit length or zero
    pub fn direction(&self) -> Vec2 {
        let raw = if self.keyboard != Vec2::ZERO {
            self.keyboard
        } else {
            self.joystick
        };
        raw.normalize_or_zero()
    }
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) -> Vec<GameEvent> {
    let mut events = Vec::new();

    if state.phase.is_ended() {
        return events;
    }

    // Handle pause toggle
    if input.pause {
        match state.phase {
            GamePhase::Running => state.phase = GamePhase::Paused,
            GamePhase::Paused => state.phase = GamePhase::Running,
            _ => {}
        }
    }

    // Paused phases keep effects animating but never touch gameplay
    if state.phase != GamePhase::Running {
        advance_cosmetics(state, dt);
        return events;
    }

    let input = if input.idle_mode {
        autopilot_input(state)
    } else {
        input.clone()
    };

    // 1-2. Movement becomes a world scroll
    let scroll = -input.direction() * state.player.speed * dt;
    state.world_offset += scroll;

    // 3. Counters
    state.time_ticks += 1;
    let player = &mut state.player;
    player.invulnerable_ticks = player.invulnerable_ticks.saturating_sub(1);
    player.skill_cooldown = player.skill_cooldown.saturating_sub(1);
    player.frenzy_ticks = player.frenzy_ticks.saturating_sub(1);
    player.ticks_since_last_shot = player.ticks_since_last_shot.saturating_add(1);

    // 4. Tier
    evaluate_tier(state, &mut events);

    // 5-6. Weapons
    if input.skill {
        weapons::trigger_skill(state, &mut events);
    }
    weapons::fire(state, &mut events);
    weapons::drain_queue(state);

    // 7. Enemies seek the player; bosses run their patterns
    move_enemies(state, dt);
    weapons::boss_attacks(state, &mut events);

    // 8. Projectiles, pickups and chests
    weapons::steer_homing(state);
    for p in &mut state.projectiles {
        p.pos += p.vel * dt;
        p.duration = p.duration.saturating_sub(1);
    }
    advance_pickups(state, dt);
    for t in &mut state.treasures {
        t.life_ticks = t.life_ticks.saturating_sub(1);
    }

    // 9. Scroll
    state.translate_world(scroll);

    // 10-11. Spawn and resolve
    spawner::run(state, &mut events);
    collision::resolve(state, &mut events);
    if state.player.is_dead() {
        end_run(state, RunOutcome::GameOver, &mut events);
    }

    // 12-13. Lifecycle
    prune(state);
    advance_cosmetics(state, dt);

    if state.phase == GamePhase::Running && state.pending_level_ups > 0 {
        enter_level_up(state, &mut events);
    }

    events
}

/// Simple seek toward the player's fixed screen position
fn move_enemies(state: &mut GameState, dt: f32) {
    let target = state.player_pos();
    for e in state.enemies.iter_mut().filter(|e| e.is_alive()) {
        let step = (e.speed * dt).min(distance(e.pos, target));
        e.pos += direction(e.pos, target) * step;
    }
}

/// Idle drift, or a homing pull once inside the magnet radius
fn advance_pickups(state: &mut GameState, dt: f32) {
    let target = state.player_pos();
    let magnet = state.player.magnet_radius;
    let drops = &state.tuning.drops;

    for p in &mut state.pickups {
        p.ttl_ticks = p.ttl_ticks.saturating_sub(1);
        if !p.pulled && distance(p.pos, target) < magnet {
            p.pulled = true;
        }
        if p.pulled {
            let speed = (p.vel.length().max(drops.pull_min_speed) + drops.pull_accel * dt)
                .min(drops.pull_max_speed);
            p.vel = direction(p.pos, target) * speed;
        }
        p.pos += p.vel * dt;
    }
}

/// Drop dead, spent, collected and far-away entities
fn prune(state: &mut GameState) {
    let center = state.player_pos();
    let cull = state.cull_radius();
    let near = |pos: Vec2| distance(pos, center) <= cull;

    state
        .enemies
        .retain(|e| e.is_alive() && (e.is_boss() || near(e.pos)));
    state.projectiles.retain(|p| !p.is_spent() && near(p.pos));
    state
        .pickups
        .retain(|p| !p.collected && p.ttl_ticks > 0 && (p.pulled || near(p.pos)));
    state.crates.retain(|c| c.is_intact() && near(c.pos));
    state.treasures.retain(|t| !t.opened && t.life_ticks > 0);
}

/// Particles, floating numbers and shake; never read by gameplay
fn advance_cosmetics(state: &mut GameState, dt: f32) {
    for p in &mut state.particles {
        p.pos += p.vel * dt;
        p.vel *= 0.92;
        p.life = p.life.saturating_sub(1);
    }
    state.particles.retain(|p| p.life > 0);

    for t in &mut state.floating_texts {
        t.pos.y -= 40.0 * dt;
        t.life = t.life.saturating_sub(1);
    }
    state.floating_texts.retain(|t| t.life > 0);

    state.screen_shake *= 0.9;
    if state.screen_shake < 0.1 {
        state.screen_shake = 0.0;
    }
}
