//! Demo/idle-mode player
//!
//! Produces the same `TickInput` a human would, so idle runs stay deterministic.

use glam::Vec2;

use super::state::{GameState, StatKind, UpgradeKind};
use super::tick::TickInput;
use crate::{direction, distance, polar_to_cartesian};

/// Enemies closer than this (plus their radius) push the autopilot away
const THREAT_RANGE: f32 = 160.0;
/// Gems and chests farther than this are ignored
const LOOT_RANGE: f32 = 400.0;
/// Crowd size that triggers the skill
const CROWD: usize = 4;

/// Steer away from threats, then toward loot, otherwise wander
pub fn autopilot_input(state: &GameState) -> TickInput {
    let me = state.player_pos();

    let mut push = Vec2::ZERO;
    for e in state.enemies.iter().filter(|e| e.is_alive()) {
        let reach = THREAT_RANGE + e.radius;
        let d = distance(me, e.pos);
        if d < reach {
            let weight = if e.is_boss() { 2.0 } else { 1.0 };
            push += direction(e.pos, me) * (1.0 - d / reach) * weight;
        }
    }
    for p in state.projectiles.iter().filter(|p| !p.is_player_owned()) {
        let d = distance(me, p.pos);
        if d < THREAT_RANGE / 2.0 {
            push += direction(p.pos, me) * (1.0 - d / (THREAT_RANGE / 2.0));
        }
    }

    let loot = state
        .treasures
        .iter()
        .map(|t| t.pos)
        .chain(state.pickups.iter().filter(|p| !p.pulled).map(|p| p.pos))
        .filter(|&pos| distance(me, pos) < LOOT_RANGE)
        .min_by(|a, b| distance(me, *a).total_cmp(&distance(me, *b)));

    let steer = if push.length() > 0.05 {
        push
    } else if let Some(pos) = loot {
        direction(me, pos)
    } else {
        // Slow circle so the world keeps scrolling
        polar_to_cartesian(1.0, state.time_ticks as f32 * 0.004)
    };

    let crowd = state
        .enemies
        .iter()
        .filter(|e| e.is_alive() && distance(me, e.pos) < state.tuning.player.nova_radius)
        .count();

    TickInput {
        joystick: steer.normalize_or_zero(),
        skill: crowd >= CROWD && state.player.skill_cooldown == 0,
        ..Default::default()
    }
}

/// Pick an offer while paused for a choice: equipped weapons first, then
/// vitality when hurt, otherwise the first option
pub fn autopilot_choice(state: &GameState) -> Option<usize> {
    if !state.phase.awaiting_choice() || state.offers.is_empty() {
        return None;
    }
    let player = &state.player;
    let equipped = state
        .offers
        .iter()
        .position(|o| matches!(o, UpgradeKind::Weapon(w) if player.is_equipped(*w)));
    let vitality = state.offers.iter().position(|o| {
        matches!(o, UpgradeKind::Stat(StatKind::Vitality)) && player.hp < player.max_hp / 2.0
    });
    Some(equipped.or(vitality).unwrap_or(0))
}
