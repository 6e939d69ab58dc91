//! Experience, tiers and the upgrade state machine
//!
//! `Running -> LevelUpPaused -> Running` on each xp threshold crossing,
//! `Running -> TreasurePaused -> Running` on treasure contact. Level-ups earned
//! while a choice is on screen queue up and are offered one after another.

use rand::Rng;
use thiserror::Error;

use super::events::GameEvent;
use super::state::{
    EVOLVED_LEVEL, GamePhase, GameState, RunOutcome, StatKind, UpgradeKind, WeaponKind,
};
use crate::audio::SoundEffect;

/// Rejected upgrade selection
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChoiceError {
    #[error("no upgrade choice is pending")]
    NotChoosing,
    #[error("upgrade index {index} out of range ({available} offered)")]
    OutOfRange { index: usize, available: usize },
}

/// Add xp and count the thresholds crossed; each crossing queues a level-up
pub fn gain_xp(state: &mut GameState, amount: u32, events: &mut Vec<GameEvent>) -> u32 {
    let growth = state.tuning.progression.xp_growth;
    let flat = state.tuning.progression.xp_flat;
    let player = &mut state.player;
    player.xp = player.xp.saturating_add(amount);

    let mut crossed = 0;
    while player.xp >= player.next_level_xp {
        player.xp -= player.next_level_xp;
        player.level += 1;
        player.next_level_xp = ((player.next_level_xp as f32 * growth) as u32 + flat).max(1);
        crossed += 1;
        events.push(GameEvent::LevelUp { level: player.level });
        log::info!("Level {} reached", player.level);
    }
    if crossed > 0 {
        state.pending_level_ups += crossed;
        events.push(GameEvent::Sound(SoundEffect::LevelUp));
    }
    crossed
}

/// Whether an upgrade path has nothing left to give
pub fn is_maxed(state: &GameState, upgrade: UpgradeKind) -> bool {
    match upgrade {
        UpgradeKind::Weapon(w) => state.player.weapon_level(w) >= EVOLVED_LEVEL,
        UpgradeKind::Stat(s) => state.player.stat_level(s) >= state.tuning.progression.max_stat_level,
    }
}

/// Offer weight: the current loadout first, passive stats next, new weapons last
fn offer_weight(state: &GameState, upgrade: UpgradeKind) -> u32 {
    match upgrade {
        UpgradeKind::Weapon(w) if state.player.is_equipped(w) => 3,
        UpgradeKind::Stat(_) => 2,
        UpgradeKind::Weapon(_) => 1,
    }
}

/// Weighted sample without replacement from the not-yet-maxed upgrades.
/// Returns fewer than `count` when fewer remain, and nothing when all are maxed.
pub fn roll_offers(state: &mut GameState, count: usize) -> Vec<UpgradeKind> {
    let mut pool: Vec<(UpgradeKind, u32)> = WeaponKind::ALL
        .into_iter()
        .map(UpgradeKind::Weapon)
        .chain(StatKind::ALL.into_iter().map(UpgradeKind::Stat))
        .filter(|u| !is_maxed(state, *u))
        .map(|u| (u, offer_weight(state, u)))
        .collect();

    let mut offers = Vec::with_capacity(count.min(pool.len()));
    while offers.len() < count && !pool.is_empty() {
        let total: u32 = pool.iter().map(|(_, w)| w).sum();
        let mut roll = state.rng.random_range(0..total);
        let idx = pool
            .iter()
            .position(|&(_, w)| {
                if roll < w {
                    true
                } else {
                    roll -= w;
                    false
                }
            })
            .unwrap_or(pool.len() - 1);
        offers.push(pool.remove(idx).0);
    }
    offers
}

/// Grant the fallback heal instead of an empty choice screen
fn exhausted(state: &mut GameState, events: &mut Vec<GameEvent>) {
    let heal = state.tuning.progression.fallback_heal;
    state.player.heal(heal);
    state.offers.clear();
    state.phase = GamePhase::Running;
    events.push(GameEvent::UpgradesExhausted);
    log::info!("All upgrades maxed; granted {heal:.0} hp instead");
}

/// Freeze the step and present the next queued level-up
pub fn enter_level_up(state: &mut GameState, events: &mut Vec<GameEvent>) {
    if state.pending_level_ups == 0 {
        return;
    }
    let count = state.tuning.progression.level_up_offers;
    let offers = roll_offers(state, count);
    if offers.is_empty() {
        state.pending_level_ups = 0;
        exhausted(state, events);
        return;
    }
    state.offers = offers;
    state.phase = GamePhase::LevelUpPaused;
}

/// Freeze the step and present the larger treasure batch
pub fn enter_treasure(state: &mut GameState, events: &mut Vec<GameEvent>) {
    let count = state.tuning.progression.treasure_offers;
    let offers = roll_offers(state, count);
    if offers.is_empty() {
        exhausted(state, events);
        return;
    }
    state.offers = offers;
    state.phase = GamePhase::TreasurePaused;
    events.push(GameEvent::TreasureOpened);
    events.push(GameEvent::Sound(SoundEffect::Treasure));
    log::info!("Treasure opened with {} offers", state.offers.len());
}

/// Apply the offer at `index` and leave the paused phase
pub fn choose_upgrade(
    state: &mut GameState,
    index: usize,
    events: &mut Vec<GameEvent>,
) -> Result<UpgradeKind, ChoiceError> {
    if !state.phase.awaiting_choice() {
        return Err(ChoiceError::NotChoosing);
    }
    let upgrade = *state.offers.get(index).ok_or(ChoiceError::OutOfRange {
        index,
        available: state.offers.len(),
    })?;

    apply_upgrade(state, upgrade);
    if state.phase == GamePhase::LevelUpPaused {
        state.pending_level_ups = state.pending_level_ups.saturating_sub(1);
    }
    state.offers.clear();
    state.phase = GamePhase::Running;
    enter_level_up(state, events);
    Ok(upgrade)
}

/// Increment the upgrade's level and mutate the matching player stat
pub fn apply_upgrade(state: &mut GameState, upgrade: UpgradeKind) {
    let prog = &state.tuning.progression;
    let player = &mut state.player;
    match upgrade {
        UpgradeKind::Weapon(w) => {
            let level = &mut player.weapon_levels[w.index()];
            *level = (*level + 1).min(EVOLVED_LEVEL);
            if *level == EVOLVED_LEVEL {
                log::info!("{} evolved", w.name());
            }
        }
        UpgradeKind::Stat(s) => {
            let level = &mut player.stat_levels[s.index()];
            if *level >= prog.max_stat_level {
                return;
            }
            *level += 1;
            match s {
                StatKind::Might => player.damage_multiplier *= prog.might_factor,
                StatKind::Haste => player.attack_speed_multiplier *= prog.haste_factor,
                StatKind::Precision => {
                    player.crit_chance = (player.crit_chance + prog.precision_step).min(1.0)
                }
                StatKind::Vitality => {
                    player.max_hp += prog.vitality_step;
                    player.heal(prog.vitality_step);
                }
                StatKind::Swiftness => player.speed *= prog.swiftness_factor,
                StatKind::Magnet => player.magnet_radius += prog.magnet_step,
                StatKind::Evasion => {
                    player.dodge_chance = (player.dodge_chance + prog.evasion_step).min(1.0)
                }
            }
        }
    }
}

/// Terminal transition; later calls are ignored
pub fn end_run(state: &mut GameState, outcome: RunOutcome, events: &mut Vec<GameEvent>) {
    if state.phase.is_ended() {
        return;
    }
    state.phase = GamePhase::Ended(outcome);
    state.offers.clear();
    events.push(GameEvent::Sound(match outcome {
        RunOutcome::GameOver => SoundEffect::GameOver,
        RunOutcome::Victory => SoundEffect::Victory,
    }));
    events.push(GameEvent::RunEnded {
        outcome,
        score: state.score,
        level: state.player.level,
    });
    log::info!(
        "Run ended: {outcome:?} at tick {} (score {}, level {}, kills {})",
        state.time_ticks,
        state.score,
        state.player.level,
        state.kills
    );
}

/// Tier from run coins against the ascending thresholds
pub fn tier_for(state: &GameState) -> u32 {
    let thresholds = &state.tuning.progression.tier_thresholds;
    thresholds
        .iter()
        .take_while(|&&t| t <= state.run_coins)
        .count()
        .saturating_sub(1) as u32
}

/// Re-evaluate the tier; on change grow the player and its bursts
pub fn evaluate_tier(state: &mut GameState, events: &mut Vec<GameEvent>) {
    let tier = tier_for(state);
    if tier == state.player.tier {
        return;
    }
    let base = state.tuning.player.radius;
    let growth = state.tuning.progression.tier_radius_growth;
    let player = &mut state.player;
    player.tier = tier;
    player.radius = base + growth * tier as f32;
    player.burst_bonus = tier / 2;
    events.push(GameEvent::TierChanged { tier });
    log::info!("Tier {tier} reached with {} coins", state.run_coins);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn max_everything(state: &mut GameState) {
        state.player.weapon_levels = [EVOLVED_LEVEL; 4];
        state.player.stat_levels = [state.tuning.progression.max_stat_level; 7];
    }

    #[test]
    fn test_gain_xp_exact_threshold_levels_up() {
        let mut state = GameState::new(1);
        let mut events = Vec::new();
        let need = state.player.next_level_xp;
        assert_eq!(gain_xp(&mut state, need, &mut events), 1);
        assert_eq!(state.player.level, 2);
        assert_eq!(state.player.xp, 0);
        assert_eq!(state.pending_level_ups, 1);
        assert!(state.player.next_level_xp > need);
        assert!(events.contains(&GameEvent::LevelUp { level: 2 }));
    }

    #[test]
    fn test_gain_xp_counts_multiple_crossings() {
        let mut state = GameState::new(1);
        let mut events = Vec::new();
        assert_eq!(gain_xp(&mut state, 1000, &mut events), state.player.level - 1);
        assert!(state.pending_level_ups >= 3);
        assert!(state.player.xp < state.player.next_level_xp);
    }

    #[test]
    fn test_offers_are_distinct_and_not_maxed() {
        let mut state = GameState::new(4);
        state.player.weapon_levels[WeaponKind::Laser.index()] = EVOLVED_LEVEL;
        state.player.stat_levels[StatKind::Might.index()] = state.tuning.progression.max_stat_level;
        for _ in 0..100 {
            let offers = roll_offers(&mut state, 3);
            assert_eq!(offers.len(), 3);
            for (i, o) in offers.iter().enumerate() {
                assert!(!is_maxed(&state, *o));
                assert!(!offers[i + 1..].contains(o));
            }
        }
    }

    #[test]
    fn test_offers_shrink_when_few_remain() {
        let mut state = GameState::new(4);
        max_everything(&mut state);
        state.player.stat_levels[StatKind::Haste.index()] = 0;
        assert_eq!(roll_offers(&mut state, 5), vec![UpgradeKind::Stat(StatKind::Haste)]);

        state.player.stat_levels[StatKind::Haste.index()] = state.tuning.progression.max_stat_level;
        assert!(roll_offers(&mut state, 5).is_empty());
    }

    #[test]
    fn test_equipped_weapon_is_favoured() {
        let mut state = GameState::new(11);
        let mut primary = 0;
        let mut other = 0;
        for _ in 0..2000 {
            match roll_offers(&mut state, 1)[0] {
                UpgradeKind::Weapon(WeaponKind::Blaster) => primary += 1,
                UpgradeKind::Weapon(_) => other += 1,
                UpgradeKind::Stat(_) => {}
            }
        }
        // Weight 3 against three unequipped weapons at weight 1 each
        assert!(primary > other / 2, "primary {primary} vs others {other}");
    }

    #[test]
    fn test_empty_offer_falls_back_to_heal() {
        let mut state = GameState::new(4);
        max_everything(&mut state);
        state.player.hp = 50.0;
        state.pending_level_ups = 2;
        let mut events = Vec::new();
        enter_level_up(&mut state, &mut events);
        assert_eq!(state.phase, GamePhase::Running);
        assert_eq!(state.pending_level_ups, 0);
        assert_eq!(state.player.hp, 70.0);
        assert!(events.contains(&GameEvent::UpgradesExhausted));

        events.clear();
        enter_treasure(&mut state, &mut events);
        assert_eq!(state.phase, GamePhase::Running);
        assert!(events.contains(&GameEvent::UpgradesExhausted));
    }

    #[test]
    fn test_choose_upgrade_applies_and_resumes() {
        let mut state = GameState::new(5);
        let mut events = Vec::new();
        state.pending_level_ups = 1;
        enter_level_up(&mut state, &mut events);
        assert_eq!(state.phase, GamePhase::LevelUpPaused);
        state.offers = vec![UpgradeKind::Stat(StatKind::Magnet)];
        let before = state.player.magnet_radius;

        let chosen = choose_upgrade(&mut state, 0, &mut events).expect("valid choice");
        assert_eq!(chosen, UpgradeKind::Stat(StatKind::Magnet));
        assert_eq!(state.player.magnet_radius, before + state.tuning.progression.magnet_step);
        assert_eq!(state.phase, GamePhase::Running);
        assert!(state.offers.is_empty());
    }

    #[test]
    fn test_queued_level_ups_follow_each_other() {
        let mut state = GameState::new(5);
        let mut events = Vec::new();
        state.pending_level_ups = 2;
        enter_level_up(&mut state, &mut events);
        choose_upgrade(&mut state, 0, &mut events).expect("first");
        assert_eq!(state.phase, GamePhase::LevelUpPaused);
        choose_upgrade(&mut state, 0, &mut events).expect("second");
        assert_eq!(state.phase, GamePhase::Running);
    }

    #[test]
    fn test_treasure_choice_then_queued_level_up() {
        let mut state = GameState::new(5);
        let mut events = Vec::new();
        enter_treasure(&mut state, &mut events);
        assert_eq!(state.phase, GamePhase::TreasurePaused);
        assert_eq!(state.offers.len(), state.tuning.progression.treasure_offers);
        state.pending_level_ups = 1;
        choose_upgrade(&mut state, 4, &mut events).expect("valid");
        assert_eq!(state.phase, GamePhase::LevelUpPaused);
        assert_eq!(state.pending_level_ups, 1);
    }

    #[test]
    fn test_choice_errors() {
        let mut state = GameState::new(5);
        let mut events = Vec::new();
        assert_eq!(choose_upgrade(&mut state, 0, &mut events), Err(ChoiceError::NotChoosing));
        state.pending_level_ups = 1;
        enter_level_up(&mut state, &mut events);
        assert_eq!(
            choose_upgrade(&mut state, 9, &mut events),
            Err(ChoiceError::OutOfRange { index: 9, available: 3 })
        );
        assert_eq!(state.phase, GamePhase::LevelUpPaused);
    }

    #[test]
    fn test_weapon_upgrade_caps_at_evolution() {
        let mut state = GameState::new(5);
        for _ in 0..10 {
            apply_upgrade(&mut state, UpgradeKind::Weapon(WeaponKind::Scatter));
        }
        assert_eq!(state.player.weapon_level(WeaponKind::Scatter), EVOLVED_LEVEL);
        assert!(is_maxed(&state, UpgradeKind::Weapon(WeaponKind::Scatter)));
    }

    #[test]
    fn test_end_run_is_terminal() {
        let mut state = GameState::new(5);
        state.score = 77;
        let mut events = Vec::new();
        end_run(&mut state, RunOutcome::Victory, &mut events);
        end_run(&mut state, RunOutcome::GameOver, &mut events);
        assert_eq!(state.phase, GamePhase::Ended(RunOutcome::Victory));
        let ended: Vec<_> = events
            .iter()
            .filter(|e| matches!(e, GameEvent::RunEnded { .. }))
            .collect();
        assert_eq!(
            ended,
            vec![&GameEvent::RunEnded {
                outcome: RunOutcome::Victory,
                score: 77,
                level: 1
            }]
        );
    }

    #[test]
    fn test_tier_follows_thresholds() {
        let mut state = GameState::new(5);
        let mut events = Vec::new();
        evaluate_tier(&mut state, &mut events);
        assert!(events.is_empty());

        state.run_coins = 100;
        evaluate_tier(&mut state, &mut events);
        assert_eq!(state.player.tier, 2);
        assert_eq!(state.player.burst_bonus, 1);
        assert!(state.player.radius > state.tuning.player.radius);
        assert_eq!(events, vec![GameEvent::TierChanged { tier: 2 }]);
    }
}
