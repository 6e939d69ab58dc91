//! Render pass: state snapshot to depth-ordered draw commands
//!
//! The pass only reads the state. Colours are derived here from the entity
//! enums, so gameplay data never carries presentation.

use glam::Vec2;

use super::shapes;
use super::vertex::{Vertex, colors};
use crate::Settings;
use crate::polar_to_cartesian;
use crate::sim::state::{
    EnemyShot, FLOATING_TEXT_TICKS, GamePhase, GameState, ParticleKind, ProjectileOwner, RunOutcome,
    WeaponKind,
};

/// Draw order, back to front
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DepthLayer {
    Background,
    Pickups,
    Hazards,
    Enemies,
    EnemyShots,
    Player,
    PlayerShots,
    Particles,
    Text,
    Hud,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Circle { center: Vec2, radius: f32 },
    Ring { center: Vec2, inner: f32, outer: f32 },
    Rect { min: Vec2, max: Vec2 },
    Line { from: Vec2, to: Vec2, width: f32 },
    Text { pos: Vec2, text: String, size: f32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawCommand {
    pub layer: DepthLayer,
    pub color: [f32; 4],
    pub shape: Shape,
}

/// Something that can replay draw commands
pub trait Surface {
    fn clear(&mut self, color: [f32; 4]);
    fn draw(&mut self, command: &DrawCommand);
}

/// Grid cell size of the scrolling background
const GRID_SPACING: f32 = 64.0;
const BAR_HEIGHT: f32 = 8.0;
const HUD_MARGIN: f32 = 12.0;
const LASER_LENGTH: f32 = 48.0;

/// Collects commands with a fixed world offset (screen shake)
struct DrawList {
    commands: Vec<DrawCommand>,
    shake: Vec2,
}

impl DrawList {
    fn push(&mut self, layer: DepthLayer, color: [f32; 4], shape: Shape) {
        self.commands.push(DrawCommand { layer, color, shape });
    }

    fn circle(&mut self, layer: DepthLayer, center: Vec2, radius: f32, color: [f32; 4]) {
        let center = center + self.shake;
        self.push(layer, color, Shape::Circle { center, radius });
    }

    fn ring(&mut self, layer: DepthLayer, center: Vec2, inner: f32, outer: f32, color: [f32; 4]) {
        let center = center + self.shake;
        self.push(layer, color, Shape::Ring { center, inner, outer });
    }

    fn line(&mut self, layer: DepthLayer, from: Vec2, to: Vec2, width: f32, color: [f32; 4]) {
        let (from, to) = (from + self.shake, to + self.shake);
        self.push(layer, color, Shape::Line { from, to, width });
    }

    fn rect(&mut self, layer: DepthLayer, min: Vec2, max: Vec2, color: [f32; 4]) {
        let (min, max) = (min + self.shake, max + self.shake);
        self.push(layer, color, Shape::Rect { min, max });
    }

    /// Unshaken bar with a backing track
    fn bar(&mut self, min: Vec2, width: f32, fraction: f32, color: [f32; 4]) {
        let max = min + Vec2::new(width, BAR_HEIGHT);
        self.push(DepthLayer::Hud, colors::BAR_BACK, Shape::Rect { min, max });
        let filled = Vec2::new(min.x + width * fraction.clamp(0.0, 1.0), max.y);
        self.push(DepthLayer::Hud, color, Shape::Rect { min, max: filled });
    }

    fn hud_text(&mut self, pos: Vec2, text: String, size: f32) {
        self.push(DepthLayer::Hud, colors::TEXT, Shape::Text { pos, text, size });
    }
}

/// Build the frame's draw list, stably sorted by depth layer
pub fn build_draw_list(state: &GameState, settings: &Settings) -> Vec<DrawCommand> {
    let shake = if settings.effective_screen_shake() && state.screen_shake > 0.0 {
        polar_to_cartesian(state.screen_shake, state.time_ticks as f32 * 2.4)
    } else {
        Vec2::ZERO
    };
    let mut list = DrawList {
        commands: Vec::new(),
        shake,
    };

    background(&mut list, state);
    world(&mut list, state);
    if settings.particles {
        particles(&mut list, state);
    }
    if settings.damage_numbers {
        for t in &state.floating_texts {
            let color = if t.crit { colors::CRIT_TEXT } else { colors::TEXT };
            let alpha = t.life as f32 / FLOATING_TEXT_TICKS as f32;
            let size = if t.crit { 18.0 } else { 13.0 };
            list.push(
                DepthLayer::Text,
                colors::faded(color, alpha),
                Shape::Text {
                    pos: t.pos + shake,
                    text: t.value.to_string(),
                    size,
                },
            );
        }
    }
    hud(&mut list, state);

    list.commands.sort_by_key(|c| c.layer);
    list.commands
}

/// Clear, then replay the frame onto `surface`
pub fn render(state: &GameState, settings: &Settings, surface: &mut impl Surface) {
    surface.clear(colors::BACKGROUND);
    for command in build_draw_list(state, settings) {
        surface.draw(&command);
    }
}

fn background(list: &mut DrawList, state: &GameState) {
    let vp = state.viewport;
    let offset = state.world_offset.rem_euclid(Vec2::splat(GRID_SPACING));

    let mut x = offset.x - GRID_SPACING;
    while x <= vp.width + GRID_SPACING {
        let (from, to) = (Vec2::new(x, -GRID_SPACING), Vec2::new(x, vp.height + GRID_SPACING));
        list.line(DepthLayer::Background, from, to, 1.0, colors::GRID);
        x += GRID_SPACING;
    }
    let mut y = offset.y - GRID_SPACING;
    while y <= vp.height + GRID_SPACING {
        let (from, to) = (Vec2::new(-GRID_SPACING, y), Vec2::new(vp.width + GRID_SPACING, y));
        list.line(DepthLayer::Background, from, to, 1.0, colors::GRID);
        y += GRID_SPACING;
    }
}

fn world(list: &mut DrawList, state: &GameState) {
    for p in state.pickups.iter().filter(|p| !p.collected) {
        list.circle(DepthLayer::Pickups, p.pos, p.radius, colors::pickup(p.kind));
    }

    let crate_hp = state.tuning.spawn.crate_hp;
    for c in state.crates.iter().filter(|c| c.is_intact()) {
        let half = Vec2::splat(c.radius * 0.8);
        let color = colors::faded(colors::CRATE, 0.5 + 0.5 * c.hp / crate_hp);
        list.rect(DepthLayer::Hazards, c.pos - half, c.pos + half, color);
    }
    for t in state.treasures.iter().filter(|t| !t.opened) {
        let pulse = 1.0 + 0.15 * (t.life_ticks as f32 * 0.1).sin();
        list.circle(DepthLayer::Hazards, t.pos, t.radius * 1.4 * pulse, colors::TREASURE_GLOW);
        list.circle(DepthLayer::Hazards, t.pos, t.radius, colors::TREASURE);
    }

    for e in state.enemies.iter().filter(|e| e.is_alive()) {
        list.circle(DepthLayer::Enemies, e.pos, e.radius, colors::enemy(e.kind, e.final_boss));
        // Bosses get the HUD bar instead
        if !e.is_boss() && e.hp < e.max_hp {
            let min = e.pos + Vec2::new(-e.radius, -e.radius - 6.0);
            list.rect(DepthLayer::Enemies, min, min + Vec2::new(e.radius * 2.0, 3.0), colors::BAR_BACK);
            let filled = min + Vec2::new(e.radius * 2.0 * e.hp / e.max_hp, 3.0);
            list.rect(DepthLayer::Enemies, min, filled, colors::HP_BAR);
        }
    }

    for p in state.projectiles.iter().filter(|p| !p.is_spent()) {
        let (layer, color, beam) = match p.owner {
            ProjectileOwner::Player(weapon) => {
                (DepthLayer::PlayerShots, colors::weapon(weapon), weapon == WeaponKind::Laser)
            }
            ProjectileOwner::Enemy(shot) => (
                DepthLayer::EnemyShots,
                colors::enemy_shot(shot),
                shot == EnemyShot::Laser,
            ),
        };
        if beam {
            let tail = p.pos - p.vel.normalize_or_zero() * LASER_LENGTH;
            list.line(layer, tail, p.pos, p.radius * 2.0, color);
        } else {
            list.circle(layer, p.pos, p.radius, color);
        }
    }

    let player = &state.player;
    let blink = player.invulnerable_ticks > 0 && (player.invulnerable_ticks / 4) % 2 == 1;
    let alpha = if blink { 0.4 } else { 1.0 };
    if player.frenzy_ticks > 0 {
        let outer = player.radius + 6.0;
        list.ring(DepthLayer::Player, player.pos, player.radius + 3.0, outer, colors::faded(colors::CRIT_TEXT, 0.6));
    }
    list.circle(DepthLayer::Player, player.pos, player.radius, colors::faded(colors::player(player.tier), alpha));
}

fn particles(list: &mut DrawList, state: &GameState) {
    for p in &state.particles {
        let life = p.life as f32 / p.max_life.max(1) as f32;
        let color = colors::faded(colors::particle(p.kind), life);
        match p.kind {
            ParticleKind::Shockwave => {
                let radius = p.size * (1.0 + (1.0 - life) * 8.0);
                list.ring(DepthLayer::Particles, p.pos, radius * 0.8, radius, color);
            }
            _ => list.circle(DepthLayer::Particles, p.pos, p.size, color),
        }
    }
}

fn hud(list: &mut DrawList, state: &GameState) {
    let vp = state.viewport;
    let player = &state.player;
    let width = (vp.width - HUD_MARGIN * 2.0).max(0.0);

    let xp = player.xp as f32 / player.next_level_xp.max(1) as f32;
    list.bar(Vec2::new(HUD_MARGIN, HUD_MARGIN), width, xp, colors::XP_BAR);
    let hp = player.display_hp() / player.max_hp;
    list.bar(Vec2::new(HUD_MARGIN, HUD_MARGIN * 2.0 + BAR_HEIGHT), width / 3.0, hp, colors::HP_BAR);

    let text_y = HUD_MARGIN * 3.0 + BAR_HEIGHT * 2.0;
    list.hud_text(Vec2::new(HUD_MARGIN, text_y), format!("LV {}", player.level), 16.0);
    list.hud_text(Vec2::new(vp.width / 2.0, text_y), format!("{}", state.score), 16.0);
    let seconds = state.time_ticks / u64::from(crate::consts::TICKS_PER_SECOND);
    list.hud_text(
        Vec2::new(vp.width - HUD_MARGIN * 5.0, text_y),
        format!("{:02}:{:02}", seconds / 60, seconds % 60),
        16.0,
    );

    if let Some(boss) = state.enemies.iter().find(|e| e.is_boss() && e.is_alive()) {
        let min = Vec2::new(HUD_MARGIN, vp.height - HUD_MARGIN - BAR_HEIGHT);
        list.bar(min, width, boss.hp / boss.max_hp, colors::enemy(boss.kind, boss.final_boss));
    }

    let skill_color = if player.skill_cooldown == 0 { colors::TEXT } else { colors::BAR_BACK };
    let skill_pos = Vec2::new(vp.width - HUD_MARGIN * 3.0, vp.height - HUD_MARGIN * 5.0);
    list.push(DepthLayer::Hud, skill_color, Shape::Circle { center: skill_pos, radius: 14.0 });

    let banner = match state.phase {
        GamePhase::Running => None,
        GamePhase::Paused => Some("PAUSED"),
        GamePhase::LevelUpPaused => Some("LEVEL UP"),
        GamePhase::TreasurePaused => Some("TREASURE"),
        GamePhase::Ended(RunOutcome::Victory) => Some("VICTORY"),
        GamePhase::Ended(RunOutcome::GameOver) => Some("GAME OVER"),
    };
    if let Some(banner) = banner {
        let full = Vec2::new(vp.width, vp.height);
        list.push(DepthLayer::Hud, colors::OVERLAY, Shape::Rect { min: Vec2::ZERO, max: full });
        list.hud_text(vp.center() - Vec2::new(0.0, 40.0), banner.to_owned(), 32.0);
        for (i, offer) in state.offers.iter().enumerate() {
            let pos = vp.center() + Vec2::new(0.0, i as f32 * 26.0);
            list.hud_text(pos, format!("{}. {}", i + 1, offer.name()), 18.0);
        }
    }
}

/// Tessellates commands into one triangle list for the GPU pipeline
///
/// Text is not tessellated; the browser build draws HUD text in the page.
#[derive(Debug, Default)]
pub struct VertexSurface {
    pub clear_color: [f32; 4],
    pub vertices: Vec<Vertex>,
}

impl VertexSurface {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Surface for VertexSurface {
    fn clear(&mut self, color: [f32; 4]) {
        self.clear_color = color;
        self.vertices.clear();
    }

    fn draw(&mut self, command: &DrawCommand) {
        let out = &mut self.vertices;
        match command.shape {
            Shape::Circle { center, radius } => shapes::circle(out, center, radius, command.color),
            Shape::Ring { center, inner, outer } => shapes::ring(out, center, inner, outer, command.color),
            Shape::Rect { min, max } => shapes::rect(out, min, max, command.color),
            Shape::Line { from, to, width } => shapes::line(out, from, to, width, command.color),
            Shape::Text { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::spawner::spawn_enemy;
    use crate::sim::state::{EnemyKind, PickupKind, ShotSpec};

    fn busy_state() -> GameState {
        let mut state = GameState::new(4);
        spawn_enemy(&mut state, EnemyKind::Basic);
        let pos = state.player.pos + Vec2::new(30.0, 0.0);
        state.spawn_pickup(PickupKind::XpGem, pos, 1);
        state.spawn_particles(pos, 5, ParticleKind::Spark);
        state.spawn_floating_text(pos, 12.0, true);
        let spec = ShotSpec {
            owner: ProjectileOwner::Player(WeaponKind::Blaster),
            dir: Vec2::X,
            speed: 400.0,
            radius: 4.0,
            damage: 10.0,
            duration: 60,
            penetration: 1,
            homing: false,
        };
        state.spawn_projectile(&spec, pos);
        state
    }

    #[test]
    fn test_draw_list_is_depth_ordered() {
        let list = build_draw_list(&busy_state(), &Settings::default());
        assert!(list.windows(2).all(|w| w[0].layer <= w[1].layer));
        for layer in [
            DepthLayer::Background,
            DepthLayer::Pickups,
            DepthLayer::Enemies,
            DepthLayer::Player,
            DepthLayer::PlayerShots,
            DepthLayer::Particles,
            DepthLayer::Text,
            DepthLayer::Hud,
        ] {
            assert!(list.iter().any(|c| c.layer == layer), "missing {layer:?}");
        }
    }

    #[test]
    fn test_settings_suppress_effects() {
        let settings = Settings {
            particles: false,
            damage_numbers: false,
            ..Settings::default()
        };
        let list = build_draw_list(&busy_state(), &settings);
        assert!(!list.iter().any(|c| matches!(c.layer, DepthLayer::Particles | DepthLayer::Text)));
    }

    #[test]
    fn test_reduced_motion_disables_shake() {
        let mut state = busy_state();
        state.screen_shake = 10.0;
        let player_circle = |settings: &Settings| {
            build_draw_list(&state, settings)
                .into_iter()
                .find(|c| c.layer == DepthLayer::Player)
                .map(|c| c.shape)
        };
        let calm = Settings {
            reduced_motion: true,
            ..Settings::default()
        };
        assert_eq!(
            player_circle(&calm),
            Some(Shape::Circle {
                center: state.player.pos,
                radius: state.player.radius
            })
        );
        assert_ne!(player_circle(&Settings::default()), player_circle(&calm));
    }

    #[test]
    fn test_render_is_read_only_and_fills_vertices() {
        let state = busy_state();
        let before = serde_json::to_string(&state).unwrap();
        let mut surface = VertexSurface::new();
        render(&state, &Settings::default(), &mut surface);
        assert_eq!(serde_json::to_string(&state).unwrap(), before);
        assert_eq!(surface.clear_color, colors::BACKGROUND);
        assert!(!surface.vertices.is_empty());
        assert_eq!(surface.vertices.len() % 3, 0);
    }

    #[test]
    fn test_choice_overlay_lists_offers() {
        let mut state = GameState::new(1);
        state.phase = GamePhase::LevelUpPaused;
        state.offers = vec![crate::sim::UpgradeKind::Weapon(WeaponKind::Laser)];
        let list = build_draw_list(&state, &Settings::default());
        let texts: Vec<_> = list
            .iter()
            .filter_map(|c| match &c.shape {
                Shape::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert!(texts.contains(&"LEVEL UP"));
        assert!(texts.iter().any(|t| t.starts_with("1. ")));
    }
}
