//! Event-driven input recording
//!
//! Browser handlers only write into [`InputState`]; the frame loop takes a
//! [`TickInput`] snapshot once per frame. Nothing here touches game state.

use glam::Vec2;

use crate::sim::TickInput;

/// Drag distance that maps to full joystick deflection
pub const JOYSTICK_RADIUS: f32 = 60.0;

/// Logical keys the game listens to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    Skill,
    Pause,
}

impl Key {
    /// Map a DOM `KeyboardEvent.code`
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "ArrowUp" | "KeyW" => Some(Key::Up),
            "ArrowDown" | "KeyS" => Some(Key::Down),
            "ArrowLeft" | "KeyA" => Some(Key::Left),
            "ArrowRight" | "KeyD" => Some(Key::Right),
            "Space" | "KeyE" => Some(Key::Skill),
            "Escape" | "KeyP" => Some(Key::Pause),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct InputState {
    up: bool,
    down: bool,
    left: bool,
    right: bool,
    /// Where the current drag started, if a pointer is down
    drag_origin: Option<Vec2>,
    drag_current: Vec2,
    skill_requested: bool,
    pause_requested: bool,
    pub idle_mode: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a key press; repeats of one-shot keys are ignored
    pub fn key_down(&mut self, key: Key, repeat: bool) {
        match key {
            Key::Up => self.up = true,
            Key::Down => self.down = true,
            Key::Left => self.left = true,
            Key::Right => self.right = true,
            Key::Skill if !repeat => self.skill_requested = true,
            Key::Pause if !repeat => self.pause_requested = true,
            Key::Skill | Key::Pause => {}
        }
    }

    pub fn key_up(&mut self, key: Key) {
        match key {
            Key::Up => self.up = false,
            Key::Down => self.down = false,
            Key::Left => self.left = false,
            Key::Right => self.right = false,
            Key::Skill | Key::Pause => {}
        }
    }

    pub fn pointer_down(&mut self, pos: Vec2) {
        self.drag_origin = Some(pos);
        self.drag_current = pos;
    }

    pub fn pointer_move(&mut self, pos: Vec2) {
        if self.drag_origin.is_some() {
            self.drag_current = pos;
        }
    }

    pub fn pointer_up(&mut self) {
        self.drag_origin = None;
    }

    /// Drop held keys and drags, e.g. when the page loses focus
    pub fn release_all(&mut self) {
        let idle_mode = self.idle_mode;
        *self = Self {
            idle_mode,
            ..Self::default()
        };
    }

    /// Screen-space direction from held keys (y down)
    pub fn keyboard_direction(&self) -> Vec2 {
        let axis = |neg: bool, pos: bool| f32::from(u8::from(pos)) - f32::from(u8::from(neg));
        Vec2::new(axis(self.left, self.right), axis(self.up, self.down))
    }

    /// Joystick deflection, length at most 1
    pub fn joystick(&self) -> Vec2 {
        match self.drag_origin {
            Some(origin) => ((self.drag_current - origin) / JOYSTICK_RADIUS).clamp_length_max(1.0),
            None => Vec2::ZERO,
        }
    }

    /// Build this frame's tick input and clear the one-shot requests
    pub fn snapshot(&mut self) -> TickInput {
        let input = TickInput {
            keyboard: self.keyboard_direction(),
            joystick: self.joystick(),
            skill: self.skill_requested,
            pause: self.pause_requested,
            idle_mode: self.idle_mode,
        };
        self.skill_requested = false;
        self.pause_requested = false;
        input
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_codes() {
        assert_eq!(Key::from_code("KeyW"), Some(Key::Up));
        assert_eq!(Key::from_code("ArrowRight"), Some(Key::Right));
        assert_eq!(Key::from_code("Escape"), Some(Key::Pause));
        assert_eq!(Key::from_code("KeyQ"), None);
    }

    #[test]
    fn test_keyboard_direction_cancels_opposites() {
        let mut input = InputState::new();
        input.key_down(Key::Up, false);
        input.key_down(Key::Right, false);
        assert_eq!(input.keyboard_direction(), Vec2::new(1.0, -1.0));
        input.key_down(Key::Left, false);
        assert_eq!(input.keyboard_direction(), Vec2::new(0.0, -1.0));
        input.key_up(Key::Up);
        assert_eq!(input.keyboard_direction(), Vec2::ZERO);
    }

    #[test]
    fn test_joystick_drag_is_clamped() {
        let mut input = InputState::new();
        input.pointer_move(Vec2::new(500.0, 0.0));
        assert_eq!(input.joystick(), Vec2::ZERO);

        input.pointer_down(Vec2::new(100.0, 100.0));
        input.pointer_move(Vec2::new(130.0, 100.0));
        assert!((input.joystick() - Vec2::new(0.5, 0.0)).length() < 1e-6);
        input.pointer_move(Vec2::new(100.0, 400.0));
        assert!((input.joystick().length() - 1.0).abs() < 1e-5);

        input.pointer_up();
        assert_eq!(input.joystick(), Vec2::ZERO);
    }

    #[test]
    fn test_snapshot_clears_one_shots() {
        let mut input = InputState::new();
        input.key_down(Key::Pause, false);
        input.key_down(Key::Skill, false);
        input.key_down(Key::Down, false);

        let first = input.snapshot();
        assert!(first.pause && first.skill);
        assert_eq!(first.keyboard, Vec2::new(0.0, 1.0));

        let second = input.snapshot();
        assert!(!second.pause && !second.skill);
        assert_eq!(second.keyboard, Vec2::new(0.0, 1.0));

        input.key_down(Key::Pause, true);
        assert!(!input.snapshot().pause);
    }

    #[test]
    fn test_release_all_keeps_idle_mode() {
        let mut input = InputState::new();
        input.idle_mode = true;
        input.key_down(Key::Left, false);
        input.pointer_down(Vec2::ZERO);
        input.release_all();
        let snap = input.snapshot();
        assert_eq!(snap.direction(), Vec2::ZERO);
        assert!(snap.idle_mode);
    }
}
