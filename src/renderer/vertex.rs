//! Vertex types for 2D rendering

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

/// Screen-space vertex (pixels, y down) with a straight-alpha colour
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    pub const fn new(x: f32, y: f32, color: [f32; 4]) -> Self {
        Self {
            position: [x, y],
            color,
        }
    }

    #[inline]
    pub fn at(p: Vec2, color: [f32; 4]) -> Self {
        Self::new(p.x, p.y, color)
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// Neon palette
pub mod colors {
    use crate::sim::state::{EnemyKind, EnemyShot, ParticleKind, PickupKind, WeaponKind};

    pub const BACKGROUND: [f32; 4] = [0.02, 0.02, 0.06, 1.0];
    pub const GRID: [f32; 4] = [0.15, 0.1, 0.3, 0.35];

    pub const CRATE: [f32; 4] = [0.75, 0.5, 0.2, 1.0];
    pub const TREASURE: [f32; 4] = [1.0, 0.85, 0.2, 1.0];
    pub const TREASURE_GLOW: [f32; 4] = [1.0, 0.85, 0.2, 0.35];

    pub const HP_BAR: [f32; 4] = [0.95, 0.2, 0.35, 1.0];
    pub const XP_BAR: [f32; 4] = [0.3, 0.6, 1.0, 1.0];
    pub const BOSS_BAR: [f32; 4] = [0.85, 0.1, 0.9, 1.0];
    pub const BAR_BACK: [f32; 4] = [0.1, 0.1, 0.15, 0.8];
    pub const TEXT: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
    pub const CRIT_TEXT: [f32; 4] = [1.0, 0.8, 0.1, 1.0];
    pub const OVERLAY: [f32; 4] = [0.0, 0.0, 0.0, 0.55];

    /// Player body by tier, cycling once the palette runs out
    const PLAYER_TIERS: [[f32; 4]; 5] = [
        [0.2, 0.95, 0.9, 1.0],
        [0.3, 1.0, 0.5, 1.0],
        [0.95, 0.95, 0.3, 1.0],
        [1.0, 0.55, 0.2, 1.0],
        [1.0, 0.3, 0.8, 1.0],
    ];

    pub fn player(tier: u32) -> [f32; 4] {
        PLAYER_TIERS[tier as usize % PLAYER_TIERS.len()]
    }

    pub fn enemy(kind: EnemyKind, final_boss: bool) -> [f32; 4] {
        match kind {
            EnemyKind::Basic => [1.0, 0.25, 0.35, 1.0],
            EnemyKind::Fast => [1.0, 0.6, 0.1, 1.0],
            EnemyKind::Tank => [0.6, 0.3, 1.0, 1.0],
            EnemyKind::Boss if final_boss => [1.0, 0.1, 0.1, 1.0],
            EnemyKind::Boss => [0.85, 0.1, 0.9, 1.0],
        }
    }

    pub fn weapon(weapon: WeaponKind) -> [f32; 4] {
        match weapon {
            WeaponKind::Blaster => [0.4, 1.0, 1.0, 1.0],
            WeaponKind::Scatter => [1.0, 1.0, 0.5, 1.0],
            WeaponKind::Missile => [1.0, 0.5, 0.3, 1.0],
            WeaponKind::Laser => [0.6, 0.9, 1.0, 0.9],
        }
    }

    pub fn enemy_shot(shot: EnemyShot) -> [f32; 4] {
        match shot {
            EnemyShot::Orb => [1.0, 0.3, 0.9, 1.0],
            EnemyShot::Laser => [1.0, 0.15, 0.2, 0.85],
        }
    }

    pub fn pickup(kind: PickupKind) -> [f32; 4] {
        match kind {
            PickupKind::XpGem => [0.3, 0.7, 1.0, 1.0],
            PickupKind::Coin => [1.0, 0.85, 0.2, 1.0],
            PickupKind::Heal => [0.3, 1.0, 0.4, 1.0],
        }
    }

    pub fn particle(kind: ParticleKind) -> [f32; 4] {
        match kind {
            ParticleKind::Spark => [1.0, 0.9, 0.6, 1.0],
            ParticleKind::Burst => [1.0, 0.4, 0.3, 1.0],
            ParticleKind::Sparkle => [0.6, 0.9, 1.0, 1.0],
            ParticleKind::Shockwave => [0.7, 0.5, 1.0, 1.0],
        }
    }

    /// Same colour with its alpha scaled
    #[inline]
    pub fn faded(mut color: [f32; 4], alpha: f32) -> [f32; 4] {
        color[3] *= alpha.clamp(0.0, 1.0);
        color
    }
}
