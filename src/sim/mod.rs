//! Frame-driven simulation module
//!
//! All gameplay logic lives here:
//! - Rigid bodies come from rapier2d, wrapped by `body`
//! - Collision impulses are mapped to damage by `collision`
//! - Entities never touch the physics world directly; they return actions
//!   and the simulation applies them between passes
//! - No rendering or platform dependencies

pub mod anim;
pub mod bird;
pub mod block;
pub mod body;
pub mod collision;
pub mod damage;
pub mod egg;
pub mod explosion;
pub mod level;
pub mod map;
pub mod pig;
pub mod world;

pub use bird::{Bird, BirdAction, BirdEvent, BirdKind, Kinematics};
pub use block::{Block, BlockShape, BlockSpec, Direction, Material};
pub use body::{
    BodySnapshot, BodyTag, CollisionCategory, EntityId, IdSource, PhysicsBinding, PhysicsWorld,
};
pub use collision::{CollisionEffect, ContactReport, classify};
pub use damage::Durability;
pub use egg::Egg;
pub use explosion::{Blast, Explosions, Fragment};
pub use level::{ButtonKind, DrawItem, FrameInput, Level, LevelPhase, Sprite};
pub use map::{LevelMap, MapSource, StaticMaps};
pub use pig::{Pig, PigKind};
pub use world::{SimEvent, Simulation};

use glam::Vec2;

/// Axis-aligned sprite placement in screen space (y down)
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct ScreenRect {
    /// Top-left corner
    pub min: Vec2,
    pub size: Vec2,
}

impl ScreenRect {
    pub fn new(min: Vec2, size: Vec2) -> Self {
        Self { min, size }
    }

    /// Rect with its left edge at `x` and bottom edge at `bottom`
    pub fn from_left_bottom(x: f32, bottom: f32, size: Vec2) -> Self {
        Self::new(Vec2::new(x, bottom - size.y), size)
    }

    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        Self::new(center - size * 0.5, size)
    }

    pub fn center(&self) -> Vec2 {
        self.min + self.size * 0.5
    }

    pub fn bottom(&self) -> f32 {
        self.min.y + self.size.y
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x
            && p.y >= self.min.y
            && p.x <= self.min.x + self.size.x
            && p.y <= self.min.y + self.size.y
    }
}

/// Bounding size of a `size` sprite rotated by `angle` radians
pub fn rotated_extent(size: Vec2, angle: f32) -> Vec2 {
    let (sin, cos) = angle.sin_cos();
    Vec2::new(
        size.x * cos.abs() + size.y * sin.abs(),
        size.x * sin.abs() + size.y * cos.abs(),
    )
}

/// Lifecycle state shared by birds and eggs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum LifeState {
    /// Waiting in the queue (not simulated)
    #[default]
    Idle,
    /// In flight after launch
    Attacking,
    /// Detonator fuse burning (one-shot sprite swap)
    InitExploding,
    /// Explosion playing; fragments emitted once
    Exploding,
    /// Finished; removed from the simulation on the next prune
    Dead,
}
