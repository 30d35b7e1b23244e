//! Target pigs
//!
//! Both kinds share the damage state machine and differ only in life and
//! sprite scale. Each damage image is its own blink sequence.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::ScreenRect;
use super::anim::FrameAnimation;
use super::body::{BodyDesc, BodyShape, EntityId, PhysicsBinding};
use super::damage::Durability;
use crate::error::SimError;

/// Damage images (normal, hurt, badly hurt)
pub const PIG_IMAGE_COUNT: usize = 3;
/// Blink frames per damage image
pub const PIG_FRAME_COUNT: usize = 3;
pub const PIG_MASS: f32 = 5.0;
pub const PIG_ELASTICITY: f32 = 0.95;

/// Source sprite edge before scaling
const PIG_SPRITE_SIZE: f32 = 80.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PigKind {
    Normal,
    Big,
}

impl PigKind {
    pub fn from_name(name: &str) -> Result<Self, SimError> {
        match name {
            "normal_pig" => Ok(PigKind::Normal),
            "big_pig" => Ok(PigKind::Big),
            other => Err(SimError::UnknownPig(other.to_string())),
        }
    }

    pub fn life(&self) -> i32 {
        match self {
            PigKind::Normal => 12,
            PigKind::Big => 16,
        }
    }

    pub fn scale(&self) -> f32 {
        match self {
            PigKind::Normal => 0.4,
            PigKind::Big => 0.8,
        }
    }

    pub fn size(&self) -> Vec2 {
        Vec2::splat((PIG_SPRITE_SIZE * self.scale()).floor())
    }
}

#[derive(Debug, Clone)]
pub struct Pig {
    pub id: EntityId,
    pub kind: PigKind,
    pub durability: Durability,
    pub rect: ScreenRect,
    pub angle_deg: f32,
    pub anim: FrameAnimation,
    pub(crate) binding: Option<PhysicsBinding>,
}

impl Pig {
    pub fn new(id: EntityId, kind: PigKind, x: f32, bottom: f32, seed: u64) -> Self {
        Self {
            id,
            kind,
            durability: Durability::new(kind.life(), PIG_IMAGE_COUNT),
            rect: ScreenRect::from_left_bottom(x, bottom, kind.size()),
            angle_deg: 0.0,
            anim: FrameAnimation::new(PIG_FRAME_COUNT, seed ^ id.0 as u64),
            binding: None,
        }
    }

    pub fn radius(&self) -> f32 {
        (self.rect.size.x / 2.0).floor()
    }

    pub fn body_desc(&self) -> BodyDesc {
        BodyDesc::new(
            BodyShape::Ball {
                radius: self.radius(),
            },
            PIG_MASS,
            crate::to_world(self.rect.center()),
        )
        .with_elasticity(PIG_ELASTICITY)
    }

    pub fn life(&self) -> i32 {
        self.durability.life()
    }

    pub fn apply_damage(&mut self, amount: u32) {
        if self.durability.apply_damage(amount) {
            // New damage image starts its own blink sequence
            self.anim.restart(PIG_FRAME_COUNT, 0);
        }
        log::debug!(
            "pig {:?} life: {} damage: {}",
            self.id,
            self.durability.life(),
            amount
        );
    }

    pub fn place(&mut self, center: Vec2, angle_deg: f32) {
        self.rect = ScreenRect::from_center(center, self.rect.size);
        self.angle_deg = angle_deg;
    }

    /// Idle blinking
    pub fn animate(&mut self, now: u64) {
        let interval = self.anim.blink_interval();
        self.anim.advance(now, interval);
    }

    pub fn binding(&self) -> Option<PhysicsBinding> {
        self.binding
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_differ_in_life_and_scale() {
        let normal = Pig::new(EntityId(1), PigKind::Normal, 800.0, 550.0, 0);
        let big = Pig::new(EntityId(2), PigKind::Big, 900.0, 550.0, 0);
        assert_eq!(normal.life(), 12);
        assert_eq!(big.life(), 16);
        assert_eq!(normal.radius(), 16.0);
        assert_eq!(big.radius(), 32.0);
        assert_eq!(normal.rect.bottom(), 550.0);
    }

    #[test]
    fn unknown_pig_is_an_error() {
        assert!(matches!(
            PigKind::from_name("king_pig"),
            Err(SimError::UnknownPig(name)) if name == "king_pig"
        ));
    }

    #[test]
    fn damage_advances_hurt_image() {
        let mut pig = Pig::new(EntityId(1), PigKind::Normal, 0.0, 0.0, 0);
        pig.apply_damage(5);
        assert_eq!(pig.durability.image_index(), 1);
        assert_eq!(pig.life(), 7);
        pig.apply_damage(20);
        assert_eq!(pig.durability.image_index(), 2);
        assert!(pig.durability.is_destroyed());
    }
}
