//! Dropper payload
//!
//! An egg falls until it touches the ground, a block or a pig, then bursts
//! into a short explosion and dies once the blast frames have played.

use glam::Vec2;

use super::anim::{EXPLODE_INTERVAL_MS, FrameAnimation};
use super::bird::{BirdAction, FRAGMENT_MASS, Kinematics};
use super::body::{BodyDesc, BodyShape, EntityId, PhysicsBinding};
use super::explosion::Blast;
use super::{LifeState, ScreenRect};

pub const EGG_MASS: f32 = 5.0;
pub const EGG_RADIUS: f32 = 11.0;
pub const EGG_TRAVEL_LIMIT: f32 = 50.0;
/// Velocity kept when the egg bursts
pub const EGG_BURST_DAMPING: f32 = 0.01;

const EGG_SIZE: Vec2 = Vec2::new(22.0, 29.0);
const EXPLODE_FRAME_COUNT: usize = 3;

#[derive(Debug, Clone)]
pub struct Egg {
    pub id: EntityId,
    pub state: LifeState,
    pub rect: ScreenRect,
    pub angle_deg: f32,
    pub anim: FrameAnimation,
    exploded: bool,
    pub(crate) binding: Option<PhysicsBinding>,
}

impl Egg {
    /// Egg whose sprite's left edge is `at.x` and bottom edge is `at.y`
    pub fn new(id: EntityId, at: Vec2, seed: u64) -> Self {
        Self {
            id,
            state: LifeState::Attacking,
            rect: ScreenRect::from_left_bottom(at.x, at.y, EGG_SIZE),
            angle_deg: 0.0,
            anim: FrameAnimation::new(1, seed ^ id.0 as u64),
            exploded: false,
            binding: None,
        }
    }

    pub fn body_desc(&self) -> BodyDesc {
        BodyDesc::new(
            BodyShape::Ball { radius: EGG_RADIUS },
            EGG_MASS,
            crate::to_world(self.rect.center()),
        )
    }

    /// Contact with something solid. True the first time, when the caller
    /// should nearly stop the egg.
    pub fn burst(&mut self) -> bool {
        if self.state != LifeState::Attacking {
            return false;
        }
        self.state = LifeState::Exploding;
        true
    }

    pub fn place(&mut self, center: Vec2, angle_deg: f32) {
        self.rect = ScreenRect::from_center(center, self.rect.size);
        self.angle_deg = angle_deg;
    }

    pub fn set_dead(&mut self) {
        self.state = LifeState::Dead;
    }

    pub fn binding(&self) -> Option<PhysicsBinding> {
        self.binding
    }

    pub fn update(&mut self, now: u64, kinematics: Kinematics, out: &mut Vec<BirdAction>) {
        if self.state != LifeState::Exploding {
            return;
        }
        if !self.exploded {
            self.exploded = true;
            self.anim.restart(EXPLODE_FRAME_COUNT, now);
            out.push(BirdAction::Explode(Blast {
                center: kinematics.position,
                radius: EGG_RADIUS,
                travel_limit: EGG_TRAVEL_LIMIT,
                fragment_mass: FRAGMENT_MASS,
            }));
        }
        if self.anim.advance(now, EXPLODE_INTERVAL_MS) {
            self.state = LifeState::Dead;
            self.anim.hold_last();
        }
    }
}
