//! Destructible structure blocks
//!
//! Two shape families (beams, circles) in three materials. Material scales
//! mass and sets life; every block has four damage images.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::ScreenRect;
use super::body::{BodyDesc, BodyShape, EntityId, PhysicsBinding};
use super::damage::Durability;
use crate::error::SimError;

/// Damage images per block
pub const BLOCK_IMAGE_COUNT: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Material {
    Glass,
    Wood,
    Stone,
}

impl Material {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "glass" => Some(Material::Glass),
            "wood" => Some(Material::Wood),
            "stone" => Some(Material::Stone),
            _ => None,
        }
    }

    /// Baseline life
    pub fn life(&self) -> i32 {
        match self {
            Material::Glass => 4,
            Material::Wood => 12,
            Material::Stone => 48,
        }
    }

    /// Mass multiplier
    pub fn mass_times(&self) -> f32 {
        match self {
            Material::Glass => 1.0,
            Material::Wood => 2.0,
            Material::Stone => 4.0,
        }
    }
}

/// Beam orientation in the level file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    Horizontal,
    Vertical,
}

impl Direction {
    pub fn from_code(code: u32) -> Self {
        if code == 1 {
            Direction::Vertical
        } else {
            Direction::Horizontal
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockShape {
    /// Sub-types 1-4 grow in length, 5 is the thick one, 6 the square
    Beam { subtype: u8, direction: Direction },
    /// Sub-type 1 is small, 2 is big
    Circle { subtype: u8 },
}

/// Validated block description
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlockSpec {
    pub material: Material,
    pub shape: BlockShape,
}

impl BlockSpec {
    /// Validate a raw level-file entry
    pub fn from_placement(
        material: &str,
        shape: &str,
        subtype: u32,
        direction: u32,
    ) -> Result<Self, SimError> {
        let unsupported = || SimError::UnsupportedBlock {
            material: material.to_string(),
            shape: shape.to_string(),
            subtype,
        };
        let material_kind = Material::from_name(material).ok_or_else(unsupported)?;
        let shape_kind = match (shape, subtype) {
            ("beam", 1..=6) => BlockShape::Beam {
                subtype: subtype as u8,
                direction: Direction::from_code(direction),
            },
            ("circle", 1..=2) => BlockShape::Circle {
                subtype: subtype as u8,
            },
            _ => return Err(unsupported()),
        };
        Ok(Self {
            material: material_kind,
            shape: shape_kind,
        })
    }

    pub fn life(&self) -> i32 {
        self.material.life()
    }

    pub fn mass(&self) -> f32 {
        let base = match self.shape {
            BlockShape::Beam { subtype, .. } => match subtype {
                1 => 1.0,
                2 => 2.0,
                3 => 4.0,
                4 => 5.0,
                5 => 4.0,
                _ => 2.0,
            },
            BlockShape::Circle { subtype } => {
                if subtype == 1 {
                    1.6
                } else {
                    6.4
                }
            }
        };
        base * self.material.mass_times()
    }

    /// Sprite size in pixels, already turned for vertical beams
    pub fn size(&self) -> Vec2 {
        let glass = self.material == Material::Glass;
        match self.shape {
            BlockShape::Beam { subtype, direction } => {
                let (w, h) = match subtype {
                    1 => (38.0, 18.0),
                    2 => (80.0, 18.0),
                    3 => (160.0, 18.0),
                    4 => (200.0, 18.0),
                    5 => (80.0, if glass { 39.0 } else { 38.0 }),
                    _ if glass => (39.0, 39.0),
                    _ => (38.0, 38.0),
                };
                match direction {
                    Direction::Horizontal => Vec2::new(w, h),
                    Direction::Vertical => Vec2::new(h, w),
                }
            }
            BlockShape::Circle { subtype } => {
                let d = match (subtype, self.material) {
                    (1, Material::Glass) => 42.0,
                    (1, Material::Wood) => 39.0,
                    (1, Material::Stone) => 37.0,
                    _ => 73.0,
                };
                Vec2::splat(d)
            }
        }
    }

    pub fn body_shape(&self) -> BodyShape {
        let size = self.size();
        match self.shape {
            BlockShape::Beam { .. } => BodyShape::Cuboid {
                half_extents: size * 0.5,
            },
            BlockShape::Circle { .. } => BodyShape::Ball { radius: size.x * 0.5 },
        }
    }
}

/// A block placed in the level
#[derive(Debug, Clone)]
pub struct Block {
    pub id: EntityId,
    pub spec: BlockSpec,
    pub durability: Durability,
    /// Screen placement of the rotated sprite
    pub rect: ScreenRect,
    /// Rotation for drawing (degrees, counter-clockwise)
    pub angle_deg: f32,
    pub(crate) binding: Option<PhysicsBinding>,
}

impl Block {
    /// Block whose sprite's left edge is `x` and bottom edge is `bottom`
    pub fn new(id: EntityId, spec: BlockSpec, x: f32, bottom: f32) -> Self {
        Self {
            id,
            spec,
            durability: Durability::new(spec.life(), BLOCK_IMAGE_COUNT),
            rect: ScreenRect::from_left_bottom(x, bottom, spec.size()),
            angle_deg: 0.0,
            binding: None,
        }
    }

    /// Physics description at the sprite's current screen center
    pub fn body_desc(&self) -> BodyDesc {
        BodyDesc::new(
            self.spec.body_shape(),
            self.spec.mass(),
            crate::to_world(self.rect.center()),
        )
    }

    pub fn life(&self) -> i32 {
        self.durability.life()
    }

    /// Follow the body: the rect becomes the bounding box of the turned sprite
    pub fn place(&mut self, center: Vec2, angle: f32) {
        self.rect = ScreenRect::from_center(center, super::rotated_extent(self.spec.size(), angle));
        self.angle_deg = angle.to_degrees();
    }

    pub fn apply_damage(&mut self, amount: u32) {
        self.durability.apply_damage(amount);
        log::debug!(
            "block {:?} damage: {} life: {}",
            self.id,
            amount,
            self.durability.life()
        );
    }

    pub fn binding(&self) -> Option<PhysicsBinding> {
        self.binding
    }
}
