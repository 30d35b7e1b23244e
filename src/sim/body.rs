//! Rigid body adapter over rapier2d
//!
//! Gameplay code only sees `glam::Vec2`, `EntityId` and `PhysicsBinding`;
//! everything rapier-specific stays in this file. Physics space is y-up with
//! the ground line near world y = 50; see `crate::to_screen`.

use glam::Vec2;
use rapier2d::prelude::*;
use serde::{Deserialize, Serialize};

use super::collision::ContactReport;
use crate::consts::{GROUND_ELASTICITY, GROUND_FRICTION};

fn vec2_to_na(v: Vec2) -> Vector<Real> {
    vector![v.x, v.y]
}

fn na_to_vec2(v: &Vector<Real>) -> Vec2 {
    Vec2::new(v.x, v.y)
}

/// Stable identifier of a gameplay entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

/// Hands out entity ids; 0 is reserved for the ground
#[derive(Debug, Clone)]
pub struct IdSource {
    next: u32,
}

impl Default for IdSource {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl IdSource {
    pub fn next_id(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next += 1;
        id
    }
}

/// Collision category carried by every collider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollisionCategory {
    Bird = 1,
    Pig = 2,
    Block = 3,
    Ground = 4,
    Fragment = 5,
    Egg = 6,
}

impl CollisionCategory {
    fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Bird),
            2 => Some(Self::Pig),
            3 => Some(Self::Block),
            4 => Some(Self::Ground),
            5 => Some(Self::Fragment),
            6 => Some(Self::Egg),
            _ => None,
        }
    }

    fn group(self) -> Group {
        match self {
            Self::Bird => Group::GROUP_1,
            Self::Pig => Group::GROUP_2,
            Self::Block => Group::GROUP_3,
            Self::Ground => Group::GROUP_4,
            Self::Fragment => Group::GROUP_5,
            Self::Egg => Group::GROUP_6,
        }
    }

    /// Fragments only touch what they can damage (and the ground); they pass
    /// through birds, eggs and each other. Birds pass through each other so
    /// split clones can start inside their parent.
    fn interaction_groups(self) -> InteractionGroups {
        let filter = match self {
            Self::Fragment => Group::GROUP_2 | Group::GROUP_3 | Group::GROUP_4,
            Self::Bird => Group::ALL.difference(Group::GROUP_1),
            _ => Group::ALL,
        };
        InteractionGroups::new(self.group(), filter)
    }
}

/// Category + entity packed into a collider's user data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyTag {
    pub category: CollisionCategory,
    pub id: EntityId,
}

impl BodyTag {
    pub fn new(category: CollisionCategory, id: EntityId) -> Self {
        Self { category, id }
    }

    fn encode(self) -> u128 {
        ((self.category as u128) << 32) | self.id.0 as u128
    }

    fn decode(data: u128) -> Option<Self> {
        let category = CollisionCategory::from_code((data >> 32) as u8)?;
        Some(Self {
            category,
            id: EntityId(data as u32),
        })
    }
}

/// Collider geometry
#[derive(Debug, Clone, Copy)]
pub enum BodyShape {
    Ball { radius: f32 },
    Cuboid { half_extents: Vec2 },
}

/// Everything needed to create one body + collider
#[derive(Debug, Clone)]
pub struct BodyDesc {
    pub shape: BodyShape,
    pub mass: f32,
    pub elasticity: f32,
    pub friction: f32,
    pub position: Vec2,
    pub angle: f32,
    pub velocity: Vec2,
    pub angular_velocity: f32,
    pub gravity_scale: f32,
}

impl BodyDesc {
    pub fn new(shape: BodyShape, mass: f32, position: Vec2) -> Self {
        Self {
            shape,
            mass,
            elasticity: 0.0,
            friction: 1.0,
            position,
            angle: 0.0,
            velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            gravity_scale: 1.0,
        }
    }

    pub fn with_elasticity(mut self, elasticity: f32) -> Self {
        self.elasticity = elasticity;
        self
    }

    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    /// Apply an impulse at creation; the body starts with `impulse / mass`
    pub fn with_impulse(mut self, impulse: Vec2) -> Self {
        self.velocity += impulse / self.mass.max(f32::EPSILON);
        self
    }

    pub fn with_gravity_scale(mut self, scale: f32) -> Self {
        self.gravity_scale = scale;
        self
    }

    /// Start from another body's kinematic state
    pub fn with_snapshot(mut self, snapshot: &BodySnapshot) -> Self {
        self.position = snapshot.position;
        self.angle = snapshot.angle;
        self.velocity = snapshot.velocity;
        self.angular_velocity = snapshot.angular_velocity;
        self
    }
}

/// Exclusive handle pair owned by one entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhysicsBinding {
    body: RigidBodyHandle,
    collider: ColliderHandle,
}

/// Copy of a body's kinematic state, used to seed a new body
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BodySnapshot {
    pub position: Vec2,
    pub angle: f32,
    pub velocity: Vec2,
    pub angular_velocity: f32,
}

/// Wraps the rapier2d world: sets, pipeline and the static ground line
pub struct PhysicsWorld {
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
}

impl PhysicsWorld {
    /// Create a world with downward `gravity` (pixels/s²) and step length `dt`
    pub fn new(gravity: f32, dt: f32) -> Self {
        let mut integration_parameters = IntegrationParameters::default();
        integration_parameters.dt = dt;
        // Pixel units: contact tolerances scale with typical object size
        integration_parameters.length_unit = 50.0;

        Self {
            gravity: vector![0.0, -gravity],
            integration_parameters,
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
        }
    }

    /// Add the immovable ground segment from (0, y) to (width, y)
    pub fn add_ground(&mut self, y: f32, width: f32) -> PhysicsBinding {
        let body = self.bodies.insert(RigidBodyBuilder::fixed().build());
        let collider = ColliderBuilder::segment(point![0.0, y], point![width, y])
            .restitution(GROUND_ELASTICITY)
            .friction(GROUND_FRICTION)
            .collision_groups(CollisionCategory::Ground.interaction_groups())
            .user_data(BodyTag::new(CollisionCategory::Ground, EntityId(0)).encode())
            .build();
        let collider = self
            .colliders
            .insert_with_parent(collider, body, &mut self.bodies);
        PhysicsBinding { body, collider }
    }

    /// Create a dynamic body + collider tagged with `tag`
    pub fn create_body(&mut self, tag: BodyTag, desc: &BodyDesc) -> PhysicsBinding {
        let rb = RigidBodyBuilder::dynamic()
            .translation(vec2_to_na(desc.position))
            .rotation(desc.angle)
            .linvel(vec2_to_na(desc.velocity))
            .angvel(desc.angular_velocity)
            .gravity_scale(desc.gravity_scale)
            .build();
        let body = self.bodies.insert(rb);

        let builder = match desc.shape {
            BodyShape::Ball { radius } => ColliderBuilder::ball(radius),
            BodyShape::Cuboid { half_extents } => {
                ColliderBuilder::cuboid(half_extents.x, half_extents.y)
            }
        };
        let collider = builder
            .mass(desc.mass)
            .restitution(desc.elasticity)
            .friction(desc.friction)
            .collision_groups(tag.category.interaction_groups())
            .user_data(tag.encode())
            .build();
        let collider = self
            .colliders
            .insert_with_parent(collider, body, &mut self.bodies);

        PhysicsBinding { body, collider }
    }

    /// Release a body and its collider
    pub fn remove(&mut self, binding: PhysicsBinding) {
        self.bodies.remove(
            binding.body,
            &mut self.island_manager,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
    }

    /// Advance one fixed step
    pub fn step(&mut self) {
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
    }

    /// Report every pair the last step pushed apart, with its total impulse
    pub fn collect_contacts(&self, out: &mut Vec<ContactReport>) {
        for pair in self.narrow_phase.contact_pairs() {
            if !pair.has_any_active_contact {
                continue;
            }
            let (Some(a), Some(b)) = (self.tag_of(pair.collider1), self.tag_of(pair.collider2))
            else {
                continue;
            };
            let total = pair
                .manifolds
                .iter()
                .fold(Vector::<Real>::zeros(), |acc, manifold| {
                    let normal_impulse: Real = manifold.points.iter().map(|p| p.data.impulse).sum();
                    acc + manifold.data.normal * normal_impulse
                });
            // Speculative contacts inside the prediction margin carry no impulse
            let impulse = total.norm();
            if impulse <= 0.0 {
                continue;
            }
            out.push(ContactReport { a, b, impulse });
        }
    }

    pub fn position(&self, binding: PhysicsBinding) -> Vec2 {
        self.bodies
            .get(binding.body)
            .map(|rb| na_to_vec2(rb.translation()))
            .unwrap_or(Vec2::ZERO)
    }

    /// Body angle (radians, counter-clockwise in world space)
    pub fn angle(&self, binding: PhysicsBinding) -> f32 {
        self.bodies
            .get(binding.body)
            .map(|rb| rb.rotation().angle())
            .unwrap_or(0.0)
    }

    pub fn velocity(&self, binding: PhysicsBinding) -> Vec2 {
        self.bodies
            .get(binding.body)
            .map(|rb| na_to_vec2(rb.linvel()))
            .unwrap_or(Vec2::ZERO)
    }

    pub fn set_velocity(&mut self, binding: PhysicsBinding, velocity: Vec2) {
        if let Some(rb) = self.bodies.get_mut(binding.body) {
            rb.set_linvel(vec2_to_na(velocity), true);
        }
    }

    pub fn scale_velocity(&mut self, binding: PhysicsBinding, factor: f32) {
        let velocity = self.velocity(binding);
        self.set_velocity(binding, velocity * factor);
    }

    /// Kinematic state for spawning a copy of this body
    pub fn snapshot(&self, binding: PhysicsBinding) -> BodySnapshot {
        self.bodies
            .get(binding.body)
            .map(|rb| BodySnapshot {
                position: na_to_vec2(rb.translation()),
                angle: rb.rotation().angle(),
                velocity: na_to_vec2(rb.linvel()),
                angular_velocity: rb.angvel(),
            })
            .unwrap_or_default()
    }

    /// Number of bodies, ground included
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    fn tag_of(&self, handle: ColliderHandle) -> Option<BodyTag> {
        let collider = self.colliders.get(handle)?;
        BodyTag::decode(collider.user_data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ball(at: Vec2) -> BodyDesc {
        BodyDesc::new(BodyShape::Ball { radius: 10.0 }, 5.0, at)
    }

    #[test]
    fn tag_survives_user_data() {
        let tag = BodyTag::new(CollisionCategory::Egg, EntityId(77));
        assert_eq!(BodyTag::decode(tag.encode()), Some(tag));
        assert_eq!(BodyTag::decode(0), None);
    }

    #[test]
    fn create_and_remove_body() {
        let mut world = PhysicsWorld::new(700.0, 0.002);
        let binding = world.create_body(
            BodyTag::new(CollisionCategory::Pig, EntityId(1)),
            &ball(Vec2::new(100.0, 100.0)),
        );
        assert_eq!(world.body_count(), 1);
        world.remove(binding);
        assert_eq!(world.body_count(), 0);
    }

    #[test]
    fn impulse_becomes_velocity() {
        let mut world = PhysicsWorld::new(0.0, 0.002);
        let desc = ball(Vec2::ZERO).with_impulse(Vec2::new(500.0, 0.0));
        let binding = world.create_body(BodyTag::new(CollisionCategory::Bird, EntityId(1)), &desc);
        assert!((world.velocity(binding).x - 100.0).abs() < 1e-3);
    }

    #[test]
    fn gravity_pulls_down() {
        let mut world = PhysicsWorld::new(700.0, 0.002);
        let binding = world.create_body(
            BodyTag::new(CollisionCategory::Block, EntityId(1)),
            &ball(Vec2::new(0.0, 300.0)),
        );
        for _ in 0..50 {
            world.step();
        }
        assert!(world.position(binding).y < 300.0);
    }

    #[test]
    fn snapshot_copies_kinematics() {
        let mut world = PhysicsWorld::new(0.0, 0.002);
        let source = world.create_body(
            BodyTag::new(CollisionCategory::Bird, EntityId(1)),
            &ball(Vec2::new(50.0, 60.0)).with_velocity(Vec2::new(300.0, -40.0)),
        );
        let snapshot = world.snapshot(source);
        let copy = world.create_body(
            BodyTag::new(CollisionCategory::Bird, EntityId(2)),
            &ball(Vec2::ZERO).with_snapshot(&snapshot),
        );
        assert_eq!(world.position(copy), Vec2::new(50.0, 60.0));
        assert_eq!(world.velocity(copy), Vec2::new(300.0, -40.0));

        // The copy is its own body
        world.set_velocity(copy, Vec2::ZERO);
        assert_eq!(world.velocity(source), Vec2::new(300.0, -40.0));
    }

    #[test]
    fn resting_body_reports_ground_contact() {
        let mut world = PhysicsWorld::new(700.0, 0.002);
        world.add_ground(50.0, 1200.0);
        world.create_body(
            BodyTag::new(CollisionCategory::Pig, EntityId(3)),
            &ball(Vec2::new(600.0, 70.0)),
        );
        let mut contacts = Vec::new();
        for _ in 0..500 {
            world.step();
            contacts.clear();
            world.collect_contacts(&mut contacts);
            if !contacts.is_empty() {
                break;
            }
        }
        let report = contacts.first().expect("pig should land on the ground");
        let categories = [report.a.category, report.b.category];
        assert!(categories.contains(&CollisionCategory::Pig));
        assert!(categories.contains(&CollisionCategory::Ground));
    }
}
