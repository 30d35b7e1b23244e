//! Birds: projectiles with one-shot abilities
//!
//! All kinds share one lifecycle:
//! `Idle -> Attacking -> Dead`, and for the detonator
//! `Idle -> Attacking -> [InitExploding ->] Exploding -> Dead`.
//! Kinds differ only in their payload and in what activation does.
//!
//! Birds never touch the physics world. `Bird::handle` takes an event and
//! pushes `BirdAction`s that the simulation applies after the entity pass.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::anim::{EXPLODE_INTERVAL_MS, FUSE_INTERVAL_MS, FrameAnimation};
use super::body::{BodyDesc, BodyShape, EntityId, PhysicsBinding};
use super::explosion::Blast;
use super::{LifeState, ScreenRect};
use crate::consts::{STALL_DISTANCE, STALL_INTERVAL_MS};
use crate::error::SimError;

/// Launch impulse per pixel of sling pull
pub const SLING_POWER: f32 = 53.0;
/// Collision radius shared by every bird
pub const BIRD_RADIUS: f32 = 12.0;
pub const BIRD_MASS: f32 = 5.0;
pub const HEAVY_BIRD_MASS: f32 = 8.0;
pub const BIRD_ELASTICITY: f32 = 0.95;

/// Vertical velocity share handed to each split clone (with opposite signs)
pub const SPLIT_VERTICAL_SCALE: f32 = 0.5;
/// Accelerator velocity multiplier
pub const ACCELERATOR_FACTOR: f32 = 3.0;
/// Dropper horizontal boost and upward kick after dropping its egg
pub const DROPPER_HORIZONTAL_FACTOR: f32 = 2.0;
pub const DROPPER_LIFT: f32 = 1000.0;
/// Egg spawns this far below the dropper's sprite
pub const EGG_DROP_OFFSET: f32 = 30.0;
/// Velocity kept when a detonator is set off by hand
pub const DETONATE_DAMPING: f32 = 0.01;
/// Fragment travel for a detonator blast
pub const DETONATOR_TRAVEL_LIMIT: f32 = 60.0;
pub const FRAGMENT_MASS: f32 = 5.0;

const FUSE_FRAME_COUNT: usize = 4;
const EXPLODE_FRAME_COUNT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BirdKind {
    /// No ability
    Standard,
    /// Splits into two extra birds
    Splitter,
    /// Speeds up
    Accelerator,
    /// Explodes on activation, on first collision, or when it stops
    Detonator { fuse_shown: bool, exploded: bool },
    /// Drops an egg and shoots upward
    Dropper,
    /// Heavier; its first ground contact keeps full speed
    Heavy { bounce_exemption: bool },
}

impl BirdKind {
    pub fn from_name(name: &str) -> Result<Self, SimError> {
        match name {
            "red_bird" => Ok(BirdKind::Standard),
            "blue_bird" => Ok(BirdKind::Splitter),
            "yellow_bird" => Ok(BirdKind::Accelerator),
            "black_bird" => Ok(BirdKind::Detonator {
                fuse_shown: false,
                exploded: false,
            }),
            "white_bird" => Ok(BirdKind::Dropper),
            "big_red_bird" => Ok(BirdKind::Heavy {
                bounce_exemption: true,
            }),
            other => Err(SimError::UnknownBird(other.to_string())),
        }
    }

    pub fn mass(&self) -> f32 {
        match self {
            BirdKind::Heavy { .. } => HEAVY_BIRD_MASS,
            _ => BIRD_MASS,
        }
    }

    /// Scaled sprite edge
    pub fn size(&self) -> Vec2 {
        let edge: f32 = match self {
            BirdKind::Standard => 33.0,
            BirdKind::Splitter => 29.0,
            BirdKind::Accelerator | BirdKind::Detonator { .. } => 37.0,
            BirdKind::Dropper => 42.0,
            BirdKind::Heavy { .. } => 60.0,
        };
        Vec2::splat(edge)
    }

    pub fn frame_count(&self) -> usize {
        match self {
            BirdKind::Heavy { .. } => 4,
            _ => 5,
        }
    }

    fn has_ability(&self) -> bool {
        !matches!(self, BirdKind::Standard | BirdKind::Heavy { .. })
    }
}

/// Body state the simulation hands to a bird each frame
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Kinematics {
    /// World position (y up)
    pub position: Vec2,
    pub velocity: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BirdEvent {
    /// Released from the sling
    Launch,
    /// Per-frame update; `activate` is true only on a fresh press
    Frame {
        now: u64,
        activate: bool,
        kinematics: Kinematics,
    },
    /// Touched a block
    Collided,
    /// Touched the ground
    GroundContact,
}

/// Requests for the simulation, applied after the entity pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BirdAction {
    SetVelocity(Vec2),
    ScaleVelocity(f32),
    /// Spawn two clones from this bird's body with these velocities
    Split { velocities: [Vec2; 2] },
    /// Spawn an egg whose sprite's left edge / bottom edge is `at` (screen)
    DropEgg { at: Vec2 },
    Explode(Blast),
}

#[derive(Debug, Clone)]
pub struct Bird {
    pub id: EntityId,
    pub kind: BirdKind,
    pub state: LifeState,
    /// Hit the ground or a block
    pub collided: bool,
    /// Ability already used
    pub activated: bool,
    pub rect: ScreenRect,
    pub angle_deg: f32,
    pub anim: FrameAnimation,
    /// Last stall sample: (time, sprite corner)
    stall_sample: Option<(u64, Vec2)>,
    path_timer: Option<u64>,
    pub(crate) binding: Option<PhysicsBinding>,
}

impl Bird {
    /// Bird standing with its sprite's left edge at `x` and bottom at `bottom`
    pub fn new(id: EntityId, kind: BirdKind, x: f32, bottom: f32, seed: u64) -> Self {
        Self {
            id,
            kind,
            state: LifeState::Idle,
            collided: false,
            activated: false,
            rect: ScreenRect::from_left_bottom(x, bottom, kind.size()),
            angle_deg: 0.0,
            anim: FrameAnimation::new(kind.frame_count(), seed ^ id.0 as u64),
            stall_sample: None,
            path_timer: None,
            binding: None,
        }
    }

    /// Split clone: already attacking, ability spent
    pub fn clone_of(id: EntityId, parent: &Bird, seed: u64) -> Self {
        let mut bird = Self::new(id, parent.kind, parent.rect.min.x, parent.rect.bottom(), seed);
        bird.state = LifeState::Attacking;
        bird.activated = true;
        bird
    }

    /// Body description for a sling launch.
    ///
    /// `distance` is the signed pull, `angle` is measured from horizontal
    /// in screen space; `origin` is the screen launch point.
    pub fn launch_desc(&self, distance: f32, angle: f32, origin: Vec2) -> BodyDesc {
        let impulse = Vec2::from_angle(-angle) * (distance * SLING_POWER);
        self.body_desc(crate::to_world(origin)).with_impulse(impulse)
    }

    pub fn body_desc(&self, position: Vec2) -> BodyDesc {
        BodyDesc::new(
            BodyShape::Ball {
                radius: BIRD_RADIUS,
            },
            self.kind.mass(),
            position,
        )
        .with_elasticity(BIRD_ELASTICITY)
    }

    pub fn radius(&self) -> f32 {
        (self.rect.size.x / 2.0).floor()
    }

    /// Move the sprite so it is centered on `center` (screen)
    pub fn place(&mut self, center: Vec2, angle_deg: f32) {
        self.rect = ScreenRect::from_center(center, self.rect.size);
        self.angle_deg = angle_deg;
    }

    /// Move the sprite's top-left corner
    pub fn move_to(&mut self, min: Vec2) {
        self.rect.min = min;
    }

    pub fn set_dead(&mut self) {
        self.state = LifeState::Dead;
    }

    pub fn binding(&self) -> Option<PhysicsBinding> {
        self.binding
    }

    /// Trail sampling: true when a new trail point is due
    pub fn path_sample_due(&mut self, now: u64, interval: u64) -> bool {
        match self.path_timer {
            None => {
                self.path_timer = Some(now);
                false
            }
            Some(t) if now.saturating_sub(t) > interval => {
                self.path_timer = Some(now);
                !self.collided
            }
            Some(_) => false,
        }
    }

    /// Single entry point for everything that happens to a bird
    pub fn handle(&mut self, event: BirdEvent, out: &mut Vec<BirdAction>) {
        match event {
            BirdEvent::Launch => {
                self.state = LifeState::Attacking;
            }
            BirdEvent::Collided => {
                self.collided = true;
            }
            BirdEvent::GroundContact => {
                match &mut self.kind {
                    BirdKind::Heavy { bounce_exemption } if *bounce_exemption => {
                        *bounce_exemption = false;
                    }
                    _ => out.push(BirdAction::ScaleVelocity(crate::consts::BIRD_GROUND_DAMPING)),
                }
                self.collided = true;
            }
            BirdEvent::Frame {
                now,
                activate,
                kinematics,
            } => {
                if self.state == LifeState::Attacking {
                    self.attacking(activate, kinematics, out);
                    if self.state == LifeState::Attacking {
                        self.check_attack_finish(now);
                    }
                }
                match self.state {
                    LifeState::InitExploding => self.init_explode(now),
                    LifeState::Exploding => self.exploding(now, kinematics, out),
                    _ => {}
                }
                self.animate(now);
            }
        }
    }

    fn attacking(&mut self, activate: bool, kin: Kinematics, out: &mut Vec<BirdAction>) {
        if let BirdKind::Detonator { .. } = self.kind {
            if !self.activated && activate && !self.collided {
                self.activated = true;
                self.state = LifeState::Exploding;
                out.push(BirdAction::SetVelocity(kin.velocity * DETONATE_DAMPING));
            }
            if self.collided {
                // A collided detonator goes off by itself and can no longer be triggered
                if !self.activated {
                    self.state = LifeState::InitExploding;
                }
                self.activated = true;
            }
            return;
        }

        if !self.kind.has_ability() || self.activated || !activate || self.collided {
            return;
        }
        self.activated = true;
        let v = kin.velocity;
        match self.kind {
            BirdKind::Splitter => {
                let vy = v.y * SPLIT_VERTICAL_SCALE;
                out.push(BirdAction::Split {
                    velocities: [Vec2::new(v.x, vy), Vec2::new(v.x, -vy)],
                });
            }
            BirdKind::Accelerator => {
                out.push(BirdAction::SetVelocity(v * ACCELERATOR_FACTOR));
            }
            BirdKind::Dropper => {
                out.push(BirdAction::SetVelocity(Vec2::new(
                    v.x * DROPPER_HORIZONTAL_FACTOR,
                    v.y + DROPPER_LIFT,
                )));
                out.push(BirdAction::DropEgg {
                    at: Vec2::new(self.rect.center().x, self.rect.bottom() + EGG_DROP_OFFSET),
                });
            }
            _ => {}
        }
        log::debug!("bird {:?} ability {:?} at velocity {}", self.id, self.kind, v);
    }

    /// Sample the sprite corner every interval; a bird that barely moved has stopped
    fn check_attack_finish(&mut self, now: u64) {
        let pos = self.rect.min;
        match self.stall_sample {
            None => self.stall_sample = Some((now, pos)),
            Some((t, old)) if now.saturating_sub(t) > STALL_INTERVAL_MS => {
                if crate::distance(old, pos) < STALL_DISTANCE {
                    self.state = match self.kind {
                        BirdKind::Detonator { .. } => LifeState::InitExploding,
                        _ => LifeState::Dead,
                    };
                }
                self.stall_sample = Some((now, pos));
            }
            Some(_) => {}
        }
    }

    fn init_explode(&mut self, now: u64) {
        if let BirdKind::Detonator { fuse_shown, .. } = &mut self.kind
            && !*fuse_shown
        {
            *fuse_shown = true;
            self.anim.restart(FUSE_FRAME_COUNT, now);
        }
    }

    fn exploding(&mut self, now: u64, kin: Kinematics, out: &mut Vec<BirdAction>) {
        let radius = self.radius();
        if let BirdKind::Detonator { exploded, .. } = &mut self.kind
            && !*exploded
        {
            *exploded = true;
            self.anim.restart(EXPLODE_FRAME_COUNT, now);
            out.push(BirdAction::Explode(Blast {
                center: kin.position,
                radius,
                travel_limit: DETONATOR_TRAVEL_LIMIT,
                fragment_mass: FRAGMENT_MASS,
            }));
        }
    }

    /// Advance frames; the fuse and blast sequences drive state changes
    pub fn animate(&mut self, now: u64) {
        let interval = match self.state {
            LifeState::InitExploding => FUSE_INTERVAL_MS,
            LifeState::Exploding => EXPLODE_INTERVAL_MS,
            _ => self.anim.blink_interval(),
        };
        if self.anim.advance(now, interval) {
            match self.state {
                LifeState::InitExploding => {
                    self.state = LifeState::Exploding;
                    self.anim.hold_last();
                }
                LifeState::Exploding => {
                    self.state = LifeState::Dead;
                    self.anim.hold_last();
                }
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flying(kind_name: &str) -> Bird {
        let kind = BirdKind::from_name(kind_name).unwrap();
        let mut bird = Bird::new(EntityId(1), kind, 100.0, 400.0, 7);
        let mut out = Vec::new();
        bird.handle(BirdEvent::Launch, &mut out);
        assert!(out.is_empty());
        bird
    }

    fn frame(now: u64, activate: bool, velocity: Vec2) -> BirdEvent {
        BirdEvent::Frame {
            now,
            activate,
            kinematics: Kinematics {
                position: Vec2::new(300.0, 200.0),
                velocity,
            },
        }
    }

    #[test]
    fn names_map_to_kinds() {
        assert_eq!(BirdKind::from_name("red_bird").unwrap(), BirdKind::Standard);
        assert!(matches!(
            BirdKind::from_name("big_red_bird").unwrap(),
            BirdKind::Heavy { bounce_exemption: true }
        ));
        assert!(BirdKind::from_name("green_bird").is_err());
    }

    #[test]
    fn launch_impulse_follows_pull() {
        let bird = Bird::new(EntityId(1), BirdKind::Standard, 0.0, 0.0, 0);
        // Pulled 90px straight left of the sling: launch straight right
        let desc = bird.launch_desc(90.0, 0.0, Vec2::new(154.0, 444.0));
        assert!((desc.velocity.x - 90.0 * SLING_POWER / BIRD_MASS).abs() < 1e-3);
        assert!(desc.velocity.y.abs() < 1e-3);
        assert_eq!(desc.position, Vec2::new(154.0, 156.0));

        // Pulled down and left: the screen angle is negative, the throw goes up
        let desc = bird.launch_desc(90.0, -0.5, Vec2::ZERO);
        assert!(desc.velocity.x > 0.0);
        assert!(desc.velocity.y > 0.0);
    }

    #[test]
    fn splitter_clone_velocities() {
        let mut bird = flying("blue_bird");
        let mut out = Vec::new();
        let v = Vec2::new(400.0, 120.0);
        bird.handle(frame(10, true, v), &mut out);
        let [a, b] = match out.as_slice() {
            [BirdAction::Split { velocities }] => *velocities,
            other => panic!("unexpected actions {:?}", other),
        };
        assert_eq!(a.x, v.x);
        assert_eq!(b.x, v.x);
        assert_eq!(a.y, 60.0);
        assert_eq!(b.y, -60.0);
        // Parent keeps flying: parent + clones sum to the original vertical speed
        assert_eq!(v.y + a.y + b.y, v.y);
        assert!(bird.activated);
    }

    #[test]
    fn ability_fires_once() {
        let mut bird = flying("yellow_bird");
        let mut out = Vec::new();
        bird.handle(frame(10, true, Vec2::new(100.0, 0.0)), &mut out);
        assert_eq!(out, vec![BirdAction::SetVelocity(Vec2::new(300.0, 0.0))]);
        out.clear();
        bird.handle(frame(20, true, Vec2::new(300.0, 0.0)), &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn ability_needs_press_and_no_collision() {
        let mut bird = flying("yellow_bird");
        let mut out = Vec::new();
        bird.handle(frame(10, false, Vec2::X), &mut out);
        assert!(out.is_empty());
        bird.handle(BirdEvent::Collided, &mut out);
        bird.handle(frame(20, true, Vec2::X), &mut out);
        assert!(out.is_empty());
        assert!(!bird.activated);
    }

    #[test]
    fn dropper_boosts_and_drops_egg_below() {
        let mut bird = flying("white_bird");
        let mut out = Vec::new();
        bird.handle(frame(10, true, Vec2::new(200.0, -50.0)), &mut out);
        assert_eq!(out[0], BirdAction::SetVelocity(Vec2::new(400.0, 950.0)));
        assert_eq!(
            out[1],
            BirdAction::DropEgg {
                at: Vec2::new(121.0, 430.0)
            }
        );
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn heavy_bird_skips_first_ground_damping() {
        let mut bird = flying("big_red_bird");
        let mut out = Vec::new();
        bird.handle(BirdEvent::GroundContact, &mut out);
        assert!(out.is_empty());
        assert!(bird.collided);
        bird.handle(BirdEvent::GroundContact, &mut out);
        assert_eq!(out, vec![BirdAction::ScaleVelocity(0.5)]);

        let mut red = flying("red_bird");
        out.clear();
        red.handle(BirdEvent::GroundContact, &mut out);
        assert_eq!(out, vec![BirdAction::ScaleVelocity(0.5)]);
    }

    #[test]
    fn stalled_bird_dies() {
        let mut bird = flying("red_bird");
        let mut out = Vec::new();
        bird.handle(frame(0, false, Vec2::ZERO), &mut out);
        bird.handle(frame(300, false, Vec2::ZERO), &mut out);
        assert_eq!(bird.state, LifeState::Attacking);
        bird.handle(frame(501, false, Vec2::ZERO), &mut out);
        assert_eq!(bird.state, LifeState::Dead);
    }

    #[test]
    fn moving_bird_keeps_attacking() {
        let mut bird = flying("red_bird");
        let mut out = Vec::new();
        for step in 0..20u64 {
            bird.move_to(Vec2::new(step as f32 * 20.0, 100.0));
            bird.handle(frame(step * 100, false, Vec2::X), &mut out);
        }
        assert_eq!(bird.state, LifeState::Attacking);
    }

    #[test]
    fn stalled_detonator_runs_full_sequence() {
        let mut bird = flying("black_bird");
        let mut out = Vec::new();
        let mut states = vec![bird.state];
        let mut now = 0;
        while now < 5000 && bird.state != LifeState::Dead {
            bird.handle(frame(now, false, Vec2::ZERO), &mut out);
            if states.last() != Some(&bird.state) {
                states.push(bird.state);
            }
            now += 50;
        }
        assert_eq!(
            states,
            vec![
                LifeState::Attacking,
                LifeState::InitExploding,
                LifeState::Exploding,
                LifeState::Dead
            ]
        );
        let explosions = out
            .iter()
            .filter(|a| matches!(a, BirdAction::Explode(_)))
            .count();
        assert_eq!(explosions, 1);
        match out.iter().find(|a| matches!(a, BirdAction::Explode(_))) {
            Some(BirdAction::Explode(blast)) => {
                assert_eq!(blast.center, Vec2::new(300.0, 200.0));
                assert_eq!(blast.radius, 18.0);
                assert_eq!(blast.travel_limit, 60.0);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn collided_detonator_lights_fuse_and_ignores_press() {
        let mut bird = flying("black_bird");
        let mut out = Vec::new();
        bird.handle(BirdEvent::Collided, &mut out);
        bird.handle(frame(10, true, Vec2::new(50.0, 0.0)), &mut out);
        assert_eq!(bird.state, LifeState::InitExploding);
        assert!(bird.activated);
        assert!(out.is_empty());
    }

    #[test]
    fn pressed_detonator_explodes_at_once() {
        let mut bird = flying("black_bird");
        let mut out = Vec::new();
        bird.handle(frame(10, true, Vec2::new(500.0, 100.0)), &mut out);
        assert_eq!(bird.state, LifeState::Exploding);
        assert_eq!(out[0], BirdAction::SetVelocity(Vec2::new(5.0, 1.0)));
        assert!(matches!(out[1], BirdAction::Explode(_)));
    }

    #[test]
    fn path_samples_stop_after_collision() {
        let mut bird = flying("red_bird");
        assert!(!bird.path_sample_due(0, 50));
        assert!(!bird.path_sample_due(40, 50));
        assert!(bird.path_sample_due(51, 50));
        bird.collided = true;
        assert!(!bird.path_sample_due(200, 50));
    }
}
