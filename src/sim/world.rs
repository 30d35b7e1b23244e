//! Simulation step loop
//!
//! One `update` per rendered frame, in a fixed pass order:
//! entity updates -> queued actions -> physics sub-steps (collision effects
//! applied after each) -> transform sync -> prune -> events.

use glam::Vec2;

use super::bird::{Bird, BirdAction, BirdEvent, Kinematics};
use super::block::{Block, BlockSpec};
use super::body::{BodyTag, CollisionCategory, EntityId, IdSource, PhysicsBinding, PhysicsWorld};
use super::collision::{CollisionEffect, ContactReport, classify};
use super::egg::{EGG_BURST_DAMPING, Egg};
use super::explosion::{Explosions, Fragment};
use super::pig::{Pig, PigKind};
use super::LifeState;
use crate::config::SimConfig;
use crate::consts::{GROUND_HEIGHT, PATH_INTERVAL_MS, SCREEN_WIDTH};
use crate::{to_screen, to_world};

/// What happened during a frame, for the level to score and draw
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimEvent {
    PigRemoved(EntityId),
    BlockRemoved(EntityId),
    BirdRemoved(EntityId),
    /// Trail point (screen) of an airborne bird that has not collided yet
    PathSample(Vec2),
}

/// The physics world plus every simulated entity
pub struct Simulation {
    config: SimConfig,
    physics: PhysicsWorld,
    ids: IdSource,
    birds: Vec<Bird>,
    pigs: Vec<Pig>,
    blocks: Vec<Block>,
    eggs: Vec<Egg>,
    explosions: Explosions,
    /// Off until the first launch so pre-launch settling does no damage
    collision_checks_enabled: bool,
    contacts: Vec<ContactReport>,
    effects: Vec<CollisionEffect>,
    events: Vec<SimEvent>,
}

fn kinematics(physics: &PhysicsWorld, binding: Option<PhysicsBinding>) -> Kinematics {
    match binding {
        Some(binding) => Kinematics {
            position: physics.position(binding),
            velocity: physics.velocity(binding),
        },
        None => Kinematics::default(),
    }
}

impl Simulation {
    /// Empty world with just the ground line
    pub fn new(config: SimConfig) -> Self {
        let mut physics = PhysicsWorld::new(config.gravity, config.preset.substep_dt());
        let ground = to_world(Vec2::new(0.0, GROUND_HEIGHT));
        physics.add_ground(ground.y, SCREEN_WIDTH);
        log::debug!(
            "simulation created: preset {} ({} x {}s), gravity {}",
            config.preset.as_str(),
            config.preset.substeps(),
            config.preset.substep_dt(),
            config.gravity
        );
        Self {
            config,
            physics,
            ids: IdSource::default(),
            birds: Vec::new(),
            pigs: Vec::new(),
            blocks: Vec::new(),
            eggs: Vec::new(),
            explosions: Explosions::default(),
            collision_checks_enabled: false,
            contacts: Vec::new(),
            effects: Vec::new(),
            events: Vec::new(),
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn next_id(&mut self) -> EntityId {
        self.ids.next_id()
    }

    pub fn birds(&self) -> &[Bird] {
        &self.birds
    }

    pub fn pigs(&self) -> &[Pig] {
        &self.pigs
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn eggs(&self) -> &[Egg] {
        &self.eggs
    }

    pub fn fragments(&self) -> &[Fragment] {
        self.explosions.fragments()
    }

    /// Bodies in the physics world, ground included
    pub fn body_count(&self) -> usize {
        self.physics.body_count()
    }

    pub fn collision_checks_enabled(&self) -> bool {
        self.collision_checks_enabled
    }

    pub fn enable_collision_checks(&mut self) {
        self.collision_checks_enabled = true;
    }

    pub fn add_pig(&mut self, kind: PigKind, x: f32, bottom: f32) -> EntityId {
        let id = self.ids.next_id();
        let mut pig = Pig::new(id, kind, x, bottom, self.config.seed);
        pig.binding = Some(
            self.physics
                .create_body(BodyTag::new(CollisionCategory::Pig, id), &pig.body_desc()),
        );
        self.pigs.push(pig);
        id
    }

    pub fn add_block(&mut self, spec: BlockSpec, x: f32, bottom: f32) -> EntityId {
        let id = self.ids.next_id();
        let mut block = Block::new(id, spec, x, bottom);
        block.binding = Some(
            self.physics
                .create_body(BodyTag::new(CollisionCategory::Block, id), &block.body_desc()),
        );
        self.blocks.push(block);
        id
    }

    /// Put a bird into flight from the sling.
    ///
    /// The first launch turns collision checks on.
    pub fn launch_bird(&mut self, mut bird: Bird, distance: f32, angle: f32, origin: Vec2) -> EntityId {
        let desc = bird.launch_desc(distance, angle, origin);
        bird.binding = Some(
            self.physics
                .create_body(BodyTag::new(CollisionCategory::Bird, bird.id), &desc),
        );
        bird.place(origin, 0.0);
        bird.handle(BirdEvent::Launch, &mut Vec::new());
        self.collision_checks_enabled = true;
        log::debug!(
            "bird {:?} launched: distance {} angle {} velocity {}",
            bird.id,
            distance,
            angle,
            desc.velocity
        );
        let id = bird.id;
        self.birds.push(bird);
        id
    }

    /// Advance one frame; `activate` is the fresh-press signal for abilities.
    pub fn update(&mut self, now: u64, activate: bool) -> Vec<SimEvent> {
        let actions = self.update_entities(now, activate);
        for (id, action) in actions {
            self.apply_action(id, action, now);
        }

        for _ in 0..self.config.preset.substeps() {
            self.physics.step();
            if self.collision_checks_enabled {
                self.contacts.clear();
                self.physics.collect_contacts(&mut self.contacts);
                self.effects.clear();
                for contact in &self.contacts {
                    classify(contact, &mut self.effects);
                }
                let effects = std::mem::take(&mut self.effects);
                for effect in &effects {
                    self.apply_effect(*effect);
                }
                self.effects = effects;
            }
        }

        self.sync_and_prune(now);
        self.explosions.prune(&mut self.physics, now);
        std::mem::take(&mut self.events)
    }

    /// Ability and animation pass; returns requested actions by entity
    fn update_entities(&mut self, now: u64, activate: bool) -> Vec<(EntityId, BirdAction)> {
        let mut actions = Vec::new();
        let mut scratch = Vec::new();
        for bird in &mut self.birds {
            let kin = kinematics(&self.physics, bird.binding);
            bird.handle(
                BirdEvent::Frame {
                    now,
                    activate,
                    kinematics: kin,
                },
                &mut scratch,
            );
            actions.extend(scratch.drain(..).map(|a| (bird.id, a)));
        }
        for egg in &mut self.eggs {
            let kin = kinematics(&self.physics, egg.binding);
            egg.update(now, kin, &mut scratch);
            actions.extend(scratch.drain(..).map(|a| (egg.id, a)));
        }
        for pig in &mut self.pigs {
            pig.animate(now);
        }
        actions
    }

    fn bird_binding(&self, id: EntityId) -> Option<PhysicsBinding> {
        self.birds.iter().find(|b| b.id == id).and_then(Bird::binding)
    }

    fn apply_action(&mut self, source: EntityId, action: BirdAction, now: u64) {
        match action {
            BirdAction::SetVelocity(velocity) => {
                if let Some(binding) = self.bird_binding(source) {
                    self.physics.set_velocity(binding, velocity);
                }
            }
            BirdAction::ScaleVelocity(factor) => {
                if let Some(binding) = self.bird_binding(source) {
                    self.physics.scale_velocity(binding, factor);
                }
            }
            BirdAction::Split { velocities } => {
                let Some(parent) = self.birds.iter().find(|b| b.id == source) else {
                    return;
                };
                let Some(binding) = parent.binding else {
                    return;
                };
                let snapshot = self.physics.snapshot(binding);
                let parent = parent.clone();
                for velocity in velocities {
                    let id = self.ids.next_id();
                    let mut clone = Bird::clone_of(id, &parent, self.config.seed);
                    let desc = clone
                        .body_desc(snapshot.position)
                        .with_snapshot(&snapshot)
                        .with_velocity(velocity);
                    clone.binding = Some(
                        self.physics
                            .create_body(BodyTag::new(CollisionCategory::Bird, id), &desc),
                    );
                    clone.place(to_screen(snapshot.position), parent.angle_deg);
                    self.birds.push(clone);
                }
                log::debug!("bird {:?} split, {} birds in flight", source, self.birds.len());
            }
            BirdAction::DropEgg { at } => {
                let id = self.ids.next_id();
                let mut egg = Egg::new(id, at, self.config.seed);
                egg.binding = Some(
                    self.physics
                        .create_body(BodyTag::new(CollisionCategory::Egg, id), &egg.body_desc()),
                );
                self.eggs.push(egg);
            }
            BirdAction::Explode(blast) => {
                self.explosions
                    .spawn(&mut self.physics, &mut self.ids, blast, now);
            }
        }
    }

    fn apply_effect(&mut self, effect: CollisionEffect) {
        match effect {
            CollisionEffect::BirdHitGround { bird } | CollisionEffect::BirdCollided { bird } => {
                let event = if matches!(effect, CollisionEffect::BirdHitGround { .. }) {
                    BirdEvent::GroundContact
                } else {
                    BirdEvent::Collided
                };
                let Some(target) = self.birds.iter_mut().find(|b| b.id == bird) else {
                    return;
                };
                let mut out = Vec::new();
                target.handle(event, &mut out);
                for action in out {
                    self.apply_action(bird, action, 0);
                }
            }
            CollisionEffect::DamagePig { pig, amount } => {
                if let Some(target) = self.pigs.iter_mut().find(|p| p.id == pig) {
                    target.apply_damage(amount);
                }
            }
            CollisionEffect::ScalePigVelocity { pig, factor } => {
                let binding = self.pigs.iter().find(|p| p.id == pig).and_then(Pig::binding);
                if let Some(binding) = binding {
                    self.physics.scale_velocity(binding, factor);
                }
            }
            CollisionEffect::DamageBlock { block, amount } => {
                if let Some(target) = self.blocks.iter_mut().find(|b| b.id == block) {
                    target.apply_damage(amount);
                }
            }
            CollisionEffect::EggBurst { egg } => {
                let Some(target) = self.eggs.iter_mut().find(|e| e.id == egg) else {
                    return;
                };
                if target.burst()
                    && let Some(binding) = target.binding
                {
                    self.physics.scale_velocity(binding, EGG_BURST_DAMPING);
                }
            }
        }
    }

    /// Copy body transforms onto sprites, then remove what left the game
    fn sync_and_prune(&mut self, now: u64) {
        let mut dead_birds = Vec::new();
        for bird in &mut self.birds {
            let Some(binding) = bird.binding else {
                continue;
            };
            let p = self.physics.position(binding);
            bird.place(to_screen(p), self.physics.angle(binding).to_degrees());
            if bird.path_sample_due(now, PATH_INTERVAL_MS) {
                self.events.push(SimEvent::PathSample(to_screen(p)));
            }
            if p.y < 0.0 || p.x < 0.0 || p.x > SCREEN_WIDTH || bird.state == LifeState::Dead {
                dead_birds.push(bird.id);
            }
        }

        let mut dead_pigs = Vec::new();
        for pig in &mut self.pigs {
            let Some(binding) = pig.binding else {
                continue;
            };
            let p = self.physics.position(binding);
            pig.place(to_screen(p), self.physics.angle(binding).to_degrees());
            if p.y < 0.0 || pig.life() <= 0 {
                dead_pigs.push(pig.id);
            }
        }

        let mut dead_blocks = Vec::new();
        for block in &mut self.blocks {
            let Some(binding) = block.binding else {
                continue;
            };
            let p = self.physics.position(binding);
            block.place(to_screen(p), self.physics.angle(binding));
            if p.y < 0.0 || block.life() <= 0 {
                dead_blocks.push(block.id);
            }
        }

        let mut dead_eggs = Vec::new();
        for egg in &mut self.eggs {
            let Some(binding) = egg.binding else {
                continue;
            };
            let p = self.physics.position(binding);
            egg.place(to_screen(p), self.physics.angle(binding).to_degrees());
            if p.y < 0.0 || egg.state == LifeState::Dead {
                dead_eggs.push(egg.id);
            }
        }

        for id in dead_birds {
            if let Some(index) = self.birds.iter().position(|b| b.id == id) {
                let mut bird = self.birds.remove(index);
                if let Some(binding) = bird.binding.take() {
                    self.physics.remove(binding);
                }
                bird.set_dead();
                self.events.push(SimEvent::BirdRemoved(id));
            }
        }
        for id in dead_pigs {
            if let Some(index) = self.pigs.iter().position(|p| p.id == id) {
                let mut pig = self.pigs.remove(index);
                if let Some(binding) = pig.binding.take() {
                    self.physics.remove(binding);
                }
                log::debug!("pig {:?} removed", id);
                self.events.push(SimEvent::PigRemoved(id));
            }
        }
        for id in dead_blocks {
            if let Some(index) = self.blocks.iter().position(|b| b.id == id) {
                let mut block = self.blocks.remove(index);
                if let Some(binding) = block.binding.take() {
                    self.physics.remove(binding);
                }
                self.events.push(SimEvent::BlockRemoved(id));
            }
        }
        for id in dead_eggs {
            if let Some(index) = self.eggs.iter().position(|e| e.id == id) {
                let mut egg = self.eggs.remove(index);
                if let Some(binding) = egg.binding.take() {
                    self.physics.remove(binding);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::BirdKind;

    const LAUNCH: Vec2 = Vec2::new(154.0, 444.0);

    fn bird(sim: &mut Simulation, name: &str) -> Bird {
        let id = sim.next_id();
        Bird::new(id, BirdKind::from_name(name).unwrap(), 130.0, 426.0, 0)
    }

    fn run(sim: &mut Simulation, frames: u64, start: u64) -> Vec<SimEvent> {
        let mut events = Vec::new();
        for frame in 0..frames {
            events.extend(sim.update(start + frame * 16, false));
        }
        events
    }

    #[test]
    fn test_collision_checks_gated_until_launch() {
        let mut sim = Simulation::new(SimConfig::default());
        assert!(!sim.collision_checks_enabled());
        // Dropped from well above the ground: would hurt if checks were on
        sim.add_pig(PigKind::Normal, 600.0, 250.0);
        run(&mut sim, 200, 0);
        assert_eq!(sim.pigs()[0].life(), 12);

        let red = bird(&mut sim, "red_bird");
        sim.launch_bird(red, 0.0, 0.0, LAUNCH);
        assert!(sim.collision_checks_enabled());
    }

    #[test]
    fn test_hard_landing_hurts_pig_once_enabled() {
        let mut sim = Simulation::new(SimConfig::default());
        sim.enable_collision_checks();
        sim.add_pig(PigKind::Big, 600.0, 200.0);
        run(&mut sim, 200, 0);
        let hurt = sim.pigs().first().is_none_or(|pig| pig.life() < 16);
        assert!(hurt);
    }

    #[test]
    fn test_block_falling_off_the_world_is_removed() {
        let mut sim = Simulation::new(SimConfig::default());
        let spec = BlockSpec::from_placement("glass", "beam", 1, 0).unwrap();
        // Past the right end of the ground line
        let id = sim.add_block(spec, 1250.0, 540.0);
        assert_eq!(sim.body_count(), 2);
        let events = run(&mut sim, 300, 0);
        assert!(events.contains(&SimEvent::BlockRemoved(id)));
        assert!(sim.blocks().is_empty());
        assert_eq!(sim.body_count(), 1);
    }

    #[test]
    fn test_bird_leaving_screen_is_removed() {
        let mut sim = Simulation::new(SimConfig::default());
        let red = bird(&mut sim, "red_bird");
        // Straight up and to the right at full pull
        let id = sim.launch_bird(red, 100.0, -0.3, LAUNCH);
        let events = run(&mut sim, 400, 0);
        assert!(events.contains(&SimEvent::BirdRemoved(id)));
        assert!(events.iter().any(|e| matches!(e, SimEvent::PathSample(_))));
        assert!(sim.birds().is_empty());
    }

    #[test]
    fn test_stalled_bird_is_removed() {
        let mut sim = Simulation::new(SimConfig::default());
        let red = bird(&mut sim, "red_bird");
        let id = sim.launch_bird(red, 0.0, 0.0, LAUNCH);
        let events = run(&mut sim, 600, 0);
        assert!(events.contains(&SimEvent::BirdRemoved(id)));
    }

    #[test]
    fn test_splitter_yields_three_birds() {
        let mut sim = Simulation::new(SimConfig::default());
        let blue = bird(&mut sim, "blue_bird");
        sim.launch_bird(blue, 90.0, -0.4, LAUNCH);
        sim.update(16, true);
        assert_eq!(sim.birds().len(), 3);
        assert!(sim.birds().iter().all(|b| b.activated));
        assert!(sim.birds().iter().all(|b| b.state == LifeState::Attacking));

        // All three keep the parent's horizontal speed
        let vx: Vec<f32> = sim
            .birds()
            .iter()
            .map(|b| sim.physics.velocity(b.binding.unwrap()).x)
            .collect();
        assert!((vx[0] - vx[1]).abs() < 1e-2);
        assert!((vx[0] - vx[2]).abs() < 1e-2);

        // Ability is spent: pressing again does nothing
        sim.update(32, true);
        assert_eq!(sim.birds().len(), 3);
    }

    #[test]
    fn test_detonator_fragments_cleared_by_timer() {
        let mut sim = Simulation::new(SimConfig::default());
        let black = bird(&mut sim, "black_bird");
        sim.launch_bird(black, 60.0, -0.6, LAUNCH);
        sim.update(100, true);
        assert_eq!(sim.fragments().len(), 12);
        sim.update(1101, false);
        assert!(sim.fragments().is_empty());
    }

    #[test]
    fn test_detonator_fragments_cleared_by_distance() {
        let mut sim = Simulation::new(SimConfig::default());
        let black = bird(&mut sim, "black_bird");
        sim.launch_bird(black, 60.0, -0.6, LAUNCH);
        sim.update(100, true);
        assert_eq!(sim.fragments().len(), 12);
        // Each frame moves a fragment 8px; well inside the timer
        for frame in 1..=12 {
            sim.update(100 + frame, false);
        }
        assert!(sim.fragments().is_empty());
    }

    #[test]
    fn test_dropper_spawns_one_egg() {
        let mut sim = Simulation::new(SimConfig::default());
        let white = bird(&mut sim, "white_bird");
        sim.launch_bird(white, 80.0, -0.5, LAUNCH);
        sim.update(16, true);
        sim.update(32, true);
        assert_eq!(sim.eggs().len(), 1);
        assert_eq!(sim.birds().len(), 1);
    }
}
