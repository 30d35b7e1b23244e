//! Level orchestrator
//!
//! Owns the simulation and everything around it: map setup, the sling and
//! bird queue, scoring, win/loss, trajectory trails and the draw list.
//!
//! Per frame: phase handling (aim/launch, next bird, over timer) -> queued
//! bird animation -> `Simulation::update` -> buttons -> win/loss check.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::bird::{Bird, BirdKind};
use super::block::{BlockShape, BlockSpec, Material};
use super::body::EntityId;
use super::map::{LevelMap, MapSource, StaticMaps};
use super::pig::PigKind;
use super::world::{SimEvent, Simulation};
use super::{LifeState, ScreenRect};
use crate::config::SimConfig;
use crate::consts::{
    BIRD_SCORE, BLOCK_SCORE, EPSILON, GROUND_HEIGHT, LEVEL_OVER_DELAY_MS, PIG_SCORE, SCREEN_HEIGHT,
    SCREEN_WIDTH,
};
use crate::{distance, to_screen, unit_vector};

/// Where the rope is tied; pull is measured from here
pub const SLING_ANCHOR: Vec2 = Vec2::new(135.0, 450.0);
/// Second rope anchor (front arm)
pub const SLING_FRONT_ANCHOR: Vec2 = Vec2::new(160.0, 450.0);
/// Screen point a released bird starts from
pub const LAUNCH_POINT: Vec2 = Vec2::new(154.0, 444.0);
/// Sprite corner of the bird waiting in the pouch
pub const POUCH_POSITION: Vec2 = Vec2::new(130.0, 426.0);
pub const ROPE_LENGTH: f32 = 90.0;
/// Drawn rope length at full pull
const STRETCHED_ROPE_LENGTH: f32 = 102.0;
/// Pull added below the cap
const ROPE_SLACK: f32 = 10.0;
/// Bird sprite offset from the pointer while aiming
const AIM_OFFSET: f32 = 20.0;
/// Press here to grab the sling
const SLING_AREA: ScreenRect = ScreenRect {
    min: Vec2::new(100.0, 370.0),
    size: Vec2::new(150.0, 180.0),
};

const QUEUE_START_X: f32 = 120.0;
const QUEUE_SPACING: f32 = 35.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelPhase {
    /// Aiming the next bird
    Idle,
    /// A bird is in flight
    Attack,
    /// Won or lost; done after a short delay
    Over,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ButtonKind {
    Next,
    Replay,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Button {
    pub kind: ButtonKind,
    pub rect: ScreenRect,
}

impl Button {
    fn new(kind: ButtonKind, x: f32, y: f32) -> Self {
        let size = match kind {
            ButtonKind::Next => Vec2::new(70.0, 54.0),
            ButtonKind::Replay => Vec2::new(60.0, 60.0),
        };
        Self {
            kind,
            rect: ScreenRect::new(Vec2::new(x, y), size),
        }
    }
}

/// Input for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameInput {
    /// Milliseconds since start
    pub now: u64,
    /// Pointer position (screen), if known
    pub pointer: Option<Vec2>,
    pub pressed: bool,
}

/// What to draw
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sprite {
    Background,
    Button(ButtonKind),
    Score(u64),
    /// Trail dot
    PathMarker { radius: f32 },
    SlingBack,
    SlingFront,
    Rope { from: Vec2, to: Vec2 },
    Bird {
        kind: BirdKind,
        state: LifeState,
        frame: usize,
    },
    Pig {
        kind: PigKind,
        image: usize,
        frame: usize,
    },
    Block {
        material: Material,
        shape: BlockShape,
        image: usize,
    },
    Egg { exploding: bool, frame: usize },
    Fragment,
}

/// One entry of the back-to-front draw list
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawItem {
    pub sprite: Sprite,
    pub rect: ScreenRect,
    pub angle_deg: f32,
}

impl DrawItem {
    fn new(sprite: Sprite, rect: ScreenRect) -> Self {
        Self {
            sprite,
            rect,
            angle_deg: 0.0,
        }
    }

    fn bird(bird: &Bird) -> Self {
        Self {
            sprite: Sprite::Bird {
                kind: bird.kind,
                state: bird.state,
                frame: bird.anim.frame_index(),
            },
            rect: bird.rect,
            angle_deg: bird.angle_deg,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Sling {
    grabbed: bool,
    /// Signed pull; negative when pulled to the right of the sling
    distance: f32,
    /// Pull angle from horizontal (screen space)
    angle: f32,
    /// Where the rope meets the pouch while grabbed
    rope_end: Vec2,
}

pub struct Level<M: MapSource = StaticMaps> {
    maps: M,
    config: SimConfig,
    level_num: u32,
    /// Score when the level started; replay restores it
    carried_score: u64,
    score: u64,
    phase: LevelPhase,
    sim: Simulation,
    /// Birds not launched yet, front first
    queue: Vec<Bird>,
    active: Option<EntityId>,
    sling: Sling,
    path: Vec<Vec2>,
    old_path: Vec<Vec2>,
    buttons: [Button; 2],
    prev_pressed: bool,
    over_timer: Option<u64>,
    done: bool,
    now: u64,
}

impl<M: MapSource> Level<M> {
    pub fn new(maps: M, config: SimConfig, level_num: u32) -> Self {
        let sim = Simulation::new(config.clone());
        let mut level = Self {
            maps,
            config,
            level_num,
            carried_score: 0,
            score: 0,
            phase: LevelPhase::Idle,
            sim,
            queue: Vec::new(),
            active: None,
            sling: Sling::default(),
            path: Vec::new(),
            old_path: Vec::new(),
            buttons: [
                Button::new(ButtonKind::Next, 5.0, 10.0),
                Button::new(ButtonKind::Replay, 70.0, 10.0),
            ],
            prev_pressed: false,
            over_timer: None,
            done: false,
            now: 0,
        };
        level.reset();
        level
    }

    /// Tear the world down and rebuild it from the level's map data
    pub fn reset(&mut self) {
        self.score = self.carried_score;
        self.phase = LevelPhase::Idle;
        self.sim = Simulation::new(self.config.clone());
        self.sling = Sling::default();
        self.path.clear();
        self.old_path.clear();
        self.over_timer = None;
        self.done = false;

        if self.level_num == 0 || self.level_num > self.maps.level_count() {
            log::info!("level {} not available, starting over at 1", self.level_num);
            self.level_num = 1;
        }
        let map = match self.maps.load(self.level_num) {
            Ok(map) => map,
            Err(e) => {
                log::warn!("{}; starting with an empty level", e);
                LevelMap::default()
            }
        };
        self.setup_birds(&map);
        self.setup_pigs(&map);
        self.setup_blocks(&map);
        log::info!(
            "level {} ready: {} birds, {} pigs, {} blocks",
            self.level_num,
            self.queue.len(),
            self.sim.pigs().len(),
            self.sim.blocks().len()
        );
    }

    fn setup_birds(&mut self, map: &LevelMap) {
        self.queue.clear();
        self.active = None;
        for (i, entry) in map.birds.iter().enumerate() {
            match BirdKind::from_name(&entry.kind) {
                Ok(kind) => {
                    let x = QUEUE_START_X - i as f32 * QUEUE_SPACING;
                    let id = self.sim.next_id();
                    self.queue
                        .push(Bird::new(id, kind, x, GROUND_HEIGHT, self.config.seed));
                }
                Err(e) => log::warn!("skipping bird: {}", e),
            }
        }
        self.select_bird();
    }

    fn setup_pigs(&mut self, map: &LevelMap) {
        for entry in &map.pigs {
            match PigKind::from_name(&entry.kind) {
                Ok(kind) => {
                    self.sim.add_pig(kind, entry.x, entry.y);
                }
                Err(e) => log::warn!("skipping pig: {}", e),
            }
        }
    }

    fn setup_blocks(&mut self, map: &LevelMap) {
        for entry in &map.blocks {
            match BlockSpec::from_placement(&entry.material, &entry.shape, entry.subtype, entry.direction) {
                Ok(spec) => {
                    self.sim.add_block(spec, entry.x, entry.y);
                }
                Err(e) => log::warn!("skipping block: {}", e),
            }
        }
    }

    /// Move the front of the queue into the pouch
    fn select_bird(&mut self) {
        if let Some(bird) = self.queue.first_mut() {
            bird.move_to(POUCH_POSITION);
            self.active = Some(bird.id);
        }
    }

    pub fn update(&mut self, input: FrameInput) {
        self.now = input.now;
        let fresh_press = input.pressed && !self.prev_pressed;
        self.prev_pressed = input.pressed;

        match self.phase {
            LevelPhase::Idle => self.handle_sling(&input),
            LevelPhase::Attack => {
                let active_alive = self
                    .active
                    .is_some_and(|id| self.sim.birds().iter().any(|b| b.id == id));
                if !active_alive {
                    self.active = None;
                    self.select_bird();
                    self.old_path = std::mem::take(&mut self.path);
                    self.phase = LevelPhase::Idle;
                }
            }
            LevelPhase::Over => {
                if self.over_timer.is_none() {
                    self.over_timer = Some(self.now);
                }
            }
        }

        for bird in &mut self.queue {
            bird.animate(self.now);
        }
        for event in self.sim.update(self.now, fresh_press) {
            match event {
                SimEvent::PigRemoved(_) => self.update_score(PIG_SCORE),
                SimEvent::BlockRemoved(_) => self.update_score(BLOCK_SCORE),
                SimEvent::BirdRemoved(_) => {}
                SimEvent::PathSample(p) => self.path.push(p),
            }
        }

        if fresh_press
            && let Some(pointer) = input.pointer
            && self.check_buttons(pointer)
        {
            return;
        }
        self.check_game_state();
    }

    fn handle_sling(&mut self, input: &FrameInput) {
        if !input.pressed {
            if self.sling.grabbed {
                self.sling.grabbed = false;
                self.launch();
            }
            return;
        }
        if !self.sling.grabbed
            && self.active.is_some()
            && input.pointer.is_some_and(|p| {
                p.x > SLING_AREA.min.x
                    && p.x < SLING_AREA.min.x + SLING_AREA.size.x
                    && p.y > SLING_AREA.min.y
                    && p.y < SLING_AREA.bottom()
            })
        {
            self.sling.grabbed = true;
        }
        if self.sling.grabbed
            && let Some(pointer) = input.pointer
        {
            self.aim(pointer);
        }
    }

    /// Track the pull while the sling is held
    fn aim(&mut self, pointer: Vec2) {
        let direction = unit_vector(pointer - SLING_ANCHOR);
        let mut pull = distance(SLING_ANCHOR, pointer);
        let bird_corner = if pull > ROPE_LENGTH {
            pull = ROPE_LENGTH;
            self.sling.rope_end = SLING_ANCHOR + direction * STRETCHED_ROPE_LENGTH;
            SLING_ANCHOR + direction * ROPE_LENGTH - Vec2::splat(AIM_OFFSET)
        } else {
            pull += ROPE_SLACK;
            self.sling.rope_end = SLING_ANCHOR + direction * pull;
            pointer - Vec2::splat(AIM_OFFSET)
        };
        if let Some(bird) = self.queue.first_mut() {
            bird.move_to(bird_corner);
        }

        let dy = pointer.y - SLING_ANCHOR.y;
        let mut dx = pointer.x - SLING_ANCHOR.x;
        if dx == 0.0 {
            dx = EPSILON;
        }
        self.sling.angle = (dy / dx).atan();
        self.sling.distance = if pointer.x < SLING_ANCHOR.x + 5.0 {
            pull
        } else {
            -pull
        };
    }

    fn launch(&mut self) {
        let Some(index) = self
            .active
            .and_then(|id| self.queue.iter().position(|b| b.id == id))
        else {
            return;
        };
        let bird = self.queue.remove(index);
        log::info!(
            "launching {:?} (pull {:.1}, angle {:.2})",
            bird.kind,
            self.sling.distance,
            self.sling.angle
        );
        self.sim
            .launch_bird(bird, self.sling.distance, self.sling.angle, LAUNCH_POINT);
        self.phase = LevelPhase::Attack;
    }

    /// Returns true when a button reset the level
    fn check_buttons(&mut self, pointer: Vec2) -> bool {
        let Some(kind) = self
            .buttons
            .iter()
            .find(|b| b.rect.contains(pointer))
            .map(|b| b.kind)
        else {
            return false;
        };
        match kind {
            ButtonKind::Next => {
                self.level_num += 1;
                self.reset();
            }
            ButtonKind::Replay => self.reset(),
        }
        true
    }

    fn check_game_state(&mut self) {
        if self.phase == LevelPhase::Over {
            if self
                .over_timer
                .is_some_and(|t| self.now.saturating_sub(t) > LEVEL_OVER_DELAY_MS)
            {
                self.done = true;
            }
        } else if self.is_victory() {
            self.level_num += 1;
            self.update_score(self.queue.len() as u64 * BIRD_SCORE);
            self.carried_score = self.score;
            self.phase = LevelPhase::Over;
            log::info!("victory, score {}", self.score);
        } else if self.is_loss() {
            self.phase = LevelPhase::Over;
            log::info!("out of birds, score {}", self.score);
        }
    }

    pub fn update_score(&mut self, amount: u64) {
        self.score += amount;
    }

    /// No pigs left
    pub fn is_victory(&self) -> bool {
        self.sim.pigs().is_empty()
    }

    /// No birds left in the queue or in flight
    pub fn is_loss(&self) -> bool {
        self.queue.is_empty() && self.sim.birds().is_empty()
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn level_num(&self) -> u32 {
        self.level_num
    }

    pub fn phase(&self) -> LevelPhase {
        self.phase
    }

    /// Over delay elapsed; the host should `reset` (the level number has
    /// already moved on after a victory)
    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn sim(&self) -> &Simulation {
        &self.sim
    }

    pub fn queue(&self) -> &[Bird] {
        &self.queue
    }

    pub fn active_bird(&self) -> Option<EntityId> {
        self.active
    }

    /// Trail of the shot in flight
    pub fn path(&self) -> &[Vec2] {
        &self.path
    }

    /// Trail of the previous shot
    pub fn old_path(&self) -> &[Vec2] {
        &self.old_path
    }

    /// Everything visible, back to front
    pub fn draw_list(&self) -> Vec<DrawItem> {
        let mut items = Vec::new();
        items.push(DrawItem::new(
            Sprite::Background,
            ScreenRect::new(Vec2::new(0.0, -40.0), Vec2::new(SCREEN_WIDTH, SCREEN_HEIGHT + 40.0)),
        ));
        for button in &self.buttons {
            items.push(DrawItem::new(Sprite::Button(button.kind), button.rect));
        }
        items.push(DrawItem::new(
            Sprite::Score(self.score),
            ScreenRect::new(Vec2::new(1020.0, 10.0), Vec2::new(170.0, 30.0)),
        ));

        for path in [&self.old_path, &self.path] {
            for (i, p) in path.iter().enumerate() {
                let radius = match i % 3 {
                    0 => 4.0,
                    1 => 5.0,
                    _ => 6.0,
                };
                items.push(DrawItem::new(
                    Sprite::PathMarker { radius },
                    ScreenRect::from_center(*p, Vec2::splat(radius * 2.0)),
                ));
            }
        }

        items.push(DrawItem::new(
            Sprite::SlingBack,
            ScreenRect::new(Vec2::new(138.0, 420.0), Vec2::new(70.0, 200.0)),
        ));
        if self.sling.grabbed {
            let end = self.sling.rope_end;
            items.push(DrawItem::new(
                Sprite::Rope {
                    from: SLING_FRONT_ANCHOR,
                    to: end,
                },
                ScreenRect::new(SLING_FRONT_ANCHOR.min(end), (SLING_FRONT_ANCHOR - end).abs()),
            ));
        }
        items.extend(self.queue.iter().map(DrawItem::bird));
        if self.sling.grabbed {
            let end = self.sling.rope_end;
            items.push(DrawItem::new(
                Sprite::Rope {
                    from: SLING_ANCHOR,
                    to: end,
                },
                ScreenRect::new(SLING_ANCHOR.min(end), (SLING_ANCHOR - end).abs()),
            ));
        }
        items.push(DrawItem::new(
            Sprite::SlingFront,
            ScreenRect::new(Vec2::new(120.0, 420.0), Vec2::new(60.0, 200.0)),
        ));

        items.extend(self.sim.birds().iter().map(DrawItem::bird));
        for pig in self.sim.pigs() {
            items.push(DrawItem {
                sprite: Sprite::Pig {
                    kind: pig.kind,
                    image: pig.durability.image_index(),
                    frame: pig.anim.frame_index(),
                },
                rect: pig.rect,
                angle_deg: pig.angle_deg,
            });
        }
        for block in self.sim.blocks() {
            items.push(DrawItem {
                sprite: Sprite::Block {
                    material: block.spec.material,
                    shape: block.spec.shape,
                    image: block.durability.image_index(),
                },
                rect: block.rect,
                angle_deg: block.angle_deg,
            });
        }
        for egg in self.sim.eggs() {
            items.push(DrawItem {
                sprite: Sprite::Egg {
                    exploding: egg.state != LifeState::Attacking,
                    frame: egg.anim.frame_index(),
                },
                rect: egg.rect,
                angle_deg: egg.angle_deg,
            });
        }
        for fragment in self.sim.fragments() {
            items.push(DrawItem::new(
                Sprite::Fragment,
                ScreenRect::from_center(to_screen(fragment.position), Vec2::splat(8.0)),
            ));
        }
        items
    }
}
