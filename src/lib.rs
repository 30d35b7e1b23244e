//! Sling Siege - slingshot-versus-fortress game core
//!
//! Core modules:
//! - `sim`: Frame-driven simulation (rigid bodies, collision damage, bird abilities)
//! - `config`: Data-driven step preset and world tuning
//! - `error`: Configuration error taxonomy

pub mod config;
pub mod error;
pub mod sim;

pub use config::{SimConfig, StepPreset};
pub use error::SimError;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Screen dimensions (pixels)
    pub const SCREEN_WIDTH: f32 = 1200.0;
    pub const SCREEN_HEIGHT: f32 = 650.0;

    /// Screen y of the ground line
    pub const GROUND_HEIGHT: f32 = 550.0;
    /// Screen y that maps to world y = 0 (physics y axis points up)
    pub const WORLD_ORIGIN_Y: f32 = 600.0;

    /// Downward gravity in pixels/s²
    pub const GRAVITY: f32 = 700.0;

    /// Ground line material
    pub const GROUND_ELASTICITY: f32 = 0.95;
    pub const GROUND_FRICTION: f32 = 1.0;

    /// Impulse that maps to one point of damage; smaller impulses never hurt
    pub const MIN_DAMAGE_IMPULSE: f32 = 300.0;
    /// A bird must hit a block at least this hard to damage it
    pub const BLOCK_BIRD_DAMAGE_IMPULSE: f32 = 1100.0;
    /// Direct bird hits on pigs are amplified by this factor
    pub const PIG_BIRD_IMPULSE_TIMES: f32 = 10.0;
    /// Velocity kept by a bird after touching the ground
    pub const BIRD_GROUND_DAMPING: f32 = 0.5;
    /// Velocity kept by a pig after touching the ground
    pub const PIG_GROUND_DAMPING: f32 = 0.8;

    /// Score values
    pub const BIRD_SCORE: u64 = 10000;
    pub const PIG_SCORE: u64 = 5000;
    pub const BLOCK_SCORE: u64 = 1000;

    /// Trail sampling period while a bird is airborne (ms)
    pub const PATH_INTERVAL_MS: u64 = 50;
    /// Stall detection sampling period (ms)
    pub const STALL_INTERVAL_MS: u64 = 500;
    /// Displacement under which a sampled bird counts as stopped (pixels)
    pub const STALL_DISTANCE: f32 = 10.0;

    /// Explosion fragments
    pub const FRAGMENT_COUNT: usize = 12;
    pub const FRAGMENT_RADIUS: f32 = 4.0;
    /// Fragment launch impulse per unit of fragment mass
    pub const FRAGMENT_IMPULSE_PER_MASS: f32 = 800.0;
    /// All fragments of a batch are cleared after this long (ms)
    pub const EXPLOSION_LIFETIME_MS: u64 = 1000;

    /// Delay between level end and the level reporting done (ms)
    pub const LEVEL_OVER_DELAY_MS: u64 = 2000;

    /// Substitute for zero-length vectors and zero divisors
    pub const EPSILON: f32 = 1e-14;
}

/// Convert a physics-world position (y up) to a screen position (y down)
#[inline]
pub fn to_screen(p: Vec2) -> Vec2 {
    Vec2::new(p.x, consts::WORLD_ORIGIN_Y - p.y)
}

/// Convert a screen position (y down) to a physics-world position (y up)
#[inline]
pub fn to_world(p: Vec2) -> Vec2 {
    Vec2::new(p.x, consts::WORLD_ORIGIN_Y - p.y)
}

/// Unit vector of `v`; a zero vector is measured against an epsilon length
/// instead of dividing by zero.
#[inline]
pub fn unit_vector(v: Vec2) -> Vec2 {
    let mut h = v.length();
    if h == 0.0 {
        h = consts::EPSILON;
    }
    v / h
}

/// Euclidean distance between two points
#[inline]
pub fn distance(a: Vec2, b: Vec2) -> f32 {
    (b - a).length()
}
