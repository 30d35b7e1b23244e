//! Life and sprite-damage stages shared by pigs and blocks
//!
//! An entity with N damage images splits its starting life into N bands:
//! thresholds are `[life, life/N*(N-1), .., life/N]`. Whenever life drops
//! below the current band's threshold the image advances one step.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Durability {
    life: i32,
    image_index: usize,
    thresholds: Vec<i32>,
}

impl Durability {
    pub fn new(life: i32, image_count: usize) -> Self {
        let image_count = image_count.max(1);
        let band = life / image_count as i32;
        let thresholds = (1..=image_count as i32).rev().map(|i| band * i).collect();
        Self {
            life,
            image_index: 0,
            thresholds,
        }
    }

    pub fn life(&self) -> i32 {
        self.life
    }

    pub fn image_index(&self) -> usize {
        self.image_index
    }

    pub fn image_count(&self) -> usize {
        self.thresholds.len()
    }

    pub fn is_destroyed(&self) -> bool {
        self.life <= 0
    }

    /// Subtract `amount` from life. Returns true if the damage image advanced.
    ///
    /// The image moves at most one step per hit, however large.
    pub fn apply_damage(&mut self, amount: u32) -> bool {
        self.life = self.life.saturating_sub(amount.min(i32::MAX as u32) as i32);
        if self.life < self.thresholds[self.image_index] && self.image_index + 1 < self.image_count() {
            self.image_index += 1;
            return true;
        }
        false
    }
}
