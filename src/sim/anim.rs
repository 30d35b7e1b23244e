//! Frame timing for entity sprites
//!
//! The renderer picks images; this only tracks which frame is current and
//! when a sequence finishes, because bird and egg state transitions wait on
//! their fuse/explosion sequences completing.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

/// Normal per-frame interval (ms)
pub const FRAME_INTERVAL_MS: u64 = 100;
/// Detonator fuse frames (ms)
pub const FUSE_INTERVAL_MS: u64 = 400;
/// Explosion frames (ms)
pub const EXPLODE_INTERVAL_MS: u64 = 100;
/// Idle creatures hold their first frame this long, plus up to the same again
pub const BLINK_HOLD_MS: u64 = 2000;

#[derive(Debug, Clone)]
pub struct FrameAnimation {
    frame_count: usize,
    frame_index: usize,
    timer: u64,
    /// How long frame 0 is held before the next blink
    first_hold: u64,
    rng: Pcg32,
}

impl FrameAnimation {
    pub fn new(frame_count: usize, seed: u64) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let first_hold = BLINK_HOLD_MS + rng.random_range(0..=BLINK_HOLD_MS);
        Self {
            frame_count: frame_count.max(1),
            frame_index: 0,
            timer: 0,
            first_hold,
            rng,
        }
    }

    pub fn frame_index(&self) -> usize {
        self.frame_index
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Switch to a new sequence starting now
    pub fn restart(&mut self, frame_count: usize, now: u64) {
        self.frame_count = frame_count.max(1);
        self.frame_index = 0;
        self.timer = now;
    }

    /// Park on the last frame of the sequence
    pub fn hold_last(&mut self) {
        self.frame_index = self.frame_count - 1;
    }

    /// Interval for an idle blink cycle: long hold on frame 0, quick otherwise
    pub fn blink_interval(&self) -> u64 {
        if self.frame_index == 0 {
            self.first_hold
        } else {
            FRAME_INTERVAL_MS
        }
    }

    /// Step to the next frame once `interval` ms have passed.
    ///
    /// Returns true when the sequence ran past its last frame; the index is
    /// then back at 0 unless the caller parks it with `hold_last`.
    pub fn advance(&mut self, now: u64, interval: u64) -> bool {
        if now.saturating_sub(self.timer) <= interval {
            return false;
        }
        self.timer = now;
        self.frame_index += 1;
        if self.frame_index >= self.frame_count {
            self.frame_index = 0;
            self.first_hold = BLINK_HOLD_MS + self.rng.random_range(0..=BLINK_HOLD_MS);
            return true;
        }
        false
    }
}
