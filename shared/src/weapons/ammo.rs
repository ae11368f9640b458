//! Magazine and reserve bookkeeping.

use serde::{Deserialize, Serialize};

/// Fraction of the clip at or below which the player is prompted to reload.
pub const RELOAD_PROMPT_FRACTION: f32 = 0.3;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AmmoState {
    clip_size: u32,
    loaded: u32,
    reserve: f32,
    max_reserve: f32,
}

impl AmmoState {
    /// Full magazine and full reserve.
    pub fn new(clip_size: u32, max_reserve: f32) -> Self {
        let max_reserve = max_reserve.max(0.0);
        Self {
            clip_size,
            loaded: clip_size,
            reserve: max_reserve,
            max_reserve,
        }
    }

    /// Explicit state, clamped to the invariants.
    pub fn with_counts(clip_size: u32, loaded: u32, reserve: f32, max_reserve: f32) -> Self {
        let max_reserve = max_reserve.max(0.0);
        Self {
            clip_size,
            loaded: loaded.min(clip_size),
            reserve: reserve.clamp(0.0, max_reserve),
            max_reserve,
        }
    }

    pub fn clip_size(&self) -> u32 {
        self.clip_size
    }

    pub fn loaded(&self) -> u32 {
        self.loaded
    }

    pub fn reserve(&self) -> f32 {
        self.reserve
    }

    pub fn max_reserve(&self) -> f32 {
        self.max_reserve
    }

    pub fn missing(&self) -> u32 {
        self.clip_size - self.loaded
    }

    /// Use one loaded round. Returns false on an empty magazine.
    pub fn consume(&mut self) -> bool {
        if self.loaded == 0 {
            return false;
        }
        self.loaded -= 1;
        true
    }

    /// Whole reserve rounds available to a reload.
    fn whole_reserve(&self) -> u32 {
        self.reserve.floor().max(0.0) as u32
    }

    pub fn can_reload(&self) -> bool {
        self.missing() > 0 && self.whole_reserve() > 0
    }

    /// Move `min(reserve, clip - loaded)` rounds into the magazine.
    pub fn reload(&mut self) -> u32 {
        let grabbed = self.whole_reserve().min(self.missing());
        self.reserve -= grabbed as f32;
        self.loaded += grabbed;
        grabbed
    }

    /// Pickup from an ammo station. Returns how much was actually added.
    pub fn add_to_reserve(&mut self, amount: f32) -> f32 {
        let before = self.reserve;
        self.reserve = (self.reserve + amount).clamp(0.0, self.max_reserve);
        self.reserve - before
    }

    /// Resize after a gun/ammo change: new sizes, everything full.
    pub fn refill(&mut self, clip_size: u32, max_reserve: f32) {
        *self = Self::new(clip_size, max_reserve);
    }

    /// Nothing loaded and nothing left to load.
    pub fn is_depleted(&self) -> bool {
        self.loaded == 0 && self.whole_reserve() == 0
    }

    pub fn needs_reload_prompt(&self) -> bool {
        self.loaded as f32 <= self.clip_size as f32 * RELOAD_PROMPT_FRACTION
    }

    /// Reserve can no longer fill a whole clip.
    pub fn is_low(&self) -> bool {
        self.reserve < self.clip_size as f32
    }
}
