//! Difficulty modifiers
//!
//! A persisted flag set toggled from the menu. The simulation only ever reads
//! it; every multiplier is a pure function of the flags.

use serde::{Deserialize, Serialize};

/// Coin rate while immortal mode is on, regardless of any other flag
pub const IMMORTAL_COIN_MULTIPLIER: f32 = 0.33;

/// Toggleable game modifiers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Modifiers {
    /// Ship rotates and thrusts twice as fast
    pub fast_mode: bool,
    /// Lives are never lost (cheat)
    pub immortal_mode: bool,
    /// Hazards run at half speed (cheat)
    pub slow_mode: bool,
    /// Hazards run at double speed, more asteroids, more coins
    pub nightmare_mode: bool,
    /// Ship is twice as large, more coins
    pub large_mode: bool,
}

impl Modifiers {
    /// Ship rotation/thrust multiplier
    pub fn speed_multiplier(&self) -> f32 {
        if self.fast_mode { 2.0 } else { 1.0 }
    }

    /// Scale applied to the game delta handed to hazards and enemy bullets
    pub fn enemy_speed_multiplier(&self) -> f32 {
        let mut speed = 1.0;
        if self.slow_mode {
            speed *= 0.5;
        }
        if self.nightmare_mode {
            speed *= 2.0;
        }
        speed
    }

    /// Coin drop multiplier. Immortal mode overrides every other flag.
    pub fn coin_multiplier(&self) -> f32 {
        if self.immortal_mode {
            return IMMORTAL_COIN_MULTIPLIER;
        }
        let mut mult = 1.0;
        if self.slow_mode {
            mult *= 0.5;
        }
        if self.nightmare_mode {
            mult *= 3.0;
        }
        if self.large_mode {
            mult *= 1.5;
        }
        mult
    }

    /// True when a flag trivializes risk; blocks high scores and achievements
    pub fn has_cheats(&self) -> bool {
        self.immortal_mode || self.slow_mode
    }

    /// Ship collision radius and render scale
    pub fn ship_size_multiplier(&self) -> f32 {
        if self.large_mode { 2.0 } else { 1.0 }
    }

    /// Asteroid count for the opening field of a game
    pub fn opening_field_count(&self, base: u32) -> u32 {
        if self.nightmare_mode { base * 2 } else { base }
    }

    /// Asteroid count for the field spawned after a level advance
    pub fn level_field_count(&self, base: u32) -> u32 {
        if self.nightmare_mode {
            (base as f32 * 2.5).floor() as u32
        } else {
            base
        }
    }

    /// Flip a modifier by its persisted name. Returns false for unknown names.
    pub fn toggle(&mut self, name: &str) -> bool {
        let flag = match name {
            "fastMode" | "fast" => &mut self.fast_mode,
            "immortalMode" | "immortal" => &mut self.immortal_mode,
            "slowMode" | "slow" => &mut self.slow_mode,
            "nightmareMode" | "nightmare" => &mut self.nightmare_mode,
            "largeMode" | "large" => &mut self.large_mode,
            _ => return false,
        };
        *flag = !*flag;
        true
    }

    /// Union of two flag sets (used when reconciling saves)
    pub fn union(&self, other: &Modifiers) -> Modifiers {
        Modifiers {
            fast_mode: self.fast_mode || other.fast_mode,
            immortal_mode: self.immortal_mode || other.immortal_mode,
            slow_mode: self.slow_mode || other.slow_mode,
            nightmare_mode: self.nightmare_mode || other.nightmare_mode,
            large_mode: self.large_mode || other.large_mode,
        }
    }
}
