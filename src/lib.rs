//! Asteroid Blaster - a wrapped-arena arcade shooter
//!
//! Core modules:
//! - `sim`: Deterministic simulation (entities, collisions, waves, world state)
//! - `session`: Menu/countdown/playing/paused/game-over flow around the sim
//! - `driver`: Frame clock and update-then-render loop
//! - `persistence`: Save data, local stores and cloud reconciliation
//! - `achievements`: Tiered goals unlocked from lifetime stats
//! - `audio`: Sound cue mapping for an optional audio backend
//! - `input`: Control schemes turning device state into ship input

pub mod achievements;
pub mod audio;
pub mod driver;
pub mod input;
pub mod persistence;
pub mod session;
pub mod settings;
pub mod sim;

pub use persistence::SaveData;
pub use session::{GameSummary, Session, SessionPhase};
pub use settings::{ControlScheme, Settings};

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Game configuration constants
///
/// Times are in seconds, distances in arena units (pixels at zoom 1).
pub mod consts {
    /// Largest frame delta the driver will hand to the simulation
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Default arena dimensions
    pub const ARENA_WIDTH: f32 = 1280.0;
    pub const ARENA_HEIGHT: f32 = 720.0;
    /// Distance past each edge before an entity wraps to the opposite side
    pub const WRAP_MARGIN: f32 = 50.0;

    /// Ship defaults
    pub const SHIP_SIZE: f32 = 20.0;
    pub const SHIP_THRUST: f32 = 300.0;
    /// Per-frame velocity damping
    pub const SHIP_FRICTION: f32 = 0.99;
    pub const SHIP_ROTATION_SPEED: f32 = 4.0;
    pub const SHIP_INVULNERABILITY_TIME: f32 = 3.0;
    pub const SHIP_BLINK_INTERVAL: f32 = 0.1;
    pub const STARTING_LIVES: u32 = 3;

    /// Bullets
    pub const BULLET_SPEED: f32 = 500.0;
    pub const ENEMY_BULLET_SPEED_FACTOR: f32 = 0.5;
    pub const BULLET_LIFETIME: f32 = 8.0;
    pub const FIRE_RATE: f32 = 0.25;
    pub const RAPID_FIRE_RATE: f32 = 0.1;
    pub const TRIPLE_SHOT_SPREAD: f32 = 0.2;
    pub const BULLET_RADIUS: f32 = 3.0;
    pub const PIERCING_BULLET_RADIUS: f32 = 5.0;
    pub const LARGE_BULLET_RADIUS: f32 = 6.0;
    pub const LARGE_PIERCING_BULLET_RADIUS: f32 = 8.0;
    /// Distinct targets a piercing bullet may damage before it is spent
    pub const PIERCE_HIT_LIMIT: u32 = 3;

    /// Asteroids
    pub const ASTEROID_SPEED_BASE: f32 = 50.0;
    pub const ASTEROID_SPEED_PER_LEVEL: f32 = 8.0;
    pub const ASTEROID_SPEED_VARIANCE: f32 = 30.0;
    pub const INITIAL_ASTEROIDS: u32 = 4;
    /// Minimum distance between a freshly spawned asteroid and the ship
    pub const ASTEROID_SAFE_SPAWN_DISTANCE: f32 = 200.0;
    pub const EXPLOSIVE_SPLASH_RADIUS: f32 = 100.0;

    /// Powerups
    pub const POWERUP_DURATION: f32 = 12.0;
    pub const TIME_DILATION_DURATION: f32 = 10.0;
    /// Game delta scale while time dilation is active
    pub const TIME_DILATION_FACTOR: f32 = 0.4;
    pub const POWERUP_LIFETIME: f32 = 12.0;
    pub const POWERUP_RADIUS: f32 = 15.0;
    pub const POWERUP_SPAWN_CHANCE_PER_TYPE: f64 = 0.0291;

    /// Blast radius powerup splash range (added to each target's radius)
    pub const BLAST_RADIUS: f32 = 60.0;

    /// Coins
    pub const COIN_RADIUS: f32 = 12.0;
    pub const MAGNET_RANGE: f32 = 200.0;
    pub const MAGNET_FORCE: f32 = 300.0;

    /// Combo
    pub const COMBO_TIMEOUT: f32 = 2.0;
    pub const COMBO_BONUS_THRESHOLD: u32 = 3;

    /// Wave progression delays
    pub const BOSS_NOTIFICATION_TIME: f32 = 2.0;
    pub const WAVE_CLEAR_NOTIFICATION_TIME: f32 = 1.5;
    pub const LEVEL_UP_NOTIFICATION_TIME: f32 = 1.5;
    pub const CHEAT_WARNING_TIME: f32 = 4.0;
    pub const ACHIEVEMENT_NOTIFICATION_TIME: f32 = 3.0;
    pub const LEVEL_ADVANCE_DELAY: f32 = 2.5;
    pub const FIELD_RESPAWN_DELAY: f32 = 2.0;

    /// Countdown before a game starts
    pub const COUNTDOWN_START: u8 = 3;
    pub const COUNTDOWN_STEP: f32 = 1.0;
    pub const COUNTDOWN_GO_TIME: f32 = 0.5;

    /// Particle population cap
    pub const MAX_PARTICLES: usize = 512;
}

/// Rectangular play area with wrap-around edges
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Arena {
    pub width: f32,
    pub height: f32,
}

impl Default for Arena {
    fn default() -> Self {
        Self {
            width: consts::ARENA_WIDTH,
            height: consts::ARENA_HEIGHT,
        }
    }
}

impl Arena {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// Wrap a position that has strayed past the margin. Returns the new
    /// position and whether a wrap happened.
    #[inline]
    pub fn wrap(&self, pos: Vec2) -> (Vec2, bool) {
        wrap_position(pos, self.width, self.height, consts::WRAP_MARGIN)
    }
}

/// Teleport a point that left `[-margin, size + margin]` to the opposite edge
#[inline]
pub fn wrap_position(mut pos: Vec2, width: f32, height: f32, margin: f32) -> (Vec2, bool) {
    let mut wrapped = false;
    if pos.x < -margin {
        pos.x = width + margin;
        wrapped = true;
    } else if pos.x > width + margin {
        pos.x = -margin;
        wrapped = true;
    }
    if pos.y < -margin {
        pos.y = height + margin;
        wrapped = true;
    } else if pos.y > height + margin {
        pos.y = -margin;
        wrapped = true;
    }
    (pos, wrapped)
}

/// Euclidean distance between two points
#[inline]
pub fn distance(a: Vec2, b: Vec2) -> f32 {
    a.distance(b)
}

/// Uniform float in `[min, max)`, tolerating an empty range
#[inline]
pub fn random_range<R: Rng + ?Sized>(rng: &mut R, min: f32, max: f32) -> f32 {
    if max <= min {
        min
    } else {
        rng.random_range(min..max)
    }
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Unit vector pointing along `angle`
#[inline]
pub fn direction(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_wrap_left_edge() {
        let arena = Arena::new(800.0, 600.0);
        let (pos, wrapped) = arena.wrap(Vec2::new(-51.0, 300.0));
        assert!(wrapped);
        assert_eq!(pos.x, 850.0);
        assert_eq!(pos.y, 300.0);
    }

    #[test]
    fn test_wrap_inside_margin_is_noop() {
        let arena = Arena::new(800.0, 600.0);
        let (pos, wrapped) = arena.wrap(Vec2::new(-49.0, 640.0));
        assert!(!wrapped);
        assert_eq!(pos, Vec2::new(-49.0, 640.0));
    }

    #[test]
    fn test_random_range_empty() {
        use rand::SeedableRng;
        let mut rng = rand_pcg::Pcg32::seed_from_u64(1);
        assert_eq!(random_range(&mut rng, 5.0, 5.0), 5.0);
        let v = random_range(&mut rng, -1.0, 1.0);
        assert!((-1.0..1.0).contains(&v));
    }

    proptest! {
        #[test]
        fn wrapped_positions_stay_within_margin(x in -2000.0f32..2000.0, y in -2000.0f32..2000.0) {
            let arena = Arena::new(800.0, 600.0);
            // A single wrap step lands within the margin band on whichever axis moved
            let (pos, _) = arena.wrap(Vec2::new(x, y));
            let in_x = pos.x >= -WRAP && pos.x <= 800.0 + WRAP || pos.x == x;
            let in_y = pos.y >= -WRAP && pos.y <= 600.0 + WRAP || pos.y == y;
            prop_assert!(in_x && in_y);
        }

        #[test]
        fn normalize_angle_range(a in -100.0f32..100.0) {
            let n = normalize_angle(a);
            prop_assert!(n >= -std::f32::consts::PI && n < std::f32::consts::PI);
        }
    }

    const WRAP: f32 = consts::WRAP_MARGIN;
}
