//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Seeded RNG only
//! - Stable iteration order (insertion order, ids never reused)
//! - No rendering, audio or platform dependencies

pub mod collision;
pub mod enemy;
pub mod entities;
pub mod modifiers;
pub mod state;
pub mod tick;
pub mod timers;
pub mod waves;

pub use collision::{HitSource, Target, resolve_collisions};
pub use enemy::{Enemy, EnemyKind, EnemyProfile, get_profile};
pub use entities::{
    ActiveEffects, Asteroid, AsteroidKind, AsteroidSize, Bullet, BulletOwner, Coin, Collider, Particle, Powerup,
    PowerupKind, Ship,
};
pub use modifiers::Modifiers;
pub use state::{GameEvent, KillStats, World};
pub use tick::{TickInput, tick};
pub use timers::{Combo, Notice, NoticeChange, NoticeKind, NotificationQueue, ScreenShake};
pub use waves::{ScheduledAction, Scheduler, WaveDirector, WavePhase};
