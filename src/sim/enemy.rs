//! Enemy archetypes
//!
//! All enemies share one type; the archetype tag selects a behavior profile
//! (tuning) and a movement pattern.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::entities::Collider;
use crate::{Arena, random_range};

/// Enemy archetypes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyKind {
    /// Cat alien: homes straight at the ship, single shots
    Pursuer,
    /// Space pirate: homes with a sideways swoop, 3-way spread in range
    Swooper,
    /// Cosmic jellyfish: homes with a looping drift, aimed shots in range
    Drifter,
}

impl EnemyKind {
    pub const ALL: [EnemyKind; 3] = [EnemyKind::Pursuer, EnemyKind::Swooper, EnemyKind::Drifter];

    pub fn as_str(&self) -> &'static str {
        match self {
            EnemyKind::Pursuer => "pursuer",
            EnemyKind::Swooper => "swooper",
            EnemyKind::Drifter => "drifter",
        }
    }

    /// Explosion color (0xRRGGBB)
    pub fn color(self) -> u32 {
        match self {
            EnemyKind::Pursuer => 0xaa88cc,
            EnemyKind::Swooper => 0xff6600,
            EnemyKind::Drifter => 0x66ffcc,
        }
    }
}

/// Per-archetype tuning
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyProfile {
    /// Collision radius
    pub radius: f32,
    /// Base health and the level divisor for extra health
    pub base_health: u32,
    pub health_level_divisor: u32,
    /// Movement speed and its per-level gain
    pub base_speed: f32,
    pub speed_per_level: f32,
    /// Shot cooldown: base, per-level reduction, floor
    pub cooldown_base: f32,
    pub cooldown_per_level: f32,
    pub cooldown_min: f32,
    /// Upper bound of the random delay added to the first shot
    pub initial_stagger: f32,
    /// Only fires when the ship is closer than this
    pub fire_range: Option<f32>,
    /// Offset outside the arena edge at spawn
    pub spawn_offset: f32,
    /// Score for a direct kill and a splash kill
    pub points: u32,
    pub splash_points: u32,
    /// Coins dropped (count, scatter) for direct and splash kills
    pub coins: (u32, f32),
    pub splash_coins: (u32, f32),
    /// Explosion particles for direct and splash kills
    pub explosion: (u32, u32),
}

impl EnemyProfile {
    pub fn health(&self, level: u32) -> u32 {
        self.base_health + level / self.health_level_divisor
    }

    pub fn speed(&self, level: u32) -> f32 {
        self.base_speed + level as f32 * self.speed_per_level
    }

    pub fn cooldown(&self, level: u32) -> f32 {
        (self.cooldown_base - level as f32 * self.cooldown_per_level).max(self.cooldown_min)
    }
}

/// Get the tuning profile for an archetype
pub fn get_profile(kind: EnemyKind) -> EnemyProfile {
    match kind {
        EnemyKind::Pursuer => EnemyProfile {
            radius: 30.0,
            base_health: 2,
            health_level_divisor: 3,
            base_speed: 30.0,
            speed_per_level: 3.0,
            cooldown_base: 3.5,
            cooldown_per_level: 0.1,
            cooldown_min: 1.5,
            initial_stagger: 2.0,
            fire_range: None,
            spawn_offset: 50.0,
            points: 500,
            splash_points: 300,
            coins: (5, 30.0),
            splash_coins: (3, 20.0),
            explosion: (25, 15),
        },
        EnemyKind::Swooper => EnemyProfile {
            radius: 25.0,
            base_health: 1,
            health_level_divisor: 4,
            base_speed: 80.0,
            speed_per_level: 5.0,
            cooldown_base: 4.0,
            cooldown_per_level: 0.15,
            cooldown_min: 2.0,
            initial_stagger: 1.0,
            fire_range: Some(400.0),
            spawn_offset: 40.0,
            points: 300,
            splash_points: 200,
            coins: (3, 20.0),
            splash_coins: (2, 15.0),
            explosion: (20, 12),
        },
        EnemyKind::Drifter => EnemyProfile {
            radius: 28.0,
            base_health: 2,
            health_level_divisor: 5,
            base_speed: 25.0,
            speed_per_level: 2.0,
            cooldown_base: 5.0,
            cooldown_per_level: 0.2,
            cooldown_min: 2.5,
            initial_stagger: 2.0,
            fire_range: Some(500.0),
            spawn_offset: 50.0,
            points: 400,
            splash_points: 250,
            coins: (4, 25.0),
            splash_coins: (2, 20.0),
            explosion: (22, 15),
        },
    }
}

const SWOOP_FREQUENCY: f32 = 3.0;
const SWOOP_AMPLITUDE: f32 = 50.0;
const SWOOPER_SPREAD: f32 = 0.2;
const DRIFT_FREQUENCY: f32 = 0.8;
const DRIFT_AMPLITUDE: f32 = 40.0;

/// A shot an enemy wants to fire this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyShot {
    pub origin: Vec2,
    pub angle: f32,
}

/// A hostile ship
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub id: u32,
    pub kind: EnemyKind,
    pub pos: Vec2,
    /// Facing toward the ship
    pub angle: f32,
    pub health: u32,
    pub max_health: u32,
    pub speed: f32,
    /// Seconds until the next shot is allowed
    pub shoot_timer: f32,
    shoot_cooldown: f32,
    /// Oscillator for swoop/drift patterns
    phase: f32,
}

impl Enemy {
    /// Spawn just outside an arena edge
    pub fn spawn<R: Rng + ?Sized>(id: u32, kind: EnemyKind, level: u32, arena: &Arena, rng: &mut R) -> Self {
        let profile = get_profile(kind);
        let pos = match kind {
            EnemyKind::Swooper => swooper_spawn_point(arena, profile.spawn_offset, rng),
            _ => edge_spawn_point(arena, profile.spawn_offset, rng),
        };
        let phase = match kind {
            EnemyKind::Drifter => random_range(rng, 0.0, std::f32::consts::TAU),
            _ => 0.0,
        };
        let cooldown = profile.cooldown(level);
        let health = profile.health(level);
        Self {
            id,
            kind,
            pos,
            angle: 0.0,
            health,
            max_health: health,
            speed: profile.speed(level),
            shoot_timer: cooldown + random_range(rng, 0.0, profile.initial_stagger),
            shoot_cooldown: cooldown,
            phase,
        }
    }

    pub fn profile(&self) -> EnemyProfile {
        get_profile(self.kind)
    }

    /// Move toward `target` and return any shots fired this frame
    pub fn update(&mut self, dt: f32, target: Vec2) -> Vec<EnemyShot> {
        let to_target = target - self.pos;
        let dist = to_target.length();
        let heading = to_target.normalize_or_zero();
        if heading != Vec2::ZERO {
            self.angle = to_target.y.atan2(to_target.x);
        }

        let drift = match self.kind {
            EnemyKind::Pursuer => Vec2::ZERO,
            EnemyKind::Swooper => {
                self.phase += SWOOP_FREQUENCY * dt;
                let perp = Vec2::new(-self.angle.sin(), self.angle.cos());
                perp * self.phase.sin() * SWOOP_AMPLITUDE
            }
            EnemyKind::Drifter => {
                self.phase += DRIFT_FREQUENCY * dt;
                Vec2::new(self.phase.cos(), (self.phase * 0.7).sin()) * DRIFT_AMPLITUDE
            }
        };
        self.pos += heading * self.speed * dt + drift * dt;

        self.shoot_timer = (self.shoot_timer - dt).max(0.0);
        if self.shoot_timer > 0.0 {
            return Vec::new();
        }
        if self.profile().fire_range.is_some_and(|range| dist >= range) {
            return Vec::new();
        }
        self.shoot_timer = self.shoot_cooldown;

        match self.kind {
            EnemyKind::Pursuer => vec![EnemyShot { origin: self.pos, angle: self.angle }],
            EnemyKind::Swooper => (-1..=1)
                .map(|i| EnemyShot {
                    origin: self.pos,
                    angle: self.angle + i as f32 * SWOOPER_SPREAD,
                })
                .collect(),
            EnemyKind::Drifter => vec![EnemyShot {
                origin: self.pos + Vec2::new(0.0, self.profile().radius),
                angle: self.angle,
            }],
        }
    }

    /// Apply one unit of damage. Returns true when destroyed.
    pub fn take_damage(&mut self) -> bool {
        self.health = self.health.saturating_sub(1);
        self.is_destroyed()
    }

    pub fn is_destroyed(&self) -> bool {
        self.health == 0
    }
}

impl Collider for Enemy {
    fn position(&self) -> Vec2 {
        self.pos
    }
    fn radius(&self) -> f32 {
        self.profile().radius
    }
}

/// Random point `offset` outside one of the four edges
fn edge_spawn_point<R: Rng + ?Sized>(arena: &Arena, offset: f32, rng: &mut R) -> Vec2 {
    match rng.random_range(0..4) {
        0 => Vec2::new(-offset, random_range(rng, 100.0, arena.height - 100.0)),
        1 => Vec2::new(arena.width + offset, random_range(rng, 100.0, arena.height - 100.0)),
        2 => Vec2::new(random_range(rng, 100.0, arena.width - 100.0), -offset),
        _ => Vec2::new(random_range(rng, 100.0, arena.width - 100.0), arena.height + offset),
    }
}

/// Swoopers enter from the left/right half the time, top/bottom otherwise
fn swooper_spawn_point<R: Rng + ?Sized>(arena: &Arena, offset: f32, rng: &mut R) -> Vec2 {
    if rng.random_bool(0.5) {
        let x = if rng.random_bool(0.5) { -offset } else { arena.width + offset };
        Vec2::new(x, random_range(rng, 50.0, arena.height - 50.0))
    } else {
        let y = if rng.random_bool(0.5) { -offset } else { arena.height + offset };
        Vec2::new(random_range(rng, 50.0, arena.width - 50.0), y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn spawn(kind: EnemyKind, level: u32) -> Enemy {
        let mut rng = Pcg32::seed_from_u64(3);
        Enemy::spawn(1, kind, level, &Arena::default(), &mut rng)
    }

    #[test]
    fn test_health_scales_with_level() {
        assert_eq!(spawn(EnemyKind::Pursuer, 1).health, 2);
        assert_eq!(spawn(EnemyKind::Pursuer, 6).health, 4);
        assert_eq!(spawn(EnemyKind::Swooper, 3).health, 1);
        assert_eq!(spawn(EnemyKind::Swooper, 8).health, 3);
        assert_eq!(spawn(EnemyKind::Drifter, 10).health, 4);
    }

    #[test]
    fn test_cooldown_floor() {
        let p = get_profile(EnemyKind::Pursuer);
        assert!((p.cooldown(1) - 3.4).abs() < 1e-5);
        assert_eq!(p.cooldown(50), 1.5);
        assert_eq!(get_profile(EnemyKind::Drifter).cooldown(100), 2.5);
    }

    #[test]
    fn test_spawns_outside_arena() {
        let arena = Arena::default();
        let mut rng = Pcg32::seed_from_u64(11);
        for i in 0..50 {
            for kind in EnemyKind::ALL {
                let e = Enemy::spawn(i, kind, 1, &arena, &mut rng);
                let outside = e.pos.x < 0.0 || e.pos.x > arena.width || e.pos.y < 0.0 || e.pos.y > arena.height;
                assert!(outside, "{kind:?} spawned inside at {:?}", e.pos);
            }
        }
    }

    #[test]
    fn test_pursuer_homes_and_fires_after_cooldown() {
        let mut enemy = spawn(EnemyKind::Pursuer, 1);
        enemy.pos = Vec2::new(0.0, 0.0);
        let first_wait = enemy.shoot_timer;
        let shots = enemy.update(0.1, Vec2::new(100.0, 0.0));
        assert!(shots.is_empty());
        assert!(enemy.pos.x > 0.0);
        assert_eq!(enemy.pos.y, 0.0);

        let shots = enemy.update(first_wait, Vec2::new(100.0, 0.0));
        assert_eq!(shots.len(), 1);
        assert!((enemy.shoot_timer - get_profile(EnemyKind::Pursuer).cooldown(1)).abs() < 1e-5);
    }

    #[test]
    fn test_swooper_holds_fire_out_of_range() {
        let mut enemy = spawn(EnemyKind::Swooper, 1);
        enemy.pos = Vec2::ZERO;
        enemy.shoot_timer = 0.0;
        assert!(enemy.update(0.01, Vec2::new(1000.0, 0.0)).is_empty());
        // Cooldown stays ready so it fires as soon as the ship is close
        let shots = enemy.update(0.01, enemy.pos + Vec2::new(100.0, 0.0));
        assert_eq!(shots.len(), 3);
    }

    #[test]
    fn test_drifter_shot_origin_below_body() {
        let mut enemy = spawn(EnemyKind::Drifter, 4);
        enemy.shoot_timer = 0.0;
        let target = enemy.pos + Vec2::new(50.0, 0.0);
        let shots = enemy.update(0.0, target);
        assert_eq!(shots.len(), 1);
        assert_eq!(shots[0].origin, enemy.pos + Vec2::new(0.0, 28.0));
    }

    #[test]
    fn test_homing_at_zero_distance_is_stable() {
        let mut enemy = spawn(EnemyKind::Pursuer, 1);
        let pos = enemy.pos;
        enemy.update(0.1, pos);
        assert!(enemy.pos.is_finite());
    }

    #[test]
    fn test_take_damage() {
        let mut enemy = spawn(EnemyKind::Swooper, 1);
        assert!(enemy.take_damage());
        assert!(enemy.is_destroyed());
        // Further damage saturates
        assert!(enemy.take_damage());
    }
}
