//! Entity models
//!
//! Plain data plus per-frame behavior for everything that lives in the arena
//! except enemies (see `enemy`). Every entity that takes part in collision
//! tests implements [`Collider`].

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::modifiers::Modifiers;
use super::tick::TickInput;
use crate::consts::*;
use crate::{Arena, direction, random_range};

/// Position + radius capability used by every circle test
pub trait Collider {
    fn position(&self) -> Vec2;
    fn radius(&self) -> f32;

    /// Circle overlap test against another collider
    fn overlaps(&self, other: &dyn Collider) -> bool {
        circles_overlap(self.position(), self.radius(), other.position(), other.radius())
    }
}

/// Strict circle overlap (touching circles do not collide)
#[inline]
pub fn circles_overlap(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    a.distance_squared(b) < (ra + rb) * (ra + rb)
}

// ============================================================================
// Powerups
// ============================================================================

/// Power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerupKind {
    Shield,
    RapidFire,
    Magnet,
    TimeDilation,
    Piercing,
    TripleShot,
    LargeBullets,
    BlastRadius,
}

impl PowerupKind {
    pub const ALL: [PowerupKind; 8] = [
        PowerupKind::Shield,
        PowerupKind::RapidFire,
        PowerupKind::Magnet,
        PowerupKind::TimeDilation,
        PowerupKind::Piercing,
        PowerupKind::TripleShot,
        PowerupKind::LargeBullets,
        PowerupKind::BlastRadius,
    ];

    /// Duration granted by one pickup
    pub fn duration(self) -> f32 {
        match self {
            PowerupKind::TimeDilation => TIME_DILATION_DURATION,
            _ => POWERUP_DURATION,
        }
    }

    fn index(self) -> usize {
        self as usize
    }

    /// Pickup color (0xRRGGBB)
    pub fn color(self) -> u32 {
        match self {
            PowerupKind::Shield => 0x00aaff,
            PowerupKind::RapidFire => 0xffaa00,
            PowerupKind::Magnet => 0xff00ff,
            PowerupKind::TimeDilation => 0x88ff88,
            PowerupKind::Piercing => 0xff4444,
            PowerupKind::TripleShot => 0x00ffaa,
            PowerupKind::LargeBullets => 0xffff00,
            PowerupKind::BlastRadius => 0xff6600,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PowerupKind::Shield => "shield",
            PowerupKind::RapidFire => "rapidfire",
            PowerupKind::Magnet => "magnet",
            PowerupKind::TimeDilation => "timeslow",
            PowerupKind::Piercing => "piercing",
            PowerupKind::TripleShot => "tripleshot",
            PowerupKind::LargeBullets => "largebullets",
            PowerupKind::BlastRadius => "blastradius",
        }
    }
}

/// Remaining duration for each power-up (0 = inactive)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActiveEffects {
    remaining: [f32; 8],
}

impl ActiveEffects {
    pub fn is_active(&self, kind: PowerupKind) -> bool {
        self.remaining[kind.index()] > 0.0
    }

    pub fn remaining(&self, kind: PowerupKind) -> f32 {
        self.remaining[kind.index()]
    }

    /// Activate a power-up. Re-activating while active stacks additively.
    pub fn activate(&mut self, kind: PowerupKind) {
        let slot = &mut self.remaining[kind.index()];
        if *slot > 0.0 {
            *slot += kind.duration();
        } else {
            *slot = kind.duration();
        }
    }

    /// Set a remaining duration directly (0 clears)
    pub fn set_remaining(&mut self, kind: PowerupKind, secs: f32) {
        self.remaining[kind.index()] = secs.max(0.0);
    }

    /// Count every active timer down independently
    pub fn tick(&mut self, dt: f32) {
        for slot in self.remaining.iter_mut().filter(|t| **t > 0.0) {
            *slot = (*slot - dt).max(0.0);
        }
    }

    pub fn active_kinds(&self) -> impl Iterator<Item = PowerupKind> + '_ {
        PowerupKind::ALL.into_iter().filter(|k| self.is_active(*k))
    }
}

// ============================================================================
// Ship
// ============================================================================

/// One bullet the ship wants to fire this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShotParams {
    pub origin: Vec2,
    pub angle: f32,
    pub piercing: bool,
    pub large: bool,
    pub blast: bool,
}

/// The player's ship
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ship {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Facing angle (radians, 0 = +x, -π/2 = up on screen)
    pub angle: f32,
    pub thrusting: bool,
    /// Seconds of spawn protection left
    pub invulnerable_time: f32,
    pub visible: bool,
    blink_timer: f32,
    /// Clock time of the last shot
    last_fire_at: Option<f32>,
    pub effects: ActiveEffects,
    /// Collision radius including the size modifier
    radius: f32,
}

impl Ship {
    pub fn new(arena: &Arena, modifiers: &Modifiers) -> Self {
        Self {
            pos: arena.center(),
            vel: Vec2::ZERO,
            angle: -std::f32::consts::FRAC_PI_2,
            thrusting: false,
            invulnerable_time: SHIP_INVULNERABILITY_TIME,
            visible: true,
            blink_timer: 0.0,
            last_fire_at: None,
            effects: ActiveEffects::default(),
            radius: SHIP_SIZE * modifiers.ship_size_multiplier(),
        }
    }

    /// Put the ship back at the center after a death. Power-ups survive.
    pub fn reset_position(&mut self, arena: &Arena) {
        self.pos = arena.center();
        self.vel = Vec2::ZERO;
        self.angle = -std::f32::consts::FRAC_PI_2;
        self.thrusting = false;
        self.last_fire_at = None;
        self.invulnerable_time = SHIP_INVULNERABILITY_TIME;
        self.visible = true;
        self.blink_timer = 0.0;
    }

    pub fn is_invulnerable(&self) -> bool {
        self.invulnerable_time > 0.0
    }

    pub fn has(&self, kind: PowerupKind) -> bool {
        self.effects.is_active(kind)
    }

    /// Whether hazards can currently hurt the ship
    pub fn is_vulnerable(&self) -> bool {
        !self.is_invulnerable() && !self.has(PowerupKind::Shield)
    }

    /// Collision test against a hazard; always false while protected
    pub fn is_colliding_with(&self, other: &dyn Collider) -> bool {
        self.is_vulnerable() && self.overlaps(other)
    }

    /// Scale for hazard/enemy-bullet updates this frame
    pub fn time_scale(&self) -> f32 {
        if self.has(PowerupKind::TimeDilation) {
            TIME_DILATION_FACTOR
        } else {
            1.0
        }
    }

    /// Advance timers and movement. Returns the game delta for non-player
    /// entities (before the difficulty multiplier).
    pub fn update(&mut self, input: &TickInput, dt: f32, modifiers: &Modifiers, arena: &Arena) -> f32 {
        // Sampled before timers tick so dilation covers its final frame
        let game_dt = dt * self.time_scale();

        if self.invulnerable_time > 0.0 {
            self.invulnerable_time -= dt;
            self.blink_timer += dt;
            self.visible = (self.blink_timer / SHIP_BLINK_INTERVAL).floor() as i64 % 2 == 0;
            if self.invulnerable_time <= 0.0 {
                self.invulnerable_time = 0.0;
                self.visible = true;
            }
        }

        self.effects.tick(dt);

        let speed_mult = modifiers.speed_multiplier();

        // Aim overrides keyboard rotation (mouse schemes)
        if let Some(aim) = input.aim_angle {
            self.angle = aim;
        } else {
            if input.turn_left {
                self.angle -= SHIP_ROTATION_SPEED * dt * speed_mult;
            }
            if input.turn_right {
                self.angle += SHIP_ROTATION_SPEED * dt * speed_mult;
            }
        }

        // Movement direction (mouse-aim) thrusts independently of facing
        let move_dir = input.move_dir.map(|d| d.normalize_or_zero()).filter(|d| *d != Vec2::ZERO);
        self.thrusting = input.thrust || move_dir.is_some();
        if self.thrusting {
            let thrust_dir = move_dir.unwrap_or_else(|| direction(self.angle));
            self.vel += thrust_dir * SHIP_THRUST * dt * speed_mult;
        }

        self.vel *= SHIP_FRICTION;
        self.pos += self.vel * dt;
        self.pos = arena.wrap(self.pos).0;

        game_dt
    }

    /// Current cooldown between shots
    pub fn fire_rate(&self) -> f32 {
        if self.has(PowerupKind::RapidFire) {
            RAPID_FIRE_RATE
        } else {
            FIRE_RATE
        }
    }

    pub fn can_fire(&self, now: f32) -> bool {
        self.last_fire_at.is_none_or(|last| now - last > self.fire_rate())
    }

    /// Fire if the cooldown allows. Flags are captured now, not later.
    pub fn fire(&mut self, now: f32) -> Vec<ShotParams> {
        if !self.can_fire(now) {
            return Vec::new();
        }
        self.last_fire_at = Some(now);

        let origin = self.pos + direction(self.angle) * SHIP_SIZE;
        let template = ShotParams {
            origin,
            angle: self.angle,
            piercing: self.has(PowerupKind::Piercing),
            large: self.has(PowerupKind::LargeBullets),
            blast: self.has(PowerupKind::BlastRadius),
        };

        let mut shots = vec![template];
        if self.has(PowerupKind::TripleShot) {
            shots.push(ShotParams { angle: self.angle - TRIPLE_SHOT_SPREAD, ..template });
            shots.push(ShotParams { angle: self.angle + TRIPLE_SHOT_SPREAD, ..template });
        }
        shots
    }
}

impl Collider for Ship {
    fn position(&self) -> Vec2 {
        self.pos
    }
    fn radius(&self) -> f32 {
        self.radius
    }
}

// ============================================================================
// Bullets
// ============================================================================

/// Who fired a bullet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BulletOwner {
    Player,
    Enemy,
}

/// A projectile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bullet {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub owner: BulletOwner,
    pub piercing: bool,
    pub large: bool,
    pub blast: bool,
    pub radius: f32,
    /// Seconds of flight left
    pub life: f32,
    pub wrap_count: u32,
    pub hit_count: u32,
    /// Targets already damaged (piercing bullets never hit the same one twice)
    pub hit_ids: Vec<u32>,
    expired: bool,
}

impl Bullet {
    pub fn player(id: u32, shot: &ShotParams) -> Self {
        let radius = match (shot.large, shot.piercing) {
            (true, true) => LARGE_PIERCING_BULLET_RADIUS,
            (true, false) => LARGE_BULLET_RADIUS,
            (false, true) => PIERCING_BULLET_RADIUS,
            (false, false) => BULLET_RADIUS,
        };
        Self {
            id,
            pos: shot.origin,
            vel: direction(shot.angle) * BULLET_SPEED,
            owner: BulletOwner::Player,
            piercing: shot.piercing,
            large: shot.large,
            blast: shot.blast,
            radius,
            life: BULLET_LIFETIME,
            wrap_count: 0,
            hit_count: 0,
            hit_ids: Vec::new(),
            expired: false,
        }
    }

    pub fn enemy(id: u32, origin: Vec2, angle: f32) -> Self {
        Self {
            id,
            pos: origin,
            vel: direction(angle) * BULLET_SPEED * ENEMY_BULLET_SPEED_FACTOR,
            owner: BulletOwner::Enemy,
            piercing: false,
            large: false,
            blast: false,
            radius: BULLET_RADIUS,
            life: BULLET_LIFETIME,
            wrap_count: 0,
            hit_count: 0,
            hit_ids: Vec::new(),
            expired: false,
        }
    }

    /// Move, age and wrap. A second wrap expires the bullet.
    pub fn update(&mut self, dt: f32, arena: &Arena) {
        if self.expired {
            return;
        }
        self.pos += self.vel * dt;
        self.life -= dt;

        let (pos, wrapped) = arena.wrap(self.pos);
        self.pos = pos;
        if wrapped {
            self.wrap_count += 1;
            if self.wrap_count >= 2 {
                self.expired = true;
            }
        }
    }

    /// Record a resolved hit on `target_id`
    pub fn register_hit(&mut self, target_id: u32) {
        self.hit_count += 1;
        self.hit_ids.push(target_id);
    }

    pub fn has_hit(&self, target_id: u32) -> bool {
        self.hit_ids.contains(&target_id)
    }

    /// True once the bullet has nothing left to do after a hit
    pub fn is_spent(&self) -> bool {
        if self.piercing {
            self.hit_count >= PIERCE_HIT_LIMIT
        } else {
            self.hit_count >= 1
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expired || self.life <= 0.0 || (self.hit_count > 0 && self.is_spent())
    }

    /// Expired by a second wrap (as opposed to age or hits)
    pub fn wrapped_out(&self) -> bool {
        self.expired
    }
}

impl Collider for Bullet {
    fn position(&self) -> Vec2 {
        self.pos
    }
    fn radius(&self) -> f32 {
        self.radius
    }
}

// ============================================================================
// Asteroids
// ============================================================================

/// Asteroid categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AsteroidKind {
    Normal,
    Ice,
    Explosive,
    Metal,
}

impl AsteroidKind {
    /// Spawn weights (normal, ice, explosive, metal)
    const WEIGHTS: [(AsteroidKind, u32); 4] = [
        (AsteroidKind::Normal, 50),
        (AsteroidKind::Ice, 20),
        (AsteroidKind::Explosive, 15),
        (AsteroidKind::Metal, 15),
    ];

    /// Draw a category from the weighted table
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let total: u32 = Self::WEIGHTS.iter().map(|(_, w)| w).sum();
        let mut roll = rng.random_range(0..total);
        for (kind, weight) in Self::WEIGHTS {
            if roll < weight {
                return kind;
            }
            roll -= weight;
        }
        AsteroidKind::Normal
    }

    pub fn hit_points(self) -> u8 {
        match self {
            AsteroidKind::Metal => 2,
            _ => 1,
        }
    }

    /// Explosion color (0xRRGGBB)
    pub fn color(self) -> u32 {
        match self {
            AsteroidKind::Normal => 0x8b7355,
            AsteroidKind::Ice => 0x88ddff,
            AsteroidKind::Explosive => 0xff6633,
            AsteroidKind::Metal => 0xaaaaaa,
        }
    }
}

/// Asteroid size tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AsteroidSize {
    Large,
    Medium,
    Small,
}

impl AsteroidSize {
    pub fn radius(self) -> f32 {
        match self {
            AsteroidSize::Large => 50.0,
            AsteroidSize::Medium => 30.0,
            AsteroidSize::Small => 15.0,
        }
    }

    pub fn points(self) -> u32 {
        match self {
            AsteroidSize::Large => 20,
            AsteroidSize::Medium => 50,
            AsteroidSize::Small => 100,
        }
    }

    /// Tier spawned when this one breaks
    pub fn child(self) -> Option<AsteroidSize> {
        match self {
            AsteroidSize::Large => Some(AsteroidSize::Medium),
            AsteroidSize::Medium => Some(AsteroidSize::Small),
            AsteroidSize::Small => None,
        }
    }
}

/// An asteroid entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asteroid {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub rotation: f32,
    pub rotation_speed: f32,
    pub kind: AsteroidKind,
    pub size: AsteroidSize,
    pub hp: u8,
    pub points: u32,
}

impl Asteroid {
    pub fn new<R: Rng + ?Sized>(
        id: u32,
        pos: Vec2,
        size: AsteroidSize,
        kind: AsteroidKind,
        level: u32,
        rng: &mut R,
    ) -> Self {
        let speed = ASTEROID_SPEED_BASE
            + level as f32 * ASTEROID_SPEED_PER_LEVEL
            + random_range(rng, -ASTEROID_SPEED_VARIANCE, ASTEROID_SPEED_VARIANCE);
        let heading = random_range(rng, 0.0, std::f32::consts::TAU);
        let base_points = size.points();
        // Special types are worth half again as much
        let points = if kind == AsteroidKind::Normal {
            base_points
        } else {
            (base_points as f32 * 1.5).floor() as u32
        };
        Self {
            id,
            pos,
            vel: direction(heading) * speed,
            rotation: 0.0,
            rotation_speed: random_range(rng, -2.0, 2.0),
            kind,
            size,
            hp: kind.hit_points(),
            points,
        }
    }

    pub fn update(&mut self, dt: f32, arena: &Arena) {
        self.pos += self.vel * dt;
        self.rotation += self.rotation_speed * dt;
        self.pos = arena.wrap(self.pos).0;
    }

    /// Apply one unit of damage. Returns true when destroyed.
    pub fn hit(&mut self) -> bool {
        self.hp = self.hp.saturating_sub(1);
        self.is_destroyed()
    }

    /// Splash from a neighbouring explosive. Never destroys: the asteroid is
    /// left one hit from breaking instead.
    pub fn chip(&mut self) {
        if self.hp > 1 {
            self.hp -= 1;
        }
    }

    pub fn is_destroyed(&self) -> bool {
        self.hp == 0
    }
}

impl Collider for Asteroid {
    fn position(&self) -> Vec2 {
        self.pos
    }
    fn radius(&self) -> f32 {
        self.size.radius()
    }
}

// ============================================================================
// Pickups and particles
// ============================================================================

/// A coin dropped by a destroyed hazard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coin {
    pub id: u32,
    pub pos: Vec2,
    pub value: u32,
    pub rotation: f32,
}

impl Coin {
    /// Spin, and drift toward the ship while its magnet is active
    pub fn update(&mut self, dt: f32, ship_pos: Vec2, magnet: bool) {
        self.rotation += 3.0 * dt;
        if !magnet {
            return;
        }
        let to_ship = ship_pos - self.pos;
        let dist = to_ship.length();
        if dist > 0.0 && dist < MAGNET_RANGE {
            let force = (MAGNET_RANGE - dist) / MAGNET_RANGE * MAGNET_FORCE;
            self.pos += to_ship / dist * force * dt;
        }
    }
}

impl Collider for Coin {
    fn position(&self) -> Vec2 {
        self.pos
    }
    fn radius(&self) -> f32 {
        COIN_RADIUS
    }
}

/// A power-up pickup floating in the arena
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Powerup {
    pub id: u32,
    pub kind: PowerupKind,
    pub pos: Vec2,
    /// Seconds before it disappears uncollected
    pub life: f32,
}

impl Powerup {
    pub fn new(id: u32, kind: PowerupKind, pos: Vec2) -> Self {
        Self {
            id,
            kind,
            pos,
            life: POWERUP_LIFETIME,
        }
    }

    pub fn update(&mut self, dt: f32) {
        self.life -= dt;
    }

    pub fn is_expired(&self) -> bool {
        self.life <= 0.0
    }
}

impl Collider for Powerup {
    fn position(&self) -> Vec2 {
        self.pos
    }
    fn radius(&self) -> f32 {
        POWERUP_RADIUS
    }
}

/// A particle for visual effects
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub color: u32,
    /// Seconds left
    pub life: f32,
    pub max_life: f32,
    pub size: f32,
}

impl Particle {
    pub fn update(&mut self, dt: f32) {
        self.pos += self.vel * dt;
        self.vel *= 0.98;
        self.life -= dt;
    }

    pub fn is_expired(&self) -> bool {
        self.life <= 0.0
    }

    /// Fade factor for rendering (1 = fresh, 0 = gone)
    pub fn alpha(&self) -> f32 {
        if self.max_life > 0.0 {
            (self.life / self.max_life).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}
