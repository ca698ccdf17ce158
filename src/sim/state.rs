//! World state and spawn functions
//!
//! Everything one game needs lives in [`World`]; there are no globals. All
//! randomness goes through the world's seeded RNG so a seed plus an input
//! sequence replays exactly.

use glam::Vec2;
use log::{debug, info};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::enemy::{Enemy, EnemyKind};
use super::entities::{Asteroid, AsteroidKind, AsteroidSize, Bullet, Coin, Particle, Powerup, PowerupKind, Ship};
use super::modifiers::Modifiers;
use super::timers::{Combo, Notice, NoticeKind, ScreenShake};
use super::waves::{WaveDirector, field_size};
use crate::consts::*;
use crate::{Arena, direction, random_range};

/// Something that happened during a tick. Drained by the session for audio,
/// achievements and rendering cues.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    PlayerShot,
    EnemyShot,
    Explosion { pos: Vec2, color: u32, particles: u32 },
    /// A target took damage but survived
    TargetDamaged { pos: Vec2 },
    AsteroidDestroyed { kind: AsteroidKind, size: AsteroidSize },
    EnemyDestroyed(EnemyKind),
    CoinCollected(u32),
    PowerupCollected(PowerupKind),
    /// Lives left after the hit
    LifeLost(u32),
    /// Hit absorbed by immortal mode
    ImmortalHit,
    BossWave,
    WaveCleared,
    LevelAdvanced(u32),
    ComboMilestone(u32),
    GameOver,
}

/// Per-category kill counters for the current game
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KillStats {
    pub asteroids: u32,
    pub pursuers: u32,
    pub swoopers: u32,
    pub drifters: u32,
}

impl KillStats {
    /// Every enemy archetype combined
    pub fn aliens(&self) -> u32 {
        self.pursuers + self.swoopers + self.drifters
    }

    pub fn record_enemy(&mut self, kind: EnemyKind) {
        match kind {
            EnemyKind::Pursuer => self.pursuers += 1,
            EnemyKind::Swooper => self.swoopers += 1,
            EnemyKind::Drifter => self.drifters += 1,
        }
    }
}

/// Number of coins a single drop produces under a coin multiplier
pub fn coin_drop_count<R: Rng + ?Sized>(multiplier: f32, rng: &mut R) -> u32 {
    if multiplier <= 1.0 {
        u32::from(rng.random::<f32>() < multiplier)
    } else {
        let whole = multiplier.floor();
        let extra = rng.random::<f32>() < multiplier - whole;
        whole as u32 + u32::from(extra)
    }
}

/// Complete state of one game
#[derive(Debug, Clone)]
pub struct World {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub arena: Arena,
    /// Snapshot of the modifier flags the game was started with
    pub modifiers: Modifiers,
    pub score: u64,
    /// Current level (1-based)
    pub level: u32,
    pub lives: u32,
    pub coins_this_game: u32,
    pub kills: KillStats,
    pub combo: Combo,
    pub shake: ScreenShake,
    pub waves: WaveDirector,
    /// Seconds of play elapsed (frozen while paused)
    pub clock: f32,
    pub ship: Ship,
    /// Player bullets (ordered by id)
    pub bullets: Vec<Bullet>,
    pub enemy_bullets: Vec<Bullet>,
    pub asteroids: Vec<Asteroid>,
    pub enemies: Vec<Enemy>,
    pub coins: Vec<Coin>,
    pub powerups: Vec<Powerup>,
    /// Visual particles (not gameplay-affecting)
    pub particles: Vec<Particle>,
    pub game_over: bool,
    events: Vec<GameEvent>,
    notices: Vec<Notice>,
    next_id: u32,
}

impl World {
    /// Start a new game in the default arena
    pub fn new(seed: u64, modifiers: Modifiers) -> Self {
        Self::with_arena(seed, modifiers, Arena::default())
    }

    pub fn with_arena(seed: u64, modifiers: Modifiers, arena: Arena) -> Self {
        let mut world = Self::empty(seed, modifiers, arena);
        world.spawn_opening_field();
        info!(
            "New game: seed={seed}, {} asteroids, cheats={}",
            world.asteroids.len(),
            modifiers.has_cheats()
        );
        world
    }

    /// World with a ship but no hazards. Scenario setups start from here.
    pub fn empty(seed: u64, modifiers: Modifiers, arena: Arena) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            arena,
            modifiers,
            score: 0,
            level: 1,
            lives: STARTING_LIVES,
            coins_this_game: 0,
            kills: KillStats::default(),
            combo: Combo::default(),
            shake: ScreenShake::default(),
            waves: WaveDirector::default(),
            clock: 0.0,
            ship: Ship::new(&arena, &modifiers),
            bullets: Vec::new(),
            enemy_bullets: Vec::new(),
            asteroids: Vec::new(),
            enemies: Vec::new(),
            coins: Vec::new(),
            powerups: Vec::new(),
            particles: Vec::new(),
            game_over: false,
            events: Vec::new(),
            notices: Vec::new(),
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Events since the last drain
    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn notify(&mut self, kind: NoticeKind, duration: f32) {
        self.notices.push(Notice::new(kind, duration));
    }

    /// Notifications queued by the simulation since the last drain
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn enemy_count(&self) -> usize {
        self.enemies.len()
    }

    /// Combined slow/nightmare scale for hazards
    pub fn enemy_speed_multiplier(&self) -> f32 {
        self.modifiers.enemy_speed_multiplier()
    }

    // ------------------------------------------------------------------------
    // Spawning
    // ------------------------------------------------------------------------

    pub fn spawn_opening_field(&mut self) {
        let count = self.modifiers.opening_field_count(INITIAL_ASTEROIDS);
        self.spawn_field(count);
    }

    /// Spawn `count` large asteroids away from the ship
    pub fn spawn_field(&mut self, count: u32) {
        for _ in 0..count {
            let pos = self.safe_spawn_point();
            let kind = AsteroidKind::random(&mut self.rng);
            self.spawn_asteroid(pos, AsteroidSize::Large, kind);
        }
        debug!("Spawned field of {count} at level {}", self.level);
    }

    /// Random point at least the safe distance from the ship. Gives up after a
    /// bounded number of tries (tiny arenas) and uses the last candidate.
    fn safe_spawn_point(&mut self) -> Vec2 {
        let mut pos = Vec2::ZERO;
        for _ in 0..64 {
            pos = Vec2::new(
                random_range(&mut self.rng, 0.0, self.arena.width),
                random_range(&mut self.rng, 0.0, self.arena.height),
            );
            if pos.distance(self.ship.pos) >= ASTEROID_SAFE_SPAWN_DISTANCE {
                break;
            }
        }
        pos
    }

    pub fn spawn_asteroid(&mut self, pos: Vec2, size: AsteroidSize, kind: AsteroidKind) -> u32 {
        let id = self.next_entity_id();
        let asteroid = Asteroid::new(id, pos, size, kind, self.level, &mut self.rng);
        self.asteroids.push(asteroid);
        id
    }

    pub fn spawn_enemy(&mut self, kind: EnemyKind) -> u32 {
        let id = self.next_entity_id();
        let enemy = Enemy::spawn(id, kind, self.level, &self.arena, &mut self.rng);
        debug!("Enemy {id} ({}) at {:?}", kind.as_str(), enemy.pos);
        self.enemies.push(enemy);
        id
    }

    /// One coin drop through the coin policy
    pub fn drop_coins(&mut self, pos: Vec2) {
        let mult = self.modifiers.coin_multiplier();
        let count = coin_drop_count(mult, &mut self.rng);
        for _ in 0..count {
            let offset = if mult > 1.0 {
                Vec2::new(random_range(&mut self.rng, -10.0, 10.0), random_range(&mut self.rng, -10.0, 10.0))
            } else {
                Vec2::ZERO
            };
            let id = self.next_entity_id();
            let value = self.rng.random_range(1..=3);
            self.coins.push(Coin {
                id,
                pos: pos + offset,
                value,
                rotation: 0.0,
            });
        }
    }

    /// Several coin drops scattered around `pos`
    pub fn scatter_coins(&mut self, pos: Vec2, drops: u32, spread: f32) {
        for _ in 0..drops {
            let offset = Vec2::new(
                random_range(&mut self.rng, -spread, spread),
                random_range(&mut self.rng, -spread, spread),
            );
            self.drop_coins(pos + offset);
        }
    }

    /// Independent drop roll for every power-up type
    pub fn roll_powerups(&mut self, pos: Vec2) {
        for kind in PowerupKind::ALL {
            if self.rng.random_bool(POWERUP_SPAWN_CHANCE_PER_TYPE) {
                let offset = Vec2::new(
                    random_range(&mut self.rng, -20.0, 20.0),
                    random_range(&mut self.rng, -20.0, 20.0),
                );
                let id = self.next_entity_id();
                self.powerups.push(Powerup::new(id, kind, pos + offset));
            }
        }
    }

    /// Particle burst plus a proportional screen shake
    pub fn explode(&mut self, pos: Vec2, color: u32, count: u32) {
        for _ in 0..count {
            let angle = random_range(&mut self.rng, 0.0, std::f32::consts::TAU);
            let speed = random_range(&mut self.rng, 50.0, 200.0);
            let life = random_range(&mut self.rng, 0.5, 1.5);
            let size = random_range(&mut self.rng, 2.0, 6.0);
            self.push_particle(Particle {
                pos,
                vel: direction(angle) * speed,
                color,
                life,
                max_life: life,
                size,
            });
        }
        self.shake.trigger((count as f32 / 5.0).min(8.0), 0.2);
        self.emit(GameEvent::Explosion { pos, color, particles: count });
    }

    /// Ring of particles marking a blast-radius detonation
    pub fn blast_ring(&mut self, pos: Vec2) {
        for i in 0..12 {
            let angle = i as f32 / 12.0 * std::f32::consts::TAU;
            let dir = direction(angle);
            self.push_particle(Particle {
                pos: pos + dir * BLAST_RADIUS * 0.5,
                vel: dir * 80.0,
                color: 0xff6600,
                life: 0.3,
                max_life: 0.3,
                size: 3.0,
            });
        }
        self.shake.trigger(4.0, 0.15);
    }

    /// Exhaust puff behind a thrusting ship
    pub fn thrust_particle(&mut self) {
        let back = direction(self.ship.angle + std::f32::consts::PI);
        let spread = random_range(&mut self.rng, -0.5, 0.5);
        let life = random_range(&mut self.rng, 0.2, 0.4);
        let pos = self.ship.pos + back * SHIP_SIZE * 0.6;
        let vel = direction(self.ship.angle + std::f32::consts::PI + spread) * random_range(&mut self.rng, 50.0, 150.0);
        let size = random_range(&mut self.rng, 2.0, 4.0);
        self.push_particle(Particle {
            pos,
            vel,
            color: 0xff8800,
            life,
            max_life: life,
            size,
        });
    }

    fn push_particle(&mut self, particle: Particle) {
        if self.particles.len() < MAX_PARTICLES {
            self.particles.push(particle);
        }
    }

    // ------------------------------------------------------------------------
    // Scoring and progression
    // ------------------------------------------------------------------------

    /// Extend the combo and bank its bonus
    pub fn increase_combo(&mut self) {
        let bonus = self.combo.increase(self.level);
        self.score += bonus;
        if self.combo.is_milestone() {
            self.emit(GameEvent::ComboMilestone(self.combo.count));
        }
    }

    /// Score `base × level × combo multiplier × factor`, floored
    pub fn award(&mut self, base: u32, factor: f32) {
        let points = base as f32 * self.level as f32 * self.combo.multiplier() * factor;
        self.score += points.floor() as u64;
    }

    /// The ship was hit by a hazard
    pub fn lose_life(&mut self) {
        if self.game_over {
            return;
        }
        if self.modifiers.immortal_mode {
            self.explode(self.ship.pos, 0x00ffff, 10);
            self.emit(GameEvent::ImmortalHit);
            return;
        }

        self.lives = self.lives.saturating_sub(1);
        self.emit(GameEvent::LifeLost(self.lives));
        if self.lives == 0 {
            info!("Game over at level {} with score {}", self.level, self.score);
            self.game_over = true;
            self.emit(GameEvent::GameOver);
        } else {
            let death_pos = self.ship.pos;
            self.ship.reset_position(&self.arena);
            self.explode(death_pos, 0x00ffff, 30);
            debug!("Life lost, {} remaining", self.lives);
        }
    }

    /// Move to the next level: clear player bullets and coins, announce it
    pub fn advance_level(&mut self) {
        self.level += 1;
        self.bullets.clear();
        self.coins.clear();
        info!("Advanced to level {}", self.level);
        self.notify(NoticeKind::LevelUp(self.level), LEVEL_UP_NOTIFICATION_TIME);
        self.emit(GameEvent::LevelAdvanced(self.level));
    }

    /// Field spawned after a level advance
    pub fn spawn_level_field(&mut self) {
        let count = self.modifiers.level_field_count(field_size(self.level));
        self.spawn_field(count);
    }
}
