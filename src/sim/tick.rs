//! Per-frame simulation step
//!
//! Advances every entity, resolves collisions and drives wave progression.

use glam::Vec2;

use super::collision::resolve_collisions;
use super::entities::{Bullet, PowerupKind};
use super::state::{GameEvent, World};
use super::timers::NoticeKind;
use super::waves::{ScheduledAction, WaveTransition};
use crate::consts::*;

/// Input snapshot for a single frame
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    pub turn_left: bool,
    pub turn_right: bool,
    pub thrust: bool,
    pub fire: bool,
    /// Absolute facing from a pointer (overrides turning)
    pub aim_angle: Option<f32>,
    /// Thrust direction from a pointer (thrusts without changing facing)
    pub move_dir: Option<Vec2>,
    /// Demo mode - the ship flies itself
    pub autopilot: bool,
}

/// Advance the world by one frame of `dt` seconds
pub fn tick(world: &mut World, input: &TickInput, dt: f32) {
    if world.game_over {
        return;
    }

    let input = if input.autopilot {
        autopilot_input(world)
    } else {
        input.clone()
    };

    world.clock += dt;
    world.combo.update(dt);
    world.shake.update(dt);

    // Ship first: it decides the (possibly dilated) game delta
    let game_dt = world.ship.update(&input, dt, &world.modifiers, &world.arena) * world.enemy_speed_multiplier();
    if world.ship.thrusting {
        world.thrust_particle();
    }
    if input.fire {
        fire_player(world);
    }

    // Player bullets, particles and pickups run on real time
    for bullet in &mut world.bullets {
        bullet.update(dt, &world.arena);
    }
    world.bullets.retain(|b| !b.is_expired());

    for asteroid in &mut world.asteroids {
        asteroid.update(game_dt, &world.arena);
    }

    for particle in &mut world.particles {
        particle.update(dt);
    }
    world.particles.retain(|p| !p.is_expired());

    for powerup in &mut world.powerups {
        powerup.update(dt);
    }
    world.powerups.retain(|p| !p.is_expired());

    update_enemies(world, game_dt);

    for bullet in &mut world.enemy_bullets {
        bullet.update(game_dt, &world.arena);
    }
    world.enemy_bullets.retain(|b| !b.is_expired());

    let ship_pos = world.ship.pos;
    let magnet = world.ship.has(PowerupKind::Magnet);
    for coin in &mut world.coins {
        coin.update(dt, ship_pos, magnet);
    }

    resolve_collisions(world);

    if world.game_over {
        return;
    }

    update_progression(world, dt);
}

fn fire_player(world: &mut World) {
    let shots = world.ship.fire(world.clock);
    if shots.is_empty() {
        return;
    }
    for shot in &shots {
        let id = world.next_entity_id();
        world.bullets.push(Bullet::player(id, shot));
    }
    world.emit(GameEvent::PlayerShot);
}

fn update_enemies(world: &mut World, game_dt: f32) {
    let target = world.ship.pos;
    let mut shots = Vec::new();
    for enemy in &mut world.enemies {
        shots.extend(enemy.update(game_dt, target));
    }
    if shots.is_empty() {
        return;
    }
    for shot in shots {
        let id = world.next_entity_id();
        world.enemy_bullets.push(Bullet::enemy(id, shot.origin, shot.angle));
    }
    world.emit(GameEvent::EnemyShot);
}

/// Run due timers, then let the wave machine look at the populations
fn update_progression(world: &mut World, dt: f32) {
    for action in world.waves.advance(dt) {
        match action {
            ScheduledAction::SpawnEnemy(kind) => {
                world.spawn_enemy(kind);
            }
            ScheduledAction::AdvanceLevel => world.advance_level(),
            ScheduledAction::SpawnField => world.spawn_level_field(),
        }
    }

    let transitions = world
        .waves
        .evaluate(world.asteroids.len(), world.enemies.len(), world.level);
    for transition in transitions {
        match transition {
            WaveTransition::BossWaveStarted => {
                world.notify(NoticeKind::BossWave, BOSS_NOTIFICATION_TIME);
                world.emit(GameEvent::BossWave);
            }
            WaveTransition::BossWaveComplete => {}
            WaveTransition::WaveCleared => {
                world.notify(NoticeKind::WaveCleared, WAVE_CLEAR_NOTIFICATION_TIME);
                world.emit(GameEvent::WaveCleared);
            }
        }
    }
}

/// Demo pilot: face the nearest hazard and keep firing, thrust away from
/// anything too close
fn autopilot_input(world: &World) -> TickInput {
    let ship = world.ship.pos;
    let nearest = world
        .asteroids
        .iter()
        .map(|a| a.pos)
        .chain(world.enemies.iter().map(|e| e.pos))
        .min_by(|a, b| a.distance_squared(ship).total_cmp(&b.distance_squared(ship)));

    let Some(target) = nearest else {
        return TickInput::default();
    };
    let to_target = target - ship;
    let danger = to_target.length() < 120.0;
    TickInput {
        aim_angle: Some(to_target.y.atan2(to_target.x)),
        fire: true,
        move_dir: danger.then(|| -to_target.normalize_or_zero()),
        ..Default::default()
    }
}
