//! Collision detection and hit resolution
//!
//! Runs once per frame on post-movement positions. Candidate sets are
//! snapshotted as entity ids before anything is mutated, and every target is
//! looked up again by id before it is touched, so cascades (blast splash,
//! explosive chains, splits) can never index a stale slot.

use glam::Vec2;

use super::enemy::EnemyKind;
use super::entities::{AsteroidKind, Collider};
use super::state::{GameEvent, World};
use crate::consts::*;

/// A damageable target identified by entity id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Asteroid(u32),
    Enemy(u32),
}

impl Target {
    pub fn id(self) -> u32 {
        match self {
            Target::Asteroid(id) | Target::Enemy(id) => id,
        }
    }
}

/// How a target was hit; splash kills pay out less
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitSource {
    Direct,
    Splash,
}

const DAMAGE_CUE_COLOR: u32 = 0xffffff;
const SHIP_HIT_COLOR: u32 = 0xff3366;
const COIN_COLOR: u32 = 0xffdd00;

/// Resolve every collision category for this frame
pub fn resolve_collisions(world: &mut World) {
    resolve_player_bullets(world);
    resolve_ship_hazards(world);
    resolve_enemy_bullets(world);
    collect_pickups(world);
}

// ============================================================================
// Player bullets
// ============================================================================

fn resolve_player_bullets(world: &mut World) {
    let bullet_ids: Vec<u32> = world.bullets.iter().map(|b| b.id).collect();
    for bullet_id in bullet_ids {
        resolve_bullet(world, bullet_id);
    }
}

/// Resolve one player bullet against everything it overlaps this frame
fn resolve_bullet(world: &mut World, bullet_id: u32) {
    let Some(bullet) = world.bullets.iter().find(|b| b.id == bullet_id) else {
        return;
    };
    if bullet.is_expired() {
        return;
    }

    // Snapshot overlaps first: children split off during resolution are not
    // hit by the same bullet in the same frame
    let candidates: Vec<Target> = world
        .asteroids
        .iter()
        .filter(|a| bullet.overlaps(*a))
        .map(|a| Target::Asteroid(a.id))
        .chain(
            world
                .enemies
                .iter()
                .filter(|e| bullet.overlaps(*e))
                .map(|e| Target::Enemy(e.id)),
        )
        .collect();

    for target in candidates {
        let Some(bullet) = world.bullets.iter().find(|b| b.id == bullet_id) else {
            return;
        };
        if bullet.has_hit(target.id()) || bullet.is_spent() {
            continue;
        }
        let impact = bullet.pos;
        let blast = bullet.blast;

        // Primary may have been removed by an earlier cascade this frame
        if !apply_damage(world, target) {
            continue;
        }

        if blast {
            detonate_blast(world, impact);
        }

        finalize_hit(world, target, HitSource::Direct);

        let Some(bullet) = world.bullets.iter_mut().find(|b| b.id == bullet_id) else {
            return;
        };
        bullet.register_hit(target.id());
        if bullet.is_spent() {
            world.bullets.retain(|b| b.id != bullet_id);
            return;
        }
    }
}

/// One unit of damage without removal. Returns false if the target is gone.
fn apply_damage(world: &mut World, target: Target) -> bool {
    match target {
        Target::Asteroid(id) => match world.asteroids.iter_mut().find(|a| a.id == id) {
            Some(rock) => {
                rock.hit();
                true
            }
            None => false,
        },
        Target::Enemy(id) => match world.enemies.iter_mut().find(|e| e.id == id) {
            Some(enemy) => {
                enemy.take_damage();
                true
            }
            None => false,
        },
    }
}

/// Destroy the target if its damage was fatal, otherwise play a damage cue
fn finalize_hit(world: &mut World, target: Target, source: HitSource) {
    let state = match target {
        Target::Asteroid(id) => world
            .asteroids
            .iter()
            .find(|a| a.id == id)
            .map(|a| (a.pos, a.is_destroyed())),
        Target::Enemy(id) => world
            .enemies
            .iter()
            .find(|e| e.id == id)
            .map(|e| (e.pos, e.is_destroyed())),
    };
    let Some((pos, destroyed)) = state else {
        return;
    };

    if destroyed {
        match target {
            Target::Asteroid(id) => destroy_asteroid(world, id, source),
            Target::Enemy(id) => destroy_enemy(world, id, source),
        }
    } else {
        let particles = match source {
            HitSource::Direct => 5,
            HitSource::Splash => 3,
        };
        world.explode(pos, DAMAGE_CUE_COLOR, particles);
        world.emit(GameEvent::TargetDamaged { pos });
    }
}

/// Area damage around a blast-radius impact. The primary target is in range
/// too and takes a second unit here; if that destroys it, it scores as a
/// splash kill and the direct finalize that follows finds nothing.
pub fn detonate_blast(world: &mut World, impact: Vec2) {
    world.blast_ring(impact);

    let in_range = |pos: Vec2, radius: f32| pos.distance(impact) < BLAST_RADIUS + radius;
    let victims: Vec<Target> = world
        .asteroids
        .iter()
        .filter(|a| in_range(a.pos, a.radius()))
        .map(|a| Target::Asteroid(a.id))
        .chain(
            world
                .enemies
                .iter()
                .filter(|e| in_range(e.pos, e.radius()))
                .map(|e| Target::Enemy(e.id)),
        )
        .collect();

    for victim in victims {
        if apply_damage(world, victim) {
            finalize_hit(world, victim, HitSource::Splash);
        }
    }
}

fn destroy_asteroid(world: &mut World, id: u32, source: HitSource) {
    let Some(idx) = world.asteroids.iter().position(|a| a.id == id) else {
        return;
    };
    let rock = world.asteroids.remove(idx);

    let particles = match (source, rock.kind) {
        (HitSource::Splash, _) => 10,
        (HitSource::Direct, AsteroidKind::Explosive) => 25,
        (HitSource::Direct, _) => 15,
    };
    world.explode(rock.pos, rock.kind.color(), particles);

    if rock.kind == AsteroidKind::Explosive {
        world.shake.trigger(12.0, 0.3);
        for other in world
            .asteroids
            .iter_mut()
            .filter(|a| a.pos.distance(rock.pos) < EXPLOSIVE_SPLASH_RADIUS)
        {
            other.chip();
        }
    }

    if let Some(child) = rock.size.child() {
        world.spawn_asteroid(rock.pos, child, rock.kind);
        world.spawn_asteroid(rock.pos, child, rock.kind);
    }

    world.roll_powerups(rock.pos);
    world.drop_coins(rock.pos);
    world.increase_combo();
    let factor = match source {
        HitSource::Direct => 1.0,
        HitSource::Splash => 0.5,
    };
    world.award(rock.points, factor);
    world.kills.asteroids += 1;
    world.emit(GameEvent::AsteroidDestroyed {
        kind: rock.kind,
        size: rock.size,
    });
}

fn destroy_enemy(world: &mut World, id: u32, source: HitSource) {
    let Some(idx) = world.enemies.iter().position(|e| e.id == id) else {
        return;
    };
    let enemy = world.enemies.remove(idx);
    let profile = enemy.profile();

    let (particles, (drops, spread), points) = match source {
        HitSource::Direct => (profile.explosion.0, profile.coins, profile.points),
        HitSource::Splash => (profile.explosion.1, profile.splash_coins, profile.splash_points),
    };
    world.explode(enemy.pos, enemy.kind.color(), particles);
    world.scatter_coins(enemy.pos, drops, spread);
    world.roll_powerups(enemy.pos);
    world.increase_combo();
    world.award(points, 1.0);
    world.kills.record_enemy(enemy.kind);
    world.emit(GameEvent::EnemyDestroyed(enemy.kind));
}

// ============================================================================
// Ship
// ============================================================================

/// Ship against asteroid and enemy bodies: one touch costs one life
fn resolve_ship_hazards(world: &mut World) {
    if !world.ship.is_vulnerable() {
        return;
    }
    let ship = &world.ship;
    let touched = world.asteroids.iter().any(|a| ship.is_colliding_with(a))
        || world.enemies.iter().any(|e| ship.is_colliding_with(e));
    if touched {
        ship_hit(world);
    }
}

fn resolve_enemy_bullets(world: &mut World) {
    if !world.ship.is_vulnerable() {
        return;
    }
    let ship = &world.ship;
    let Some(idx) = world.enemy_bullets.iter().position(|b| ship.is_colliding_with(b)) else {
        return;
    };
    world.enemy_bullets.remove(idx);
    ship_hit(world);
}

fn ship_hit(world: &mut World) {
    world.explode(world.ship.pos, SHIP_HIT_COLOR, 40);
    world.lose_life();
}

/// Power-ups and coins touching the ship (collected even while protected)
fn collect_pickups(world: &mut World) {
    let ship_pos = world.ship.pos;
    let ship_radius = world.ship.radius();

    let (taken, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut world.powerups)
        .into_iter()
        .partition(|p| super::entities::circles_overlap(ship_pos, ship_radius, p.pos, p.radius()));
    world.powerups = kept;
    for powerup in taken {
        world.ship.effects.activate(powerup.kind);
        world.explode(powerup.pos, powerup.kind.color(), 10);
        world.emit(GameEvent::PowerupCollected(powerup.kind));
    }

    let (taken, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut world.coins)
        .into_iter()
        .partition(|c| super::entities::circles_overlap(ship_pos, ship_radius, c.pos, c.radius()));
    world.coins = kept;
    for coin in taken {
        world.coins_this_game += coin.value;
        world.explode(coin.pos, COIN_COLOR, 8);
        world.emit(GameEvent::CoinCollected(coin.value));
    }
}

/// Count of live enemies of one archetype
pub fn enemies_of(world: &World, kind: EnemyKind) -> usize {
    world.enemies.iter().filter(|e| e.kind == kind).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Arena;
    use crate::sim::entities::{AsteroidSize, Bullet, Coin, Powerup, PowerupKind, ShotParams};
    use crate::sim::enemy::get_profile;
    use crate::sim::modifiers::Modifiers;

    fn world() -> World {
        let mut world = World::empty(42, Modifiers::default(), Arena::default());
        // Park the ship out of the way and make it hittable
        world.ship.pos = Vec2::new(1000.0, 600.0);
        world.ship.invulnerable_time = 0.0;
        world
    }

    fn fire_at(world: &mut World, pos: Vec2, piercing: bool, blast: bool) -> u32 {
        let id = world.next_entity_id();
        let shot = ShotParams {
            origin: pos,
            angle: 0.0,
            piercing,
            large: false,
            blast,
        };
        world.bullets.push(Bullet::player(id, &shot));
        id
    }

    #[test]
    fn test_bullet_destroys_small_asteroid() {
        let mut world = world();
        world.spawn_asteroid(Vec2::new(200.0, 200.0), AsteroidSize::Small, AsteroidKind::Normal);
        fire_at(&mut world, Vec2::new(200.0, 200.0), false, false);

        resolve_collisions(&mut world);

        assert!(world.asteroids.is_empty());
        assert!(world.bullets.is_empty());
        assert_eq!(world.kills.asteroids, 1);
        assert_eq!(world.score, 100);
        assert_eq!(world.combo.count, 1);
    }

    #[test]
    fn test_large_asteroid_splits_into_same_kind() {
        let mut world = world();
        world.spawn_asteroid(Vec2::new(300.0, 300.0), AsteroidSize::Large, AsteroidKind::Ice);
        fire_at(&mut world, Vec2::new(300.0, 300.0), true, false);

        resolve_collisions(&mut world);

        assert_eq!(world.asteroids.len(), 2);
        for child in &world.asteroids {
            assert_eq!(child.size, AsteroidSize::Medium);
            assert_eq!(child.kind, AsteroidKind::Ice);
        }
        // Children were not hit by the same piercing bullet this frame
        assert_eq!(world.bullets[0].hit_count, 1);
    }

    #[test]
    fn test_metal_asteroid_survives_first_hit() {
        let mut world = world();
        world.spawn_asteroid(Vec2::new(300.0, 300.0), AsteroidSize::Medium, AsteroidKind::Metal);
        fire_at(&mut world, Vec2::new(300.0, 300.0), false, false);

        resolve_collisions(&mut world);

        assert_eq!(world.asteroids.len(), 1);
        assert_eq!(world.asteroids[0].hp, 1);
        assert!(world.bullets.is_empty());
        assert_eq!(world.score, 0);
        assert!(world.events().iter().any(|e| matches!(e, GameEvent::TargetDamaged { .. })));
    }

    #[test]
    fn test_piercing_stops_at_hit_limit() {
        let mut world = world();
        let pos = Vec2::new(400.0, 400.0);
        for _ in 0..5 {
            world.spawn_asteroid(pos, AsteroidSize::Small, AsteroidKind::Normal);
        }
        fire_at(&mut world, pos, true, false);

        resolve_collisions(&mut world);

        assert_eq!(world.asteroids.len(), 5 - PIERCE_HIT_LIMIT as usize);
        assert_eq!(world.kills.asteroids, PIERCE_HIT_LIMIT);
        assert!(world.bullets.is_empty());
    }

    #[test]
    fn test_piercing_never_hits_same_target_twice() {
        let mut world = world();
        let pos = Vec2::new(400.0, 400.0);
        world.spawn_asteroid(pos, AsteroidSize::Small, AsteroidKind::Metal);
        let bullet = fire_at(&mut world, pos, true, false);

        resolve_collisions(&mut world);
        resolve_collisions(&mut world);

        assert_eq!(world.asteroids[0].hp, 1);
        let bullet = world.bullets.iter().find(|b| b.id == bullet).map(|b| b.hit_count);
        assert_eq!(bullet, Some(1));
    }

    #[test]
    fn test_blast_killing_primary_scores_once() {
        let mut world = world();
        let pos = Vec2::new(500.0, 300.0);
        world.spawn_asteroid(pos, AsteroidSize::Small, AsteroidKind::Normal);
        world.spawn_asteroid(pos + Vec2::new(30.0, 0.0), AsteroidSize::Small, AsteroidKind::Normal);
        fire_at(&mut world, pos, false, true);

        resolve_collisions(&mut world);

        assert!(world.asteroids.is_empty());
        assert_eq!(world.kills.asteroids, 2);
        // Both are splash kills at half of 100; the primary is not scored again
        assert_eq!(world.score, 100);
        let destroyed = world
            .events()
            .iter()
            .filter(|e| matches!(e, GameEvent::AsteroidDestroyed { .. }))
            .count();
        assert_eq!(destroyed, 2);
    }

    #[test]
    fn test_blast_breaks_metal_primary() {
        let mut world = world();
        let pos = Vec2::new(500.0, 300.0);
        let primary = world.spawn_asteroid(pos, AsteroidSize::Small, AsteroidKind::Metal);
        fire_at(&mut world, pos, false, true);

        resolve_collisions(&mut world);

        // Bullet takes 2 -> 1, the blast finishes it
        assert!(world.asteroids.iter().all(|a| a.id != primary));
        assert_eq!(world.kills.asteroids, 1);
        // Splash rate: half of 150
        assert_eq!(world.score, 75);
        assert!(world.bullets.is_empty());
    }

    #[test]
    fn test_blast_chain_with_explosive_neighbour() {
        let mut world = world();
        let pos = Vec2::new(500.0, 300.0);
        let primary = world.spawn_asteroid(pos, AsteroidSize::Small, AsteroidKind::Metal);
        world.spawn_asteroid(pos + Vec2::new(20.0, 0.0), AsteroidSize::Small, AsteroidKind::Explosive);
        fire_at(&mut world, pos, false, true);

        resolve_collisions(&mut world);

        assert!(world.asteroids.iter().all(|a| a.id != primary));
        assert!(world.asteroids.is_empty());
        assert_eq!(world.kills.asteroids, 2);
        assert_eq!(world.score, 150);
    }

    #[test]
    fn test_blast_kills_two_hp_enemy() {
        let mut world = world();
        let id = world.spawn_enemy(EnemyKind::Pursuer);
        let pos = Vec2::new(640.0, 200.0);
        if let Some(enemy) = world.enemies.iter_mut().find(|e| e.id == id) {
            assert_eq!(enemy.health, 2);
            enemy.pos = pos;
        }
        fire_at(&mut world, pos, false, true);

        resolve_collisions(&mut world);

        assert!(world.enemies.is_empty());
        assert_eq!(world.kills.pursuers, 1);
        assert_eq!(world.score, u64::from(get_profile(EnemyKind::Pursuer).splash_points));
        let kills = world
            .events()
            .iter()
            .filter(|e| **e == GameEvent::EnemyDestroyed(EnemyKind::Pursuer))
            .count();
        assert_eq!(kills, 1);
    }

    #[test]
    fn test_later_candidate_removed_by_blast_is_skipped() {
        let mut world = world();
        let pos = Vec2::new(500.0, 300.0);
        world.spawn_asteroid(pos, AsteroidSize::Small, AsteroidKind::Normal);
        world.spawn_asteroid(pos + Vec2::new(10.0, 0.0), AsteroidSize::Small, AsteroidKind::Normal);
        let bullet = fire_at(&mut world, pos, true, true);

        resolve_collisions(&mut world);

        assert!(world.asteroids.is_empty());
        assert_eq!(world.kills.asteroids, 2);
        let hits = world.bullets.iter().find(|b| b.id == bullet).map(|b| b.hit_count);
        assert_eq!(hits, Some(1));
    }

    #[test]
    fn test_enemy_kill_drops_coins_and_scores() {
        let mut world = world();
        let id = world.spawn_enemy(EnemyKind::Swooper);
        let pos = Vec2::new(640.0, 200.0);
        if let Some(enemy) = world.enemies.iter_mut().find(|e| e.id == id) {
            enemy.pos = pos;
        }
        fire_at(&mut world, pos, false, false);

        resolve_collisions(&mut world);

        assert!(world.enemies.is_empty());
        assert_eq!(world.kills.swoopers, 1);
        assert_eq!(world.score, 300);
        assert_eq!(world.coins.len(), 3);
        assert_eq!(enemies_of(&world, EnemyKind::Swooper), 0);
    }

    #[test]
    fn test_ship_hit_by_asteroid_loses_one_life() {
        let mut world = world();
        let ship_pos = world.ship.pos;
        world.spawn_asteroid(ship_pos, AsteroidSize::Large, AsteroidKind::Normal);
        world.spawn_asteroid(ship_pos, AsteroidSize::Large, AsteroidKind::Normal);

        resolve_collisions(&mut world);

        assert_eq!(world.lives, STARTING_LIVES - 1);
        assert_eq!(world.ship.pos, world.arena.center());
    }

    #[test]
    fn test_shield_blocks_hazards() {
        let mut world = world();
        world.ship.effects.activate(PowerupKind::Shield);
        let ship_pos = world.ship.pos;
        world.spawn_asteroid(ship_pos, AsteroidSize::Large, AsteroidKind::Normal);
        let id = world.next_entity_id();
        world.enemy_bullets.push(Bullet::enemy(id, ship_pos, 0.0));

        resolve_collisions(&mut world);

        assert_eq!(world.lives, STARTING_LIVES);
        assert_eq!(world.enemy_bullets.len(), 1);
    }

    #[test]
    fn test_enemy_bullet_hits_ship() {
        let mut world = world();
        let id = world.next_entity_id();
        world.enemy_bullets.push(Bullet::enemy(id, world.ship.pos, 0.0));

        resolve_collisions(&mut world);

        assert!(world.enemy_bullets.is_empty());
        assert_eq!(world.lives, STARTING_LIVES - 1);
    }

    #[test]
    fn test_large_mode_widens_ship_hitbox() {
        let mods = Modifiers { large_mode: true, ..Default::default() };
        let mut world = World::empty(1, mods, Arena::default());
        world.ship.invulnerable_time = 0.0;
        let id = world.next_entity_id();
        // 30 units away: outside 20 + 3, inside 40 + 3
        world.enemy_bullets.push(Bullet::enemy(id, world.ship.pos + Vec2::new(30.0, 0.0), 0.0));

        resolve_collisions(&mut world);

        assert_eq!(world.lives, STARTING_LIVES - 1);
    }

    #[test]
    fn test_pickups_collected_while_invulnerable() {
        let mut world = world();
        world.ship.invulnerable_time = 2.0;
        let ship_pos = world.ship.pos;
        world.powerups.push(Powerup::new(900, PowerupKind::RapidFire, ship_pos));
        world.coins.push(Coin { id: 901, pos: ship_pos, value: 3, rotation: 0.0 });

        resolve_collisions(&mut world);

        assert!(world.ship.has(PowerupKind::RapidFire));
        assert_eq!(world.coins_this_game, 3);
        assert!(world.powerups.is_empty() && world.coins.is_empty());
    }
}
