//! Wave / level progression
//!
//! The phase is the only guard against re-entrant transitions: each edge is
//! taken from exactly one phase, so a transition can never fire twice.
//! Delayed work lives in a [`Scheduler`] owned by the world and advanced with
//! the frame delta, so pausing the game pauses it too.

use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::enemy::EnemyKind;
use crate::consts::{FIELD_RESPAWN_DELAY, LEVEL_ADVANCE_DELAY};

/// Progression phases within one level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WavePhase {
    /// Asteroid field in play
    #[default]
    FieldActive,
    /// Boss wave announced, staggered enemy spawns still pending
    BossSpawning,
    /// Every boss enemy has spawned
    BossActive,
    /// Boss wave beaten; level advance and field respawn pending
    WaveCleared,
}

/// Work to perform once a timer elapses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduledAction {
    SpawnEnemy(EnemyKind),
    AdvanceLevel,
    SpawnField,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ScheduledEntry {
    /// Seconds until due
    delay: f32,
    action: ScheduledAction,
}

/// Timer entries decremented by the frame delta
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scheduler {
    entries: Vec<ScheduledEntry>,
}

impl Scheduler {
    pub fn schedule(&mut self, delay: f32, action: ScheduledAction) {
        self.entries.push(ScheduledEntry { delay, action });
    }

    /// Age every entry and return the due actions, earliest first
    pub fn update(&mut self, dt: f32) -> Vec<ScheduledAction> {
        for entry in &mut self.entries {
            entry.delay -= dt;
        }
        let (mut due, pending): (Vec<_>, Vec<_>) = self.entries.drain(..).partition(|e| e.delay <= 0.0);
        self.entries = pending;
        due.sort_by(|a, b| a.delay.total_cmp(&b.delay));
        due.into_iter().map(|e| e.action).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Actions still waiting, in scheduling order
    pub fn pending(&self) -> impl Iterator<Item = ScheduledAction> + '_ {
        self.entries.iter().map(|e| e.action)
    }

    pub fn has_pending_spawns(&self) -> bool {
        self.entries
            .iter()
            .any(|e| matches!(e.action, ScheduledAction::SpawnEnemy(_)))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Transitions reported by [`WaveDirector::evaluate`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaveTransition {
    BossWaveStarted,
    BossWaveComplete,
    WaveCleared,
}

/// Staggered boss wave for a level: (delay, archetype) pairs
pub fn boss_plan(level: u32) -> Vec<(f32, EnemyKind)> {
    let mut plan = Vec::new();

    let pursuers = (1 + level / 2).min(5);
    for i in 0..pursuers {
        plan.push((i as f32 * 0.8, EnemyKind::Pursuer));
    }

    if level >= 3 {
        let swoopers = (level / 3).min(3);
        for i in 0..swoopers {
            plan.push((1.0 + i as f32 * 0.6, EnemyKind::Swooper));
        }
    }

    if level >= 4 {
        let drifters = (level / 4).min(2);
        for i in 0..drifters {
            plan.push((1.5 + i as f32 * 1.0, EnemyKind::Drifter));
        }
    }

    plan
}

/// Asteroids in the field spawned after advancing to `level` (before modifiers)
pub fn field_size(level: u32) -> u32 {
    3 + (level as f32 * 0.8).floor() as u32
}

/// Drives the per-level progression state machine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WaveDirector {
    pub phase: WavePhase,
    pub scheduler: Scheduler,
}

impl WaveDirector {
    /// Age timers. A due `AdvanceLevel` schedules the field respawn, and a
    /// due `SpawnField` re-opens the field phase.
    pub fn advance(&mut self, dt: f32) -> Vec<ScheduledAction> {
        let due = self.scheduler.update(dt);
        for action in &due {
            match action {
                ScheduledAction::AdvanceLevel => {
                    self.scheduler.schedule(FIELD_RESPAWN_DELAY, ScheduledAction::SpawnField);
                }
                ScheduledAction::SpawnField => {
                    self.phase = WavePhase::FieldActive;
                }
                ScheduledAction::SpawnEnemy(kind) => {
                    debug!("Boss wave spawn: {}", kind.as_str());
                }
            }
        }
        due
    }

    /// Inspect population counts and take at most one edge per phase
    pub fn evaluate(&mut self, asteroids: usize, enemies: usize, level: u32) -> Vec<WaveTransition> {
        let mut transitions = Vec::new();

        if self.phase == WavePhase::FieldActive && asteroids == 0 {
            let plan = boss_plan(level);
            info!("Level {level} field cleared, boss wave of {} incoming", plan.len());
            for (delay, kind) in plan {
                self.scheduler.schedule(delay, ScheduledAction::SpawnEnemy(kind));
            }
            self.phase = WavePhase::BossSpawning;
            transitions.push(WaveTransition::BossWaveStarted);
        }

        if self.phase == WavePhase::BossSpawning && !self.scheduler.has_pending_spawns() {
            self.phase = WavePhase::BossActive;
            transitions.push(WaveTransition::BossWaveComplete);
        }

        if self.phase == WavePhase::BossActive && enemies == 0 {
            info!("Level {level} wave cleared");
            self.scheduler.schedule(LEVEL_ADVANCE_DELAY, ScheduledAction::AdvanceLevel);
            self.phase = WavePhase::WaveCleared;
            transitions.push(WaveTransition::WaveCleared);
        }

        transitions
    }

    pub fn reset(&mut self) {
        self.phase = WavePhase::FieldActive;
        self.scheduler.clear();
    }
}
