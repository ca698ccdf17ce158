//! Small timer machines driven by the frame delta

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::consts::{COMBO_BONUS_THRESHOLD, COMBO_TIMEOUT};

// ============================================================================
// Combo
// ============================================================================

/// Kill-streak counter with an idle timeout
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Combo {
    pub count: u32,
    /// Seconds left before the streak lapses
    pub timer: f32,
}

impl Combo {
    /// Register a kill. Returns the bonus score earned by this increment.
    pub fn increase(&mut self, level: u32) -> u64 {
        self.count += 1;
        self.timer = COMBO_TIMEOUT;
        if self.count >= COMBO_BONUS_THRESHOLD {
            self.count as u64 * 10 * level as u64
        } else {
            0
        }
    }

    pub fn update(&mut self, dt: f32) {
        if self.timer > 0.0 {
            self.timer -= dt;
            if self.timer <= 0.0 {
                self.reset();
            }
        }
    }

    pub fn reset(&mut self) {
        self.count = 0;
        self.timer = 0.0;
    }

    /// Score multiplier for the current streak
    pub fn multiplier(&self) -> f32 {
        match self.count {
            0..3 => 1.0,
            3..5 => 1.5,
            5..10 => 2.0,
            10..20 => 3.0,
            _ => 5.0,
        }
    }

    /// Streak lengths that trigger an achievement check
    pub fn is_milestone(&self) -> bool {
        self.count == 10 || self.count == 25
    }
}

// ============================================================================
// Screen shake
// ============================================================================

/// Camera shake request state. Overlapping requests keep the stronger one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScreenShake {
    pub intensity: f32,
    pub duration: f32,
}

impl ScreenShake {
    pub fn trigger(&mut self, intensity: f32, duration: f32) {
        self.intensity = self.intensity.max(intensity);
        self.duration = self.duration.max(duration);
    }

    pub fn update(&mut self, dt: f32) {
        if self.duration > 0.0 {
            self.duration -= dt;
            if self.duration <= 0.0 {
                self.intensity = 0.0;
                self.duration = 0.0;
            }
        }
    }

    pub fn is_active(&self) -> bool {
        self.intensity > 0.0
    }

    /// Offset for the renderer given two unit samples in [0, 1)
    pub fn offset(&self, rx: f32, ry: f32) -> (f32, f32) {
        if !self.is_active() {
            return (0.0, 0.0);
        }
        ((rx - 0.5) * self.intensity * 2.0, (ry - 0.5) * self.intensity * 2.0)
    }
}

// ============================================================================
// Notifications
// ============================================================================

/// What a notification announces
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoticeKind {
    BossWave,
    WaveCleared,
    LevelUp(u32),
    CheatWarning,
    Achievement(String),
    SyncFailed,
}

/// A queued notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    pub kind: NoticeKind,
    /// Seconds on screen
    pub duration: f32,
}

impl Notice {
    pub fn new(kind: NoticeKind, duration: f32) -> Self {
        Self { kind, duration }
    }
}

/// Change in what is on screen after an update
#[derive(Debug, Clone, PartialEq)]
pub enum NoticeChange {
    Shown(Notice),
    Hidden(Notice),
}

/// FIFO of notifications with at most one active at a time
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationQueue {
    pending: VecDeque<Notice>,
    current: Option<Notice>,
    remaining: f32,
}

impl NotificationQueue {
    pub fn push(&mut self, notice: Notice) {
        self.pending.push_back(notice);
    }

    pub fn current(&self) -> Option<&Notice> {
        self.current.as_ref()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_idle(&self) -> bool {
        self.current.is_none() && self.pending.is_empty()
    }

    /// Age the active notice; promote the next one once it has gone.
    /// The active notice is only ever removed by its own timer.
    pub fn update(&mut self, dt: f32) -> Vec<NoticeChange> {
        let mut changes = Vec::new();
        if self.current.is_some() {
            self.remaining -= dt;
            if self.remaining <= 0.0 {
                if let Some(done) = self.current.take() {
                    changes.push(NoticeChange::Hidden(done));
                }
            }
        }
        if self.current.is_none() {
            if let Some(next) = self.pending.pop_front() {
                self.remaining = next.duration;
                changes.push(NoticeChange::Shown(next.clone()));
                self.current = Some(next);
            }
        }
        changes
    }

    pub fn clear(&mut self) {
        self.pending.clear();
        self.current = None;
        self.remaining = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combo_bonus_from_third_kill() {
        let mut combo = Combo::default();
        assert_eq!(combo.increase(2), 0);
        assert_eq!(combo.increase(2), 0);
        assert_eq!(combo.increase(2), 60);
        assert_eq!(combo.multiplier(), 1.5);
    }

    #[test]
    fn test_combo_multiplier_tiers() {
        let cases = [(0, 1.0), (2, 1.0), (3, 1.5), (4, 1.5), (5, 2.0), (9, 2.0), (10, 3.0), (19, 3.0), (20, 5.0), (99, 5.0)];
        for (count, expected) in cases {
            let combo = Combo { count, timer: 1.0 };
            assert_eq!(combo.multiplier(), expected, "count {count}");
        }
    }

    #[test]
    fn test_combo_resets_after_idle_window() {
        let mut combo = Combo::default();
        combo.increase(1);
        combo.increase(1);
        combo.update(1.9);
        assert_eq!(combo.count, 2);
        combo.update(0.2);
        assert_eq!(combo.count, 0);
    }

    #[test]
    fn test_combo_survives_while_hits_keep_arriving() {
        let mut combo = Combo::default();
        for _ in 0..20 {
            combo.increase(1);
            combo.update(1.5);
        }
        assert_eq!(combo.count, 20);
    }

    #[test]
    fn test_shake_keeps_stronger_request() {
        let mut shake = ScreenShake::default();
        shake.trigger(8.0, 0.2);
        shake.trigger(2.0, 0.5);
        assert_eq!(shake.intensity, 8.0);
        assert_eq!(shake.duration, 0.5);
        shake.update(0.6);
        assert!(!shake.is_active());
        assert_eq!(shake.offset(0.9, 0.1), (0.0, 0.0));
    }

    #[test]
    fn test_notifications_drain_in_order() {
        let mut queue = NotificationQueue::default();
        queue.push(Notice::new(NoticeKind::BossWave, 2.0));
        queue.push(Notice::new(NoticeKind::LevelUp(2), 1.5));

        let changes = queue.update(0.0);
        assert_eq!(changes, vec![NoticeChange::Shown(Notice::new(NoticeKind::BossWave, 2.0))]);

        // Second one waits for the first timer
        assert!(queue.update(1.9).is_empty());
        assert_eq!(queue.current().map(|n| &n.kind), Some(&NoticeKind::BossWave));

        let changes = queue.update(0.2);
        assert_eq!(changes.len(), 2);
        assert!(matches!(&changes[0], NoticeChange::Hidden(n) if n.kind == NoticeKind::BossWave));
        assert!(matches!(&changes[1], NoticeChange::Shown(n) if n.kind == NoticeKind::LevelUp(2)));

        queue.update(1.5);
        assert!(queue.is_idle());
    }
}
