//! Frame driver
//!
//! Samples an external clock, clamps the delta, then runs exactly one session
//! update followed by one render per frame.

use glam::Vec2;

use crate::consts::MAX_FRAME_DT;
use crate::input::{RawInput, map_input};
use crate::persistence::SaveStore;
use crate::session::Session;
use crate::sim::NoticeChange;

/// Turns absolute timestamps into clamped frame deltas
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    last_ms: Option<f64>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seconds since the previous sample, clamped to `[0, MAX_FRAME_DT]`.
    /// The first sample after creation or [`reset`](Self::reset) is 0.
    pub fn sample(&mut self, now_ms: f64) -> f32 {
        let dt = match self.last_ms {
            Some(last) => ((now_ms - last) / 1000.0) as f32,
            None => 0.0,
        };
        self.last_ms = Some(now_ms);
        dt.clamp(0.0, MAX_FRAME_DT)
    }

    /// Forget the last sample (after a resume, so the pause is not replayed)
    pub fn reset(&mut self) {
        self.last_ms = None;
    }
}

/// Read-only view of the session once per frame
pub trait Renderer {
    fn render<S: SaveStore>(&mut self, session: &Session<S>);
}

/// Renderer that draws nothing (headless runs)
#[derive(Debug, Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn render<S: SaveStore>(&mut self, _session: &Session<S>) {}
}

/// Owns the session and renderer and drives them from a clock
pub struct FrameDriver<S: SaveStore, R: Renderer> {
    session: Session<S>,
    renderer: R,
    clock: FrameClock,
    frames: u64,
}

impl<S: SaveStore, R: Renderer> FrameDriver<S, R> {
    pub fn new(session: Session<S>, renderer: R) -> Self {
        Self {
            session,
            renderer,
            clock: FrameClock::new(),
            frames: 0,
        }
    }

    pub fn session(&self) -> &Session<S> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session<S> {
        &mut self.session
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Resume play without counting the paused time as a frame
    pub fn resume(&mut self) -> bool {
        let resumed = self.session.resume();
        if resumed {
            self.clock.reset();
        }
        resumed
    }

    /// Run one frame at timestamp `now_ms`. Returns the delta that was used
    /// and any notification changes.
    pub fn frame(&mut self, now_ms: f64, raw: &RawInput) -> (f32, Vec<NoticeChange>) {
        let dt = self.clock.sample(now_ms);
        let ship_pos = self.session.world().map_or(Vec2::ZERO, |w| w.ship.pos);
        let input = map_input(self.session.settings().control_scheme, raw, ship_pos);
        let changes = self.session.update(dt, &input);
        self.renderer.render(&self.session);
        self.frames += 1;
        (dt, changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;
    use crate::session::SessionPhase;

    #[derive(Default)]
    struct Recorder {
        phases: Vec<SessionPhase>,
        clocks: Vec<f32>,
    }

    impl Renderer for Recorder {
        fn render<S: SaveStore>(&mut self, session: &Session<S>) {
            self.phases.push(session.phase());
            self.clocks.push(session.world().map_or(0.0, |w| w.clock));
        }
    }

    #[test]
    fn test_first_sample_is_zero() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.sample(5_000.0), 0.0);
        assert!((clock.sample(5_016.0) - 0.016).abs() < 1e-6);
    }

    #[test]
    fn test_delta_is_clamped() {
        let mut clock = FrameClock::new();
        clock.sample(0.0);
        assert_eq!(clock.sample(2_000.0), MAX_FRAME_DT);
        // Clock going backwards never yields a negative delta
        assert_eq!(clock.sample(1_000.0), 0.0);
    }

    #[test]
    fn test_reset_restarts_at_zero() {
        let mut clock = FrameClock::new();
        clock.sample(0.0);
        clock.reset();
        assert_eq!(clock.sample(60_000.0), 0.0);
    }

    #[test]
    fn test_update_then_render_each_frame() {
        let mut session = Session::new(MemoryStore::new(), 2);
        session.start();
        let mut driver = FrameDriver::new(session, Recorder::default());
        let mut now = 0.0;
        for _ in 0..300 {
            driver.frame(now, &RawInput::default());
            now += 16.0;
        }
        assert_eq!(driver.frames(), 300);
        assert_eq!(driver.renderer().phases.len(), 300);
        // Render sees the state after that frame's update
        assert_eq!(driver.renderer().phases.first(), Some(&SessionPhase::Countdown));
        assert_eq!(driver.renderer().phases.last(), Some(&SessionPhase::Playing));
    }

    #[test]
    fn test_resume_skips_paused_time() {
        let mut session = Session::new(MemoryStore::new(), 2);
        session.start();
        let mut driver = FrameDriver::new(session, Recorder::default());
        let mut now = 0.0;
        for _ in 0..240 {
            driver.frame(now, &RawInput::default());
            now += 16.0;
        }
        assert!(driver.session_mut().pause());
        driver.frame(now, &RawInput::default());
        let clock = driver.session().world().unwrap().clock;

        now += 30_000.0;
        assert!(driver.resume());
        let (dt, _) = driver.frame(now, &RawInput::default());
        assert_eq!(dt, 0.0);
        assert_eq!(driver.session().world().unwrap().clock, clock);
    }
}
