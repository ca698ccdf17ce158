//! Sound cues
//!
//! The simulation never plays sound itself. The session maps drained
//! [`GameEvent`]s to [`SoundEffect`]s and hands them to whatever
//! [`AudioSink`] is attached; with no sink, playback is a no-op.

use crate::settings::Settings;
use crate::sim::GameEvent;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Player fires
    Shoot,
    /// Any enemy fires
    AlienShoot,
    Explosion,
    Coin,
    Powerup,
    /// Ship takes a hit, or a target survives one
    Hit,
    /// Boss wave fanfare
    LevelUp,
    GameOver,
}

impl SoundEffect {
    /// Cue for a simulation event, if it has one
    pub fn for_event(event: &GameEvent) -> Option<Self> {
        match event {
            GameEvent::PlayerShot => Some(SoundEffect::Shoot),
            GameEvent::EnemyShot => Some(SoundEffect::AlienShoot),
            GameEvent::Explosion { .. } => Some(SoundEffect::Explosion),
            GameEvent::CoinCollected(_) => Some(SoundEffect::Coin),
            GameEvent::PowerupCollected(_) => Some(SoundEffect::Powerup),
            GameEvent::LifeLost(_) | GameEvent::ImmortalHit => Some(SoundEffect::Hit),
            // Armoured targets thud when they survive a hit
            GameEvent::TargetDamaged { .. } => Some(SoundEffect::Hit),
            GameEvent::BossWave => Some(SoundEffect::LevelUp),
            GameEvent::GameOver => Some(SoundEffect::GameOver),
            _ => None,
        }
    }
}

/// A backend that can synthesize sound effects
pub trait AudioSink {
    fn play(&mut self, effect: SoundEffect, volume: f32);

    /// Unlock playback after a user gesture (browsers start suspended)
    fn resume(&mut self) {}
}

/// Audio manager for the game
pub struct AudioManager {
    sink: Option<Box<dyn AudioSink>>,
    master_volume: f32,
    sfx_enabled: bool,
    muted: bool,
    warned: bool,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::silent()
    }
}

impl std::fmt::Debug for AudioManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioManager")
            .field("attached", &self.sink.is_some())
            .field("master_volume", &self.master_volume)
            .field("sfx_enabled", &self.sfx_enabled)
            .field("muted", &self.muted)
            .finish()
    }
}

impl AudioManager {
    /// Manager with no backend
    pub fn silent() -> Self {
        Self {
            sink: None,
            master_volume: 0.7,
            sfx_enabled: true,
            muted: false,
            warned: false,
        }
    }

    pub fn with_sink(sink: Box<dyn AudioSink>) -> Self {
        let mut audio = Self::silent();
        audio.attach(sink);
        audio
    }

    pub fn attach(&mut self, sink: Box<dyn AudioSink>) {
        self.sink = Some(sink);
    }

    pub fn is_attached(&self) -> bool {
        self.sink.is_some()
    }

    pub fn apply_settings(&mut self, settings: &Settings) {
        self.set_master_volume(settings.master_volume);
        self.sfx_enabled = settings.sfx_enabled;
        self.muted = settings.muted;
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    /// Mute/unmute all audio
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Get effective volume
    pub fn effective_volume(&self) -> f32 {
        if self.muted || !self.sfx_enabled {
            0.0
        } else {
            self.master_volume
        }
    }

    pub fn resume(&mut self) {
        if let Some(sink) = self.sink.as_mut() {
            sink.resume();
        }
    }

    /// Play a sound effect
    pub fn play(&mut self, effect: SoundEffect) {
        let vol = self.effective_volume();
        if vol <= 0.0 {
            return;
        }
        match self.sink.as_mut() {
            Some(sink) => sink.play(effect, vol),
            None => {
                if !self.warned {
                    log::warn!("No audio backend attached - audio disabled");
                    self.warned = true;
                }
            }
        }
    }

    /// Play the cue for every event that has one
    pub fn play_events(&mut self, events: &[GameEvent]) {
        for event in events {
            if let Some(effect) = SoundEffect::for_event(event) {
                self.play(effect);
            }
        }
    }
}

// ============================================================================
// Web Audio backend
// ============================================================================

#[cfg(target_arch = "wasm32")]
pub use web::WebAudioSink;

#[cfg(target_arch = "wasm32")]
mod web {
    use super::{AudioSink, SoundEffect};
    use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

    /// Procedurally generated effects - no external files needed
    pub struct WebAudioSink {
        ctx: AudioContext,
    }

    impl WebAudioSink {
        /// None when the page cannot create an AudioContext (insecure context)
        pub fn new() -> Option<Self> {
            match AudioContext::new() {
                Ok(ctx) => Some(Self { ctx }),
                Err(_) => {
                    log::warn!("Failed to create AudioContext - audio disabled");
                    None
                }
            }
        }

        /// Create an oscillator with gain envelope
        fn create_osc(&self, freq: f32, osc_type: OscillatorType) -> Option<(OscillatorNode, GainNode)> {
            let osc = self.ctx.create_oscillator().ok()?;
            let gain = self.ctx.create_gain().ok()?;

            osc.set_type(osc_type);
            osc.frequency().set_value(freq);
            osc.connect_with_audio_node(&gain).ok()?;
            gain.connect_with_audio_node(&self.ctx.destination()).ok()?;

            Some((osc, gain))
        }

        /// Single oscillator sweeping `from` → `to` with a decaying envelope
        fn sweep(&self, osc_type: OscillatorType, from: f32, to: f32, peak: f32, len: f64) {
            let Some((osc, gain)) = self.create_osc(from, osc_type) else {
                return;
            };
            let t = self.ctx.current_time();
            osc.frequency().set_value_at_time(from, t).ok();
            osc.frequency().exponential_ramp_to_value_at_time(to, t + len).ok();
            gain.gain().set_value_at_time(peak, t).ok();
            gain.gain().exponential_ramp_to_value_at_time(0.01, t + len).ok();
            osc.start().ok();
            osc.stop_with_when(t + len).ok();
        }

        /// Notes played one after another, each with a soft attack
        fn melody(&self, notes: &[f32], step: f64, peak: f32, ring: f64) {
            let t = self.ctx.current_time();
            for (i, freq) in notes.iter().enumerate() {
                let Some((osc, gain)) = self.create_osc(*freq, OscillatorType::Sine) else {
                    continue;
                };
                let start = t + i as f64 * step;
                osc.frequency().set_value_at_time(*freq, start).ok();
                gain.gain().set_value_at_time(0.0, start).ok();
                gain.gain().linear_ramp_to_value_at_time(peak, start + 0.05).ok();
                gain.gain().exponential_ramp_to_value_at_time(0.01, start + ring).ok();
                osc.start_with_when(start).ok();
                osc.stop_with_when(start + ring + 0.05).ok();
            }
        }

        fn play_coin(&self, vol: f32) {
            let t = self.ctx.current_time();
            if let Some((osc, gain)) = self.create_osc(880.0, OscillatorType::Sine) {
                osc.frequency().set_value_at_time(1100.0, t + 0.08).ok();
                gain.gain().set_value_at_time(vol * 0.2, t).ok();
                gain.gain().exponential_ramp_to_value_at_time(0.01, t + 0.12).ok();
                osc.start().ok();
                osc.stop_with_when(t + 0.12).ok();
            }
            if let Some((osc, gain)) = self.create_osc(1320.0, OscillatorType::Sine) {
                osc.frequency().set_value_at_time(1760.0, t + 0.15).ok();
                gain.gain().set_value_at_time(vol * 0.2, t + 0.08).ok();
                gain.gain().exponential_ramp_to_value_at_time(0.01, t + 0.2).ok();
                osc.start_with_when(t + 0.08).ok();
                osc.stop_with_when(t + 0.2).ok();
            }
        }

        fn play_powerup(&self, vol: f32) {
            let Some((osc, gain)) = self.create_osc(400.0, OscillatorType::Sine) else {
                return;
            };
            let t = self.ctx.current_time();
            osc.frequency().exponential_ramp_to_value_at_time(800.0, t + 0.1).ok();
            osc.frequency().exponential_ramp_to_value_at_time(1200.0, t + 0.2).ok();
            osc.frequency().set_value_at_time(1000.0, t + 0.25).ok();
            gain.gain().set_value_at_time(vol * 0.25, t).ok();
            gain.gain().exponential_ramp_to_value_at_time(0.01, t + 0.3).ok();
            osc.start().ok();
            osc.stop_with_when(t + 0.3).ok();
        }

        /// Explosion - low rumble with a thump underneath
        fn play_explosion(&self, vol: f32) {
            self.sweep(OscillatorType::Sawtooth, 180.0, 30.0, vol * 0.3, 0.3);
            self.sweep(OscillatorType::Triangle, 90.0, 40.0, vol * 0.25, 0.2);
        }
    }

    impl AudioSink for WebAudioSink {
        fn play(&mut self, effect: SoundEffect, vol: f32) {
            // Resume context if suspended (browsers require user gesture)
            if self.ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = self.ctx.resume();
            }

            match effect {
                SoundEffect::Shoot => self.sweep(OscillatorType::Square, 600.0, 200.0, vol * 0.2, 0.08),
                SoundEffect::AlienShoot => self.sweep(OscillatorType::Sawtooth, 280.0, 90.0, vol * 0.12, 0.12),
                SoundEffect::Explosion => self.play_explosion(vol),
                SoundEffect::Coin => self.play_coin(vol),
                SoundEffect::Powerup => self.play_powerup(vol),
                SoundEffect::Hit => self.sweep(OscillatorType::Triangle, 150.0, 50.0, vol * 0.3, 0.1),
                SoundEffect::LevelUp => self.melody(&[523.0, 659.0, 784.0, 1047.0], 0.1, vol * 0.2, 0.2),
                SoundEffect::GameOver => {
                    self.melody(&[440.0, 415.0, 392.0, 370.0, 349.0, 330.0], 0.15, vol * 0.15, 0.3)
                }
            }
        }

        fn resume(&mut self) {
            let _ = self.ctx.resume();
        }
    }
}
