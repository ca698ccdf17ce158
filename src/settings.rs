//! Player settings and preferences
//!
//! Stored inside [`SaveData`](crate::SaveData) so they travel with cloud saves.

use serde::{Deserialize, Serialize};

/// How player input maps onto the ship
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ControlScheme {
    /// Turn left/right, thrust forward
    #[default]
    Keyboard,
    /// Ship faces the pointer, direction keys thrust in screen space
    MouseAim,
    /// Ship faces the pointer, secondary button thrusts forward
    MouseOnly,
}

impl ControlScheme {
    pub const ALL: [ControlScheme; 3] = [ControlScheme::Keyboard, ControlScheme::MouseAim, ControlScheme::MouseOnly];

    pub fn as_str(&self) -> &'static str {
        match self {
            ControlScheme::Keyboard => "keyboard",
            ControlScheme::MouseAim => "mouse-aim",
            ControlScheme::MouseOnly => "mouse-only",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "keyboard" | "keys" => Some(ControlScheme::Keyboard),
            "mouse-aim" | "mouseaim" | "aim" => Some(ControlScheme::MouseAim),
            "mouse-only" | "mouseonly" | "mouse" => Some(ControlScheme::MouseOnly),
            _ => None,
        }
    }

    /// Whether the pointer's primary button fires
    pub fn uses_pointer(&self) -> bool {
        !matches!(self, ControlScheme::Keyboard)
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    pub muted: bool,
    pub sfx_enabled: bool,

    // === Visual Effects ===
    /// Screen shake on explosions/impacts
    pub screen_shake: bool,

    // === Accessibility ===
    /// Reduced motion (no shake)
    pub reduced_motion: bool,

    // === Controls ===
    pub control_scheme: ControlScheme,
    /// Visible world width on small screens
    pub mobile_zoom: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            master_volume: 0.7,
            muted: false,
            sfx_enabled: true,
            screen_shake: true,
            reduced_motion: false,
            control_scheme: ControlScheme::Keyboard,
            mobile_zoom: 1800,
        }
    }
}

impl Settings {
    /// Effective screen shake (respects reduced_motion)
    pub fn effective_screen_shake(&self) -> bool {
        self.screen_shake && !self.reduced_motion
    }

    /// Volume actually handed to the audio sink
    pub fn effective_volume(&self) -> f32 {
        if self.muted || !self.sfx_enabled {
            0.0
        } else {
            self.master_volume.clamp(0.0, 1.0)
        }
    }

    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_scheme_names() {
        for scheme in ControlScheme::ALL {
            assert_eq!(ControlScheme::from_str(scheme.as_str()), Some(scheme));
        }
        assert_eq!(ControlScheme::from_str("Mouse-Aim"), Some(ControlScheme::MouseAim));
        assert_eq!(ControlScheme::from_str("gamepad"), None);
    }

    #[test]
    fn test_reduced_motion_disables_shake() {
        let mut settings = Settings::default();
        assert!(settings.effective_screen_shake());
        settings.reduced_motion = true;
        assert!(!settings.effective_screen_shake());
    }

    #[test]
    fn test_effective_volume() {
        let mut settings = Settings::default();
        settings.set_master_volume(1.5);
        assert_eq!(settings.effective_volume(), 1.0);
        settings.sfx_enabled = false;
        assert_eq!(settings.effective_volume(), 0.0);
    }

    #[test]
    fn test_old_save_settings_fill_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"mobileZoom":1400,"controlScheme":"mouse-only"}"#).unwrap();
        assert_eq!(settings.mobile_zoom, 1400);
        assert_eq!(settings.control_scheme, ControlScheme::MouseOnly);
        assert!(settings.screen_shake);
        assert_eq!(settings.master_volume, 0.7);
    }
}
