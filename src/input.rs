//! Raw device state to per-frame [`TickInput`]
//!
//! Platforms fill a [`RawInput`] from whatever devices they have; the active
//! [`ControlScheme`] decides how it steers the ship.

use glam::Vec2;

use crate::settings::ControlScheme;
use crate::sim::TickInput;

/// Device state sampled once per frame
#[derive(Debug, Clone, Default)]
pub struct RawInput {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    /// Fire key (space)
    pub fire_key: bool,
    /// Pointer position in arena coordinates
    pub pointer: Option<Vec2>,
    pub primary_button: bool,
    pub secondary_button: bool,
    /// Touch joystick: facing angle and whether it is pushed far enough to thrust
    pub joystick: Option<(f32, bool)>,
    pub autopilot: bool,
}

impl RawInput {
    /// Screen-space direction from the direction keys (unnormalized)
    fn key_vector(&self) -> Vec2 {
        let mut dir = Vec2::ZERO;
        if self.up {
            dir.y -= 1.0;
        }
        if self.down {
            dir.y += 1.0;
        }
        if self.left {
            dir.x -= 1.0;
        }
        if self.right {
            dir.x += 1.0;
        }
        dir
    }
}

/// Build this frame's ship input. Touch joysticks take priority over every
/// scheme.
pub fn map_input(scheme: ControlScheme, raw: &RawInput, ship_pos: Vec2) -> TickInput {
    let pointer_fire = scheme.uses_pointer() && raw.primary_button;
    let mut input = TickInput {
        fire: raw.fire_key || pointer_fire,
        autopilot: raw.autopilot,
        ..Default::default()
    };

    if let Some((angle, thrust)) = raw.joystick {
        input.aim_angle = Some(angle);
        input.thrust = thrust;
        return input;
    }

    let aim = raw.pointer.map(|p| {
        let d = p - ship_pos;
        d.y.atan2(d.x)
    });

    match scheme {
        ControlScheme::Keyboard => {
            input.turn_left = raw.left;
            input.turn_right = raw.right;
            input.thrust = raw.up;
        }
        ControlScheme::MouseAim => {
            input.aim_angle = aim;
            let keys = raw.key_vector();
            input.move_dir = (keys != Vec2::ZERO).then_some(keys);
        }
        ControlScheme::MouseOnly => {
            input.aim_angle = aim;
            input.thrust = raw.secondary_button;
        }
    }
    input
}
