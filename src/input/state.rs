//! Raw device state captured once per frame

use std::collections::BTreeSet;

use super::events::{KeyCode, MouseButton};

/// Immutable capture of keyboard and mouse state for a single frame
///
/// The dispatch loop keeps two of these (current and previous) and derives
/// every edge condition from the pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceSnapshot {
    /// Keys held down at sample time
    pub held_keys: BTreeSet<KeyCode>,
    /// Mouse button states
    pub buttons: MouseButtons,
    /// Pointer position in logical pixels
    pub position: [i32; 2],
    /// Running wheel counter; only differences between frames matter
    pub scroll: i32,
}

/// Down/up state of the tracked mouse buttons
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MouseButtons {
    pub left: bool,
    pub middle: bool,
    pub right: bool,
}

impl MouseButtons {
    /// Returns true if `button` is held
    pub fn is_down(&self, button: MouseButton) -> bool {
        match button {
            MouseButton::Left => self.left,
            MouseButton::Middle => self.middle,
            MouseButton::Right => self.right,
        }
    }

    /// Set the held state of `button`
    pub fn set(&mut self, button: MouseButton, down: bool) {
        match button {
            MouseButton::Left => self.left = down,
            MouseButton::Middle => self.middle = down,
            MouseButton::Right => self.right = down,
        }
    }

    pub fn any(&self) -> bool {
        self.left || self.middle || self.right
    }
}

impl DeviceSnapshot {
    /// Creates an empty snapshot: nothing held, pointer at the origin
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to mark keys as held
    pub fn with_keys(mut self, keys: impl IntoIterator<Item = KeyCode>) -> Self {
        self.held_keys.extend(keys);
        self
    }

    /// Builder method to mark a mouse button as held
    pub fn with_button(mut self, button: MouseButton) -> Self {
        self.buttons.set(button, true);
        self
    }

    /// Builder method to set the pointer position
    pub fn with_position(mut self, x: i32, y: i32) -> Self {
        self.position = [x, y];
        self
    }

    /// Builder method to set the wheel counter
    pub fn with_scroll(mut self, scroll: i32) -> Self {
        self.scroll = scroll;
        self
    }

    /// Returns true if `key` is held
    pub fn is_key_down(&self, key: KeyCode) -> bool {
        self.held_keys.contains(&key)
    }

    /// Returns true if `key` is not held
    pub fn is_key_up(&self, key: KeyCode) -> bool {
        !self.is_key_down(key)
    }

    /// Returns true if `button` is held
    pub fn is_button_down(&self, button: MouseButton) -> bool {
        self.buttons.is_down(button)
    }
}
