//! Raw input collection from winit events

use std::any::Any;

use tracing::trace;
use winit::event::{ElementState, MouseScrollDelta, WindowEvent};
use winit::keyboard::PhysicalKey;

use super::events::{KeyCode, MouseButton};
use super::source::SnapshotSource;
use super::state::DeviceSnapshot;

/// Wheel counter units per line notch
pub const WHEEL_UNITS_PER_LINE: f32 = 120.0;

/// Folds winit window events into a running [`DeviceSnapshot`]
pub struct InputCollector {
    state: DeviceSnapshot,
    scale_factor: f64,
}

impl InputCollector {
    /// Creates a new input collector
    pub fn new() -> Self {
        Self {
            state: DeviceSnapshot::new(),
            scale_factor: 1.0,
        }
    }

    /// Update scale factor (DPI scaling)
    pub fn set_scale_factor(&mut self, scale_factor: f64) {
        self.scale_factor = scale_factor;
    }

    /// Handle a winit window event
    pub fn handle_window_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor_moved(position.x, position.y);
            }

            WindowEvent::MouseInput { state, button, .. } => {
                if let Some(button) = MouseButton::from_winit(*button) {
                    self.button_changed(button, *state == ElementState::Pressed);
                }
            }

            WindowEvent::MouseWheel { delta, .. } => match delta {
                MouseScrollDelta::LineDelta(_, y) => self.wheel_lines(*y),
                MouseScrollDelta::PixelDelta(pos) => self.wheel_pixels(pos.y),
            },

            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    self.key_changed(code.into(), event.state == ElementState::Pressed);
                }
            }

            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                self.set_scale_factor(*scale_factor);
            }

            WindowEvent::Focused(false) => self.focus_lost(),

            _ => {}
        }
    }

    /// Record a cursor move given in physical pixels
    pub fn cursor_moved(&mut self, x: f64, y: f64) {
        self.state.position = [
            (x / self.scale_factor).round() as i32,
            (y / self.scale_factor).round() as i32,
        ];
    }

    pub fn button_changed(&mut self, button: MouseButton, down: bool) {
        self.state.buttons.set(button, down);
    }

    pub fn key_changed(&mut self, key: KeyCode, down: bool) {
        if key == KeyCode::Unknown {
            return;
        }
        if down {
            self.state.held_keys.insert(key);
        } else {
            self.state.held_keys.remove(&key);
        }
    }

    /// Advance the wheel counter by `lines` notches (positive is away from the user)
    pub fn wheel_lines(&mut self, lines: f32) {
        let units = (lines * WHEEL_UNITS_PER_LINE).round() as i32;
        self.state.scroll = self.state.scroll.wrapping_add(units);
    }

    /// Advance the wheel counter by a precise (touchpad) pixel delta
    pub fn wheel_pixels(&mut self, pixels: f64) {
        self.state.scroll = self.state.scroll.wrapping_add(pixels.round() as i32);
    }

    /// Release keys and buttons; the window will not see their release events
    pub fn focus_lost(&mut self) {
        trace!(
            keys = self.state.held_keys.len(),
            "focus lost, releasing held input"
        );
        self.state.held_keys.clear();
        self.state.buttons = Default::default();
    }

    /// Get current input state
    pub fn state(&self) -> &DeviceSnapshot {
        &self.state
    }
}

impl Default for InputCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotSource for InputCollector {
    fn sample(&mut self) -> DeviceSnapshot {
        self.state.clone()
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_scaled_to_logical_pixels() {
        let mut collector = InputCollector::new();
        collector.set_scale_factor(2.0);
        collector.cursor_moved(301.0, 99.0);
        assert_eq!(collector.state().position, [151, 50]);
    }

    #[test]
    fn test_keys_tracked_until_release() {
        let mut collector = InputCollector::new();
        collector.key_changed(KeyCode::W, true);
        collector.key_changed(KeyCode::Space, true);
        collector.key_changed(KeyCode::W, false);
        assert!(collector.state().is_key_down(KeyCode::Space));
        assert!(!collector.state().is_key_down(KeyCode::W));
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let mut collector = InputCollector::new();
        collector.key_changed(KeyCode::Unknown, true);
        assert!(collector.state().held_keys.is_empty());
    }

    #[test]
    fn test_wheel_accumulates() {
        let mut collector = InputCollector::new();
        collector.wheel_lines(1.0);
        collector.wheel_lines(1.0);
        collector.wheel_pixels(-30.4);
        assert_eq!(collector.state().scroll, 210);
    }

    #[test]
    fn test_focus_loss_releases_everything() {
        let mut collector = InputCollector::new();
        collector.key_changed(KeyCode::A, true);
        collector.button_changed(MouseButton::Left, true);
        collector.cursor_moved(10.0, 10.0);
        collector.focus_lost();

        assert!(collector.state().held_keys.is_empty());
        assert!(!collector.state().buttons.any());
        // Position survives; only held input is dropped
        assert_eq!(collector.state().position, [10, 10]);
    }

    #[test]
    fn test_sample_is_a_value_copy() {
        let mut collector = InputCollector::new();
        collector.button_changed(MouseButton::Right, true);
        let before = collector.sample();
        collector.button_changed(MouseButton::Right, false);
        assert!(before.buttons.right);
        assert!(!collector.sample().buttons.right);
    }
}
