//! Edge-detection predicates over a (current, previous) snapshot pair
//!
//! Every action kind is a variant with its own evaluation rule. Evaluation is
//! pure: the same pair of snapshots always yields the same answer, so the
//! dispatch loop can evaluate bindings in any order.

use serde::{Deserialize, Serialize};

use super::events::{DeviceClass, KeyCode, MouseButton};
use super::state::DeviceSnapshot;
use crate::config::ScreenConfig;
use crate::error::{InputError, Result};

/// Condition a binding waits for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    Key(KeyAction),
    Mouse(MouseAction),
}

/// Keyboard conditions, evaluated against a single key filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyAction {
    /// Not held this frame
    Up,
    /// Held this frame
    Down,
    /// Rising edge: up last frame, held this frame
    Pressed,
    /// Falling edge: held last frame, up this frame
    Released,
}

/// Mouse conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseAction {
    ButtonDown(MouseButton),
    ButtonPressed(MouseButton),
    ButtonReleased(MouseButton),
    /// Button held while the pointer moved
    Drag(MouseButton),
    Moved,
    WheelUp,
    WheelDown,
    /// Pointer inside the margin band along one side of the viewport
    ScreenEdge(ScreenEdge),
    /// Fires every frame; the callback does its own hit testing
    Always,
}

/// Side of the viewport used by [`MouseAction::ScreenEdge`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScreenEdge {
    Top,
    Bottom,
    Left,
    Right,
}

/// Sign of the wheel counter change between two frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WheelDirection {
    Up,
    Down,
}

impl From<KeyAction> for ActionKind {
    fn from(action: KeyAction) -> Self {
        Self::Key(action)
    }
}

impl From<MouseAction> for ActionKind {
    fn from(action: MouseAction) -> Self {
        Self::Mouse(action)
    }
}

impl ActionKind {
    /// Device class this action can be evaluated for
    pub fn device_class(&self) -> DeviceClass {
        match self {
            Self::Key(_) => DeviceClass::Keyboard,
            Self::Mouse(_) => DeviceClass::Mouse,
        }
    }

    /// Checks that this action can be evaluated for `device` with `key`
    ///
    /// Keyboard actions need exactly one key filter; mouse actions take none.
    pub fn validate(&self, device: DeviceClass, key: Option<KeyCode>) -> Result<()> {
        let reason = match (self, device, key) {
            (Self::Key(_), DeviceClass::Keyboard, Some(_)) => return Ok(()),
            (Self::Mouse(_), DeviceClass::Mouse, None) => return Ok(()),
            (Self::Key(_), DeviceClass::Keyboard, None) => "keyboard action without a key filter",
            (Self::Key(_), DeviceClass::Mouse, _) => "keyboard action on a mouse binding",
            (Self::Mouse(_), DeviceClass::Keyboard, _) => "mouse action on a keyboard binding",
            (Self::Mouse(_), DeviceClass::Mouse, Some(_)) => "key filter on a mouse binding",
        };
        Err(InputError::InvalidPredicate {
            device,
            action: *self,
            reason,
        })
    }
}

/// Evaluates action kinds against snapshot pairs
///
/// Holds only the screen geometry used by the edge predicates; it keeps no
/// per-frame state of its own.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateDiffer {
    screen: ScreenConfig,
}

impl StateDiffer {
    /// Creates a differ using the given screen geometry for edge tests
    pub fn new(screen: ScreenConfig) -> Self {
        Self { screen }
    }

    /// Screen geometry used for edge tests
    pub fn screen(&self) -> &ScreenConfig {
        &self.screen
    }

    /// Evaluates `action` for a binding on `device` with optional `key` filter
    pub fn evaluate(
        &self,
        action: ActionKind,
        device: DeviceClass,
        key: Option<KeyCode>,
        current: &DeviceSnapshot,
        previous: &DeviceSnapshot,
    ) -> Result<bool> {
        action.validate(device, key)?;
        Ok(match (action, key) {
            (ActionKind::Key(key_action), Some(key)) => {
                Self::key_holds(key_action, key, current, previous)
            }
            (ActionKind::Mouse(mouse_action), _) => self.mouse_holds(mouse_action, current, previous),
            // validate() rejects keyboard actions without a key
            (ActionKind::Key(_), None) => false,
        })
    }

    /// Evaluates a keyboard condition for one key
    pub fn key_holds(
        action: KeyAction,
        key: KeyCode,
        current: &DeviceSnapshot,
        previous: &DeviceSnapshot,
    ) -> bool {
        match action {
            KeyAction::Up => current.is_key_up(key),
            KeyAction::Down => current.is_key_down(key),
            KeyAction::Pressed => previous.is_key_up(key) && current.is_key_down(key),
            KeyAction::Released => previous.is_key_down(key) && current.is_key_up(key),
        }
    }

    /// Evaluates a mouse condition
    pub fn mouse_holds(
        &self,
        action: MouseAction,
        current: &DeviceSnapshot,
        previous: &DeviceSnapshot,
    ) -> bool {
        match action {
            MouseAction::ButtonDown(button) => current.is_button_down(button),
            MouseAction::ButtonPressed(button) => {
                !previous.is_button_down(button) && current.is_button_down(button)
            }
            MouseAction::ButtonReleased(button) => {
                previous.is_button_down(button) && !current.is_button_down(button)
            }
            MouseAction::Drag(button) => {
                current.is_button_down(button) && Self::has_moved(current, previous)
            }
            MouseAction::Moved => Self::has_moved(current, previous),
            MouseAction::WheelUp => {
                Self::wheel_direction(current, previous) == Some(WheelDirection::Up)
            }
            MouseAction::WheelDown => {
                Self::wheel_direction(current, previous) == Some(WheelDirection::Down)
            }
            MouseAction::ScreenEdge(edge) => self.is_at_edge(edge, current.position),
            MouseAction::Always => true,
        }
    }

    /// Returns true if the pointer position changed between the two frames
    pub fn has_moved(current: &DeviceSnapshot, previous: &DeviceSnapshot) -> bool {
        current.position != previous.position
    }

    /// Wheel counter change between the two frames
    pub fn wheel_delta(current: &DeviceSnapshot, previous: &DeviceSnapshot) -> i32 {
        current.scroll.wrapping_sub(previous.scroll)
    }

    /// Direction of the wheel change, `None` when the counter did not move
    pub fn wheel_direction(
        current: &DeviceSnapshot,
        previous: &DeviceSnapshot,
    ) -> Option<WheelDirection> {
        match Self::wheel_delta(current, previous) {
            d if d > 0 => Some(WheelDirection::Up),
            d if d < 0 => Some(WheelDirection::Down),
            _ => None,
        }
    }

    /// Returns true if `pos` lies in the margin band along `edge`
    ///
    /// Top and bottom bands include their inner boundary; left and right
    /// bands exclude it.
    pub fn is_at_edge(&self, edge: ScreenEdge, pos: [i32; 2]) -> bool {
        let [x, y] = pos;
        let ScreenConfig {
            width,
            height,
            edge_margin: margin,
        } = self.screen;
        let within_x = (0..=width).contains(&x);
        let within_y = (0..=height).contains(&y);

        match edge {
            ScreenEdge::Top => y <= margin && y >= 0 && within_x,
            ScreenEdge::Bottom => y >= height - margin && y <= height && within_x,
            ScreenEdge::Left => x < margin && x >= 0 && within_y,
            ScreenEdge::Right => x > width - margin && x <= width && within_y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn differ() -> StateDiffer {
        StateDiffer::default()
    }

    fn eval_key(action: KeyAction, cur: &DeviceSnapshot, prev: &DeviceSnapshot) -> bool {
        differ()
            .evaluate(action.into(), DeviceClass::Keyboard, Some(KeyCode::Space), cur, prev)
            .unwrap()
    }

    fn eval_mouse(action: MouseAction, cur: &DeviceSnapshot, prev: &DeviceSnapshot) -> bool {
        differ()
            .evaluate(action.into(), DeviceClass::Mouse, None, cur, prev)
            .unwrap()
    }

    #[test]
    fn test_key_edges() {
        let up = DeviceSnapshot::new();
        let down = DeviceSnapshot::new().with_keys([KeyCode::Space]);

        assert!(eval_key(KeyAction::Pressed, &down, &up));
        assert!(!eval_key(KeyAction::Pressed, &down, &down));
        assert!(eval_key(KeyAction::Released, &up, &down));
        assert!(!eval_key(KeyAction::Released, &up, &up));
        assert!(eval_key(KeyAction::Down, &down, &down));
        assert!(eval_key(KeyAction::Up, &up, &down));
        assert!(!eval_key(KeyAction::Up, &down, &up));
    }

    #[test]
    fn test_key_filter_ignores_other_keys() {
        let prev = DeviceSnapshot::new();
        let cur = DeviceSnapshot::new().with_keys([KeyCode::W]);
        assert!(!eval_key(KeyAction::Pressed, &cur, &prev));
        assert!(!eval_key(KeyAction::Down, &cur, &prev));
    }

    #[test]
    fn test_button_edges() {
        let up = DeviceSnapshot::new();
        let down = DeviceSnapshot::new().with_button(MouseButton::Left);

        assert!(eval_mouse(MouseAction::ButtonPressed(MouseButton::Left), &down, &up));
        assert!(!eval_mouse(MouseAction::ButtonPressed(MouseButton::Left), &down, &down));
        assert!(eval_mouse(MouseAction::ButtonReleased(MouseButton::Left), &up, &down));
        assert!(eval_mouse(MouseAction::ButtonDown(MouseButton::Left), &down, &down));
        assert!(!eval_mouse(MouseAction::ButtonDown(MouseButton::Right), &down, &down));
    }

    #[test]
    fn test_drag_requires_button_and_motion() {
        let prev = DeviceSnapshot::new().with_position(10, 10);
        let still = DeviceSnapshot::new()
            .with_button(MouseButton::Left)
            .with_position(10, 10);
        let moved = DeviceSnapshot::new()
            .with_button(MouseButton::Left)
            .with_position(12, 10);
        let moved_no_button = DeviceSnapshot::new().with_position(12, 10);

        assert!(eval_mouse(MouseAction::Drag(MouseButton::Left), &moved, &prev));
        assert!(!eval_mouse(MouseAction::Drag(MouseButton::Left), &still, &prev));
        assert!(!eval_mouse(MouseAction::Drag(MouseButton::Left), &moved_no_button, &prev));
        assert!(!eval_mouse(MouseAction::Drag(MouseButton::Middle), &moved, &prev));
        assert!(eval_mouse(MouseAction::Moved, &moved_no_button, &prev));
    }

    #[test]
    fn test_wheel_direction() {
        let base = DeviceSnapshot::new().with_scroll(120);
        let up = DeviceSnapshot::new().with_scroll(240);
        let down = DeviceSnapshot::new().with_scroll(0);

        assert_eq!(StateDiffer::wheel_direction(&up, &base), Some(WheelDirection::Up));
        assert_eq!(StateDiffer::wheel_direction(&down, &base), Some(WheelDirection::Down));
        assert_eq!(StateDiffer::wheel_direction(&base, &base), None);
        assert!(!eval_mouse(MouseAction::WheelUp, &base, &base));
        assert!(!eval_mouse(MouseAction::WheelDown, &base, &base));
    }

    #[test]
    fn test_screen_edges_default_viewport() {
        let d = differ();
        assert!(d.is_at_edge(ScreenEdge::Top, [500, 0]));
        assert!(d.is_at_edge(ScreenEdge::Top, [500, 30]));
        assert!(!d.is_at_edge(ScreenEdge::Top, [500, 31]));
        assert!(!d.is_at_edge(ScreenEdge::Top, [500, -1]));

        assert!(d.is_at_edge(ScreenEdge::Bottom, [500, 1050]));
        assert!(d.is_at_edge(ScreenEdge::Bottom, [500, 1080]));
        assert!(!d.is_at_edge(ScreenEdge::Bottom, [500, 1081]));

        assert!(d.is_at_edge(ScreenEdge::Left, [29, 500]));
        assert!(!d.is_at_edge(ScreenEdge::Left, [30, 500]));

        assert!(d.is_at_edge(ScreenEdge::Right, [1651, 500]));
        assert!(!d.is_at_edge(ScreenEdge::Right, [1650, 500]));
        assert!(!d.is_at_edge(ScreenEdge::Right, [1681, 500]));
    }

    #[test]
    fn test_screen_edges_custom_viewport() {
        let d = StateDiffer::new(ScreenConfig {
            width: 800,
            height: 600,
            edge_margin: 10,
        });
        assert!(d.is_at_edge(ScreenEdge::Right, [795, 300]));
        assert!(!d.is_at_edge(ScreenEdge::Right, [1651, 300]));
        assert!(d.is_at_edge(ScreenEdge::Bottom, [400, 590]));
        assert!(!d.is_at_edge(ScreenEdge::Bottom, [400, 589]));
    }

    #[test]
    fn test_always_fires() {
        let snap = DeviceSnapshot::new();
        assert!(eval_mouse(MouseAction::Always, &snap, &snap));
    }

    #[test]
    fn test_invalid_predicates_rejected() {
        let snap = DeviceSnapshot::new();
        let d = differ();

        let err = d
            .evaluate(KeyAction::Down.into(), DeviceClass::Keyboard, None, &snap, &snap)
            .unwrap_err();
        assert!(matches!(err, InputError::InvalidPredicate { .. }));

        let err = d
            .evaluate(MouseAction::Moved.into(), DeviceClass::Keyboard, Some(KeyCode::A), &snap, &snap)
            .unwrap_err();
        assert!(matches!(err, InputError::InvalidPredicate { .. }));

        let err = d
            .evaluate(KeyAction::Pressed.into(), DeviceClass::Mouse, Some(KeyCode::A), &snap, &snap)
            .unwrap_err();
        assert!(matches!(err, InputError::InvalidPredicate { .. }));

        let err = d
            .evaluate(MouseAction::Moved.into(), DeviceClass::Mouse, Some(KeyCode::A), &snap, &snap)
            .unwrap_err();
        assert!(matches!(err, InputError::InvalidPredicate { .. }));
    }

    fn snapshot_strategy() -> impl Strategy<Value = DeviceSnapshot> {
        (any::<bool>(), any::<bool>(), -50i32..50, -50i32..50, -1000i32..1000).prop_map(
            |(space, left, x, y, scroll)| {
                let mut snap = DeviceSnapshot::new().with_position(x, y).with_scroll(scroll);
                if space {
                    snap.held_keys.insert(KeyCode::Space);
                }
                snap.buttons.left = left;
                snap
            },
        )
    }

    proptest! {
        #[test]
        fn prop_pressed_is_rising_edge(prev in snapshot_strategy(), cur in snapshot_strategy()) {
            let expected = !prev.is_key_down(KeyCode::Space) && cur.is_key_down(KeyCode::Space);
            prop_assert_eq!(eval_key(KeyAction::Pressed, &cur, &prev), expected);
            // Holding the key into the next frame never re-fires
            prop_assert!(!eval_key(KeyAction::Pressed, &cur, &cur));
        }

        #[test]
        fn prop_released_mirrors_pressed(prev in snapshot_strategy(), cur in snapshot_strategy()) {
            prop_assert_eq!(
                eval_key(KeyAction::Released, &cur, &prev),
                eval_key(KeyAction::Pressed, &prev, &cur)
            );
        }

        #[test]
        fn prop_wheel_exclusive(prev in snapshot_strategy(), cur in snapshot_strategy()) {
            let up = eval_mouse(MouseAction::WheelUp, &cur, &prev);
            let down = eval_mouse(MouseAction::WheelDown, &cur, &prev);
            prop_assert!(!(up && down));
            if cur.scroll == prev.scroll {
                prop_assert!(!up && !down);
            }
        }

        #[test]
        fn prop_drag_left(prev in snapshot_strategy(), cur in snapshot_strategy()) {
            let expected = cur.buttons.left && cur.position != prev.position;
            prop_assert_eq!(eval_mouse(MouseAction::Drag(MouseButton::Left), &cur, &prev), expected);
        }
    }
}
