//! Scoped input bindings
//!
//! Components declare their bindings once, per application state, and toggle
//! them on state transitions instead of re-declaring callbacks:
//!
//! ```text
//! SnapshotSource (winit / scripted) → InputHandler::update
//!                                          ↓
//!          BindingRegistry ──subscribe──→ ActiveBindingTable
//!          (declared, inactive)            (live slots)
//!                                          ↓
//!                                    StateDiffer
//!                                (current vs previous)
//!                                          ↓
//!                                      callbacks
//! ```
//!
//! # Usage
//!
//! ```
//! use std::rc::Rc;
//! use scoped_input::input::{InputHandler, MouseAction, MouseButton, ScriptedSource};
//!
//! let mut input: InputHandler<()> = InputHandler::new(ScriptedSource::new());
//!
//! // Once, at construction
//! input.begin_registration(["Menu"], "Button1")?;
//! input.register_mouse(1, Rc::new(()), MouseAction::ButtonPressed(MouseButton::Left), |_, _| {
//!     // clicked
//! })?;
//! input.end_registration()?;
//!
//! // On every state transition
//! input.subscribe("Menu", "Button1")?;
//!
//! // Each frame
//! input.update(&mut (), 1.0 / 60.0)?;
//!
//! // On leaving the state, and on teardown
//! input.unsubscribe("Menu", "Button1");
//! input.unsubscribe_all("Button1");
//! # Ok::<(), scoped_input::InputError>(())
//! ```

mod active;
mod binding;
mod collector;
mod events;
mod handler;
mod predicate;
mod registry;
mod source;
mod state;

// Re-export public API
pub use active::ActiveBindingTable;
pub use binding::{
    Binding, BindingId, BindingKey, Callback, InputEventArgs, ScopeKey, Sender, SubscriptionKey,
};
pub use collector::{InputCollector, WHEEL_UNITS_PER_LINE};
pub use events::{DeviceClass, KeyCode, MouseButton};
pub use handler::InputHandler;
pub use predicate::{ActionKind, KeyAction, MouseAction, ScreenEdge, StateDiffer, WheelDirection};
pub use registry::{BindingRegistry, RegistrationSession};
pub use source::{ScriptedSource, SnapshotSource};
pub use state::{DeviceSnapshot, MouseButtons};
