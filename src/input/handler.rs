//! Frame dispatch and the public facade over registry and active table

use std::cell::Cell;
use std::rc::Rc;

use tracing::{trace, warn};

use super::active::ActiveBindingTable;
use super::binding::{Binding, BindingId, InputEventArgs, Sender};
use super::events::{DeviceClass, KeyCode, MouseButton};
use super::predicate::{ActionKind, KeyAction, MouseAction, ScreenEdge, StateDiffer, WheelDirection};
use super::registry::BindingRegistry;
use super::source::SnapshotSource;
use super::state::DeviceSnapshot;
use crate::config::{InputConfig, ScreenConfig};
use crate::error::{InputError, Result};

/// Owns every binding for one application session and fires them each frame
///
/// `C` is the per-frame context handed to callbacks by the host loop.
pub struct InputHandler<C = ()> {
    registry: BindingRegistry<C>,
    active: ActiveBindingTable<C>,
    differ: StateDiffer,
    source: Box<dyn SnapshotSource>,
    current: DeviceSnapshot,
    previous: DeviceSnapshot,
    dispatching: Rc<Cell<bool>>,
}

/// Clears the dispatching flag when the frame ends, even if a callback unwinds
struct DispatchGuard(Rc<Cell<bool>>);

impl DispatchGuard {
    fn enter(flag: &Rc<Cell<bool>>) -> Self {
        flag.set(true);
        Self(Rc::clone(flag))
    }
}

impl Drop for DispatchGuard {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl<C> InputHandler<C> {
    /// Creates a handler with the default 1680x1080 screen geometry
    pub fn new(source: impl SnapshotSource + 'static) -> Self {
        Self::build(Box::new(source), ScreenConfig::default())
    }

    /// Creates a handler using the screen geometry from `config`
    pub fn with_config(source: impl SnapshotSource + 'static, config: &InputConfig) -> Result<Self> {
        Self::with_screen(source, config.screen)
    }

    /// Creates a handler with custom screen geometry; rejects invalid geometry
    pub fn with_screen(source: impl SnapshotSource + 'static, screen: ScreenConfig) -> Result<Self> {
        screen.validate()?;
        Ok(Self::build(Box::new(source), screen))
    }

    fn build(source: Box<dyn SnapshotSource>, screen: ScreenConfig) -> Self {
        Self {
            registry: BindingRegistry::new(),
            active: ActiveBindingTable::new(),
            differ: StateDiffer::new(screen),
            source,
            current: DeviceSnapshot::default(),
            previous: DeviceSnapshot::default(),
            dispatching: Rc::new(Cell::new(false)),
        }
    }

    /// Replace the screen geometry, e.g. after a window resize
    ///
    /// Invalid geometry is rejected and the previous geometry kept.
    pub fn set_screen(&mut self, screen: ScreenConfig) -> Result<()> {
        screen.validate()?;
        self.differ = StateDiffer::new(screen);
        Ok(())
    }

    /// Opens a registration session for `owner` covering `states`
    pub fn begin_registration<I, S>(&mut self, states: I, owner: &str) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.registry.begin_registration(states, owner)
    }

    /// Declares a binding under every state of the open session
    pub fn register<F>(
        &mut self,
        id: BindingId,
        sender: Sender,
        device: DeviceClass,
        key: Option<KeyCode>,
        action: ActionKind,
        callback: F,
    ) -> Result<()>
    where
        F: Fn(&Sender, &mut InputEventArgs<'_, C>) + 'static,
    {
        self.registry
            .register(id, sender, device, key, action, Rc::new(callback))
    }

    /// Declares a keyboard binding on `key`
    pub fn register_key<F>(
        &mut self,
        id: BindingId,
        sender: Sender,
        key: KeyCode,
        action: KeyAction,
        callback: F,
    ) -> Result<()>
    where
        F: Fn(&Sender, &mut InputEventArgs<'_, C>) + 'static,
    {
        self.register(id, sender, DeviceClass::Keyboard, Some(key), action.into(), callback)
    }

    /// Declares a mouse binding
    pub fn register_mouse<F>(
        &mut self,
        id: BindingId,
        sender: Sender,
        action: MouseAction,
        callback: F,
    ) -> Result<()>
    where
        F: Fn(&Sender, &mut InputEventArgs<'_, C>) + 'static,
    {
        self.register(id, sender, DeviceClass::Mouse, None, action.into(), callback)
    }

    /// Closes the open registration session
    pub fn end_registration(&mut self) -> Result<()> {
        self.registry.end_registration()
    }

    /// Activates the bindings `owner` declared for `state`
    pub fn subscribe(&mut self, state: &str, owner: &str) -> Result<usize> {
        self.active.subscribe(&self.registry, state, owner)
    }

    /// Deactivates the bindings `owner` declared for `state`; missing entries are ignored
    pub fn unsubscribe(&mut self, state: &str, owner: &str) -> usize {
        self.active.unsubscribe(&self.registry, state, owner)
    }

    /// Deactivates every binding of `owner` regardless of state
    pub fn unsubscribe_all(&mut self, owner: &str) -> usize {
        self.active.unsubscribe_all(owner)
    }

    /// Samples the device source and fires every live binding whose predicate holds
    ///
    /// The set of bindings is fixed before the first callback runs; changes a
    /// callback makes through [`InputEventArgs::handler`] apply from the next
    /// frame on. Returns the number of callbacks invoked.
    pub fn update(&mut self, context: &mut C, delta_time: f32) -> Result<usize> {
        if self.dispatching.get() {
            warn!("update re-entered from a callback");
            return Err(InputError::ReentrantUpdate);
        }

        self.previous = std::mem::replace(&mut self.current, self.source.sample());
        let live = self.active.snapshot();

        let _guard = DispatchGuard::enter(&self.dispatching);
        self.dispatch(&live, context, delta_time)
    }

    fn dispatch(
        &mut self,
        live: &[Rc<Binding<C>>],
        context: &mut C,
        delta_time: f32,
    ) -> Result<usize> {
        let mut fired = 0;

        for binding in live {
            let holds = self.differ.evaluate(
                binding.action,
                binding.device,
                binding.key,
                &self.current,
                &self.previous,
            )?;
            if !holds {
                continue;
            }

            trace!(owner = %binding.owner, id = binding.id, action = ?binding.action, "firing");
            let mut args = InputEventArgs {
                handler: &mut *self,
                context: &mut *context,
                delta_time,
                key: binding.key,
            };
            binding.invoke(&mut args);
            fired += 1;
        }

        Ok(fired)
    }

    /// Returns true while callbacks of the current frame are running
    pub fn is_dispatching(&self) -> bool {
        self.dispatching.get()
    }

    pub fn source_mut(&mut self) -> &mut dyn SnapshotSource {
        self.source.as_mut()
    }

    /// Borrow the device source as its concrete type
    pub fn source_as_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.source.as_any_mut().downcast_mut::<T>()
    }

    pub fn current(&self) -> &DeviceSnapshot {
        &self.current
    }

    pub fn previous(&self) -> &DeviceSnapshot {
        &self.previous
    }

    pub fn mouse_position(&self) -> [i32; 2] {
        self.current.position
    }

    pub fn previous_mouse_position(&self) -> [i32; 2] {
        self.previous.position
    }

    /// Pointer movement since the previous frame
    pub fn mouse_movement(&self) -> [i32; 2] {
        [
            self.current.position[0].wrapping_sub(self.previous.position[0]),
            self.current.position[1].wrapping_sub(self.previous.position[1]),
        ]
    }

    pub fn has_mouse_moved(&self) -> bool {
        StateDiffer::has_moved(&self.current, &self.previous)
    }

    pub fn is_button_down(&self, button: MouseButton) -> bool {
        self.differ
            .mouse_holds(MouseAction::ButtonDown(button), &self.current, &self.previous)
    }

    pub fn is_button_pressed(&self, button: MouseButton) -> bool {
        self.differ
            .mouse_holds(MouseAction::ButtonPressed(button), &self.current, &self.previous)
    }

    pub fn is_button_released(&self, button: MouseButton) -> bool {
        self.differ
            .mouse_holds(MouseAction::ButtonReleased(button), &self.current, &self.previous)
    }

    pub fn wheel_delta(&self) -> i32 {
        StateDiffer::wheel_delta(&self.current, &self.previous)
    }

    pub fn wheel_direction(&self) -> Option<WheelDirection> {
        StateDiffer::wheel_direction(&self.current, &self.previous)
    }

    pub fn is_key_down(&self, key: KeyCode) -> bool {
        StateDiffer::key_holds(KeyAction::Down, key, &self.current, &self.previous)
    }

    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        StateDiffer::key_holds(KeyAction::Pressed, key, &self.current, &self.previous)
    }

    pub fn is_key_released(&self, key: KeyCode) -> bool {
        StateDiffer::key_holds(KeyAction::Released, key, &self.current, &self.previous)
    }

    /// Keys held in the current frame, in key order
    pub fn held_keys(&self) -> Vec<KeyCode> {
        self.current.held_keys.iter().copied().collect()
    }

    pub fn any_key_down(&self) -> bool {
        !self.current.held_keys.is_empty()
    }

    /// Returns true if the pointer sits in the margin band along `edge`
    pub fn is_at_edge(&self, edge: ScreenEdge) -> bool {
        self.differ.is_at_edge(edge, self.current.position)
    }

    pub fn is_registering(&self) -> bool {
        self.registry.is_registering()
    }

    /// Number of declared (state, owner, id, device) entries
    pub fn pending_count(&self) -> usize {
        self.registry.len()
    }

    /// Number of live bindings
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Returns true if `owner` has a live binding with `id`
    pub fn is_active(&self, owner: &str, id: BindingId) -> bool {
        self.active.is_active(owner, id)
    }
}
