//! Binding records and the composite keys that index them

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use super::events::{DeviceClass, KeyCode};
use super::handler::InputHandler;
use super::predicate::ActionKind;

/// Caller-chosen action id, unique per owner
pub type BindingId = u32;

/// Opaque handle handed back to the callback unchanged
pub type Sender = Rc<dyn Any>;

/// Callback invoked when a binding's predicate holds
pub type Callback<C> = Rc<dyn Fn(&Sender, &mut InputEventArgs<'_, C>)>;

/// Arguments passed to a firing callback
pub struct InputEventArgs<'a, C> {
    /// The handler that fired the callback; bindings may be changed through it
    pub handler: &'a mut InputHandler<C>,
    /// Per-frame context supplied by the host loop
    pub context: &'a mut C,
    /// Seconds since the previous frame
    pub delta_time: f32,
    /// Key that satisfied a keyboard predicate; `None` for mouse bindings
    pub key: Option<KeyCode>,
}

/// Immutable declaration of one (predicate, callback) pair
pub struct Binding<C> {
    pub owner: String,
    pub id: BindingId,
    pub sender: Sender,
    pub device: DeviceClass,
    pub key: Option<KeyCode>,
    pub action: ActionKind,
    pub callback: Callback<C>,
}

impl<C> Binding<C> {
    /// Slot shared by every owner bound to the same id and action
    pub fn binding_key(&self) -> BindingKey {
        BindingKey {
            device: self.device,
            id: self.id,
            action: self.action,
        }
    }

    /// Disambiguates owners within one [`BindingKey`]
    pub fn subscription_key(&self) -> SubscriptionKey {
        SubscriptionKey {
            owner: self.owner.clone(),
            id: self.id,
        }
    }

    /// Invokes the callback with this binding's sender
    pub fn invoke(&self, args: &mut InputEventArgs<'_, C>) {
        (self.callback)(&self.sender, args);
    }
}

impl<C> fmt::Debug for Binding<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("owner", &self.owner)
            .field("id", &self.id)
            .field("device", &self.device)
            .field("key", &self.key)
            .field("action", &self.action)
            .finish_non_exhaustive()
    }
}

/// (device class, id, action kind)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindingKey {
    pub device: DeviceClass,
    pub id: BindingId,
    pub action: ActionKind,
}

/// (owner, id)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionKey {
    pub owner: String,
    pub id: BindingId,
}

/// (application state, owner, id); used only by the pending registry
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScopeKey {
    pub state: String,
    pub owner: String,
    pub id: BindingId,
}

impl ScopeKey {
    /// Returns true if this key was declared for exactly `state` and `owner`
    pub fn matches(&self, state: &str, owner: &str) -> bool {
        self.state == state && self.owner == owner
    }
}
