//! Two-phase binding declaration
//!
//! Owners open a session naming every application state they take part in,
//! register all their bindings once, and close the session. Nothing declared
//! here fires until [`ActiveBindingTable::subscribe`] copies it into the live
//! table.
//!
//! [`ActiveBindingTable::subscribe`]: super::active::ActiveBindingTable::subscribe

use std::rc::Rc;

use indexmap::{IndexMap, IndexSet};
use tracing::{debug, trace, warn};

use super::binding::{Binding, BindingId, Callback, ScopeKey, Sender};
use super::events::{DeviceClass, KeyCode};
use super::predicate::ActionKind;
use crate::error::{InputError, Result};

/// Open registration window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationSession {
    /// Application states every registered binding is declared for
    pub states: IndexSet<String>,
    /// Owner the bindings belong to
    pub owner: String,
}

/// Pending (declared but not necessarily active) bindings
pub struct BindingRegistry<C> {
    session: Option<RegistrationSession>,
    pending: IndexMap<(ScopeKey, DeviceClass), Rc<Binding<C>>>,
}

impl<C> BindingRegistry<C> {
    pub fn new() -> Self {
        Self {
            session: None,
            pending: IndexMap::new(),
        }
    }

    /// Opens a session for `owner` covering `states`
    pub fn begin_registration<I, S>(&mut self, states: I, owner: &str) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Some(open) = &self.session {
            warn!(open = %open.owner, requested = %owner, "registration already begun");
            return Err(InputError::SessionAlreadyOpen {
                owner: open.owner.clone(),
            });
        }

        let states: IndexSet<String> = states.into_iter().map(Into::into).collect();
        debug!(owner, ?states, "registration begun");
        self.session = Some(RegistrationSession {
            states,
            owner: owner.to_string(),
        });
        Ok(())
    }

    /// Declares one binding under every state of the open session
    ///
    /// Either every state receives the binding or none does.
    pub fn register(
        &mut self,
        id: BindingId,
        sender: Sender,
        device: DeviceClass,
        key: Option<KeyCode>,
        action: ActionKind,
        callback: Callback<C>,
    ) -> Result<()> {
        let Some(session) = &self.session else {
            warn!(id, "register called outside a registration session");
            return Err(InputError::NoOpenSession);
        };
        action.validate(device, key)?;

        let scope_keys: Vec<ScopeKey> = session
            .states
            .iter()
            .map(|state| ScopeKey {
                state: state.clone(),
                owner: session.owner.clone(),
                id,
            })
            .collect();

        if let Some(taken) = scope_keys
            .iter()
            .find(|scope| self.pending.contains_key(&((*scope).clone(), device)))
        {
            warn!(state = %taken.state, owner = %taken.owner, id, ?device, "duplicate binding");
            return Err(InputError::DuplicateBinding {
                state: taken.state.clone(),
                owner: taken.owner.clone(),
                id,
                device,
            });
        }

        let binding = Rc::new(Binding {
            owner: session.owner.clone(),
            id,
            sender,
            device,
            key,
            action,
            callback,
        });
        trace!(?binding, states = scope_keys.len(), "binding registered");

        for scope in scope_keys {
            self.pending.insert((scope, device), Rc::clone(&binding));
        }
        Ok(())
    }

    /// Closes the open session
    pub fn end_registration(&mut self) -> Result<()> {
        match self.session.take() {
            Some(session) => {
                debug!(owner = %session.owner, "registration ended");
                Ok(())
            }
            None => {
                warn!("end_registration called outside a registration session");
                Err(InputError::NoOpenSession)
            }
        }
    }

    /// The open session, if any
    pub fn session(&self) -> Option<&RegistrationSession> {
        self.session.as_ref()
    }

    pub fn is_registering(&self) -> bool {
        self.session.is_some()
    }

    /// Bindings declared for exactly (`state`, `owner`)
    pub fn matching<'a>(
        &'a self,
        state: &'a str,
        owner: &'a str,
    ) -> impl Iterator<Item = &'a Rc<Binding<C>>> + 'a {
        self.pending
            .iter()
            .filter(move |((scope, _), _)| scope.matches(state, owner))
            .map(|(_, binding)| binding)
    }

    /// Number of (scope, device) entries declared
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl<C> Default for BindingRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{InputEventArgs, KeyAction, MouseAction, MouseButton};

    fn noop() -> Callback<()> {
        Rc::new(|_: &Sender, _: &mut InputEventArgs<'_, ()>| {})
    }

    fn sender() -> Sender {
        Rc::new(())
    }

    fn register_mouse(registry: &mut BindingRegistry<()>, id: BindingId) -> Result<()> {
        registry.register(
            id,
            sender(),
            DeviceClass::Mouse,
            None,
            MouseAction::ButtonPressed(MouseButton::Left).into(),
            noop(),
        )
    }

    #[test]
    fn test_register_requires_session() {
        let mut registry = BindingRegistry::new();
        assert_eq!(register_mouse(&mut registry, 1), Err(InputError::NoOpenSession));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_double_begin_rejected() {
        let mut registry = BindingRegistry::<()>::new();
        registry.begin_registration(["Menu"], "Button1").unwrap();
        let err = registry.begin_registration(["Menu"], "Button2").unwrap_err();
        assert_eq!(
            err,
            InputError::SessionAlreadyOpen {
                owner: "Button1".into()
            }
        );
        // The first session is untouched
        assert_eq!(registry.session().unwrap().owner, "Button1");
    }

    #[test]
    fn test_end_without_begin_rejected() {
        let mut registry = BindingRegistry::<()>::new();
        assert_eq!(registry.end_registration(), Err(InputError::NoOpenSession));
    }

    #[test]
    fn test_end_clears_session() {
        let mut registry = BindingRegistry::<()>::new();
        registry.begin_registration(["Menu", "Gameplay"], "Hud").unwrap();
        assert!(registry.is_registering());
        registry.end_registration().unwrap();
        assert!(!registry.is_registering());
        assert!(registry.session().is_none());
        assert_eq!(register_mouse(&mut registry, 1), Err(InputError::NoOpenSession));
    }

    #[test]
    fn test_register_fans_out_over_states() {
        let mut registry = BindingRegistry::new();
        registry.begin_registration(["Menu", "Gameplay"], "Hud").unwrap();
        register_mouse(&mut registry, 1).unwrap();
        registry.end_registration().unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.matching("Menu", "Hud").count(), 1);
        assert_eq!(registry.matching("Gameplay", "Hud").count(), 1);
        assert_eq!(registry.matching("Options", "Hud").count(), 0);
    }

    #[test]
    fn test_repeated_state_counted_once() {
        let mut registry = BindingRegistry::new();
        registry.begin_registration(["Menu", "Menu"], "Hud").unwrap();
        register_mouse(&mut registry, 1).unwrap();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_duplicate_binding_rejected() {
        let mut registry = BindingRegistry::new();
        registry.begin_registration(["Menu"], "Button1").unwrap();
        register_mouse(&mut registry, 1).unwrap();
        let err = register_mouse(&mut registry, 1).unwrap_err();
        assert!(matches!(err, InputError::DuplicateBinding { id: 1, .. }));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_duplicate_in_later_session_rejected_atomically() {
        let mut registry = BindingRegistry::new();
        registry.begin_registration(["Gameplay"], "Hud").unwrap();
        register_mouse(&mut registry, 1).unwrap();
        registry.end_registration().unwrap();

        registry.begin_registration(["Menu", "Gameplay"], "Hud").unwrap();
        let err = register_mouse(&mut registry, 1).unwrap_err();
        assert!(matches!(
            err,
            InputError::DuplicateBinding { ref state, .. } if state == "Gameplay"
        ));
        // "Menu" did not receive a half-registered copy
        assert_eq!(registry.matching("Menu", "Hud").count(), 0);
    }

    #[test]
    fn test_same_id_on_different_devices_allowed() {
        let mut registry = BindingRegistry::new();
        registry.begin_registration(["Menu"], "Hud").unwrap();
        register_mouse(&mut registry, 1).unwrap();
        registry
            .register(
                1,
                sender(),
                DeviceClass::Keyboard,
                Some(KeyCode::Enter),
                KeyAction::Pressed.into(),
                noop(),
            )
            .unwrap();
        assert_eq!(registry.matching("Menu", "Hud").count(), 2);
    }

    #[test]
    fn test_invalid_predicate_rejected_at_register() {
        let mut registry = BindingRegistry::new();
        registry.begin_registration(["Menu"], "Hud").unwrap();
        let err = registry
            .register(1, sender(), DeviceClass::Keyboard, None, KeyAction::Down.into(), noop())
            .unwrap_err();
        assert!(matches!(err, InputError::InvalidPredicate { .. }));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_owner_match_is_not_a_prefix_match() {
        let mut registry = BindingRegistry::new();
        registry.begin_registration(["Menu"], "AB").unwrap();
        register_mouse(&mut registry, 1).unwrap();
        registry.end_registration().unwrap();

        assert_eq!(registry.matching("Menu", "A").count(), 0);
        assert_eq!(registry.matching("Menu", "AB").count(), 1);
    }
}
