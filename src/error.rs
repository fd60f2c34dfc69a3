//! Error types for the binding registry and dispatch loop
//!
//! Every variant is a synchronous usage error raised at the offending call.
//! Nothing here is retryable: the caller declared something inconsistent and
//! should fix the declaration.

use thiserror::Error;

use crate::input::{ActionKind, BindingId, DeviceClass};

/// Errors raised by [`InputHandler`](crate::input::InputHandler) and its parts
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    /// `begin_registration` was called while another session was still open
    #[error("registration already begun for owner `{owner}`")]
    SessionAlreadyOpen { owner: String },

    /// `register` or `end_registration` was called outside a session
    #[error("registration has not begun")]
    NoOpenSession,

    /// The same (state, owner, id) was registered twice for one device class
    #[error("binding {id} for owner `{owner}` in state `{state}` already registered for {device:?}")]
    DuplicateBinding {
        state: String,
        owner: String,
        id: BindingId,
        device: DeviceClass,
    },

    /// The active slot for (binding key, subscription key) is already occupied
    #[error("binding {id} ({action:?}) for owner `{owner}` is already active")]
    DuplicateActive {
        owner: String,
        id: BindingId,
        action: ActionKind,
    },

    /// The action kind cannot be evaluated for this device / key filter
    #[error("invalid predicate {action:?} for {device:?}: {reason}")]
    InvalidPredicate {
        device: DeviceClass,
        action: ActionKind,
        reason: &'static str,
    },

    /// Screen geometry the edge predicates cannot work with
    #[error("invalid screen {width}x{height} with edge margin {edge_margin}: {reason}")]
    InvalidScreen {
        width: i32,
        height: i32,
        edge_margin: i32,
        reason: &'static str,
    },

    /// `update` was called from inside a callback of the frame being dispatched
    #[error("update called while a frame is already being dispatched")]
    ReentrantUpdate,
}

/// Result alias used across the input subsystem
pub type Result<T> = std::result::Result<T, InputError>;
