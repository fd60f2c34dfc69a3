//! Scoped Input
//!
//! State-scoped input bindings for frame-driven games: declare bindings once,
//! activate them per application state, fire them from a per-frame diff of
//! device snapshots.

/// Input configuration (screen geometry for edge predicates)
pub mod config;

/// Usage errors raised by registration, activation and dispatch
pub mod error;

/// Binding registry, active table, predicates and dispatch
pub mod input;

/// Tracing subscriber setup
pub mod logging;

pub use config::{InputConfig, ScreenConfig};
pub use error::{InputError, Result};
pub use input::InputHandler;
