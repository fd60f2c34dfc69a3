//! Live dispatch table
//!
//! Indexed by [`BindingKey`] then [`SubscriptionKey`], so several owners can
//! bind the same id and action independently and be torn down one at a time.

use std::rc::Rc;

use indexmap::IndexMap;
use tracing::{debug, trace, warn};

use super::binding::{Binding, BindingId, BindingKey, SubscriptionKey};
use super::registry::BindingRegistry;
use crate::error::{InputError, Result};

/// One live binding plus the application state that activated it
struct ActiveEntry<C> {
    state: String,
    binding: Rc<Binding<C>>,
}

/// Bindings that currently take part in dispatch
pub struct ActiveBindingTable<C> {
    entries: IndexMap<BindingKey, IndexMap<SubscriptionKey, ActiveEntry<C>>>,
}

impl<C> ActiveBindingTable<C> {
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Activates every binding `owner` declared for `state`
    ///
    /// Fails without activating anything if one of the target slots is
    /// already occupied. Returns the number of bindings activated.
    pub fn subscribe(
        &mut self,
        registry: &BindingRegistry<C>,
        state: &str,
        owner: &str,
    ) -> Result<usize> {
        let incoming: Vec<&Rc<Binding<C>>> = registry.matching(state, owner).collect();

        for binding in &incoming {
            let occupied = self
                .entries
                .get(&binding.binding_key())
                .is_some_and(|slot| slot.contains_key(&binding.subscription_key()));
            if occupied {
                warn!(state, owner, id = binding.id, action = ?binding.action, "binding already active");
                return Err(InputError::DuplicateActive {
                    owner: owner.to_string(),
                    id: binding.id,
                    action: binding.action,
                });
            }
        }

        for binding in &incoming {
            self.entries.entry(binding.binding_key()).or_default().insert(
                binding.subscription_key(),
                ActiveEntry {
                    state: state.to_string(),
                    binding: Rc::clone(binding),
                },
            );
        }

        debug!(state, owner, count = incoming.len(), "subscribed");
        Ok(incoming.len())
    }

    /// Deactivates the bindings `owner` declared for `state`
    ///
    /// Slots that are empty, or were activated under a different state, are
    /// left alone. Returns the number of bindings removed.
    pub fn unsubscribe(&mut self, registry: &BindingRegistry<C>, state: &str, owner: &str) -> usize {
        let mut removed = 0;

        for binding in registry.matching(state, owner) {
            let key = binding.binding_key();
            let Some(slot) = self.entries.get_mut(&key) else {
                trace!(state, owner, id = binding.id, "not active, nothing to remove");
                continue;
            };

            let sub_key = binding.subscription_key();
            if slot.get(&sub_key).is_some_and(|entry| entry.state == state) {
                slot.shift_remove(&sub_key);
                removed += 1;
            } else {
                trace!(state, owner, id = binding.id, "not active, nothing to remove");
            }

            if slot.is_empty() {
                self.entries.shift_remove(&key);
            }
        }

        debug!(state, owner, removed, "unsubscribed");
        removed
    }

    /// Deactivates every binding belonging to `owner`, whatever state activated it
    pub fn unsubscribe_all(&mut self, owner: &str) -> usize {
        let before = self.len();

        for slot in self.entries.values_mut() {
            slot.retain(|sub_key, _| sub_key.owner != owner);
        }
        self.entries.retain(|_, slot| !slot.is_empty());

        let removed = before - self.len();
        debug!(owner, removed, "unsubscribed from all states");
        removed
    }

    /// Copies out the live bindings so callbacks can mutate the table freely
    pub fn snapshot(&self) -> Vec<Rc<Binding<C>>> {
        self.entries
            .values()
            .flat_map(|slot| slot.values())
            .map(|entry| Rc::clone(&entry.binding))
            .collect()
    }

    /// Returns true if any binding with `id` is live for `owner`
    pub fn is_active(&self, owner: &str, id: BindingId) -> bool {
        self.entries
            .values()
            .flat_map(|slot| slot.keys())
            .any(|sub_key| sub_key.owner == owner && sub_key.id == id)
    }

    /// Number of live bindings across all slots
    pub fn len(&self) -> usize {
        self.entries.values().map(IndexMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of live bindings belonging to `owner`
    pub fn count_for(&self, owner: &str) -> usize {
        self.entries
            .values()
            .flat_map(|slot| slot.keys())
            .filter(|sub_key| sub_key.owner == owner)
            .count()
    }
}

impl<C> Default for ActiveBindingTable<C> {
    fn default() -> Self {
        Self::new()
    }
}
