//! Registry of fix-up actions keyed by handle

use crate::{Action, Handle};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Mapping from handle to registered action
///
/// Iteration follows handle order, which is also registration order.
/// Batches never iterate the live map: they take a [`snapshot`] so that
/// actions may register or deregister while the batch is running.
///
/// [`snapshot`]: ActionRegistry::snapshot
#[derive(Default)]
pub struct ActionRegistry {
    /// Registered actions
    actions: BTreeMap<Handle, Arc<dyn Action>>,
    /// Handle the next registration will receive
    next: Handle,
}

impl ActionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an action under a freshly minted handle
    pub fn insert(&mut self, action: Arc<dyn Action>) -> Handle {
        let handle = self.next;
        self.next = handle.successor();
        self.actions.insert(handle, action);
        handle
    }

    /// Remove an action, returning it if it was registered
    ///
    /// Unknown or already removed handles are ignored.
    pub fn remove(&mut self, handle: Handle) -> Option<Arc<dyn Action>> {
        self.actions.remove(&handle)
    }

    /// Check whether a handle is registered
    pub fn contains(&self, handle: Handle) -> bool {
        self.actions.contains_key(&handle)
    }

    /// Get the number of registered actions
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Check whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Handles currently registered, in order
    pub fn handles(&self) -> Vec<Handle> {
        self.actions.keys().copied().collect()
    }

    /// Copy the current contents for a batch
    ///
    /// The returned list holds its own references, so the registry can be
    /// mutated while the batch walks it.
    pub fn snapshot(&self) -> Vec<(Handle, Arc<dyn Action>)> {
        self.actions
            .iter()
            .map(|(handle, action)| (*handle, Arc::clone(action)))
            .collect()
    }
}
