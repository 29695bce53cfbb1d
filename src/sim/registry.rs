//! Entity identity and lifecycle bookkeeping
//!
//! Registries only track which handles are alive. Rendering and physics state
//! for an entity belong to the host engine.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque reference to an entity tracked by the core
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Handle(pub u32);

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic handle source. Handles are never reused within a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandleAllocator {
    next_id: u32,
}

impl Default for HandleAllocator {
    fn default() -> Self {
        Self { next_id: 1 }
    }
}

impl HandleAllocator {
    /// Allocate a new entity handle
    pub fn next(&mut self) -> Handle {
        let id = self.next_id;
        self.next_id += 1;
        Handle(id)
    }
}

/// Live entities keyed by handle, iterated in handle order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registry<T> {
    entries: BTreeMap<Handle, T>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<T> Registry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track an entity. Returns false if the handle was already tracked.
    pub fn add(&mut self, handle: Handle, value: T) -> bool {
        if self.entries.contains_key(&handle) {
            return false;
        }
        self.entries.insert(handle, value);
        true
    }

    /// Stop tracking an entity, returning its data if it was live
    pub fn remove(&mut self, handle: Handle) -> Option<T> {
        self.entries.remove(&handle)
    }

    pub fn get(&self, handle: Handle) -> Option<&T> {
        self.entries.get(&handle)
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        self.entries.get_mut(&handle)
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.entries.contains_key(&handle)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove every entry, returning the drained handles in order
    pub fn clear(&mut self) -> Vec<Handle> {
        let handles = self.handles();
        self.entries.clear();
        handles
    }

    pub fn handles(&self) -> Vec<Handle> {
        self.entries.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Handle, &T)> {
        self.entries.iter().map(|(h, v)| (*h, v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Handle, &mut T)> {
        self.entries.iter_mut().map(|(h, v)| (*h, v))
    }
}
