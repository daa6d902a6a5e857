//! Capability registry: the set of invocable capabilities.
//!
//! The registry is written during startup (or an explicit hot-reload) and
//! read on every request. Writers build a fresh snapshot and swap it in
//! whole, so a reader holding a snapshot never sees a half-registered entry
//! and never waits on another reader.

use crate::capability::{Capability, CapabilityDescriptor};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

#[derive(Clone, Default)]
struct Snapshot {
    order: Vec<String>,
    entries: HashMap<String, Arc<CapabilityDescriptor>>,
}

/// Name → descriptor mapping with stable registration order.
pub struct CapabilityRegistry {
    current: RwLock<Arc<Snapshot>>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(Snapshot::default())),
        }
    }

    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Register a capability. Replaces any existing capability with the same
    /// name; the replacement keeps the original's position in [`list`](Self::list).
    ///
    /// Returns the descriptor that was replaced, if any.
    pub fn register(&self, descriptor: CapabilityDescriptor) -> Option<Arc<CapabilityDescriptor>> {
        let name = descriptor.name().to_string();
        let descriptor = Arc::new(descriptor);

        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = Snapshot::clone(&current);
        let previous = next.entries.insert(name.clone(), descriptor);
        if previous.is_none() {
            next.order.push(name.clone());
        }
        *current = Arc::new(next);

        debug!(capability = %name, replaced = previous.is_some(), "Capability registered");
        previous
    }

    /// Register a [`Capability`] implementation.
    pub fn register_capability(
        &self,
        capability: Arc<dyn Capability>,
    ) -> Option<Arc<CapabilityDescriptor>> {
        self.register(CapabilityDescriptor::from_capability(capability))
    }

    /// Get a capability by name.
    pub fn lookup(&self, name: &str) -> Option<Arc<CapabilityDescriptor>> {
        self.snapshot().entries.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.snapshot().entries.contains_key(name)
    }

    /// All descriptors in registration order.
    pub fn list(&self) -> Vec<Arc<CapabilityDescriptor>> {
        let snapshot = self.snapshot();
        snapshot
            .order
            .iter()
            .filter_map(|name| snapshot.entries.get(name).cloned())
            .collect()
    }

    /// All registered names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.snapshot().order.clone()
    }

    pub fn len(&self) -> usize {
        self.snapshot().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }
}

impl Default for CapabilityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityRegistry")
            .field("capabilities", &self.names())
            .finish()
    }
}

/// Collects descriptors during startup, then finalizes them into a registry.
#[derive(Default)]
pub struct RegistryBuilder {
    descriptors: Vec<CapabilityDescriptor>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, descriptor: CapabilityDescriptor) -> Self {
        self.descriptors.push(descriptor);
        self
    }

    pub fn with_capability(self, capability: Arc<dyn Capability>) -> Self {
        self.with(CapabilityDescriptor::from_capability(capability))
    }

    pub fn build(self) -> CapabilityRegistry {
        let mut snapshot = Snapshot::default();
        for descriptor in self.descriptors {
            let name = descriptor.name().to_string();
            if snapshot.entries.insert(name.clone(), Arc::new(descriptor)).is_none() {
                snapshot.order.push(name);
            }
        }
        CapabilityRegistry {
            current: RwLock::new(Arc::new(snapshot)),
        }
    }
}
