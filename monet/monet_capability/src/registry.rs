//! Capability Registry
//!
//! Holds the site's capabilities, in order of preference, with their
//! detection tests. The order of `define()` calls is the site's preference
//! order (first call = most preferred capability).
//!
//! Mutation happens in sessions. [`CapabilityRegistry::acquire`] takes the
//! registry lock and returns a [`RegistrySession`]; the lock is released when
//! the session is dropped, whichever way the holder exits. Reads (`list`,
//! `has`, `get`) never wait on the lock.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tracing::debug;

use monet_core::{Capability, CapabilityError, Result};

use crate::plugin::Plugin;
use crate::test::{DetectionTest, SharedTest};

/// Entry in the capability table
struct RegistryEntry {
    name: Capability,
    test: SharedTest,
}

/// Lock word value while no session holds the lock
const UNLOCKED: u64 = 0;

/// Ordered mapping from capability name to its detection test
#[derive(Default)]
pub struct CapabilityRegistry {
    /// Entries in registration order
    entries: RwLock<Vec<RegistryEntry>>,

    /// The mutation lock: `UNLOCKED`, or the generation of the holding session
    lock: AtomicU64,

    /// Last generation handed out
    generation: AtomicU64,
}

impl CapabilityRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the mutation lock and open a registration session.
    ///
    /// # Returns
    ///
    /// * `Ok(RegistrySession)` - A handle that can mutate the registry and
    ///   releases the lock when dropped.
    /// * `Err` - `CapabilityError::AlreadyAcquired` if another session holds
    ///   the lock.
    pub fn acquire(&self) -> Result<RegistrySession<'_>> {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        self.lock
            .compare_exchange(UNLOCKED, generation, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| CapabilityError::AlreadyAcquired)?;
        debug!("Capability registry lock acquired");
        Ok(RegistrySession {
            registry: self,
            generation,
        })
    }

    /// Release the mutation lock, whoever holds it. Idempotent.
    ///
    /// A session whose lock was taken away this way no longer releases the
    /// lock when dropped, so it cannot end a later session.
    pub fn unlock(&self) {
        if self.lock.swap(UNLOCKED, Ordering::AcqRel) != UNLOCKED {
            debug!("Capability registry lock released");
        }
    }

    /// Whether a registration session currently holds the lock
    pub fn is_locked(&self) -> bool {
        self.lock.load(Ordering::Acquire) != UNLOCKED
    }

    fn release(&self, generation: u64) {
        if self
            .lock
            .compare_exchange(generation, UNLOCKED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            debug!("Capability registry lock released");
        }
    }

    /// Define a capability in a single-step session.
    ///
    /// Fails with `AlreadyAcquired` while another session is open.
    pub fn define(&self, name: &str, test: impl DetectionTest) -> Result<()> {
        self.acquire()?.define(name, test)
    }

    /// Remove a capability in a single-step session, returning its test.
    pub fn undefine(&self, name: &str) -> Result<SharedTest> {
        self.acquire()?.undefine(name)
    }

    /// Register a plugin in a single-step session.
    pub fn use_plugin(&self, plugin: Plugin) -> Result<()> {
        self.acquire()?.use_plugin(plugin)
    }

    /// Registered capabilities in registration order
    pub fn list(&self) -> Vec<Capability> {
        self.entries
            .read()
            .iter()
            .map(|entry| entry.name.clone())
            .collect()
    }

    /// Whether `name` is registered (exact name, no wildcard matching)
    pub fn has(&self, name: &str) -> bool {
        self.entries.read().iter().any(|entry| entry.name == name)
    }

    /// The detection test registered for `name`
    pub fn get(&self, name: &str) -> Option<SharedTest> {
        self.entries
            .read()
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.test.clone())
    }

    /// Number of registered capabilities
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether no capability is registered
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    fn insert(&self, name: Capability, test: SharedTest) {
        let mut entries = self.entries.write();
        match entries.iter_mut().find(|entry| entry.name == name) {
            Some(entry) => {
                entry.test = test;
                debug!("Redefined capability {}", name);
            }
            None => {
                debug!("Defined capability {}", name);
                entries.push(RegistryEntry { name, test });
            }
        }
    }

    fn remove(&self, name: &str) -> Result<SharedTest> {
        let mut entries = self.entries.write();
        let index = entries
            .iter()
            .position(|entry| entry.name == name)
            .ok_or_else(|| CapabilityError::NotDefined(name.to_string()))?;
        debug!("Undefined capability {}", name);
        Ok(entries.remove(index).test)
    }
}

/// A mutation session on a [`CapabilityRegistry`].
///
/// At most one session exists at a time. Dropping the session releases the
/// registry lock.
pub struct RegistrySession<'a> {
    registry: &'a CapabilityRegistry,
    generation: u64,
}

impl RegistrySession<'_> {
    /// Declare a capability and its detection test.
    ///
    /// Redefining an existing name replaces its test and keeps its position;
    /// to move a capability, `undefine` it and define it again.
    ///
    /// # Arguments
    ///
    /// * `name` - The capability name, validated against the name grammar.
    /// * `test` - The capability's detection test.
    pub fn define(&self, name: &str, test: impl DetectionTest) -> Result<()> {
        let name = Capability::new(name)?;
        self.registry.insert(name, std::sync::Arc::new(test));
        Ok(())
    }

    /// Remove a capability and return its detection test.
    ///
    /// Fails with `CapabilityError::NotDefined` if `name` is not registered.
    pub fn undefine(&self, name: &str) -> Result<SharedTest> {
        self.registry.remove(name)
    }

    /// Register a plugin's `(name, test)` pair.
    pub fn use_plugin(&self, plugin: Plugin) -> Result<()> {
        let (name, test) = plugin.into_parts();
        self.registry.insert(name, test);
        Ok(())
    }

    /// Registered capabilities in registration order
    pub fn list(&self) -> Vec<Capability> {
        self.registry.list()
    }

    /// Close the session explicitly.
    pub fn release(self) {}
}

impl Drop for RegistrySession<'_> {
    fn drop(&mut self) {
        self.registry.release(self.generation);
    }
}
