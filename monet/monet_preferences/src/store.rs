//! The user's preference store.
//!
//! Holds an allow-list and a deny-list of capability patterns. A pattern is
//! in at most one of the two lists: allowing it removes it from the deny-list
//! and vice versa.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use monet_core::{matches, Capability, Result};

use crate::events::{ChangeKind, Listeners, PreferenceEvent, SubscriptionId};
use crate::preferences::Preferences;

/// Replacement lists returned from an `update` closure.
///
/// `None` leaves the corresponding list untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreferenceUpdate {
    /// New allow-list, in order
    pub allow: Option<Vec<String>>,

    /// New deny-list, in order
    pub deny: Option<Vec<String>>,
}

#[derive(Default)]
struct PreferenceLists {
    allows: Vec<Capability>,
    denies: Vec<Capability>,
}

impl PreferenceLists {
    fn allow(&mut self, capability: Capability) {
        self.denies.retain(|denied| *denied != capability);
        if !self.allows.contains(&capability) {
            self.allows.push(capability);
        }
    }

    fn deny(&mut self, capability: Capability) {
        self.allows.retain(|allowed| *allowed != capability);
        if !self.denies.contains(&capability) {
            self.denies.push(capability);
        }
    }
}

/// The user's allow/deny preferences over capability patterns
#[derive(Default)]
pub struct UserPreferences {
    lists: RwLock<PreferenceLists>,
    listeners: Listeners,
}

impl UserPreferences {
    /// Create an empty preference store
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow a capability pattern.
    ///
    /// # Arguments
    ///
    /// * `pattern` - A capability name, possibly a `namespace/*` wildcard.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The pattern is in the allow-list and not in the deny-list.
    /// * `Err` - `CapabilityError::InvalidFormat` if `pattern` is not a valid
    ///   capability name. Nothing is changed in that case.
    pub fn allow(&self, pattern: &str) -> Result<()> {
        let capability = Capability::new(pattern)?;
        self.lists.write().allow(capability.clone());
        debug!("Allowed {}", capability);
        self.listeners.notify(&PreferenceEvent::Changed {
            kind: ChangeKind::Allow,
            capability,
        });
        Ok(())
    }

    /// Deny a capability pattern. See [`allow`](Self::allow).
    pub fn deny(&self, pattern: &str) -> Result<()> {
        let capability = Capability::new(pattern)?;
        self.lists.write().deny(capability.clone());
        debug!("Denied {}", capability);
        self.listeners.notify(&PreferenceEvent::Changed {
            kind: ChangeKind::Deny,
            capability,
        });
        Ok(())
    }

    /// Whether the user denies `name`.
    ///
    /// True iff some deny pattern matches `name` and `name` itself is not in
    /// the allow-list. An exact allow entry overrides any wildcard deny.
    pub fn denies(&self, name: &str) -> bool {
        let lists = self.lists.read();
        lists.denies.iter().any(|denied| matches(denied.as_str(), name))
            && !lists.allows.iter().any(|allowed| *allowed == name)
    }

    /// Snapshot of both lists
    pub fn get(&self) -> Preferences {
        let lists = self.lists.read();
        Preferences::new(lists.allows.clone(), lists.denies.clone())
    }

    /// Replace the allow-list and/or deny-list in one step.
    ///
    /// `update_fn` receives the current snapshot. Every returned pattern is
    /// validated before anything changes. The allow-list is applied first,
    /// then the deny-list, so a pattern present in both ends up denied.
    /// Listeners receive `PreferenceEvent::Updated` only if a list changed.
    pub fn update<F>(&self, update_fn: F) -> Result<()>
    where
        F: FnOnce(&Preferences) -> PreferenceUpdate,
    {
        let update = update_fn(&self.get());
        let allow = parse_all(update.allow)?;
        let deny = parse_all(update.deny)?;

        let changed = {
            let mut lists = self.lists.write();
            let mut changed = false;

            if let Some(allow) = allow {
                changed |= allow != lists.allows;
                lists.allows.clear();
                for capability in allow {
                    lists.allow(capability);
                }
            }
            if let Some(deny) = deny {
                changed |= deny != lists.denies;
                lists.denies.clear();
                for capability in deny {
                    lists.deny(capability);
                }
            }

            changed
        };

        if changed {
            debug!("Preferences updated");
            self.listeners.notify(&PreferenceEvent::Updated);
        }
        Ok(())
    }

    /// Register a listener called synchronously after every successful change.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&PreferenceEvent) + Send + Sync + 'static,
    {
        self.listeners.subscribe(Arc::new(listener))
    }

    /// Remove a listener. Returns whether it was registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.listeners.unsubscribe(id)
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

fn parse_all(patterns: Option<Vec<String>>) -> Result<Option<Vec<Capability>>> {
    patterns
        .map(|patterns| patterns.into_iter().map(Capability::new).collect())
        .transpose()
}
