//! StateStore - named state slots with synchronous change notification
//!
//! Handlers write, UI collaborators read and observe. Last write wins; no
//! history is kept.

use super::types::{StateValue, SubscriptionId};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::trace;

type ObserverFn = Arc<dyn Fn(&str, &StateValue) + Send + Sync>;

struct Observers {
    next_id: u64,
    list: Vec<(SubscriptionId, ObserverFn)>,
}

/// Shared key/value state with observer notification
///
/// Cloning yields another handle onto the same store.
#[derive(Clone)]
pub struct StateStore {
    slots: Arc<RwLock<HashMap<String, StateValue>>>,
    observers: Arc<RwLock<Observers>>,
}

impl StateStore {
    pub fn new() -> Self {
        Self {
            slots: Arc::new(RwLock::new(HashMap::new())),
            observers: Arc::new(RwLock::new(Observers {
                next_id: 0,
                list: Vec::new(),
            })),
        }
    }

    /// Overwrite a slot and notify observers, in subscription order
    ///
    /// Observers run after the write lock is released, so they may read the
    /// store. They must not block.
    pub fn set(&self, key: &str, value: impl Into<StateValue>) {
        let value = value.into();
        trace!(key, %value, "State set");

        self.slots.write().insert(key.to_string(), value.clone());

        // Snapshot so observers may subscribe/unsubscribe without deadlocking
        let observers: Vec<ObserverFn> = self
            .observers
            .read()
            .list
            .iter()
            .map(|(_, f)| Arc::clone(f))
            .collect();
        for observer in observers {
            observer(key, &value);
        }
    }

    /// Last value written to `key`, `None` if never set
    pub fn get(&self, key: &str) -> Option<StateValue> {
        self.slots.read().get(key).cloned()
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.slots.read().get(key).and_then(StateValue::as_bool)
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.slots.read().get(key).and_then(StateValue::as_int)
    }

    pub fn get_text(&self, key: &str) -> Option<String> {
        self.slots
            .read()
            .get(key)
            .and_then(|v| v.as_text().map(str::to_string))
    }

    /// Known keys, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.slots.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Copy of all slots, ordered by key
    pub fn snapshot(&self) -> BTreeMap<String, StateValue> {
        self.slots
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Subscribe to every `set`
    pub fn subscribe<F>(&self, observer: F) -> SubscriptionId
    where
        F: Fn(&str, &StateValue) + Send + Sync + 'static,
    {
        let mut observers = self.observers.write();
        let id = SubscriptionId(observers.next_id);
        observers.next_id += 1;
        observers.list.push((id, Arc::new(observer)));
        id
    }

    /// Remove an observer; returns whether it was subscribed
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut observers = self.observers.write();
        let before = observers.list.len();
        observers.list.retain(|(sid, _)| *sid != id);
        observers.list.len() != before
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateStore")
            .field("slots", &self.snapshot())
            .field("observers", &self.observers.read().list.len())
            .finish()
    }
}
