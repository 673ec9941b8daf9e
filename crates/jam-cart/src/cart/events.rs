//! Change notification for cart observers.

use crate::cart::CartChange;
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// Broadcast after every effective cart mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartEvent {
    /// What happened.
    pub change: CartChange,
    /// Sum of quantities after the change (the nav badge value).
    pub item_count: i64,
    /// Distinct products after the change.
    pub unique_items: usize,
    /// Store generation after the change.
    pub generation: u64,
}

type Observer = Arc<dyn Fn(&CartEvent) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    observers: Vec<(u64, Observer)>,
}

/// Fan-out of [`CartEvent`]s to registered callbacks.
///
/// Callbacks run synchronously on the mutating thread, in subscription
/// order. The registry lock is released before they run, so a callback may
/// subscribe or unsubscribe without deadlocking.
#[derive(Clone, Default)]
pub struct ChangeNotifier {
    registry: Arc<Mutex<Registry>>,
}

impl fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChangeNotifier({} observers)", self.len())
    }
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback. It stays registered while the returned
    /// [`Subscription`] is alive.
    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&CartEvent) + Send + Sync + 'static,
    {
        let mut registry = self.lock();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.observers.push((id, Arc::new(observer)));

        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
            detached: false,
        }
    }

    /// Deliver an event to every current observer.
    pub fn emit(&self, event: &CartEvent) {
        let observers: Vec<Observer> = self
            .lock()
            .observers
            .iter()
            .map(|(_, o)| Arc::clone(o))
            .collect();

        for observer in observers {
            observer(event);
        }
    }

    /// Number of registered observers.
    pub fn len(&self) -> usize {
        self.lock().observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle to a registered observer.
///
/// Dropping the handle unsubscribes; call [`Subscription::detach`] to keep
/// the observer for the notifier's whole lifetime.
#[must_use = "dropping a Subscription unsubscribes the observer"]
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Registry>>,
    detached: bool,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("detached", &self.detached)
            .finish()
    }
}

impl Subscription {
    /// Remove the observer now.
    pub fn unsubscribe(mut self) {
        self.remove();
    }

    /// Keep the observer registered after this handle is gone.
    pub fn detach(mut self) {
        self.detached = true;
    }

    fn remove(&mut self) {
        if self.detached {
            return;
        }
        self.detached = true;
        if let Some(registry) = self.registry.upgrade() {
            let mut registry = registry.lock().unwrap_or_else(PoisonError::into_inner);
            registry.observers.retain(|(id, _)| *id != self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.remove();
    }
}
