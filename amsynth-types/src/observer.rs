//! Scoped observer registration.
//!
//! An [`ObserverList`] hands out a [`Subscription`] per registered observer.
//! Dropping the subscription removes the observer, so a subscriber that owns
//! its subscriptions can never be notified after it has gone away.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

struct Entries<O: ?Sized> {
    next_id: u64,
    observers: Vec<(u64, Arc<O>)>,
}

trait Detach: Send + Sync {
    fn detach(&self, id: u64);
}

impl<O: ?Sized + Send + Sync> Detach for Mutex<Entries<O>> {
    fn detach(&self, id: u64) {
        let mut entries = self.lock().unwrap_or_else(PoisonError::into_inner);
        entries.observers.retain(|(entry_id, _)| *entry_id != id);
    }
}

/// A set of observers of type `O` (usually a trait object).
pub struct ObserverList<O: ?Sized> {
    inner: Arc<Mutex<Entries<O>>>,
}

impl<O: ?Sized + Send + Sync + 'static> ObserverList<O> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Entries {
                next_id: 0,
                observers: Vec::new(),
            })),
        }
    }

    fn entries(&self) -> MutexGuard<'_, Entries<O>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register an observer. It stays registered until the returned
    /// subscription is dropped.
    #[must_use = "dropping the subscription unregisters the observer"]
    pub fn subscribe(&self, observer: Arc<O>) -> Subscription {
        let id = {
            let mut entries = self.entries();
            let id = entries.next_id;
            entries.next_id += 1;
            entries.observers.push((id, observer));
            id
        };
        let list: Arc<dyn Detach> = self.inner.clone();
        Subscription {
            id,
            list: Arc::downgrade(&list),
        }
    }

    pub fn len(&self) -> usize {
        self.entries().observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Call `f` for every observer. The list is snapshotted first, so `f`
    /// may subscribe or unsubscribe without deadlocking.
    pub fn notify(&self, f: impl FnMut(&O)) {
        self.notify_except(None, f);
    }

    /// Like [`notify`](Self::notify) but skips the observer behind `origin`.
    pub fn notify_except(&self, origin: Option<&Subscription>, mut f: impl FnMut(&O)) {
        let skip = origin.filter(|s| s.belongs_to(self)).map(|s| s.id);
        let snapshot: Vec<Arc<O>> = self
            .entries()
            .observers
            .iter()
            .filter(|(id, _)| Some(*id) != skip)
            .map(|(_, observer)| Arc::clone(observer))
            .collect();
        for observer in &snapshot {
            f(observer);
        }
    }
}

impl<O: ?Sized + Send + Sync + 'static> Default for ObserverList<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: ?Sized> std::fmt::Debug for ObserverList<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverList").finish_non_exhaustive()
    }
}

/// Handle for one registered observer; unregisters on drop.
pub struct Subscription {
    id: u64,
    list: Weak<dyn Detach>,
}

impl Subscription {
    fn belongs_to<O: ?Sized + Send + Sync + 'static>(&self, list: &ObserverList<O>) -> bool {
        match self.list.upgrade() {
            Some(ours) => {
                Arc::as_ptr(&ours) as *const () == Arc::as_ptr(&list.inner) as *const ()
            }
            None => false,
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(list) = self.list.upgrade() {
            list.detach(self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
