use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use super::types::RaceEvent;

pub trait RaceObserver: Send + Sync {
    fn on_event(&self, event: &RaceEvent);
}

#[derive(Default)]
struct Observers {
    next_id: u64,
    entries: Vec<(u64, Arc<dyn RaceObserver>)>,
}

fn lock(observers: &Mutex<Observers>) -> MutexGuard<'_, Observers> {
    observers.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Clone, Default)]
pub struct RaceNotifier {
    observers: Arc<Mutex<Observers>>,
}

impl RaceNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, observer: Arc<dyn RaceObserver>) -> Subscription {
        let mut observers = lock(&self.observers);
        let id = observers.next_id;
        observers.next_id += 1;
        observers.entries.push((id, observer));

        Subscription {
            id,
            observers: Arc::downgrade(&self.observers),
        }
    }

    pub fn observer_count(&self) -> usize {
        lock(&self.observers).entries.len()
    }

    pub fn notify(&self, event: RaceEvent) {
        // Observers run outside the lock so they may subscribe or drop guards.
        let targets: Vec<Arc<dyn RaceObserver>> = lock(&self.observers)
            .entries
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect();

        if targets.is_empty() {
            log::warn!("No race observer wired, dropping event: {}", event);
            return;
        }

        for observer in targets {
            observer.on_event(&event);
        }
    }
}

impl fmt::Debug for RaceNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RaceNotifier")
            .field("observers", &self.observer_count())
            .finish()
    }
}

/// Keeps an observer registered; dropping it deregisters.
#[must_use = "dropping a Subscription deregisters the observer"]
pub struct Subscription {
    id: u64,
    observers: Weak<Mutex<Observers>>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(observers) = self.observers.upgrade() {
            lock(&observers).entries.retain(|(id, _)| *id != self.id);
        }
    }
}
