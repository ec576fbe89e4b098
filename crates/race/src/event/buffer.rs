use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::notifier::RaceObserver;
use super::types::RaceEvent;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggedEvent {
    pub sequence: u32,
    pub event: RaceEvent,
}

#[derive(Debug, Default)]
struct Pending {
    events: VecDeque<LoggedEvent>,
    next_sequence: u32,
}

#[derive(Debug)]
pub struct EventLog {
    pending: Mutex<Pending>,
    max_pending: usize,
}

impl EventLog {
    pub fn new(max_pending: usize) -> Self {
        Self {
            pending: Mutex::new(Pending {
                events: VecDeque::with_capacity(max_pending),
                next_sequence: 0,
            }),
            max_pending: max_pending.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Pending> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn push(&self, event: RaceEvent) -> u32 {
        let mut pending = self.lock();
        let sequence = pending.next_sequence;
        pending.next_sequence = pending.next_sequence.wrapping_add(1);

        if pending.events.len() >= self.max_pending {
            if let Some(evicted) = pending.events.pop_front() {
                log::warn!("Event log full, evicting #{}: {}", evicted.sequence, evicted.event);
            }
        }

        pending.events.push_back(LoggedEvent { sequence, event });
        sequence
    }

    pub fn drain(&self) -> Vec<LoggedEvent> {
        self.lock().events.drain(..).collect()
    }

    pub fn events(&self) -> Vec<RaceEvent> {
        self.lock().events.iter().map(|e| e.event.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().events.is_empty()
    }

    pub fn clear(&self) {
        self.lock().events.clear();
    }
}

impl RaceObserver for EventLog {
    fn on_event(&self, event: &RaceEvent) {
        self.push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_returns_in_order() {
        let log = EventLog::new(8);
        log.push(RaceEvent::countdown_tick("3"));
        log.push(RaceEvent::countdown_tick("2"));

        let drained = log.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].sequence, 0);
        assert_eq!(drained[1].event, RaceEvent::countdown_tick("2"));
        assert!(log.is_empty());
    }

    #[test]
    fn full_log_evicts_oldest() {
        let log = EventLog::new(2);
        log.push(RaceEvent::CountdownCancelled);
        log.push(RaceEvent::CountdownHidden);
        log.push(RaceEvent::RaceFinished);

        assert_eq!(
            log.events(),
            vec![RaceEvent::CountdownHidden, RaceEvent::RaceFinished]
        );
    }
}
