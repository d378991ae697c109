//! Check-in events for downstream collaborators (rewards, notifications).

use presence_types::CheckinRecord;

/// Emitted after a commit that wrote to the ledger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckinEvent {
    /// The pair just passed. Emitted once per pair, by the commit that wrote it.
    Passed { record: CheckinRecord },
    /// A committed attempt fell short; the user may retry.
    Failed { record: CheckinRecord },
}

pub trait EventSink: Send + Sync {
    fn publish(&self, event: &CheckinEvent);
}

/// Synchronous fan-out event bus.
///
/// Listeners are invoked inline on the committing request; keep handlers fast
/// and hand heavy work to a queue.
pub struct EventBus {
    listeners: Vec<Box<dyn Fn(&CheckinEvent) + Send + Sync>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&CheckinEvent) + Send + Sync>) {
        self.listeners.push(listener);
    }
}

impl EventSink for EventBus {
    fn publish(&self, event: &CheckinEvent) {
        for listener in &self.listeners {
            listener(event);
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use presence_types::{CheckinId, Timestamp, UserId, VenueId};
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    fn record(passed: bool) -> CheckinRecord {
        let gps = if passed { 40 } else { 0 };
        CheckinRecord {
            id: CheckinId::new([2; 32]),
            user_id: UserId::new("u1"),
            venue_id: VenueId::new("V1"),
            gps_score: gps,
            qr_score: 40,
            receipt_score: 0,
            total_score: gps + 40,
            passed,
            verified_at: Timestamp::new(1),
        }
    }

    #[test]
    fn publish_calls_all_listeners() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut bus = EventBus::new();

        let c1 = Arc::clone(&counter);
        bus.subscribe(Box::new(move |_| {
            c1.fetch_add(1, Ordering::SeqCst);
        }));
        let c2 = Arc::clone(&counter);
        bus.subscribe(Box::new(move |_| {
            c2.fetch_add(10, Ordering::SeqCst);
        }));

        bus.publish(&CheckinEvent::Passed {
            record: record(true),
        });
        assert_eq!(counter.load(Ordering::SeqCst), 11);
    }

    #[test]
    fn listener_sees_variant() {
        let passed = Arc::new(AtomicUsize::new(0));
        let mut bus = EventBus::default();
        let p = Arc::clone(&passed);
        bus.subscribe(Box::new(move |event| {
            if matches!(event, CheckinEvent::Passed { .. }) {
                p.fetch_add(1, Ordering::SeqCst);
            }
        }));

        bus.publish(&CheckinEvent::Failed {
            record: record(false),
        });
        bus.publish(&CheckinEvent::Passed {
            record: record(true),
        });
        assert_eq!(passed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn publish_with_no_listeners_is_noop() {
        EventBus::new().publish(&CheckinEvent::Failed {
            record: record(false),
        });
    }
}
