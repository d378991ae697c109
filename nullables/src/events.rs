//! Event sink that records everything it is given.

use presence_verification::{CheckinEvent, EventSink};
use std::sync::Mutex;

#[derive(Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<CheckinEvent>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<CheckinEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn passed_count(&self) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, CheckinEvent::Passed { .. }))
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, CheckinEvent::Failed { .. }))
            .count()
    }
}

impl EventSink for RecordingEventSink {
    fn publish(&self, event: &CheckinEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
