use crate::progress::DeviationEvent;
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("notification for '{element_id}' failed: {message}")]
pub struct NotifyError {
    pub element_id: String,
    pub message: String,
}

/// Delivers deviation events to whoever watches the schedule. Transport is up to the
/// implementation; failures never undo the latch on the progress record.
pub trait DeviationNotifier {
    fn notify(&self, event: &DeviationEvent) -> Result<(), NotifyError>;
}

/// Writes each event to the log at warn level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl DeviationNotifier for LogNotifier {
    fn notify(&self, event: &DeviationEvent) -> Result<(), NotifyError> {
        tracing::warn!(
            element = %event.element_id,
            allocated_days = event.allocated_days,
            actual_days = event.actual_days,
            "{event}"
        );
        Ok(())
    }
}

/// Keeps every delivered event in memory so callers can inspect what was sent.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<DeviationEvent>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DeviationEvent> {
        self.events.lock().expect("notifier mutex poisoned").clone()
    }
}

impl DeviationNotifier for RecordingNotifier {
    fn notify(&self, event: &DeviationEvent) -> Result<(), NotifyError> {
        self.events
            .lock()
            .expect("notifier mutex poisoned")
            .push(event.clone());
        Ok(())
    }
}

/// Hands each event to the notifier, logging failures instead of returning them.
/// Returns how many events were delivered.
pub fn dispatch(notifier: &dyn DeviationNotifier, events: &[DeviationEvent]) -> usize {
    let mut delivered = 0;
    for event in events {
        match notifier.notify(event) {
            Ok(()) => delivered += 1,
            Err(err) => tracing::warn!(error = %err, "deviation notification not delivered"),
        }
    }
    delivered
}

