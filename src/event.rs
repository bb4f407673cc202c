//! Raw event model and the source subscription boundary
//!
//! The host application delivers log events through an `EventSource`; the
//! capture pipeline attaches to it as an `EventSink`. `BroadcastSource` is
//! an in-process fan-out implementation for hosts without their own bus.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Kind of a raw event as reported by the host event source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Plain informational message
    Message,
    /// Warning condition
    Warning,
    /// Recoverable error
    Error,
    /// Unhandled exception
    Exception,
    /// Failed assertion
    Assertion,
}

/// A raw log event delivered by the event source
#[derive(Debug, Clone)]
pub struct RawEvent {
    pub kind: EventKind,
    /// Raw text, expected to start with a `[category]` prefix
    pub text: String,
    /// Stack trace captured by the source, passed through verbatim
    pub stack_trace: Option<String>,
}

impl RawEvent {
    /// Create an event without a stack trace
    pub fn new(kind: EventKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            stack_trace: None,
        }
    }

    /// Attach a stack trace to this event
    pub fn with_stack_trace(mut self, trace: impl Into<String>) -> Self {
        self.stack_trace = Some(trace.into());
        self
    }
}

/// Identifier for an active subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Receiver side of the subscription boundary
pub trait EventSink: Send + Sync {
    /// Handle one delivered event; called from whichever thread emits
    fn on_event(&self, event: &RawEvent);
}

/// A host event bus the capture pipeline can attach to
pub trait EventSource: Send + Sync {
    /// Attach a sink; it receives every subsequently emitted event
    fn subscribe(&self, sink: Arc<dyn EventSink>) -> SubscriptionId;

    /// Detach a previously attached sink; unknown ids are ignored
    fn unsubscribe(&self, id: SubscriptionId);
}

/// In-process fan-out event source
///
/// Suitable as the application-wide bus when the host does not bring its
/// own. Events may be emitted from any thread.
pub struct BroadcastSource {
    subscribers: Mutex<HashMap<SubscriptionId, Arc<dyn EventSink>>>,
    next_id: AtomicU64,
}

impl BroadcastSource {
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Deliver an event to every current subscriber
    pub fn emit(&self, event: RawEvent) {
        // Sinks are invoked outside the lock so a sink may subscribe or
        // unsubscribe while events are in flight.
        let sinks: Vec<Arc<dyn EventSink>> = {
            let subscribers = self.lock();
            subscribers.values().cloned().collect()
        };
        for sink in sinks {
            sink.on_event(&event);
        }
    }

    /// Number of currently attached sinks
    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<SubscriptionId, Arc<dyn EventSink>>> {
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl EventSource for BroadcastSource {
    fn subscribe(&self, sink: Arc<dyn EventSink>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().insert(id, sink);
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.lock().remove(&id);
    }
}

impl Default for BroadcastSource {
    fn default() -> Self {
        Self::new()
    }
}
