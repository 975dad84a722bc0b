//! Event sinks
//!
//! The engine publishes every event synchronously to one [`EventSink`] and
//! never looks at what the sink does with it. A sink must therefore be cheap
//! and must not panic; matching behaves identically whichever sink is
//! installed.

use std::sync::Arc;

use parking_lot::RwLock;

use super::{EngineEvent, EventType};

/// Observer for engine events
///
/// Implementations take `&self` so one sink can be shared by the registry,
/// the container and every context created from it.
pub trait EventSink: Send + Sync {
    /// Publish an event; fire-and-forget
    fn publish(&self, event: &EngineEvent);
}

impl<F> EventSink for F
where
    F: Fn(&EngineEvent) + Send + Sync,
{
    fn publish(&self, event: &EngineEvent) {
        self(event)
    }
}

/// Shared handle to a sink
pub type SharedSink = Arc<dyn EventSink>;

/// Sink that discards every event (the default)
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn publish(&self, _event: &EngineEvent) {}
}

/// Returns a shared [`NullSink`]
pub fn null_sink() -> SharedSink {
    Arc::new(NullSink)
}

/// Sink that keeps every event in memory
///
/// Useful for tests and for auditing which candidate a unit of work
/// resolved to.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: RwLock<Vec<EngineEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all events published so far
    pub fn events(&self) -> Vec<EngineEvent> {
        self.events.read().clone()
    }

    /// Events of one type, in publication order
    pub fn events_of_type(&self, event_type: EventType) -> Vec<EngineEvent> {
        self.events
            .read()
            .iter()
            .filter(|e| e.event_type == event_type)
            .cloned()
            .collect()
    }

    /// Event types in publication order
    pub fn event_types(&self) -> Vec<EventType> {
        self.events.read().iter().map(|e| e.event_type).collect()
    }

    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    pub fn clear(&self) {
        self.events.write().clear();
    }
}

impl EventSink for MemorySink {
    fn publish(&self, event: &EngineEvent) {
        self.events.write().push(event.clone());
    }
}

/// Sink that forwards events to `tracing`
///
/// Failures are logged at `warn`, everything else at `debug`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn publish(&self, event: &EngineEvent) {
        if event.event_type.is_failure() {
            tracing::warn!(
                event_type = %event.event_type,
                payload = %event.payload,
                "cdr event"
            );
        } else {
            tracing::debug!(
                event_type = %event.event_type,
                payload = %event.payload,
                "cdr event"
            );
        }
    }
}

/// Sink that publishes to several sinks in order
#[derive(Default)]
pub struct FanoutSink {
    sinks: Vec<SharedSink>,
}

impl FanoutSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: SharedSink) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl std::fmt::Debug for FanoutSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FanoutSink")
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

impl EventSink for FanoutSink {
    fn publish(&self, event: &EngineEvent) {
        for sink in &self.sinks {
            sink.publish(event);
        }
    }
}
