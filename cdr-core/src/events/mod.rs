//! Engine events
//!
//! The registry, every context and the container report what they do to an
//! injectable [`EventSink`]. Events are for observability only: the engine
//! never reads anything back from the sink.
//!
//! ```text
//! Registry ──┐
//! Context  ──┼──► EventSink::publish(&EngineEvent)
//! Container ─┘        │
//!                     ├─ NullSink     (default, drops everything)
//!                     ├─ MemorySink   (keeps events for tests/audits)
//!                     ├─ TracingSink  (forwards to `tracing`)
//!                     └─ Fn(&EngineEvent)
//! ```

mod event;
mod sink;

pub use event::{EngineEvent, EventType};
pub use sink::{null_sink, EventSink, FanoutSink, MemorySink, NullSink, SharedSink, TracingSink};
