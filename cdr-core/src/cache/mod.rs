//! Caching layer
//!
//! Holds the instances handed out by `share`. Entries are keyed by the
//! resolved candidate (set path, dependency, identifier) and never by the
//! context, so every context that resolves to the same candidate gets the
//! same object.

mod instance_cache;

pub use instance_cache::{CacheOutcome, CacheStats, CandidateKey, InstanceCache};
