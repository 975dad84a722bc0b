//! Shared instance cache with single-flight initialization

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use serde::Serialize;

use crate::instantiate::Instance;
use crate::path;

/// Cache key: the resolved candidate, never the context
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CandidateKey {
    pub set_path: String,
    pub dependency: String,
    pub identifier: String,
}

impl CandidateKey {
    pub fn new(set_path: impl Into<String>, dependency: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            set_path: set_path.into(),
            dependency: dependency.into(),
            identifier: identifier.into(),
        }
    }
}

impl fmt::Display for CandidateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", path::join(&self.set_path, &self.dependency), self.identifier)
    }
}

/// A cached instance and whether this call created it
#[derive(Debug, Clone)]
pub struct CacheOutcome {
    pub instance: Instance,
    /// True for the one call that ran the initializer
    pub instantiated: bool,
}

/// Compute-once store of shared instances
///
/// Each key owns a `OnceCell`. The map lock is only held to fetch or insert
/// the cell, so instantiating one candidate never blocks lookups of another;
/// concurrent callers for the same key wait on the cell and all receive the
/// instance the first caller produced. A failed initialization leaves the
/// cell empty and the next caller tries again.
///
/// Entries are never evicted.
#[derive(Default)]
pub struct InstanceCache {
    cells: Mutex<HashMap<CandidateKey, Arc<OnceCell<Instance>>>>,
    hits: AtomicU64,
    misses: AtomicU64,
    instantiations: AtomicU64,
    failures: AtomicU64,
}

impl InstanceCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn cell(&self, key: &CandidateKey) -> Arc<OnceCell<Instance>> {
        let mut cells = self.cells.lock();
        match cells.get(key) {
            Some(cell) => cell.clone(),
            None => cells.entry(key.clone()).or_default().clone(),
        }
    }

    /// Return the instance stored under `key`, running `init` if there is
    /// none yet. At most one `init` runs per key at a time.
    pub fn get_or_try_insert_with<F, E>(&self, key: &CandidateKey, init: F) -> Result<CacheOutcome, E>
    where
        F: FnOnce() -> Result<Instance, E>,
    {
        let cell = self.cell(key);
        if let Some(instance) = cell.get() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(CacheOutcome {
                instance: instance.clone(),
                instantiated: false,
            });
        }

        let mut instantiated = false;
        let instance = cell.get_or_try_init(|| {
            instantiated = true;
            self.misses.fetch_add(1, Ordering::Relaxed);
            let result = init();
            match &result {
                Ok(_) => self.instantiations.fetch_add(1, Ordering::Relaxed),
                Err(_) => self.failures.fetch_add(1, Ordering::Relaxed),
            };
            result
        })?;

        // Another caller finished initializing while we waited
        if !instantiated {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }

        Ok(CacheOutcome {
            instance: instance.clone(),
            instantiated,
        })
    }

    /// The stored instance, without initializing
    pub fn get(&self, key: &CandidateKey) -> Option<Instance> {
        self.cells.lock().get(key).and_then(|cell| cell.get().cloned())
    }

    /// Keys with a stored instance
    pub fn keys(&self) -> Vec<CandidateKey> {
        self.cells
            .lock()
            .iter()
            .filter(|(_, cell)| cell.get().is_some())
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Number of stored instances
    pub fn len(&self) -> usize {
        self.cells.lock().values().filter(|cell| cell.get().is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);

        CacheStats {
            entries: self.len(),
            hits,
            misses,
            hit_rate: if hits + misses > 0 {
                hits as f64 / (hits + misses) as f64
            } else {
                0.0
            },
            instantiations: self.instantiations.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

impl fmt::Debug for InstanceCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceCache").field("stats", &self.stats()).finish()
    }
}

/// Cache statistics
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    /// Current number of stored instances
    pub entries: usize,
    /// Lookups served from the cache
    pub hits: u64,
    /// Lookups that ran the initializer
    pub misses: u64,
    /// Hit rate (0.0 - 1.0)
    pub hit_rate: f64,
    /// Successful initializations
    pub instantiations: u64,
    /// Failed initializations
    pub failures: u64,
}
