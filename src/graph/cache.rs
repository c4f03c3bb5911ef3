use crate::foundation::error::NodeflowResult;
use crate::graph::fingerprint::{Fingerprint, fingerprint_graph};
use crate::graph::index::{GraphIndex, index};
use crate::graph::model::GraphDef;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

const DEFAULT_CAPACITY: usize = 64;

/// Structural-hash cache of built indices, safe to share between threads.
///
/// Readers clone the current snapshot under a short read lock and never block each other.
/// Writers build a new snapshot and swap it in; a snapshot that reaches capacity is replaced by
/// a fresh one rather than evicting entry by entry.
#[derive(Debug)]
pub struct IndexCache {
    capacity: usize,
    snapshot: RwLock<Arc<HashMap<Fingerprint, Arc<GraphIndex>>>>,
}

impl Default for IndexCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl IndexCache {
    /// Create a cache holding at most `capacity` indices (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            snapshot: RwLock::new(Arc::new(HashMap::new())),
        }
    }

    /// Return the cached index for `graph`, building and caching it on a miss.
    pub fn get_or_build(&self, graph: &GraphDef) -> NodeflowResult<Arc<GraphIndex>> {
        let key = fingerprint_graph(graph);
        if let Some(hit) = self.lookup(key) {
            tracing::trace!(fingerprint = %key, "index cache hit");
            return Ok(hit);
        }

        let built = Arc::new(index(graph)?);
        let mut guard = self.snapshot.write();
        // Another writer may have won the race while we were building.
        if let Some(hit) = guard.get(&key) {
            return Ok(Arc::clone(hit));
        }
        let mut next = if guard.len() >= self.capacity {
            HashMap::new()
        } else {
            HashMap::clone(&guard)
        };
        next.insert(key, Arc::clone(&built));
        *guard = Arc::new(next);
        Ok(built)
    }

    /// Number of cached indices.
    pub fn len(&self) -> usize {
        self.snapshot.read().len()
    }

    /// `true` when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(&self, key: Fingerprint) -> Option<Arc<GraphIndex>> {
        let snap = Arc::clone(&self.snapshot.read());
        snap.get(&key).cloned()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/graph/cache.rs"]
mod tests;
