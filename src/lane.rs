//! KeyedLanes - the crate's single keyed-queue primitive.
//!
//! A map from resource key to a FIFO-fair async lock. Raids serialize on the
//! snapshot's target id; the evidence ledger serializes on the file path.
//! Operations on the same key queue behind each other; operations on
//! different keys run fully in parallel.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Guard for one lane. The lane stays blocked until this is dropped.
pub struct LaneGuard {
    _guard: OwnedMutexGuard<()>,
    /// True when the caller had to queue behind an operation already holding
    /// the lane.
    pub waited: bool,
}

/// Map from resource key to the tail of a chain of pending operations.
pub struct KeyedLanes<K: Eq + Hash + Clone> {
    lanes: Mutex<HashMap<K, Arc<AsyncMutex<()>>>>,
}

impl<K: Eq + Hash + Clone> KeyedLanes<K> {
    pub fn new() -> Self {
        Self {
            lanes: Mutex::new(HashMap::new()),
        }
    }

    /// Acquire the lane for `key`, queuing FIFO behind any in-flight holder.
    pub async fn acquire(&self, key: &K) -> LaneGuard {
        let lane = {
            let mut lanes = self.lanes.lock();
            lanes
                .entry(key.clone())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };

        // Fast path first so callers can observe whether they were serialized.
        match lane.clone().try_lock_owned() {
            Ok(guard) => LaneGuard {
                _guard: guard,
                waited: false,
            },
            Err(_) => LaneGuard {
                _guard: lane.lock_owned().await,
                waited: true,
            },
        }
    }

    /// Number of keys that have ever held a lane.
    pub fn len(&self) -> usize {
        self.lanes.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lanes.lock().is_empty()
    }
}

impl<K: Eq + Hash + Clone> Default for KeyedLanes<K> {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
