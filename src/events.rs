//! Pipeline event notifications.
//!
//! Explicit observer registration instead of ambient pub/sub: observers are
//! notified strictly after the corresponding result object is sealed and
//! before the pipeline call returns to its caller.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;

use crate::raid::VectorKind;

/// Event names as they appear on the evidence ledger and in logs.
pub mod names {
    pub const THREAT_MODEL: &str = "threat-model";
    pub const MARK: &str = "mark";
    pub const RAID: &str = "raid";
}

/// One finalized pipeline step.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum PipelineEvent {
    ThreatModelled {
        target: String,
        provider: String,
        finding_count: usize,
    },
    MarkCompleted {
        target: String,
        drift_detected: bool,
    },
    DriftDetected {
        target: String,
        drifted_fields: Vec<String>,
    },
    RaidCompleted {
        target: String,
        vector: VectorKind,
        success: bool,
        controls_held: bool,
    },
    EvidenceAppended {
        operation: String,
        sequence: u64,
    },
}

/// Receives sealed-result notifications. Implementations must not block;
/// anything slow belongs on the observer's own executor.
pub trait PipelineObserver: Send + Sync {
    fn on_event(&self, event: &PipelineEvent);
}

/// Registered observers, notified in registration order.
pub struct ObserverRegistry {
    observers: RwLock<Vec<Arc<dyn PipelineObserver>>>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self {
            observers: RwLock::new(Vec::new()),
        }
    }

    pub fn register(&self, observer: Arc<dyn PipelineObserver>) {
        self.observers.write().push(observer);
    }

    pub fn notify(&self, event: &PipelineEvent) {
        for observer in self.observers.read().iter() {
            observer.on_event(event);
        }
    }

    pub fn len(&self) -> usize {
        self.observers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.read().is_empty()
    }
}

impl Default for ObserverRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
