//! Privateer Core - Adversarial GRC Validation Engine
//!
//! Instead of trusting a self-reported compliance claim, Privateer derives a
//! threat model for a resource, checks whether its actual configuration has
//! drifted from the ideal state that threat model implies, simulates the
//! corresponding attacks to see whether controls actually hold, and records
//! every step in a tamper-evident evidence ledger.
//!
//! ## Engines
//! - `threat/` - "Spyglass": per-provider rule tables -> STRIDE-classified
//!   threat findings with MITRE linkage
//! - `mark/` - drift detection: expectations evaluated against a snapshot
//! - `raid/` - attack simulation with per-target lane serialization and a
//!   severity-gated approval state machine
//! - `plunder/` - hash-chained, append-only evidence ledger
//!
//! `derive` turns threat findings into drift expectations and raid options;
//! `pipeline` wires the whole flow together and notifies observers.
//!
//! All "attacks" are deterministic simulations over snapshot fields. The core
//! performs no network I/O and never touches live infrastructure.

pub mod constants;
pub mod error;
pub mod severity;
pub mod snapshot;
pub mod lane;
pub mod events;

// Engines
pub mod mark;
pub mod threat;
pub mod raid;
pub mod plunder;

// Derivation + orchestration
pub mod derive;
pub mod pipeline;

pub use error::{LedgerError, PipelineError, RaidError};
pub use events::{PipelineEvent, PipelineObserver};
pub use mark::{DriftFinding, Expectation, MarkEngine, MarkResult, Operator, SeverityPolicy};
pub use pipeline::{Pipeline, PipelineConfig, PipelineReport};
pub use plunder::{CompactionResult, EvidenceLedger, PlunderRecord, VerifyReport};
pub use raid::{
    ApprovalGate, ApprovalHandler, ApprovalRequest, ApprovalResponse, RaidEngine, RaidOptions,
    RaidResult, VectorKind,
};
pub use severity::{Severity, Stride};
pub use snapshot::Snapshot;
pub use threat::{AnalyzeOptions, ThreatFinding, ThreatModelEngine, ThreatModelResult};
