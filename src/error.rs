//! Error taxonomy.
//!
//! Raid and ledger operations fail for conditions that represent a broken
//! safety contract and must stop the pipeline. Diagnostic queries (chain
//! verification) return reports instead, and absent-data conditions (unknown
//! provider, missing snapshot field) are valid results, not errors.

use thiserror::Error;

use crate::severity::Severity;

/// Failures raised by the attack-simulation engine.
#[derive(Debug, Error)]
pub enum RaidError {
    /// An approval gate is active for the vector but no approval handler was
    /// supplied. Configuration error, raised before any waiting.
    #[error("vector '{vector}' is gated at {required} severity but no approval handler was supplied")]
    HandlerMissing { vector: String, required: Severity },

    /// The approver rejected the raid.
    #[error("raid '{vector}' against '{target}' denied by {approver}: {reason}")]
    Denied {
        vector: String,
        target: String,
        approver: String,
        reason: String,
    },

    /// No approval response arrived before the gate's timeout.
    #[error("approval for raid '{vector}' against '{target}' timed out after {timeout_ms} ms")]
    ApprovalTimeout {
        vector: String,
        target: String,
        timeout_ms: u64,
    },
}

/// Failures raised by the evidence ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ledger io failure: {0}")]
    Io(#[from] std::io::Error),

    /// A record line could not be parsed while an operation needed to build
    /// on it. `verify` reports the same condition diagnostically instead.
    #[error("ledger record is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Compaction found a broken chain and refused to touch the file.
    #[error("hash chain broken at record index {broken_at}; compaction refused")]
    ChainBroken { broken_at: usize },
}

/// Pipeline-level wrapper so callers surface a single failure type.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Raid(#[from] RaidError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}
