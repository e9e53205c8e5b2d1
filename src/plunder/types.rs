//! Evidence ledger types and the canonical hash encoding.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

// ============================================================================
// PLUNDER RECORD
// ============================================================================

/// One ledger line. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlunderRecord {
    /// 1-based, strictly monotonic.
    pub sequence: u64,
    /// RFC 3339 string; hashed verbatim, so it stays a string end to end.
    pub timestamp: String,
    pub operation: String,
    pub data: Value,
    /// Hash of the preceding record; `None` only for the first record.
    pub previous_hash: Option<String>,
    /// SHA-256 (64 hex chars) over the canonical encoding of the other
    /// fields.
    pub hash: String,
}

impl PlunderRecord {
    /// Build a record and seal its hash.
    pub fn seal(
        sequence: u64,
        operation: &str,
        data: Value,
        previous_hash: Option<String>,
    ) -> Self {
        let mut record = Self {
            sequence,
            timestamp: Utc::now().to_rfc3339(),
            operation: operation.to_string(),
            data,
            previous_hash,
            hash: String::new(),
        };
        record.hash = record.compute_hash();
        record
    }

    /// Recompute the hash from the record's own fields. Canonical encoding:
    /// pipe-joined `sequence|timestamp|operation|data|previousHash` with the
    /// data payload as compact JSON and a literal `null` for a missing
    /// predecessor.
    pub fn compute_hash(&self) -> String {
        let canonical = format!(
            "{}|{}|{}|{}|{}",
            self.sequence,
            self.timestamp,
            self.operation,
            self.data,
            self.previous_hash.as_deref().unwrap_or("null"),
        );

        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        hex::encode(hasher.finalize())
    }
}

// ============================================================================
// VERIFICATION + COMPACTION RESULTS
// ============================================================================

/// Diagnostic result of a chain verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyReport {
    pub valid: bool,
    pub record_count: usize,
    /// Index of the first record that fails verification, if any.
    pub broken_at: Option<usize>,
}

/// Size of a ledger file at one point in time.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerMetrics {
    pub record_count: usize,
    pub file_size_bytes: u64,
}

/// Result of one compaction run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompactionResult {
    pub before: LedgerMetrics,
    pub after: LedgerMetrics,
    /// `(beforeBytes - afterBytes) / beforeBytes`, in `[0, 1]`.
    pub compression: f64,
    /// Absent only when compaction was a no-op on an empty ledger.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_path: Option<PathBuf>,
    pub hash_chain_valid: bool,
    pub compacted_at: DateTime<Utc>,
}

/// Payload of one summary record produced by compaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub time_range: TimeRange,
    pub record_count: usize,
    /// Distinct operation names in the batch, first-seen order.
    pub aggregated_operations: Vec<String>,
    /// CRITICAL-severity objects found anywhere in the batch's data.
    pub critical_findings: Vec<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeRange {
    pub start: String,
    pub end: String,
}

/// Read-back summary for dashboards and tests.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerStats {
    pub record_count: usize,
    pub file_size_bytes: u64,
    pub operations: Vec<String>,
}

// ============================================================================
// TESTS
// ============================================================================
