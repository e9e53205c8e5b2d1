//! PLUNDER - hash-chained, append-only evidence ledger.
//!
//! Newline-delimited JSON, one record per line, each record carrying a
//! SHA-256 over its own fields plus the previous record's hash. Verification
//! is a diagnostic read; compaction refuses to touch a broken chain and
//! backs the file up before rewriting it.

mod ledger;
mod types;

pub use ledger::EvidenceLedger;
pub use types::{
    BatchSummary, CompactionResult, LedgerMetrics, LedgerStats, PlunderRecord, TimeRange,
    VerifyReport,
};
