//! Crate-wide constants: identifier prefixes and default thresholds.

/// Prefix for drift finding ids (`DRIFT-<uuid>`).
pub const DRIFT_ID_PREFIX: &str = "DRIFT";

/// Prefix for raid ids (`RAID-<uuid>`).
pub const RAID_ID_PREFIX: &str = "RAID";

/// Prefix for threat finding ids (`THREAT-<provider>-<n>`).
pub const THREAT_ID_PREFIX: &str = "THREAT";

/// Default number of records summarized per compaction batch.
pub const DEFAULT_COMPACTION_BATCH: usize = 100;

/// Default approval wait before a gated raid is abandoned (5 minutes).
pub const DEFAULT_APPROVAL_TIMEOUT_MS: u64 = 300_000;

/// Raid intensity bounds.
pub const MIN_INTENSITY: u8 = 1;
pub const MAX_INTENSITY: u8 = 10;

/// Operation name stamped on compaction summary records.
pub const SUMMARY_OPERATION: &str = "batch-summary";

/// Environment tag used when a snapshot does not declare one.
pub const UNSPECIFIED_ENVIRONMENT: &str = "unspecified";
