//! Ledger operations: append, verify, compact, read-back.
//!
//! Every operation holds the per-path lane for its whole critical section,
//! so writes to one file never interleave and compaction is atomic from the
//! caller's perspective. Files are small by construction (compaction keeps
//! them so), so the I/O under the lane is plain std::fs.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde_json::Value;

use crate::constants::{DEFAULT_COMPACTION_BATCH, SUMMARY_OPERATION};
use crate::error::LedgerError;
use crate::lane::KeyedLanes;

use super::types::{
    BatchSummary, CompactionResult, LedgerMetrics, LedgerStats, PlunderRecord, TimeRange,
    VerifyReport,
};

/// Append-only evidence ledger over newline-delimited JSON files.
pub struct EvidenceLedger {
    lanes: KeyedLanes<PathBuf>,
}

impl EvidenceLedger {
    pub fn new() -> Self {
        Self {
            lanes: KeyedLanes::new(),
        }
    }

    /// Append one record, chaining it to the current tail.
    pub async fn append(
        &self,
        path: &Path,
        operation: &str,
        data: Value,
    ) -> Result<PlunderRecord, LedgerError> {
        let _lane = self.lanes.acquire(&path.to_path_buf()).await;

        let records = read_records(path)?;
        let sequence = records.last().map(|r| r.sequence + 1).unwrap_or(1);
        let previous_hash = records.last().map(|r| r.hash.clone());
        let record = PlunderRecord::seal(sequence, operation, data, previous_hash);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "{}", serde_json::to_string(&record)?)?;
        writer.flush()?;

        log::debug!(
            "plunder: appended #{} '{}' to {}",
            record.sequence,
            record.operation,
            path.display()
        );
        Ok(record)
    }

    /// Recompute and check the whole chain. Read-only diagnostic: a broken
    /// chain is a report, never an error.
    pub async fn verify(&self, path: &Path) -> Result<VerifyReport, LedgerError> {
        let _lane = self.lanes.acquire(&path.to_path_buf()).await;
        let lines = read_lines(path)?;
        let report = verify_lines(&lines);
        if !report.valid {
            log::warn!(
                "plunder: {} failed verification at record {:?}",
                path.display(),
                report.broken_at
            );
        }
        Ok(report)
    }

    /// Collapse the ledger into per-batch summary records.
    ///
    /// Refuses to run on a broken chain - compaction must never launder
    /// tampering. The full pre-compaction file is copied to
    /// `<path>.backup-<unixMillis>` before anything is rewritten.
    pub async fn compact(
        &self,
        path: &Path,
        batch_size: usize,
    ) -> Result<CompactionResult, LedgerError> {
        let _lane = self.lanes.acquire(&path.to_path_buf()).await;
        let batch_size = if batch_size == 0 {
            DEFAULT_COMPACTION_BATCH
        } else {
            batch_size
        };

        let lines = read_lines(path)?;
        if lines.is_empty() {
            return Ok(CompactionResult {
                before: LedgerMetrics::default(),
                after: LedgerMetrics::default(),
                compression: 0.0,
                backup_path: None,
                hash_chain_valid: true,
                compacted_at: Utc::now(),
            });
        }

        let report = verify_lines(&lines);
        if let Some(broken_at) = report.broken_at {
            return Err(LedgerError::ChainBroken { broken_at });
        }
        let records = parse_records(&lines)?;

        let before = LedgerMetrics {
            record_count: records.len(),
            file_size_bytes: file_size(path),
        };

        let backup_path = PathBuf::from(format!(
            "{}.backup-{}",
            path.display(),
            Utc::now().timestamp_millis()
        ));
        std::fs::copy(path, &backup_path)?;

        // One summary record per batch, chain rebuilt from scratch.
        let mut compacted = Vec::new();
        let mut previous_hash: Option<String> = None;
        for (index, batch) in records.chunks(batch_size).enumerate() {
            let summary = summarize(batch);
            let record = PlunderRecord::seal(
                index as u64 + 1,
                SUMMARY_OPERATION,
                serde_json::to_value(&summary)?,
                previous_hash.take(),
            );
            previous_hash = Some(record.hash.clone());
            compacted.push(record);
        }

        let rewritten = compacted
            .iter()
            .map(|record| serde_json::to_string(record))
            .collect::<Result<Vec<_>, _>>()?;
        std::fs::write(path, rewritten.join("\n") + "\n")?;

        let after = LedgerMetrics {
            record_count: compacted.len(),
            file_size_bytes: file_size(path),
        };
        let compression = if before.file_size_bytes > 0 {
            (before.file_size_bytes.saturating_sub(after.file_size_bytes)) as f64
                / before.file_size_bytes as f64
        } else {
            0.0
        };

        let hash_chain_valid = verify_lines(&rewritten).valid;

        log::info!(
            "plunder: compacted {} ({} -> {} records, {:.0}% smaller)",
            path.display(),
            before.record_count,
            after.record_count,
            compression * 100.0
        );

        Ok(CompactionResult {
            before,
            after,
            compression,
            backup_path: Some(backup_path),
            hash_chain_valid,
            compacted_at: Utc::now(),
        })
    }

    /// Read the ledger back. Strict: a malformed line is an error here.
    pub async fn records(&self, path: &Path) -> Result<Vec<PlunderRecord>, LedgerError> {
        let _lane = self.lanes.acquire(&path.to_path_buf()).await;
        read_records(path)
    }

    /// Record count, byte size, and distinct operations.
    pub async fn stats(&self, path: &Path) -> Result<LedgerStats, LedgerError> {
        let _lane = self.lanes.acquire(&path.to_path_buf()).await;
        let records = read_records(path)?;
        let mut operations = Vec::new();
        for record in &records {
            if !operations.contains(&record.operation) {
                operations.push(record.operation.clone());
            }
        }
        Ok(LedgerStats {
            record_count: records.len(),
            file_size_bytes: file_size(path),
            operations,
        })
    }
}

impl Default for EvidenceLedger {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// INTERNAL HELPERS
// ============================================================================

fn file_size(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

fn read_lines(path: &Path) -> Result<Vec<String>, LedgerError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let reader = BufReader::new(File::open(path)?);
    let mut lines = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if !line.trim().is_empty() {
            lines.push(line);
        }
    }
    Ok(lines)
}

fn parse_records(lines: &[String]) -> Result<Vec<PlunderRecord>, LedgerError> {
    lines
        .iter()
        .map(|line| serde_json::from_str(line).map_err(LedgerError::from))
        .collect()
}

fn read_records(path: &Path) -> Result<Vec<PlunderRecord>, LedgerError> {
    parse_records(&read_lines(path)?)
}

/// Walk the chain front to back; the first record that fails any check is
/// the break point. A line that does not parse breaks at its own index.
fn verify_lines(lines: &[String]) -> VerifyReport {
    let mut previous_hash: Option<String> = None;

    for (index, line) in lines.iter().enumerate() {
        let record: PlunderRecord = match serde_json::from_str(line) {
            Ok(record) => record,
            Err(_) => return broken(lines.len(), index),
        };
        if record.sequence != index as u64 + 1 {
            return broken(lines.len(), index);
        }
        if record.previous_hash != previous_hash {
            return broken(lines.len(), index);
        }
        if record.compute_hash() != record.hash {
            return broken(lines.len(), index);
        }
        previous_hash = Some(record.hash);
    }

    VerifyReport {
        valid: true,
        record_count: lines.len(),
        broken_at: None,
    }
}

fn broken(record_count: usize, index: usize) -> VerifyReport {
    VerifyReport {
        valid: false,
        record_count,
        broken_at: Some(index),
    }
}

/// Summarize one batch: time range, distinct operations, and any
/// CRITICAL-severity objects buried in the batch's data.
fn summarize(batch: &[PlunderRecord]) -> BatchSummary {
    let start = batch.first().map(|r| r.timestamp.clone()).unwrap_or_default();
    let end = batch.last().map(|r| r.timestamp.clone()).unwrap_or_default();

    let mut aggregated_operations = Vec::new();
    let mut critical_findings = Vec::new();
    for record in batch {
        if !aggregated_operations.contains(&record.operation) {
            aggregated_operations.push(record.operation.clone());
        }
        collect_critical(&record.data, &mut critical_findings);
    }

    BatchSummary {
        time_range: TimeRange { start, end },
        record_count: batch.len(),
        aggregated_operations,
        critical_findings,
    }
}

fn collect_critical(value: &Value, out: &mut Vec<Value>) {
    match value {
        Value::Object(map) => {
            if map.get("severity").and_then(Value::as_str) == Some("CRITICAL") {
                out.push(value.clone());
            }
            for child in map.values() {
                collect_critical(child, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_critical(item, out);
            }
        }
        _ => {}
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn ledger_path(dir: &tempfile::TempDir) -> PathBuf {
        dir.path().join("evidence.jsonl")
    }

    #[tokio::test]
    async fn test_append_builds_a_chain() {
        let dir = tempdir().unwrap();
        let path = ledger_path(&dir);
        let ledger = EvidenceLedger::new();

        let first = ledger.append(&path, "raid", json!({ "n": 1 })).await.unwrap();
        let second = ledger.append(&path, "mark", json!({ "n": 2 })).await.unwrap();
        let third = ledger.append(&path, "raid", json!({ "n": 3 })).await.unwrap();

        assert_eq!(first.sequence, 1);
        assert_eq!(first.previous_hash, None);
        assert_eq!(second.previous_hash.as_deref(), Some(first.hash.as_str()));
        assert_eq!(third.previous_hash.as_deref(), Some(second.hash.as_str()));

        let report = ledger.verify(&path).await.unwrap();
        assert!(report.valid);
        assert_eq!(report.record_count, 3);
        assert_eq!(report.broken_at, None);
    }

    #[tokio::test]
    async fn test_tampering_is_detected_at_the_mutated_record() {
        let dir = tempdir().unwrap();
        let path = ledger_path(&dir);
        let ledger = EvidenceLedger::new();

        for n in 0..5 {
            ledger.append(&path, "raid", json!({ "n": n })).await.unwrap();
        }

        // Mutate record 2's data without recomputing its hash.
        let lines = read_lines(&path).unwrap();
        let mut records = parse_records(&lines).unwrap();
        records[2].data = json!({ "n": 999 });
        let rewritten: Vec<String> = records
            .iter()
            .map(|r| serde_json::to_string(r).unwrap())
            .collect();
        std::fs::write(&path, rewritten.join("\n") + "\n").unwrap();

        let report = ledger.verify(&path).await.unwrap();
        assert!(!report.valid);
        assert_eq!(report.broken_at, Some(2));
    }

    #[tokio::test]
    async fn test_unparseable_line_breaks_at_its_index() {
        let dir = tempdir().unwrap();
        let path = ledger_path(&dir);
        let ledger = EvidenceLedger::new();

        ledger.append(&path, "raid", json!({})).await.unwrap();
        let mut content = std::fs::read_to_string(&path).unwrap();
        content.push_str("this is not json\n");
        std::fs::write(&path, content).unwrap();

        let report = ledger.verify(&path).await.unwrap();
        assert!(!report.valid);
        assert_eq!(report.broken_at, Some(1));
    }

    #[tokio::test]
    async fn test_compaction_of_raid_history() {
        let dir = tempdir().unwrap();
        let path = ledger_path(&dir);
        let ledger = EvidenceLedger::new();

        // 100 simulated raids, 3 events each.
        for raid in 0..100 {
            for event in ["raid-started", "raid-probe", "raid-sealed"] {
                ledger
                    .append(
                        &path,
                        event,
                        json!({ "raidId": format!("RAID-{raid}"), "vector": "mfa-bypass" }),
                    )
                    .await
                    .unwrap();
            }
        }

        let result = ledger.compact(&path, 100).await.unwrap();
        assert_eq!(result.before.record_count, 300);
        assert_eq!(result.after.record_count, 3);
        assert!(result.hash_chain_valid);
        assert!(result.compression > 0.5, "compression = {}", result.compression);
        assert!(result.backup_path.as_ref().unwrap().exists());

        // The compacted chain verifies and summaries carry the operations.
        let report = ledger.verify(&path).await.unwrap();
        assert!(report.valid);
        let records = ledger.records(&path).await.unwrap();
        assert!(records.iter().all(|r| r.operation == "batch-summary"));
        let summary: BatchSummary = serde_json::from_value(records[0].data.clone()).unwrap();
        assert_eq!(summary.record_count, 100);
        assert_eq!(
            summary.aggregated_operations,
            vec!["raid-started", "raid-probe", "raid-sealed"]
        );
    }

    #[tokio::test]
    async fn test_compaction_surfaces_critical_findings() {
        let dir = tempdir().unwrap();
        let path = ledger_path(&dir);
        let ledger = EvidenceLedger::new();

        ledger
            .append(
                &path,
                "mark",
                json!({ "findings": [
                    { "id": "DRIFT-1", "severity": "CRITICAL", "field": "mfaConfiguration" },
                    { "id": "DRIFT-2", "severity": "MEDIUM", "field": "passwordPolicy.minimumLength" },
                ]}),
            )
            .await
            .unwrap();
        ledger.append(&path, "raid", json!({ "ok": true })).await.unwrap();

        let result = ledger.compact(&path, 10).await.unwrap();
        assert_eq!(result.after.record_count, 1);

        let records = ledger.records(&path).await.unwrap();
        let summary: BatchSummary = serde_json::from_value(records[0].data.clone()).unwrap();
        assert_eq!(summary.critical_findings.len(), 1);
        assert_eq!(summary.critical_findings[0]["id"], json!("DRIFT-1"));
    }

    #[tokio::test]
    async fn test_compacting_empty_ledger_is_a_no_op() {
        let dir = tempdir().unwrap();
        let path = ledger_path(&dir);
        let ledger = EvidenceLedger::new();

        let result = ledger.compact(&path, 100).await.unwrap();
        assert_eq!(result.before.record_count, 0);
        assert_eq!(result.after.record_count, 0);
        assert_eq!(result.compression, 0.0);
        assert!(result.hash_chain_valid);
        assert!(result.backup_path.is_none());
    }

    #[tokio::test]
    async fn test_compaction_refuses_a_broken_chain() {
        let dir = tempdir().unwrap();
        let path = ledger_path(&dir);
        let ledger = EvidenceLedger::new();

        for n in 0..4 {
            ledger.append(&path, "raid", json!({ "n": n })).await.unwrap();
        }
        // Corrupt record 1.
        let lines = read_lines(&path).unwrap();
        let mut records = parse_records(&lines).unwrap();
        records[1].operation = "forged".to_string();
        let rewritten: Vec<String> = records
            .iter()
            .map(|r| serde_json::to_string(r).unwrap())
            .collect();
        std::fs::write(&path, rewritten.join("\n") + "\n").unwrap();
        let before = std::fs::read_to_string(&path).unwrap();

        let err = ledger.compact(&path, 2).await.unwrap_err();
        assert!(matches!(err, LedgerError::ChainBroken { broken_at: 1 }));
        // Ledger untouched.
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }

    #[tokio::test]
    async fn test_recompaction_never_grows_the_file() {
        let dir = tempdir().unwrap();
        let path = ledger_path(&dir);
        let ledger = EvidenceLedger::new();

        for n in 0..50 {
            ledger.append(&path, "raid", json!({ "n": n })).await.unwrap();
        }
        let first = ledger.compact(&path, 10).await.unwrap();
        let second = ledger.compact(&path, 10).await.unwrap();

        assert!(second.after.file_size_bytes <= second.before.file_size_bytes);
        assert!(second.after.record_count <= first.after.record_count);
        assert!(ledger.verify(&path).await.unwrap().valid);
    }

    #[tokio::test]
    async fn test_appends_resume_after_compaction() {
        let dir = tempdir().unwrap();
        let path = ledger_path(&dir);
        let ledger = EvidenceLedger::new();

        for n in 0..6 {
            ledger.append(&path, "raid", json!({ "n": n })).await.unwrap();
        }
        ledger.compact(&path, 3).await.unwrap();
        ledger.append(&path, "raid", json!({ "post": true })).await.unwrap();

        let report = ledger.verify(&path).await.unwrap();
        assert!(report.valid);
        assert_eq!(report.record_count, 3);
    }

    #[tokio::test]
    async fn test_stats_summarize_operations() {
        let dir = tempdir().unwrap();
        let path = ledger_path(&dir);
        let ledger = EvidenceLedger::new();

        ledger.append(&path, "threat-model", json!({})).await.unwrap();
        ledger.append(&path, "mark", json!({})).await.unwrap();
        ledger.append(&path, "mark", json!({})).await.unwrap();

        let stats = ledger.stats(&path).await.unwrap();
        assert_eq!(stats.record_count, 3);
        assert_eq!(stats.operations, vec!["threat-model", "mark"]);
        assert!(stats.file_size_bytes > 0);
    }
}
