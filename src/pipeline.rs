//! Pipeline orchestration.
//!
//! Thin glue: snapshot -> threat model -> expectations -> mark -> raid
//! options -> raids, with one evidence-ledger append per step and observer
//! notifications after each result seals. A raid error (denial, timeout,
//! missing handler) aborts the run; nothing is written to the ledger for the
//! failed raid.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::derive;
use crate::error::PipelineError;
use crate::events::{names, ObserverRegistry, PipelineEvent, PipelineObserver};
use crate::mark::{MarkEngine, MarkResult};
use crate::plunder::EvidenceLedger;
use crate::raid::{ApprovalGate, ApprovalHandler, RaidEngine, RaidResult};
use crate::snapshot::Snapshot;
use crate::threat::{ThreatModelEngine, ThreatModelResult};

// ============================================================================
// CONFIG + REPORT
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineConfig {
    /// Evidence ledger file; one per pipeline instance.
    pub ledger_path: PathBuf,
    /// Applied to every derived raid. `None` runs raids ungated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approval_gate: Option<ApprovalGate>,
}

/// Everything one run produced.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineReport {
    pub threat_model: ThreatModelResult,
    pub mark: MarkResult,
    pub raids: Vec<RaidResult>,
}

// ============================================================================
// PIPELINE
// ============================================================================

pub struct Pipeline {
    threat: ThreatModelEngine,
    mark: MarkEngine,
    raid: RaidEngine,
    ledger: EvidenceLedger,
    observers: ObserverRegistry,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            threat: ThreatModelEngine::new(),
            mark: MarkEngine::new(),
            raid: RaidEngine::new(),
            ledger: EvidenceLedger::new(),
            observers: ObserverRegistry::new(),
            config,
        }
    }

    pub fn with_approval_handler(mut self, handler: ApprovalHandler) -> Self {
        self.raid = RaidEngine::new().with_approval_handler(handler);
        self
    }

    pub fn with_threat_engine(mut self, engine: ThreatModelEngine) -> Self {
        self.threat = engine;
        self
    }

    pub fn with_mark_engine(mut self, engine: MarkEngine) -> Self {
        self.mark = engine;
        self
    }

    pub fn register_observer(&self, observer: Arc<dyn PipelineObserver>) {
        self.observers.register(observer);
    }

    /// Run the full flow for one snapshot.
    pub async fn run(&self, snapshot: &Snapshot) -> Result<PipelineReport, PipelineError> {
        let ledger_path = self.config.ledger_path.clone();

        // 1. Threat model.
        let threat_model = self.threat.analyze(snapshot, &snapshot.provider, None);
        let appended = self
            .ledger
            .append(
                &ledger_path,
                names::THREAT_MODEL,
                json!({
                    "target": &snapshot.target_id,
                    "provider": &threat_model.provider,
                    "findingCount": threat_model.findings.len(),
                    "riskDistribution": threat_model.risk_distribution,
                }),
            )
            .await?;
        self.observers.notify(&PipelineEvent::EvidenceAppended {
            operation: appended.operation.clone(),
            sequence: appended.sequence,
        });
        self.observers.notify(&PipelineEvent::ThreatModelled {
            target: snapshot.target_id.clone(),
            provider: threat_model.provider.clone(),
            finding_count: threat_model.findings.len(),
        });

        // 2. Drift detection over derived expectations.
        let expectations = derive::to_expectations(&threat_model.findings);
        let mut mark_result = self.mark.evaluate(snapshot, &expectations);
        mark_result.threat_model = Some(threat_model.clone());
        let appended = self
            .ledger
            .append(
                &ledger_path,
                names::MARK,
                json!({
                    "target": &snapshot.target_id,
                    "driftDetected": mark_result.drift_detected,
                    "findings": &mark_result.findings,
                }),
            )
            .await?;
        self.observers.notify(&PipelineEvent::EvidenceAppended {
            operation: appended.operation.clone(),
            sequence: appended.sequence,
        });
        self.observers.notify(&PipelineEvent::MarkCompleted {
            target: snapshot.target_id.clone(),
            drift_detected: mark_result.drift_detected,
        });
        if mark_result.drift_detected {
            self.observers.notify(&PipelineEvent::DriftDetected {
                target: snapshot.target_id.clone(),
                drifted_fields: mark_result
                    .findings
                    .iter()
                    .filter(|f| f.drift)
                    .map(|f| f.field.clone())
                    .collect(),
            });
        }

        // 3. Raids, one per derived vector.
        let mut raids = Vec::new();
        for mut options in derive::to_raid_options(snapshot, &threat_model) {
            options.approval_gate = self.config.approval_gate.clone();
            let result = self.raid.raid(snapshot, &options).await?;
            let appended = self
                .ledger
                .append(
                    &ledger_path,
                    names::RAID,
                    json!({
                        "raidId": &result.raid_id,
                        "target": &result.target,
                        "vector": result.vector,
                        "success": result.success,
                        "controlsHeld": result.controls_held,
                        "findings": &result.findings,
                    }),
                )
                .await?;
            self.observers.notify(&PipelineEvent::EvidenceAppended {
                operation: appended.operation.clone(),
                sequence: appended.sequence,
            });
            self.observers.notify(&PipelineEvent::RaidCompleted {
                target: result.target.clone(),
                vector: result.vector,
                success: result.success,
                controls_held: result.controls_held,
            });
            raids.push(result);
        }

        log::info!(
            "pipeline: '{}' complete - {} threats, drift={}, {} raids",
            snapshot.target_id,
            threat_model.findings.len(),
            mark_result.drift_detected,
            raids.len()
        );

        Ok(PipelineReport {
            threat_model,
            mark: mark_result,
            raids,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
