//! End-to-end scenarios across the four engines.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tempfile::tempdir;

use privateer_core::{
    derive, ApprovalGate, ApprovalHandler, ApprovalResponse, EvidenceLedger, Expectation,
    MarkEngine, Operator, Pipeline, PipelineConfig, PipelineEvent, PipelineObserver, RaidEngine,
    RaidOptions, Severity, Snapshot, ThreatModelEngine, VectorKind,
};

fn weak_cognito_pool() -> Snapshot {
    Snapshot::new(
        "aws-cognito",
        "user-pool-1",
        json!({
            "mfaConfiguration": "OFF",
            "passwordPolicy": { "minimumLength": 8 },
            "environment": "production",
            "relatedResources": ["app-client-1"],
        }),
    )
}

// ============================================================================
// CORE SCENARIOS
// ============================================================================

#[test]
fn scenario_a_mfa_off_is_critical_drift() {
    let engine = MarkEngine::new();
    let snapshot = Snapshot::new("aws-cognito", "pool", json!({ "mfaConfiguration": "OFF" }));
    let expectation = Expectation::new("mfaConfiguration", Operator::Eq, json!("ON"));

    let result = engine.evaluate(&snapshot, &[expectation]);
    let finding = &result.findings[0];
    assert!(finding.drift);
    assert_eq!(finding.severity, Severity::Critical);
    assert_eq!(finding.actual, json!("OFF"));
    assert_eq!(finding.expected, json!("ON"));
}

#[tokio::test]
async fn scenario_b_mfa_bypass_raid_succeeds_against_open_pool() {
    let engine = RaidEngine::new();
    let snapshot = Snapshot::new("aws-cognito", "pool", json!({ "mfaConfiguration": "OFF" }));
    let options = RaidOptions::new(VectorKind::MfaBypass, 9);

    let result = engine.raid(&snapshot, &options).await.unwrap();
    assert!(result.success);
    assert!(!result.controls_held);
    assert!(!result.timeline.is_empty());
}

#[test]
fn scenario_c_mfa_on_matches_expectation() {
    let engine = MarkEngine::new();
    let snapshot = Snapshot::new("aws-cognito", "pool", json!({ "mfaConfiguration": "ON" }));
    let expectation = Expectation::new("mfaConfiguration", Operator::Eq, json!("ON"));

    let result = engine.evaluate(&snapshot, &[expectation]);
    assert!(!result.drift_detected);
}

#[tokio::test]
async fn scenario_d_compaction_of_raid_event_history() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("evidence.jsonl");
    let ledger = EvidenceLedger::new();

    for raid in 0..100 {
        for event in ["raid-started", "raid-probe", "raid-sealed"] {
            ledger
                .append(&path, event, json!({ "raidId": format!("RAID-{raid}") }))
                .await
                .unwrap();
        }
    }

    let result = ledger.compact(&path, 100).await.unwrap();
    assert_eq!(result.after.record_count, 3);
    assert!(result.hash_chain_valid);
    assert!(result.compression > 0.5);
}

#[tokio::test]
async fn scenario_e_medium_vector_skips_critical_gate() {
    let invoked = Arc::new(AtomicBool::new(false));
    let invoked_clone = invoked.clone();
    let handler: ApprovalHandler = Arc::new(move |_req| {
        invoked_clone.store(true, Ordering::SeqCst);
        Box::pin(async {
            ApprovalResponse {
                approved: true,
                approver: "nobody".to_string(),
                timestamp: Utc::now(),
                reason: None,
            }
        })
    });
    let engine = RaidEngine::new().with_approval_handler(handler);

    let options = RaidOptions::new(VectorKind::PasswordSpray, 5).with_gate(ApprovalGate {
        required_severity: Severity::Critical,
        ..Default::default()
    });
    let result = engine.raid(&weak_cognito_pool(), &options).await.unwrap();

    assert!(!result.approval_required);
    assert!(!invoked.load(Ordering::SeqCst));
}

// ============================================================================
// FULL PIPELINE
// ============================================================================

struct EventLog {
    events: Mutex<Vec<String>>,
}

impl PipelineObserver for EventLog {
    fn on_event(&self, event: &PipelineEvent) {
        let tag = match event {
            PipelineEvent::ThreatModelled { .. } => "threat-modelled",
            PipelineEvent::MarkCompleted { .. } => "mark-completed",
            PipelineEvent::DriftDetected { .. } => "drift-detected",
            PipelineEvent::RaidCompleted { .. } => "raid-completed",
            PipelineEvent::EvidenceAppended { .. } => "evidence-appended",
        };
        self.events.lock().push(tag.to_string());
    }
}

#[tokio::test]
async fn full_pipeline_marks_raids_and_records_evidence() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempdir().unwrap();
    let path = dir.path().join("evidence.jsonl");
    let pipeline = Pipeline::new(PipelineConfig {
        ledger_path: path.clone(),
        approval_gate: None,
    });
    let observer = Arc::new(EventLog {
        events: Mutex::new(Vec::new()),
    });
    pipeline.register_observer(observer.clone());

    let report = pipeline.run(&weak_cognito_pool()).await.unwrap();

    // Threats found and drift confirmed.
    assert!(!report.threat_model.findings.is_empty());
    assert!(report.mark.drift_detected);
    assert!(report.mark.threat_model.is_some());

    // Every drift finding references the threat it came from.
    assert!(report
        .mark
        .findings
        .iter()
        .all(|f| f.threat_ref.as_deref().map(|r| r.starts_with("THREAT-aws-cognito-")) == Some(true)));

    // MFA off means the bypass raid gets through.
    let mfa_raid = report
        .raids
        .iter()
        .find(|r| r.vector == VectorKind::MfaBypass)
        .expect("mfa-bypass raid should have been derived");
    assert!(mfa_raid.success);
    assert!(!mfa_raid.controls_held);

    // Evidence chain is intact and covers every step.
    let ledger = EvidenceLedger::new();
    let report_verify = ledger.verify(&path).await.unwrap();
    assert!(report_verify.valid);
    assert_eq!(report_verify.record_count, 2 + report.raids.len());

    // Observer ordering: threat model before mark, mark before raids.
    let events = observer.events.lock().clone();
    let position = |tag: &str| events.iter().position(|e| e == tag).unwrap();
    assert!(position("threat-modelled") < position("mark-completed"));
    assert!(position("mark-completed") < position("raid-completed"));
    assert!(events.contains(&"drift-detected".to_string()));
}

#[tokio::test]
async fn gated_pipeline_records_the_approver() {
    let dir = tempdir().unwrap();
    let handler: ApprovalHandler = Arc::new(|_req| {
        Box::pin(async {
            ApprovalResponse {
                approved: true,
                approver: "security-oncall".to_string(),
                timestamp: Utc::now(),
                reason: Some("window approved".to_string()),
            }
        })
    });
    let pipeline = Pipeline::new(PipelineConfig {
        ledger_path: dir.path().join("evidence.jsonl"),
        approval_gate: Some(ApprovalGate {
            required_severity: Severity::High,
            approvers: vec!["security-oncall".to_string()],
            timeout_ms: 1_000,
            channel: "webhook".to_string(),
        }),
    })
    .with_approval_handler(handler);

    let report = pipeline.run(&weak_cognito_pool()).await.unwrap();

    for raid in &report.raids {
        if raid.vector.base_severity() >= Severity::High {
            assert!(raid.approval_required);
            assert_eq!(raid.approver.as_deref(), Some("security-oncall"));
        } else {
            assert!(!raid.approval_required);
            assert_eq!(raid.approver, None);
        }
    }
}

#[tokio::test]
async fn derived_expectations_close_the_loop_on_a_hardened_pool() {
    // Derive expectations from a weak pool's threats, then show a hardened
    // pool satisfies all of them.
    let threat_engine = ThreatModelEngine::new();
    let weak = weak_cognito_pool();
    let model = threat_engine.analyze(&weak, "aws-cognito", None);
    let expectations = derive::to_expectations(&model.findings);
    assert!(!expectations.is_empty());

    let hardened = Snapshot::new(
        "aws-cognito",
        "user-pool-1",
        json!({
            "mfaConfiguration": "ON",
            "riskConfiguration": { "enabled": true },
            "passwordPolicy": { "minimumLength": 16 },
            "accessTokenValidity": 8,
            "deviceConfiguration": { "challengeRequiredOnNewDevice": true },
            "adminCreateUserConfig": { "allowAdminCreateUserOnly": true },
        }),
    );
    let result = MarkEngine::new().evaluate(&hardened, &expectations);
    assert!(!result.drift_detected, "{:?}", result.findings);
}

#[tokio::test]
async fn snapshot_fields_are_never_mutated() {
    let dir = tempdir().unwrap();
    let pipeline = Pipeline::new(PipelineConfig {
        ledger_path: dir.path().join("evidence.jsonl"),
        approval_gate: None,
    });
    let snapshot = weak_cognito_pool();
    let fields_before: Value = snapshot.fields.clone();

    pipeline.run(&snapshot).await.unwrap();
    assert_eq!(snapshot.fields, fields_before);
}
