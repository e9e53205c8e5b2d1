//! Expectation deriver - the bridge from threat findings to the other two
//! engines.
//!
//! Two pure mappings: threats -> drift expectations (via a canonical
//! secure-value table) and threats -> raid options (one per distinct attack
//! vector, intensity scaled from base severity).

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use serde_json::{json, Value};

use crate::mark::{Expectation, Operator};
use crate::raid::{RaidOptions, VectorKind};
use crate::severity::Severity;
use crate::snapshot::Snapshot;
use crate::threat::{ThreatFinding, ThreatModelResult};

// ============================================================================
// CANONICAL SECURE VALUES
// ============================================================================

/// What a field looks like when the threat is closed out.
static SECURE_VALUES: Lazy<HashMap<&'static str, (Operator, Value)>> = Lazy::new(|| {
    let mut m = HashMap::new();

    // Authentication posture
    m.insert("mfaConfiguration", (Operator::Eq, json!("ON")));
    m.insert("riskConfiguration", (Operator::Exists, Value::Null));
    m.insert("passwordPolicy.minimumLength", (Operator::Gte, json!(12)));
    m.insert("accessTokenValidity", (Operator::Lte, json!(24)));
    m.insert(
        "deviceConfiguration.challengeRequiredOnNewDevice",
        (Operator::Eq, json!(true)),
    );
    m.insert(
        "adminCreateUserConfig.allowAdminCreateUserOnly",
        (Operator::Eq, json!(true)),
    );

    // Storage exposure
    m.insert("publicAccessBlock", (Operator::Eq, json!(true)));
    m.insert("encryption.enabled", (Operator::Eq, json!(true)));
    m.insert("versioning.enabled", (Operator::Eq, json!(true)));
    m.insert("accessLogging.enabled", (Operator::Eq, json!(true)));

    m
});

/// Map threat findings to drift expectations.
///
/// One expectation per distinct affected field, first threat wins. A field
/// with no canonical secure value degrades to an `exists` check rather than
/// being dropped.
pub fn to_expectations(threats: &[ThreatFinding]) -> Vec<Expectation> {
    let mut seen = HashSet::new();
    let mut expectations = Vec::new();

    for threat in threats {
        if !seen.insert(threat.affected_field.clone()) {
            continue;
        }
        let (operator, value) = SECURE_VALUES
            .get(threat.affected_field.as_str())
            .cloned()
            .unwrap_or((Operator::Exists, Value::Null));
        expectations.push(
            Expectation::new(&threat.affected_field, operator, value)
                .with_threat_ref(&threat.id),
        );
    }

    expectations
}

/// Intensity a vector's base severity earns.
fn intensity_for(severity: Severity) -> u8 {
    match severity {
        Severity::Critical => 9,
        Severity::High => 7,
        Severity::Medium => 5,
        Severity::Low => 3,
    }
}

/// Map a threat model to raid options: one per distinct attack vector in
/// first-seen order. Always dry-run; the core never targets live
/// infrastructure.
pub fn to_raid_options(_snapshot: &Snapshot, threat_model: &ThreatModelResult) -> Vec<RaidOptions> {
    let mut seen: HashSet<VectorKind> = HashSet::new();
    let mut options = Vec::new();

    for threat in &threat_model.findings {
        for &vector in &threat.attack_vectors {
            if !seen.insert(vector) {
                continue;
            }
            options.push(RaidOptions::new(vector, intensity_for(vector.base_severity())));
        }
    }

    options
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::severity::Stride;
    use crate::threat::ThreatModelEngine;

    fn finding(id: &str, field: &str, vectors: &[VectorKind]) -> ThreatFinding {
        ThreatFinding {
            id: id.to_string(),
            stride: Stride::Spoofing,
            mitre_technique: "T1078".to_string(),
            mitre_name: "Valid Accounts".to_string(),
            affected_field: field.to_string(),
            severity: Severity::High,
            attack_vectors: vectors.to_vec(),
            description: String::new(),
        }
    }

    #[test]
    fn test_known_field_maps_to_secure_value() {
        let threats = [finding("THREAT-aws-cognito-0", "mfaConfiguration", &[])];
        let expectations = to_expectations(&threats);

        assert_eq!(expectations.len(), 1);
        assert_eq!(expectations[0].field, "mfaConfiguration");
        assert!(matches!(expectations[0].operator, Operator::Eq));
        assert_eq!(expectations[0].value, json!("ON"));
        assert_eq!(
            expectations[0].threat_ref.as_deref(),
            Some("THREAT-aws-cognito-0")
        );
    }

    #[test]
    fn test_duplicate_fields_first_threat_wins() {
        let threats = [
            finding("THREAT-aws-cognito-0", "mfaConfiguration", &[]),
            finding("THREAT-aws-cognito-1", "mfaConfiguration", &[]),
        ];
        let expectations = to_expectations(&threats);

        assert_eq!(expectations.len(), 1);
        assert_eq!(
            expectations[0].threat_ref.as_deref(),
            Some("THREAT-aws-cognito-0")
        );
    }

    #[test]
    fn test_unmapped_field_degrades_to_exists() {
        let threats = [finding("THREAT-x-0", "someNewControl", &[])];
        let expectations = to_expectations(&threats);

        assert!(matches!(expectations[0].operator, Operator::Exists));
    }

    #[test]
    fn test_raid_options_deduplicate_vectors() {
        let engine = ThreatModelEngine::new();
        let snapshot = Snapshot::new(
            "aws-cognito",
            "user-pool-1",
            serde_json::json!({ "mfaConfiguration": "OFF", "passwordPolicy": { "minimumLength": 6 } }),
        );
        let model = engine.analyze(&snapshot, "aws-cognito", None);
        let options = to_raid_options(&snapshot, &model);

        let mut vectors: Vec<VectorKind> = options.iter().map(|o| o.vector).collect();
        let total = vectors.len();
        vectors.dedup();
        assert_eq!(vectors.len(), total, "vectors must be distinct");
        assert!(vectors.contains(&VectorKind::MfaBypass));
        assert!(options.iter().all(|o| o.dry_run));
    }

    #[test]
    fn test_intensity_tracks_base_severity() {
        let model = ThreatModelResult {
            provider: "aws-s3".to_string(),
            target_id: "bucket-1".to_string(),
            findings: vec![finding(
                "THREAT-aws-s3-0",
                "publicAccessBlock",
                &[VectorKind::PublicExposure, VectorKind::PasswordSpray],
            )],
            risk_distribution: Default::default(),
            analyzed_at: chrono::Utc::now(),
        };
        let snapshot = Snapshot::new("aws-s3", "bucket-1", serde_json::json!({}));
        let options = to_raid_options(&snapshot, &model);

        let by_vector: HashMap<VectorKind, u8> =
            options.iter().map(|o| (o.vector, o.intensity)).collect();
        assert_eq!(by_vector[&VectorKind::PublicExposure], 9); // CRITICAL
        assert_eq!(by_vector[&VectorKind::PasswordSpray], 5); // MEDIUM
    }
}
