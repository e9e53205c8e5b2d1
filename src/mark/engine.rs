//! Drift evaluation logic. Input: snapshot + expectations. Output: MarkResult.

use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::constants::DRIFT_ID_PREFIX;
use crate::snapshot::Snapshot;

use super::policy::SeverityPolicy;
use super::types::{DriftFinding, Expectation, MarkResult, Operator};

/// Drift detection engine. Pure over its inputs; the only state is the
/// severity policy chosen at construction.
pub struct MarkEngine {
    policy: SeverityPolicy,
}

impl MarkEngine {
    pub fn new() -> Self {
        Self {
            policy: SeverityPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: SeverityPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Evaluate every expectation against the snapshot. Never fails: an
    /// absent field is drift, not an error.
    pub fn evaluate(&self, snapshot: &Snapshot, expectations: &[Expectation]) -> MarkResult {
        let findings: Vec<DriftFinding> = expectations
            .iter()
            .map(|expectation| self.evaluate_one(snapshot, expectation))
            .collect();

        let drift_detected = findings.iter().any(|f| f.drift);
        if drift_detected {
            log::warn!(
                "mark: drift detected on '{}' ({}/{} expectations violated)",
                snapshot.target_id,
                findings.iter().filter(|f| f.drift).count(),
                findings.len()
            );
        } else {
            log::debug!(
                "mark: '{}' matches all {} expectations",
                snapshot.target_id,
                findings.len()
            );
        }

        MarkResult {
            findings,
            drift_detected,
            threat_model: None,
        }
    }

    fn evaluate_one(&self, snapshot: &Snapshot, expectation: &Expectation) -> DriftFinding {
        let actual = snapshot.resolve(&expectation.field);
        // Fail-closed: a field the snapshot does not report cannot be shown
        // to satisfy the expectation.
        let holds = match actual {
            None => false,
            Some(value) => operator_holds(expectation.operator, value, &expectation.value),
        };
        let drift = !holds;

        // A satisfied expectation still carries its severity so consumers
        // can rank what was at stake.
        let severity = self.policy.classify(&expectation.field, actual);

        DriftFinding {
            id: format!("{}-{}", DRIFT_ID_PREFIX, Uuid::new_v4()),
            field: expectation.field.clone(),
            expected: expectation.value.clone(),
            actual: actual.cloned().unwrap_or(Value::Null),
            drift,
            severity,
            description: describe(expectation, actual, drift),
            timestamp: Utc::now(),
            threat_ref: expectation.threat_ref.clone(),
        }
    }
}

impl Default for MarkEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Does `actual` satisfy `operator expected`?
fn operator_holds(operator: Operator, actual: &Value, expected: &Value) -> bool {
    match operator {
        Operator::Eq => actual == expected,
        Operator::Neq => actual != expected,
        Operator::Gte => match (actual.as_f64(), expected.as_f64()) {
            (Some(a), Some(e)) => a >= e,
            _ => false,
        },
        Operator::Lte => match (actual.as_f64(), expected.as_f64()) {
            (Some(a), Some(e)) => a <= e,
            _ => false,
        },
        Operator::Exists => !actual.is_null(),
    }
}

fn describe(expectation: &Expectation, actual: Option<&Value>, drift: bool) -> String {
    match (drift, actual) {
        (false, _) => format!(
            "Field '{}' satisfies {} {}",
            expectation.field,
            expectation.operator.as_str(),
            expectation.value
        ),
        (true, None) => format!(
            "Field '{}' expected {} {} but the field is absent",
            expectation.field,
            expectation.operator.as_str(),
            expectation.value
        ),
        (true, Some(observed)) => format!(
            "Field '{}' expected {} {}, observed {}",
            expectation.field,
            expectation.operator.as_str(),
            expectation.value,
            observed
        ),
    }
}

// ============================================================================
// TESTS
// ============================================================================
