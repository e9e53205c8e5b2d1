//! Drift detection types. No logic here, only data structures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::severity::Severity;
use crate::threat::ThreatModelResult;

// ============================================================================
// EXPECTATION
// ============================================================================

/// Comparison operator applied to the resolved field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    Eq,
    Neq,
    Gte,
    Lte,
    Exists,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Neq => "neq",
            Operator::Gte => "gte",
            Operator::Lte => "lte",
            Operator::Exists => "exists",
        }
    }
}

/// One expected field value. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expectation {
    /// Dotted field path into the snapshot.
    pub field: String,
    pub operator: Operator,
    pub value: Value,
    /// Id of the threat finding this expectation was derived from, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threat_ref: Option<String>,
}

impl Expectation {
    pub fn new(field: &str, operator: Operator, value: Value) -> Self {
        Self {
            field: field.to_string(),
            operator,
            value,
            threat_ref: None,
        }
    }

    pub fn with_threat_ref(mut self, threat_id: &str) -> Self {
        self.threat_ref = Some(threat_id.to_string());
        self
    }
}

// ============================================================================
// DRIFT FINDING
// ============================================================================

/// Outcome of evaluating one expectation. Immutable once returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriftFinding {
    /// `DRIFT-<uuid>`.
    pub id: String,
    pub field: String,
    pub expected: Value,
    /// `Value::Null` when the field was absent from the snapshot.
    pub actual: Value,
    pub drift: bool,
    pub severity: Severity,
    pub description: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threat_ref: Option<String>,
}

// ============================================================================
// MARK RESULT
// ============================================================================

/// Aggregate of one MARK evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkResult {
    pub findings: Vec<DriftFinding>,
    pub drift_detected: bool,
    /// Attached by the pipeline when the expectations came from an analysis
    /// run; the engine itself leaves this empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threat_model: Option<ThreatModelResult>,
}
