//! Threat-model types. No logic here, only data structures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::raid::VectorKind;
use crate::severity::{Severity, Stride};

// ============================================================================
// RULE TABLE ENTRY
// ============================================================================

/// One row of a provider's rule table. The predicate receives the resolved
/// condition field (or `None` when absent) and returns true when the threat
/// is present.
pub struct ThreatRule {
    pub condition_field: &'static str,
    pub predicate: fn(Option<&Value>) -> bool,
    pub stride: Stride,
    pub mitre_technique: &'static str,
    pub mitre_name: &'static str,
    pub severity: Severity,
    pub attack_vectors: &'static [VectorKind],
    pub description: &'static str,
}

// ============================================================================
// FINDINGS
// ============================================================================

/// One classified threat. Ids are `THREAT-<provider>-<n>` where `n` is the
/// rule's position in the table, stable within an analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreatFinding {
    pub id: String,
    pub stride: Stride,
    pub mitre_technique: String,
    pub mitre_name: String,
    pub affected_field: String,
    pub severity: Severity,
    pub attack_vectors: Vec<VectorKind>,
    pub description: String,
}

/// Findings per severity across one analysis run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskDistribution {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
    pub critical: usize,
}

impl RiskDistribution {
    pub fn count(&mut self, severity: Severity) {
        match severity {
            Severity::Low => self.low += 1,
            Severity::Medium => self.medium += 1,
            Severity::High => self.high += 1,
            Severity::Critical => self.critical += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.low + self.medium + self.high + self.critical
    }
}

/// Result of one analysis run. An unknown provider yields a valid result
/// with no findings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreatModelResult {
    pub provider: String,
    pub target_id: String,
    pub findings: Vec<ThreatFinding>,
    pub risk_distribution: RiskDistribution,
    pub analyzed_at: DateTime<Utc>,
}
