//! Per-field drift severity policy.
//!
//! Severity is not a function of the operator: known security-relevant
//! fields carry curated defaults and everything else falls back to MEDIUM.
//! The table is plain data so deployments can replace it wholesale.

use serde_json::{json, Value};

use crate::severity::Severity;

// ============================================================================
// VALUE MATCHER
// ============================================================================

/// Matcher over the *actual* (observed) value of a drifted field.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueMatch {
    /// Field absent from the snapshot (or explicitly null).
    Missing,
    /// Field present and equal to the given value.
    Equals(Value),
    /// Any observed value, present or not.
    Any,
}

impl ValueMatch {
    fn matches(&self, actual: Option<&Value>) -> bool {
        match self {
            ValueMatch::Missing => matches!(actual, None | Some(Value::Null)),
            ValueMatch::Equals(expected) => actual == Some(expected),
            ValueMatch::Any => true,
        }
    }
}

// ============================================================================
// POLICY
// ============================================================================

#[derive(Debug, Clone)]
struct SeverityRule {
    field: String,
    when_actual: ValueMatch,
    severity: Severity,
}

/// Ordered severity rules, first match wins, MEDIUM fallback.
#[derive(Debug, Clone)]
pub struct SeverityPolicy {
    rules: Vec<SeverityRule>,
    fallback: Severity,
}

impl Default for SeverityPolicy {
    fn default() -> Self {
        Self::empty()
            // MFA fully disabled (or unreported) against a required baseline.
            .with_rule("mfaConfiguration", ValueMatch::Equals(json!("OFF")), Severity::Critical)
            .with_rule("mfaConfiguration", ValueMatch::Missing, Severity::Critical)
            // MFA present but not enforcing (e.g. OPTIONAL).
            .with_rule("mfaConfiguration", ValueMatch::Any, Severity::High)
            // Risk / anomaly detection not configured at all.
            .with_rule("riskConfiguration", ValueMatch::Missing, Severity::High)
            // Weak password-length policy.
            .with_rule("passwordPolicy.minimumLength", ValueMatch::Any, Severity::Medium)
            // A bucket reachable by the public is never a MEDIUM.
            .with_rule("publicAccessBlock", ValueMatch::Equals(json!(false)), Severity::Critical)
            .with_rule("publicAccessBlock", ValueMatch::Missing, Severity::Critical)
    }
}

impl SeverityPolicy {
    /// Policy with no curated entries; every drifted field gets the fallback.
    pub fn empty() -> Self {
        Self {
            rules: Vec::new(),
            fallback: Severity::Medium,
        }
    }

    pub fn with_rule(mut self, field: &str, when_actual: ValueMatch, severity: Severity) -> Self {
        self.rules.push(SeverityRule {
            field: field.to_string(),
            when_actual,
            severity,
        });
        self
    }

    pub fn with_fallback(mut self, fallback: Severity) -> Self {
        self.fallback = fallback;
        self
    }

    /// Severity for a drifted field given what was actually observed.
    pub fn classify(&self, field: &str, actual: Option<&Value>) -> Severity {
        self.rules
            .iter()
            .find(|rule| rule.field == field && rule.when_actual.matches(actual))
            .map(|rule| rule.severity)
            .unwrap_or(self.fallback)
    }
}

// ============================================================================
// TESTS
// ============================================================================
