//! Threat-model analysis logic.

use std::collections::{HashMap, HashSet};

use chrono::Utc;

use crate::constants::THREAT_ID_PREFIX;
use crate::severity::Severity;
use crate::snapshot::Snapshot;

use super::rules;
use super::types::{RiskDistribution, ThreatFinding, ThreatModelResult, ThreatRule};

/// Analysis options.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyzeOptions {
    /// Drop findings below this floor before the distribution is computed.
    pub min_severity: Option<Severity>,
}

/// Spyglass. Rule tables are loaded once at construction and treated as
/// read-only; tests can build isolated instances with their own tables.
pub struct ThreatModelEngine {
    tables: HashMap<String, &'static [ThreatRule]>,
}

impl ThreatModelEngine {
    /// Engine with the built-in provider tables.
    pub fn new() -> Self {
        let mut tables = HashMap::new();
        for (provider, table) in rules::builtin_tables() {
            tables.insert(provider.to_string(), table);
        }
        Self { tables }
    }

    /// Engine with no tables at all; every provider is unknown.
    pub fn bare() -> Self {
        Self {
            tables: HashMap::new(),
        }
    }

    /// Register a plugin-supplied rule table. Replaces any table already
    /// registered for the provider.
    pub fn with_table(mut self, provider: &str, table: &'static [ThreatRule]) -> Self {
        self.tables.insert(provider.to_string(), table);
        self
    }

    pub fn providers(&self) -> Vec<&str> {
        self.tables.keys().map(String::as_str).collect()
    }

    /// Evaluate every rule for `provider` against the snapshot.
    ///
    /// An unrecognized provider yields a valid, empty result - absence of
    /// rules for a new provider is expected during rollout, not an error.
    pub fn analyze(
        &self,
        snapshot: &Snapshot,
        provider: &str,
        options: Option<AnalyzeOptions>,
    ) -> ThreatModelResult {
        let options = options.unwrap_or_default();
        let mut findings = Vec::new();
        let mut seen = HashSet::new();

        match self.tables.get(provider) {
            None => {
                log::debug!("spyglass: no rule table for provider '{provider}', empty model");
            }
            Some(table) => {
                for (index, rule) in table.iter().enumerate() {
                    let value = snapshot.resolve(rule.condition_field);
                    if !(rule.predicate)(value) {
                        continue;
                    }
                    if let Some(floor) = options.min_severity {
                        if rule.severity < floor {
                            continue;
                        }
                    }
                    let id = format!("{}-{}-{}", THREAT_ID_PREFIX, provider, index);
                    if !seen.insert(id.clone()) {
                        continue;
                    }
                    findings.push(ThreatFinding {
                        id,
                        stride: rule.stride,
                        mitre_technique: rule.mitre_technique.to_string(),
                        mitre_name: rule.mitre_name.to_string(),
                        affected_field: rule.condition_field.to_string(),
                        severity: rule.severity,
                        attack_vectors: rule.attack_vectors.to_vec(),
                        description: rule.description.to_string(),
                    });
                }
            }
        }

        let mut risk_distribution = RiskDistribution::default();
        for finding in &findings {
            risk_distribution.count(finding.severity);
        }

        log::info!(
            "spyglass: '{}' via {} -> {} findings ({} critical, {} high)",
            snapshot.target_id,
            provider,
            findings.len(),
            risk_distribution.critical,
            risk_distribution.high
        );

        ThreatModelResult {
            provider: provider.to_string(),
            target_id: snapshot.target_id.clone(),
            findings,
            risk_distribution,
            analyzed_at: Utc::now(),
        }
    }
}

impl Default for ThreatModelEngine {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
