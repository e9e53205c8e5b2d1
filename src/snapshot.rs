//! Snapshot - point-in-time observation of a resource's configuration.
//!
//! Owned by the caller and never mutated by the engines. Fields are an
//! opaque JSON tree addressed by dotted paths (`passwordPolicy.minimumLength`,
//! `statements.0.effect`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::UNSPECIFIED_ENVIRONMENT;

/// Immutable, provider-tagged configuration observation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Provider that produced the observation (e.g. `aws-cognito`).
    pub provider: String,
    /// Identifier of the observed resource; raids serialize on this key.
    pub target_id: String,
    pub observed_at: DateTime<Utc>,
    /// Configuration tree as collected. Never mutated by the core.
    pub fields: Value,
}

impl Snapshot {
    pub fn new(provider: &str, target_id: &str, fields: Value) -> Self {
        Self {
            provider: provider.to_string(),
            target_id: target_id.to_string(),
            observed_at: Utc::now(),
            fields,
        }
    }

    /// Resolve a dotted field path. Objects are traversed by key, arrays by
    /// numeric index. Any missing segment yields `None`.
    pub fn resolve(&self, path: &str) -> Option<&Value> {
        let mut current = &self.fields;
        for segment in path.split('.') {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Environment tag for blast-radius summaries.
    pub fn environment(&self) -> String {
        self.resolve("environment")
            .and_then(Value::as_str)
            .unwrap_or(UNSPECIFIED_ENVIRONMENT)
            .to_string()
    }

    /// Resources a raid against this target could reach: the target itself
    /// plus anything the collector listed under `relatedResources`.
    pub fn related_resources(&self) -> Vec<String> {
        let mut resources = vec![self.target_id.clone()];
        if let Some(related) = self.resolve("relatedResources").and_then(Value::as_array) {
            resources.extend(
                related
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string),
            );
        }
        resources
    }
}

// ============================================================================
// TESTS
// ============================================================================
