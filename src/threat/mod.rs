//! Spyglass - threat-model rule engine.
//!
//! Classifies a resource snapshot into STRIDE-categorized threats with MITRE
//! ATT&CK linkage by evaluating a per-provider rule table. Rule tables are
//! plain data: adding a provider is a data change, never a code change.

mod engine;
pub mod rules;
mod types;

pub use engine::{AnalyzeOptions, ThreatModelEngine};
pub use types::{RiskDistribution, ThreatFinding, ThreatModelResult, ThreatRule};
