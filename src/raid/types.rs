//! Attack simulation types. No logic here, only data structures and the
//! approval handler contract.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_APPROVAL_TIMEOUT_MS;
use crate::severity::Severity;

// ============================================================================
// ATTACK VECTORS
// ============================================================================

/// Named simulated-attack kinds. Closed set: the catalog in `vectors.rs`
/// carries one profile per variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VectorKind {
    MfaBypass,
    PasswordSpray,
    TokenReplay,
    SessionHijack,
    PublicExposure,
    DataExfil,
    ObjectTamper,
    LogTamper,
}

impl VectorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            VectorKind::MfaBypass => "mfa-bypass",
            VectorKind::PasswordSpray => "password-spray",
            VectorKind::TokenReplay => "token-replay",
            VectorKind::SessionHijack => "session-hijack",
            VectorKind::PublicExposure => "public-exposure",
            VectorKind::DataExfil => "data-exfil",
            VectorKind::ObjectTamper => "object-tamper",
            VectorKind::LogTamper => "log-tamper",
        }
    }

    /// Fixed base severity used for approval gating and derived intensity.
    pub fn base_severity(&self) -> Severity {
        super::vectors::profile(*self).base_severity
    }
}

impl std::fmt::Display for VectorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// RAID OPTIONS
// ============================================================================

/// Parameters for one raid.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RaidOptions {
    pub vector: VectorKind,
    /// 1..=10; scales the number of simulated probe steps.
    pub intensity: u8,
    /// Always true in this core; simulations never target live systems.
    pub dry_run: bool,
    /// When present and the vector's base severity meets the threshold, the
    /// raid requires external approval before its attack window opens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approval_gate: Option<ApprovalGate>,
}

impl RaidOptions {
    pub fn new(vector: VectorKind, intensity: u8) -> Self {
        Self {
            vector,
            intensity,
            dry_run: true,
            approval_gate: None,
        }
    }

    pub fn with_gate(mut self, gate: ApprovalGate) -> Self {
        self.approval_gate = Some(gate);
        self
    }
}

// ============================================================================
// APPROVAL
// ============================================================================

/// Severity-threshold policy requiring external sign-off.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalGate {
    pub required_severity: Severity,
    pub approvers: Vec<String>,
    pub timeout_ms: u64,
    /// Transport hint for the caller's handler ("slack", "webhook", ...).
    pub channel: String,
}

impl Default for ApprovalGate {
    fn default() -> Self {
        Self {
            required_severity: Severity::Critical,
            approvers: Vec::new(),
            timeout_ms: DEFAULT_APPROVAL_TIMEOUT_MS,
            channel: "manual".to_string(),
        }
    }
}

/// What an approval-gated raid would reach.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlastRadius {
    pub affected_resources: Vec<String>,
    pub environment: String,
}

/// Request handed to the injected approval handler.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalRequest {
    pub vector: VectorKind,
    pub intensity: u8,
    pub target_id: String,
    pub blast_radius: BlastRadius,
    pub gate: ApprovalGate,
    pub requested_at: DateTime<Utc>,
}

/// Response produced by the external approver.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalResponse {
    pub approved: bool,
    pub approver: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Injected by the caller; the core defines the contract, not the transport.
pub type ApprovalHandler = Arc<
    dyn Fn(ApprovalRequest) -> Pin<Box<dyn Future<Output = ApprovalResponse> + Send>>
        + Send
        + Sync,
>;

// ============================================================================
// RAID RESULT
// ============================================================================

/// One simulated attack step.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineStep {
    pub timestamp: DateTime<Utc>,
    pub action: String,
    pub result: String,
}

/// Sealed outcome of one raid.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RaidResult {
    /// `RAID-<uuid>`.
    pub raid_id: String,
    pub target: String,
    pub vector: VectorKind,
    /// True when the simulated attack got through.
    pub success: bool,
    /// Inverse of `success`: did the controls hold?
    pub controls_held: bool,
    pub findings: Vec<String>,
    pub timeline: Vec<TimelineStep>,
    /// True when this raid had to queue behind another raid on the same
    /// target.
    pub serialized: bool,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub approval_required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approver: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approval_timestamp: Option<DateTime<Utc>>,
}
