//! Attack vector catalog.
//!
//! One profile per vector: base severity (shared with the threat-model rule
//! tables for gating), simulated phases, and a deterministic success
//! predicate over snapshot fields. Plain data - adding a vector is a catalog
//! change, not an engine change.

use serde_json::Value;

use crate::severity::Severity;
use crate::snapshot::Snapshot;

use super::types::VectorKind;

/// Static description of one simulated attack.
pub struct VectorProfile {
    pub kind: VectorKind,
    pub base_severity: Severity,
    pub description: &'static str,
    /// Phases replayed into the raid timeline before the probe loop.
    pub phases: &'static [&'static str],
    /// Does the attack get through, given what the snapshot reports?
    pub succeeds: fn(&Snapshot) -> bool,
    pub finding_on_success: &'static str,
    pub finding_on_failure: &'static str,
}

pub const CATALOG: &[VectorProfile] = &[
    VectorProfile {
        kind: VectorKind::MfaBypass,
        base_severity: Severity::High,
        description: "Complete a sign-in without ever presenting a second factor",
        phases: &[
            "enumerate authentication endpoints",
            "initiate password-only sign-in",
            "probe second-factor challenge enforcement",
        ],
        succeeds: mfa_not_enforced,
        finding_on_success: "Sign-in completed without a second-factor challenge",
        finding_on_failure: "Second factor was demanded on every sign-in path",
    },
    VectorProfile {
        kind: VectorKind::PasswordSpray,
        base_severity: Severity::Medium,
        description: "Low-and-slow common-password attempts across accounts",
        phases: &[
            "assemble candidate account list",
            "select seasonal password candidates",
            "spray one attempt per account per window",
        ],
        succeeds: password_policy_weak,
        finding_on_success: "Password policy admits guessable credentials and no anomaly detection is configured",
        finding_on_failure: "Password policy and lockout posture resisted the spray",
    },
    VectorProfile {
        kind: VectorKind::TokenReplay,
        base_severity: Severity::High,
        description: "Replay a captured access token past its intended lifetime",
        phases: &[
            "capture token from simulated session log",
            "age token beyond rotation window",
            "replay token against the API surface",
        ],
        succeeds: tokens_replayable,
        finding_on_success: "Stale access token was accepted; validity window is too wide",
        finding_on_failure: "Replayed token was rejected at the validity boundary",
    },
    VectorProfile {
        kind: VectorKind::SessionHijack,
        base_severity: Severity::High,
        description: "Resume a session from an unrecognized device",
        phases: &[
            "clone session state to a new device fingerprint",
            "resume session without device challenge",
        ],
        succeeds: device_challenge_absent,
        finding_on_success: "Session resumed on an unknown device without a challenge",
        finding_on_failure: "Unknown device triggered a fresh challenge",
    },
    VectorProfile {
        kind: VectorKind::PublicExposure,
        base_severity: Severity::Critical,
        description: "Read storage contents as an anonymous principal",
        phases: &[
            "resolve storage endpoint anonymously",
            "list objects without credentials",
        ],
        succeeds: publicly_reachable,
        finding_on_success: "Anonymous listing succeeded; public access is not blocked",
        finding_on_failure: "Anonymous access was rejected at the account boundary",
    },
    VectorProfile {
        kind: VectorKind::DataExfil,
        base_severity: Severity::High,
        description: "Bulk-copy stored objects out of the account",
        phases: &[
            "stage anonymous read path",
            "sample object keys for sensitive markers",
            "stream objects to simulated external sink",
        ],
        succeeds: exfiltration_possible,
        finding_on_success: "Objects were readable in bulk without encryption at rest",
        finding_on_failure: "Encryption and access posture kept object contents sealed",
    },
    VectorProfile {
        kind: VectorKind::ObjectTamper,
        base_severity: Severity::Medium,
        description: "Overwrite stored objects and destroy the only copy",
        phases: &[
            "select high-value object keys",
            "overwrite objects in place",
        ],
        succeeds: versioning_disabled,
        finding_on_success: "Overwrites were irreversible; versioning is disabled",
        finding_on_failure: "Versioning preserved prior object generations",
    },
    VectorProfile {
        kind: VectorKind::LogTamper,
        base_severity: Severity::Medium,
        description: "Act without leaving an access-log trace",
        phases: &[
            "perform probe request",
            "inspect access log for the probe",
        ],
        succeeds: access_logging_disabled,
        finding_on_success: "Probe left no trace; access logging is disabled",
        finding_on_failure: "Probe appeared in the access log",
    },
];

/// Profile lookup. Indexed by an exhaustive match so a new variant without a
/// catalog entry fails to compile rather than misses at runtime.
pub fn profile(kind: VectorKind) -> &'static VectorProfile {
    let index = match kind {
        VectorKind::MfaBypass => 0,
        VectorKind::PasswordSpray => 1,
        VectorKind::TokenReplay => 2,
        VectorKind::SessionHijack => 3,
        VectorKind::PublicExposure => 4,
        VectorKind::DataExfil => 5,
        VectorKind::ObjectTamper => 6,
        VectorKind::LogTamper => 7,
    };
    &CATALOG[index]
}

// ============================================================================
// SUCCESS PREDICATES
// ============================================================================

fn mfa_not_enforced(snapshot: &Snapshot) -> bool {
    snapshot
        .resolve("mfaConfiguration")
        .and_then(Value::as_str)
        != Some("ON")
}

fn password_policy_weak(snapshot: &Snapshot) -> bool {
    let min_length = snapshot
        .resolve("passwordPolicy.minimumLength")
        .and_then(Value::as_u64);
    let risk_config_present = snapshot
        .resolve("riskConfiguration")
        .map(|v| !v.is_null())
        .unwrap_or(false);
    min_length.map(|n| n < 12).unwrap_or(true) || !risk_config_present
}

fn tokens_replayable(snapshot: &Snapshot) -> bool {
    snapshot
        .resolve("accessTokenValidity")
        .and_then(Value::as_u64)
        .map(|hours| hours > 24)
        .unwrap_or(true)
}

fn device_challenge_absent(snapshot: &Snapshot) -> bool {
    snapshot
        .resolve("deviceConfiguration.challengeRequiredOnNewDevice")
        .and_then(Value::as_bool)
        != Some(true)
}

fn publicly_reachable(snapshot: &Snapshot) -> bool {
    snapshot.resolve("publicAccessBlock").and_then(Value::as_bool) != Some(true)
}

fn exfiltration_possible(snapshot: &Snapshot) -> bool {
    let encrypted = snapshot
        .resolve("encryption.enabled")
        .and_then(Value::as_bool)
        == Some(true);
    !encrypted || publicly_reachable(snapshot)
}

fn versioning_disabled(snapshot: &Snapshot) -> bool {
    snapshot
        .resolve("versioning.enabled")
        .and_then(Value::as_bool)
        != Some(true)
}

fn access_logging_disabled(snapshot: &Snapshot) -> bool {
    snapshot
        .resolve("accessLogging.enabled")
        .and_then(Value::as_bool)
        != Some(true)
}

// ============================================================================
// TESTS
// ============================================================================
