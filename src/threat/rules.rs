//! Built-in provider rule tables.
//!
//! Condition -> classification -> vectors, as plain const data. Descriptions
//! state the exposure; the affected field and vector list are what the
//! deriver consumes downstream.

use serde_json::Value;

use crate::raid::VectorKind;
use crate::severity::{Severity, Stride};

use super::types::ThreatRule;

// ============================================================================
// PREDICATES
// ============================================================================

fn absent(value: Option<&Value>) -> bool {
    matches!(value, None | Some(Value::Null))
}

fn not_true(value: Option<&Value>) -> bool {
    value.and_then(Value::as_bool) != Some(true)
}

fn mfa_fully_disabled(value: Option<&Value>) -> bool {
    absent(value) || value.and_then(Value::as_str) == Some("OFF")
}

fn mfa_optional(value: Option<&Value>) -> bool {
    value.and_then(Value::as_str) == Some("OPTIONAL")
}

fn password_length_weak(value: Option<&Value>) -> bool {
    value.and_then(Value::as_u64).map(|n| n < 12).unwrap_or(true)
}

fn token_validity_wide(value: Option<&Value>) -> bool {
    value.and_then(Value::as_u64).map(|h| h > 24).unwrap_or(true)
}

fn device_challenge_off(value: Option<&Value>) -> bool {
    not_true(value)
}

fn self_signup_open(value: Option<&Value>) -> bool {
    value.and_then(Value::as_bool) == Some(false)
}

fn public_access_open(value: Option<&Value>) -> bool {
    not_true(value)
}

fn encryption_off(value: Option<&Value>) -> bool {
    not_true(value)
}

fn versioning_off(value: Option<&Value>) -> bool {
    not_true(value)
}

fn logging_off(value: Option<&Value>) -> bool {
    not_true(value)
}

fn adaptive_auth_absent(value: Option<&Value>) -> bool {
    absent(value)
}

// ============================================================================
// AWS COGNITO (authentication posture)
// ============================================================================

pub const AWS_COGNITO_RULES: &[ThreatRule] = &[
    ThreatRule {
        condition_field: "mfaConfiguration",
        predicate: mfa_fully_disabled,
        stride: Stride::Spoofing,
        mitre_technique: "T1621",
        mitre_name: "Multi-Factor Authentication Request Generation",
        severity: Severity::Critical,
        attack_vectors: &[VectorKind::MfaBypass, VectorKind::PasswordSpray],
        description: "Multi-factor authentication is disabled; any stolen password grants full account access",
    },
    ThreatRule {
        condition_field: "mfaConfiguration",
        predicate: mfa_optional,
        stride: Stride::Spoofing,
        mitre_technique: "T1621",
        mitre_name: "Multi-Factor Authentication Request Generation",
        severity: Severity::High,
        attack_vectors: &[VectorKind::MfaBypass],
        description: "Multi-factor authentication is optional; accounts that never enrolled are password-only",
    },
    ThreatRule {
        condition_field: "riskConfiguration",
        predicate: adaptive_auth_absent,
        stride: Stride::Spoofing,
        mitre_technique: "T1078",
        mitre_name: "Valid Accounts",
        severity: Severity::High,
        attack_vectors: &[VectorKind::PasswordSpray, VectorKind::SessionHijack],
        description: "No risk or anomaly configuration; credential stuffing and impossible-travel sign-ins go unnoticed",
    },
    ThreatRule {
        condition_field: "passwordPolicy.minimumLength",
        predicate: password_length_weak,
        stride: Stride::Spoofing,
        mitre_technique: "T1110.003",
        mitre_name: "Password Spraying",
        severity: Severity::Medium,
        attack_vectors: &[VectorKind::PasswordSpray],
        description: "Password policy admits short passwords; spray lists cover a meaningful share of accounts",
    },
    ThreatRule {
        condition_field: "accessTokenValidity",
        predicate: token_validity_wide,
        stride: Stride::ElevationOfPrivilege,
        mitre_technique: "T1550.001",
        mitre_name: "Application Access Token",
        severity: Severity::High,
        attack_vectors: &[VectorKind::TokenReplay],
        description: "Access tokens outlive a working day; a captured token stays valid long after the session ended",
    },
    ThreatRule {
        condition_field: "deviceConfiguration.challengeRequiredOnNewDevice",
        predicate: device_challenge_off,
        stride: Stride::Spoofing,
        mitre_technique: "T1078.004",
        mitre_name: "Cloud Accounts",
        severity: Severity::Medium,
        attack_vectors: &[VectorKind::SessionHijack],
        description: "New devices resume sessions unchallenged; a copied session survives a device change",
    },
    ThreatRule {
        condition_field: "adminCreateUserConfig.allowAdminCreateUserOnly",
        predicate: self_signup_open,
        stride: Stride::ElevationOfPrivilege,
        mitre_technique: "T1136.003",
        mitre_name: "Create Account: Cloud Account",
        severity: Severity::Medium,
        attack_vectors: &[VectorKind::PasswordSpray],
        description: "Self sign-up is open; anyone can mint accounts inside the pool",
    },
];

// ============================================================================
// AWS S3 (storage exposure)
// ============================================================================

pub const AWS_S3_RULES: &[ThreatRule] = &[
    ThreatRule {
        condition_field: "publicAccessBlock",
        predicate: public_access_open,
        stride: Stride::InformationDisclosure,
        mitre_technique: "T1530",
        mitre_name: "Data from Cloud Storage",
        severity: Severity::Critical,
        attack_vectors: &[VectorKind::PublicExposure, VectorKind::DataExfil],
        description: "Public access is not blocked; bucket contents are one anonymous listing away",
    },
    ThreatRule {
        condition_field: "encryption.enabled",
        predicate: encryption_off,
        stride: Stride::InformationDisclosure,
        mitre_technique: "T1530",
        mitre_name: "Data from Cloud Storage",
        severity: Severity::High,
        attack_vectors: &[VectorKind::DataExfil],
        description: "Objects are stored unencrypted; any read path yields plaintext",
    },
    ThreatRule {
        condition_field: "versioning.enabled",
        predicate: versioning_off,
        stride: Stride::Tampering,
        mitre_technique: "T1485",
        mitre_name: "Data Destruction",
        severity: Severity::Medium,
        attack_vectors: &[VectorKind::ObjectTamper],
        description: "Versioning is disabled; an overwrite destroys the only copy",
    },
    ThreatRule {
        condition_field: "accessLogging.enabled",
        predicate: logging_off,
        stride: Stride::Repudiation,
        mitre_technique: "T1562.008",
        mitre_name: "Disable or Modify Cloud Logs",
        severity: Severity::Medium,
        attack_vectors: &[VectorKind::LogTamper],
        description: "Access logging is off; reads and writes leave no trace to investigate",
    },
];

/// Built-in tables, keyed by provider id.
pub fn builtin_tables() -> Vec<(&'static str, &'static [ThreatRule])> {
    vec![("aws-cognito", AWS_COGNITO_RULES), ("aws-s3", AWS_S3_RULES)]
}
