//! Raid execution: lane acquisition, approval gate, simulation, seal.

use chrono::Utc;
use tokio::time::{timeout, Duration};
use uuid::Uuid;

use crate::constants::{MAX_INTENSITY, MIN_INTENSITY, RAID_ID_PREFIX};
use crate::error::RaidError;
use crate::lane::KeyedLanes;
use crate::snapshot::Snapshot;

use super::types::{
    ApprovalHandler, ApprovalRequest, BlastRadius, RaidOptions, RaidResult, TimelineStep,
};
use super::vectors;

/// Attack simulation engine. Owns the per-target lanes and the optional
/// approval handler; both are constructor state, never globals.
pub struct RaidEngine {
    lanes: KeyedLanes<String>,
    approval_handler: Option<ApprovalHandler>,
}

impl RaidEngine {
    pub fn new() -> Self {
        Self {
            lanes: KeyedLanes::new(),
            approval_handler: None,
        }
    }

    pub fn with_approval_handler(mut self, handler: ApprovalHandler) -> Self {
        self.approval_handler = Some(handler);
        self
    }

    /// Run one simulated raid.
    ///
    /// Raids on the same target id queue FIFO; an approval-gated raid never
    /// enters its attack-execution window before approval is granted. Denial
    /// and timeout abandon the raid: the lane is released and the caller gets
    /// the error.
    pub async fn raid(
        &self,
        snapshot: &Snapshot,
        options: &RaidOptions,
    ) -> Result<RaidResult, RaidError> {
        let profile = vectors::profile(options.vector);
        let target = snapshot.target_id.clone();

        let lane = self.lanes.acquire(&target).await;
        let serialized = lane.waited;
        let started_at = Utc::now();

        // Gate check: gated only when a gate is present and the vector's
        // base severity reaches its threshold.
        let gate = options
            .approval_gate
            .as_ref()
            .filter(|gate| profile.base_severity >= gate.required_severity);
        let approval_required = gate.is_some();

        let mut approved = None;
        let mut approver = None;
        let mut approval_timestamp = None;

        if let Some(gate) = gate {
            let handler = self.approval_handler.as_ref().ok_or_else(|| {
                RaidError::HandlerMissing {
                    vector: options.vector.to_string(),
                    required: gate.required_severity,
                }
            })?;

            let request = ApprovalRequest {
                vector: options.vector,
                intensity: options.intensity,
                target_id: target.clone(),
                blast_radius: BlastRadius {
                    affected_resources: snapshot.related_resources(),
                    environment: snapshot.environment(),
                },
                gate: gate.clone(),
                requested_at: Utc::now(),
            };

            log::info!(
                "raid: '{}' against '{}' awaiting approval via {} ({} ms window)",
                options.vector,
                target,
                gate.channel,
                gate.timeout_ms
            );

            let response = timeout(Duration::from_millis(gate.timeout_ms), handler(request))
                .await
                .map_err(|_| RaidError::ApprovalTimeout {
                    vector: options.vector.to_string(),
                    target: target.clone(),
                    timeout_ms: gate.timeout_ms,
                })?;

            if !response.approved {
                log::warn!(
                    "raid: '{}' against '{}' denied by {}",
                    options.vector,
                    target,
                    response.approver
                );
                return Err(RaidError::Denied {
                    vector: options.vector.to_string(),
                    target,
                    approver: response.approver,
                    reason: response
                        .reason
                        .unwrap_or_else(|| "no reason given".to_string()),
                });
            }

            approved = Some(true);
            approver = Some(response.approver);
            approval_timestamp = Some(response.timestamp);
        }

        // Attack-execution window. Synchronous and uninterruptible once
        // entered; the lane is held until the result is sealed.
        let intensity = options.intensity.clamp(MIN_INTENSITY, MAX_INTENSITY);
        let success = (profile.succeeds)(snapshot);
        let mut timeline = Vec::new();
        let mut findings = Vec::new();

        for phase in profile.phases {
            timeline.push(TimelineStep {
                timestamp: Utc::now(),
                action: phase.to_string(),
                result: "completed".to_string(),
            });
        }
        for round in 1..=intensity {
            timeline.push(TimelineStep {
                timestamp: Utc::now(),
                action: format!("probe round {}/{}", round, intensity),
                result: if success { "control gap observed" } else { "blocked" }.to_string(),
            });
        }
        timeline.push(TimelineStep {
            timestamp: Utc::now(),
            action: "assess controls".to_string(),
            result: if success { "breached" } else { "held" }.to_string(),
        });

        findings.push(if success {
            profile.finding_on_success.to_string()
        } else {
            profile.finding_on_failure.to_string()
        });

        let result = RaidResult {
            raid_id: format!("{}-{}", RAID_ID_PREFIX, Uuid::new_v4()),
            target: target.clone(),
            vector: options.vector,
            success,
            controls_held: !success,
            findings,
            timeline,
            serialized,
            started_at,
            completed_at: Utc::now(),
            approval_required,
            approved,
            approver,
            approval_timestamp,
        };

        log::info!(
            "raid: '{}' against '{}' sealed - success={} controls_held={}",
            options.vector,
            target,
            result.success,
            result.controls_held
        );

        drop(lane);
        Ok(result)
    }
}

impl Default for RaidEngine {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
