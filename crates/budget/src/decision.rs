use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use adhelm_core::{CampaignId, DomainError, DomainResult, OrganizationId};
use adhelm_scoring::{classify, project_budget, BudgetAction};

/// Who produced a decision.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionSource {
    Oracle,
    Fallback,
}

impl core::fmt::Display for DecisionSource {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            DecisionSource::Oracle => "oracle",
            DecisionSource::Fallback => "fallback",
        })
    }
}

/// Execution lifecycle of a decision.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Pending,
    Executed,
    Rejected,
}

/// One budget change for one campaign in one cycle.
///
/// Immutable apart from the `pending -> executed | rejected` status
/// transition, which is invariant-checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetDecision {
    pub decision_id: Uuid,
    pub organization_id: OrganizationId,
    pub campaign_id: CampaignId,

    pub action: BudgetAction,
    /// Percent change against the current budget.
    pub delta_pct: f64,
    pub current_budget: f64,
    pub new_budget: f64,

    pub rationale: String,
    pub source: DecisionSource,
    status: ExecutionStatus,

    pub decided_at: DateTime<Utc>,
}

impl BudgetDecision {
    /// Decide deterministically from ROI via the rule-based classifier.
    ///
    /// The delta projects from current spend: what the campaign actually
    /// burned is the base the ruleset scales.
    pub fn fallback(
        organization_id: OrganizationId,
        campaign_id: CampaignId,
        roi_pct: f64,
        current_spend: f64,
        decided_at: DateTime<Utc>,
    ) -> Self {
        let classification = classify(roi_pct);
        let new_budget = project_budget(current_spend, classification.delta_pct);

        Self {
            decision_id: Uuid::now_v7(),
            organization_id,
            campaign_id,
            action: classification.action,
            delta_pct: classification.delta_pct,
            current_budget: current_spend,
            new_budget,
            rationale: format!(
                "rule-based: ROI {roi_pct:.1}% maps to {} ({:+.0}%)",
                classification.action, classification.delta_pct
            ),
            source: DecisionSource::Fallback,
            status: ExecutionStatus::Pending,
            decided_at,
        }
    }

    /// Accept a validated oracle entry.
    pub fn from_oracle(
        organization_id: OrganizationId,
        campaign_id: CampaignId,
        action: BudgetAction,
        current_budget: f64,
        new_budget: f64,
        rationale: Option<String>,
        decided_at: DateTime<Utc>,
    ) -> Self {
        let delta_pct = if current_budget > 0.0 {
            (new_budget / current_budget - 1.0) * 100.0
        } else {
            0.0
        };

        Self {
            decision_id: Uuid::now_v7(),
            organization_id,
            campaign_id,
            action,
            delta_pct,
            current_budget,
            new_budget,
            rationale: rationale.unwrap_or_else(|| "oracle decision".to_string()),
            source: DecisionSource::Oracle,
            status: ExecutionStatus::Pending,
            decided_at,
        }
    }

    pub fn status(&self) -> ExecutionStatus {
        self.status
    }

    pub fn mark_executed(&mut self) -> DomainResult<()> {
        if self.status != ExecutionStatus::Pending {
            return Err(DomainError::conflict(format!(
                "only pending decisions can be executed (status: {:?})",
                self.status
            )));
        }
        self.status = ExecutionStatus::Executed;
        Ok(())
    }

    pub fn mark_rejected(&mut self) -> DomainResult<()> {
        if self.status != ExecutionStatus::Pending {
            return Err(DomainError::conflict(format!(
                "only pending decisions can be rejected (status: {:?})",
                self.status
            )));
        }
        self.status = ExecutionStatus::Rejected;
        Ok(())
    }
}
