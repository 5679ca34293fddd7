use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, info, warn};

use adhelm_core::{CampaignId, DomainError, OrganizationId, StoreError};
use adhelm_events::{IntegrationEvent, Severity};
use adhelm_oracle::{
    BudgetSnapshot, CampaignBudgetLine, DecisionOracleAdapter, OracleDecision, OracleError,
    ReasoningOracle,
};
use adhelm_scoring::{BudgetAction, CampaignPerformanceSnapshot};

use crate::decision::BudgetDecision;

/// Campaign lifecycle as the directory tracks it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    Active,
    Paused,
}

/// One campaign as loaded for a cycle: allocation plus latest snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignState {
    pub campaign_id: CampaignId,
    pub name: String,
    pub budget: f64,
    pub status: CampaignStatus,
    pub snapshot: CampaignPerformanceSnapshot,
}

/// Campaign allocation persistence.
///
/// `update_budget` must be a serialized single-row read-modify-write; no
/// cross-campaign transaction is required.
pub trait CampaignDirectory: Send + Sync {
    fn active_campaigns(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<CampaignState>, StoreError>;

    fn update_budget(
        &self,
        organization_id: OrganizationId,
        campaign_id: CampaignId,
        new_budget: f64,
        pause: bool,
    ) -> Result<(), StoreError>;
}

impl<S> CampaignDirectory for Arc<S>
where
    S: CampaignDirectory + ?Sized,
{
    fn active_campaigns(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<CampaignState>, StoreError> {
        (**self).active_campaigns(organization_id)
    }

    fn update_budget(
        &self,
        organization_id: OrganizationId,
        campaign_id: CampaignId,
        new_budget: f64,
        pause: bool,
    ) -> Result<(), StoreError> {
        (**self).update_budget(organization_id, campaign_id, new_budget, pause)
    }
}

/// Append-only decision persistence.
pub trait DecisionLog: Send + Sync {
    fn append(&self, decision: &BudgetDecision) -> Result<(), StoreError>;
}

impl<S> DecisionLog for Arc<S>
where
    S: DecisionLog + ?Sized,
{
    fn append(&self, decision: &BudgetDecision) -> Result<(), StoreError> {
        (**self).append(decision)
    }
}

/// Append-only audit trail.
pub trait AuditTrail: Send + Sync {
    fn append(&self, event: IntegrationEvent) -> Result<(), StoreError>;
}

impl<S> AuditTrail for Arc<S>
where
    S: AuditTrail + ?Sized,
{
    fn append(&self, event: IntegrationEvent) -> Result<(), StoreError> {
        (**self).append(event)
    }
}

#[derive(Debug, Error)]
pub enum BudgetError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// What a cycle returned to the caller.
///
/// `decisions` is always populated (one entry per active campaign, each
/// annotated with its source) regardless of how the oracle behaved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleOutcome {
    pub decisions: Vec<BudgetDecision>,
    pub executed: bool,
}

/// Per-organization, per-cycle budget state machine:
/// LOAD -> DECIDE -> LOG -> EXECUTE.
///
/// Concurrent cycles for the same organization are not serialized here;
/// callers own that (the analysis runner runs one thread per organization).
pub struct BudgetController<D, L, A, O> {
    directory: D,
    decisions: L,
    audit: A,
    adapter: DecisionOracleAdapter<O>,
}

impl<D, L, A, O> BudgetController<D, L, A, O>
where
    D: CampaignDirectory,
    L: DecisionLog,
    A: AuditTrail,
    O: ReasoningOracle,
{
    pub fn new(directory: D, decisions: L, audit: A, oracle: O) -> Self {
        Self {
            directory,
            decisions,
            audit,
            adapter: DecisionOracleAdapter::new(oracle),
        }
    }

    /// Run one analysis cycle for `organization_id`.
    ///
    /// Oracle failures degrade to the deterministic ruleset per affected
    /// campaign and never abort the cycle; persistence failures propagate.
    pub fn run_cycle(
        &self,
        organization_id: OrganizationId,
        auto_execute: bool,
    ) -> Result<CycleOutcome, BudgetError> {
        let now = Utc::now();

        // LOAD
        let campaigns = self.directory.active_campaigns(organization_id)?;
        if campaigns.is_empty() {
            info!(organization = %organization_id, "no active campaigns; nothing to decide");
            return Ok(CycleOutcome {
                decisions: Vec::new(),
                executed: false,
            });
        }

        // DECIDE
        let (proposals, dropped, fallback_cause) = self.propose(organization_id, &campaigns);

        let mut decisions = Vec::with_capacity(campaigns.len());
        for campaign in &campaigns {
            let decision = proposals
                .get(&campaign.campaign_id)
                .and_then(|entry| validated_oracle_decision(organization_id, campaign, entry, now))
                .unwrap_or_else(|| {
                    // The ruleset projects from current spend, not allocation.
                    BudgetDecision::fallback(
                        organization_id,
                        campaign.campaign_id,
                        campaign.snapshot.roi,
                        campaign.snapshot.spend,
                        now,
                    )
                });
            decisions.push(decision);
        }

        // LOG
        self.audit.append(batch_event(
            organization_id,
            &decisions,
            dropped,
            fallback_cause.as_deref(),
            now,
        ))?;

        // EXECUTE
        if auto_execute {
            for decision in &mut decisions {
                self.directory.update_budget(
                    organization_id,
                    decision.campaign_id,
                    decision.new_budget,
                    decision.action == BudgetAction::Pause,
                )?;
                decision.mark_executed()?;
                self.audit.append(execution_event(decision, now))?;
            }
            info!(
                organization = %organization_id,
                executed = decisions.len(),
                "budget decisions executed"
            );
        } else {
            debug!(
                organization = %organization_id,
                pending = decisions.len(),
                "auto-execute disabled; decisions stay pending"
            );
        }

        for decision in &decisions {
            self.decisions.append(decision)?;
        }

        Ok(CycleOutcome {
            decisions,
            executed: auto_execute,
        })
    }

    /// Ask the oracle; on failure, return no proposals and the cause.
    ///
    /// Entries referencing campaigns outside the batch are dropped here
    /// (data-integrity gap): they cannot be applied, and one bad entry must
    /// not invalidate the rest.
    fn propose(
        &self,
        organization_id: OrganizationId,
        campaigns: &[CampaignState],
    ) -> (HashMap<CampaignId, OracleDecision>, u32, Option<String>) {
        let snapshot = BudgetSnapshot::new(
            organization_id,
            campaigns
                .iter()
                .map(|c| CampaignBudgetLine {
                    campaign_id: c.campaign_id,
                    name: c.name.clone(),
                    budget: c.budget,
                    spend: c.snapshot.spend,
                    revenue: c.snapshot.revenue,
                    roi: c.snapshot.roi,
                    conversions: c.snapshot.conversions,
                })
                .collect(),
        );

        match self.adapter.propose(&snapshot) {
            Ok(proposal) => {
                let mut by_campaign = HashMap::new();
                let mut dropped = 0u32;

                for entry in proposal.decisions {
                    let known = entry
                        .campaign_id
                        .parse::<CampaignId>()
                        .ok()
                        .filter(|id| campaigns.iter().any(|c| c.campaign_id == *id));

                    match known {
                        Some(id) => {
                            by_campaign.entry(id).or_insert(entry);
                        }
                        None => {
                            dropped += 1;
                            warn!(
                                organization = %organization_id,
                                campaign = %entry.campaign_id,
                                "oracle decision references an unknown campaign; dropped"
                            );
                        }
                    }
                }

                (by_campaign, dropped, None)
            }
            Err(error) => {
                let permanent = error.is_permanent();
                match &error {
                    OracleError::Malformed { reason, excerpt } => warn!(
                        organization = %organization_id,
                        reason,
                        excerpt,
                        "oracle response unusable; falling back for every campaign"
                    ),
                    other => warn!(
                        organization = %organization_id,
                        error = %other,
                        permanent,
                        "oracle unavailable; falling back for every campaign"
                    ),
                }
                (HashMap::new(), 0, Some(error.to_string()))
            }
        }
    }
}

/// Accept an oracle entry only if its action is recognized and its budget is
/// a finite number >= 0; otherwise the caller falls back for this campaign.
fn validated_oracle_decision(
    organization_id: OrganizationId,
    campaign: &CampaignState,
    entry: &OracleDecision,
    now: DateTime<Utc>,
) -> Option<BudgetDecision> {
    let action: BudgetAction = match entry.action.parse() {
        Ok(action) => action,
        Err(_) => {
            debug!(
                organization = %organization_id,
                campaign = %campaign.campaign_id,
                action = %entry.action,
                "oracle action unrecognized; falling back for this campaign"
            );
            return None;
        }
    };

    let new_budget = match entry.new_budget {
        Some(budget) if budget.is_finite() && budget >= 0.0 => budget,
        _ => {
            debug!(
                organization = %organization_id,
                campaign = %campaign.campaign_id,
                "oracle budget missing or invalid; falling back for this campaign"
            );
            return None;
        }
    };

    Some(BudgetDecision::from_oracle(
        organization_id,
        campaign.campaign_id,
        action,
        campaign.budget,
        new_budget,
        entry.rationale.clone(),
        now,
    ))
}

fn batch_event(
    organization_id: OrganizationId,
    decisions: &[BudgetDecision],
    dropped: u32,
    fallback_cause: Option<&str>,
    now: DateTime<Utc>,
) -> IntegrationEvent {
    let oracle_count = decisions
        .iter()
        .filter(|d| d.source == crate::decision::DecisionSource::Oracle)
        .count();
    let fallback_count = decisions.len() - oracle_count;
    let any_pause = decisions.iter().any(|d| d.action == BudgetAction::Pause);

    let severity = if any_pause || fallback_cause.is_some() {
        Severity::Warning
    } else {
        Severity::Info
    };

    IntegrationEvent::new(
        organization_id,
        "budget.cycle_decided",
        severity,
        format!(
            "{} decisions (oracle {oracle_count}, fallback {fallback_count})",
            decisions.len()
        ),
        now,
    )
    .with_metadata(json!({
        "decided": decisions.len(),
        "oracle": oracle_count,
        "fallback": fallback_count,
        "dropped": dropped,
        "fallback_cause": fallback_cause,
        "actions": decisions
            .iter()
            .map(|d| json!({
                "campaign_id": d.campaign_id,
                "action": d.action.as_str(),
                "new_budget": d.new_budget,
                "source": d.source.to_string(),
            }))
            .collect::<Vec<_>>(),
    }))
}

fn execution_event(decision: &BudgetDecision, now: DateTime<Utc>) -> IntegrationEvent {
    let severity = if decision.action == BudgetAction::Pause {
        Severity::Warning
    } else {
        Severity::Info
    };

    IntegrationEvent::new(
        decision.organization_id,
        "budget.executed",
        severity,
        format!(
            "campaign {} {}: budget {:.2} -> {:.2}",
            decision.campaign_id, decision.action, decision.current_budget, decision.new_budget
        ),
        now,
    )
    .with_metadata(json!({
        "decision_id": decision.decision_id,
        "campaign_id": decision.campaign_id,
        "action": decision.action.as_str(),
        "current_budget": decision.current_budget,
        "new_budget": decision.new_budget,
        "source": decision.source.to_string(),
        "status": "executed",
    }))
}
