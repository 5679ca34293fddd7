use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use adhelm_core::{CampaignId, OrganizationId};

use crate::error::OracleError;
use crate::parse::{parse_proposal, OracleProposal};
use crate::prompt::build_decision_prompt;

/// The external qualitative-reasoning collaborator.
///
/// `request` is the only blocking network operation in an analysis cycle;
/// implementations own their timeout. No response schema is guaranteed.
pub trait ReasoningOracle: Send + Sync {
    fn request(&self, prompt: &str) -> Result<String, OracleError>;
}

impl<O> ReasoningOracle for Arc<O>
where
    O: ReasoningOracle + ?Sized,
{
    fn request(&self, prompt: &str) -> Result<String, OracleError> {
        (**self).request(prompt)
    }
}

/// One campaign's line in the budget snapshot handed to the oracle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignBudgetLine {
    pub campaign_id: CampaignId,
    pub name: String,
    pub budget: f64,
    pub spend: f64,
    pub revenue: f64,
    /// Percent.
    pub roi: f64,
    pub conversions: u64,
}

/// Current allocation plus ranked campaign metrics for one organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetSnapshot {
    pub organization_id: OrganizationId,
    pub total_budget: f64,
    /// Ranked by ROI, descending.
    pub campaigns: Vec<CampaignBudgetLine>,
}

impl BudgetSnapshot {
    pub fn new(organization_id: OrganizationId, mut campaigns: Vec<CampaignBudgetLine>) -> Self {
        campaigns.sort_by(|a, b| b.roi.partial_cmp(&a.roi).unwrap_or(core::cmp::Ordering::Equal));
        let total_budget = campaigns.iter().map(|c| c.budget).sum();
        Self {
            organization_id,
            total_budget,
            campaigns,
        }
    }
}

/// Adapter from budget snapshots to oracle proposals.
///
/// Builds the structured prompt, performs the one blocking request, and
/// decodes the answer defensively. Never falls back itself: the caller owns
/// the fallback policy per affected campaign.
pub struct DecisionOracleAdapter<O> {
    oracle: O,
}

impl<O: ReasoningOracle> DecisionOracleAdapter<O> {
    pub fn new(oracle: O) -> Self {
        Self { oracle }
    }

    pub fn propose(&self, snapshot: &BudgetSnapshot) -> Result<OracleProposal, OracleError> {
        let prompt = build_decision_prompt(snapshot);
        let raw = self.oracle.request(&prompt)?;
        let proposal = parse_proposal(&raw)?;
        debug!(
            organization = %snapshot.organization_id,
            proposed = proposal.decisions.len(),
            "oracle proposal decoded"
        );
        Ok(proposal)
    }
}
