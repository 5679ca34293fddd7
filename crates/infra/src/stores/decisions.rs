use std::sync::RwLock;

use adhelm_budget::{BudgetDecision, DecisionLog};
use adhelm_core::{OrganizationId, StoreError};

/// In-memory append-only decision log.
#[derive(Debug, Default)]
pub struct InMemoryDecisionLog {
    entries: RwLock<Vec<BudgetDecision>>,
}

impl InMemoryDecisionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_organization(&self, organization_id: OrganizationId) -> Vec<BudgetDecision> {
        self.entries
            .read()
            .map(|entries| {
                entries
                    .iter()
                    .filter(|d| d.organization_id == organization_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl DecisionLog for InMemoryDecisionLog {
    fn append(&self, decision: &BudgetDecision) -> Result<(), StoreError> {
        self.entries
            .write()
            .map_err(|_| StoreError::unavailable("decision log lock poisoned"))?
            .push(decision.clone());
        Ok(())
    }
}
