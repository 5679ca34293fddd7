use std::sync::RwLock;

use adhelm_budget::AuditTrail;
use adhelm_core::{OrganizationId, StoreError};
use adhelm_events::{IntegrationEvent, Severity};

/// In-memory append-only audit trail.
#[derive(Debug, Default)]
pub struct InMemoryAuditTrail {
    events: RwLock<Vec<IntegrationEvent>>,
}

impl InMemoryAuditTrail {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_organization(&self, organization_id: OrganizationId) -> Vec<IntegrationEvent> {
        self.events
            .read()
            .map(|events| {
                events
                    .iter()
                    .filter(|e| e.organization_id == organization_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn by_category(
        &self,
        organization_id: OrganizationId,
        category: &str,
    ) -> Vec<IntegrationEvent> {
        self.for_organization(organization_id)
            .into_iter()
            .filter(|e| e.category == category)
            .collect()
    }

    pub fn by_severity(
        &self,
        organization_id: OrganizationId,
        severity: Severity,
    ) -> Vec<IntegrationEvent> {
        self.for_organization(organization_id)
            .into_iter()
            .filter(|e| e.severity == severity)
            .collect()
    }
}

impl AuditTrail for InMemoryAuditTrail {
    fn append(&self, event: IntegrationEvent) -> Result<(), StoreError> {
        self.events
            .write()
            .map_err(|_| StoreError::unavailable("audit trail lock poisoned"))?
            .push(event);
        Ok(())
    }
}
