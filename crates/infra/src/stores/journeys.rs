use adhelm_attribution::{CustomerJourney, JourneyStore};
use adhelm_core::{ActorId, OrganizationId, StoreError};

use super::org_store::InMemoryOrgStore;

/// In-memory journey persistence, keyed by actor.
#[derive(Debug, Default)]
pub struct InMemoryJourneyStore {
    inner: InMemoryOrgStore<ActorId, CustomerJourney>,
}

impl InMemoryJourneyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl JourneyStore for InMemoryJourneyStore {
    fn get(
        &self,
        organization_id: OrganizationId,
        actor_id: ActorId,
    ) -> Result<Option<CustomerJourney>, StoreError> {
        Ok(self.inner.get(organization_id, &actor_id))
    }

    fn upsert(
        &self,
        organization_id: OrganizationId,
        actor_id: ActorId,
        journey: CustomerJourney,
    ) -> Result<(), StoreError> {
        self.inner.upsert(organization_id, actor_id, journey);
        Ok(())
    }

    fn list(&self, organization_id: OrganizationId) -> Result<Vec<CustomerJourney>, StoreError> {
        Ok(self.inner.list(organization_id))
    }
}
