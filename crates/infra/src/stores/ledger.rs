use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use uuid::Uuid;

use adhelm_attribution::TouchpointLedger;
use adhelm_core::{ActorId, DateRange, OrganizationId, StoreError};
use adhelm_events::TouchpointEvent;

#[derive(Debug, Default)]
struct LedgerInner {
    /// Per (organization, actor) streams, in arrival order.
    streams: HashMap<(OrganizationId, ActorId), Vec<TouchpointEvent>>,
    /// Seen event ids; re-deliveries are dropped.
    seen: HashSet<Uuid>,
}

/// In-memory append-only touchpoint ledger.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryTouchpointLedger {
    inner: RwLock<LedgerInner>,
}

impl InMemoryTouchpointLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TouchpointLedger for InMemoryTouchpointLedger {
    fn append(&self, event: TouchpointEvent) -> Result<bool, StoreError> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| StoreError::unavailable("ledger lock poisoned"))?;

        if !inner.seen.insert(event.event_id) {
            return Ok(false);
        }

        inner
            .streams
            .entry((event.organization_id, event.actor_id))
            .or_default()
            .push(event);
        Ok(true)
    }

    fn for_actor(
        &self,
        organization_id: OrganizationId,
        actor_id: ActorId,
    ) -> Result<Vec<TouchpointEvent>, StoreError> {
        let inner = self
            .inner
            .read()
            .map_err(|_| StoreError::unavailable("ledger lock poisoned"))?;

        Ok(inner
            .streams
            .get(&(organization_id, actor_id))
            .cloned()
            .unwrap_or_default())
    }

    fn for_organization(
        &self,
        organization_id: OrganizationId,
        range: &DateRange,
    ) -> Result<Vec<TouchpointEvent>, StoreError> {
        let inner = self
            .inner
            .read()
            .map_err(|_| StoreError::unavailable("ledger lock poisoned"))?;

        let mut events: Vec<TouchpointEvent> = inner
            .streams
            .iter()
            .filter(|((org, _), _)| *org == organization_id)
            .flat_map(|(_, stream)| stream.iter())
            .filter(|e| range.contains(e.occurred_at))
            .cloned()
            .collect();

        events.sort_by_key(|e| e.occurred_at);
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adhelm_events::TouchpointKind;
    use chrono::{Duration, Utc};

    #[test]
    fn append_is_idempotent_per_event_id() {
        let ledger = InMemoryTouchpointLedger::new();
        let event = TouchpointEvent::new(
            OrganizationId::new(),
            ActorId::new(),
            TouchpointKind::PageView,
            "organic",
            Utc::now(),
        );

        assert!(ledger.append(event.clone()).unwrap());
        assert!(!ledger.append(event.clone()).unwrap());
        assert_eq!(
            ledger
                .for_actor(event.organization_id, event.actor_id)
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn organization_query_filters_by_range_and_sorts() {
        let ledger = InMemoryTouchpointLedger::new();
        let org = OrganizationId::new();
        let now = Utc::now();

        for (offset, source) in [(-3i64, "old"), (-1, "recent"), (0, "today")] {
            ledger
                .append(TouchpointEvent::new(
                    org,
                    ActorId::new(),
                    TouchpointKind::PageView,
                    source,
                    now + Duration::days(offset),
                ))
                .unwrap();
        }

        let range = DateRange::new(now - Duration::days(2), now + Duration::hours(1)).unwrap();
        let events = ledger.for_organization(org, &range).unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].source, "recent");
        assert_eq!(events[1].source, "today");
    }
}
