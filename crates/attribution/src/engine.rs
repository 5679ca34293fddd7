use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use adhelm_core::{ActorId, DateRange, DomainError, OrganizationId, StoreError};
use adhelm_events::TouchpointEvent;

use crate::journey::{CustomerJourney, TouchSummary};

/// Append-only touchpoint ledger.
///
/// `append` returns `false` when the event id was already recorded; the
/// engine treats that as a re-delivery and leaves the journey untouched.
pub trait TouchpointLedger: Send + Sync {
    fn append(&self, event: TouchpointEvent) -> Result<bool, StoreError>;

    fn for_actor(
        &self,
        organization_id: OrganizationId,
        actor_id: ActorId,
    ) -> Result<Vec<TouchpointEvent>, StoreError>;

    fn for_organization(
        &self,
        organization_id: OrganizationId,
        range: &DateRange,
    ) -> Result<Vec<TouchpointEvent>, StoreError>;
}

impl<S> TouchpointLedger for Arc<S>
where
    S: TouchpointLedger + ?Sized,
{
    fn append(&self, event: TouchpointEvent) -> Result<bool, StoreError> {
        (**self).append(event)
    }

    fn for_actor(
        &self,
        organization_id: OrganizationId,
        actor_id: ActorId,
    ) -> Result<Vec<TouchpointEvent>, StoreError> {
        (**self).for_actor(organization_id, actor_id)
    }

    fn for_organization(
        &self,
        organization_id: OrganizationId,
        range: &DateRange,
    ) -> Result<Vec<TouchpointEvent>, StoreError> {
        (**self).for_organization(organization_id, range)
    }
}

/// Journey persistence, upserted by actor id.
pub trait JourneyStore: Send + Sync {
    fn get(
        &self,
        organization_id: OrganizationId,
        actor_id: ActorId,
    ) -> Result<Option<CustomerJourney>, StoreError>;

    fn upsert(
        &self,
        organization_id: OrganizationId,
        actor_id: ActorId,
        journey: CustomerJourney,
    ) -> Result<(), StoreError>;

    fn list(&self, organization_id: OrganizationId) -> Result<Vec<CustomerJourney>, StoreError>;
}

impl<S> JourneyStore for Arc<S>
where
    S: JourneyStore + ?Sized,
{
    fn get(
        &self,
        organization_id: OrganizationId,
        actor_id: ActorId,
    ) -> Result<Option<CustomerJourney>, StoreError> {
        (**self).get(organization_id, actor_id)
    }

    fn upsert(
        &self,
        organization_id: OrganizationId,
        actor_id: ActorId,
        journey: CustomerJourney,
    ) -> Result<(), StoreError> {
        (**self).upsert(organization_id, actor_id, journey)
    }

    fn list(&self, organization_id: OrganizationId) -> Result<Vec<CustomerJourney>, StoreError> {
        (**self).list(organization_id)
    }
}

#[derive(Debug, Error)]
pub enum AttributionError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Per-campaign conversion credit totals over a date range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct CampaignAttribution {
    pub first_touch: f64,
    pub last_touch: f64,
    pub linear: f64,
    /// Converted journeys that touched this campaign.
    pub conversions: u32,
}

/// Builds and maintains per-actor journeys from the touchpoint stream and
/// answers per-campaign attribution queries.
pub struct AttributionEngine<L, J> {
    ledger: L,
    journeys: J,
}

impl<L, J> AttributionEngine<L, J>
where
    L: TouchpointLedger,
    J: JourneyStore,
{
    pub fn new(ledger: L, journeys: J) -> Self {
        Self { ledger, journeys }
    }

    /// Append a touchpoint and update the actor's journey.
    ///
    /// Idempotent per `event_id`: a re-delivered event is dropped before it
    /// can touch the journey.
    pub fn ingest(&self, event: TouchpointEvent) -> Result<(), AttributionError> {
        event.validate()?;

        let organization_id = event.organization_id;
        let actor_id = event.actor_id;

        if !self.ledger.append(event.clone())? {
            warn!(
                organization = %organization_id,
                actor = %actor_id,
                event_id = %event.event_id,
                "duplicate touchpoint dropped"
            );
            return Ok(());
        }

        let touch = TouchSummary::from(&event);
        let mut journey = match self.journeys.get(organization_id, actor_id)? {
            Some(mut journey) => {
                journey.record_touchpoint(touch);
                journey
            }
            None => CustomerJourney::start(organization_id, actor_id, touch),
        };

        if let Some(value) = event.conversion_value() {
            let attributed = journey.record_conversion(value, event.occurred_at);
            debug!(
                organization = %organization_id,
                actor = %actor_id,
                value,
                attributed,
                "conversion recorded"
            );
        }

        self.journeys.upsert(organization_id, actor_id, journey)?;
        Ok(())
    }

    pub fn journey(
        &self,
        organization_id: OrganizationId,
        actor_id: ActorId,
    ) -> Result<Option<CustomerJourney>, AttributionError> {
        Ok(self.journeys.get(organization_id, actor_id)?)
    }

    /// Aggregate stored attribution by campaign, per model, over journeys
    /// converted inside `range`.
    ///
    /// Campaigns with no credited touch in range are absent from the map,
    /// not zero-filled.
    pub fn attribution_by_campaign(
        &self,
        organization_id: OrganizationId,
        range: &DateRange,
    ) -> Result<BTreeMap<String, CampaignAttribution>, AttributionError> {
        let mut totals: BTreeMap<String, CampaignAttribution> = BTreeMap::new();

        for journey in self.journeys.list(organization_id)? {
            let Some(converted_at) = journey.conversion_date else {
                continue;
            };
            if !range.contains(converted_at) {
                continue;
            }
            let Some(breakdown) = &journey.attribution else {
                continue;
            };

            for (campaign, value) in &breakdown.first_touch {
                totals.entry(campaign.clone()).or_default().first_touch += value;
            }
            for (campaign, value) in &breakdown.last_touch {
                totals.entry(campaign.clone()).or_default().last_touch += value;
            }
            for (campaign, value) in &breakdown.linear {
                let entry = totals.entry(campaign.clone()).or_default();
                entry.linear += value;
                entry.conversions += 1;
            }
        }

        Ok(totals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adhelm_events::TouchpointKind;
    use chrono::{Duration, Utc};
    use std::collections::HashMap;
    use std::sync::RwLock;

    #[derive(Default)]
    struct StubLedger {
        events: RwLock<Vec<TouchpointEvent>>,
    }

    impl TouchpointLedger for StubLedger {
        fn append(&self, event: TouchpointEvent) -> Result<bool, StoreError> {
            let mut events = self.events.write().unwrap();
            if events.iter().any(|e| e.event_id == event.event_id) {
                return Ok(false);
            }
            events.push(event);
            Ok(true)
        }

        fn for_actor(
            &self,
            organization_id: OrganizationId,
            actor_id: ActorId,
        ) -> Result<Vec<TouchpointEvent>, StoreError> {
            Ok(self
                .events
                .read()
                .unwrap()
                .iter()
                .filter(|e| e.organization_id == organization_id && e.actor_id == actor_id)
                .cloned()
                .collect())
        }

        fn for_organization(
            &self,
            organization_id: OrganizationId,
            range: &DateRange,
        ) -> Result<Vec<TouchpointEvent>, StoreError> {
            Ok(self
                .events
                .read()
                .unwrap()
                .iter()
                .filter(|e| e.organization_id == organization_id && range.contains(e.occurred_at))
                .cloned()
                .collect())
        }
    }

    #[derive(Default)]
    struct StubJourneys {
        inner: RwLock<HashMap<(OrganizationId, ActorId), CustomerJourney>>,
    }

    impl JourneyStore for StubJourneys {
        fn get(
            &self,
            organization_id: OrganizationId,
            actor_id: ActorId,
        ) -> Result<Option<CustomerJourney>, StoreError> {
            Ok(self
                .inner
                .read()
                .unwrap()
                .get(&(organization_id, actor_id))
                .cloned())
        }

        fn upsert(
            &self,
            organization_id: OrganizationId,
            actor_id: ActorId,
            journey: CustomerJourney,
        ) -> Result<(), StoreError> {
            self.inner
                .write()
                .unwrap()
                .insert((organization_id, actor_id), journey);
            Ok(())
        }

        fn list(
            &self,
            organization_id: OrganizationId,
        ) -> Result<Vec<CustomerJourney>, StoreError> {
            Ok(self
                .inner
                .read()
                .unwrap()
                .iter()
                .filter(|((org, _), _)| *org == organization_id)
                .map(|(_, j)| j.clone())
                .collect())
        }
    }

    fn engine() -> AttributionEngine<Arc<StubLedger>, Arc<StubJourneys>> {
        AttributionEngine::new(Arc::new(StubLedger::default()), Arc::new(StubJourneys::default()))
    }

    fn touch_event(
        org: OrganizationId,
        actor: ActorId,
        kind: TouchpointKind,
        source: &str,
        offset_hours: i64,
    ) -> TouchpointEvent {
        TouchpointEvent::new(org, actor, kind, source, Utc::now() + Duration::hours(offset_hours))
    }

    #[test]
    fn n_touchpoints_without_conversion() {
        let engine = engine();
        let org = OrganizationId::new();
        let actor = ActorId::new();

        engine
            .ingest(touch_event(org, actor, TouchpointKind::PageView, "organic", 0))
            .unwrap();
        engine
            .ingest(touch_event(org, actor, TouchpointKind::AdClick, "paid", 1))
            .unwrap();
        engine
            .ingest(touch_event(org, actor, TouchpointKind::Signup, "referral", 2))
            .unwrap();

        let journey = engine.journey(org, actor).unwrap().unwrap();
        assert_eq!(journey.first_touch.source, "organic");
        assert_eq!(journey.last_touch.source, "referral");
        assert_eq!(journey.touchpoint_count, 3);
        assert!(!journey.has_converted);
    }

    #[test]
    fn reference_journey_attributes_under_all_models() {
        let engine = engine();
        let org = OrganizationId::new();
        let actor = ActorId::new();

        engine
            .ingest(touch_event(org, actor, TouchpointKind::PageView, "organic", 0))
            .unwrap();
        engine
            .ingest(touch_event(org, actor, TouchpointKind::AdClick, "paid", 1))
            .unwrap();
        engine
            .ingest(
                touch_event(org, actor, TouchpointKind::Purchase, "referral", 2).with_value(90.0),
            )
            .unwrap();

        let journey = engine.journey(org, actor).unwrap().unwrap();
        let breakdown = journey.attribution.as_ref().unwrap();

        assert_eq!(breakdown.first_touch["organic"], 90.0);
        assert_eq!(breakdown.last_touch["referral"], 90.0);
        for key in ["organic", "paid", "referral"] {
            assert!((breakdown.linear[key] - 30.0).abs() < 1e-9);
        }
    }

    #[test]
    fn duplicate_event_id_leaves_journey_untouched() {
        let engine = engine();
        let org = OrganizationId::new();
        let actor = ActorId::new();

        let event = touch_event(org, actor, TouchpointKind::PageView, "organic", 0);
        engine.ingest(event.clone()).unwrap();
        engine.ingest(event).unwrap();

        let journey = engine.journey(org, actor).unwrap().unwrap();
        assert_eq!(journey.touchpoint_count, 1);
    }

    #[test]
    fn aggregation_by_campaign_respects_range_and_omits_untouched() {
        let engine = engine();
        let org = OrganizationId::new();

        for value in [90.0, 30.0] {
            let actor = ActorId::new();
            engine
                .ingest(touch_event(org, actor, TouchpointKind::PageView, "organic", 0))
                .unwrap();
            engine
                .ingest(
                    touch_event(org, actor, TouchpointKind::Purchase, "referral", 1)
                        .with_value(value),
                )
                .unwrap();
        }

        let range = DateRange::new(
            Utc::now() - Duration::days(1),
            Utc::now() + Duration::days(1),
        )
        .unwrap();

        let totals = engine.attribution_by_campaign(org, &range).unwrap();

        assert_eq!(totals["organic"].first_touch, 120.0);
        assert_eq!(totals["referral"].last_touch, 120.0);
        assert!((totals["organic"].linear - 60.0).abs() < 1e-9);
        assert_eq!(totals["organic"].conversions, 2);
        assert!(!totals.contains_key("paid"));

        // An empty window aggregates nothing.
        let empty = DateRange::new(
            Utc::now() - Duration::days(10),
            Utc::now() - Duration::days(9),
        )
        .unwrap();
        assert!(engine.attribution_by_campaign(org, &empty).unwrap().is_empty());
    }
}
