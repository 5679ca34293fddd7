use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use adhelm_core::{range::whole_days_between, ActorId, Entity, OrganizationId, ValueObject};
use adhelm_events::TouchpointEvent;

use crate::models::{attribute, AttributionBreakdown};

/// Compact view of one touchpoint as the journey remembers it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TouchSummary {
    pub source: String,
    pub campaign: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl TouchSummary {
    /// The key attribution credits: campaign label when present, else source.
    pub fn credit_key(&self) -> &str {
        self.campaign.as_deref().unwrap_or(&self.source)
    }
}

impl From<&TouchpointEvent> for TouchSummary {
    fn from(event: &TouchpointEvent) -> Self {
        Self {
            source: event.source.clone(),
            campaign: event.campaign.clone(),
            occurred_at: event.occurred_at,
        }
    }
}

impl ValueObject for TouchSummary {}

/// One actor's journey through the funnel: a mutable aggregate, upserted by
/// actor id.
///
/// Invariants:
/// - `first_touch` is set once at creation and never overwritten;
/// - `last_touch` is updated on every new touchpoint;
/// - `touchpoint_count` is monotonically non-decreasing;
/// - `attribution` is computed exactly once, at the first conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerJourney {
    pub actor_id: ActorId,
    pub organization_id: OrganizationId,

    pub first_touch: TouchSummary,
    pub last_touch: TouchSummary,
    pub touchpoint_count: u32,
    /// Recorded touchpoints, in arrival order (the linear model's input).
    pub touches: Vec<TouchSummary>,

    pub has_converted: bool,
    pub conversion_value: f64,
    pub conversion_date: Option<DateTime<Utc>>,
    /// Whole days from first touch to first conversion, floored.
    pub days_to_conversion: Option<i64>,
    pub lifetime_value: f64,

    pub attribution: Option<AttributionBreakdown>,
}

impl CustomerJourney {
    /// Start a journey from its first touchpoint.
    pub fn start(organization_id: OrganizationId, actor_id: ActorId, touch: TouchSummary) -> Self {
        Self {
            actor_id,
            organization_id,
            first_touch: touch.clone(),
            last_touch: touch.clone(),
            touchpoint_count: 1,
            touches: vec![touch],
            has_converted: false,
            conversion_value: 0.0,
            conversion_date: None,
            days_to_conversion: None,
            lifetime_value: 0.0,
            attribution: None,
        }
    }

    /// Record a subsequent touchpoint. `first_touch` stays untouched.
    pub fn record_touchpoint(&mut self, touch: TouchSummary) {
        self.touchpoint_count += 1;
        self.last_touch = touch.clone();
        self.touches.push(touch);
    }

    /// Record a conversion worth `value` at `at`.
    ///
    /// Lifetime value accumulates on every conversion. The first conversion
    /// additionally fixes the conversion bookkeeping and computes the stored
    /// attribution splits; later conversions never re-derive them.
    ///
    /// Returns `true` when this call attributed the journey (first conversion).
    pub fn record_conversion(&mut self, value: f64, at: DateTime<Utc>) -> bool {
        self.lifetime_value += value;

        if self.has_converted {
            return false;
        }

        self.has_converted = true;
        self.conversion_value = value;
        self.conversion_date = Some(at);
        self.days_to_conversion = Some(whole_days_between(self.first_touch.occurred_at, at));
        self.attribution = Some(attribute(&self.touches, value));
        true
    }
}

impl Entity for CustomerJourney {
    type Id = ActorId;

    fn id(&self) -> &Self::Id {
        &self.actor_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn touch(source: &str, at: DateTime<Utc>) -> TouchSummary {
        TouchSummary {
            source: source.to_string(),
            campaign: None,
            occurred_at: at,
        }
    }

    #[test]
    fn first_touch_is_set_once_and_last_touch_follows() {
        let t0 = Utc::now();
        let mut journey =
            CustomerJourney::start(OrganizationId::new(), ActorId::new(), touch("organic", t0));

        for (i, source) in ["paid", "referral", "email"].iter().enumerate() {
            journey.record_touchpoint(touch(source, t0 + Duration::hours(i as i64 + 1)));
        }

        assert_eq!(journey.first_touch.source, "organic");
        assert_eq!(journey.last_touch.source, "email");
        assert_eq!(journey.touchpoint_count, 4);
        assert!(!journey.has_converted);
    }

    #[test]
    fn first_conversion_fixes_bookkeeping() {
        let t0 = Utc::now();
        let mut journey =
            CustomerJourney::start(OrganizationId::new(), ActorId::new(), touch("organic", t0));
        let converted_at = t0 + Duration::days(3) + Duration::hours(5);

        assert!(journey.record_conversion(90.0, converted_at));
        assert!(journey.has_converted);
        assert_eq!(journey.conversion_value, 90.0);
        assert_eq!(journey.lifetime_value, 90.0);
        assert_eq!(journey.days_to_conversion, Some(3));
        assert!(journey.attribution.is_some());
    }

    #[test]
    fn later_purchases_accumulate_lifetime_value_only() {
        let t0 = Utc::now();
        let mut journey =
            CustomerJourney::start(OrganizationId::new(), ActorId::new(), touch("organic", t0));

        assert!(journey.record_conversion(90.0, t0 + Duration::days(1)));
        let splits = journey.attribution.clone();

        journey.record_touchpoint(touch("paid", t0 + Duration::days(30)));
        assert!(!journey.record_conversion(500.0, t0 + Duration::days(30)));

        assert_eq!(journey.conversion_value, 90.0);
        assert_eq!(journey.lifetime_value, 590.0);
        assert_eq!(journey.attribution, splits);
    }
}
