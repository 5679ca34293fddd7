use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use adhelm_core::{ActorId, DomainError, DomainResult, OrganizationId};

use crate::event::Event;

/// Kind of customer-journey touchpoint.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TouchpointKind {
    PageView,
    Signup,
    TrialStart,
    FeatureUsed,
    AdClick,
    EmailOpen,
    WebinarAttended,
    Purchase,
}

impl TouchpointKind {
    /// Whether this kind can carry conversion revenue.
    pub fn is_conversion(&self) -> bool {
        matches!(self, TouchpointKind::Purchase)
    }

    /// Engaged (post-click) interaction kinds, used for content health.
    pub fn is_engagement(&self) -> bool {
        matches!(
            self,
            TouchpointKind::FeatureUsed | TouchpointKind::EmailOpen | TouchpointKind::WebinarAttended
        )
    }
}

/// An immutable, append-only customer-journey fact.
///
/// Touchpoints are never mutated once recorded. `event_id` is the
/// idempotency key: ledgers drop re-deliveries of the same id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TouchpointEvent {
    pub event_id: Uuid,
    pub organization_id: OrganizationId,
    pub actor_id: ActorId,
    pub kind: TouchpointKind,

    /// Traffic source (e.g. "organic", "google", "referral").
    pub source: String,
    /// Traffic medium (e.g. "cpc", "email"), when known.
    pub medium: Option<String>,
    /// Campaign label, when the touch came from a campaign.
    pub campaign: Option<String>,
    /// Monetary value, meaningful for conversion kinds.
    pub value: Option<f64>,

    pub occurred_at: DateTime<Utc>,
}

impl TouchpointEvent {
    pub fn new(
        organization_id: OrganizationId,
        actor_id: ActorId,
        kind: TouchpointKind,
        source: impl Into<String>,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            organization_id,
            actor_id,
            kind,
            source: source.into(),
            medium: None,
            campaign: None,
            value: None,
            occurred_at,
        }
    }

    pub fn with_medium(mut self, medium: impl Into<String>) -> Self {
        self.medium = Some(medium.into());
        self
    }

    pub fn with_campaign(mut self, campaign: impl Into<String>) -> Self {
        self.campaign = Some(campaign.into());
        self
    }

    pub fn with_value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }

    /// Boundary validation; loose JSON payloads never reach the journal.
    pub fn validate(&self) -> DomainResult<()> {
        if self.source.trim().is_empty() {
            return Err(DomainError::validation("touchpoint source must not be empty"));
        }
        if let Some(v) = self.value {
            if !v.is_finite() || v < 0.0 {
                return Err(DomainError::validation(
                    "touchpoint value must be a finite non-negative number",
                ));
            }
        }
        Ok(())
    }

    /// Revenue carried by this touchpoint, when it converts.
    pub fn conversion_value(&self) -> Option<f64> {
        if self.kind.is_conversion() {
            self.value
        } else {
            None
        }
    }

    /// The key attribution credits: campaign label when present, else source.
    pub fn credit_key(&self) -> &str {
        self.campaign.as_deref().unwrap_or(&self.source)
    }
}

impl Event for TouchpointEvent {
    fn event_type(&self) -> &'static str {
        match self.kind {
            TouchpointKind::PageView => "touchpoint.page_view",
            TouchpointKind::Signup => "touchpoint.signup",
            TouchpointKind::TrialStart => "touchpoint.trial_start",
            TouchpointKind::FeatureUsed => "touchpoint.feature_used",
            TouchpointKind::AdClick => "touchpoint.ad_click",
            TouchpointKind::EmailOpen => "touchpoint.email_open",
            TouchpointKind::WebinarAttended => "touchpoint.webinar_attended",
            TouchpointKind::Purchase => "touchpoint.purchase",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(kind: TouchpointKind) -> TouchpointEvent {
        TouchpointEvent::new(
            OrganizationId::new(),
            ActorId::new(),
            kind,
            "organic",
            Utc::now(),
        )
    }

    #[test]
    fn purchase_with_value_is_a_conversion() {
        let e = event(TouchpointKind::Purchase).with_value(90.0);
        assert_eq!(e.conversion_value(), Some(90.0));
    }

    #[test]
    fn non_purchase_kinds_never_convert() {
        let e = event(TouchpointKind::AdClick).with_value(90.0);
        assert_eq!(e.conversion_value(), None);
    }

    #[test]
    fn credit_key_prefers_campaign_label() {
        let e = event(TouchpointKind::AdClick).with_campaign("spring_sale");
        assert_eq!(e.credit_key(), "spring_sale");

        let e = event(TouchpointKind::PageView);
        assert_eq!(e.credit_key(), "organic");
    }

    #[test]
    fn validation_rejects_empty_source_and_negative_value() {
        let mut e = event(TouchpointKind::PageView);
        e.source = "  ".to_string();
        assert!(e.validate().is_err());

        let e = event(TouchpointKind::Purchase).with_value(-1.0);
        assert!(e.validate().is_err());

        let e = event(TouchpointKind::Purchase).with_value(f64::NAN);
        assert!(e.validate().is_err());
    }
}
