use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::journey::TouchSummary;

/// Conversion credit per campaign under all three models, stored together.
///
/// Keys are credit keys (campaign label when present, else source).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AttributionBreakdown {
    pub first_touch: BTreeMap<String, f64>,
    pub last_touch: BTreeMap<String, f64>,
    pub linear: BTreeMap<String, f64>,
}

/// Attribute a conversion worth `value` across a journey's touches.
///
/// - first-touch: 100% to the first touch's credit key;
/// - last-touch: 100% to the last touch's credit key;
/// - linear: the value split evenly across the journey's *distinct* credit
///   keys, so the per-journey sum equals the conversion value.
pub fn attribute(touches: &[TouchSummary], value: f64) -> AttributionBreakdown {
    let mut breakdown = AttributionBreakdown::default();

    let (Some(first), Some(last)) = (touches.first(), touches.last()) else {
        return breakdown;
    };

    breakdown
        .first_touch
        .insert(first.credit_key().to_string(), value);
    breakdown
        .last_touch
        .insert(last.credit_key().to_string(), value);

    let mut distinct: Vec<&str> = Vec::new();
    for touch in touches {
        let key = touch.credit_key();
        if !distinct.contains(&key) {
            distinct.push(key);
        }
    }

    let share = value / distinct.len() as f64;
    for key in distinct {
        breakdown.linear.insert(key.to_string(), share);
    }

    breakdown
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn touch(source: &str, campaign: Option<&str>, offset_hours: i64) -> TouchSummary {
        TouchSummary {
            source: source.to_string(),
            campaign: campaign.map(str::to_string),
            occurred_at: Utc::now() + Duration::hours(offset_hours),
        }
    }

    #[test]
    fn three_touch_journey_splits_evenly() {
        let touches = vec![
            touch("organic", None, 0),
            touch("paid", None, 1),
            touch("referral", None, 2),
        ];

        let breakdown = attribute(&touches, 90.0);

        assert_eq!(breakdown.first_touch["organic"], 90.0);
        assert_eq!(breakdown.last_touch["referral"], 90.0);
        assert_eq!(breakdown.linear.len(), 3);
        for key in ["organic", "paid", "referral"] {
            assert!((breakdown.linear[key] - 30.0).abs() < 1e-9);
        }
    }

    #[test]
    fn linear_sum_equals_conversion_value() {
        let touches = vec![
            touch("organic", None, 0),
            touch("google", Some("spring_sale"), 1),
            touch("google", Some("spring_sale"), 2),
            touch("email", None, 3),
        ];

        let breakdown = attribute(&touches, 100.0);

        // Duplicate credit keys collapse; the split stays even across the
        // distinct keys.
        assert_eq!(breakdown.linear.len(), 3);
        let sum: f64 = breakdown.linear.values().sum();
        assert!((sum - 100.0).abs() < 1e-9);
    }

    #[test]
    fn single_touch_gets_full_credit_under_every_model() {
        let touches = vec![touch("google", Some("brand"), 0)];
        let breakdown = attribute(&touches, 42.0);

        assert_eq!(breakdown.first_touch["brand"], 42.0);
        assert_eq!(breakdown.last_touch["brand"], 42.0);
        assert_eq!(breakdown.linear["brand"], 42.0);
    }

    #[test]
    fn empty_journey_attributes_nothing() {
        let breakdown = attribute(&[], 42.0);
        assert!(breakdown.first_touch.is_empty());
        assert!(breakdown.last_touch.is_empty());
        assert!(breakdown.linear.is_empty());
    }
}
