use core::str::FromStr;

use serde::{Deserialize, Serialize};

use adhelm_core::DomainError;

/// Budget action vocabulary, shared between the deterministic classifier and
/// the reasoning-oracle response contract.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BudgetAction {
    Scale,
    Maintain,
    Optimize,
    Reduce,
    Pause,
}

impl BudgetAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetAction::Scale => "SCALE",
            BudgetAction::Maintain => "MAINTAIN",
            BudgetAction::Optimize => "OPTIMIZE",
            BudgetAction::Reduce => "REDUCE",
            BudgetAction::Pause => "PAUSE",
        }
    }
}

impl core::fmt::Display for BudgetAction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BudgetAction {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SCALE" => Ok(BudgetAction::Scale),
            "MAINTAIN" => Ok(BudgetAction::Maintain),
            "OPTIMIZE" => Ok(BudgetAction::Optimize),
            "REDUCE" => Ok(BudgetAction::Reduce),
            "PAUSE" => Ok(BudgetAction::Pause),
            other => Err(DomainError::validation(format!(
                "unrecognized budget action: {other:?}"
            ))),
        }
    }
}

/// Outcome of the deterministic classifier: an action plus the budget delta
/// it implies, in percent.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub action: BudgetAction,
    pub delta_pct: f64,
}

/// Classify a campaign by ROI (percent).
///
/// The buckets partition (-inf, +inf] with no gaps or overlaps and are
/// evaluated high-to-low. Pure and total: no side effects, no randomness.
pub fn classify(roi_pct: f64) -> Classification {
    let (action, delta_pct) = if roi_pct > 300.0 {
        (BudgetAction::Scale, 50.0)
    } else if roi_pct > 150.0 {
        (BudgetAction::Maintain, 0.0)
    } else if roi_pct > 50.0 {
        (BudgetAction::Optimize, -15.0)
    } else if roi_pct > 0.0 {
        (BudgetAction::Reduce, -25.0)
    } else {
        (BudgetAction::Pause, -100.0)
    };

    Classification { action, delta_pct }
}

/// Apply a budget delta, clamped so the result is never negative.
pub fn project_budget(current: f64, delta_pct: f64) -> f64 {
    (current * (1.0 + delta_pct / 100.0)).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn buckets_match_thresholds() {
        assert_eq!(classify(400.0).action, BudgetAction::Scale);
        assert_eq!(classify(200.0).action, BudgetAction::Maintain);
        assert_eq!(classify(100.0).action, BudgetAction::Optimize);
        assert_eq!(classify(25.0).action, BudgetAction::Reduce);
        assert_eq!(classify(-10.0).action, BudgetAction::Pause);
    }

    #[test]
    fn boundaries_belong_to_the_lower_bucket() {
        // Each boundary value x sits in the bucket whose upper edge it is.
        assert_eq!(classify(300.0).action, BudgetAction::Maintain);
        assert_eq!(classify(150.0).action, BudgetAction::Optimize);
        assert_eq!(classify(50.0).action, BudgetAction::Reduce);
        assert_eq!(classify(0.0).action, BudgetAction::Pause);
    }

    #[test]
    fn fallback_scenario_budgets() {
        for (roi, spend, expected_action, expected_budget) in [
            (400.0, 100.0, BudgetAction::Scale, 150.0),
            (100.0, 100.0, BudgetAction::Optimize, 85.0),
            (-10.0, 100.0, BudgetAction::Pause, 0.0),
        ] {
            let c = classify(roi);
            assert_eq!(c.action, expected_action);
            let budget = project_budget(spend, c.delta_pct);
            assert!((budget - expected_budget).abs() < 1e-9);
        }
    }

    #[test]
    fn pause_always_zeroes_the_budget() {
        let c = classify(-50.0);
        assert_eq!(project_budget(1234.5, c.delta_pct), 0.0);
    }

    #[test]
    fn action_round_trips_through_str() {
        for action in [
            BudgetAction::Scale,
            BudgetAction::Maintain,
            BudgetAction::Optimize,
            BudgetAction::Reduce,
            BudgetAction::Pause,
        ] {
            assert_eq!(action.as_str().parse::<BudgetAction>().unwrap(), action);
        }
        assert_eq!("pause".parse::<BudgetAction>().unwrap(), BudgetAction::Pause);
        assert!("SCALE_UP".parse::<BudgetAction>().is_err());
    }

    proptest! {
        /// The five buckets partition the ROI axis: exactly one action per
        /// input, adjacent inputs around each boundary never skip a bucket.
        #[test]
        fn classify_is_total_and_deterministic(roi in -1e7f64..1e7f64) {
            let first = classify(roi);
            let second = classify(roi);
            prop_assert_eq!(first, second);
        }

        #[test]
        fn projected_budget_is_never_negative(
            spend in 0.0f64..1e7f64,
            roi in -1e7f64..1e7f64,
        ) {
            let c = classify(roi);
            let budget = project_budget(spend, c.delta_pct);
            prop_assert!(budget >= 0.0);
            if c.action == BudgetAction::Pause {
                prop_assert_eq!(budget, 0.0);
            }
        }

        #[test]
        fn delta_is_monotone_in_roi(a in -1e6f64..1e6f64, b in -1e6f64..1e6f64) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(classify(lo).delta_pct <= classify(hi).delta_pct);
        }
    }
}
