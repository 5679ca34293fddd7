use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use adhelm_core::{OrganizationId, StoreError};

/// The four sub-domains of the composite score.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthDomain {
    Content,
    Ads,
    Growth,
    Attribution,
}

/// Letter-grade bands over the overall score.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthGrade {
    Excellent,
    Good,
    NeedsImprovement,
    Critical,
}

impl HealthGrade {
    pub fn from_score(overall: f64) -> Self {
        if overall >= 90.0 {
            HealthGrade::Excellent
        } else if overall >= 70.0 {
            HealthGrade::Good
        } else if overall >= 50.0 {
            HealthGrade::NeedsImprovement
        } else {
            HealthGrade::Critical
        }
    }
}

/// Recommendation urgency; declaration order is the sort order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationPriority {
    Critical,
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub domain: HealthDomain,
    pub priority: RecommendationPriority,
    pub message: String,
}

/// Signals gathered for one scoring run.
///
/// All of these are derivable from the touchpoint ledger, the journeys and
/// the campaign snapshots; the engine facade does the gathering.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HealthInputs {
    pub page_views_30d: u32,
    /// Engaged events (feature use, email opens, webinars) per page view.
    pub engaged_share: f64,
    /// Revenue over spend across campaigns, as a multiple.
    pub roas: f64,
    /// Click-through rate across campaigns, percent.
    pub ctr: f64,
    /// Revenue growth against the prior period, percent.
    pub revenue_growth_pct: f64,
    pub signups_30d: u32,
    /// Share of conversions with a stored attribution breakdown, in [0, 1].
    pub attributed_share: f64,
    pub avg_touches_per_conversion: f64,
}

/// Per-domain sub-scores, each capped at 25.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct HealthBreakdown {
    pub content: f64,
    pub ads: f64,
    pub growth: f64,
    pub attribution: f64,
}

impl HealthBreakdown {
    pub fn overall(&self) -> f64 {
        self.content + self.ads + self.growth + self.attribution
    }

    fn for_domain(&self, domain: HealthDomain) -> f64 {
        match domain {
            HealthDomain::Content => self.content,
            HealthDomain::Ads => self.ads,
            HealthDomain::Growth => self.growth,
            HealthDomain::Attribution => self.attribution,
        }
    }
}

/// Periodic snapshot, appended every run so trends stay comparable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthScoreRecord {
    pub record_id: Uuid,
    pub organization_id: OrganizationId,
    pub overall: f64,
    pub breakdown: HealthBreakdown,
    pub grade: HealthGrade,
    pub recorded_at: DateTime<Utc>,
}

/// A scored run plus its week-over-week trend and recommendations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub record: HealthScoreRecord,
    /// Current minus the score recorded at least 7 days ago; `None` when no
    /// prior record exists (neutral).
    pub trend: Option<f64>,
    pub recommendations: Vec<Recommendation>,
}

/// Health record persistence.
pub trait HealthHistory: Send + Sync {
    fn append(&self, record: HealthScoreRecord) -> Result<(), StoreError>;

    /// Most recent record strictly before `cutoff`.
    fn most_recent_before(
        &self,
        organization_id: OrganizationId,
        cutoff: DateTime<Utc>,
    ) -> Result<Option<HealthScoreRecord>, StoreError>;
}

impl<S> HealthHistory for Arc<S>
where
    S: HealthHistory + ?Sized,
{
    fn append(&self, record: HealthScoreRecord) -> Result<(), StoreError> {
        (**self).append(record)
    }

    fn most_recent_before(
        &self,
        organization_id: OrganizationId,
        cutoff: DateTime<Utc>,
    ) -> Result<Option<HealthScoreRecord>, StoreError> {
        (**self).most_recent_before(organization_id, cutoff)
    }
}

/// Targets each ramp climbs toward. Values beyond target award no bonus.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreTargets {
    pub page_views_30d: f64,
    pub engaged_share: f64,
    pub roas: f64,
    pub ctr: f64,
    pub revenue_growth_pct: f64,
    pub signups_30d: f64,
    pub attributed_share: f64,
    pub avg_touches_per_conversion: f64,
}

impl Default for ScoreTargets {
    fn default() -> Self {
        Self {
            page_views_30d: 1_000.0,
            engaged_share: 0.2,
            roas: 3.0,
            ctr: 2.0,
            revenue_growth_pct: 20.0,
            signups_30d: 50.0,
            attributed_share: 0.9,
            avg_touches_per_conversion: 3.0,
        }
    }
}

/// Weighted composite scorer: four domains, 25 points each, every component
/// a capped linear ramp toward its target.
#[derive(Debug, Clone, Default)]
pub struct HealthScorer {
    targets: ScoreTargets,
}

/// Sub-score below which a domain earns a recommendation.
const HEALTHY_THRESHOLD: f64 = 15.0;

const MAJOR_CAP: f64 = 15.0;
const MINOR_CAP: f64 = 10.0;

impl HealthScorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_targets(targets: ScoreTargets) -> Self {
        Self { targets }
    }

    pub fn breakdown(&self, inputs: &HealthInputs) -> HealthBreakdown {
        let t = &self.targets;
        HealthBreakdown {
            content: ramp(inputs.page_views_30d as f64, t.page_views_30d, MAJOR_CAP)
                + ramp(inputs.engaged_share, t.engaged_share, MINOR_CAP),
            ads: ramp(inputs.roas, t.roas, MAJOR_CAP) + ramp(inputs.ctr, t.ctr, MINOR_CAP),
            growth: ramp(inputs.revenue_growth_pct, t.revenue_growth_pct, MAJOR_CAP)
                + ramp(inputs.signups_30d as f64, t.signups_30d, MINOR_CAP),
            attribution: ramp(inputs.attributed_share, t.attributed_share, MAJOR_CAP)
                + ramp(
                    inputs.avg_touches_per_conversion,
                    t.avg_touches_per_conversion,
                    MINOR_CAP,
                ),
        }
    }

    pub fn compute(
        &self,
        organization_id: OrganizationId,
        inputs: &HealthInputs,
        recorded_at: DateTime<Utc>,
    ) -> HealthScoreRecord {
        let breakdown = self.breakdown(inputs);
        let overall = breakdown.overall();
        HealthScoreRecord {
            record_id: Uuid::now_v7(),
            organization_id,
            overall,
            breakdown,
            grade: HealthGrade::from_score(overall),
            recorded_at,
        }
    }

    /// Assemble the report: trend against a prior record (when one exists)
    /// and catalog recommendations for unhealthy domains.
    pub fn report(
        &self,
        record: HealthScoreRecord,
        prior: Option<&HealthScoreRecord>,
    ) -> HealthReport {
        let trend = prior.map(|p| record.overall - p.overall);
        let recommendations = recommendations_for(&record.breakdown);
        HealthReport {
            record,
            trend,
            recommendations,
        }
    }
}

/// Capped linear ramp: full marks at target, proportional below, no bonus
/// beyond. Negative values score zero.
fn ramp(value: f64, target: f64, cap: f64) -> f64 {
    if target <= 0.0 {
        return 0.0;
    }
    cap * (value / target).clamp(0.0, 1.0)
}

/// Fixed catalog keyed by domain, emitted when the sub-score falls below the
/// healthy threshold, sorted critical > high > medium > low.
fn recommendations_for(breakdown: &HealthBreakdown) -> Vec<Recommendation> {
    const CATALOG: [(HealthDomain, RecommendationPriority, &str); 4] = [
        (
            HealthDomain::Ads,
            RecommendationPriority::Critical,
            "Ad efficiency is below target; rebalance spend toward campaigns with positive return",
        ),
        (
            HealthDomain::Growth,
            RecommendationPriority::High,
            "Growth is stalling; revisit acquisition channels and trial conversion",
        ),
        (
            HealthDomain::Attribution,
            RecommendationPriority::Medium,
            "Attribution coverage is thin; instrument more touchpoints so conversions can be credited",
        ),
        (
            HealthDomain::Content,
            RecommendationPriority::Low,
            "Content reach is below target; increase publishing cadence and distribution",
        ),
    ];

    let mut recommendations: Vec<Recommendation> = CATALOG
        .iter()
        .filter(|(domain, _, _)| breakdown.for_domain(*domain) < HEALTHY_THRESHOLD)
        .map(|(domain, priority, message)| Recommendation {
            domain: *domain,
            priority: *priority,
            message: (*message).to_string(),
        })
        .collect();

    recommendations.sort_by_key(|r| r.priority);
    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strong_inputs() -> HealthInputs {
        HealthInputs {
            page_views_30d: 2_000,
            engaged_share: 0.5,
            roas: 4.0,
            ctr: 3.0,
            revenue_growth_pct: 30.0,
            signups_30d: 80,
            attributed_share: 0.95,
            avg_touches_per_conversion: 4.0,
        }
    }

    #[test]
    fn overall_is_the_exact_sum_of_sub_scores() {
        let scorer = HealthScorer::new();
        let inputs = HealthInputs {
            page_views_30d: 500,
            engaged_share: 0.1,
            roas: 1.5,
            ctr: 1.0,
            revenue_growth_pct: 10.0,
            signups_30d: 25,
            attributed_share: 0.45,
            avg_touches_per_conversion: 1.5,
        };
        let record = scorer.compute(OrganizationId::new(), &inputs, Utc::now());

        let b = record.breakdown;
        assert!((record.overall - (b.content + b.ads + b.growth + b.attribution)).abs() < 1e-9);
        assert!((0.0..=100.0).contains(&record.overall));
        for sub in [b.content, b.ads, b.growth, b.attribution] {
            assert!((0.0..=25.0).contains(&sub));
        }
    }

    #[test]
    fn values_beyond_target_award_no_bonus() {
        let scorer = HealthScorer::new();
        let record = scorer.compute(OrganizationId::new(), &strong_inputs(), Utc::now());

        assert_eq!(record.overall, 100.0);
        assert_eq!(record.grade, HealthGrade::Excellent);
        assert!(record.overall <= 100.0);
    }

    #[test]
    fn negative_growth_scores_zero_not_negative() {
        let scorer = HealthScorer::new();
        let mut inputs = strong_inputs();
        inputs.revenue_growth_pct = -40.0;
        let breakdown = scorer.breakdown(&inputs);

        assert_eq!(breakdown.growth, 10.0); // signups ramp only
        assert!(breakdown.growth >= 0.0);
    }

    #[test]
    fn grade_bands() {
        for (score, grade) in [
            (95.0, HealthGrade::Excellent),
            (90.0, HealthGrade::Excellent),
            (75.0, HealthGrade::Good),
            (55.0, HealthGrade::NeedsImprovement),
            (20.0, HealthGrade::Critical),
        ] {
            assert_eq!(HealthGrade::from_score(score), grade, "score {score}");
        }
    }

    #[test]
    fn recommendations_cover_unhealthy_domains_in_priority_order() {
        let breakdown = HealthBreakdown {
            content: 5.0,
            ads: 5.0,
            growth: 5.0,
            attribution: 5.0,
        };
        let recs = recommendations_for(&breakdown);

        assert_eq!(recs.len(), 4);
        assert_eq!(recs[0].domain, HealthDomain::Ads);
        assert_eq!(recs[0].priority, RecommendationPriority::Critical);
        assert_eq!(recs[3].domain, HealthDomain::Content);

        let healthy = HealthBreakdown {
            content: 20.0,
            ads: 20.0,
            growth: 20.0,
            attribution: 20.0,
        };
        assert!(recommendations_for(&healthy).is_empty());
    }

    #[test]
    fn trend_is_neutral_without_a_prior_record() {
        let scorer = HealthScorer::new();
        let record = scorer.compute(OrganizationId::new(), &strong_inputs(), Utc::now());

        let report = scorer.report(record.clone(), None);
        assert_eq!(report.trend, None);

        let mut prior = record.clone();
        prior.overall = 80.0;
        let report = scorer.report(record, Some(&prior));
        assert_eq!(report.trend, Some(20.0));
    }
}
