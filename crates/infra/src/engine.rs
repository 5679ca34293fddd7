//! The composed decision engine.
//!
//! Every collaborator is injected once, here, at composition time. Business
//! logic never checks which oracle strategy or store backend it is talking
//! to.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde_json::json;
use thiserror::Error;
use tracing::info;

use adhelm_analytics::{
    Anomaly, AnomalyDetector, AnomalySeverity, ForecastEngine, ForecastResult, HealthHistory,
    HealthInputs, HealthReport, HealthScorer, MetricKind, MetricSeries, RevenueHistory,
};
use adhelm_attribution::{
    AttributionEngine, AttributionError, CampaignAttribution, CustomerJourney, JourneyStore,
    TouchpointLedger,
};
use adhelm_budget::{
    AuditTrail, BudgetController, BudgetError, CampaignDirectory, CycleOutcome, DecisionLog,
};
use adhelm_core::{
    ActorId, DateRange, DomainError, OrganizationId, ProductId, StoreError,
};
use adhelm_events::{IntegrationEvent, Severity, TouchpointEvent, TouchpointKind};
use adhelm_oracle::ReasoningOracle;

use crate::notify::NotificationSink;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Attribution(#[from] AttributionError),

    #[error(transparent)]
    Budget(#[from] BudgetError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Everything the engine talks to, chosen once at composition time.
pub struct Collaborators {
    pub ledger: Arc<dyn TouchpointLedger>,
    pub journeys: Arc<dyn JourneyStore>,
    pub campaigns: Arc<dyn CampaignDirectory>,
    pub decisions: Arc<dyn DecisionLog>,
    pub audit: Arc<dyn AuditTrail>,
    pub health_history: Arc<dyn HealthHistory>,
    pub revenue_history: Arc<dyn RevenueHistory>,
    pub oracle: Arc<dyn ReasoningOracle>,
    pub notifications: Arc<dyn NotificationSink>,
}

/// The marketing decision engine: one instance per deployment, shared across
/// organization runners.
pub struct DecisionEngine {
    ledger: Arc<dyn TouchpointLedger>,
    journeys: Arc<dyn JourneyStore>,
    campaigns: Arc<dyn CampaignDirectory>,
    audit: Arc<dyn AuditTrail>,
    health_history: Arc<dyn HealthHistory>,
    revenue_history: Arc<dyn RevenueHistory>,
    notifications: Arc<dyn NotificationSink>,

    attribution: AttributionEngine<Arc<dyn TouchpointLedger>, Arc<dyn JourneyStore>>,
    controller: BudgetController<
        Arc<dyn CampaignDirectory>,
        Arc<dyn DecisionLog>,
        Arc<dyn AuditTrail>,
        Arc<dyn ReasoningOracle>,
    >,
    detector: AnomalyDetector,
    forecaster: ForecastEngine,
    scorer: HealthScorer,
}

impl DecisionEngine {
    pub fn new(collaborators: Collaborators) -> Self {
        let Collaborators {
            ledger,
            journeys,
            campaigns,
            decisions,
            audit,
            health_history,
            revenue_history,
            oracle,
            notifications,
        } = collaborators;

        let attribution = AttributionEngine::new(Arc::clone(&ledger), Arc::clone(&journeys));
        let controller = BudgetController::new(
            Arc::clone(&campaigns),
            decisions,
            Arc::clone(&audit),
            oracle,
        );

        Self {
            ledger,
            journeys,
            campaigns,
            audit,
            health_history,
            revenue_history,
            notifications,
            attribution,
            controller,
            detector: AnomalyDetector::new(),
            forecaster: ForecastEngine::new(),
            scorer: HealthScorer::new(),
        }
    }

    pub fn with_detector(mut self, detector: AnomalyDetector) -> Self {
        self.detector = detector;
        self
    }

    pub fn with_scorer(mut self, scorer: HealthScorer) -> Self {
        self.scorer = scorer;
        self
    }

    /// Record one journey fact (idempotent per event id).
    pub fn track_touchpoint(&self, event: TouchpointEvent) -> Result<(), EngineError> {
        Ok(self.attribution.ingest(event)?)
    }

    pub fn journey(
        &self,
        organization_id: OrganizationId,
        actor_id: ActorId,
    ) -> Result<Option<CustomerJourney>, EngineError> {
        Ok(self.attribution.journey(organization_id, actor_id)?)
    }

    /// Run one budget cycle; decisions are always populated, executed only
    /// when `auto_execute` is set.
    pub fn run_analysis_cycle(
        &self,
        organization_id: OrganizationId,
        auto_execute: bool,
    ) -> Result<CycleOutcome, EngineError> {
        Ok(self.controller.run_cycle(organization_id, auto_execute)?)
    }

    pub fn attribution_by_campaign(
        &self,
        organization_id: OrganizationId,
        range: &DateRange,
    ) -> Result<BTreeMap<String, CampaignAttribution>, EngineError> {
        Ok(self.attribution.attribution_by_campaign(organization_id, range)?)
    }

    /// Detect metric anomalies for today; high severity fans out to the
    /// notification sink, every anomaly is audited.
    pub fn detect_anomalies(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<Anomaly>, EngineError> {
        self.detect_anomalies_on(organization_id, Utc::now().date_naive())
    }

    pub fn detect_anomalies_on(
        &self,
        organization_id: OrganizationId,
        today: NaiveDate,
    ) -> Result<Vec<Anomaly>, EngineError> {
        let from = today - Duration::days(self.detector.window_days());
        let range = DateRange::new(day_start(from), day_start(today + Duration::days(1)))?;
        let events = self.ledger.for_organization(organization_id, &range)?;

        let series: Vec<MetricSeries> = [
            MetricKind::Revenue,
            MetricKind::Conversions,
            MetricKind::Clicks,
            MetricKind::PageViews,
        ]
        .into_iter()
        .map(|metric| {
            MetricSeries::daily_from_touchpoints(organization_id, metric, &events, from, today)
        })
        .collect();

        let anomalies = self.detector.detect_all(&series, today);
        let now = Utc::now();

        for anomaly in &anomalies {
            let severity = match anomaly.severity {
                AnomalySeverity::High => Severity::Warning,
                _ => Severity::Info,
            };
            self.audit.append(
                IntegrationEvent::new(
                    organization_id,
                    "anomaly.detected",
                    severity,
                    anomaly.explanation.clone(),
                    now,
                )
                .with_metadata(json!({
                    "metric": anomaly.metric.to_string(),
                    "day": anomaly.day,
                    "baseline": anomaly.baseline,
                    "observed": anomaly.observed,
                    "deviation_pct": anomaly.deviation_pct,
                    "severity": anomaly.severity,
                })),
            )?;

            if anomaly.severity == AnomalySeverity::High {
                self.notifications.notify(
                    Severity::Critical,
                    &anomaly.explanation,
                    json!({
                        "organization_id": organization_id,
                        "metric": anomaly.metric.to_string(),
                        "deviation_pct": anomaly.deviation_pct,
                    }),
                );
            }
        }

        if !anomalies.is_empty() {
            info!(
                organization = %organization_id,
                count = anomalies.len(),
                "metric anomalies detected"
            );
        }

        Ok(anomalies)
    }

    /// Forecast monthly revenue for a product.
    pub fn forecast(
        &self,
        product_id: ProductId,
        horizon_months: u32,
    ) -> Result<ForecastResult, EngineError> {
        let history = self.revenue_history.monthly_revenue(product_id)?;
        Ok(self
            .forecaster
            .forecast_revenue(product_id, &history, horizon_months))
    }

    /// Score the organization's marketing health and append the record.
    pub fn compute_health(
        &self,
        organization_id: OrganizationId,
    ) -> Result<HealthReport, EngineError> {
        self.compute_health_at(organization_id, Utc::now())
    }

    pub fn compute_health_at(
        &self,
        organization_id: OrganizationId,
        now: DateTime<Utc>,
    ) -> Result<HealthReport, EngineError> {
        let inputs = self.gather_health_inputs(organization_id, now)?;
        let record = self.scorer.compute(organization_id, &inputs, now);
        let prior = self
            .health_history
            .most_recent_before(organization_id, now - Duration::days(7))?;
        self.health_history.append(record.clone())?;
        Ok(self.scorer.report(record, prior.as_ref()))
    }

    /// Derive scoring inputs from the ledger, the journeys and the campaign
    /// snapshots.
    fn gather_health_inputs(
        &self,
        organization_id: OrganizationId,
        now: DateTime<Utc>,
    ) -> Result<HealthInputs, EngineError> {
        let recent_range = DateRange::new(now - Duration::days(30), now)?;
        let prior_range = DateRange::new(now - Duration::days(60), now - Duration::days(30))?;

        let recent = self.ledger.for_organization(organization_id, &recent_range)?;
        let prior = self.ledger.for_organization(organization_id, &prior_range)?;

        let page_views = count_kind(&recent, TouchpointKind::PageView);
        let engaged = recent.iter().filter(|e| e.kind.is_engagement()).count() as u32;
        let signups = count_kind(&recent, TouchpointKind::Signup);

        let recent_revenue: f64 = recent.iter().filter_map(|e| e.conversion_value()).sum();
        let prior_revenue: f64 = prior.iter().filter_map(|e| e.conversion_value()).sum();
        let revenue_growth_pct = if prior_revenue > 0.0 {
            (recent_revenue - prior_revenue) / prior_revenue * 100.0
        } else {
            0.0
        };

        let campaigns = self.campaigns.active_campaigns(organization_id)?;
        let total_spend: f64 = campaigns.iter().map(|c| c.snapshot.spend).sum();
        let total_revenue: f64 = campaigns.iter().map(|c| c.snapshot.revenue).sum();
        let total_clicks: u64 = campaigns.iter().map(|c| c.snapshot.clicks).sum();
        let total_impressions: u64 = campaigns.iter().map(|c| c.snapshot.impressions).sum();

        let journeys = self.journeys.list(organization_id)?;
        let converted: Vec<&CustomerJourney> =
            journeys.iter().filter(|j| j.has_converted).collect();
        let attributed = converted
            .iter()
            .filter(|j| j.attribution.is_some())
            .count();

        Ok(HealthInputs {
            page_views_30d: page_views,
            engaged_share: share(engaged as f64, page_views as f64),
            roas: share(total_revenue, total_spend),
            ctr: share(total_clicks as f64, total_impressions as f64) * 100.0,
            revenue_growth_pct,
            signups_30d: signups,
            attributed_share: share(attributed as f64, converted.len() as f64),
            avg_touches_per_conversion: share(
                converted.iter().map(|j| j.touchpoint_count as f64).sum(),
                converted.len() as f64,
            ),
        })
    }
}

fn day_start(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::MIN).and_utc()
}

fn count_kind(events: &[TouchpointEvent], kind: TouchpointKind) -> u32 {
    events.iter().filter(|e| e.kind == kind).count() as u32
}

fn share(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}
