use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use adhelm_core::OrganizationId;
use adhelm_events::{TouchpointEvent, TouchpointKind};

/// Daily marketing metric under anomaly watch.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Revenue,
    Conversions,
    Clicks,
    PageViews,
}

impl core::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            MetricKind::Revenue => "revenue",
            MetricKind::Conversions => "conversions",
            MetricKind::Clicks => "clicks",
            MetricKind::PageViews => "page_views",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricPoint {
    pub day: NaiveDate,
    pub value: f64,
}

/// One organization's daily series for a single metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSeries {
    pub organization_id: OrganizationId,
    pub metric: MetricKind,
    pub points: Vec<MetricPoint>,
}

impl MetricSeries {
    /// Build a daily series from raw touchpoints over `[from, to]`.
    ///
    /// Days with no matching events are materialized at 0.0, so a silent day
    /// reads as a drop rather than a gap.
    pub fn daily_from_touchpoints(
        organization_id: OrganizationId,
        metric: MetricKind,
        events: &[TouchpointEvent],
        from: NaiveDate,
        to: NaiveDate,
    ) -> Self {
        let mut points = Vec::new();
        let mut day = from;
        while day <= to {
            let value = events
                .iter()
                .filter(|e| e.occurred_at.date_naive() == day)
                .map(|e| match metric {
                    MetricKind::Revenue => e.conversion_value().unwrap_or(0.0),
                    MetricKind::Conversions => {
                        if e.conversion_value().is_some() {
                            1.0
                        } else {
                            0.0
                        }
                    }
                    MetricKind::Clicks => {
                        if e.kind == TouchpointKind::AdClick {
                            1.0
                        } else {
                            0.0
                        }
                    }
                    MetricKind::PageViews => {
                        if e.kind == TouchpointKind::PageView {
                            1.0
                        } else {
                            0.0
                        }
                    }
                })
                .sum();
            points.push(MetricPoint { day, value });
            day = day + Duration::days(1);
        }

        Self {
            organization_id,
            metric,
            points,
        }
    }

    fn value_on(&self, day: NaiveDate) -> Option<f64> {
        self.points.iter().find(|p| p.day == day).map(|p| p.value)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum AnomalySeverity {
    Low,
    Medium,
    High,
}

/// A metric deviation beyond the configured threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    pub organization_id: OrganizationId,
    pub metric: MetricKind,
    pub day: NaiveDate,
    pub baseline: f64,
    pub observed: f64,
    /// Percent, signed.
    pub deviation_pct: f64,
    pub severity: AnomalySeverity,
    pub explanation: String,
}

/// Rolling-baseline deviation detector.
///
/// Model:
/// - baseline = mean of the previous `window_days` strictly before `today`;
/// - deviation = (today - baseline) / baseline, in percent;
/// - anomalous when |deviation| exceeds `deviation_threshold`.
///
/// Single metric, single window; no seasonality or cross-metric correlation.
#[derive(Debug, Clone)]
pub struct AnomalyDetector {
    window_days: i64,
    /// Percent beyond which a deviation is anomalous.
    deviation_threshold: f64,
    medium_threshold: f64,
    high_threshold: f64,
}

impl Default for AnomalyDetector {
    fn default() -> Self {
        Self {
            window_days: 7,
            deviation_threshold: 30.0,
            medium_threshold: 50.0,
            high_threshold: 70.0,
        }
    }
}

impl AnomalyDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_window_days(mut self, window_days: i64) -> Self {
        self.window_days = window_days;
        self
    }

    pub fn with_deviation_threshold(mut self, threshold: f64) -> Self {
        self.deviation_threshold = threshold;
        self
    }

    /// Baseline window length, in days (callers size their ledger query by it).
    pub fn window_days(&self) -> i64 {
        self.window_days
    }

    /// Evaluate one series for `today`.
    ///
    /// Skipped (returns `None`) when today has no observation or the
    /// baseline is zero.
    pub fn detect(&self, series: &MetricSeries, today: NaiveDate) -> Option<Anomaly> {
        let observed = series.value_on(today)?;

        let window_start = today - Duration::days(self.window_days);
        let baseline_values: Vec<f64> = series
            .points
            .iter()
            .filter(|p| p.day >= window_start && p.day < today)
            .map(|p| p.value)
            .collect();

        if baseline_values.is_empty() {
            return None;
        }

        let baseline = mean(&baseline_values);
        if baseline == 0.0 {
            return None;
        }

        let deviation_pct = (observed - baseline) / baseline * 100.0;
        if deviation_pct.abs() <= self.deviation_threshold {
            return None;
        }

        let severity = if deviation_pct.abs() > self.high_threshold {
            AnomalySeverity::High
        } else if deviation_pct.abs() > self.medium_threshold {
            AnomalySeverity::Medium
        } else {
            AnomalySeverity::Low
        };

        let explanation = format!(
            "{} moved {deviation_pct:+.1}% against its {}-day baseline (baseline {baseline:.2}, observed {observed:.2})",
            series.metric, self.window_days
        );

        Some(Anomaly {
            organization_id: series.organization_id,
            metric: series.metric,
            day: today,
            baseline,
            observed,
            deviation_pct,
            severity,
            explanation,
        })
    }

    /// Evaluate every series for `today`, collecting the anomalies.
    pub fn detect_all(&self, series: &[MetricSeries], today: NaiveDate) -> Vec<Anomaly> {
        series.iter().filter_map(|s| self.detect(s, today)).collect()
    }
}

fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    xs.iter().sum::<f64>() / (xs.len() as f64)
}
