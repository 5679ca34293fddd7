use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use adhelm_core::CampaignId;

/// Derived per-campaign performance, overwritten each analysis cycle.
///
/// No point-in-time history is retained here; the audit trail is the
/// durable history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignPerformanceSnapshot {
    pub campaign_id: CampaignId,
    pub name: String,

    pub spend: f64,
    pub impressions: u64,
    pub clicks: u64,
    pub conversions: u64,
    pub revenue: f64,

    /// Click-through rate, percent.
    pub ctr: f64,
    /// Cost per click.
    pub cpc: f64,
    /// Cost per acquisition.
    pub cpa: f64,
    /// Revenue over spend, as a multiple.
    pub roas: f64,
    /// (revenue - spend) / spend, percent.
    pub roi: f64,

    pub captured_at: DateTime<Utc>,
}

impl CampaignPerformanceSnapshot {
    /// Build a snapshot from raw counters, deriving all ratios.
    ///
    /// Zero denominators yield 0.0 ratios rather than infinities.
    #[allow(clippy::too_many_arguments)]
    pub fn from_raw(
        campaign_id: CampaignId,
        name: impl Into<String>,
        spend: f64,
        impressions: u64,
        clicks: u64,
        conversions: u64,
        revenue: f64,
        captured_at: DateTime<Utc>,
    ) -> Self {
        let ctr = ratio(clicks as f64, impressions as f64) * 100.0;
        let cpc = ratio(spend, clicks as f64);
        let cpa = ratio(spend, conversions as f64);
        let roas = ratio(revenue, spend);
        let roi = ratio(revenue - spend, spend) * 100.0;

        Self {
            campaign_id,
            name: name.into(),
            spend,
            impressions,
            clicks,
            conversions,
            revenue,
            ctr,
            cpc,
            cpa,
            roas,
            roi,
            captured_at,
        }
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}
