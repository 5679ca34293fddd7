use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use adhelm_analytics::{HealthHistory, HealthScoreRecord, RevenueHistory};
use adhelm_core::{OrganizationId, ProductId, StoreError};

/// In-memory health record history (append + most-recent-before).
#[derive(Debug, Default)]
pub struct InMemoryHealthHistory {
    records: RwLock<Vec<HealthScoreRecord>>,
}

impl InMemoryHealthHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_organization(&self, organization_id: OrganizationId) -> Vec<HealthScoreRecord> {
        self.records
            .read()
            .map(|records| {
                records
                    .iter()
                    .filter(|r| r.organization_id == organization_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl HealthHistory for InMemoryHealthHistory {
    fn append(&self, record: HealthScoreRecord) -> Result<(), StoreError> {
        self.records
            .write()
            .map_err(|_| StoreError::unavailable("health history lock poisoned"))?
            .push(record);
        Ok(())
    }

    fn most_recent_before(
        &self,
        organization_id: OrganizationId,
        cutoff: DateTime<Utc>,
    ) -> Result<Option<HealthScoreRecord>, StoreError> {
        let records = self
            .records
            .read()
            .map_err(|_| StoreError::unavailable("health history lock poisoned"))?;

        Ok(records
            .iter()
            .filter(|r| r.organization_id == organization_id && r.recorded_at < cutoff)
            .max_by_key(|r| r.recorded_at)
            .cloned())
    }
}

/// In-memory monthly revenue history per product (forecasting input).
#[derive(Debug, Default)]
pub struct InMemoryRevenueHistory {
    monthly: RwLock<HashMap<ProductId, Vec<f64>>>,
}

impl InMemoryRevenueHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace a product's history (oldest-first).
    pub fn set_monthly(&self, product_id: ProductId, revenue: Vec<f64>) {
        if let Ok(mut monthly) = self.monthly.write() {
            monthly.insert(product_id, revenue);
        }
    }

    /// Append one month's total.
    pub fn push_month(&self, product_id: ProductId, revenue: f64) {
        if let Ok(mut monthly) = self.monthly.write() {
            monthly.entry(product_id).or_default().push(revenue);
        }
    }
}

impl RevenueHistory for InMemoryRevenueHistory {
    fn monthly_revenue(&self, product_id: ProductId) -> Result<Vec<f64>, StoreError> {
        let monthly = self
            .monthly
            .read()
            .map_err(|_| StoreError::unavailable("revenue history lock poisoned"))?;
        Ok(monthly.get(&product_id).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adhelm_analytics::{HealthBreakdown, HealthGrade};
    use chrono::Duration;
    use uuid::Uuid;

    fn record(org: OrganizationId, overall: f64, at: DateTime<Utc>) -> HealthScoreRecord {
        HealthScoreRecord {
            record_id: Uuid::now_v7(),
            organization_id: org,
            overall,
            breakdown: HealthBreakdown::default(),
            grade: HealthGrade::from_score(overall),
            recorded_at: at,
        }
    }

    #[test]
    fn most_recent_before_picks_the_latest_prior_record() {
        let history = InMemoryHealthHistory::new();
        let org = OrganizationId::new();
        let now = Utc::now();

        history.append(record(org, 40.0, now - Duration::days(21))).unwrap();
        history.append(record(org, 60.0, now - Duration::days(10))).unwrap();
        history.append(record(org, 80.0, now - Duration::days(1))).unwrap();

        let prior = history
            .most_recent_before(org, now - Duration::days(7))
            .unwrap()
            .unwrap();
        assert_eq!(prior.overall, 60.0);

        assert!(history
            .most_recent_before(org, now - Duration::days(30))
            .unwrap()
            .is_none());
    }
}
