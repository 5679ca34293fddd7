use std::sync::Arc;

use serde::{Deserialize, Serialize};

use adhelm_core::{ProductId, StoreError};

/// Monthly revenue history per product (forecasting input).
pub trait RevenueHistory: Send + Sync {
    /// Oldest-first monthly revenue totals.
    fn monthly_revenue(&self, product_id: ProductId) -> Result<Vec<f64>, StoreError>;
}

impl<S> RevenueHistory for Arc<S>
where
    S: RevenueHistory + ?Sized,
{
    fn monthly_revenue(&self, product_id: ProductId) -> Result<Vec<f64>, StoreError> {
        (**self).monthly_revenue(product_id)
    }
}

/// What the forecast was computed from.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastBasis {
    History,
    /// No history was available; the fixed low-confidence placeholder.
    Placeholder,
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    /// 1-based month offset from now.
    pub month: u32,
    pub projected: f64,
    /// In [0.5, 0.9], non-increasing across months.
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub product_id: ProductId,
    pub months: Vec<ForecastPoint>,
    pub growth_rate: f64,
    /// Scenario band around the first projected month.
    pub conservative: f64,
    pub expected: f64,
    pub optimistic: f64,
    pub basis: ForecastBasis,
}

/// Naive trend extrapolation with decaying confidence.
///
/// Not a regression: recent-vs-average growth applied iteratively. The
/// stable contract is the band ordering (conservative < expected <
/// optimistic) and the confidence decay; the projection itself may be
/// replaced by a real model later.
#[derive(Debug, Default, Clone, Copy)]
pub struct ForecastEngine;

const PLACEHOLDER_CONSERVATIVE: f64 = 800.0;
const PLACEHOLDER_EXPECTED: f64 = 1_000.0;
const PLACEHOLDER_OPTIMISTIC: f64 = 1_500.0;

const CONSERVATIVE_FACTOR: f64 = 0.7;
const OPTIMISTIC_FACTOR: f64 = 1.4;

const CONFIDENCE_START: f64 = 0.9;
const CONFIDENCE_DECAY: f64 = 0.1;
const CONFIDENCE_FLOOR: f64 = 0.5;

impl ForecastEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn forecast_revenue(
        &self,
        product_id: ProductId,
        history: &[f64],
        horizon_months: u32,
    ) -> ForecastResult {
        if history.is_empty() {
            return Self::placeholder(product_id, horizon_months);
        }

        let avg = mean(history);
        let recent = if history.len() >= 3 {
            mean(&history[history.len() - 3..])
        } else {
            avg
        };
        let growth_rate = if avg == 0.0 { 0.0 } else { recent / avg - 1.0 };

        let mut months = Vec::with_capacity(horizon_months as usize);
        let mut projected = recent;
        for step in 0..horizon_months {
            projected *= 1.0 + growth_rate;
            months.push(ForecastPoint {
                month: step + 1,
                projected,
                confidence: confidence_at(step),
            });
        }

        let expected = months.first().map(|p| p.projected).unwrap_or(recent);

        ForecastResult {
            product_id,
            months,
            growth_rate,
            conservative: expected * CONSERVATIVE_FACTOR,
            expected,
            optimistic: expected * OPTIMISTIC_FACTOR,
            basis: ForecastBasis::History,
        }
    }

    fn placeholder(product_id: ProductId, horizon_months: u32) -> ForecastResult {
        let months = (0..horizon_months)
            .map(|step| ForecastPoint {
                month: step + 1,
                projected: PLACEHOLDER_EXPECTED,
                confidence: CONFIDENCE_FLOOR,
            })
            .collect();

        ForecastResult {
            product_id,
            months,
            growth_rate: 0.0,
            conservative: PLACEHOLDER_CONSERVATIVE,
            expected: PLACEHOLDER_EXPECTED,
            optimistic: PLACEHOLDER_OPTIMISTIC,
            basis: ForecastBasis::Placeholder,
        }
    }
}

fn confidence_at(step: u32) -> f64 {
    (CONFIDENCE_START - CONFIDENCE_DECAY * step as f64).max(CONFIDENCE_FLOOR)
}

fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    xs.iter().sum::<f64>() / (xs.len() as f64)
}
