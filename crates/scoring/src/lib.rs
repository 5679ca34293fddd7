//! `adhelm-scoring` — campaign performance snapshots and the deterministic
//! budget classifier.
//!
//! [`classify`] is the rule-based fallback the budget controller uses
//! whenever the reasoning oracle is unavailable or returns unusable output.
//! It is a pure total function of ROI, independently testable.

pub mod classify;
pub mod metrics;

pub use classify::{classify, project_budget, BudgetAction, Classification};
pub use metrics::CampaignPerformanceSnapshot;
