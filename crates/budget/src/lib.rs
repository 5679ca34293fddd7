//! `adhelm-budget` — budget decisions and the per-cycle controller.
//!
//! [`BudgetController::run_cycle`] is the LOAD → DECIDE → LOG → EXECUTE
//! state machine: it asks the reasoning oracle for a decision set, validates
//! every returned entry individually, replaces unusable entries with the
//! deterministic classifier (partial fallback), audits the batch, and,
//! only when `auto_execute` is set, applies the decisions.

pub mod controller;
pub mod decision;

pub use controller::{
    AuditTrail, BudgetController, BudgetError, CampaignDirectory, CampaignState, CampaignStatus,
    CycleOutcome, DecisionLog,
};
pub use decision::{BudgetDecision, DecisionSource, ExecutionStatus};
