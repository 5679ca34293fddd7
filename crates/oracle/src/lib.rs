//! `adhelm-oracle`
//!
//! **Responsibility:** the reasoning-oracle boundary.
//!
//! This crate is intentionally **not** part of the domain model:
//! - It must not depend on journeys, snapshots or budget state.
//! - It must not mutate domain state.
//! - It emits **proposals**, not decisions: strict validation and the
//!   deterministic fallback live with the budget controller.
//!
//! Every failure mode here (transport, timeout, missing credentials,
//! unusable output) is soft: callers recover by falling back, never by
//! aborting a cycle.

pub mod adapter;
pub mod error;
pub mod parse;
pub mod prompt;
pub mod strategy;

pub use adapter::{BudgetSnapshot, CampaignBudgetLine, DecisionOracleAdapter, ReasoningOracle};
pub use error::OracleError;
pub use parse::{extract_first_json_object, parse_proposal, OracleDecision, OracleProposal};
pub use strategy::{ScriptedOracle, SimulatedOracle, UnconfiguredOracle};
