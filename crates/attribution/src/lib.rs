//! `adhelm-attribution` — customer journeys and multi-touch attribution.
//!
//! [`AttributionEngine::ingest`] appends touchpoints to the ledger and keeps
//! one [`CustomerJourney`] per actor up to date. On an actor's first
//! conversion all three attribution models (first-touch, last-touch, linear)
//! are computed and stored together; they are never re-derived afterwards.
//! Later purchases only accumulate lifetime value.

pub mod engine;
pub mod journey;
pub mod models;

pub use engine::{
    AttributionEngine, AttributionError, CampaignAttribution, JourneyStore, TouchpointLedger,
};
pub use journey::{CustomerJourney, TouchSummary};
pub use models::{attribute, AttributionBreakdown};
