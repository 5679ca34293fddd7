//! In-memory implementations of the persistence ports.
//!
//! Intended for tests/dev and single-process deployments. Every store is
//! organization-isolated; row writes are serialized by holding one write
//! lock across each read-modify-write.

pub mod audit;
pub mod campaigns;
pub mod decisions;
pub mod histories;
pub mod journeys;
pub mod ledger;
pub mod org_store;

pub use audit::InMemoryAuditTrail;
pub use campaigns::InMemoryCampaignDirectory;
pub use decisions::InMemoryDecisionLog;
pub use histories::{InMemoryHealthHistory, InMemoryRevenueHistory};
pub use journeys::InMemoryJourneyStore;
pub use ledger::InMemoryTouchpointLedger;
pub use org_store::InMemoryOrgStore;
