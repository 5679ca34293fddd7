//! Infrastructure layer: stores, notification sinks, composition, runners,
//! external clients.

pub mod engine;
pub mod external;
pub mod notify;
pub mod runner;
pub mod stores;


pub use engine::{Collaborators, DecisionEngine, EngineError};
pub use notify::{InMemoryNotificationSink, NotificationSink, TracingNotificationSink};
pub use runner::{AnalysisCycleRunner, AnalysisCycleRunnerHandle};
pub use stores::{
    InMemoryAuditTrail, InMemoryCampaignDirectory, InMemoryDecisionLog, InMemoryHealthHistory,
    InMemoryJourneyStore, InMemoryOrgStore, InMemoryRevenueHistory, InMemoryTouchpointLedger,
};
