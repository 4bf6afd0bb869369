//! Shared data model, configuration, error types, and cancellation primitive
//! for the Threat Intelligence Core. Every other crate in the workspace
//! depends on this one and nothing it depends on loops back.

pub mod cancel;
pub mod config;
pub mod error;
pub mod model;

pub use cancel::CancelToken;
pub use config::TicConfig;
pub use error::{FeedError, ResolveError, StoreError};
pub use model::{
    ActionKind, CommunityReport, DomainReputation, ExtractedIocs, FileScanSignal, Indicator,
    LearnedPattern, PatternKind, PatternWeight, PhoneReputation, Reason, ReasonKind, ReportKind,
    RiskResult, Severity, ThreatReport,
};

/// Current epoch milliseconds. Centralized so stores agree on one clock
/// source and so tests can reason about it without reaching into `chrono`
/// directly.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
