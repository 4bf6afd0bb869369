//! Explicit dependency bundle for the analyzers — constructor-injected by
//! the caller rather than reached for as a process-wide singleton.
//! Analyzers borrow this; they never construct a store themselves.

use std::sync::Arc;
use tic_feeds::UrlThreatCache;
use tic_patterns::PatternRegistry;
use tic_reputation::{CommunityReportStore, DomainReputationStore, PhoneReputationStore};

#[derive(Clone)]
pub struct AnalyzerDeps {
    pub patterns: Arc<PatternRegistry>,
    pub url_cache: Arc<UrlThreatCache>,
    pub domain_reputation: Arc<DomainReputationStore>,
    pub phone_reputation: Arc<PhoneReputationStore>,
    pub community: Arc<CommunityReportStore>,
    pub http_client: reqwest::Client,
}
