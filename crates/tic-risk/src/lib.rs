//! The Threat Intelligence Core's composition root: wires the stores and
//! analyzers into `TicCore`, the single object that implements the public
//! library boundary. Stores are constructor-injected — nothing here
//! reaches for a process-wide singleton — and `TicCore` owns their
//! init/shutdown lifecycle on behalf of whatever embeds it.

pub mod aggregator;
pub mod error;

use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use std::sync::Arc;

use tic_analyzers::{
    analyze_file_signal as analyze_file_output, analyze_phone_signal, analyze_text_signal,
    analyze_url_signal, analyze_video_signal, AnalyzerDeps,
};
use tic_common::{
    ActionKind, CancelToken, ExtractedIocs, FileScanSignal, RiskResult, TicConfig, ThreatReport,
};
use tic_feeds::{OpenPhishAdapter, PhishTankAdapter, RefreshStats, UrlThreatCache, UrlhausAdapter};
use tic_ioc::extract;
use tic_patterns::{AdaptiveLearningEngine, PatternRegistry};
use tic_reputation::{CommunityReportStore, DomainReputationStore, PhoneReputationStore};

pub use error::TicError;

const PHISHTANK_FEED_URL: &str = "https://data.phishtank.com/data/online-valid.json";
const OPENPHISH_FEED_URL: &str = "https://openphish.com/feed.txt";
const URLHAUS_FEED_URL: &str = "https://urlhaus-api.abuse.ch/v1/payloads/recent/";

/// Bound on how many past detections are kept around so `record_feedback`
/// can find the pattern ids and original content it needs. An
/// implementation detail of wiring the public feedback call to the
/// per-pattern update it drives, not part of any uniform output contract.
const MAX_DETECTION_LOG_ENTRIES: usize = 50_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportChoice {
    Scam,
    Safe,
}

struct DetectionRecord {
    content: Option<String>,
    matched_pattern_ids: Vec<String>,
}

pub struct TicCore {
    cfg: TicConfig,
    patterns: Arc<PatternRegistry>,
    engine: Arc<AdaptiveLearningEngine>,
    url_cache: Arc<UrlThreatCache>,
    phone_reputation: Arc<PhoneReputationStore>,
    domain_reputation: Arc<DomainReputationStore>,
    community: Arc<CommunityReportStore>,
    deps: AnalyzerDeps,
    detections: DashMap<String, DetectionRecord>,
}

impl TicCore {
    /// Load every store from disk and bring the core up. `cache_dir` backs
    /// the URL cache, the pattern-weight snapshot, and the community-report
    /// file; `pool` backs the two SQL-counter reputation stores.
    pub async fn init(
        cfg: TicConfig,
        cache_dir: PathBuf,
        pool: sqlx::SqlitePool,
    ) -> Result<Self, TicError> {
        let patterns = Arc::new(PatternRegistry::new(cache_dir.join("patterns.json")));
        patterns.load_from_disk()?;

        let url_cache = Arc::new(UrlThreatCache::new(cache_dir.clone()));
        url_cache.load_from_cache().await?;

        let phone_reputation = Arc::new(PhoneReputationStore::new(pool.clone()).await?);
        let domain_reputation = Arc::new(DomainReputationStore::new(pool).await?);

        let community = Arc::new(CommunityReportStore::new(cache_dir.join("community_reports.txt")));
        community.load_from_disk()?;

        let deps = AnalyzerDeps {
            patterns: patterns.clone(),
            url_cache: url_cache.clone(),
            domain_reputation: domain_reputation.clone(),
            phone_reputation: phone_reputation.clone(),
            community: community.clone(),
            http_client: reqwest::Client::builder()
                .redirect(reqwest::redirect::Policy::none())
                .build()
                .map_err(|e| TicError::Store(tic_common::StoreError::Io(e.to_string())))?,
        };

        Ok(Self {
            cfg,
            engine: Arc::new(AdaptiveLearningEngine::new(patterns.clone())),
            patterns,
            url_cache,
            phone_reputation,
            domain_reputation,
            community,
            deps,
            detections: DashMap::new(),
        })
    }

    /// Flush whatever stores don't persist synchronously on every write.
    /// The community store and reputation stores already persist on each
    /// mutation; only the pattern-weight snapshot needs an explicit flush.
    pub fn shutdown(&self) -> Result<(), TicError> {
        self.patterns.persist()?;
        Ok(())
    }

    pub async fn analyze_text(&self, text: &str, source: &str, sender: Option<&str>) -> RiskResult {
        log::info!("analyzing text from source={source}");
        let cancel = CancelToken::new();
        let output = analyze_text_signal(text, sender, &self.deps, &self.cfg, &cancel).await;
        let iocs = extract(text, self.cfg.ioc_text_cap);
        self.remember_detection(&hash_of(text), &output.matched_pattern_ids, Some(text));
        aggregator::aggregate(output, iocs, &self.patterns)
    }

    pub async fn analyze_url(&self, url: &str) -> RiskResult {
        let cancel = CancelToken::new();
        let output = analyze_url_signal(url, &self.deps, &self.cfg, &cancel).await;
        let mut iocs = ExtractedIocs::default();
        iocs.urls.push(url.to_string());
        self.remember_detection(&hash_of(url), &output.matched_pattern_ids, Some(url));
        aggregator::aggregate(output, iocs, &self.patterns)
    }

    pub async fn analyze_phone(&self, number: &str, incoming: bool) -> RiskResult {
        let output = analyze_phone_signal(number, incoming, &self.deps, &self.cfg).await;
        self.remember_detection(&hash_of(number), &output.matched_pattern_ids, Some(number));
        aggregator::aggregate(output, ExtractedIocs::default(), &self.patterns)
    }

    pub fn analyze_video_signals(&self, face_consistency: f32, temporal_anomalies: u32, lip_sync_error: f32) -> RiskResult {
        let output = analyze_video_signal(face_consistency, temporal_anomalies, lip_sync_error);
        aggregator::aggregate(output, ExtractedIocs::default(), &self.patterns)
    }

    pub fn analyze_file_signal(&self, signal: &FileScanSignal) -> RiskResult {
        let output = analyze_file_output(signal);
        let mut result = aggregator::aggregate(output, ExtractedIocs::default(), &self.patterns);
        if signal.infected {
            result.recommended_actions.insert(ActionKind::Quarantine);
        }
        result
    }

    /// Forward a feedback event to the adaptive-learning engine, looking
    /// up the matched pattern ids (and, for the discovery path, the
    /// original content) recorded when `content_hash` was last analyzed.
    /// An unknown hash still applies cleanly — it simply updates nothing.
    pub fn record_feedback(&self, content_hash: &str, detected: bool, confirmed: bool) {
        let (content, matched_pattern_ids) = match self.detections.get(content_hash) {
            Some(record) => (record.content.clone(), record.matched_pattern_ids.clone()),
            None => (None, Vec::new()),
        };
        self.engine.record_feedback(
            content_hash,
            content.as_deref(),
            &matched_pattern_ids,
            detected,
            confirmed,
            &self.cfg,
        );
    }

    fn remember_detection(&self, content_hash: &str, matched_pattern_ids: &[String], content: Option<&str>) {
        if self.detections.len() >= MAX_DETECTION_LOG_ENTRIES {
            if let Some(stale) = self.detections.iter().next().map(|e| e.key().clone()) {
                self.detections.remove(&stale);
            }
        }
        self.detections.insert(
            content_hash.to_string(),
            DetectionRecord {
                content: content.map(str::to_string),
                matched_pattern_ids: matched_pattern_ids.to_vec(),
            },
        );
    }

    /// Run all three feed adapters and atomically swap the cache. A
    /// missing `auth_key` disables the URLhaus-like adapter (not an error).
    pub async fn refresh_url_cache(&self, auth_key: Option<String>) -> RefreshStats {
        let cancel = CancelToken::new();
        let phishing_adapters: Vec<Box<dyn tic_feeds::FeedAdapter>> = vec![
            Box::new(PhishTankAdapter { url: PHISHTANK_FEED_URL.to_string() }),
            Box::new(OpenPhishAdapter { url: OPENPHISH_FEED_URL.to_string() }),
        ];
        let malware_adapters: Vec<Box<dyn tic_feeds::FeedAdapter>> = vec![Box::new(UrlhausAdapter {
            url: URLHAUS_FEED_URL.to_string(),
            auth_key,
        })];
        self.url_cache
            .refresh(&self.deps.http_client, &self.cfg, &phishing_adapters, &malware_adapters, &cancel)
            .await
    }

    pub fn needs_url_cache_refresh(&self) -> bool {
        self.url_cache.needs_refresh(&self.cfg)
    }

    pub async fn report_phone(&self, id: &str, choice: ReportChoice) -> Result<(), TicError> {
        match choice {
            ReportChoice::Scam => self.phone_reputation.report_as_scam(id).await?,
            ReportChoice::Safe => self.phone_reputation.report_as_safe(id).await?,
        }
        Ok(())
    }

    pub async fn block_phone(&self, id: &str) -> Result<(), TicError> {
        Ok(self.phone_reputation.block(id).await?)
    }

    pub async fn unblock_phone(&self, id: &str) -> Result<(), TicError> {
        Ok(self.phone_reputation.unblock(id).await?)
    }

    pub async fn report_domain(
        &self,
        id: &str,
        choice: ReportChoice,
        category: Option<&str>,
    ) -> Result<(), TicError> {
        match choice {
            ReportChoice::Scam => self.domain_reputation.report_as_scam(id).await?,
            ReportChoice::Safe => self.domain_reputation.report_as_safe(id, category).await?,
        }
        Ok(())
    }

    pub async fn block_domain(&self, id: &str) -> Result<(), TicError> {
        Ok(self.domain_reputation.block(id).await?)
    }

    pub async fn unblock_domain(&self, id: &str) -> Result<(), TicError> {
        Ok(self.domain_reputation.unblock(id).await?)
    }

    pub fn check_phone(&self, id: &str) -> Option<ThreatReport> {
        self.community.check_phone(id)
    }

    pub fn check_domain(&self, id: &str) -> Option<ThreatReport> {
        self.community.check_domain(id)
    }

    pub fn check_message_template(&self, text: &str) -> Option<ThreatReport> {
        self.community.check_message_template(text)
    }

    /// Submit a community report directly (distinct from `report_phone` /
    /// `report_domain`, which mutate the trust-counter reputation store —
    /// this records a hashed entry in the community store instead).
    pub fn submit_community_report(
        &self,
        kind: tic_common::ReportKind,
        normalized_identifier: &str,
        severity: u8,
        region: Option<String>,
    ) -> Result<(), TicError> {
        Ok(self.community.record_report(kind, normalized_identifier, severity, region)?)
    }
}

fn hash_of(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_core() -> TicCore {
        // A single connection: an in-memory SQLite database is private to
        // the connection that opened it, so a pool of more than one would
        // silently hand concurrent callers distinct, empty databases.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let dir = std::env::temp_dir().join(format!(
            "tic-risk-test-{}-{}",
            std::process::id(),
            nanos()
        ));
        TicCore::init(TicConfig::default(), dir, pool).await.unwrap()
    }

    fn nanos() -> u128 {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos()
    }

    #[tokio::test]
    async fn plain_scam_sms_is_critical() {
        let core = test_core().await;
        let result = core
            .analyze_text(
                "URGENT: Your bank account is suspended. Share your OTP now or send payment via gift card to restore access: https://paypal-verify.tk/login",
                "sms",
                Some("+999"),
            )
            .await;
        assert_eq!(result.severity, tic_common::Severity::Critical);
        assert!(result.score >= 75);
        assert_eq!(result.iocs.urls.len(), 1);
        assert!(result.recommended_actions.contains(&ActionKind::BlockSender));
        assert!(result.recommended_actions.contains(&ActionKind::Report));

        let kinds: std::collections::HashSet<_> = result.reasons.iter().map(|r| r.kind).collect();
        assert!(kinds.contains(&tic_common::ReasonKind::Urgency));
        assert!(kinds.contains(&tic_common::ReasonKind::Otp));
        assert!(kinds.contains(&tic_common::ReasonKind::Impersonation));
        assert!(kinds.contains(&tic_common::ReasonKind::Payment));
        assert!(kinds.contains(&tic_common::ReasonKind::Url));
    }

    #[tokio::test]
    async fn clean_message_is_low_with_no_reasons() {
        let core = test_core().await;
        let result = core.analyze_text("Hey, want to grab coffee tomorrow?", "sms", None).await;
        assert_eq!(result.severity, tic_common::Severity::Low);
        assert!(result.score < 25);
        assert!(result.reasons.is_empty());
        assert_eq!(result.recommended_actions, std::collections::BTreeSet::from([ActionKind::Ignore]));
    }

    #[tokio::test]
    async fn protected_domain_report_is_a_silent_noop() {
        let core = test_core().await;
        core.report_domain("raw.githubusercontent.com", ReportChoice::Scam, None).await.unwrap();
        assert!(core.check_domain("raw.githubusercontent.com").is_none());
    }

    #[tokio::test]
    async fn known_phishing_url_is_flagged_from_a_preloaded_cache() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let dir = std::env::temp_dir().join(format!("tic-risk-feed-test-{}-{}", std::process::id(), nanos()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("url_threat_cache.txt"),
            "# Phishing URLs\nevil.example.com/login\n# Malware URLs\n",
        )
        .unwrap();

        let core = TicCore::init(TicConfig::default(), dir.clone(), pool).await.unwrap();
        let result = core.analyze_url("https://evil.example.com/login/?x=1").await;
        assert!(result.reasons.iter().any(|r| r.kind == tic_common::ReasonKind::Feed));
        assert!(result.severity >= tic_common::Severity::High);

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn concurrent_phone_scam_reports_never_lose_an_update() {
        let core = Arc::new(test_core().await);
        let mut handles = Vec::new();
        for _ in 0..100 {
            let core = core.clone();
            handles.push(tokio::spawn(async move {
                core.report_phone("+15551234", ReportChoice::Scam).await.unwrap();
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        let rep = core.phone_reputation.get("+15551234").await.unwrap().unwrap();
        assert_eq!(rep.scam_reports, 100);
        assert_eq!(rep.safe_reports, 0);
        assert_eq!(rep.report_count(), 100);
    }

    #[tokio::test]
    async fn record_feedback_is_idempotent_per_content_hash() {
        let core = test_core().await;
        let result = core.analyze_text("act now, this is urgent", "sms", None).await;
        assert!(!result.reasons.is_empty());
        let hash = hash_of("act now, this is urgent");
        let before = core.patterns.get("txt-urgency-act-now").unwrap().weight;
        core.record_feedback(&hash, true, true);
        let once = core.patterns.get("txt-urgency-act-now").unwrap().weight;
        core.record_feedback(&hash, true, true);
        let twice = core.patterns.get("txt-urgency-act-now").unwrap().weight;
        assert!(once > before);
        assert_eq!(once, twice);
    }

    #[tokio::test]
    async fn infected_file_signal_recommends_quarantine() {
        let core = test_core().await;
        let signal = FileScanSignal {
            infected: true,
            threat_name: Some("Trojan.Generic".to_string()),
            indicators: vec![],
        };
        let result = core.analyze_file_signal(&signal);
        assert_eq!(result.score, tic_analyzers::file::INFECTED_SCORE);
        assert!(result.recommended_actions.contains(&ActionKind::Quarantine));
    }

    #[tokio::test]
    async fn video_signal_with_low_consistency_recommends_verify_out_of_band() {
        let core = test_core().await;
        let result = core.analyze_video_signals(0.1, 4, 0.9);
        assert!(result.reasons.iter().any(|r| r.kind == tic_common::ReasonKind::Deepfake));
        assert!(result.recommended_actions.contains(&ActionKind::VerifyOutOfBand));
    }
}
