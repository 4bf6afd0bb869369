//! Adaptive-Learning Engine: updates pattern weights from user
//! feedback and routes unmatched-but-confirmed content to pattern
//! discovery. Every update is idempotent on `(pattern_id, content_hash)` —
//! a replayed feedback event (the surrounding app retries after a crash,
//! say) never double-counts.

use dashmap::DashSet;
use std::sync::Arc;
use tic_common::{now_ms, PatternKind, TicConfig};

use crate::discovery::{discover_patterns, DiscoverySample};
use crate::registry::PatternRegistry;

pub struct AdaptiveLearningEngine {
    registry: Arc<PatternRegistry>,
    applied: DashSet<String>,
    discovery_buffer: dashmap::DashMap<String, Vec<DiscoverySample>>,
}

impl AdaptiveLearningEngine {
    /// Share the registry with whatever else (the analyzers) needs to
    /// read its snapshot — the engine is just the mutation path onto the
    /// same store, not a separate copy of it.
    pub fn new(registry: Arc<PatternRegistry>) -> Self {
        Self {
            registry,
            applied: DashSet::new(),
            discovery_buffer: dashmap::DashMap::new(),
        }
    }

    pub fn registry(&self) -> &Arc<PatternRegistry> {
        &self.registry
    }

    /// Ingest one feedback event: `matched_pattern_ids` is every pattern
    /// that contributed to the original detection, `content` is the raw
    /// input (needed only for the `¬detected ∧ confirmed` discovery path).
    /// `content_hash` is the stable key used for idempotence and as the
    /// pattern-discovery dedup key.
    pub fn record_feedback(
        &self,
        content_hash: &str,
        content: Option<&str>,
        matched_pattern_ids: &[String],
        detected: bool,
        confirmed: bool,
        cfg: &TicConfig,
    ) {
        if !detected && confirmed {
            if let Some(text) = content {
                self.ingest_for_discovery(content_hash, text, cfg);
            }
            return;
        }

        for pattern_id in matched_pattern_ids {
            let dedup_key = format!("{pattern_id}|{content_hash}");
            if !self.applied.insert(dedup_key) {
                continue;
            }
            self.apply_single_pattern_feedback(pattern_id, confirmed, cfg);
        }

        if let Err(e) = self.registry.persist() {
            log::warn!("failed to persist pattern registry after feedback: {e}");
        }
    }

    fn apply_single_pattern_feedback(&self, pattern_id: &str, confirmed: bool, cfg: &TicConfig) {
        let mut demoted = false;
        self.registry.update_pattern(pattern_id, |pattern| {
            if confirmed {
                pattern.tp_count += 1;
                pattern.weight = (pattern.weight + cfg.learning_rate)
                    .clamp(cfg.pattern_weight_min, cfg.pattern_weight_max);
            } else {
                pattern.fp_count += 1;
                pattern.weight = (pattern.weight - cfg.learning_rate)
                    .clamp(cfg.pattern_weight_min, cfg.pattern_weight_max);

                let total = pattern.tp_count + pattern.fp_count;
                if pattern.fp_rate() > 0.6 && total > 20 {
                    pattern.weight = (pattern.weight * 0.5).max(cfg.pattern_weight_min);
                    demoted = true;
                }
            }
            pattern.last_updated_ms = now_ms();
        });
        if demoted {
            log::warn!("demoting pattern {pattern_id} after high false-positive rate");
        }
    }

    /// Route a confirmed-threat sample that no existing pattern caught
    /// into the discovery buffer, keyed by threat-type-agnostic bucket
    /// `"text"`. Runs discovery once enough samples have accumulated and
    /// promotes whatever clears the occurrence/similarity thresholds.
    fn ingest_for_discovery(&self, content_hash: &str, text: &str, cfg: &TicConfig) {
        let mut bucket = self.discovery_buffer.entry("text".to_string()).or_default();
        if bucket.iter().any(|s| s.content_hash == content_hash) {
            return;
        }
        bucket.push(DiscoverySample {
            content_hash: content_hash.to_string(),
            text: text.to_string(),
        });
        let samples = bucket.clone();
        drop(bucket);

        if samples.len() < cfg.discovery_min_occurrences as usize {
            return;
        }

        for candidate in discover_patterns(&samples, cfg) {
            self.registry.promote_learned(
                candidate.signature,
                candidate.threat_type,
                PatternKind::Text,
                candidate.confidence,
                candidate.occurrences,
            );
        }
        if let Err(e) = self.registry.persist() {
            log::warn!("failed to persist pattern registry after discovery: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> Arc<PatternRegistry> {
        let dir = std::env::temp_dir().join(format!("tic-engine-test-{}-{}", std::process::id(), rand_suffix()));
        Arc::new(PatternRegistry::new(dir))
    }

    fn rand_suffix() -> u64 {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now().duration_since(UNIX_EPOCH).unwrap().subsec_nanos() as u64
    }

    #[test]
    fn confirmed_detection_raises_weight() {
        let engine = AdaptiveLearningEngine::new(registry());
        let cfg = TicConfig::default();
        let before = engine.registry().get("txt-urgency-urgent").unwrap().weight;
        engine.record_feedback(
            "hash-1",
            None,
            &["txt-urgency-urgent".to_string()],
            true,
            true,
            &cfg,
        );
        let after = engine.registry().get("txt-urgency-urgent").unwrap().weight;
        assert!(after > before);
    }

    #[test]
    fn unconfirmed_detection_lowers_weight() {
        let engine = AdaptiveLearningEngine::new(registry());
        let cfg = TicConfig::default();
        let before = engine.registry().get("txt-urgency-urgent").unwrap().weight;
        engine.record_feedback(
            "hash-2",
            None,
            &["txt-urgency-urgent".to_string()],
            true,
            false,
            &cfg,
        );
        let after = engine.registry().get("txt-urgency-urgent").unwrap().weight;
        assert!(after < before);
    }

    #[test]
    fn repeated_feedback_for_same_content_hash_is_idempotent() {
        let engine = AdaptiveLearningEngine::new(registry());
        let cfg = TicConfig::default();
        engine.record_feedback(
            "hash-3",
            None,
            &["txt-urgency-urgent".to_string()],
            true,
            true,
            &cfg,
        );
        let once = engine.registry().get("txt-urgency-urgent").unwrap().weight;
        engine.record_feedback(
            "hash-3",
            None,
            &["txt-urgency-urgent".to_string()],
            true,
            true,
            &cfg,
        );
        let twice = engine.registry().get("txt-urgency-urgent").unwrap().weight;
        assert_eq!(once, twice);
    }

    #[test]
    fn demotes_pattern_with_high_false_positive_rate() {
        let engine = AdaptiveLearningEngine::new(registry());
        let cfg = TicConfig::default();
        for i in 0..25 {
            engine.record_feedback(
                &format!("fp-{i}"),
                None,
                &["txt-urgency-urgent".to_string()],
                true,
                false,
                &cfg,
            );
        }
        let pattern = engine.registry().get("txt-urgency-urgent").unwrap();
        assert!(pattern.fp_rate() > 0.6);
        assert!(pattern.weight <= cfg.pattern_weight_min + 0.01);
    }
}
