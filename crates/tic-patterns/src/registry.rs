//! Pattern Registry: the seeded table plus whatever learned patterns
//! have been promoted, held behind a `DashMap` so reads never block a
//! concurrent weight update. Persists as a JSON snapshot, unlike the
//! flat-file formats the URL cache and community store use.

use dashmap::DashMap;
use regex::Regex;
use std::path::PathBuf;
use tic_common::{now_ms, LearnedPattern, PatternKind, PatternWeight, StoreError, TicConfig};

use crate::seeds::seeded_patterns;

#[derive(Debug, serde::Serialize, serde::Deserialize, Default)]
struct PersistedState {
    patterns: Vec<PatternWeight>,
    learned: Vec<LearnedPattern>,
}

pub struct PatternRegistry {
    patterns: DashMap<String, PatternWeight>,
    learned: DashMap<String, LearnedPattern>,
    compiled: DashMap<String, Regex>,
    path: PathBuf,
}

impl PatternRegistry {
    /// Construct with the seeded table already loaded; `load_from_disk`
    /// then overlays any persisted weight adjustments and learned patterns.
    pub fn new(path: PathBuf) -> Self {
        let patterns = DashMap::new();
        for p in seeded_patterns() {
            patterns.insert(p.pattern_id.clone(), p);
        }
        Self {
            patterns,
            learned: DashMap::new(),
            compiled: DashMap::new(),
            path,
        }
    }

    /// Every pattern of `kind` whose regex matches `input`, returning
    /// pattern ids. A pattern whose source fails to compile is skipped and
    /// logged once rather than treated as an error — a bad learned-pattern
    /// signature should degrade, not break analysis.
    pub fn matching(&self, kind: PatternKind, input: &str) -> Vec<String> {
        let mut out = Vec::new();
        for entry in self.patterns.iter() {
            let pattern = entry.value();
            if pattern.kind != kind {
                continue;
            }
            if let Some(re) = self.compiled_regex(&pattern.pattern_id, &pattern.pattern) {
                if re.is_match(input) {
                    out.push(pattern.pattern_id.clone());
                }
            }
        }
        out
    }

    fn compiled_regex(&self, pattern_id: &str, source: &str) -> Option<Regex> {
        if let Some(re) = self.compiled.get(pattern_id) {
            return Some(re.clone());
        }
        match Regex::new(source) {
            Ok(re) => {
                self.compiled.insert(pattern_id.to_string(), re.clone());
                Some(re)
            }
            Err(e) => {
                log::warn!("pattern {pattern_id} failed to compile: {e}");
                None
            }
        }
    }

    pub fn load_from_disk(&self) -> Result<(), StoreError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        let state: PersistedState = serde_json::from_str(&contents)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;
        for p in state.patterns {
            self.patterns.insert(p.pattern_id.clone(), p);
        }
        for l in state.learned {
            self.learned.insert(l.signature.clone(), l);
        }
        Ok(())
    }

    pub fn persist(&self) -> Result<(), StoreError> {
        let state = PersistedState {
            patterns: self.patterns.iter().map(|e| e.value().clone()).collect(),
            learned: self.learned.iter().map(|e| e.value().clone()).collect(),
        };
        let body = serde_json::to_string_pretty(&state)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, body)?;
        Ok(())
    }

    pub fn get(&self, pattern_id: &str) -> Option<PatternWeight> {
        self.patterns.get(pattern_id).map(|e| e.value().clone())
    }

    /// Mutate a single pattern's row while holding that key's shard lock
    /// for the whole read-modify-write, so two concurrent feedback events
    /// on the same pattern never interleave. A no-op if the id is unknown.
    pub(crate) fn update_pattern(&self, pattern_id: &str, f: impl FnOnce(&mut PatternWeight)) {
        if let Some(mut entry) = self.patterns.get_mut(pattern_id) {
            f(entry.value_mut());
        }
    }

    /// Snapshot of every seeded and learned pattern, for analyzers to
    /// match text/URL/phone input against.
    pub fn snapshot(&self) -> Vec<PatternWeight> {
        self.patterns.iter().map(|e| e.value().clone()).collect()
    }

    pub fn learned_snapshot(&self) -> Vec<LearnedPattern> {
        self.learned.iter().map(|e| e.value().clone()).collect()
    }

    pub(crate) fn upsert(&self, pattern: PatternWeight) {
        self.patterns.insert(pattern.pattern_id.clone(), pattern);
    }

    pub(crate) fn upsert_learned(&self, pattern: LearnedPattern) {
        self.learned.insert(pattern.signature.clone(), pattern);
    }

    pub(crate) fn remove_learned(&self, signature: &str) {
        self.learned.remove(signature);
    }

    /// Pure function over the current weight table: `clamp(base * Π w_i,
    /// 0, 100)`. Unknown pattern ids contribute a neutral weight of 1.0
    /// rather than erroring, since a lookup miss here is never a reason
    /// to fabricate confidence or panic.
    pub fn adjust_score(&self, base_score: u8, matched_pattern_ids: &[String]) -> u8 {
        let mut product = 1.0f32;
        for id in matched_pattern_ids {
            let w = self.get(id).map(|p| p.weight).unwrap_or(1.0);
            product *= w;
        }
        let adjusted = base_score as f32 * product;
        adjusted.round().clamp(0.0, 100.0) as u8
    }

    /// Insert a promoted learned pattern as both a `LearnedPattern` record
    /// and a `PatternWeight` row at the discovery starting weight, so it
    /// can be matched and further adjusted by future feedback exactly like
    /// a seeded pattern.
    pub(crate) fn promote_learned(
        &self,
        signature: String,
        threat_type: String,
        kind: tic_common::PatternKind,
        confidence: f32,
        occurrences: u32,
    ) {
        let pattern_id = format!("learned-{signature}");
        self.upsert_learned(LearnedPattern {
            signature: signature.clone(),
            threat_type: threat_type.clone(),
            confidence,
            occurrences,
        });
        if self.patterns.contains_key(&pattern_id) {
            return;
        }
        self.upsert(PatternWeight {
            pattern_id,
            pattern: signature,
            kind,
            threat_type,
            weight: 0.5,
            tp_count: 0,
            fp_count: 0,
            last_updated_ms: now_ms(),
        });
    }

    /// Garbage-collect learned patterns whose confidence has decayed below
    /// `cfg.discovery_min_cosine` while their support is still below a
    /// floor of half `cfg.discovery_min_occurrences` — a thin, unproven
    /// pattern that never grew past its initial promotion.
    pub fn gc_learned(&self, cfg: &TicConfig) {
        let floor = (cfg.discovery_min_occurrences / 2).max(1);
        let stale: Vec<String> = self
            .learned
            .iter()
            .filter(|e| e.confidence < cfg.discovery_min_cosine && e.occurrences < floor)
            .map(|e| e.signature.clone())
            .collect();
        for sig in stale {
            self.patterns.remove(&format!("learned-{sig}"));
            self.remove_learned(&sig);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjust_score_applies_product_of_weights() {
        let dir = std::env::temp_dir().join(format!("tic-patterns-test-{}", std::process::id()));
        let registry = PatternRegistry::new(dir);
        registry.upsert(PatternWeight {
            pattern_id: "p1".into(),
            pattern: "x".into(),
            kind: tic_common::PatternKind::Text,
            threat_type: "urgency".into(),
            weight: 2.0,
            tp_count: 0,
            fp_count: 0,
            last_updated_ms: 0,
        });
        let score = registry.adjust_score(40, &["p1".to_string()]);
        assert_eq!(score, 80);
    }

    #[test]
    fn adjust_score_clamps_to_100() {
        let dir = std::env::temp_dir().join(format!("tic-patterns-test2-{}", std::process::id()));
        let registry = PatternRegistry::new(dir);
        registry.upsert(PatternWeight {
            pattern_id: "p1".into(),
            pattern: "x".into(),
            kind: tic_common::PatternKind::Text,
            threat_type: "urgency".into(),
            weight: 5.0,
            tp_count: 0,
            fp_count: 0,
            last_updated_ms: 0,
        });
        let score = registry.adjust_score(90, &["p1".to_string()]);
        assert_eq!(score, 100);
    }

    #[test]
    fn unknown_pattern_id_is_neutral() {
        let dir = std::env::temp_dir().join(format!("tic-patterns-test3-{}", std::process::id()));
        let registry = PatternRegistry::new(dir);
        let score = registry.adjust_score(50, &["does-not-exist".to_string()]);
        assert_eq!(score, 50);
    }

    #[test]
    fn matching_finds_patterns_of_the_right_kind() {
        let dir = std::env::temp_dir().join(format!("tic-patterns-match-{}", std::process::id()));
        let registry = PatternRegistry::new(dir);
        let matched = registry.matching(PatternKind::Text, "this is urgent, act now");
        assert!(matched.contains(&"txt-urgency-urgent".to_string()));
        assert!(matched.contains(&"txt-urgency-act-now".to_string()));
        assert!(!matched.iter().any(|id| id.starts_with("url-")));
    }

    #[test]
    fn persist_then_load_round_trips_weight_changes() {
        let dir = std::env::temp_dir().join(format!("tic-patterns-roundtrip-{}", std::process::id()));
        let path = dir.join("patterns.json");
        let registry = PatternRegistry::new(path.clone());
        let mut p = registry.get("txt-urgency-urgent").unwrap();
        p.weight = 3.5;
        registry.upsert(p);
        registry.persist().unwrap();

        let reloaded = PatternRegistry::new(path.clone());
        reloaded.load_from_disk().unwrap();
        assert_eq!(reloaded.get("txt-urgency-urgent").unwrap().weight, 3.5);

        let _ = std::fs::remove_dir_all(dir);
    }
}
