//! Runtime configuration for the Threat Intelligence Core, loaded from
//! environment variables, each with a fixed literal default.
//!
//! # Environment variables
//!
//! - `TIC_MIN_ALERT_SEVERITY`: `low` | `medium` | `high` | `critical` (default: `medium`)
//! - `TIC_URL_CACHE_TTL_MS` (default: 14400000 — 4h)
//! - `TIC_SHORT_LINK_MAX_REDIRECTS` (default: 5)
//! - `TIC_SHORT_LINK_CONNECT_TIMEOUT_MS` (default: 8000)
//! - `TIC_FEED_READ_TIMEOUT_MS` (default: 30000)
//! - `TIC_PHISHTANK_ENTRY_CAP` (default: 50000)
//! - `TIC_IOC_TEXT_CAP` (default: 100000)
//! - `TIC_LEARNING_RATE` (default: 0.05)
//! - `TIC_DISCOVERY_MIN_OCCURRENCES` (default: 5)
//! - `TIC_DISCOVERY_MIN_COSINE` (default: 0.7)

use crate::model::Severity;
use std::env;

#[derive(Debug, Clone)]
pub struct TicConfig {
    pub min_alert_severity: Severity,
    pub url_cache_ttl_ms: i64,
    pub short_link_max_redirects: u8,
    pub short_link_connect_timeout_ms: u64,
    pub short_link_read_timeout_ms: u64,
    pub feed_connect_timeout_ms: u64,
    pub feed_read_timeout_ms: u64,
    pub phishtank_entry_cap: usize,
    pub ioc_text_cap: usize,
    pub learning_rate: f32,
    pub discovery_min_occurrences: u32,
    pub discovery_min_cosine: f32,
    pub pattern_weight_min: f32,
    pub pattern_weight_max: f32,
    /// Documented no-op: the core does not scale `score` by a protection
    /// level. Kept so callers that pass one don't need a branch.
    pub protection_level_multiplier: f32,
}

impl Default for TicConfig {
    fn default() -> Self {
        Self {
            min_alert_severity: Severity::Medium,
            url_cache_ttl_ms: 4 * 60 * 60 * 1000,
            short_link_max_redirects: 5,
            short_link_connect_timeout_ms: 8_000,
            short_link_read_timeout_ms: 10_000,
            feed_connect_timeout_ms: 15_000,
            feed_read_timeout_ms: 30_000,
            phishtank_entry_cap: 50_000,
            ioc_text_cap: 100_000,
            learning_rate: 0.05,
            discovery_min_occurrences: 5,
            discovery_min_cosine: 0.7,
            pattern_weight_min: 0.1,
            pattern_weight_max: 5.0,
            protection_level_multiplier: 1.0,
        }
    }
}

impl TicConfig {
    /// Load configuration from environment variables, falling back to
    /// `TicConfig::default()` for anything unset or unparsable.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        let defaults = Self::default();

        Self {
            min_alert_severity: env::var("TIC_MIN_ALERT_SEVERITY")
                .ok()
                .and_then(|s| parse_severity(&s))
                .unwrap_or(defaults.min_alert_severity),
            url_cache_ttl_ms: env_i64("TIC_URL_CACHE_TTL_MS", defaults.url_cache_ttl_ms),
            short_link_max_redirects: env_u8(
                "TIC_SHORT_LINK_MAX_REDIRECTS",
                defaults.short_link_max_redirects,
            ),
            short_link_connect_timeout_ms: env_u64(
                "TIC_SHORT_LINK_CONNECT_TIMEOUT_MS",
                defaults.short_link_connect_timeout_ms,
            ),
            short_link_read_timeout_ms: defaults.short_link_read_timeout_ms,
            feed_connect_timeout_ms: defaults.feed_connect_timeout_ms,
            feed_read_timeout_ms: env_u64(
                "TIC_FEED_READ_TIMEOUT_MS",
                defaults.feed_read_timeout_ms,
            ),
            phishtank_entry_cap: env_usize(
                "TIC_PHISHTANK_ENTRY_CAP",
                defaults.phishtank_entry_cap,
            ),
            ioc_text_cap: env_usize("TIC_IOC_TEXT_CAP", defaults.ioc_text_cap),
            learning_rate: env_f32("TIC_LEARNING_RATE", defaults.learning_rate),
            discovery_min_occurrences: env_u32(
                "TIC_DISCOVERY_MIN_OCCURRENCES",
                defaults.discovery_min_occurrences,
            ),
            discovery_min_cosine: env_f32(
                "TIC_DISCOVERY_MIN_COSINE",
                defaults.discovery_min_cosine,
            ),
            pattern_weight_min: defaults.pattern_weight_min,
            pattern_weight_max: defaults.pattern_weight_max,
            protection_level_multiplier: defaults.protection_level_multiplier,
        }
    }
}

fn parse_severity(s: &str) -> Option<Severity> {
    match s.to_lowercase().as_str() {
        "low" => Some(Severity::Low),
        "medium" => Some(Severity::Medium),
        "high" => Some(Severity::High),
        "critical" => Some(Severity::Critical),
        _ => None,
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}
fn env_i64(key: &str, default: i64) -> i64 {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}
fn env_u32(key: &str, default: u32) -> u32 {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}
fn env_u8(key: &str, default: u8) -> u8 {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}
fn env_usize(key: &str, default: usize) -> usize {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}
fn env_f32(key: &str, default: f32) -> f32 {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let cfg = TicConfig::default();
        assert_eq!(cfg.url_cache_ttl_ms, 14_400_000);
        assert_eq!(cfg.short_link_max_redirects, 5);
        assert_eq!(cfg.phishtank_entry_cap, 50_000);
        assert_eq!(cfg.ioc_text_cap, 100_000);
        assert!((cfg.learning_rate - 0.05).abs() < f32::EPSILON);
        assert_eq!(cfg.discovery_min_occurrences, 5);
        assert_eq!(cfg.pattern_weight_min, 0.1);
        assert_eq!(cfg.pattern_weight_max, 5.0);
    }

    #[test]
    fn severity_parsing() {
        assert_eq!(parse_severity("HIGH"), Some(Severity::High));
        assert_eq!(parse_severity("bogus"), None);
    }
}
