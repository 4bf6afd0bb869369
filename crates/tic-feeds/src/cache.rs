//! Unified URL Threat Cache: merges the feed adapters behind a single
//! serialization point so refresh and cache-load can never interleave, and
//! publishes lookups off an immutable snapshot so readers never block on a
//! writer. Grounded in the snapshot-swap store pattern used elsewhere in
//! this workspace for lock-free publication of a ruleset.

use arc_swap::ArcSwap;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tic_common::{now_ms, CancelToken, StoreError, TicConfig};
use tic_ioc::canonicalize_url;

use crate::adapters::FeedAdapter;

#[derive(Debug, Default, Clone)]
struct Snapshot {
    phishing: Arc<HashSet<String>>,
    malware: Arc<HashSet<String>>,
}

#[derive(Debug, Default, Clone)]
pub struct RefreshStats {
    pub phishing_count: usize,
    pub malware_count: usize,
    pub errors: Vec<String>,
}

pub struct UrlThreatCache {
    snapshot: ArcSwap<Snapshot>,
    last_refresh_ms: AtomicI64,
    refresh_lock: tokio::sync::Mutex<()>,
    cache_dir: PathBuf,
}

impl UrlThreatCache {
    /// Construct with an injected cache directory; no post-construction
    /// mutation of the directory is allowed.
    pub fn new(cache_dir: PathBuf) -> Self {
        Self {
            snapshot: ArcSwap::from_pointee(Snapshot::default()),
            last_refresh_ms: AtomicI64::new(0),
            refresh_lock: tokio::sync::Mutex::new(()),
            cache_dir,
        }
    }

    fn cache_file(&self) -> PathBuf {
        self.cache_dir.join("url_threat_cache.txt")
    }

    pub fn is_phishing(&self, url: &str) -> bool {
        let key = canonicalize_url(url);
        matches_any(&self.snapshot.load().phishing, &key)
    }

    pub fn is_malware(&self, url: &str) -> bool {
        let key = canonicalize_url(url);
        matches_any(&self.snapshot.load().malware, &key)
    }

    pub fn is_known_threat(&self, url: &str) -> bool {
        self.is_phishing(url) || self.is_malware(url)
    }

    pub fn needs_refresh(&self, cfg: &TicConfig) -> bool {
        now_ms() - self.last_refresh_ms.load(Ordering::Acquire) > cfg.url_cache_ttl_ms
    }

    pub fn last_refresh_ms(&self) -> i64 {
        self.last_refresh_ms.load(Ordering::Acquire)
    }

    /// Run every adapter, merge into new sets, and atomically swap them in.
    /// A failing adapter contributes an empty set and its error is
    /// accumulated rather than failing the whole refresh.
    pub async fn refresh(
        &self,
        client: &reqwest::Client,
        cfg: &TicConfig,
        phishing_adapters: &[Box<dyn FeedAdapter>],
        malware_adapters: &[Box<dyn FeedAdapter>],
        cancel: &CancelToken,
    ) -> RefreshStats {
        let _guard = self.refresh_lock.lock().await;

        let mut phishing = HashSet::new();
        let mut malware = HashSet::new();
        let mut errors = Vec::new();

        for adapter in phishing_adapters {
            if cancel.is_canceled() {
                errors.push("refresh canceled".to_string());
                break;
            }
            match adapter.fetch(client, cfg).await {
                Ok(urls) => phishing.extend(urls),
                Err(e) => errors.push(e.to_string()),
            }
        }

        for adapter in malware_adapters {
            if cancel.is_canceled() {
                errors.push("refresh canceled".to_string());
                break;
            }
            match adapter.fetch(client, cfg).await {
                Ok(urls) => malware.extend(urls),
                Err(e) => errors.push(e.to_string()),
            }
        }

        let stats = RefreshStats {
            phishing_count: phishing.len(),
            malware_count: malware.len(),
            errors,
        };

        self.snapshot.store(Arc::new(Snapshot {
            phishing: Arc::new(phishing),
            malware: Arc::new(malware),
        }));
        self.last_refresh_ms.store(now_ms(), Ordering::Release);

        if let Err(e) = self.persist() {
            log::warn!("failed to persist url threat cache: {e}");
        }

        stats
    }

    fn persist(&self) -> Result<(), StoreError> {
        let snapshot = self.snapshot.load();
        let mut body = String::from("# Phishing URLs\n");
        for u in snapshot.phishing.iter() {
            body.push_str(u);
            body.push('\n');
        }
        body.push_str("# Malware URLs\n");
        for u in snapshot.malware.iter() {
            body.push_str(u);
            body.push('\n');
        }
        std::fs::create_dir_all(&self.cache_dir)?;
        std::fs::write(self.cache_file(), body)?;
        Ok(())
    }

    /// Load the persisted cache file, under the same serialization point as
    /// `refresh` so a concurrent refresh can never interleave with a load.
    /// A corrupt or missing file yields an empty, successfully-loaded state
    /// rather than an error.
    pub async fn load_from_cache(&self) -> Result<(), StoreError> {
        let _guard = self.refresh_lock.lock().await;

        let path = self.cache_file();
        let contents = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        let mut phishing = HashSet::new();
        let mut malware = HashSet::new();
        let mut in_malware_section = false;

        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if line.starts_with("# Malware URLs") {
                in_malware_section = true;
                continue;
            }
            if line.starts_with("# Phishing URLs") {
                in_malware_section = false;
                continue;
            }
            if line.starts_with('#') {
                continue;
            }
            if in_malware_section {
                malware.insert(line.to_string());
            } else {
                phishing.insert(line.to_string());
            }
        }

        self.snapshot.store(Arc::new(Snapshot {
            phishing: Arc::new(phishing),
            malware: Arc::new(malware),
        }));

        Ok(())
    }
}

/// Substring-boundary membership rule: `url` matches set member `m` if
/// equal, or `url` starts with `m` and the following character is one of
/// `/?#:`, or `url` has exactly `m`'s length.
fn matches_any(set: &HashSet<String>, url: &str) -> bool {
    if set.contains(url) {
        return true;
    }
    for m in set.iter() {
        if url.len() >= m.len() && url.as_bytes().starts_with(m.as_bytes()) {
            if url.len() == m.len() {
                return true;
            }
            if matches!(url.as_bytes()[m.len()], b'/' | b'?' | b'#' | b':') {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_rule_matches_subpath_not_lookalike_suffix() {
        let mut set = HashSet::new();
        set.insert("evil.example.com/login".to_string());
        assert!(matches_any(&set, "evil.example.com/login/?x=1"));
        assert!(matches_any(&set, "evil.example.com/login"));
        assert!(!matches_any(&set, "evil.example.com.login.bad/"));
        assert!(!matches_any(&set, "evil.example.com/loginx"));
    }

    #[tokio::test]
    async fn fresh_cache_needs_refresh() {
        let dir = std::env::temp_dir().join(format!("tic-cache-test-{}", std::process::id()));
        let cache = UrlThreatCache::new(dir);
        let cfg = TicConfig::default();
        assert!(cache.needs_refresh(&cfg));
    }

    #[tokio::test]
    async fn persist_then_load_round_trips() {
        let dir = std::env::temp_dir().join(format!("tic-cache-roundtrip-{}", std::process::id()));
        let cache = UrlThreatCache::new(dir.clone());
        cache.snapshot.store(Arc::new(Snapshot {
            phishing: Arc::new(HashSet::from(["evil.example.com/login".to_string()])),
            malware: Arc::new(HashSet::from(["bad.example.com/payload".to_string()])),
        }));
        cache.persist().unwrap();

        let reloaded = UrlThreatCache::new(dir.clone());
        reloaded.load_from_cache().await.unwrap();
        assert!(reloaded.is_phishing("https://evil.example.com/login"));
        assert!(reloaded.is_malware("https://bad.example.com/payload"));

        let _ = std::fs::remove_dir_all(dir);
    }
}
