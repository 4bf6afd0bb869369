//! Feed Adapters: three independent sources of known-bad URLs, all
//! behind the same `fetch` contract so the cache can fan them out
//! uniformly. Each adapter degrades to an empty result on any failure —
//! a bad feed never fails the whole refresh.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::time::Duration;
use tic_common::{FeedError, TicConfig};
use tic_ioc::canonicalize_url;

const USER_AGENT: &str = "tic-feeds/0.1 (threat-intelligence-core)";
const SMALL_RESPONSE_CAP_BYTES: usize = 2 * 1024 * 1024;
const JSON_RESPONSE_CAP_BYTES: usize = 100 * 1024 * 1024;

static URL_FIELD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""url"\s*:\s*"([^"]+)""#).unwrap());

#[async_trait::async_trait]
pub trait FeedAdapter: Send + Sync {
    async fn fetch(&self, client: &reqwest::Client, cfg: &TicConfig) -> Result<HashSet<String>, FeedError>;
}

fn build_request(
    client: &reqwest::Client,
    url: &str,
    cfg: &TicConfig,
) -> reqwest::RequestBuilder {
    client
        .get(url)
        .timeout(Duration::from_millis(
            cfg.feed_connect_timeout_ms + cfg.feed_read_timeout_ms,
        ))
        .header(reqwest::header::USER_AGENT, USER_AGENT)
}

/// PhishTank-like JSON feed. The response is a large JSON array; rather
/// than deserialize the whole document, URL fields are pulled out with a
/// regex over the streamed body so we never hold the full 40-100 MB
/// response in a parsed structure. Aborts early once the entry cap is hit.
pub struct PhishTankAdapter {
    pub url: String,
}

#[async_trait::async_trait]
impl FeedAdapter for PhishTankAdapter {
    async fn fetch(&self, client: &reqwest::Client, cfg: &TicConfig) -> Result<HashSet<String>, FeedError> {
        let response = build_request(client, &self.url, cfg)
            .send()
            .await
            .map_err(|e| FeedError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(FeedError::HttpStatus(response.status().as_u16()));
        }

        let mut out = HashSet::new();
        let mut bytes_seen = 0usize;
        let mut stream = response.bytes_stream();
        let mut pending = String::new();

        use futures_util::StreamExt;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| FeedError::Network(e.to_string()))?;
            bytes_seen += chunk.len();
            if bytes_seen > JSON_RESPONSE_CAP_BYTES {
                break;
            }
            pending.push_str(&String::from_utf8_lossy(&chunk));

            for cap in URL_FIELD_RE.captures_iter(&pending.clone()) {
                if out.len() >= cfg.phishtank_entry_cap {
                    break;
                }
                out.insert(canonicalize_url(&cap[1]));
            }
            // Keep only the tail that might contain a partial match across
            // chunk boundaries.
            if pending.len() > 4096 {
                let tail_start = pending.len() - 2048;
                pending = pending[tail_start..].to_string();
            }
            if out.len() >= cfg.phishtank_entry_cap {
                break;
            }
        }

        Ok(out)
    }
}

/// OpenPhish-like feed: one URL per line, blank lines and `#` comments
/// skipped.
pub struct OpenPhishAdapter {
    pub url: String,
}

#[async_trait::async_trait]
impl FeedAdapter for OpenPhishAdapter {
    async fn fetch(&self, client: &reqwest::Client, cfg: &TicConfig) -> Result<HashSet<String>, FeedError> {
        let response = build_request(client, &self.url, cfg)
            .send()
            .await
            .map_err(|e| FeedError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(FeedError::HttpStatus(response.status().as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FeedError::Parse(e.to_string()))?;

        if body.len() > SMALL_RESPONSE_CAP_BYTES {
            return Err(FeedError::Parse("response exceeded size cap".into()));
        }

        let out = body
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .map(canonicalize_url)
            .collect();

        Ok(out)
    }
}

/// URLhaus-like feed: tab-separated, authenticated. Column 0 is the URL,
/// column 4 the threat type. Disabled (no auth key) is not an error — it
/// yields an empty set.
pub struct UrlhausAdapter {
    pub url: String,
    pub auth_key: Option<String>,
}

#[async_trait::async_trait]
impl FeedAdapter for UrlhausAdapter {
    async fn fetch(&self, client: &reqwest::Client, cfg: &TicConfig) -> Result<HashSet<String>, FeedError> {
        let Some(key) = &self.auth_key else {
            return Ok(HashSet::new());
        };

        let response = build_request(client, &self.url, cfg)
            .header("Auth-Key", key)
            .send()
            .await
            .map_err(|e| FeedError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(FeedError::HttpStatus(response.status().as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FeedError::Parse(e.to_string()))?;

        if body.len() > SMALL_RESPONSE_CAP_BYTES {
            return Err(FeedError::Parse("response exceeded size cap".into()));
        }

        let out = body
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .filter_map(|l| l.split('\t').next())
            .map(canonicalize_url)
            .collect();

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openphish_skips_blank_and_comment_lines() {
        let body = "\n# comment\nhttp://evil.example.com/a\n\nhttp://evil.example.com/b\n";
        let out: HashSet<String> = body
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .map(canonicalize_url)
            .collect();
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn urlhaus_takes_first_tab_column() {
        let line = "http://bad.example.com/x\tfoo\tbar\tbaz\tmalware_download";
        let url = line.split('\t').next().unwrap();
        assert_eq!(url, "http://bad.example.com/x");
    }
}
