//! Short-Link Resolver: follows a bounded chain of redirects to a
//! terminal URL. Only a closed set of known shortener hosts is treated as
//! worth resolving; everything else is returned unchanged.

use std::time::Duration;
use tic_common::{CancelToken, ResolveError, TicConfig};

const SHORT_LINK_HOSTS: &[&str] = &[
    "bit.ly",
    "t.co",
    "goo.gl",
    "tinyurl.com",
    "ow.ly",
    "is.gd",
    "buff.ly",
    "rebrand.ly",
    "cutt.ly",
    "shorturl.at",
];

#[derive(Debug, Clone)]
pub struct ResolveResult {
    pub original: String,
    pub final_url: String,
    pub redirect_count: u32,
    pub resolved: bool,
}

/// True if `url`'s host is a known link shortener.
pub fn is_short_link(url: &str) -> bool {
    host_of(url)
        .map(|h| SHORT_LINK_HOSTS.iter().any(|s| h == *s))
        .unwrap_or(false)
}

fn host_of(url: &str) -> Option<String> {
    let without_scheme = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))?;
    let host_and_rest = without_scheme.split(['/', '?', '#']).next()?;
    let host = host_and_rest.split('@').next_back()?.split(':').next()?;
    Some(host.to_lowercase())
}

/// Follow redirects for `url` using HEAD requests, bounded by
/// `cfg.short_link_max_redirects` hops and per-hop connect/read timeouts.
/// Checks `cancel` between hops; a canceled resolve stops with the last
/// URL seen and `resolved = false`.
pub async fn resolve(
    client: &reqwest::Client,
    url: &str,
    cfg: &TicConfig,
    cancel: &CancelToken,
) -> Result<ResolveResult, ResolveError> {
    if !is_short_link(url) {
        return Ok(ResolveResult {
            original: url.to_string(),
            final_url: url.to_string(),
            redirect_count: 0,
            resolved: true,
        });
    }

    let mut current = url.to_string();
    let mut hops = 0u32;

    loop {
        if cancel.is_canceled() {
            return Ok(ResolveResult {
                original: url.to_string(),
                final_url: current,
                redirect_count: hops,
                resolved: false,
            });
        }
        if hops >= cfg.short_link_max_redirects {
            return Err(ResolveError::MaxRedirects);
        }

        let response = client
            .head(&current)
            .timeout(Duration::from_millis(cfg.short_link_read_timeout_ms))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ResolveError::Timeout
                } else {
                    ResolveError::Malformed(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(ResolveResult {
                original: url.to_string(),
                final_url: current,
                redirect_count: hops,
                resolved: true,
            });
        }
        if status.is_redirection() {
            let location = response
                .headers()
                .get(reqwest::header::LOCATION)
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string())
                .ok_or_else(|| ResolveError::Malformed("redirect missing Location".into()))?;
            current = resolve_relative(&current, &location);
            hops += 1;
            continue;
        }

        return Ok(ResolveResult {
            original: url.to_string(),
            final_url: current,
            redirect_count: hops,
            resolved: false,
        });
    }
}

fn resolve_relative(base: &str, location: &str) -> String {
    if location.starts_with("http://") || location.starts_with("https://") {
        return location.to_string();
    }
    reqwest::Url::parse(base)
        .and_then(|b| b.join(location))
        .map(|u| u.to_string())
        .unwrap_or_else(|_| location.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_known_shorteners() {
        assert!(is_short_link("https://bit.ly/abc123"));
        assert!(is_short_link("http://t.co/xyz"));
        assert!(!is_short_link("https://example.com/page"));
    }

    #[tokio::test]
    async fn non_shortener_is_returned_unchanged() {
        let client = reqwest::Client::new();
        let cfg = TicConfig::default();
        let cancel = CancelToken::new();
        let result = resolve(&client, "https://example.com/page", &cfg, &cancel)
            .await
            .unwrap();
        assert_eq!(result.final_url, "https://example.com/page");
        assert!(result.resolved);
        assert_eq!(result.redirect_count, 0);
    }
}
