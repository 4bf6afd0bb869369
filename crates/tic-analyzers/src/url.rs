//! URL analyzer: canonicalize, resolve a short link if one is
//! detected, then consult every store that can turn a URL into a reason —
//! the threat-feed cache, domain reputation, the community
//! store — before falling back to purely structural checks. Protected
//! infrastructure short-circuits to a clean verdict before anything
//! else runs.

use tic_common::{CancelToken, PatternKind, Reason, ReasonKind, TicConfig};
use tic_feeds::resolver;
use tic_ioc::{canonicalize_url, registrable_domain};
use tic_reputation::is_protected;

use crate::deps::AnalyzerDeps;
use crate::output::AnalyzerOutput;

const FEED_CONTRIBUTION: u8 = 70;
const BLOCKED_CONTRIBUTION: u8 = 80;
const COMMUNITY_CONTRIBUTION_CAP: u8 = 60;
const IP_AS_HOST_CONTRIBUTION: u8 = 25;
const PUNYCODE_CONTRIBUTION: u8 = 30;
const EXCESS_SUBDOMAIN_CONTRIBUTION: u8 = 15;
const LOOKALIKE_CONTRIBUTION: u8 = 35;
const HTTP_PENALTY: u8 = 10;
const HTTPS_DISCOUNT: u8 = 5;

const BRAND_DICTIONARY: &[&str] = &["paypal", "amazon", "apple", "google", "microsoft", "bank"];

fn host_only(canonical: &str) -> &str {
    canonical.split('/').next().unwrap_or(canonical)
}

/// Structural signature of a domain that carries a brand name plus
/// surrounding noise (hyphens, digits, extra words) instead of being that
/// brand's own registrable domain.
fn is_brand_lookalike(domain: &str) -> Option<&'static str> {
    BRAND_DICTIONARY.iter().find(|brand| {
        domain.contains(*brand) && domain != **brand && !domain.ends_with(&format!(".{brand}.com"))
    })
}

pub async fn analyze_url_signal(
    url: &str,
    deps: &AnalyzerDeps,
    cfg: &TicConfig,
    cancel: &CancelToken,
) -> AnalyzerOutput {
    let mut output = AnalyzerOutput::default();

    let canonical = canonicalize_url(url);
    let domain = registrable_domain(host_only(&canonical));
    if is_protected(&domain) {
        return output;
    }

    let effective_canonical = if resolver::is_short_link(url) {
        match resolver::resolve(&deps.http_client, url, cfg, cancel).await {
            Ok(r) if r.resolved => canonicalize_url(&r.final_url),
            _ => canonical.clone(),
        }
    } else {
        canonical.clone()
    };
    let effective_domain = registrable_domain(host_only(&effective_canonical));
    if is_protected(&effective_domain) {
        return output;
    }

    if deps.url_cache.is_known_threat(&effective_canonical) {
        output.push_reason(Reason::new(
            "Known threat URL",
            ReasonKind::Feed,
            FEED_CONTRIBUTION,
            effective_canonical.clone(),
            1.0,
        ));
    }

    if let Ok(Some(rep)) = deps.domain_reputation.get(&effective_domain).await {
        if rep.blocked {
            output.push_reason(Reason::new(
                "Domain is blocked",
                ReasonKind::Reputation,
                BLOCKED_CONTRIBUTION,
                effective_domain.clone(),
                1.0,
            ));
        } else if rep.scam_reports > rep.safe_reports {
            let deficiency = 100u8.saturating_sub(rep.trust.clamp(0, 100) as u8);
            let contribution = ((deficiency as f32 * 0.4).round() as u8).min(40);
            output.push_reason(Reason::new(
                "Domain has more scam reports than safe reports",
                ReasonKind::Reputation,
                contribution,
                format!("trust={} scam={} safe={}", rep.trust, rep.scam_reports, rep.safe_reports),
                1.0,
            ));
        }
    }

    if let Some(report) = deps.community.check_domain(&effective_domain) {
        output.push_reason(Reason::new(
            "Community-flagged domain",
            ReasonKind::Community,
            report.severity.min(COMMUNITY_CONTRIBUTION_CAP),
            report.evidence,
            1.0,
        ));
    }

    for pattern_id in deps.patterns.matching(PatternKind::Url, &effective_canonical) {
        let (title, contribution) = match deps.patterns.get(&pattern_id).map(|p| p.threat_type) {
            Some(ref t) if t == "ip_as_host" => ("URL uses a raw IP address as host", IP_AS_HOST_CONTRIBUTION),
            Some(ref t) if t == "punycode" => ("URL host is punycode-encoded", PUNYCODE_CONTRIBUTION),
            Some(ref t) if t == "excessive_subdomains" => {
                ("URL has an excessive number of subdomains", EXCESS_SUBDOMAIN_CONTRIBUTION)
            }
            _ => ("URL matches a known structural risk pattern", IP_AS_HOST_CONTRIBUTION),
        };
        let weight = deps.patterns.get(&pattern_id).map(|p| p.weight).unwrap_or(1.0);
        output.push_reason(Reason::new(
            title,
            ReasonKind::Url,
            contribution,
            effective_canonical.clone(),
            weight,
        ));
        output.matched_pattern_ids.push(pattern_id);
    }

    if let Some(brand) = is_brand_lookalike(&effective_domain) {
        output.push_reason(Reason::new(
            "Domain resembles a well-known brand",
            ReasonKind::Impersonation,
            LOOKALIKE_CONTRIBUTION,
            format!("contains '{brand}': {effective_domain}"),
            1.0,
        ));
    }

    if url.starts_with("https://") {
        output.base_score = output.base_score.saturating_sub(HTTPS_DISCOUNT);
    } else if url.starts_with("http://") {
        output.base_score = output.base_score.saturating_add(HTTP_PENALTY).min(100);
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brand_lookalike_detects_noisy_variant() {
        assert_eq!(is_brand_lookalike("paypal-verify.tk"), Some("paypal"));
        assert_eq!(is_brand_lookalike("paypal.com"), None);
        assert!(is_brand_lookalike("totally-unrelated.com").is_none());
    }

    #[test]
    fn host_only_strips_path() {
        assert_eq!(host_only("evil.example.com/login"), "evil.example.com");
    }
}
