//! IOC Extractor: pulls IPs, domains, URLs, hashes, and emails out of
//! free text. Regex-driven, in the style of the log-line extraction this
//! workspace started from — dotted-quad IPv4 with a range check, 32/64-hex
//! hashes, and a web URL pattern, just aimed at scam messages instead of
//! server logs.

use super::ExtractedIocs;
use once_cell::sync::Lazy;
use regex::Regex;

static IPV4_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:\d{1,3}\.){3}\d{1,3}\b").unwrap());

static IPV6_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:[0-9a-fA-F]{1,4}:){2,7}[0-9a-fA-F]{1,4}\b|\b(?:[0-9a-fA-F]{1,4}:){1,7}:\b").unwrap()
});

static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"https?://[^\s<>"'\)\]]+"#).unwrap());

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap());

static DOMAIN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?\.)+[a-zA-Z]{2,}\b").unwrap()
});

static MD5_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[a-fA-F0-9]{32}\b").unwrap());
static SHA256_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[a-fA-F0-9]{64}\b").unwrap());

/// Extract all recognizable indicators of compromise from `text`.
///
/// Input longer than `text_cap` characters is truncated first to bound
/// worst-case regex cost. URLs are extracted and stripped from the text
/// before domain extraction, and any remaining domain match that is itself
/// a substring of an extracted URL is dropped, so `domains` never overlaps
/// `urls` even when the same host also appears as a bare token elsewhere in
/// the text. Never errors; malformed input simply yields fewer (or zero)
/// indicators.
pub fn extract(text: &str, text_cap: usize) -> ExtractedIocs {
    let truncated: String = text.chars().take(text_cap).collect();

    let urls = dedup_matches(&URL_RE, &truncated);
    let mut text_without_urls = truncated.clone();
    for u in &urls {
        text_without_urls = text_without_urls.replace(u.as_str(), " ");
    }

    let emails = dedup_matches(&EMAIL_RE, &truncated);
    let mut text_without_emails = text_without_urls.clone();
    for e in &emails {
        text_without_emails = text_without_emails.replace(e.as_str(), " ");
    }

    let domains: Vec<String> = dedup_matches(&DOMAIN_RE, &text_without_emails)
        .into_iter()
        .filter(|d| !urls.iter().any(|u| u.contains(d.as_str())))
        .collect();
    let ipv4 = dedup_matches(&IPV4_RE, &truncated)
        .into_iter()
        .filter(|ip| is_valid_ipv4(ip))
        .collect();
    let ipv6 = dedup_matches(&IPV6_RE, &truncated);

    let md5 = dedup_matches(&MD5_RE, &truncated)
        .into_iter()
        .filter(|h| h.len() == 32)
        .collect();
    let sha256 = dedup_matches(&SHA256_RE, &truncated)
        .into_iter()
        .filter(|h| h.len() == 64)
        .collect();

    ExtractedIocs {
        ipv4,
        ipv6,
        domains,
        urls,
        md5,
        sha256,
        emails,
    }
}

fn dedup_matches(re: &Regex, text: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for m in re.find_iter(text) {
        let s = m.as_str().to_string();
        if seen.insert(s.clone()) {
            out.push(s);
        }
    }
    out
}

fn is_valid_ipv4(candidate: &str) -> bool {
    candidate
        .split('.')
        .all(|octet| octet.parse::<u16>().map(|v| v <= 255).unwrap_or(false))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_mixed_indicators() {
        let sha = "d".repeat(64);
        let text = format!(
            "contact 10.0.0.1 and 2001:db8::1 or visit https://a.b/c with hash {}",
            sha
        );
        let iocs = extract(&text, 100_000);
        assert_eq!(iocs.ipv4, vec!["10.0.0.1".to_string()]);
        assert_eq!(iocs.ipv6, vec!["2001:db8::1".to_string()]);
        assert_eq!(iocs.urls, vec!["https://a.b/c".to_string()]);
        assert_eq!(iocs.sha256, vec![sha]);
        assert!(iocs.md5.is_empty());
    }

    #[test]
    fn domain_inside_url_is_not_double_counted() {
        let text = "visit https://evil.example.com/login now";
        let iocs = extract(text, 100_000);
        assert_eq!(iocs.urls, vec!["https://evil.example.com/login".to_string()]);
        assert!(iocs.domains.is_empty());
    }

    #[test]
    fn bare_domain_duplicating_a_url_host_elsewhere_is_dropped() {
        let text = "evil.example.com is sketchy, see https://evil.example.com/login now";
        let iocs = extract(text, 100_000);
        assert_eq!(iocs.urls, vec!["https://evil.example.com/login".to_string()]);
        assert!(iocs.domains.is_empty());
    }

    #[test]
    fn dedup_preserves_first_occurrence_order() {
        let text = "see 1.2.3.4 then 5.6.7.8 then 1.2.3.4 again";
        let iocs = extract(text, 100_000);
        assert_eq!(iocs.ipv4, vec!["1.2.3.4".to_string(), "5.6.7.8".to_string()]);
    }

    #[test]
    fn invalid_ipv4_octet_is_rejected() {
        let text = "300.1.2.3 is not an IP but 192.168.1.1 is";
        let iocs = extract(text, 100_000);
        assert_eq!(iocs.ipv4, vec!["192.168.1.1".to_string()]);
    }

    #[test]
    fn text_is_truncated_at_cap() {
        let text = "a".repeat(10) + "1.2.3.4";
        let iocs = extract(&text, 5);
        assert!(iocs.ipv4.is_empty());
    }

    #[test]
    fn extracts_email() {
        let text = "reply to scammer@example.com for details";
        let iocs = extract(text, 100_000);
        assert_eq!(iocs.emails, vec!["scammer@example.com".to_string()]);
    }
}
