//! Protected-Infrastructure Registry: a static allow-list the core
//! must never flag or block. Every reputation mutation and every
//! community-report check consults this first.

use once_cell::sync::Lazy;

static EXACT_DOMAINS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "raw.githubusercontent.com",
        "github.com",
        "google.com",
        "apple.com",
        "microsoft.com",
        "cloudflare.com",
        "phishtank.org",
        "openphish.com",
        "urlhaus.abuse.ch",
        "virustotal.com",
    ]
});

static SUFFIX_DOMAINS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        ".googleapis.com",
        ".gstatic.com",
        ".cloudfront.net",
        ".akamaiedge.net",
        ".githubusercontent.com",
        ".windows.net",
    ]
});

/// True if `domain` is an exact match or a suffix match (`*.domain`) for a
/// registered entry.
pub fn is_protected(domain: &str) -> bool {
    let lower = domain.to_lowercase();
    if EXACT_DOMAINS.iter().any(|d| *d == lower) {
        return true;
    }
    SUFFIX_DOMAINS.iter().any(|suffix| lower.ends_with(suffix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_is_protected() {
        assert!(is_protected("raw.githubusercontent.com"));
        assert!(is_protected("GitHub.com"));
    }

    #[test]
    fn suffix_match_is_protected() {
        assert!(is_protected("storage.googleapis.com"));
        assert!(is_protected("d111.cloudfront.net"));
    }

    #[test]
    fn unrelated_domain_is_not_protected() {
        assert!(!is_protected("paypal-verify.tk"));
    }
}
