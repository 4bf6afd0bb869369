//! Seeded patterns: the starting pattern table, before any user
//! feedback has adjusted a single weight. Each covers one of the
//! named scam categories — urgency, OTP requests,
//! impersonation, payment pressure, remote-access tooling, and a handful
//! of structural URL features.

use tic_common::{PatternKind, PatternWeight};

const SEEDED_WEIGHT: f32 = 1.0;

pub fn seeded_patterns() -> Vec<PatternWeight> {
    let specs: &[(&str, &str, PatternKind, &str)] = &[
        // Urgency language.
        ("txt-urgency-act-now", r"(?i)\bact now\b", PatternKind::Text, "urgency"),
        ("txt-urgency-immediately", r"(?i)\bimmediately\b", PatternKind::Text, "urgency"),
        ("txt-urgency-suspended", r"(?i)\b(account|card)\s+(is\s+)?suspended\b", PatternKind::Text, "urgency"),
        ("txt-urgency-final-notice", r"(?i)\bfinal notice\b", PatternKind::Text, "urgency"),
        ("txt-urgency-urgent", r"(?i)\burgent\b", PatternKind::Text, "urgency"),
        // OTP / verification requests.
        ("txt-otp-share-code", r"(?i)\bshare\s+your\s+(otp|code)\b", PatternKind::Text, "otp"),
        ("txt-otp-one-time", r"(?i)\bone[- ]time\s+(code|password|pin)\b", PatternKind::Text, "otp"),
        ("txt-otp-verification-code", r"(?i)\bverification\s+code\b", PatternKind::Text, "otp"),
        // Impersonation: bank, government, tech support.
        ("txt-impersonate-bank", r"(?i)\byour\s+bank\b", PatternKind::Text, "impersonation"),
        ("txt-impersonate-irs", r"(?i)\b(irs|inland revenue|tax office)\b", PatternKind::Text, "impersonation"),
        ("txt-impersonate-gov", r"(?i)\bgovernment\s+agency\b", PatternKind::Text, "impersonation"),
        ("txt-impersonate-tech-support", r"(?i)\btech(nical)?\s+support\b", PatternKind::Text, "impersonation"),
        ("txt-impersonate-microsoft", r"(?i)\bmicrosoft\s+support\b", PatternKind::Text, "impersonation"),
        // Payment pressure.
        ("txt-payment-gift-card", r"(?i)\bgift\s*card\b", PatternKind::Text, "payment"),
        ("txt-payment-wire", r"(?i)\bwire\s+transfer\b", PatternKind::Text, "payment"),
        ("txt-payment-western-union", r"(?i)\bwestern union\b", PatternKind::Text, "payment"),
        ("txt-payment-bitcoin", r"(?i)\b(bitcoin|crypto)\s+payment\b", PatternKind::Text, "payment"),
        // Remote access tooling.
        ("txt-remote-anydesk", r"(?i)\banydesk\b", PatternKind::Text, "remote_access"),
        ("txt-remote-teamviewer", r"(?i)\bteamviewer\b", PatternKind::Text, "remote_access"),
        ("txt-remote-screen-share", r"(?i)\bscreen\s*share\b", PatternKind::Text, "remote_access"),
        ("txt-remote-remote-access", r"(?i)\bremote\s+access\b", PatternKind::Text, "remote_access"),
        // URL structural features (adjustable weight over a structural signal the URL analyzer detects).
        ("url-ip-as-host", r"^\d{1,3}(\.\d{1,3}){3}([:/]|$)", PatternKind::Url, "ip_as_host"),
        ("url-punycode", r"(?i)^xn--", PatternKind::Url, "punycode"),
        ("url-excess-subdomains", r"^(?:[^.]+\.){4,}[^.]+$", PatternKind::Url, "excessive_subdomains"),
        // Phone structural.
        ("phone-intl-prefix", r"^\+(?!1\b)\d{1,3}", PatternKind::Phone, "international_prefix"),
    ];

    specs
        .iter()
        .map(|(id, pattern, kind, threat_type)| PatternWeight {
            pattern_id: id.to_string(),
            pattern: pattern.to_string(),
            kind: *kind,
            threat_type: threat_type.to_string(),
            weight: SEEDED_WEIGHT,
            tp_count: 0,
            fp_count: 0,
            last_updated_ms: 0,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_patterns_cover_every_category() {
        let patterns = seeded_patterns();
        let categories: std::collections::HashSet<_> =
            patterns.iter().map(|p| p.threat_type.as_str()).collect();
        for expected in [
            "urgency",
            "otp",
            "impersonation",
            "payment",
            "remote_access",
        ] {
            assert!(categories.contains(expected), "missing category {expected}");
        }
    }

    #[test]
    fn all_pattern_ids_are_unique() {
        let patterns = seeded_patterns();
        let ids: std::collections::HashSet<_> = patterns.iter().map(|p| &p.pattern_id).collect();
        assert_eq!(ids.len(), patterns.len());
    }
}
