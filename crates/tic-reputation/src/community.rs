//! Community-Report Store: hashed, deduplicated user reports of
//! phones and domains. Raw identifiers are never persisted — only the
//! SHA-256 of a normalized form. Writes go to the durable store first and
//! the in-memory map is only updated if that succeeds, so a crash between
//! the two never loses a report that the process then believes happened.

use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use tic_common::{now_ms, CommunityReport, ReportKind, StoreError, ThreatReport};
use tic_ioc::registrable_domain;

use crate::registry::is_protected;

const SCAM_COUNTRY_PREFIXES: &[&str] = &["+234", "+233", "+254", "+63", "+92", "+880"];

const MALICIOUS_TLDS: &[&str] = &[
    ".tk", ".ml", ".ga", ".cf", ".gq", ".top", ".xyz", ".work", ".click", ".loan", ".date",
    ".racing",
];

const PHISHING_KEYWORDS: &[&str] = &[
    "login-", "-verify", "-secure", "account-", "banking-", "paypal-", "-update", "secure-login",
];

const SCAM_MESSAGE_TEMPLATES: &[&str] = &[
    "your account has been suspended",
    "verify your identity immediately",
    "share your otp",
    "send payment via gift card",
    "you have won a prize",
    "claim your reward now",
    "unusual activity detected on your account",
    "your package could not be delivered",
    "update your payment information",
    "your subscription will be cancelled",
    "act now to avoid suspension",
    "confirm your bank details",
    "click here to restore access",
    "your package is on hold",
    "tax refund pending",
    "irs notice of action",
    "congratulations you have been selected",
];

pub struct CommunityReportStore {
    reports: DashMap<String, CommunityReport>,
    path: PathBuf,
}

impl CommunityReportStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            reports: DashMap::new(),
            path,
        }
    }

    pub fn load_from_disk(&self) -> Result<(), StoreError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        for line in contents.lines() {
            let fields: Vec<&str> = line.splitn(7, '|').collect();
            if fields.len() < 6 {
                continue;
            }
            let kind = match fields[1] {
                "phone" => ReportKind::Phone,
                "domain" => ReportKind::Domain,
                _ => continue,
            };
            let Ok(severity) = fields[2].parse() else { continue };
            let Ok(report_count) = fields[3].parse() else { continue };
            let Ok(first_seen_ms) = fields[4].parse() else { continue };
            let Ok(last_seen_ms) = fields[5].parse() else { continue };
            let region = fields.get(6).filter(|s| !s.is_empty()).map(|s| s.to_string());

            self.reports.insert(
                fields[0].to_string(),
                CommunityReport {
                    hash: fields[0].to_string(),
                    kind,
                    severity,
                    report_count,
                    first_seen_ms,
                    last_seen_ms,
                    region,
                },
            );
        }
        Ok(())
    }

    fn persist(&self) -> Result<(), StoreError> {
        let mut body = String::new();
        for entry in self.reports.iter() {
            let r = entry.value();
            let kind = match r.kind {
                ReportKind::Phone => "phone",
                ReportKind::Domain => "domain",
            };
            body.push_str(&format!(
                "{}|{}|{}|{}|{}|{}|{}\n",
                r.hash,
                kind,
                r.severity,
                r.report_count,
                r.first_seen_ms,
                r.last_seen_ms,
                r.region.as_deref().unwrap_or("")
            ));
        }
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, body)?;
        Ok(())
    }

    /// Record a user report. Persists first; the in-memory map is only
    /// touched once that succeeds.
    pub fn record_report(
        &self,
        kind: ReportKind,
        normalized_identifier: &str,
        severity: u8,
        region: Option<String>,
    ) -> Result<(), StoreError> {
        let hash = hash_identifier(normalized_identifier);
        let now = now_ms();

        let mut updated = self
            .reports
            .get(&hash)
            .map(|r| r.clone())
            .unwrap_or(CommunityReport {
                hash: hash.clone(),
                kind,
                severity,
                report_count: 0,
                first_seen_ms: now,
                last_seen_ms: now,
                region: region.clone(),
            });
        updated.report_count += 1;
        updated.last_seen_ms = now;
        updated.severity = updated.severity.max(severity);
        if updated.region.is_none() {
            updated.region = region;
        }

        self.reports.insert(hash.clone(), updated);
        if let Err(e) = self.persist() {
            self.reports.remove(&hash);
            return Err(e);
        }
        Ok(())
    }

    pub fn check_phone(&self, phone: &str) -> Option<ThreatReport> {
        let normalized = normalize_phone(phone);
        if SCAM_COUNTRY_PREFIXES.iter().any(|p| normalized.starts_with(p)) {
            return Some(ThreatReport {
                severity: 70,
                report_count: 0,
                evidence: "known scam-associated country code".to_string(),
            });
        }
        let hash = hash_identifier(&normalized);
        self.reports.get(&hash).map(|r| ThreatReport {
            severity: r.severity,
            report_count: r.report_count,
            evidence: "community-reported phone number".to_string(),
        })
    }

    pub fn check_domain(&self, domain_or_url: &str) -> Option<ThreatReport> {
        let key = registrable_domain(domain_or_url);
        if is_protected(&key) {
            return None;
        }
        if let Some(tld) = MALICIOUS_TLDS.iter().find(|t| key.ends_with(*t)) {
            return Some(ThreatReport {
                severity: 60,
                report_count: 0,
                evidence: format!("registered under high-abuse TLD {tld}"),
            });
        }
        if let Some(keyword) = PHISHING_KEYWORDS.iter().find(|k| key.contains(*k)) {
            return Some(ThreatReport {
                severity: 55,
                report_count: 0,
                evidence: format!("domain contains phishing keyword '{keyword}'"),
            });
        }
        let hash = hash_identifier(&key);
        self.reports.get(&hash).map(|r| ThreatReport {
            severity: r.severity,
            report_count: r.report_count,
            evidence: "community-reported domain".to_string(),
        })
    }

    pub fn check_message_template(&self, text: &str) -> Option<ThreatReport> {
        let lower = text.to_lowercase();
        let matches = SCAM_MESSAGE_TEMPLATES
            .iter()
            .filter(|t| lower.contains(*t))
            .count();
        if matches == 0 {
            return None;
        }
        Some(ThreatReport {
            severity: 85,
            report_count: matches as u32,
            evidence: "matches known scam message template".to_string(),
        })
    }
}

fn hash_identifier(normalized: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn normalize_phone(phone: &str) -> String {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    if phone.trim_start().starts_with('+') {
        format!("+{digits}")
    } else {
        digits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_template_matches_known_scam_phrase() {
        let store = CommunityReportStore::new(PathBuf::from("/tmp/does-not-exist.txt"));
        let report = store
            .check_message_template("URGENT: share your OTP now or lose access")
            .unwrap();
        assert_eq!(report.severity, 85);
    }

    #[test]
    fn clean_message_has_no_template_match() {
        let store = CommunityReportStore::new(PathBuf::from("/tmp/does-not-exist.txt"));
        assert!(store
            .check_message_template("Hey, want to grab coffee tomorrow?")
            .is_none());
    }

    #[test]
    fn protected_domain_is_never_flagged() {
        let store = CommunityReportStore::new(PathBuf::from("/tmp/does-not-exist.txt"));
        assert!(store.check_domain("raw.githubusercontent.com").is_none());
    }

    #[test]
    fn malicious_tld_is_flagged() {
        let store = CommunityReportStore::new(PathBuf::from("/tmp/does-not-exist.txt"));
        assert!(store.check_domain("paypal-verify.tk").is_some());
    }

    #[test]
    fn scam_country_prefix_is_flagged() {
        let store = CommunityReportStore::new(PathBuf::from("/tmp/does-not-exist.txt"));
        assert!(store.check_phone("+2348012345678").is_some());
    }
}
