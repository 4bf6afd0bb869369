//! The uniform output contract (`RiskResult`) and the stored entities every
//! other crate in the workspace reads or writes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Discretization of `score` into four bands. Breakpoints are fixed by the
/// spec: LOW < 25 <= MEDIUM < 50 <= HIGH < 75 <= CRITICAL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn band(score: u8) -> Self {
        match score {
            0..=24 => Severity::Low,
            25..=49 => Severity::Medium,
            50..=74 => Severity::High,
            _ => Severity::Critical,
        }
    }
}

/// The kind of evidence a `Reason` carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReasonKind {
    Url,
    Phone,
    TextPattern,
    Behavior,
    Reputation,
    Community,
    Feed,
    Impersonation,
    Urgency,
    Payment,
    RemoteAccess,
    Otp,
    Deepfake,
}

/// A single named contribution to a risk result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reason {
    pub title: String,
    pub kind: ReasonKind,
    pub severity_contribution: u8,
    pub evidence: String,
    /// Current pattern weight that produced this reason, or 1.0 when not
    /// pattern-derived (feed/reputation/community hits).
    pub weight: f32,
}

impl Reason {
    pub fn new(
        title: impl Into<String>,
        kind: ReasonKind,
        severity_contribution: u8,
        evidence: impl Into<String>,
        weight: f32,
    ) -> Self {
        Self {
            title: title.into(),
            kind,
            severity_contribution,
            evidence: evidence.into(),
            weight,
        }
    }
}

/// Downstream-UI-facing action recommendation. Ordered so it can live in a
/// `BTreeSet` and serialize deterministically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ActionKind {
    Quarantine,
    BlockSender,
    Report,
    Educate,
    Ignore,
    VerifyOutOfBand,
}

/// Disjoint, deduplicated, order-preserving IOC lists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractedIocs {
    pub ipv4: Vec<String>,
    pub ipv6: Vec<String>,
    pub domains: Vec<String>,
    pub urls: Vec<String>,
    pub md5: Vec<String>,
    pub sha256: Vec<String>,
    pub emails: Vec<String>,
}

impl ExtractedIocs {
    pub fn is_empty(&self) -> bool {
        self.ipv4.is_empty()
            && self.ipv6.is_empty()
            && self.domains.is_empty()
            && self.urls.is_empty()
            && self.md5.is_empty()
            && self.sha256.is_empty()
            && self.emails.is_empty()
    }
}

/// The uniform output of every `analyze_*` operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskResult {
    pub score: u8,
    pub severity: Severity,
    pub confidence: f32,
    pub reasons: Vec<Reason>,
    pub recommended_actions: BTreeSet<ActionKind>,
    pub explain_plain: String,
    pub iocs: ExtractedIocs,
}

impl RiskResult {
    /// A reason-less, low-severity result — the safe fallback for
    /// programmer errors and degraded inputs. Never fabricates confidence.
    pub fn benign() -> Self {
        Self {
            score: 0,
            severity: Severity::Low,
            confidence: 0.0,
            reasons: Vec::new(),
            recommended_actions: BTreeSet::from([ActionKind::Ignore]),
            explain_plain: "No indicators of risk were found.".to_string(),
            iocs: ExtractedIocs::default(),
        }
    }

    /// The internal-inconsistency fallback: safest possible result, never
    /// a panic, for a state an analyzer believes cannot occur.
    pub fn internal_inconsistency() -> Self {
        Self {
            score: 0,
            severity: Severity::Low,
            confidence: 0.0,
            reasons: vec![Reason::new(
                "Internal inconsistency",
                ReasonKind::Behavior,
                0,
                "an internal invariant was violated and analysis was aborted safely",
                1.0,
            )],
            recommended_actions: BTreeSet::from([ActionKind::Ignore]),
            explain_plain: "Unable to complete analysis; treating as low risk.".to_string(),
            iocs: ExtractedIocs::default(),
        }
    }
}

/// Per-phone trust and report counters. `report_count` is always
/// `scam_reports + safe_reports`; enforced by the store, not here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhoneReputation {
    pub id: String,
    pub trust: i8,
    pub scam_reports: u32,
    pub safe_reports: u32,
    pub blocked: bool,
    pub last_reported_ms: i64,
}

impl PhoneReputation {
    pub fn report_count(&self) -> u32 {
        self.scam_reports + self.safe_reports
    }
}

/// Per-domain trust and report counters, keyed by registrable domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainReputation {
    pub id: String,
    pub trust: i8,
    pub scam_reports: u32,
    pub safe_reports: u32,
    pub blocked: bool,
    pub last_reported_ms: i64,
    pub category: Option<String>,
}

impl DomainReputation {
    pub fn report_count(&self) -> u32 {
        self.scam_reports + self.safe_reports
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportKind {
    Phone,
    Domain,
}

/// A hashed, deduplicated community report. The raw identifier is never
/// stored — only `hash = SHA-256(normalized_identifier)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommunityReport {
    pub hash: String,
    pub kind: ReportKind,
    pub severity: u8,
    pub report_count: u32,
    pub first_seen_ms: i64,
    pub last_seen_ms: i64,
    pub region: Option<String>,
}

/// A result of consulting the community-report store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreatReport {
    pub severity: u8,
    pub report_count: u32,
    pub evidence: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PatternKind {
    Text,
    Url,
    Phone,
}

/// A seeded or learned pattern with its adaptive weight and accuracy stats.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternWeight {
    pub pattern_id: String,
    pub pattern: String,
    pub kind: PatternKind,
    pub threat_type: String,
    pub weight: f32,
    pub tp_count: u32,
    pub fp_count: u32,
    pub last_updated_ms: i64,
}

impl PatternWeight {
    pub fn fp_rate(&self) -> f32 {
        let total = self.tp_count + self.fp_count;
        if total == 0 {
            0.0
        } else {
            self.fp_count as f32 / total as f32
        }
    }

    pub fn accuracy(&self) -> f32 {
        let total = self.tp_count + self.fp_count;
        if total == 0 {
            0.0
        } else {
            self.tp_count as f32 / total as f32
        }
    }
}

/// An auto-discovered text n-gram or URL signature, grown only by positive
/// feedback from its `weight = 0.5` starting point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearnedPattern {
    pub signature: String,
    pub threat_type: String,
    pub confidence: f32,
    pub occurrences: u32,
}

/// A single finding from an external antivirus engine, wrapped as-is into
/// the file analyzer's evidence. The engine itself is out of scope;
/// this is the opaque hand-off shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Indicator {
    pub label: String,
    pub detail: String,
}

/// The pre-computed result of an external AV scan, handed to the file
/// analyzer to be wrapped into a `RiskResult`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileScanSignal {
    pub infected: bool,
    pub threat_name: Option<String>,
    pub indicators: Vec<Indicator>,
}
