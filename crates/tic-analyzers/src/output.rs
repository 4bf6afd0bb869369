//! The shape every analyzer produces before it reaches the aggregator:
//! raw reasons, an unweighted base score, and the pattern ids that
//! contributed — the aggregator is the only place `adjust_score` runs, so
//! analyzers that fold a nested analyzer's output (text folding in its
//! URLs) never apply pattern weighting twice.

use tic_common::Reason;

#[derive(Debug, Clone, Default)]
pub struct AnalyzerOutput {
    pub reasons: Vec<Reason>,
    pub base_score: u8,
    pub matched_pattern_ids: Vec<String>,
}

impl AnalyzerOutput {
    pub fn push_reason(&mut self, reason: Reason) {
        self.base_score = self.base_score.saturating_add(reason.severity_contribution).min(100);
        self.reasons.push(reason);
    }

    pub fn fold(&mut self, mut other: AnalyzerOutput) {
        self.reasons.append(&mut other.reasons);
        self.matched_pattern_ids.append(&mut other.matched_pattern_ids);
        self.base_score = self.base_score.saturating_add(other.base_score).min(100);
    }
}
