//! Risk Aggregator: the one place pattern weighting, severity
//! banding, confidence, and recommended actions are computed. Every
//! `analyze_*` entry point in this crate funnels its analyzer's raw
//! `AnalyzerOutput` through `aggregate` exactly once.

use std::collections::BTreeSet;
use tic_analyzers::AnalyzerOutput;
use tic_common::{ActionKind, ExtractedIocs, ReasonKind, RiskResult, Severity};
use tic_patterns::PatternRegistry;

const CONFIDENCE_FLOOR: f32 = 0.3;
const CONFIDENCE_CEILING: f32 = 0.95;
const CONFIDENCE_SATURATION_REASONS: usize = 4;

pub fn aggregate(output: AnalyzerOutput, iocs: ExtractedIocs, patterns: &PatternRegistry) -> RiskResult {
    let score = patterns.adjust_score(output.base_score, &output.matched_pattern_ids);
    let severity = Severity::band(score);
    let confidence = confidence_for(output.reasons.len());
    let recommended_actions = recommended_actions(severity, &output.reasons);
    let explain_plain = explain(&output.reasons);

    RiskResult {
        score,
        severity,
        confidence,
        reasons: output.reasons,
        recommended_actions,
        explain_plain,
        iocs,
    }
}

/// `reasons.len()==0 ⇒ score<25` is guaranteed upstream (no reasons means
/// no score contribution and `adjust_score` of 0 stays 0), so confidence
/// only needs to define the non-empty case. Linear ramp from the floor at
/// one reason to the ceiling at the saturation point.
fn confidence_for(reason_count: usize) -> f32 {
    if reason_count == 0 {
        return 0.0;
    }
    let capped = reason_count.min(CONFIDENCE_SATURATION_REASONS) as f32;
    let step = (CONFIDENCE_CEILING - CONFIDENCE_FLOOR) / (CONFIDENCE_SATURATION_REASONS - 1) as f32;
    (CONFIDENCE_FLOOR + step * (capped - 1.0)).min(CONFIDENCE_CEILING)
}

fn recommended_actions(severity: Severity, reasons: &[tic_common::Reason]) -> BTreeSet<ActionKind> {
    let mut actions = BTreeSet::new();
    match severity {
        Severity::Critical => {
            actions.insert(ActionKind::BlockSender);
            actions.insert(ActionKind::Report);
        }
        Severity::High => {
            actions.insert(ActionKind::Report);
            actions.insert(ActionKind::Educate);
        }
        Severity::Medium => {
            actions.insert(ActionKind::Educate);
        }
        Severity::Low => {
            actions.insert(ActionKind::Ignore);
        }
    }
    if reasons.iter().any(|r| r.kind == ReasonKind::Deepfake) {
        actions.insert(ActionKind::VerifyOutOfBand);
    }
    actions
}

/// Deterministic, locale-insensitive explanation built from the top 1-2
/// reasons by severity contribution.
fn explain(reasons: &[tic_common::Reason]) -> String {
    if reasons.is_empty() {
        return "No indicators of risk were found.".to_string();
    }
    let mut sorted: Vec<&tic_common::Reason> = reasons.iter().collect();
    sorted.sort_by(|a, b| b.severity_contribution.cmp(&a.severity_contribution));
    let top: Vec<String> = sorted.iter().take(2).map(|r| r.title.clone()).collect();
    format!("Flagged for: {}.", top.join(" and "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_floor_and_ceiling() {
        assert_eq!(confidence_for(0), 0.0);
        assert_eq!(confidence_for(1), CONFIDENCE_FLOOR);
        assert_eq!(confidence_for(4), CONFIDENCE_CEILING);
        assert_eq!(confidence_for(10), CONFIDENCE_CEILING);
    }

    #[test]
    fn confidence_is_monotone_non_decreasing() {
        let values: Vec<f32> = (0..=6).map(confidence_for).collect();
        for window in values.windows(2) {
            assert!(window[1] >= window[0]);
        }
    }

    #[test]
    fn empty_reasons_explain_as_no_risk() {
        assert_eq!(explain(&[]), "No indicators of risk were found.");
    }
}
