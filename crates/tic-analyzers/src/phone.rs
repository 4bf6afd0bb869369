//! Phone analyzer: normalizes to digits-with-optional-`+`, checks
//! reputation and the community store, then applies the
//! seeded structural pattern for an international dialing prefix. A
//! blocked number is terminal — it alone is enough for a CRITICAL result,
//! so nothing else needs to be consulted once that's found.

use tic_common::{PatternKind, Reason, ReasonKind, TicConfig};

use crate::deps::AnalyzerDeps;
use crate::output::AnalyzerOutput;

const BLOCKED_CONTRIBUTION: u8 = 95;
const COMMUNITY_CONTRIBUTION_CAP: u8 = 70;
const INTL_PREFIX_CONTRIBUTION: u8 = 15;

pub fn normalize(number: &str) -> String {
    let digits: String = number.chars().filter(|c| c.is_ascii_digit()).collect();
    if number.trim_start().starts_with('+') {
        format!("+{digits}")
    } else {
        digits
    }
}

pub async fn analyze_phone_signal(
    number: &str,
    _incoming: bool,
    deps: &AnalyzerDeps,
    _cfg: &TicConfig,
) -> AnalyzerOutput {
    let mut output = AnalyzerOutput::default();
    let normalized = normalize(number);

    if let Ok(Some(rep)) = deps.phone_reputation.get(&normalized).await {
        if rep.blocked {
            output.push_reason(Reason::new(
                "Phone number is blocked",
                ReasonKind::Reputation,
                BLOCKED_CONTRIBUTION,
                normalized.clone(),
                1.0,
            ));
            return output;
        }
        if rep.scam_reports > rep.safe_reports {
            let deficiency = 100u8.saturating_sub(rep.trust.clamp(0, 100) as u8);
            let contribution = ((deficiency as f32 * 0.4).round() as u8).min(40);
            output.push_reason(Reason::new(
                "Phone number has more scam reports than safe reports",
                ReasonKind::Reputation,
                contribution,
                format!("trust={} scam={} safe={}", rep.trust, rep.scam_reports, rep.safe_reports),
                1.0,
            ));
        }
    }

    if let Some(report) = deps.community.check_phone(&normalized) {
        output.push_reason(Reason::new(
            "Community-flagged phone number",
            ReasonKind::Community,
            report.severity.min(COMMUNITY_CONTRIBUTION_CAP),
            report.evidence,
            1.0,
        ));
    }

    for pattern_id in deps.patterns.matching(PatternKind::Phone, &normalized) {
        let weight = deps.patterns.get(&pattern_id).map(|p| p.weight).unwrap_or(1.0);
        output.push_reason(Reason::new(
            "International dialing prefix",
            ReasonKind::Phone,
            INTL_PREFIX_CONTRIBUTION,
            normalized.clone(),
            weight,
        ));
        output.matched_pattern_ids.push(pattern_id);
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_keeps_leading_plus() {
        assert_eq!(normalize("+1 (555) 123-4567"), "+15551234567");
    }

    #[test]
    fn normalize_without_plus_is_just_digits() {
        assert_eq!(normalize("555-123-4567"), "5551234567");
    }
}
