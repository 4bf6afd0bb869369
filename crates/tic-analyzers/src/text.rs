//! Text analyzer: scans for urgency/OTP/impersonation/payment/
//! remote-access language, checks the community store's scam-message
//! templates, and dispatches every URL embedded in the text (capped at 5,
//! to bound fan-out) and the sender identifier, if given, to their own
//! analyzers — folding the results in rather than re-deriving them.

use tic_common::{CancelToken, PatternKind, Reason, ReasonKind, TicConfig};
use tic_ioc::extract;

use crate::deps::AnalyzerDeps;
use crate::output::AnalyzerOutput;
use crate::phone::analyze_phone_signal;
use crate::url::analyze_url_signal;

const MAX_URLS_PER_TEXT: usize = 5;
const TEMPLATE_CONTRIBUTION_CAP: u8 = 85;

fn contribution_for(threat_type: &str) -> (&'static str, ReasonKind, u8) {
    match threat_type {
        "urgency" => ("Urgency language detected", ReasonKind::Urgency, 15),
        "otp" => ("Requests a one-time passcode", ReasonKind::Otp, 25),
        "impersonation" => ("Impersonates a trusted institution", ReasonKind::Impersonation, 25),
        "payment" => ("Payment-pressure language detected", ReasonKind::Payment, 30),
        "remote_access" => ("Requests remote-access tooling", ReasonKind::RemoteAccess, 30),
        _ => ("Matches a known scam pattern", ReasonKind::TextPattern, 15),
    }
}

pub async fn analyze_text_signal(
    text: &str,
    sender: Option<&str>,
    deps: &AnalyzerDeps,
    cfg: &TicConfig,
    cancel: &CancelToken,
) -> AnalyzerOutput {
    let mut output = AnalyzerOutput::default();

    for pattern_id in deps.patterns.matching(PatternKind::Text, text) {
        let Some(pattern) = deps.patterns.get(&pattern_id) else {
            continue;
        };
        let (title, kind, contribution) = contribution_for(&pattern.threat_type);
        output.push_reason(Reason::new(title, kind, contribution, pattern.pattern.clone(), pattern.weight));
        output.matched_pattern_ids.push(pattern_id);
    }

    if let Some(report) = deps.community.check_message_template(text) {
        output.push_reason(Reason::new(
            "Matches known scam message template",
            ReasonKind::Community,
            report.severity.min(TEMPLATE_CONTRIBUTION_CAP),
            report.evidence,
            1.0,
        ));
    }

    let iocs = extract(text, cfg.ioc_text_cap);
    for url in iocs.urls.iter().take(MAX_URLS_PER_TEXT) {
        let nested = analyze_url_signal(url, deps, cfg, cancel).await;
        if !nested.reasons.is_empty() {
            output.push_reason(Reason::new(
                "Message contains a suspicious URL",
                ReasonKind::Url,
                0,
                url.clone(),
                1.0,
            ));
        }
        output.fold(nested);
    }

    if let Some(sender) = sender {
        let nested = analyze_phone_signal(sender, true, deps, cfg).await;
        output.fold(nested);
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_known_categories_to_expected_reason_kinds() {
        assert!(matches!(contribution_for("urgency"), (_, ReasonKind::Urgency, _)));
        assert!(matches!(contribution_for("otp"), (_, ReasonKind::Otp, _)));
        assert!(matches!(contribution_for("payment"), (_, ReasonKind::Payment, _)));
        assert!(matches!(contribution_for("remote_access"), (_, ReasonKind::RemoteAccess, _)));
    }
}
