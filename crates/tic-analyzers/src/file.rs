//! File analyzer: the AV engine itself is out of scope — this
//! wraps its pre-computed `FileScanSignal` into reasons. An infected file
//! is treated as terminal at a fixed score; a clean signal with
//! indicators still present (e.g. a heuristic near-miss) contributes a
//! smaller amount per indicator instead of being silently dropped.

use tic_common::{FileScanSignal, Reason, ReasonKind};

use crate::output::AnalyzerOutput;

pub const INFECTED_SCORE: u8 = 95;
const UNCONFIRMED_INDICATOR_CONTRIBUTION: u8 = 10;

pub fn analyze_file_signal(signal: &FileScanSignal) -> AnalyzerOutput {
    let mut output = AnalyzerOutput::default();

    if signal.infected {
        let threat_name = signal.threat_name.clone().unwrap_or_else(|| "unknown".to_string());
        output.push_reason(Reason::new(
            "File is infected",
            ReasonKind::Behavior,
            INFECTED_SCORE,
            threat_name,
            1.0,
        ));
        for indicator in &signal.indicators {
            output.reasons.push(Reason::new(
                indicator.label.clone(),
                ReasonKind::Behavior,
                0,
                indicator.detail.clone(),
                1.0,
            ));
        }
        return output;
    }

    for indicator in &signal.indicators {
        output.push_reason(Reason::new(
            indicator.label.clone(),
            ReasonKind::Behavior,
            UNCONFIRMED_INDICATOR_CONTRIBUTION,
            indicator.detail.clone(),
            1.0,
        ));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infected_file_scores_at_the_fixed_ceiling() {
        let signal = FileScanSignal {
            infected: true,
            threat_name: Some("Trojan.Generic".to_string()),
            indicators: vec![],
        };
        let output = analyze_file_signal(&signal);
        assert_eq!(output.base_score, INFECTED_SCORE);
    }

    #[test]
    fn clean_signal_with_no_indicators_is_benign() {
        let signal = FileScanSignal {
            infected: false,
            threat_name: None,
            indicators: vec![],
        };
        let output = analyze_file_signal(&signal);
        assert!(output.reasons.is_empty());
        assert_eq!(output.base_score, 0);
    }
}
