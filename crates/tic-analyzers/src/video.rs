//! Video-signal analyzer: the ML model is an external signal
//! producer — this maps the numeric feature tuple it hands
//! back onto reasons and a base score. Purely a function of its three
//! inputs; no store lookups, no patterns.

use tic_common::{Reason, ReasonKind};

use crate::output::AnalyzerOutput;

const FACE_CONSISTENCY_THRESHOLD: f32 = 0.8;
const FACE_CONSISTENCY_SCALE: f32 = 60.0;
const TEMPORAL_ANOMALY_STEP: u8 = 8;
const TEMPORAL_ANOMALY_CAP: u32 = 5;
const LIP_SYNC_THRESHOLD: f32 = 0.3;
const LIP_SYNC_SCALE: f32 = 50.0;

pub fn analyze_video_signal(
    face_consistency: f32,
    temporal_anomalies: u32,
    lip_sync_error: f32,
) -> AnalyzerOutput {
    let mut output = AnalyzerOutput::default();
    let face_consistency = face_consistency.clamp(0.0, 1.0);
    let lip_sync_error = lip_sync_error.clamp(0.0, 1.0);

    if face_consistency < FACE_CONSISTENCY_THRESHOLD {
        let contribution = ((1.0 - face_consistency) * FACE_CONSISTENCY_SCALE).round() as u8;
        output.push_reason(Reason::new(
            "Low facial consistency across frames",
            ReasonKind::Deepfake,
            contribution,
            format!("face_consistency={face_consistency:.2}"),
            1.0,
        ));
    }

    if temporal_anomalies > 0 {
        let contribution = (temporal_anomalies.min(TEMPORAL_ANOMALY_CAP) as u8) * TEMPORAL_ANOMALY_STEP;
        output.push_reason(Reason::new(
            "Temporal anomalies detected across frames",
            ReasonKind::Deepfake,
            contribution,
            format!("temporal_anomalies={temporal_anomalies}"),
            1.0,
        ));
    }

    if lip_sync_error > LIP_SYNC_THRESHOLD {
        let contribution = (lip_sync_error * LIP_SYNC_SCALE).round() as u8;
        output.push_reason(Reason::new(
            "Lip-sync mismatch detected",
            ReasonKind::Deepfake,
            contribution,
            format!("lip_sync_error={lip_sync_error:.2}"),
            1.0,
        ));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_signal_yields_no_reasons() {
        let output = analyze_video_signal(0.95, 0, 0.05);
        assert!(output.reasons.is_empty());
        assert_eq!(output.base_score, 0);
    }

    #[test]
    fn low_consistency_and_lip_sync_error_both_contribute() {
        let output = analyze_video_signal(0.2, 3, 0.8);
        assert_eq!(output.reasons.len(), 3);
        assert!(output.base_score > 0);
    }
}
