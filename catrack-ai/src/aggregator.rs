// Result Aggregator - Session-wide Verdict Projection

use crate::types::{
    AggregateVerdict, Anomaly, ExtractionResult, PreliminaryStatus, Severity,
};

/// Derive one item's own status signal from its sanitized anomalies.
///
/// STOP if any anomaly is Critical, CAUTION if any is Moderate and none is
/// Critical, GO otherwise.
pub fn item_status(anomalies: &[Anomaly]) -> PreliminaryStatus {
    let mut status = PreliminaryStatus::Go;
    for anomaly in anomalies {
        match anomaly.severity {
            Severity::Critical => return PreliminaryStatus::Stop,
            Severity::Moderate => status = PreliminaryStatus::Caution,
            Severity::Low => {}
        }
    }
    status
}

/// Project the session verdict from every per-item result gathered so far.
///
/// Pure, idempotent, and order-independent over the input set. The
/// preliminary status is the maximum of the per-item signals in the
/// STOP > CAUTION > GO order, so adding an item can only raise it until
/// the session is reset.
///
/// A global-safety-override finding counts as a critical override no
/// matter which segment it was detected in: an off-segment hazard must
/// not be down-weighted. A segment mismatch alone forces technician
/// review, not the override.
pub fn aggregate<'a, I>(results: I) -> AggregateVerdict
where
    I: IntoIterator<Item = &'a ExtractionResult>,
{
    let mut verdict = AggregateVerdict {
        preliminary_status: PreliminaryStatus::Go,
        has_critical_override: false,
        technician_review_required: false,
    };

    for result in results {
        verdict.preliminary_status = verdict
            .preliminary_status
            .max(item_status(&result.anomalies));

        for anomaly in &result.anomalies {
            if anomaly.severity == Severity::Critical || anomaly.is_global_safety_override {
                verdict.has_critical_override = true;
            }
            if anomaly.technician_review_required || anomaly.segment_mismatch_flag {
                verdict.technician_review_required = true;
            }
        }
    }

    verdict
}
