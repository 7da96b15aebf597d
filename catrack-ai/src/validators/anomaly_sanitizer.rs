// Anomaly Sanitizer - Severity Coercion and Evidence Corroboration

use crate::types::{Anomaly, RawAnomaly, Severity};

/// Repair untrusted anomalies instead of dropping them.
///
/// Total over its input: every raw anomaly yields exactly one sanitized
/// anomaly, and this never fails. Dropping an entry would silently hide a
/// safety-relevant finding.
///
/// Two independent, order-commutative rules per anomaly:
/// 1. A severity outside {Critical, Moderate, Low} is coerced to `Low`
///    with `technician_review_required` forced on — an unparseable
///    severity must never silently escalate or de-escalate.
/// 2. Without a submitted image, `evidence_backed` is forced off
///    regardless of the service's claim.
pub fn sanitize_anomalies(raw: Vec<RawAnomaly>, image_submitted: bool) -> Vec<Anomaly> {
    raw.into_iter()
        .map(|anomaly| sanitize_anomaly(anomaly, image_submitted))
        .collect()
}

fn sanitize_anomaly(raw: RawAnomaly, image_submitted: bool) -> Anomaly {
    let (severity, severity_repaired) = match Severity::parse(&raw.severity) {
        Some(severity) => (severity, false),
        None => {
            tracing::warn!(
                severity = %raw.severity,
                component = %raw.component,
                "Out-of-enum severity coerced to Low, review forced"
            );
            (Severity::Low, true)
        }
    };

    Anomaly {
        component: raw.component,
        location: raw.location,
        issue: raw.issue,
        description: raw.description,
        recommended_action: raw.recommended_action,
        severity,
        evidence_backed: raw.evidence_backed && image_submitted,
        technician_review_required: raw.technician_review_required || severity_repaired,
        is_global_safety_override: raw.is_global_safety_override,
        segment_mismatch_flag: raw.segment_mismatch_flag,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(severity: &str) -> RawAnomaly {
        RawAnomaly {
            component: "Final Drive".to_string(),
            location: "Left rear".to_string(),
            issue: "Oil seep".to_string(),
            description: "Oil film around the duo-cone seal".to_string(),
            recommended_action: "Clean and re-check after next shift".to_string(),
            severity: severity.to_string(),
            evidence_backed: false,
            technician_review_required: false,
            is_global_safety_override: false,
            segment_mismatch_flag: false,
        }
    }

    /// Round-trip a sanitized anomaly back to wire form so sanitize can be
    /// applied to its own output.
    fn to_raw(a: &Anomaly) -> RawAnomaly {
        RawAnomaly {
            component: a.component.clone(),
            location: a.location.clone(),
            issue: a.issue.clone(),
            description: a.description.clone(),
            recommended_action: a.recommended_action.clone(),
            severity: a.severity.as_str().to_string(),
            evidence_backed: a.evidence_backed,
            technician_review_required: a.technician_review_required,
            is_global_safety_override: a.is_global_safety_override,
            segment_mismatch_flag: a.segment_mismatch_flag,
        }
    }

    #[test]
    fn test_valid_severity_passes_through() {
        let out = sanitize_anomalies(vec![raw("Critical")], true);
        assert_eq!(out[0].severity, Severity::Critical);
        assert!(!out[0].technician_review_required);
    }

    #[test]
    fn test_out_of_enum_severity_coerced_to_low_with_review() {
        for bogus in ["BOGUS", "critical", "Normal", "ASAP", ""] {
            let out = sanitize_anomalies(vec![raw(bogus)], true);
            assert_eq!(out[0].severity, Severity::Low, "severity '{}'", bogus);
            assert!(out[0].technician_review_required, "severity '{}'", bogus);
        }
    }

    #[test]
    fn test_no_image_forces_evidence_backed_false() {
        let mut input = raw("Moderate");
        input.evidence_backed = true;

        let out = sanitize_anomalies(vec![input], false);
        assert!(!out[0].evidence_backed);
    }

    #[test]
    fn test_image_submitted_keeps_evidence_claim() {
        let mut input = raw("Moderate");
        input.evidence_backed = true;

        let out = sanitize_anomalies(vec![input], true);
        assert!(out[0].evidence_backed);
    }

    #[test]
    fn test_existing_review_flag_is_never_cleared() {
        let mut input = raw("Low");
        input.technician_review_required = true;

        let out = sanitize_anomalies(vec![input], true);
        assert!(out[0].technician_review_required);
    }

    #[test]
    fn test_every_input_yields_exactly_one_output() {
        let out = sanitize_anomalies(vec![raw("Critical"), raw("???"), raw("Low")], false);
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let mut bogus = raw("BOGUS");
        bogus.evidence_backed = true;
        let inputs = vec![raw("Critical"), bogus, raw("Low")];

        for image_submitted in [false, true] {
            let once = sanitize_anomalies(inputs.clone(), image_submitted);
            let twice = sanitize_anomalies(
                once.iter().map(to_raw).collect(),
                image_submitted,
            );
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_bogus_severity_without_image() {
        // Single item, severity "BOGUS", evidence claimed, no image sent
        let mut input = raw("BOGUS");
        input.evidence_backed = true;

        let out = sanitize_anomalies(vec![input], false);
        assert_eq!(out[0].severity, Severity::Low);
        assert!(!out[0].evidence_backed);
        assert!(out[0].technician_review_required);
    }
}
