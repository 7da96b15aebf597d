// Extraction Response Envelope Validation

use crate::error::ExtractError;
use crate::types::{ExtractResponse, InspectionSummary, ItemStatus, RawExtractResponse};

/// Enforce the extraction response schema.
///
/// A 2xx body missing its summary or its anomalies array is a server
/// defect and is surfaced as `ContractViolation`, never defaulted away.
/// The same goes for a summary status outside pass/monitor/fail; item
/// status has no repair rule and never feeds the aggregate verdict.
pub fn validate_extract_response(raw: RawExtractResponse) -> Result<ExtractResponse, ExtractError> {
    let output = raw.inspection_output.ok_or_else(|| {
        ExtractError::ContractViolation("missing inspection_output".to_string())
    })?;

    let summary = output.inspection_summary.ok_or_else(|| {
        ExtractError::ContractViolation("missing inspection_summary".to_string())
    })?;

    let anomalies = output
        .anomalies
        .ok_or_else(|| ExtractError::ContractViolation("missing anomalies".to_string()))?;

    let status: ItemStatus = summary
        .status
        .parse()
        .map_err(ExtractError::ContractViolation)?;

    Ok(ExtractResponse {
        summary: InspectionSummary {
            asset: summary.asset,
            status,
            operational_impact: summary.overall_operational_impact,
        },
        anomalies,
        job_id: raw.job_id,
        context_path: raw.context_path,
    })
}
