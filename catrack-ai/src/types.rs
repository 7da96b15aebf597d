//! Core types for CATrack inspections
//!
//! Domain types (post-sanitization, trusted) and wire types (as received
//! from the inference gateway, untrusted). Wire types deserialize
//! leniently; the validators module decides what is repairable and what
//! is a contract violation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Enumerations
// ============================================================================

/// Anomaly severity
///
/// The wire contract allows exactly these three strings. Anything else is
/// repaired by the sanitizer, never trusted and never a crash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Critical,
    Moderate,
    Low,
}

impl Severity {
    /// Parse an exact wire string; `None` for anything outside the enum.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Critical" => Some(Severity::Critical),
            "Moderate" => Some(Severity::Moderate),
            "Low" => Some(Severity::Low),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::Moderate => "Moderate",
            Severity::Low => "Low",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-item inspection status reported by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Pass,
    Monitor,
    Fail,
}

impl FromStr for ItemStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pass" => Ok(ItemStatus::Pass),
            "monitor" => Ok(ItemStatus::Monitor),
            "fail" => Ok(ItemStatus::Fail),
            other => Err(format!("unknown inspection status '{}'", other)),
        }
    }
}

/// Session-level verdict, ordered GO < CAUTION < STOP
///
/// The derived `Ord` follows declaration order, so taking the maximum
/// across items can only raise the verdict as items are added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PreliminaryStatus {
    Go,
    Caution,
    Stop,
}

impl PreliminaryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PreliminaryStatus::Go => "GO",
            PreliminaryStatus::Caution => "CAUTION",
            PreliminaryStatus::Stop => "STOP",
        }
    }
}

impl fmt::Display for PreliminaryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Component category routed to a subsection prompt on the service side
///
/// `Auto` defers category detection to the service's image classifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InspectionCategory {
    #[default]
    Auto,
    TiresRims,
    StepsAccess,
    Cooling,
    Hydraulics,
    Structural,
    Engine,
    Undercarriage,
}

impl InspectionCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            InspectionCategory::Auto => "auto",
            InspectionCategory::TiresRims => "tires_rims",
            InspectionCategory::StepsAccess => "steps_access",
            InspectionCategory::Cooling => "cooling",
            InspectionCategory::Hydraulics => "hydraulics",
            InspectionCategory::Structural => "structural",
            InspectionCategory::Engine => "engine",
            InspectionCategory::Undercarriage => "undercarriage",
        }
    }
}

impl FromStr for InspectionCategory {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "auto" => Ok(InspectionCategory::Auto),
            "tires_rims" => Ok(InspectionCategory::TiresRims),
            "steps_access" => Ok(InspectionCategory::StepsAccess),
            "cooling" => Ok(InspectionCategory::Cooling),
            "hydraulics" => Ok(InspectionCategory::Hydraulics),
            "structural" => Ok(InspectionCategory::Structural),
            "engine" => Ok(InspectionCategory::Engine),
            "undercarriage" => Ok(InspectionCategory::Undercarriage),
            other => Err(format!("unknown inspection category '{}'", other)),
        }
    }
}

impl fmt::Display for InspectionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Domain types (sanitized, then immutable)
// ============================================================================

/// One reported condition on an inspected component
///
/// Created by the remote service, repaired once by the sanitizer, then
/// immutable and owned by its item's [`ExtractionResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    pub component: String,
    pub location: String,
    pub issue: String,
    pub description: String,
    pub recommended_action: String,
    pub severity: Severity,
    /// True only when voice and image independently corroborate the finding
    pub evidence_backed: bool,
    /// Forces human confirmation before the finding is trusted
    pub technician_review_required: bool,
    /// Finding represents a universal hazard class, escalated regardless of
    /// the active inspection segment
    pub is_global_safety_override: bool,
    /// Finding was detected outside the active inspection segment
    pub segment_mismatch_flag: bool,
}

/// Per-item inspection summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectionSummary {
    pub asset: String,
    pub status: ItemStatus,
    pub operational_impact: String,
}

/// One item's full outcome: summary, sanitized anomalies, transport metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub summary: InspectionSummary,
    pub anomalies: Vec<Anomaly>,
    pub job_id: Option<String>,
    pub context_path: Option<String>,
}

/// Envelope-validated extraction response, anomalies not yet sanitized
///
/// Produced by the transport layer, which enforces the response schema but
/// never interprets anomaly content.
#[derive(Debug, Clone)]
pub struct ExtractResponse {
    pub summary: InspectionSummary,
    pub anomalies: Vec<RawAnomaly>,
    pub job_id: Option<String>,
    pub context_path: Option<String>,
}

impl ExtractResponse {
    /// Sanitize the anomalies and produce the final per-item result.
    ///
    /// `image_submitted` must reflect whether an image payload was actually
    /// sent with the request; multi-modal corroboration cannot exist
    /// without a second modality.
    pub fn into_result(self, image_submitted: bool) -> ExtractionResult {
        ExtractionResult {
            summary: self.summary,
            anomalies: crate::validators::sanitize_anomalies(self.anomalies, image_submitted),
            job_id: self.job_id,
            context_path: self.context_path,
        }
    }
}

/// Session verdict, recomputed on demand from the per-item result set
///
/// Never persisted: a pure projection has no stale state to reconcile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AggregateVerdict {
    pub preliminary_status: PreliminaryStatus,
    pub has_critical_override: bool,
    pub technician_review_required: bool,
}

// ============================================================================
// Wire types (untrusted)
// ============================================================================

/// One anomaly as received from the service
///
/// Every field defaults so a sparse payload still deserializes; severity
/// stays a free string here because the service cannot be trusted to stay
/// inside the enum. Repair happens in the sanitizer, not here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawAnomaly {
    pub component: String,
    pub location: String,
    pub issue: String,
    pub description: String,
    pub recommended_action: String,
    pub severity: String,
    pub evidence_backed: bool,
    pub technician_review_required: bool,
    pub is_global_safety_override: bool,
    pub segment_mismatch_flag: bool,
}

/// Top-level extraction response body as received
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawExtractResponse {
    pub context_path: Option<String>,
    pub inspection_output: Option<RawInspectionOutput>,
    pub job_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawInspectionOutput {
    pub inspection_summary: Option<RawInspectionSummary>,
    pub anomalies: Option<Vec<RawAnomaly>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawInspectionSummary {
    pub asset: String,
    pub status: String,
    pub overall_operational_impact: String,
}
