//! Extraction gateway client
//!
//! HTTP client for the remote inference gateway. Owns the deadline and
//! bounded-retry semantics of the network boundary and enforces the
//! response envelope schema; anomaly content is the sanitizer's business,
//! never interpreted here.
//!
//! The extraction call is long-running (the gateway fans out to speech,
//! vision, and adapter models), so it gets a deadline on the order of
//! minutes; the health probe and the post-review calls are quick and get
//! seconds.

use crate::config::ClientConfig;
use crate::encoder;
use crate::error::ExtractError;
use crate::types::{ExtractResponse, ExtractionResult, InspectionCategory, RawExtractResponse};
use crate::validators::validate_extract_response;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

const USER_AGENT: &str = "CATrack/0.1.0 (field inspection client)";

/// Bytes of an upstream error body kept for diagnostics. Error bodies are
/// advisory free text and are never machine-parsed beyond the status code.
const ERROR_BODY_LIMIT: usize = 300;

/// Bounded retry policy for recoverable upstream statuses
///
/// Declarative (attempt budget plus retryable-status set) so the policy is
/// testable without a live endpoint and extensible without touching the
/// request loop.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempt budget, first attempt included
    pub max_attempts: u32,
    /// Upstream statuses worth another attempt
    pub retryable_statuses: Vec<u16>,
}

impl Default for RetryPolicy {
    /// One retry, on 502/504 only.
    fn default() -> Self {
        Self {
            max_attempts: 2,
            retryable_statuses: vec![502, 504],
        }
    }
}

impl RetryPolicy {
    pub fn is_retryable_status(&self, status: u16) -> bool {
        self.retryable_statuses.contains(&status)
    }

    /// Whether to reissue the request after `attempt` attempts ended with
    /// `status`.
    pub fn should_retry(&self, status: u16, attempt: u32) -> bool {
        self.is_retryable_status(status) && attempt < self.max_attempts
    }
}

/// Extraction request body
#[derive(Debug, Serialize)]
struct ExtractRequest<'a> {
    audio_b64: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_b64: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    job_id: Option<&'a str>,
    category: &'a str,
}

#[derive(Debug, Serialize)]
struct SynthesizeRequest<'a> {
    verified_json: &'a serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    job_id: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct TranscribeRequest<'a> {
    audio_b64: &'a str,
}

#[derive(Debug, Deserialize)]
struct TranscribeResponse {
    transcript: String,
}

/// Health probe response
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HealthStatus {
    pub status: String,
    pub adapter_available: bool,
    pub version: Option<String>,
}

impl HealthStatus {
    /// The endpoint is healthy only when the gateway answers "ok" AND the
    /// classifier adapter is loaded.
    pub fn is_healthy(&self) -> bool {
        self.status == "ok" && self.adapter_available
    }
}

/// Stage-3 synthesis output: the foreman-ready report text
#[derive(Debug, Clone, Deserialize)]
pub struct SynthesisReport {
    pub report: String,
    #[serde(default)]
    pub job_id: Option<String>,
}

/// Client for the CATrack inference gateway
pub struct ExtractionClient {
    http_client: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
    extract_timeout: Duration,
    probe_timeout: Duration,
    synthesis_timeout: Duration,
}

impl ExtractionClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ExtractError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ExtractError::Transport(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            retry: RetryPolicy::default(),
            extract_timeout: config.extract_timeout,
            probe_timeout: config.probe_timeout,
            synthesis_timeout: config.synthesis_timeout,
        })
    }

    /// Replace the retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Full single-item inspection: encode the local evidence, call the
    /// service, sanitize the findings.
    pub async fn run_inspection(
        &self,
        audio_ref: &str,
        image_ref: Option<&str>,
        job_id: Option<&str>,
        category: InspectionCategory,
    ) -> Result<ExtractionResult, ExtractError> {
        let audio_b64 = encoder::encode_audio(audio_ref).await?;
        let image_b64 = encoder::encode_image(image_ref).await?;
        let image_submitted = image_b64.is_some();

        let response = self
            .extract(&audio_b64, image_b64.as_deref(), job_id, category)
            .await?;

        Ok(response.into_result(image_submitted))
    }

    /// Submit encoded evidence for extraction.
    ///
    /// Applies the extraction deadline and the bounded retry: 502/504 get
    /// exactly one more attempt, issued only after the first attempt's
    /// outcome is fully observed; every other failure surfaces
    /// immediately. A local deadline expiry is a `Timeout`, never retried.
    pub async fn extract(
        &self,
        audio_b64: &str,
        image_b64: Option<&str>,
        job_id: Option<&str>,
        category: InspectionCategory,
    ) -> Result<ExtractResponse, ExtractError> {
        if audio_b64.trim().is_empty() {
            return Err(ExtractError::InvalidInput(
                "audio payload is empty".to_string(),
            ));
        }

        let url = format!("{}/extract", self.base_url);
        let request = ExtractRequest {
            audio_b64,
            image_b64,
            job_id,
            category: category.as_str(),
        };

        debug!(
            url = %url,
            category = %category,
            has_image = image_b64.is_some(),
            "Submitting extraction request"
        );

        let mut attempt = 0u32;
        loop {
            attempt += 1;
            if attempt > 1 {
                debug!(url = %url, attempt, "Retrying extraction request");
            }

            match self.send_extract(&url, &request).await {
                Ok(response) => {
                    info!(
                        status = ?response.summary.status,
                        anomalies = response.anomalies.len(),
                        attempt,
                        "Extraction completed"
                    );
                    return Ok(response);
                }
                Err(ExtractError::Transient { status, .. })
                    if self.retry.should_retry(status, attempt) =>
                {
                    warn!(status, attempt, "Recoverable upstream status, retrying");
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn send_extract(
        &self,
        url: &str,
        request: &ExtractRequest<'_>,
    ) -> Result<ExtractResponse, ExtractError> {
        let response = self
            .http_client
            .post(url)
            .timeout(self.extract_timeout)
            .json(request)
            .send()
            .await
            .map_err(classify_send_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = truncate_body(response.text().await.unwrap_or_default());
            let status = status.as_u16();
            return Err(if self.retry.is_retryable_status(status) {
                ExtractError::Transient { status, body }
            } else {
                ExtractError::Terminal { status, body }
            });
        }

        let raw: RawExtractResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                ExtractError::Timeout
            } else {
                ExtractError::ContractViolation(format!("undecodable body: {}", e))
            }
        })?;

        validate_extract_response(raw)
    }

    /// Probe gateway liveness and adapter availability.
    pub async fn health(&self) -> Result<HealthStatus, ExtractError> {
        let url = format!("{}/health", self.base_url);
        debug!(url = %url, "Probing service health");

        let response = self
            .http_client
            .get(&url)
            .timeout(self.probe_timeout)
            .send()
            .await
            .map_err(classify_send_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = truncate_body(response.text().await.unwrap_or_default());
            return Err(ExtractError::Terminal {
                status: status.as_u16(),
                body,
            });
        }

        response.json::<HealthStatus>().await.map_err(|e| {
            ExtractError::ContractViolation(format!("undecodable health body: {}", e))
        })
    }

    /// Generate the final report from a human-reviewed result.
    ///
    /// Call this only after review; the gateway turns the verified JSON
    /// into a paragraph-style report.
    pub async fn synthesize(
        &self,
        verified_json: &serde_json::Value,
        job_id: Option<&str>,
    ) -> Result<SynthesisReport, ExtractError> {
        let url = format!("{}/synthesize", self.base_url);
        let request = SynthesizeRequest {
            verified_json,
            job_id,
        };

        let response = self
            .http_client
            .post(&url)
            .timeout(self.synthesis_timeout)
            .json(&request)
            .send()
            .await
            .map_err(classify_send_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = truncate_body(response.text().await.unwrap_or_default());
            return Err(ExtractError::Terminal {
                status: status.as_u16(),
                body,
            });
        }

        let report: SynthesisReport = response.json().await.map_err(|e| {
            if e.is_timeout() {
                ExtractError::Timeout
            } else {
                ExtractError::ContractViolation(format!("undecodable report body: {}", e))
            }
        })?;

        info!(report_bytes = report.report.len(), "Synthesis completed");
        Ok(report)
    }

    /// Transcribe a voice note without running extraction.
    pub async fn transcribe(&self, audio_b64: &str) -> Result<String, ExtractError> {
        if audio_b64.trim().is_empty() {
            return Err(ExtractError::InvalidInput(
                "audio payload is empty".to_string(),
            ));
        }

        let url = format!("{}/transcribe", self.base_url);
        let response = self
            .http_client
            .post(&url)
            .timeout(self.synthesis_timeout)
            .json(&TranscribeRequest { audio_b64 })
            .send()
            .await
            .map_err(classify_send_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = truncate_body(response.text().await.unwrap_or_default());
            return Err(ExtractError::Terminal {
                status: status.as_u16(),
                body,
            });
        }

        let body: TranscribeResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                ExtractError::Timeout
            } else {
                ExtractError::ContractViolation(format!("undecodable transcript body: {}", e))
            }
        })?;

        Ok(body.transcript)
    }
}

/// Classify a send-level failure: deadline expiry (the in-flight call is
/// aborted and the timer released) vs no response reaching us at all.
fn classify_send_error(err: reqwest::Error) -> ExtractError {
    if err.is_timeout() {
        ExtractError::Timeout
    } else {
        ExtractError::Transport(err.to_string())
    }
}

fn truncate_body(body: String) -> String {
    if body.len() <= ERROR_BODY_LIMIT {
        return body;
    }
    body.chars().take(ERROR_BODY_LIMIT).collect()
}
