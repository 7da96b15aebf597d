//! Media encoding for evidence payloads
//!
//! Turns local evidence references into base64 payloads for the extraction
//! request. A reference is either a filesystem path or a `data:` URI
//! handed over by the recorder layer; data URIs keep their payload with
//! the metadata prefix stripped.
//!
//! Audio is mandatory. A missing, empty, or unreadable reference fails
//! with `InvalidInput` here, before any network attempt.

use crate::error::ExtractError;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use std::path::Path;

/// Encode the mandatory audio reference.
pub async fn encode_audio(source: &str) -> Result<String, ExtractError> {
    if source.trim().is_empty() {
        return Err(ExtractError::InvalidInput(
            "audio reference is empty".to_string(),
        ));
    }
    encode_source(source, "audio").await
}

/// Encode the optional image reference.
///
/// `None` passes through; a present but unreadable reference is still a
/// caller error.
pub async fn encode_image(source: Option<&str>) -> Result<Option<String>, ExtractError> {
    match source {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Err(ExtractError::InvalidInput(
            "image reference is empty".to_string(),
        )),
        Some(s) => encode_source(s, "image").await.map(Some),
    }
}

async fn encode_source(source: &str, kind: &str) -> Result<String, ExtractError> {
    if let Some(payload) = strip_data_uri(source) {
        if payload.is_empty() {
            return Err(ExtractError::InvalidInput(format!(
                "{} data URI has an empty payload",
                kind
            )));
        }
        return Ok(payload.to_string());
    }

    let path = Path::new(source);
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        ExtractError::InvalidInput(format!("unreadable {} file {}: {}", kind, path.display(), e))
    })?;

    if bytes.is_empty() {
        return Err(ExtractError::InvalidInput(format!(
            "{} file {} is empty",
            kind,
            path.display()
        )));
    }

    tracing::debug!(kind, file = %path.display(), bytes = bytes.len(), "Encoded evidence file");

    Ok(BASE64.encode(bytes))
}

/// Strip the metadata prefix of a `data:` URI, returning the raw payload.
///
/// Returns `None` when the reference is not a data URI at all.
fn strip_data_uri(source: &str) -> Option<&str> {
    let rest = source.strip_prefix("data:")?;
    // Payload starts after the first comma; everything before it is
    // media-type/encoding metadata.
    Some(rest.split_once(',').map(|(_, payload)| payload).unwrap_or(""))
}
