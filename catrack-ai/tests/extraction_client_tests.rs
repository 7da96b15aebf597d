//! Extraction client integration tests
//!
//! Stands up a mock gateway with axum on an ephemeral port and exercises
//! the deadline, retry, and contract-enforcement behavior end to end.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use catrack_ai::config::ClientConfig;
use catrack_ai::error::ExtractError;
use catrack_ai::services::{ExtractionClient, RetryPolicy};
use catrack_ai::types::{InspectionCategory, ItemStatus, Severity};

/// Serve a mock gateway on an ephemeral port, returning its base URL.
async fn spawn_mock(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn client_for(base_url: &str) -> ExtractionClient {
    client_with_timeout(base_url, Duration::from_secs(5))
}

fn client_with_timeout(base_url: &str, extract_timeout: Duration) -> ExtractionClient {
    let config = ClientConfig {
        api_url: base_url.to_string(),
        extract_timeout,
        probe_timeout: Duration::from_secs(5),
        synthesis_timeout: Duration::from_secs(5),
    };
    ExtractionClient::new(&config).unwrap()
}

fn valid_body() -> serde_json::Value {
    serde_json::json!({
        "inspection_output": {
            "inspection_summary": {
                "asset": "CAT D6N Dozer",
                "status": "fail",
                "overall_operational_impact": "Remove from service immediately"
            },
            "anomalies": [
                {
                    "component": "Rim",
                    "location": "Front left",
                    "issue": "Severe rim corrosion",
                    "description": "Rust and pitting across the rim flange",
                    "recommended_action": "Immediate rim replacement",
                    "severity": "Critical",
                    "evidence_backed": true
                }
            ]
        },
        "job_id": "J-1"
    })
}

#[tokio::test]
async fn test_recovers_after_single_502() {
    // First attempt gets a 502, the retry gets a valid body
    let count = Arc::new(AtomicUsize::new(0));
    let handler_count = count.clone();

    let app = Router::new().route(
        "/extract",
        post(move || {
            let count = handler_count.clone();
            async move {
                if count.fetch_add(1, Ordering::SeqCst) == 0 {
                    (StatusCode::BAD_GATEWAY, "upstream reset").into_response()
                } else {
                    Json(valid_body()).into_response()
                }
            }
        }),
    );

    let base_url = spawn_mock(app).await;
    let client = client_for(&base_url);

    let response = client
        .extract("QUJD", None, Some("J-1"), InspectionCategory::Auto)
        .await
        .unwrap();

    assert_eq!(count.load(Ordering::SeqCst), 2, "exactly one retry");
    assert_eq!(response.summary.status, ItemStatus::Fail);
    assert_eq!(response.anomalies.len(), 1);
}

#[tokio::test]
async fn test_retry_budget_exhausts_after_one_retry() {
    let count = Arc::new(AtomicUsize::new(0));
    let handler_count = count.clone();

    let app = Router::new().route(
        "/extract",
        post(move || {
            let count = handler_count.clone();
            async move {
                count.fetch_add(1, Ordering::SeqCst);
                (StatusCode::BAD_GATEWAY, "upstream reset")
            }
        }),
    );

    let base_url = spawn_mock(app).await;
    let client = client_for(&base_url);

    let err = client
        .extract("QUJD", None, None, InspectionCategory::Auto)
        .await
        .unwrap_err();

    assert!(matches!(err, ExtractError::Transient { status: 502, .. }));
    assert_eq!(count.load(Ordering::SeqCst), 2, "two attempts, then give up");
}

#[tokio::test]
async fn test_custom_retry_policy_extends_retryable_set() {
    // A widened policy turns 503 into a recoverable status
    let count = Arc::new(AtomicUsize::new(0));
    let handler_count = count.clone();

    let app = Router::new().route(
        "/extract",
        post(move || {
            let count = handler_count.clone();
            async move {
                if count.fetch_add(1, Ordering::SeqCst) == 0 {
                    (StatusCode::SERVICE_UNAVAILABLE, "cold start").into_response()
                } else {
                    Json(valid_body()).into_response()
                }
            }
        }),
    );

    let base_url = spawn_mock(app).await;
    let client = client_for(&base_url).with_retry_policy(RetryPolicy {
        max_attempts: 2,
        retryable_statuses: vec![502, 503, 504],
    });

    let response = client
        .extract("QUJD", None, None, InspectionCategory::Auto)
        .await
        .unwrap();

    assert_eq!(count.load(Ordering::SeqCst), 2);
    assert_eq!(response.summary.status, ItemStatus::Fail);
}

#[tokio::test]
async fn test_plain_timeout_is_not_retried() {
    // The handler outlives the client deadline; only 502/504 retry, a
    // deadline expiry must not
    let count = Arc::new(AtomicUsize::new(0));
    let handler_count = count.clone();

    let app = Router::new().route(
        "/extract",
        post(move || {
            let count = handler_count.clone();
            async move {
                count.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_secs(2)).await;
                Json(valid_body())
            }
        }),
    );

    let base_url = spawn_mock(app).await;
    let client = client_with_timeout(&base_url, Duration::from_millis(200));

    let err = client
        .extract("QUJD", None, None, InspectionCategory::Auto)
        .await
        .unwrap_err();
    assert!(matches!(err, ExtractError::Timeout));
    assert_eq!(err.to_typed().status_code, 504);

    // Give a hypothetical second attempt time to show up
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(count.load(Ordering::SeqCst), 1, "timeouts are never retried");
}

#[tokio::test]
async fn test_missing_anomalies_is_contract_violation() {
    let mut body = valid_body();
    body["inspection_output"]
        .as_object_mut()
        .unwrap()
        .remove("anomalies");

    let app = Router::new().route("/extract", post(move || async move { Json(body) }));
    let base_url = spawn_mock(app).await;
    let client = client_for(&base_url);

    let err = client
        .extract("QUJD", None, None, InspectionCategory::Auto)
        .await
        .unwrap_err();

    assert!(matches!(err, ExtractError::ContractViolation(_)));
    assert_eq!(err.to_typed().status_code, 500);
}

#[tokio::test]
async fn test_non_json_success_body_is_contract_violation() {
    let app = Router::new().route("/extract", post(|| async { "not json" }));
    let base_url = spawn_mock(app).await;
    let client = client_for(&base_url);

    let err = client
        .extract("QUJD", None, None, InspectionCategory::Auto)
        .await
        .unwrap_err();

    assert!(matches!(err, ExtractError::ContractViolation(_)));
}

#[tokio::test]
async fn test_terminal_status_fails_without_retry() {
    let count = Arc::new(AtomicUsize::new(0));
    let handler_count = count.clone();

    let app = Router::new().route(
        "/extract",
        post(move || {
            let count = handler_count.clone();
            async move {
                count.fetch_add(1, Ordering::SeqCst);
                (StatusCode::BAD_REQUEST, "audio_b64 is not valid base64.")
            }
        }),
    );

    let base_url = spawn_mock(app).await;
    let client = client_for(&base_url);

    let err = client
        .extract("QUJD", None, None, InspectionCategory::Auto)
        .await
        .unwrap_err();

    assert!(matches!(err, ExtractError::Terminal { status: 400, .. }));
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unreachable_service_is_transport() {
    // Nothing listens here; no response ever reaches us
    let client = client_for("http://127.0.0.1:9");

    let err = client
        .extract("QUJD", None, None, InspectionCategory::Auto)
        .await
        .unwrap_err();

    assert!(matches!(err, ExtractError::Transport(_)));
    assert!(err.is_retry_later());
}

#[tokio::test]
async fn test_empty_audio_payload_never_reaches_the_network() {
    let client = client_for("http://127.0.0.1:9");

    let err = client
        .extract("", None, None, InspectionCategory::Auto)
        .await
        .unwrap_err();

    assert!(matches!(err, ExtractError::InvalidInput(_)));
}

#[tokio::test]
async fn test_run_inspection_sanitizes_unbacked_findings() {
    // Service claims corroboration and an out-of-enum severity; no image
    // was submitted, so both claims must be repaired
    let mut body = valid_body();
    body["inspection_output"]["anomalies"][0]["severity"] = "BOGUS".into();

    let app = Router::new().route("/extract", post(move || async move { Json(body) }));
    let base_url = spawn_mock(app).await;
    let client = client_for(&base_url);

    let mut audio = tempfile::NamedTempFile::new().unwrap();
    audio.write_all(b"ID3\x03fake-mp3-bytes").unwrap();
    audio.flush().unwrap();

    let result = client
        .run_inspection(
            audio.path().to_str().unwrap(),
            None,
            None,
            InspectionCategory::TiresRims,
        )
        .await
        .unwrap();

    let anomaly = &result.anomalies[0];
    assert_eq!(anomaly.severity, Severity::Low);
    assert!(!anomaly.evidence_backed);
    assert!(anomaly.technician_review_required);
}

#[tokio::test]
async fn test_health_probe_requires_adapter() {
    let app = Router::new().route(
        "/health",
        get(|| async {
            Json(serde_json::json!({
                "status": "ok",
                "adapter_available": false,
                "version": "2.1.0"
            }))
        }),
    );

    let base_url = spawn_mock(app).await;
    let client = client_for(&base_url);

    let health = client.health().await.unwrap();
    assert_eq!(health.status, "ok");
    assert!(!health.is_healthy());
}

#[tokio::test]
async fn test_transcribe_returns_plain_text() {
    let app = Router::new().route(
        "/transcribe",
        post(|| async {
            Json(serde_json::json!({
                "transcript": "left final drive is seeping oil at the duo-cone seal"
            }))
        }),
    );

    let base_url = spawn_mock(app).await;
    let client = client_for(&base_url);

    let transcript = client.transcribe("QUJD").await.unwrap();
    assert!(transcript.contains("duo-cone seal"));
}

#[tokio::test]
async fn test_synthesize_returns_report() {
    let app = Router::new().route(
        "/synthesize",
        post(|| async {
            Json(serde_json::json!({
                "report": "This machine must be removed from service immediately pending inspection.",
                "job_id": "J-9"
            }))
        }),
    );

    let base_url = spawn_mock(app).await;
    let client = client_for(&base_url);

    let verified = valid_body();
    let report = client.synthesize(&verified, Some("J-9")).await.unwrap();
    assert!(report.report.starts_with("This machine must be removed"));
    assert_eq!(report.job_id.as_deref(), Some("J-9"));
}

#[tokio::test]
async fn test_synthesize_without_report_field_is_contract_violation() {
    let app = Router::new().route(
        "/synthesize",
        post(|| async { Json(serde_json::json!({ "job_id": "J-9" })) }),
    );

    let base_url = spawn_mock(app).await;
    let client = client_for(&base_url);

    let err = client
        .synthesize(&valid_body(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ExtractError::ContractViolation(_)));
}
