// Response validation layer
//
// Envelope enforcement (schema violations are server defects) and anomaly
// sanitization (domain-invariant repair, never dropping a finding).

pub mod anomaly_sanitizer;
pub mod response_validator;

pub use anomaly_sanitizer::sanitize_anomalies;
pub use response_validator::validate_extract_response;
