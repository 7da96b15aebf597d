//! Service clients for the remote inference gateway

pub mod extraction_client;

pub use extraction_client::{ExtractionClient, HealthStatus, RetryPolicy, SynthesisReport};
