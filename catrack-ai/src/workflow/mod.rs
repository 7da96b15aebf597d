//! Per-session submission orchestration
//!
//! Owns the per-item result set for one inspection session and enforces
//! the in-flight discipline: at most one extraction request per item, with
//! a newer submission cancelling and replacing the older one. The session
//! verdict is a pure projection over the result set, recomputed on demand;
//! there is no stored aggregate to go stale.

use crate::aggregator;
use crate::db::EvidenceStore;
use crate::error::ExtractError;
use crate::services::ExtractionClient;
use crate::types::{AggregateVerdict, ExtractionResult, InspectionCategory};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Outcome of compiling a whole session from the evidence store
#[derive(Debug)]
pub struct CompileOutcome {
    pub verdict: AggregateVerdict,
    /// Items whose submission failed; their evidence stays in the store
    pub failures: Vec<(Uuid, ExtractError)>,
}

/// One inspection session's submission state
pub struct InspectionSession {
    session_id: Uuid,
    client: Arc<ExtractionClient>,
    /// Cancellation tokens for in-flight item submissions
    inflight: Arc<RwLock<HashMap<Uuid, CancellationToken>>>,
    /// Latest result per item
    results: Arc<RwLock<HashMap<Uuid, ExtractionResult>>>,
}

impl InspectionSession {
    pub fn new(session_id: Uuid, client: Arc<ExtractionClient>) -> Self {
        Self {
            session_id,
            client,
            inflight: Arc::new(RwLock::new(HashMap::new())),
            results: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Submit one item's evidence for extraction.
    ///
    /// If a submission for the same item is already in flight it is
    /// cancelled and this one takes its place; the superseded caller gets
    /// `Superseded`. On success the item's previous result, if any, is
    /// overwritten, so one item never holds two conflicting results.
    pub async fn submit_item(
        &self,
        item_id: Uuid,
        audio_ref: &str,
        image_ref: Option<&str>,
        category: InspectionCategory,
    ) -> Result<ExtractionResult, ExtractError> {
        let token = CancellationToken::new();
        {
            let mut inflight = self.inflight.write().await;
            if let Some(previous) = inflight.insert(item_id, token.clone()) {
                debug!(item_id = %item_id, "Superseding in-flight submission");
                previous.cancel();
            }
        }

        let job_id = format!("{}:{}", self.session_id, item_id);
        let outcome = tokio::select! {
            _ = token.cancelled() => Err(ExtractError::Superseded),
            result = self
                .client
                .run_inspection(audio_ref, image_ref, Some(&job_id), category) => result,
        };

        // Settle under the registry lock: if our token was cancelled while
        // the round-trip completed, a replacement owns the item now and
        // this result must not land.
        let mut inflight = self.inflight.write().await;
        if token.is_cancelled() {
            return Err(ExtractError::Superseded);
        }
        inflight.remove(&item_id);
        drop(inflight);

        let result = outcome?;
        self.results.write().await.insert(item_id, result.clone());
        info!(
            session_id = %self.session_id,
            item_id = %item_id,
            anomalies = result.anomalies.len(),
            "Item result recorded"
        );

        Ok(result)
    }

    /// Compile the session: submit everything the evidence store holds,
    /// then project the verdict.
    ///
    /// Reads one point-in-time snapshot of the store. Item failures are
    /// collected rather than aborting the compilation; their evidence
    /// stays put for a later retry.
    pub async fn compile(
        &self,
        store: &dyn EvidenceStore,
        category: InspectionCategory,
    ) -> anyhow::Result<CompileOutcome> {
        let records = store.get_all(self.session_id).await?;
        info!(
            session_id = %self.session_id,
            items = records.len(),
            "Compiling session from evidence store"
        );

        let mut failures = Vec::new();
        for record in records {
            let submitted = self
                .submit_item(
                    record.item_id,
                    &record.audio_uri,
                    record.image_uri.as_deref(),
                    category,
                )
                .await;

            if let Err(err) = submitted {
                warn!(
                    item_id = %record.item_id,
                    error = %err,
                    "Item submission failed during compilation"
                );
                failures.push((record.item_id, err));
            }
        }

        Ok(CompileOutcome {
            verdict: self.verdict().await,
            failures,
        })
    }

    /// Project the session verdict from the current result set.
    pub async fn verdict(&self) -> AggregateVerdict {
        let results = self.results.read().await;
        aggregator::aggregate(results.values())
    }

    /// Snapshot of the per-item results gathered so far.
    pub async fn results(&self) -> Vec<ExtractionResult> {
        self.results.read().await.values().cloned().collect()
    }

    /// Latest result for one item, if any.
    pub async fn result_for(&self, item_id: Uuid) -> Option<ExtractionResult> {
        self.results.read().await.get(&item_id).cloned()
    }

    /// Discard every result in the session. Evidence in the store is not
    /// touched.
    pub async fn reset(&self) {
        self.results.write().await.clear();
        debug!(session_id = %self.session_id, "Session results cleared");
    }
}
