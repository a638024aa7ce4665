//! Job dispatcher contract (spec §6.4).
//!
//! Retention evaluation and summarization are specified as background jobs
//! the core *requests* but does not execute inline (spec §4.C, §4.D: "the
//! evaluation itself runs out of band"). Mirrors `vestige-core`'s
//! consolidation-scheduler seam: the core marks work as pending and a
//! dispatcher decides when/how it actually runs.

use crate::error::Result;

/// The external job dispatcher interface (spec §6.4).
///
/// Returns `job_id|null` per spec: `Ok(Some(job_id))` when the dispatcher
/// actually queued the work, `Ok(None)` when it didn't (no dispatcher wired,
/// queue full, …) — the caller records a pending marker in the store
/// whenever it sees `None`, the way a real scheduler would poll for it.
pub trait JobDispatcher: Send + Sync {
    /// Request that `claim_id` be re-evaluated for retention at or after
    /// `not_before`.
    fn dispatch_retention_evaluation(
        &self,
        tenant_id: &str,
        claim_id: &str,
        not_before: chrono::DateTime<chrono::Utc>,
    ) -> Result<Option<String>>;

    /// Request that `claim_id` be summarized down to `target_layer`.
    fn dispatch_summarization(&self, tenant_id: &str, claim_id: &str, target_layer: &str) -> Result<Option<String>>;
}

/// Always returns `None`: nothing is queued beyond a debug-level trace, so
/// every caller falls back to the `retention_eval_pending` / layer-index
/// bookkeeping the core already does in the KV store itself (spec §6.1
/// keys), which a real scheduler would poll instead of relying on push
/// dispatch.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDispatcher;

impl JobDispatcher for NoopDispatcher {
    fn dispatch_retention_evaluation(
        &self,
        tenant_id: &str,
        claim_id: &str,
        not_before: chrono::DateTime<chrono::Utc>,
    ) -> Result<Option<String>> {
        tracing::debug!(tenant_id, claim_id, %not_before, "retention evaluation dispatch is a no-op");
        Ok(None)
    }

    fn dispatch_summarization(&self, tenant_id: &str, claim_id: &str, target_layer: &str) -> Result<Option<String>> {
        tracing::debug!(tenant_id, claim_id, target_layer, "summarization dispatch is a no-op");
        Ok(None)
    }
}
