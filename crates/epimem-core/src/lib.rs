//! Epistemic memory substrate for multi-agent AI deliberation (spec §1).
//!
//! Three layers sit on top of a tenant-scoped key/value facade
//! ([`store::StoreFacade`]):
//!
//! - the adaptive memory tier (surprise scoring, retention, compression,
//!   priority ranking — [`surprise`], [`retention`], [`compression`],
//!   [`ranker`], [`orchestrator`]);
//! - the derived knowledge graph ([`graph`], [`consistency`]);
//! - the epistemic-status overlay (status tracking, minority opinions,
//!   institutional memory, decision lineage, self-audit —
//!   [`epistemic_tracker`], [`minority_tracker`], [`institutional`],
//!   [`decisions`], [`self_audit`]).
//!
//! None of these components talk to a concrete database, AI model, or job
//! queue directly — they go through the [`store::KvStore`],
//! [`provider::AiProvider`], [`audit::AuditSink`] and [`dispatcher::JobDispatcher`]
//! traits, each with a usable default implementation.

pub mod audit;
pub mod compression;
pub mod config;
pub mod consistency;
pub mod decisions;
pub mod dispatcher;
pub mod domain;
pub mod epistemic_tracker;
pub mod error;
pub mod graph;
pub mod institutional;
pub mod keys;
pub mod minority_tracker;
pub mod orchestrator;
pub mod provider;
pub mod ranker;
pub mod retention;
pub mod self_audit;
pub mod store;
pub mod surprise;
pub mod text;

/// Common imports for consumers wiring the substrate together.
pub mod prelude {
    pub use crate::audit::{AuditContext, AuditSink, NoopAuditSink};
    pub use crate::config::{PromotionCriteria, RetentionPolicy, RetentionPolicyUpdate, RetentionWeights};
    pub use crate::consistency::{check_consistency, summarize, ContradictionSummary};
    pub use crate::decisions::{DecisionRecorder, DecisionReport, RecordDecision};
    pub use crate::dispatcher::{JobDispatcher, NoopDispatcher};
    pub use crate::domain::{
        Claim, ClaimContent, ConflictObject, ConflictType, Confidence, DecisionLineage, Entity, EpistemicStatus, EpistemicStatusRecord, Evidence,
        Layer, MinorityAccuracy, MinorityOpinion, Relation, RetentionStatus,
    };
    pub use crate::epistemic_tracker::{EpistemicTracker, ReasoningBasis};
    pub use crate::error::{CoreError, Result};
    pub use crate::graph::{GraphIngestor, IngestResult};
    pub use crate::institutional::{InstitutionalPromoter, PromotionResult, Rejection};
    pub use crate::minority_tracker::{MinorityTracker, RecordOpinion};
    pub use crate::orchestrator::{AdaptiveMemoryOrchestrator, QueryFilters, RetentionSweepSummary};
    pub use crate::provider::{AiProvider, HeuristicProvider};
    pub use crate::self_audit::{SelfAuditor, Trend, WeaklySupported, WisdomMetrics};
    pub use crate::store::{InMemoryStore, KvStore, StoreFacade};
}
