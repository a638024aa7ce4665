//! Closed, tagged domain types (spec §3, §9 "Polymorphic payloads").
//!
//! Replaces the "array/JSON everywhere" style with one Rust type per record
//! kind, matching `vestige-core::memory::KnowledgeNode`'s approach: a single
//! opaque blob field ([`claim::ClaimContent::payload`]) only where the
//! schema is genuinely open, everything else strongly typed.

mod claim;
mod confidence;
mod conflict;
mod entity;
mod epistemic;
mod layer;
mod lineage;
mod minority;
mod relation;

pub use claim::{Claim, ClaimContent, Evidence, RetentionStatus, SurpriseComponents};
pub use confidence::Confidence;
pub use conflict::{ConflictObject, ConflictType};
pub use entity::{Entity, EntitySource, StatusHistoryEntry};
pub use epistemic::{EpistemicStatus, EpistemicStatusRecord, StatusTransition};
pub use layer::Layer;
pub use lineage::{DecisionLineage, RejectedClaim, UsedClaim};
pub use minority::{MinorityAccuracy, MinorityOpinion};
pub use relation::Relation;
