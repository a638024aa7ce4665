//! The derived knowledge graph (spec §2 "the derived knowledge graph"):
//! store (G), ingestor (H) and query (I).

mod ingest;
mod query;
mod store;

pub use ingest::{GraphIngestor, IngestResult, SessionClaim};
pub use query::{Consensus, ContradictionPair, HistoricalFactsOptions, HistoricalFacts, PathResult};
pub use store::{add_entity, add_relation, get_relations, recompute_aggregate_confidence};
