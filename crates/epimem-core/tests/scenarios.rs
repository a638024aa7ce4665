//! End-to-end scenarios through the public API only (spec §8).
//!
//! Unlike the `#[cfg(test)]` modules co-located with each component, these
//! drive the crate the way a caller wired against `prelude` would: through
//! `AdaptiveMemoryOrchestrator`, `GraphIngestor` and friends, never reaching
//! into a module's internals.

use std::collections::HashMap;
use std::sync::Arc;

use epimem_core::graph::SessionClaim;
use epimem_core::keys;
use epimem_core::prelude::*;
use epimem_core::store::WriteMeta;

fn harness() -> (StoreFacade, Arc<HeuristicProvider>, Arc<NoopAuditSink>, Arc<NoopDispatcher>) {
    (
        StoreFacade::new(Arc::new(InMemoryStore::new())),
        Arc::new(HeuristicProvider),
        Arc::new(NoopAuditSink),
        Arc::new(NoopDispatcher),
    )
}

/// Scenario 1: a single claim with no prior context.
#[test]
fn single_claim_no_context_lands_in_surprise_index() {
    let (store, provider, audit, dispatcher) = harness();
    let orchestrator = AdaptiveMemoryOrchestrator::new(store.clone(), provider, audit, dispatcher);

    let confidence = Confidence::new(0.7, 0.85, 0.78).unwrap();
    let id = orchestrator
        .store_claim("acme", "agent_1", ClaimContent::text("X is risky"), confidence, vec![], None, HashMap::new())
        .unwrap();

    let claim = orchestrator.query_by_surprise("acme", (0.0, 1.0), &QueryFilters::default()).unwrap();
    assert_eq!(claim.len(), 1);
    assert_eq!(claim[0].id, id);
    assert!(claim[0].surprise_score >= 0.5, "surprise={}", claim[0].surprise_score);
    assert!(matches!(claim[0].layer, Layer::Hot | Layer::Warm));
}

/// Scenario 2: ingesting the same session twice only creates the topic
/// entity once, and idempotence survives a fresh ingestor (deterministic
/// ids, not just the per-process memo).
#[test]
fn idempotent_ingest_survives_a_new_ingestor_instance() {
    let (store, provider, audit, _dispatcher) = harness();

    let claims = vec![SessionClaim {
        id: "c1".into(),
        claim: "blogging is risky".into(),
        topic: Some("Blogging in 2026".into()),
        confidence: Confidence::new(0.7, 0.85, 0.78).unwrap(),
    }];
    store.put_typed(&keys::session_claims("acme", "s1"), &claims, WriteMeta::new("acme", "session")).unwrap();

    let first = GraphIngestor::new(store.clone(), provider.clone(), audit.clone()).ingest_from_session("acme", "s1").unwrap();
    assert_eq!(first.entities_created, 1);

    // A brand-new ingestor has an empty memo; the deterministic topic id
    // still keeps this from creating a second entity.
    let second = GraphIngestor::new(store.clone(), provider, audit).ingest_from_session("acme", "s1").unwrap();
    assert!(!second.already_ingested);
    assert_eq!(second.entities_created, 0);

    let entities: Vec<Entity> = store.scan_as("graph:entity:acme:*", None).unwrap();
    assert_eq!(entities.len(), 1);
}

/// Scenario 4: institutional promotion filter, driven through the same
/// orchestrator a caller would use to produce the claims.
#[test]
fn institutional_promotion_matches_scenario_rates() {
    let (store, provider, audit, dispatcher) = harness();
    let orchestrator = AdaptiveMemoryOrchestrator::new(store.clone(), provider, audit.clone(), dispatcher);
    let tracker = EpistemicTracker::new(store.clone(), audit);
    let promoter = InstitutionalPromoter::new(store.clone(), tracker);

    let high_confidence = Confidence::new(0.75, 0.85, 0.8).unwrap();
    let evidence = vec![Evidence { content: "e1".into(), quality: 0.8, source: None }, Evidence { content: "e2".into(), quality: 0.7, source: None }];
    let id1 = orchestrator
        .store_claim("acme", "agent_1", ClaimContent::text("claim one"), high_confidence, evidence, Some(0.5), HashMap::new())
        .unwrap();

    let low_confidence = Confidence::new(0.45, 0.55, 0.5).unwrap();
    let id2 = orchestrator
        .store_claim("acme", "agent_1", ClaimContent::text("claim two"), low_confidence, vec![], Some(0.5), HashMap::new())
        .unwrap();

    let claims = vec![orchestrator.query_by_surprise("acme", (0.0, 1.0), &QueryFilters::default()).unwrap()]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>();
    assert_eq!(claims.len(), 2);

    let result = promoter.promote_session("acme", &claims, &PromotionCriteria::default()).unwrap();
    assert_eq!(result.promoted, vec![id1]);
    assert_eq!(result.rejected.len(), 1);
    assert_eq!(result.rejected[0].claim_id, id2);
    assert!((result.promotion_rate - 0.5).abs() < 1e-9);
}
