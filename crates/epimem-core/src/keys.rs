//! Key layout (spec §6.1).
//!
//! Centralizes the literal key strings the core depends on, the way
//! `vestige-core::storage` centralizes its SQL schema constants — one place
//! to read the contract, instead of `format!` calls scattered through every
//! component.

/// Surprise-bucket label (spec §3 indices).
pub fn surprise_bucket(score: f64) -> &'static str {
    if score >= 0.8 {
        "very_high"
    } else if score >= 0.6 {
        "high"
    } else if score >= 0.4 {
        "medium"
    } else if score >= 0.2 {
        "low"
    } else {
        "very_low"
    }
}

pub fn claim(tenant: &str, id: &str) -> String {
    format!("adaptive_memory:{tenant}:{id}")
}

pub fn original_memory(tenant: &str, id: &str) -> String {
    format!("original_memory:{tenant}:{id}_original")
}

pub fn retention_policy(tenant: &str) -> String {
    format!("retention_policy:{tenant}")
}

pub fn retention_eval_pending(tenant: &str) -> String {
    format!("retention_eval_pending:{tenant}")
}

pub fn surprise_index(tenant: &str, bucket: &str) -> String {
    format!("surprise_index:{tenant}:{bucket}")
}

pub fn layer_index(tenant: &str, layer: &str) -> String {
    format!("layer_index:{tenant}:{layer}")
}

pub fn graph_entity(tenant: &str, id: &str) -> String {
    format!("graph:entity:{tenant}:{id}")
}

pub fn graph_relation(tenant: &str, rel_id: &str) -> String {
    format!("graph:relation:{tenant}:{rel_id}")
}

pub fn graph_index_type(tenant: &str, entity_type: &str) -> String {
    format!("graph:index:{tenant}:type:{entity_type}")
}

pub fn graph_index_relations(tenant: &str, entity_id: &str) -> String {
    format!("graph:index:{tenant}:relations:{entity_id}")
}

pub fn session_claims(tenant: &str, session: &str) -> String {
    format!("session:{tenant}:{session}:claims")
}

pub fn epistemic_status(tenant: &str, claim_id: &str) -> String {
    format!("epistemic_status:{tenant}:{claim_id}")
}

pub fn epistemic_transitions(tenant: &str, claim_id: &str) -> String {
    format!("epistemic_transitions:{tenant}:{claim_id}")
}

pub fn epistemic_index(tenant: &str, status: &str) -> String {
    format!("epistemic_index:{tenant}:{status}")
}

pub fn minority_opinion(tenant: &str, id: &str) -> String {
    format!("minority_opinion:{tenant}:{id}")
}

pub fn minority_accuracy(tenant: &str, agent: &str) -> String {
    format!("minority_accuracy:{tenant}:{agent}")
}

pub fn minority_index(tenant: &str, scope: &str, value: &str) -> String {
    format!("minority_index:{tenant}:{scope}:{value}")
}

pub fn institutional(tenant: &str, id: &str) -> String {
    format!("institutional:{tenant}:{id}")
}

pub fn institutional_indices_built(tenant: &str) -> String {
    format!("institutional_indices_built:{tenant}")
}

pub fn index_institutional_day(tenant: &str, yyyymmdd: &str) -> String {
    format!("index:institutional:{tenant}:{yyyymmdd}")
}

pub fn wisdom_trend(tenant: &str) -> String {
    format!("wisdom_trend:{tenant}")
}

pub fn wisdom_trend_history(tenant: &str, ts: i64) -> String {
    format!("wisdom_trend_history:{tenant}:{ts}")
}

pub fn decision(tenant: &str, id: &str) -> String {
    format!("decision:{tenant}:{id}")
}
