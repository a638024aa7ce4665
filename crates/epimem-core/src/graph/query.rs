//! Graph query (spec §4.I).

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::domain::{Entity, Relation};
use crate::error::Result;
use crate::keys;
use crate::store::StoreFacade;

use super::store::get_relations;

/// Options for [`get_historical_facts`] (spec §4.I).
#[derive(Debug, Clone, Copy)]
pub struct HistoricalFactsOptions {
    pub min_confidence: f64,
    pub include_contradictions: bool,
}

impl Default for HistoricalFactsOptions {
    fn default() -> Self {
        Self { min_confidence: 0.0, include_contradictions: false }
    }
}

/// Consensus summary for one relation-type group (spec §4.I).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Consensus {
    pub relation_type: String,
    pub best_target: String,
    pub aggregate_confidence: f64,
    pub agreement_rate: f64,
    pub relation_count: usize,
}

/// A pair of relations in the same group whose targets differ
/// (spec §4.I: "emit all pairs... whose targets differ").
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContradictionPair {
    pub relation_type: String,
    pub relation_a: String,
    pub relation_b: String,
    pub severity: f64,
}

/// `getHistoricalFacts` result (spec §4.I).
#[derive(Debug, Clone, Default)]
pub struct HistoricalFacts {
    pub entity: Option<Entity>,
    pub consensus: Vec<Consensus>,
    pub contradictions: Vec<ContradictionPair>,
}

/// `getHistoricalFacts(topic, tenant, opts)` (spec §4.I).
pub fn get_historical_facts(store: &StoreFacade, tenant_id: &str, topic: &str, opts: HistoricalFactsOptions) -> Result<HistoricalFacts> {
    let topic_id = Entity::make_id("topic", topic);
    let entity: Option<Entity> = store.get_as(&keys::graph_entity(tenant_id, &topic_id))?;
    let Some(entity) = entity else {
        return Ok(HistoricalFacts::default());
    };

    let relations: Vec<Relation> = get_relations(store, tenant_id, &entity.id)?
        .into_iter()
        .filter(|r| r.confidence >= opts.min_confidence)
        .collect();

    let mut groups: HashMap<String, Vec<&Relation>> = HashMap::new();
    for relation in &relations {
        groups.entry(relation.relation.clone()).or_default().push(relation);
    }

    let mut consensus = Vec::new();
    let mut contradictions = Vec::new();

    for (relation_type, group) in &groups {
        let mut per_target: HashMap<&str, (f64, usize)> = HashMap::new();
        for relation in group {
            let entry = per_target.entry(relation.to.as_str()).or_insert((0.0, 0));
            entry.0 += relation.confidence;
            entry.1 += 1;
        }
        let best_target = per_target
            .iter()
            .max_by(|a, b| {
                let mean_a = a.1 .0 / a.1 .1 as f64;
                let mean_b = b.1 .0 / b.1 .1 as f64;
                mean_a.partial_cmp(&mean_b).unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(target, _)| target.to_string())
            .unwrap_or_default();

        let aggregate_confidence = group.iter().map(|r| r.confidence).sum::<f64>() / group.len() as f64;
        let best_count = per_target.get(best_target.as_str()).map(|(_, count)| *count).unwrap_or(0);
        let agreement_rate = best_count as f64 / group.len() as f64;

        consensus.push(Consensus {
            relation_type: relation_type.clone(),
            best_target,
            aggregate_confidence,
            agreement_rate,
            relation_count: group.len(),
        });

        if opts.include_contradictions {
            for i in 0..group.len() {
                for j in (i + 1)..group.len() {
                    if group[i].to != group[j].to {
                        let severity = group[i].confidence.min(group[j].confidence);
                        contradictions.push(ContradictionPair {
                            relation_type: relation_type.clone(),
                            relation_a: group[i].id.clone(),
                            relation_b: group[j].id.clone(),
                            severity,
                        });
                    }
                }
            }
        }
    }

    Ok(HistoricalFacts { entity: Some(entity), consensus, contradictions })
}

/// Result of a bounded-depth path search (spec §4.I).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathResult {
    pub nodes: Vec<String>,
    pub relations: Vec<String>,
}

/// `findPath` — BFS bounded by `max_depth` (default 5), returning the node
/// sequence and the relation chosen at each hop (spec §4.I).
pub fn find_path(store: &StoreFacade, tenant_id: &str, from: &str, to: &str, max_depth: usize) -> Result<Option<PathResult>> {
    if from == to {
        return Ok(Some(PathResult { nodes: vec![from.to_string()], relations: vec![] }));
    }

    let mut visited = std::collections::HashSet::new();
    visited.insert(from.to_string());
    let mut queue = VecDeque::new();
    queue.push_back((from.to_string(), PathResult { nodes: vec![from.to_string()], relations: vec![] }));

    while let Some((node, path)) = queue.pop_front() {
        if path.nodes.len() > max_depth {
            continue;
        }
        let relations = get_relations(store, tenant_id, &node)?;
        for relation in relations {
            let next = if relation.from == node { relation.to.clone() } else { relation.from.clone() };
            if visited.contains(&next) {
                continue;
            }
            let mut next_path = path.clone();
            next_path.nodes.push(next.clone());
            next_path.relations.push(relation.relation.clone());
            if next == to {
                return Ok(Some(next_path));
            }
            if next_path.nodes.len() <= max_depth {
                visited.insert(next.clone());
                queue.push_back((next, next_path));
            }
        }
    }

    Ok(None)
}

pub const DEFAULT_MAX_DEPTH: usize = 5;
