use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::article::ArticleSummary;
use crate::entity::{EntityId, EntityType, Evidence, Resolution};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeExport {
    pub id: EntityId,
    pub entity_type: EntityType,
    pub name: String,
    pub aliases: BTreeSet<String>,
    pub article_count: usize,
    pub mention_count: u64,
    pub resolution: Resolution,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeExport {
    pub source: EntityId,
    pub target: EntityId,
    pub evidence_count: usize,
    pub weight: f64,
    pub article_ids: BTreeSet<String>,
    pub evidence: Vec<Evidence>,
}

/// Serializable view of the whole graph, ordered by identifier.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<NodeExport>,
    pub edges: Vec<EdgeExport>,
    pub articles: Vec<ArticleSummary>,
}

impl GraphSnapshot {
    pub fn node(&self, id: &EntityId) -> Option<&NodeExport> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    pub fn edge(&self, x: &EntityId, y: &EntityId) -> Option<&EdgeExport> {
        self.edges
            .iter()
            .find(|e| (&e.source == x && &e.target == y) || (&e.source == y && &e.target == x))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityTypeStat {
    pub entity_type: EntityType,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphStats {
    pub entity_count: u64,
    pub relationship_count: u64,
    pub article_count: u64,
    pub unresolved_count: u64,
    pub entity_types: Vec<EntityTypeStat>,
}
