use serde::{Deserialize, Serialize};

use crate::config::CooccurrenceWindow;
use crate::entity::{Entity, EntityType, Relationship};

// --- Health ---

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub tagger: String,
    pub vocabularies: Vec<String>,
    pub cooccurrence: CooccurrenceWindow,
    pub entity_count: u64,
    pub relationship_count: u64,
    pub article_count: u64,
}

// --- Entities ---

#[derive(Debug, Serialize, Deserialize)]
pub struct EntityListRequest {
    #[serde(rename = "type")]
    pub entity_type: Option<EntityType>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EntityListResponse {
    pub entities: Vec<Entity>,
    pub total: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EntityDetailResponse {
    pub entity: Entity,
    pub relationships: Vec<Relationship>,
    pub neighbors: Vec<Entity>,
}
