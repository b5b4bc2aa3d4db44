use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use biolit_core::api_types::EntityDetailResponse;
use biolit_core::article::ArticleSummary;
use biolit_core::entity::{
    Entity, EntityId, EntityType, Evidence, PairKey, Relationship, Resolution,
};
use biolit_core::error::{BiolitError, Result};
use biolit_core::export::{EdgeExport, EntityTypeStat, GraphSnapshot, GraphStats, NodeExport};

use crate::registry::{Alias, EntityRegistry, UpsertOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Created,
    Updated,
}

/// Entity nodes and co-occurrence edges, indexed by identifier and pair key.
///
/// Merging is the only mutation; queries borrow and never modify. Use
/// [`SharedGraph`] when more than one task touches the graph.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeGraph {
    registry: EntityRegistry,
    relationships: BTreeMap<PairKey, Relationship>,
    adjacency: HashMap<EntityId, BTreeSet<EntityId>>,
    articles: BTreeMap<String, ArticleSummary>,
}

impl KnowledgeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn upsert_entity(
        &mut self,
        id: &EntityId,
        entity_type: EntityType,
        display_name: &str,
        alias: Alias<'_>,
        article_id: &str,
        resolution: &Resolution,
    ) -> (&Entity, UpsertOutcome) {
        self.registry
            .upsert(id, entity_type, display_name, alias, article_id, resolution)
    }

    /// Adds evidence to the edge between `a` and `b`, creating it if needed.
    ///
    /// Both endpoints must already be registered and must differ.
    pub fn merge_relationship(
        &mut self,
        a: &EntityId,
        b: &EntityId,
        evidence: Evidence,
    ) -> Result<(&Relationship, MergeOutcome)> {
        for id in [a, b] {
            if !self.registry.contains(id) {
                return Err(BiolitError::NotFound(format!("Entity {id} not in graph")));
            }
        }
        let pair = PairKey::new(a.clone(), b.clone())
            .ok_or_else(|| BiolitError::Graph(format!("Refusing self-relationship on {a}")))?;

        let outcome = if self.relationships.contains_key(&pair) {
            MergeOutcome::Updated
        } else {
            self.adjacency.entry(pair.a.clone()).or_default().insert(pair.b.clone());
            self.adjacency.entry(pair.b.clone()).or_default().insert(pair.a.clone());
            MergeOutcome::Created
        };

        let relationship = self
            .relationships
            .entry(pair.clone())
            .or_insert_with(|| Relationship::new(pair));
        relationship.add_evidence(evidence);

        tracing::debug!(
            a = %relationship.pair.a,
            b = %relationship.pair.b,
            evidence = relationship.evidence_count(),
            weight = relationship.weight,
            "Merged relationship"
        );

        Ok((&*relationship, outcome))
    }

    pub fn record_article(&mut self, article: ArticleSummary) {
        self.articles.insert(article.id.clone(), article);
    }

    pub fn has_article(&self, article_id: &str) -> bool {
        self.articles.contains_key(article_id)
    }

    pub fn entity(&self, id: &EntityId) -> Option<&Entity> {
        self.registry.get(id)
    }

    pub fn relationship(&self, a: &EntityId, b: &EntityId) -> Option<&Relationship> {
        PairKey::new(a.clone(), b.clone()).and_then(|pair| self.relationships.get(&pair))
    }

    /// Entities sharing an edge with `id`, in id order. Empty for unknown ids.
    pub fn neighbors<'a>(&'a self, id: &EntityId) -> impl Iterator<Item = &'a Entity> + 'a {
        self.adjacency
            .get(id)
            .into_iter()
            .flatten()
            .filter_map(move |n| self.registry.get(n))
    }

    pub fn relationships_of<'a>(
        &'a self,
        id: &EntityId,
    ) -> impl Iterator<Item = &'a Relationship> + 'a {
        let id = id.clone();
        self.adjacency
            .get(&id)
            .into_iter()
            .flatten()
            .filter_map(move |n| PairKey::new(id.clone(), n.clone()))
            .filter_map(move |pair| self.relationships.get(&pair))
    }

    pub fn entities_by_type(&self, entity_type: EntityType) -> impl Iterator<Item = &Entity> + '_ {
        self.registry.by_type(entity_type)
    }

    pub fn entities_by_alias<'a>(&'a self, normalized: &str) -> impl Iterator<Item = &'a Entity> + 'a {
        self.registry.by_alias(normalized)
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.registry.iter()
    }

    pub fn relationships(&self) -> impl Iterator<Item = &Relationship> + '_ {
        self.relationships.values()
    }

    pub fn entity_count(&self) -> usize {
        self.registry.len()
    }

    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }

    pub fn article_count(&self) -> usize {
        self.articles.len()
    }

    pub fn stats(&self) -> GraphStats {
        let entity_types = EntityType::ALL
            .into_iter()
            .map(|entity_type| EntityTypeStat {
                entity_type,
                count: self.registry.by_type(entity_type).count() as u64,
            })
            .filter(|stat| stat.count > 0)
            .collect();

        GraphStats {
            entity_count: self.registry.len() as u64,
            relationship_count: self.relationships.len() as u64,
            article_count: self.articles.len() as u64,
            unresolved_count: self
                .registry
                .iter()
                .filter(|e| !e.resolution.is_external())
                .count() as u64,
            entity_types,
        }
    }

    /// Nodes, edges and articles in identifier order.
    pub fn export(&self) -> GraphSnapshot {
        let nodes = self
            .registry
            .iter()
            .map(|e| NodeExport {
                id: e.id.clone(),
                entity_type: e.entity_type,
                name: e.name.clone(),
                aliases: e.aliases.clone(),
                article_count: e.article_count(),
                mention_count: e.mention_count,
                resolution: e.resolution.clone(),
            })
            .collect();

        let edges = self
            .relationships
            .values()
            .map(|r| EdgeExport {
                source: r.pair.a.clone(),
                target: r.pair.b.clone(),
                evidence_count: r.evidence_count(),
                weight: r.weight,
                article_ids: r.article_ids(),
                evidence: r.evidence.clone(),
            })
            .collect();

        GraphSnapshot {
            nodes,
            edges,
            articles: self.articles.values().cloned().collect(),
        }
    }

    /// Drops everything. Only used for a full rebuild.
    pub fn clear(&mut self) {
        self.registry.clear();
        self.relationships.clear();
        self.adjacency.clear();
        self.articles.clear();
    }
}

/// A [`KnowledgeGraph`] behind a single writer lock.
///
/// Writers hold the lock for a whole article so readers never observe a
/// partial merge. Read helpers copy their results out before releasing it.
#[derive(Debug, Clone, Default)]
pub struct SharedGraph {
    inner: Arc<RwLock<KnowledgeGraph>>,
}

impl SharedGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, KnowledgeGraph> {
        self.inner.read().await
    }

    pub async fn write(&self) -> RwLockWriteGuard<'_, KnowledgeGraph> {
        self.inner.write().await
    }

    pub async fn has_article(&self, article_id: &str) -> bool {
        self.inner.read().await.has_article(article_id)
    }

    pub async fn entity(&self, id: &EntityId) -> Option<Entity> {
        self.inner.read().await.entity(id).cloned()
    }

    pub async fn neighbors(&self, id: &EntityId) -> Vec<Entity> {
        self.inner.read().await.neighbors(id).cloned().collect()
    }

    pub async fn entities_by_type(&self, entity_type: EntityType) -> Vec<Entity> {
        self.inner
            .read()
            .await
            .entities_by_type(entity_type)
            .cloned()
            .collect()
    }

    pub async fn entities_by_alias(&self, normalized: &str) -> Vec<Entity> {
        self.inner
            .read()
            .await
            .entities_by_alias(normalized)
            .cloned()
            .collect()
    }

    pub async fn relationship(&self, a: &EntityId, b: &EntityId) -> Option<Relationship> {
        self.inner.read().await.relationship(a, b).cloned()
    }

    pub async fn entities(&self) -> Vec<Entity> {
        self.inner.read().await.entities().cloned().collect()
    }

    pub async fn entity_detail(&self, id: &EntityId) -> Result<EntityDetailResponse> {
        let graph = self.inner.read().await;
        let entity = graph
            .entity(id)
            .cloned()
            .ok_or_else(|| BiolitError::NotFound(format!("Entity {id} not found")))?;
        Ok(EntityDetailResponse {
            entity,
            relationships: graph.relationships_of(id).cloned().collect(),
            neighbors: graph.neighbors(id).cloned().collect(),
        })
    }

    pub async fn stats(&self) -> GraphStats {
        self.inner.read().await.stats()
    }

    pub async fn export(&self) -> GraphSnapshot {
        self.inner.read().await.export()
    }

    pub async fn clear(&self) {
        self.inner.write().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use biolit_core::entity::EvidenceLocator;

    fn add(graph: &mut KnowledgeGraph, id: &EntityId, entity_type: EntityType, name: &str, article: &str) {
        graph.upsert_entity(
            id,
            entity_type,
            name,
            Alias {
                surface: name,
                normalized: &name.to_lowercase(),
            },
            article,
            &Resolution::Internal,
        );
    }

    fn evidence(article: &str, confidence: f64) -> Evidence {
        Evidence {
            article_id: article.into(),
            locator: EvidenceLocator::Article,
            confidence,
        }
    }

    fn ids() -> (EntityId, EntityId, EntityId) {
        (
            EntityId::from("UniProt:P04637"),
            EntityId::from("OMIM:114480"),
            EntityId::from("UniProt:P38398"),
        )
    }

    fn sample() -> KnowledgeGraph {
        let (tp53, bc, brca1) = ids();
        let mut graph = KnowledgeGraph::new();
        add(&mut graph, &tp53, EntityType::Gene, "TP53", "a1");
        add(&mut graph, &bc, EntityType::Disease, "breast cancer", "a1");
        add(&mut graph, &brca1, EntityType::Gene, "BRCA1", "a2");
        graph.merge_relationship(&tp53, &bc, evidence("a1", 0.8)).unwrap();
        graph.merge_relationship(&brca1, &tp53, evidence("a2", 0.6)).unwrap();
        graph
    }

    #[test]
    fn merge_creates_then_updates_single_edge() {
        let (tp53, bc, _) = ids();
        let mut graph = sample();

        let (rel, outcome) = graph.merge_relationship(&bc, &tp53, evidence("a3", 0.5)).unwrap();
        assert_eq!(outcome, MergeOutcome::Updated);
        assert_eq!(rel.evidence_count(), 2);
        assert!((rel.weight - 1.3).abs() < 1e-9);
        assert_eq!(graph.relationship_count(), 2);
    }

    #[test]
    fn weight_never_decreases() {
        let (tp53, bc, _) = ids();
        let mut graph = sample();
        let mut last = graph.relationship(&tp53, &bc).unwrap().weight;
        for (article, confidence) in [("a1", 0.1), ("a4", 0.0), ("a5", 0.3)] {
            let (rel, _) = graph
                .merge_relationship(&tp53, &bc, evidence(article, confidence))
                .unwrap();
            assert!(rel.weight >= last);
            last = rel.weight;
        }
    }

    #[test]
    fn self_pairs_and_unknown_endpoints_are_rejected() {
        let (tp53, _, _) = ids();
        let mut graph = sample();
        assert!(graph.merge_relationship(&tp53, &tp53, evidence("a1", 0.5)).is_err());
        assert!(graph
            .merge_relationship(&tp53, &EntityId::from("ChEMBL:CHEMBL25"), evidence("a1", 0.5))
            .is_err());
    }

    #[test]
    fn neighbors_are_restartable() {
        let (tp53, bc, brca1) = ids();
        let graph = sample();

        let first: Vec<&EntityId> = graph.neighbors(&tp53).map(|e| &e.id).collect();
        let second: Vec<&EntityId> = graph.neighbors(&tp53).map(|e| &e.id).collect();
        assert_eq!(first, second);
        assert_eq!(first, vec![&bc, &brca1]);
        assert_eq!(graph.neighbors(&bc).count(), 1);
        assert_eq!(graph.neighbors(&EntityId::from("x:y")).count(), 0);
        assert_eq!(graph.relationships_of(&tp53).count(), 2);
    }

    #[test]
    fn entities_by_type_and_stats() {
        let graph = sample();
        assert_eq!(graph.entities_by_type(EntityType::Gene).count(), 2);
        assert_eq!(graph.entities_by_type(EntityType::Drug).count(), 0);

        let stats = graph.stats();
        assert_eq!(stats.entity_count, 3);
        assert_eq!(stats.relationship_count, 2);
        assert_eq!(stats.unresolved_count, 3);
        assert_eq!(stats.entity_types.len(), 2);
    }

    #[test]
    fn export_is_sorted_and_complete() {
        let (tp53, bc, _) = ids();
        let graph = sample();
        let snapshot = graph.export();

        assert_eq!(snapshot.nodes.len(), 3);
        assert_eq!(snapshot.edges.len(), 2);
        let ids: Vec<&EntityId> = snapshot.nodes.iter().map(|n| &n.id).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);

        let edge = snapshot.edge(&bc, &tp53).unwrap();
        assert_eq!(edge.evidence_count, 1);
        assert!(edge.article_ids.contains("a1"));
        assert_eq!(snapshot, graph.export());
    }

    #[test]
    fn clear_empties_everything() {
        let mut graph = sample();
        graph.record_article(ArticleSummary {
            id: "a1".into(),
            title: "t".into(),
            journal: String::new(),
            year: None,
        });
        graph.clear();
        assert_eq!(graph.entity_count(), 0);
        assert_eq!(graph.relationship_count(), 0);
        assert!(!graph.has_article("a1"));
    }

    #[tokio::test]
    async fn shared_graph_reads_are_snapshots() {
        let (tp53, bc, _) = ids();
        let shared = SharedGraph::new();
        *shared.write().await = sample();

        let neighbors = shared.neighbors(&tp53).await;
        assert_eq!(neighbors.len(), 2);

        assert_eq!(shared.entities_by_alias("tp53").await.len(), 1);
        assert!(shared.relationship(&bc, &tp53).await.is_some());

        let detail = shared.entity_detail(&tp53).await.unwrap();
        assert_eq!(detail.relationships.len(), 2);
        assert!(shared.entity_detail(&EntityId::from("x:y")).await.is_err());

        shared.clear().await;
        assert!(shared.entity(&tp53).await.is_none());
        // The earlier copy is unaffected.
        assert_eq!(neighbors.len(), 2);
    }
}
