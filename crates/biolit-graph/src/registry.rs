use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::Utc;

use biolit_core::entity::{Entity, EntityId, EntityType, Resolution};

/// One observed surface form and its normalized key.
#[derive(Debug, Clone, Copy)]
pub struct Alias<'a> {
    pub surface: &'a str,
    pub normalized: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Merged,
}

/// Deduplicated entity store keyed by canonical identifier.
#[derive(Debug, Clone, Default)]
pub struct EntityRegistry {
    entities: BTreeMap<EntityId, Entity>,
    alias_index: HashMap<String, BTreeSet<EntityId>>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one mention of `id`.
    ///
    /// A new identifier creates an entity named `display_name`; a known one
    /// keeps its name, type and resolution. Either way the alias and article
    /// are added and the mention count goes up by exactly one.
    pub fn upsert(
        &mut self,
        id: &EntityId,
        entity_type: EntityType,
        display_name: &str,
        alias: Alias<'_>,
        article_id: &str,
        resolution: &Resolution,
    ) -> (&Entity, UpsertOutcome) {
        let outcome = if self.entities.contains_key(id) {
            UpsertOutcome::Merged
        } else {
            UpsertOutcome::Created
        };

        let entity = self.entities.entry(id.clone()).or_insert_with(|| {
            Entity::new(id.clone(), entity_type, display_name.to_string(), resolution.clone())
        });

        if entity.entity_type != entity_type {
            tracing::debug!(
                entity_id = %id,
                existing = %entity.entity_type,
                observed = %entity_type,
                "Mention type differs from registered type, keeping registered type"
            );
        }

        entity.aliases.insert(alias.surface.to_string());
        if !alias.normalized.is_empty() {
            entity.normalized_forms.insert(alias.normalized.to_string());
            self.alias_index
                .entry(alias.normalized.to_string())
                .or_default()
                .insert(id.clone());
        }
        entity.articles.insert(article_id.to_string());
        entity.mention_count += 1;
        entity.last_seen = Utc::now();

        (&*entity, outcome)
    }

    pub fn get(&self, id: &EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.entities.contains_key(id)
    }

    /// Entities that have been seen under the normalized form, in id order.
    pub fn by_alias<'a>(&'a self, normalized: &str) -> impl Iterator<Item = &'a Entity> + 'a {
        self.alias_index
            .get(normalized)
            .into_iter()
            .flatten()
            .filter_map(move |id| self.entities.get(id))
    }

    pub fn by_type(&self, entity_type: EntityType) -> impl Iterator<Item = &Entity> + '_ {
        self.entities
            .values()
            .filter(move |e| e.entity_type == entity_type)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.entities.values()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn clear(&mut self) {
        self.entities.clear();
        self.alias_index.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alias<'a>(surface: &'a str, normalized: &'a str) -> Alias<'a> {
        Alias { surface, normalized }
    }

    #[test]
    fn repeated_mentions_merge_into_one_entity() {
        let mut registry = EntityRegistry::new();
        let id = EntityId::external("UniProt", "P38398");

        let (_, first) = registry.upsert(
            &id,
            EntityType::Gene,
            "BRCA1",
            alias("BRCA1", "brca1"),
            "pmid1",
            &Resolution::External { vocabulary: "UniProt".into() },
        );
        let (entity, second) = registry.upsert(
            &id,
            EntityType::Gene,
            "ignored",
            alias("BRCA-1", "brca1"),
            "pmid2",
            &Resolution::Internal,
        );

        assert_eq!(first, UpsertOutcome::Created);
        assert_eq!(second, UpsertOutcome::Merged);
        assert_eq!(entity.name, "BRCA1");
        assert_eq!(entity.mention_count, 2);
        assert_eq!(entity.article_count(), 2);
        assert!(entity.aliases.contains("BRCA-1"));
        assert!(entity.resolution.is_external());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn same_article_twice_counts_mentions_not_articles() {
        let mut registry = EntityRegistry::new();
        let id = EntityId::internal(EntityType::Disease, "breast cancer");
        for _ in 0..3 {
            registry.upsert(
                &id,
                EntityType::Disease,
                "breast cancer",
                alias("breast cancer", "breast cancer"),
                "pmid1",
                &Resolution::Internal,
            );
        }

        let entity = registry.get(&id).unwrap();
        assert_eq!(entity.mention_count, 3);
        assert_eq!(entity.article_count(), 1);
        assert_eq!(entity.aliases.len(), 1);
    }

    #[test]
    fn alias_lookup_spans_types() {
        let mut registry = EntityRegistry::new();
        let gene = EntityId::internal(EntityType::Gene, "p53");
        let protein = EntityId::internal(EntityType::Protein, "p53");
        registry.upsert(&gene, EntityType::Gene, "p53", alias("p53", "p53"), "a", &Resolution::Internal);
        registry.upsert(&protein, EntityType::Protein, "p53", alias("P53", "p53"), "a", &Resolution::Internal);

        assert_eq!(registry.by_alias("p53").count(), 2);
        assert_eq!(registry.by_alias("tp53").count(), 0);
        assert_eq!(registry.by_type(EntityType::Protein).count(), 1);
    }
}
