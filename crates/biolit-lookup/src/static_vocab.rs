use std::collections::HashMap;

use async_trait::async_trait;

use biolit_core::entity::EntityType;
use biolit_core::error::Result;
use biolit_core::lookup::{ExternalIdentifier, ReferenceLookup};

/// Curated in-memory identifiers, consulted before any remote vocabulary.
///
/// Keys are normalized forms, so callers must normalize before looking up.
#[derive(Debug, Clone, Default)]
pub struct StaticVocabulary {
    entries: HashMap<(EntityType, String), ExternalIdentifier>,
}

impl StaticVocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(
        mut self,
        entity_type: EntityType,
        normalized: &str,
        identifier: ExternalIdentifier,
    ) -> Self {
        self.entries
            .insert((entity_type, normalized.trim().to_lowercase()), identifier);
        self
    }

    /// Well-known human genes, diseases and drugs.
    pub fn biomedical_defaults() -> Self {
        let genes = [
            ("tp53", "P04637", "TP53"),
            ("brca1", "P38398", "BRCA1"),
            ("brca2", "P51587", "BRCA2"),
            ("egfr", "P00533", "EGFR"),
            ("kras", "P01116", "KRAS"),
            ("erbb2", "P04626", "ERBB2"),
            ("myc", "P01106", "MYC"),
            ("pten", "P60484", "PTEN"),
            ("braf", "P15056", "BRAF"),
            ("mdm2", "Q00987", "MDM2"),
        ];
        let diseases = [
            ("breast cancer", "114480", "Breast cancer"),
            ("lifraumeni syndrome", "151623", "Li-Fraumeni syndrome"),
            ("colorectal cancer", "114500", "Colorectal cancer"),
            ("ovarian cancer", "167000", "Ovarian cancer"),
        ];
        let drugs = [
            ("aspirin", "CHEMBL25", "ASPIRIN"),
            ("tamoxifen", "CHEMBL83", "TAMOXIFEN"),
            ("imatinib", "CHEMBL941", "IMATINIB"),
            ("cisplatin", "CHEMBL11359", "CISPLATIN"),
            ("trastuzumab", "CHEMBL1201585", "TRASTUZUMAB"),
        ];

        let mut vocab = Self::new();
        for (key, accession, label) in genes {
            let id = ExternalIdentifier::new("UniProt", accession).with_label(label);
            vocab = vocab
                .with_entry(EntityType::Gene, key, id.clone())
                .with_entry(EntityType::Protein, key, id);
        }
        for (key, accession, label) in diseases {
            vocab = vocab.with_entry(
                EntityType::Disease,
                key,
                ExternalIdentifier::new("OMIM", accession).with_label(label),
            );
        }
        for (key, accession, label) in drugs {
            vocab = vocab.with_entry(
                EntityType::Drug,
                key,
                ExternalIdentifier::new("ChEMBL", accession).with_label(label),
            );
        }
        vocab
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl ReferenceLookup for StaticVocabulary {
    fn name(&self) -> &str {
        "static"
    }

    fn can_lookup(&self, entity_type: EntityType) -> bool {
        self.entries.keys().any(|(t, _)| *t == entity_type)
    }

    async fn lookup(
        &self,
        normalized: &str,
        entity_type: EntityType,
    ) -> Result<Option<ExternalIdentifier>> {
        Ok(self
            .entries
            .get(&(entity_type, normalized.to_string()))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lookup_is_keyed_by_type() {
        let vocab = StaticVocabulary::biomedical_defaults();

        let hit = vocab.lookup("tp53", EntityType::Gene).await.unwrap().unwrap();
        assert_eq!(hit.entity_id().as_str(), "UniProt:P04637");
        assert_eq!(hit.label.as_deref(), Some("TP53"));

        assert!(vocab.lookup("tp53", EntityType::Drug).await.unwrap().is_none());
        assert!(vocab.lookup("unknown", EntityType::Gene).await.unwrap().is_none());
    }

    #[test]
    fn empty_vocabulary_handles_nothing() {
        let vocab = StaticVocabulary::new();
        assert!(vocab.is_empty());
        assert!(!vocab.can_lookup(EntityType::Gene));
        assert!(StaticVocabulary::biomedical_defaults().can_lookup(EntityType::Disease));
    }
}
