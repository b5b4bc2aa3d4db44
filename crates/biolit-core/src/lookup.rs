use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::entity::{EntityId, EntityType};
use crate::error::Result;

/// A hit in a reference vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalIdentifier {
    pub namespace: String,
    pub accession: String,
    /// Preferred label, when the vocabulary returns one.
    pub label: Option<String>,
}

impl ExternalIdentifier {
    pub fn new(namespace: &str, accession: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            accession: accession.to_string(),
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn entity_id(&self) -> EntityId {
        EntityId::external(&self.namespace, &self.accession)
    }
}

/// Lookup against one reference vocabulary (UniProt, OMIM, ChEMBL, ...).
///
/// `Ok(None)` means the vocabulary has no entry; `Err` means it could not be
/// asked. The resolver treats both as a non-match.
#[async_trait]
pub trait ReferenceLookup: Send + Sync {
    fn name(&self) -> &str;

    /// Which entity types this vocabulary covers.
    fn can_lookup(&self, entity_type: EntityType) -> bool;

    async fn lookup(
        &self,
        normalized: &str,
        entity_type: EntityType,
    ) -> Result<Option<ExternalIdentifier>>;
}
