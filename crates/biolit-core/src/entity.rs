use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Gene,
    Protein,
    Disease,
    Drug,
    Other,
}

impl EntityType {
    pub const ALL: [EntityType; 5] = [
        EntityType::Gene,
        EntityType::Protein,
        EntityType::Disease,
        EntityType::Drug,
        EntityType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Gene => "gene",
            EntityType::Protein => "protein",
            EntityType::Disease => "disease",
            EntityType::Drug => "drug",
            EntityType::Other => "other",
        }
    }

    /// Lenient label parsing for tagger output. Unknown labels map to `Other`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "gene" | "genes" | "gene_symbol" => EntityType::Gene,
            "protein" | "proteins" | "gene_product" => EntityType::Protein,
            "disease" | "diseases" | "disorder" | "condition" | "phenotype" => {
                EntityType::Disease
            }
            "drug" | "drugs" | "chemical" | "compound" | "small_molecule" => EntityType::Drug,
            _ => EntityType::Other,
        }
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Namespace of identifiers synthesized for mentions no vocabulary knows.
pub const INTERNAL_NAMESPACE: &str = "internal";

const SYNTHETIC_ID_NAMESPACE: Uuid = Uuid::from_u128(0x5c1e_9b2a_41d7_4f0e_9a63_b10c_7e2d_0a11);

/// Canonical entity identifier: `<namespace>:<accession>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn external(namespace: &str, accession: &str) -> Self {
        Self(format!("{namespace}:{accession}"))
    }

    /// Stable identifier derived from the type and normalized form.
    pub fn internal(entity_type: EntityType, normalized: &str) -> Self {
        let key = format!("{}:{}", entity_type.as_str(), normalized);
        let hash = Uuid::new_v5(&SYNTHETIC_ID_NAMESPACE, key.as_bytes());
        Self(format!("{INTERNAL_NAMESPACE}:{hash}"))
    }

    pub fn namespace(&self) -> &str {
        self.0.split_once(':').map(|(ns, _)| ns).unwrap_or("")
    }

    pub fn is_internal(&self) -> bool {
        self.namespace() == INTERNAL_NAMESPACE
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// How an entity's identifier was obtained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Resolution {
    /// Matched by the named reference vocabulary.
    External { vocabulary: String },
    /// No vocabulary matched; the identifier is synthetic.
    Internal,
}

impl Resolution {
    pub fn is_external(&self) -> bool {
        matches!(self, Resolution::External { .. })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub entity_type: EntityType,
    pub name: String,
    /// Surface forms as they appeared in text.
    pub aliases: BTreeSet<String>,
    pub normalized_forms: BTreeSet<String>,
    pub articles: BTreeSet<String>,
    pub mention_count: u64,
    pub resolution: Resolution,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

impl Entity {
    pub fn new(id: EntityId, entity_type: EntityType, name: String, resolution: Resolution) -> Self {
        let now = Utc::now();
        Self {
            id,
            entity_type,
            name,
            aliases: BTreeSet::new(),
            normalized_forms: BTreeSet::new(),
            articles: BTreeSet::new(),
            mention_count: 0,
            resolution,
            first_seen: now,
            last_seen: now,
        }
    }

    pub fn article_count(&self) -> usize {
        self.articles.len()
    }
}

/// Unordered pair of distinct entity identifiers, stored in sorted order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PairKey {
    pub a: EntityId,
    pub b: EntityId,
}

impl PairKey {
    /// Returns `None` for a self-pair.
    pub fn new(x: EntityId, y: EntityId) -> Option<Self> {
        match x.cmp(&y) {
            std::cmp::Ordering::Less => Some(Self { a: x, b: y }),
            std::cmp::Ordering::Greater => Some(Self { a: y, b: x }),
            std::cmp::Ordering::Equal => None,
        }
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        &self.a == id || &self.b == id
    }

    pub fn other(&self, id: &EntityId) -> Option<&EntityId> {
        if &self.a == id {
            Some(&self.b)
        } else if &self.b == id {
            Some(&self.a)
        } else {
            None
        }
    }
}

/// Where in an article a co-occurrence was observed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EvidenceLocator {
    Article,
    /// Inclusive range of sentence indices.
    Sentences { first: usize, last: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub article_id: String,
    pub locator: EvidenceLocator,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    pub pair: PairKey,
    pub evidence: Vec<Evidence>,
    /// Sum of evidence confidences.
    pub weight: f64,
}

impl Relationship {
    pub fn new(pair: PairKey) -> Self {
        Self {
            pair,
            evidence: Vec::new(),
            weight: 0.0,
        }
    }

    /// Adds evidence and recomputes the weight.
    ///
    /// Evidence for an already recorded (article, locator) is folded into the
    /// existing record, keeping the higher confidence.
    pub fn add_evidence(&mut self, evidence: Evidence) {
        match self
            .evidence
            .iter_mut()
            .find(|e| e.article_id == evidence.article_id && e.locator == evidence.locator)
        {
            Some(existing) => {
                if evidence.confidence > existing.confidence {
                    existing.confidence = evidence.confidence;
                }
            }
            None => self.evidence.push(evidence),
        }
        self.weight = self.evidence.iter().map(|e| e.confidence).sum();
    }

    pub fn evidence_count(&self) -> usize {
        self.evidence.len()
    }

    pub fn article_ids(&self) -> BTreeSet<String> {
        self.evidence.iter().map(|e| e.article_id.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evidence(article: &str, confidence: f64) -> Evidence {
        Evidence {
            article_id: article.to_string(),
            locator: EvidenceLocator::Article,
            confidence,
        }
    }

    #[test]
    fn entity_type_from_label() {
        assert_eq!(EntityType::from_label("Gene"), EntityType::Gene);
        assert_eq!(EntityType::from_label("CHEMICAL"), EntityType::Drug);
        assert_eq!(EntityType::from_label("disorder"), EntityType::Disease);
        assert_eq!(EntityType::from_label("cell_line"), EntityType::Other);
    }

    #[test]
    fn internal_id_is_stable_and_type_sensitive() {
        let a = EntityId::internal(EntityType::Gene, "tp53");
        let b = EntityId::internal(EntityType::Gene, "tp53");
        let c = EntityId::internal(EntityType::Protein, "tp53");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.is_internal());
        assert_eq!(a.namespace(), INTERNAL_NAMESPACE);
    }

    #[test]
    fn external_id_namespace() {
        let id = EntityId::external("UniProt", "P04637");
        assert_eq!(id.as_str(), "UniProt:P04637");
        assert_eq!(id.namespace(), "UniProt");
        assert!(!id.is_internal());
    }

    #[test]
    fn pair_key_is_unordered() {
        let x = EntityId::from("A:1");
        let y = EntityId::from("B:2");
        assert_eq!(
            PairKey::new(x.clone(), y.clone()),
            PairKey::new(y.clone(), x.clone())
        );
        assert!(PairKey::new(x.clone(), x.clone()).is_none());

        let pair = PairKey::new(y.clone(), x.clone()).unwrap();
        assert_eq!(pair.other(&x), Some(&y));
        assert!(pair.contains(&y));
        assert_eq!(pair.other(&EntityId::from("C:3")), None);
    }

    #[test]
    fn relationship_weight_sums_evidence() {
        let pair = PairKey::new("A:1".into(), "B:2".into()).unwrap();
        let mut rel = Relationship::new(pair);
        rel.add_evidence(evidence("pmid1", 0.5));
        rel.add_evidence(evidence("pmid2", 0.25));
        assert_eq!(rel.evidence_count(), 2);
        assert!((rel.weight - 0.75).abs() < 1e-9);
        assert_eq!(rel.article_ids().len(), 2);
    }

    #[test]
    fn repeated_evidence_folds_into_one_record() {
        let pair = PairKey::new("A:1".into(), "B:2".into()).unwrap();
        let mut rel = Relationship::new(pair);
        rel.add_evidence(evidence("pmid1", 0.4));
        rel.add_evidence(evidence("pmid1", 0.9));
        rel.add_evidence(evidence("pmid1", 0.1));
        assert_eq!(rel.evidence_count(), 1);
        assert!((rel.weight - 0.9).abs() < 1e-9);
    }
}
