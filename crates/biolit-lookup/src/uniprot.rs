use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use biolit_core::entity::EntityType;
use biolit_core::error::Result;
use biolit_core::lookup::{ExternalIdentifier, ReferenceLookup};

use crate::http;

const NAMESPACE: &str = "UniProt";
const HUMAN_TAXON: &str = "9606";

#[derive(Debug, Deserialize)]
struct UniProtSearchResponse {
    #[serde(default)]
    results: Vec<UniProtEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UniProtEntry {
    primary_accession: String,
    #[serde(default)]
    genes: Vec<UniProtGene>,
    #[serde(default)]
    protein_description: Option<ProteinDescription>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UniProtGene {
    gene_name: Option<TextValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProteinDescription {
    recommended_name: Option<RecommendedName>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecommendedName {
    full_name: Option<TextValue>,
}

#[derive(Debug, Deserialize)]
struct TextValue {
    value: String,
}

/// Reviewed human entries in UniProtKB, for genes and proteins.
pub struct UniProtLookup {
    client: Client,
    base_url: Url,
}

impl UniProtLookup {
    pub fn new(base_url: Url) -> Self {
        Self {
            client: http::client(),
            base_url,
        }
    }

    fn query(normalized: &str, entity_type: EntityType) -> String {
        let term = normalized.replace('"', "");
        let field = match entity_type {
            EntityType::Protein => format!("(gene_exact:\"{term}\" OR protein_name:\"{term}\")"),
            _ => format!("gene_exact:\"{term}\""),
        };
        format!("{field} AND organism_id:{HUMAN_TAXON} AND reviewed:true")
    }

    fn first_hit(
        response: UniProtSearchResponse,
        entity_type: EntityType,
    ) -> Option<ExternalIdentifier> {
        let entry = response.results.into_iter().next()?;
        let gene = entry
            .genes
            .into_iter()
            .find_map(|g| g.gene_name.map(|n| n.value));
        let protein = entry
            .protein_description
            .and_then(|d| d.recommended_name)
            .and_then(|r| r.full_name)
            .map(|n| n.value);

        let label = match entity_type {
            EntityType::Protein => protein.or(gene),
            _ => gene.or(protein),
        };

        let identifier = ExternalIdentifier::new(NAMESPACE, &entry.primary_accession);
        Some(match label {
            Some(label) => identifier.with_label(label),
            None => identifier,
        })
    }
}

#[async_trait]
impl ReferenceLookup for UniProtLookup {
    fn name(&self) -> &str {
        NAMESPACE
    }

    fn can_lookup(&self, entity_type: EntityType) -> bool {
        matches!(entity_type, EntityType::Gene | EntityType::Protein)
    }

    async fn lookup(
        &self,
        normalized: &str,
        entity_type: EntityType,
    ) -> Result<Option<ExternalIdentifier>> {
        let url = http::endpoint(&self.base_url, &["uniprotkb", "search"])?;
        let query = Self::query(normalized, entity_type);
        let response: UniProtSearchResponse = http::get_json(
            &self.client,
            NAMESPACE,
            url,
            &[
                ("query", query.as_str()),
                ("fields", "accession,gene_primary,protein_name"),
                ("format", "json"),
                ("size", "1"),
            ],
        )
        .await?;
        Ok(Self::first_hit(response, entity_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "results": [{
            "entryType": "UniProtKB reviewed (Swiss-Prot)",
            "primaryAccession": "P04637",
            "genes": [{"geneName": {"value": "TP53"}}],
            "proteinDescription": {
                "recommendedName": {"fullName": {"value": "Cellular tumor antigen p53"}}
            }
        }]
    }"#;

    #[test]
    fn parses_gene_hit() {
        let response: UniProtSearchResponse = serde_json::from_str(SAMPLE).unwrap();
        let hit = UniProtLookup::first_hit(response, EntityType::Gene).unwrap();
        assert_eq!(hit.entity_id().as_str(), "UniProt:P04637");
        assert_eq!(hit.label.as_deref(), Some("TP53"));
    }

    #[test]
    fn protein_prefers_protein_name() {
        let response: UniProtSearchResponse = serde_json::from_str(SAMPLE).unwrap();
        let hit = UniProtLookup::first_hit(response, EntityType::Protein).unwrap();
        assert_eq!(hit.label.as_deref(), Some("Cellular tumor antigen p53"));
    }

    #[test]
    fn empty_results_are_a_miss() {
        let response: UniProtSearchResponse = serde_json::from_str(r#"{"results": []}"#).unwrap();
        assert!(UniProtLookup::first_hit(response, EntityType::Gene).is_none());
    }

    #[test]
    fn query_is_restricted_to_reviewed_human_entries() {
        let q = UniProtLookup::query("tp53", EntityType::Gene);
        assert_eq!(q, "gene_exact:\"tp53\" AND organism_id:9606 AND reviewed:true");
        assert!(UniProtLookup::query("p53", EntityType::Protein).contains("protein_name"));
    }

    #[test]
    fn handles_only_genes_and_proteins() {
        let lookup = UniProtLookup::new(Url::parse("https://rest.uniprot.org").unwrap());
        assert!(lookup.can_lookup(EntityType::Gene));
        assert!(lookup.can_lookup(EntityType::Protein));
        assert!(!lookup.can_lookup(EntityType::Drug));
    }
}
