use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use biolit_core::entity::EntityType;
use biolit_core::error::Result;
use biolit_core::lookup::{ExternalIdentifier, ReferenceLookup};

use crate::http;

const NAMESPACE: &str = "ChEMBL";

#[derive(Debug, Deserialize)]
struct MoleculeResponse {
    #[serde(default)]
    molecules: Vec<Molecule>,
}

#[derive(Debug, Deserialize)]
struct Molecule {
    molecule_chembl_id: String,
    #[serde(default)]
    pref_name: Option<String>,
}

/// Drug molecules in ChEMBL, matched on preferred name.
pub struct ChemblLookup {
    client: Client,
    base_url: Url,
}

impl ChemblLookup {
    pub fn new(base_url: Url) -> Self {
        Self {
            client: http::client(),
            base_url,
        }
    }

    fn first_hit(response: MoleculeResponse) -> Option<ExternalIdentifier> {
        let molecule = response.molecules.into_iter().next()?;
        let identifier = ExternalIdentifier::new(NAMESPACE, &molecule.molecule_chembl_id);
        Some(match molecule.pref_name {
            Some(name) => identifier.with_label(name),
            None => identifier,
        })
    }
}

#[async_trait]
impl ReferenceLookup for ChemblLookup {
    fn name(&self) -> &str {
        NAMESPACE
    }

    fn can_lookup(&self, entity_type: EntityType) -> bool {
        entity_type == EntityType::Drug
    }

    async fn lookup(
        &self,
        normalized: &str,
        _entity_type: EntityType,
    ) -> Result<Option<ExternalIdentifier>> {
        let url = http::endpoint(&self.base_url, &["molecule.json"])?;
        let response: MoleculeResponse = http::get_json(
            &self.client,
            NAMESPACE,
            url,
            &[("pref_name__iexact", normalized), ("limit", "1")],
        )
        .await?;
        Ok(Self::first_hit(response))
    }
}
