use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use biolit_core::entity::EntityType;
use biolit_core::error::Result;
use biolit_core::lookup::{ExternalIdentifier, ReferenceLookup};

use crate::http;

const NAMESPACE: &str = "OMIM";

#[derive(Debug, Deserialize)]
struct OmimResponse {
    omim: OmimBody,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OmimBody {
    search_response: Option<SearchResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    #[serde(default)]
    entry_list: Vec<EntryWrapper>,
}

#[derive(Debug, Deserialize)]
struct EntryWrapper {
    entry: OmimEntry,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OmimEntry {
    mim_number: u64,
    titles: Option<Titles>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Titles {
    preferred_title: Option<String>,
}

/// Disease entries in OMIM. Every request needs an API key.
pub struct OmimLookup {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl OmimLookup {
    pub fn new(base_url: Url, api_key: impl Into<String>) -> Self {
        Self {
            client: http::client(),
            base_url,
            api_key: api_key.into(),
        }
    }

    fn first_hit(response: OmimResponse) -> Option<ExternalIdentifier> {
        let entry = response
            .omim
            .search_response?
            .entry_list
            .into_iter()
            .next()?
            .entry;

        let identifier = ExternalIdentifier::new(NAMESPACE, &entry.mim_number.to_string());
        // Preferred titles look like "BREAST CANCER; BC".
        let label = entry
            .titles
            .and_then(|t| t.preferred_title)
            .and_then(|t| t.split(';').next().map(|s| s.trim().to_string()))
            .filter(|t| !t.is_empty());

        Some(match label {
            Some(label) => identifier.with_label(label),
            None => identifier,
        })
    }
}

#[async_trait]
impl ReferenceLookup for OmimLookup {
    fn name(&self) -> &str {
        NAMESPACE
    }

    fn can_lookup(&self, entity_type: EntityType) -> bool {
        entity_type == EntityType::Disease
    }

    async fn lookup(
        &self,
        normalized: &str,
        _entity_type: EntityType,
    ) -> Result<Option<ExternalIdentifier>> {
        let url = http::endpoint(&self.base_url, &["api", "entry", "search"])?;
        let response: OmimResponse = http::get_json(
            &self.client,
            NAMESPACE,
            url,
            &[
                ("search", normalized),
                ("limit", "1"),
                ("format", "json"),
                ("apiKey", self.api_key.as_str()),
            ],
        )
        .await?;
        Ok(Self::first_hit(response))
    }
}
