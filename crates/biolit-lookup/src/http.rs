use reqwest::Client;
use serde::de::DeserializeOwned;
use url::Url;

use biolit_core::error::{BiolitError, Result};

const USER_AGENT: &str = "biolit/0.1";

pub(crate) fn client() -> Client {
    Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Appends path segments to `base`, keeping any path it already has.
pub(crate) fn endpoint(base: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| BiolitError::Config(format!("{base} cannot be used as a base URL")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn lookup_error(vocabulary: &str, message: String) -> BiolitError {
    BiolitError::Lookup {
        vocabulary: vocabulary.to_string(),
        message,
    }
}

/// GET `url` with `query` and decode the JSON body.
pub(crate) async fn get_json<T: DeserializeOwned>(
    client: &Client,
    vocabulary: &str,
    url: Url,
    query: &[(&str, &str)],
) -> Result<T> {
    tracing::debug!(vocabulary, url = %url, "Querying vocabulary");

    let response = client
        .get(url)
        .query(query)
        .send()
        .await
        .map_err(|e| lookup_error(vocabulary, format!("HTTP request failed: {e}")))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(lookup_error(
            vocabulary,
            format!(
                "API returned HTTP {}: {}",
                status,
                body.chars().take(500).collect::<String>()
            ),
        ));
    }

    response
        .json()
        .await
        .map_err(|e| lookup_error(vocabulary, format!("Failed to parse response JSON: {e}")))
}
