use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{BiolitError, Result};

/// Analysis window used when pairing co-occurring entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "granularity", rename_all = "snake_case")]
pub enum CooccurrenceWindow {
    /// Every pair of entities in the article.
    #[default]
    Article,
    /// Entities whose sentences are at most `span` sentences apart.
    Sentence { span: usize },
}

impl FromStr for CooccurrenceWindow {
    type Err = BiolitError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim().to_lowercase();
        match s.split_once(':') {
            None if s == "article" => Ok(CooccurrenceWindow::Article),
            None if s == "sentence" => Ok(CooccurrenceWindow::Sentence { span: 0 }),
            Some(("sentence", span)) => span
                .parse()
                .map(|span| CooccurrenceWindow::Sentence { span })
                .map_err(|_| BiolitError::Config(format!("invalid sentence span: {span}"))),
            _ => Err(BiolitError::Config(format!("unknown co-occurrence window: {s}"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BiolitConfig {
    pub cooccurrence: CooccurrenceWindow,
    pub tagging_timeout_secs: u64,
    pub lookup_timeout_secs: u64,
    pub uniprot_url: Url,
    pub omim_url: Url,
    pub omim_api_key: Option<String>,
    pub chembl_url: Url,
    pub anthropic_api_key: Option<String>,
    pub server_host: String,
    pub server_port: u16,
}

impl Default for BiolitConfig {
    fn default() -> Self {
        Self {
            cooccurrence: CooccurrenceWindow::Article,
            tagging_timeout_secs: 30,
            lookup_timeout_secs: 5,
            uniprot_url: Url::parse("https://rest.uniprot.org").expect("static url"),
            omim_url: Url::parse("https://api.omim.org").expect("static url"),
            omim_api_key: None,
            chembl_url: Url::parse("https://www.ebi.ac.uk/chembl/api/data").expect("static url"),
            anthropic_api_key: None,
            server_host: "0.0.0.0".into(),
            server_port: 8080,
        }
    }
}

impl BiolitConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            cooccurrence: match std::env::var("BIOLIT_COOCCURRENCE") {
                Ok(v) => v.parse()?,
                Err(_) => defaults.cooccurrence,
            },
            tagging_timeout_secs: env_u64("BIOLIT_TAGGING_TIMEOUT_SECS")
                .unwrap_or(defaults.tagging_timeout_secs),
            lookup_timeout_secs: env_u64("BIOLIT_LOOKUP_TIMEOUT_SECS")
                .unwrap_or(defaults.lookup_timeout_secs),
            uniprot_url: env_url("UNIPROT_URL")?.unwrap_or(defaults.uniprot_url),
            omim_url: env_url("OMIM_URL")?.unwrap_or(defaults.omim_url),
            omim_api_key: env_non_empty("OMIM_API_KEY"),
            chembl_url: env_url("CHEMBL_URL")?.unwrap_or(defaults.chembl_url),
            anthropic_api_key: env_non_empty("ANTHROPIC_API_KEY"),
            server_host: std::env::var("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port: std::env::var("SERVER_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.server_port),
        })
    }

    pub fn tagging_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.tagging_timeout_secs)
    }

    pub fn lookup_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.lookup_timeout_secs)
    }
}

fn env_u64(key: &str) -> Option<u64> {
    let value = std::env::var(key).ok()?;
    match value.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(key, value = %value, "Ignoring non-numeric setting");
            None
        }
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_url(key: &str) -> Result<Option<Url>> {
    match std::env::var(key) {
        Ok(v) => Url::parse(&v)
            .map(Some)
            .map_err(|e| BiolitError::Config(format!("{key} is not a valid URL: {e}"))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_cooccurrence_window() {
        assert_eq!("article".parse::<CooccurrenceWindow>().unwrap(), CooccurrenceWindow::Article);
        assert_eq!(
            "Sentence".parse::<CooccurrenceWindow>().unwrap(),
            CooccurrenceWindow::Sentence { span: 0 }
        );
        assert_eq!(
            "sentence:2".parse::<CooccurrenceWindow>().unwrap(),
            CooccurrenceWindow::Sentence { span: 2 }
        );
        assert!("sentence:x".parse::<CooccurrenceWindow>().is_err());
        assert!("paragraph".parse::<CooccurrenceWindow>().is_err());
    }

    #[test]
    fn defaults() {
        let config = BiolitConfig::default();
        assert_eq!(config.cooccurrence, CooccurrenceWindow::Article);
        assert_eq!(config.lookup_timeout().as_secs(), 5);
        assert_eq!(config.tagging_timeout().as_secs(), 30);
        assert!(config.omim_api_key.is_none());
    }
}
