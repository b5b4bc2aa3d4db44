use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Non-fatal problems met while ingesting one article.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IngestWarning {
    #[error("tagging unavailable for article {article_id}: {message}")]
    TaggingUnavailable { article_id: String, message: String },

    #[error("malformed mention '{text}' ({start}..{end}) in article {article_id}: {reason}")]
    MalformedMention {
        article_id: String,
        text: String,
        start: usize,
        end: usize,
        reason: String,
    },

    #[error("article {article_id} already ingested, skipped")]
    DuplicateIngestion { article_id: String },
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IngestResult {
    pub article_id: String,
    /// True when the article contributed nothing (duplicate or tagging failure).
    pub skipped: bool,
    pub mentions_processed: usize,
    pub entities_added: usize,
    pub entities_updated: usize,
    pub relationships_added_or_updated: usize,
    /// Vocabulary lookups that failed or timed out and were treated as misses.
    pub lookups_degraded: usize,
    pub warnings: Vec<IngestWarning>,
}

impl IngestResult {
    pub fn new(article_id: &str) -> Self {
        Self {
            article_id: article_id.to_string(),
            ..Default::default()
        }
    }
}
