use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub last_name: String,
    pub first_name: String,
    #[serde(default)]
    pub initials: String,
}

impl std::fmt::Display for Author {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.first_name, self.last_name)
    }
}

/// A retrieved literature record. Never mutated once handed to the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    /// Source identifier, normally the PubMed ID.
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub abstract_text: String,
    #[serde(default)]
    pub journal: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub authors: Vec<Author>,
}

impl ArticleRecord {
    pub fn new(id: impl Into<String>, title: impl Into<String>, abstract_text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            abstract_text: abstract_text.into(),
            journal: String::new(),
            year: None,
            authors: Vec::new(),
        }
    }

    /// The text handed to the tagger. Mention offsets are relative to it.
    ///
    /// Title and abstract are separated by a blank line, which the
    /// sentence splitter treats as a boundary.
    pub fn text(&self) -> String {
        if self.abstract_text.is_empty() {
            self.title.clone()
        } else if self.title.is_empty() {
            self.abstract_text.clone()
        } else {
            format!("{}\n\n{}", self.title, self.abstract_text)
        }
    }
}

/// Metadata kept by the graph for every ingested article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleSummary {
    pub id: String,
    pub title: String,
    pub journal: String,
    pub year: Option<i32>,
}

impl From<&ArticleRecord> for ArticleSummary {
    fn from(article: &ArticleRecord) -> Self {
        Self {
            id: article.id.clone(),
            title: article.title.clone(),
            journal: article.journal.clone(),
            year: article.year,
        }
    }
}
