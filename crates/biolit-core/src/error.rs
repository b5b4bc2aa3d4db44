use thiserror::Error;

#[derive(Error, Debug)]
pub enum BiolitError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Tagging error: {0}")]
    Tagging(String),

    #[error("Lookup error ({vocabulary}): {message}")]
    Lookup { vocabulary: String, message: String },

    #[error("Graph error: {0}")]
    Graph(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, BiolitError>;
