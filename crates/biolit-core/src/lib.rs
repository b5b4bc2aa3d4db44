pub mod api_types;
pub mod article;
pub mod config;
pub mod entity;
pub mod error;
pub mod export;
pub mod ingest;
pub mod lookup;
pub mod tagging;

pub use article::{ArticleRecord, ArticleSummary, Author};
pub use config::{BiolitConfig, CooccurrenceWindow};
pub use entity::{
    Entity, EntityId, EntityType, Evidence, EvidenceLocator, PairKey, Relationship, Resolution,
};
pub use error::{BiolitError, Result};
pub use export::{EdgeExport, EntityTypeStat, GraphSnapshot, GraphStats, NodeExport};
pub use ingest::{IngestResult, IngestWarning};
pub use lookup::{ExternalIdentifier, ReferenceLookup};
pub use tagging::{EntityTagger, RawMention};
