//! Mention processing: tagging adapters, normalization, resolution and
//! co-occurrence evidence.

pub mod cooccurrence;
pub mod dictionary;
pub mod normalizer;
pub mod resolver;
pub mod tagger;

pub use cooccurrence::{sentence_spans, CooccurrenceBuilder, ResolvedMention};
pub use dictionary::DictionaryTagger;
pub use normalizer::{lexical, AliasTable, Normalizer};
pub use resolver::{Resolved, Resolver};
pub use tagger::LlmTagger;
