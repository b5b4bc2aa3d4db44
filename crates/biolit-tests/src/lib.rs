//! Shared fakes for the cross-crate tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use biolit_core::{
    ArticleRecord, BiolitError, EntityTagger, EntityType, ExternalIdentifier, RawMention,
    ReferenceLookup, Result,
};

/// Tags articles by exact text, failing for anything it was not scripted for.
#[derive(Default)]
pub struct ScriptedTagger {
    script: HashMap<String, Vec<RawMention>>,
}

impl ScriptedTagger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the mentions for `article`, locating each `(type, surface,
    /// confidence)` at its first occurrence in the article text.
    pub fn with_article(mut self, article: &ArticleRecord, mentions: &[(EntityType, &str, f64)]) -> Self {
        let text = article.text();
        let mut tagged = Vec::new();
        for &(entity_type, surface, confidence) in mentions {
            tagged.extend(locate(&text, entity_type, surface, confidence));
        }
        self.script.insert(text, tagged);
        self
    }

    pub fn with_raw(mut self, article: &ArticleRecord, mentions: Vec<RawMention>) -> Self {
        self.script.insert(article.text(), mentions);
        self
    }
}

/// Every occurrence of `surface` in `text`, with character offsets.
pub fn locate(text: &str, entity_type: EntityType, surface: &str, confidence: f64) -> Vec<RawMention> {
    let chars: Vec<char> = text.chars().collect();
    let needle: Vec<char> = surface.chars().collect();
    if needle.is_empty() || needle.len() > chars.len() {
        return Vec::new();
    }
    (0..=chars.len() - needle.len())
        .filter(|&i| chars[i..i + needle.len()] == needle[..])
        .map(|i| RawMention::new(entity_type, surface, i, i + needle.len(), confidence))
        .collect()
}

#[async_trait]
impl EntityTagger for ScriptedTagger {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn tag(&self, text: &str) -> Result<Vec<RawMention>> {
        self.script
            .get(text)
            .cloned()
            .ok_or_else(|| BiolitError::Tagging("no script for text".into()))
    }
}

/// How a [`FakeVocabulary`] answers.
#[derive(Debug, Clone, Copy)]
pub enum Behaviour {
    Answer,
    Fail,
    Hang,
}

/// A vocabulary with a fixed table that can be made to fail or hang.
pub struct FakeVocabulary {
    name: String,
    behaviour: Behaviour,
    entries: HashMap<(EntityType, String), String>,
}

impl FakeVocabulary {
    pub fn new(name: &str, behaviour: Behaviour) -> Self {
        Self {
            name: name.to_string(),
            behaviour,
            entries: HashMap::new(),
        }
    }

    pub fn with_entry(mut self, entity_type: EntityType, normalized: &str, accession: &str) -> Self {
        self.entries
            .insert((entity_type, normalized.to_string()), accession.to_string());
        self
    }

    pub fn shared(self) -> Arc<dyn ReferenceLookup> {
        Arc::new(self)
    }
}

#[async_trait]
impl ReferenceLookup for FakeVocabulary {
    fn name(&self) -> &str {
        &self.name
    }

    fn can_lookup(&self, _entity_type: EntityType) -> bool {
        true
    }

    async fn lookup(
        &self,
        normalized: &str,
        entity_type: EntityType,
    ) -> Result<Option<ExternalIdentifier>> {
        match self.behaviour {
            Behaviour::Answer => Ok(self
                .entries
                .get(&(entity_type, normalized.to_string()))
                .map(|accession| ExternalIdentifier::new(&self.name, accession))),
            Behaviour::Fail => Err(BiolitError::Lookup {
                vocabulary: self.name.clone(),
                message: "503 Service Unavailable".into(),
            }),
            Behaviour::Hang => {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(None)
            }
        }
    }
}
