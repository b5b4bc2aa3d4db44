use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::entity::EntityType;
use crate::error::Result;

/// A typed span produced by a tagger. Offsets are character offsets into the
/// tagged text, `start` inclusive and `end` exclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMention {
    pub entity_type: EntityType,
    pub text: String,
    pub start: usize,
    pub end: usize,
    pub confidence: f64,
}

impl RawMention {
    pub fn new(
        entity_type: EntityType,
        text: impl Into<String>,
        start: usize,
        end: usize,
        confidence: f64,
    ) -> Self {
        Self {
            entity_type,
            text: text.into(),
            start,
            end,
            confidence,
        }
    }

    /// Reason the mention cannot be used, if any. `text_len` is the length of
    /// the tagged text in characters.
    pub fn validate(&self, text_len: usize) -> Option<String> {
        if self.text.trim().is_empty() {
            return Some("empty mention text".to_string());
        }
        if self.start >= self.end {
            return Some(format!("empty span {}..{}", self.start, self.end));
        }
        if self.end > text_len {
            return Some(format!(
                "span {}..{} exceeds text length {}",
                self.start, self.end, text_len
            ));
        }
        if !self.confidence.is_finite() || !(0.0..=1.0).contains(&self.confidence) {
            return Some(format!("confidence {} outside 0..=1", self.confidence));
        }
        None
    }
}

/// Named-entity tagging capability. Implementations may be slow or fail; the
/// pipeline bounds every call with a timeout.
#[async_trait]
pub trait EntityTagger: Send + Sync {
    fn name(&self) -> &str;
    async fn tag(&self, text: &str) -> Result<Vec<RawMention>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_accepts_well_formed_mention() {
        let m = RawMention::new(EntityType::Gene, "TP53", 0, 4, 0.9);
        assert_eq!(m.validate(10), None);
    }

    #[test]
    fn validate_rejects_bad_spans_and_scores() {
        assert!(RawMention::new(EntityType::Gene, "  ", 0, 2, 0.9).validate(10).is_some());
        assert!(RawMention::new(EntityType::Gene, "TP53", 4, 4, 0.9).validate(10).is_some());
        assert!(RawMention::new(EntityType::Gene, "TP53", 8, 12, 0.9).validate(10).is_some());
        assert!(RawMention::new(EntityType::Gene, "TP53", 0, 4, 1.5).validate(10).is_some());
        assert!(RawMention::new(EntityType::Gene, "TP53", 0, 4, f64::NAN).validate(10).is_some());
    }
}
