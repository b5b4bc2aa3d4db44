//! Gazetteer tagger: case-insensitive, whole-word matching of known terms.

use async_trait::async_trait;

use biolit_core::entity::EntityType;
use biolit_core::error::Result;
use biolit_core::tagging::{EntityTagger, RawMention};

#[derive(Debug, Clone)]
struct Term {
    chars: Vec<char>,
    entity_type: EntityType,
    confidence: f64,
}

/// Offline tagger over a fixed term list. Overlapping matches resolve to the
/// longest term starting earliest.
#[derive(Debug, Clone, Default)]
pub struct DictionaryTagger {
    terms: Vec<Term>,
}

fn fold(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

impl DictionaryTagger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_term(mut self, entity_type: EntityType, term: &str, confidence: f64) -> Self {
        let chars: Vec<char> = term.trim().chars().map(fold).collect();
        if !chars.is_empty() {
            self.terms.push(Term {
                chars,
                entity_type,
                confidence,
            });
        }
        self
    }

    /// A starter gazetteer of frequently studied oncology entities.
    pub fn biomedical_defaults() -> Self {
        let genes = [
            "TP53", "BRCA1", "BRCA2", "EGFR", "KRAS", "ERBB2", "HER2", "MYC", "PTEN", "PIK3CA",
            "ALK", "BRAF", "MDM2", "CDKN2A", "APC",
        ];
        let diseases = [
            "breast cancer",
            "lung cancer",
            "non-small cell lung cancer",
            "colorectal cancer",
            "ovarian cancer",
            "melanoma",
            "glioblastoma",
            "leukemia",
            "Li-Fraumeni syndrome",
        ];
        let drugs = [
            "tamoxifen", "trastuzumab", "erlotinib", "gefitinib", "olaparib", "cisplatin",
            "paclitaxel", "vemurafenib", "aspirin", "imatinib",
        ];
        let proteins = ["p53", "tumor protein p53", "HER2 receptor"];

        let mut tagger = Self::new();
        for term in genes {
            tagger = tagger.with_term(EntityType::Gene, term, 0.9);
        }
        for term in diseases {
            tagger = tagger.with_term(EntityType::Disease, term, 0.85);
        }
        for term in drugs {
            tagger = tagger.with_term(EntityType::Drug, term, 0.85);
        }
        for term in proteins {
            tagger = tagger.with_term(EntityType::Protein, term, 0.8);
        }
        tagger
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    fn find_all(&self, text: &str) -> Vec<RawMention> {
        let original: Vec<char> = text.chars().collect();
        let folded: Vec<char> = original.iter().copied().map(fold).collect();
        let at_boundary = |pos: usize| {
            pos == 0 || pos >= folded.len() || !folded[pos].is_alphanumeric() || !folded[pos - 1].is_alphanumeric()
        };

        let mut hits: Vec<(usize, usize, &Term)> = Vec::new();
        for term in &self.terms {
            let n = term.chars.len();
            if n > folded.len() {
                continue;
            }
            for start in 0..=folded.len() - n {
                if folded[start..start + n] == term.chars[..]
                    && at_boundary(start)
                    && at_boundary(start + n)
                {
                    hits.push((start, start + n, term));
                }
            }
        }

        hits.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));

        let mut mentions = Vec::new();
        let mut covered_until = 0;
        for (start, end, term) in hits {
            if start < covered_until {
                continue;
            }
            covered_until = end;
            mentions.push(RawMention {
                entity_type: term.entity_type,
                text: original[start..end].iter().collect(),
                start,
                end,
                confidence: term.confidence,
            });
        }
        mentions
    }
}

#[async_trait]
impl EntityTagger for DictionaryTagger {
    fn name(&self) -> &str {
        "dictionary"
    }

    async fn tag(&self, text: &str) -> Result<Vec<RawMention>> {
        let mentions = self.find_all(text);
        tracing::debug!(mentions = mentions.len(), "Dictionary tagging complete");
        Ok(mentions)
    }
}
