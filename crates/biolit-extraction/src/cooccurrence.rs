//! Co-occurrence evidence between entities of one article.
//!
//! Evidence confidence is the minimum of the two entities' confidences, where
//! an entity's confidence inside a window is the highest confidence among its
//! mentions there.

use std::collections::BTreeMap;

use biolit_core::config::CooccurrenceWindow;
use biolit_core::entity::{EntityId, Evidence, EvidenceLocator, PairKey};

/// A validated mention after resolution, still carrying its position.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMention {
    pub id: EntityId,
    pub start: usize,
    pub end: usize,
    pub confidence: f64,
}

/// Character ranges `[start, end)` of the sentences in `text`.
///
/// A sentence ends after `.`, `!` or `?` followed by whitespace, or at a
/// blank line. Whitespace-only fragments are folded into the next sentence.
pub fn sentence_spans(text: &str) -> Vec<(usize, usize)> {
    let chars: Vec<char> = text.chars().collect();
    let mut spans = Vec::new();
    let mut start = 0;

    for i in 0..chars.len() {
        let next = chars.get(i + 1).copied();
        let boundary = (matches!(chars[i], '.' | '!' | '?') && next.is_some_and(char::is_whitespace))
            || (chars[i] == '\n' && next == Some('\n'));
        if boundary && chars[start..=i].iter().any(|c| !c.is_whitespace()) {
            spans.push((start, i + 1));
            start = i + 1;
        }
    }

    if start < chars.len() && chars[start..].iter().any(|c| !c.is_whitespace()) {
        spans.push((start, chars.len()));
    } else if let Some(last) = spans.last_mut() {
        last.1 = chars.len();
    }

    spans
}

fn sentence_index(spans: &[(usize, usize)], offset: usize) -> usize {
    spans
        .partition_point(|&(_, end)| end <= offset)
        .min(spans.len().saturating_sub(1))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CooccurrenceBuilder {
    window: CooccurrenceWindow,
}

impl CooccurrenceBuilder {
    pub fn new(window: CooccurrenceWindow) -> Self {
        Self { window }
    }

    pub fn window(&self) -> CooccurrenceWindow {
        self.window
    }

    /// One evidence record per unordered entity pair per window, sorted by
    /// pair. Self-pairs never produce evidence.
    pub fn build(
        &self,
        article_id: &str,
        text: &str,
        mentions: &[ResolvedMention],
    ) -> Vec<(PairKey, Evidence)> {
        match self.window {
            CooccurrenceWindow::Article => Self::article_level(article_id, mentions),
            CooccurrenceWindow::Sentence { span } => {
                Self::sentence_level(article_id, text, mentions, span)
            }
        }
    }

    fn article_level(article_id: &str, mentions: &[ResolvedMention]) -> Vec<(PairKey, Evidence)> {
        let mut best: BTreeMap<&EntityId, f64> = BTreeMap::new();
        for m in mentions {
            let slot = best.entry(&m.id).or_insert(m.confidence);
            if m.confidence > *slot {
                *slot = m.confidence;
            }
        }

        let entities: Vec<(&EntityId, f64)> = best.into_iter().collect();
        let mut out = Vec::new();
        for (i, (a, ca)) in entities.iter().enumerate() {
            for (b, cb) in &entities[i + 1..] {
                if let Some(pair) = PairKey::new((*a).clone(), (*b).clone()) {
                    out.push((
                        pair,
                        Evidence {
                            article_id: article_id.to_string(),
                            locator: EvidenceLocator::Article,
                            confidence: ca.min(*cb),
                        },
                    ));
                }
            }
        }
        out
    }

    fn sentence_level(
        article_id: &str,
        text: &str,
        mentions: &[ResolvedMention],
        span: usize,
    ) -> Vec<(PairKey, Evidence)> {
        let spans = sentence_spans(text);
        let located: Vec<(usize, &ResolvedMention)> = mentions
            .iter()
            .map(|m| (sentence_index(&spans, m.start), m))
            .collect();

        let mut windows: BTreeMap<(PairKey, usize, usize), f64> = BTreeMap::new();
        for (i, (si, mi)) in located.iter().enumerate() {
            for (sj, mj) in &located[i + 1..] {
                if si.abs_diff(*sj) > span {
                    continue;
                }
                let Some(pair) = PairKey::new(mi.id.clone(), mj.id.clone()) else {
                    continue;
                };
                let confidence = mi.confidence.min(mj.confidence);
                let slot = windows
                    .entry((pair, *si.min(sj), *si.max(sj)))
                    .or_insert(confidence);
                if confidence > *slot {
                    *slot = confidence;
                }
            }
        }

        windows
            .into_iter()
            .map(|((pair, first, last), confidence)| {
                (
                    pair,
                    Evidence {
                        article_id: article_id.to_string(),
                        locator: EvidenceLocator::Sentences { first, last },
                        confidence,
                    },
                )
            })
            .collect()
    }
}
