//! Mention normalization.
//!
//! A mention is first folded lexically (lowercase, connector joining,
//! punctuation and whitespace collapse) and then, when a type-specific alias
//! table knows the folded form, mapped to its canonical form. Both steps are
//! pure, so `normalize(normalize(x)) == normalize(x)`.

use std::collections::HashMap;

use biolit_core::EntityType;

/// Characters that join two alphanumeric runs instead of separating them
/// (`IL-6` and `IL6` fold to the same key).
fn is_connector(c: char) -> bool {
    matches!(c, '-' | '_' | '.' | '\'' | '/' | '\u{2010}' | '\u{2011}' | '\u{2013}')
}

/// Purely lexical folding. Never fails; empty or punctuation-only input
/// yields an empty string.
pub fn lexical(raw: &str) -> String {
    let chars: Vec<char> = raw.chars().flat_map(char::to_lowercase).collect();
    let mut out = String::with_capacity(chars.len());
    let mut pending_space = false;

    for (i, &c) in chars.iter().enumerate() {
        if c.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(c);
        } else if is_connector(c)
            && i > 0
            && chars[i - 1].is_alphanumeric()
            && chars.get(i + 1).is_some_and(|n| n.is_alphanumeric())
        {
            continue;
        } else {
            pending_space = true;
        }
    }

    out
}

/// Immutable, per-type synonym table over lexical forms.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    entries: HashMap<EntityType, HashMap<String, String>>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from `(type, alias, canonical)` triples.
    ///
    /// Both sides are folded lexically. Chains (`a -> b -> c`) collapse to
    /// their end point and cycles collapse to their smallest member, so every
    /// stored target is itself unmapped.
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = (EntityType, &'a str, &'a str)>) -> Self {
        let mut raw: HashMap<EntityType, HashMap<String, String>> = HashMap::new();
        for (entity_type, alias, canonical) in entries {
            let alias = lexical(alias);
            let canonical = lexical(canonical);
            if alias.is_empty() || canonical.is_empty() || alias == canonical {
                continue;
            }
            raw.entry(entity_type).or_default().insert(alias, canonical);
        }

        let entries = raw
            .into_iter()
            .map(|(entity_type, map)| {
                let collapsed: HashMap<String, String> = map
                    .keys()
                    .filter_map(|key| {
                        let target = Self::terminal(&map, key);
                        (target != *key).then(|| (key.clone(), target))
                    })
                    .collect();
                (entity_type, collapsed)
            })
            .collect();

        Self { entries }
    }

    fn terminal(map: &HashMap<String, String>, start: &str) -> String {
        let mut path: Vec<String> = Vec::new();
        let mut current = start.to_string();
        while let Some(next) = map.get(&current) {
            if let Some(pos) = path.iter().position(|p| *p == current) {
                // Cycle: every member resolves to the same representative.
                return path[pos..].iter().min().cloned().unwrap_or(current);
            }
            path.push(current.clone());
            current = next.clone();
        }
        current
    }

    /// A small seed of well-known biomedical synonyms.
    pub fn biomedical_defaults() -> Self {
        Self::from_entries([
            (EntityType::Gene, "tumor protein p53", "TP53"),
            (EntityType::Gene, "tumour protein p53", "TP53"),
            (EntityType::Gene, "p53", "TP53"),
            (EntityType::Protein, "tumor protein p53", "p53"),
            (EntityType::Gene, "breast cancer 1", "BRCA1"),
            (EntityType::Gene, "breast cancer 2", "BRCA2"),
            (EntityType::Gene, "HER2", "ERBB2"),
            (EntityType::Gene, "HER-2/neu", "ERBB2"),
            (EntityType::Disease, "breast carcinoma", "breast cancer"),
            (EntityType::Disease, "mammary carcinoma", "breast cancer"),
            (EntityType::Disease, "NSCLC", "non-small cell lung cancer"),
            (EntityType::Disease, "non small cell lung carcinoma", "non-small cell lung cancer"),
            (EntityType::Drug, "acetylsalicylic acid", "aspirin"),
            (EntityType::Drug, "ASA", "aspirin"),
            (EntityType::Drug, "herceptin", "trastuzumab"),
            (EntityType::Drug, "nolvadex", "tamoxifen"),
        ])
    }

    pub fn canonical(&self, entity_type: EntityType, form: &str) -> Option<&str> {
        self.entries
            .get(&entity_type)
            .and_then(|m| m.get(form))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    aliases: AliasTable,
}

impl Normalizer {
    /// Lexical-only normalizer.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_aliases(aliases: AliasTable) -> Self {
        Self { aliases }
    }

    pub fn normalize(&self, raw: &str, entity_type: EntityType) -> String {
        let form = lexical(raw);
        match self.aliases.canonical(entity_type, &form) {
            Some(canonical) => canonical.to_string(),
            None => form,
        }
    }
}
