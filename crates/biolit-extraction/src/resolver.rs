use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use biolit_core::entity::{EntityId, EntityType, Resolution};
use biolit_core::error::{BiolitError, Result};
use biolit_core::lookup::ReferenceLookup;

/// Outcome of resolving one normalized mention.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub id: EntityId,
    pub resolution: Resolution,
    /// Preferred label from the vocabulary that matched.
    pub label: Option<String>,
    /// Lookups that errored or timed out on the way to this result.
    pub degraded: usize,
}

/// Maps normalized mentions to canonical identifiers.
///
/// Vocabularies are consulted in the order given to [`Resolver::new`]; the
/// first hit wins. When nothing matches, a synthetic `internal:` identifier
/// derived from `(type, normalized form)` is returned instead.
#[derive(Clone)]
pub struct Resolver {
    lookups: Vec<Arc<dyn ReferenceLookup>>,
    timeout: Duration,
}

impl Resolver {
    pub fn new(lookups: Vec<Arc<dyn ReferenceLookup>>, timeout: Duration) -> Self {
        Self { lookups, timeout }
    }

    /// A resolver with no vocabularies: every mention gets a synthetic id.
    pub fn offline() -> Self {
        Self::new(Vec::new(), Duration::from_secs(5))
    }

    pub fn vocabularies(&self) -> Vec<String> {
        self.lookups.iter().map(|l| l.name().to_string()).collect()
    }

    /// Returns `None` for an empty normalized form, which is unresolvable.
    pub async fn resolve(&self, normalized: &str, entity_type: EntityType) -> Option<Resolved> {
        if normalized.is_empty() {
            return None;
        }

        let mut degraded = 0;

        for lookup in self.lookups.iter().filter(|l| l.can_lookup(entity_type)) {
            let vocabulary = lookup.name();
            match timed(vocabulary, self.timeout, lookup.lookup(normalized, entity_type)).await {
                Ok(Some(hit)) => {
                    tracing::debug!(
                        vocabulary,
                        normalized,
                        entity_type = %entity_type,
                        accession = %hit.accession,
                        "Resolved mention"
                    );
                    // The identifier namespace names the source, whichever
                    // vocabulary answered.
                    return Some(Resolved {
                        id: hit.entity_id(),
                        resolution: Resolution::External {
                            vocabulary: hit.namespace.clone(),
                        },
                        label: hit.label,
                        degraded,
                    });
                }
                Ok(None) => {
                    tracing::debug!(vocabulary, normalized, "No match in vocabulary");
                }
                Err(e) => {
                    degraded += 1;
                    tracing::warn!(
                        vocabulary,
                        normalized,
                        error = %e,
                        "Vocabulary lookup unavailable, trying next source"
                    );
                }
            }
        }

        Some(Resolved {
            id: EntityId::internal(entity_type, normalized),
            resolution: Resolution::Internal,
            label: None,
            degraded,
        })
    }
}

/// Bound a lookup by `timeout`, reporting expiry as a lookup error.
async fn timed<T, F>(vocabulary: &str, timeout: Duration, op: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, op).await {
        Ok(result) => result,
        Err(_) => Err(BiolitError::Lookup {
            vocabulary: vocabulary.to_string(),
            message: format!("timed out after {}ms", timeout.as_millis()),
        }),
    }
}
