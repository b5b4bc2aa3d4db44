use std::sync::Arc;

use biolit_core::{BiolitConfig, ReferenceLookup};

mod chembl;
mod http;
mod omim;
mod static_vocab;
mod uniprot;

pub use chembl::ChemblLookup;
pub use omim::OmimLookup;
pub use static_vocab::StaticVocabulary;
pub use uniprot::UniProtLookup;

/// Reference vocabularies in resolution priority order.
///
/// OMIM is only included when an API key is configured.
pub fn vocabulary_registry(config: &BiolitConfig) -> Vec<Arc<dyn ReferenceLookup>> {
    let mut registry: Vec<Arc<dyn ReferenceLookup>> = vec![
        Arc::new(StaticVocabulary::biomedical_defaults()),
        Arc::new(UniProtLookup::new(config.uniprot_url.clone())),
    ];
    match &config.omim_api_key {
        Some(key) => registry.push(Arc::new(OmimLookup::new(config.omim_url.clone(), key))),
        None => tracing::info!("OMIM_API_KEY not set, disease lookups use the static table only"),
    }
    registry.push(Arc::new(ChemblLookup::new(config.chembl_url.clone())));
    registry
}
