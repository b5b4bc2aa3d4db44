use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use biolit_core::{BiolitConfig, EntityTagger};
use biolit_extraction::{AliasTable, DictionaryTagger, LlmTagger, Normalizer, Resolver};
use biolit_pipeline::Pipeline;

mod handlers;
mod routes;
mod state;

use state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("biolit=info".parse()?))
        .init();

    let config = BiolitConfig::from_env()?;
    let host = config.server_host.clone();
    let port = config.server_port;

    let tagger: Arc<dyn EntityTagger> = match &config.anthropic_api_key {
        Some(key) => Arc::new(LlmTagger::new(key)),
        None => {
            tracing::warn!("ANTHROPIC_API_KEY not set, falling back to the dictionary tagger");
            Arc::new(DictionaryTagger::biomedical_defaults())
        }
    };
    let resolver = Resolver::new(
        biolit_lookup::vocabulary_registry(&config),
        config.lookup_timeout(),
    );
    let pipeline = Pipeline::new(tagger, resolver)
        .with_normalizer(Normalizer::with_aliases(AliasTable::biomedical_defaults()))
        .configured(&config);

    tracing::info!(
        tagger = pipeline.tagger_name(),
        vocabularies = ?pipeline.vocabularies(),
        cooccurrence = ?config.cooccurrence,
        "Pipeline ready"
    );

    let state = AppState { config, pipeline };

    let app = routes::create_router()
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = format!("{host}:{port}");
    tracing::info!("BioLit server listening on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
