use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use tracing::info;

use biolit_core::api_types::HealthResponse;

use crate::state::AppState;

const VERSION: &str = env!("CARGO_PKG_VERSION");

pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    info!("Health check requested");

    let stats = state.pipeline.graph().stats().await;

    let response = HealthResponse {
        status: "ok".to_string(),
        version: VERSION.to_string(),
        tagger: state.pipeline.tagger_name().to_string(),
        vocabularies: state.pipeline.vocabularies(),
        cooccurrence: state.config.cooccurrence,
        entity_count: stats.entity_count,
        relationship_count: stats.relationship_count,
        article_count: stats.article_count,
    };

    (StatusCode::OK, Json(response))
}
