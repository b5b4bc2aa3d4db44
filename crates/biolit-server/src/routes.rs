use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers;
use crate::state::AppState;

pub fn create_router() -> Router<AppState> {
    Router::new()
        // Health
        .route("/api/health", get(handlers::health::health_check))
        // Ingestion
        .route("/api/articles", post(handlers::articles::ingest_article))
        .route("/api/articles/batch", post(handlers::articles::ingest_batch))
        // Graph
        .route("/api/graph/export", get(handlers::graph::export_graph))
        .route("/api/graph/stats", get(handlers::graph::graph_stats))
        // Entities
        .route("/api/entities", get(handlers::entities::list_entities))
        .route("/api/entities/{id}", get(handlers::entities::get_entity))
}
