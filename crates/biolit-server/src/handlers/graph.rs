use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use tracing::info;

use crate::state::AppState;

pub async fn export_graph(State(state): State<AppState>) -> impl IntoResponse {
    info!("Exporting graph snapshot");

    let snapshot = state.pipeline.graph().export().await;
    (StatusCode::OK, Json(snapshot))
}

pub async fn graph_stats(State(state): State<AppState>) -> impl IntoResponse {
    info!("Fetching graph statistics");

    let stats = state.pipeline.graph().stats().await;
    (StatusCode::OK, Json(stats))
}
