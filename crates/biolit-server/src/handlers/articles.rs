use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use tracing::info;

use biolit_core::article::ArticleRecord;

use crate::state::AppState;

pub async fn ingest_article(
    State(state): State<AppState>,
    Json(article): Json<ArticleRecord>,
) -> impl IntoResponse {
    info!(article_id = %article.id, "Ingesting article");

    let result = state.pipeline.ingest(&article).await;
    (StatusCode::OK, Json(result))
}

pub async fn ingest_batch(
    State(state): State<AppState>,
    Json(articles): Json<Vec<ArticleRecord>>,
) -> impl IntoResponse {
    info!(count = articles.len(), "Ingesting article batch");

    let results = state.pipeline.ingest_batch(&articles).await;
    (StatusCode::OK, Json(results))
}
