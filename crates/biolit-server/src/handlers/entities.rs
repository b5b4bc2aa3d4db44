use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use tracing::{info, warn};

use biolit_core::api_types::{EntityListRequest, EntityListResponse};
use biolit_core::entity::EntityId;
use biolit_core::error::BiolitError;

use crate::state::AppState;

pub async fn list_entities(
    State(state): State<AppState>,
    Query(request): Query<EntityListRequest>,
) -> impl IntoResponse {
    info!(entity_type = ?request.entity_type, "Listing entities");

    let graph = state.pipeline.graph();
    let entities = match request.entity_type {
        Some(entity_type) => graph.entities_by_type(entity_type).await,
        None => graph.entities().await,
    };

    let total = entities.len();
    (StatusCode::OK, Json(EntityListResponse { entities, total }))
}

pub async fn get_entity(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    info!(%id, "Fetching entity");

    let id = EntityId::from(id.as_str());
    match state.pipeline.graph().entity_detail(&id).await {
        Ok(detail) => (StatusCode::OK, Json(detail)).into_response(),
        Err(BiolitError::NotFound(message)) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": message })),
        )
            .into_response(),
        Err(e) => {
            warn!("Failed to fetch entity {id}: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": format!("Failed to fetch entity: {e}") })),
            )
                .into_response()
        }
    }
}
