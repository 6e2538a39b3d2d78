use axum::{
    Json, Router,
    extract::State,
    routing::get,
};

use crate::{
    AppState,
    error::Result,
    models::{
        ApiResponse, Collection, CollectionDetail, CreateCollectionRequest,
        UpdateCollectionRequest,
    },
    queries::collection_queries,
    routes::resource,
    utils::extractors::EntityId,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(resource::list::<Collection>)
                .post(resource::create::<Collection, CreateCollectionRequest>),
        )
        .route(
            "/{id}",
            get(get_collection)
                .put(resource::update::<Collection, UpdateCollectionRequest>)
                .delete(resource::remove::<Collection>),
        )
}

pub async fn get_collection(
    State(state): State<AppState>,
    EntityId(id): EntityId,
) -> Result<Json<ApiResponse<CollectionDetail>>> {
    let detail = collection_queries::find_detail(&state.db, id).await?;

    Ok(Json(ApiResponse::ok(detail)))
}
