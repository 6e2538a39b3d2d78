use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use serde_json::Value;
use tracing::{info, warn};

use crate::{
    AppState,
    error::{AppError, Result},
    models::{ApiResponse, BulkCreated, ListQuery},
    queries::{
        filters::ListRequest,
        repository::{self, Changeset, Entity},
    },
    utils::extractors::{ApiJson, ApiQuery, EntityId, ValidJson},
};

/// The five standard routes of an entity with no bespoke relations.
pub fn routes<E, C, U>() -> Router<AppState>
where
    E: Entity,
    C: Changeset,
    U: Changeset,
{
    Router::new()
        .route("/", get(list::<E>).post(create::<E, C>))
        .route(
            "/{id}",
            get(find::<E>).put(update::<E, U>).delete(remove::<E>),
        )
}

pub async fn list<E: Entity>(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Json<ApiResponse<Vec<E>>>> {
    let request = ListRequest::from_query::<E>(&query)?;
    let (items, total) = repository::list::<E>(&state.db, &request).await?;

    Ok(Json(ApiResponse::paginated(
        items,
        request.page.pagination(total),
    )))
}

pub async fn find<E: Entity>(
    State(state): State<AppState>,
    EntityId(id): EntityId,
) -> Result<Json<ApiResponse<E>>> {
    let item = repository::get_by_id::<E>(&state.db, id).await?;

    Ok(Json(ApiResponse::ok(item)))
}

pub async fn create<E: Entity, C: Changeset>(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<C>,
) -> Result<(StatusCode, Json<ApiResponse<E>>)> {
    let item: E = repository::insert(&state.db, &body.into_assignments()).await?;
    info!("Created {} {}", E::NAME.to_lowercase(), item.id());

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(item).with_message(format!("{} created successfully", E::NAME))),
    ))
}

pub async fn update<E: Entity, U: Changeset>(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    ValidJson(body): ValidJson<U>,
) -> Result<Json<ApiResponse<E>>> {
    let item = repository::update::<E, _>(&state.db, id, &body.into_assignments())
        .await?
        .ok_or_else(|| AppError::not_found(E::NAME, id))?;
    info!("Updated {} {}", E::NAME.to_lowercase(), id);

    Ok(Json(
        ApiResponse::ok(item).with_message(format!("{} updated successfully", E::NAME)),
    ))
}

pub async fn remove<E: Entity>(
    State(state): State<AppState>,
    EntityId(id): EntityId,
) -> Result<Json<ApiResponse<()>>> {
    repository::delete::<E>(&state.db, id).await?;
    info!("Deleted {} {}", E::NAME.to_lowercase(), id);

    Ok(Json(
        ApiResponse::ok(()).with_message(format!("{} deleted successfully", E::NAME)),
    ))
}

/// Inserts every entry that passes the create schema, skipping rows that
/// collide with an existing unique value.
pub async fn bulk_create<E: Entity, C: Changeset>(
    State(state): State<AppState>,
    ApiJson(entries): ApiJson<Vec<Value>>,
) -> Result<(StatusCode, Json<ApiResponse<BulkCreated>>)> {
    let submitted = entries.len() as u64;

    let rows: Vec<_> = entries
        .into_iter()
        .filter_map(|entry| serde_json::from_value::<C>(entry).ok())
        .filter(|body| body.validate().is_ok())
        .map(Changeset::into_assignments)
        .collect();

    if rows.is_empty() {
        return Err(AppError::Validation(format!(
            "No valid {} entries in the batch",
            E::NAME.to_lowercase()
        )));
    }

    let valid = rows.len() as u64;
    if valid < submitted {
        warn!("Dropped {} invalid {} entries from batch", submitted - valid, E::NAME.to_lowercase());
    }

    let count = repository::insert_ignoring_duplicates::<E>(&state.db, &rows).await?;

    Ok((
        StatusCode::CREATED,
        Json(
            ApiResponse::ok(BulkCreated {
                count,
                skipped: submitted - count,
            })
            .with_message(format!("{} {} record(s) created", count, E::NAME.to_lowercase())),
        ),
    ))
}
