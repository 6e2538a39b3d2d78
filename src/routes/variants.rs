use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, patch},
};

use crate::{
    AppState,
    error::{AppError, Result},
    models::{
        ApiResponse, CreateVariantRequest, ListQuery, Product, StockUpdateRequest,
        UpdateVariantRequest, Variant, VariantDetail, VariantListItem,
    },
    queries::{
        filters::{Clause, CompareOp, ListRequest},
        repository::{self, Entity, FieldValue},
        variant_queries,
    },
    routes::resource,
    utils::extractors::{ApiQuery, EntityId, ValidJson},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_variants).post(create_variant))
        .route("/product/{product_id}", get(list_product_variants))
        .route("/{id}/stock", patch(update_stock))
        .route(
            "/{id}",
            get(get_variant)
                .put(update_variant)
                .delete(resource::remove::<Variant>),
        )
}

async fn list_page(
    state: &AppState,
    request: ListRequest,
) -> Result<Json<ApiResponse<Vec<VariantListItem>>>> {
    let (variants, total) = repository::list::<Variant>(&state.db, &request).await?;
    let items = variant_queries::expand_list(&state.db, variants).await?;

    Ok(Json(ApiResponse::paginated(
        items,
        request.page.pagination(total),
    )))
}

pub async fn list_variants(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Json<ApiResponse<Vec<VariantListItem>>>> {
    let request = ListRequest::from_query::<Variant>(&query)?;
    list_page(&state, request).await
}

pub async fn list_product_variants(
    State(state): State<AppState>,
    EntityId(product_id): EntityId,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Json<ApiResponse<Vec<VariantListItem>>>> {
    if !repository::exists::<Product, _>(&state.db, product_id).await? {
        return Err(AppError::not_found(Product::NAME, product_id));
    }

    let mut request = ListRequest::from_query::<Variant>(&query)?;
    request.predicate.push(Clause::Compare {
        column: "product_id",
        op: CompareOp::Eq,
        value: FieldValue::Int(Some(product_id)),
    });

    list_page(&state, request).await
}

pub async fn get_variant(
    State(state): State<AppState>,
    EntityId(id): EntityId,
) -> Result<Json<ApiResponse<VariantDetail>>> {
    let variant = repository::get_by_id::<Variant>(&state.db, id).await?;
    let detail = variant_queries::expand_detail(&state.db, variant).await?;

    Ok(Json(ApiResponse::ok(detail)))
}

pub async fn create_variant(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<CreateVariantRequest>,
) -> Result<(StatusCode, Json<ApiResponse<VariantDetail>>)> {
    let detail = variant_queries::create(&state.db, body).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(detail).with_message("Variant created successfully")),
    ))
}

pub async fn update_variant(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    ValidJson(body): ValidJson<UpdateVariantRequest>,
) -> Result<Json<ApiResponse<VariantDetail>>> {
    let detail = variant_queries::update(&state.db, id, body).await?;

    Ok(Json(
        ApiResponse::ok(detail).with_message("Variant updated successfully"),
    ))
}

pub async fn update_stock(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    ValidJson(body): ValidJson<StockUpdateRequest>,
) -> Result<Json<ApiResponse<VariantDetail>>> {
    let detail = variant_queries::update_stock(&state.db, id, body).await?;

    Ok(Json(
        ApiResponse::ok(detail).with_message("Stock updated successfully"),
    ))
}
