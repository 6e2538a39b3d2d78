use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};

use crate::{
    AppState,
    error::Result,
    models::{
        ApiResponse, CreateProductRequest, ListQuery, Product, ProductDetail, ProductListItem,
        UpdateProductRequest,
    },
    queries::{filters::ListRequest, product_queries, repository},
    routes::resource,
    utils::extractors::{ApiQuery, EntityId, ValidJson},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/slug/{slug}", get(get_product_by_slug))
        .route(
            "/{id}",
            get(get_product)
                .put(update_product)
                .delete(resource::remove::<Product>),
        )
}

pub async fn list_products(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Json<ApiResponse<Vec<ProductListItem>>>> {
    let request = ListRequest::from_query::<Product>(&query)?;
    let (products, total) = repository::list::<Product>(&state.db, &request).await?;
    let items = product_queries::expand_list(&state.db, products).await?;

    Ok(Json(ApiResponse::paginated(
        items,
        request.page.pagination(total),
    )))
}

pub async fn get_product(
    State(state): State<AppState>,
    EntityId(id): EntityId,
) -> Result<Json<ApiResponse<ProductDetail>>> {
    let product = repository::get_by_id::<Product>(&state.db, id).await?;
    let detail = product_queries::expand_detail(&state.db, product).await?;

    Ok(Json(ApiResponse::ok(detail)))
}

pub async fn get_product_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<ProductDetail>>> {
    let product = product_queries::find_by_slug(&state.db, &slug).await?;
    let detail = product_queries::expand_detail(&state.db, product).await?;

    Ok(Json(ApiResponse::ok(detail)))
}

pub async fn create_product(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<CreateProductRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ProductDetail>>)> {
    let detail = product_queries::create(&state.db, body).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(detail).with_message("Product created successfully")),
    ))
}

pub async fn update_product(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    ValidJson(body): ValidJson<UpdateProductRequest>,
) -> Result<Json<ApiResponse<ProductDetail>>> {
    let detail = product_queries::update(&state.db, id, body).await?;

    Ok(Json(
        ApiResponse::ok(detail).with_message("Product updated successfully"),
    ))
}
