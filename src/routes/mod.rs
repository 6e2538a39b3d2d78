mod brands;
mod collections;
mod colors;
mod health;
mod product_types;
mod products;
pub mod resource;
mod styles;
mod variants;

use axum::{Json, Router, http::StatusCode, response::IntoResponse, routing::get};

use crate::{AppState, error::ErrorBody};

pub fn create_router(api_prefix: &str) -> Router<AppState> {
    let api = Router::new()
        .nest("/products", products::router())
        .nest("/variants", variants::router())
        .nest("/colors", colors::router())
        .nest("/styles", styles::router())
        .nest("/collections", collections::router())
        .nest("/brands", brands::router())
        .nest("/product-types", product_types::router())
        .method_not_allowed_fallback(route_not_found);

    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .nest(api_prefix, api)
        .fallback(route_not_found)
        .method_not_allowed_fallback(route_not_found)
}

async fn route_not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            success: false,
            error: "NotFoundError",
            message: "Route not found".to_string(),
        }),
    )
}
