use axum::{
    Json, Router,
    routing::{get, post},
};

use crate::{
    AppState,
    models::{ApiResponse, CreateStyleRequest, FitType, Style, UpdateStyleRequest},
    routes::resource,
};

pub fn router() -> Router<AppState> {
    resource::routes::<Style, CreateStyleRequest, UpdateStyleRequest>()
        .route("/fit-types", get(list_fit_types))
        .route("/bulk", post(resource::bulk_create::<Style, CreateStyleRequest>))
}

pub async fn list_fit_types() -> Json<ApiResponse<[FitType; 4]>> {
    Json(ApiResponse::ok(FitType::ALL))
}
