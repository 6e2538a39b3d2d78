use axum::{Router, routing::post};

use crate::{
    AppState,
    models::{Color, CreateColorRequest, UpdateColorRequest},
    routes::resource,
};

pub fn router() -> Router<AppState> {
    resource::routes::<Color, CreateColorRequest, UpdateColorRequest>()
        .route("/bulk", post(resource::bulk_create::<Color, CreateColorRequest>))
}
