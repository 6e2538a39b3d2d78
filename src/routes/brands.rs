use axum::Router;

use crate::{
    AppState,
    models::{Brand, CreateBrandRequest, UpdateBrandRequest},
    routes::resource,
};

pub fn router() -> Router<AppState> {
    resource::routes::<Brand, CreateBrandRequest, UpdateBrandRequest>()
}
