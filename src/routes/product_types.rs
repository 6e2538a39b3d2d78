use axum::Router;

use crate::{
    AppState,
    models::{CreateProductTypeRequest, ProductType, UpdateProductTypeRequest},
    routes::resource,
};

pub fn router() -> Router<AppState> {
    resource::routes::<ProductType, CreateProductTypeRequest, UpdateProductTypeRequest>()
}
