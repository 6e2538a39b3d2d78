use axum::{
    Json,
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::{ErrorBody, InternalDetail};

/// Development only: puts the detail of a masked 500 back into its body.
pub async fn reveal_internal_errors(req: Request, next: Next) -> Response {
    let response = next.run(req).await;

    let Some(InternalDetail(detail)) = response.extensions().get::<InternalDetail>().cloned() else {
        return response;
    };

    let (parts, _) = response.into_parts();
    let body = Json(ErrorBody {
        success: false,
        error: "InternalServerError",
        message: detail,
    })
    .into_response()
    .into_body();

    Response::from_parts(parts, body)
}
