use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::utils::to_camel_case;

const INTERNAL_MESSAGE: &str = "An unexpected error occurred";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Detail of a masked 500 response, attached as a response extension so the
/// development-mode middleware can put it back into the body.
#[derive(Debug, Clone)]
pub struct InternalDetail(pub String);

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: &'static str,
    pub message: String,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::Conflict(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database(_)
            | AppError::Migration(_)
            | AppError::Config(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "ValidationError",
            AppError::Conflict(_) => "ConflictError",
            AppError::NotFound(_) => "NotFoundError",
            _ => "InternalServerError",
        }
    }

    pub fn not_found(entity: &str, id: i64) -> Self {
        AppError::NotFound(format!("{} with id {} not found", entity, id))
    }

    /// Maps a store error raised while writing `entity`, naming the entity in
    /// constraint violations.
    pub fn from_store(err: sqlx::Error, entity: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            match db_err.kind() {
                sqlx::error::ErrorKind::UniqueViolation => {
                    let field = unique_column(db_err.message());
                    return AppError::Conflict(format!(
                        "{} with this {} already exists",
                        entity, field
                    ));
                }
                sqlx::error::ErrorKind::ForeignKeyViolation => {
                    return AppError::Validation(format!(
                        "{} references a record that does not exist or is still referenced",
                        entity
                    ));
                }
                sqlx::error::ErrorKind::CheckViolation => {
                    return AppError::Validation(format!(
                        "{} violates a field constraint: {}",
                        entity,
                        db_err.message()
                    ));
                }
                _ => {}
            }
        }

        match err {
            sqlx::Error::RowNotFound => AppError::NotFound(format!("{} not found", entity)),
            other => AppError::Database(other),
        }
    }
}

/// Pulls the column out of SQLite's `UNIQUE constraint failed: table.column`
/// message and renders it in the API's camelCase.
fn unique_column(message: &str) -> String {
    let column = message
        .split("UNIQUE constraint failed: ")
        .nth(1)
        .and_then(|cols| cols.split(',').next())
        .and_then(|col| col.trim().rsplit('.').next())
        .unwrap_or("value");

    to_camel_case(column)
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::from_store(err, "Record")
    }
}

impl From<std::env::VarError> for AppError {
    fn from(err: std::env::VarError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));

        let message = fields
            .into_iter()
            .map(|(field, errs)| {
                let reasons: Vec<String> = errs
                    .iter()
                    .map(|e| match &e.message {
                        Some(msg) => msg.to_string(),
                        None => e.code.to_string(),
                    })
                    .collect();
                format!("{}: {}", to_camel_case(&field), reasons.join(", "))
            })
            .collect::<Vec<_>>()
            .join("; ");

        AppError::Validation(message)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error = self.category();

        let (message, detail) = if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
            (INTERNAL_MESSAGE.to_string(), Some(self.to_string()))
        } else {
            (self.to_string(), None)
        };

        let body = Json(ErrorBody {
            success: false,
            error,
            message,
        });

        let mut response = (status, body).into_response();
        if let Some(detail) = detail {
            response.extensions_mut().insert(InternalDetail(detail));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_map_to_expected_status_codes() {
        let cases = [
            (AppError::Validation("x".into()), StatusCode::BAD_REQUEST, "ValidationError"),
            (AppError::Conflict("x".into()), StatusCode::BAD_REQUEST, "ConflictError"),
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND, "NotFoundError"),
            (
                AppError::Internal("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
                "InternalServerError",
            ),
        ];

        for (err, status, category) in cases {
            assert_eq!(err.status_code(), status);
            assert_eq!(err.category(), category);
        }
    }

    #[test]
    fn unique_column_is_camel_cased() {
        assert_eq!(
            unique_column("UNIQUE constraint failed: product_variants.variant_id"),
            "variantId"
        );
        assert_eq!(unique_column("UNIQUE constraint failed: colors.name"), "name");
        assert_eq!(unique_column("something else"), "value");
    }

    #[test]
    fn row_not_found_becomes_not_found() {
        let err = AppError::from_store(sqlx::Error::RowNotFound, "Color");
        assert!(matches!(err, AppError::NotFound(ref msg) if msg == "Color not found"));
    }

    #[test]
    fn server_errors_hide_their_detail() {
        let response = AppError::Internal("pool exploded".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let detail = response.extensions().get::<InternalDetail>().cloned();
        assert_eq!(detail.map(|d| d.0), Some("Internal error: pool exploded".to_string()));
    }
}
