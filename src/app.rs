use std::time::Instant;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    middleware,
};
use sqlx::SqlitePool;
use tower_http::cors::{Any, CorsLayer};

use crate::{
    config::{AppConfig, Environment},
    error::{AppError, Result},
    middleware::reveal_internal_errors,
    routes,
};

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub environment: Environment,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(db: SqlitePool, environment: Environment) -> Self {
        Self {
            db,
            environment,
            started_at: Instant::now(),
        }
    }
}

/// Routes with state attached, without the transport layers.
pub fn router(state: AppState, api_prefix: &str) -> Router {
    let mut app = routes::create_router(api_prefix);

    if state.environment.is_development() {
        app = app.layer(middleware::from_fn(reveal_internal_errors));
    }

    app.with_state(state)
}

pub fn build(config: &AppConfig, state: AppState) -> Result<Router> {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([http::header::CONTENT_TYPE, http::header::AUTHORIZATION]);

    let cors = if config.cors.allowed_origins.is_empty() {
        cors.allow_origin(Any)
    } else {
        let allowed_origins: Vec<HeaderValue> = config
            .cors
            .allowed_origins
            .iter()
            .map(|origin| {
                origin
                    .parse::<HeaderValue>()
                    .map_err(|_| AppError::Config(format!("Invalid CORS origin: {}", origin)))
            })
            .collect::<Result<Vec<_>>>()?;
        cors.allow_origin(allowed_origins)
    };

    let app = router(state, &config.server.api_prefix)
        .layer(DefaultBodyLimit::max(config.server.max_body_size))
        .layer(cors);

    Ok(app)
}
