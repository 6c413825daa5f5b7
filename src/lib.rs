pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod messages;
pub mod participants;
pub mod status;
pub mod sweep;
pub mod user;

use std::sync::Arc;

use axum::{extract::FromRef, http::StatusCode, response::{IntoResponse, Response}, routing::post, Json, Router};
use serde::Serialize;
use serde_json::json;
use sqlx::SqlitePool;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use clock::{Clock, SharedClock};

#[derive(Clone, FromRef)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub clock: SharedClock,
}

impl AppState {
    pub fn new(db_pool: SqlitePool, clock: impl Clock) -> AppState {
        AppState { db_pool, clock: Arc::new(clock) }
    }
}

pub fn app(app_state: AppState) -> Router {
    Router::new()
        .merge(participants::router())
        .merge(messages::router())
        .route("/status", post(status::heartbeat))
        .with_state(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

pub const STORE_HINT: &str = "It's better to check if your database is properly connected.";

/// Either a single sentence or every problem found at once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Detail {
    One(String),
    Many(Vec<String>),
}

impl From<&str> for Detail {
    fn from(s: &str) -> Self {
        Detail::One(s.to_owned())
    }
}

impl From<Vec<String>> for Detail {
    fn from(v: Vec<String>) -> Self {
        Detail::Many(v)
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("invalid request: {0:?}")]
    Validation(Detail),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error(transparent)]
    Store(anyhow::Error),
}

impl AppError {
    pub fn validation(detail: impl Into<Detail>) -> Self {
        AppError::Validation(detail.into())
    }

    pub fn status(&self) -> StatusCode {
        use AppError::*;
        match self {
            Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Conflict(_) => StatusCode::TOO_MANY_REQUESTS,
            NotFound(_) => StatusCode::NOT_FOUND,
            Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            AppError::Validation(detail) => json!({ "message": detail }),
            AppError::Conflict(message)
            | AppError::NotFound(message)
            | AppError::Unauthorized(message) => json!({ "message": message }),
            AppError::Store(err) => {
                tracing::error!(error = %err, "store operation failed");
                json!({ "error": err.to_string(), "hint": STORE_HINT })
            }
        };
        (status, Json(body)).into_response()
    }
}

macro_rules! apperr_impl {
    ($E:ty) => {
        impl From<$E> for AppError {
            fn from(err: $E) -> Self {
                Self::Store(anyhow::Error::from(err))
            }
        }
    };
}

apperr_impl!(sqlx::Error);
apperr_impl!(time::error::Format);
