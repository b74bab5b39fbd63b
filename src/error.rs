//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Name of the unique constraint on `pokemon.name`.
pub const POKEMON_NAME_CONSTRAINT: &str = "pokemon_name_key";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing environment variable: {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: '{value}'")]
    Invalid { key: &'static str, value: String },
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("duplicate name: {0}")]
    DuplicateName(String),
    #[error("validation: {0}")]
    Validation(String),
    #[error("storage: {0}")]
    Storage(#[from] sqlx::Error),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("seed: {0}")]
    Seed(String),
}

impl AppError {
    /// Maps a unique violation on `pokemon.name` to `DuplicateName`; any other error stays a storage error.
    pub fn from_write(err: sqlx::Error, name: &str) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.is_unique_violation() && db.constraint() == Some(POKEMON_NAME_CONSTRAINT) {
                return AppError::DuplicateName(name.to_string());
            }
        }
        AppError::Storage(err)
    }

    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::DuplicateName(_) => (StatusCode::CONFLICT, "duplicate_name"),
            AppError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "storage_error"),
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            AppError::Seed(_) => (StatusCode::INTERNAL_SERVER_ERROR, "seed_error"),
        }
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = match &self {
            AppError::Storage(e) => {
                tracing::error!(error = %e, "storage failure");
                "storage failure".to_string()
            }
            other => other.to_string(),
        };
        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };
        (status, Json(body)).into_response()
    }
}
