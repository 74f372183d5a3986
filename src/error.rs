use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// RepoError
///
/// Failures surfaced by the persistence layer. A unique-constraint violation is kept apart
/// from every other database failure so handlers can answer with a form-level message.
#[derive(Error, Debug)]
pub enum RepoError {
    /// A UNIQUE column (alumni.reg_no, admin.username) already holds the submitted value.
    #[error("unique constraint violated: {0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                RepoError::Conflict(db_err.message().to_string())
            }
            _ => RepoError::Database(err),
        }
    }
}

/// AppError
///
/// Unexpected failures at the handler boundary. Expected outcomes (bad credentials, missing
/// session, conflicts, unknown ids) are rendered by the handlers themselves and never get here.
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Repo(#[from] RepoError),

    #[error("session encoding failed: {0}")]
    Session(#[from] jsonwebtoken::errors::Error),

    #[error("password hashing failed: {0}")]
    Password(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!("request failed: {}", self);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": "internal server error" })),
        )
            .into_response()
    }
}
