use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};

use crate::auth::login_url;
use crate::posts::repository::RepositoryError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found")]
    NotFound,

    /// The request needs a signed-in user; `next` is where to return after login.
    #[error("Login required for {next}")]
    LoginRequired { next: String },

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    #[error("Password hashing error: {0}")]
    Password(#[from] bcrypt::BcryptError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound => (StatusCode::NOT_FOUND, "Not found".to_string()),
            AppError::LoginRequired { next } => {
                return Redirect::to(&login_url(next)).into_response();
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Repository(RepositoryError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, "Not found".to_string())
            }
            AppError::Database(_)
            | AppError::Pool(_)
            | AppError::Repository(_)
            | AppError::Template(_)
            | AppError::Password(_) => {
                tracing::error!("{}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, message).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
