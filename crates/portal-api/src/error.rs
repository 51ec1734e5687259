use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use tracing::error;

use portal_db::DbError;

use crate::views;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// No valid session. Soft failure: the client is sent to the login page.
    #[error("login required")]
    Unauthenticated,
    /// Logged in, but not an admin.
    #[error("admin role required")]
    Forbidden,
    #[error(transparent)]
    Store(#[from] DbError),
    #[error("password hashing failed: {0}")]
    PasswordHash(String),
    #[error("session token: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
    #[error("blocking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Unauthenticated => Redirect::to("/login").into_response(),
            AppError::Forbidden => (StatusCode::FORBIDDEN, views::forbidden_page()).into_response(),
            other => {
                error!("Request failed: {}", other);
                (StatusCode::INTERNAL_SERVER_ERROR, views::server_error_page()).into_response()
            }
        }
    }
}
