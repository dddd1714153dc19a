use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::error;

use crate::payment::PaymentError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("missing authorization header")]
    MissingCredential,
    #[error("invalid or expired token")]
    InvalidCredential,
    #[error("forbidden access")]
    Forbidden,
    #[error("not found")]
    NotFound,
    #[error("malformed document id")]
    InvalidId,
    #[error("payment processor error")]
    Payment(#[from] PaymentError),
    #[error("internal server error")]
    Store(#[from] mongodb::error::Error),
    #[error("internal server error")]
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingCredential | ApiError::InvalidCredential => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::InvalidId => StatusCode::BAD_REQUEST,
            ApiError::Payment(_) => StatusCode::BAD_GATEWAY,
            ApiError::Store(_) | ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Store and processor details go to the log, never into the body.
        match &self {
            ApiError::Store(source) => error!(error = %source, "store operation failed"),
            ApiError::Payment(source) => error!(error = %source, "payment intent failed"),
            _ => {}
        }

        let body = Json(serde_json::json!({ "message": self.to_string() }));
        (self.status(), body).into_response()
    }
}
