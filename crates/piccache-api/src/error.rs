//! Error responses.

use crate::ERROR_HEADER;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

/// Failures a handler can answer with.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Forbidden")]
    Forbidden,

    #[error(transparent)]
    Internal(piccache_core::Error),
}

impl From<piccache_core::Error> for ApiError {
    fn from(err: piccache_core::Error) -> Self {
        match err {
            piccache_core::Error::InvalidUrl(msg) => ApiError::BadRequest(msg),
            other => ApiError::Internal(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            ApiError::Forbidden => StatusCode::FORBIDDEN.into_response(),
            ApiError::Internal(err) => {
                error!(error = %err, kind = err.kind(), "Request failed");
                internal_error(err.kind())
            }
        }
    }
}

/// Opaque 500: no body, only the error kind in a header.
pub fn internal_error(kind: &'static str) -> Response {
    let mut response = StatusCode::INTERNAL_SERVER_ERROR.into_response();
    response
        .headers_mut()
        .insert(ERROR_HEADER, HeaderValue::from_static(kind));
    response
}
