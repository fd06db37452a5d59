//! HTTP middleware for the API server.

use crate::error::internal_error;
use axum::{
    body::Body,
    http::{HeaderValue, Method, Request, header},
    middleware::Next,
    response::Response,
};
use std::any::Any;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};
use tracing::error;
use uuid::Uuid;

const REQUEST_ID: &str = "x-request-id";

/// Create CORS middleware layer.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_methods([Method::GET, Method::HEAD, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::RANGE, header::ACCEPT])
        .expose_headers([
            header::CONTENT_RANGE,
            header::CONTENT_LENGTH,
            header::ACCEPT_RANGES,
        ])
        .allow_origin(AnyOrigin)
}

/// Tag each request and its response with an `x-request-id`, keeping one
/// supplied by the client.
pub async fn request_id(mut request: Request<Body>, next: Next) -> Response {
    let request_id = match request.headers().get(REQUEST_ID) {
        Some(existing) => existing.clone(),
        None => match HeaderValue::from_str(&Uuid::new_v4().to_string()) {
            Ok(value) => value,
            Err(_) => return next.run(request).await,
        },
    };
    request
        .headers_mut()
        .insert(REQUEST_ID, request_id.clone());

    let mut response = next.run(request).await;
    response.headers_mut().insert(REQUEST_ID, request_id);
    response
}

/// Response for a panicking handler.
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!(panic = %detail, "Handler panicked");
    internal_error("internal")
}
