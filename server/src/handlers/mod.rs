use axum::extract::rejection::JsonRejection;
use axum::http::{header::ORIGIN, HeaderMap};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::utils::error::AppError;
use crate::utils::response::success;

pub mod access;
pub mod admin;
pub mod payments;
pub mod qr;
pub mod verify;

#[derive(Serialize)]
struct HealthPayload {
    status: &'static str,
    service: &'static str,
}

pub async fn health_check() -> Response {
    let payload = HealthPayload {
        status: "ok",
        service: "passgate-api",
    };

    success(payload, "Health check successful").into_response()
}

/// Unwrap a JSON body, reporting malformed input in the API error format.
pub(crate) fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| AppError::ValidationError(rejection.body_text()))
}

/// The web origin a request came from, if it sent a usable `Origin` header.
pub(crate) fn request_origin(headers: &HeaderMap, fallback: &str) -> String {
    headers
        .get(ORIGIN)
        .and_then(|value| value.to_str().ok())
        .filter(|origin| origin.starts_with("https://") || origin.starts_with("http://"))
        .and_then(|origin| reqwest::Url::parse(origin).ok())
        .map(|url| url.origin().ascii_serialization())
        .unwrap_or_else(|| fallback.trim_end_matches('/').to_string())
}
