use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;

use super::{json_body, request_origin};
use crate::auth::AuthUser;
use crate::payments::{
    start_media_pass_checkout, start_ticket_checkout, MediaPassCheckout, TicketCheckout,
};
use crate::state::AppState;
use crate::utils::error::AppError;

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub url: String,
}

pub async fn create_ticket_checkout(
    State(state): State<AppState>,
    user: AuthUser,
    headers: HeaderMap,
    body: Result<Json<TicketCheckout>, JsonRejection>,
) -> Result<Json<CheckoutResponse>, AppError> {
    let processor = state.payments()?;
    let checkout = json_body(body)?;
    let origin = request_origin(&headers, &state.public_app_url);

    let url = start_ticket_checkout(processor, state.store.as_ref(), &user, &origin, checkout).await?;
    Ok(Json(CheckoutResponse { url }))
}

pub async fn create_media_pass_checkout(
    State(state): State<AppState>,
    user: AuthUser,
    headers: HeaderMap,
    body: Result<Json<MediaPassCheckout>, JsonRejection>,
) -> Result<Json<CheckoutResponse>, AppError> {
    let processor = state.payments()?;
    let checkout = json_body(body)?;
    let origin = request_origin(&headers, &state.public_app_url);

    let url =
        start_media_pass_checkout(processor, state.store.as_ref(), &user, &origin, checkout).await?;
    Ok(Json(CheckoutResponse { url }))
}
