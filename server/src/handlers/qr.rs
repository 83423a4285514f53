use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use super::json_body;
use crate::auth::{require_admin, AuthUser};
use crate::models::{EntityKind, EntityRef};
use crate::qr::run_backfill;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::success;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateQrRequest {
    pub ticket_id: Option<Uuid>,
    pub subscription_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub kind: Option<EntityKind>,
}

impl GenerateQrRequest {
    /// Exactly one id, and a type that names it.
    pub fn entity(&self) -> Result<EntityRef, AppError> {
        let entity = match (self.ticket_id, self.subscription_id) {
            (Some(id), None) => EntityRef::ticket(id),
            (None, Some(id)) => EntityRef::subscription(id),
            _ => {
                return Err(AppError::ValidationError(
                    "Provide exactly one of ticketId or subscriptionId".to_string(),
                ))
            }
        };
        match self.kind {
            Some(kind) if kind == entity.kind => Ok(entity),
            Some(kind) => Err(AppError::ValidationError(format!(
                "type '{kind}' does not match the supplied id"
            ))),
            None => Err(AppError::ValidationError("type is required".to_string())),
        }
    }
}

/// Issue (or return the existing) QR code for one of the caller's tickets
/// or passes. Admins may issue for anyone.
pub async fn generate_qr(
    State(state): State<AppState>,
    user: AuthUser,
    body: Result<Json<GenerateQrRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let entity = json_body(body)?.entity()?;

    let subject = state
        .store
        .get_subject(entity)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} '{}' was not found", entity.kind, entity.id)))?;

    if subject.user_id != user.id {
        require_admin(state.users.as_ref(), &user).await?;
    }

    let issued = state.issuer.issue_for(subject).await?;
    let artifact = state.links.artifact(&issued.payload);

    Ok(success(artifact, "QR code ready").into_response())
}

pub async fn backfill_qr_codes(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Response, AppError> {
    require_admin(state.users.as_ref(), &user).await?;
    tracing::info!(admin_id = %user.id, "QR backfill requested");

    let report = run_backfill(&state.issuer).await;
    let status = if report.success {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    Ok((status, Json(report)).into_response())
}
