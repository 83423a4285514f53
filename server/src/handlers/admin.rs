use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::json_body;
use crate::auth::{require_admin, AuthUser};
use crate::state::AppState;
use crate::utils::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteTicketRequest {
    pub ticket_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteTicketResponse {
    pub success: bool,
    pub message: String,
    pub ticket_id: Uuid,
}

pub async fn delete_ticket(
    State(state): State<AppState>,
    user: AuthUser,
    body: Result<Json<DeleteTicketRequest>, JsonRejection>,
) -> Result<Json<DeleteTicketResponse>, AppError> {
    require_admin(state.users.as_ref(), &user).await?;
    let ticket_id = json_body(body)?
        .ticket_id
        .ok_or_else(|| AppError::ValidationError("ticketId is required".to_string()))?;

    if !state.store.delete_ticket(ticket_id).await? {
        return Err(AppError::NotFound(format!("Ticket '{ticket_id}' was not found")));
    }

    info!(admin_id = %user.id, ticket_id = %ticket_id, "Ticket deleted");
    Ok(Json(DeleteTicketResponse {
        success: true,
        message: "Ticket deleted successfully".to_string(),
        ticket_id,
    }))
}
