use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::user::display_name;
use crate::models::{EntityKind, QrSubject};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::success;

#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    pub token: Option<String>,
}

/// What door staff see after scanning a code.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Verification {
    #[serde(rename = "type")]
    pub kind: EntityKind,
    pub id: Uuid,
    pub holder_name: String,
    pub event_id: Option<Uuid>,
    pub status: String,
    pub valid_until: Option<DateTime<Utc>>,
    pub valid: bool,
}

pub fn is_admissible(subject: &QrSubject, now: DateTime<Utc>) -> bool {
    subject.status.is_paid() && subject.valid_until.map_or(true, |until| until > now)
}

/// Resolve a scanned token against the store. The payload embedded in the
/// QR code is never consulted.
pub async fn verify_token(
    State(state): State<AppState>,
    Query(query): Query<VerifyQuery>,
) -> Result<Response, AppError> {
    let token = query
        .token
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::ValidationError("token is required".to_string()))?;

    let subject = state
        .store
        .find_by_token(&token)
        .await?
        .ok_or_else(|| AppError::NotFound("No ticket or pass matches this code".to_string()))?;

    let profile = state.users.get_profile(subject.user_id).await?;
    let verification = Verification {
        kind: subject.kind,
        id: subject.id,
        holder_name: display_name(profile.as_ref()),
        event_id: subject.event_id,
        status: subject.status.as_str().to_string(),
        valid_until: subject.valid_until,
        valid: is_admissible(&subject, Utc::now()),
    };

    tracing::info!(entity = %subject.entity_ref(), valid = verification.valid, "Verified QR token");
    Ok(success(verification, "Code verified").into_response())
}
