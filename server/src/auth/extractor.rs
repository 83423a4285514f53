use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use tracing::debug;
use uuid::Uuid;

use super::AuthError;
use crate::access::{gate_view, GateView};
use crate::models::{ApprovalStatus, RoleSet};
use crate::state::AppState;
use crate::store::UserDirectory;
use crate::utils::error::AppError;

/// The signed-in caller, taken from `Authorization: Bearer <token>`.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: Option<String>,
}

pub(crate) fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.ok_or(AuthError::MissingHeader)?;
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::MalformedHeader)
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());
        let token = bearer_token(header)?;

        let (id, email) = state.auth.validate(token).map_err(|e| {
            debug!(error = %e, "Rejected bearer token");
            e
        })?;

        Ok(AuthUser { id, email })
    }
}

/// Load the caller's roles and insist on `admin`. The account must also be
/// approved, matching the access gate that hides admin views otherwise.
pub async fn require_admin(users: &dyn UserDirectory, user: &AuthUser) -> Result<RoleSet, AppError> {
    let roles = users.get_roles(user.id).await?;
    if !roles.is_admin() {
        return Err(AppError::Forbidden("Admin role required".to_string()));
    }

    let approval = users
        .get_profile(user.id)
        .await?
        .map(|profile| profile.approval())
        .unwrap_or(ApprovalStatus::Unset);
    if gate_view(approval) != GateView::Content {
        return Err(AppError::Forbidden("Account is not approved".to_string()));
    }
    Ok(roles)
}
