use axum::extract::State;
use axum::response::{IntoResponse, Response};

use crate::access::evaluate_access;
use crate::auth::AuthUser;
use crate::models::ApprovalStatus;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::success;

/// The caller's gate decision. Lookup failures are returned as errors; the
/// caller is never defaulted to a plain `user`.
pub async fn my_access(State(state): State<AppState>, user: AuthUser) -> Result<Response, AppError> {
    let approval = state
        .users
        .get_profile(user.id)
        .await?
        .map(|profile| profile.approval())
        .unwrap_or(ApprovalStatus::Unset);
    let roles = state.users.get_roles(user.id).await?;

    Ok(success(evaluate_access(&roles, approval), "Access evaluated").into_response())
}
