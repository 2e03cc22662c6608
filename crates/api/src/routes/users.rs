//! User profile routes

use axum::{
    extract::{Extension, State},
    Json,
};
use gatehouse_shared::{Identity, UserRecord, UserResponse, UserUpdate};
use serde::{Deserialize, Serialize};

use crate::{
    auth::RequestContext,
    error::{ApiError, ApiResult},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Serialize)]
pub struct UpdateProfileResponse {
    pub message: String,
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// The caller's account. A deactivated account is treated like a revoked token.
fn current_account(state: &AppState, identity: &Identity) -> ApiResult<UserRecord> {
    let user = state
        .users
        .find_by_id(&identity.subject_id)
        .ok_or(ApiError::NotFound)?;

    if !user.active {
        tracing::warn!(user_id = %user.id, "profile: account inactive");
        return Err(ApiError::Unauthorized);
    }
    Ok(user)
}

/// Trimmed, non-empty first and last name
pub(crate) fn validate_names(first_name: &str, last_name: &str) -> ApiResult<(String, String)> {
    let (first_name, last_name) = (first_name.trim(), last_name.trim());
    if first_name.is_empty() || last_name.is_empty() {
        return Err(ApiError::Validation(
            "First and last name are required".to_string(),
        ));
    }
    Ok((first_name.to_string(), last_name.to_string()))
}

/// The caller's stored profile
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
) -> ApiResult<Json<UserResponse>> {
    let user = current_account(&state, context.identity())?;
    Ok(Json(UserResponse::from(&user)))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
    Json(req): Json<UpdateProfileRequest>,
) -> ApiResult<Json<UpdateProfileResponse>> {
    let user = current_account(&state, context.identity())?;
    let (first_name, last_name) = validate_names(&req.first_name, &req.last_name)?;

    let user = state.users.update(
        &user.id,
        UserUpdate {
            first_name: Some(first_name),
            last_name: Some(last_name),
            ..UserUpdate::default()
        },
    )?;

    tracing::info!(user_id = %user.id, "profile: updated");

    Ok(Json(UpdateProfileResponse {
        message: "Profile updated successfully".to_string(),
        user: UserResponse::from(&user),
    }))
}

/// Deactivate the caller's account. Login and refresh are refused afterwards.
pub async fn delete_profile(
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
) -> ApiResult<Json<MessageResponse>> {
    let user = current_account(&state, context.identity())?;
    state.users.deactivate(&user.id)?;

    tracing::info!(user_id = %user.id, "profile: account deactivated");

    Ok(Json(MessageResponse {
        message: "Account deleted successfully".to_string(),
    }))
}
