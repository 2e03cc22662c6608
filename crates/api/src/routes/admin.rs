//! Admin routes. Mounted behind the `admin` role gate.

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use gatehouse_shared::{Role, UserResponse, UserUpdate};
use serde::{Deserialize, Serialize};

use super::users::{validate_names, MessageResponse, UpdateProfileResponse};
use crate::{
    auth::RequestContext,
    error::{ApiError, ApiResult},
    state::AppState,
};

const DEFAULT_PAGE_SIZE: usize = 10;
const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ListUsersResponse {
    pub users: Vec<UserResponse>,
    pub page: usize,
    pub limit: usize,
}

pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> Json<ListUsersResponse> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let offset = (page - 1).saturating_mul(limit);

    let users = state
        .users
        .list(offset, limit)
        .iter()
        .map(UserResponse::from)
        .collect();

    Json(ListUsersResponse { users, page, limit })
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<UserResponse>> {
    let user = state.users.find_by_id(&user_id).ok_or(ApiError::NotFound)?;
    Ok(Json(UserResponse::from(&user)))
}

/// Every field is required; the record is replaced as a whole
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub active: bool,
}

/// Role and active changes apply from the user's next login or refresh
pub async fn update_user(
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
    Path(user_id): Path<String>,
    Json(req): Json<UpdateUserRequest>,
) -> ApiResult<Json<UpdateProfileResponse>> {
    let (first_name, last_name) = validate_names(&req.first_name, &req.last_name)?;

    let user = state.users.update(
        &user_id,
        UserUpdate {
            first_name: Some(first_name),
            last_name: Some(last_name),
            role: Some(req.role),
            active: Some(req.active),
        },
    )?;

    tracing::info!(
        admin_id = %context.identity().subject_id,
        user_id = %user.id,
        role = %user.role,
        active = user.active,
        "admin: user updated"
    );

    Ok(Json(UpdateProfileResponse {
        message: "User updated successfully".to_string(),
        user: UserResponse::from(&user),
    }))
}

/// Soft delete: the account is deactivated, not removed
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let user = state.users.deactivate(&user_id)?;

    tracing::info!(
        admin_id = %context.identity().subject_id,
        user_id = %user.id,
        "admin: user deactivated"
    );

    Ok(Json(MessageResponse {
        message: "User deleted successfully".to_string(),
    }))
}
