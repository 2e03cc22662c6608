//! Authentication routes

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    Json,
};
use gatehouse_shared::{Identity, NewUser, Role, UserRecord, UserResponse};
use serde::{Deserialize, Serialize};

use crate::{
    auth::{
        hash_password, needs_rehash, validate_password_strength, verify_password, IssuedToken,
        RequestContext,
    },
    error::{ApiError, ApiResult},
    state::AppState,
};

// =============================================================================
// Request/Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub expires_at: i64,
    pub user: UserResponse,
}

impl AuthResponse {
    fn new(issued: IssuedToken, user: &UserRecord) -> Self {
        Self {
            access_token: issued.token,
            token_type: "Bearer".to_string(),
            expires_in: issued.expires_in,
            expires_at: issued.expires_at.unix_timestamp(),
            user: UserResponse::from(user),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user: UserResponse,
}

// =============================================================================
// Helpers
// =============================================================================

/// Run CPU-bound password work off the async runtime
async fn blocking<T, F>(work: F) -> ApiResult<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await.map_err(|e| {
        tracing::error!(error = %e, "password task failed");
        ApiError::Internal
    })
}

fn validate_registration(req: &RegisterRequest) -> ApiResult<()> {
    if !is_valid_email(&req.email) {
        return Err(ApiError::Validation("A valid email is required".to_string()));
    }
    if req.first_name.trim().is_empty() || req.last_name.trim().is_empty() {
        return Err(ApiError::Validation(
            "First and last name are required".to_string(),
        ));
    }
    validate_password_strength(&req.password).map_err(|e| ApiError::Validation(e.to_string()))
}

/// Simplified RFC 5322 address check
fn is_valid_email(email: &str) -> bool {
    let email = email.trim();

    // Length limits per RFC 5321
    if email.is_empty() || email.len() > 254 {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if domain.contains('@') {
        return false;
    }

    if local.is_empty() || local.len() > 64 {
        return false;
    }
    if local.starts_with('.') || local.ends_with('.') || local.contains("..") {
        return false;
    }
    if !local.chars().all(|c| c.is_alphanumeric() || ".+-_".contains(c)) {
        return false;
    }

    if domain.is_empty() || domain.len() > 255 {
        return false;
    }
    if domain.starts_with('-') || domain.ends_with('-') {
        return false;
    }
    if domain.starts_with('.') || domain.ends_with('.') || domain.contains("..") {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return false;
    }
    let labels_ok = labels.iter().all(|label| {
        !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_alphanumeric() || c == '-')
    });
    // TLD: at least two letters
    let tld_ok = labels
        .last()
        .is_some_and(|tld| tld.len() >= 2 && tld.chars().all(char::is_alphabetic));

    labels_ok && tld_ok
}

// =============================================================================
// Handlers
// =============================================================================

/// Register a new account with the `user` role
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    if !state.config.enable_signup {
        return Err(ApiError::Forbidden);
    }
    validate_registration(&req)?;

    let cost = state.config.password_hash_cost;
    let password = req.password;
    let password_hash = blocking(move || hash_password(&password, cost)).await??;

    let user = state.users.insert(NewUser {
        email: req.email,
        password_hash,
        first_name: req.first_name.trim().to_string(),
        last_name: req.last_name.trim().to_string(),
        role: Role::User,
    })?;

    tracing::info!(user_id = %user.id, "register: account created");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User created successfully".to_string(),
            user: UserResponse::from(&user),
        }),
    ))
}

/// Exchange email and password for an access token
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let user = match state.users.find_by_email(req.email.trim()) {
        Some(user) if user.active => Some(user),
        Some(user) => {
            tracing::warn!(user_id = %user.id, "login: account inactive");
            None
        }
        None => {
            tracing::warn!("login: unknown email");
            None
        }
    };

    // Unknown and inactive accounts verify against the decoy
    let stored = match &user {
        Some(user) => user.password_hash.clone(),
        None => state.decoy_password_hash.to_string(),
    };
    let password = req.password;
    let (valid, password) = blocking(move || {
        let valid = verify_password(&password, &stored);
        (valid, password)
    })
    .await?;

    let Some(user) = user else {
        return Err(ApiError::InvalidCredentials);
    };
    if !valid {
        tracing::warn!(user_id = %user.id, "login: wrong password");
        return Err(ApiError::InvalidCredentials);
    }

    let cost = state.config.password_hash_cost;
    if needs_rehash(&user.password_hash, cost) {
        upgrade_password_hash(&state, &user, password, cost).await;
    }

    let issued = state.token_issuer.issue(&user.principal())?;

    tracing::info!(user_id = %user.id, role = %user.role, "login: token issued");

    Ok(Json(AuthResponse::new(issued, &user)))
}

/// Replace an outdated hash after a successful login. Failures are logged, not surfaced.
async fn upgrade_password_hash(state: &AppState, user: &UserRecord, password: String, cost: u32) {
    match blocking(move || hash_password(&password, cost)).await {
        Ok(Ok(new_hash)) => match state.users.update_password_hash(&user.id, new_hash) {
            Ok(()) => tracing::info!(user_id = %user.id, "login: password hash upgraded"),
            Err(e) => tracing::error!(user_id = %user.id, error = %e, "login: failed to store upgraded hash"),
        },
        Ok(Err(e)) => tracing::error!(user_id = %user.id, error = %e, "login: rehash failed"),
        Err(_) => {}
    }
}

/// Issue a fresh token for the caller's current account state
pub async fn refresh(
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
) -> ApiResult<Json<AuthResponse>> {
    let identity = context.identity();

    let user = state
        .users
        .find_by_id(&identity.subject_id)
        .filter(|u| u.active)
        .ok_or_else(|| {
            tracing::warn!(subject_id = %identity.subject_id, "refresh: account missing or inactive");
            ApiError::Unauthorized
        })?;

    let issued = state.token_issuer.issue(&user.principal())?;
    Ok(Json(AuthResponse::new(issued, &user)))
}

/// The verified identity carried by the presented token
pub async fn me(Extension(context): Extension<RequestContext>) -> Json<Identity> {
    Json(context.identity().clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_emails() {
        for email in [
            "user@example.com",
            "first.last@example.co.uk",
            "user+tag@sub.example.org",
            "user_name-1@my-domain.io",
            "  padded@example.com  ",
        ] {
            assert!(is_valid_email(email), "{email} should be accepted");
        }
    }

    #[test]
    fn test_invalid_emails() {
        for email in [
            "",
            "not-an-email",
            "a@b.",
            "a@.x",
            "a@b.c",
            "@example.com",
            "user@",
            "user@localhost",
            "a@@example.com",
            "a@b@example.com",
            ".user@example.com",
            "user.@example.com",
            "us..er@example.com",
            "user@exa..mple.com",
            "user@-example.com",
            "user@example-.com",
            "user@example.c0m",
            "us er@example.com",
            "user@exa mple.com",
        ] {
            assert!(!is_valid_email(email), "{email} should be rejected");
        }
        assert!(!is_valid_email(&format!("{}@example.com", "a".repeat(65))));
    }
}
