//! Request gating middleware
//!
//! [`require_auth`] verifies the bearer token and attaches a [`RequestContext`]
//! to the request. [`require_role`] runs after it and admits only callers
//! whose role matches exactly. Every verification failure becomes the same
//! generic 401; which check failed is only logged.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use gatehouse_shared::{Identity, Role};

use super::jwt::TokenVerifier;
use crate::error::ApiError;

const BEARER_PREFIX: &str = "Bearer ";

/// State needed by the authentication gate
#[derive(Clone)]
pub struct AuthState {
    pub verifier: Arc<TokenVerifier>,
}

impl AuthState {
    pub fn new(verifier: Arc<TokenVerifier>) -> Self {
        Self { verifier }
    }
}

/// Per-request identity, inserted once by [`require_auth`] and read-only afterwards
#[derive(Debug, Clone)]
pub struct RequestContext {
    identity: Identity,
}

impl RequestContext {
    pub(super) fn new(identity: Identity) -> Self {
        Self { identity }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum BearerError {
    #[error("Authorization header missing")]
    Missing,
    #[error("Authorization header is not a bearer credential")]
    Malformed,
    #[error("Bearer token is empty")]
    Empty,
}

/// Pull the token out of `Authorization: Bearer <token>`.
///
/// The prefix is case sensitive with exactly one space. A header without it is
/// rejected rather than treated as a raw token.
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, BearerError> {
    let value = headers.get(AUTHORIZATION).ok_or(BearerError::Missing)?;
    let value = value.to_str().map_err(|_| BearerError::Malformed)?;
    let token = value
        .strip_prefix(BEARER_PREFIX)
        .ok_or(BearerError::Malformed)?;

    if token.is_empty() {
        return Err(BearerError::Empty);
    }
    Ok(token)
}

/// Authentication gate: requires a valid bearer token
pub async fn require_auth(
    State(state): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match extract_bearer_token(request.headers()) {
        Ok(token) => token,
        Err(e) => {
            tracing::debug!(reason = %e, path = %request.uri().path(), "auth: rejected request");
            return ApiError::Unauthorized.into_response();
        }
    };

    let identity = match state.verifier.verify(token) {
        Ok(identity) => identity,
        Err(e) => {
            tracing::warn!(reason = %e, path = %request.uri().path(), "auth: token verification failed");
            return ApiError::Unauthorized.into_response();
        }
    };

    tracing::debug!(subject_id = %identity.subject_id, role = %identity.role, "auth: request authenticated");

    request.extensions_mut().insert(RequestContext::new(identity));
    next.run(request).await
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum RoleError {
    /// No identity attached: the role gate ran without the authentication gate
    #[error("Authentication required")]
    AuthenticationRequired,
    #[error("Insufficient permissions: requires {required}")]
    InsufficientRole { required: Role },
}

impl From<RoleError> for ApiError {
    fn from(err: RoleError) -> Self {
        match err {
            RoleError::AuthenticationRequired => ApiError::AuthenticationRequired,
            RoleError::InsufficientRole { .. } => ApiError::Forbidden,
        }
    }
}

/// Decide whether the context satisfies `required` (exact match, no hierarchy)
pub fn check_role(context: Option<&RequestContext>, required: Role) -> Result<&Identity, RoleError> {
    let identity = context
        .map(RequestContext::identity)
        .ok_or(RoleError::AuthenticationRequired)?;

    if !identity.has_role(required) {
        return Err(RoleError::InsufficientRole { required });
    }
    Ok(identity)
}

/// Role gate. Mount with `from_fn_with_state(Role::Admin, require_role)`
/// inside a router already wrapped by [`require_auth`].
pub async fn require_role(State(required): State<Role>, request: Request, next: Next) -> Response {
    let decision = check_role(request.extensions().get::<RequestContext>(), required).map(|_| ());

    match decision {
        Ok(()) => next.run(request).await,
        Err(e) => {
            match &e {
                RoleError::AuthenticationRequired => {
                    tracing::error!(
                        path = %request.uri().path(),
                        "auth: role gate reached without an authenticated identity"
                    )
                }
                RoleError::InsufficientRole { .. } => {
                    tracing::warn!(path = %request.uri().path(), reason = %e, "auth: role check failed")
                }
            }
            ApiError::from(e).into_response()
        }
    }
}
