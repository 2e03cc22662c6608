//! Shared application state

use std::sync::Arc;

use gatehouse_shared::UserStore;

use crate::{
    auth::{decoy_hash, AuthState, TokenIssuer, TokenVerifier},
    config::Config,
};

/// State shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub users: Arc<dyn UserStore>,
    pub token_issuer: Arc<TokenIssuer>,
    pub token_verifier: Arc<TokenVerifier>,
    /// Verified against on login when no active account matches
    pub decoy_password_hash: Arc<str>,
}

impl AppState {
    /// Build the issuer and verifier from the configured secret.
    /// Both hold their own copy of the key; nothing reads it globally.
    /// Hashes the login decoy once, at the configured cost.
    pub fn new(config: Config, users: Arc<dyn UserStore>) -> Self {
        let token_issuer = TokenIssuer::new(&config.jwt_secret, config.token_ttl());
        let token_verifier = TokenVerifier::new(&config.jwt_secret);
        let decoy_password_hash = decoy_hash(config.password_hash_cost).unwrap_or_else(|e| {
            tracing::error!(error = %e, "failed to build decoy password hash");
            String::new()
        });

        Self {
            config: Arc::new(config),
            users,
            token_issuer: Arc::new(token_issuer),
            token_verifier: Arc::new(token_verifier),
            decoy_password_hash: decoy_password_hash.into(),
        }
    }

    /// State for the authentication middleware
    pub fn auth_state(&self) -> AuthState {
        AuthState::new(Arc::clone(&self.token_verifier))
    }
}
