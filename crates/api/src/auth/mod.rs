//! Authentication module for Gatehouse

pub mod jwt;
pub mod middleware;
pub mod password;

pub use jwt::{Claims, IssuedToken, JwtError, SigningSecret, TokenIssuer, TokenVerifier};
pub use middleware::{
    check_role, extract_bearer_token, require_auth, require_role, AuthState, BearerError,
    RequestContext, RoleError,
};
pub use password::{
    decoy_hash, hash_password, needs_rehash, validate_password_strength, verify_password,
    PasswordError,
};
