//! JWT token issuance and verification
//!
//! Tokens are HS256-signed JWTs over [`Claims`]. Verification is stateless and
//! runs the same stages on every call: parse, algorithm check, signature check,
//! claim decode, expiry check. Nothing is cached between requests.

use std::fmt;

use gatehouse_shared::{Identity, Principal, Role};
use jsonwebtoken::{decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

/// The only algorithm tokens are issued with or accepted under
pub const TOKEN_ALGORITHM: Algorithm = Algorithm::HS256;

/// Shared HMAC signing secret.
///
/// Non-empty by construction. `Debug` is redacted so the secret cannot reach
/// logs or error messages.
#[derive(Clone)]
pub struct SigningSecret(Vec<u8>);

impl SigningSecret {
    pub fn new(secret: impl Into<Vec<u8>>) -> Result<Self, JwtError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(JwtError::Issuance("signing secret is empty".to_string()));
        }
        Ok(Self(secret))
    }

    fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningSecret(<redacted>)")
    }
}

/// JWT claims structure for Gatehouse-issued tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Email
    #[serde(default)]
    pub email: String,
    /// User role
    pub role: Role,
    /// Issued at (Unix seconds)
    pub iat: i64,
    /// Expiration (Unix seconds)
    pub exp: i64,
}

/// A freshly signed token and its lifetime
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: OffsetDateTime,
    /// Seconds until expiry, measured from issuance
    pub expires_in: i64,
}

/// Builds signed, time-bounded credential tokens
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &SigningSecret, ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    /// Issue a token for `principal`, valid from now for the configured TTL
    pub fn issue(&self, principal: &Principal) -> Result<IssuedToken, JwtError> {
        self.issue_at(principal, OffsetDateTime::now_utc())
    }

    /// Issue a token as if the current time were `now`
    pub fn issue_at(
        &self,
        principal: &Principal,
        now: OffsetDateTime,
    ) -> Result<IssuedToken, JwtError> {
        let expires_at = now
            .checked_add(self.ttl)
            .ok_or_else(|| JwtError::Issuance("token lifetime overflows the clock".to_string()))?;

        let claims = Claims {
            sub: principal.subject_id.clone(),
            email: principal.email.clone(),
            role: principal.role,
            iat: now.unix_timestamp(),
            exp: expires_at.unix_timestamp(),
        };

        // Explicit algorithm, never inferred
        let token = encode(&Header::new(TOKEN_ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| JwtError::Issuance(e.to_string()))?;

        Ok(IssuedToken {
            token,
            expires_at,
            expires_in: self.ttl.whole_seconds(),
        })
    }
}

/// Validates token signatures and decodes claims into an [`Identity`]
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &SigningSecret) -> Self {
        let mut validation = Validation::new(TOKEN_ALGORITHM);
        // Expiry is checked after decode, strictly and without leeway
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["sub", "exp"]);

        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Verify a token against the current time
    pub fn verify(&self, token: &str) -> Result<Identity, JwtError> {
        self.verify_at(token, OffsetDateTime::now_utc())
    }

    /// Verify a token as if the current time were `now`
    pub fn verify_at(&self, token: &str, now: OffsetDateTime) -> Result<Identity, JwtError> {
        // Parse
        if token.split('.').count() != 3 {
            return Err(JwtError::InvalidToken);
        }
        let header = decode_header(token).map_err(|_| JwtError::InvalidToken)?;

        // Algorithm check
        if header.alg != TOKEN_ALGORITHM {
            return Err(JwtError::InvalidToken);
        }

        // Signature check and claim decode
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::Json(_)
                | jsonwebtoken::errors::ErrorKind::MissingRequiredClaim(_) => {
                    JwtError::InvalidClaims
                }
                _ => JwtError::InvalidToken,
            })?;

        if claims.sub.trim().is_empty() {
            return Err(JwtError::InvalidClaims);
        }

        let issued_at =
            OffsetDateTime::from_unix_timestamp(claims.iat).map_err(|_| JwtError::InvalidClaims)?;
        let expires_at =
            OffsetDateTime::from_unix_timestamp(claims.exp).map_err(|_| JwtError::InvalidClaims)?;

        // Expiry check
        if expires_at.unix_timestamp() <= now.unix_timestamp() {
            return Err(JwtError::Expired);
        }

        Ok(Identity {
            subject_id: claims.sub,
            email: claims.email,
            role: claims.role,
            issued_at,
            expires_at,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("Token has expired")]
    Expired,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Invalid token claims")]
    InvalidClaims,
    #[error("Token issuance failed: {0}")]
    Issuance(String),
}
