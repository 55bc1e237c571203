//! Session tokens for PFEHub users.
//!
//! Logging in yields one HS256 token that carries the user's id and role
//! (`ETUDIANT`, `ENCADRANT` or `ADMIN`). A session lasts one working day by
//! default; signing out only drops the token on the client side.

use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use pfehub_core::roles::Role;
use pfehub_core::types::DbId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Session length when `JWT_ACCESS_EXPIRY_MINS` is unset: eight hours.
const SESSION_MINUTES: i64 = 480;

/// Payload of a session token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Id of the signed-in student, professor or admin.
    pub sub: DbId,
    /// Wire name of the role at login time.
    pub role: String,
    pub exp: i64,
    pub iat: i64,
    /// Per-login id, logged on sign-out.
    pub jti: String,
}

impl Claims {
    fn for_session(user_id: DbId, role: Role, minutes: i64) -> Self {
        let issued = Utc::now().timestamp();
        Self {
            sub: user_id,
            role: role.as_str().to_string(),
            exp: issued + minutes * 60,
            iat: issued,
            jti: Uuid::new_v4().to_string(),
        }
    }
}

/// Signing secret and session length.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_expiry_mins: i64,
}

impl JwtConfig {
    /// Reads `JWT_SECRET` (required, non-empty) and `JWT_ACCESS_EXPIRY_MINS`
    /// (default 480).
    ///
    /// # Panics
    ///
    /// Panics when the secret is missing or empty, or the expiry is not an
    /// integer.
    pub fn from_env() -> Self {
        let secret =
            std::env::var("JWT_SECRET").expect("JWT_SECRET must be set in the environment");
        assert!(!secret.is_empty(), "JWT_SECRET must not be empty");

        let access_token_expiry_mins = match std::env::var("JWT_ACCESS_EXPIRY_MINS") {
            Ok(raw) => raw
                .parse()
                .expect("JWT_ACCESS_EXPIRY_MINS must be a whole number of minutes"),
            Err(_) => SESSION_MINUTES,
        };

        Self {
            secret,
            access_token_expiry_mins,
        }
    }

    fn encoding_key(&self) -> EncodingKey {
        EncodingKey::from_secret(self.secret.as_bytes())
    }

    fn decoding_key(&self) -> DecodingKey {
        DecodingKey::from_secret(self.secret.as_bytes())
    }
}

/// Sign a session token for a user who just logged in.
pub fn generate_access_token(
    user_id: DbId,
    role: Role,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims::for_session(user_id, role, config.access_token_expiry_mins);
    encode(&Header::default(), &claims, &config.encoding_key())
}

/// Check signature and expiry of a bearer token and return its claims.
pub fn validate_token(
    token: &str,
    config: &JwtConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    decode::<Claims>(token, &config.decoding_key(), &Validation::default()).map(|data| data.claims)
}
