//! Session token minting and verification.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::ExposeSecret;
use uuid::Uuid;

use super::SessionKey;
use crate::config::TOKEN_ISSUER;
use crate::error::{AppError, AppResult};
use crate::models::{SessionClaims, UserRole};

/// Default lifetime of a minted token (12 hours).
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 12 * 60 * 60;

/// Mint a session token for `user_id` with `role`.
pub fn issue_token(
    user_id: Uuid,
    role: UserRole,
    key: &SessionKey,
    ttl_secs: u64,
) -> AppResult<String> {
    let now = chrono::Utc::now();
    let exp = now + chrono::Duration::seconds(ttl_secs as i64);

    let claims = SessionClaims {
        sub: user_id.to_string(),
        iss: TOKEN_ISSUER.to_string(),
        exp: exp.timestamp() as usize,
        iat: now.timestamp() as usize,
        role,
    };

    let encoding_key = EncodingKey::from_secret(key.secret().expose_secret().as_bytes());
    encode(&Header::default(), &claims, &encoding_key)
        .map_err(|e| AppError::InvalidInput(format!("Failed to create session token: {}", e)))
}

/// Verify a session token and return its claims.
pub fn verify_token(token: &str, key: &SessionKey) -> Result<SessionClaims, String> {
    let decoding_key = DecodingKey::from_secret(key.secret().expose_secret().as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[TOKEN_ISSUER]);
    validation.validate_aud = false;

    let token_data = decode::<SessionClaims>(token, &decoding_key, &validation)
        .map_err(|e| format!("Invalid session token: {}", e))?;

    Ok(token_data.claims)
}
