//! Bearer-token authentication.
//!
//! The identity provider is external; this server only verifies HS256
//! session tokens carrying the user id and role.

mod extractor;
mod token;

use secrecy::SecretString;

pub use extractor::CurrentUser;
pub use token::{issue_token, verify_token, DEFAULT_TOKEN_TTL_SECS};

/// HMAC key for session tokens, shared with handlers as app data.
///
/// `Debug` prints `[REDACTED]`; the secret is zeroized on drop.
#[derive(Clone)]
pub struct SessionKey(SecretString);

impl SessionKey {
    pub fn new(secret: SecretString) -> Self {
        Self(secret)
    }

    pub(crate) fn secret(&self) -> &SecretString {
        &self.0
    }
}

impl From<&str> for SessionKey {
    fn from(secret: &str) -> Self {
        Self(SecretString::from(secret.to_string()))
    }
}

impl std::fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SessionKey([REDACTED])")
    }
}
