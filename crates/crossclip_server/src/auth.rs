//! Shared-secret authentication.
//!
//! Every HTTP request carries the secret in the `x-api-key` header and the
//! push channel carries it in the `token` query parameter. Both are checked
//! by exact equality against the configured secret.

use crate::error::{ServerError, ServerResult};

/// Validates presented secrets against the configured one.
#[derive(Clone)]
pub struct SecretValidator {
    secret: String,
}

impl SecretValidator {
    /// Creates a validator for the given shared secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Checks a presented secret. A missing secret is rejected.
    pub fn validate(&self, presented: Option<&str>) -> ServerResult<()> {
        match presented {
            Some(token) if token.as_bytes() == self.secret.as_bytes() => Ok(()),
            Some(_) => Err(ServerError::Unauthorized("Invalid API Key".into())),
            None => Err(ServerError::Unauthorized("Missing API Key".into())),
        }
    }
}

impl std::fmt::Debug for SecretValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretValidator").finish_non_exhaustive()
    }
}
