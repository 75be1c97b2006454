//! Access token value and renewal policy.

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

use crate::error::{AuthError, AuthResult};

/// Renew this many seconds before the provider-reported expiry.
pub const TOKEN_RENEWAL_MARGIN: i64 = 100;

/// Bearer token with its absolute expiry.
///
/// Tokens are replaced wholesale on renewal and never mutated.
#[derive(Clone)]
pub struct AccessToken {
    token: String,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    /// Build a token issued at `issued_at` with a lifetime of `expires_in` seconds.
    ///
    /// Fails when the lifetime does not fit a `DateTime`.
    pub fn issued(
        token: impl Into<String>,
        issued_at: DateTime<Utc>,
        expires_in: i64,
    ) -> AuthResult<Self> {
        let expires_at = Duration::try_seconds(expires_in)
            .and_then(|lifetime| issued_at.checked_add_signed(lifetime))
            .ok_or_else(|| AuthError::invalid_response("expires_in out of range"))?;

        Ok(Self {
            token: token.into(),
            expires_at,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.token
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Whole seconds of lifetime left at `now`, never negative.
    pub fn expires_in(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now).num_seconds().max(0)
    }

    /// True once `now` is inside the renewal margin.
    pub fn needs_renewal(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(TOKEN_RENEWAL_MARGIN) > self.expires_at
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Body returned by the OAuth token endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    pub expires_in: i64,
}
