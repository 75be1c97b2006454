//! OAuth client-credentials token management.
//!
//! [`AccessTokenManager`] owns the current token and decides when it has to
//! be renewed. It never retries on its own: a failed exchange is returned to
//! the caller, which owns the backoff policy.

use std::time::Duration;

use chrono::Utc;
use reqwest::Client;
use tracing::{debug, info};

use crate::config::AuthConfig;
use crate::error::{AuthError, AuthResult};
use crate::token::{AccessToken, TokenResponse};

/// Holds the current bearer token and renews it on demand.
pub struct AccessTokenManager {
    http: Client,
    config: AuthConfig,
    token: Option<AccessToken>,
}

impl AccessTokenManager {
    /// Create a new token manager. No request is made until [`acquire`](Self::acquire).
    pub fn new(config: AuthConfig) -> AuthResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("bwac-auth/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(AuthError::Network)?;

        Ok(Self {
            http,
            config,
            token: None,
        })
    }

    /// Create from environment variables.
    pub fn from_env() -> AuthResult<Self> {
        Self::new(AuthConfig::from_env()?)
    }

    /// Exchange credentials for a token unless the current one is still valid.
    ///
    /// With `force` set, a new token is requested regardless.
    pub async fn acquire(&mut self, force: bool) -> AuthResult<()> {
        if !force && !self.requires_renewal() {
            debug!("Access token still valid, no renewal required");
            return Ok(());
        }

        let response = self
            .http
            .post(&self.config.token_url)
            .form(&self.config.credentials.form())
            .send()
            .await?;

        let issued_at = Utc::now();
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(AuthError::TokenEndpoint {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| AuthError::invalid_response(format!("{}: {}", e, body)))?;

        if parsed.access_token.is_empty() {
            return Err(AuthError::invalid_response("empty access_token"));
        }

        let token = AccessToken::issued(parsed.access_token, issued_at, parsed.expires_in)?;
        info!(
            expires_in = parsed.expires_in,
            expires_at = %token.expires_at(),
            "Acquired access token"
        );
        self.token = Some(token);
        Ok(())
    }

    /// True if no token exists or the current one is inside the renewal margin.
    pub fn requires_renewal(&self) -> bool {
        match &self.token {
            Some(token) => token.needs_renewal(Utc::now()),
            None => true,
        }
    }

    /// Current bearer token string.
    pub fn access_token(&self) -> AuthResult<&str> {
        self.token
            .as_ref()
            .map(AccessToken::as_str)
            .ok_or(AuthError::NotAuthenticated)
    }

    /// Remaining lifetime of the current token in seconds.
    pub fn expires_in(&self) -> AuthResult<i64> {
        self.token
            .as_ref()
            .map(|token| token.expires_in(Utc::now()))
            .ok_or(AuthError::NotAuthenticated)
    }
}
