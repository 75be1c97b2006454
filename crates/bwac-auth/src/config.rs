//! Credential configuration.

use std::time::Duration;

use crate::error::{AuthError, AuthResult};

/// Default OAuth token endpoint.
pub const DEFAULT_TOKEN_URL: &str = "https://id.barentswatch.no/connect/token";

/// Client-credentials grant parameters.
#[derive(Clone)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub scope: String,
    pub grant_type: String,
}

impl ClientCredentials {
    /// Credentials with the default `ais` scope and `client_credentials` grant.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            scope: "ais".to_string(),
            grant_type: "client_credentials".to_string(),
        }
    }

    /// Form fields posted to the token endpoint.
    pub fn form(&self) -> [(&'static str, &str); 4] {
        [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("scope", self.scope.as_str()),
            ("grant_type", self.grant_type.as_str()),
        ]
    }
}

impl std::fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("scope", &self.scope)
            .field("grant_type", &self.grant_type)
            .finish()
    }
}

/// Token manager configuration.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub credentials: ClientCredentials,
    /// OAuth token endpoint
    pub token_url: String,
    /// Request timeout for the token exchange
    pub timeout: Duration,
}

impl AuthConfig {
    pub fn new(credentials: ClientCredentials) -> Self {
        Self {
            credentials,
            token_url: DEFAULT_TOKEN_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Create config from `BARENTS_WATCH_*` environment variables.
    pub fn from_env() -> AuthResult<Self> {
        let client_id = required_var("BARENTS_WATCH_CLIENT_ID")?;
        let client_secret = required_var("BARENTS_WATCH_CLIENT_SECRET")?;

        let mut credentials = ClientCredentials::new(client_id, client_secret);
        if let Ok(scope) = std::env::var("BARENTS_WATCH_SCOPE") {
            credentials.scope = scope;
        }
        if let Ok(grant_type) = std::env::var("BARENTS_WATCH_GRANT_TYPE") {
            credentials.grant_type = grant_type;
        }

        Ok(Self {
            credentials,
            token_url: std::env::var("BARENTS_WATCH_TOKEN_URL")
                .unwrap_or_else(|_| DEFAULT_TOKEN_URL.to_string()),
            timeout: Duration::from_secs(
                std::env::var("BARENTS_WATCH_TOKEN_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
        })
    }
}

fn required_var(name: &str) -> AuthResult<String> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        Ok(_) => Err(AuthError::config(format!("{} cannot be empty", name))),
        Err(_) => Err(AuthError::config(format!("Missing {} in environment", name))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for name in [
            "BARENTS_WATCH_CLIENT_ID",
            "BARENTS_WATCH_CLIENT_SECRET",
            "BARENTS_WATCH_SCOPE",
            "BARENTS_WATCH_GRANT_TYPE",
            "BARENTS_WATCH_TOKEN_URL",
            "BARENTS_WATCH_TOKEN_TIMEOUT_SECS",
        ] {
            std::env::remove_var(name);
        }
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        clear_env();
        std::env::set_var("BARENTS_WATCH_CLIENT_ID", "me@example.com:bwac");
        std::env::set_var("BARENTS_WATCH_CLIENT_SECRET", "secret");

        let config = AuthConfig::from_env().unwrap();
        assert_eq!(config.credentials.client_id, "me@example.com:bwac");
        assert_eq!(config.credentials.scope, "ais");
        assert_eq!(config.credentials.grant_type, "client_credentials");
        assert_eq!(config.token_url, DEFAULT_TOKEN_URL);
        assert_eq!(config.timeout, Duration::from_secs(30));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        clear_env();
        std::env::set_var("BARENTS_WATCH_CLIENT_ID", "id");
        std::env::set_var("BARENTS_WATCH_CLIENT_SECRET", "secret");
        std::env::set_var("BARENTS_WATCH_SCOPE", "ais api");
        std::env::set_var("BARENTS_WATCH_TOKEN_URL", "http://localhost:9999/token");

        let config = AuthConfig::from_env().unwrap();
        assert_eq!(config.credentials.scope, "ais api");
        assert_eq!(config.token_url, "http://localhost:9999/token");
        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_requires_credentials() {
        clear_env();
        let err = AuthConfig::from_env().unwrap_err();
        assert!(matches!(err, AuthError::Config(_)));

        std::env::set_var("BARENTS_WATCH_CLIENT_ID", "id");
        std::env::set_var("BARENTS_WATCH_CLIENT_SECRET", "  ");
        let err = AuthConfig::from_env().unwrap_err();
        assert!(err.to_string().contains("cannot be empty"));
        clear_env();
    }

    #[test]
    fn test_debug_redacts_secret() {
        let credentials = ClientCredentials::new("id", "hunter2");
        let rendered = format!("{:?}", credentials);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }
}
