// ABOUTME: Configuration for the Google OAuth integration
// ABOUTME: Carries client credentials, the public base URL, and provider endpoint URLs

use serde::{Deserialize, Serialize};

use crate::error::{AuthError, AuthResult};

/// Google OAuth consent endpoint.
pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";

/// Google OAuth token endpoint.
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Google userinfo endpoint, used to resolve an account's email address.
pub const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

/// Scopes requested for every linked account
pub const GOOGLE_OAUTH_SCOPES: [&str; 3] = [
    "https://www.googleapis.com/auth/calendar.readonly",
    "https://www.googleapis.com/auth/calendar.events",
    "https://www.googleapis.com/auth/userinfo.email",
];

/// Google OAuth configuration
///
/// Passed explicitly to [`GoogleAuthManager::new`](crate::GoogleAuthManager::new)
/// rather than read from the environment at call sites. The endpoint URLs are
/// plain fields so tests can point the manager at a local mock server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Externally reachable base URL of the dashboard, e.g. `https://day.example.com`.
    pub base_url: String,
    pub auth_url: String,
    pub token_url: String,
    pub userinfo_url: String,
}

impl GoogleAuthConfig {
    /// Create a configuration pointing at the production Google endpoints.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            base_url: base_url.into(),
            auth_url: GOOGLE_AUTH_URL.to_string(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
            userinfo_url: GOOGLE_USERINFO_URL.to_string(),
        }
    }

    /// Load the configuration from environment variables.
    ///
    /// Reads `GOOGLE_CLIENT_ID`, `GOOGLE_CLIENT_SECRET`, and
    /// `DAYBOOK_BASE_URL`. Intended for binary entry points; library code
    /// should receive the configuration explicitly.
    pub fn from_env() -> AuthResult<Self> {
        let client_id = require_env("GOOGLE_CLIENT_ID")?;
        let client_secret = require_env("GOOGLE_CLIENT_SECRET")?;
        let base_url = require_env("DAYBOOK_BASE_URL")?;

        Ok(Self::new(client_id, client_secret, base_url))
    }

    /// Redirect URI registered with the provider.
    pub fn redirect_uri(&self) -> String {
        format!("{}/api/auth/callback", self.base_url.trim_end_matches('/'))
    }
}

fn require_env(name: &str) -> AuthResult<String> {
    std::env::var(name).map_err(|_| AuthError::Configuration(format!("{} is not set", name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_uses_google_endpoints() {
        let config = GoogleAuthConfig::new("client-id", "client-secret", "https://day.example.com");

        assert_eq!(config.auth_url, GOOGLE_AUTH_URL);
        assert_eq!(config.token_url, GOOGLE_TOKEN_URL);
        assert_eq!(config.userinfo_url, GOOGLE_USERINFO_URL);
    }

    #[test]
    fn test_redirect_uri() {
        let config = GoogleAuthConfig::new("id", "secret", "https://day.example.com");
        assert_eq!(
            config.redirect_uri(),
            "https://day.example.com/api/auth/callback"
        );
    }

    #[test]
    fn test_redirect_uri_trims_trailing_slash() {
        let config = GoogleAuthConfig::new("id", "secret", "https://day.example.com/");
        assert_eq!(
            config.redirect_uri(),
            "https://day.example.com/api/auth/callback"
        );
    }
}
