// ABOUTME: Core type definitions for Google OAuth credentials
// ABOUTME: Includes the stored credential row, wire token response, and account projections

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Account key of the single-account record predating multi-account support.
pub const LEGACY_ACCOUNT_KEY: &str = "default";

/// Safety buffer applied to expiry checks (5 minutes, in milliseconds).
pub const EXPIRY_BUFFER_MS: i64 = 300_000;

/// Access-token lifetime assumed when the provider omits `expires_in`.
pub const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

/// One linked account's credential as stored in the database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredCredential {
    pub account_key: String,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub token_type: String,
    pub expires_at: i64, // Epoch milliseconds
    pub email: Option<String>,
    pub created_at: i64, // Epoch seconds
    pub updated_at: i64, // Epoch seconds
}

impl StoredCredential {
    /// Check if the access token is expired, with the 5-minute buffer
    pub fn needs_refresh(&self) -> bool {
        Utc::now().timestamp_millis() > self.expires_at - EXPIRY_BUFFER_MS
    }

    /// Check if the credential has a renewal path once the access token expires
    pub fn is_renewable(&self) -> bool {
        self.refresh_token.is_some()
    }
}

/// Fields written when saving a credential; row timestamps are database-managed
#[derive(Debug, Clone)]
pub struct CredentialWrite {
    pub account_key: String,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub token_type: String,
    pub expires_at: i64,
    pub email: Option<String>,
}

/// Token response from the Google token endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>, // Seconds
    #[serde(default)]
    pub token_type: Option<String>,
}

/// A live access token for one linked account
#[derive(Debug, Clone, Serialize)]
pub struct AccountToken {
    pub email: Option<String>,
    pub access_token: String,
}

/// Read-only projection of a linked account for display
#[derive(Debug, Clone, Serialize)]
pub struct AccountSession {
    pub account_key: String,
    pub email: Option<String>,
    pub connected_at: i64,
}
