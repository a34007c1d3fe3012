// ABOUTME: Error types for authentication and OAuth operations
// ABOUTME: Distinguishes upstream provider failures from local storage and configuration errors

use thiserror::Error;

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Error, Debug)]
pub enum AuthError {
    /// Non-success response from the provider during code exchange.
    /// Carries the raw upstream response body for diagnostics.
    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    /// Non-success response from the provider during token refresh.
    /// Carries the raw upstream response body for diagnostics.
    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Storage error: {0}")]
    Storage(#[from] daybook_storage::StorageError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
}
