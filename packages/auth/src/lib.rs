// ABOUTME: Daybook authentication library managing linked Google accounts
// ABOUTME: Persists OAuth credentials and keeps access tokens transparently fresh

pub mod error;
pub mod google;

// Re-export main types
pub use error::{AuthError, AuthResult};
pub use google::{
    AccountSession, AccountToken, CredentialStorage, CredentialWrite, GoogleAuthConfig,
    GoogleAuthManager, StoredCredential, TokenResponse, LEGACY_ACCOUNT_KEY,
};
