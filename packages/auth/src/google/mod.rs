// ABOUTME: Google OAuth module managing the multi-account credential lifecycle
// ABOUTME: Includes configuration, credential storage, and the refresh manager

pub mod config;
pub mod manager;
pub mod storage;
pub mod types;

pub use config::{GoogleAuthConfig, GOOGLE_OAUTH_SCOPES};
pub use manager::GoogleAuthManager;
pub use storage::CredentialStorage;
pub use types::{
    AccountSession, AccountToken, CredentialWrite, StoredCredential, TokenResponse,
    LEGACY_ACCOUNT_KEY,
};
