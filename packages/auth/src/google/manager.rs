// ABOUTME: Google OAuth manager orchestrating account linking and token refresh
// ABOUTME: Handles code exchange, transparent refresh, multi-account aggregation, and legacy migration

use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::error::{AuthError, AuthResult};
use crate::google::config::{GoogleAuthConfig, GOOGLE_OAUTH_SCOPES};
use crate::google::storage::CredentialStorage;
use crate::google::types::{
    AccountSession, AccountToken, CredentialWrite, TokenResponse, DEFAULT_EXPIRES_IN_SECS,
    LEGACY_ACCOUNT_KEY,
};

/// Timeout applied to every request against the provider.
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Google OAuth manager for linked dashboard accounts
///
/// Sole owner of the persisted credentials and the only component that talks
/// to the Google token and userinfo endpoints. Downstream calendar logic
/// obtains live bearer tokens through [`valid_access_token`] and
/// [`all_valid_access_tokens`].
///
/// [`valid_access_token`]: GoogleAuthManager::valid_access_token
/// [`all_valid_access_tokens`]: GoogleAuthManager::all_valid_access_tokens
pub struct GoogleAuthManager {
    config: GoogleAuthConfig,
    storage: CredentialStorage,
    client: Client,
}

/// Response from the Google userinfo endpoint
#[derive(Debug, Deserialize)]
struct UserInfo {
    #[serde(default)]
    email: Option<String>,
}

impl GoogleAuthManager {
    /// Create a new manager over an existing database pool
    pub fn new(config: GoogleAuthConfig, pool: SqlitePool) -> Self {
        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .expect("failed to create HTTP client");

        Self {
            config,
            storage: CredentialStorage::new(pool),
            client,
        }
    }

    /// Connect to the database at the given path and create a manager over it
    pub async fn connect(config: GoogleAuthConfig, database_path: &Path) -> AuthResult<Self> {
        let pool = daybook_storage::connect(database_path).await?;
        Ok(Self::new(config, pool))
    }

    /// Build the consent-screen URL a user visits to link an account.
    ///
    /// `access_type=offline` makes Google issue a refresh token, and
    /// `prompt=consent` forces re-consent so one is reissued even for an
    /// account that was linked before.
    pub fn authorization_url(&self) -> AuthResult<String> {
        let mut url = Url::parse(&self.config.auth_url)
            .map_err(|e| AuthError::Configuration(format!("Invalid auth URL: {}", e)))?;

        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_uri())
            .append_pair("response_type", "code")
            .append_pair("scope", &GOOGLE_OAUTH_SCOPES.join(" "))
            .append_pair("access_type", "offline")
            .append_pair("prompt", "consent");

        Ok(url.to_string())
    }

    /// Exchange an authorization code for tokens.
    ///
    /// Pure network operation; nothing is persisted. A non-success upstream
    /// status (expired or reused code, redirect URI mismatch) surfaces as
    /// [`AuthError::TokenExchange`] carrying the provider's response body.
    pub async fn exchange_code(&self, code: &str) -> AuthResult<TokenResponse> {
        let redirect_uri = self.config.redirect_uri();
        let params = [
            ("code", code),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("redirect_uri", redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ];

        let response = self
            .client
            .post(&self.config.token_url)
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("Token exchange failed with status {}", status);
            return Err(AuthError::TokenExchange(body));
        }

        Ok(response.json::<TokenResponse>().await?)
    }

    /// Obtain a fresh access token from a refresh token.
    ///
    /// Pure network operation; persistence is the caller's responsibility.
    /// A non-success upstream status (e.g. a revoked grant) surfaces as
    /// [`AuthError::RefreshFailed`] carrying the provider's response body.
    pub async fn refresh_access_token(&self, refresh_token: &str) -> AuthResult<TokenResponse> {
        let params = [
            ("refresh_token", refresh_token),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("grant_type", "refresh_token"),
        ];

        let response = self
            .client
            .post(&self.config.token_url)
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("Token refresh failed with status {}", status);
            return Err(AuthError::RefreshFailed(body));
        }

        Ok(response.json::<TokenResponse>().await?)
    }

    /// Resolve the email address behind an access token.
    ///
    /// Returns `Ok(None)` when the provider rejects the request; an
    /// unresolved email is not fatal to the linking flow, it just leaves the
    /// credential keyed under the legacy slot until re-authorization.
    pub async fn resolve_account_email(&self, access_token: &str) -> AuthResult<Option<String>> {
        let response = self
            .client
            .get(&self.config.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            debug!("Userinfo request failed with status {}", response.status());
            return Ok(None);
        }

        let info: UserInfo = response.json().await?;
        Ok(info.email)
    }

    /// Persist a token response under the account's email, falling back to
    /// the legacy single-account key when the email is unknown.
    pub async fn save_credential(
        &self,
        tokens: &TokenResponse,
        email: Option<&str>,
    ) -> AuthResult<()> {
        let expires_in = tokens.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS);
        let expires_at = Utc::now().timestamp_millis() + expires_in * 1000;

        let account_key = email.unwrap_or(LEGACY_ACCOUNT_KEY);

        let write = CredentialWrite {
            account_key: account_key.to_string(),
            access_token: tokens.access_token.clone(),
            refresh_token: tokens.refresh_token.clone(),
            token_type: tokens
                .token_type
                .clone()
                .unwrap_or_else(|| "Bearer".to_string()),
            expires_at,
            email: email.map(str::to_string),
        };

        self.storage.upsert(&write).await
    }

    /// Get a valid access token for one account, refreshing if needed.
    ///
    /// Returns `None` when no credential exists, when an expired credential
    /// has no refresh token, or when the refresh attempt fails. A failed
    /// refresh leaves the stored record in place so a later call can retry.
    pub async fn valid_access_token(&self, account_key: &str) -> AuthResult<Option<String>> {
        let Some(credential) = self.storage.get(account_key).await? else {
            return Ok(None);
        };

        if !credential.needs_refresh() {
            return Ok(Some(credential.access_token));
        }

        let Some(refresh_token) = credential.refresh_token.as_deref() else {
            debug!(
                "Credential for {} is expired with no refresh token",
                account_key
            );
            return Ok(None);
        };

        match self
            .refresh_and_save(refresh_token, credential.email.as_deref())
            .await
        {
            Ok(access_token) => Ok(Some(access_token)),
            Err(e) => {
                warn!("Failed to refresh token for {}: {}", account_key, e);
                Ok(None)
            }
        }
    }

    /// Get live access tokens for every linked account, oldest first.
    ///
    /// Applies the same refresh-or-skip logic as [`valid_access_token`] per
    /// account, but failures are isolated: an account that cannot produce a
    /// live token is skipped and never aborts the aggregation.
    ///
    /// [`valid_access_token`]: GoogleAuthManager::valid_access_token
    pub async fn all_valid_access_tokens(&self) -> AuthResult<Vec<AccountToken>> {
        let credentials = self.storage.list().await?;
        let mut tokens = Vec::with_capacity(credentials.len());

        for credential in credentials {
            if !credential.needs_refresh() {
                tokens.push(AccountToken {
                    email: credential.email,
                    access_token: credential.access_token,
                });
                continue;
            }

            let Some(refresh_token) = credential.refresh_token.as_deref() else {
                debug!(
                    "Skipping {}: expired with no refresh token",
                    credential.account_key
                );
                continue;
            };

            match self
                .refresh_and_save(refresh_token, credential.email.as_deref())
                .await
            {
                Ok(access_token) => tokens.push(AccountToken {
                    email: credential.email.clone(),
                    access_token,
                }),
                Err(e) => {
                    warn!("Skipping {}: refresh failed: {}", credential.account_key, e);
                }
            }
        }

        Ok(tokens)
    }

    /// List linked accounts for display. No refresh side effects.
    pub async fn sessions(&self) -> AuthResult<Vec<AccountSession>> {
        self.storage.sessions().await
    }

    /// Unlink one account, or every account when no key is given
    pub async fn logout(&self, account_key: Option<&str>) -> AuthResult<()> {
        match account_key {
            Some(key) => self.storage.delete(key).await,
            None => self.storage.delete_all().await,
        }
    }

    /// Fold a legacy single-account record into the multi-account layout.
    ///
    /// Safe to invoke on every request: once the legacy record is gone,
    /// repeated calls are no-ops. When a canonical record already exists
    /// under the legacy record's email, the canonical one wins and the
    /// legacy row is discarded. A legacy record whose email was never
    /// resolved carries too little information to migrate and is left alone.
    pub async fn migrate_legacy_record(&self) -> AuthResult<()> {
        let Some(legacy) = self.storage.get(LEGACY_ACCOUNT_KEY).await? else {
            return Ok(());
        };

        let Some(email) = legacy.email else {
            debug!("Legacy credential has no resolved email, leaving it in place");
            return Ok(());
        };

        if self.storage.get(&email).await?.is_some() {
            info!("Discarding legacy credential superseded by {}", email);
            self.storage.delete(LEGACY_ACCOUNT_KEY).await
        } else {
            info!("Migrating legacy credential to {}", email);
            self.storage.rekey(LEGACY_ACCOUNT_KEY, &email).await
        }
    }

    async fn refresh_and_save(
        &self,
        refresh_token: &str,
        email: Option<&str>,
    ) -> AuthResult<String> {
        let refreshed = self.refresh_access_token(refresh_token).await?;
        self.save_credential(&refreshed, email).await?;

        info!(
            "Refreshed access token for {}",
            email.unwrap_or(LEGACY_ACCOUNT_KEY)
        );
        Ok(refreshed.access_token)
    }
}
