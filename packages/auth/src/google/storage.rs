// ABOUTME: Database storage layer for Google account credentials
// ABOUTME: Sole owner of the google_credentials table, including the coalescing upsert

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::error::AuthResult;
use crate::google::types::{AccountSession, CredentialWrite, StoredCredential};

/// Credential storage for database operations
pub struct CredentialStorage {
    pool: SqlitePool,
}

impl CredentialStorage {
    /// Create new credential storage with a database pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert or update the credential for an account.
    ///
    /// On conflict the access token, token type, and expiry are overwritten
    /// unconditionally, while the refresh token and email only change when
    /// the incoming write carries a value. Google does not reissue a refresh
    /// token on every grant, so a plain overwrite would silently drop the
    /// only copy.
    pub async fn upsert(&self, write: &CredentialWrite) -> AuthResult<()> {
        debug!("Storing credential for account: {}", write.account_key);

        sqlx::query(
            r#"
            INSERT INTO google_credentials (
                account_key, access_token, refresh_token, token_type,
                expires_at, email, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, unixepoch(), unixepoch())
            ON CONFLICT(account_key) DO UPDATE SET
                access_token = excluded.access_token,
                refresh_token = COALESCE(excluded.refresh_token, google_credentials.refresh_token),
                token_type = excluded.token_type,
                expires_at = excluded.expires_at,
                email = COALESCE(excluded.email, google_credentials.email),
                updated_at = unixepoch()
            "#,
        )
        .bind(&write.account_key)
        .bind(&write.access_token)
        .bind(&write.refresh_token)
        .bind(&write.token_type)
        .bind(write.expires_at)
        .bind(&write.email)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get the credential for an account, if one is stored
    pub async fn get(&self, account_key: &str) -> AuthResult<Option<StoredCredential>> {
        let row = sqlx::query(
            r#"
            SELECT account_key, access_token, refresh_token, token_type,
                   expires_at, email, created_at, updated_at
            FROM google_credentials
            WHERE account_key = ?
            "#,
        )
        .bind(account_key)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(credential_from_row(&row)?)),
            None => Ok(None),
        }
    }

    /// List all stored credentials, oldest linked account first.
    ///
    /// rowid breaks ties between accounts linked within the same second, so
    /// iteration order matches link order.
    pub async fn list(&self) -> AuthResult<Vec<StoredCredential>> {
        let rows = sqlx::query(
            r#"
            SELECT account_key, access_token, refresh_token, token_type,
                   expires_at, email, created_at, updated_at
            FROM google_credentials
            ORDER BY created_at ASC, rowid ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| credential_from_row(row).map_err(Into::into))
            .collect()
    }

    /// List linked accounts for display, oldest first
    pub async fn sessions(&self) -> AuthResult<Vec<AccountSession>> {
        let rows = sqlx::query(
            r#"
            SELECT account_key, email, updated_at
            FROM google_credentials
            ORDER BY created_at ASC, rowid ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(AccountSession {
                    account_key: row.try_get("account_key")?,
                    email: row.try_get("email")?,
                    connected_at: row.try_get("updated_at")?,
                })
            })
            .collect()
    }

    /// Delete the credential for one account
    pub async fn delete(&self, account_key: &str) -> AuthResult<()> {
        debug!("Deleting credential for account: {}", account_key);

        sqlx::query("DELETE FROM google_credentials WHERE account_key = ?")
            .bind(account_key)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Delete every stored credential
    pub async fn delete_all(&self) -> AuthResult<()> {
        debug!("Deleting all stored credentials");

        sqlx::query("DELETE FROM google_credentials")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Move a credential to a new primary key, preserving all other columns
    pub async fn rekey(&self, from: &str, to: &str) -> AuthResult<()> {
        debug!("Rekeying credential {} -> {}", from, to);

        sqlx::query(
            "UPDATE google_credentials SET account_key = ?, updated_at = unixepoch() WHERE account_key = ?",
        )
        .bind(to)
        .bind(from)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn credential_from_row(row: &SqliteRow) -> Result<StoredCredential, sqlx::Error> {
    Ok(StoredCredential {
        account_key: row.try_get("account_key")?,
        access_token: row.try_get("access_token")?,
        refresh_token: row.try_get("refresh_token")?,
        token_type: row.try_get("token_type")?,
        expires_at: row.try_get("expires_at")?,
        email: row.try_get("email")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
