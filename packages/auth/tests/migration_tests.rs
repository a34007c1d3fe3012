// ABOUTME: Integration tests for legacy single-account record migration
// ABOUTME: Tests rekeying, conflict resolution, idempotence, and the unresolved-email case

use chrono::Utc;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use tempfile::TempDir;

use daybook_auth::google::{
    config::GoogleAuthConfig,
    manager::GoogleAuthManager,
    storage::CredentialStorage,
    types::{CredentialWrite, LEGACY_ACCOUNT_KEY},
};

/// Helper to create a test database with schema
async fn setup_test_db() -> (SqlitePool, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let database_url = format!("sqlite://{}?mode=rwc", db_path.display());

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await
        .unwrap();

    sqlx::query(
        r#"
        CREATE TABLE google_credentials (
            account_key TEXT PRIMARY KEY,
            access_token TEXT NOT NULL,
            refresh_token TEXT,
            token_type TEXT NOT NULL DEFAULT 'Bearer',
            expires_at INTEGER NOT NULL,
            email TEXT,
            created_at INTEGER NOT NULL DEFAULT (unixepoch()),
            updated_at INTEGER NOT NULL DEFAULT (unixepoch())
        )
        "#,
    )
    .execute(&pool)
    .await
    .unwrap();

    (pool, temp_dir)
}

fn test_manager(pool: SqlitePool) -> GoogleAuthManager {
    let config = GoogleAuthConfig::new("id", "secret", "https://day.example.com");
    GoogleAuthManager::new(config, pool)
}

/// Helper to store a legacy record with the given resolved email
async fn seed_legacy(storage: &CredentialStorage, email: Option<&str>) {
    storage
        .upsert(&CredentialWrite {
            account_key: LEGACY_ACCOUNT_KEY.to_string(),
            access_token: "legacy-access".to_string(),
            refresh_token: Some("legacy-refresh".to_string()),
            token_type: "Bearer".to_string(),
            expires_at: Utc::now().timestamp_millis() + 3_600_000,
            email: email.map(str::to_string),
        })
        .await
        .unwrap();
}

/// Helper to store a canonical email-keyed record
async fn seed_canonical(storage: &CredentialStorage, email: &str) {
    storage
        .upsert(&CredentialWrite {
            account_key: email.to_string(),
            access_token: "canonical-access".to_string(),
            refresh_token: Some("canonical-refresh".to_string()),
            token_type: "Bearer".to_string(),
            expires_at: Utc::now().timestamp_millis() + 3_600_000,
            email: Some(email.to_string()),
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn test_migration_rekeys_legacy_record() {
    let (pool, _temp_dir) = setup_test_db().await;
    let storage = CredentialStorage::new(pool.clone());

    seed_legacy(&storage, Some("a@x.com")).await;

    test_manager(pool).migrate_legacy_record().await.unwrap();

    // Exactly one record remains, keyed by the email, fields intact
    let all = storage.list().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].account_key, "a@x.com");
    assert_eq!(all[0].access_token, "legacy-access");
    assert_eq!(all[0].refresh_token, Some("legacy-refresh".to_string()));
    assert_eq!(all[0].email, Some("a@x.com".to_string()));

    assert!(storage.get(LEGACY_ACCOUNT_KEY).await.unwrap().is_none());
}

#[tokio::test]
async fn test_migration_conflict_keeps_canonical_record() {
    let (pool, _temp_dir) = setup_test_db().await;
    let storage = CredentialStorage::new(pool.clone());

    seed_canonical(&storage, "a@x.com").await;
    seed_legacy(&storage, Some("a@x.com")).await;

    test_manager(pool).migrate_legacy_record().await.unwrap();

    // The canonical record wins untouched; the legacy row is discarded
    let all = storage.list().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].account_key, "a@x.com");
    assert_eq!(all[0].access_token, "canonical-access");
    assert_eq!(all[0].refresh_token, Some("canonical-refresh".to_string()));

    assert!(storage.get(LEGACY_ACCOUNT_KEY).await.unwrap().is_none());
}

#[tokio::test]
async fn test_migration_is_idempotent() {
    let (pool, _temp_dir) = setup_test_db().await;
    let storage = CredentialStorage::new(pool.clone());

    seed_legacy(&storage, Some("a@x.com")).await;

    let manager = test_manager(pool);
    manager.migrate_legacy_record().await.unwrap();

    let after_first = storage.list().await.unwrap();

    manager.migrate_legacy_record().await.unwrap();

    let after_second = storage.list().await.unwrap();
    assert_eq!(after_first.len(), after_second.len());
    assert_eq!(after_first[0].account_key, after_second[0].account_key);
    assert_eq!(after_first[0].access_token, after_second[0].access_token);
    assert_eq!(after_first[0].refresh_token, after_second[0].refresh_token);
}

#[tokio::test]
async fn test_migration_no_legacy_record_is_noop() {
    let (pool, _temp_dir) = setup_test_db().await;
    let storage = CredentialStorage::new(pool.clone());

    seed_canonical(&storage, "a@x.com").await;

    test_manager(pool).migrate_legacy_record().await.unwrap();

    let all = storage.list().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].account_key, "a@x.com");
}

#[tokio::test]
async fn test_migration_leaves_unresolved_legacy_record() {
    let (pool, _temp_dir) = setup_test_db().await;
    let storage = CredentialStorage::new(pool.clone());

    seed_legacy(&storage, None).await;

    test_manager(pool).migrate_legacy_record().await.unwrap();

    // Without an email there is nothing to migrate to
    let legacy = storage.get(LEGACY_ACCOUNT_KEY).await.unwrap().unwrap();
    assert_eq!(legacy.access_token, "legacy-access");
}

#[tokio::test]
async fn test_migration_keeps_other_accounts() {
    let (pool, _temp_dir) = setup_test_db().await;
    let storage = CredentialStorage::new(pool.clone());

    seed_canonical(&storage, "other@x.com").await;
    seed_legacy(&storage, Some("a@x.com")).await;

    test_manager(pool).migrate_legacy_record().await.unwrap();

    let all = storage.list().await.unwrap();
    assert_eq!(all.len(), 2);
    assert!(storage.get("other@x.com").await.unwrap().is_some());
    assert!(storage.get("a@x.com").await.unwrap().is_some());
    assert!(storage.get(LEGACY_ACCOUNT_KEY).await.unwrap().is_none());
}
