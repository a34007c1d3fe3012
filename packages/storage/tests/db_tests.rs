// ABOUTME: Integration tests for database connection and migrations
// ABOUTME: Tests pool setup, schema creation, and repeated-startup safety

use tempfile::TempDir;

#[tokio::test]
async fn test_connect_creates_database_and_schema() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("daybook.db");

    let pool = daybook_storage::connect(&db_path).await.unwrap();

    // Migration should have created the credentials table
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'google_credentials'",
    )
    .fetch_one(&pool)
    .await
    .unwrap();

    assert_eq!(count, 1);
    assert!(db_path.exists());
}

#[tokio::test]
async fn test_connect_creates_parent_directories() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("nested").join("dir").join("daybook.db");

    let pool = daybook_storage::connect(&db_path).await.unwrap();

    sqlx::query("SELECT 1").execute(&pool).await.unwrap();
    assert!(db_path.exists());
}

#[tokio::test]
async fn test_connect_is_safe_on_repeated_startup() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("daybook.db");

    let pool1 = daybook_storage::connect(&db_path).await.unwrap();

    sqlx::query(
        "INSERT INTO google_credentials (account_key, access_token, expires_at) VALUES ('a@x.com', 'token', 0)",
    )
    .execute(&pool1)
    .await
    .unwrap();

    pool1.close().await;

    // Second startup must re-apply nothing and keep existing data
    let pool2 = daybook_storage::connect(&db_path).await.unwrap();

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM google_credentials")
        .fetch_one(&pool2)
        .await
        .unwrap();

    assert_eq!(count, 1);
}
