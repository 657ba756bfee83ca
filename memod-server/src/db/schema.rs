//! Schema creation for the `users` and `memos` relations

use sqlx::SqliteConnection;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE,
        password TEXT NOT NULL,
        salt TEXT NOT NULL,
        last_access TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS memos (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        "user" INTEGER NOT NULL REFERENCES users(id),
        title TEXT,
        content TEXT NOT NULL,
        is_private INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    // Public feed: WHERE is_private = 0 ORDER BY created_at DESC, id DESC
    r#"
    CREATE INDEX IF NOT EXISTS memos_public_feed
        ON memos (is_private, created_at, id)
    "#,
    // Owner listing and sibling lookup
    r#"
    CREATE INDEX IF NOT EXISTS memos_owner_timeline
        ON memos ("user", created_at, id)
    "#,
];

/// Create tables and indexes if they do not exist yet.
pub async fn migrate(conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    tracing::info!("Running schema migrations...");

    for statement in SCHEMA {
        sqlx::query(statement).execute(&mut *conn).await?;
    }

    Ok(())
}
