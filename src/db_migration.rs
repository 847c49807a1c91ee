use crate::errors::{DbError, DbResult};
use sqlx::SqlitePool;

// Embed all migration SQL files at compile time
const MIGRATION_INIT: &str = include_str!("../migrations/20250601000000_init.sql");
const MIGRATION_ACCEPTANCE_UNIQUE: &str =
    include_str!("../migrations/20250601000001_acceptance_unique_active.sql");

// List of migrations with their names and SQL content
const MIGRATIONS: &[(&str, &str)] = &[
    ("20250601000000_init.sql", MIGRATION_INIT),
    (
        "20250601000001_acceptance_unique_active.sql",
        MIGRATION_ACCEPTANCE_UNIQUE,
    ),
];

/// Apply all pending migrations to the given pool.
///
/// Applied migrations are tracked in a `migrations` table; already
/// recorded files are skipped, so this is safe to call on every start.
pub async fn apply_migrations(pool: &SqlitePool) -> DbResult<()> {
    create_migrations_table(pool).await?;

    let applied: Vec<String> =
        sqlx::query_scalar("SELECT name FROM migrations ORDER BY id")
            .fetch_all(pool)
            .await
            .map_err(DbError::from)?;

    let pending: Vec<&(&str, &str)> = MIGRATIONS
        .iter()
        .filter(|(name, _)| !applied.iter().any(|a| a == name))
        .collect();

    if pending.is_empty() {
        log::debug!("No pending migrations");
        return Ok(());
    }

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| DbError::Transaction(e.to_string()))?;

    for (name, sql) in pending {
        log::info!("Applying migration {}", name);

        sqlx::raw_sql(sql)
            .execute(&mut *tx)
            .await
            .map_err(|e| DbError::Migration(format!("Failed to apply {}: {}", name, e)))?;

        let now = chrono::Utc::now().to_rfc3339();
        sqlx::query("INSERT INTO migrations (name, applied_at) VALUES (?, ?)")
            .bind(name)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(|e| DbError::Migration(format!("Failed to record {}: {}", name, e)))?;
    }

    tx.commit()
        .await
        .map_err(|e| DbError::Transaction(e.to_string()))?;

    Ok(())
}

/// Create migrations table if it doesn't exist
async fn create_migrations_table(pool: &SqlitePool) -> DbResult<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS migrations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await
    .map_err(DbError::from)?;

    Ok(())
}
