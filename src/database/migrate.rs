use sqlx::{Executor, SqlitePool};
use tracing::info;

use super::manager::{DatabaseError, DatabaseManager};

const SCHEMA_SQL: &str = include_str!("sql/schema.sql");
const SEED_SQL: &str = include_str!("sql/seed.sql");

/// Columns added to `cases` after the first release, with their DDL.
const CASE_COLUMNS: &[(&str, &str)] = &[
    ("case_no", "ALTER TABLE cases ADD COLUMN case_no TEXT NOT NULL DEFAULT ''"),
    ("status", "ALTER TABLE cases ADD COLUMN status TEXT"),
    ("updated_at", "ALTER TABLE cases ADD COLUMN updated_at TEXT NOT NULL DEFAULT ''"),
    ("is_deleted", "ALTER TABLE cases ADD COLUMN is_deleted INTEGER NOT NULL DEFAULT 0"),
    ("deleted_at", "ALTER TABLE cases ADD COLUMN deleted_at TEXT"),
];

/// Bring the schema up to date. Seed rows are only written into a database
/// that did not exist before startup.
pub async fn migrate(db: &DatabaseManager, seed: bool) -> Result<(), DatabaseError> {
    let pool = db.pool();

    pool.execute(SCHEMA_SQL)
        .await
        .map_err(|e| DatabaseError::Migration(format!("schema: {}", e)))?;

    upgrade_cases(pool).await?;

    if seed {
        pool.execute(SEED_SQL)
            .await
            .map_err(|e| DatabaseError::Migration(format!("seed: {}", e)))?;
        info!("Seeded new database with default roles");
    }
    Ok(())
}

async fn upgrade_cases(pool: &SqlitePool) -> Result<(), DatabaseError> {
    let existing: Vec<String> = sqlx::query_scalar("SELECT name FROM pragma_table_info('cases')")
        .fetch_all(pool)
        .await?;
    let has = |column: &str| existing.iter().any(|c| c == column);

    let missing: Vec<&(&str, &str)> = CASE_COLUMNS.iter().filter(|entry| !has(entry.0)).collect();
    if missing.is_empty() {
        return Ok(());
    }

    let mut tx = pool.begin().await?;
    for (name, ddl) in &missing {
        info!("Adding missing column cases.{}", name);
        sqlx::query(ddl)
            .execute(&mut *tx)
            .await
            .map_err(|e| DatabaseError::Migration(format!("cases.{}: {}", name, e)))?;
    }

    if !has("case_no") || !has("updated_at") {
        // Legacy rows: case number falls back to the id, updated_at to created_at
        sqlx::query(
            "UPDATE cases
             SET case_no = CASE WHEN case_no = '' THEN id ELSE case_no END,
                 updated_at = CASE WHEN updated_at = '' THEN created_at ELSE updated_at END",
        )
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;
    Ok(())
}
