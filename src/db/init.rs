//! Database initialization
//!
//! Creates the ledger database on first run, applies the pragmas the
//! single-writer design relies on, and seeds the default tax tiers when
//! the rules table is empty.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Default tax tiers seeded on first run.
const DEFAULT_RULES: &[(i64, i64, f64)] = &[
    (1, 4, 0.0),
    (5, 9, 5.25),
    (10, 15, 15.75),
    (16, 20, 29.0),
    (21, 25, 42.0),
    (26, 30, 63.0),
    (31, 39, 100.0),
    (40, 100, 150.0),
];

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // WAL reduces write-lock contention between the writer task and
    // concurrent dashboard reads
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;
    sqlx::query("PRAGMA synchronous = NORMAL").execute(&pool).await?;
    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    create_players_table(&pool).await?;
    create_tax_rules_table(&pool).await?;
    create_tax_settings_table(&pool).await?;

    seed_default_tax_rules(&pool).await?;

    Ok(pool)
}

async fn create_players_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS players (
            player_id TEXT PRIMARY KEY,
            linked_identity TEXT,
            display_name TEXT NOT NULL,
            level INTEGER NOT NULL DEFAULT 0,
            unit_count INTEGER NOT NULL DEFAULT 0,
            automation_levels TEXT NOT NULL DEFAULT '[]',
            computed_due REAL NOT NULL DEFAULT 0,
            amount_paid REAL NOT NULL DEFAULT 0,
            last_reconciled TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn create_tax_rules_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tax_rules (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            min_level INTEGER NOT NULL,
            max_level INTEGER NOT NULL,
            base_due REAL NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn create_tax_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tax_settings (
            key TEXT PRIMARY KEY,
            value REAL NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

/// Seed the default tier table and automation multiplier, but only on a
/// database that has never had rules configured (idempotent).
async fn seed_default_tax_rules(pool: &SqlitePool) -> Result<()> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tax_rules")
        .fetch_one(pool)
        .await?;
    if count > 0 {
        return Ok(());
    }

    for (min_level, max_level, base_due) in DEFAULT_RULES {
        sqlx::query("INSERT INTO tax_rules (min_level, max_level, base_due) VALUES (?, ?, ?)")
            .bind(min_level)
            .bind(max_level)
            .bind(base_due)
            .execute(pool)
            .await?;
    }

    sqlx::query("INSERT OR REPLACE INTO tax_settings (key, value) VALUES ('automation_multiplier', ?)")
        .bind(crate::tax::DEFAULT_AUTOMATION_MULTIPLIER)
        .execute(pool)
        .await?;

    info!("Seeded {} default tax rules", DEFAULT_RULES.len());
    Ok(())
}
