//! Player ledger queries

use crate::db::models::PlayerLedgerEntry;
use crate::Result;
use sqlx::SqlitePool;

/// Insert a new ledger stub if this player has never been seen.
/// Existing rows are left untouched. Returns true when a row was added.
pub async fn insert_stub_if_absent(
    pool: &SqlitePool,
    player_id: &str,
    display_name: &str,
) -> Result<bool> {
    let result = sqlx::query(
        "INSERT OR IGNORE INTO players (player_id, display_name) VALUES (?, ?)",
    )
    .bind(player_id)
    .bind(display_name)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// All known player ids, in stable (primary key) order.
pub async fn list_player_ids(pool: &SqlitePool) -> Result<Vec<String>> {
    let ids = sqlx::query_scalar("SELECT player_id FROM players ORDER BY player_id")
        .fetch_all(pool)
        .await?;
    Ok(ids)
}

/// Case-insensitive exact lookup by in-game name.
pub async fn find_by_name(pool: &SqlitePool, name: &str) -> Result<Option<PlayerLedgerEntry>> {
    let entry = sqlx::query_as::<_, PlayerLedgerEntry>(
        "SELECT * FROM players WHERE LOWER(display_name) = LOWER(?)",
    )
    .bind(name.trim())
    .fetch_optional(pool)
    .await?;
    Ok(entry)
}

pub async fn get(pool: &SqlitePool, player_id: &str) -> Result<Option<PlayerLedgerEntry>> {
    let entry = sqlx::query_as::<_, PlayerLedgerEntry>(
        "SELECT * FROM players WHERE player_id = ?",
    )
    .bind(player_id)
    .fetch_optional(pool)
    .await?;
    Ok(entry)
}

/// Dashboard listing: everyone at or above `min_level`, highest level
/// first, ties broken by name (case-insensitive).
pub async fn list_for_dashboard(
    pool: &SqlitePool,
    min_level: i64,
) -> Result<Vec<PlayerLedgerEntry>> {
    let entries = sqlx::query_as::<_, PlayerLedgerEntry>(
        r#"
        SELECT * FROM players
        WHERE level >= ?
        ORDER BY level DESC, display_name COLLATE NOCASE ASC
        "#,
    )
    .bind(min_level)
    .fetch_all(pool)
    .await?;
    Ok(entries)
}
