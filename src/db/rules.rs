//! Tax rule table queries

use crate::db::models::TaxRule;
use crate::Result;
use sqlx::SqlitePool;

/// Load all rules ordered by range start. First match wins at lookup
/// time, so a stable order keeps the calculator deterministic.
pub async fn load_rules(pool: &SqlitePool) -> Result<Vec<TaxRule>> {
    let rules = sqlx::query_as::<_, TaxRule>(
        "SELECT min_level, max_level, base_due FROM tax_rules ORDER BY min_level, max_level",
    )
    .fetch_all(pool)
    .await?;
    Ok(rules)
}
