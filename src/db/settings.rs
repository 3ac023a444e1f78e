//! Tax settings (keyed singleton values)

use crate::tax::DEFAULT_AUTOMATION_MULTIPLIER;
use crate::Result;
use sqlx::SqlitePool;

/// Current automation multiplier, falling back to the default when the
/// setting has never been stored.
pub async fn get_automation_multiplier(pool: &SqlitePool) -> Result<f64> {
    let value: Option<f64> =
        sqlx::query_scalar("SELECT value FROM tax_settings WHERE key = 'automation_multiplier'")
            .fetch_optional(pool)
            .await?;
    Ok(value.unwrap_or(DEFAULT_AUTOMATION_MULTIPLIER))
}
