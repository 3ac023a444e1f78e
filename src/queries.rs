//! Read-only reporting views over the ledger
//!
//! Reads combine the persisted ledger with the in-memory pending link
//! overrides, so a just-requested identity binding is visible before
//! its durable write commits.

use crate::context::EngineContext;
use crate::db::players;
use crate::status::{classify, TaxStatus};
use crate::Result;
use serde::Serialize;

/// One dashboard line.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardRow {
    pub player_id: String,
    /// Bound identity when linked (pending override wins), otherwise
    /// the in-game name
    pub display: String,
    pub linked_identity: Option<String>,
    pub level: i64,
    pub computed_due: f64,
    pub amount_paid: f64,
    pub status: TaxStatus,
}

/// Per-category aggregate counts for a dashboard listing.
#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct CategoryCounts {
    pub total: usize,
    pub paid: usize,
    pub partial: usize,
    pub unpaid: usize,
    pub legend: usize,
    pub not_applicable: usize,
}

#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub rows: Vec<DashboardRow>,
    pub counts: CategoryCounts,
}

/// Detail view for a single player.
#[derive(Debug, Serialize)]
pub struct PlayerDetail {
    pub player_id: String,
    pub display_name: String,
    pub linked_identity: Option<String>,
    pub level: i64,
    pub unit_count: i64,
    pub automation_levels: Vec<i64>,
    pub computed_due: f64,
    pub amount_paid: f64,
    pub remaining: f64,
    pub status: TaxStatus,
}

/// Everyone at or above `min_level`, sorted level descending then name
/// ascending (case-insensitive), with aggregate category counts.
pub async fn dashboard(ctx: &EngineContext, min_level: i64) -> Result<Dashboard> {
    let entries = players::list_for_dashboard(&ctx.db, min_level).await?;

    let mut rows = Vec::with_capacity(entries.len());
    let mut counts = CategoryCounts::default();

    for entry in entries {
        let linked_identity = match ctx.pending_identity(&entry.player_id).await {
            Some(identity) => Some(identity),
            None => entry.linked_identity.clone(),
        };
        let status = classify(entry.computed_due, entry.amount_paid);

        counts.total += 1;
        match status {
            TaxStatus::Paid => counts.paid += 1,
            TaxStatus::Partial => counts.partial += 1,
            TaxStatus::Unpaid => counts.unpaid += 1,
            TaxStatus::Legend => counts.legend += 1,
            TaxStatus::NotApplicable => counts.not_applicable += 1,
        }

        rows.push(DashboardRow {
            display: linked_identity
                .clone()
                .unwrap_or_else(|| entry.display_name.clone()),
            player_id: entry.player_id,
            linked_identity,
            level: entry.level,
            computed_due: entry.computed_due,
            amount_paid: entry.amount_paid,
            status,
        });
    }

    Ok(Dashboard { rows, counts })
}

/// Single entry by case-insensitive exact name match, or None when the
/// name is unknown.
pub async fn player_detail(ctx: &EngineContext, name: &str) -> Result<Option<PlayerDetail>> {
    let Some(entry) = players::find_by_name(&ctx.db, name).await? else {
        return Ok(None);
    };

    let linked_identity = match ctx.pending_identity(&entry.player_id).await {
        Some(identity) => Some(identity),
        None => entry.linked_identity.clone(),
    };
    let automation_levels = entry.automation_level_list()?;
    let remaining = (entry.computed_due - entry.amount_paid).max(0.0);

    Ok(Some(PlayerDetail {
        status: classify(entry.computed_due, entry.amount_paid),
        player_id: entry.player_id,
        display_name: entry.display_name,
        linked_identity,
        level: entry.level,
        unit_count: entry.unit_count,
        automation_levels,
        computed_due: entry.computed_due,
        amount_paid: entry.amount_paid,
        remaining,
    }))
}
