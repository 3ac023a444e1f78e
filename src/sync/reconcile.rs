//! Reconciliation pipeline
//!
//! One pass refreshes every ledger entry from the platform: current
//! level, unit list, per-unit automation levels, recomputed due, and
//! this week's accumulated donations. A fetch failure for one entry
//! skips only that entry; the pass continues. All resulting writes go
//! through the mutation channel as full-overwrite updates.

use crate::context::EngineContext;
use crate::db::{players, rules, settings};
use crate::epoch::epoch_start;
use crate::source::DataSource;
use crate::tax::{calc_tax, round2};
use crate::writer::{PlayerUpdate, WriteCommand};
use crate::Result;
use chrono::Utc;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Outcome counts of one reconciliation pass.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReconcileSummary {
    pub updated: usize,
    pub skipped: usize,
    /// False when the payments fetch failed and paid amounts were
    /// preserved rather than refreshed
    pub payments_refreshed: bool,
}

/// Run one full reconciliation pass over every known player.
///
/// Re-running with unchanged platform state produces identical numeric
/// fields; only the reconciliation date marker advances.
pub async fn run_reconciliation(
    ctx: &EngineContext,
    source: &dyn DataSource,
) -> Result<ReconcileSummary> {
    let now = Utc::now();
    let week_start = epoch_start(now);
    info!("Starting reconciliation pass (week start {})", week_start);

    // One payments fetch for the whole population, partitioned by payer
    let paid_map = match source.fetch_payments(week_start).await {
        Ok(payments) => {
            let mut map: HashMap<String, f64> = HashMap::new();
            for payment in payments {
                *map.entry(payment.payer_id).or_insert(0.0) += payment.amount;
            }
            Some(map)
        }
        Err(e) => {
            // Preserve last-known paid amounts for this run rather than
            // resetting everyone toward zero
            warn!("Payments fetch failed, keeping stored paid amounts: {}", e);
            None
        }
    };

    // Rules and multiplier are read once so every entry in the pass is
    // computed against the same configuration
    let tax_rules = rules::load_rules(&ctx.db).await?;
    let multiplier = settings::get_automation_multiplier(&ctx.db).await?;
    let reconciled_date = now.date_naive().to_string();

    let mut summary = ReconcileSummary {
        payments_refreshed: paid_map.is_some(),
        ..Default::default()
    };

    for player_id in players::list_player_ids(&ctx.db).await? {
        match refresh_entry(source, &player_id).await {
            Ok((level, unit_count, automation_levels)) => {
                let breakdown = calc_tax(level, &automation_levels, &tax_rules, multiplier);
                let amount_paid = paid_map
                    .as_ref()
                    .map(|map| round2(map.get(&player_id).copied().unwrap_or(0.0)));

                ctx.writer()
                    .submit(WriteCommand::UpdatePlayer(PlayerUpdate {
                        player_id,
                        level,
                        unit_count,
                        automation_levels,
                        computed_due: breakdown.total,
                        amount_paid,
                        reconciled_date: reconciled_date.clone(),
                    }))
                    .await?;
                summary.updated += 1;
            }
            Err(e) => {
                warn!("Skipping {}: {}", player_id, e);
                summary.skipped += 1;
            }
        }
    }

    info!(
        "Reconciliation pass queued {} updates, skipped {}",
        summary.updated, summary.skipped
    );
    Ok(summary)
}

/// Fetch one player's current level, unit count, and automation levels.
/// Any failed fetch aborts only this entry.
async fn refresh_entry(
    source: &dyn DataSource,
    player_id: &str,
) -> Result<(i64, i64, Vec<i64>)> {
    let profile = source.fetch_profile(player_id).await?;
    let units = source.fetch_units(player_id).await?;

    let mut automation_levels = Vec::with_capacity(units.len());
    for unit_id in &units {
        automation_levels.push(source.fetch_automation_level(unit_id).await?);
    }

    debug!(
        "Refreshed {}: level {}, {} units",
        player_id,
        profile.level,
        units.len()
    );
    Ok((profile.level, units.len() as i64, automation_levels))
}
