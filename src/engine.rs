//! Engine operations consumed by the front end
//!
//! Write operations are acknowledged immediately and committed later by
//! the writer task; `request_link` additionally registers an in-memory
//! override so reads reflect the binding right away.

use crate::context::EngineContext;
use crate::db::players;
use crate::source::DataSource;
use crate::sync::{self, ReconcileSummary};
use crate::writer::WriteCommand;
use crate::{Error, Result};
use tracing::info;

/// Acknowledgment returned by a queued link request.
#[derive(Debug, Clone)]
pub struct LinkAck {
    pub player_id: String,
    /// Canonical in-game name as stored in the ledger
    pub display_name: String,
}

/// Bind `caller_identity` to the player named `name`.
///
/// The name lookup is a fast read: a locked database surfaces as
/// `StoreBusy` for the caller to retry, an unknown name as
/// `InvalidInput` (a link request naming nobody is a malformed
/// command, not a missing resource). On a match the override is
/// registered and the durable write queued; the ack does not wait for
/// the commit.
pub async fn request_link(
    ctx: &EngineContext,
    name: &str,
    caller_identity: &str,
) -> Result<LinkAck> {
    if name.trim().is_empty() {
        return Err(Error::InvalidInput("player name must not be empty".to_string()));
    }

    let entry = players::find_by_name(&ctx.db, name)
        .await
        .map_err(Error::busy_on_lock)?
        .ok_or_else(|| {
            Error::InvalidInput(format!("player '{}' not in the country roster", name))
        })?;

    ctx.register_pending_link(&entry.player_id, caller_identity)
        .await;
    ctx.writer()
        .submit(WriteCommand::LinkIdentity {
            player_id: entry.player_id.clone(),
            identity: caller_identity.to_string(),
        })
        .await?;

    info!(
        "Queued identity link for {} ({})",
        entry.display_name, entry.player_id
    );
    Ok(LinkAck {
        player_id: entry.player_id,
        display_name: entry.display_name,
    })
}

/// Replace the tax rule for a level range. Privileged callers only.
pub async fn set_tax_rule(
    ctx: &EngineContext,
    privileged: bool,
    min_level: i64,
    max_level: i64,
    base_due: f64,
) -> Result<()> {
    if !privileged {
        return Err(Error::Unauthorized("set_tax_rule requires admin".to_string()));
    }
    if min_level < 0 || max_level < min_level {
        return Err(Error::InvalidInput(format!(
            "invalid level range {}..{}",
            min_level, max_level
        )));
    }
    if base_due < 0.0 || !base_due.is_finite() {
        return Err(Error::InvalidInput("base due must be non-negative".to_string()));
    }

    ctx.writer()
        .submit(WriteCommand::UpsertTaxRule {
            min_level,
            max_level,
            base_due,
        })
        .await?;
    info!("Queued tax rule {}..{} -> {}", min_level, max_level, base_due);
    Ok(())
}

/// Replace the automation multiplier. Privileged callers only.
pub async fn set_automation_multiplier(
    ctx: &EngineContext,
    privileged: bool,
    value: f64,
) -> Result<()> {
    if !privileged {
        return Err(Error::Unauthorized(
            "set_automation_multiplier requires admin".to_string(),
        ));
    }
    if value < 0.0 || !value.is_finite() {
        return Err(Error::InvalidInput(
            "automation multiplier must be non-negative".to_string(),
        ));
    }

    ctx.writer()
        .submit(WriteCommand::SetAutomationMultiplier(value))
        .await?;
    info!("Queued automation multiplier {}", value);
    Ok(())
}

/// Run a reconciliation pass to completion, including the durable
/// commit of every update it queued.
pub async fn force_sync(
    ctx: &EngineContext,
    source: &dyn DataSource,
) -> Result<ReconcileSummary> {
    let summary = sync::run_reconciliation(ctx, source).await?;
    ctx.writer().flush().await?;
    Ok(summary)
}
