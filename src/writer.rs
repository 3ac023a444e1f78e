//! Single-writer mutation channel
//!
//! Every mutation of the persisted ledger, rules, and settings is
//! expressed as a `WriteCommand` on an mpsc channel with exactly one
//! consumer task. Commands commit strictly in submission order, which
//! removes concurrent-write races against sqlite without any locking in
//! the rest of the engine.
//!
//! A command that keeps failing is retried up to `MAX_ATTEMPTS` times
//! with a fixed delay and then dropped with an error log. Dropped
//! reconciliation updates self-correct on the next periodic run; there
//! is no durable dead-letter store.

use crate::{Error, Result};
use sqlx::SqlitePool;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, warn};

const MAX_ATTEMPTS: u32 = 5;
const RETRY_DELAY: Duration = Duration::from_secs(1);
const CHANNEL_CAPACITY: usize = 256;

/// Full-overwrite ledger update produced by one reconciliation entry.
#[derive(Debug, Clone)]
pub struct PlayerUpdate {
    pub player_id: String,
    pub level: i64,
    pub unit_count: i64,
    pub automation_levels: Vec<i64>,
    pub computed_due: f64,
    /// None preserves the stored value (payments fetch failed this run)
    pub amount_paid: Option<f64>,
    /// ISO date marker of this reconciliation pass
    pub reconciled_date: String,
}

/// One serialized mutation.
#[derive(Debug)]
pub enum WriteCommand {
    /// Bind a platform account identity to a ledger entry
    LinkIdentity { player_id: String, identity: String },
    /// Replace the rule for this exact range (delete-then-insert)
    UpsertTaxRule {
        min_level: i64,
        max_level: i64,
        base_due: f64,
    },
    /// Replace the automation multiplier singleton
    SetAutomationMultiplier(f64),
    /// Reconciliation pipeline per-entry overwrite
    UpdatePlayer(PlayerUpdate),
    /// Ordering barrier: acked once every earlier command has been
    /// applied (or dropped). Lets `force_sync` return after commit.
    Flush(oneshot::Sender<()>),
}

/// Cloneable submission side of the mutation channel.
#[derive(Clone)]
pub struct WriterHandle {
    tx: mpsc::Sender<WriteCommand>,
}

impl WriterHandle {
    /// Queue a command for the writer task. Returns immediately; the
    /// durable commit happens later, in submission order.
    pub async fn submit(&self, command: WriteCommand) -> Result<()> {
        self.tx
            .send(command)
            .await
            .map_err(|_| Error::Internal("writer task is gone".to_string()))
    }

    /// Wait until every previously submitted command has been applied.
    pub async fn flush(&self) -> Result<()> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.submit(WriteCommand::Flush(ack_tx)).await?;
        ack_rx
            .await
            .map_err(|_| Error::Internal("writer task dropped flush ack".to_string()))
    }
}

/// Spawn the single consumer task. The returned handle is the only way
/// to mutate persisted state.
pub fn spawn_writer(pool: SqlitePool) -> WriterHandle {
    spawn_writer_with_retry_delay(pool, RETRY_DELAY)
}

/// Same as [`spawn_writer`] with an explicit delay between failed
/// attempts, so tests of the retry path do not wait out the production
/// delay.
pub fn spawn_writer_with_retry_delay(pool: SqlitePool, retry_delay: Duration) -> WriterHandle {
    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
    tokio::spawn(writer_loop(pool, rx, retry_delay));
    WriterHandle { tx }
}

async fn writer_loop(pool: SqlitePool, mut rx: mpsc::Receiver<WriteCommand>, retry_delay: Duration) {
    debug!("Mutation writer task started");
    while let Some(command) = rx.recv().await {
        let command = match command {
            WriteCommand::Flush(ack) => {
                let _ = ack.send(());
                continue;
            }
            other => other,
        };

        let mut committed = false;
        for attempt in 1..=MAX_ATTEMPTS {
            match apply(&pool, &command).await {
                Ok(()) => {
                    committed = true;
                    break;
                }
                Err(e) => {
                    warn!(
                        "Write attempt {}/{} failed for {:?}: {}",
                        attempt, MAX_ATTEMPTS, command, e
                    );
                    if attempt < MAX_ATTEMPTS {
                        tokio::time::sleep(retry_delay).await;
                    }
                }
            }
        }
        if !committed {
            error!(
                "Dropping write after {} failed attempts: {:?}",
                MAX_ATTEMPTS, command
            );
        }
    }
    debug!("Mutation writer task stopped");
}

async fn apply(pool: &SqlitePool, command: &WriteCommand) -> Result<()> {
    match command {
        WriteCommand::LinkIdentity {
            player_id,
            identity,
        } => {
            sqlx::query("UPDATE players SET linked_identity = ? WHERE player_id = ?")
                .bind(identity)
                .bind(player_id)
                .execute(pool)
                .await?;
        }
        WriteCommand::UpsertTaxRule {
            min_level,
            max_level,
            base_due,
        } => {
            // Delete-then-insert so a repeated range replaces instead
            // of duplicating
            let mut tx = pool.begin().await?;
            sqlx::query("DELETE FROM tax_rules WHERE min_level = ? AND max_level = ?")
                .bind(min_level)
                .bind(max_level)
                .execute(&mut *tx)
                .await?;
            sqlx::query("INSERT INTO tax_rules (min_level, max_level, base_due) VALUES (?, ?, ?)")
                .bind(min_level)
                .bind(max_level)
                .bind(base_due)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;
        }
        WriteCommand::SetAutomationMultiplier(value) => {
            sqlx::query(
                "INSERT OR REPLACE INTO tax_settings (key, value) VALUES ('automation_multiplier', ?)",
            )
            .bind(value)
            .execute(pool)
            .await?;
        }
        WriteCommand::UpdatePlayer(update) => {
            let automation_json = serde_json::to_string(&update.automation_levels)
                .map_err(|e| Error::Internal(format!("encode automation levels: {}", e)))?;
            match update.amount_paid {
                Some(amount_paid) => {
                    sqlx::query(
                        r#"
                        UPDATE players SET
                            level = ?, unit_count = ?, automation_levels = ?,
                            computed_due = ?, amount_paid = ?, last_reconciled = ?
                        WHERE player_id = ?
                        "#,
                    )
                    .bind(update.level)
                    .bind(update.unit_count)
                    .bind(&automation_json)
                    .bind(update.computed_due)
                    .bind(amount_paid)
                    .bind(&update.reconciled_date)
                    .bind(&update.player_id)
                    .execute(pool)
                    .await?;
                }
                // Payments fetch failed this run: keep the stored paid
                // amount instead of resetting it to zero
                None => {
                    sqlx::query(
                        r#"
                        UPDATE players SET
                            level = ?, unit_count = ?, automation_levels = ?,
                            computed_due = ?, last_reconciled = ?
                        WHERE player_id = ?
                        "#,
                    )
                    .bind(update.level)
                    .bind(update.unit_count)
                    .bind(&automation_json)
                    .bind(update.computed_due)
                    .bind(&update.reconciled_date)
                    .bind(&update.player_id)
                    .execute(pool)
                    .await?;
                }
            }
        }
        WriteCommand::Flush(_) => unreachable!("flush is handled before apply"),
    }
    Ok(())
}
