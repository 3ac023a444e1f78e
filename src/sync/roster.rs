//! Country roster synchronization
//!
//! Walks the paginated country roster and inserts a ledger stub for
//! every member not seen before. Existing entries are never touched, so
//! re-running against an unchanged roster is a no-op.

use crate::context::EngineContext;
use crate::db::players;
use crate::source::DataSource;
use crate::Result;
use std::time::Duration;
use tracing::{info, warn};

/// Delay between per-member profile fetches, to stay friendly with the
/// platform's rate limits.
pub const MEMBER_FETCH_PACING: Duration = Duration::from_millis(100);

/// Discover new country members and insert ledger stubs for them.
/// Returns the number of entries added.
pub async fn sync_roster(ctx: &EngineContext, source: &dyn DataSource) -> Result<usize> {
    info!("Synchronizing country roster");
    let mut cursor: Option<String> = None;
    let mut total_added = 0usize;

    loop {
        let page = match source.fetch_roster_page(cursor.as_deref()).await {
            Ok(page) => page,
            Err(e) => {
                // A failed page ends this pass; the next run starts over
                warn!("Roster page fetch failed, stopping pass: {}", e);
                break;
            }
        };

        if page.member_ids.is_empty() {
            break;
        }

        for member_id in &page.member_ids {
            if players::get(&ctx.db, member_id).await?.is_some() {
                continue;
            }

            let profile = match source.fetch_profile(member_id).await {
                Ok(profile) => profile,
                Err(e) => {
                    warn!("Skipping member {}: profile fetch failed: {}", member_id, e);
                    continue;
                }
            };

            if players::insert_stub_if_absent(&ctx.db, member_id, &profile.username).await? {
                total_added += 1;
            }
            tokio::time::sleep(MEMBER_FETCH_PACING).await;
        }

        cursor = page.next_cursor;
        if cursor.is_none() {
            break;
        }
    }

    info!("Roster sync done, added {} players", total_added);
    Ok(total_added)
}
