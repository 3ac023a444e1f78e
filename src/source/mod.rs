//! External platform data source
//!
//! The engine consumes the platform through the `DataSource` trait so
//! the pipeline can run against a mock in tests. The concrete client
//! for the WarEra API lives in [`warera`].

use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub mod warera;

pub use warera::WarEraClient;

/// One page of the country roster.
#[derive(Debug, Clone)]
pub struct RosterPage {
    /// Stable platform ids of the members on this page
    pub member_ids: Vec<String>,
    /// Cursor for the next page, None on the last page
    pub next_cursor: Option<String>,
}

/// Per-player profile summary.
#[derive(Debug, Clone)]
pub struct PlayerProfile {
    pub username: String,
    pub level: i64,
}

/// One normalized payment transaction.
#[derive(Debug, Clone)]
pub struct Payment {
    pub payer_id: String,
    pub amount: f64,
    pub timestamp: DateTime<Utc>,
}

/// Boundary contract to the external platform.
///
/// Every operation can fail independently with `Error::Source`; callers
/// treat that as non-fatal and skip the affected unit of work.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// One page of the configured country's roster.
    async fn fetch_roster_page(&self, cursor: Option<&str>) -> Result<RosterPage>;

    /// Profile summary (name and level) for one player.
    async fn fetch_profile(&self, player_id: &str) -> Result<PlayerProfile>;

    /// Ids of the productive units (companies) a player owns.
    async fn fetch_units(&self, player_id: &str) -> Result<Vec<String>>;

    /// Automation-engine upgrade level for one unit. Zero when the unit
    /// has no such upgrade.
    async fn fetch_automation_level(&self, unit_id: &str) -> Result<i64>;

    /// Donation transactions for the configured country at or after
    /// `since`, already normalized to (payer, amount, timestamp).
    async fn fetch_payments(&self, since: DateTime<Utc>) -> Result<Vec<Payment>>;
}
