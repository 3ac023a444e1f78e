//! Database models

use crate::Result;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One row of the `players` ledger, one per known country member.
///
/// Created by the roster synchronizer the first time a member is seen
/// and never deleted afterwards. Numeric fields are overwritten by each
/// reconciliation pass; `linked_identity` only changes through a link
/// command.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PlayerLedgerEntry {
    /// Stable WarEra user id (primary key)
    pub player_id: String,
    /// Bound external account identity, if the player linked one
    pub linked_identity: Option<String>,
    /// In-game name as last reported by the platform
    pub display_name: String,
    pub level: i64,
    /// Number of companies (productive units) owned
    pub unit_count: i64,
    /// JSON array of per-company automation-engine levels
    pub automation_levels: String,
    /// Weekly due computed by the last reconciliation
    pub computed_due: f64,
    /// Donations accumulated in the current tax week
    pub amount_paid: f64,
    /// ISO date of the last successful reconciliation of this row
    pub last_reconciled: Option<String>,
}

impl PlayerLedgerEntry {
    /// Decode the automation-levels JSON column.
    pub fn automation_level_list(&self) -> Result<Vec<i64>> {
        if self.automation_levels.is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&self.automation_levels)
            .map_err(|e| crate::Error::Parse(format!("automation_levels column: {}", e)))
    }
}

/// One tiered tax rule: inclusive level range to weekly base due.
#[derive(Debug, Clone, Copy, PartialEq, FromRow, Serialize, Deserialize)]
pub struct TaxRule {
    pub min_level: i64,
    pub max_level: i64,
    pub base_due: f64,
}
