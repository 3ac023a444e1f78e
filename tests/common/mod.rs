//! Shared test fixtures: throwaway databases and a scriptable mock
//! platform source.
#![allow(dead_code)] // not every test binary uses every fixture

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tempfile::TempDir;
use warera_tax::db::init_database;
use warera_tax::source::{DataSource, Payment, PlayerProfile, RosterPage};
use warera_tax::{EngineContext, Error, Result};

const ROSTER_PAGE_SIZE: usize = 2;

/// Fresh database in a temp dir plus a context over it. The TempDir
/// must be kept alive for the duration of the test.
pub async fn test_context() -> (Arc<EngineContext>, SqlitePool, TempDir) {
    let dir = TempDir::new().expect("create temp dir");
    let pool = init_database(&dir.path().join("test.db"))
        .await
        .expect("init test database");
    let ctx = EngineContext::new(pool.clone());
    (ctx, pool, dir)
}

#[derive(Debug, Clone)]
pub struct MockPlayer {
    pub username: String,
    pub level: i64,
    /// One automation level per owned unit
    pub automation: Vec<i64>,
}

/// Scriptable in-memory platform source. Paginates the roster in pages
/// of two so cursor handling is actually exercised.
#[derive(Default)]
pub struct MockSource {
    pub players: BTreeMap<String, MockPlayer>,
    pub payments: Vec<Payment>,
    pub fail_payments: bool,
    pub failing_profiles: HashSet<String>,
    /// Roster page start offsets whose fetch fails (pages hold two
    /// members, so offsets are 0, 2, 4, ...)
    pub failing_pages: HashSet<usize>,
}

impl MockSource {
    pub fn with_player(mut self, id: &str, username: &str, level: i64, automation: &[i64]) -> Self {
        self.players.insert(
            id.to_string(),
            MockPlayer {
                username: username.to_string(),
                level,
                automation: automation.to_vec(),
            },
        );
        self
    }

    pub fn with_payment(mut self, payer_id: &str, amount: f64, timestamp: DateTime<Utc>) -> Self {
        self.payments.push(Payment {
            payer_id: payer_id.to_string(),
            amount,
            timestamp,
        });
        self
    }
}

#[async_trait]
impl DataSource for MockSource {
    async fn fetch_roster_page(&self, cursor: Option<&str>) -> Result<RosterPage> {
        let ids: Vec<String> = self.players.keys().cloned().collect();
        let start: usize = match cursor {
            Some(c) => c
                .parse()
                .map_err(|_| Error::Source("bad cursor".to_string()))?,
            None => 0,
        };
        if self.failing_pages.contains(&start) {
            return Err(Error::Source(format!("roster page at {} unavailable", start)));
        }
        let end = (start + ROSTER_PAGE_SIZE).min(ids.len());
        let next_cursor = (end < ids.len()).then(|| end.to_string());
        Ok(RosterPage {
            member_ids: ids[start..end].to_vec(),
            next_cursor,
        })
    }

    async fn fetch_profile(&self, player_id: &str) -> Result<PlayerProfile> {
        if self.failing_profiles.contains(player_id) {
            return Err(Error::Source(format!("profile {} unavailable", player_id)));
        }
        let player = self
            .players
            .get(player_id)
            .ok_or_else(|| Error::Source(format!("unknown player {}", player_id)))?;
        Ok(PlayerProfile {
            username: player.username.clone(),
            level: player.level,
        })
    }

    async fn fetch_units(&self, player_id: &str) -> Result<Vec<String>> {
        let player = self
            .players
            .get(player_id)
            .ok_or_else(|| Error::Source(format!("unknown player {}", player_id)))?;
        Ok((0..player.automation.len())
            .map(|i| format!("{}#{}", player_id, i))
            .collect())
    }

    async fn fetch_automation_level(&self, unit_id: &str) -> Result<i64> {
        let (player_id, index) = unit_id
            .split_once('#')
            .ok_or_else(|| Error::Source(format!("unknown unit {}", unit_id)))?;
        let index: usize = index
            .parse()
            .map_err(|_| Error::Source(format!("unknown unit {}", unit_id)))?;
        self.players
            .get(player_id)
            .and_then(|p| p.automation.get(index))
            .copied()
            .ok_or_else(|| Error::Source(format!("unknown unit {}", unit_id)))
    }

    async fn fetch_payments(&self, since: DateTime<Utc>) -> Result<Vec<Payment>> {
        if self.fail_payments {
            return Err(Error::Source("payments endpoint down".to_string()));
        }
        Ok(self
            .payments
            .iter()
            .filter(|p| p.timestamp >= since)
            .cloned()
            .collect())
    }
}
