//! WarEra API client
//!
//! Speaks the tRPC-style GET envelope of api2.warera.io: the request
//! payload travels url-encoded as `input={"0": payload}` with
//! `batch=1`, and responses arrive as a one-element array wrapping
//! `result.data`, sometimes with the actual body nested one level
//! deeper under a `json` member.
//!
//! Each endpoint parses into an explicit type and fails with
//! `Error::Parse` on schema mismatch rather than fishing values out of
//! arbitrary nesting.

use crate::source::{DataSource, Payment, PlayerProfile, RosterPage};
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api2.warera.io";
const ROSTER_PAGE_SIZE: u32 = 100;
const UNITS_PER_PAGE: u32 = 100;
const PAYMENTS_FETCH_LIMIT: u32 = 100;
const REQUEST_TIMEOUT_SECS: u64 = 20;

/// WarEra API client bound to one country.
pub struct WarEraClient {
    http_client: reqwest::Client,
    base_url: String,
    api_token: String,
    country_id: String,
}

#[derive(Debug, Deserialize)]
struct RosterItem {
    #[serde(rename = "_id", alias = "userId")]
    id: String,
}

#[derive(Debug, Deserialize)]
struct RosterPageBody {
    #[serde(default)]
    items: Vec<RosterItem>,
    #[serde(rename = "nextCursor")]
    next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LevelInfo {
    level: i64,
}

#[derive(Debug, Deserialize)]
struct UserLiteBody {
    username: String,
    level: Option<i64>,
    leveling: Option<LevelInfo>,
}

/// Company references arrive either as bare id strings or as objects.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum UnitRef {
    Id(String),
    Object {
        #[serde(rename = "_id")]
        id: String,
    },
}

#[derive(Debug, Deserialize)]
struct UnitListBody {
    #[serde(default)]
    items: Vec<UnitRef>,
}

#[derive(Debug, Deserialize)]
struct UpgradeBody {
    level: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct TransactionItem {
    #[serde(rename = "createdAt")]
    created_at: Option<DateTime<Utc>>,
    // The platform is inconsistent about both the payer field and the
    // amount field; first present wins.
    #[serde(rename = "buyerId")]
    buyer_id: Option<String>,
    #[serde(rename = "userId")]
    user_id: Option<String>,
    buyer: Option<String>,
    money: Option<f64>,
    gold: Option<f64>,
    amount: Option<f64>,
}

impl TransactionItem {
    fn payer_id(&self) -> Option<&str> {
        self.buyer_id
            .as_deref()
            .or(self.user_id.as_deref())
            .or(self.buyer.as_deref())
    }

    fn value(&self) -> f64 {
        self.money.or(self.gold).or(self.amount).unwrap_or(0.0)
    }
}

#[derive(Debug, Deserialize)]
struct TransactionListBody {
    #[serde(default)]
    items: Vec<TransactionItem>,
}

impl WarEraClient {
    pub fn new(base_url: &str, api_token: &str, country_id: &str) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token: api_token.to_string(),
            country_id: country_id.to_string(),
        })
    }

    /// Issue one tRPC GET and unwrap the envelope down to the endpoint
    /// body.
    async fn get(&self, endpoint: &str, payload: Value) -> Result<Value> {
        let url = format!("{}/trpc/{}", self.base_url, endpoint);
        let input = json!({ "0": payload }).to_string();

        let response = self
            .http_client
            .get(&url)
            .header("authorization", &self.api_token)
            .query(&[("batch", "1"), ("input", input.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Source(format!("{}: HTTP {}", endpoint, status)));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| Error::Source(format!("{}: invalid JSON body: {}", endpoint, e)))?;

        unwrap_envelope(endpoint, body)
    }

    /// Deserialize an unwrapped endpoint body, mapping schema mismatch
    /// to a loud parse error naming the endpoint.
    fn parse<T: serde::de::DeserializeOwned>(endpoint: &str, value: Value) -> Result<T> {
        serde_json::from_value(value)
            .map_err(|e| Error::Parse(format!("{}: unexpected schema: {}", endpoint, e)))
    }
}

/// Strip the tRPC batch envelope: `[ { result: { data: body } } ]`,
/// with the body optionally nested under `json`.
fn unwrap_envelope(endpoint: &str, body: Value) -> Result<Value> {
    let first = match body {
        Value::Array(mut elements) if !elements.is_empty() => elements.remove(0),
        Value::Array(_) => {
            return Err(Error::Parse(format!("{}: empty batch response", endpoint)))
        }
        other => other,
    };

    let data = first
        .get("result")
        .and_then(|r| r.get("data"))
        .cloned()
        .ok_or_else(|| Error::Parse(format!("{}: missing result.data", endpoint)))?;

    Ok(match data.get("json") {
        Some(inner) => inner.clone(),
        None => data,
    })
}

#[async_trait]
impl DataSource for WarEraClient {
    async fn fetch_roster_page(&self, cursor: Option<&str>) -> Result<RosterPage> {
        let mut payload = json!({
            "countryId": self.country_id,
            "limit": ROSTER_PAGE_SIZE,
        });
        if let Some(cursor) = cursor {
            payload["cursor"] = json!(cursor);
        }

        let body = self.get("user.getUsersByCountry", payload).await?;
        let page: RosterPageBody = Self::parse("user.getUsersByCountry", body)?;
        Ok(RosterPage {
            member_ids: page.items.into_iter().map(|item| item.id).collect(),
            next_cursor: page.next_cursor,
        })
    }

    async fn fetch_profile(&self, player_id: &str) -> Result<PlayerProfile> {
        let body = self
            .get("user.getUserLite", json!({ "userId": player_id }))
            .await?;
        let user: UserLiteBody = Self::parse("user.getUserLite", body)?;
        let level = user
            .leveling
            .map(|l| l.level)
            .or(user.level)
            .ok_or_else(|| {
                Error::Parse(format!("user.getUserLite: no level for {}", player_id))
            })?;
        Ok(PlayerProfile {
            username: user.username,
            level,
        })
    }

    async fn fetch_units(&self, player_id: &str) -> Result<Vec<String>> {
        let body = self
            .get(
                "company.getCompanies",
                json!({ "userId": player_id, "perPage": UNITS_PER_PAGE }),
            )
            .await?;
        let list: UnitListBody = Self::parse("company.getCompanies", body)?;
        Ok(list
            .items
            .into_iter()
            .map(|unit| match unit {
                UnitRef::Id(id) => id,
                UnitRef::Object { id } => id,
            })
            .collect())
    }

    async fn fetch_automation_level(&self, unit_id: &str) -> Result<i64> {
        let body = self
            .get(
                "upgrade.getUpgradeByTypeAndEntity",
                json!({ "upgradeType": "automatedEngine", "companyId": unit_id }),
            )
            .await?;
        // Null body means the unit has never been upgraded
        if body.is_null() {
            return Ok(0);
        }
        let upgrade: UpgradeBody = Self::parse("upgrade.getUpgradeByTypeAndEntity", body)?;
        Ok(upgrade.level.unwrap_or(0))
    }

    async fn fetch_payments(&self, since: DateTime<Utc>) -> Result<Vec<Payment>> {
        let body = self
            .get(
                "transaction.getPaginatedTransactions",
                json!({
                    "limit": PAYMENTS_FETCH_LIMIT,
                    "transactionType": "donation",
                    "countryId": self.country_id,
                }),
            )
            .await?;
        let list: TransactionListBody =
            Self::parse("transaction.getPaginatedTransactions", body)?;

        let payments = list
            .items
            .into_iter()
            .filter_map(|tx| {
                // Records missing a timestamp or payer are unusable
                let timestamp = tx.created_at?;
                if timestamp < since {
                    return None;
                }
                let payer_id = tx.payer_id()?.to_string();
                Some(Payment {
                    amount: tx.value(),
                    payer_id,
                    timestamp,
                })
            })
            .collect();
        Ok(payments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_unwraps_batch_array_with_json_member() {
        let body = json!([{ "result": { "data": { "json": { "level": 7 } } } }]);
        let unwrapped = unwrap_envelope("test", body).unwrap();
        assert_eq!(unwrapped, json!({ "level": 7 }));
    }

    #[test]
    fn envelope_unwraps_plain_data() {
        let body = json!({ "result": { "data": { "items": [] } } });
        let unwrapped = unwrap_envelope("test", body).unwrap();
        assert_eq!(unwrapped, json!({ "items": [] }));
    }

    #[test]
    fn envelope_rejects_missing_result() {
        let body = json!([{ "error": { "message": "nope" } }]);
        assert!(matches!(
            unwrap_envelope("test", body),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn transaction_item_field_fallbacks() {
        let tx: TransactionItem = serde_json::from_value(json!({
            "createdAt": "2025-06-06T21:00:00Z",
            "buyer": "abc",
            "gold": 12.5
        }))
        .unwrap();
        assert_eq!(tx.payer_id(), Some("abc"));
        assert_eq!(tx.value(), 12.5);
    }

    #[test]
    fn unit_refs_accept_both_shapes() {
        let list: UnitListBody = serde_json::from_value(json!({
            "items": ["c1", { "_id": "c2" }]
        }))
        .unwrap();
        let ids: Vec<String> = list
            .items
            .into_iter()
            .map(|u| match u {
                UnitRef::Id(id) => id,
                UnitRef::Object { id } => id,
            })
            .collect();
        assert_eq!(ids, vec!["c1", "c2"]);
    }
}
