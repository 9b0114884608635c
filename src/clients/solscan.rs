// src/clients/solscan.rs
// Holder and trade history. The public API has changed shape a few times,
// so rows are read leniently from `serde_json::Value`.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use log::warn;
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;

use super::{per_second_limiter, DirectLimiter, TokenActivitySource};
use crate::error::{SniperError, SniperResult};
use crate::models::{HolderShare, Trade};

pub struct SolscanClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    limiter: Arc<DirectLimiter>,
}

impl SolscanClient {
    pub fn new(client: Client, base_url: &str, api_key: Option<String>, rate_limit: u32) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            limiter: per_second_limiter(rate_limit),
        }
    }

    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> SniperResult<Value> {
        self.limiter.until_ready().await;

        let mut request = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .query(query);
        if let Some(key) = &self.api_key {
            request = request.header("Token", key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(SniperError::TransientNetwork(format!(
                "Solscan {} error: {}",
                path,
                response.status()
            )));
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl TokenActivitySource for SolscanClient {
    async fn top_holders(&self, mint: &str) -> Option<Vec<HolderShare>> {
        let query = [("tokenAddress", mint.to_string())];
        match self.get_json("/token/holders", &query).await {
            Ok(body) => Some(parse_holders(&body)),
            Err(e) => {
                warn!("⚠️ Solscan holders unavailable for {}: {}", mint, e);
                None
            }
        }
    }

    async fn recent_trades(&self, mint: &str, limit: usize) -> Option<Vec<Trade>> {
        let query = [("token", mint.to_string()), ("limit", limit.to_string())];
        match self.get_json("/token/trades", &query).await {
            Ok(body) => Some(parse_trades(&body)),
            Err(e) => {
                warn!("⚠️ Solscan trades unavailable for {}: {}", mint, e);
                None
            }
        }
    }
}

/// Rows may sit at the top level or under `data`.
fn rows(body: &Value) -> &[Value] {
    body.as_array()
        .or_else(|| body.get("data").and_then(Value::as_array))
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn text(row: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| row.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

pub(crate) fn parse_holders(body: &Value) -> Vec<HolderShare> {
    rows(body)
        .iter()
        .filter_map(|row| {
            let owner = text(row, &["owner", "address"])?;
            let percentage = number(row.get("percentage"));
            let amount = match row.get("amount") {
                Some(Value::Number(n)) => n.as_u64().map(u128::from),
                Some(Value::String(s)) => s.parse().ok(),
                _ => None,
            };
            if percentage.is_none() && amount.is_none() {
                return None;
            }
            Some(HolderShare {
                owner,
                percentage,
                amount,
            })
        })
        .collect()
}

pub(crate) fn parse_trades(body: &Value) -> Vec<Trade> {
    rows(body)
        .iter()
        .map(|row| Trade {
            buyer: text(row, &["buyer", "owner"]),
            seller: text(row, &["seller"]),
            block_time: number(row.get("blockTime").or_else(|| row.get("block_time")))
                .and_then(|secs| Utc.timestamp_opt(secs as i64, 0).single()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn holders_read_from_data_wrapper() {
        let body = json!({
            "total": 3,
            "data": [
                {"owner": "w1", "amount": "500", "percentage": 50.0},
                {"address": "ata2", "amount": 100},
                {"owner": "nothing"}
            ]
        });
        let holders = parse_holders(&body);
        assert_eq!(holders.len(), 2);
        assert_eq!(holders[0].percentage, Some(50.0));
        assert_eq!(holders[1].owner, "ata2");
        assert_eq!(holders[1].amount, Some(100));
    }

    #[test]
    fn trades_read_from_bare_array() {
        let body = json!([
            {"buyer": "a", "seller": "b", "blockTime": 1_700_000_000},
            {"buyer": "c", "seller": "a", "blockTime": "1700000100"},
            {"buyer": "d"}
        ]);
        let trades = parse_trades(&body);
        assert_eq!(trades.len(), 3);
        assert_eq!(trades[2].seller, None);
        assert_eq!(trades[1].block_time, Utc.timestamp_opt(1_700_000_100, 0).single());
    }

    #[test]
    fn unexpected_shape_yields_nothing() {
        assert!(parse_trades(&json!({"error": "rate limited"})).is_empty());
    }
}
