// src/clients/coingecko.rs
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;

use super::ReferencePriceSource;
use crate::cache::ReferencePriceCache;
use crate::error::{SniperError, SniperResult};

pub const SOLANA_ID: &str = "solana";

pub struct CoinGeckoClient {
    client: Client,
    base_url: String,
    cache: Arc<ReferencePriceCache>,
}

impl CoinGeckoClient {
    pub fn new(client: Client, base_url: &str, cache: Arc<ReferencePriceCache>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            cache,
        }
    }

    async fn fetch_price(&self, asset: &str) -> SniperResult<f64> {
        let url = format!("{}/simple/price", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("ids", asset), ("vs_currencies", "usd")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SniperError::TransientNetwork(format!(
                "CoinGecko error: {}",
                response.status()
            )));
        }

        let body: Value = response.json().await?;
        body.get(asset)
            .and_then(|entry| entry.get("usd"))
            .and_then(Value::as_f64)
            .filter(|price| *price > 0.0)
            .ok_or_else(|| SniperError::malformed("coingecko", format!("no usd price for {}", asset)))
    }
}

#[async_trait]
impl ReferencePriceSource for CoinGeckoClient {
    async fn usd_price(&self, asset: &str) -> Option<f64> {
        match self.fetch_price(asset).await {
            Ok(price) => {
                debug!("💵 {} = ${}", asset, price);
                self.cache.store(asset, price).await;
                Some(price)
            }
            Err(e) => {
                let fallback = self.cache.last_known(asset).await;
                warn!(
                    "⚠️ {} price refresh failed ({}), using last known: {:?}",
                    asset, e, fallback
                );
                fallback
            }
        }
    }
}
