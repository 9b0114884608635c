// src/clients/raydium.rs
use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use super::{per_second_limiter, DirectLimiter, LiquidityLockSource};
use crate::error::{SniperError, SniperResult};

/// What to ask the pool listing for. With no mints it lists every pool.
#[derive(Debug, Clone, PartialEq)]
pub struct PoolQuery {
    pub mint_a: Option<String>,
    pub mint_b: Option<String>,
    pub pool_type: String,
    pub sort_field: String,
    pub page: u32,
    pub page_size: u32,
}

impl Default for PoolQuery {
    fn default() -> Self {
        Self {
            mint_a: None,
            mint_b: None,
            pool_type: "all".to_string(),
            sort_field: "default".to_string(),
            page: 1,
            page_size: 100,
        }
    }
}

impl PoolQuery {
    fn path(&self) -> &'static str {
        if self.mint_a.is_some() {
            "/pools/info/mint"
        } else {
            "/pools/info/list"
        }
    }

    fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("poolType", self.pool_type.clone()),
            ("poolSortField", self.sort_field.clone()),
            ("sortType", "desc".to_string()),
            ("pageSize", self.page_size.to_string()),
            ("page", self.page.max(1).to_string()),
        ];
        if let Some(mint) = &self.mint_a {
            params.push(("mint1", mint.clone()));
            params.push(("mint2", self.mint_b.clone().unwrap_or_default()));
        }
        params
    }
}

#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    success: bool,
    data: Option<PoolPage>,
}

#[derive(Debug, Deserialize)]
struct PoolPage {
    #[serde(default)]
    data: Vec<Value>,
    #[serde(rename = "hasNextPage", default)]
    has_next_page: bool,
}

pub struct RaydiumClient {
    client: Client,
    base_url: String,
    limiter: Arc<DirectLimiter>,
}

impl RaydiumClient {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            limiter: per_second_limiter(5),
        }
    }

    /// Raw pool payloads for a query. Upstream failures come back empty.
    pub async fn fetch_raw_pools(&self, query: &PoolQuery) -> Vec<Value> {
        match self.try_fetch_raw_pools(query).await {
            Ok((pools, _)) => pools,
            Err(e) => {
                warn!("⚠️ Raydium pool listing failed: {}", e);
                Vec::new()
            }
        }
    }

    /// Walks `pages` pages starting at `query.page`, stopping early when
    /// the venue says there is nothing more.
    pub async fn fetch_pages(&self, query: &PoolQuery, pages: u32) -> SniperResult<Vec<Value>> {
        let mut all = Vec::new();
        let mut query = query.clone();

        for _ in 0..pages.max(1) {
            let (pools, has_next) = self.try_fetch_raw_pools(&query).await?;
            all.extend(pools);
            if !has_next {
                break;
            }
            query.page += 1;
        }

        info!("🌊 Raydium returned {} raw pools", all.len());
        Ok(all)
    }

    async fn try_fetch_raw_pools(&self, query: &PoolQuery) -> SniperResult<(Vec<Value>, bool)> {
        self.limiter.until_ready().await;

        let url = format!("{}{}", self.base_url, query.path());
        debug!("🌐 GET {} {:?}", url, query.params());

        let response = self.client.get(&url).query(&query.params()).send().await?;
        if !response.status().is_success() {
            return Err(SniperError::TransientNetwork(format!(
                "Raydium API error: {}",
                response.status()
            )));
        }

        let body: Value = response.json().await?;
        parse_pool_page(body)
    }
}

fn parse_pool_page(body: Value) -> SniperResult<(Vec<Value>, bool)> {
    let envelope: ApiEnvelope = serde_json::from_value(body)?;
    if !envelope.success {
        return Err(SniperError::malformed("raydium", "success=false"));
    }
    let page = envelope
        .data
        .ok_or_else(|| SniperError::malformed("raydium", "missing data"))?;
    Ok((page.data, page.has_next_page))
}

#[async_trait]
impl LiquidityLockSource for RaydiumClient {
    async fn lp_locked_percent(&self, mint: &str) -> Option<f64> {
        let query = PoolQuery {
            mint_a: Some(mint.to_string()),
            pool_type: "standard".to_string(),
            sort_field: "liquidity".to_string(),
            page_size: 10,
            ..PoolQuery::default()
        };

        let (pools, _) = self.try_fetch_raw_pools(&query).await.ok()?;
        deepest_burn_percent(&pools)
    }
}

/// `burnPercent` of the pool with the largest TVL that reports one.
fn deepest_burn_percent(pools: &[Value]) -> Option<f64> {
    pools
        .iter()
        .filter_map(|pool| {
            let burn = pool.get("burnPercent")?.as_f64()?;
            let tvl = pool.get("tvl").and_then(Value::as_f64).unwrap_or(0.0);
            Some((tvl, burn))
        })
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, burn)| burn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn mint_query_uses_mint_endpoint() {
        let query = PoolQuery {
            mint_a: Some("MintA".to_string()),
            ..PoolQuery::default()
        };
        assert_eq!(query.path(), "/pools/info/mint");
        assert!(query.params().contains(&("mint1", "MintA".to_string())));
        assert_eq!(PoolQuery::default().path(), "/pools/info/list");
    }

    #[test]
    fn parses_pool_page() {
        let body = json!({
            "id": "abc",
            "success": true,
            "data": { "count": 2, "data": [{"id": "p1"}, {"id": "p2"}], "hasNextPage": true }
        });
        let (pools, has_next) = parse_pool_page(body).unwrap();
        assert_eq!(pools.len(), 2);
        assert!(has_next);
    }

    #[test]
    fn unsuccessful_envelope_is_malformed() {
        let body = json!({ "success": false, "msg": "bad" });
        assert!(matches!(
            parse_pool_page(body),
            Err(SniperError::MalformedUpstream { .. })
        ));
    }

    #[test]
    fn burn_percent_comes_from_deepest_pool() {
        let pools = vec![
            json!({"id": "small", "tvl": 1_000.0, "burnPercent": 100.0}),
            json!({"id": "deep", "tvl": 90_000.0, "burnPercent": 12.5}),
            json!({"id": "clmm", "tvl": 500_000.0}),
        ];
        assert_eq!(deepest_burn_percent(&pools), Some(12.5));
        assert_eq!(deepest_burn_percent(&[]), None);
    }
}
