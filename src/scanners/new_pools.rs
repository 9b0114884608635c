// src/scanners/new_pools.rs
// Turns Raydium's pool listing into dated candidates. Symbols come from
// the payload when present, else from the metadata cache.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info};
use serde_json::Value;

use super::creation_time::estimate_with_basis;
use crate::cache::TokenMetadataCache;
use crate::clients::raydium::{PoolQuery, RaydiumClient};
use crate::config::DiscoveryConfig;
use crate::error::{SniperError, SniperResult};
use crate::models::{PoolCandidate, PoolKind};

/// Anything that can hand the monitor a batch of candidate pools.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PoolSource: Send + Sync {
    async fn fetch_candidates(&self) -> SniperResult<Vec<PoolCandidate>>;
}

pub struct PoolScanner {
    raydium: RaydiumClient,
    tokens: TokenMetadataCache,
    query: PoolQuery,
    pages: u32,
}

impl PoolScanner {
    pub fn new(raydium: RaydiumClient, tokens: TokenMetadataCache, config: &DiscoveryConfig) -> Self {
        let query = PoolQuery {
            pool_type: config.pool_type.clone(),
            page_size: config.page_size,
            ..PoolQuery::default()
        };
        Self {
            raydium,
            tokens,
            query,
            pages: config.pages,
        }
    }

    pub fn tokens(&self) -> &TokenMetadataCache {
        &self.tokens
    }

    /// One listing call for an arbitrary query; failures give an empty batch.
    pub async fn scan_once(&self, query: &PoolQuery) -> Vec<PoolCandidate> {
        let raw = self.raydium.fetch_raw_pools(query).await;
        normalize_batch(&raw, &self.tokens, Utc::now())
    }
}

#[async_trait]
impl PoolSource for PoolScanner {
    async fn fetch_candidates(&self) -> SniperResult<Vec<PoolCandidate>> {
        let raw = self.raydium.fetch_pages(&self.query, self.pages).await?;
        let candidates = normalize_batch(&raw, &self.tokens, Utc::now());
        info!("🔍 Normalised {} of {} Raydium pools", candidates.len(), raw.len());
        Ok(candidates)
    }
}

/// Malformed rows are skipped; the rest of the batch goes through.
pub fn normalize_batch(raw: &[Value], tokens: &TokenMetadataCache, now: DateTime<Utc>) -> Vec<PoolCandidate> {
    raw.iter()
        .filter_map(|pool| match normalize(pool, tokens, now) {
            Ok(candidate) => Some(candidate),
            Err(e) => {
                debug!("Skipping pool: {}", e);
                None
            }
        })
        .collect()
}

pub fn normalize(raw: &Value, tokens: &TokenMetadataCache, now: DateTime<Utc>) -> SniperResult<PoolCandidate> {
    let id = raw
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| SniperError::malformed("raydium", "pool without id"))?
        .to_string();

    let kind = raw
        .get("type")
        .and_then(Value::as_str)
        .and_then(PoolKind::from_venue_type)
        .ok_or_else(|| SniperError::malformed("raydium", format!("pool {} has unknown type", id)))?;

    let (token_a, token_a_symbol) = mint_side(raw, "mintA", tokens)
        .ok_or_else(|| SniperError::malformed("raydium", format!("pool {} missing mintA", id)))?;
    let (token_b, token_b_symbol) = mint_side(raw, "mintB", tokens)
        .ok_or_else(|| SniperError::malformed("raydium", format!("pool {} missing mintB", id)))?;

    let estimate = estimate_with_basis(raw, now);
    let source = match &estimate {
        Some((_, basis)) => format!("raydium/{}", basis),
        None => "raydium".to_string(),
    };

    Ok(PoolCandidate {
        url: format!("https://dexscreener.com/solana/{}", id),
        id,
        kind,
        token_a,
        token_b,
        token_a_symbol,
        token_b_symbol,
        liquidity_usd: non_negative(raw.get("tvl")),
        volume_24h: non_negative(raw.get("day").and_then(|d| d.get("volume"))),
        fee_rate_bps: non_negative(raw.get("feeRate")) * 10_000.0,
        price: non_negative(raw.get("price")),
        created_at: estimate.map(|(at, _)| at),
        source,
    })
}

fn mint_side(raw: &Value, key: &str, tokens: &TokenMetadataCache) -> Option<(String, String)> {
    let mint = raw.get(key)?;
    let address = mint.get("address").and_then(Value::as_str)?.to_string();
    let symbol = mint
        .get("symbol")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| tokens.symbol(&address));
    Some((address, symbol))
}

fn non_negative(value: Option<&Value>) -> f64 {
    let n = match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.parse().unwrap_or(0.0),
        _ => 0.0,
    };
    if n.is_finite() && n > 0.0 {
        n
    } else {
        0.0
    }
}
