// src/scanners/pool_filter.rs
use chrono::{DateTime, Utc};
use log::debug;
use std::cmp::Ordering;

use crate::config::DiscoveryConfig;
use crate::models::{PoolCandidate, PoolRecord};

/// Quality gate for freshly listed pools.
#[derive(Debug, Clone)]
pub struct PoolFilter {
    min_tvl_usd: f64,
    reduced_tvl_floor_usd: f64,
    min_volume_24h_usd: f64,
    symbol_blocklist: Vec<String>,
    spam_suffixes: Vec<String>,
}

impl PoolFilter {
    pub fn new(config: &DiscoveryConfig) -> Self {
        Self {
            min_tvl_usd: config.min_tvl_usd,
            reduced_tvl_floor_usd: config.reduced_tvl_floor_usd,
            min_volume_24h_usd: config.min_volume_24h_usd,
            symbol_blocklist: config
                .symbol_blocklist
                .iter()
                .map(|s| s.to_lowercase())
                .collect(),
            spam_suffixes: config.spam_address_suffixes.clone(),
        }
    }

    /// Drops anything undated, older than `cutoff` or below the quality
    /// floors, then ranks what is left.
    pub fn filter_and_rank(&self, candidates: Vec<PoolCandidate>, cutoff: DateTime<Utc>) -> Vec<PoolRecord> {
        let total = candidates.len();
        let kept: Vec<PoolRecord> = candidates
            .into_iter()
            .filter_map(PoolCandidate::into_record)
            .filter(|pool| pool.created_at >= cutoff)
            .filter(|pool| self.has_valid_token(pool))
            .filter(|pool| self.passes_liquidity_floor(pool))
            .collect();

        debug!("🎯 Kept {} of {} candidate pools", kept.len(), total);
        rank(kept)
    }

    fn is_valid_token(&self, symbol: &str, address: &str) -> bool {
        let symbol = symbol.to_lowercase();
        let blocked = self.symbol_blocklist.iter().any(|word| symbol.contains(word.as_str()));
        let spam = self.spam_suffixes.iter().any(|suffix| address.ends_with(suffix.as_str()));
        !blocked && !spam
    }

    fn has_valid_token(&self, pool: &PoolRecord) -> bool {
        self.is_valid_token(&pool.token_a_symbol, &pool.token_a)
            || self.is_valid_token(&pool.token_b_symbol, &pool.token_b)
    }

    fn passes_liquidity_floor(&self, pool: &PoolRecord) -> bool {
        pool.liquidity_usd >= self.min_tvl_usd
            || (pool.liquidity_usd >= self.reduced_tvl_floor_usd
                && pool.volume_24h >= self.min_volume_24h_usd)
    }
}

/// Newest first, then busiest, then best-resolved symbols. `sort_by` is
/// stable so equal pools keep their listing order.
pub fn rank(mut pools: Vec<PoolRecord>) -> Vec<PoolRecord> {
    pools.sort_by(compare);
    pools
}

fn compare(a: &PoolRecord, b: &PoolRecord) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| b.activity_score().total_cmp(&a.activity_score()))
        .then_with(|| a.unknown_symbol_count().cmp(&b.unknown_symbol_count()))
}
