// src/models.rs
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

pub const UNKNOWN_SYMBOL: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PoolKind {
    ConcentratedLiquidity,
    ConstantProduct,
}

impl PoolKind {
    /// Raydium reports `Concentrated` or `Standard`.
    pub fn from_venue_type(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "concentrated" | "clmm" => Some(Self::ConcentratedLiquidity),
            "standard" | "amm" | "cpmm" => Some(Self::ConstantProduct),
            _ => None,
        }
    }
}

impl fmt::Display for PoolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConcentratedLiquidity => write!(f, "CLMM"),
            Self::ConstantProduct => write!(f, "AMM"),
        }
    }
}

/// A pool as normalised from an upstream payload, before the filter has
/// decided whether it is worth keeping.
#[derive(Debug, Clone, PartialEq)]
pub struct PoolCandidate {
    pub id: String,
    pub kind: PoolKind,
    pub token_a: String,
    pub token_b: String,
    pub token_a_symbol: String,
    pub token_b_symbol: String,
    pub liquidity_usd: f64,
    pub volume_24h: f64,
    pub fee_rate_bps: f64,
    pub price: f64,
    pub created_at: Option<DateTime<Utc>>,
    pub source: String,
    pub url: String,
}

impl PoolCandidate {
    pub fn into_record(self) -> Option<PoolRecord> {
        let created_at = self.created_at?;
        Some(PoolRecord {
            id: self.id,
            kind: self.kind,
            token_a: self.token_a,
            token_b: self.token_b,
            token_a_symbol: self.token_a_symbol,
            token_b_symbol: self.token_b_symbol,
            liquidity_usd: self.liquidity_usd,
            volume_24h: self.volume_24h,
            fee_rate_bps: self.fee_rate_bps,
            price: self.price,
            created_at,
            source: self.source,
            url: self.url,
        })
    }
}

/// A pool that passed the quality filter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoolRecord {
    pub id: String,
    pub kind: PoolKind,
    pub token_a: String,
    pub token_b: String,
    pub token_a_symbol: String,
    pub token_b_symbol: String,
    pub liquidity_usd: f64,
    pub volume_24h: f64,
    pub fee_rate_bps: f64,
    pub price: f64,
    pub created_at: DateTime<Utc>,
    pub source: String,
    pub url: String,
}

impl PoolRecord {
    pub fn activity_score(&self) -> f64 {
        self.volume_24h + self.liquidity_usd
    }

    pub fn unknown_symbol_count(&self) -> usize {
        [&self.token_a_symbol, &self.token_b_symbol]
            .iter()
            .filter(|s| s.as_str() == UNKNOWN_SYMBOL)
            .count()
    }

    pub fn pair_label(&self) -> String {
        format!("{}/{}", self.token_a_symbol, self.token_b_symbol)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
}

/// Aggregator quote. The raw payload is kept because the swap endpoint
/// wants the quote back verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub out_amount: u128,
    pub price_impact_pct: f64,
    pub raw: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenSupply {
    pub amount: u128,
    pub decimals: u8,
}

impl TokenSupply {
    pub fn ui_amount(&self) -> Decimal {
        let raw = self.amount.min(i128::MAX as u128) as i128;
        let amount = Decimal::try_from_i128_with_scale(raw, 0).unwrap_or(Decimal::MAX);
        let scale = Decimal::from(10u64.pow(self.decimals.min(18) as u32));
        amount / scale
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountInfo {
    pub owner: String,
    pub data: Vec<u8>,
}

/// One top-holder row. Some listings give a percentage, others only the
/// raw balance; the risk engine resolves the latter against supply.
#[derive(Debug, Clone, PartialEq)]
pub struct HolderShare {
    pub owner: String,
    pub percentage: Option<f64>,
    pub amount: Option<u128>,
}

impl HolderShare {
    pub fn with_percentage(owner: &str, percentage: f64) -> Self {
        Self {
            owner: owner.to_string(),
            percentage: Some(percentage),
            amount: None,
        }
    }

    pub fn resolved_percentage(&self, supply: Option<&TokenSupply>) -> Option<f64> {
        if let Some(pct) = self.percentage {
            return Some(pct);
        }
        let amount = self.amount?;
        let total = supply.map(|s| s.amount).filter(|total| *total > 0)?;
        Some(amount as f64 / total as f64 * 100.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub buyer: Option<String>,
    pub seller: Option<String>,
    pub block_time: Option<DateTime<Utc>>,
}

/// Ordered risk strings for one token. Empty means nothing fired, which
/// is not the same as safe.
pub type RiskReport = Vec<String>;
