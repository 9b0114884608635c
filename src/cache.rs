// src/cache.rs
use log::{info, warn};
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::clients::TokenListSource;
use crate::models::{TokenMetadata, UNKNOWN_SYMBOL};
use crate::retry::{retry, RetryOutcome, RetryPolicy};

pub const WSOL_MINT: &str = "So11111111111111111111111111111111111111112";
pub const USDC_MINT: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";
pub const USDT_MINT: &str = "Es9vMFrzaCERmJfrF4H2FYD4KCoNkY11McCe8BenwNYB";

/// Always-known tokens: (mint, symbol, name, decimals, quote asset?)
const WELL_KNOWN: &[(&str, &str, &str, u8, bool)] = &[
    (WSOL_MINT, "SOL", "Wrapped SOL", 9, true),
    (USDC_MINT, "USDC", "USD Coin", 6, true),
    (USDT_MINT, "USDT", "USDT", 6, true),
    ("4k3Dyjzvzp8eMZWUXbBCjEvwSkkk59S5iCNLY3QrkX6R", "RAY", "Raydium", 6, false),
    ("DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263", "BONK", "Bonk", 5, false),
    ("JUPyiwrYJFskUPiHa7hkeR8VUtAeFoSYbKedZNsDvCN", "JUP", "Jupiter", 6, false),
];

/// Mint → metadata lookup. Filled once at startup and only refreshed on
/// request; lookups never hit the network.
pub struct TokenMetadataCache {
    entries: HashMap<String, TokenMetadata>,
}

impl Default for TokenMetadataCache {
    fn default() -> Self {
        Self::with_well_known()
    }
}

impl TokenMetadataCache {
    pub fn with_well_known() -> Self {
        let mut cache = Self {
            entries: HashMap::new(),
        };
        cache.merge_well_known();
        cache
    }

    pub async fn bootstrap(source: &dyn TokenListSource, policy: RetryPolicy) -> Self {
        let mut cache = Self::with_well_known();
        cache.refresh(source, policy).await;
        cache
    }

    /// Reloads the bulk listing. On failure the current entries are kept.
    pub async fn refresh(&mut self, source: &dyn TokenListSource, policy: RetryPolicy) -> usize {
        match retry(policy, "token list", || source.fetch_token_list()).await {
            RetryOutcome::Success(tokens) => {
                self.entries.extend(tokens);
                self.merge_well_known();
                info!("📚 Token metadata cache holds {} tokens", self.entries.len());
            }
            RetryOutcome::Exhausted { attempts, last_error } => {
                warn!(
                    "⚠️ Token list unavailable after {} attempt(s), keeping {} cached tokens: {}",
                    attempts,
                    self.entries.len(),
                    last_error
                );
            }
        }
        self.entries.len()
    }

    fn merge_well_known(&mut self) {
        for (mint, symbol, name, decimals, _) in WELL_KNOWN {
            self.entries.insert(
                mint.to_string(),
                TokenMetadata {
                    symbol: symbol.to_string(),
                    name: name.to_string(),
                    decimals: *decimals,
                },
            );
        }
    }

    pub fn get(&self, mint: &str) -> Option<&TokenMetadata> {
        self.entries.get(mint)
    }

    pub fn symbol(&self, mint: &str) -> String {
        self.get(mint)
            .map(|m| m.symbol.clone())
            .unwrap_or_else(|| UNKNOWN_SYMBOL.to_string())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Quote assets (SOL, stables) are never risk-assessed.
    pub fn is_quote_asset(mint: &str) -> bool {
        WELL_KNOWN
            .iter()
            .any(|(known, _, _, _, quote)| *quote && *known == mint)
    }
}

/// Last good USD price per native asset, served when a refresh fails.
#[derive(Default)]
pub struct ReferencePriceCache {
    prices: RwLock<HashMap<String, f64>>,
}

impl ReferencePriceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn store(&self, asset: &str, price: f64) {
        self.prices.write().await.insert(asset.to_string(), price);
    }

    pub async fn last_known(&self, asset: &str) -> Option<f64> {
        self.prices.read().await.get(asset).copied()
    }
}
