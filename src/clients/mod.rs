// src/clients/mod.rs
// Thin wrappers over the upstream HTTP/RPC services. Each capability the
// sniper needs is a trait so the risk engine and the monitor can be driven
// by fakes in tests.

use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use reqwest::Client;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use crate::config::EndpointConfig;
use crate::error::{SniperError, SniperResult};
use crate::models::{AccountInfo, HolderShare, Quote, TokenMetadata, TokenSupply, Trade};

#[cfg(feature = "bsc")]
pub mod bscscan;
pub mod coingecko;
pub mod jupiter;
pub mod raydium;
pub mod rpc;
pub mod solscan;

pub type DirectLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

pub fn http_client(endpoints: &EndpointConfig) -> SniperResult<Client> {
    Client::builder()
        .timeout(Duration::from_secs(endpoints.http_timeout_secs))
        .user_agent("PoolSniper/0.1")
        .build()
        .map_err(|e| SniperError::Configuration(format!("failed to create HTTP client: {}", e)))
}

pub fn per_second_limiter(requests_per_second: u32) -> Arc<DirectLimiter> {
    let rate = NonZeroU32::new(requests_per_second.max(1)).unwrap_or(NonZeroU32::MIN);
    Arc::new(RateLimiter::direct(Quota::per_second(rate)))
}

/// Read access to chain state. `Ok(None)` means the account does not
/// exist; `Err` means we could not find out.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChainAccess: Send + Sync {
    async fn get_account_info(&self, address: &str) -> SniperResult<Option<AccountInfo>>;
    async fn get_token_supply(&self, mint: &str) -> SniperResult<Option<TokenSupply>>;
}

/// Signs and broadcasts a serialized transaction. Key custody lives
/// behind this trait.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TransactionSender: Send + Sync {
    async fn sign_and_send(&self, transaction: &[u8]) -> SniperResult<String>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuoteVenue: Send + Sync {
    async fn get_quote(
        &self,
        input_mint: &str,
        output_mint: &str,
        amount_in: u64,
        slippage_bps: u16,
    ) -> Option<Quote>;

    async fn get_swap_transaction(&self, quote: &Quote, payer: &str) -> Option<Vec<u8>>;
}

/// Holder and trade history for a token.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenActivitySource: Send + Sync {
    async fn top_holders(&self, mint: &str) -> Option<Vec<HolderShare>>;
    async fn recent_trades(&self, mint: &str, limit: usize) -> Option<Vec<Trade>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReferencePriceSource: Send + Sync {
    /// USD price of a native asset (CoinGecko id, e.g. `solana`).
    async fn usd_price(&self, asset: &str) -> Option<f64>;
}

/// Bulk mint → metadata listing used to seed the token cache.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenListSource: Send + Sync {
    async fn fetch_token_list(&self) -> SniperResult<Vec<(String, TokenMetadata)>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LiquidityLockSource: Send + Sync {
    /// Share of LP tokens burned or locked for the token's deepest pool.
    async fn lp_locked_percent(&self, mint: &str) -> Option<f64>;
}

/// Sender used when no signer is wired in: logs and returns a fake id.
pub struct DryRunSender;

#[async_trait]
impl TransactionSender for DryRunSender {
    async fn sign_and_send(&self, transaction: &[u8]) -> SniperResult<String> {
        log::warn!(
            "🧪 Dry run: not broadcasting {}-byte transaction",
            transaction.len()
        );
        Ok(format!("dry-run-{}", chrono::Utc::now().timestamp_millis()))
    }
}
