// src/chains/mod.rs
use async_trait::async_trait;

use crate::error::SniperResult;
use crate::models::RiskReport;

#[cfg(feature = "bsc")]
pub mod bsc;
pub mod solana;

/// What a chain has to offer the sniper: a liquidity probe, a risk
/// report and a gated buy.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChainSniper: Send + Sync {
    fn chain(&self) -> &'static str;

    async fn check_liquidity(&self, token: &str) -> bool;

    async fn check_for_rugpull_risks(&self, token: &str) -> RiskReport;

    /// Buys after the risk report has been through the buy gate. `None`
    /// means the gate said no.
    async fn execute_buy(&self, token: &str, amount: f64, risks: &[String]) -> SniperResult<Option<String>>;

    async fn buy_token(&self, token: &str, amount: f64) -> SniperResult<Option<String>> {
        let risks = self.check_for_rugpull_risks(token).await;
        self.execute_buy(token, amount, &risks).await
    }
}
