// src/chains/solana.rs
use async_trait::async_trait;
use log::{info, warn};
use std::sync::Arc;

use super::ChainSniper;
use crate::analyzers::rugpull_checker::RugpullChecker;
use crate::cache::WSOL_MINT;
use crate::clients::{QuoteVenue, TransactionSender};
use crate::config::TradingConfig;
use crate::error::{SniperError, SniperResult};
use crate::models::RiskReport;
use crate::strategies::buy_gate::{BuyDecision, BuyGate};

const LAMPORTS_PER_SOL: f64 = 1_000_000_000.0;

pub struct SolanaSniper {
    checker: RugpullChecker,
    venue: Arc<dyn QuoteVenue>,
    sender: Arc<dyn TransactionSender>,
    gate: BuyGate,
    trading: TradingConfig,
}

impl SolanaSniper {
    pub fn new(
        checker: RugpullChecker,
        venue: Arc<dyn QuoteVenue>,
        sender: Arc<dyn TransactionSender>,
        gate: BuyGate,
        trading: TradingConfig,
    ) -> Self {
        Self {
            checker,
            venue,
            sender,
            gate,
            trading,
        }
    }
}

pub fn sol_to_lamports(amount_sol: f64) -> SniperResult<u64> {
    if !amount_sol.is_finite() || amount_sol <= 0.0 {
        return Err(SniperError::Configuration(format!(
            "buy amount must be positive, got {}",
            amount_sol
        )));
    }
    Ok((amount_sol * LAMPORTS_PER_SOL).round() as u64)
}

#[async_trait]
impl ChainSniper for SolanaSniper {
    fn chain(&self) -> &'static str {
        "solana"
    }

    async fn check_liquidity(&self, token: &str) -> bool {
        let quote = self
            .venue
            .get_quote(
                WSOL_MINT,
                token,
                self.trading.probe_amount_lamports,
                self.trading.slippage_bps,
            )
            .await;

        let has_liquidity = quote.map(|q| q.out_amount > 0).unwrap_or(false);
        if has_liquidity {
            info!("✅ {} has liquidity", token);
        } else {
            info!("❌ {} has no liquidity", token);
        }
        has_liquidity
    }

    async fn check_for_rugpull_risks(&self, token: &str) -> RiskReport {
        self.checker.assess(token).await
    }

    async fn execute_buy(&self, token: &str, amount: f64, risks: &[String]) -> SniperResult<Option<String>> {
        if self.gate.decide(token, risks).await == BuyDecision::Abort {
            return Ok(None);
        }

        let payer = self
            .trading
            .wallet_address
            .as_deref()
            .ok_or_else(|| SniperError::Configuration("no wallet_address configured".to_string()))?;
        let lamports = sol_to_lamports(amount)?;

        let quote = self
            .venue
            .get_quote(WSOL_MINT, token, lamports, self.trading.slippage_bps)
            .await
            .ok_or_else(|| SniperError::NotFound(format!("no route for SOL -> {}", token)))?;

        let transaction = self
            .venue
            .get_swap_transaction(&quote, payer)
            .await
            .ok_or_else(|| SniperError::Chain("failed to create swap transaction".to_string()))?;

        info!("🛒 Buying {} with {} SOL ({} out)", token, amount, quote.out_amount);
        match self.sender.sign_and_send(&transaction).await {
            Ok(signature) => {
                info!("🎉 Buy sent for {}: {}", token, signature);
                Ok(Some(signature))
            }
            Err(e) => {
                warn!("❌ Buy of {} failed: {}", token, e);
                Err(e)
            }
        }
    }
}
