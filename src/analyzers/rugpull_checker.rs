// src/analyzers/rugpull_checker.rs
// Runs the fixed battery of rugpull checks for one Solana token. Every
// check stands alone: a source that is down just means that check is
// skipped. Only the mint account is reported when it cannot be read.

use chrono::{Duration, Utc};
use log::{debug, info, warn};
use std::sync::Arc;

use super::market_signals::{estimate_liquidity_usd, is_wash_trading, liquidity_risk, trading_age};
use super::mint_account::{parse_mint, MintState};
use crate::clients::{ChainAccess, LiquidityLockSource, QuoteVenue, ReferencePriceSource, TokenActivitySource};
use crate::config::RiskConfig;
use crate::error::{SniperError, SniperResult};
use crate::models::{AccountInfo, HolderShare, RiskReport, TokenSupply};
use crate::retry::{retry, RetryPolicy};
use crate::utils::{format_percent, is_valid_solana_address};

pub const MINT_AUTHORITY_RISK: &str = "Mint authority is enabled (potential infinite supply risk)";
pub const FREEZE_AUTHORITY_RISK: &str = "Freeze authority is enabled (potential trading restriction risk)";
pub const LARGE_SUPPLY_RISK: &str = "Unusually large total supply (potential price manipulation risk)";
pub const METADATA_UNAVAILABLE: &str = "Could not fetch token metadata";
pub const LIQUIDITY_UNLOCKED_RISK: &str = "Liquidity is not locked";
pub const UNVERIFIED_PROGRAM_RISK: &str = "Token program is not verified on Solana Explorer";
pub const SUSPICIOUS_TRADING_RISK: &str = "Suspicious trading patterns detected";

/// Everything the checker talks to.
#[derive(Clone)]
pub struct RiskSources {
    pub chain: Arc<dyn ChainAccess>,
    pub venue: Arc<dyn QuoteVenue>,
    pub activity: Arc<dyn TokenActivitySource>,
    pub prices: Arc<dyn ReferencePriceSource>,
    pub locks: Arc<dyn LiquidityLockSource>,
}

pub struct RugpullChecker {
    sources: RiskSources,
    config: RiskConfig,
    retry: RetryPolicy,
    slippage_bps: u16,
}

impl RugpullChecker {
    pub fn new(sources: RiskSources, config: RiskConfig, retry: RetryPolicy, slippage_bps: u16) -> Self {
        Self {
            sources,
            config,
            retry,
            slippage_bps,
        }
    }

    /// Never fails. An empty report means no check fired.
    pub async fn assess(&self, token: &str) -> RiskReport {
        info!("🔬 Checking rugpull risks for {}", token);
        match self.try_assess(token).await {
            Ok(risks) => {
                info!("📋 {}: {} risk(s) found", token, risks.len());
                risks
            }
            Err(e) => {
                warn!("❌ Risk check for {} failed: {}", token, e);
                vec![format!("Error checking rugpull risks: {}", e)]
            }
        }
    }

    async fn try_assess(&self, token: &str) -> SniperResult<RiskReport> {
        if !is_valid_solana_address(token) {
            return Err(SniperError::InvalidAddress(token.to_string()));
        }

        let mut risks = Vec::new();

        // 1-2. mint account: authorities, supply
        let account = self.mint_account(token).await;
        let mint = account.as_ref().and_then(|info| match parse_mint(&info.data) {
            Ok(mint) => Some(mint),
            Err(e) => {
                warn!("⚠️ {} is not a readable mint: {}", token, e);
                None
            }
        });
        let supply = self.supply(token, mint.as_ref()).await;

        match &mint {
            Some(mint) => {
                if let Some(authority) = &mint.mint_authority {
                    debug!("Mint authority: {}", authority);
                    risks.push(MINT_AUTHORITY_RISK.to_string());
                }
                if let Some(authority) = &mint.freeze_authority {
                    debug!("Freeze authority: {}", authority);
                    risks.push(FREEZE_AUTHORITY_RISK.to_string());
                }
            }
            None => risks.push(METADATA_UNAVAILABLE.to_string()),
        }
        if let Some(supply) = &supply {
            debug!("Total supply of {}: {}", token, supply.ui_amount());
            if supply.amount > self.config.max_raw_supply {
                risks.push(LARGE_SUPPLY_RISK.to_string());
            }
        }

        // 3. holder concentration
        if let Some(holders) = self.sources.activity.top_holders(token).await {
            risks.extend(self.holder_risks(&holders, supply.as_ref()));
        }

        // 4. liquidity depth and lock
        if let Some(liquidity_usd) = estimate_liquidity_usd(
            self.sources.venue.as_ref(),
            self.sources.prices.as_ref(),
            token,
            self.config.depth_probe_lamports,
            self.slippage_bps,
        )
        .await
        {
            risks.extend(liquidity_risk(liquidity_usd, self.config.min_liquidity_usd));
        }
        if let Some(locked_pct) = self.sources.locks.lp_locked_percent(token).await {
            if locked_pct < self.config.lock_burn_pct {
                risks.push(LIQUIDITY_UNLOCKED_RISK.to_string());
            }
        }

        // 5. owner program
        if let Some(info) = &account {
            if !self.config.verified_programs.iter().any(|p| p == &info.owner) {
                risks.push(UNVERIFIED_PROGRAM_RISK.to_string());
            }
        }

        // 6-7. trading history
        let limit = self.config.trade_sample_window * 2;
        if let Some(trades) = self.sources.activity.recent_trades(token, limit).await {
            if is_wash_trading(&trades, self.config.trade_sample_window, self.config.min_unique_trader_ratio) {
                risks.push(SUSPICIOUS_TRADING_RISK.to_string());
            }
            if let Some(age) = trading_age(&trades, limit, Utc::now()) {
                if age < Duration::hours(self.config.min_age_hours) {
                    risks.push(format!("Token is less than {} hours old", self.config.min_age_hours));
                }
            }
        }

        Ok(risks)
    }

    async fn mint_account(&self, token: &str) -> Option<AccountInfo> {
        retry(self.retry, "getAccountInfo", || self.sources.chain.get_account_info(token))
            .await
            .ok()
            .flatten()
    }

    /// The mint layout already carries the supply; only ask the RPC when
    /// the layout could not be read.
    async fn supply(&self, token: &str, mint: Option<&MintState>) -> Option<TokenSupply> {
        if let Some(mint) = mint {
            return Some(TokenSupply {
                amount: u128::from(mint.supply),
                decimals: mint.decimals,
            });
        }
        retry(self.retry, "getTokenSupply", || self.sources.chain.get_token_supply(token))
            .await
            .ok()
            .flatten()
    }

    fn holder_risks(&self, holders: &[HolderShare], supply: Option<&TokenSupply>) -> Vec<String> {
        let mut shares: Vec<f64> = holders
            .iter()
            .filter_map(|h| h.resolved_percentage(supply))
            .collect();
        if shares.is_empty() {
            return Vec::new();
        }
        shares.sort_by(|a, b| b.total_cmp(a));

        let mut risks = Vec::new();
        let largest = shares[0];
        if largest > self.config.single_holder_pct {
            risks.push(format!("Single wallet holds {}% of supply", format_percent(largest)));
        }
        let top10: f64 = shares.iter().take(10).sum();
        if top10 > self.config.top10_holders_pct {
            risks.push(format!("Top 10 wallets hold {}% of supply", format_percent(top10)));
        }
        risks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::mint_account::encode_mint;
    use crate::clients::{
        MockChainAccess, MockLiquidityLockSource, MockQuoteVenue, MockReferencePriceSource,
        MockTokenActivitySource,
    };
    use crate::models::{Quote, Trade};
    use serde_json::Value;
    use std::time::Duration as StdDuration;

    const BONK: &str = "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263";
    const TOKEN_PROGRAM: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";

    fn fast_retry() -> RetryPolicy {
        RetryPolicy::new(3, StdDuration::from_millis(1))
    }

    fn offline_sources() -> RiskSources {
        let mut chain = MockChainAccess::new();
        chain
            .expect_get_account_info()
            .returning(|_| Err(SniperError::TransientNetwork("rpc down".into())));
        chain
            .expect_get_token_supply()
            .returning(|_| Err(SniperError::TransientNetwork("rpc down".into())));
        let mut venue = MockQuoteVenue::new();
        venue.expect_get_quote().returning(|_, _, _, _| None);
        let mut activity = MockTokenActivitySource::new();
        activity.expect_top_holders().returning(|_| None);
        activity.expect_recent_trades().returning(|_, _| None);
        let mut prices = MockReferencePriceSource::new();
        prices.expect_usd_price().returning(|_| None);
        let mut locks = MockLiquidityLockSource::new();
        locks.expect_lp_locked_percent().returning(|_| None);

        RiskSources {
            chain: Arc::new(chain),
            venue: Arc::new(venue),
            activity: Arc::new(activity),
            prices: Arc::new(prices),
            locks: Arc::new(locks),
        }
    }

    fn checker(sources: RiskSources) -> RugpullChecker {
        RugpullChecker::new(sources, RiskConfig::default(), fast_retry(), 100)
    }

    fn healthy_chain(data: Vec<u8>) -> MockChainAccess {
        let mut chain = MockChainAccess::new();
        chain.expect_get_account_info().returning(move |_| {
            Ok(Some(AccountInfo {
                owner: TOKEN_PROGRAM.to_string(),
                data: data.clone(),
            }))
        });
        chain.expect_get_token_supply().never();
        chain
    }

    #[tokio::test]
    async fn offline_assessment_reports_only_the_failure() {
        let risks = checker(offline_sources()).assess(BONK).await;
        assert_eq!(risks, vec![METADATA_UNAVAILABLE.to_string()]);
    }

    #[tokio::test]
    async fn account_lookup_is_retried() {
        let mut sources = offline_sources();
        let mut chain = MockChainAccess::new();
        chain
            .expect_get_account_info()
            .times(3)
            .returning(|_| Err(SniperError::TransientNetwork("timeout".into())));
        chain
            .expect_get_token_supply()
            .times(3)
            .returning(|_| Err(SniperError::TransientNetwork("timeout".into())));
        sources.chain = Arc::new(chain);

        let risks = checker(sources).assess(BONK).await;
        assert_eq!(risks, vec![METADATA_UNAVAILABLE.to_string()]);
    }

    #[tokio::test]
    async fn invalid_address_becomes_a_single_error_string() {
        let risks = checker(offline_sources()).assess("nope").await;
        assert_eq!(risks.len(), 1);
        assert!(risks[0].starts_with("Error checking rugpull risks: "));
    }

    #[tokio::test]
    async fn authorities_and_supply_are_flagged() {
        let mut sources = offline_sources();
        sources.chain = Arc::new(healthy_chain(encode_mint(
            Some([7u8; 32]),
            u64::MAX,
            9,
            Some([8u8; 32]),
        )));

        let risks = checker(sources).assess(BONK).await;
        assert_eq!(
            risks,
            vec![
                MINT_AUTHORITY_RISK.to_string(),
                FREEZE_AUTHORITY_RISK.to_string(),
                LARGE_SUPPLY_RISK.to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn holder_concentration_flags_both_thresholds() {
        let mut sources = offline_sources();
        let mut activity = MockTokenActivitySource::new();
        activity.expect_top_holders().returning(|_| {
            let mut holders = vec![HolderShare::with_percentage("whale", 15.0)];
            holders.extend((0..9).map(|i| HolderShare::with_percentage(&format!("w{}", i), 5.0)));
            Some(holders)
        });
        activity.expect_recent_trades().returning(|_, _| None);
        sources.activity = Arc::new(activity);
        sources.chain = Arc::new(healthy_chain(encode_mint(None, 1_000, 6, None)));

        let risks = checker(sources).assess(BONK).await;
        assert_eq!(
            risks,
            vec![
                "Single wallet holds 15% of supply".to_string(),
                "Top 10 wallets hold 60% of supply".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn raw_holder_balances_resolve_against_mint_supply() {
        let mut sources = offline_sources();
        let mut activity = MockTokenActivitySource::new();
        activity.expect_top_holders().returning(|_| {
            Some(vec![HolderShare {
                owner: "dev".into(),
                percentage: None,
                amount: Some(600),
            }])
        });
        activity.expect_recent_trades().returning(|_, _| None);
        sources.activity = Arc::new(activity);
        sources.chain = Arc::new(healthy_chain(encode_mint(None, 1_000, 0, None)));

        let risks = checker(sources).assess(BONK).await;
        assert_eq!(
            risks,
            vec![
                "Single wallet holds 60% of supply".to_string(),
                "Top 10 wallets hold 60% of supply".to_string(),
            ]
        );
    }

    fn quoting(impact: f64) -> MockQuoteVenue {
        let mut venue = MockQuoteVenue::new();
        venue.expect_get_quote().returning(move |_, _, _, _| {
            Some(Quote {
                out_amount: 1_000_000,
                price_impact_pct: impact,
                raw: Value::Null,
            })
        });
        venue
    }

    fn sol_at(price: f64) -> MockReferencePriceSource {
        let mut prices = MockReferencePriceSource::new();
        prices.expect_usd_price().returning(move |_| Some(price));
        prices
    }

    #[tokio::test]
    async fn thin_and_unlocked_liquidity_is_flagged() {
        let mut sources = offline_sources();
        sources.chain = Arc::new(healthy_chain(encode_mint(None, 1_000, 6, None)));
        // 5% impact → 20 SOL → $4,000
        sources.venue = Arc::new(quoting(0.05));
        sources.prices = Arc::new(sol_at(200.0));
        let mut locks = MockLiquidityLockSource::new();
        locks.expect_lp_locked_percent().returning(|_| Some(10.0));
        sources.locks = Arc::new(locks);

        let risks = checker(sources).assess(BONK).await;
        assert_eq!(
            risks,
            vec![
                "Low liquidity (< $10,000 USD)".to_string(),
                LIQUIDITY_UNLOCKED_RISK.to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn deep_locked_liquidity_is_clean() {
        let mut sources = offline_sources();
        sources.chain = Arc::new(healthy_chain(encode_mint(None, 1_000, 6, None)));
        // 0.4% impact → 250 SOL → $50,000
        sources.venue = Arc::new(quoting(0.004));
        sources.prices = Arc::new(sol_at(200.0));
        let mut locks = MockLiquidityLockSource::new();
        locks.expect_lp_locked_percent().returning(|_| Some(100.0));
        sources.locks = Arc::new(locks);

        assert!(checker(sources).assess(BONK).await.is_empty());
    }

    #[tokio::test]
    async fn unknown_owner_program_is_flagged() {
        let mut sources = offline_sources();
        let data = encode_mint(None, 1_000, 6, None);
        let mut chain = MockChainAccess::new();
        chain.expect_get_account_info().returning(move |_| {
            Ok(Some(AccountInfo {
                owner: "SomeOtherProgram1111111111111111111111111111".to_string(),
                data: data.clone(),
            }))
        });
        sources.chain = Arc::new(chain);

        let risks = checker(sources).assess(BONK).await;
        assert_eq!(risks, vec![UNVERIFIED_PROGRAM_RISK.to_string()]);
    }

    fn trades(total: usize, unique: usize, age: Duration) -> Vec<Trade> {
        let oldest = Utc::now() - age;
        (0..total)
            .map(|i| Trade {
                buyer: Some(format!("wallet{}", i % unique)),
                seller: Some(format!("wallet{}", (i + 1) % unique)),
                block_time: Some(oldest + Duration::seconds(i as i64)),
            })
            .collect()
    }

    #[tokio::test]
    async fn young_wash_traded_token_is_flagged() {
        let mut sources = offline_sources();
        sources.chain = Arc::new(healthy_chain(encode_mint(None, 1_000, 6, None)));
        let mut activity = MockTokenActivitySource::new();
        activity.expect_top_holders().returning(|_| None);
        activity
            .expect_recent_trades()
            .returning(|_, _| Some(trades(50, 8, Duration::hours(3))));
        sources.activity = Arc::new(activity);

        let risks = checker(sources).assess(BONK).await;
        assert_eq!(
            risks,
            vec![
                SUSPICIOUS_TRADING_RISK.to_string(),
                "Token is less than 24 hours old".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn organic_old_token_is_clean() {
        let mut sources = offline_sources();
        sources.chain = Arc::new(healthy_chain(encode_mint(None, 1_000, 6, None)));
        let mut activity = MockTokenActivitySource::new();
        activity.expect_top_holders().returning(|_| None);
        activity
            .expect_recent_trades()
            .returning(|_, _| Some(trades(50, 15, Duration::hours(72))));
        sources.activity = Arc::new(activity);

        assert!(checker(sources).assess(BONK).await.is_empty());
    }

    #[tokio::test]
    async fn busy_token_with_a_full_trade_page_is_not_called_young() {
        let mut sources = offline_sources();
        sources.chain = Arc::new(healthy_chain(encode_mint(None, 1_000, 6, None)));
        let mut activity = MockTokenActivitySource::new();
        activity.expect_top_holders().returning(|_| None);
        activity
            .expect_recent_trades()
            .returning(|_, limit| Some(trades(limit, limit, Duration::hours(1))));
        sources.activity = Arc::new(activity);

        assert!(checker(sources).assess(BONK).await.is_empty());
    }
}
