// src/config.rs
// Everything the sniper can be tuned with: where to fetch from, what counts
// as a worthwhile pool, what counts as a risky token, and how to buy.
//
// Layers (later wins): built-in defaults, `sniper.toml` (or --config),
// SNIPER__SECTION__KEY environment variables, then the legacy flat
// variables (TELEGRAM_TOKEN, SOLSCAN_API_KEY, ...).

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use config::{Environment, File};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

use crate::error::{SniperError, SniperResult};
use crate::retry::RetryPolicy;
use crate::strategies::buy_gate::ConfirmationPolicy;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub endpoints: EndpointConfig,
    pub discovery: DiscoveryConfig,
    pub risk: RiskConfig,
    pub trading: TradingConfig,
    pub retry: RetryConfig,
    pub telegram: Option<TelegramConfig>,
    pub bsc: BscConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub solana_rpc_url: String,
    pub raydium_api_url: String,
    pub jupiter_api_url: String,
    pub token_list_url: String,
    pub coingecko_url: String,
    pub solscan_api_url: String,
    pub solscan_api_key: Option<String>,
    /// Requests per second allowed against Solscan's public API.
    pub solscan_rate_limit: u32,
    pub http_timeout_secs: u64,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            solana_rpc_url: "https://api.mainnet-beta.solana.com".to_string(),
            raydium_api_url: "https://api-v3.raydium.io".to_string(),
            jupiter_api_url: "https://quote-api.jup.ag/v6".to_string(),
            token_list_url: "https://token.jup.ag/strict".to_string(),
            coingecko_url: "https://api.coingecko.com/api/v3".to_string(),
            solscan_api_url: "https://public-api.solscan.io".to_string(),
            solscan_api_key: None,
            solscan_rate_limit: 2,
            http_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LookbackUnit {
    Minutes,
    Hours,
    Days,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lookback {
    pub value: i64,
    pub unit: LookbackUnit,
}

impl Lookback {
    /// `None` when the window does not fit in a `chrono` duration.
    pub fn try_duration(&self) -> Option<ChronoDuration> {
        match self.unit {
            LookbackUnit::Minutes => ChronoDuration::try_minutes(self.value),
            LookbackUnit::Hours => ChronoDuration::try_hours(self.value),
            LookbackUnit::Days => ChronoDuration::try_days(self.value),
        }
    }

    /// Only call on a validated config.
    pub fn as_duration(&self) -> ChronoDuration {
        self.try_duration().unwrap_or(ChronoDuration::zero())
    }

    /// Oldest creation time still inside the window, if representable.
    pub fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        now.checked_sub_signed(self.try_duration()?)
    }
}

impl Default for Lookback {
    fn default() -> Self {
        Self {
            value: 24,
            unit: LookbackUnit::Hours,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Pools at or above this TVL pass on liquidity alone
    pub min_tvl_usd: f64,
    /// Smaller pools pass only with enough 24h volume
    pub reduced_tvl_floor_usd: f64,
    pub min_volume_24h_usd: f64,
    pub symbol_blocklist: Vec<String>,
    pub spam_address_suffixes: Vec<String>,
    pub lookback: Lookback,
    pub poll_interval_secs: u64,
    pub retry_delay_secs: u64,
    pub page_size: u32,
    pub pages: u32,
    /// "concentrated", "standard" or "all"
    pub pool_type: String,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            min_tvl_usd: 10_000.0,
            reduced_tvl_floor_usd: 2_000.0,
            min_volume_24h_usd: 5_000.0,
            symbol_blocklist: ["test", "scam", "fake", "rug", "honeypot", "airdrop"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            spam_address_suffixes: vec!["pump".to_string()],
            lookback: Lookback::default(),
            poll_interval_secs: 30,
            retry_delay_secs: 10,
            page_size: 100,
            pages: 1,
            pool_type: "all".to_string(),
        }
    }
}

impl DiscoveryConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Raw (base-unit) supply above which the supply is called suspicious
    pub max_raw_supply: u128,
    pub single_holder_pct: f64,
    pub top10_holders_pct: f64,
    pub min_liquidity_usd: f64,
    /// Size of the liquidity depth probe, in lamports
    pub depth_probe_lamports: u64,
    pub lock_burn_pct: f64,
    pub trade_sample_window: usize,
    pub min_unique_trader_ratio: f64,
    pub min_age_hours: i64,
    /// Owner programs treated as verified
    pub verified_programs: Vec<String>,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            max_raw_supply: 1_000_000_000_000_000,
            single_holder_pct: 10.0,
            top10_holders_pct: 50.0,
            min_liquidity_usd: 10_000.0,
            depth_probe_lamports: 1_000_000_000,
            lock_burn_pct: 80.0,
            trade_sample_window: 50,
            min_unique_trader_ratio: 0.2,
            min_age_hours: 24,
            verified_programs: vec![
                "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA".to_string(),
                "TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TradingConfig {
    /// Amount quoted by the liquidity probe, in lamports
    pub probe_amount_lamports: u64,
    pub slippage_bps: u16,
    pub buy_amount_sol: f64,
    pub auto_buy: bool,
    pub confirmation: ConfirmationPolicy,
    pub wallet_address: Option<String>,
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            probe_amount_lamports: 1_000_000,
            slippage_bps: 100,
            buy_amount_sol: 0.1,
            auto_buy: false,
            confirmation: ConfirmationPolicy::Prompt,
            wallet_address: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay_secs: 2,
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_secs(self.delay_secs))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub token: String,
    pub chat_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BscConfig {
    pub rpc_url: String,
    pub bscscan_api_url: String,
    pub bscscan_api_key: Option<String>,
    /// PancakeSwap v2
    pub router: String,
    pub factory: String,
    pub wbnb: String,
    pub wallet_address: Option<String>,
    /// Holders of LP tokens that count as locked liquidity
    pub lockers: Vec<String>,
    pub simulation_amount_wei: u128,
}

impl Default for BscConfig {
    fn default() -> Self {
        Self {
            rpc_url: "https://bsc-dataseed.binance.org/".to_string(),
            bscscan_api_url: "https://api.bscscan.com/api".to_string(),
            bscscan_api_key: None,
            router: "0x10ED43C718714eb63d5aA57B78B54704E256024E".to_string(),
            factory: "0xcA143Ce32Fe78f1f7019d7d551a6402fC5350c73".to_string(),
            wbnb: "0xbb4CdB9CBd36B01bD1cBaEBF2De08d9173bc095c".to_string(),
            wallet_address: None,
            lockers: vec![
                "0x000000000000000000000000000000000000dEaD".to_string(),
                "0x407993575c91ce7643a4d4cCACc9A98c36eE1BBE".to_string(),
                "0xC765bddB93b0D1c1A88282BA0fa6B2d00E3e0c83".to_string(),
            ],
            simulation_amount_wei: 1_000_000_000_000_000,
        }
    }
}

impl Config {
    pub fn load(path: Option<&Path>) -> SniperResult<Self> {
        let mut builder = config::Config::builder();

        match path {
            Some(path) if path.exists() => {
                debug!("Loading configuration from: {:?}", path);
                builder = builder.add_source(File::from(path));
            }
            Some(path) => {
                return Err(SniperError::Configuration(format!(
                    "config file not found: {:?}",
                    path
                )));
            }
            None => {
                builder = builder.add_source(File::with_name("sniper").required(false));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("SNIPER")
                .separator("__")
                .try_parsing(true),
        );

        let mut config: Config = builder.build()?.try_deserialize()?;
        config.apply_legacy_env();
        config.validate()?;

        Ok(config)
    }

    /// Flat variables kept from the first version of the bot.
    fn apply_legacy_env(&mut self) {
        if let Ok(url) = env::var("SOLANA_RPC_URL") {
            self.endpoints.solana_rpc_url = url;
        }
        if let Ok(key) = env::var("SOLSCAN_API_KEY") {
            self.endpoints.solscan_api_key = Some(key);
        }
        if let Ok(wallet) = env::var("WALLET_ADDRESS") {
            self.trading.wallet_address = Some(wallet);
        }
        if let Ok(url) = env::var("BSC_RPC_URL") {
            self.bsc.rpc_url = url;
        }
        if let Ok(key) = env::var("BSCSCAN_API_KEY") {
            self.bsc.bscscan_api_key = Some(key);
        }
        if let Ok(token) = env::var("TELEGRAM_TOKEN") {
            let chat_id = env::var("TELEGRAM_CHAT_ID")
                .ok()
                .and_then(|id| id.parse().ok())
                .or_else(|| self.telegram.as_ref().and_then(|t| t.chat_id));
            self.telegram = Some(TelegramConfig { token, chat_id });
        }
    }

    pub fn validate(&self) -> SniperResult<()> {
        if self.endpoints.solana_rpc_url.trim().is_empty() {
            return Err(SniperError::Configuration(
                "endpoints.solana_rpc_url must be set".to_string(),
            ));
        }
        if self.discovery.lookback.value <= 0 {
            return Err(SniperError::Configuration(
                "discovery.lookback.value must be positive".to_string(),
            ));
        }
        if self.discovery.lookback.cutoff(Utc::now()).is_none() {
            return Err(SniperError::Configuration(format!(
                "discovery.lookback of {} {:?} reaches past the earliest representable time",
                self.discovery.lookback.value, self.discovery.lookback.unit
            )));
        }
        if self.discovery.poll_interval_secs == 0 {
            return Err(SniperError::Configuration(
                "discovery.poll_interval_secs must be at least 1".to_string(),
            ));
        }
        if self.discovery.reduced_tvl_floor_usd > self.discovery.min_tvl_usd {
            warn!(
                "⚠️ Reduced TVL floor (${}) is above the minimum TVL (${}); the volume rule never applies",
                self.discovery.reduced_tvl_floor_usd, self.discovery.min_tvl_usd
            );
        }
        if self.retry.max_attempts == 0 {
            return Err(SniperError::Configuration(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        if let Some(telegram) = &self.telegram {
            if telegram.chat_id.is_none() {
                return Err(SniperError::Configuration(
                    "telegram.chat_id is required when a Telegram token is set".to_string(),
                ));
            }
        }
        if self.trading.auto_buy && self.trading.wallet_address.is_none() {
            return Err(SniperError::Configuration(
                "trading.wallet_address is required when auto_buy is enabled".to_string(),
            ));
        }

        Ok(())
    }
}
