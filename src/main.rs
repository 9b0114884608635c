// src/main.rs
use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use dotenv::dotenv;
use log::{error, info, warn};
use reqwest::Client;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;

use pool_sniper::analyzers::rugpull_checker::{RiskSources, RugpullChecker};
use pool_sniper::cache::{ReferencePriceCache, TokenMetadataCache};
use pool_sniper::chains::solana::SolanaSniper;
use pool_sniper::chains::ChainSniper;
use pool_sniper::clients::coingecko::CoinGeckoClient;
use pool_sniper::clients::jupiter::JupiterClient;
use pool_sniper::clients::raydium::{PoolQuery, RaydiumClient};
use pool_sniper::clients::rpc::SolanaRpcClient;
use pool_sniper::clients::solscan::SolscanClient;
use pool_sniper::clients::{http_client, DryRunSender};
use pool_sniper::config::{Config, TelegramConfig};
use pool_sniper::scanners::monitor::PoolMonitor;
use pool_sniper::scanners::new_pools::PoolScanner;
use pool_sniper::scanners::pool_filter::PoolFilter;
use pool_sniper::strategies::buy_gate::{BuyGate, StdinConfirmer};
use pool_sniper::telegram::{ConsoleNotifier, Notifier, TelegramNotifier};

#[derive(Parser, Debug)]
#[command(version, about = "New pool discovery and rugpull risk scoring for Raydium and PancakeSwap")]
struct Args {
    /// Path to a config file (defaults to ./sniper.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Chain to assess and trade on
    #[arg(long, value_enum, default_value_t = Chain::Solana)]
    chain: Chain,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Poll Raydium for new pools until Ctrl-C
    Monitor,
    /// Run one listing call and print the pools that pass the filter
    Scan {
        /// Only list pools containing this mint
        #[arg(long)]
        mint: Option<String>,
    },
    /// Print the rugpull risk report for a token
    Assess { token: String },
    /// Check whether a token can be bought at all
    Liquidity { token: String },
    /// Assess, confirm, then buy
    Buy { token: String, amount: f64 },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Chain {
    Solana,
    Bsc,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    info!("🚀 Starting Pool Sniper");

    let config = Config::load(args.config.as_deref())?;
    info!("✅ Configuration loaded");

    let http = http_client(&config.endpoints)?;

    match args.command {
        Command::Monitor => {
            if args.chain != Chain::Solana {
                bail!("the monitor only watches Raydium pools; run it with --chain solana");
            }
            run_monitor(&config, http).await
        }
        Command::Scan { mint } => run_scan(&config, http, mint).await,
        Command::Assess { token } => {
            let sniper = build_sniper(&config, &http, args.chain)?;
            let risks = sniper.check_for_rugpull_risks(&token).await;
            if risks.is_empty() {
                info!("✅ No rugpull risks detected for {} on {}", token, sniper.chain());
            } else {
                warn!("🚨 {} risk(s) detected for {}:", risks.len(), token);
                for risk in &risks {
                    warn!("  • {}", risk);
                }
            }
            Ok(())
        }
        Command::Liquidity { token } => {
            let sniper = build_sniper(&config, &http, args.chain)?;
            if !sniper.check_liquidity(&token).await {
                bail!("{} has no liquidity on {}", token, sniper.chain());
            }
            Ok(())
        }
        Command::Buy { token, amount } => {
            let sniper = build_sniper(&config, &http, args.chain)?;
            match sniper.buy_token(&token, amount).await? {
                Some(tx) => info!("🎉 Successfully bought token {}! Transaction: {}", token, tx),
                None => info!("⏭️ Buy of {} aborted", token),
            }
            Ok(())
        }
    }
}

async fn run_monitor(config: &Config, http: Client) -> Result<()> {
    let scanner = pool_scanner(config, &http).await;
    let sniper: Arc<dyn ChainSniper> = Arc::new(solana_sniper(config, &http));
    let notifiers = notifiers(config).await;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("🛑 Ctrl-C received, finishing up");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => error!("❌ Could not listen for Ctrl-C: {}", e),
        }
    });

    let mut monitor = PoolMonitor::new(config, Box::new(scanner), sniper, notifiers);
    info!("🔥 Monitor is running! Press Ctrl-C to stop");
    monitor.run(shutdown_rx).await;
    Ok(())
}

async fn run_scan(config: &Config, http: Client, mint: Option<String>) -> Result<()> {
    let scanner = pool_scanner(config, &http).await;
    let query = PoolQuery {
        mint_a: mint,
        pool_type: config.discovery.pool_type.clone(),
        page_size: config.discovery.page_size,
        ..PoolQuery::default()
    };

    let candidates = scanner.scan_once(&query).await;
    let cutoff = config
        .discovery
        .lookback
        .cutoff(Utc::now())
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    let pools = PoolFilter::new(&config.discovery).filter_and_rank(candidates, cutoff);

    info!("🔍 {} pool(s) passed the filter", pools.len());
    println!("{}", serde_json::to_string_pretty(&pools)?);
    Ok(())
}

async fn pool_scanner(config: &Config, http: &Client) -> PoolScanner {
    let tokens = TokenMetadataCache::bootstrap(&jupiter(config, http), config.retry.policy()).await;
    let raydium = RaydiumClient::new(http.clone(), &config.endpoints.raydium_api_url);
    let scanner = PoolScanner::new(raydium, tokens, &config.discovery);
    info!("📚 {} token symbols available for pool labels", scanner.tokens().len());
    scanner
}

fn jupiter(config: &Config, http: &Client) -> JupiterClient {
    JupiterClient::new(
        http.clone(),
        &config.endpoints.jupiter_api_url,
        &config.endpoints.token_list_url,
    )
}

fn buy_gate(config: &Config) -> BuyGate {
    BuyGate::new(config.trading.confirmation, Arc::new(StdinConfirmer))
}

fn solana_sniper(config: &Config, http: &Client) -> SolanaSniper {
    let endpoints = &config.endpoints;
    let venue = Arc::new(jupiter(config, http));

    let sources = RiskSources {
        chain: Arc::new(SolanaRpcClient::new(http.clone(), &endpoints.solana_rpc_url)),
        venue: venue.clone(),
        activity: Arc::new(SolscanClient::new(
            http.clone(),
            &endpoints.solscan_api_url,
            endpoints.solscan_api_key.clone(),
            endpoints.solscan_rate_limit,
        )),
        prices: Arc::new(CoinGeckoClient::new(
            http.clone(),
            &endpoints.coingecko_url,
            Arc::new(ReferencePriceCache::new()),
        )),
        locks: Arc::new(RaydiumClient::new(http.clone(), &endpoints.raydium_api_url)),
    };

    let checker = RugpullChecker::new(
        sources,
        config.risk.clone(),
        config.retry.policy(),
        config.trading.slippage_bps,
    );

    // no signer is wired in yet; swaps are built and logged only
    SolanaSniper::new(
        checker,
        venue,
        Arc::new(DryRunSender),
        buy_gate(config),
        config.trading.clone(),
    )
}

#[cfg(feature = "bsc")]
fn bsc_sniper(config: &Config, http: &Client) -> Result<pool_sniper::chains::bsc::BscSniper> {
    use pool_sniper::clients::bscscan::BscScanClient;

    let explorer = BscScanClient::new(
        http.clone(),
        &config.bsc.bscscan_api_url,
        config.bsc.bscscan_api_key.clone(),
    );
    Ok(pool_sniper::chains::bsc::BscSniper::new(
        config.bsc.clone(),
        explorer,
        Arc::new(DryRunSender),
        buy_gate(config),
        config.risk.lock_burn_pct,
    )?)
}

fn build_sniper(config: &Config, http: &Client, chain: Chain) -> Result<Arc<dyn ChainSniper>> {
    match chain {
        Chain::Solana => Ok(Arc::new(solana_sniper(config, http))),
        #[cfg(feature = "bsc")]
        Chain::Bsc => Ok(Arc::new(bsc_sniper(config, http)?)),
        #[cfg(not(feature = "bsc"))]
        Chain::Bsc => bail!("BSC support is not compiled in; rebuild with --features bsc"),
    }
}

async fn notifiers(config: &Config) -> Vec<Arc<dyn Notifier>> {
    let mut notifiers: Vec<Arc<dyn Notifier>> = vec![Arc::new(ConsoleNotifier)];

    if let Some(TelegramConfig {
        token,
        chat_id: Some(chat_id),
    }) = &config.telegram
    {
        match TelegramNotifier::new(token, *chat_id).await {
            Ok(telegram) => {
                telegram.send_startup_message().await;
                notifiers.push(Arc::new(telegram));
            }
            Err(e) => warn!("⚠️ Continuing without Telegram alerts: {}", e),
        }
    }

    notifiers
}
