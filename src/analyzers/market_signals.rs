// src/analyzers/market_signals.rs
use chrono::{DateTime, Duration, Utc};
use log::info;
use std::collections::HashSet;

use crate::cache::WSOL_MINT;
use crate::clients::coingecko::SOLANA_ID;
use crate::clients::{QuoteVenue, ReferencePriceSource};
use crate::models::Trade;
use crate::utils::format_usd_whole;

/// Floor on the price impact (in percent) so a zero-impact quote does not
/// divide by zero.
const MIN_SLIPPAGE_PCT: f64 = 0.01;

/// Pool depth in SOL implied by the price impact of a 1 SOL quote.
pub fn liquidity_sol_from_impact(price_impact_pct: f64) -> f64 {
    let slippage_pct = price_impact_pct * 100.0;
    100.0 / slippage_pct.max(MIN_SLIPPAGE_PCT)
}

/// Quotes `probe_lamports` of SOL into the token and converts the price
/// impact into a USD depth. `None` when either the quote or the SOL
/// price is missing.
pub async fn estimate_liquidity_usd(
    venue: &dyn QuoteVenue,
    prices: &dyn ReferencePriceSource,
    token: &str,
    probe_lamports: u64,
    slippage_bps: u16,
) -> Option<f64> {
    let sol_price = prices.usd_price(SOLANA_ID).await?;
    let quote = venue
        .get_quote(WSOL_MINT, token, probe_lamports, slippage_bps)
        .await?;

    let liquidity_usd = liquidity_sol_from_impact(quote.price_impact_pct) * sol_price;
    info!(
        "💧 {}: impact {:.4}% → ~${:.0} liquidity (SOL ${:.2})",
        token,
        quote.price_impact_pct * 100.0,
        liquidity_usd,
        sol_price
    );
    Some(liquidity_usd)
}

pub fn liquidity_risk(liquidity_usd: f64, floor_usd: f64) -> Option<String> {
    if liquidity_usd < floor_usd {
        Some(format!("Low liquidity (< {} USD)", format_usd_whole(floor_usd)))
    } else {
        None
    }
}

/// Few distinct wallets behind many trades looks like wash trading.
/// Only the first `window` trades (most recent first) that name at least
/// one counterparty are considered.
pub fn is_wash_trading(trades: &[Trade], window: usize, min_unique_ratio: f64) -> bool {
    let sample: Vec<&Trade> = trades
        .iter()
        .filter(|t| t.buyer.is_some() || t.seller.is_some())
        .take(window)
        .collect();
    if sample.is_empty() {
        return false;
    }

    let unique: HashSet<&str> = sample
        .iter()
        .flat_map(|t| [t.buyer.as_deref(), t.seller.as_deref()])
        .flatten()
        .collect();

    (unique.len() as f64) < sample.len() as f64 * min_unique_ratio
}

/// Age implied by the oldest timestamped trade, if any. A page that came
/// back full (`limit` rows) may be cut off before the first trade, so the
/// age is unknown.
pub fn trading_age(trades: &[Trade], limit: usize, now: DateTime<Utc>) -> Option<Duration> {
    if trades.len() >= limit {
        return None;
    }
    trades
        .iter()
        .filter_map(|t| t.block_time)
        .min()
        .map(|oldest| now - oldest)
}
