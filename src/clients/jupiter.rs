// src/clients/jupiter.rs
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use log::{debug, warn};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{QuoteVenue, TokenListSource};
use crate::error::{SniperError, SniperResult};
use crate::models::{Quote, TokenMetadata};

pub struct JupiterClient {
    client: Client,
    base_url: String,
    token_list_url: String,
}

#[derive(Debug, Deserialize)]
struct SwapResponse {
    #[serde(rename = "swapTransaction")]
    swap_transaction: String,
}

#[derive(Debug, Deserialize)]
struct ListedToken {
    address: String,
    symbol: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    decimals: u8,
}

impl JupiterClient {
    pub fn new(client: Client, base_url: &str, token_list_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token_list_url: token_list_url.to_string(),
        }
    }

    async fn try_token_list(&self) -> SniperResult<Vec<(String, TokenMetadata)>> {
        let response = self.client.get(&self.token_list_url).send().await?;
        if !response.status().is_success() {
            return Err(SniperError::TransientNetwork(format!(
                "token list error: {}",
                response.status()
            )));
        }

        let tokens: Vec<ListedToken> = response.json().await?;
        Ok(tokens
            .into_iter()
            .map(|t| {
                (
                    t.address,
                    TokenMetadata {
                        symbol: t.symbol,
                        name: t.name,
                        decimals: t.decimals,
                    },
                )
            })
            .collect())
    }

    async fn try_quote(
        &self,
        input_mint: &str,
        output_mint: &str,
        amount_in: u64,
        slippage_bps: u16,
    ) -> SniperResult<Quote> {
        let url = format!("{}/quote", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("inputMint", input_mint.to_string()),
                ("outputMint", output_mint.to_string()),
                ("amount", amount_in.to_string()),
                ("slippageBps", slippage_bps.to_string()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SniperError::TransientNetwork(format!(
                "Jupiter quote error: {}",
                response.status()
            )));
        }

        parse_quote(response.json().await?)
    }

    async fn try_swap_transaction(&self, quote: &Quote, payer: &str) -> SniperResult<Vec<u8>> {
        let url = format!("{}/swap", self.base_url);
        let body = json!({
            "quoteResponse": quote.raw,
            "userPublicKey": payer,
            "wrapAndUnwrapSol": true,
        });

        let response = self.client.post(&url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(SniperError::TransientNetwork(format!(
                "Jupiter swap error: {}",
                response.status()
            )));
        }

        let swap: SwapResponse = response.json().await?;
        STANDARD
            .decode(swap.swap_transaction)
            .map_err(|e| SniperError::malformed("jupiter", e.to_string()))
    }
}

/// Jupiter sends amounts and price impact as strings.
pub(crate) fn parse_quote(raw: Value) -> SniperResult<Quote> {
    let out_amount = match raw.get("outAmount") {
        Some(Value::String(s)) => s.parse::<u128>().ok(),
        Some(Value::Number(n)) => n.as_u64().map(u128::from),
        _ => None,
    }
    .ok_or_else(|| SniperError::malformed("jupiter", "missing outAmount"))?;

    let price_impact_pct = match raw.get("priceImpactPct") {
        Some(Value::String(s)) => s.parse::<f64>().unwrap_or(0.0),
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        _ => 0.0,
    };

    Ok(Quote {
        out_amount,
        price_impact_pct,
        raw,
    })
}

#[async_trait]
impl TokenListSource for JupiterClient {
    async fn fetch_token_list(&self) -> SniperResult<Vec<(String, TokenMetadata)>> {
        self.try_token_list().await
    }
}

#[async_trait]
impl QuoteVenue for JupiterClient {
    async fn get_quote(
        &self,
        input_mint: &str,
        output_mint: &str,
        amount_in: u64,
        slippage_bps: u16,
    ) -> Option<Quote> {
        match self
            .try_quote(input_mint, output_mint, amount_in, slippage_bps)
            .await
        {
            Ok(quote) => {
                debug!(
                    "💱 Quote {} -> {}: out={} impact={}",
                    input_mint, output_mint, quote.out_amount, quote.price_impact_pct
                );
                Some(quote)
            }
            Err(e) => {
                warn!("⚠️ No quote for {} -> {}: {}", input_mint, output_mint, e);
                None
            }
        }
    }

    async fn get_swap_transaction(&self, quote: &Quote, payer: &str) -> Option<Vec<u8>> {
        match self.try_swap_transaction(quote, payer).await {
            Ok(tx) => Some(tx),
            Err(e) => {
                warn!("⚠️ Could not build swap transaction: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_string_amounts() {
        let quote = parse_quote(json!({
            "inAmount": "1000000",
            "outAmount": "123456789",
            "priceImpactPct": "0.0125"
        }))
        .unwrap();
        assert_eq!(quote.out_amount, 123_456_789);
        assert_eq!(quote.price_impact_pct, 0.0125);
    }

    #[test]
    fn quote_without_out_amount_is_malformed() {
        assert!(parse_quote(json!({ "error": "no route" })).is_err());
    }

    #[test]
    fn missing_impact_defaults_to_zero() {
        let quote = parse_quote(json!({ "outAmount": 5 })).unwrap();
        assert_eq!(quote.out_amount, 5);
        assert_eq!(quote.price_impact_pct, 0.0);
    }
}
