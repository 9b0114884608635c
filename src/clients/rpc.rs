// src/clients/rpc.rs
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use log::debug;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};

use super::ChainAccess;
use crate::error::{SniperError, SniperResult};
use crate::models::{AccountInfo, TokenSupply};

/// Minimal Solana JSON-RPC client.
pub struct SolanaRpcClient {
    client: Client,
    url: String,
    next_id: AtomicU64,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<Value>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

impl SolanaRpcClient {
    pub fn new(client: Client, url: &str) -> Self {
        Self {
            client,
            url: url.to_string(),
            next_id: AtomicU64::new(1),
        }
    }

    async fn call(&self, method: &str, params: Value) -> SniperResult<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        debug!("📡 RPC {} #{}", method, id);

        let response = self.client.post(&self.url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(SniperError::TransientNetwork(format!(
                "RPC {} returned {}",
                method,
                response.status()
            )));
        }

        let rpc: RpcResponse = response.json().await?;
        if let Some(err) = rpc.error {
            return Err(SniperError::Chain(format!(
                "{} failed ({}): {}",
                method, err.code, err.message
            )));
        }
        Ok(rpc.result.unwrap_or(Value::Null))
    }
}

pub(crate) fn parse_account_info(result: &Value) -> SniperResult<Option<AccountInfo>> {
    let value = match result.get("value") {
        Some(Value::Null) | None => return Ok(None),
        Some(value) => value,
    };

    let owner = value
        .get("owner")
        .and_then(Value::as_str)
        .ok_or_else(|| SniperError::malformed("rpc", "account without owner"))?
        .to_string();

    // ["<base64>", "base64"]
    let encoded = value
        .get("data")
        .and_then(Value::as_array)
        .and_then(|parts| parts.first())
        .and_then(Value::as_str)
        .ok_or_else(|| SniperError::malformed("rpc", "account data is not base64"))?;
    let data = STANDARD
        .decode(encoded)
        .map_err(|e| SniperError::malformed("rpc", e.to_string()))?;

    Ok(Some(AccountInfo { owner, data }))
}

pub(crate) fn parse_token_supply(result: &Value) -> SniperResult<Option<TokenSupply>> {
    let value = match result.get("value") {
        Some(Value::Null) | None => return Ok(None),
        Some(value) => value,
    };

    let amount = value
        .get("amount")
        .and_then(Value::as_str)
        .and_then(|s| s.parse::<u128>().ok())
        .ok_or_else(|| SniperError::malformed("rpc", "supply amount missing"))?;
    let decimals = value
        .get("decimals")
        .and_then(Value::as_u64)
        .unwrap_or(0)
        .min(u8::MAX as u64) as u8;

    Ok(Some(TokenSupply { amount, decimals }))
}

#[async_trait]
impl ChainAccess for SolanaRpcClient {
    async fn get_account_info(&self, address: &str) -> SniperResult<Option<AccountInfo>> {
        let result = self
            .call(
                "getAccountInfo",
                json!([address, { "encoding": "base64", "commitment": "confirmed" }]),
            )
            .await?;
        parse_account_info(&result)
    }

    async fn get_token_supply(&self, mint: &str) -> SniperResult<Option<TokenSupply>> {
        let result = self.call("getTokenSupply", json!([mint])).await?;
        parse_token_supply(&result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_account_data() {
        let result = json!({
            "context": {"slot": 1},
            "value": {
                "owner": "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA",
                "data": [STANDARD.encode([1u8, 2, 3]), "base64"],
                "lamports": 1461600
            }
        });
        let info = parse_account_info(&result).unwrap().unwrap();
        assert_eq!(info.data, vec![1, 2, 3]);
        assert_eq!(info.owner, "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA");
    }

    #[test]
    fn missing_account_is_none() {
        let result = json!({"context": {"slot": 1}, "value": null});
        assert_eq!(parse_account_info(&result).unwrap(), None);
    }

    #[test]
    fn parses_token_supply() {
        let result = json!({
            "value": {"amount": "1000000000000000000", "decimals": 9, "uiAmount": 1e9}
        });
        let supply = parse_token_supply(&result).unwrap().unwrap();
        assert_eq!(supply.amount, 10u128.pow(18));
        assert_eq!(supply.decimals, 9);
    }
}
