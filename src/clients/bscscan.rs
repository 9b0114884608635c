// src/clients/bscscan.rs
use log::warn;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{SniperError, SniperResult};

/// What the explorer knows about a contract's source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractSource {
    Verified { abi: String },
    Unverified,
}

#[derive(Debug, Deserialize)]
struct ExplorerResponse {
    status: String,
    #[serde(default)]
    message: String,
    result: Value,
}

pub struct BscScanClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl BscScanClient {
    pub fn new(client: Client, base_url: &str, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
            api_key,
        }
    }

    /// `None` when the explorer could not be asked.
    pub async fn contract_source(&self, address: &str) -> Option<ContractSource> {
        match self.fetch_abi(address).await {
            Ok(source) => Some(source),
            Err(e) => {
                warn!("⚠️ BscScan lookup for {} failed: {}", address, e);
                None
            }
        }
    }

    async fn fetch_abi(&self, address: &str) -> SniperResult<ContractSource> {
        let mut query = vec![
            ("module", "contract".to_string()),
            ("action", "getabi".to_string()),
            ("address", address.to_string()),
        ];
        if let Some(key) = &self.api_key {
            query.push(("apikey", key.clone()));
        }

        let response = self.client.get(&self.base_url).query(&query).send().await?;
        if !response.status().is_success() {
            return Err(SniperError::TransientNetwork(format!(
                "BscScan error: {}",
                response.status()
            )));
        }
        parse_getabi(response.json().await?)
    }
}

pub(crate) fn parse_getabi(body: Value) -> SniperResult<ContractSource> {
    let response: ExplorerResponse = serde_json::from_value(body)?;
    let result = response.result.as_str().unwrap_or_default();

    if response.status == "1" {
        return Ok(ContractSource::Verified {
            abi: result.to_string(),
        });
    }
    if result.to_lowercase().contains("not verified") {
        return Ok(ContractSource::Unverified);
    }
    // rate limits and bad keys also come back as status 0
    Err(SniperError::malformed(
        "bscscan",
        format!("{}: {}", response.message, result),
    ))
}

/// Any function whose name starts with `mint`.
pub fn abi_has_mint(abi: &str) -> bool {
    serde_json::from_str::<Vec<Value>>(abi)
        .map(|entries| {
            entries.iter().any(|entry| {
                entry.get("type").and_then(Value::as_str) == Some("function")
                    && entry
                        .get("name")
                        .and_then(Value::as_str)
                        .map(|name| name.to_lowercase().starts_with("mint"))
                        .unwrap_or(false)
            })
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn verified_contract_carries_abi() {
        let abi = r#"[{"type":"function","name":"mintTo","inputs":[]}]"#;
        let source = parse_getabi(json!({"status": "1", "message": "OK", "result": abi})).unwrap();
        assert_eq!(source, ContractSource::Verified { abi: abi.to_string() });
        assert!(abi_has_mint(abi));
    }

    #[test]
    fn unverified_contract_is_recognised() {
        let body = json!({
            "status": "0",
            "message": "NOTOK",
            "result": "Contract source code not verified"
        });
        assert_eq!(parse_getabi(body).unwrap(), ContractSource::Unverified);
    }

    #[test]
    fn rate_limit_is_not_a_verdict() {
        let body = json!({"status": "0", "message": "NOTOK", "result": "Max rate limit reached"});
        assert!(parse_getabi(body).is_err());
    }

    #[test]
    fn events_named_mint_do_not_count() {
        let abi = r#"[{"type":"event","name":"Mint"},{"type":"function","name":"transfer"}]"#;
        assert!(!abi_has_mint(abi));
        assert!(!abi_has_mint("not json"));
    }
}
