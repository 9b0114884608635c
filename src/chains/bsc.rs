// src/chains/bsc.rs
// PancakeSwap v2 on BNB Smart Chain.

use async_trait::async_trait;
use chrono::Utc;
use ethers::prelude::*;
use ethers::utils::parse_ether;
use log::{info, warn};
use std::sync::Arc;

use super::ChainSniper;
use crate::clients::bscscan::{abi_has_mint, BscScanClient, ContractSource};
use crate::clients::TransactionSender;
use crate::config::BscConfig;
use crate::error::{SniperError, SniperResult};
use crate::models::RiskReport;
use crate::strategies::buy_gate::{BuyDecision, BuyGate};
use crate::utils::is_valid_ethereum_address;

const BSC_CHAIN_ID: u64 = 56;
const SWAP_GAS_LIMIT: u64 = 250_000;
const SWAP_DEADLINE_SECS: i64 = 60;

abigen!(
    PancakeFactory,
    r#"[
        function getPair(address tokenA, address tokenB) external view returns (address pair)
    ]"#,
);

abigen!(
    PancakeRouter,
    r#"[
        function getAmountsOut(uint256 amountIn, address[] path) external view returns (uint256[] amounts)
        function swapExactETHForTokens(uint256 amountOutMin, address[] path, address to, uint256 deadline) external payable returns (uint256[] amounts)
    ]"#,
);

abigen!(
    LiquidityPair,
    r#"[
        function balanceOf(address owner) external view returns (uint256)
        function totalSupply() external view returns (uint256)
    ]"#,
);

abigen!(
    OwnableToken,
    r#"[
        function owner() external view returns (address)
    ]"#,
);

type BscProvider = Provider<Http>;

pub struct BscSniper {
    provider: Arc<BscProvider>,
    factory: PancakeFactory<BscProvider>,
    router: PancakeRouter<BscProvider>,
    wbnb: Address,
    lockers: Vec<Address>,
    explorer: BscScanClient,
    sender: Arc<dyn TransactionSender>,
    gate: BuyGate,
    config: BscConfig,
    lock_pct: f64,
}

fn parse_address(address: &str) -> SniperResult<Address> {
    if !is_valid_ethereum_address(address) {
        return Err(SniperError::InvalidAddress(address.to_string()));
    }
    address
        .parse::<Address>()
        .map_err(|_| SniperError::InvalidAddress(address.to_string()))
}

/// Percent of LP supply held by lockers, `None` on an empty pair.
pub fn locked_share(locked: U256, total_supply: U256) -> Option<f64> {
    if total_supply.is_zero() {
        return None;
    }
    let basis_points = locked.saturating_mul(U256::from(10_000u64)) / total_supply;
    Some(basis_points.low_u64() as f64 / 100.0)
}

impl BscSniper {
    pub fn new(
        config: BscConfig,
        explorer: BscScanClient,
        sender: Arc<dyn TransactionSender>,
        gate: BuyGate,
        lock_pct: f64,
    ) -> SniperResult<Self> {
        let provider = Provider::<Http>::try_from(config.rpc_url.as_str())
            .map_err(|e| SniperError::Configuration(format!("bad BSC RPC url: {}", e)))?;
        let provider = Arc::new(provider);

        let factory = PancakeFactory::new(parse_address(&config.factory)?, provider.clone());
        let router = PancakeRouter::new(parse_address(&config.router)?, provider.clone());
        let wbnb = parse_address(&config.wbnb)?;
        let lockers = config
            .lockers
            .iter()
            .map(|l| parse_address(l))
            .collect::<SniperResult<Vec<_>>>()?;

        Ok(Self {
            provider,
            factory,
            router,
            wbnb,
            lockers,
            explorer,
            sender,
            gate,
            config,
            lock_pct,
        })
    }

    async fn pair_for(&self, token: Address) -> Option<Address> {
        match self.factory.get_pair(token, self.wbnb).call().await {
            Ok(pair) if pair != Address::zero() => Some(pair),
            Ok(_) => None,
            Err(e) => {
                warn!("⚠️ getPair failed for {:?}: {}", token, e);
                None
            }
        }
    }

    async fn simulate_trade(&self, token: Address) -> Result<(), String> {
        let amount = U256::from(self.config.simulation_amount_wei);
        let amounts = self
            .router
            .get_amounts_out(amount, vec![self.wbnb, token])
            .call()
            .await
            .map_err(|e| format!("Trade simulation failed: {}", e))?;

        match amounts.get(1) {
            Some(out) if !out.is_zero() => Ok(()),
            _ => Err("Trade simulation failed: Zero tokens returned".to_string()),
        }
    }

    async fn lp_locked_percent(&self, token: Address) -> Option<f64> {
        let pair = LiquidityPair::new(self.pair_for(token).await?, self.provider.clone());
        let total = pair.total_supply().call().await.ok()?;

        let mut locked = U256::zero();
        for locker in &self.lockers {
            locked = locked.saturating_add(pair.balance_of(*locker).call().await.ok()?);
        }
        locked_share(locked, total)
    }

    async fn try_assess(&self, token: &str) -> SniperResult<RiskReport> {
        let address = parse_address(token)?;
        let mut risks = Vec::new();

        let source = self.explorer.contract_source(token).await;
        if source == Some(ContractSource::Unverified) {
            risks.push("Contract is not verified".to_string());
        }

        let ownable = OwnableToken::new(address, self.provider.clone());
        if let Ok(owner) = ownable.owner().call().await {
            if owner != Address::zero() {
                risks.push("Contract has an owner (potential centralization risk)".to_string());
            }
        }

        if let Some(ContractSource::Verified { abi }) = &source {
            if abi_has_mint(abi) {
                risks.push("Contract has mint function (potential infinite supply risk)".to_string());
            }
        }

        if let Err(reason) = self.simulate_trade(address).await {
            risks.push(format!("Trading might be restricted: {}", reason));
        }

        if let Some(locked) = self.lp_locked_percent(address).await {
            if locked < self.lock_pct {
                risks.push("Liquidity might not be locked".to_string());
            }
        }

        Ok(risks)
    }
}

#[async_trait]
impl ChainSniper for BscSniper {
    fn chain(&self) -> &'static str {
        "bsc"
    }

    async fn check_liquidity(&self, token: &str) -> bool {
        match parse_address(token) {
            Ok(address) => self.pair_for(address).await.is_some(),
            Err(e) => {
                warn!("❌ {}", e);
                false
            }
        }
    }

    async fn check_for_rugpull_risks(&self, token: &str) -> RiskReport {
        match self.try_assess(token).await {
            Ok(risks) => risks,
            Err(e) => vec![format!("Error checking rugpull risks: {}", e)],
        }
    }

    async fn execute_buy(&self, token: &str, amount: f64, risks: &[String]) -> SniperResult<Option<String>> {
        if self.gate.decide(token, risks).await == BuyDecision::Abort {
            return Ok(None);
        }

        let token_address = parse_address(token)?;
        let wallet = self
            .config
            .wallet_address
            .as_deref()
            .ok_or_else(|| SniperError::Configuration("bsc.wallet_address is not set".to_string()))
            .and_then(parse_address)?;
        let value = parse_ether(amount.to_string())
            .map_err(|e| SniperError::Configuration(format!("bad BNB amount {}: {}", amount, e)))?;

        let deadline = U256::from((Utc::now().timestamp() + SWAP_DEADLINE_SECS) as u64);
        let call = self
            .router
            .swap_exact_eth_for_tokens(U256::zero(), vec![self.wbnb, token_address], wallet, deadline)
            .value(value);

        let gas_price = self
            .provider
            .get_gas_price()
            .await
            .map_err(|e| SniperError::TransientNetwork(e.to_string()))?;
        let nonce = self
            .provider
            .get_transaction_count(wallet, None)
            .await
            .map_err(|e| SniperError::TransientNetwork(e.to_string()))?;

        let mut tx = call.tx;
        tx.set_from(wallet);
        tx.set_gas(SWAP_GAS_LIMIT);
        tx.set_gas_price(gas_price);
        tx.set_nonce(nonce);
        tx.set_chain_id(BSC_CHAIN_ID);

        info!("🛒 Buying {} with {} BNB", token, amount);
        let hash = self.sender.sign_and_send(tx.rlp().as_ref()).await?;
        info!("🎉 Buy sent for {}: {}", token, hash);
        Ok(Some(hash))
    }
}
