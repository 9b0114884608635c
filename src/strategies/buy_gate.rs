// src/strategies/buy_gate.rs
// Decides whether a buy may go ahead given a token's risk report. A
// non-empty report never turns into a silent purchase.

use async_trait::async_trait;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::io::{self, BufRead, Write};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationPolicy {
    /// Ask the operator (y/n)
    Prompt,
    AutoAbort,
    /// Buy anyway, logging every risk
    AutoProceed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuyDecision {
    Proceed,
    Abort,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Confirmer: Send + Sync {
    async fn confirm(&self, token: &str, risks: &[String]) -> bool;
}

/// Reads y/n from the terminal.
pub struct StdinConfirmer;

#[async_trait]
impl Confirmer for StdinConfirmer {
    async fn confirm(&self, token: &str, risks: &[String]) -> bool {
        let mut prompt = format!("WARNING! The following risks were detected for {}:\n", token);
        for risk in risks {
            prompt.push_str(&format!("- {}\n", risk));
        }
        prompt.push_str("Do you want to continue? (y/n) ");

        let answer = tokio::task::spawn_blocking(move || {
            let mut stdout = io::stdout();
            let _ = stdout.write_all(prompt.as_bytes());
            let _ = stdout.flush();
            let mut line = String::new();
            io::stdin().lock().read_line(&mut line).map(|_| line)
        })
        .await;

        matches!(answer, Ok(Ok(line)) if line.trim().eq_ignore_ascii_case("y"))
    }
}

pub struct BuyGate {
    policy: ConfirmationPolicy,
    confirmer: Arc<dyn Confirmer>,
}

impl BuyGate {
    pub fn new(policy: ConfirmationPolicy, confirmer: Arc<dyn Confirmer>) -> Self {
        Self { policy, confirmer }
    }

    pub async fn decide(&self, token: &str, risks: &[String]) -> BuyDecision {
        if risks.is_empty() {
            return BuyDecision::Proceed;
        }

        match self.policy {
            ConfirmationPolicy::AutoAbort => {
                info!("🛑 Skipping buy of {}: {} risk(s)", token, risks.len());
                BuyDecision::Abort
            }
            ConfirmationPolicy::AutoProceed => {
                for risk in risks {
                    warn!("⚠️ Buying {} despite: {}", token, risk);
                }
                BuyDecision::Proceed
            }
            ConfirmationPolicy::Prompt => {
                if self.confirmer.confirm(token, risks).await {
                    info!("✅ Operator approved buy of {}", token);
                    BuyDecision::Proceed
                } else {
                    info!("🛑 Operator declined buy of {}", token);
                    BuyDecision::Abort
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn risks() -> Vec<String> {
        vec!["Liquidity is not locked".to_string()]
    }

    fn never_asked() -> Arc<dyn Confirmer> {
        let mut confirmer = MockConfirmer::new();
        confirmer.expect_confirm().never();
        Arc::new(confirmer)
    }

    #[tokio::test]
    async fn clean_report_proceeds_without_asking() {
        let gate = BuyGate::new(ConfirmationPolicy::Prompt, never_asked());
        assert_eq!(gate.decide("Mint", &[]).await, BuyDecision::Proceed);
    }

    #[tokio::test]
    async fn risky_report_follows_policy() {
        let abort = BuyGate::new(ConfirmationPolicy::AutoAbort, never_asked());
        assert_eq!(abort.decide("Mint", &risks()).await, BuyDecision::Abort);

        let proceed = BuyGate::new(ConfirmationPolicy::AutoProceed, never_asked());
        assert_eq!(proceed.decide("Mint", &risks()).await, BuyDecision::Proceed);
    }

    #[tokio::test]
    async fn prompt_asks_the_operator() {
        let mut confirmer = MockConfirmer::new();
        confirmer.expect_confirm().times(1).returning(|_, _| false);
        let gate = BuyGate::new(ConfirmationPolicy::Prompt, Arc::new(confirmer));
        assert_eq!(gate.decide("Mint", &risks()).await, BuyDecision::Abort);

        let mut confirmer = MockConfirmer::new();
        confirmer.expect_confirm().times(1).returning(|_, _| true);
        let gate = BuyGate::new(ConfirmationPolicy::Prompt, Arc::new(confirmer));
        assert_eq!(gate.decide("Mint", &risks()).await, BuyDecision::Proceed);
    }

    #[test]
    fn policy_reads_snake_case() {
        let policy: ConfirmationPolicy = serde_json::from_str("\"auto_abort\"").unwrap();
        assert_eq!(policy, ConfirmationPolicy::AutoAbort);
    }
}
