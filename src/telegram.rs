// src/telegram.rs
use async_trait::async_trait;
use log::{error, info, warn};
use teloxide::{
    prelude::*,
    types::{ChatId, ParseMode},
    Bot,
};

use crate::error::{SniperError, SniperResult};
use crate::models::PoolRecord;
use crate::utils::{format_number, format_price};

/// Somewhere to report a newly surfaced pool. Failures are logged by the
/// caller and never stop the monitor.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, pool: &PoolRecord, risks: &[String]) -> SniperResult<()>;
}

/// Always on: writes the alert to the log.
pub struct ConsoleNotifier;

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn notify(&self, pool: &PoolRecord, risks: &[String]) -> SniperResult<()> {
        for line in format_pool_alert(pool, risks).lines() {
            info!("{}", line);
        }
        Ok(())
    }
}

pub struct TelegramNotifier {
    bot: Bot,
    chat_id: ChatId,
}

impl TelegramNotifier {
    pub async fn new(token: &str, chat_id: i64) -> SniperResult<Self> {
        let bot = Bot::new(token);

        // Test the bot connection
        match bot.get_me().await {
            Ok(me) => {
                info!("✅ Telegram bot connected: @{}", me.username());
            }
            Err(e) => {
                error!("❌ Failed to connect to Telegram: {}", e);
                return Err(SniperError::Configuration(format!(
                    "Telegram connection failed: {}",
                    e
                )));
            }
        }

        Ok(Self {
            bot,
            chat_id: ChatId(chat_id),
        })
    }

    pub async fn send_startup_message(&self) {
        let message = "🚀 Pool sniper started!\n\n✅ Raydium scanner active\n✅ Risk engine ready";
        if let Err(e) = self
            .bot
            .send_message(self.chat_id, escape_markdown_v2(message))
            .parse_mode(ParseMode::MarkdownV2)
            .await
        {
            warn!("Failed to send startup message: {}", e);
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, pool: &PoolRecord, risks: &[String]) -> SniperResult<()> {
        let message = format_pool_alert(pool, risks);
        self.bot
            .send_message(self.chat_id, escape_markdown_v2(&message))
            .parse_mode(ParseMode::MarkdownV2)
            .await
            .map_err(|e| SniperError::TransientNetwork(format!("Telegram send failed: {}", e)))?;
        Ok(())
    }
}

// Helper function to escape MarkdownV2 special characters
pub fn escape_markdown_v2(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '_' | '*' | '[' | ']' | '(' | ')' | '~' | '`' | '>' | '#' | '+' | '-' | '=' | '|' | '{' | '}' | '.' | '!' => {
                format!("\\{}", c)
            }
            _ => c.to_string(),
        })
        .collect()
}

pub fn format_pool_alert(pool: &PoolRecord, risks: &[String]) -> String {
    let mut message = format!(
        "🆕 NEW POOL DETECTED!\n\n\
         💎 {} ({})\n\
         🔗 {}\n\
         🏊 Pool: {}\n\
         📍 Source: {}\n\n\
         💰 Market Data:\n\
         💵 Price: {}\n\
         💧 Liquidity: ${}\n\
         📈 24h Volume: ${}\n\
         💸 Fee: {:.2} bps\n",
        pool.pair_label(),
        pool.kind,
        pool.url,
        pool.id,
        pool.source,
        format_price(pool.price),
        format_number(pool.liquidity_usd),
        format_number(pool.volume_24h),
        pool.fee_rate_bps,
    );

    if risks.is_empty() {
        message.push_str("\n✅ No risk signals fired\n");
    } else {
        message.push_str(&format!("\n🚨 Risks ({}):\n", risks.len()));
        for risk in risks {
            message.push_str(&format!("• {}\n", risk));
        }
    }

    message.push_str(&format!("\n⏰ Created: {}", pool.created_at.format("%Y-%m-%d %H:%M:%S UTC")));
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PoolKind;
    use chrono::{TimeZone, Utc};

    fn pool() -> PoolRecord {
        PoolRecord {
            id: "PoolId".to_string(),
            kind: PoolKind::ConcentratedLiquidity,
            token_a: "MintA".to_string(),
            token_b: "MintB".to_string(),
            token_a_symbol: "CAT".to_string(),
            token_b_symbol: "SOL".to_string(),
            liquidity_usd: 25_000.0,
            volume_24h: 7_500.0,
            fee_rate_bps: 25.0,
            price: 0.0042,
            created_at: Utc.timestamp_opt(1_750_000_000, 0).single().unwrap(),
            source: "raydium/openTime".to_string(),
            url: "https://dexscreener.com/solana/PoolId".to_string(),
        }
    }

    #[test]
    fn escapes_reserved_characters() {
        assert_eq!(escape_markdown_v2("a.b (c)!"), "a\\.b \\(c\\)\\!");
    }

    #[test]
    fn alert_lists_every_risk() {
        let risks = vec![
            "Liquidity is not locked".to_string(),
            "Token is less than 24 hours old".to_string(),
        ];
        let alert = format_pool_alert(&pool(), &risks);
        assert!(alert.contains("CAT/SOL (CLMM)"));
        assert!(alert.contains("💧 Liquidity: $25.00K"));
        assert!(alert.contains("🚨 Risks (2):"));
        assert!(alert.contains("• Liquidity is not locked"));
        assert!(alert.contains("2025-06-15 15:06:40 UTC"));
    }

    #[test]
    fn clean_alert_says_so() {
        assert!(format_pool_alert(&pool(), &[]).contains("No risk signals fired"));
    }

    #[tokio::test]
    async fn console_notifier_never_fails() {
        assert!(ConsoleNotifier.notify(&pool(), &[]).await.is_ok());
    }
}
