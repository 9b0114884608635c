// src/scanners/monitor.rs
// The long-running loop: poll, filter, report what is new, sleep. A pool
// id is reported at most once per process.

use anyhow::Result;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use log::{error, info, warn};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::sleep;

use super::new_pools::PoolSource;
use super::pool_filter::PoolFilter;
use crate::cache::TokenMetadataCache;
use crate::chains::ChainSniper;
use crate::config::Config;
use crate::error::SniperError;
use crate::models::PoolRecord;
use crate::telegram::Notifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Idle,
    Polling,
    Evaluating,
    Sleeping,
    Stopped,
}

pub struct PoolMonitor {
    source: Box<dyn PoolSource>,
    filter: PoolFilter,
    sniper: Arc<dyn ChainSniper>,
    notifiers: Vec<Arc<dyn Notifier>>,
    seen: HashSet<String>,
    state: MonitorState,
    lookback: ChronoDuration,
    poll_interval: Duration,
    retry_delay: Duration,
    auto_buy: bool,
    buy_amount: f64,
}

impl PoolMonitor {
    pub fn new(
        config: &Config,
        source: Box<dyn PoolSource>,
        sniper: Arc<dyn ChainSniper>,
        notifiers: Vec<Arc<dyn Notifier>>,
    ) -> Self {
        Self {
            source,
            filter: PoolFilter::new(&config.discovery),
            sniper,
            notifiers,
            seen: HashSet::new(),
            state: MonitorState::Idle,
            lookback: config.discovery.lookback.as_duration(),
            poll_interval: config.discovery.poll_interval(),
            retry_delay: config.discovery.retry_delay(),
            auto_buy: config.trading.auto_buy,
            buy_amount: config.trading.buy_amount_sol,
        }
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    /// Runs until `shutdown` flips to true. Cycle errors are logged and
    /// followed by the retry delay; they never end the loop.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> MonitorState {
        info!(
            "🔍 Monitoring new pools every {:?} (lookback {} min)",
            self.poll_interval,
            self.lookback.num_minutes()
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            self.state = MonitorState::Polling;
            let pause = match self.run_cycle(&shutdown).await {
                Ok(count) => {
                    if count > 0 {
                        info!("✅ Reported {} new pool(s), {} seen so far", count, self.seen.len());
                    }
                    self.poll_interval
                }
                Err(e) => {
                    let transient = e.downcast_ref::<SniperError>().map_or(false, SniperError::is_transient);
                    if transient {
                        warn!("⚠️ Upstream unavailable, retrying in {:?}: {}", self.retry_delay, e);
                    } else {
                        error!("❌ Monitoring cycle failed: {}", e);
                    }
                    self.retry_delay
                }
            };

            if *shutdown.borrow() {
                break;
            }

            self.state = MonitorState::Sleeping;
            tokio::select! {
                _ = sleep(pause) => {}
                changed = shutdown.changed() => {
                    // sender gone: nobody can stop us early any more
                    if changed.is_err() {
                        sleep(pause).await;
                    }
                }
            }
        }

        info!("🛑 Pool monitor stopping ({} pools seen)", self.seen.len());
        self.state = MonitorState::Stopped;
        self.state
    }

    /// One poll: fetch, filter, then evaluate every pool not seen before.
    pub async fn run_cycle(&mut self, shutdown: &watch::Receiver<bool>) -> Result<usize> {
        let candidates = self.source.fetch_candidates().await?;
        let cutoff = Utc::now()
            .checked_sub_signed(self.lookback)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let ranked = self.filter.filter_and_rank(candidates, cutoff);

        self.state = MonitorState::Evaluating;
        let mut reported = 0;
        for pool in ranked {
            if *shutdown.borrow() {
                info!("🛑 Interrupt received, leaving the rest of this batch");
                break;
            }
            // recorded before any side effect so a failure cannot cause a repeat
            if !self.seen.insert(pool.id.clone()) {
                continue;
            }
            self.evaluate(&pool).await;
            reported += 1;
        }

        Ok(reported)
    }

    async fn evaluate(&self, pool: &PoolRecord) {
        info!("🆕 New pool {} ({}) via {}", pool.pair_label(), pool.id, pool.source);

        let targets: Vec<(&str, &str)> = [
            (pool.token_a.as_str(), pool.token_a_symbol.as_str()),
            (pool.token_b.as_str(), pool.token_b_symbol.as_str()),
        ]
        .into_iter()
        .filter(|(mint, _)| !TokenMetadataCache::is_quote_asset(mint))
        .collect();

        let mut risks = Vec::new();
        for (mint, symbol) in &targets {
            let report = self.sniper.check_for_rugpull_risks(mint).await;
            if targets.len() > 1 {
                risks.extend(report.into_iter().map(|r| format!("{}: {}", symbol, r)));
            } else {
                risks.extend(report);
            }
        }

        for notifier in &self.notifiers {
            if let Err(e) = notifier.notify(pool, &risks).await {
                warn!("⚠️ Notification for {} failed: {}", pool.id, e);
            }
        }

        if !self.auto_buy {
            return;
        }
        match targets.as_slice() {
            [(mint, _)] => match self.sniper.execute_buy(mint, self.buy_amount, &risks).await {
                Ok(Some(tx)) => info!("🎉 Bought new token {}! Tx: {}", mint, tx),
                Ok(None) => info!("⏭️ Buy of {} skipped", mint),
                Err(e) => error!("❌ Buy of {} failed: {}", mint, e),
            },
            _ => info!("⏭️ Not auto-buying {}: no single target token", pool.pair_label()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::WSOL_MINT;
    use crate::chains::MockChainSniper;
    use crate::models::{PoolCandidate, PoolKind};
    use crate::scanners::new_pools::MockPoolSource;
    use crate::telegram::MockNotifier;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn candidate(id: &str) -> PoolCandidate {
        PoolCandidate {
            id: id.to_string(),
            kind: PoolKind::ConstantProduct,
            token_a: format!("{}Mint", id),
            token_b: WSOL_MINT.to_string(),
            token_a_symbol: id.to_uppercase(),
            token_b_symbol: "SOL".to_string(),
            liquidity_usd: 50_000.0,
            volume_24h: 10_000.0,
            fee_rate_bps: 25.0,
            price: 1.0,
            created_at: Some(Utc::now() - ChronoDuration::minutes(5)),
            source: "raydium/openTime".to_string(),
            url: String::new(),
        }
    }

    fn quiet_sniper() -> MockChainSniper {
        let mut sniper = MockChainSniper::new();
        sniper.expect_check_for_rugpull_risks().returning(|_| Vec::new());
        sniper.expect_execute_buy().never();
        sniper
    }

    fn counting_notifier(count: Arc<AtomicUsize>) -> MockNotifier {
        let mut notifier = MockNotifier::new();
        notifier.expect_notify().returning(move |_, _| {
            count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        notifier
    }

    fn monitor(source: MockPoolSource, sniper: MockChainSniper, notifier: MockNotifier, config: &Config) -> PoolMonitor {
        PoolMonitor::new(config, Box::new(source), Arc::new(sniper), vec![Arc::new(notifier)])
    }

    #[tokio::test]
    async fn same_pool_is_reported_once() {
        let mut source = MockPoolSource::new();
        source
            .expect_fetch_candidates()
            .returning(|| Ok(vec![candidate("aaa"), candidate("bbb"), candidate("aaa")]));
        let notified = Arc::new(AtomicUsize::new(0));
        let mut monitor = monitor(
            source,
            quiet_sniper(),
            counting_notifier(notified.clone()),
            &Config::default(),
        );
        let (_tx, rx) = watch::channel(false);

        assert_eq!(monitor.run_cycle(&rx).await.unwrap(), 2);
        assert_eq!(monitor.run_cycle(&rx).await.unwrap(), 0);
        assert_eq!(notified.load(Ordering::SeqCst), 2);
        assert_eq!(monitor.seen_count(), 2);
    }

    #[tokio::test]
    async fn lookback_past_the_calendar_keeps_everything() {
        let mut source = MockPoolSource::new();
        source.expect_fetch_candidates().returning(|| Ok(vec![candidate("old")]));
        let notified = Arc::new(AtomicUsize::new(0));
        let mut config = Config::default();
        config.discovery.lookback.value = 200_000_000;
        config.discovery.lookback.unit = crate::config::LookbackUnit::Days;
        let mut monitor = monitor(
            source,
            quiet_sniper(),
            counting_notifier(notified.clone()),
            &config,
        );
        let (_tx, rx) = watch::channel(false);

        assert_eq!(monitor.run_cycle(&rx).await.unwrap(), 1);
        assert_eq!(notified.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn only_the_non_quote_token_is_assessed() {
        let mut source = MockPoolSource::new();
        source.expect_fetch_candidates().returning(|| Ok(vec![candidate("cat")]));
        let mut sniper = MockChainSniper::new();
        sniper
            .expect_check_for_rugpull_risks()
            .withf(|mint| mint.to_string() == "catMint")
            .times(1)
            .returning(|_| vec!["Liquidity is not locked".to_string()]);
        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .withf(|_, risks| risks.len() == 1 && risks[0] == "Liquidity is not locked")
            .times(1)
            .returning(|_, _| Ok(()));

        let mut monitor = monitor(source, sniper, notifier, &Config::default());
        let (_tx, rx) = watch::channel(false);
        assert_eq!(monitor.run_cycle(&rx).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn auto_buy_passes_the_report_to_the_gate() {
        let mut source = MockPoolSource::new();
        source.expect_fetch_candidates().returning(|| Ok(vec![candidate("dog")]));
        let mut sniper = MockChainSniper::new();
        sniper
            .expect_check_for_rugpull_risks()
            .returning(|_| vec!["Token is less than 24 hours old".to_string()]);
        sniper
            .expect_execute_buy()
            .withf(|mint, amount, risks| mint.to_string() == "dogMint" && *amount == 0.1 && risks.len() == 1)
            .times(1)
            .returning(|_, _, _| Ok(None));

        let mut config = Config::default();
        config.trading.auto_buy = true;
        let mut monitor = monitor(source, sniper, counting_notifier(Arc::new(AtomicUsize::new(0))), &config);
        let (_tx, rx) = watch::channel(false);
        assert_eq!(monitor.run_cycle(&rx).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn notifier_failure_does_not_stop_the_batch() {
        let mut source = MockPoolSource::new();
        source
            .expect_fetch_candidates()
            .returning(|| Ok(vec![candidate("one"), candidate("two")]));
        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .times(2)
            .returning(|_, _| Err(SniperError::TransientNetwork("telegram down".into())));

        let mut monitor = monitor(source, quiet_sniper(), notifier, &Config::default());
        let (_tx, rx) = watch::channel(false);
        assert_eq!(monitor.run_cycle(&rx).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn interrupt_before_start_never_polls() {
        let mut source = MockPoolSource::new();
        source.expect_fetch_candidates().never();
        let mut notifier = MockNotifier::new();
        notifier.expect_notify().never();
        let mut monitor = monitor(source, quiet_sniper(), notifier, &Config::default());

        assert_eq!(monitor.state(), MonitorState::Idle);
        let (_tx, rx) = watch::channel(true);
        assert_eq!(monitor.run(rx).await, MonitorState::Stopped);
        assert_eq!(monitor.state(), MonitorState::Stopped);
    }

    #[tokio::test]
    async fn interrupt_wakes_the_sleeping_loop() {
        let mut source = MockPoolSource::new();
        source
            .expect_fetch_candidates()
            .returning(|| Err(SniperError::TransientNetwork("raydium down".into())));
        let mut notifier = MockNotifier::new();
        notifier.expect_notify().never();

        let mut config = Config::default();
        config.discovery.poll_interval_secs = 3_600;
        config.discovery.retry_delay_secs = 3_600;
        let mut monitor = monitor(source, quiet_sniper(), notifier, &config);

        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(async move { monitor.run(rx).await });
        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.send(true).unwrap();

        let state = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("monitor did not stop")
            .unwrap();
        assert_eq!(state, MonitorState::Stopped);
    }
}
