//! Bot fleet scheduler
//!
//! `BotRegistry` runs one independent ticker per managed wallet. Failures
//! are isolated: a strategy error is recorded in that bot's bounded log and
//! never stops the ticker or touches other bots.
//!
//! State machine per bot:
//! Unregistered -> Registered(stopped) -> Running <-> Stopped -> Removed.
//! Only `add_bot` registers, only `remove_bot` removes; running toggles
//! exclusively via `start_bot`/`stop_bot`.
//!
//! Stopping cancels the *next* tick. An in-flight tick always runs to
//! completion, so a log line arriving just after a stop is expected.

pub mod strategies;
mod types;

pub use strategies::{LogFn, Strategy, StrategyContext, StrategyKind};
pub use types::{BotLogEntry, BotSummary, BotWallet, BOT_LOG_CAPACITY};

use crate::errors::StrategyError;
use crate::logger::{self, LogTag};
use crate::pool::PoolSim;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};

/// Fleet-wide defaults applied when a bot is registered without overrides
#[derive(Debug, Clone)]
pub struct FleetDefaults {
    pub tick_interval_ms: u64,
    pub fee_bps: u32,
    pub slippage_percent: Decimal,
    pub strategy: StrategyKind,
}

struct TickerHandle {
    stop: Arc<Notify>,
    stopped: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

struct BotRecord {
    wallet: BotWallet,
    is_running: bool,
    strategy_kind: StrategyKind,
    strategy: Arc<dyn Strategy>,
    interval_ms: u64,
    logs: VecDeque<BotLogEntry>,
    // Owned exclusively by the registry; never live after removal
    ticker: Option<TickerHandle>,
}

type BotMap = Arc<RwLock<HashMap<String, BotRecord>>>;

/// Per-wallet scheduler for pluggable trading strategies
pub struct BotRegistry {
    bots: BotMap,
    pool: Arc<PoolSim>,
    defaults: FleetDefaults,
}

impl BotRegistry {
    pub fn new(pool: Arc<PoolSim>, defaults: FleetDefaults) -> Self {
        Self {
            bots: Arc::new(RwLock::new(HashMap::new())),
            pool,
            defaults,
        }
    }

    /// Register a wallet. Idempotent by address: re-adding an existing bot
    /// is a no-op. Has no side effect on the network.
    pub fn add_bot(
        &self,
        wallet: BotWallet,
        strategy: Option<StrategyKind>,
        interval_ms: Option<u64>,
    ) {
        let mut bots = self.bots.write();
        if bots.contains_key(&wallet.address) {
            return;
        }

        let kind = strategy.unwrap_or_else(|| self.defaults.strategy.clone());
        let address = wallet.address.clone();
        bots.insert(
            address.clone(),
            BotRecord {
                wallet,
                is_running: false,
                strategy: kind.build(),
                strategy_kind: kind,
                interval_ms: interval_ms.unwrap_or(self.defaults.tick_interval_ms),
                logs: VecDeque::new(),
                ticker: None,
            },
        );

        logger::debug(LogTag::Fleet, &format!("registered bot {}", address));
    }

    /// Cancel any active ticker and delete the record. Safe on unknown ids.
    pub fn remove_bot(&self, id: &str) {
        let record = self.bots.write().remove(id);
        if let Some(record) = record {
            if let Some(ticker) = record.ticker {
                signal_stop(&ticker);
            }
            logger::debug(LogTag::Fleet, &format!("removed bot {}", id));
        }
    }

    /// Start a registered bot's ticker. No-op if the id is unknown or the
    /// bot is already running. Optional arguments replace the stored
    /// strategy and interval first.
    pub fn start_bot(&self, id: &str, strategy: Option<StrategyKind>, interval_ms: Option<u64>) {
        let mut bots = self.bots.write();
        let record = match bots.get_mut(id) {
            Some(r) => r,
            None => return,
        };
        if record.is_running {
            return;
        }

        if let Some(kind) = strategy {
            record.strategy = kind.build();
            record.strategy_kind = kind;
        }
        if let Some(ms) = interval_ms {
            record.interval_ms = ms;
        }

        record.is_running = true;

        let stop = Arc::new(Notify::new());
        let stopped = Arc::new(AtomicBool::new(false));
        let task = spawn_ticker(
            self.bots.clone(),
            self.pool.clone(),
            record.wallet.clone(),
            record.strategy.clone(),
            record.interval_ms,
            self.defaults.fee_bps,
            self.defaults.slippage_percent,
            stop.clone(),
            stopped.clone(),
        );

        record.ticker = Some(TickerHandle {
            stop,
            stopped,
            task,
        });

        logger::info(
            LogTag::Fleet,
            &format!(
                "started bot {} ({} every {}ms)",
                id,
                record.strategy.name(),
                record.interval_ms
            ),
        );
    }

    /// Stop a running bot's ticker. The next tick is cancelled; an in-flight
    /// tick finishes on its own. No-op when not running.
    pub fn stop_bot(&self, id: &str) {
        let mut bots = self.bots.write();
        let record = match bots.get_mut(id) {
            Some(r) => r,
            None => return,
        };
        if !record.is_running {
            return;
        }

        record.is_running = false;
        if let Some(ticker) = record.ticker.take() {
            signal_stop(&ticker);
        }

        logger::info(LogTag::Fleet, &format!("stopped bot {}", id));
    }

    /// Prepend a timestamped log entry to a bot's ring. No-op on unknown ids.
    pub fn log(&self, id: &str, message: &str) {
        push_log(&self.bots, id, message, false);
    }

    /// Newest-first snapshot of a bot's log; empty for unknown ids
    pub fn get_logs(&self, id: &str) -> Vec<BotLogEntry> {
        self.bots
            .read()
            .get(id)
            .map(|r| r.logs.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn is_running(&self, id: &str) -> bool {
        self.bots
            .read()
            .get(id)
            .map(|r| r.is_running)
            .unwrap_or(false)
    }

    pub fn list_bots(&self) -> Vec<BotSummary> {
        self.bots
            .read()
            .values()
            .map(|r| BotSummary {
                address: r.wallet.address.clone(),
                is_running: r.is_running,
                strategy: r.strategy_kind.name().to_string(),
                interval_ms: r.interval_ms,
            })
            .collect()
    }

    /// Stop every ticker and wait for the tasks to wind down
    pub async fn dispose(&self) {
        let tickers: Vec<TickerHandle> = {
            let mut bots = self.bots.write();
            bots.values_mut()
                .filter_map(|r| {
                    r.is_running = false;
                    r.ticker.take()
                })
                .collect()
        };

        for ticker in &tickers {
            signal_stop(ticker);
        }
        for ticker in tickers {
            let _ = ticker.task.await;
        }

        logger::info(LogTag::Fleet, "fleet disposed");
    }
}

fn signal_stop(ticker: &TickerHandle) {
    ticker.stopped.store(true, Ordering::SeqCst);
    ticker.stop.notify_one();
}

/// Append to a bot's log ring, newest first, truncated to capacity
fn push_log(bots: &BotMap, id: &str, message: &str, is_error: bool) {
    let mut guard = bots.write();
    if let Some(record) = guard.get_mut(id) {
        record.logs.push_front(BotLogEntry::new(message, is_error));
        record.logs.truncate(BOT_LOG_CAPACITY);
    }
}

#[allow(clippy::too_many_arguments)]
fn spawn_ticker(
    bots: BotMap,
    pool: Arc<PoolSim>,
    wallet: BotWallet,
    strategy: Arc<dyn Strategy>,
    interval_ms: u64,
    fee_bps: u32,
    slippage_percent: Decimal,
    stop: Arc<Notify>,
    stopped: Arc<AtomicBool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let id = wallet.address.clone();

        let log_sink: LogFn = {
            let bots = bots.clone();
            let id = id.clone();
            Arc::new(move |message: &str| push_log(&bots, &id, message, false))
        };

        let ctx = StrategyContext::new(wallet, pool, fee_bps, slippage_percent, log_sink);

        loop {
            tokio::select! {
                _ = stop.notified() => break,
                _ = sleep(Duration::from_millis(interval_ms)) => {}
            }
            if stopped.load(Ordering::SeqCst) {
                break;
            }

            // The tick itself is never raced against the stop signal: an
            // in-flight invocation always settles before the loop re-checks
            if let Err(message) = strategy.tick(&ctx).await {
                let error = StrategyError::TickFailed {
                    bot: id.clone(),
                    message,
                };
                push_log(&bots, &id, &error.to_string(), true);
                logger::debug(LogTag::Fleet, &error.to_string());
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::SeedPool;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use solana_sdk::signature::Keypair;

    struct AlwaysFails;

    #[async_trait]
    impl Strategy for AlwaysFails {
        fn name(&self) -> &'static str {
            "always_fails"
        }

        async fn tick(&self, _ctx: &StrategyContext) -> Result<(), String> {
            Err("boom".to_string())
        }
    }

    struct CountingStrategy;

    #[async_trait]
    impl Strategy for CountingStrategy {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn tick(&self, ctx: &StrategyContext) -> Result<(), String> {
            ctx.log("tick");
            Ok(())
        }
    }

    fn test_registry() -> BotRegistry {
        let pool = Arc::new(PoolSim::new());
        pool.set_pool(Some(SeedPool {
            token_mint: "Mint111".to_string(),
            token_decimals: 6,
            reserve_sol: dec!(10),
            reserve_token: dec!(1000),
            candles: vec![],
        }));
        BotRegistry::new(
            pool,
            FleetDefaults {
                tick_interval_ms: 10,
                fee_bps: 25,
                slippage_percent: dec!(1),
                strategy: StrategyKind::Heartbeat,
            },
        )
    }

    fn test_wallet() -> BotWallet {
        BotWallet::from_keypair(Keypair::new())
    }

    // Swap in a hand-written strategy without going through StrategyKind
    fn install_strategy(registry: &BotRegistry, id: &str, strategy: Arc<dyn Strategy>) {
        let mut bots = registry.bots.write();
        if let Some(record) = bots.get_mut(id) {
            record.strategy = strategy;
        }
    }

    #[tokio::test]
    async fn add_bot_is_idempotent() {
        let registry = test_registry();
        let wallet = test_wallet();
        let id = wallet.address.clone();

        registry.add_bot(wallet.clone(), None, Some(50));
        registry.add_bot(wallet, None, Some(9999));

        let bots = registry.list_bots();
        assert_eq!(bots.len(), 1);
        assert_eq!(bots[0].interval_ms, 50, "second add must not overwrite");
        assert!(!registry.is_running(&id));
    }

    #[tokio::test]
    async fn start_bot_on_unknown_id_is_a_noop() {
        let registry = test_registry();
        registry.start_bot("UnknownAddress", None, None);
        assert!(!registry.is_running("UnknownAddress"));
        assert!(registry.list_bots().is_empty());
        assert!(registry.get_logs("UnknownAddress").is_empty());
    }

    #[tokio::test]
    async fn bots_tick_and_log() {
        let registry = test_registry();
        let wallet = test_wallet();
        let id = wallet.address.clone();

        registry.add_bot(wallet, None, Some(10));
        install_strategy(&registry, &id, Arc::new(CountingStrategy));
        registry.start_bot(&id, None, None);
        assert!(registry.is_running(&id));

        sleep(Duration::from_millis(120)).await;
        registry.stop_bot(&id);

        let logs = registry.get_logs(&id);
        assert!(!logs.is_empty(), "ticks should have produced log entries");
        assert!(logs.iter().all(|l| l.message == "tick"));
    }

    #[tokio::test]
    async fn failing_strategy_keeps_ticking_and_stops_cleanly() {
        let registry = test_registry();
        let wallet = test_wallet();
        let id = wallet.address.clone();

        registry.add_bot(wallet, None, Some(10));
        install_strategy(&registry, &id, Arc::new(AlwaysFails));
        registry.start_bot(&id, None, None);

        sleep(Duration::from_millis(120)).await;
        let logs = registry.get_logs(&id);
        assert!(logs.len() >= 2, "errors must not stop the ticker");
        assert!(logs.iter().all(|l| l.is_error));

        registry.stop_bot(&id);
        assert!(!registry.is_running(&id));

        // No further entries accumulate after the stop settles
        sleep(Duration::from_millis(60)).await;
        let frozen = registry.get_logs(&id).len();
        sleep(Duration::from_millis(60)).await;
        assert_eq!(registry.get_logs(&id).len(), frozen);
    }

    #[tokio::test]
    async fn start_twice_is_a_noop() {
        let registry = test_registry();
        let wallet = test_wallet();
        let id = wallet.address.clone();

        registry.add_bot(wallet, None, Some(10));
        registry.start_bot(&id, None, None);
        registry.start_bot(&id, None, Some(9999));
        assert!(registry.is_running(&id));

        // The second start must not have replaced the interval
        let summary = &registry.list_bots()[0];
        assert_eq!(summary.interval_ms, 10);

        registry.stop_bot(&id);
    }

    #[tokio::test]
    async fn logs_are_newest_first_and_bounded() {
        let registry = test_registry();
        let wallet = test_wallet();
        let id = wallet.address.clone();
        registry.add_bot(wallet, None, None);

        for i in 0..150 {
            registry.log(&id, &format!("entry {}", i));
        }

        let logs = registry.get_logs(&id);
        assert_eq!(logs.len(), BOT_LOG_CAPACITY);
        assert_eq!(logs[0].message, "entry 149", "newest first");
        assert_eq!(
            logs.last().unwrap().message,
            "entry 50",
            "oldest entries evicted"
        );
    }

    #[tokio::test]
    async fn remove_bot_cancels_ticker_and_forgets_logs() {
        let registry = test_registry();
        let wallet = test_wallet();
        let id = wallet.address.clone();

        registry.add_bot(wallet, None, Some(10));
        install_strategy(&registry, &id, Arc::new(CountingStrategy));
        registry.start_bot(&id, None, None);
        sleep(Duration::from_millis(50)).await;

        registry.remove_bot(&id);
        assert!(!registry.is_running(&id));
        assert!(registry.get_logs(&id).is_empty());
        assert!(registry.list_bots().is_empty());

        // Removing again is harmless
        registry.remove_bot(&id);
    }

    #[tokio::test]
    async fn dispose_stops_every_bot() {
        let registry = test_registry();
        let mut ids = Vec::new();
        for _ in 0..3 {
            let wallet = test_wallet();
            ids.push(wallet.address.clone());
            registry.add_bot(wallet, None, Some(10));
        }
        for id in &ids {
            registry.start_bot(id, None, None);
        }

        registry.dispose().await;
        for id in &ids {
            assert!(!registry.is_running(id));
        }
    }
}
