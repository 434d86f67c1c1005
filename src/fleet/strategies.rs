//! Trading strategies for fleet bots
//!
//! Strategies form a closed, statically enumerated set selected by
//! `StrategyKind`. There is no way to load strategy code at runtime; a bot
//! gets exactly one of the variants below.
//!
//! A strategy is invoked once per tick with at most one concurrent
//! invocation per bot: the ticker awaits the previous tick before sleeping
//! again, so a slow strategy serializes its own ticks.

use super::types::BotWallet;
use crate::pool::PoolSim;
use crate::quote::compute_swap_quote;
use async_trait::async_trait;
use rand::Rng;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Log sink wired into the owning bot's bounded log ring
pub type LogFn = Arc<dyn Fn(&str) + Send + Sync>;

/// Everything a strategy may touch during one tick.
///
/// Strategies read the pool freely but mutate it only through
/// `PoolSim::update_after_trade`.
pub struct StrategyContext {
    pub wallet: BotWallet,
    pub pool: Arc<PoolSim>,
    pub fee_bps: u32,
    pub slippage_percent: Decimal,
    log: LogFn,
}

impl StrategyContext {
    pub fn new(
        wallet: BotWallet,
        pool: Arc<PoolSim>,
        fee_bps: u32,
        slippage_percent: Decimal,
        log: LogFn,
    ) -> Self {
        Self {
            wallet,
            pool,
            fee_bps,
            slippage_percent,
            log,
        }
    }

    pub fn log(&self, message: &str) {
        (self.log)(message);
    }
}

/// One pluggable trading behavior, invoked once per bot tick
#[async_trait]
pub trait Strategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Run one tick. Errors are caught by the registry, recorded in the
    /// bot's log and never stop the ticker.
    async fn tick(&self, ctx: &StrategyContext) -> Result<(), String>;
}

/// Closed set of strategy variants a user can assign to a bot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StrategyKind {
    /// Alternate buys and sells of a randomized SOL-denominated size
    MarketMaker { min_sol: f64, max_sol: f64 },
    /// Random side and random size on every tick
    RandomTrader { min_sol: f64, max_sol: f64 },
    /// Log the pool price, trade nothing (diagnostic)
    Heartbeat,
}

impl StrategyKind {
    pub fn name(&self) -> &'static str {
        match self {
            StrategyKind::MarketMaker { .. } => "market_maker",
            StrategyKind::RandomTrader { .. } => "random_trader",
            StrategyKind::Heartbeat => "heartbeat",
        }
    }

    /// Materialize a fresh strategy instance for one bot
    pub fn build(&self) -> Arc<dyn Strategy> {
        match self {
            StrategyKind::MarketMaker { min_sol, max_sol } => Arc::new(MarketMakerStrategy {
                min_sol: *min_sol,
                max_sol: *max_sol,
                next_is_buy: AtomicBool::new(true),
            }),
            StrategyKind::RandomTrader { min_sol, max_sol } => Arc::new(RandomTraderStrategy {
                min_sol: *min_sol,
                max_sol: *max_sol,
            }),
            StrategyKind::Heartbeat => Arc::new(HeartbeatStrategy),
        }
    }
}

// =============================================================================
// BUILT-IN STRATEGIES
// =============================================================================

struct MarketMakerStrategy {
    min_sol: f64,
    max_sol: f64,
    next_is_buy: AtomicBool,
}

#[async_trait]
impl Strategy for MarketMakerStrategy {
    fn name(&self) -> &'static str {
        "market_maker"
    }

    async fn tick(&self, ctx: &StrategyContext) -> Result<(), String> {
        let is_buy = self.next_is_buy.fetch_xor(true, Ordering::SeqCst);
        let size_sol = random_size_sol(self.min_sol, self.max_sol)?;
        execute_simulated_swap(ctx, is_buy, size_sol)
    }
}

struct RandomTraderStrategy {
    min_sol: f64,
    max_sol: f64,
}

#[async_trait]
impl Strategy for RandomTraderStrategy {
    fn name(&self) -> &'static str {
        "random_trader"
    }

    async fn tick(&self, ctx: &StrategyContext) -> Result<(), String> {
        let is_buy = rand::thread_rng().gen_bool(0.5);
        let size_sol = random_size_sol(self.min_sol, self.max_sol)?;
        execute_simulated_swap(ctx, is_buy, size_sol)
    }
}

struct HeartbeatStrategy;

#[async_trait]
impl Strategy for HeartbeatStrategy {
    fn name(&self) -> &'static str {
        "heartbeat"
    }

    async fn tick(&self, ctx: &StrategyContext) -> Result<(), String> {
        match ctx.pool.price() {
            Some(price) => {
                ctx.log(&format!("pool price {:.12} SOL", price));
                Ok(())
            }
            None => Err("no pool is set".to_string()),
        }
    }
}

// =============================================================================
// SHARED TRADE PATH
// =============================================================================

fn random_size_sol(min_sol: f64, max_sol: f64) -> Result<Decimal, String> {
    if min_sol <= 0.0 || max_sol < min_sol {
        return Err(format!("invalid trade bounds {}..{}", min_sol, max_sol));
    }
    let size = rand::thread_rng().gen_range(min_sol..=max_sol);
    Decimal::from_f64(size)
        .map(|d| d.round_dp(9))
        .ok_or_else(|| format!("unrepresentable trade size {}", size))
}

/// Quote the trade against current reserves, then apply the resulting
/// reserve deltas back into the simulator.
fn execute_simulated_swap(ctx: &StrategyContext, is_buy: bool, size_sol: Decimal) -> Result<(), String> {
    let reserves = ctx.pool.reserves().ok_or("no pool is set")?;

    // Sells are sized in SOL too; convert to token input at the spot price
    let (input_amount, is_sol_input) = if is_buy {
        (size_sol, true)
    } else {
        let price = ctx.pool.price().ok_or("no pool is set")?;
        if price <= Decimal::ZERO {
            return Err("pool price is not positive".to_string());
        }
        (size_sol / price, false)
    };

    let quote = compute_swap_quote(
        input_amount,
        is_sol_input,
        Some(&reserves),
        ctx.fee_bps,
        ctx.slippage_percent,
    )
    .ok_or("quote rejected the trade input")?;

    if quote.estimated_output <= Decimal::ZERO {
        ctx.log("pool cannot satisfy this trade, skipping tick");
        return Ok(());
    }

    let update = if is_buy {
        ctx.pool
            .update_after_trade(-quote.estimated_output, input_amount)
    } else {
        ctx.pool
            .update_after_trade(input_amount, -quote.estimated_output)
    }
    .map_err(|e| e.to_string())?;

    ctx.log(&format!(
        "{} {:.6} SOL -> {:.6} out (impact {:.4}%, min out {}), price {:.12}",
        if is_buy { "buy" } else { "sell" },
        if is_buy { input_amount } else { quote.estimated_output },
        if is_buy { quote.estimated_output } else { input_amount },
        quote.price_impact_percent,
        quote.min_amount_out,
        update.price_after,
    ));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::SeedPool;
    use rust_decimal_macros::dec;
    use solana_sdk::signature::Keypair;

    fn test_ctx(pool: Arc<PoolSim>) -> StrategyContext {
        StrategyContext::new(
            BotWallet::from_keypair(Keypair::new()),
            pool,
            25,
            dec!(1),
            Arc::new(|_msg| {}),
        )
    }

    fn seeded_pool() -> Arc<PoolSim> {
        let pool = Arc::new(PoolSim::new());
        pool.set_pool(Some(SeedPool {
            token_mint: "Mint111".to_string(),
            token_decimals: 6,
            reserve_sol: dec!(10),
            reserve_token: dec!(1000),
            candles: vec![],
        }));
        pool
    }

    #[tokio::test]
    async fn market_maker_alternates_sides() {
        let pool = seeded_pool();
        let ctx = test_ctx(pool.clone());
        let strategy = StrategyKind::MarketMaker {
            min_sol: 0.01,
            max_sol: 0.02,
        }
        .build();

        let sol_before = pool.reserves().unwrap().sol;
        strategy.tick(&ctx).await.unwrap();
        let sol_after_buy = pool.reserves().unwrap().sol;
        assert!(sol_after_buy > sol_before, "first tick buys SOL into the pool");

        strategy.tick(&ctx).await.unwrap();
        let sol_after_sell = pool.reserves().unwrap().sol;
        assert!(sol_after_sell < sol_after_buy, "second tick sells");
    }

    #[tokio::test]
    async fn heartbeat_fails_without_pool() {
        let pool = Arc::new(PoolSim::new());
        let ctx = test_ctx(pool);
        let strategy = StrategyKind::Heartbeat.build();
        assert!(strategy.tick(&ctx).await.is_err());
    }

    #[tokio::test]
    async fn trades_accumulate_pool_volume() {
        let pool = seeded_pool();
        let ctx = test_ctx(pool.clone());
        let strategy = StrategyKind::RandomTrader {
            min_sol: 0.01,
            max_sol: 0.05,
        }
        .build();

        for _ in 0..5 {
            strategy.tick(&ctx).await.unwrap();
        }
        let snapshot = pool.snapshot().unwrap();
        assert!(snapshot.volume > Decimal::ZERO);
        assert!(pool.candles().len() >= 6);
    }

    #[test]
    fn strategy_kind_round_trips_through_serde() {
        let kind = StrategyKind::MarketMaker {
            min_sol: 0.01,
            max_sol: 0.1,
        };
        let json = serde_json::to_string(&kind).unwrap();
        let parsed: StrategyKind = serde_json::from_str(&json).unwrap();
        assert_eq!(kind, parsed);
    }
}
