//! Constant-product pool simulator
//!
//! Maintains a single pool's reserve state, derived price, cumulative volume
//! and a bounded OHLC candle history for environments without a live pool.
//! Trades are applied as reserve deltas by the strategies; the simulator
//! derives price from reserves after each application.
//!
//! `PoolSim` is an explicit service object with its own lifecycle rather than
//! a process-wide global, so tests and multi-pool setups can hold several
//! independent instances.

mod types;

pub use types::{Candle, PoolSnapshot, SeedPool, TradeUpdate};

use crate::errors::PoolError;
use crate::quote::{PoolReserves, SOL_DECIMALS};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::collections::VecDeque;

/// Candle history bound; the oldest point is evicted beyond it
pub const CANDLE_CAPACITY: usize = 100;

struct PoolState {
    token_mint: String,
    token_decimals: u8,
    reserve_sol: Decimal,
    reserve_token: Decimal,
    price: Decimal,
    volume: Decimal,
    candles: VecDeque<Candle>,
}

/// In-memory simulator of one constant-product pool
pub struct PoolSim {
    // Write lock serializes update_after_trade: constant-product math is not
    // interleavable mid-update
    inner: RwLock<Option<PoolState>>,
}

impl PoolSim {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(None),
        }
    }

    /// Replace or clear the active pool.
    ///
    /// The paired token address is normalized to lowercase for later
    /// case-insensitive matching. A pool arriving without candle history is
    /// seeded with exactly one candle at its current price.
    pub fn set_pool(&self, pool: Option<SeedPool>) {
        let mut guard = self.inner.write();

        *guard = pool.map(|p| {
            let price = derive_price(p.reserve_sol, p.reserve_token).unwrap_or(Decimal::ZERO);

            let mut candles: VecDeque<Candle> = p.candles.into_iter().collect();
            if candles.is_empty() {
                candles.push_back(Candle::new(price, price));
            }
            while candles.len() > CANDLE_CAPACITY {
                candles.pop_front();
            }

            PoolState {
                token_mint: p.token_mint.to_lowercase(),
                token_decimals: p.token_decimals,
                reserve_sol: p.reserve_sol,
                reserve_token: p.reserve_token,
                price,
                volume: Decimal::ZERO,
                candles,
            }
        });
    }

    /// Drop the active pool and its history (token/network switch)
    pub fn dispose(&self) {
        *self.inner.write() = None;
    }

    /// Apply one trade's reserve deltas.
    ///
    /// Adds the deltas to the reserves, accumulates `|sol_delta|` into the
    /// volume counter and recomputes the price. A reserve driven to zero or
    /// below is clamped to the smallest representable unit of its asset so
    /// the price stays finite; if the recomputed price is still unusable the
    /// previous price is retained. Every call appends one candle (open =
    /// pre-trade price, close = post-trade price).
    pub fn update_after_trade(
        &self,
        token_delta: Decimal,
        sol_delta: Decimal,
    ) -> Result<TradeUpdate, PoolError> {
        let mut guard = self.inner.write();
        let state = guard.as_mut().ok_or(PoolError::NoPoolSet)?;

        let price_before = state.price;

        state.reserve_sol += sol_delta;
        state.reserve_token += token_delta;

        // Clamp drained reserves to the asset's smallest unit instead of
        // letting the price go negative or divide by zero
        let min_sol = smallest_unit(SOL_DECIMALS);
        let min_token = smallest_unit(state.token_decimals);
        if state.reserve_sol <= Decimal::ZERO {
            state.reserve_sol = min_sol;
        }
        if state.reserve_token <= Decimal::ZERO {
            state.reserve_token = min_token;
        }

        state.volume += sol_delta.abs();

        if let Some(price) = derive_price(state.reserve_sol, state.reserve_token) {
            state.price = price;
        }

        let candle = Candle::new(price_before, state.price);
        state.candles.push_back(candle);
        while state.candles.len() > CANDLE_CAPACITY {
            state.candles.pop_front();
        }

        Ok(TradeUpdate {
            price_before,
            price_after: state.price,
            reserve_sol: state.reserve_sol,
            reserve_token: state.reserve_token,
            volume: state.volume,
        })
    }

    /// Case-insensitive match of a token address against the active pool
    pub fn pool_exists_for_token(&self, token_address: &str) -> bool {
        self.inner
            .read()
            .as_ref()
            .map(|s| s.token_mint.eq_ignore_ascii_case(token_address))
            .unwrap_or(false)
    }

    /// Current derived price, if a pool is set
    pub fn price(&self) -> Option<Decimal> {
        self.inner.read().as_ref().map(|s| s.price)
    }

    /// Reserve view in the shape the quote engine consumes
    pub fn reserves(&self) -> Option<PoolReserves> {
        self.inner.read().as_ref().map(|s| PoolReserves {
            sol: s.reserve_sol,
            token: s.reserve_token,
            token_decimals: s.token_decimals,
        })
    }

    /// Full state snapshot for observers
    pub fn snapshot(&self) -> Option<PoolSnapshot> {
        self.inner.read().as_ref().map(|s| PoolSnapshot {
            token_mint: s.token_mint.clone(),
            token_decimals: s.token_decimals,
            reserve_sol: s.reserve_sol,
            reserve_token: s.reserve_token,
            price: s.price,
            volume: s.volume,
        })
    }

    /// Ordered candle history, oldest first
    pub fn candles(&self) -> Vec<Candle> {
        self.inner
            .read()
            .as_ref()
            .map(|s| s.candles.iter().cloned().collect())
            .unwrap_or_default()
    }
}

impl Default for PoolSim {
    fn default() -> Self {
        Self::new()
    }
}

/// Price = reserve_sol / reserve_token; None when unusable so the caller can
/// retain the previous value
fn derive_price(reserve_sol: Decimal, reserve_token: Decimal) -> Option<Decimal> {
    if reserve_token <= Decimal::ZERO {
        return None;
    }
    match reserve_sol.checked_div(reserve_token) {
        Some(p) if p > Decimal::ZERO => Some(p),
        _ => None,
    }
}

/// 10^-decimals, the smallest representable UI amount of an asset
fn smallest_unit(decimals: u8) -> Decimal {
    Decimal::new(1, decimals as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn seeded_sim() -> PoolSim {
        let sim = PoolSim::new();
        sim.set_pool(Some(SeedPool {
            token_mint: "TokenMintAddress111".to_string(),
            token_decimals: 6,
            reserve_sol: dec!(10),
            reserve_token: dec!(1000),
            candles: vec![],
        }));
        sim
    }

    #[test]
    fn set_pool_seeds_exactly_one_candle() {
        let sim = seeded_sim();
        let candles = sim.candles();
        assert_eq!(candles.len(), 1);
        assert_eq!(candles[0].open, dec!(0.01));
        assert_eq!(candles[0].close, dec!(0.01));
    }

    #[test]
    fn update_without_pool_is_an_error() {
        let sim = PoolSim::new();
        assert!(sim.update_after_trade(dec!(1), dec!(1)).is_err());
    }

    #[test]
    fn trade_moves_reserves_price_and_volume() {
        let sim = seeded_sim();
        // Buy: 1 SOL in, ~90.7 token out
        let update = sim.update_after_trade(dec!(-90.7), dec!(1)).unwrap();
        assert_eq!(update.reserve_sol, dec!(11));
        assert_eq!(update.reserve_token, dec!(909.3));
        assert!(update.price_after > update.price_before);
        assert_eq!(update.volume, dec!(1));

        // Volume accumulates the absolute SOL moved, including sells
        let update = sim.update_after_trade(dec!(50), dec!(-0.5)).unwrap();
        assert_eq!(update.volume, dec!(1.5));
    }

    #[test]
    fn candles_hold_high_low_bounds() {
        let sim = seeded_sim();
        sim.update_after_trade(dec!(-90.7), dec!(1)).unwrap();
        sim.update_after_trade(dec!(95.0), dec!(-1)).unwrap();
        sim.update_after_trade(dec!(-10.0), dec!(0.1)).unwrap();

        for candle in sim.candles() {
            assert!(candle.is_valid(), "candle out of bounds: {:?}", candle);
        }
    }

    #[test]
    fn candle_history_is_bounded_with_oldest_eviction() {
        let sim = seeded_sim();
        for i in 0..150 {
            let delta = if i % 2 == 0 { dec!(-1) } else { dec!(1) };
            sim.update_after_trade(delta, dec!(0.01)).unwrap();
        }
        let candles = sim.candles();
        assert_eq!(candles.len(), CANDLE_CAPACITY);
        // The seeded candle and the earliest trades must be gone
        assert!(candles[0].open != candles[0].close || candles[0].open != dec!(0.01));
    }

    #[test]
    fn draining_token_reserve_clamps_to_smallest_unit() {
        let sim = seeded_sim();
        let update = sim.update_after_trade(dec!(-1000), Decimal::ZERO).unwrap();
        assert_eq!(update.reserve_token, dec!(0.000001));
        assert!(update.price_after > Decimal::ZERO);
    }

    #[test]
    fn draining_sol_reserve_clamps_and_keeps_price_positive() {
        let sim = seeded_sim();
        let update = sim.update_after_trade(Decimal::ZERO, dec!(-10.5)).unwrap();
        assert_eq!(update.reserve_sol, dec!(0.000000001));
        assert!(update.price_after > Decimal::ZERO);
    }

    #[test]
    fn token_match_is_case_insensitive() {
        let sim = seeded_sim();
        assert!(sim.pool_exists_for_token("tokenmintaddress111"));
        assert!(sim.pool_exists_for_token("TOKENMINTADDRESS111"));
        assert!(!sim.pool_exists_for_token("other"));

        sim.dispose();
        assert!(!sim.pool_exists_for_token("tokenmintaddress111"));
    }
}
