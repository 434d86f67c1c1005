// Core types for the pool simulator

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single OHLC point derived from one applied trade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
}

impl Candle {
    pub fn new(open: Decimal, close: Decimal) -> Self {
        Self {
            timestamp: Utc::now(),
            open,
            high: open.max(close),
            low: open.min(close),
            close,
        }
    }

    /// Validates that the candle bounds are consistent
    pub fn is_valid(&self) -> bool {
        self.high >= self.open.max(self.close) && self.low <= self.open.min(self.close)
    }
}

/// Pool definition handed to the simulator on discovery or creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedPool {
    /// Paired token mint address (normalized to lowercase internally)
    pub token_mint: String,
    pub token_decimals: u8,
    /// Initial reserves in UI units
    pub reserve_sol: Decimal,
    pub reserve_token: Decimal,
    /// Prior candle history, if any (a pool without one gets a single
    /// candle seeded at its current price)
    #[serde(default)]
    pub candles: Vec<Candle>,
}

/// Read-only view of the simulator state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    pub token_mint: String,
    pub token_decimals: u8,
    pub reserve_sol: Decimal,
    pub reserve_token: Decimal,
    pub price: Decimal,
    pub volume: Decimal,
}

/// Result of applying one trade to the simulator
#[derive(Debug, Clone, PartialEq)]
pub struct TradeUpdate {
    pub price_before: Decimal,
    pub price_after: Decimal,
    pub reserve_sol: Decimal,
    pub reserve_token: Decimal,
    pub volume: Decimal,
}
