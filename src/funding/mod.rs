//! Randomized multi-hop fund distribution
//!
//! Splits a capital amount across N destination wallets and schedules the
//! transfers so no single batch transaction or fixed cadence correlates
//! them: every share is jittered, every delay is drawn independently, and
//! capital reaches each destination through an intermediate wallet hop.
//!
//! The planner is pure: it takes an injected `Rng` and produces a
//! `FundingPlan` without touching timers or the network, so the split and
//! clamping invariants are testable in isolation. The worker (see
//! [`worker`]) executes plans against a ledger.

pub mod worker;

mod types;

pub use types::{FundingCommand, FundingEvent, FundingPlan, PlannedWallet};

use crate::errors::{ConfigurationError, FundingError, SwarmBotError};
use rand::Rng;
use rust_decimal::Decimal;
use solana_sdk::signature::Keypair;
use std::time::Duration;
use uuid::Uuid;

/// Jitter applied to the even share, in basis points (±10%)
const SHARE_JITTER_BPS: i64 = 1_000;

/// Compute one funding plan.
///
/// The first `wallet_count - 1` shares are the even share perturbed by up to
/// ±10%; the last share is the exact residual, so the Decimal sum of all
/// shares equals `total_sol` exactly. That sum is a hard invariant.
/// Delays are uniform in `delay_bounds_ms` and clamped so the cumulative
/// elapsed time never exceeds `window`.
pub fn plan_funding(
    total_sol: Decimal,
    wallet_count: usize,
    window: Duration,
    delay_bounds_ms: (u64, u64),
    rng: &mut impl Rng,
) -> Result<FundingPlan, SwarmBotError> {
    if total_sol <= Decimal::ZERO {
        return Err(ConfigurationError::InvalidAmount {
            value: total_sol.to_string(),
            reason: "must be positive".to_string(),
        }
        .into());
    }
    if wallet_count == 0 {
        return Err(ConfigurationError::InvalidWalletCount {
            value: wallet_count,
            reason: "must be at least 1".to_string(),
        }
        .into());
    }
    if window.is_zero() {
        return Err(ConfigurationError::InvalidDuration {
            value: "0".to_string(),
            reason: "window must be positive".to_string(),
        }
        .into());
    }
    let (min_delay_ms, max_delay_ms) = delay_bounds_ms;
    if min_delay_ms > max_delay_ms {
        return Err(ConfigurationError::Generic {
            message: format!(
                "delay bounds inverted: {} > {}",
                min_delay_ms, max_delay_ms
            ),
        }
        .into());
    }

    let shares = split_amount(total_sol, wallet_count, rng)?;
    let delays_ms = schedule_delays(wallet_count, window, (min_delay_ms, max_delay_ms), rng);

    let wallets = (0..wallet_count)
        .map(|_| PlannedWallet {
            destination: Keypair::new(),
            intermediate: Keypair::new(),
        })
        .collect();

    Ok(FundingPlan {
        run_id: Uuid::new_v4().to_string(),
        total_sol,
        shares,
        delays_ms,
        wallets,
    })
}

/// Split `total` into `count` shares, last share = exact residual
fn split_amount(
    total: Decimal,
    count: usize,
    rng: &mut impl Rng,
) -> Result<Vec<Decimal>, SwarmBotError> {
    let even_share = total / Decimal::from(count as u64);

    let mut shares = Vec::with_capacity(count);
    let mut allocated = Decimal::ZERO;

    for _ in 0..count.saturating_sub(1) {
        // Jitter in basis points keeps the arithmetic exact in Decimal
        let jitter_bps = rng.gen_range(-SHARE_JITTER_BPS..=SHARE_JITTER_BPS);
        let factor = Decimal::ONE + Decimal::new(jitter_bps, 4);
        let share = (even_share * factor).round_dp(9);
        allocated += share;
        shares.push(share);
    }

    let residual = total - allocated;
    if residual <= Decimal::ZERO {
        return Err(FundingError::ResidualShareDepleted {
            wallet_count: count,
        }
        .into());
    }
    shares.push(residual);

    Ok(shares)
}

/// Draw per-wallet delays, clamping the running total to the window so the
/// last scheduled event never lands outside it
fn schedule_delays(
    count: usize,
    window: Duration,
    (min_delay_ms, max_delay_ms): (u64, u64),
    rng: &mut impl Rng,
) -> Vec<u64> {
    let window_ms = window.as_millis() as u64;
    let mut delays = Vec::with_capacity(count);
    let mut elapsed: u64 = 0;

    for _ in 0..count {
        let mut delay = rng.gen_range(min_delay_ms..=max_delay_ms);
        if elapsed + delay > window_ms {
            delay = window_ms.saturating_sub(elapsed);
        }
        elapsed += delay;
        delays.push(delay);
    }

    delays
}
