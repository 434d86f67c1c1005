//! Constant-product swap quote engine
//!
//! Pure math shared by the pool simulator and any live-quote path: given one
//! side's input amount and the pool reserves, computes the expected output,
//! price impact and slippage-adjusted minimum output under x*y=k with an
//! input-side fee.
//!
//! All arithmetic uses `Decimal`. Assets carry up to 9 decimal places and
//! reserves can differ by many orders of magnitude, which f64 cannot
//! represent faithfully.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Native SOL precision
pub const SOL_DECIMALS: u8 = 9;

/// Reserve snapshot a quote is computed against, in UI units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolReserves {
    pub sol: Decimal,
    pub token: Decimal,
    pub token_decimals: u8,
}

/// Result of a swap quote. Value type: produced fresh per call, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapQuote {
    /// Expected output in UI units of the output asset
    pub estimated_output: Decimal,
    /// Relative deviation of execution price from the pre-trade market price
    pub price_impact_percent: Decimal,
    /// Slippage-adjusted minimum output, in the output asset's smallest unit
    pub min_amount_out: u64,
    /// Realized output-per-input price of this trade
    pub execution_price: Decimal,
}

/// A quote a pool cannot satisfy: zero output, full price impact.
/// Degenerate reserve states produce this instead of an error.
fn unsatisfiable_quote() -> SwapQuote {
    SwapQuote {
        estimated_output: Decimal::ZERO,
        price_impact_percent: dec!(100),
        min_amount_out: 0,
        execution_price: Decimal::ZERO,
    }
}

/// Compute a constant-product swap quote.
///
/// `is_sol_input` orients the trade: true swaps SOL into the paired token,
/// false swaps the token back into SOL. The output asset's decimal precision
/// determines the rounding base of `min_amount_out`.
///
/// Returns `None` only for unusable inputs (non-positive amount, missing
/// reserves). Degenerate pools still produce a zero-output, full-impact
/// quote.
pub fn compute_swap_quote(
    input_amount: Decimal,
    is_sol_input: bool,
    reserves: Option<&PoolReserves>,
    fee_bps: u32,
    slippage_percent: Decimal,
) -> Option<SwapQuote> {
    if input_amount <= Decimal::ZERO {
        return None;
    }
    let reserves = reserves?;

    // Orient reserves by trade direction
    let (reserve_in, reserve_out, output_decimals) = if is_sol_input {
        (reserves.sol, reserves.token, reserves.token_decimals)
    } else {
        (reserves.token, reserves.sol, SOL_DECIMALS)
    };

    // A pool with an empty side cannot satisfy any trade
    if reserve_in <= Decimal::ZERO || reserve_out <= Decimal::ZERO {
        return Some(unsatisfiable_quote());
    }

    // Fee is taken from the input before the invariant applies
    let fee_multiplier = Decimal::from(10_000u32.saturating_sub(fee_bps)) / dec!(10000);
    let amount_in_with_fee = input_amount * fee_multiplier;

    // x*y=k: output = reserve_out - k / (reserve_in + input_after_fee)
    let k = match reserve_in.checked_mul(reserve_out) {
        Some(k) => k,
        None => return Some(unsatisfiable_quote()),
    };
    let new_reserve_out = match k.checked_div(reserve_in + amount_in_with_fee) {
        Some(v) => v,
        None => return Some(unsatisfiable_quote()),
    };
    let estimated_output = reserve_out - new_reserve_out;

    if estimated_output <= Decimal::ZERO {
        return Some(unsatisfiable_quote());
    }

    // Impact: deviation of the realized price from the spot price
    let market_price = reserve_out / reserve_in;
    let execution_price = estimated_output / input_amount;
    let price_impact_percent = if market_price <= Decimal::ZERO {
        dec!(100)
    } else {
        (market_price - execution_price).abs() / market_price * dec!(100)
    };

    let min_amount_out = scale_min_amount_out(estimated_output, slippage_percent, output_decimals);

    Some(SwapQuote {
        estimated_output,
        price_impact_percent,
        min_amount_out,
        execution_price,
    })
}

/// Floor the slippage-adjusted output into the asset's smallest unit
fn scale_min_amount_out(estimated_output: Decimal, slippage_percent: Decimal, decimals: u8) -> u64 {
    let tolerance = Decimal::ONE - slippage_percent / dec!(100);
    if tolerance <= Decimal::ZERO {
        return 0;
    }

    let scale = match 10u64.checked_pow(decimals as u32) {
        Some(s) => Decimal::from(s),
        None => return 0,
    };

    (estimated_output * tolerance * scale)
        .floor()
        .to_u64()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reserves(sol: Decimal, token: Decimal) -> PoolReserves {
        PoolReserves {
            sol,
            token,
            token_decimals: 6,
        }
    }

    #[test]
    fn rejects_non_positive_input() {
        let r = reserves(dec!(10), dec!(1000));
        assert!(compute_swap_quote(Decimal::ZERO, true, Some(&r), 25, dec!(1)).is_none());
        assert!(compute_swap_quote(dec!(-1), true, Some(&r), 25, dec!(1)).is_none());
    }

    #[test]
    fn rejects_missing_reserves() {
        assert!(compute_swap_quote(dec!(1), true, None, 25, dec!(1)).is_none());
    }

    #[test]
    fn degenerate_pool_yields_zero_output_full_impact() {
        let r = reserves(Decimal::ZERO, Decimal::ZERO);
        let quote = compute_swap_quote(dec!(1), true, Some(&r), 25, dec!(1)).unwrap();
        assert_eq!(quote.estimated_output, Decimal::ZERO);
        assert_eq!(quote.price_impact_percent, dec!(100));
        assert_eq!(quote.min_amount_out, 0);

        let r = reserves(Decimal::ZERO, dec!(1000));
        let quote = compute_swap_quote(dec!(1), true, Some(&r), 25, dec!(1)).unwrap();
        assert_eq!(quote.estimated_output, Decimal::ZERO);
    }

    #[test]
    fn worked_scenario_matches_hand_calculation() {
        // 10 SOL / 1000 token pool, 0.25% fee, 1 SOL in:
        // amount_in_with_fee = 0.9975, k = 10000,
        // new_reserve_out = 10000 / 10.9975 ~= 909.30, output ~= 90.70
        let r = reserves(dec!(10), dec!(1000));
        let quote = compute_swap_quote(dec!(1), true, Some(&r), 25, dec!(1)).unwrap();

        assert!(quote.estimated_output > dec!(90.70));
        assert!(quote.estimated_output < dec!(90.71));

        // 1% slippage on ~90.70 token at 6 decimals lands near 89.79 token
        assert!(quote.min_amount_out > 89_790_000);
        assert!(quote.min_amount_out < 89_800_000);

        // Execution price is below spot (100 token/SOL), so impact is positive
        assert!(quote.price_impact_percent > Decimal::ZERO);
        assert!(quote.price_impact_percent < dec!(100));
    }

    #[test]
    fn output_never_drains_opposite_reserve() {
        let r = reserves(dec!(10), dec!(1000));
        for input in [dec!(0.001), dec!(1), dec!(100), dec!(1000000)] {
            let quote = compute_swap_quote(input, true, Some(&r), 25, dec!(1)).unwrap();
            assert!(quote.estimated_output < r.token, "input {}", input);
        }
        for input in [dec!(0.001), dec!(50), dec!(100000)] {
            let quote = compute_swap_quote(input, false, Some(&r), 25, dec!(1)).unwrap();
            assert!(quote.estimated_output < r.sol, "input {}", input);
        }
    }

    #[test]
    fn quote_is_deterministic() {
        let r = reserves(dec!(123.456789), dec!(987654.321));
        let a = compute_swap_quote(dec!(3.21), true, Some(&r), 30, dec!(0.5)).unwrap();
        let b = compute_swap_quote(dec!(3.21), true, Some(&r), 30, dec!(0.5)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn token_to_sol_uses_sol_precision_for_min_out() {
        let r = reserves(dec!(10), dec!(1000));
        // 100 token in at 0 fee, 0 slippage: output just under 1 SOL
        let quote = compute_swap_quote(dec!(100), false, Some(&r), 0, Decimal::ZERO).unwrap();
        let expected_lamports = (quote.estimated_output * dec!(1000000000))
            .floor()
            .to_u64()
            .unwrap();
        assert_eq!(quote.min_amount_out, expected_lamports);
    }

    #[test]
    fn full_slippage_floors_min_out_to_zero() {
        let r = reserves(dec!(10), dec!(1000));
        let quote = compute_swap_quote(dec!(1), true, Some(&r), 25, dec!(100)).unwrap();
        assert_eq!(quote.min_amount_out, 0);
        assert!(quote.estimated_output > Decimal::ZERO);
    }
}
