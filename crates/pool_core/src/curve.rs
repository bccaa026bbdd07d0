//! Swap pricing curves
//!
//! Constant product (x·y=k), fee on input:
//! - Δin_net = Δin * (1 - fee)
//! - Δout = y0 * Δin_net / (x0 + Δin_net)
//! - x1 = x0 + Δin (the fee stays in the pool), y1 = y0 - Δout
//!
//! Fixed rate (`base_per_native` base units for one native unit):
//! - Base in:   Δout = Δin_net / rate
//! - Native in: Δout = Δin_net * rate
//!
//! All divisions floor, so rounding always favors the pool.

use crate::error::PoolError;
use crate::state::{AssetSide, BPS_SCALE};

/// Pricing policy of a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PricingCurve {
    /// Reserve-dependent price, x·y non-decreasing across every trade
    ConstantProduct,
    /// Fixed exchange rate, value `reserve0 + reserve1 * rate` non-decreasing
    FixedRate { base_per_native: u64 },
}

/// Swap quote against a reserve snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapQuote {
    pub input: AssetSide,
    pub amount_in: u64,
    /// Part of `amount_in` retained as fee
    pub fee: u64,
    pub amount_out: u64,
    /// Input-side reserve after the trade
    pub new_reserve_in: u64,
    /// Output-side reserve after the trade
    pub new_reserve_out: u64,
}

impl PricingCurve {
    /// Curve invariant over (base reserve, native reserve)
    pub fn invariant(&self, reserve0: u64, reserve1: u64) -> u128 {
        match *self {
            PricingCurve::ConstantProduct => u128::from(reserve0) * u128::from(reserve1),
            PricingCurve::FixedRate { base_per_native } => {
                (u128::from(reserve1) * u128::from(base_per_native)).saturating_add(u128::from(reserve0))
            }
        }
    }

    /// Price `amount_in` of `input` against `(reserve_in, reserve_out)`
    pub fn quote(
        &self,
        fee_bps: u16,
        input: AssetSide,
        amount_in: u64,
        reserve_in: u64,
        reserve_out: u64,
    ) -> Result<SwapQuote, PoolError> {
        // Validate inputs
        if amount_in == 0 {
            return Err(PoolError::InvalidInput("swap amount must be positive"));
        }
        if reserve_in == 0 || reserve_out == 0 {
            return Err(PoolError::InsufficientReserve);
        }
        if u64::from(fee_bps) >= BPS_SCALE {
            return Err(PoolError::InvalidInput("fee must be below 10000 bps"));
        }

        let dx = u128::from(amount_in);
        let x0 = u128::from(reserve_in);
        let y0 = u128::from(reserve_out);

        // Fee on input
        let fee = dx * u128::from(fee_bps) / u128::from(BPS_SCALE);
        let dx_net = dx - fee;

        let dy_out = match *self {
            PricingCurve::ConstantProduct => (y0 * dx_net) / (x0 + dx_net),
            PricingCurve::FixedRate { base_per_native } => {
                let rate = u128::from(base_per_native);
                if rate == 0 {
                    return Err(PoolError::InvalidInput("fixed rate must be positive"));
                }
                match input {
                    AssetSide::Base => dx_net / rate,
                    AssetSide::Native => dx_net.saturating_mul(rate),
                }
            }
        };

        if dy_out == 0 {
            return Err(PoolError::InvalidInput("swap output rounds to zero"));
        }
        // Solvency: never pay out the whole reserve
        if dy_out >= y0 {
            return Err(PoolError::InsufficientReserve);
        }

        let new_reserve_in = reserve_in.checked_add(amount_in).ok_or(PoolError::Overflow)?;
        // dy_out < y0 <= u64::MAX
        let amount_out = dy_out as u64;
        let new_reserve_out = reserve_out - amount_out;

        let (before, after) = match input {
            AssetSide::Base => (
                self.invariant(reserve_in, reserve_out),
                self.invariant(new_reserve_in, new_reserve_out),
            ),
            AssetSide::Native => (
                self.invariant(reserve_out, reserve_in),
                self.invariant(new_reserve_out, new_reserve_in),
            ),
        };
        if after < before {
            log::warn!("curve invariant would decrease: {} -> {}", before, after);
            return Err(PoolError::InsufficientReserve);
        }

        Ok(SwapQuote {
            input,
            amount_in,
            fee: fee as u64,
            amount_out,
            new_reserve_in,
            new_reserve_out,
        })
    }
}
