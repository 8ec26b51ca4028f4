//! Bond pricing and vesting arithmetic.
//!
//! Pure helpers shared by the bond depositories:
//! - debt decay proportional to elapsed time
//! - debt ratio and the debt-derived sale price
//! - payout, fee and per-bond maximum
//! - linear vesting percentages and premature-exit returns
//!
//! Every multi-step computation is `checked_*` and returns `Option`; callers
//! revert on `None` rather than clamping.

use odra::casper_types::U256;

use crate::types::{BPS_SCALE, FEE_SCALE, PRICE_SCALE, RATIO_SCALE};

/// Divisor mapping `bcv * debt_ratio` (9-dec ratio) into `PRICE_SCALE` price
/// units: a bcv of 10_000 at a 1% debt ratio prices at par.
pub const DEBT_PRICE_DIVISOR: u64 = 10_000_000;

/// Decay outstanding debt proportionally to elapsed time.
///
/// Debt fully decays once `elapsed >= vesting_term`; a zero vesting term
/// decays everything immediately.
pub fn decayed_debt(current_debt: U256, last_decay: u64, now: u64, vesting_term: u64) -> U256 {
    let elapsed = now.saturating_sub(last_decay);
    if vesting_term == 0 || elapsed >= vesting_term {
        return U256::zero();
    }
    if elapsed == 0 || current_debt.is_zero() {
        return current_debt;
    }

    // decay = debt * elapsed / vesting_term; bounded by the branch above
    let decay = current_debt * U256::from(elapsed) / U256::from(vesting_term);
    current_debt - decay
}

/// Debt ratio in `RATIO_SCALE` fixed point: `debt * 1e9 / supply`.
///
/// A zero circulating supply has no meaningful ratio and yields `None`.
pub fn debt_ratio(current_debt: U256, total_supply: U256) -> Option<U256> {
    if total_supply.is_zero() {
        return None;
    }
    current_debt
        .checked_mul(U256::from(RATIO_SCALE))
        .and_then(|v| v.checked_div(total_supply))
}

/// Debt-derived sale price: `max(minimum_price, bcv * ratio / 1e7)`.
pub fn price_from_debt_ratio(
    control_variable: U256,
    ratio: U256,
    minimum_price: U256,
) -> Option<U256> {
    let native = control_variable
        .checked_mul(ratio)?
        .checked_div(U256::from(DEBT_PRICE_DIVISOR))?;
    Some(native.max(minimum_price))
}

/// Lowest price allowed against a TWAP market price: the realized discount
/// never exceeds `max_discount_bps`.
pub fn twap_floor(market_price: U256, max_discount_bps: u64) -> Option<U256> {
    if max_discount_bps > BPS_SCALE {
        return None;
    }
    market_price
        .checked_mul(U256::from(BPS_SCALE - max_discount_bps))?
        .checked_div(U256::from(BPS_SCALE))
}

/// HLX payout purchased by `value` at `price` (`PRICE_SCALE` fixed point).
pub fn payout_for(value: U256, price: U256) -> Option<U256> {
    if price.is_zero() {
        return None;
    }
    value
        .checked_mul(U256::from(PRICE_SCALE))
        .and_then(|v| v.checked_div(price))
}

/// Largest single payout: `supply * max_payout / FEE_SCALE`.
pub fn max_payout_for(total_supply: U256, max_payout: U256) -> Option<U256> {
    total_supply
        .checked_mul(max_payout)
        .and_then(|v| v.checked_div(U256::from(FEE_SCALE)))
}

/// DAO fee carved from a payout: `payout * fee / FEE_SCALE`.
pub fn fee_for(payout: U256, fee: U256) -> Option<U256> {
    payout
        .checked_mul(fee)
        .and_then(|v| v.checked_div(U256::from(FEE_SCALE)))
}

/// Vested percentage in `PRICE_SCALE` fixed point, capped at 100%.
///
/// A zero remaining vesting duration is fully vested.
pub fn percent_vested(elapsed: u64, vesting: u64) -> u64 {
    if vesting == 0 || elapsed >= vesting {
        return PRICE_SCALE;
    }
    elapsed * PRICE_SCALE / vesting
}

/// Portion of `payout` released at `percent` (`PRICE_SCALE` fixed point).
pub fn vested_amount(payout: U256, percent: u64) -> Option<U256> {
    payout
        .checked_mul(U256::from(percent))
        .and_then(|v| v.checked_div(U256::from(PRICE_SCALE)))
}

/// Amount returned when a bond is abandoned before full vesting.
pub fn premature_return(remaining_payout: U256, return_rate_bps: u64) -> Option<U256> {
    if return_rate_bps > BPS_SCALE {
        return None;
    }
    remaining_payout
        .checked_mul(U256::from(return_rate_bps))
        .and_then(|v| v.checked_div(U256::from(BPS_SCALE)))
}

/// Integer square root (Babylonian method).
pub fn sqrt(value: U256) -> U256 {
    if value.is_zero() {
        return U256::zero();
    }
    let mut z = value;
    let mut x = value / U256::from(2u64) + U256::from(1u64);
    while x < z {
        z = x;
        x = (value / x + x) / U256::from(2u64);
    }
    z
}
