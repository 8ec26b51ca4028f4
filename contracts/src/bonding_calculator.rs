//! Bonding Calculator Contract
//!
//! Values liquidity-pair reserves for the treasury. An LP unit is priced off
//! the pool invariant rather than spot balances, so one-sided swings cannot
//! inflate the valuation: `total_value = 2 * sqrt(k)` with both pool sides
//! normalized to HLX decimals.

use odra::prelude::*;
use odra::casper_types::{U256, RuntimeArgs};
use odra::CallDef;
use crate::bond_math;
use crate::errors::HelixError;
use crate::types::{RESERVE_DECIMALS, TOKEN_DECIMALS};

/// Bonding Calculator Contract
#[odra::module]
pub struct BondingCalculator {
    /// HLX token address (the pool side already in protocol decimals)
    hlx: Var<Address>,
}

#[odra::module]
impl BondingCalculator {
    /// Initialize the calculator
    pub fn init(&mut self, hlx: Address) {
        self.hlx.set(hlx);
    }

    /// Pool invariant with both sides normalized to HLX decimals.
    ///
    /// `reserve0` is the stable side (18 decimals), `reserve1` the HLX side.
    pub fn k_value(&self, pair: Address) -> U256 {
        let (reserve0, reserve1) = self.get_reserves(pair);
        let decimal_gap = U256::from(10u64).pow(U256::from(RESERVE_DECIMALS - TOKEN_DECIMALS));
        let normalized0 = reserve0 / decimal_gap;
        normalized0
            .checked_mul(reserve1)
            .unwrap_or_else(|| self.env().revert(HelixError::ArithmeticFailure))
    }

    /// Invariant-derived value of the whole pool, in HLX units
    pub fn total_value(&self, pair: Address) -> U256 {
        bond_math::sqrt(self.k_value(pair)) * U256::from(2u64)
    }

    /// HLX valuation of `amount` LP units
    pub fn valuation(&self, pair: Address, amount: U256) -> U256 {
        let supply = self.lp_total_supply(pair);
        if supply.is_zero() {
            self.env().revert(HelixError::ArithmeticFailure);
        }
        self.total_value(pair)
            .checked_mul(amount)
            .and_then(|v| v.checked_div(supply))
            .unwrap_or_else(|| self.env().revert(HelixError::ArithmeticFailure))
    }

    /// Get the HLX address
    pub fn get_hlx(&self) -> Option<Address> {
        self.hlx.get()
    }

    // ========== Internal Functions ==========

    fn get_reserves(&self, pair: Address) -> (U256, U256) {
        let call_def = CallDef::new("get_reserves", false, RuntimeArgs::new());
        self.env().call_contract::<(U256, U256)>(pair, call_def)
    }

    fn lp_total_supply(&self, pair: Address) -> U256 {
        let call_def = CallDef::new("total_supply", false, RuntimeArgs::new());
        self.env().call_contract::<U256>(pair, call_def)
    }
}
