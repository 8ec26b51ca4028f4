//! Bond Depository Contract
//!
//! Sells HLX against a reserve asset at a debt-derived discount. Each deposit
//! escrows its payout under linear vesting; redemption is available per bond
//! index or paged over the depositor's whole book so a caller can drain an
//! arbitrarily large book in bounded slices.
//!
//! One deployed instance per bond variant: variants differ only in the
//! principle asset, the feature fields of `BondTerms` (whitelist, circuit
//! breaker, premature exit) and the pricing kind (pure debt ratio, or debt
//! ratio floored against the TWAP market price).
//!
//! ## Deposit flow
//!
//! 1. Price and limit checks against decayed debt
//! 2. Bond book and debt ledger updated
//! 3. Principle pulled from the caller and forwarded to the treasury, which
//!    mints the payout; the DAO fee is carved from it and the rest stays
//!    escrowed here until vested

use odra::prelude::*;
use odra::casper_types::{U256, RuntimeArgs, runtime_args};
use odra::CallDef;
use crate::bond_math;
use crate::errors::HelixError;
use crate::types::{BondRecord, BondTerms, PricingKind, PRICE_SCALE};

/// Dust floor for a single payout (0.01 HLX)
const MIN_PAYOUT: u64 = 10_000_000;
/// Circuit breaker accounting window
const CIRCUIT_WINDOW: u64 = 3600;

/// Adjustable term selectors for `set_bond_term`
pub const PARAM_VESTING: u8 = 0;
pub const PARAM_MAX_PAYOUT: u8 = 1;
pub const PARAM_FEE: u8 = 2;
pub const PARAM_MAX_DEBT: u8 = 3;
pub const PARAM_MIN_PRICE: u8 = 4;

/// New bond written into the book
#[odra::event]
pub struct BondCreated {
    /// Bond owner
    pub depositor: Address,
    /// Book index
    pub index: u32,
    /// Principle paid in
    pub amount: U256,
    /// HLX owed at full vesting
    pub payout: U256,
    /// Sale price, `PRICE_SCALE` fixed point
    pub price: U256,
}

/// Vested payout released
#[odra::event]
pub struct BondRedeemed {
    /// Bond owner
    pub depositor: Address,
    /// Book index
    pub index: u32,
    /// HLX released
    pub released: U256,
    /// HLX still vesting (0 closes the record)
    pub remaining: U256,
}

/// Bond Depository Contract
#[odra::module(events = [BondCreated, BondRedeemed])]
pub struct BondDepository {
    /// HLX token address
    hlx: Var<Address>,
    /// Reserve asset sold against
    principle: Var<Address>,
    /// Treasury address
    treasury: Var<Address>,
    /// DAO fee recipient
    dao: Var<Address>,
    /// Staking contract for redeem-and-stake
    staking: Var<Option<Address>>,
    /// TWAP oracle for the market-floor pricing kind
    oracle: Var<Option<Address>>,
    /// Oracle pair consulted for the market price
    oracle_pair: Var<Option<Address>>,
    /// Policy address
    policy: Var<Address>,
    /// Pricing strategy for this instance
    pricing: Var<PricingKind>,
    /// Sale terms (None until initialized)
    terms: Var<Option<BondTerms>>,
    /// Bond book: (depositor, index) -> record
    bonds: Mapping<(Address, u32), BondRecord>,
    /// Book length per depositor (closed slots included)
    bond_counts: Mapping<Address, u32>,
    /// Open (non-zero payout) bonds per depositor
    open_bonds: Mapping<Address, u32>,
    /// Outstanding bond debt
    current_debt: Var<U256>,
    /// Last debt decay time
    last_decay: Var<u64>,
    /// Circuit breaker window start
    window_start: Var<u64>,
    /// Payout sold inside the current window
    sold_in_window: Var<U256>,
    /// Lifetime payout sold
    total_sold: Var<U256>,
    /// Deposit whitelist
    whitelist: Mapping<Address, bool>,
    /// Reentrancy latch
    locked: Var<bool>,
}

#[odra::module]
impl BondDepository {
    /// Initialize the depository
    pub fn init(
        &mut self,
        hlx: Address,
        principle: Address,
        treasury: Address,
        dao: Address,
        pricing: PricingKind,
    ) {
        self.hlx.set(hlx);
        self.principle.set(principle);
        self.treasury.set(treasury);
        self.dao.set(dao);
        self.staking.set(None);
        self.oracle.set(None);
        self.oracle_pair.set(None);
        self.policy.set(self.env().caller());
        self.pricing.set(pricing);
        self.terms.set(None);
        self.current_debt.set(U256::zero());
        self.last_decay.set(0);
        self.window_start.set(0);
        self.sold_in_window.set(U256::zero());
        self.total_sold.set(U256::zero());
        self.locked.set(false);
    }

    // ========== Setup (Policy Only) ==========

    /// One-time terms setup
    pub fn initialize_bond_terms(
        &mut self,
        control_variable: U256,
        vesting_term: u64,
        minimum_price: U256,
        max_discount: u64,
        max_payout: U256,
        fee: U256,
        max_debt: U256,
        initial_debt: U256,
        sold_bonds_limit: U256,
        use_whitelist: bool,
        use_circuit_breaker: bool,
        premature_return_rate: u64,
    ) {
        self.require_policy();
        if self.terms.get().flatten().is_some() {
            self.env().revert(HelixError::AlreadyInitialized);
        }
        if vesting_term == 0
            || max_discount > crate::types::BPS_SCALE
            || premature_return_rate > crate::types::BPS_SCALE
            || fee > U256::from(crate::types::FEE_SCALE)
        {
            self.env().revert(HelixError::InvalidParameter);
        }

        self.terms.set(Some(BondTerms {
            control_variable,
            vesting_term,
            minimum_price,
            max_discount,
            max_payout,
            fee,
            max_debt,
            sold_bonds_limit,
            use_whitelist,
            use_circuit_breaker,
            premature_return_rate,
        }));
        self.current_debt.set(initial_debt);
        self.last_decay.set(self.env().get_block_time());
        self.window_start.set(self.env().get_block_time());
    }

    /// Adjust one term after initialization
    pub fn set_bond_term(&mut self, parameter: u8, input: U256) {
        self.require_policy();
        let mut terms = self.require_terms();
        match parameter {
            PARAM_VESTING => {
                if input.is_zero() {
                    self.env().revert(HelixError::InvalidParameter);
                }
                terms.vesting_term = input.as_u64();
            }
            PARAM_MAX_PAYOUT => terms.max_payout = input,
            PARAM_FEE => {
                if input > U256::from(crate::types::FEE_SCALE) {
                    self.env().revert(HelixError::InvalidParameter);
                }
                terms.fee = input;
            }
            PARAM_MAX_DEBT => terms.max_debt = input,
            PARAM_MIN_PRICE => terms.minimum_price = input,
            _ => self.env().revert(HelixError::InvalidParameter),
        }
        self.terms.set(Some(terms));
    }

    /// Wire the staking contract for redeem-and-stake
    pub fn set_staking(&mut self, staking: Address) {
        self.require_policy();
        self.staking.set(Some(staking));
    }

    /// Wire the TWAP oracle and pair for the market-floor pricing kind
    pub fn set_oracle(&mut self, oracle: Address, pair: Address) {
        self.require_policy();
        self.oracle.set(Some(oracle));
        self.oracle_pair.set(Some(pair));
    }

    /// Add or remove a whitelisted depositor
    pub fn modify_whitelist(&mut self, account: Address, approved: bool) {
        self.require_policy();
        self.whitelist.set(&account, approved);
    }

    // ========== Deposit ==========

    /// Buy a bond: pay `amount` of principle, receive a vesting payout.
    ///
    /// `max_price` bounds the accepted sale price against movement between
    /// quote and execution.
    pub fn deposit(&mut self, amount: U256, max_price: U256, depositor: Address) -> U256 {
        self.enter();
        let terms = self.require_terms();

        if amount.is_zero() {
            self.env().revert(HelixError::ZeroAmount);
        }
        let caller = self.env().caller();
        if terms.use_whitelist && !self.whitelist.get(&caller).unwrap_or(false) {
            self.env().revert(HelixError::NotWhitelisted);
        }

        let now = self.env().get_block_time();
        self.decay_debt(&terms, now);

        let price = self.compute_price(&terms);
        if price > max_price {
            self.env().revert(HelixError::SlippageExceeded);
        }

        let value = self.treasury_value_of(amount);
        let payout = match bond_math::payout_for(value, price) {
            Some(payout) => payout,
            None => self.env().revert(HelixError::ArithmeticFailure),
        };
        if payout < U256::from(MIN_PAYOUT) {
            self.env().revert(HelixError::PayoutTooSmall);
        }
        let supply = self.hlx_total_supply();
        let max_single = match bond_math::max_payout_for(supply, terms.max_payout) {
            Some(max_single) => max_single,
            None => self.env().revert(HelixError::ArithmeticFailure),
        };
        if payout > max_single {
            self.env().revert(HelixError::PayoutTooLarge);
        }

        let debt = self.current_debt.get().unwrap_or(U256::zero());
        if debt + payout > terms.max_debt {
            self.env().revert(HelixError::MaxDebtExceeded);
        }

        if terms.use_circuit_breaker {
            self.roll_circuit_window(now);
            let sold = self.sold_in_window.get().unwrap_or(U256::zero());
            if sold + payout > terms.sold_bonds_limit {
                self.env().revert(HelixError::CircuitBreakerTripped);
            }
            self.sold_in_window.set(sold + payout);
        }

        // the DAO fee is carved out of the payout, so the mint never exceeds
        // the deposit's backing value; selling below backing fails closed
        let fee = match bond_math::fee_for(payout, terms.fee) {
            Some(fee) => fee,
            None => self.env().revert(HelixError::ArithmeticFailure),
        };
        if payout > value {
            self.env().revert(HelixError::InvalidParameter);
        }
        let profit = value - payout;
        let vested_payout = payout - fee;

        // effects before interactions
        let index = self.bond_counts.get(&depositor).unwrap_or(0);
        self.bonds.set(
            &(depositor, index),
            BondRecord {
                payout: vested_payout,
                vesting: terms.vesting_term,
                last_time: now,
                price_paid: price,
            },
        );
        self.bond_counts.set(&depositor, index + 1);
        self.open_bonds.set(
            &depositor,
            self.open_bonds.get(&depositor).unwrap_or(0) + 1,
        );
        self.current_debt.set(debt + payout);
        self.total_sold
            .set(self.total_sold.get().unwrap_or(U256::zero()) + payout);

        self.pull_principle(caller, amount);
        self.deposit_to_treasury(amount, profit);
        if !fee.is_zero() {
            let dao = self.dao.get().unwrap();
            self.send_hlx(dao, fee);
        }

        self.env().emit_event(BondCreated {
            depositor,
            index,
            amount,
            payout,
            price,
        });

        self.exit();
        vested_payout
    }

    // ========== Redemption ==========

    /// Release whatever has vested on one bond; closes the record at full
    /// vesting. Callable by anyone, payout always goes to the depositor.
    pub fn redeem(&mut self, depositor: Address, index: u32) -> U256 {
        self.enter();
        let released = self.redeem_internal(depositor, index, true);
        self.exit();
        released
    }

    /// Redeem the caller's bond and stake the release in one step
    pub fn redeem_and_stake(&mut self, index: u32) -> U256 {
        self.enter();
        let caller = self.env().caller();
        let released = self.redeem_internal(caller, index, false);
        if !released.is_zero() {
            self.stake_released(caller, released);
        }
        self.exit();
        released
    }

    /// Drain vested payouts over the index window `[start, end)`.
    ///
    /// Returns the number of bonds still open across the whole book and the
    /// indices inside the window that remain open, so callers can loop pages
    /// until `remaining == 0`. Each page commits independently.
    pub fn redeem_all(&mut self, start: u32, end: u32, depositor: Address) -> (u32, Vec<u32>) {
        self.enter();
        let count = self.bond_counts.get(&depositor).unwrap_or(0);
        let end_capped = end.min(count);
        let mut next_indices = Vec::new();

        for i in start..end_capped {
            let record = self.bonds.get(&(depositor, i)).unwrap_or_default();
            if !record.payout.is_zero() {
                self.redeem_internal(depositor, i, true);
                let after = self.bonds.get(&(depositor, i)).unwrap_or_default();
                if !after.payout.is_zero() {
                    next_indices.push(i);
                }
            }
        }

        let remaining = self.open_bonds.get(&depositor).unwrap_or(0);
        self.exit();
        (remaining, next_indices)
    }

    /// Abandon a bond before full vesting at the configured return rate;
    /// the forfeited remainder goes to the DAO.
    pub fn redeem_premature(&mut self, index: u32) -> U256 {
        self.enter();
        let terms = self.require_terms();
        if terms.premature_return_rate == 0 {
            self.env().revert(HelixError::PrematureDisabled);
        }

        let caller = self.env().caller();
        let record = self.bonds.get(&(caller, index)).unwrap_or_default();
        if record.payout.is_zero() {
            self.env().revert(HelixError::NoActiveBond);
        }

        let returned = match bond_math::premature_return(record.payout, terms.premature_return_rate)
        {
            Some(returned) => returned,
            None => self.env().revert(HelixError::ArithmeticFailure),
        };
        let forfeited = record.payout - returned;

        self.close_bond(caller, index);

        if !returned.is_zero() {
            self.send_hlx(caller, returned);
        }
        if !forfeited.is_zero() {
            let dao = self.dao.get().unwrap();
            self.send_hlx(dao, forfeited);
        }

        self.env().emit_event(BondRedeemed {
            depositor: caller,
            index,
            released: returned,
            remaining: U256::zero(),
        });

        self.exit();
        returned
    }

    // ========== Views ==========

    /// Current sale price, `PRICE_SCALE` fixed point
    pub fn bond_price(&self) -> U256 {
        let terms = self.require_terms();
        self.compute_price(&terms)
    }

    /// Decay-adjusted outstanding debt
    pub fn current_debt_decayed(&self) -> U256 {
        let terms = self.require_terms();
        bond_math::decayed_debt(
            self.current_debt.get().unwrap_or(U256::zero()),
            self.last_decay.get().unwrap_or(0),
            self.env().get_block_time(),
            terms.vesting_term,
        )
    }

    /// Debt ratio in 1e9 fixed point
    pub fn debt_ratio(&self) -> U256 {
        match bond_math::debt_ratio(self.current_debt_decayed(), self.hlx_total_supply()) {
            Some(ratio) => ratio,
            None => self.env().revert(HelixError::ArithmeticFailure),
        }
    }

    /// Vested percentage for one bond, `PRICE_SCALE` fixed point
    pub fn percent_vested_for(&self, depositor: Address, index: u32) -> u64 {
        let record = self.bonds.get(&(depositor, index)).unwrap_or_default();
        if record.payout.is_zero() {
            return 0;
        }
        let elapsed = self.env().get_block_time().saturating_sub(record.last_time);
        bond_math::percent_vested(elapsed, record.vesting)
    }

    /// HLX claimable right now on one bond
    pub fn pending_payout_for(&self, depositor: Address, index: u32) -> U256 {
        let record = self.bonds.get(&(depositor, index)).unwrap_or_default();
        let percent = self.percent_vested_for(depositor, index);
        if percent >= PRICE_SCALE {
            return record.payout;
        }
        bond_math::vested_amount(record.payout, percent).unwrap_or(U256::zero())
    }

    /// Book length for a depositor (closed slots included)
    pub fn bond_count(&self, depositor: Address) -> u32 {
        self.bond_counts.get(&depositor).unwrap_or(0)
    }

    /// Open bonds for a depositor
    pub fn open_bond_count(&self, depositor: Address) -> u32 {
        self.open_bonds.get(&depositor).unwrap_or(0)
    }

    /// One bond record
    pub fn bond_info(&self, depositor: Address, index: u32) -> BondRecord {
        self.bonds.get(&(depositor, index)).unwrap_or_default()
    }

    /// Sale terms
    pub fn get_terms(&self) -> Option<BondTerms> {
        self.terms.get().flatten()
    }

    /// Lifetime payout sold
    pub fn get_total_sold(&self) -> U256 {
        self.total_sold.get().unwrap_or(U256::zero())
    }

    // ========== Internal Functions ==========

    fn redeem_internal(&mut self, depositor: Address, index: u32, send: bool) -> U256 {
        let record = self.bonds.get(&(depositor, index)).unwrap_or_default();
        if record.payout.is_zero() {
            self.env().revert(HelixError::NoActiveBond);
        }

        let now = self.env().get_block_time();
        let elapsed = now.saturating_sub(record.last_time);
        let percent = bond_math::percent_vested(elapsed, record.vesting);

        let (released, remaining) = if percent >= PRICE_SCALE {
            self.close_bond(depositor, index);
            (record.payout, U256::zero())
        } else {
            let released = match bond_math::vested_amount(record.payout, percent) {
                Some(released) => released,
                None => self.env().revert(HelixError::ArithmeticFailure),
            };
            let remaining = record.payout - released;
            self.bonds.set(
                &(depositor, index),
                BondRecord {
                    payout: remaining,
                    vesting: record.vesting - elapsed,
                    last_time: now,
                    price_paid: record.price_paid,
                },
            );
            (released, remaining)
        };

        if send && !released.is_zero() {
            self.send_hlx(depositor, released);
        }

        self.env().emit_event(BondRedeemed {
            depositor,
            index,
            released,
            remaining,
        });
        released
    }

    fn close_bond(&mut self, depositor: Address, index: u32) {
        self.bonds.set(&(depositor, index), BondRecord::default());
        let open = self.open_bonds.get(&depositor).unwrap_or(0);
        if open > 0 {
            self.open_bonds.set(&depositor, open - 1);
        }
    }

    fn decay_debt(&mut self, terms: &BondTerms, now: u64) {
        let decayed = bond_math::decayed_debt(
            self.current_debt.get().unwrap_or(U256::zero()),
            self.last_decay.get().unwrap_or(0),
            now,
            terms.vesting_term,
        );
        self.current_debt.set(decayed);
        self.last_decay.set(now);
    }

    fn roll_circuit_window(&mut self, now: u64) {
        let start = self.window_start.get().unwrap_or(0);
        if now.saturating_sub(start) >= CIRCUIT_WINDOW {
            self.window_start.set(now);
            self.sold_in_window.set(U256::zero());
        }
    }

    fn compute_price(&self, terms: &BondTerms) -> U256 {
        let debt = bond_math::decayed_debt(
            self.current_debt.get().unwrap_or(U256::zero()),
            self.last_decay.get().unwrap_or(0),
            self.env().get_block_time(),
            terms.vesting_term,
        );
        let ratio = match bond_math::debt_ratio(debt, self.hlx_total_supply()) {
            Some(ratio) => ratio,
            None => self.env().revert(HelixError::ArithmeticFailure),
        };
        let native = match bond_math::price_from_debt_ratio(
            terms.control_variable,
            ratio,
            terms.minimum_price,
        ) {
            Some(native) => native,
            None => self.env().revert(HelixError::ArithmeticFailure),
        };

        match self.pricing.get().unwrap_or(PricingKind::DebtRatio) {
            PricingKind::DebtRatio => native,
            PricingKind::DebtRatioWithTwapFloor => {
                let market = self.oracle_market_price();
                match bond_math::twap_floor(market, terms.max_discount) {
                    Some(floor) => native.max(floor),
                    None => self.env().revert(HelixError::ArithmeticFailure),
                }
            }
        }
    }

    fn oracle_market_price(&self) -> U256 {
        let oracle = match self.oracle.get().flatten() {
            Some(oracle) => oracle,
            None => self.env().revert(HelixError::StaleOracle),
        };
        let pair = match self.oracle_pair.get().flatten() {
            Some(pair) => pair,
            None => self.env().revert(HelixError::StaleOracle),
        };
        let args = runtime_args! {
            "pair" => pair
        };
        let call_def = CallDef::new("market_price", false, args);
        self.env().call_contract::<U256>(oracle, call_def)
    }

    fn treasury_value_of(&self, amount: U256) -> U256 {
        let treasury = self.treasury.get().unwrap();
        let principle = self.principle.get().unwrap();
        let args = runtime_args! {
            "asset" => principle,
            "amount" => amount
        };
        let call_def = CallDef::new("value_of_token", false, args);
        self.env().call_contract::<U256>(treasury, call_def)
    }

    fn pull_principle(&mut self, from: Address, amount: U256) {
        let principle = self.principle.get().unwrap();
        let here = self.env().self_address();
        let args = runtime_args! {
            "owner" => from,
            "recipient" => here,
            "amount" => amount
        };
        let call_def = CallDef::new("transfer_from", true, args);
        let success: bool = self.env().call_contract(principle, call_def);
        if !success {
            self.env().revert(HelixError::InsufficientBalance);
        }
    }

    fn deposit_to_treasury(&mut self, amount: U256, profit: U256) {
        let principle = self.principle.get().unwrap();
        let treasury = self.treasury.get().unwrap();

        let approve_args = runtime_args! {
            "spender" => treasury,
            "amount" => amount
        };
        let approve_def = CallDef::new("approve", true, approve_args);
        self.env().call_contract::<bool>(principle, approve_def);

        let deposit_args = runtime_args! {
            "amount" => amount,
            "asset" => principle,
            "profit" => profit
        };
        let deposit_def = CallDef::new("deposit", true, deposit_args);
        self.env().call_contract::<U256>(treasury, deposit_def);
    }

    fn send_hlx(&mut self, to: Address, amount: U256) {
        let hlx = self.hlx.get().unwrap();
        let args = runtime_args! {
            "recipient" => to,
            "amount" => amount
        };
        let call_def = CallDef::new("transfer", true, args);
        let success: bool = self.env().call_contract(hlx, call_def);
        if !success {
            self.env().revert(HelixError::InsufficientBalance);
        }
    }

    fn stake_released(&mut self, recipient: Address, amount: U256) {
        let staking = match self.staking.get().flatten() {
            Some(staking) => staking,
            None => self.env().revert(HelixError::InvalidParameter),
        };
        let hlx = self.hlx.get().unwrap();

        let approve_args = runtime_args! {
            "spender" => staking,
            "amount" => amount
        };
        let approve_def = CallDef::new("approve", true, approve_args);
        self.env().call_contract::<bool>(hlx, approve_def);

        let stake_args = runtime_args! {
            "amount" => amount,
            "recipient" => recipient
        };
        let stake_def = CallDef::new("stake", true, stake_args);
        self.env().call_contract::<bool>(staking, stake_def);
    }

    fn hlx_total_supply(&self) -> U256 {
        let hlx = self.hlx.get().unwrap();
        let call_def = CallDef::new("total_supply", false, RuntimeArgs::new());
        self.env().call_contract::<U256>(hlx, call_def)
    }

    fn require_terms(&self) -> BondTerms {
        match self.terms.get().flatten() {
            Some(terms) => terms,
            None => self.env().revert(HelixError::NotInitialized),
        }
    }

    fn require_policy(&self) {
        if Some(self.env().caller()) != self.policy.get() {
            self.env().revert(HelixError::Unauthorized);
        }
    }

    fn enter(&mut self) {
        if self.locked.get().unwrap_or(false) {
            self.env().revert(HelixError::Reentrancy);
        }
        self.locked.set(true);
    }

    fn exit(&mut self) {
        self.locked.set(false);
    }
}
