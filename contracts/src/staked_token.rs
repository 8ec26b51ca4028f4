//! sHLX Staked Token Contract
//!
//! Rebase-indexed claim on the staking pool. Balances are stored as gons and
//! reported as `gons * index / INDEX_SCALE`; `rebase` scales the index so
//! every staked balance grows pro rata without touching individual entries.
//!
//! Setup is two one-shot calls by the deployer, in order:
//! 1. `initialize(staking)` — wires the staking contract and mints the float
//!    it hands out against incoming stakes
//! 2. `set_index(index)` — seeds the index before the first rebase

use odra::prelude::*;
use odra::casper_types::U256;
use crate::errors::HelixError;
use crate::types::{INDEX_SCALE, TOKEN_DECIMALS};

/// Float minted to the staking contract at initialization (5M sHLX, 9 dec)
const INITIAL_FLOAT: u64 = 5_000_000_000_000_000;

/// Index growth on rebase
#[odra::event]
pub struct Rebase {
    /// Epoch that triggered the rebase
    pub epoch: u64,
    /// Profit distributed across circulating balances
    pub profit: U256,
    /// Index after the rebase
    pub index: U256,
}

/// sHLX Token Contract
#[odra::module(events = [Rebase])]
pub struct StakedHelix {
    /// Token name
    name: Var<String>,
    /// Token symbol
    symbol: Var<String>,
    /// Balances in gons
    gons: Mapping<Address, U256>,
    /// Total gons issued
    total_gons: Var<U256>,
    /// Rebase index, `INDEX_SCALE` fixed point
    index: Var<U256>,
    /// Allowance mapping (owner -> spender -> amount)
    allowances: Mapping<(Address, Address), U256>,
    /// Staking contract, the only rebaser
    staking: Var<Option<Address>>,
    /// Deployer, allowed to run the one-shot setup
    owner: Var<Address>,
    /// Number of rebases applied
    rebase_count: Var<u64>,
}

#[odra::module]
impl StakedHelix {
    /// Initialize the token
    pub fn init(&mut self) {
        self.name.set(String::from("Staked Helix"));
        self.symbol.set(String::from("sHLX"));
        self.total_gons.set(U256::zero());
        self.index.set(U256::from(INDEX_SCALE));
        self.staking.set(None);
        self.owner.set(self.env().caller());
        self.rebase_count.set(0);
    }

    /// Wire the staking contract and mint its float (deployer, one time)
    pub fn initialize(&mut self, staking: Address) {
        self.require_owner();
        if self.staking.get().flatten().is_some() {
            self.env().revert(HelixError::AlreadyInitialized);
        }
        self.staking.set(Some(staking));

        let float_gons = self.gons_for_balance(U256::from(INITIAL_FLOAT));
        self.gons.set(&staking, float_gons);
        self.total_gons.set(float_gons);
    }

    /// Seed the index (deployer, before the first rebase)
    pub fn set_index(&mut self, index: U256) {
        self.require_owner();
        if index.is_zero() {
            self.env().revert(HelixError::InvalidParameter);
        }
        if self.rebase_count.get().unwrap_or(0) > 0 {
            self.env().revert(HelixError::AlreadyInitialized);
        }
        self.index.set(index);
    }

    // ========== Token Views ==========

    /// Get token name
    pub fn name(&self) -> String {
        self.name.get().unwrap_or_else(|| String::from("Staked Helix"))
    }

    /// Get token symbol
    pub fn symbol(&self) -> String {
        self.symbol.get().unwrap_or_else(|| String::from("sHLX"))
    }

    /// Get decimals
    pub fn decimals(&self) -> u8 {
        TOKEN_DECIMALS
    }

    /// Current rebase index
    pub fn index(&self) -> U256 {
        self.index.get().unwrap_or(U256::from(INDEX_SCALE))
    }

    /// Total supply at the current index
    pub fn total_supply(&self) -> U256 {
        self.balance_for_gons(self.total_gons.get().unwrap_or(U256::zero()))
    }

    /// Supply outside the staking contract's float
    pub fn circulating_supply(&self) -> U256 {
        let staking_balance = match self.staking.get().flatten() {
            Some(staking) => self.balance_of(staking),
            None => U256::zero(),
        };
        let total = self.total_supply();
        if total < staking_balance {
            U256::zero()
        } else {
            total - staking_balance
        }
    }

    /// Get balance of an account
    pub fn balance_of(&self, account: Address) -> U256 {
        self.balance_for_gons(self.gons.get(&account).unwrap_or(U256::zero()))
    }

    /// Gons equivalent of a balance at the current index
    pub fn gons_for_balance(&self, amount: U256) -> U256 {
        amount * U256::from(INDEX_SCALE) / self.index()
    }

    /// Balance equivalent of gons at the current index
    pub fn balance_for_gons(&self, gons: U256) -> U256 {
        gons * self.index() / U256::from(INDEX_SCALE)
    }

    /// Get allowance for spender
    pub fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.allowances.get(&(owner, spender)).unwrap_or(U256::zero())
    }

    // ========== Token Mutations ==========

    /// Transfer tokens to recipient
    pub fn transfer(&mut self, recipient: Address, amount: U256) -> bool {
        let sender = self.env().caller();
        self.transfer_internal(sender, recipient, amount);
        true
    }

    /// Approve spender to spend tokens
    pub fn approve(&mut self, spender: Address, amount: U256) -> bool {
        let owner = self.env().caller();
        self.allowances.set(&(owner, spender), amount);
        true
    }

    /// Transfer tokens from owner to recipient (requires allowance)
    pub fn transfer_from(&mut self, owner: Address, recipient: Address, amount: U256) -> bool {
        let spender = self.env().caller();

        let current_allowance = self.allowance(owner, spender);
        if current_allowance < amount {
            self.env().revert(HelixError::InsufficientAllowance);
        }

        self.transfer_internal(owner, recipient, amount);
        self.allowances.set(&(owner, spender), current_allowance - amount);
        true
    }

    // ========== Protocol Functions (Restricted) ==========

    /// Distribute `profit` across circulating balances by scaling the index
    /// (staking contract only).
    ///
    /// The index moves by `profit / circulating`, so circulating holders gain
    /// `profit` in aggregate; the staking float grows by the same factor.
    pub fn rebase(&mut self, profit: U256, epoch: u64) -> U256 {
        self.require_staking();

        let circulating = self.circulating_supply();
        if !profit.is_zero() && !circulating.is_zero() {
            let index = self.index();
            let gain = index
                .checked_mul(profit)
                .and_then(|v| v.checked_div(circulating));
            let new_index = match gain {
                Some(gain) => index + gain,
                None => self.env().revert(HelixError::ArithmeticFailure),
            };
            self.index.set(new_index);
        }

        self.rebase_count.set(self.rebase_count.get().unwrap_or(0) + 1);
        self.env().emit_event(Rebase {
            epoch,
            profit,
            index: self.index(),
        });
        self.total_supply()
    }

    // ========== Internal Functions ==========

    fn transfer_internal(&mut self, from: Address, to: Address, amount: U256) {
        let gon_amount = self.gons_for_balance(amount);
        let from_gons = self.gons.get(&from).unwrap_or(U256::zero());
        if from_gons < gon_amount {
            self.env().revert(HelixError::InsufficientBalance);
        }

        self.gons.set(&from, from_gons - gon_amount);
        let to_gons = self.gons.get(&to).unwrap_or(U256::zero());
        self.gons.set(&to, to_gons + gon_amount);
    }

    fn require_owner(&self) {
        if Some(self.env().caller()) != self.owner.get() {
            self.env().revert(HelixError::Unauthorized);
        }
    }

    fn require_staking(&self) {
        let caller = self.env().caller();
        match self.staking.get().flatten() {
            Some(staking) if staking == caller => {}
            _ => self.env().revert(HelixError::NotStakingContract),
        }
    }
}
