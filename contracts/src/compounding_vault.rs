//! Compounding Vault Contract
//!
//! Share-based auto-compounding wrapper over sHLX. Depositors hold shares;
//! the rewards holder periodically pushes sampled rewards in, which raises
//! `total_underlying` and therefore the share price — the only path that
//! moves it, so the price is monotonic non-decreasing between explicit
//! fee-bearing withdrawals. Holders compound without per-epoch claims.

use odra::prelude::*;
use odra::casper_types::{U256, runtime_args};
use odra::CallDef;
use crate::errors::HelixError;
use crate::types::{BPS_SCALE, INDEX_SCALE};

/// Shares minted against a deposit
#[odra::event]
pub struct VaultDeposit {
    /// Depositor
    pub account: Address,
    /// sHLX paid in (before fees)
    pub amount: U256,
    /// Shares minted
    pub shares: U256,
}

/// Shares burned for underlying
#[odra::event]
pub struct VaultWithdraw {
    /// Withdrawer
    pub account: Address,
    /// Shares burned
    pub shares: U256,
    /// sHLX paid out (after fees)
    pub amount: U256,
}

/// Sampled rewards folded into the share price
#[odra::event]
pub struct SampleRecorded {
    /// Rewards received (before the performance fee)
    pub rewards: U256,
    /// Share price after the sample, `INDEX_SCALE` fixed point
    pub share_price: U256,
}

/// Compounding Vault Contract
#[odra::module(events = [VaultDeposit, VaultWithdraw, SampleRecorded])]
pub struct CompoundingVault {
    /// sHLX token address
    shlx: Var<Address>,
    /// DAO fee recipient
    dao: Var<Address>,
    /// Policy address
    policy: Var<Address>,
    /// Rewards holder allowed to record samples
    rewards_holder: Var<Option<Address>>,
    /// Total shares issued
    total_shares: Var<U256>,
    /// Total sHLX the shares are a claim on
    total_underlying: Var<U256>,
    /// Share balances
    shares: Mapping<Address, U256>,
    /// Last deposit time per account (early-exit window)
    last_deposit_time: Mapping<Address, u64>,
    /// Early-exit window length
    no_fee_period: Var<u64>,
    /// Deposit fee in bps
    deposit_fee_bps: Var<u64>,
    /// Withdrawal fee in bps
    withdrawal_fee_bps: Var<u64>,
    /// Performance fee on sampled rewards, in bps
    performance_fee_bps: Var<u64>,
    /// Accept new deposits
    compounding_enabled: Var<bool>,
    /// Charge the early-exit penalty
    early_penalty_enabled: Var<bool>,
    /// Reentrancy latch
    locked: Var<bool>,
}

#[odra::module]
impl CompoundingVault {
    /// Initialize the vault
    pub fn init(&mut self, shlx: Address, dao: Address) {
        self.shlx.set(shlx);
        self.dao.set(dao);
        self.policy.set(self.env().caller());
        self.rewards_holder.set(None);
        self.total_shares.set(U256::zero());
        self.total_underlying.set(U256::zero());
        self.no_fee_period.set(0);
        self.deposit_fee_bps.set(0);
        self.withdrawal_fee_bps.set(0);
        self.performance_fee_bps.set(0);
        self.compounding_enabled.set(true);
        self.early_penalty_enabled.set(false);
        self.locked.set(false);
    }

    /// Configure fees and feature flags (policy only)
    pub fn set_parameters(
        &mut self,
        rewards_holder: Address,
        no_fee_period: u64,
        deposit_fee_bps: u64,
        withdrawal_fee_bps: u64,
        performance_fee_bps: u64,
        compounding_enabled: bool,
        early_penalty_enabled: bool,
    ) {
        self.require_policy();
        if deposit_fee_bps > BPS_SCALE
            || withdrawal_fee_bps > BPS_SCALE
            || performance_fee_bps > BPS_SCALE
        {
            self.env().revert(HelixError::InvalidParameter);
        }
        self.rewards_holder.set(Some(rewards_holder));
        self.no_fee_period.set(no_fee_period);
        self.deposit_fee_bps.set(deposit_fee_bps);
        self.withdrawal_fee_bps.set(withdrawal_fee_bps);
        self.performance_fee_bps.set(performance_fee_bps);
        self.compounding_enabled.set(compounding_enabled);
        self.early_penalty_enabled.set(early_penalty_enabled);
    }

    // ========== User Functions ==========

    /// Deposit sHLX, receive shares at the current price
    pub fn deposit(&mut self, amount: U256) -> U256 {
        self.enter();
        if amount.is_zero() {
            self.env().revert(HelixError::ZeroAmount);
        }
        if !self.compounding_enabled.get().unwrap_or(false) {
            self.env().revert(HelixError::DepositsDisabled);
        }

        let caller = self.env().caller();
        self.pull_shlx(caller, amount);

        let fee = self.bps_of(amount, self.deposit_fee_bps.get().unwrap_or(0));
        if !fee.is_zero() {
            let dao = self.dao.get().unwrap();
            self.send_shlx(dao, fee);
        }
        let net = amount - fee;

        let total_shares = self.total_shares.get().unwrap_or(U256::zero());
        let total_underlying = self.total_underlying.get().unwrap_or(U256::zero());
        let minted = if total_shares.is_zero() || total_underlying.is_zero() {
            net
        } else {
            net.checked_mul(total_shares)
                .and_then(|v| v.checked_div(total_underlying))
                .unwrap_or_else(|| self.env().revert(HelixError::ArithmeticFailure))
        };
        if minted.is_zero() {
            self.env().revert(HelixError::ZeroAmount);
        }

        self.shares.set(
            &caller,
            self.shares.get(&caller).unwrap_or(U256::zero()) + minted,
        );
        self.total_shares.set(total_shares + minted);
        self.total_underlying.set(total_underlying + net);
        self.last_deposit_time
            .set(&caller, self.env().get_block_time());

        self.env().emit_event(VaultDeposit {
            account: caller,
            amount,
            shares: minted,
        });

        self.exit();
        minted
    }

    /// Burn shares, receive underlying sHLX minus fees
    pub fn withdraw(&mut self, share_amount: U256) -> U256 {
        self.enter();
        if share_amount.is_zero() {
            self.env().revert(HelixError::ZeroAmount);
        }

        let caller = self.env().caller();
        let held = self.shares.get(&caller).unwrap_or(U256::zero());
        if held < share_amount {
            self.env().revert(HelixError::InsufficientShares);
        }

        let total_shares = self.total_shares.get().unwrap_or(U256::zero());
        let total_underlying = self.total_underlying.get().unwrap_or(U256::zero());
        let amount = share_amount
            .checked_mul(total_underlying)
            .and_then(|v| v.checked_div(total_shares))
            .unwrap_or_else(|| self.env().revert(HelixError::ArithmeticFailure));

        let mut fee_bps = self.withdrawal_fee_bps.get().unwrap_or(0);
        if self.early_penalty_enabled.get().unwrap_or(false) && self.is_early_exit(caller) {
            fee_bps += self.withdrawal_fee_bps.get().unwrap_or(0);
        }
        let fee = self.bps_of(amount, fee_bps.min(BPS_SCALE));
        let net = amount - fee;

        self.shares.set(&caller, held - share_amount);
        self.total_shares.set(total_shares - share_amount);
        self.total_underlying.set(total_underlying - amount);

        if !fee.is_zero() {
            let dao = self.dao.get().unwrap();
            self.send_shlx(dao, fee);
        }
        self.send_shlx(caller, net);

        self.env().emit_event(VaultWithdraw {
            account: caller,
            shares: share_amount,
            amount: net,
        });

        self.exit();
        net
    }

    // ========== Sampling ==========

    /// Fold sampled rewards into the share price (rewards holder only).
    ///
    /// The holder transfers the sHLX in before calling; the performance fee
    /// is skimmed to the DAO and the remainder raises `total_underlying`.
    pub fn record_sample(&mut self, rewards: U256) {
        let caller = self.env().caller();
        match self.rewards_holder.get().flatten() {
            Some(holder) if holder == caller => {}
            _ => self.env().revert(HelixError::NotRewardsHolder),
        }
        if rewards.is_zero() {
            return;
        }

        let fee = self.bps_of(rewards, self.performance_fee_bps.get().unwrap_or(0));
        if !fee.is_zero() {
            let dao = self.dao.get().unwrap();
            self.send_shlx(dao, fee);
        }
        let net = rewards - fee;

        let total_underlying = self.total_underlying.get().unwrap_or(U256::zero());
        self.total_underlying.set(total_underlying + net);

        self.env().emit_event(SampleRecorded {
            rewards,
            share_price: self.share_price(),
        });
    }

    // ========== Views ==========

    /// Share price in `INDEX_SCALE` fixed point (1e9 = 1.0)
    pub fn share_price(&self) -> U256 {
        let total_shares = self.total_shares.get().unwrap_or(U256::zero());
        if total_shares.is_zero() {
            return U256::from(INDEX_SCALE);
        }
        let total_underlying = self.total_underlying.get().unwrap_or(U256::zero());
        total_underlying * U256::from(INDEX_SCALE) / total_shares
    }

    /// Shares held by an account
    pub fn shares_of(&self, account: Address) -> U256 {
        self.shares.get(&account).unwrap_or(U256::zero())
    }

    /// Underlying sHLX an account's shares are worth
    pub fn underlying_of(&self, account: Address) -> U256 {
        let total_shares = self.total_shares.get().unwrap_or(U256::zero());
        if total_shares.is_zero() {
            return U256::zero();
        }
        self.shares_of(account) * self.total_underlying.get().unwrap_or(U256::zero())
            / total_shares
    }

    /// Total shares issued
    pub fn get_total_shares(&self) -> U256 {
        self.total_shares.get().unwrap_or(U256::zero())
    }

    /// Total underlying tracked
    pub fn get_total_underlying(&self) -> U256 {
        self.total_underlying.get().unwrap_or(U256::zero())
    }

    /// Registered rewards holder
    pub fn get_rewards_holder(&self) -> Option<Address> {
        self.rewards_holder.get().flatten()
    }

    // ========== Internal Functions ==========

    fn is_early_exit(&self, account: Address) -> bool {
        let last = self.last_deposit_time.get(&account).unwrap_or(0);
        let window = self.no_fee_period.get().unwrap_or(0);
        self.env().get_block_time() < last + window
    }

    fn bps_of(&self, amount: U256, bps: u64) -> U256 {
        amount * U256::from(bps) / U256::from(BPS_SCALE)
    }

    fn pull_shlx(&mut self, from: Address, amount: U256) {
        let shlx = self.shlx.get().unwrap();
        let here = self.env().self_address();
        let args = runtime_args! {
            "owner" => from,
            "recipient" => here,
            "amount" => amount
        };
        let call_def = CallDef::new("transfer_from", true, args);
        let success: bool = self.env().call_contract(shlx, call_def);
        if !success {
            self.env().revert(HelixError::InsufficientBalance);
        }
    }

    fn send_shlx(&mut self, to: Address, amount: U256) {
        let shlx = self.shlx.get().unwrap();
        let args = runtime_args! {
            "recipient" => to,
            "amount" => amount
        };
        let call_def = CallDef::new("transfer", true, args);
        let success: bool = self.env().call_contract(shlx, call_def);
        if !success {
            self.env().revert(HelixError::InsufficientBalance);
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
