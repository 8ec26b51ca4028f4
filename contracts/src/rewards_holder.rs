//! Rewards Holder Contract
//!
//! Accrues sHLX rewards (it is registered as a distributor recipient) and
//! forwards them to the compounding vault once per `time_per_sample`, so the
//! vault's share price moves at a bounded, keeper-driven cadence instead of
//! every rebase.

use odra::prelude::*;
use odra::casper_types::{U256, runtime_args};
use odra::CallDef;
use crate::errors::HelixError;

/// Default sampling cadence
const DEFAULT_TIME_PER_SAMPLE: u64 = 1800;

/// Accrued rewards pushed to the vault
#[odra::event]
pub struct NewSample {
    /// Rewards forwarded
    pub rewards: U256,
    /// Sample ordinal
    pub sample_number: u64,
}

/// Rewards Holder Contract
#[odra::module(events = [NewSample])]
pub struct RewardsHolder {
    /// sHLX token address
    shlx: Var<Address>,
    /// Vault receiving samples
    vault: Var<Option<Address>>,
    /// Policy address
    policy: Var<Address>,
    /// Minimum time between samples
    time_per_sample: Var<u64>,
    /// Last accepted sample time
    last_sample: Var<u64>,
    /// Samples taken
    sample_count: Var<u64>,
}

#[odra::module]
impl RewardsHolder {
    /// Initialize the holder
    pub fn init(&mut self, shlx: Address) {
        self.shlx.set(shlx);
        self.vault.set(None);
        self.policy.set(self.env().caller());
        self.time_per_sample.set(DEFAULT_TIME_PER_SAMPLE);
        self.last_sample.set(0);
        self.sample_count.set(0);
    }

    /// Wire the vault and the sampling cadence (policy only)
    pub fn set_parameters(&mut self, vault: Address, time_per_sample: u64) {
        self.require_policy();
        if time_per_sample == 0 {
            self.env().revert(HelixError::InvalidParameter);
        }
        self.vault.set(Some(vault));
        self.time_per_sample.set(time_per_sample);
    }

    /// Forward accrued rewards to the vault. No-op (returns false) before
    /// the cadence elapses; callable by anyone.
    pub fn sample(&mut self) -> bool {
        let now = self.env().get_block_time();
        let last = self.last_sample.get().unwrap_or(0);
        if last != 0 && now < last + self.time_per_sample.get().unwrap_or(DEFAULT_TIME_PER_SAMPLE)
        {
            return false;
        }

        let vault = match self.vault.get().flatten() {
            Some(vault) => vault,
            None => self.env().revert(HelixError::InvalidParameter),
        };

        self.last_sample.set(now);
        let count = self.sample_count.get().unwrap_or(0) + 1;
        self.sample_count.set(count);

        let rewards = self.shlx_balance_of_self();
        if !rewards.is_zero() {
            self.send_shlx(vault, rewards);
        }
        // zero-reward samples still notify, so the vault's cadence is audited
        let args = runtime_args! {
            "rewards" => rewards
        };
        let call_def = CallDef::new("record_sample", true, args);
        self.env().call_contract::<()>(vault, call_def);

        self.env().emit_event(NewSample {
            rewards,
            sample_number: count,
        });
        true
    }

    /// Sampling cadence
    pub fn get_time_per_sample(&self) -> u64 {
        self.time_per_sample.get().unwrap_or(DEFAULT_TIME_PER_SAMPLE)
    }

    /// Last accepted sample time
    pub fn get_last_sample(&self) -> u64 {
        self.last_sample.get().unwrap_or(0)
    }

    /// Samples taken so far
    pub fn get_sample_count(&self) -> u64 {
        self.sample_count.get().unwrap_or(0)
    }

    /// Vault receiving samples
    pub fn get_vault(&self) -> Option<Address> {
        self.vault.get().flatten()
    }

    // ========== Internal Functions ==========

    fn shlx_balance_of_self(&self) -> U256 {
        let shlx = self.shlx.get().unwrap();
        let here = self.env().self_address();
        let args = runtime_args! {
            "account" => here
        };
        let call_def = CallDef::new("balance_of", false, args);
        self.env().call_contract::<U256>(shlx, call_def)
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
}
