//! Staking Contract
//!
//! Epoch rebase engine. `rebase` is callable by anyone and is an idempotent
//! no-op until the epoch boundary; at the boundary it distributes the epoch's
//! allocation across staked balances, advances the epoch by exactly one, and
//! asks the Distributor for the next allocation.
//!
//! New stakes sit in warmup custody until their expiry epoch; sHLX accrues
//! rebases while warming but cannot move until claimed.

use odra::prelude::*;
use odra::casper_types::{U256, RuntimeArgs, runtime_args};
use odra::CallDef;
use crate::errors::HelixError;
use crate::types::{Epoch, WarmupInfo};

/// `set_contract` selector for the distributor
pub const CONTRACT_DISTRIBUTOR: u8 = 0;
/// `set_contract` selector for the warmup custodian
pub const CONTRACT_WARMUP: u8 = 1;

/// Epoch advanced at a rebase boundary
#[odra::event]
pub struct RebaseTriggered {
    /// Epoch that just closed
    pub epoch: u64,
    /// Reward distributed into the staked pool
    pub distributed: U256,
}

/// Staking Contract
#[odra::module(events = [RebaseTriggered])]
pub struct Staking {
    /// HLX token address
    hlx: Var<Address>,
    /// sHLX token address
    shlx: Var<Address>,
    /// Current epoch
    epoch: Var<Epoch>,
    /// Distributor address
    distributor: Var<Option<Address>>,
    /// Warmup custodian address
    warmup_contract: Var<Option<Address>>,
    /// Epochs a new stake spends in warmup
    warmup_period: Var<u64>,
    /// Warmup bookkeeping per recipient
    warmup_info: Mapping<Address, WarmupInfo>,
    /// Policy address
    policy: Var<Address>,
}

#[odra::module]
impl Staking {
    /// Initialize the staking contract
    pub fn init(
        &mut self,
        hlx: Address,
        shlx: Address,
        epoch_length: u64,
        first_epoch_number: u64,
        first_epoch_time: u64,
    ) {
        self.hlx.set(hlx);
        self.shlx.set(shlx);
        self.epoch.set(Epoch {
            number: first_epoch_number,
            length: epoch_length,
            end_time: first_epoch_time,
            distribute: U256::zero(),
        });
        self.distributor.set(None);
        self.warmup_contract.set(None);
        self.warmup_period.set(0);
        self.policy.set(self.env().caller());
    }

    // ========== Setup (Policy Only) ==========

    /// Wire a dependent contract: 0 = distributor, 1 = warmup custodian
    pub fn set_contract(&mut self, kind: u8, address: Address) {
        self.require_policy();
        match kind {
            CONTRACT_DISTRIBUTOR => self.distributor.set(Some(address)),
            CONTRACT_WARMUP => self.warmup_contract.set(Some(address)),
            _ => self.env().revert(HelixError::InvalidParameter),
        }
    }

    /// Set the warmup length in epochs
    pub fn set_warmup_period(&mut self, period: u64) {
        self.require_policy();
        self.warmup_period.set(period);
    }

    // ========== Staking ==========

    /// Stake HLX for `recipient`; the position warms until its expiry epoch
    pub fn stake(&mut self, amount: U256, recipient: Address) -> bool {
        self.rebase();

        if amount.is_zero() {
            self.env().revert(HelixError::ZeroAmount);
        }

        let caller = self.env().caller();
        let mut info = self.warmup_info.get(&recipient).unwrap_or_default();
        if info.lock && caller != recipient {
            self.env().revert(HelixError::DepositsLocked);
        }

        self.pull_hlx(caller, amount);

        let epoch = self.epoch.get().unwrap();
        info.deposit += amount;
        info.gons += self.shlx_gons_for_balance(amount);
        info.expiry = epoch.number + self.warmup_period.get().unwrap_or(0);
        self.warmup_info.set(&recipient, info);

        let warmup = self.require_warmup();
        self.send_shlx(warmup, amount);
        true
    }

    /// Move a warmed position out of custody to its recipient
    pub fn claim(&mut self, recipient: Address) {
        let caller = self.env().caller();
        let info = self.warmup_info.get(&recipient).unwrap_or_default();
        if info.deposit.is_zero() {
            self.env().revert(HelixError::NothingToClaim);
        }
        if info.lock && caller != recipient {
            self.env().revert(HelixError::DepositsLocked);
        }

        let epoch = self.epoch.get().unwrap();
        if epoch.number < info.expiry {
            self.env().revert(HelixError::StillWarming);
        }

        let amount = self.shlx_balance_for_gons(info.gons);
        self.warmup_info.set(&recipient, WarmupInfo::default());
        self.warmup_retrieve(recipient, amount);
    }

    /// Abandon a warming position and take the HLX principal back
    pub fn forfeit(&mut self) {
        let caller = self.env().caller();
        let info = self.warmup_info.get(&caller).unwrap_or_default();
        if info.deposit.is_zero() {
            self.env().revert(HelixError::NothingToClaim);
        }
        self.warmup_info.set(&caller, WarmupInfo::default());

        // warmed sHLX returns to the float, principal goes back out
        let here = self.env().self_address();
        self.warmup_retrieve(here, self.shlx_balance_for_gons(info.gons));
        self.send_hlx(caller, info.deposit);
    }

    /// Forbid or re-allow third parties staking to the caller's address
    pub fn toggle_deposit_lock(&mut self) {
        let caller = self.env().caller();
        let mut info = self.warmup_info.get(&caller).unwrap_or_default();
        info.lock = !info.lock;
        self.warmup_info.set(&caller, info);
    }

    /// Swap sHLX back to HLX 1:1
    pub fn unstake(&mut self, amount: U256, trigger: bool) {
        if trigger {
            self.rebase();
        }
        if amount.is_zero() {
            self.env().revert(HelixError::ZeroAmount);
        }

        let caller = self.env().caller();
        self.pull_shlx(caller, amount);
        self.send_hlx(caller, amount);
    }

    /// Advance the epoch once its boundary has passed; no-op before that.
    pub fn rebase(&mut self) {
        let mut epoch = self.epoch.get().unwrap();
        if self.env().get_block_time() < epoch.end_time {
            return;
        }

        self.shlx_rebase(epoch.distribute, epoch.number);

        let closed = epoch.number;
        let distributed = epoch.distribute;
        epoch.number += 1;
        epoch.end_time += epoch.length;
        epoch.distribute = match self.distributor.get().flatten() {
            Some(distributor) => self.call_distributor(distributor),
            None => U256::zero(),
        };
        self.epoch.set(epoch);

        self.env().emit_event(RebaseTriggered {
            epoch: closed,
            distributed,
        });
    }

    // ========== Views ==========

    /// Current epoch
    pub fn get_epoch(&self) -> Epoch {
        self.epoch.get().unwrap()
    }

    /// Warmup bookkeeping for a recipient
    pub fn get_warmup_info(&self, recipient: Address) -> WarmupInfo {
        self.warmup_info.get(&recipient).unwrap_or_default()
    }

    /// Warmup length in epochs
    pub fn get_warmup_period(&self) -> u64 {
        self.warmup_period.get().unwrap_or(0)
    }

    /// Current sHLX rebase index
    pub fn index(&self) -> U256 {
        let shlx = self.shlx.get().unwrap();
        let call_def = CallDef::new("index", false, RuntimeArgs::new());
        self.env().call_contract::<U256>(shlx, call_def)
    }

    // ========== Internal Functions ==========

    fn call_distributor(&mut self, distributor: Address) -> U256 {
        let call_def = CallDef::new("distribute", true, RuntimeArgs::new());
        self.env().call_contract::<U256>(distributor, call_def)
    }

    fn shlx_rebase(&mut self, profit: U256, epoch: u64) {
        let shlx = self.shlx.get().unwrap();
        let args = runtime_args! {
            "profit" => profit,
            "epoch" => epoch
        };
        let call_def = CallDef::new("rebase", true, args);
        self.env().call_contract::<U256>(shlx, call_def);
    }

    fn shlx_gons_for_balance(&self, amount: U256) -> U256 {
        let shlx = self.shlx.get().unwrap();
        let args = runtime_args! {
            "amount" => amount
        };
        let call_def = CallDef::new("gons_for_balance", false, args);
        self.env().call_contract::<U256>(shlx, call_def)
    }

    fn shlx_balance_for_gons(&self, gons: U256) -> U256 {
        let shlx = self.shlx.get().unwrap();
        let args = runtime_args! {
            "gons" => gons
        };
        let call_def = CallDef::new("balance_for_gons", false, args);
        self.env().call_contract::<U256>(shlx, call_def)
    }

    fn warmup_retrieve(&mut self, to: Address, amount: U256) {
        let warmup = self.require_warmup();
        let args = runtime_args! {
            "to" => to,
            "amount" => amount
        };
        let call_def = CallDef::new("retrieve", true, args);
        self.env().call_contract::<()>(warmup, call_def);
    }

    fn pull_hlx(&mut self, from: Address, amount: U256) {
        let hlx = self.hlx.get().unwrap();
        let here = self.env().self_address();
        let args = runtime_args! {
            "owner" => from,
            "recipient" => here,
            "amount" => amount
        };
        let call_def = CallDef::new("transfer_from", true, args);
        let success: bool = self.env().call_contract(hlx, call_def);
        if !success {
            self.env().revert(HelixError::InsufficientBalance);
        }
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

    fn require_warmup(&self) -> Address {
        match self.warmup_contract.get().flatten() {
            Some(warmup) => warmup,
            None => self.env().revert(HelixError::NotWarmupContract),
        }
    }

    fn require_policy(&self) {
        if Some(self.env().caller()) != self.policy.get() {
            self.env().revert(HelixError::Unauthorized);
        }
    }
}
