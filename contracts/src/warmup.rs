//! Warmup Contracts
//!
//! Three pieces:
//! - `StakingWarmup` — the custodian holding warming sHLX; only its staking
//!   contract can move funds out.
//! - `WarmupExecutor` — stakes under its own identity on behalf of one
//!   recipient at a time, so overlapping warmups never merge or re-arm each
//!   other's expiry.
//! - `WarmupManager` — keeps the executor registry and dispatches each stake
//!   to the first executor with free capacity.

use odra::prelude::*;
use odra::casper_types::{U256, RuntimeArgs, runtime_args};
use odra::CallDef;
use crate::errors::HelixError;

// ─── StakingWarmup ──────────────────────────────────────────────────────────

/// Warmup custodian
#[odra::module]
pub struct StakingWarmup {
    /// Staking contract allowed to retrieve
    staking: Var<Address>,
    /// sHLX token address
    shlx: Var<Address>,
}

#[odra::module]
impl StakingWarmup {
    /// Initialize the custodian
    pub fn init(&mut self, staking: Address, shlx: Address) {
        self.staking.set(staking);
        self.shlx.set(shlx);
    }

    /// Move custodied sHLX out (staking contract only)
    pub fn retrieve(&mut self, to: Address, amount: U256) {
        let caller = self.env().caller();
        if Some(caller) != self.staking.get() {
            self.env().revert(HelixError::NotWarmupContract);
        }

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
}

// ─── WarmupExecutor ─────────────────────────────────────────────────────────

/// Single-slot staking proxy used by the manager
#[odra::module]
pub struct WarmupExecutor {
    /// HLX token address
    hlx: Var<Address>,
    /// sHLX token address
    shlx: Var<Address>,
    /// Staking contract
    staking: Var<Address>,
    /// Manager allowed to drive this executor
    manager: Var<Address>,
    /// Recipient currently warming through this executor
    pending_recipient: Var<Option<Address>>,
}

#[odra::module]
impl WarmupExecutor {
    /// Initialize the executor
    pub fn init(&mut self, hlx: Address, shlx: Address, staking: Address, manager: Address) {
        self.hlx.set(hlx);
        self.shlx.set(shlx);
        self.staking.set(staking);
        self.manager.set(manager);
        self.pending_recipient.set(None);
    }

    /// Whether this executor can take a new stake
    pub fn is_available(&self) -> bool {
        self.pending_recipient.get().flatten().is_none()
    }

    /// Recipient currently warming through this executor
    pub fn get_pending_recipient(&self) -> Option<Address> {
        self.pending_recipient.get().flatten()
    }

    /// Stake `amount` for `recipient` under this executor's identity
    /// (manager only)
    pub fn stake_for(&mut self, recipient: Address, amount: U256) {
        self.require_manager();
        if self.pending_recipient.get().flatten().is_some() {
            self.env().revert(HelixError::NoExecutorCapacity);
        }
        self.pending_recipient.set(Some(recipient));

        let manager = self.manager.get().unwrap();
        let staking = self.staking.get().unwrap();
        let hlx = self.hlx.get().unwrap();
        let here = self.env().self_address();

        // pull the HLX the manager approved for us
        let pull_args = runtime_args! {
            "owner" => manager,
            "recipient" => here,
            "amount" => amount
        };
        let pull_def = CallDef::new("transfer_from", true, pull_args);
        let success: bool = self.env().call_contract(hlx, pull_def);
        if !success {
            self.env().revert(HelixError::InsufficientBalance);
        }

        let approve_args = runtime_args! {
            "spender" => staking,
            "amount" => amount
        };
        let approve_def = CallDef::new("approve", true, approve_args);
        self.env().call_contract::<bool>(hlx, approve_def);

        let stake_args = runtime_args! {
            "amount" => amount,
            "recipient" => here
        };
        let stake_def = CallDef::new("stake", true, stake_args);
        self.env().call_contract::<bool>(staking, stake_def);
    }

    /// Claim the warmed stake and forward it to its recipient (manager only).
    /// Fails `StillWarming` inside the staking contract before expiry.
    pub fn claim_for(&mut self, recipient: Address) {
        self.require_manager();
        match self.pending_recipient.get().flatten() {
            Some(pending) if pending == recipient => {}
            _ => self.env().revert(HelixError::NothingToClaim),
        }

        let staking = self.staking.get().unwrap();
        let shlx = self.shlx.get().unwrap();
        let here = self.env().self_address();

        let claim_args = runtime_args! {
            "recipient" => here
        };
        let claim_def = CallDef::new("claim", true, claim_args);
        self.env().call_contract::<()>(staking, claim_def);

        // forward the whole warmed balance; rebases accrued during warmup
        // belong to the recipient
        let balance_args = runtime_args! {
            "account" => here
        };
        let balance_def = CallDef::new("balance_of", false, balance_args);
        let balance: U256 = self.env().call_contract(shlx, balance_def);

        let send_args = runtime_args! {
            "recipient" => recipient,
            "amount" => balance
        };
        let send_def = CallDef::new("transfer", true, send_args);
        let success: bool = self.env().call_contract(shlx, send_def);
        if !success {
            self.env().revert(HelixError::InsufficientBalance);
        }

        self.pending_recipient.set(None);
    }

    fn require_manager(&self) {
        if Some(self.env().caller()) != self.manager.get() {
            self.env().revert(HelixError::Unauthorized);
        }
    }
}

// ─── WarmupManager ──────────────────────────────────────────────────────────

/// Stake dispatched to an executor
#[odra::event]
pub struct StakeDispatched {
    /// Who the stake warms for
    pub recipient: Address,
    /// Executor carrying the warmup
    pub executor: Address,
    /// HLX staked
    pub amount: U256,
}

/// Warmup dispatcher
#[odra::module(events = [StakeDispatched])]
pub struct WarmupManager {
    /// HLX token address
    hlx: Var<Address>,
    /// Policy address
    policy: Var<Address>,
    /// Executor registry
    executors: Mapping<u32, Address>,
    /// Registry length
    executor_count: Var<u32>,
}

#[odra::module]
impl WarmupManager {
    /// Initialize the manager
    pub fn init(&mut self, hlx: Address) {
        self.hlx.set(hlx);
        self.policy.set(self.env().caller());
        self.executor_count.set(0);
    }

    /// Register an executor (policy only)
    pub fn add_executor(&mut self, executor: Address) {
        self.require_policy();
        let count = self.executor_count.get().unwrap_or(0);
        self.executors.set(&count, executor);
        self.executor_count.set(count + 1);
    }

    /// Stake through the first executor with free capacity
    pub fn stake(&mut self, amount: U256, recipient: Address) -> bool {
        if amount.is_zero() {
            self.env().revert(HelixError::ZeroAmount);
        }

        let executor = match self.find_available() {
            Some(executor) => executor,
            None => self.env().revert(HelixError::NoExecutorCapacity),
        };

        let caller = self.env().caller();
        let hlx = self.hlx.get().unwrap();
        let here = self.env().self_address();

        let pull_args = runtime_args! {
            "owner" => caller,
            "recipient" => here,
            "amount" => amount
        };
        let pull_def = CallDef::new("transfer_from", true, pull_args);
        let success: bool = self.env().call_contract(hlx, pull_def);
        if !success {
            self.env().revert(HelixError::InsufficientBalance);
        }

        let approve_args = runtime_args! {
            "spender" => executor,
            "amount" => amount
        };
        let approve_def = CallDef::new("approve", true, approve_args);
        self.env().call_contract::<bool>(hlx, approve_def);

        let stake_args = runtime_args! {
            "recipient" => recipient,
            "amount" => amount
        };
        let stake_def = CallDef::new("stake_for", true, stake_args);
        self.env().call_contract::<()>(executor, stake_def);

        self.env().emit_event(StakeDispatched {
            recipient,
            executor,
            amount,
        });
        true
    }

    /// Claim every warmed stake held for `recipient` across the registry
    pub fn claim(&mut self, recipient: Address) {
        let count = self.executor_count.get().unwrap_or(0);
        let mut claimed = false;

        for i in 0..count {
            if let Some(executor) = self.executors.get(&i) {
                let pending_def =
                    CallDef::new("get_pending_recipient", false, RuntimeArgs::new());
                let pending: Option<Address> =
                    self.env().call_contract(executor, pending_def);
                if pending == Some(recipient) {
                    let claim_args = runtime_args! {
                        "recipient" => recipient
                    };
                    let claim_def = CallDef::new("claim_for", true, claim_args);
                    self.env().call_contract::<()>(executor, claim_def);
                    claimed = true;
                }
            }
        }

        if !claimed {
            self.env().revert(HelixError::NothingToClaim);
        }
    }

    /// Registry length
    pub fn get_executor_count(&self) -> u32 {
        self.executor_count.get().unwrap_or(0)
    }

    /// Registered executor at an index
    pub fn get_executor(&self, index: u32) -> Option<Address> {
        self.executors.get(&index)
    }

    // ========== Internal Functions ==========

    fn find_available(&self) -> Option<Address> {
        let count = self.executor_count.get().unwrap_or(0);
        for i in 0..count {
            if let Some(executor) = self.executors.get(&i) {
                let call_def = CallDef::new("is_available", false, RuntimeArgs::new());
                let available: bool = self.env().call_contract(executor, call_def);
                if available {
                    return Some(executor);
                }
            }
        }
        None
    }

    fn require_policy(&self) {
        if Some(self.env().caller()) != self.policy.get() {
            self.env().revert(HelixError::Unauthorized);
        }
    }
}
