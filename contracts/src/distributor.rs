//! Distributor Contract
//!
//! Per-epoch reward policy. Each recipient earns a rate expressed in
//! hundred-thousandths of the HLX supply per epoch; the staking contract
//! calls `distribute` at every rebase boundary, which mints through the
//! treasury's reward-manager capability and reports the staking pool's own
//! allocation back.

use odra::prelude::*;
use odra::casper_types::{U256, RuntimeArgs, runtime_args};
use odra::CallDef;
use crate::errors::HelixError;
use crate::types::FEE_SCALE;

/// One reward recipient. Removal zeroes the rate; the slot stays.
#[odra::odra_type]
pub struct RecipientInfo {
    /// Reward destination
    pub recipient: Address,
    /// Rate in hundred-thousandths of HLX supply per epoch
    pub rate: U256,
}

/// Distributor Contract
#[odra::module]
pub struct Distributor {
    /// Treasury address (mint source)
    treasury: Var<Address>,
    /// HLX token address
    hlx: Var<Address>,
    /// Staking contract, the only caller of `distribute`
    staking: Var<Option<Address>>,
    /// Policy address
    policy: Var<Address>,
    /// Recipient table
    recipients: Mapping<u32, RecipientInfo>,
    /// Recipient table length (zero-rate slots included)
    recipient_count: Var<u32>,
}

#[odra::module]
impl Distributor {
    /// Initialize the distributor
    pub fn init(&mut self, treasury: Address, hlx: Address) {
        self.treasury.set(treasury);
        self.hlx.set(hlx);
        self.staking.set(None);
        self.policy.set(self.env().caller());
        self.recipient_count.set(0);
    }

    // ========== Policy Functions ==========

    /// Wire the staking contract
    pub fn set_staking(&mut self, staking: Address) {
        self.require_policy();
        self.staking.set(Some(staking));
    }

    /// Register a reward recipient
    pub fn add_recipient(&mut self, recipient: Address, rate: U256) {
        self.require_policy();
        if rate > U256::from(FEE_SCALE) {
            self.env().revert(HelixError::InvalidParameter);
        }
        let count = self.recipient_count.get().unwrap_or(0);
        self.recipients.set(&count, RecipientInfo { recipient, rate });
        self.recipient_count.set(count + 1);
    }

    /// Stop rewarding a slot (the slot remains, at rate zero)
    pub fn remove_recipient(&mut self, index: u32) {
        self.require_policy();
        let mut info = self.require_recipient(index);
        info.rate = U256::zero();
        self.recipients.set(&index, info);
    }

    /// Change a slot's rate
    pub fn set_rate(&mut self, index: u32, rate: U256) {
        self.require_policy();
        if rate > U256::from(FEE_SCALE) {
            self.env().revert(HelixError::InvalidParameter);
        }
        let mut info = self.require_recipient(index);
        info.rate = rate;
        self.recipients.set(&index, info);
    }

    // ========== Distribution ==========

    /// Mint every slot's epoch reward; returns the caller's (the staking
    /// contract's) own allocation. Staking contract only.
    pub fn distribute(&mut self) -> U256 {
        let caller = self.env().caller();
        match self.staking.get().flatten() {
            Some(staking) if staking == caller => {}
            _ => self.env().revert(HelixError::NotStakingContract),
        }

        let count = self.recipient_count.get().unwrap_or(0);
        let mut caller_share = U256::zero();

        for i in 0..count {
            if let Some(info) = self.recipients.get(&i) {
                if !info.rate.is_zero() {
                    let reward = self.next_reward_at(info.rate);
                    if !reward.is_zero() {
                        self.mint_rewards(info.recipient, reward);
                        if info.recipient == caller {
                            caller_share += reward;
                        }
                    }
                }
            }
        }

        caller_share
    }

    // ========== Views ==========

    /// Epoch reward for a given rate
    pub fn next_reward_at(&self, rate: U256) -> U256 {
        self.hlx_total_supply()
            .checked_mul(rate)
            .and_then(|v| v.checked_div(U256::from(FEE_SCALE)))
            .unwrap_or_else(|| self.env().revert(HelixError::ArithmeticFailure))
    }

    /// Combined epoch reward for one destination address
    pub fn next_reward_for(&self, recipient: Address) -> U256 {
        let count = self.recipient_count.get().unwrap_or(0);
        let mut reward = U256::zero();
        for i in 0..count {
            if let Some(info) = self.recipients.get(&i) {
                if info.recipient == recipient {
                    reward += self.next_reward_at(info.rate);
                }
            }
        }
        reward
    }

    /// Recipient slot
    pub fn get_recipient(&self, index: u32) -> Option<RecipientInfo> {
        self.recipients.get(&index)
    }

    /// Recipient table length
    pub fn get_recipient_count(&self) -> u32 {
        self.recipient_count.get().unwrap_or(0)
    }

    // ========== Internal Functions ==========

    fn mint_rewards(&mut self, recipient: Address, amount: U256) {
        let treasury = self.treasury.get().unwrap();
        let args = runtime_args! {
            "recipient" => recipient,
            "amount" => amount
        };
        let call_def = CallDef::new("mint_rewards", true, args);
        self.env().call_contract::<()>(treasury, call_def);
    }

    fn hlx_total_supply(&self) -> U256 {
        let hlx = self.hlx.get().unwrap();
        let call_def = CallDef::new("total_supply", false, RuntimeArgs::new());
        self.env().call_contract::<U256>(hlx, call_def)
    }

    fn require_recipient(&self, index: u32) -> RecipientInfo {
        match self.recipients.get(&index) {
            Some(info) => info,
            None => self.env().revert(HelixError::InvalidParameter),
        }
    }

    fn require_policy(&self) {
        if Some(self.env().caller()) != self.policy.get() {
            self.env().revert(HelixError::Unauthorized);
        }
    }
}
