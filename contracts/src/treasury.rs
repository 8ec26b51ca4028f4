//! Treasury Contract
//!
//! Custodies reserve assets and gates every mint of HLX behind a capability
//! matrix. Capabilities are granted in two phases: `queue` records the intent
//! and arms a delay, `toggle` finalizes it once the delay has elapsed.
//! Revocation is immediate; only grants are time-locked.
//!
//! Accepted reserves are themselves capabilities: an asset address holding
//! `PERMISSION_RESERVE_TOKEN` (or `PERMISSION_LIQUIDITY_TOKEN`, valued
//! through its registered bonding calculator) can back deposits.

use odra::prelude::*;
use odra::casper_types::{U256, runtime_args};
use odra::CallDef;
use crate::errors::HelixError;
use crate::types::{RESERVE_DECIMALS, TOKEN_DECIMALS};

/// Capability kinds (u8 wire ids)
pub const PERMISSION_RESERVE_DEPOSITOR: u8 = 0;
pub const PERMISSION_RESERVE_SPENDER: u8 = 1;
pub const PERMISSION_RESERVE_TOKEN: u8 = 2;
pub const PERMISSION_RESERVE_MANAGER: u8 = 3;
pub const PERMISSION_LIQUIDITY_DEPOSITOR: u8 = 4;
pub const PERMISSION_LIQUIDITY_TOKEN: u8 = 5;
pub const PERMISSION_LIQUIDITY_MANAGER: u8 = 6;
pub const PERMISSION_DEBTOR: u8 = 7;
pub const PERMISSION_REWARD_MANAGER: u8 = 8;
pub const PERMISSION_STAKED_TOKEN: u8 = 9;

const PERMISSION_KIND_COUNT: u8 = 10;

/// Capability grant queued
#[odra::event]
pub struct PermissionQueued {
    /// Capability kind
    pub kind: u8,
    /// Grantee
    pub account: Address,
    /// Earliest finalization time
    pub effective_at: u64,
}

/// Capability granted or revoked
#[odra::event]
pub struct PermissionToggled {
    /// Capability kind
    pub kind: u8,
    /// Grantee
    pub account: Address,
    /// Grant (true) or revocation (false)
    pub granted: bool,
}

/// Reserves pulled in and HLX minted against them
#[odra::event]
pub struct ReservesDeposited {
    /// Reserve asset
    pub asset: Address,
    /// Asset amount custodied
    pub amount: U256,
    /// HLX valuation of the deposit
    pub value: U256,
    /// HLX minted to the depositor
    pub minted: U256,
}

/// Reserves released
#[odra::event]
pub struct ReservesWithdrawn {
    /// Reserve asset
    pub asset: Address,
    /// Asset amount released
    pub amount: U256,
    /// HLX valuation of the release
    pub value: U256,
}

/// HLX minted from excess reserves
#[odra::event]
pub struct RewardsMinted {
    /// Reward manager exercising the capability
    pub caller: Address,
    /// Mint recipient
    pub recipient: Address,
    /// HLX minted
    pub amount: U256,
}

/// Treasury Contract
#[odra::module(events = [PermissionQueued, PermissionToggled, ReservesDeposited, ReservesWithdrawn, RewardsMinted])]
pub struct Treasury {
    /// HLX token address
    hlx: Var<Address>,
    /// Policy address (queues and toggles capabilities)
    policy: Var<Address>,
    /// Delay between queue and toggle
    queue_delay: Var<u64>,
    /// Capability matrix: (kind, account) -> granted
    permissions: Mapping<(u8, Address), bool>,
    /// Pending grants: (kind, account) -> earliest toggle time (0 = none)
    pending: Mapping<(u8, Address), u64>,
    /// Custodied balance per reserve asset
    reserves: Mapping<Address, U256>,
    /// Total reserves in HLX valuation
    total_reserves: Var<U256>,
    /// Bonding calculator per liquidity reserve
    calculators: Mapping<Address, Address>,
}

#[odra::module]
impl Treasury {
    /// Initialize the treasury
    pub fn init(&mut self, hlx: Address, queue_delay: u64) {
        self.hlx.set(hlx);
        self.policy.set(self.env().caller());
        self.queue_delay.set(queue_delay);
        self.total_reserves.set(U256::zero());
    }

    // ========== Capability Matrix ==========

    /// Queue a capability grant (policy only)
    pub fn queue(&mut self, kind: u8, account: Address) {
        self.require_policy();
        self.require_valid_kind(kind);

        let effective_at = self.env().get_block_time() + self.queue_delay.get().unwrap_or(0);
        self.pending.set(&(kind, account), effective_at);

        self.env().emit_event(PermissionQueued {
            kind,
            account,
            effective_at,
        });
    }

    /// Finalize a queued grant (policy only).
    ///
    /// For liquidity reserves, `calculator` designates the valuation
    /// strategy consulted by `value_of_token`.
    pub fn toggle(&mut self, kind: u8, account: Address, calculator: Option<Address>) {
        self.require_policy();
        self.require_valid_kind(kind);

        let effective_at = self.pending.get(&(kind, account)).unwrap_or(0);
        if effective_at == 0 {
            self.env().revert(HelixError::NotQueued);
        }
        if self.env().get_block_time() < effective_at {
            self.env().revert(HelixError::QueueStillPending);
        }
        if self.has_permission(kind, account) {
            self.env().revert(HelixError::AlreadyFinalized);
        }

        self.pending.set(&(kind, account), 0);
        self.permissions.set(&(kind, account), true);

        if kind == PERMISSION_LIQUIDITY_TOKEN {
            if let Some(calculator) = calculator {
                self.calculators.set(&account, calculator);
            }
        }

        self.env().emit_event(PermissionToggled {
            kind,
            account,
            granted: true,
        });
    }

    /// Revoke a granted capability (policy only, immediate)
    pub fn revoke(&mut self, kind: u8, account: Address) {
        self.require_policy();
        self.require_valid_kind(kind);

        if !self.has_permission(kind, account) {
            self.env().revert(HelixError::InvalidParameter);
        }
        self.permissions.set(&(kind, account), false);

        self.env().emit_event(PermissionToggled {
            kind,
            account,
            granted: false,
        });
    }

    /// Check a capability
    pub fn has_permission(&self, kind: u8, account: Address) -> bool {
        self.permissions.get(&(kind, account)).unwrap_or(false)
    }

    /// Pending grant's earliest toggle time (0 = none)
    pub fn pending_grant(&self, kind: u8, account: Address) -> u64 {
        self.pending.get(&(kind, account)).unwrap_or(0)
    }

    /// Hand policy to a new address (policy only)
    pub fn transfer_policy(&mut self, new_policy: Address) {
        self.require_policy();
        self.policy.set(new_policy);
    }

    // ========== Reserve Operations ==========

    /// Accept reserves and mint HLX against them.
    ///
    /// The caller keeps `value - profit`; the `profit` portion stays as
    /// unbacked excess reserves for the reward manager to distribute.
    pub fn deposit(&mut self, amount: U256, asset: Address, profit: U256) -> U256 {
        if amount.is_zero() {
            self.env().revert(HelixError::ZeroAmount);
        }

        let caller = self.env().caller();
        let depositor_kind = if self.has_permission(PERMISSION_RESERVE_TOKEN, asset) {
            PERMISSION_RESERVE_DEPOSITOR
        } else if self.has_permission(PERMISSION_LIQUIDITY_TOKEN, asset) {
            PERMISSION_LIQUIDITY_DEPOSITOR
        } else {
            self.env().revert(HelixError::NotAccepted)
        };
        if !self.has_permission(depositor_kind, caller) {
            self.env().revert(HelixError::Unauthorized);
        }

        let value = self.value_of_token(asset, amount);
        if profit > value {
            self.env().revert(HelixError::InvalidParameter);
        }
        let minted = value - profit;

        let asset_balance = self.reserves.get(&asset).unwrap_or(U256::zero());
        self.reserves.set(&asset, asset_balance + amount);
        let total = self.total_reserves.get().unwrap_or(U256::zero());
        self.total_reserves.set(total + value);

        self.pull_asset(asset, caller, amount);
        if !minted.is_zero() {
            self.mint_hlx(caller, minted);
        }

        self.env().emit_event(ReservesDeposited {
            asset,
            amount,
            value,
            minted,
        });
        minted
    }

    /// Release reserves against burned HLX (reserve spender only)
    pub fn withdraw(&mut self, amount: U256, asset: Address) {
        if amount.is_zero() {
            self.env().revert(HelixError::ZeroAmount);
        }
        let caller = self.env().caller();
        if !self.has_permission(PERMISSION_RESERVE_SPENDER, caller) {
            self.env().revert(HelixError::Unauthorized);
        }
        if !self.has_permission(PERMISSION_RESERVE_TOKEN, asset) {
            self.env().revert(HelixError::NotAccepted);
        }

        let value = self.value_of_token(asset, amount);
        self.debit_reserves(asset, amount, value);

        self.burn_hlx_from(caller, value);
        self.send_asset(asset, caller, amount);

        self.env().emit_event(ReservesWithdrawn {
            asset,
            amount,
            value,
        });
    }

    /// Pull reserves without burning, limited to excess reserves
    /// (reserve/liquidity manager only)
    pub fn manage(&mut self, amount: U256, asset: Address) {
        if amount.is_zero() {
            self.env().revert(HelixError::ZeroAmount);
        }
        let caller = self.env().caller();
        let manager_kind = if self.has_permission(PERMISSION_LIQUIDITY_TOKEN, asset) {
            PERMISSION_LIQUIDITY_MANAGER
        } else {
            PERMISSION_RESERVE_MANAGER
        };
        if !self.has_permission(manager_kind, caller) {
            self.env().revert(HelixError::Unauthorized);
        }

        let value = self.value_of_token(asset, amount);
        if value > self.excess_reserves() {
            self.env().revert(HelixError::InsufficientReserves);
        }
        self.debit_reserves(asset, amount, value);

        self.send_asset(asset, caller, amount);

        self.env().emit_event(ReservesWithdrawn {
            asset,
            amount,
            value,
        });
    }

    /// Mint HLX from excess reserves (reward manager only)
    pub fn mint_rewards(&mut self, recipient: Address, amount: U256) {
        if amount.is_zero() {
            self.env().revert(HelixError::ZeroAmount);
        }
        let caller = self.env().caller();
        if !self.has_permission(PERMISSION_REWARD_MANAGER, caller) {
            self.env().revert(HelixError::Unauthorized);
        }
        if amount > self.excess_reserves() {
            self.env().revert(HelixError::InsufficientReserves);
        }

        self.mint_hlx(recipient, amount);

        self.env().emit_event(RewardsMinted {
            caller,
            recipient,
            amount,
        });
    }

    // ========== Views ==========

    /// HLX valuation of a reserve amount
    pub fn value_of_token(&self, asset: Address, amount: U256) -> U256 {
        if self.has_permission(PERMISSION_RESERVE_TOKEN, asset) {
            // stable reserve: decimal conversion only
            amount * U256::from(10u64).pow(U256::from(TOKEN_DECIMALS))
                / U256::from(10u64).pow(U256::from(RESERVE_DECIMALS))
        } else if self.has_permission(PERMISSION_LIQUIDITY_TOKEN, asset) {
            let calculator = match self.calculators.get(&asset) {
                Some(calculator) => calculator,
                None => self.env().revert(HelixError::InvalidParameter),
            };
            let args = runtime_args! {
                "pair" => asset,
                "amount" => amount
            };
            let call_def = CallDef::new("valuation", false, args);
            self.env().call_contract::<U256>(calculator, call_def)
        } else {
            self.env().revert(HelixError::NotAccepted)
        }
    }

    /// Reserves in excess of the HLX supply they back
    pub fn excess_reserves(&self) -> U256 {
        let total = self.total_reserves.get().unwrap_or(U256::zero());
        let supply = self.hlx_total_supply();
        if total < supply {
            U256::zero()
        } else {
            total - supply
        }
    }

    /// Total reserves in HLX valuation
    pub fn get_total_reserves(&self) -> U256 {
        self.total_reserves.get().unwrap_or(U256::zero())
    }

    /// Custodied balance of one asset
    pub fn reserve_balance(&self, asset: Address) -> U256 {
        self.reserves.get(&asset).unwrap_or(U256::zero())
    }

    /// Registered bonding calculator for a liquidity reserve
    pub fn calculator_for(&self, asset: Address) -> Option<Address> {
        self.calculators.get(&asset)
    }

    /// Get the policy address
    pub fn get_policy(&self) -> Option<Address> {
        self.policy.get()
    }

    // ========== Internal Functions ==========

    fn debit_reserves(&mut self, asset: Address, amount: U256, value: U256) {
        let asset_balance = self.reserves.get(&asset).unwrap_or(U256::zero());
        if asset_balance < amount {
            self.env().revert(HelixError::InsufficientReserves);
        }
        self.reserves.set(&asset, asset_balance - amount);

        let total = self.total_reserves.get().unwrap_or(U256::zero());
        if total < value {
            self.env().revert(HelixError::InsufficientReserves);
        }
        self.total_reserves.set(total - value);
    }

    fn pull_asset(&mut self, asset: Address, from: Address, amount: U256) {
        let treasury = self.env().self_address();
        let args = runtime_args! {
            "owner" => from,
            "recipient" => treasury,
            "amount" => amount
        };
        let call_def = CallDef::new("transfer_from", true, args);
        let success: bool = self.env().call_contract(asset, call_def);
        if !success {
            self.env().revert(HelixError::InsufficientBalance);
        }
    }

    fn send_asset(&mut self, asset: Address, to: Address, amount: U256) {
        let args = runtime_args! {
            "recipient" => to,
            "amount" => amount
        };
        let call_def = CallDef::new("transfer", true, args);
        let success: bool = self.env().call_contract(asset, call_def);
        if !success {
            self.env().revert(HelixError::InsufficientBalance);
        }
    }

    fn mint_hlx(&mut self, to: Address, amount: U256) {
        let hlx = self.hlx.get().unwrap();
        let args = runtime_args! {
            "to" => to,
            "amount" => amount
        };
        let call_def = CallDef::new("mint", true, args);
        self.env().call_contract::<()>(hlx, call_def);
    }

    fn burn_hlx_from(&mut self, from: Address, amount: U256) {
        let hlx = self.hlx.get().unwrap();
        let args = runtime_args! {
            "from" => from,
            "amount" => amount
        };
        let call_def = CallDef::new("burn_from", true, args);
        self.env().call_contract::<()>(hlx, call_def);
    }

    fn hlx_total_supply(&self) -> U256 {
        let hlx = self.hlx.get().unwrap();
        let call_def = CallDef::new("total_supply", false, odra::casper_types::RuntimeArgs::new());
        self.env().call_contract::<U256>(hlx, call_def)
    }

    fn require_policy(&self) {
        if Some(self.env().caller()) != self.policy.get() {
            self.env().revert(HelixError::Unauthorized);
        }
    }

    fn require_valid_kind(&self, kind: u8) {
        if kind >= PERMISSION_KIND_COUNT {
            self.env().revert(HelixError::InvalidParameter);
        }
    }
}
