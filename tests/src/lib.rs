//! CSPR-Helix Integration Tests
//!
//! Flow tests driving the deployed stack through the Odra host test
//! environment, plus the mock fixtures they need (a free-mint stable
//! reserve and an LP pair).

use odra::prelude::*;
use odra::casper_types::U256;

// ─── Test Fixtures ──────────────────────────────────────────────────────────

/// Free-mint CEP-18-style token standing in for an 18-decimal stable reserve
#[odra::module]
pub struct MockStable {
    balances: Mapping<Address, U256>,
    allowances: Mapping<(Address, Address), U256>,
    total_supply: Var<U256>,
}

#[odra::module]
impl MockStable {
    pub fn init(&mut self) {
        self.total_supply.set(U256::zero());
    }

    pub fn mint(&mut self, to: Address, amount: U256) {
        let balance = self.balances.get(&to).unwrap_or(U256::zero());
        self.balances.set(&to, balance + amount);
        self.total_supply
            .set(self.total_supply.get().unwrap_or(U256::zero()) + amount);
    }

    pub fn total_supply(&self) -> U256 {
        self.total_supply.get().unwrap_or(U256::zero())
    }

    pub fn balance_of(&self, account: Address) -> U256 {
        self.balances.get(&account).unwrap_or(U256::zero())
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.allowances.get(&(owner, spender)).unwrap_or(U256::zero())
    }

    pub fn approve(&mut self, spender: Address, amount: U256) -> bool {
        let owner = self.env().caller();
        self.allowances.set(&(owner, spender), amount);
        true
    }

    pub fn transfer(&mut self, recipient: Address, amount: U256) -> bool {
        let sender = self.env().caller();
        self.transfer_internal(sender, recipient, amount)
    }

    pub fn transfer_from(&mut self, owner: Address, recipient: Address, amount: U256) -> bool {
        let spender = self.env().caller();
        let allowance = self.allowance(owner, spender);
        if allowance < amount {
            return false;
        }
        self.allowances.set(&(owner, spender), allowance - amount);
        self.transfer_internal(owner, recipient, amount)
    }

    fn transfer_internal(&mut self, from: Address, to: Address, amount: U256) -> bool {
        let from_balance = self.balances.get(&from).unwrap_or(U256::zero());
        if from_balance < amount {
            return false;
        }
        self.balances.set(&from, from_balance - amount);
        let to_balance = self.balances.get(&to).unwrap_or(U256::zero());
        self.balances.set(&to, to_balance + amount);
        true
    }
}

/// LP pair fixture: a free-mint LP token plus settable pool reserves
#[odra::module]
pub struct MockPair {
    balances: Mapping<Address, U256>,
    allowances: Mapping<(Address, Address), U256>,
    total_supply: Var<U256>,
    reserve0: Var<U256>,
    reserve1: Var<U256>,
}

#[odra::module]
impl MockPair {
    pub fn init(&mut self) {
        self.total_supply.set(U256::zero());
        self.reserve0.set(U256::zero());
        self.reserve1.set(U256::zero());
    }

    pub fn set_reserves(&mut self, reserve0: U256, reserve1: U256) {
        self.reserve0.set(reserve0);
        self.reserve1.set(reserve1);
    }

    pub fn get_reserves(&self) -> (U256, U256) {
        (
            self.reserve0.get().unwrap_or(U256::zero()),
            self.reserve1.get().unwrap_or(U256::zero()),
        )
    }

    pub fn mint(&mut self, to: Address, amount: U256) {
        let balance = self.balances.get(&to).unwrap_or(U256::zero());
        self.balances.set(&to, balance + amount);
        self.total_supply
            .set(self.total_supply.get().unwrap_or(U256::zero()) + amount);
    }

    pub fn total_supply(&self) -> U256 {
        self.total_supply.get().unwrap_or(U256::zero())
    }

    pub fn balance_of(&self, account: Address) -> U256 {
        self.balances.get(&account).unwrap_or(U256::zero())
    }

    pub fn approve(&mut self, spender: Address, amount: U256) -> bool {
        let owner = self.env().caller();
        self.allowances.set(&(owner, spender), amount);
        true
    }

    pub fn transfer(&mut self, recipient: Address, amount: U256) -> bool {
        let sender = self.env().caller();
        self.transfer_internal(sender, recipient, amount)
    }

    pub fn transfer_from(&mut self, owner: Address, recipient: Address, amount: U256) -> bool {
        let spender = self.env().caller();
        let allowance = self.allowances.get(&(owner, spender)).unwrap_or(U256::zero());
        if allowance < amount {
            return false;
        }
        self.allowances.set(&(owner, spender), allowance - amount);
        self.transfer_internal(owner, recipient, amount)
    }

    fn transfer_internal(&mut self, from: Address, to: Address, amount: U256) -> bool {
        let from_balance = self.balances.get(&from).unwrap_or(U256::zero());
        if from_balance < amount {
            return false;
        }
        self.balances.set(&from, from_balance - amount);
        let to_balance = self.balances.get(&to).unwrap_or(U256::zero());
        self.balances.set(&to, to_balance + amount);
        true
    }
}

// ─── Shared Helpers ─────────────────────────────────────────────────────────

#[cfg(test)]
mod common {
    use super::{MockStable, MockStableHostRef};
    use odra::casper_types::U256;
    use odra::host::{Deployer, HostEnv, NoArgs};
    use odra::prelude::*;

    use cspr_helix_contracts::bond_depository::{BondDepository, BondDepositoryHostRef, BondDepositoryInitArgs};
    use cspr_helix_contracts::protocol_token::{HelixToken, HelixTokenHostRef};
    use cspr_helix_contracts::treasury::{
        Treasury, TreasuryHostRef, TreasuryInitArgs, PERMISSION_RESERVE_DEPOSITOR,
        PERMISSION_RESERVE_TOKEN,
    };
    use cspr_helix_contracts::types::PricingKind;

    pub fn e18(n: u64) -> U256 {
        U256::from(n) * U256::from(10u64).pow(U256::from(18u64))
    }

    pub fn e9(n: u64) -> U256 {
        U256::from(n) * U256::from(10u64).pow(U256::from(9u64))
    }

    pub struct ReserveFixture {
        pub env: HostEnv,
        pub hlx: HelixTokenHostRef,
        pub treasury: TreasuryHostRef,
        pub stable: MockStableHostRef,
    }

    /// Deploy HLX + treasury + stable, with the treasury wired as the HLX
    /// vault. Caller (account 0) is policy.
    pub fn reserve_fixture(queue_delay: u64) -> ReserveFixture {
        let env = odra_test::env();
        let mut hlx = HelixToken::deploy(&env, NoArgs);
        let treasury = Treasury::deploy(
            &env,
            TreasuryInitArgs {
                hlx: hlx.address().clone(),
                queue_delay,
            },
        );
        let stable = MockStable::deploy(&env, NoArgs);
        hlx.set_vault(treasury.address().clone());
        ReserveFixture {
            env,
            hlx,
            treasury,
            stable,
        }
    }

    /// Queue + toggle a capability in one step (queue delay must be zero)
    pub fn grant(treasury: &mut TreasuryHostRef, kind: u8, account: Address) {
        treasury.queue(kind, account);
        treasury.toggle(kind, account, None);
    }

    /// Accept the stable as a reserve and let the deployer deposit; then
    /// seed `supply` HLX by depositing matching reserves at zero profit.
    pub fn seed_supply(fixture: &mut ReserveFixture, supply_hlx: u64) {
        let deployer = fixture.env.get_account(0);
        let stable_addr = fixture.stable.address().clone();
        grant(&mut fixture.treasury, PERMISSION_RESERVE_TOKEN, stable_addr);
        grant(&mut fixture.treasury, PERMISSION_RESERVE_DEPOSITOR, deployer);
        fixture.stable.mint(deployer, e18(supply_hlx));
        fixture
            .stable
            .approve(fixture.treasury.address().clone(), e18(supply_hlx));
        fixture
            .treasury
            .deposit(e18(supply_hlx), stable_addr, U256::zero());
    }

    pub struct BondFixture {
        pub env: HostEnv,
        pub hlx: HelixTokenHostRef,
        pub treasury: TreasuryHostRef,
        pub stable: MockStableHostRef,
        pub bond: BondDepositoryHostRef,
    }

    /// Reserve fixture + a bond depository authorized as reserve depositor,
    /// with 100_000 HLX of seeded supply. Terms are NOT initialized.
    pub fn bond_fixture() -> BondFixture {
        let mut fixture = reserve_fixture(0);
        seed_supply(&mut fixture, 100_000);

        let deployer = fixture.env.get_account(0);
        let bond = BondDepository::deploy(
            &fixture.env,
            BondDepositoryInitArgs {
                hlx: fixture.hlx.address().clone(),
                principle: fixture.stable.address().clone(),
                treasury: fixture.treasury.address().clone(),
                dao: deployer,
                pricing: PricingKind::DebtRatio,
            },
        );
        let bond_addr = bond.address().clone();
        grant(&mut fixture.treasury, PERMISSION_RESERVE_DEPOSITOR, bond_addr);

        BondFixture {
            env: fixture.env,
            hlx: fixture.hlx,
            treasury: fixture.treasury,
            stable: fixture.stable,
            bond,
        }
    }

    /// Standard test terms: par floor, 8640 vesting, 1% max payout, no fee,
    /// effectively unlimited debt, no optional features.
    pub fn init_default_terms(bond: &mut BondDepositoryHostRef) {
        bond.initialize_bond_terms(
            U256::from(10_000u64), // control variable
            8_640,                 // vesting term
            U256::from(10_000u64), // minimum price (par)
            0,                     // max discount
            U256::from(1000u64),   // max payout (1% of supply)
            U256::zero(),          // fee
            e18(50_000),           // max debt
            U256::zero(),          // initial debt
            U256::zero(),          // sold bonds limit
            false,                 // use whitelist
            false,                 // use circuit breaker
            0,                     // premature return rate
        );
    }

    /// Mint + approve + bond a deposit from `user` at a generous price bound
    pub fn user_deposit(fixture: &mut BondFixture, user: Address, stable_amount: U256) -> U256 {
        let deployer = fixture.env.get_account(0);
        fixture.env.set_caller(deployer);
        fixture.stable.mint(user, stable_amount);

        fixture.env.set_caller(user);
        fixture
            .stable
            .approve(fixture.bond.address().clone(), stable_amount);
        let payout = fixture
            .bond
            .deposit(stable_amount, U256::from(60_000u64), user);
        fixture.env.set_caller(deployer);
        payout
    }
}

// ─── Treasury ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod treasury_tests {
    use super::common::*;
    use odra::casper_types::U256;
    use pretty_assertions::assert_eq;

    use cspr_helix_contracts::errors::HelixError;
    use cspr_helix_contracts::treasury::{
        PERMISSION_RESERVE_DEPOSITOR, PERMISSION_RESERVE_MANAGER, PERMISSION_RESERVE_TOKEN,
        PERMISSION_REWARD_MANAGER,
    };

    #[test]
    fn test_queue_toggle_roundtrip_grants() {
        let mut f = reserve_fixture(0);
        let account = f.env.get_account(1);

        f.treasury.queue(PERMISSION_RESERVE_DEPOSITOR, account);
        assert!(!f.treasury.has_permission(PERMISSION_RESERVE_DEPOSITOR, account));
        f.treasury.toggle(PERMISSION_RESERVE_DEPOSITOR, account, None);
        assert!(f.treasury.has_permission(PERMISSION_RESERVE_DEPOSITOR, account));
    }

    #[test]
    fn test_toggle_without_queue_fails() {
        let mut f = reserve_fixture(0);
        let account = f.env.get_account(1);

        let err = f
            .treasury
            .try_toggle(PERMISSION_RESERVE_DEPOSITOR, account, None)
            .unwrap_err();
        assert_eq!(err, HelixError::NotQueued.into());
    }

    #[test]
    fn test_toggle_twice_is_already_finalized() {
        let mut f = reserve_fixture(0);
        let account = f.env.get_account(1);

        f.treasury.queue(PERMISSION_RESERVE_DEPOSITOR, account);
        f.treasury.toggle(PERMISSION_RESERVE_DEPOSITOR, account, None);
        // a second queue + toggle on a granted pair is redundant
        f.treasury.queue(PERMISSION_RESERVE_DEPOSITOR, account);
        let err = f
            .treasury
            .try_toggle(PERMISSION_RESERVE_DEPOSITOR, account, None)
            .unwrap_err();
        assert_eq!(err, HelixError::AlreadyFinalized.into());
    }

    #[test]
    fn test_queue_requires_policy() {
        let mut f = reserve_fixture(0);
        let outsider = f.env.get_account(1);

        f.env.set_caller(outsider);
        let err = f
            .treasury
            .try_queue(PERMISSION_RESERVE_DEPOSITOR, outsider)
            .unwrap_err();
        assert_eq!(err, HelixError::Unauthorized.into());
    }

    #[test]
    fn test_queue_delay_enforced() {
        let mut f = reserve_fixture(500);
        let account = f.env.get_account(1);

        f.treasury.queue(PERMISSION_RESERVE_DEPOSITOR, account);
        let err = f
            .treasury
            .try_toggle(PERMISSION_RESERVE_DEPOSITOR, account, None)
            .unwrap_err();
        assert_eq!(err, HelixError::QueueStillPending.into());

        f.env.advance_block_time(500);
        f.treasury.toggle(PERMISSION_RESERVE_DEPOSITOR, account, None);
        assert!(f.treasury.has_permission(PERMISSION_RESERVE_DEPOSITOR, account));
    }

    #[test]
    fn test_deposit_mints_value_minus_profit() {
        let mut f = reserve_fixture(0);
        let deployer = f.env.get_account(0);
        let stable_addr = f.stable.address().clone();

        grant(&mut f.treasury, PERMISSION_RESERVE_TOKEN, stable_addr);
        grant(&mut f.treasury, PERMISSION_RESERVE_DEPOSITOR, deployer);

        f.stable.mint(deployer, e18(100));
        f.stable.approve(f.treasury.address().clone(), e18(100));
        let minted = f.treasury.deposit(e18(100), stable_addr, e9(10));

        // value of 100e18 stable is 100 HLX; 10 stays as excess reserves
        assert_eq!(minted, e9(90));
        assert_eq!(f.hlx.balance_of(deployer), e9(90));
        assert_eq!(f.treasury.get_total_reserves(), e9(100));
        assert_eq!(f.treasury.excess_reserves(), e9(10));
        assert_eq!(f.stable.balance_of(f.treasury.address().clone()), e18(100));
    }

    #[test]
    fn test_deposit_zero_amount_fails() {
        let mut f = reserve_fixture(0);
        let deployer = f.env.get_account(0);
        let stable_addr = f.stable.address().clone();
        grant(&mut f.treasury, PERMISSION_RESERVE_TOKEN, stable_addr);
        grant(&mut f.treasury, PERMISSION_RESERVE_DEPOSITOR, deployer);

        let err = f
            .treasury
            .try_deposit(U256::zero(), stable_addr, U256::zero())
            .unwrap_err();
        assert_eq!(err, HelixError::ZeroAmount.into());
    }

    #[test]
    fn test_deposit_without_capability_fails() {
        let mut f = reserve_fixture(0);
        let stable_addr = f.stable.address().clone();
        grant(&mut f.treasury, PERMISSION_RESERVE_TOKEN, stable_addr);

        let err = f
            .treasury
            .try_deposit(e18(1), stable_addr, U256::zero())
            .unwrap_err();
        assert_eq!(err, HelixError::Unauthorized.into());
    }

    #[test]
    fn test_deposit_unaccepted_asset_fails() {
        let mut f = reserve_fixture(0);
        let stable_addr = f.stable.address().clone();

        let err = f
            .treasury
            .try_deposit(e18(1), stable_addr, U256::zero())
            .unwrap_err();
        assert_eq!(err, HelixError::NotAccepted.into());
    }

    #[test]
    fn test_manage_is_limited_to_excess_reserves() {
        let mut f = reserve_fixture(0);
        let deployer = f.env.get_account(0);
        let stable_addr = f.stable.address().clone();

        grant(&mut f.treasury, PERMISSION_RESERVE_TOKEN, stable_addr);
        grant(&mut f.treasury, PERMISSION_RESERVE_DEPOSITOR, deployer);
        grant(&mut f.treasury, PERMISSION_RESERVE_MANAGER, deployer);

        // 100 reserves backing 90 supply leaves 10 of headroom
        f.stable.mint(deployer, e18(100));
        f.stable.approve(f.treasury.address().clone(), e18(100));
        f.treasury.deposit(e18(100), stable_addr, e9(10));

        let err = f.treasury.try_manage(e18(11), stable_addr).unwrap_err();
        assert_eq!(err, HelixError::InsufficientReserves.into());

        f.treasury.manage(e18(10), stable_addr);
        assert_eq!(f.treasury.get_total_reserves(), e9(90));
        assert_eq!(f.stable.balance_of(deployer), e18(10));
    }

    #[test]
    fn test_mint_rewards_capped_by_excess() {
        let mut f = reserve_fixture(0);
        let deployer = f.env.get_account(0);
        let recipient = f.env.get_account(2);
        let stable_addr = f.stable.address().clone();

        grant(&mut f.treasury, PERMISSION_RESERVE_TOKEN, stable_addr);
        grant(&mut f.treasury, PERMISSION_RESERVE_DEPOSITOR, deployer);
        grant(&mut f.treasury, PERMISSION_REWARD_MANAGER, deployer);

        f.stable.mint(deployer, e18(100));
        f.stable.approve(f.treasury.address().clone(), e18(100));
        f.treasury.deposit(e18(100), stable_addr, e9(10));

        let err = f.treasury.try_mint_rewards(recipient, e9(11)).unwrap_err();
        assert_eq!(err, HelixError::InsufficientReserves.into());

        f.treasury.mint_rewards(recipient, e9(10));
        assert_eq!(f.hlx.balance_of(recipient), e9(10));
    }

    #[test]
    fn test_withdraw_burns_hlx_for_reserves() {
        let mut f = reserve_fixture(0);
        let deployer = f.env.get_account(0);
        let stable_addr = f.stable.address().clone();

        grant(&mut f.treasury, PERMISSION_RESERVE_TOKEN, stable_addr);
        grant(&mut f.treasury, PERMISSION_RESERVE_DEPOSITOR, deployer);
        grant(&mut f.treasury, PERMISSION_RESERVE_SPENDER, deployer);

        f.stable.mint(deployer, e18(100));
        f.stable.approve(f.treasury.address().clone(), e18(100));
        f.treasury.deposit(e18(100), stable_addr, U256::zero());

        // withdrawing reserves burns the matching HLX
        f.hlx.approve(f.treasury.address().clone(), e9(40));
        f.treasury.withdraw(e18(40), stable_addr);
        assert_eq!(f.hlx.balance_of(deployer), e9(60));
        assert_eq!(f.stable.balance_of(deployer), e18(40));
        assert_eq!(f.treasury.get_total_reserves(), e9(60));
        assert_eq!(f.hlx.total_supply(), e9(60));
    }

    #[test]
    fn test_revoke_clears_capability_immediately() {
        let mut f = reserve_fixture(0);
        let account = f.env.get_account(1);

        grant(&mut f.treasury, PERMISSION_RESERVE_DEPOSITOR, account);
        f.treasury.revoke(PERMISSION_RESERVE_DEPOSITOR, account);
        assert!(!f.treasury.has_permission(PERMISSION_RESERVE_DEPOSITOR, account));

        // revoking an ungranted capability is an error
        let err = f
            .treasury
            .try_revoke(PERMISSION_RESERVE_DEPOSITOR, account)
            .unwrap_err();
        assert_eq!(err, HelixError::InvalidParameter.into());
    }

    #[test]
    fn test_hlx_mint_gated_to_vault() {
        let mut f = reserve_fixture(0);
        let outsider = f.env.get_account(1);

        f.env.set_caller(outsider);
        let err = f.hlx.try_mint(outsider, e9(1)).unwrap_err();
        assert_eq!(err, HelixError::NotVault.into());
    }
}

// ─── Bond Depository ────────────────────────────────────────────────────────

#[cfg(test)]
mod bond_tests {
    use super::common::*;
    use odra::casper_types::U256;
    use pretty_assertions::assert_eq;

    use cspr_helix_contracts::errors::HelixError;

    #[test]
    fn test_initialize_twice_fails() {
        let mut f = bond_fixture();
        init_default_terms(&mut f.bond);

        let err = f
            .bond
            .try_initialize_bond_terms(
                U256::from(10_000u64),
                8_640,
                U256::from(10_000u64),
                0,
                U256::from(1000u64),
                U256::zero(),
                e18(50_000),
                U256::zero(),
                U256::zero(),
                false,
                false,
                0,
            )
            .unwrap_err();
        assert_eq!(err, HelixError::AlreadyInitialized.into());
    }

    #[test]
    fn test_deposit_before_terms_fails() {
        let mut f = bond_fixture();
        let user = f.env.get_account(1);
        let err = f
            .bond
            .try_deposit(e18(1), U256::from(60_000u64), user)
            .unwrap_err();
        assert_eq!(err, HelixError::NotInitialized.into());
    }

    #[test]
    fn test_deposit_records_bond_and_debt() {
        let mut f = bond_fixture();
        init_default_terms(&mut f.bond);
        let user = f.env.get_account(1);

        // at zero debt the par floor prices the 1000-stable deposit 1:1
        let payout = user_deposit(&mut f, user, e18(1000));
        assert_eq!(payout, e9(1000));

        assert_eq!(f.bond.bond_count(user), 1);
        assert_eq!(f.bond.open_bond_count(user), 1);
        let record = f.bond.bond_info(user, 0);
        assert_eq!(record.payout, e9(1000));
        assert_eq!(record.vesting, 8_640);
        assert_eq!(record.price_paid, U256::from(10_000u64));

        // debt took on the full payout; escrow sits in the depository
        assert_eq!(f.bond.current_debt_decayed(), e9(1000));
        assert_eq!(f.hlx.balance_of(f.bond.address().clone()), e9(1000));
        // reserves grew by the deposit
        assert_eq!(f.stable.balance_of(f.treasury.address().clone()), e18(101_000));
    }

    #[test]
    fn test_deposit_slippage_exceeded() {
        let mut f = bond_fixture();
        init_default_terms(&mut f.bond);
        let user = f.env.get_account(1);

        f.stable.mint(user, e18(10));
        f.env.set_caller(user);
        f.stable.approve(f.bond.address().clone(), e18(10));
        let err = f
            .bond
            .try_deposit(e18(10), U256::from(9_999u64), user)
            .unwrap_err();
        assert_eq!(err, HelixError::SlippageExceeded.into());
    }

    #[test]
    fn test_deposit_above_max_payout_fails() {
        let mut f = bond_fixture();
        init_default_terms(&mut f.bond);
        let user = f.env.get_account(1);

        // max payout is 1% of 100_000 HLX supply; 1001 crosses it
        f.stable.mint(user, e18(1001));
        f.env.set_caller(user);
        f.stable.approve(f.bond.address().clone(), e18(1001));
        let err = f
            .bond
            .try_deposit(e18(1001), U256::from(60_000u64), user)
            .unwrap_err();
        assert_eq!(err, HelixError::PayoutTooLarge.into());
    }

    #[test]
    fn test_max_debt_exceeded() {
        let mut f = bond_fixture();
        f.bond.initialize_bond_terms(
            U256::from(10_000u64),
            8_640,
            U256::from(10_000u64),
            0,
            U256::from(1000u64),
            U256::zero(),
            e9(1500), // max debt only fits one full bond
            U256::zero(),
            U256::zero(),
            false,
            false,
            0,
        );
        let user = f.env.get_account(1);

        user_deposit(&mut f, user, e18(1000));

        f.stable.mint(user, e18(1000));
        f.env.set_caller(user);
        f.stable.approve(f.bond.address().clone(), e18(1000));
        let err = f
            .bond
            .try_deposit(e18(1000), U256::from(60_000u64), user)
            .unwrap_err();
        assert_eq!(err, HelixError::MaxDebtExceeded.into());
    }

    #[test]
    fn test_debt_decays_toward_zero() {
        let mut f = bond_fixture();
        init_default_terms(&mut f.bond);
        let user = f.env.get_account(1);

        user_deposit(&mut f, user, e18(1000));
        assert_eq!(f.bond.current_debt_decayed(), e9(1000));

        f.env.advance_block_time(4_320);
        assert_eq!(f.bond.current_debt_decayed(), e9(500));

        f.env.advance_block_time(4_320);
        assert_eq!(f.bond.current_debt_decayed(), U256::zero());
    }

    #[test]
    fn test_redeem_half_then_full_closes_record() {
        let mut f = bond_fixture();
        init_default_terms(&mut f.bond);
        let user = f.env.get_account(1);

        let payout = user_deposit(&mut f, user, e18(1000));

        // halfway through vesting, half the payout releases
        f.env.advance_block_time(4_320);
        let released = f.bond.redeem(user, 0);
        assert_eq!(released, e9(500));
        assert_eq!(f.hlx.balance_of(user), e9(500));

        // past full vesting the remainder releases and the record closes
        f.env.advance_block_time(10_000);
        let released = f.bond.redeem(user, 0);
        assert_eq!(released, e9(500));
        assert_eq!(f.hlx.balance_of(user), payout);
        assert_eq!(f.bond.open_bond_count(user), 0);

        let err = f.bond.try_redeem(user, 0).unwrap_err();
        assert_eq!(err, HelixError::NoActiveBond.into());
    }

    #[test]
    fn test_cumulative_release_never_exceeds_payout() {
        let mut f = bond_fixture();
        init_default_terms(&mut f.bond);
        let user = f.env.get_account(1);

        let payout = user_deposit(&mut f, user, e18(1000));

        let mut released_total = U256::zero();
        for _ in 0..4 {
            f.env.advance_block_time(1_000);
            released_total += f.bond.redeem(user, 0);
        }
        assert!(released_total < payout);

        f.env.advance_block_time(8_640);
        released_total += f.bond.redeem(user, 0);
        assert_eq!(released_total, payout);
        assert_eq!(f.hlx.balance_of(user), payout);
    }

    #[test]
    fn test_redeem_all_pages_until_drained() {
        let mut f = bond_fixture();
        init_default_terms(&mut f.bond);
        let user = f.env.get_account(1);

        for _ in 0..5 {
            user_deposit(&mut f, user, e18(100));
        }
        assert_eq!(f.bond.bond_count(user), 5);

        f.env.advance_block_time(9_000);

        // drain in two pages; each page reports how much book is left
        let (remaining, next) = f.bond.redeem_all(0, 2, user);
        assert_eq!(remaining, 3);
        assert!(next.is_empty());

        let (remaining, next) = f.bond.redeem_all(2, 5, user);
        assert_eq!(remaining, 0);
        assert!(next.is_empty());

        assert_eq!(f.hlx.balance_of(user), e9(500));
    }

    #[test]
    fn test_redeem_all_reports_still_open_indices() {
        let mut f = bond_fixture();
        init_default_terms(&mut f.bond);
        let user = f.env.get_account(1);

        user_deposit(&mut f, user, e18(100));
        user_deposit(&mut f, user, e18(100));

        // partially vested: both records stay open and are reported back
        f.env.advance_block_time(4_320);
        let (remaining, next) = f.bond.redeem_all(0, 2, user);
        assert_eq!(remaining, 2);
        assert_eq!(next, vec![0, 1]);
        assert_eq!(f.hlx.balance_of(user), e9(100));
    }

    #[test]
    fn test_whitelist_gates_deposits() {
        let mut f = bond_fixture();
        f.bond.initialize_bond_terms(
            U256::from(10_000u64),
            8_640,
            U256::from(10_000u64),
            0,
            U256::from(1000u64),
            U256::zero(),
            e18(50_000),
            U256::zero(),
            U256::zero(),
            true, // whitelist on
            false,
            0,
        );
        let user = f.env.get_account(1);

        f.stable.mint(user, e18(10));
        f.env.set_caller(user);
        f.stable.approve(f.bond.address().clone(), e18(10));
        let err = f
            .bond
            .try_deposit(e18(10), U256::from(60_000u64), user)
            .unwrap_err();
        assert_eq!(err, HelixError::NotWhitelisted.into());

        let deployer = f.env.get_account(0);
        f.env.set_caller(deployer);
        f.bond.modify_whitelist(user, true);

        f.env.set_caller(user);
        let payout = f.bond.deposit(e18(10), U256::from(60_000u64), user);
        assert_eq!(payout, e9(10));
    }

    #[test]
    fn test_circuit_breaker_trips_and_window_resets() {
        let mut f = bond_fixture();
        f.bond.initialize_bond_terms(
            U256::from(10_000u64),
            8_640,
            U256::from(10_000u64),
            0,
            U256::from(1000u64),
            U256::zero(),
            e18(50_000),
            U256::zero(),
            e9(1500), // sold-bonds limit per window
            false,
            true, // circuit breaker on
            0,
        );
        let user = f.env.get_account(1);

        user_deposit(&mut f, user, e18(1000));

        f.stable.mint(user, e18(1000));
        f.env.set_caller(user);
        f.stable.approve(f.bond.address().clone(), e18(1000));
        let err = f
            .bond
            .try_deposit(e18(1000), U256::from(60_000u64), user)
            .unwrap_err();
        assert_eq!(err, HelixError::CircuitBreakerTripped.into());

        // a fresh window accepts sales again
        f.env.advance_block_time(3_600);
        let deployer = f.env.get_account(0);
        f.env.set_caller(deployer);
        let payout = user_deposit(&mut f, user, e18(1000));
        assert_eq!(payout, e9(1000));
    }

    #[test]
    fn test_premature_redeem_pays_return_rate_and_forfeits_rest() {
        let mut f = bond_fixture();
        f.bond.initialize_bond_terms(
            U256::from(10_000u64),
            8_640,
            U256::from(10_000u64),
            0,
            U256::from(1000u64),
            U256::zero(),
            e18(50_000),
            U256::zero(),
            U256::zero(),
            false,
            false,
            3_000, // 30% premature return
        );
        let user = f.env.get_account(1);
        let dao = f.env.get_account(0);
        let dao_before = f.hlx.balance_of(dao);

        user_deposit(&mut f, user, e18(1000));

        f.env.set_caller(user);
        let returned = f.bond.redeem_premature(0);
        assert_eq!(returned, e9(300));
        assert_eq!(f.hlx.balance_of(user), e9(300));
        assert_eq!(f.hlx.balance_of(dao) - dao_before, e9(700));
        assert_eq!(f.bond.open_bond_count(user), 0);
    }

    #[test]
    fn test_premature_redeem_disabled_by_default() {
        let mut f = bond_fixture();
        init_default_terms(&mut f.bond);
        let user = f.env.get_account(1);

        user_deposit(&mut f, user, e18(100));
        f.env.set_caller(user);
        let err = f.bond.try_redeem_premature(0).unwrap_err();
        assert_eq!(err, HelixError::PrematureDisabled.into());
    }

    #[test]
    fn test_fee_is_carved_from_payout_to_dao() {
        let mut f = bond_fixture();
        f.bond.initialize_bond_terms(
            U256::from(10_000u64),
            8_640,
            U256::from(10_000u64),
            0,
            U256::from(1000u64),
            U256::from(10_000u64), // 10% DAO fee
            e18(50_000),
            U256::zero(),
            U256::zero(),
            false,
            false,
            0,
        );
        let user = f.env.get_account(1);
        let dao = f.env.get_account(0);
        let dao_before = f.hlx.balance_of(dao);

        let payout = user_deposit(&mut f, user, e18(1000));
        assert_eq!(payout, e9(900));
        assert_eq!(f.bond.bond_info(user, 0).payout, e9(900));
        assert_eq!(f.hlx.balance_of(dao) - dao_before, e9(100));
        // debt accrues the gross payout
        assert_eq!(f.bond.current_debt_decayed(), e9(1000));
    }
}

// ─── Staking ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod staking_tests {
    use super::common::*;
    use odra::casper_types::U256;
    use odra::host::{Deployer, HostEnv, NoArgs};
    use odra::prelude::*;
    use pretty_assertions::assert_eq;

    use super::MockStableHostRef;
    use cspr_helix_contracts::distributor::{Distributor, DistributorInitArgs};
    use cspr_helix_contracts::errors::HelixError;
    use cspr_helix_contracts::protocol_token::HelixTokenHostRef;
    use cspr_helix_contracts::staked_token::{StakedHelix, StakedHelixHostRef};
    use cspr_helix_contracts::staking::{
        Staking, StakingHostRef, StakingInitArgs, CONTRACT_DISTRIBUTOR, CONTRACT_WARMUP,
    };
    use cspr_helix_contracts::treasury::{TreasuryHostRef, PERMISSION_REWARD_MANAGER};
    use cspr_helix_contracts::warmup::{StakingWarmup, StakingWarmupHostRef, StakingWarmupInitArgs};

    pub struct StakingFixture {
        pub env: HostEnv,
        pub hlx: HelixTokenHostRef,
        pub shlx: StakedHelixHostRef,
        pub treasury: TreasuryHostRef,
        pub stable: MockStableHostRef,
        pub staking: StakingHostRef,
        pub warmup: StakingWarmupHostRef,
    }

    /// Epochs are 100 time units long; the first boundary sits at t=100.
    /// The deployer starts with 10_000 HLX.
    pub fn staking_fixture(warmup_period: u64) -> StakingFixture {
        let mut base = reserve_fixture(0);
        seed_supply(&mut base, 10_000);

        let mut shlx = StakedHelix::deploy(&base.env, NoArgs);
        let staking = Staking::deploy(
            &base.env,
            StakingInitArgs {
                hlx: base.hlx.address().clone(),
                shlx: shlx.address().clone(),
                epoch_length: 100,
                first_epoch_number: 0,
                first_epoch_time: 100,
            },
        );
        let warmup = StakingWarmup::deploy(
            &base.env,
            StakingWarmupInitArgs {
                staking: staking.address().clone(),
                shlx: shlx.address().clone(),
            },
        );

        shlx.initialize(staking.address().clone());
        let mut staking = staking;
        staking.set_contract(CONTRACT_WARMUP, warmup.address().clone());
        staking.set_warmup_period(warmup_period);

        StakingFixture {
            env: base.env,
            hlx: base.hlx,
            shlx,
            treasury: base.treasury,
            stable: base.stable,
            staking,
            warmup,
        }
    }

    fn stake_as(f: &mut StakingFixture, user: Address, amount: U256) {
        let deployer = f.env.get_account(0);
        f.env.set_caller(deployer);
        f.hlx.transfer(user, amount);
        f.env.set_caller(user);
        f.hlx.approve(f.staking.address().clone(), amount);
        f.staking.stake(amount, user);
        f.env.set_caller(deployer);
    }

    #[test]
    fn test_stake_holds_funds_in_warmup() {
        let mut f = staking_fixture(1);
        let user = f.env.get_account(1);

        stake_as(&mut f, user, e9(1000));

        let info = f.staking.get_warmup_info(user);
        assert_eq!(info.deposit, e9(1000));
        assert_eq!(info.expiry, 1);
        assert_eq!(f.shlx.balance_of(f.warmup.address().clone()), e9(1000));
        assert_eq!(f.shlx.balance_of(user), U256::zero());
    }

    #[test]
    fn test_claim_before_expiry_is_still_warming() {
        let mut f = staking_fixture(1);
        let user = f.env.get_account(1);

        stake_as(&mut f, user, e9(1000));

        f.env.set_caller(user);
        let err = f.staking.try_claim(user).unwrap_err();
        assert_eq!(err, HelixError::StillWarming.into());
    }

    #[test]
    fn test_claim_after_expiry_releases_shlx() {
        let mut f = staking_fixture(1);
        let user = f.env.get_account(1);

        stake_as(&mut f, user, e9(1000));

        f.env.advance_block_time(100);
        f.staking.rebase();

        f.env.set_caller(user);
        f.staking.claim(user);
        assert_eq!(f.shlx.balance_of(user), e9(1000));
        assert_eq!(f.staking.get_warmup_info(user).deposit, U256::zero());
    }

    #[test]
    fn test_zero_warmup_claims_immediately() {
        let mut f = staking_fixture(0);
        let user = f.env.get_account(1);

        stake_as(&mut f, user, e9(500));
        f.env.set_caller(user);
        f.staking.claim(user);
        assert_eq!(f.shlx.balance_of(user), e9(500));
    }

    #[test]
    fn test_forfeit_returns_principal() {
        let mut f = staking_fixture(5);
        let user = f.env.get_account(1);

        stake_as(&mut f, user, e9(1000));
        let hlx_before = f.hlx.balance_of(user);

        f.env.set_caller(user);
        f.staking.forfeit();
        assert_eq!(f.hlx.balance_of(user) - hlx_before, e9(1000));
        assert_eq!(f.staking.get_warmup_info(user).deposit, U256::zero());
    }

    #[test]
    fn test_rebase_is_idempotent_within_epoch() {
        let mut f = staking_fixture(0);

        // before the boundary nothing moves
        f.staking.rebase();
        assert_eq!(f.staking.get_epoch().number, 0);

        // at the boundary the epoch advances exactly once
        f.env.advance_block_time(100);
        f.staking.rebase();
        assert_eq!(f.staking.get_epoch().number, 1);
        assert_eq!(f.staking.get_epoch().end_time, 200);

        f.staking.rebase();
        f.staking.rebase();
        assert_eq!(f.staking.get_epoch().number, 1);
    }

    #[test]
    fn test_unstake_round_trips() {
        let mut f = staking_fixture(0);
        let user = f.env.get_account(1);

        stake_as(&mut f, user, e9(1000));
        f.env.set_caller(user);
        f.staking.claim(user);

        f.shlx.approve(f.staking.address().clone(), e9(1000));
        f.staking.unstake(e9(1000), false);
        assert_eq!(f.hlx.balance_of(user), e9(1000));
        assert_eq!(f.shlx.balance_of(user), U256::zero());
    }

    #[test]
    fn test_deposit_lock_blocks_third_party_stakes() {
        let mut f = staking_fixture(0);
        let user = f.env.get_account(1);

        f.env.set_caller(user);
        f.staking.toggle_deposit_lock();

        let deployer = f.env.get_account(0);
        f.env.set_caller(deployer);
        f.hlx.approve(f.staking.address().clone(), e9(10));
        let err = f.staking.try_stake(e9(10), user).unwrap_err();
        assert_eq!(err, HelixError::DepositsLocked.into());
    }

    #[test]
    fn test_rebase_distributes_rewards_to_stakers() {
        let mut f = staking_fixture(0);
        let user = f.env.get_account(1);
        let deployer = f.env.get_account(0);

        // distributor minting 3% of supply per epoch into the staked pool
        let mut distributor = Distributor::deploy(
            &f.env,
            DistributorInitArgs {
                treasury: f.treasury.address().clone(),
                hlx: f.hlx.address().clone(),
            },
        );
        distributor.set_staking(f.staking.address().clone());
        distributor.add_recipient(f.staking.address().clone(), U256::from(3_000u64));
        grant(
            &mut f.treasury,
            PERMISSION_REWARD_MANAGER,
            distributor.address().clone(),
        );
        f.staking
            .set_contract(CONTRACT_DISTRIBUTOR, distributor.address().clone());

        // park excess reserves for the reward manager to mint against
        f.stable.mint(deployer, e18(10_000));
        f.stable.approve(f.treasury.address().clone(), e18(10_000));
        f.treasury
            .deposit(e18(10_000), f.stable.address().clone(), e9(10_000));

        stake_as(&mut f, user, e9(1000));
        f.env.set_caller(user);
        f.staking.claim(user);
        assert_eq!(f.shlx.balance_of(user), e9(1000));

        // first boundary arms the allocation, second folds it into the index
        f.env.advance_block_time(100);
        f.staking.rebase();
        let armed = f.staking.get_epoch().distribute;
        assert!(armed > U256::zero());

        let index_before = f.shlx.index();
        f.env.advance_block_time(100);
        f.staking.rebase();
        assert!(f.shlx.index() > index_before);
        assert!(f.shlx.balance_of(user) > e9(1000));
    }
}

// ─── Warmup Manager / Executors ─────────────────────────────────────────────

#[cfg(test)]
mod warmup_manager_tests {
    use super::common::e9;
    use super::staking_tests::{staking_fixture, StakingFixture};
    use odra::host::Deployer;
    use pretty_assertions::assert_eq;

    use cspr_helix_contracts::errors::HelixError;
    use cspr_helix_contracts::warmup::{
        WarmupExecutor, WarmupExecutorInitArgs, WarmupManager, WarmupManagerHostRef,
        WarmupManagerInitArgs,
    };

    fn with_manager(executor_count: u32) -> (StakingFixture, WarmupManagerHostRef) {
        let f = staking_fixture(1);
        let mut manager = WarmupManager::deploy(
            &f.env,
            WarmupManagerInitArgs {
                hlx: f.hlx.address().clone(),
            },
        );
        for _ in 0..executor_count {
            let executor = WarmupExecutor::deploy(
                &f.env,
                WarmupExecutorInitArgs {
                    hlx: f.hlx.address().clone(),
                    shlx: f.shlx.address().clone(),
                    staking: f.staking.address().clone(),
                    manager: manager.address().clone(),
                },
            );
            manager.add_executor(executor.address().clone());
        }
        (f, manager)
    }

    #[test]
    fn test_dispatch_uses_free_executor_capacity() {
        let (mut f, mut manager) = with_manager(2);
        let user = f.env.get_account(1);
        let deployer = f.env.get_account(0);

        f.env.set_caller(deployer);
        f.hlx.transfer(user, e9(3000));

        f.env.set_caller(user);
        f.hlx.approve(manager.address().clone(), e9(3000));
        manager.stake(e9(1000), user);
        manager.stake(e9(1000), user);

        // both executors are now warming
        let err = manager.try_stake(e9(1000), user).unwrap_err();
        assert_eq!(err, HelixError::NoExecutorCapacity.into());
    }

    #[test]
    fn test_claim_collects_from_all_executors() {
        let (mut f, mut manager) = with_manager(2);
        let user = f.env.get_account(1);
        let deployer = f.env.get_account(0);

        f.env.set_caller(deployer);
        f.hlx.transfer(user, e9(2000));

        f.env.set_caller(user);
        f.hlx.approve(manager.address().clone(), e9(2000));
        manager.stake(e9(1000), user);
        manager.stake(e9(1000), user);

        f.env.advance_block_time(100);
        f.staking.rebase();

        manager.claim(user);
        assert_eq!(f.shlx.balance_of(user), e9(2000));
    }

    #[test]
    fn test_claim_with_nothing_pending_fails() {
        let (mut f, mut manager) = with_manager(1);
        let user = f.env.get_account(1);
        f.env.set_caller(user);
        let err = manager.try_claim(user).unwrap_err();
        assert_eq!(err, HelixError::NothingToClaim.into());
    }
}

// ─── Compounding Vault + Rewards Holder ─────────────────────────────────────

#[cfg(test)]
mod vault_tests {
    use super::common::e9;
    use super::{MockStable, MockStableHostRef};
    use odra::casper_types::U256;
    use odra::host::{Deployer, HostEnv, NoArgs};
    use odra::prelude::*;
    use pretty_assertions::assert_eq;

    use cspr_helix_contracts::compounding_vault::{
        CompoundingVault, CompoundingVaultHostRef, CompoundingVaultInitArgs,
    };
    use cspr_helix_contracts::errors::HelixError;
    use cspr_helix_contracts::rewards_holder::{
        RewardsHolder, RewardsHolderHostRef, RewardsHolderInitArgs,
    };
    use cspr_helix_contracts::types::INDEX_SCALE;

    struct VaultFixture {
        env: HostEnv,
        token: MockStableHostRef,
        vault: CompoundingVaultHostRef,
        holder: RewardsHolderHostRef,
    }

    /// Vault over a plain token (the vault only needs transfer semantics),
    /// sampling every 100 time units, all fees zero unless reconfigured.
    fn vault_fixture() -> VaultFixture {
        let env = odra_test::env();
        let token = MockStable::deploy(&env, NoArgs);
        let dao = env.get_account(9);
        let mut vault = CompoundingVault::deploy(
            &env,
            CompoundingVaultInitArgs {
                shlx: token.address().clone(),
                dao,
            },
        );
        let mut holder = RewardsHolder::deploy(
            &env,
            RewardsHolderInitArgs {
                shlx: token.address().clone(),
            },
        );
        holder.set_parameters(vault.address().clone(), 100);
        vault.set_parameters(holder.address().clone(), 0, 0, 0, 0, true, false);
        VaultFixture {
            env,
            token,
            vault,
            holder,
        }
    }

    fn deposit_as(f: &mut VaultFixture, user: Address, amount: U256) -> U256 {
        f.token.mint(user, amount);
        f.env.set_caller(user);
        f.token.approve(f.vault.address().clone(), amount);
        let shares = f.vault.deposit(amount);
        f.env.set_caller(f.env.get_account(0));
        shares
    }

    #[test]
    fn test_first_deposit_mints_shares_one_to_one() {
        let mut f = vault_fixture();
        let user = f.env.get_account(1);

        let shares = deposit_as(&mut f, user, e9(1000));
        assert_eq!(shares, e9(1000));
        assert_eq!(f.vault.shares_of(user), e9(1000));
        assert_eq!(f.vault.share_price(), U256::from(INDEX_SCALE));
    }

    #[test]
    fn test_withdraw_more_than_held_fails() {
        let mut f = vault_fixture();
        let user = f.env.get_account(1);

        deposit_as(&mut f, user, e9(100));
        f.env.set_caller(user);
        let err = f.vault.try_withdraw(e9(101)).unwrap_err();
        assert_eq!(err, HelixError::InsufficientShares.into());
    }

    #[test]
    fn test_deposit_zero_fails() {
        let mut f = vault_fixture();
        let user = f.env.get_account(1);
        f.env.set_caller(user);
        let err = f.vault.try_deposit(U256::zero()).unwrap_err();
        assert_eq!(err, HelixError::ZeroAmount.into());
    }

    #[test]
    fn test_deposits_disabled_flag() {
        let mut f = vault_fixture();
        let holder_addr = f.holder.address().clone();
        f.vault
            .set_parameters(holder_addr, 0, 0, 0, 0, false, false);

        let user = f.env.get_account(1);
        f.token.mint(user, e9(10));
        f.env.set_caller(user);
        f.token.approve(f.vault.address().clone(), e9(10));
        let err = f.vault.try_deposit(e9(10)).unwrap_err();
        assert_eq!(err, HelixError::DepositsDisabled.into());
    }

    #[test]
    fn test_sample_raises_share_price_monotonically() {
        let mut f = vault_fixture();
        let user = f.env.get_account(1);

        deposit_as(&mut f, user, e9(1000));

        // rewards accrue to the holder between samples
        f.token.mint(f.holder.address().clone(), e9(100));
        f.env.advance_block_time(100);
        assert!(f.holder.sample());

        let price_after_first = f.vault.share_price();
        assert!(price_after_first > U256::from(INDEX_SCALE));

        // a dry sample leaves the price unchanged, never lower
        f.env.advance_block_time(100);
        assert!(f.holder.sample());
        assert_eq!(f.vault.share_price(), price_after_first);

        // compounded withdrawal: 1000 deposited, 1100 out
        f.env.set_caller(user);
        let amount = f.vault.withdraw(e9(1000));
        assert_eq!(amount, e9(1100));
        assert_eq!(f.token.balance_of(user), e9(1100));
    }

    #[test]
    fn test_sample_too_early_is_a_noop() {
        let mut f = vault_fixture();
        let user = f.env.get_account(1);
        deposit_as(&mut f, user, e9(1000));

        f.env.advance_block_time(100);
        assert!(f.holder.sample());

        f.token.mint(f.holder.address().clone(), e9(50));
        // inside the cadence the call reports false and moves nothing
        assert!(!f.holder.sample());
        assert_eq!(f.vault.share_price(), U256::from(INDEX_SCALE));
    }

    #[test]
    fn test_record_sample_requires_rewards_holder() {
        let mut f = vault_fixture();
        let outsider = f.env.get_account(2);
        f.env.set_caller(outsider);
        let err = f.vault.try_record_sample(e9(10)).unwrap_err();
        assert_eq!(err, HelixError::NotRewardsHolder.into());
    }

    #[test]
    fn test_performance_fee_skimmed_from_samples() {
        let mut f = vault_fixture();
        let holder_addr = f.holder.address().clone();
        // 10% performance fee
        f.vault
            .set_parameters(holder_addr, 0, 0, 0, 1_000, true, false);
        let user = f.env.get_account(1);
        let dao = f.env.get_account(9);

        deposit_as(&mut f, user, e9(1000));
        f.token.mint(f.holder.address().clone(), e9(100));
        f.env.advance_block_time(100);
        f.holder.sample();

        assert_eq!(f.token.balance_of(dao), e9(10));
        assert_eq!(f.vault.get_total_underlying(), e9(1090));
    }

    #[test]
    fn test_withdrawal_fee_and_early_penalty() {
        let mut f = vault_fixture();
        let holder_addr = f.holder.address().clone();
        // 10% withdrawal fee, doubled inside the 1000-unit early window
        f.vault
            .set_parameters(holder_addr, 1_000, 0, 1_000, 0, true, true);
        let user = f.env.get_account(1);
        let dao = f.env.get_account(9);

        deposit_as(&mut f, user, e9(1000));
        f.env.set_caller(user);
        let amount = f.vault.withdraw(e9(1000));
        assert_eq!(amount, e9(800));
        assert_eq!(f.token.balance_of(dao), e9(200));
    }
}

// ─── TWAP Oracle ────────────────────────────────────────────────────────────

#[cfg(test)]
mod oracle_tests {
    use odra::casper_types::U256;
    use odra::host::{Deployer, NoArgs};
    use pretty_assertions::assert_eq;

    use cspr_helix_contracts::errors::HelixError;
    use cspr_helix_contracts::twap_oracle::TwapOracle;

    #[test]
    fn test_consult_before_any_sample_is_stale() {
        let env = odra_test::env();
        let oracle = TwapOracle::deploy(&env, NoArgs);
        let pair = env.get_account(7);

        let err = oracle.try_consult(pair, U256::from(1u64)).unwrap_err();
        assert_eq!(err, HelixError::StaleOracle.into());
    }

    #[test]
    fn test_update_inside_min_interval_is_a_noop() {
        let env = odra_test::env();
        let mut oracle = TwapOracle::deploy(&env, NoArgs);
        let pair = env.get_account(7);

        assert!(oracle.update(pair, U256::from(10_000u64)));
        // a second sample in the same instant is dropped
        assert!(!oracle.update(pair, U256::from(50_000u64)));

        let observation = oracle.get_observation(pair).unwrap();
        assert_eq!(observation.average, U256::from(10_000u64));
    }

    #[test]
    fn test_average_blends_by_elapsed_time() {
        let env = odra_test::env();
        let mut oracle = TwapOracle::deploy(&env, NoArgs);
        let pair = env.get_account(7);
        oracle.set_intervals(10, 100);

        oracle.update(pair, U256::from(10_000u64));
        env.advance_block_time(50);
        oracle.update(pair, U256::from(20_000u64));

        // (10000 * 50 + 20000 * 50) / 100
        let observation = oracle.get_observation(pair).unwrap();
        assert_eq!(observation.average, U256::from(15_000u64));

        // consult converts through the averaged price
        let out = oracle.consult(pair, U256::from(1_000_000_000u64));
        assert_eq!(out, U256::from(1_500_000_000u64));
    }

    #[test]
    fn test_consult_stale_after_max_age() {
        let env = odra_test::env();
        let mut oracle = TwapOracle::deploy(&env, NoArgs);
        let pair = env.get_account(7);
        oracle.set_intervals(10, 100);

        oracle.update(pair, U256::from(10_000u64));
        env.advance_block_time(101);
        let err = oracle.try_consult(pair, U256::from(1u64)).unwrap_err();
        assert_eq!(err, HelixError::StaleOracle.into());
    }

    #[test]
    fn test_set_intervals_validation() {
        let env = odra_test::env();
        let mut oracle = TwapOracle::deploy(&env, NoArgs);

        let err = oracle.try_set_intervals(0, 100).unwrap_err();
        assert_eq!(err, HelixError::InvalidParameter.into());
        let err = oracle.try_set_intervals(200, 100).unwrap_err();
        assert_eq!(err, HelixError::InvalidParameter.into());
    }
}

// ─── Bonding Calculator ─────────────────────────────────────────────────────

#[cfg(test)]
mod calculator_tests {
    use super::common::{e9, grant, reserve_fixture};
    use super::{MockPair, MockPairHostRef};
    use odra::casper_types::U256;
    use odra::host::{Deployer, NoArgs};
    use pretty_assertions::assert_eq;

    use cspr_helix_contracts::bonding_calculator::{
        BondingCalculator, BondingCalculatorHostRef, BondingCalculatorInitArgs,
    };
    use cspr_helix_contracts::treasury::{
        PERMISSION_LIQUIDITY_DEPOSITOR, PERMISSION_LIQUIDITY_TOKEN,
    };

    fn e18(n: u64) -> U256 {
        U256::from(n) * U256::from(10u64).pow(U256::from(18u64))
    }

    /// Balanced pool: 100 stable (18 dec) vs 100 HLX (9 dec), 100 LP units
    fn balanced_pair(env: &odra::host::HostEnv) -> MockPairHostRef {
        let mut pair = MockPair::deploy(env, NoArgs);
        pair.set_reserves(e18(100), e9(100));
        pair.mint(env.get_account(0), e9(100));
        pair
    }

    #[test]
    fn test_valuation_scales_with_lp_share() {
        let env = odra_test::env();
        let hlx = env.get_account(8);
        let calculator =
            BondingCalculator::deploy(&env, BondingCalculatorInitArgs { hlx });
        let pair = balanced_pair(&env);

        // total value = 2 * sqrt(100e9 * 100e9) = 200 HLX
        assert_eq!(calculator.total_value(pair.address().clone()), e9(200));
        // half the LP supply is worth half the pool
        assert_eq!(
            calculator.valuation(pair.address().clone(), e9(50)),
            e9(100)
        );
    }

    #[test]
    fn test_treasury_values_lp_through_calculator() {
        let mut f = reserve_fixture(0);
        let deployer = f.env.get_account(0);
        let calculator = BondingCalculator::deploy(
            &f.env,
            BondingCalculatorInitArgs {
                hlx: f.hlx.address().clone(),
            },
        );
        let pair = balanced_pair(&f.env);
        let pair_addr = pair.address().clone();

        // toggle designates the calculator for the LP reserve
        f.treasury.queue(PERMISSION_LIQUIDITY_TOKEN, pair_addr);
        f.treasury.toggle(
            PERMISSION_LIQUIDITY_TOKEN,
            pair_addr,
            Some(calculator.address().clone()),
        );
        grant(&mut f.treasury, PERMISSION_LIQUIDITY_DEPOSITOR, deployer);

        assert_eq!(f.treasury.value_of_token(pair_addr, e9(50)), e9(100));

        // depositing LP mints at the calculator's valuation
        let mut pair = pair;
        f.env.set_caller(deployer);
        pair.approve(f.treasury.address().clone(), e9(10));
        let minted = f.treasury.deposit(e9(10), pair_addr, U256::zero());
        assert_eq!(minted, e9(20));
        assert_eq!(f.hlx.balance_of(deployer), e9(20));
    }
}

// ─── Type-level checks ──────────────────────────────────────────────────────

#[cfg(test)]
mod type_tests {
    use odra::casper_types::U256;
    use cspr_helix_contracts::types::*;

    #[test]
    fn test_scales_are_consistent() {
        assert_eq!(PRICE_SCALE, 10_000);
        assert_eq!(BPS_SCALE, 10_000);
        assert_eq!(FEE_SCALE, 100_000);
        assert_eq!(RATIO_SCALE, 1_000_000_000);
        assert_eq!(INDEX_SCALE, 1_000_000_000);
        assert!(TOKEN_DECIMALS < RESERVE_DECIMALS);
    }

    #[test]
    fn test_bond_record_default_is_closed() {
        let record = BondRecord::default();
        assert!(record.payout.is_zero());
        assert_eq!(record.vesting, 0);
    }

    #[test]
    fn test_warmup_info_default_is_unlocked() {
        let info = WarmupInfo::default();
        assert!(info.deposit.is_zero());
        assert!(!info.lock);
    }

    #[test]
    fn test_error_codes_are_stable() {
        use cspr_helix_contracts::errors::HelixError;
        assert_eq!(HelixError::Unauthorized as u16, 100);
        assert_eq!(HelixError::StaleOracle as u16, 200);
        assert_eq!(HelixError::MaxDebtExceeded as u16, 303);
        assert_eq!(HelixError::StillWarming as u16, 400);
        assert_eq!(HelixError::InsufficientShares as u16, 500);
        assert_eq!(HelixError::ZeroAmount as u16, 900);
        let _ = U256::zero();
    }
}
