//! Deploy contracts to Casper livenet/testnet using Odra livenet environment.
//!
//! Usage:
//!   cargo run --bin deploy_livenet --release
//!
//! Requires .env file with:
//!   ODRA_CASPER_LIVENET_SECRET_KEY_PATH=/path/to/secret_key.pem
//!   ODRA_CASPER_LIVENET_NODE_ADDRESS=https://node.testnet.casper.network
//!   ODRA_CASPER_LIVENET_CHAIN_NAME=casper-test
//!   ODRA_CASPER_LIVENET_PAYMENT_AMOUNT=200000000000
//!   HELIX_RESERVE_TOKEN=hash-... (CEP-18 stable reserve, 18 decimals)
//!   HELIX_FIRST_EPOCH_TIME=...   (MAKE SURE THIS MATCHES CHAIN)

use core::str::FromStr;

use odra::casper_types::U256;
use odra::host::{Deployer, NoArgs};
use odra::prelude::*;

use cspr_helix_contracts::bond_depository::{BondDepository, BondDepositoryInitArgs};
use cspr_helix_contracts::bonding_calculator::{BondingCalculator, BondingCalculatorInitArgs};
use cspr_helix_contracts::compounding_vault::{CompoundingVault, CompoundingVaultInitArgs};
use cspr_helix_contracts::distributor::{Distributor, DistributorInitArgs};
use cspr_helix_contracts::protocol_token::HelixToken;
use cspr_helix_contracts::rewards_holder::{RewardsHolder, RewardsHolderInitArgs};
use cspr_helix_contracts::staked_token::StakedHelix;
use cspr_helix_contracts::staking::{Staking, StakingInitArgs, CONTRACT_DISTRIBUTOR, CONTRACT_WARMUP};
use cspr_helix_contracts::treasury::{
    Treasury, TreasuryInitArgs, PERMISSION_RESERVE_DEPOSITOR, PERMISSION_RESERVE_TOKEN,
    PERMISSION_REWARD_MANAGER,
};
use cspr_helix_contracts::twap_oracle::TwapOracle;
use cspr_helix_contracts::types::PricingKind;
use cspr_helix_contracts::warmup::{
    StakingWarmup, StakingWarmupInitArgs, WarmupExecutor, WarmupExecutorInitArgs, WarmupManager,
    WarmupManagerInitArgs,
};

fn main() {
    // Load environment from .env file
    dotenv::dotenv().ok();

    println!("=== CSPR-Helix Livenet Deployment ===");
    println!();

    // Initialize Odra livenet environment
    let env = odra_casper_livenet_env::env();

    // Configure payment amount for deployments/calls (required for Casper 2.0 txs)
    let payment_amount: u64 = std::env::var("ODRA_CASPER_LIVENET_PAYMENT_AMOUNT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(200_000_000_000);
    env.set_gas(payment_amount);

    let deployer = env.caller();
    println!("Deployer: {:?}", deployer);
    println!();

    // Protocol parameters
    let initial_index = U256::from(7_675_210_820u64);
    let epoch_length: u64 = 28_800;
    let first_epoch_number: u64 = 0;
    let first_epoch_time: u64 = std::env::var("HELIX_FIRST_EPOCH_TIME")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(epoch_length);
    let initial_reward_rate = U256::from(3000u64);
    let treasury_queue_delay: u64 = 0;

    // Bond terms (stable reserve bond)
    let bond_bcv = U256::from(10_000u64);
    let bond_vesting_length: u64 = 8_640;
    let min_bond_price = U256::from(10_000u64);
    let max_discount: u64 = 800;
    let max_bond_payout = U256::from(1000u64);
    let bond_fee = U256::from(10_000u64);
    let max_bond_debt = U256::from(50_000u64) * U256::from(10u64).pow(U256::from(18u64));
    let initial_bond_debt = U256::zero();
    let sold_bonds_limit = U256::from(10_000u64) * U256::from(10u64).pow(U256::from(18u64));

    // Existing CEP-18 stable reserve backing the first bond
    let reserve_token = Address::from_str(
        &std::env::var("HELIX_RESERVE_TOKEN").expect("HELIX_RESERVE_TOKEN must be set"),
    )
    .expect("Invalid HELIX_RESERVE_TOKEN address");

    // ==================== Phase 1: Tokens ====================
    println!("=== Phase 1: Deploying Tokens ===");
    println!();

    println!("Deploying HelixToken...");
    let mut hlx = HelixToken::deploy(&env, NoArgs);
    let hlx_addr = hlx.address().clone();
    println!("HelixToken deployed at: {:?}", hlx_addr);

    println!("Deploying StakedHelix...");
    let mut shlx = StakedHelix::deploy(&env, NoArgs);
    let shlx_addr = shlx.address().clone();
    println!("StakedHelix deployed at: {:?}", shlx_addr);

    println!();

    // ==================== Phase 2: Treasury & Valuation ====================
    println!("=== Phase 2: Deploying Treasury ===");
    println!();

    println!("Deploying Treasury...");
    let mut treasury = Treasury::deploy(
        &env,
        TreasuryInitArgs {
            hlx: hlx_addr,
            queue_delay: treasury_queue_delay,
        },
    );
    let treasury_addr = treasury.address().clone();
    println!("Treasury deployed at: {:?}", treasury_addr);

    println!("Deploying BondingCalculator...");
    let calculator = BondingCalculator::deploy(&env, BondingCalculatorInitArgs { hlx: hlx_addr });
    println!("BondingCalculator deployed at: {:?}", calculator.address().clone());

    println!("Deploying TwapOracle...");
    let oracle = TwapOracle::deploy(&env, NoArgs);
    println!("TwapOracle deployed at: {:?}", oracle.address().clone());

    println!();

    // ==================== Phase 3: Staking Stack ====================
    println!("=== Phase 3: Deploying Staking ===");
    println!();

    println!("Deploying Distributor...");
    let mut distributor = Distributor::deploy(
        &env,
        DistributorInitArgs {
            treasury: treasury_addr,
            hlx: hlx_addr,
        },
    );
    let distributor_addr = distributor.address().clone();
    println!("Distributor deployed at: {:?}", distributor_addr);

    println!("Deploying Staking...");
    let mut staking = Staking::deploy(
        &env,
        StakingInitArgs {
            hlx: hlx_addr,
            shlx: shlx_addr,
            epoch_length,
            first_epoch_number,
            first_epoch_time,
        },
    );
    let staking_addr = staking.address().clone();
    println!("Staking deployed at: {:?}", staking_addr);

    println!("Deploying StakingWarmup...");
    let warmup = StakingWarmup::deploy(
        &env,
        StakingWarmupInitArgs {
            staking: staking_addr,
            shlx: shlx_addr,
        },
    );
    let warmup_addr = warmup.address().clone();
    println!("StakingWarmup deployed at: {:?}", warmup_addr);

    println!();

    // ==================== Phase 4: Compounding Layer ====================
    println!("=== Phase 4: Deploying Compounding Layer ===");
    println!();

    println!("Deploying RewardsHolder...");
    let mut rewards_holder = RewardsHolder::deploy(&env, RewardsHolderInitArgs { shlx: shlx_addr });
    let rewards_holder_addr = rewards_holder.address().clone();
    println!("RewardsHolder deployed at: {:?}", rewards_holder_addr);

    println!("Deploying CompoundingVault...");
    let mut vault = CompoundingVault::deploy(
        &env,
        CompoundingVaultInitArgs {
            shlx: shlx_addr,
            dao: deployer,
        },
    );
    let vault_addr = vault.address().clone();
    println!("CompoundingVault deployed at: {:?}", vault_addr);

    println!("Deploying WarmupManager...");
    let mut warmup_manager = WarmupManager::deploy(&env, WarmupManagerInitArgs { hlx: hlx_addr });
    let warmup_manager_addr = warmup_manager.address().clone();
    println!("WarmupManager deployed at: {:?}", warmup_manager_addr);

    println!("Deploying WarmupExecutors...");
    let executor1 = WarmupExecutor::deploy(
        &env,
        WarmupExecutorInitArgs {
            hlx: hlx_addr,
            shlx: shlx_addr,
            staking: staking_addr,
            manager: warmup_manager_addr,
        },
    );
    let executor2 = WarmupExecutor::deploy(
        &env,
        WarmupExecutorInitArgs {
            hlx: hlx_addr,
            shlx: shlx_addr,
            staking: staking_addr,
            manager: warmup_manager_addr,
        },
    );
    println!("WarmupExecutor deployed at: {:?}", executor1.address().clone());
    println!("WarmupExecutor deployed at: {:?}", executor2.address().clone());

    println!();

    // ==================== Phase 5: Bond Depository ====================
    println!("=== Phase 5: Deploying Bond Depository ===");
    println!();

    println!("Deploying BondDepository (stable reserve)...");
    let mut bond = BondDepository::deploy(
        &env,
        BondDepositoryInitArgs {
            hlx: hlx_addr,
            principle: reserve_token,
            treasury: treasury_addr,
            dao: deployer,
            pricing: PricingKind::DebtRatio,
        },
    );
    let bond_addr = bond.address().clone();
    println!("BondDepository deployed at: {:?}", bond_addr);

    println!();

    // ==================== Phase 6: Cross-contract Configuration ====================
    println!("=== Phase 6: Cross-contract Configuration ===");
    println!();

    println!("Initializing StakedHelix and setting the index...");
    shlx.initialize(staking_addr);
    shlx.set_index(initial_index);
    println!("Done.");

    println!("Wiring Staking -> Distributor / Warmup...");
    staking.set_contract(CONTRACT_DISTRIBUTOR, distributor_addr);
    staking.set_contract(CONTRACT_WARMUP, warmup_addr);
    println!("Done.");

    println!("Setting treasury as HLX vault...");
    hlx.set_vault(treasury_addr);
    println!("Done.");

    println!("Wiring Distributor...");
    distributor.set_staking(staking_addr);
    distributor.add_recipient(staking_addr, initial_reward_rate);
    distributor.add_recipient(rewards_holder_addr, initial_reward_rate);
    println!("Done.");

    println!("Queue and toggle distributor as reward manager...");
    treasury.queue(PERMISSION_REWARD_MANAGER, distributor_addr);
    treasury.toggle(PERMISSION_REWARD_MANAGER, distributor_addr, None);
    println!("Done.");

    println!("Queue and toggle the reserve token...");
    treasury.queue(PERMISSION_RESERVE_TOKEN, reserve_token);
    treasury.toggle(PERMISSION_RESERVE_TOKEN, reserve_token, None);
    println!("Done.");

    println!("Queue and toggle bond as reserve depositor...");
    treasury.queue(PERMISSION_RESERVE_DEPOSITOR, bond_addr);
    treasury.toggle(PERMISSION_RESERVE_DEPOSITOR, bond_addr, None);
    println!("Done.");

    println!("Initializing bond terms...");
    bond.initialize_bond_terms(
        bond_bcv,
        bond_vesting_length,
        min_bond_price,
        max_discount,
        max_bond_payout,
        bond_fee,
        max_bond_debt,
        initial_bond_debt,
        sold_bonds_limit,
        false,
        false,
        0,
    );
    bond.set_staking(staking_addr);
    println!("Done.");

    println!("Wiring RewardsHolder -> CompoundingVault...");
    rewards_holder.set_parameters(vault_addr, 1800);
    vault.set_parameters(rewards_holder_addr, 2000, 0, 3000, 1000, true, false);
    println!("Done.");

    println!("Registering warmup executors...");
    warmup_manager.add_executor(executor1.address().clone());
    warmup_manager.add_executor(executor2.address().clone());
    println!("Done.");

    println!();
    println!("=== Deployment Complete ===");
    println!();
    println!("Contract Addresses:");
    println!("  HelixToken:         {:?}", hlx_addr);
    println!("  StakedHelix:        {:?}", shlx_addr);
    println!("  Treasury:           {:?}", treasury_addr);
    println!("  BondingCalculator:  {:?}", calculator.address().clone());
    println!("  TwapOracle:         {:?}", oracle.address().clone());
    println!("  Distributor:        {:?}", distributor_addr);
    println!("  Staking:            {:?}", staking_addr);
    println!("  StakingWarmup:      {:?}", warmup_addr);
    println!("  WarmupManager:      {:?}", warmup_manager_addr);
    println!("  RewardsHolder:      {:?}", rewards_holder_addr);
    println!("  CompoundingVault:   {:?}", vault_addr);
    println!("  BondDepository:     {:?}", bond_addr);
}
