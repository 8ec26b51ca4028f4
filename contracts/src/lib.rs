//! CSPR-Helix Contracts
//!
//! Casper-native reserve-backed token protocol implementation.
//!
//! ## Architecture
//!
//! - **HelixToken (HLX)**: Protocol token with vault-gated minting
//! - **StakedHelix (sHLX)**: Rebase-indexed staked token
//! - **Treasury**: Reserve custody, two-phase capability matrix, mint gating
//! - **BondingCalculator**: Invariant-based LP reserve valuation
//! - **TwapOracle**: Windowed market price with staleness fail-closed
//! - **BondDepository**: Debt-priced bond sales, linear vesting, paged
//!   redemption; one instance per bond variant
//! - **Staking**: Epoch rebase engine with warmup custody
//! - **Distributor**: Per-epoch reward minting policy
//! - **StakingWarmup / WarmupManager / WarmupExecutor**: Warmup custody and
//!   capacity-based stake dispatch
//! - **RewardsHolder / CompoundingVault**: Sampled auto-compounding wrapper
//!   over sHLX
//!
//! ## Capability matrix
//!
//! Every mint of HLX goes through the Treasury, and every treasury mutation
//! is gated by a (kind, address) capability granted via `queue`/`toggle`:
//! queue arms a delay, toggle finalizes. Bond depositories hold depositor
//! capabilities; the Distributor holds the reward-manager capability.

#![cfg_attr(target_arch = "wasm32", no_std)]

#[cfg(target_arch = "wasm32")]
extern crate alloc;

// Re-export odra for downstream usage
pub use odra;

// Core module declarations
pub mod types;
pub mod errors;
pub mod bond_math;

// Token modules
pub mod protocol_token;
pub mod staked_token;

// Contract modules
pub mod treasury;
pub mod bonding_calculator;
pub mod twap_oracle;
pub mod bond_depository;
pub mod staking;
pub mod distributor;
pub mod warmup;
pub mod rewards_holder;
pub mod compounding_vault;
