//! Common types and fixed-point scales used across the protocol.

use odra::prelude::*;
use odra::casper_types::U256;

/// HLX / sHLX decimals
pub const TOKEN_DECIMALS: u8 = 9;
/// Stable reserve asset decimals
pub const RESERVE_DECIMALS: u8 = 18;
/// Bond price fixed point: 10_000 = par (one reserve unit of value per HLX)
pub const PRICE_SCALE: u64 = 10_000;
/// Debt ratio fixed point (1e9)
pub const RATIO_SCALE: u64 = 1_000_000_000;
/// Bond fee / max payout fixed point (hundred-thousandths)
pub const FEE_SCALE: u64 = 100_000;
/// Basis points scale (100% = 10000 bps)
pub const BPS_SCALE: u64 = 10_000;
/// sHLX rebase index fixed point (1e9)
pub const INDEX_SCALE: u64 = 1_000_000_000;

/// How a bond depository derives its sale price
#[odra::odra_type]
#[derive(Copy)]
pub enum PricingKind {
    /// Price from the debt ratio alone: `max(minimum_price, bcv * ratio)`
    DebtRatio,
    /// Debt-ratio price floored at `market * (1 - max_discount)` using the
    /// TWAP oracle's market price
    DebtRatioWithTwapFloor,
}

/// Bond sale terms, fixed at initialization and tuned afterwards per field
#[odra::odra_type]
pub struct BondTerms {
    /// Control variable scaling debt ratio into price
    pub control_variable: U256,
    /// Vesting duration (block-time units)
    pub vesting_term: u64,
    /// Price floor, `PRICE_SCALE` fixed point
    pub minimum_price: U256,
    /// Maximum discount vs the oracle market price, in bps
    pub max_discount: u64,
    /// Largest single payout, in hundred-thousandths of HLX supply
    pub max_payout: U256,
    /// DAO fee carved from each payout, in hundred-thousandths
    pub fee: U256,
    /// Ceiling on outstanding bond debt
    pub max_debt: U256,
    /// Cumulative sales allowed per circuit-breaker window
    pub sold_bonds_limit: U256,
    /// Restrict deposits to whitelisted addresses
    pub use_whitelist: bool,
    /// Enforce the sold-bonds window limit
    pub use_circuit_breaker: bool,
    /// Fraction of the unvested remainder returned on premature exit, in bps
    /// (0 disables premature redemption)
    pub premature_return_rate: u64,
}

/// One depositor's bond at one book index.
///
/// Partial redemption decrements `payout`, shortens `vesting` and advances
/// `last_time`; a closed bond keeps its slot with `payout == 0`.
#[odra::odra_type]
#[derive(Default)]
pub struct BondRecord {
    /// HLX still owed
    pub payout: U256,
    /// Remaining vesting duration
    pub vesting: u64,
    /// Last interaction (deposit or redeem)
    pub last_time: u64,
    /// Price paid at deposit, `PRICE_SCALE` fixed point
    pub price_paid: U256,
}

/// Staking rebase epoch
#[odra::odra_type]
pub struct Epoch {
    /// Strictly increasing epoch index
    pub number: u64,
    /// Epoch duration (block-time units)
    pub length: u64,
    /// Boundary after which `rebase` advances the epoch
    pub end_time: u64,
    /// Reward minted into the staked pool at the next boundary
    pub distribute: U256,
}

/// Warmup custody entry for a staker
#[odra::odra_type]
#[derive(Default)]
pub struct WarmupInfo {
    /// HLX principal held back
    pub deposit: U256,
    /// Staked-token gons held by the warmup custodian
    pub gons: U256,
    /// First epoch at which the deposit is claimable
    pub expiry: u64,
    /// When set, third parties cannot stake or claim for this account
    pub lock: bool,
}
