//! Protocol error definitions.

use odra::prelude::*;

/// Helix protocol errors
#[repr(u16)]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum HelixError {
    // Treasury errors (1xx)
    Unauthorized = 100,
    NotQueued = 101,
    QueueStillPending = 102,
    AlreadyFinalized = 103,
    NotAccepted = 104,
    InsufficientReserves = 105,

    // Oracle errors (2xx)
    StaleOracle = 200,
    InvalidPair = 201,

    // Bond errors (3xx)
    AlreadyInitialized = 300,
    NotInitialized = 301,
    SlippageExceeded = 302,
    MaxDebtExceeded = 303,
    CircuitBreakerTripped = 304,
    NotWhitelisted = 305,
    PayoutTooSmall = 306,
    PayoutTooLarge = 307,
    NoActiveBond = 308,
    PrematureDisabled = 309,

    // Staking errors (4xx)
    StillWarming = 400,
    DepositsLocked = 401,
    NothingToClaim = 402,
    NoExecutorCapacity = 403,
    NotWarmupContract = 404,

    // Vault errors (5xx)
    InsufficientShares = 500,
    DepositsDisabled = 501,
    NotRewardsHolder = 502,
    SampleTooEarly = 503,

    // Token errors (6xx)
    InsufficientBalance = 600,
    InsufficientAllowance = 601,
    NotVault = 602,
    NotStakingContract = 603,

    // Shared errors (9xx)
    ZeroAmount = 900,
    InvalidParameter = 901,
    Reentrancy = 902,
    ArithmeticFailure = 903,
}

impl HelixError {
    pub const fn message(&self) -> &'static str {
        match self {
            // Treasury
            HelixError::Unauthorized => "Unauthorized: caller lacks the required capability",
            HelixError::NotQueued => "Permission was not queued for this kind and address",
            HelixError::QueueStillPending => "Permission queue delay has not elapsed",
            HelixError::AlreadyFinalized => "Permission already granted",
            HelixError::NotAccepted => "Asset is not an accepted reserve",
            HelixError::InsufficientReserves => "Insufficient reserves for this operation",

            // Oracle
            HelixError::StaleOracle => "Oracle sample is stale or missing",
            HelixError::InvalidPair => "Unknown oracle pair",

            // Bond
            HelixError::AlreadyInitialized => "Bond terms already initialized",
            HelixError::NotInitialized => "Bond terms not initialized",
            HelixError::SlippageExceeded => "Bond price moved above the caller's bound",
            HelixError::MaxDebtExceeded => "Bond would exceed the maximum debt",
            HelixError::CircuitBreakerTripped => "Bond sales limit reached for this window",
            HelixError::NotWhitelisted => "Caller is not whitelisted for this bond",
            HelixError::PayoutTooSmall => "Bond payout below the minimum",
            HelixError::PayoutTooLarge => "Bond payout above the per-bond maximum",
            HelixError::NoActiveBond => "No active bond at this index",
            HelixError::PrematureDisabled => "Premature redemption is not enabled",

            // Staking
            HelixError::StillWarming => "Warmup period has not expired",
            HelixError::DepositsLocked => "Recipient has locked external deposits",
            HelixError::NothingToClaim => "No warmup deposit to claim",
            HelixError::NoExecutorCapacity => "All warmup executors are busy",
            HelixError::NotWarmupContract => "Caller is not the registered warmup contract",

            // Vault
            HelixError::InsufficientShares => "Requested shares exceed caller's balance",
            HelixError::DepositsDisabled => "Vault deposits are disabled",
            HelixError::NotRewardsHolder => "Caller is not the rewards holder",
            HelixError::SampleTooEarly => "Sample interval has not elapsed",

            // Token
            HelixError::InsufficientBalance => "Insufficient token balance",
            HelixError::InsufficientAllowance => "Insufficient token allowance",
            HelixError::NotVault => "Caller is not the token vault",
            HelixError::NotStakingContract => "Caller is not the staking contract",

            // Shared
            HelixError::ZeroAmount => "Amount must be non-zero",
            HelixError::InvalidParameter => "Invalid parameter",
            HelixError::Reentrancy => "Reentrant call rejected",
            HelixError::ArithmeticFailure => "Arithmetic overflow or division by zero",
        }
    }
}

impl core::fmt::Display for HelixError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.message())
    }
}

impl From<HelixError> for OdraError {
    fn from(error: HelixError) -> Self {
        #[cfg(target_arch = "wasm32")]
        {
            OdraError::user(error as u16)
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            OdraError::user(error as u16, error.message())
        }
    }
}
